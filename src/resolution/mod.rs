//! Asynchronous anchor resolution.
//!
//! This module provides:
//! - `ResolutionBackend`: trait seam to the platform resolution primitive
//! - `AnchorResolutionService`: poll-to-completion request driver

pub mod backend;
pub mod service;

pub use backend::{MockBackend, PollState, ResolutionBackend, TicketId};
pub use service::{
    AnchorResolutionService, RequestToken, ResolutionCompletion, ResolutionOutcome, ResolveDispatch,
};
