//! Session orchestration.
//!
//! This module provides:
//! - `SessionEngine`: the cooperative tick loop coordinating localization,
//!   resolution, registry, and history store
//! - `SessionEvent`: events emitted to the UI collaborator

pub mod engine;
pub mod events;

pub use engine::{CatalogPlace, SessionEngine};
pub use events::{
    ERROR_DISPLAY_SECS, SessionEvent, SessionEventReceiver, SessionEventSender,
    create_event_channel,
};
