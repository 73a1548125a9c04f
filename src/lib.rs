//! Sthira - Localization and anchor resolution engine
//!
//! This library provides the core components for geospatially anchored
//! sessions: pose-accuracy-gated localization, asynchronous anchor
//! resolution against pluggable backends, a persistent anchor history,
//! and the session engine that ties them together on a single
//! cooperative scheduler thread.

pub mod config;
pub mod core;
pub mod error;
pub mod localization;
pub mod registry;
pub mod resolution;
pub mod session;
pub mod store;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{AnchorError, Result};
