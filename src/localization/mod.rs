//! Localization quality tracking.
//!
//! This module provides:
//! - `PoseAccuracyEvaluator`: pure accuracy-threshold check per sample
//! - `LocalizationStateMachine`: phase tracking with timeout and replay latch

pub mod accuracy;
pub mod state_machine;

pub use accuracy::PoseAccuracyEvaluator;
pub use state_machine::{LocalizationEvent, LocalizationPhase, LocalizationStateMachine};
