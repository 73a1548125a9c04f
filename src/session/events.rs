//! Session events and user-facing status strings.
//!
//! The engine owns no UI: visibility toggling, snack bars, and teardown
//! prompts are the receiving collaborator's responsibility. Everything the
//! UI needs arrives as `SessionEvent` values over a channel.

use crossbeam_channel::{Receiver, Sender, unbounded};

use crate::core::AnchorKind;
use crate::localization::LocalizationPhase;
use crate::registry::AnchorHandle;
use crate::store::CAPACITY_LIMIT;

/// Status shown while localizing to set an anchor.
pub const LOCALIZING_MESSAGE: &str = "Localizing your device to set anchor.";

/// Status shown when a sample fails the accuracy thresholds.
pub const LOCALIZATION_INSTRUCTION_MESSAGE: &str =
    "Point your camera at buildings, stores, and signs near you.";

/// Fatal message shown when localization fails or times out.
pub const LOCALIZATION_FAILURE_MESSAGE: &str =
    "Localization not possible.\nClose and open the app to restart the session.";

/// Status shown when localization completes.
pub const LOCALIZATION_SUCCESS_MESSAGE: &str = "Localization completed.";

/// Status shown after a clear-all.
pub const ANCHORS_CLEARED_MESSAGE: &str = "Anchor(s) cleared!";

/// How long a fatal message stays on screen before process teardown.
pub const ERROR_DISPLAY_SECS: u64 = 3;

/// Status line after a successful anchor placement.
pub fn anchors_set_message(count: usize) -> String {
    format!("{} / {} Anchor(s) Set!", count, CAPACITY_LIMIT)
}

/// Status line after a failed anchor placement.
pub fn anchor_failed_message(kind: AnchorKind) -> String {
    format!("Failed to set a {} anchor!", kind)
}

/// Status line after a history replay pass.
pub fn history_replayed_message(count: usize) -> String {
    format!("{} anchor(s) set from history.", count)
}

/// Events emitted by the session engine.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The localization phase changed.
    Phase(LocalizationPhase),
    /// One-line status text for the snack bar.
    Status(String),
    /// An anchor resolved and was registered.
    AnchorResolved {
        /// Handle of the new runtime anchor.
        handle: AnchorHandle,
        /// Resolution strategy.
        kind: AnchorKind,
        /// Scale for the attached visual payload.
        payload_scale: f32,
    },
    /// An anchor resolution failed; nothing was mutated.
    AnchorFailed {
        /// Resolution strategy that failed.
        kind: AnchorKind,
    },
    /// Non-recoverable condition; tear the process down after
    /// [`ERROR_DISPLAY_SECS`].
    Fatal {
        /// Failure reason.
        reason: String,
    },
}

/// Sender end of the session event channel (held by the engine).
pub type SessionEventSender = Sender<SessionEvent>;

/// Receiver end of the session event channel (held by the UI collaborator).
pub type SessionEventReceiver = Receiver<SessionEvent>;

/// Create a new session event channel pair.
pub fn create_event_channel() -> (SessionEventSender, SessionEventReceiver) {
    unbounded()
}
