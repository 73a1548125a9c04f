//! Localization state machine.
//!
//! Tracks positioning quality over time and decides when the session is
//! localized well enough to place and resolve anchors.
//!
//! # State Machine
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                                                          │
//! │  ┌──────────────┐ first sample ┌────────────┐            │
//! │  │ Initializing │ ───────────▶ │ Localizing │ ◀──┐       │
//! │  └──────────────┘              └─────┬──────┘    │       │
//! │                                      │ accurate  │ lost  │
//! │                                      ▼           │       │
//! │                                ┌───────────┐     │       │
//! │                                │ Localized │ ────┘       │
//! │                                └───────────┘             │
//! │                                                          │
//! │  Localizing ──180 s of failing samples──▶ Failed         │
//! │  any state ──upstream fatal condition───▶ Failed         │
//! │  (Failed is terminal)                                    │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! The one-shot replay latch gates history replay: it is armed once after a
//! fresh store load and consumed by the first `Localized` transition, so a
//! quality regression and re-localization never replays history again.

use crate::core::PositioningSample;

use super::accuracy::PoseAccuracyEvaluator;

/// How long localization may keep failing before the session is torn down.
pub const LOCALIZATION_TIMEOUT_SECS: f64 = 180.0;

/// Reason string for the localization timeout failure.
pub const TIMEOUT_REASON: &str = "localization timed out";

/// Current localization phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LocalizationPhase {
    /// No sample ingested yet.
    #[default]
    Initializing,
    /// Accumulating samples, accuracy not yet sufficient.
    Localizing,
    /// Accuracy within thresholds; anchors may be placed and resolved.
    Localized,
    /// Terminal failure; the owning process must be torn down.
    Failed,
}

/// Phase-change events emitted by the state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum LocalizationEvent {
    /// First sample ingested; localization has begun.
    Started,
    /// Accuracy reached the thresholds.
    ///
    /// `replay` is true exactly once per store load: the first time the
    /// session localizes after the replay latch was armed.
    Localized {
        /// Whether stored history should be replayed now.
        replay: bool,
    },
    /// A later sample fell below the thresholds; quality regressed.
    Lost,
    /// Terminal failure (timeout or upstream fatal condition).
    Failed {
        /// Human-readable failure reason.
        reason: String,
    },
}

/// Consumes the positioning sample stream and tracks the session phase.
#[derive(Debug, Default)]
pub struct LocalizationStateMachine {
    evaluator: PoseAccuracyEvaluator,
    phase: LocalizationPhase,
    /// Seconds accumulated in Localizing since the last reset.
    elapsed_secs: f64,
    /// One-shot latch; armed only by `arm_replay`, consumed by the first
    /// Localized transition.
    replay_armed: bool,
}

impl LocalizationStateMachine {
    /// Create a state machine in the Initializing phase.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase.
    pub fn phase(&self) -> LocalizationPhase {
        self.phase
    }

    /// Seconds spent failing the accuracy test in the current episode.
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed_secs
    }

    /// Arm the replay latch after a fresh store load.
    ///
    /// Call with `true` when the loaded history holds at least one record.
    pub fn arm_replay(&mut self, has_records: bool) {
        self.replay_armed = has_records;
    }

    /// Ingest one positioning sample with the time delta since the previous
    /// one, returning a phase-change event if a transition occurred.
    pub fn ingest(&mut self, sample: &PositioningSample, dt_secs: f64) -> Option<LocalizationEvent> {
        match self.phase {
            LocalizationPhase::Failed => None,

            LocalizationPhase::Initializing => {
                self.phase = LocalizationPhase::Localizing;
                self.elapsed_secs = 0.0;
                Some(LocalizationEvent::Started)
            }

            LocalizationPhase::Localizing => {
                if self.evaluator.is_localized(sample) {
                    self.phase = LocalizationPhase::Localized;
                    self.elapsed_secs = 0.0;
                    let replay = std::mem::take(&mut self.replay_armed);
                    log::info!("Localization completed (replay history: {})", replay);
                    Some(LocalizationEvent::Localized { replay })
                } else {
                    self.elapsed_secs += dt_secs;
                    if self.elapsed_secs > LOCALIZATION_TIMEOUT_SECS {
                        log::error!("Localization timed out after {:.0} s", self.elapsed_secs);
                        self.phase = LocalizationPhase::Failed;
                        Some(LocalizationEvent::Failed {
                            reason: TIMEOUT_REASON.to_string(),
                        })
                    } else {
                        None
                    }
                }
            }

            LocalizationPhase::Localized => {
                if self.evaluator.is_localized(sample) {
                    None
                } else {
                    log::warn!("Lost localization, accuracy regressed");
                    self.phase = LocalizationPhase::Localizing;
                    self.elapsed_secs = 0.0;
                    Some(LocalizationEvent::Lost)
                }
            }
        }
    }

    /// Force a transition to Failed from any non-terminal state.
    ///
    /// Used when the upstream tracking subsystem reports a non-recoverable
    /// condition (session error, missing components, location-service
    /// failure).
    pub fn force_fail(&mut self, reason: &str) -> Option<LocalizationEvent> {
        if self.phase == LocalizationPhase::Failed {
            return None;
        }
        log::error!("Localization failed: {}", reason);
        self.phase = LocalizationPhase::Failed;
        Some(LocalizationEvent::Failed {
            reason: reason.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn good_sample() -> PositioningSample {
        PositioningSample {
            latitude: 49.0,
            longitude: 8.0,
            altitude: 100.0,
            horizontal_accuracy: 5.0,
            vertical_accuracy: 2.0,
            orientation_yaw_accuracy: 10.0,
            tracking: true,
        }
    }

    fn bad_sample() -> PositioningSample {
        PositioningSample {
            horizontal_accuracy: 100.0,
            ..good_sample()
        }
    }

    #[test]
    fn test_first_sample_starts_localizing() {
        let mut machine = LocalizationStateMachine::new();
        assert_eq!(machine.phase(), LocalizationPhase::Initializing);

        let event = machine.ingest(&bad_sample(), 0.1);
        assert_eq!(event, Some(LocalizationEvent::Started));
        assert_eq!(machine.phase(), LocalizationPhase::Localizing);
    }

    #[test]
    fn test_accurate_sample_localizes() {
        let mut machine = LocalizationStateMachine::new();
        machine.ingest(&bad_sample(), 0.1);

        let event = machine.ingest(&good_sample(), 0.1);
        assert_eq!(event, Some(LocalizationEvent::Localized { replay: false }));
        assert_eq!(machine.phase(), LocalizationPhase::Localized);
        assert_eq!(machine.elapsed_secs(), 0.0);
    }

    #[test]
    fn test_timeout_fails_exactly_once() {
        let mut machine = LocalizationStateMachine::new();
        machine.ingest(&bad_sample(), 0.0);

        let mut failures = 0;
        for _ in 0..200 {
            if let Some(LocalizationEvent::Failed { reason }) = machine.ingest(&bad_sample(), 1.0) {
                assert_eq!(reason, TIMEOUT_REASON);
                failures += 1;
            }
        }

        assert_eq!(failures, 1);
        assert_eq!(machine.phase(), LocalizationPhase::Failed);

        // Terminal: even an accurate sample cannot leave Failed.
        assert_eq!(machine.ingest(&good_sample(), 1.0), None);
        assert_eq!(machine.phase(), LocalizationPhase::Failed);
    }

    #[test]
    fn test_regression_emits_lost_and_relocalizes() {
        let mut machine = LocalizationStateMachine::new();
        machine.ingest(&bad_sample(), 0.1);
        machine.ingest(&good_sample(), 0.1);

        let event = machine.ingest(&bad_sample(), 0.1);
        assert_eq!(event, Some(LocalizationEvent::Lost));
        assert_eq!(machine.phase(), LocalizationPhase::Localizing);

        let event = machine.ingest(&good_sample(), 0.1);
        assert_eq!(event, Some(LocalizationEvent::Localized { replay: false }));
    }

    #[test]
    fn test_replay_latch_fires_once_per_arm() {
        let mut machine = LocalizationStateMachine::new();
        machine.arm_replay(true);
        machine.ingest(&bad_sample(), 0.1);

        assert_eq!(
            machine.ingest(&good_sample(), 0.1),
            Some(LocalizationEvent::Localized { replay: true })
        );

        // Regress and re-localize: no second replay.
        machine.ingest(&bad_sample(), 0.1);
        assert_eq!(
            machine.ingest(&good_sample(), 0.1),
            Some(LocalizationEvent::Localized { replay: false })
        );
    }

    #[test]
    fn test_timer_resets_after_regression() {
        let mut machine = LocalizationStateMachine::new();
        machine.ingest(&bad_sample(), 0.0);

        // Spend most of the timeout window, then localize.
        machine.ingest(&bad_sample(), 170.0);
        machine.ingest(&good_sample(), 1.0);
        machine.ingest(&bad_sample(), 1.0);

        // The timer restarted; another 170 s does not trip the timeout.
        assert_eq!(machine.ingest(&bad_sample(), 170.0), None);
        assert_eq!(machine.phase(), LocalizationPhase::Localizing);
    }

    #[test]
    fn test_force_fail_is_terminal() {
        let mut machine = LocalizationStateMachine::new();
        machine.ingest(&good_sample(), 0.1);

        let event = machine.force_fail("session error");
        assert!(matches!(event, Some(LocalizationEvent::Failed { .. })));
        assert_eq!(machine.force_fail("again"), None);
        assert_eq!(machine.phase(), LocalizationPhase::Failed);
    }
}
