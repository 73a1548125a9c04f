//! Pose accuracy thresholds for localization.

use crate::core::PositioningSample;

/// Orientation yaw accuracy threshold in degrees for completed localization.
pub const ORIENTATION_YAW_ACCURACY_THRESHOLD_DEG: f64 = 25.0;

/// Horizontal accuracy threshold in meters for completed localization.
pub const HORIZONTAL_ACCURACY_THRESHOLD_M: f64 = 20.0;

/// Decides whether a positioning sample is accurate enough to count as
/// localized.
///
/// The thresholds are fixed constants, not configurable at call time.
/// No side effects.
#[derive(Debug, Clone, Copy, Default)]
pub struct PoseAccuracyEvaluator;

impl PoseAccuracyEvaluator {
    /// True iff tracking is active and both accuracy figures are within
    /// their thresholds.
    pub fn is_localized(&self, sample: &PositioningSample) -> bool {
        sample.tracking
            && sample.orientation_yaw_accuracy <= ORIENTATION_YAW_ACCURACY_THRESHOLD_DEG
            && sample.horizontal_accuracy <= HORIZONTAL_ACCURACY_THRESHOLD_M
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(tracking: bool, horizontal: f64, yaw: f64) -> PositioningSample {
        PositioningSample {
            latitude: 0.0,
            longitude: 0.0,
            altitude: 0.0,
            horizontal_accuracy: horizontal,
            vertical_accuracy: 1.0,
            orientation_yaw_accuracy: yaw,
            tracking,
        }
    }

    #[test]
    fn test_accurate_tracked_sample_is_localized() {
        let eval = PoseAccuracyEvaluator;
        assert!(eval.is_localized(&sample(true, 20.0, 25.0)));
        assert!(eval.is_localized(&sample(true, 0.5, 1.0)));
    }

    #[test]
    fn test_horizontal_accuracy_over_threshold_fails() {
        let eval = PoseAccuracyEvaluator;
        assert!(!eval.is_localized(&sample(true, 20.1, 1.0)));
    }

    #[test]
    fn test_yaw_accuracy_over_threshold_fails() {
        let eval = PoseAccuracyEvaluator;
        assert!(!eval.is_localized(&sample(true, 1.0, 25.1)));
    }

    #[test]
    fn test_not_tracking_fails_regardless_of_accuracy() {
        let eval = PoseAccuracyEvaluator;
        assert!(!eval.is_localized(&sample(false, 0.1, 0.1)));
    }
}
