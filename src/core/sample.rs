//! Positioning samples produced by the tracking subsystem.

use serde::{Deserialize, Serialize};

/// One snapshot of the camera-based geolocation estimate.
///
/// Produced once per scheduler tick by the external positioning subsystem.
/// Transient: never persisted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PositioningSample {
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
    /// Altitude in meters
    pub altitude: f64,
    /// Horizontal position accuracy in meters (68% confidence)
    pub horizontal_accuracy: f64,
    /// Vertical position accuracy in meters
    pub vertical_accuracy: f64,
    /// Orientation yaw accuracy in degrees
    pub orientation_yaw_accuracy: f64,
    /// Whether the tracking subsystem currently reports active tracking
    pub tracking: bool,
}

impl PositioningSample {
    /// A sample with no tracking and worst-case accuracies.
    ///
    /// What the tracking subsystem reports before its first fix.
    pub fn untracked() -> Self {
        Self {
            latitude: 0.0,
            longitude: 0.0,
            altitude: 0.0,
            horizontal_accuracy: f64::MAX,
            vertical_accuracy: f64::MAX,
            orientation_yaw_accuracy: f64::MAX,
            tracking: false,
        }
    }
}
