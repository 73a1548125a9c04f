//! Geographic and scene-space primitives.

use serde::{Deserialize, Serialize};

/// A geographic coordinate in WGS84.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
    /// Altitude in meters above the WGS84 ellipsoid
    pub altitude: f64,
}

impl GeoPoint {
    /// Create a new geographic point.
    #[inline]
    pub fn new(latitude: f64, longitude: f64, altitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude,
        }
    }
}

/// A position in the local scene frame, in meters.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScenePoint {
    /// X coordinate in meters
    pub x: f32,
    /// Y coordinate in meters (up)
    pub y: f32,
    /// Z coordinate in meters
    pub z: f32,
}

impl ScenePoint {
    /// Create a new scene point.
    #[inline]
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance to another scene point.
    #[inline]
    pub fn distance(&self, other: &ScenePoint) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// Raw quaternion components as stored on disk.
///
/// Legacy records may hold an unnormalized or identity placeholder value,
/// so deserialization always goes through [`UnitQuaternion::new`].
#[derive(Deserialize)]
struct RawQuaternion {
    x: f32,
    y: f32,
    z: f32,
    w: f32,
}

/// A unit rotation (east-up-north frame).
///
/// Always normalized: constructors renormalize their input, and a
/// zero-length input collapses to identity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawQuaternion")]
pub struct UnitQuaternion {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
    /// Z component
    pub z: f32,
    /// W (scalar) component
    pub w: f32,
}

impl UnitQuaternion {
    /// Create a normalized quaternion from raw components.
    pub fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        let len = (x * x + y * y + z * z + w * w).sqrt();
        if len <= f32::EPSILON {
            return Self::identity();
        }
        Self {
            x: x / len,
            y: y / len,
            z: z / len,
            w: w / len,
        }
    }

    /// The identity rotation.
    ///
    /// In persisted history this value is a legacy placeholder meaning
    /// "derive the rotation from the stored heading".
    #[inline]
    pub fn identity() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            w: 1.0,
        }
    }

    /// Whether this is the identity placeholder.
    #[inline]
    pub fn is_identity(&self) -> bool {
        *self == Self::identity()
    }

    /// Rotation of `angle_deg` degrees around the up axis.
    pub fn from_yaw_deg(angle_deg: f64) -> Self {
        let half = (angle_deg.to_radians() / 2.0) as f32;
        Self::new(0.0, half.sin(), 0.0, half.cos())
    }
}

impl Default for UnitQuaternion {
    fn default() -> Self {
        Self::identity()
    }
}

impl From<RawQuaternion> for UnitQuaternion {
    fn from(raw: RawQuaternion) -> Self {
        UnitQuaternion::new(raw.x, raw.y, raw.z, raw.w)
    }
}

/// Rooftop anchor distance range mapped to payload scale, in meters.
const ROOFTOP_DISTANCE_MIN_M: f32 = 2.0;
const ROOFTOP_DISTANCE_MAX_M: f32 = 20.0;

/// Visual payload scale for a rooftop anchor.
///
/// Maps the anchor-to-viewer distance from [2, 20] meters linearly to a
/// scale of [1, 2]. Distances outside the range clamp to the nearest bound.
/// Applied to the attached payload only, never to the anchor record.
pub fn rooftop_payload_scale(anchor: ScenePoint, viewer: ScenePoint) -> f32 {
    let distance = anchor.distance(&viewer);
    let mapped = distance.clamp(ROOFTOP_DISTANCE_MIN_M, ROOFTOP_DISTANCE_MAX_M);
    (mapped - ROOFTOP_DISTANCE_MIN_M) / (ROOFTOP_DISTANCE_MAX_M - ROOFTOP_DISTANCE_MIN_M) + 1.0
}
