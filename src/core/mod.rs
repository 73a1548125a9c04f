//! Foundation types shared by every layer.

pub mod geo;
pub mod record;
pub mod sample;

pub use geo::{GeoPoint, ScenePoint, UnitQuaternion, rooftop_payload_scale};
pub use record::{AnchorHistory, AnchorId, AnchorKind, AnchorRecord};
pub use sample::PositioningSample;
