//! Persisted anchor records and the ordered history collection.

use serde::{Deserialize, Serialize};

use super::geo::{GeoPoint, UnitQuaternion};

/// Opaque identifier of an anchor record.
///
/// Assigned from a session-monotonic counter; stable across persistence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AnchorId(u64);

impl AnchorId {
    /// Create an id from its raw value.
    #[inline]
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw id value.
    #[inline]
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

/// Strategy used to bind an anchor into the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnchorKind {
    /// Attached directly to a currently-sensed environment surface.
    Geospatial,
    /// Resolved against the terrain elevation model.
    Terrain,
    /// Resolved against the rooftop/building elevation model.
    Rooftop,
}

impl std::fmt::Display for AnchorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnchorKind::Geospatial => write!(f, "Geospatial"),
            AnchorKind::Terrain => write!(f, "Terrain"),
            AnchorKind::Rooftop => write!(f, "Rooftop"),
        }
    }
}

/// A persisted anchor placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorRecord {
    /// Opaque record id
    pub id: AnchorId,
    /// Geographic placement coordinate
    pub point: GeoPoint,
    /// East-up-north rotation; identity means "derive from heading" (legacy)
    pub eun_rotation: UnitQuaternion,
    /// Compass heading in degrees, used only for legacy identity rotations
    pub heading_deg: f64,
    /// Resolution strategy
    pub kind: AnchorKind,
    /// Creation timestamp in microseconds since epoch
    pub created_at_us: u64,
}

impl AnchorRecord {
    /// The rotation to resolve this record with.
    ///
    /// Records written by old app versions store an identity placeholder
    /// and a compass heading instead; reconstruct the yaw rotation from it.
    pub fn resolved_rotation(&self) -> UnitQuaternion {
        if self.eun_rotation.is_identity() {
            UnitQuaternion::from_yaw_deg(180.0 - self.heading_deg)
        } else {
            self.eun_rotation
        }
    }
}

/// Ordered collection of anchor records, newest first after every mutation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnchorHistory {
    /// The records, sorted by `created_at_us` descending.
    pub records: Vec<AnchorRecord>,
}

impl AnchorHistory {
    /// Re-sort newest first and truncate to `capacity` entries.
    ///
    /// Standing invariant, re-applied after every mutation.
    pub fn enforce_capacity(&mut self, capacity: usize) {
        self.records
            .sort_by(|a, b| b.created_at_us.cmp(&a.created_at_us));
        self.records.truncate(capacity);
    }

    /// Drop every record older than `max_age_us` relative to `now_us`.
    ///
    /// Returns the number of records removed.
    pub fn prune_older_than(&mut self, now_us: u64, max_age_us: u64) -> usize {
        let before = self.records.len();
        self.records
            .retain(|r| now_us.saturating_sub(r.created_at_us) <= max_age_us);
        before - self.records.len()
    }

    /// Largest record id present, if any.
    pub fn max_id(&self) -> Option<AnchorId> {
        self.records.iter().map(|r| r.id).max()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: u64, created_at_us: u64) -> AnchorRecord {
        AnchorRecord {
            id: AnchorId::new(id),
            point: GeoPoint::new(49.0, 8.0, 0.0),
            eun_rotation: UnitQuaternion::identity(),
            heading_deg: 0.0,
            kind: AnchorKind::Terrain,
            created_at_us,
        }
    }

    #[test]
    fn test_enforce_capacity_keeps_newest() {
        let mut history = AnchorHistory::default();
        for i in 0..10 {
            history.records.push(record(i, i * 1_000_000));
        }

        history.enforce_capacity(3);

        assert_eq!(history.len(), 3);
        assert_eq!(history.records[0].created_at_us, 9_000_000);
        assert_eq!(history.records[2].created_at_us, 7_000_000);
    }

    #[test]
    fn test_prune_removes_expired_only() {
        let mut history = AnchorHistory::default();
        history.records.push(record(0, 1_000));
        history.records.push(record(1, 500_000));

        let removed = history.prune_older_than(600_000, 200_000);

        assert_eq!(removed, 1);
        assert_eq!(history.records[0].id, AnchorId::new(1));
    }

    #[test]
    fn test_legacy_identity_rotation_derives_from_heading() {
        let mut r = record(0, 0);
        r.heading_deg = 180.0;
        let q = r.resolved_rotation();
        // 180 - 180 = 0 degrees of yaw.
        assert!(q.is_identity());

        r.eun_rotation = UnitQuaternion::from_yaw_deg(90.0);
        assert_eq!(r.resolved_rotation(), r.eun_rotation);
    }
}
