//! In-memory bookkeeping of live runtime anchors.

use crate::core::{AnchorId, AnchorKind, ScenePoint};

/// Handle of a live anchor in the scene graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnchorHandle(u64);

impl AnchorHandle {
    /// Raw handle value.
    #[inline]
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

/// A resolved anchor bound into the live scene graph.
///
/// Backing object for zero or more attached visual payloads. References the
/// originating record by id; the record itself stays owned by the history
/// store.
#[derive(Debug, Clone)]
pub struct RuntimeAnchor {
    /// Registry-assigned handle.
    pub handle: AnchorHandle,
    /// Id of the originating anchor record.
    pub record_id: AnchorId,
    /// Resolution strategy the anchor was created with.
    pub kind: AnchorKind,
    /// Resolved position in the local scene frame.
    pub scene_position: ScenePoint,
    /// Scale applied to the attached visual payload.
    pub payload_scale: f32,
}

/// Registry of live anchor handles.
///
/// Pure bookkeeping: no deduplication (the same coordinates may be
/// registered multiple times as distinct handles), ordering irrelevant.
#[derive(Debug, Default)]
pub struct AnchorRegistry {
    anchors: Vec<RuntimeAnchor>,
    next_handle: u64,
}

impl AnchorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resolved anchor and return its handle.
    pub fn add(
        &mut self,
        record_id: AnchorId,
        kind: AnchorKind,
        scene_position: ScenePoint,
        payload_scale: f32,
    ) -> AnchorHandle {
        let handle = AnchorHandle(self.next_handle);
        self.next_handle += 1;
        self.anchors.push(RuntimeAnchor {
            handle,
            record_id,
            kind,
            scene_position,
            payload_scale,
        });
        handle
    }

    /// Destroy every tracked handle and empty the registry.
    pub fn clear(&mut self) {
        self.anchors.clear();
    }

    /// Number of live anchors.
    pub fn count(&self) -> usize {
        self.anchors.len()
    }

    /// Iterate over live anchors.
    pub fn iter(&self) -> impl Iterator<Item = &RuntimeAnchor> {
        self.anchors.iter()
    }
}
