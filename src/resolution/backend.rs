//! Resolution backend trait and the mock implementation.
//!
//! The backend wraps the platform's anchor resolution primitive: terrain and
//! rooftop lookups start an asynchronous operation identified by a ticket
//! that is polled to a terminal state, while the geospatial path attaches
//! synchronously to a currently-sensed surface.

use std::collections::HashMap;

use crate::core::{GeoPoint, ScenePoint, UnitQuaternion};

/// Identifier of one outstanding backend operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TicketId(pub u64);

/// State of a polled backend operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PollState {
    /// Not yet terminal; poll again next tick.
    Pending,
    /// Resolved; the anchor is bound at `scene_position`.
    Success {
        /// Resolved position in the local scene frame.
        scene_position: ScenePoint,
    },
    /// The backend reported terminal failure.
    Failed,
}

/// Seam to the platform resolution primitive.
///
/// Implementations are driven from the single scheduler thread; none of the
/// methods may block.
pub trait ResolutionBackend {
    /// Start a terrain-model resolution. Returns immediately with a ticket.
    fn begin_terrain(&mut self, point: &GeoPoint, rotation: UnitQuaternion) -> TicketId;

    /// Start a rooftop-model resolution. Returns immediately with a ticket.
    fn begin_rooftop(&mut self, point: &GeoPoint, rotation: UnitQuaternion) -> TicketId;

    /// Attach directly to a currently-sensed environment surface.
    ///
    /// Synchronous: `None` means no surface is available at the requested
    /// coordinates and the resolution fails immediately.
    fn attach_to_surface(
        &mut self,
        point: &GeoPoint,
        rotation: UnitQuaternion,
    ) -> Option<ScenePoint>;

    /// Poll an outstanding operation once.
    ///
    /// After a terminal state is returned the ticket is forgotten; polling
    /// it again is a caller bug.
    fn poll(&mut self, ticket: TicketId) -> PollState;
}

struct MockTicket {
    remaining_ticks: u32,
    fail: bool,
    scene_position: ScenePoint,
}

/// In-memory backend with configurable latency and failure injection.
///
/// Used by the integration tests and the simulated daemon mode.
pub struct MockBackend {
    /// Poll cycles before a terrain/rooftop ticket turns terminal.
    pub latency_ticks: u32,
    /// Force terrain resolutions to fail.
    pub fail_terrain: bool,
    /// Force rooftop resolutions to fail.
    pub fail_rooftop: bool,
    /// Whether a sensed surface is available for geospatial attachment.
    pub surface_available: bool,
    /// Scene position reported for every successful resolution.
    pub resolve_at: ScenePoint,
    tickets: HashMap<TicketId, MockTicket>,
    next_ticket: u64,
}

impl MockBackend {
    /// Backend that succeeds after `latency_ticks` poll cycles.
    pub fn new(latency_ticks: u32) -> Self {
        Self {
            latency_ticks,
            fail_terrain: false,
            fail_rooftop: false,
            surface_available: true,
            resolve_at: ScenePoint::default(),
            tickets: HashMap::new(),
            next_ticket: 0,
        }
    }

    /// Number of tickets still outstanding.
    pub fn outstanding(&self) -> usize {
        self.tickets.len()
    }

    fn begin(&mut self, fail: bool) -> TicketId {
        let ticket = TicketId(self.next_ticket);
        self.next_ticket += 1;
        self.tickets.insert(
            ticket,
            MockTicket {
                remaining_ticks: self.latency_ticks,
                fail,
                scene_position: self.resolve_at,
            },
        );
        ticket
    }
}

impl ResolutionBackend for MockBackend {
    fn begin_terrain(&mut self, _point: &GeoPoint, _rotation: UnitQuaternion) -> TicketId {
        let fail = self.fail_terrain;
        self.begin(fail)
    }

    fn begin_rooftop(&mut self, _point: &GeoPoint, _rotation: UnitQuaternion) -> TicketId {
        let fail = self.fail_rooftop;
        self.begin(fail)
    }

    fn attach_to_surface(
        &mut self,
        _point: &GeoPoint,
        _rotation: UnitQuaternion,
    ) -> Option<ScenePoint> {
        if self.surface_available {
            Some(self.resolve_at)
        } else {
            None
        }
    }

    fn poll(&mut self, ticket: TicketId) -> PollState {
        if let Some(entry) = self.tickets.get_mut(&ticket) {
            if entry.remaining_ticks > 0 {
                entry.remaining_ticks -= 1;
                return PollState::Pending;
            }
        } else {
            return PollState::Failed;
        }

        match self.tickets.remove(&ticket) {
            Some(entry) if entry.fail => PollState::Failed,
            Some(entry) => PollState::Success {
                scene_position: entry.scene_position,
            },
            None => PollState::Failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point() -> GeoPoint {
        GeoPoint::new(49.0, 8.0, 0.0)
    }

    #[test]
    fn test_mock_resolves_after_latency() {
        let mut backend = MockBackend::new(2);
        backend.resolve_at = ScenePoint::new(1.0, 2.0, 3.0);
        let ticket = backend.begin_terrain(&point(), UnitQuaternion::identity());

        assert_eq!(backend.poll(ticket), PollState::Pending);
        assert_eq!(backend.poll(ticket), PollState::Pending);
        assert_eq!(
            backend.poll(ticket),
            PollState::Success {
                scene_position: ScenePoint::new(1.0, 2.0, 3.0)
            }
        );
        assert_eq!(backend.outstanding(), 0);
    }

    #[test]
    fn test_mock_failure_injection() {
        let mut backend = MockBackend::new(0);
        backend.fail_rooftop = true;
        let ticket = backend.begin_rooftop(&point(), UnitQuaternion::identity());
        assert_eq!(backend.poll(ticket), PollState::Failed);
    }

    #[test]
    fn test_surface_attachment_respects_availability() {
        let mut backend = MockBackend::new(0);
        assert!(backend
            .attach_to_surface(&point(), UnitQuaternion::identity())
            .is_some());

        backend.surface_available = false;
        assert!(backend
            .attach_to_surface(&point(), UnitQuaternion::identity())
            .is_none());
    }
}
