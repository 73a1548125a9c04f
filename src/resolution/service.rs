//! Anchor resolution service.
//!
//! Issues asynchronous resolution requests and polls each outstanding
//! ticket once per scheduler tick until it reaches a terminal state. Every
//! request completes exactly once, on the tick thread, so completions never
//! race with each other or with the tick loop.
//!
//! There is no per-request timeout or cancellation primitive. A backend
//! ticket that never turns terminal stays pending forever; the pending count
//! is logged each tick so a stall is at least observable. What the service
//! does offer is a generation counter: bulk clears bump the generation, and
//! a completion carrying a stale generation is dropped before it can
//! re-populate the registry or store.

use crate::core::{AnchorKind, AnchorRecord, ScenePoint};

use super::backend::{PollState, ResolutionBackend, TicketId};

/// Identifier of one resolution request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestToken(u64);

/// Terminal result of one resolution request.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolutionOutcome {
    /// The anchor resolved and is bound at `scene_position`.
    Resolved {
        /// Resolved position in the local scene frame.
        scene_position: ScenePoint,
    },
    /// The strategy reported failure; nothing was mutated.
    Failed,
}

/// A completed request, delivered on the tick thread.
#[derive(Debug, Clone)]
pub struct ResolutionCompletion {
    /// Token of the originating request.
    pub token: RequestToken,
    /// The record the request was resolving.
    pub record: AnchorRecord,
    /// Terminal outcome.
    pub outcome: ResolutionOutcome,
}

/// Result of dispatching a resolution request.
#[derive(Debug)]
pub enum ResolveDispatch {
    /// Asynchronous strategy; completion arrives via `poll_pending`.
    Pending(RequestToken),
    /// Synchronous geospatial strategy; completion is immediate.
    Immediate(ResolutionCompletion),
}

struct PendingRequest {
    token: RequestToken,
    ticket: TicketId,
    record: AnchorRecord,
    generation: u64,
}

/// Drives resolution requests against a backend, one poll per tick.
pub struct AnchorResolutionService<B: ResolutionBackend> {
    backend: B,
    pending: Vec<PendingRequest>,
    next_token: u64,
    generation: u64,
}

impl<B: ResolutionBackend> AnchorResolutionService<B> {
    /// Create a service over the given backend.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            pending: Vec::new(),
            next_token: 0,
            generation: 0,
        }
    }

    /// Number of requests still outstanding.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Mutable access to the backend (used by the simulated daemon mode).
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Invalidate every outstanding request.
    ///
    /// Called on bulk clears: requests already in flight keep polling, but
    /// their completions are dropped as superseded instead of being
    /// delivered.
    pub fn invalidate_outstanding(&mut self) {
        self.generation += 1;
    }

    /// Issue a resolution request for `record`.
    ///
    /// Terrain and rooftop strategies return immediately with a pending
    /// token; the geospatial strategy attaches synchronously and completes
    /// inline. Every call creates an independent request, even for identical
    /// coordinates.
    pub fn resolve(&mut self, record: AnchorRecord) -> ResolveDispatch {
        let token = RequestToken(self.next_token);
        self.next_token += 1;

        let rotation = record.resolved_rotation();
        match record.kind {
            AnchorKind::Geospatial => {
                let outcome = match self.backend.attach_to_surface(&record.point, rotation) {
                    Some(scene_position) => ResolutionOutcome::Resolved { scene_position },
                    None => {
                        log::warn!(
                            "No sensed surface at ({:.6}, {:.6}); geospatial resolution failed",
                            record.point.latitude,
                            record.point.longitude
                        );
                        ResolutionOutcome::Failed
                    }
                };
                ResolveDispatch::Immediate(ResolutionCompletion {
                    token,
                    record,
                    outcome,
                })
            }

            AnchorKind::Terrain | AnchorKind::Rooftop => {
                let ticket = if record.kind == AnchorKind::Terrain {
                    self.backend.begin_terrain(&record.point, rotation)
                } else {
                    self.backend.begin_rooftop(&record.point, rotation)
                };
                log::debug!(
                    "Resolution request {:?} started ({} anchor at {:.6}, {:.6})",
                    token,
                    record.kind,
                    record.point.latitude,
                    record.point.longitude
                );
                self.pending.push(PendingRequest {
                    token,
                    ticket,
                    record,
                    generation: self.generation,
                });
                ResolveDispatch::Pending(token)
            }
        }
    }

    /// Poll every outstanding request once and drain the completions.
    ///
    /// Called once per scheduler tick. Superseded completions (issued before
    /// the last `invalidate_outstanding`) are dropped here.
    pub fn poll_pending(&mut self) -> Vec<ResolutionCompletion> {
        let mut completions = Vec::new();
        let current_generation = self.generation;

        let mut index = 0;
        while index < self.pending.len() {
            let state = self.backend.poll(self.pending[index].ticket);
            let outcome = match state {
                PollState::Pending => {
                    index += 1;
                    continue;
                }
                PollState::Success { scene_position } => {
                    ResolutionOutcome::Resolved { scene_position }
                }
                PollState::Failed => ResolutionOutcome::Failed,
            };

            let request = self.pending.swap_remove(index);
            if request.generation < current_generation {
                log::debug!(
                    "Dropping superseded resolution {:?} ({} anchor)",
                    request.token,
                    request.record.kind
                );
                continue;
            }

            completions.push(ResolutionCompletion {
                token: request.token,
                record: request.record,
                outcome,
            });
        }

        if !self.pending.is_empty() {
            log::trace!("{} resolution request(s) still pending", self.pending.len());
        }

        completions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AnchorId, GeoPoint, UnitQuaternion};
    use crate::resolution::backend::MockBackend;

    fn record(kind: AnchorKind) -> AnchorRecord {
        AnchorRecord {
            id: AnchorId::new(1),
            point: GeoPoint::new(49.8097, 8.8905, 0.0),
            eun_rotation: UnitQuaternion::from_yaw_deg(90.0),
            heading_deg: 0.0,
            kind,
            created_at_us: 1_000_000,
        }
    }

    #[test]
    fn test_terrain_completes_after_polling() {
        let mut service = AnchorResolutionService::new(MockBackend::new(2));
        let dispatch = service.resolve(record(AnchorKind::Terrain));
        assert!(matches!(dispatch, ResolveDispatch::Pending(_)));
        assert_eq!(service.pending_count(), 1);

        assert!(service.poll_pending().is_empty());
        assert!(service.poll_pending().is_empty());

        let completions = service.poll_pending();
        assert_eq!(completions.len(), 1);
        assert!(matches!(
            completions[0].outcome,
            ResolutionOutcome::Resolved { .. }
        ));
        assert_eq!(service.pending_count(), 0);
    }

    #[test]
    fn test_completion_fires_exactly_once() {
        let mut service = AnchorResolutionService::new(MockBackend::new(0));
        service.resolve(record(AnchorKind::Terrain));

        assert_eq!(service.poll_pending().len(), 1);
        for _ in 0..5 {
            assert!(service.poll_pending().is_empty());
        }
    }

    #[test]
    fn test_geospatial_resolves_synchronously() {
        let mut service = AnchorResolutionService::new(MockBackend::new(10));
        match service.resolve(record(AnchorKind::Geospatial)) {
            ResolveDispatch::Immediate(completion) => {
                assert!(matches!(
                    completion.outcome,
                    ResolutionOutcome::Resolved { .. }
                ));
            }
            ResolveDispatch::Pending(_) => panic!("geospatial must complete inline"),
        }
        assert_eq!(service.pending_count(), 0);
    }

    #[test]
    fn test_geospatial_fails_without_surface() {
        let mut backend = MockBackend::new(0);
        backend.surface_available = false;
        let mut service = AnchorResolutionService::new(backend);

        match service.resolve(record(AnchorKind::Geospatial)) {
            ResolveDispatch::Immediate(completion) => {
                assert_eq!(completion.outcome, ResolutionOutcome::Failed);
            }
            ResolveDispatch::Pending(_) => panic!("geospatial must complete inline"),
        }
    }

    #[test]
    fn test_rooftop_failure_reported() {
        let mut backend = MockBackend::new(1);
        backend.fail_rooftop = true;
        let mut service = AnchorResolutionService::new(backend);
        service.resolve(record(AnchorKind::Rooftop));

        assert!(service.poll_pending().is_empty());
        let completions = service.poll_pending();
        assert_eq!(completions.len(), 1);
        assert_eq!(completions[0].outcome, ResolutionOutcome::Failed);
    }

    #[test]
    fn test_invalidated_request_is_dropped() {
        let mut service = AnchorResolutionService::new(MockBackend::new(1));
        service.resolve(record(AnchorKind::Terrain));
        service.invalidate_outstanding();

        assert!(service.poll_pending().is_empty());
        // Second poll reaches the terminal state but the completion is stale.
        assert!(service.poll_pending().is_empty());
        assert_eq!(service.pending_count(), 0);
    }

    #[test]
    fn test_identical_coordinates_are_independent_requests() {
        let mut service = AnchorResolutionService::new(MockBackend::new(0));
        service.resolve(record(AnchorKind::Terrain));
        service.resolve(record(AnchorKind::Terrain));
        assert_eq!(service.pending_count(), 2);
        assert_eq!(service.poll_pending().len(), 2);
    }
}
