//! Session engine: the cooperative tick loop.
//!
//! One logical scheduling thread drives everything. Per tick the engine
//! feeds the current positioning sample to the localization state machine,
//! polls every outstanding resolution request once, and applies completed
//! resolutions to the registry and history store. External collaborators
//! (UI tap-to-place, catalog restore) must serialize their calls onto the
//! same thread.
//!
//! All components arrive through the constructor; the engine holds no
//! ambient statics.

use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::core::{
    AnchorId, AnchorKind, AnchorRecord, GeoPoint, PositioningSample, ScenePoint, UnitQuaternion,
    rooftop_payload_scale,
};
use crate::localization::{LocalizationEvent, LocalizationPhase, LocalizationStateMachine};
use crate::registry::AnchorRegistry;
use crate::resolution::{
    AnchorResolutionService, RequestToken, ResolutionBackend, ResolutionCompletion,
    ResolutionOutcome, ResolveDispatch,
};
use crate::store::{AnchorHistoryStore, BlobStore, CAPACITY_LIMIT};

use super::events::{
    self, SessionEvent, SessionEventSender, anchor_failed_message, anchors_set_message,
    history_replayed_message,
};

/// One entry from the remote place catalog.
///
/// The download itself is the backend collaborator's concern; the engine
/// only receives the decoded placements.
#[derive(Debug, Clone)]
pub struct CatalogPlace {
    /// Geographic placement coordinate.
    pub point: GeoPoint,
    /// East-up-north rotation.
    pub rotation: UnitQuaternion,
}

/// Coordinates localization, anchor resolution, registry, and history store.
pub struct SessionEngine<B: ResolutionBackend, S: BlobStore> {
    machine: LocalizationStateMachine,
    service: AnchorResolutionService<B>,
    store: AnchorHistoryStore<S>,
    registry: AnchorRegistry,
    events: SessionEventSender,
    viewer_position: ScenePoint,
    next_record_id: u64,
    failed: bool,
    /// Tokens of the current replay batch still awaiting completion.
    replay_tokens: HashSet<RequestToken>,
    /// Whether a replay pass is in progress (its status not yet emitted).
    replay_active: bool,
}

impl<B: ResolutionBackend, S: BlobStore> SessionEngine<B, S> {
    /// Wire up an engine from its injected components.
    ///
    /// Arms the history replay latch when the loaded store holds records.
    pub fn new(
        service: AnchorResolutionService<B>,
        store: AnchorHistoryStore<S>,
        registry: AnchorRegistry,
        events: SessionEventSender,
    ) -> Self {
        let mut machine = LocalizationStateMachine::new();
        machine.arm_replay(!store.is_empty());
        let next_record_id = store.max_id() + 1;

        Self {
            machine,
            service,
            store,
            registry,
            events,
            viewer_position: ScenePoint::default(),
            next_record_id,
            failed: false,
            replay_tokens: HashSet::new(),
            replay_active: false,
        }
    }

    /// Current localization phase.
    pub fn phase(&self) -> LocalizationPhase {
        self.machine.phase()
    }

    /// The live anchor registry.
    pub fn registry(&self) -> &AnchorRegistry {
        &self.registry
    }

    /// The anchor history store.
    pub fn store(&self) -> &AnchorHistoryStore<S> {
        &self.store
    }

    /// Mutable access to the resolution service (simulation hooks).
    pub fn service_mut(&mut self) -> &mut AnchorResolutionService<B> {
        &mut self.service
    }

    /// Tear the engine down, handing back the history store.
    pub fn into_store(self) -> AnchorHistoryStore<S> {
        self.store
    }

    /// Whether the session hit a fatal condition.
    pub fn is_failed(&self) -> bool {
        self.failed
    }

    /// Update the viewer position used for rooftop payload scaling.
    pub fn set_viewer_position(&mut self, position: ScenePoint) {
        self.viewer_position = position;
    }

    /// Run one scheduler tick: ingest the positioning sample, then poll all
    /// outstanding resolutions once.
    pub fn tick(&mut self, sample: &PositioningSample, dt_secs: f64) {
        if self.failed {
            return;
        }

        if let Some(event) = self.machine.ingest(sample, dt_secs) {
            self.handle_localization_event(event);
        }

        for completion in self.service.poll_pending() {
            self.apply_completion(completion);
        }
    }

    /// Report a non-recoverable upstream condition (session error, missing
    /// components, location-service failure).
    pub fn report_fatal(&mut self, reason: &str) {
        if let Some(event) = self.machine.force_fail(reason) {
            self.handle_localization_event(event);
        }
    }

    /// Place a new anchor from external input (UI tap-to-place).
    ///
    /// Returns false without issuing a request when the session is not
    /// localized or the registry already holds the capacity limit.
    pub fn place_anchor(
        &mut self,
        point: GeoPoint,
        rotation: UnitQuaternion,
        kind: AnchorKind,
    ) -> bool {
        if self.machine.phase() != LocalizationPhase::Localized {
            log::warn!("Ignoring placement: not localized");
            return false;
        }
        if self.registry.count() >= CAPACITY_LIMIT {
            log::warn!(
                "Ignoring placement: capacity limit of {} live anchors reached",
                CAPACITY_LIMIT
            );
            return false;
        }

        let record = self.new_record(point, rotation, kind);
        self.dispatch(record);
        true
    }

    /// Replace all anchors with the decoded remote catalog.
    ///
    /// Clears the registry and history first (superseding every in-flight
    /// resolution), then places each entry as a terrain anchor.
    pub fn place_catalog(&mut self, places: Vec<CatalogPlace>) {
        self.clear_all();
        log::info!("Restoring {} place(s) from catalog", places.len());
        for place in places {
            let record = self.new_record(place.point, place.rotation, AnchorKind::Terrain);
            self.dispatch(record);
        }
    }

    /// Destroy every live anchor and empty the history.
    ///
    /// Outstanding resolution requests are superseded: a request completing
    /// after this call is dropped instead of re-populating the registry or
    /// store.
    pub fn clear_all(&mut self) {
        self.registry.clear();
        if let Err(e) = self.store.clear() {
            log::warn!("Failed to persist cleared history: {}", e);
        }
        self.service.invalidate_outstanding();
        // Superseded replay completions never arrive; abandon the batch.
        self.replay_tokens.clear();
        self.replay_active = false;
        self.send(SessionEvent::Status(
            events::ANCHORS_CLEARED_MESSAGE.to_string(),
        ));
    }

    /// Persist the history on shutdown.
    pub fn shutdown(&mut self) {
        if let Err(e) = self.store.persist() {
            log::warn!("Failed to persist history on shutdown: {}", e);
        }
    }

    fn handle_localization_event(&mut self, event: LocalizationEvent) {
        match event {
            LocalizationEvent::Started => {
                self.send(SessionEvent::Phase(LocalizationPhase::Localizing));
                self.send(SessionEvent::Status(events::LOCALIZING_MESSAGE.to_string()));
            }

            LocalizationEvent::Localized { replay } => {
                self.send(SessionEvent::Phase(LocalizationPhase::Localized));
                self.send(SessionEvent::Status(
                    events::LOCALIZATION_SUCCESS_MESSAGE.to_string(),
                ));
                if replay {
                    self.replay_history();
                }
            }

            LocalizationEvent::Lost => {
                self.send(SessionEvent::Phase(LocalizationPhase::Localizing));
                self.send(SessionEvent::Status(
                    events::LOCALIZATION_INSTRUCTION_MESSAGE.to_string(),
                ));
            }

            LocalizationEvent::Failed { reason } => {
                log::error!("Session failed: {}", reason);
                self.failed = true;
                self.send(SessionEvent::Phase(LocalizationPhase::Failed));
                self.send(SessionEvent::Fatal {
                    reason: events::LOCALIZATION_FAILURE_MESSAGE.to_string(),
                });
            }
        }
    }

    /// Issue one resolution request per stored record, in on-disk order.
    ///
    /// Runs once per store load, gated by the state machine's replay latch.
    /// The replay status is held back until the whole batch has completed,
    /// so the reported count reflects the anchors actually set.
    fn replay_history(&mut self) {
        let records: Vec<AnchorRecord> = self.store.records().to_vec();
        log::info!("Replaying {} anchor record(s) from history", records.len());
        self.replay_active = true;
        self.replay_tokens.clear();
        for record in records {
            match self.service.resolve(record) {
                ResolveDispatch::Pending(token) => {
                    self.replay_tokens.insert(token);
                }
                ResolveDispatch::Immediate(completion) => self.apply_completion(completion),
            }
        }
        self.finish_replay_if_done();
    }

    /// Emit the replay status once the last batch member has completed.
    fn finish_replay_if_done(&mut self) {
        if self.replay_active && self.replay_tokens.is_empty() {
            self.replay_active = false;
            self.send(SessionEvent::Status(history_replayed_message(
                self.registry.count(),
            )));
        }
    }

    fn new_record(
        &mut self,
        point: GeoPoint,
        rotation: UnitQuaternion,
        kind: AnchorKind,
    ) -> AnchorRecord {
        let id = AnchorId::new(self.next_record_id);
        self.next_record_id += 1;
        AnchorRecord {
            id,
            point,
            eun_rotation: rotation,
            heading_deg: 0.0,
            kind,
            created_at_us: now_us(),
        }
    }

    fn dispatch(&mut self, record: AnchorRecord) {
        match self.service.resolve(record) {
            ResolveDispatch::Pending(_) => {}
            ResolveDispatch::Immediate(completion) => self.apply_completion(completion),
        }
    }

    fn apply_completion(&mut self, completion: ResolutionCompletion) {
        let from_replay = self.replay_tokens.remove(&completion.token);
        let kind = completion.record.kind;
        match completion.outcome {
            ResolutionOutcome::Resolved { scene_position } => {
                let payload_scale = if kind == AnchorKind::Rooftop {
                    rooftop_payload_scale(scene_position, self.viewer_position)
                } else {
                    1.0
                };

                let handle =
                    self.registry
                        .add(completion.record.id, kind, scene_position, payload_scale);
                if let Err(e) = self.store.append(completion.record) {
                    log::warn!("Failed to persist anchor history: {}", e);
                }

                self.send(SessionEvent::AnchorResolved {
                    handle,
                    kind,
                    payload_scale,
                });
                self.send(SessionEvent::Status(anchors_set_message(
                    self.registry.count(),
                )));
            }

            ResolutionOutcome::Failed => {
                log::warn!("Failed to resolve a {} anchor", kind);
                self.send(SessionEvent::AnchorFailed { kind });
                self.send(SessionEvent::Status(anchor_failed_message(kind)));
            }
        }

        if from_replay {
            self.finish_replay_if_done();
        }
    }

    fn send(&self, event: SessionEvent) {
        // The receiver may already be gone during teardown.
        self.events.send(event).ok();
    }
}

/// Current wall-clock time in microseconds since epoch.
fn now_us() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or(0)
}
