//! Feature mutations and the store/layer synchronization contract.
//!
//! A mutation is split in three so no borrow of the map is held across the
//! backend call:
//!
//! 1. `begin_*` validates, applies the local side (optimistic layer for a
//!    create, hidden layer for a delete) and returns a [`PendingOp`].
//! 2. [`PendingOp::run`] talks to the backend. It only holds the backend.
//! 3. [`TrailMap::finish`] applies the result, or rolls the local side back.
//!
//! Each request carries the [`SessionToken`] current when it started. A
//! response whose token no longer matches belongs to a project that has been
//! closed since, and is dropped.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::backend::{BackendError, FeatureBackend};
use crate::constants::MIN_ROUTE_POINTS;
use crate::error::TrailError;
use crate::history::Command;
use crate::map::TrailMap;
use crate::message::MapEvent;
use crate::model::{Feature, FeatureDraft, FeatureKind, FeaturePatch, FeatureRef, ProjectId};
use crate::quota::check_quota;
use crate::surface::{LayerHandle, LayerSpec, MapSurface};

/// Identifies one backend request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OpId(u64);

/// The project generation a request was issued in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken {
    project: Option<ProjectId>,
    epoch: u64,
}

/// Why a request was made.
#[derive(Debug)]
pub(crate) enum Origin {
    User,
    Undo(Command),
    Redo(Command),
}

impl Origin {
    fn command(&self) -> Option<&Command> {
        match self {
            Origin::User => None,
            Origin::Undo(cmd) | Origin::Redo(cmd) => Some(cmd),
        }
    }
}

/// Local state to confirm or roll back when the response arrives.
#[derive(Debug)]
pub(crate) enum Local {
    Create {
        kind: FeatureKind,
        optimistic: Option<LayerHandle>,
    },
    Update {
        before: Feature,
    },
    Delete {
        feature: Feature,
    },
}

/// Book-keeping for a request that has not finished.
#[derive(Debug)]
pub(crate) struct InFlight {
    token: SessionToken,
    target: Option<FeatureRef>,
    local: Local,
    origin: Origin,
}

impl InFlight {
    /// Hand over the optimistic layer so the caller can remove it.
    pub(crate) fn take_optimistic(&mut self) -> Option<LayerHandle> {
        match &mut self.local {
            Local::Create { optimistic, .. } => optimistic.take(),
            _ => None,
        }
    }
}

#[derive(Debug)]
enum Request {
    Create(FeatureDraft),
    Update(FeatureRef, FeaturePatch),
    Delete(FeatureRef),
}

impl Request {
    fn undoing(cmd: &Command) -> Self {
        match cmd {
            Command::Create { feature } => Request::Delete(feature.feature_ref()),
            Command::Delete { feature } => Request::Create(feature.to_draft()),
            Command::Update { before, after } => {
                Request::Update(after.feature_ref(), before.to_restoring_patch())
            }
        }
    }

    fn redoing(cmd: &Command) -> Self {
        match cmd {
            Command::Create { feature } => Request::Create(feature.to_draft()),
            Command::Delete { feature } => Request::Delete(feature.feature_ref()),
            Command::Update { before, after } => {
                Request::Update(before.feature_ref(), after.to_restoring_patch())
            }
        }
    }
}

/// A backend request ready to be awaited.
pub struct PendingOp {
    id: OpId,
    backend: Rc<dyn FeatureBackend>,
    request: Request,
}

impl fmt::Debug for PendingOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingOp")
            .field("id", &self.id)
            .field("request", &self.request)
            .finish_non_exhaustive()
    }
}

impl PendingOp {
    pub fn id(&self) -> OpId {
        self.id
    }

    /// Perform the request.
    pub async fn run(self) -> CompletedOp {
        let outcome = match self.request {
            Request::Create(draft) => Outcome::Created(self.backend.create(draft).await),
            Request::Update(target, patch) => {
                Outcome::Updated(self.backend.update(&target, patch).await)
            }
            Request::Delete(target) => Outcome::Deleted(self.backend.delete(&target).await),
        };
        CompletedOp {
            id: self.id,
            outcome,
        }
    }
}

#[derive(Debug)]
enum Outcome {
    Created(Result<Feature, BackendError>),
    Updated(Result<Feature, BackendError>),
    Deleted(Result<(), BackendError>),
}

/// Backend response for a [`PendingOp`], to be passed to [`TrailMap::finish`].
#[derive(Debug)]
pub struct CompletedOp {
    id: OpId,
    outcome: Outcome,
}

impl CompletedOp {
    pub fn id(&self) -> OpId {
        self.id
    }
}

impl<S: MapSurface> TrailMap<S> {
    /// Token for requests issued now.
    pub fn session_token(&self) -> SessionToken {
        SessionToken {
            project: self.store.project().cloned(),
            epoch: self.epoch,
        }
    }

    /// Whether a request for `target` is still in flight.
    pub fn is_busy(&self, target: &FeatureRef) -> bool {
        self.in_flight
            .values()
            .any(|record| record.target.as_ref() == Some(target))
    }

    // ========================================================================
    // Begin
    // ========================================================================

    /// Start persisting a new marker or route.
    pub fn begin_create(&mut self, draft: FeatureDraft) -> Result<PendingOp, TrailError> {
        self.start(Request::Create(draft), Origin::User)
    }

    /// Start an edit. Nothing changes locally until the backend confirms.
    pub fn begin_update(
        &mut self,
        target: FeatureRef,
        patch: FeaturePatch,
    ) -> Result<PendingOp, TrailError> {
        self.start(Request::Update(target, patch), Origin::User)
    }

    /// Start a delete. The feature's layer disappears immediately.
    pub fn begin_delete(&mut self, target: FeatureRef) -> Result<PendingOp, TrailError> {
        self.start(Request::Delete(target), Origin::User)
    }

    /// Start reverting the most recent mutation.
    pub fn undo(&mut self) -> Result<PendingOp, TrailError> {
        let cmd = self
            .history
            .pop_undo()
            .ok_or(TrailError::EmptyHistory("undo"))?;
        self.start(Request::undoing(&cmd), Origin::Undo(cmd))
    }

    /// Start re-applying the most recently undone mutation.
    pub fn redo(&mut self) -> Result<PendingOp, TrailError> {
        let cmd = self
            .history
            .pop_redo()
            .ok_or(TrailError::EmptyHistory("redo"))?;
        self.start(Request::redoing(&cmd), Origin::Redo(cmd))
    }

    fn start(&mut self, request: Request, origin: Origin) -> Result<PendingOp, TrailError> {
        let prepared = match &request {
            Request::Create(draft) => self.prepare_create(draft),
            Request::Update(target, patch) => self.prepare_update(target, patch),
            Request::Delete(target) => self.prepare_delete(target),
        };
        let (target, local) = match prepared {
            Ok(prepared) => prepared,
            Err(err) => return Err(self.abort(origin, err)),
        };

        self.next_op += 1;
        let id = OpId(self.next_op);
        log::debug!("🔄 {id:?} started: {request:?}");
        self.in_flight.insert(
            id,
            InFlight {
                token: self.session_token(),
                target,
                local,
                origin,
            },
        );
        self.render();
        Ok(PendingOp {
            id,
            backend: Rc::clone(&self.backend),
            request,
        })
    }

    fn prepare_create(
        &mut self,
        draft: &FeatureDraft,
    ) -> Result<(Option<FeatureRef>, Local), TrailError> {
        if self.store.project() != Some(draft.project_id()) {
            return Err(TrailError::NoProject);
        }
        let spec = match draft {
            FeatureDraft::Marker(m) => LayerSpec::Marker {
                at: m.position(),
                name: m.name.clone(),
            },
            FeatureDraft::Route(r) => {
                if r.path().len() < MIN_ROUTE_POINTS {
                    return Err(TrailError::invalid_geometry(format!(
                        "a route needs at least {MIN_ROUTE_POINTS} points, got {}",
                        r.path().len()
                    )));
                }
                LayerSpec::Polyline {
                    path: r.path().to_vec(),
                    style: r.style.clone(),
                    dashed: false,
                }
            }
        };

        // Shown right away, but untagged: it cannot be selected until confirmed.
        let optimistic = self.surface.add_layer(spec);

        let kind = draft.kind();
        let token = self.session_token();
        let creating = self
            .in_flight
            .values()
            .filter(|r| r.token == token && matches!(r.local, Local::Create { kind: k, .. } if k == kind))
            .count();
        if let Err(err) = check_quota(self.quota.as_ref(), kind, self.store.count(kind) + creating) {
            self.surface.remove_layer(optimistic);
            return Err(err);
        }

        Ok((
            None,
            Local::Create {
                kind,
                optimistic: Some(optimistic),
            },
        ))
    }

    fn prepare_update(
        &mut self,
        target: &FeatureRef,
        patch: &FeaturePatch,
    ) -> Result<(Option<FeatureRef>, Local), TrailError> {
        if patch.kind() != target.kind {
            return Err(TrailError::UnknownFeature(FeatureRef {
                kind: patch.kind(),
                id: target.id.clone(),
            }));
        }
        if let FeaturePatch::Route(p) = patch {
            if let Some(path) = p.new_path().filter(|path| path.len() < MIN_ROUTE_POINTS) {
                return Err(TrailError::invalid_geometry(format!(
                    "a route needs at least {MIN_ROUTE_POINTS} points, got {}",
                    path.len()
                )));
            }
        }
        let before = self.claim(target)?;
        Ok((Some(target.clone()), Local::Update { before }))
    }

    fn prepare_delete(
        &mut self,
        target: &FeatureRef,
    ) -> Result<(Option<FeatureRef>, Local), TrailError> {
        let feature = self.claim(target)?;
        self.layers.hide(&mut self.surface, target);
        Ok((Some(target.clone()), Local::Delete { feature }))
    }

    /// Current state of a feature that is free to be mutated.
    fn claim(&self, target: &FeatureRef) -> Result<Feature, TrailError> {
        let feature = self
            .store
            .get(target)
            .ok_or_else(|| TrailError::UnknownFeature(target.clone()))?;
        if self.is_busy(target) {
            return Err(TrailError::Busy(target.clone()));
        }
        Ok(feature)
    }

    /// Report a failure and return an undo/redo command to its stack.
    fn abort(&mut self, origin: Origin, err: TrailError) -> TrailError {
        match origin {
            Origin::User => {}
            Origin::Undo(cmd) => self.history.restore_undo(cmd),
            Origin::Redo(cmd) => self.history.restore_redo(cmd),
        }
        self.report(&err);
        err
    }

    // ========================================================================
    // Finish
    // ========================================================================

    /// Apply a backend response. Failures are rolled back and reported.
    pub fn finish(&mut self, done: CompletedOp) -> Result<(), TrailError> {
        let Some(mut record) = self.in_flight.remove(&done.id) else {
            log::warn!("Response for unknown request {:?}", done.id);
            return Err(TrailError::StaleSession);
        };

        if record.token != self.session_token() {
            if let Some(handle) = record.take_optimistic() {
                self.surface.remove_layer(handle);
            }
            log::info!(
                "Discarding {:?} response issued for {:?}",
                done.id,
                record.token
            );
            return Err(TrailError::StaleSession);
        }

        let result = match (record.local, done.outcome) {
            (Local::Create { optimistic, .. }, Outcome::Created(response)) => {
                if let Some(handle) = optimistic {
                    self.surface.remove_layer(handle);
                }
                self.finish_create(response, record.origin)
            }
            (Local::Update { before }, Outcome::Updated(response)) => {
                self.finish_update(before, response, record.origin)
            }
            (Local::Delete { feature }, Outcome::Deleted(response)) => {
                self.finish_delete(feature, response, record.origin)
            }
            (local, outcome) => {
                log::error!("Response {outcome:?} does not match request state {local:?}");
                match local {
                    Local::Create {
                        optimistic: Some(handle),
                        ..
                    } => self.surface.remove_layer(handle),
                    Local::Delete { feature } => self.layers.reveal(&feature.feature_ref()),
                    _ => {}
                }
                Err(self.abort(record.origin, TrailError::StaleSession))
            }
        };
        self.render();
        result
    }

    fn finish_create(
        &mut self,
        response: Result<Feature, BackendError>,
        origin: Origin,
    ) -> Result<(), TrailError> {
        let feature = match response {
            Ok(feature) => feature,
            Err(err) => return Err(self.abort(origin, err.into())),
        };
        let target = feature.feature_ref();
        log::info!("✅ Created {target}");
        self.store.insert(feature.clone());

        // A recreated feature comes back under a new id.
        if let Some(old) = origin.command().map(Command::target) {
            self.history.remap(&old.id, &target.id);
        }
        match origin {
            Origin::User => self.history.push(Command::Create { feature }),
            Origin::Undo(_) => self.history.undone(Command::Delete { feature }),
            Origin::Redo(_) => self.history.redone(Command::Create { feature }),
        }
        Ok(())
    }

    fn finish_update(
        &mut self,
        before: Feature,
        response: Result<Feature, BackendError>,
        origin: Origin,
    ) -> Result<(), TrailError> {
        let feature = match response {
            Ok(feature) => feature,
            Err(err) => return Err(self.abort(origin, err.into())),
        };
        let target = feature.feature_ref();
        if self.store.replace(feature.clone()).is_none() {
            log::warn!("Updated {target} is no longer in the store");
            return Err(self.abort(origin, TrailError::UnknownFeature(target)));
        }
        log::info!("✅ Updated {target}");

        match origin {
            Origin::User => self.history.push(Command::Update {
                before,
                after: feature,
            }),
            Origin::Undo(Command::Update { after, .. }) => self.history.undone(Command::Update {
                before: feature,
                after,
            }),
            Origin::Redo(Command::Update { before, .. }) => self.history.redone(Command::Update {
                before,
                after: feature,
            }),
            Origin::Undo(cmd) | Origin::Redo(cmd) => {
                log::error!("Update response for '{}'", cmd.description());
            }
        }
        Ok(())
    }

    fn finish_delete(
        &mut self,
        feature: Feature,
        response: Result<(), BackendError>,
        origin: Origin,
    ) -> Result<(), TrailError> {
        let target = feature.feature_ref();
        if let Err(err) = response {
            self.layers.reveal(&target);
            return Err(self.abort(origin, err.into()));
        }

        self.store.remove(&target);
        self.layers.reveal(&target);
        if self.panel.as_ref().is_some_and(|panel| panel.is_for(&target)) {
            self.close_panel();
        }
        log::info!("✅ Deleted {target}");

        match origin {
            Origin::User => self.history.push(Command::Delete { feature }),
            Origin::Undo(cmd) => self.history.undone(cmd),
            Origin::Redo(cmd) => self.history.redone(cmd),
        }
        Ok(())
    }
}

/// Run one event through a shared map, awaiting any request it starts.
///
/// The map is only borrowed on either side of the backend call, so other
/// events can be handled while the request is in flight.
pub async fn dispatch<S: MapSurface>(
    map: &RefCell<TrailMap<S>>,
    event: MapEvent,
) -> Result<(), TrailError> {
    let pending = map.borrow_mut().handle(event);
    match pending {
        Some(op) => complete(map, op).await,
        None => Ok(()),
    }
}

/// Await a request and apply its response to a shared map.
pub async fn complete<S: MapSurface>(
    map: &RefCell<TrailMap<S>>,
    op: PendingOp,
) -> Result<(), TrailError> {
    let done = op.run().await;
    map.borrow_mut().finish(done)
}
