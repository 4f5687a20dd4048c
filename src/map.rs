//! The map controller.
//!
//! [`TrailMap`] owns every piece of per-map state: the surface, the feature
//! store and its layer side-table, the active tool, the gesture lock, the
//! detail panel and the undo history. Events go in through
//! [`TrailMap::handle`]; feature mutations come out as
//! [`PendingOp`](crate::sync::PendingOp)s (see [`crate::sync`]).
//!
//! Every entry point ends with a render pass that closes a panel whose
//! feature is gone, rebuilds stale layers and pushes the gesture flag.

use std::collections::BTreeMap;
use std::rc::Rc;

use web_time::Instant;

use crate::backend::FeatureBackend;
use crate::capture::{CapturePhase, CapturedPath, FreehandCapture};
use crate::config::{AppConfig, PreferenceSource};
use crate::error::TrailError;
use crate::gesture::GestureLock;
use crate::history::UndoStack;
use crate::layers::FeatureLayers;
use crate::measure::MeasureTool;
use crate::message::{Key, MapEvent, Notice, Tool};
use crate::model::{
    Feature, FeatureDraft, FeatureKind, FeatureRef, LatLng, Marker, MarkerDraft, ProjectId, Route,
    RouteDraft,
};
use crate::panel::{DetailPanel, PanelMode};
use crate::quota::{QuotaSource, StaticQuota, Tier};
use crate::store::FeatureStore;
use crate::surface::{MapSurface, ScreenPoint};
use crate::sync::{InFlight, OpId, PendingOp};

/// Interactive map for one open project.
pub struct TrailMap<S: MapSurface> {
    pub(crate) surface: S,
    pub(crate) backend: Rc<dyn FeatureBackend>,
    pub(crate) quota: Box<dyn QuotaSource>,
    pub(crate) preferences: Box<dyn PreferenceSource>,
    pub(crate) store: FeatureStore,
    pub(crate) layers: FeatureLayers,
    pub(crate) gestures: GestureLock,
    pub(crate) tool: Tool,
    pub(crate) freehand: FreehandCapture,
    pub(crate) measure: MeasureTool,
    pub(crate) panel: Option<DetailPanel>,
    pub(crate) history: UndoStack,
    pub(crate) in_flight: BTreeMap<OpId, InFlight>,
    pub(crate) next_op: u64,
    /// Advances whenever the open project changes.
    pub(crate) epoch: u64,
    pub(crate) notices: Vec<Notice>,
}

impl<S: MapSurface> TrailMap<S> {
    /// Create a map on the free tier with the configured preferences.
    pub fn new(surface: S, backend: Rc<dyn FeatureBackend>, config: &AppConfig) -> Self {
        let mut map = Self {
            surface,
            backend,
            quota: Box::new(StaticQuota::new(Tier::Free, config.quota)),
            preferences: Box::new(config.preferences.clone()),
            store: FeatureStore::new(),
            layers: FeatureLayers::new(),
            gestures: GestureLock::new(),
            tool: Tool::Select,
            freehand: FreehandCapture::new(&config.capture),
            measure: MeasureTool::new(),
            panel: None,
            history: UndoStack::with_max_history(config.history.max_history),
            in_flight: BTreeMap::new(),
            next_op: 0,
            epoch: 0,
            notices: Vec::new(),
        };
        map.render();
        map
    }

    /// Use a different subscription source.
    pub fn with_quota(mut self, quota: impl QuotaSource + 'static) -> Self {
        self.quota = Box::new(quota);
        self
    }

    /// Use a different preference source.
    pub fn with_preferences(mut self, preferences: impl PreferenceSource + 'static) -> Self {
        self.preferences = Box::new(preferences);
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn store(&self) -> &FeatureStore {
        &self.store
    }

    pub fn layers(&self) -> &FeatureLayers {
        &self.layers
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn capture_phase(&self) -> CapturePhase {
        self.freehand.phase()
    }

    pub fn capture(&self) -> &FreehandCapture {
        &self.freehand
    }

    pub fn measure(&self) -> &MeasureTool {
        &self.measure
    }

    pub fn history(&self) -> &UndoStack {
        &self.history
    }

    pub fn gestures_enabled(&self) -> bool {
        self.gestures.gestures_enabled()
    }

    /// Number of backend requests started and not yet finished.
    pub fn pending_count(&self) -> usize {
        self.in_flight.len()
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Drain notices for display.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    // ========================================================================
    // Project
    // ========================================================================

    /// Open a project. Everything belonging to the previous one is dropped,
    /// and responses still in flight for it will be discarded.
    pub fn load_project(&mut self, project: ProjectId, markers: Vec<Marker>, routes: Vec<Route>) {
        self.exit_tool();
        for record in self.in_flight.values_mut() {
            if let Some(handle) = record.take_optimistic() {
                self.surface.remove_layer(handle);
            }
        }
        self.layers.clear(&mut self.surface);

        let (markers, foreign_markers): (Vec<_>, Vec<_>) =
            markers.into_iter().partition(|m| m.project_id == project);
        let (routes, foreign_routes): (Vec<_>, Vec<_>) =
            routes.into_iter().partition(|r| r.project_id == project);
        if !foreign_markers.is_empty() || !foreign_routes.is_empty() {
            log::warn!(
                "Skipped {} markers and {} routes not belonging to {project}",
                foreign_markers.len(),
                foreign_routes.len()
            );
        }

        self.store.load(project, markers, routes);
        self.panel = None;
        self.history.clear();
        self.epoch += 1;
        self.surface.set_tile_layer(self.preferences.tile_layer());
        self.render();
    }

    // ========================================================================
    // Tools
    // ========================================================================

    /// Switch tools. The previous tool is fully exited first.
    pub fn select_tool(&mut self, tool: Tool) {
        if self.tool == tool {
            return;
        }
        self.exit_tool();
        self.tool = tool;
        match tool {
            Tool::Freehand => self.freehand.arm(self.preferences.route_style()),
            Tool::Measure => self.measure.activate(),
            Tool::Select | Tool::PlaceMarker => {}
        }
        log::debug!("🔧 Tool selected: {}", tool.name());
        self.render();
    }

    /// Toolbar behaviour: selecting the active tool again turns it off.
    pub fn toggle_tool(&mut self, tool: Tool) {
        if self.tool == tool {
            self.select_tool(Tool::Select);
        } else {
            self.select_tool(tool);
        }
    }

    /// Remove the last measurement point.
    pub fn measure_undo(&mut self) -> bool {
        let undone = self.measure.undo(&mut self.surface);
        self.render();
        undone
    }

    fn exit_tool(&mut self) {
        match self.tool {
            Tool::Freehand => self.freehand.cancel(&mut self.surface),
            Tool::Measure => self.measure.exit(&mut self.surface),
            Tool::Select | Tool::PlaceMarker => {}
        }
        self.tool = Tool::Select;
    }

    // ========================================================================
    // Panel
    // ========================================================================

    pub fn panel(&self) -> Option<&DetailPanel> {
        self.panel.as_ref()
    }

    /// Current data of the feature shown in the panel.
    pub fn panel_feature(&self) -> Option<Feature> {
        self.panel
            .as_ref()
            .and_then(|panel| self.store.get(&panel.feature))
    }

    pub fn open_panel(&mut self, target: FeatureRef) -> Result<(), TrailError> {
        if !self.store.contains(&target) {
            return Err(TrailError::UnknownFeature(target));
        }
        log::debug!("Panel opened for {target}");
        self.panel = Some(DetailPanel::view(target));
        Ok(())
    }

    /// Switch the open panel to edit mode.
    pub fn edit_panel(&mut self) -> bool {
        match &mut self.panel {
            Some(panel) => {
                panel.mode = PanelMode::Edit;
                true
            }
            None => false,
        }
    }

    pub fn close_panel(&mut self) {
        if let Some(panel) = self.panel.take() {
            log::debug!("Panel closed for {}", panel.feature);
        }
    }

    // ========================================================================
    // Events
    // ========================================================================

    /// Process one surface event. Failures are reported as notices; a
    /// returned [`PendingOp`] must be run and handed to [`Self::finish`].
    pub fn handle(&mut self, event: MapEvent) -> Option<PendingOp> {
        let pending = match event {
            MapEvent::PointerDown(point) => {
                self.on_pointer_down(point);
                None
            }
            MapEvent::PointerMove(point) => {
                if self.tool == Tool::Freehand {
                    let at = self.surface.to_lat_lng(point);
                    self.freehand
                        .pointer_move(at, Instant::now(), &mut self.surface);
                }
                None
            }
            MapEvent::PointerUp(_) => self.on_pointer_up(),
            MapEvent::MapClick(point) => self.on_map_click(point),
            MapEvent::LayerClick(handle) => {
                if self.tool == Tool::Select {
                    match self.layers.resolve(handle).cloned() {
                        Some(target) => {
                            if let Err(err) = self.open_panel(target) {
                                self.report(&err);
                            }
                        }
                        None => log::debug!("Click on untagged layer {handle:?}"),
                    }
                }
                None
            }
            MapEvent::KeyPressed(Key::Escape) => {
                match self.tool {
                    Tool::Select => self.close_panel(),
                    _ => self.select_tool(Tool::Select),
                }
                None
            }
            MapEvent::KeyPressed(Key::Delete) => {
                let target = self
                    .panel
                    .as_ref()
                    .filter(|_| self.tool == Tool::Select)
                    .map(|panel| panel.feature.clone());
                target.and_then(|target| self.begin_delete(target).ok())
            }
        };
        self.render();
        pending
    }

    fn on_pointer_down(&mut self, point: ScreenPoint) {
        if self.tool != Tool::Freehand {
            return;
        }
        let at = self.surface.to_lat_lng(point);
        if let Err(err) = self.freehand.pointer_down(at, &self.gestures) {
            self.report(&err);
        }
    }

    fn on_pointer_up(&mut self) -> Option<PendingOp> {
        if self.tool != Tool::Freehand {
            return None;
        }
        let captured = self.freehand.pointer_up(&mut self.surface)?;
        self.create_route_from(captured)
    }

    fn create_route_from(&mut self, captured: CapturedPath) -> Option<PendingOp> {
        let Some(project) = self.store.project().cloned() else {
            self.report(&TrailError::NoProject);
            return None;
        };
        let name = format!("Route {}", self.store.count(FeatureKind::Route) + 1);
        let draft = RouteDraft::new(project, name, captured.path, self.preferences.route_style());
        self.begin_create(FeatureDraft::Route(draft)).ok()
    }

    fn on_map_click(&mut self, point: ScreenPoint) -> Option<PendingOp> {
        match self.tool {
            Tool::Measure => {
                let at = self.surface.to_lat_lng(point);
                self.measure.click(at, &mut self.surface);
                None
            }
            Tool::PlaceMarker => {
                let raw = self.surface.to_lat_lng(point);
                let Some(at) = LatLng::checked(raw.lat, raw.lng) else {
                    log::debug!("Ignoring marker click at invalid position {raw:?}");
                    return None;
                };
                let Some(project) = self.store.project().cloned() else {
                    self.report(&TrailError::NoProject);
                    return None;
                };
                let name = format!("Marker {}", self.store.count(FeatureKind::Marker) + 1);
                let draft = MarkerDraft::new(project, name, at);
                self.begin_create(FeatureDraft::Marker(draft)).ok()
            }
            Tool::Select | Tool::Freehand => None,
        }
    }

    // ========================================================================
    // Render pass and notices
    // ========================================================================

    pub(crate) fn render(&mut self) {
        if let Some(panel) = &self.panel {
            if !self.store.contains(&panel.feature) {
                log::debug!("Closing panel for removed {}", panel.feature);
                self.panel = None;
            }
        }
        self.layers.sync(&mut self.surface, &self.store);
        self.gestures.reconcile(&mut self.surface);
    }

    pub(crate) fn report(&mut self, err: &TrailError) {
        let notice = match err {
            TrailError::StaleSession => {
                log::debug!("{err}");
                return;
            }
            TrailError::Backend(_) => Notice::error(err.to_string()),
            _ => Notice::warning(err.to_string()),
        };
        log::warn!("{}", notice.message);
        self.notices.push(notice);
    }
}
