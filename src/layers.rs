//! Side-table between rendered layers and the features they show.
//!
//! A layer's tag is recorded when the layer is created and dropped when it
//! is removed; a handle is never re-tagged. Rebuilds are per kind, tear
//! down before they install, and only run when the store's revision for
//! that kind moved, so repeated syncs with an unchanged store do nothing.

use std::collections::{HashMap, HashSet};

use crate::model::{FeatureKind, FeatureRef};
use crate::store::FeatureStore;
use crate::surface::{LayerHandle, LayerSpec, MapSurface};

#[derive(Debug, Default)]
pub struct FeatureLayers {
    by_handle: HashMap<LayerHandle, FeatureRef>,
    by_feature: HashMap<FeatureRef, LayerHandle>,
    /// Features whose layer is withheld while a delete is in flight.
    hidden: HashSet<FeatureRef>,
    rendered_markers: Option<u64>,
    rendered_routes: Option<u64>,
}

impl FeatureLayers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feature shown by a layer, if the layer belongs to one.
    pub fn resolve(&self, handle: LayerHandle) -> Option<&FeatureRef> {
        self.by_handle.get(&handle)
    }

    pub fn handle_for(&self, target: &FeatureRef) -> Option<LayerHandle> {
        self.by_feature.get(target).copied()
    }

    /// Number of tagged layers on the surface.
    pub fn len(&self) -> usize {
        self.by_handle.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_handle.is_empty()
    }

    pub fn is_hidden(&self, target: &FeatureRef) -> bool {
        self.hidden.contains(target)
    }

    /// Bring the surface in line with the store. Returns whether anything was rebuilt.
    pub fn sync(&mut self, surface: &mut dyn MapSurface, store: &FeatureStore) -> bool {
        let mut rebuilt = false;
        for kind in [FeatureKind::Marker, FeatureKind::Route] {
            if *self.rendered(kind) != Some(store.revision(kind)) {
                self.rebuild(surface, store, kind);
                rebuilt = true;
            }
        }
        rebuilt
    }

    /// Remove a feature's layer now and keep it out of rebuilds until [`Self::reveal`].
    pub fn hide(&mut self, surface: &mut dyn MapSurface, target: &FeatureRef) {
        if let Some(handle) = self.by_feature.remove(target) {
            self.by_handle.remove(&handle);
            surface.remove_layer(handle);
        }
        self.hidden.insert(target.clone());
    }

    /// Undo [`Self::hide`]. The next sync redraws the kind.
    pub fn reveal(&mut self, target: &FeatureRef) {
        if self.hidden.remove(target) {
            *self.rendered(target.kind) = None;
        }
    }

    /// Remove every tagged layer and forget all state.
    pub fn clear(&mut self, surface: &mut dyn MapSurface) {
        for kind in [FeatureKind::Marker, FeatureKind::Route] {
            self.teardown(surface, kind);
            *self.rendered(kind) = None;
        }
        self.hidden.clear();
    }

    fn rendered(&mut self, kind: FeatureKind) -> &mut Option<u64> {
        match kind {
            FeatureKind::Marker => &mut self.rendered_markers,
            FeatureKind::Route => &mut self.rendered_routes,
        }
    }

    fn rebuild(&mut self, surface: &mut dyn MapSurface, store: &FeatureStore, kind: FeatureKind) {
        self.teardown(surface, kind);

        let specs: Vec<(FeatureRef, LayerSpec)> = match kind {
            FeatureKind::Marker => store
                .markers()
                .iter()
                .map(|m| {
                    (
                        m.feature_ref(),
                        LayerSpec::Marker {
                            at: m.position(),
                            name: m.name.clone(),
                        },
                    )
                })
                .collect(),
            FeatureKind::Route => store
                .routes()
                .iter()
                .map(|r| {
                    (
                        r.feature_ref(),
                        LayerSpec::Polyline {
                            path: r.path().to_vec(),
                            style: r.style.clone(),
                            dashed: false,
                        },
                    )
                })
                .collect(),
        };

        for (target, spec) in specs {
            if self.hidden.contains(&target) {
                continue;
            }
            let handle = surface.add_layer(spec);
            self.tag(surface, handle, target);
        }

        *self.rendered(kind) = Some(store.revision(kind));
        log::debug!("Rebuilt {kind} layers ({} tagged in total)", self.len());
    }

    fn tag(&mut self, surface: &mut dyn MapSurface, handle: LayerHandle, target: FeatureRef) {
        // One layer per feature; an untagged leftover would never be torn down.
        if let Some(old) = self.by_feature.insert(target.clone(), handle) {
            log::warn!("Duplicate layer for {target}, removing stale handle {old:?}");
            self.by_handle.remove(&old);
            surface.remove_layer(old);
        }
        self.by_handle.insert(handle, target);
    }

    fn teardown(&mut self, surface: &mut dyn MapSurface, kind: FeatureKind) {
        let stale: Vec<LayerHandle> = self
            .by_handle
            .iter()
            .filter(|(_, target)| target.kind == kind)
            .map(|(handle, _)| *handle)
            .collect();
        for handle in stale {
            if let Some(target) = self.by_handle.remove(&handle) {
                self.by_feature.remove(&target);
            }
            surface.remove_layer(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        FeatureId, LatLng, Marker, MarkerDraft, ProjectId, Route, RouteDraft, RouteStyle,
    };
    use crate::tests::fakes::RecordingSurface;

    fn store_with(markers: &[&str], routes: &[&str]) -> FeatureStore {
        let project = ProjectId::new("p");
        let mut store = FeatureStore::new();
        store.load(
            project.clone(),
            markers
                .iter()
                .map(|id| {
                    Marker::from_draft(
                        FeatureId::new(*id),
                        MarkerDraft::new(project.clone(), *id, LatLng::new(1.0, 1.0)),
                    )
                })
                .collect(),
            routes
                .iter()
                .map(|id| {
                    Route::from_draft(
                        FeatureId::new(*id),
                        RouteDraft::new(
                            project.clone(),
                            *id,
                            vec![LatLng::new(0.0, 0.0), LatLng::new(0.0, 1.0)],
                            RouteStyle::default(),
                        ),
                    )
                })
                .collect(),
        );
        store
    }

    #[test]
    fn test_sync_is_idempotent() {
        let store = store_with(&["m1", "m2"], &["r1"]);
        let mut surface = RecordingSurface::new();
        let mut layers = FeatureLayers::new();

        assert!(layers.sync(&mut surface, &store));
        assert_eq!(surface.layers().len(), 3);
        assert!(!layers.sync(&mut surface, &store));
        assert_eq!(surface.layers().len(), 3);
        assert_eq!(surface.added_count(), 3);
    }

    #[test]
    fn test_every_feature_resolves_from_its_layer() {
        let store = store_with(&["m1"], &["r1"]);
        let mut surface = RecordingSurface::new();
        let mut layers = FeatureLayers::new();
        layers.sync(&mut surface, &store);

        for target in [
            FeatureRef::marker(FeatureId::new("m1")),
            FeatureRef::route(FeatureId::new("r1")),
        ] {
            let handle = layers.handle_for(&target).expect("rendered");
            assert_eq!(layers.resolve(handle), Some(&target));
        }
    }

    #[test]
    fn test_removed_feature_is_no_longer_clickable() {
        let mut store = store_with(&["m1", "m2"], &[]);
        let mut surface = RecordingSurface::new();
        let mut layers = FeatureLayers::new();
        layers.sync(&mut surface, &store);
        let m1 = FeatureRef::marker(FeatureId::new("m1"));
        let old_handle = layers.handle_for(&m1).expect("rendered");

        store.remove(&m1);
        layers.sync(&mut surface, &store);
        assert_eq!(layers.resolve(old_handle), None);
        assert_eq!(layers.handle_for(&m1), None);
        assert_eq!(surface.layers().len(), 1);
    }

    #[test]
    fn test_rebuild_only_touches_changed_kind() {
        let mut store = store_with(&["m1"], &["r1"]);
        let mut surface = RecordingSurface::new();
        let mut layers = FeatureLayers::new();
        layers.sync(&mut surface, &store);
        let route_handle = layers
            .handle_for(&FeatureRef::route(FeatureId::new("r1")))
            .expect("rendered");

        store.remove(&FeatureRef::marker(FeatureId::new("m1")));
        layers.sync(&mut surface, &store);
        assert_eq!(
            layers.handle_for(&FeatureRef::route(FeatureId::new("r1"))),
            Some(route_handle)
        );
    }

    #[test]
    fn test_hide_and_reveal() {
        let store = store_with(&["m1"], &[]);
        let mut surface = RecordingSurface::new();
        let mut layers = FeatureLayers::new();
        layers.sync(&mut surface, &store);
        let m1 = FeatureRef::marker(FeatureId::new("m1"));

        layers.hide(&mut surface, &m1);
        assert!(surface.layers().is_empty());
        assert!(layers.is_hidden(&m1));

        layers.reveal(&m1);
        assert!(layers.sync(&mut surface, &store));
        assert_eq!(surface.layers().len(), 1);
        assert!(layers.handle_for(&m1).is_some());
    }

    #[test]
    fn test_retagging_a_feature_drops_the_older_layer() {
        let mut surface = RecordingSurface::new();
        let mut layers = FeatureLayers::new();
        let m1 = FeatureRef::marker(FeatureId::new("m1"));
        let spec = LayerSpec::Marker {
            at: LatLng::new(1.0, 1.0),
            name: "m1".to_string(),
        };

        let first = surface.add_layer(spec.clone());
        layers.tag(&mut surface, first, m1.clone());
        let second = surface.add_layer(spec);
        layers.tag(&mut surface, second, m1.clone());

        assert_eq!(surface.layers().len(), 1);
        assert_eq!(layers.len(), 1);
        assert_eq!(layers.resolve(first), None);
        assert_eq!(layers.handle_for(&m1), Some(second));
    }

    #[test]
    fn test_clear_removes_everything() {
        let store = store_with(&["m1"], &["r1"]);
        let mut surface = RecordingSurface::new();
        let mut layers = FeatureLayers::new();
        layers.sync(&mut surface, &store);
        layers.clear(&mut surface);
        assert!(layers.is_empty());
        assert!(surface.layers().is_empty());
    }
}
