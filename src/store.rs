//! In-memory collection of the open project's markers and routes.
//!
//! Entries are held behind `Rc` and replaced, never mutated in place, so a
//! consumer holding an old reference can tell it is stale. Each kind has a
//! revision counter that moves on every change; the layer side-table
//! rebuilds a kind when its revision differs from the one it last drew.

use std::collections::HashSet;
use std::rc::Rc;

use crate::model::{Feature, FeatureId, FeatureKind, FeatureRef, Marker, ProjectId, Route};

/// Markers and routes of one project.
#[derive(Debug, Default)]
pub struct FeatureStore {
    project: Option<ProjectId>,
    markers: Vec<Rc<Marker>>,
    routes: Vec<Rc<Route>>,
    marker_revision: u64,
    route_revision: u64,
}

impl FeatureStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole collection with another project's features.
    ///
    /// Ids are unique per kind; a repeated id keeps its first occurrence.
    pub fn load(&mut self, project: ProjectId, markers: Vec<Marker>, routes: Vec<Route>) {
        let markers = first_of_each_id(markers, FeatureKind::Marker, |m| &m.id);
        let routes = first_of_each_id(routes, FeatureKind::Route, |r| &r.id);
        log::info!(
            "Loaded project {project}: {} markers, {} routes",
            markers.len(),
            routes.len()
        );
        self.project = Some(project);
        self.markers = markers.into_iter().map(Rc::new).collect();
        self.routes = routes.into_iter().map(Rc::new).collect();
        self.touch(FeatureKind::Marker);
        self.touch(FeatureKind::Route);
    }

    pub fn project(&self) -> Option<&ProjectId> {
        self.project.as_ref()
    }

    pub fn markers(&self) -> &[Rc<Marker>] {
        &self.markers
    }

    pub fn routes(&self) -> &[Rc<Route>] {
        &self.routes
    }

    pub fn marker(&self, id: &FeatureId) -> Option<&Rc<Marker>> {
        self.markers.iter().find(|m| &m.id == id)
    }

    pub fn route(&self, id: &FeatureId) -> Option<&Rc<Route>> {
        self.routes.iter().find(|r| &r.id == id)
    }

    /// Snapshot of one feature.
    pub fn get(&self, target: &FeatureRef) -> Option<Feature> {
        match target.kind {
            FeatureKind::Marker => self
                .marker(&target.id)
                .map(|m| Feature::Marker(Marker::clone(m))),
            FeatureKind::Route => self
                .route(&target.id)
                .map(|r| Feature::Route(Route::clone(r))),
        }
    }

    pub fn contains(&self, target: &FeatureRef) -> bool {
        match target.kind {
            FeatureKind::Marker => self.marker(&target.id).is_some(),
            FeatureKind::Route => self.route(&target.id).is_some(),
        }
    }

    pub fn count(&self, kind: FeatureKind) -> usize {
        match kind {
            FeatureKind::Marker => self.markers.len(),
            FeatureKind::Route => self.routes.len(),
        }
    }

    /// Current revision of one kind's collection.
    pub fn revision(&self, kind: FeatureKind) -> u64 {
        match kind {
            FeatureKind::Marker => self.marker_revision,
            FeatureKind::Route => self.route_revision,
        }
    }

    /// Add a confirmed feature, replacing any entry with the same id.
    pub fn insert(&mut self, feature: Feature) {
        if self.contains(&feature.feature_ref()) {
            self.replace(feature);
            return;
        }
        let kind = feature.kind();
        match feature {
            Feature::Marker(m) => self.markers.push(Rc::new(m)),
            Feature::Route(r) => self.routes.push(Rc::new(r)),
        }
        self.touch(kind);
    }

    /// Swap in a new version of an existing feature. Returns the old one.
    pub fn replace(&mut self, feature: Feature) -> Option<Feature> {
        let kind = feature.kind();
        let old = match feature {
            Feature::Marker(m) => {
                let slot = self.markers.iter_mut().find(|e| e.id == m.id)?;
                Feature::Marker(Marker::clone(&*std::mem::replace(slot, Rc::new(m))))
            }
            Feature::Route(r) => {
                let slot = self.routes.iter_mut().find(|e| e.id == r.id)?;
                Feature::Route(Route::clone(&*std::mem::replace(slot, Rc::new(r))))
            }
        };
        self.touch(kind);
        Some(old)
    }

    /// Remove a feature. Returns it if it was present.
    pub fn remove(&mut self, target: &FeatureRef) -> Option<Feature> {
        let removed = match target.kind {
            FeatureKind::Marker => {
                let index = self.markers.iter().position(|m| m.id == target.id)?;
                Feature::Marker(Marker::clone(&self.markers.remove(index)))
            }
            FeatureKind::Route => {
                let index = self.routes.iter().position(|r| r.id == target.id)?;
                Feature::Route(Route::clone(&self.routes.remove(index)))
            }
        };
        self.touch(target.kind);
        Some(removed)
    }

    fn touch(&mut self, kind: FeatureKind) {
        match kind {
            FeatureKind::Marker => self.marker_revision += 1,
            FeatureKind::Route => self.route_revision += 1,
        }
    }
}

fn first_of_each_id<T>(
    items: Vec<T>,
    kind: FeatureKind,
    id: impl Fn(&T) -> &FeatureId,
) -> Vec<T> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| {
            let fresh = seen.insert(id(item).clone());
            if !fresh {
                log::warn!("Dropping duplicate {kind} {}", id(item));
            }
            fresh
        })
        .collect()
}
