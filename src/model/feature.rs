//! Persisted map features (markers and routes) and their drafts and patches.
//!
//! A route's `distance` is always derived from the geometry it is stored
//! with. Geometry and distance are private and only change together.

use std::fmt;

use geojson::Geometry;
use serde::{Deserialize, Serialize};

use super::{LatLng, RouteStyle};
use crate::error::TrailError;
use crate::geometry::{path_distance, path_from_geometry, route_geometry};

// ============================================================================
// Identifiers
// ============================================================================

/// Backend-assigned identifier of a marker or route.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureId(String);

impl FeatureId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of the project owning a set of features.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(String);

impl ProjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The two kinds of persisted map features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureKind {
    Marker,
    Route,
}

impl FeatureKind {
    pub fn name(&self) -> &'static str {
        match self {
            FeatureKind::Marker => "marker",
            FeatureKind::Route => "route",
        }
    }
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A typed reference to one feature. This is what rendered layers are tagged with.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeatureRef {
    pub kind: FeatureKind,
    pub id: FeatureId,
}

impl FeatureRef {
    pub fn marker(id: FeatureId) -> Self {
        Self {
            kind: FeatureKind::Marker,
            id,
        }
    }

    pub fn route(id: FeatureId) -> Self {
        Self {
            kind: FeatureKind::Route,
            id,
        }
    }
}

impl fmt::Display for FeatureRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.id)
    }
}

/// Publication status of a feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FeatureStatus {
    #[default]
    Active,
    Archived,
}

// ============================================================================
// Marker
// ============================================================================

/// A named point on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub id: FeatureId,
    pub project_id: ProjectId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub status: FeatureStatus,
}

impl Marker {
    /// Materialize a draft under a backend-assigned id.
    pub fn from_draft(id: FeatureId, draft: MarkerDraft) -> Self {
        Self {
            id,
            project_id: draft.project_id,
            name: draft.name,
            description: draft.description,
            latitude: draft.latitude,
            longitude: draft.longitude,
            status: draft.status,
        }
    }

    pub fn position(&self) -> LatLng {
        LatLng::new(self.latitude, self.longitude)
    }

    pub fn feature_ref(&self) -> FeatureRef {
        FeatureRef::marker(self.id.clone())
    }

    /// Return a copy with the patch applied.
    pub fn patched(&self, patch: &MarkerPatch) -> Self {
        let mut next = self.clone();
        if let Some(name) = &patch.name {
            next.name = name.clone();
        }
        if let Some(description) = &patch.description {
            next.description = description.clone();
        }
        if let (Some(latitude), Some(longitude)) = (patch.latitude, patch.longitude) {
            next.latitude = latitude;
            next.longitude = longitude;
        }
        if let Some(status) = patch.status {
            next.status = status;
        }
        next
    }
}

/// A marker that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerDraft {
    pub project_id: ProjectId,
    pub name: String,
    pub description: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub status: FeatureStatus,
}

impl MarkerDraft {
    /// Longitude is wrapped before it can reach the backend.
    pub fn new(project_id: ProjectId, name: impl Into<String>, at: LatLng) -> Self {
        let at = at.wrap();
        Self {
            project_id,
            name: name.into(),
            description: None,
            latitude: at.lat,
            longitude: at.lng,
            status: FeatureStatus::Active,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn position(&self) -> LatLng {
        LatLng::new(self.latitude, self.longitude)
    }
}

/// Partial update of a marker. Unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarkerPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<FeatureStatus>,
}

impl MarkerPatch {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = Some(description);
        self
    }

    /// Move the marker. Latitude and longitude are always patched together.
    pub fn position(mut self, at: LatLng) -> Self {
        let at = at.wrap();
        self.latitude = Some(at.lat);
        self.longitude = Some(at.lng);
        self
    }

    pub fn status(mut self, status: FeatureStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn new_position(&self) -> Option<LatLng> {
        Some(LatLng::new(self.latitude?, self.longitude?))
    }
}

// ============================================================================
// Route
// ============================================================================

/// A polyline with a derived great-circle distance in meters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RouteRecord")]
pub struct Route {
    pub id: FeatureId,
    pub project_id: ProjectId,
    pub name: String,
    pub description: Option<String>,
    geojson: Geometry,
    distance: f64,
    #[serde(flatten)]
    pub style: RouteStyle,
    pub status: FeatureStatus,
    #[serde(skip)]
    path: Vec<LatLng>,
}

/// Wire shape of a route. Any stored distance is ignored and recomputed.
#[derive(Deserialize)]
struct RouteRecord {
    id: FeatureId,
    project_id: ProjectId,
    name: String,
    #[serde(default)]
    description: Option<String>,
    geojson: Geometry,
    #[serde(flatten)]
    style: RouteStyle,
    #[serde(default)]
    status: FeatureStatus,
}

impl TryFrom<RouteRecord> for Route {
    type Error = TrailError;

    fn try_from(record: RouteRecord) -> Result<Self, Self::Error> {
        let path = path_from_geometry(&record.geojson)?;
        Ok(Self {
            id: record.id,
            project_id: record.project_id,
            name: record.name,
            description: record.description,
            geojson: route_geometry(&path),
            distance: path_distance(&path),
            style: record.style,
            status: record.status,
            path,
        })
    }
}

impl Route {
    /// Materialize a draft under a backend-assigned id.
    pub fn from_draft(id: FeatureId, draft: RouteDraft) -> Self {
        Self {
            id,
            project_id: draft.project_id,
            name: draft.name,
            description: draft.description,
            geojson: route_geometry(&draft.path),
            distance: path_distance(&draft.path),
            style: draft.style,
            status: draft.status,
            path: draft.path,
        }
    }

    pub fn feature_ref(&self) -> FeatureRef {
        FeatureRef::route(self.id.clone())
    }

    pub fn path(&self) -> &[LatLng] {
        &self.path
    }

    pub fn geojson(&self) -> &Geometry {
        &self.geojson
    }

    /// Length of the stored geometry in meters.
    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// Replace the geometry, recomputing the distance with it.
    pub fn set_path(&mut self, path: Vec<LatLng>) {
        let path: Vec<LatLng> = path.into_iter().map(LatLng::wrap).collect();
        self.geojson = route_geometry(&path);
        self.distance = path_distance(&path);
        self.path = path;
    }

    /// Return a copy with the patch applied.
    pub fn patched(&self, patch: &RoutePatch) -> Self {
        let mut next = self.clone();
        if let Some(name) = &patch.name {
            next.name = name.clone();
        }
        if let Some(description) = &patch.description {
            next.description = description.clone();
        }
        if let Some(path) = &patch.path {
            next.set_path(path.clone());
        }
        if let Some(style) = &patch.style {
            next.style = style.clone();
        }
        if let Some(status) = patch.status {
            next.status = status;
        }
        next
    }

    /// GeoJSON feature used for sharing and export.
    pub fn to_feature(&self) -> geojson::Feature {
        let mut feature = geojson::Feature::from(self.geojson.clone());
        feature.set_property("id", self.id.to_string());
        feature.set_property("name", self.name.clone());
        if let Some(description) = &self.description {
            feature.set_property("description", description.clone());
        }
        feature.set_property("distance", self.distance);
        feature.set_property("color", self.style.color.clone());
        feature.set_property("width", self.style.width);
        feature.set_property("opacity", self.style.opacity);
        feature
    }
}

/// A route that has not been persisted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteDraft {
    pub project_id: ProjectId,
    pub name: String,
    pub description: Option<String>,
    path: Vec<LatLng>,
    pub style: RouteStyle,
    pub status: FeatureStatus,
}

impl RouteDraft {
    /// Longitudes are wrapped before they can reach the backend.
    pub fn new(
        project_id: ProjectId,
        name: impl Into<String>,
        path: Vec<LatLng>,
        style: RouteStyle,
    ) -> Self {
        Self {
            project_id,
            name: name.into(),
            description: None,
            path: path.into_iter().map(LatLng::wrap).collect(),
            style,
            status: FeatureStatus::Active,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn path(&self) -> &[LatLng] {
        &self.path
    }

    pub fn geojson(&self) -> Geometry {
        route_geometry(&self.path)
    }

    pub fn distance(&self) -> f64 {
        path_distance(&self.path)
    }
}

/// Partial update of a route. Unset fields are left alone.
///
/// Setting a new path carries the matching distance with it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RoutePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(skip)]
    path: Option<Vec<LatLng>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    geojson: Option<Geometry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    distance: Option<f64>,
    #[serde(flatten)]
    pub style: Option<RouteStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<FeatureStatus>,
}

impl RoutePatch {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = Some(description);
        self
    }

    /// Replace the geometry. Geometry and distance are computed together.
    pub fn path(mut self, path: Vec<LatLng>) -> Self {
        let path: Vec<LatLng> = path.into_iter().map(LatLng::wrap).collect();
        self.geojson = Some(route_geometry(&path));
        self.distance = Some(path_distance(&path));
        self.path = Some(path);
        self
    }

    pub fn style(mut self, style: RouteStyle) -> Self {
        self.style = Some(style);
        self
    }

    pub fn status(mut self, status: FeatureStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn new_path(&self) -> Option<&[LatLng]> {
        self.path.as_deref()
    }

    /// Distance matching [`RoutePatch::new_path`], if the geometry changes.
    pub fn new_distance(&self) -> Option<f64> {
        self.distance
    }
}

// ============================================================================
// Kind-erased wrappers
// ============================================================================

/// A persisted feature of either kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Feature {
    Marker(Marker),
    Route(Route),
}

impl Feature {
    pub fn feature_ref(&self) -> FeatureRef {
        match self {
            Feature::Marker(m) => m.feature_ref(),
            Feature::Route(r) => r.feature_ref(),
        }
    }

    pub fn kind(&self) -> FeatureKind {
        match self {
            Feature::Marker(_) => FeatureKind::Marker,
            Feature::Route(_) => FeatureKind::Route,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Feature::Marker(m) => &m.name,
            Feature::Route(r) => &r.name,
        }
    }

    pub fn project_id(&self) -> &ProjectId {
        match self {
            Feature::Marker(m) => &m.project_id,
            Feature::Route(r) => &r.project_id,
        }
    }

    /// A draft that would recreate this feature under a new id.
    pub fn to_draft(&self) -> FeatureDraft {
        match self {
            Feature::Marker(m) => FeatureDraft::Marker(MarkerDraft {
                project_id: m.project_id.clone(),
                name: m.name.clone(),
                description: m.description.clone(),
                latitude: m.latitude,
                longitude: m.longitude,
                status: m.status,
            }),
            Feature::Route(r) => FeatureDraft::Route(RouteDraft {
                project_id: r.project_id.clone(),
                name: r.name.clone(),
                description: r.description.clone(),
                path: r.path.clone(),
                style: r.style.clone(),
                status: r.status,
            }),
        }
    }

    /// A patch that sets every editable field back to this feature's values.
    pub fn to_restoring_patch(&self) -> FeaturePatch {
        match self {
            Feature::Marker(m) => FeaturePatch::Marker(
                MarkerPatch::default()
                    .name(m.name.clone())
                    .description(m.description.clone())
                    .position(m.position())
                    .status(m.status),
            ),
            Feature::Route(r) => FeaturePatch::Route(
                RoutePatch::default()
                    .name(r.name.clone())
                    .description(r.description.clone())
                    .path(r.path.clone())
                    .style(r.style.clone())
                    .status(r.status),
            ),
        }
    }

    /// Return a copy with the patch applied, or `None` if the kinds differ.
    pub fn patched(&self, patch: &FeaturePatch) -> Option<Feature> {
        match (self, patch) {
            (Feature::Marker(m), FeaturePatch::Marker(p)) => Some(Feature::Marker(m.patched(p))),
            (Feature::Route(r), FeaturePatch::Route(p)) => Some(Feature::Route(r.patched(p))),
            _ => None,
        }
    }
}

/// A not-yet-persisted feature of either kind.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureDraft {
    Marker(MarkerDraft),
    Route(RouteDraft),
}

impl FeatureDraft {
    pub fn kind(&self) -> FeatureKind {
        match self {
            FeatureDraft::Marker(_) => FeatureKind::Marker,
            FeatureDraft::Route(_) => FeatureKind::Route,
        }
    }

    pub fn project_id(&self) -> &ProjectId {
        match self {
            FeatureDraft::Marker(m) => &m.project_id,
            FeatureDraft::Route(r) => &r.project_id,
        }
    }

    /// Materialize under a backend-assigned id.
    pub fn into_feature(self, id: FeatureId) -> Feature {
        match self {
            FeatureDraft::Marker(m) => Feature::Marker(Marker::from_draft(id, m)),
            FeatureDraft::Route(r) => Feature::Route(Route::from_draft(id, r)),
        }
    }
}

/// A partial update of either kind.
#[derive(Debug, Clone, PartialEq)]
pub enum FeaturePatch {
    Marker(MarkerPatch),
    Route(RoutePatch),
}

impl FeaturePatch {
    pub fn kind(&self) -> FeatureKind {
        match self {
            FeaturePatch::Marker(_) => FeatureKind::Marker,
            FeaturePatch::Route(_) => FeatureKind::Route,
        }
    }

    /// Whether the patch moves the feature.
    pub fn changes_geometry(&self) -> bool {
        match self {
            FeaturePatch::Marker(p) => p.new_position().is_some(),
            FeaturePatch::Route(p) => p.new_path().is_some(),
        }
    }
}
