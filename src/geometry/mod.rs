//! Path geometry: simplification, length and the GeoJSON boundary.

mod conversion;
mod simplify;

pub use conversion::{marker_geometry, path_from_geometry, point_from_geometry, route_geometry};
pub use simplify::{SimplifyOptions, path_distance, segment_distance, simplify, simplify_with};
