//! Freehand path simplification and length.
//!
//! Thin layer over the `geo` algorithms: Ramer-Douglas-Peucker for the
//! reduction and haversine for distances. Coordinates are handed to `geo` as
//! `x = longitude`, `y = latitude`.

use geo::{Coord, HaversineDistance, HaversineLength, LineString, Point, Simplify};

use crate::constants::DEFAULT_SIMPLIFY_TOLERANCE;
use crate::model::LatLng;

/// Options for [`simplify_with`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimplifyOptions {
    /// Maximum deviation of a dropped point, in coordinate degrees.
    pub tolerance: f64,
    /// Skip the radial-distance pre-pass and run Douglas-Peucker on every
    /// point. Slower, keeps more of the original shape.
    pub high_quality: bool,
}

impl Default for SimplifyOptions {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_SIMPLIFY_TOLERANCE,
            high_quality: true,
        }
    }
}

/// Simplify a path in high-quality mode with the given tolerance.
pub fn simplify(path: &[LatLng], tolerance: f64) -> Vec<LatLng> {
    simplify_with(
        path,
        SimplifyOptions {
            tolerance,
            high_quality: true,
        },
    )
}

/// Reduce a path to the points needed to keep its shape within tolerance.
///
/// Paths with fewer than three points are returned unchanged and never reach
/// the reduction algorithm. The first and last points are always kept.
pub fn simplify_with(path: &[LatLng], options: SimplifyOptions) -> Vec<LatLng> {
    if path.len() < 3 {
        return path.to_vec();
    }
    if !options.tolerance.is_finite() || options.tolerance < 0.0 {
        log::warn!(
            "Ignoring invalid simplification tolerance {}, path left as is",
            options.tolerance
        );
        return path.to_vec();
    }

    let candidates = if options.high_quality {
        path.to_vec()
    } else {
        radial_filter(path, options.tolerance)
    };
    if candidates.len() < 3 {
        return candidates;
    }

    let simplified = to_line_string(&candidates).simplify(&options.tolerance);
    let result = from_line_string(&simplified);
    log::debug!(
        "Simplified path from {} to {} points (tolerance {})",
        path.len(),
        result.len(),
        options.tolerance
    );
    result
}

/// Total great-circle length of a path in meters.
pub fn path_distance(path: &[LatLng]) -> f64 {
    if path.len() < 2 {
        return 0.0;
    }
    to_line_string(path).haversine_length()
}

/// Great-circle distance between two points in meters.
pub fn segment_distance(a: LatLng, b: LatLng) -> f64 {
    to_point(a).haversine_distance(&to_point(b))
}

/// Drop points closer than `tolerance` to the previously kept point.
/// The first and last points always survive.
fn radial_filter(path: &[LatLng], tolerance: f64) -> Vec<LatLng> {
    let sq_tolerance = tolerance * tolerance;
    let mut kept = Vec::with_capacity(path.len());
    let Some((&first, rest)) = path.split_first() else {
        return kept;
    };
    kept.push(first);
    let mut prev = first;

    for (i, &p) in rest.iter().enumerate() {
        let is_last = i + 1 == rest.len();
        let dx = p.lng - prev.lng;
        let dy = p.lat - prev.lat;
        if dx * dx + dy * dy > sq_tolerance {
            kept.push(p);
            prev = p;
        } else if is_last {
            // The stroke must still end where the pointer was released.
            kept.push(p);
        }
    }
    kept
}

fn to_point(p: LatLng) -> Point<f64> {
    Point::new(p.lng, p.lat)
}

fn to_line_string(path: &[LatLng]) -> LineString<f64> {
    path.iter()
        .map(|p| Coord { x: p.lng, y: p.lat })
        .collect::<Vec<_>>()
        .into()
}

fn from_line_string(line: &LineString<f64>) -> Vec<LatLng> {
    line.coords().map(|c| LatLng::new(c.y, c.x)).collect()
}
