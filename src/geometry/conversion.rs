//! GeoJSON boundary.
//!
//! GeoJSON positions are `[longitude, latitude]`, the inverse of [`LatLng`].
//! Every crossing between the two goes through this module.

use geojson::{Geometry, Value};

use crate::constants::MIN_ROUTE_POINTS;
use crate::error::TrailError;
use crate::model::LatLng;

/// Build a GeoJSON LineString from a path.
pub fn route_geometry(path: &[LatLng]) -> Geometry {
    let positions = path.iter().map(|p| vec![p.lng, p.lat]).collect();
    Geometry::new(Value::LineString(positions))
}

/// Build a GeoJSON Point from a coordinate.
pub fn marker_geometry(at: LatLng) -> Geometry {
    Geometry::new(Value::Point(vec![at.lng, at.lat]))
}

/// Read a path back out of a GeoJSON LineString of at least two positions.
pub fn path_from_geometry(geometry: &Geometry) -> Result<Vec<LatLng>, TrailError> {
    match &geometry.value {
        Value::LineString(positions) if positions.len() < MIN_ROUTE_POINTS => {
            Err(TrailError::invalid_geometry(format!(
                "a route needs at least {MIN_ROUTE_POINTS} points, got {}",
                positions.len()
            )))
        }
        Value::LineString(positions) => positions.iter().map(|p| position_to_lat_lng(p)).collect(),
        other => Err(TrailError::invalid_geometry(format!(
            "expected LineString, found {}",
            type_name(other)
        ))),
    }
}

/// Read a coordinate back out of a GeoJSON Point.
pub fn point_from_geometry(geometry: &Geometry) -> Result<LatLng, TrailError> {
    match &geometry.value {
        Value::Point(position) => position_to_lat_lng(position),
        other => Err(TrailError::invalid_geometry(format!(
            "expected Point, found {}",
            type_name(other)
        ))),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Point(_) => "Point",
        Value::MultiPoint(_) => "MultiPoint",
        Value::LineString(_) => "LineString",
        Value::MultiLineString(_) => "MultiLineString",
        Value::Polygon(_) => "Polygon",
        Value::MultiPolygon(_) => "MultiPolygon",
        Value::GeometryCollection(_) => "GeometryCollection",
    }
}

fn position_to_lat_lng(position: &[f64]) -> Result<LatLng, TrailError> {
    match position {
        [lng, lat, ..] if lng.is_finite() && lat.is_finite() => Ok(LatLng::new(*lat, *lng)),
        [_, _, ..] => Err(TrailError::invalid_geometry("non-finite coordinate")),
        _ => Err(TrailError::invalid_geometry(format!(
            "position needs 2 values, found {}",
            position.len()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_order_on_the_wire() {
        let geometry = route_geometry(&[LatLng::new(10.0, 20.0), LatLng::new(11.0, 21.0)]);
        let json = serde_json::to_value(&geometry).expect("serialize");
        assert_eq!(json["type"], "LineString");
        assert_eq!(json["coordinates"][0][0], 20.0);
        assert_eq!(json["coordinates"][0][1], 10.0);

        let point = serde_json::to_value(marker_geometry(LatLng::new(-33.9, 151.2))).expect("serialize");
        assert_eq!(point["coordinates"][0], 151.2);
        assert_eq!(point["coordinates"][1], -33.9);
    }

    #[test]
    fn test_path_survives_boundary() {
        let path = vec![LatLng::new(47.1, 8.2), LatLng::new(47.2, 8.3)];
        let back = path_from_geometry(&route_geometry(&path)).expect("valid line");
        assert_eq!(back, path);

        let at = LatLng::new(1.5, -2.5);
        assert_eq!(point_from_geometry(&marker_geometry(at)).expect("valid point"), at);
    }

    #[test]
    fn test_rejects_wrong_shapes() {
        let point = marker_geometry(LatLng::new(0.0, 0.0));
        assert!(path_from_geometry(&point).is_err());

        let short = Geometry::new(Value::LineString(vec![vec![1.0], vec![2.0]]));
        assert!(path_from_geometry(&short).is_err());

        let nan = Geometry::new(Value::Point(vec![f64::NAN, 1.0]));
        assert!(point_from_geometry(&nan).is_err());
    }

    #[test]
    fn test_line_needs_two_positions() {
        for positions in [Vec::new(), vec![vec![8.2, 47.1]]] {
            let line = Geometry::new(Value::LineString(positions));
            assert!(matches!(
                path_from_geometry(&line),
                Err(TrailError::InvalidGeometry { .. })
            ));
        }
    }
}
