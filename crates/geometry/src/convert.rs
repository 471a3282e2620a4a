//! GeoJSON to `geo` conversion and union.

use geo::{BooleanOps, Geometry, MultiPolygon};
use geojson::Value;
use tracing::debug;

/// Convert a GeoJSON geometry into a multi-polygon.
///
/// Only `Polygon` and `MultiPolygon` geometries qualify; everything else
/// (points, lines, collections) returns `None`, as does a geometry whose
/// coordinates fail conversion.
pub fn polygonal(geom: &geojson::Geometry) -> Option<MultiPolygon<f64>> {
    if !matches!(geom.value, Value::Polygon(_) | Value::MultiPolygon(_)) {
        return None;
    }
    match Geometry::<f64>::try_from(geom.clone()) {
        Ok(Geometry::Polygon(p)) => Some(MultiPolygon::new(vec![p])),
        Ok(Geometry::MultiPolygon(mp)) => Some(mp),
        Ok(_) => None,
        Err(e) => {
            debug!(error = %e, "unconvertible boundary geometry");
            None
        }
    }
}

/// Geometric union of all candidate boundaries.
///
/// Overlapping zone boundaries collapse into one outline. Returns `None`
/// when there is nothing to union.
pub fn union_all(shapes: &[MultiPolygon<f64>]) -> Option<MultiPolygon<f64>> {
    let mut iter = shapes.iter();
    let first = iter.next()?.clone();
    Some(iter.fold(first, |acc, next| acc.union(next)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x0: f64, y0: f64, size: f64) -> geojson::Geometry {
        geojson::Geometry::new(Value::Polygon(vec![vec![
            vec![x0, y0],
            vec![x0 + size, y0],
            vec![x0 + size, y0 + size],
            vec![x0, y0 + size],
            vec![x0, y0],
        ]]))
    }

    #[test]
    fn test_polygonal_accepts_polygon() {
        let shape = polygonal(&square(0.0, 0.0, 1.0)).unwrap();
        assert_eq!(shape.0.len(), 1);
        assert_eq!(shape.0[0].exterior().0.len(), 5);
    }

    #[test]
    fn test_polygonal_rejects_point() {
        let geom = geojson::Geometry::new(Value::Point(vec![1.0, 2.0]));
        assert!(polygonal(&geom).is_none());
    }

    #[test]
    fn test_union_of_overlapping_squares_is_one_outline() {
        let a = polygonal(&square(0.0, 0.0, 2.0)).unwrap();
        let b = polygonal(&square(1.0, 0.0, 2.0)).unwrap();
        let unioned = union_all(&[a, b]).unwrap();
        assert_eq!(unioned.0.len(), 1);
    }

    #[test]
    fn test_union_of_disjoint_squares_keeps_both() {
        let a = polygonal(&square(0.0, 0.0, 1.0)).unwrap();
        let b = polygonal(&square(5.0, 5.0, 1.0)).unwrap();
        let unioned = union_all(&[a, b]).unwrap();
        assert_eq!(unioned.0.len(), 2);
    }

    #[test]
    fn test_union_of_nothing_is_none() {
        assert!(union_all(&[]).is_none());
    }
}
