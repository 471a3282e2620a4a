//! Zone payload encoding for the push dashboard.
//!
//! The dashboard wants rings of `{"lat": .., "lng": ..}` objects (note the
//! axis swap relative to GeoJSON's `[lon, lat]` positions) with every ring
//! closed and the total point count under the channel's limit.

use geo::{LineString, MultiPolygon};
use serde::{Deserialize, Serialize};

use crate::simplify::{simplify_to_budget, SimplifyParams};
use crate::{exterior_point_count, is_degenerate};

/// One targeting point, dashboard axis order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZonePoint {
    pub lat: f64,
    pub lng: f64,
}

/// Closed rings targeting a push at a geographic area.
///
/// Serializes to the wire shape `[[{"lat":..,"lng":..},...],...]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZonePayload {
    pub rings: Vec<Vec<ZonePoint>>,
}

impl ZonePayload {
    pub fn ring_count(&self) -> usize {
        self.rings.len()
    }

    pub fn point_count(&self) -> usize {
        self.rings.iter().map(Vec::len).sum()
    }
}

/// Encode a boundary as a zone payload within the point budget.
///
/// A shape already within `max_points` is emitted exactly as-is; otherwise it
/// is simplified first. Returns `None` for an empty or fully collapsed
/// boundary, a valid outcome meaning "no zone targeting", not an error.
pub fn to_zone_payload(shape: &MultiPolygon<f64>, params: &SimplifyParams) -> Option<ZonePayload> {
    if shape.0.is_empty() || is_degenerate(shape) {
        return None;
    }

    if params.enabled && exterior_point_count(shape) <= params.max_points {
        return build_rings(shape);
    }

    let simplified = simplify_to_budget(shape, params);
    build_rings(&simplified)
}

fn build_rings(shape: &MultiPolygon<f64>) -> Option<ZonePayload> {
    let rings: Vec<Vec<ZonePoint>> = shape
        .0
        .iter()
        .map(|polygon| ring_points(polygon.exterior()))
        .filter(|ring| ring.len() >= 4)
        .collect();

    if rings.is_empty() {
        return None;
    }
    Some(ZonePayload { rings })
}

/// Exterior coordinates as dashboard points, explicitly closed.
fn ring_points(exterior: &LineString<f64>) -> Vec<ZonePoint> {
    let mut points: Vec<ZonePoint> = exterior
        .0
        .iter()
        .map(|c| ZonePoint { lat: c.y, lng: c.x })
        .collect();
    if let (Some(first), Some(last)) = (points.first().copied(), points.last().copied()) {
        if first != last {
            points.push(first);
        }
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Coord, Polygon};

    fn square_ring(closed: bool) -> MultiPolygon<f64> {
        let mut coords = vec![
            Coord { x: -105.0, y: 40.0 },
            Coord { x: -104.0, y: 40.0 },
            Coord { x: -104.0, y: 41.0 },
            Coord { x: -105.0, y: 41.0 },
        ];
        if closed {
            coords.push(coords[0]);
        }
        MultiPolygon::new(vec![Polygon::new(LineString::from(coords), vec![])])
    }

    #[test]
    fn test_within_budget_passes_through_with_axis_swap() {
        let payload = to_zone_payload(&square_ring(true), &SimplifyParams::default()).unwrap();
        assert_eq!(payload.ring_count(), 1);
        assert_eq!(payload.rings[0][0], ZonePoint { lat: 40.0, lng: -105.0 });
        assert_eq!(payload.rings[0][1], ZonePoint { lat: 40.0, lng: -104.0 });
    }

    #[test]
    fn test_every_ring_is_closed() {
        // geo closes the ring on Polygon construction, but the payload must
        // guarantee it regardless of input.
        let payload = to_zone_payload(&square_ring(false), &SimplifyParams::default()).unwrap();
        for ring in &payload.rings {
            assert_eq!(ring.first(), ring.last());
        }
    }

    #[test]
    fn test_over_budget_shape_is_bounded() {
        let coords: Vec<Coord<f64>> = (0..500)
            .map(|i| {
                let angle = (i as f64) * std::f64::consts::TAU / 500.0;
                Coord {
                    x: angle.cos(),
                    y: angle.sin(),
                }
            })
            .chain(std::iter::once(Coord { x: 1.0, y: 0.0 }))
            .collect();
        let shape = MultiPolygon::new(vec![Polygon::new(LineString::from(coords), vec![])]);
        let params = SimplifyParams {
            max_points: 40,
            preferred_points: 30,
            ..SimplifyParams::default()
        };
        let payload = to_zone_payload(&shape, &params).unwrap();
        assert!(payload.point_count() <= 40);
        for ring in &payload.rings {
            assert_eq!(ring.first(), ring.last());
        }
    }

    #[test]
    fn test_empty_shape_yields_no_payload() {
        let empty = MultiPolygon::<f64>::new(vec![]);
        assert!(to_zone_payload(&empty, &SimplifyParams::default()).is_none());
    }

    #[test]
    fn test_wire_shape_is_compact_lat_lng_objects() {
        let payload = ZonePayload {
            rings: vec![vec![
                ZonePoint { lat: 40.0, lng: -105.0 },
                ZonePoint { lat: 41.0, lng: -105.0 },
                ZonePoint { lat: 40.0, lng: -105.0 },
            ]],
        };
        let json = serde_json::to_string(&payload).unwrap();
        assert!(json.starts_with("[[{\"lat\":40.0,\"lng\":-105.0}"));
    }
}
