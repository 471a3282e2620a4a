//! Boundary geometry for alertcast.
//!
//! This crate turns the polygonal boundaries gathered for one alert into the
//! zone payload the push dashboard accepts: GeoJSON geometries are converted
//! to `geo` types, unioned into a single outline, simplified down to a point
//! budget, and re-encoded as closed rings of `{lat, lng}` points.
//!
//! No I/O happens here; fetching boundaries is the feed client's job.

pub mod convert;
pub mod payload;
pub mod simplify;

pub use convert::{polygonal, union_all};
pub use payload::{to_zone_payload, ZonePayload, ZonePoint};
pub use simplify::{simplify_to_budget, SimplifyParams};

use geo::MultiPolygon;

/// Total number of exterior points across all polygons of a shape.
pub fn exterior_point_count(shape: &MultiPolygon<f64>) -> usize {
    shape.0.iter().map(|p| p.exterior().0.len()).sum()
}

/// True when a shape has no ring that could survive as a valid boundary.
///
/// A ring needs at least 4 points (first == last) to describe an area;
/// anything smaller is a collapse artifact.
pub fn is_degenerate(shape: &MultiPolygon<f64>) -> bool {
    shape.0.iter().all(|p| p.exterior().0.len() < 4)
}
