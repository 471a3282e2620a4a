//! Iterative, budget-bounded boundary simplification.

use geo::{MultiPolygon, SimplifyVwPreserve};
use tracing::debug;

use crate::{exterior_point_count, is_degenerate};

/// Rounds of tolerance doubling before giving up on the hard budget.
const MAX_ROUNDS: usize = 10;
/// Extra rounds spent chasing the softer preferred target.
const REFINE_ROUNDS: usize = 12;
const REFINE_FACTOR: f64 = 1.4;

/// Simplification knobs.
///
/// `tolerance` controls geometric fidelity; `max_points` is the hard ceiling
/// imposed by the delivery channel's payload limit. The two are independent:
/// the tolerance grows as needed until the budget is met.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimplifyParams {
    pub enabled: bool,
    /// Starting tolerance, in coordinate degrees.
    pub tolerance: f64,
    /// Hard ceiling on total points across all rings.
    pub max_points: usize,
    /// Softer target for naturally very detailed boundaries.
    pub preferred_points: usize,
}

impl Default for SimplifyParams {
    fn default() -> Self {
        Self {
            enabled: true,
            tolerance: 0.001,
            max_points: 300,
            preferred_points: 250,
        }
    }
}

/// Simplify a shape until it fits the point budget.
///
/// Doubles the tolerance each round, re-simplifying the previous round's
/// output. A round that collapses the shape to nothing is discarded and the
/// last non-empty result wins. Once within `max_points`, a bounded refinement
/// pass keeps raising the tolerance toward `preferred_points`, accepting only
/// candidates that stay non-empty, within budget, and strictly smaller.
pub fn simplify_to_budget(shape: &MultiPolygon<f64>, params: &SimplifyParams) -> MultiPolygon<f64> {
    if !params.enabled {
        return shape.clone();
    }

    let mut tolerance = params.tolerance;
    let mut kept = shape.clone();
    for _ in 0..MAX_ROUNDS {
        let candidate = kept.simplify_vw_preserve(&tolerance);
        if is_degenerate(&candidate) {
            return kept;
        }
        kept = candidate;
        if exterior_point_count(&kept) <= params.max_points {
            break;
        }
        tolerance *= 2.0;
    }

    let mut points = exterior_point_count(&kept);
    if points <= params.max_points && points > params.preferred_points {
        let mut refine_tolerance = tolerance;
        for _ in 0..REFINE_ROUNDS {
            refine_tolerance *= REFINE_FACTOR;
            let candidate = shape.simplify_vw_preserve(&refine_tolerance);
            if is_degenerate(&candidate) {
                break;
            }
            let candidate_points = exterior_point_count(&candidate);
            if candidate_points <= params.max_points && candidate_points < points {
                kept = candidate;
                points = candidate_points;
            }
            if points <= params.preferred_points {
                break;
            }
        }
    }

    debug!(
        before = exterior_point_count(shape),
        after = points,
        tolerance,
        "boundary simplified"
    );
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Coord, LineString, Polygon};

    /// A closed ring approximating a circle with `n` segments.
    fn circle(n: usize, radius: f64) -> MultiPolygon<f64> {
        let mut coords: Vec<Coord<f64>> = (0..n)
            .map(|i| {
                let angle = (i as f64) * std::f64::consts::TAU / (n as f64);
                Coord {
                    x: radius * angle.cos(),
                    y: radius * angle.sin(),
                }
            })
            .collect();
        coords.push(coords[0]);
        MultiPolygon::new(vec![Polygon::new(LineString::from(coords), vec![])])
    }

    #[test]
    fn test_over_budget_shape_is_reduced() {
        let shape = circle(1000, 1.0);
        let params = SimplifyParams {
            max_points: 50,
            preferred_points: 40,
            ..SimplifyParams::default()
        };
        let simplified = simplify_to_budget(&shape, &params);
        assert!(exterior_point_count(&simplified) <= 50);
        assert!(!is_degenerate(&simplified));
    }

    #[test]
    fn test_disabled_is_identity() {
        let shape = circle(100, 1.0);
        let params = SimplifyParams {
            enabled: false,
            ..SimplifyParams::default()
        };
        assert_eq!(simplify_to_budget(&shape, &params), shape);
    }

    #[test]
    fn test_collapse_falls_back_to_last_nonempty() {
        // A tiny triangle: any positive tolerance collapses it, so the
        // original must survive.
        let shape = MultiPolygon::new(vec![Polygon::new(
            LineString::from(vec![
                Coord { x: 0.0, y: 0.0 },
                Coord { x: 1e-9, y: 0.0 },
                Coord { x: 0.0, y: 1e-9 },
                Coord { x: 0.0, y: 0.0 },
            ]),
            vec![],
        )]);
        let simplified = simplify_to_budget(&shape, &SimplifyParams::default());
        assert!(!is_degenerate(&simplified));
    }
}
