//! Boundary-source resolution for one alert.
//!
//! An alert's boundary can come from its own geometry, from the forecast
//! zones it references, or both. Candidates are gathered in that order and
//! tagged with their provenance; downstream code unions whatever survives
//! conversion.

use tracing::{debug, warn};

use crate::client::NwsClient;
use crate::models::{is_polygonal, AlertFeature, ZoneDocument};

/// Where a candidate boundary came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    /// The alert's own polygon.
    AlertDirect,
    /// A dereferenced forecast-zone boundary.
    ZoneReference,
}

impl Provenance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AlertDirect => "alert-direct",
            Self::ZoneReference => "zone-reference",
        }
    }
}

/// One candidate boundary geometry with its provenance.
#[derive(Debug, Clone)]
pub struct GeometryCandidate {
    pub provenance: Provenance,
    pub geometry: geojson::Geometry,
}

impl NwsClient {
    /// Gather every candidate boundary for an alert.
    ///
    /// Zone fetch failures are logged and swallowed per URL: one bad zone
    /// reference must not cost the alert its remaining boundary sources. An
    /// empty result means "no usable boundary".
    pub async fn resolve_geometries(&self, alert: &AlertFeature) -> Vec<GeometryCandidate> {
        let mut candidates = Vec::new();

        if let Some(geometry) = alert.geometry.as_ref().filter(|g| is_polygonal(g)) {
            candidates.push(GeometryCandidate {
                provenance: Provenance::AlertDirect,
                geometry: geometry.clone(),
            });
        }

        for zone_url in &alert.properties.affected_zones {
            match self.fetch_zone(zone_url).await {
                Ok(document) => {
                    let zone = zone_candidates(&document);
                    debug!(zone = %zone_url, boundaries = zone.len(), "zone dereferenced");
                    candidates.extend(zone);
                }
                Err(e) => {
                    warn!(zone = %zone_url, error = %e, "zone fetch failed; skipping");
                }
            }
        }

        candidates
    }
}

/// Polygonal geometries in a zone document.
///
/// A single-feature document contributes its own geometry; otherwise every
/// polygonal member of the collection contributes.
fn zone_candidates(document: &ZoneDocument) -> Vec<GeometryCandidate> {
    if let Some(geometry) = document.geometry.as_ref().filter(|g| is_polygonal(g)) {
        return vec![GeometryCandidate {
            provenance: Provenance::ZoneReference,
            geometry: geometry.clone(),
        }];
    }

    document
        .features
        .iter()
        .filter_map(|feature| feature.geometry.as_ref())
        .filter(|g| is_polygonal(g))
        .map(|geometry| GeometryCandidate {
            provenance: Provenance::ZoneReference,
            geometry: geometry.clone(),
        })
        .collect()
}
