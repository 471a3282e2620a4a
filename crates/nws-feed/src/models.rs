//! Feed document models.
//!
//! The feed is GeoJSON-flavored: a feature collection whose features are
//! alerts. Fields the pipeline doesn't use are simply not modeled.

use geojson::Value;
use serde::Deserialize;

/// One page of the active-alerts feed.
#[derive(Debug, Clone, Deserialize)]
pub struct AlertCollection {
    #[serde(default)]
    pub features: Vec<AlertFeature>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

/// Continuation reference carried by a feed page.
#[derive(Debug, Clone, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub next: Option<String>,
}

/// One alert, as it appears in the feed.
///
/// Immutable snapshot; nothing here is ever mutated locally.
#[derive(Debug, Clone, Deserialize)]
pub struct AlertFeature {
    /// Feature-level identifier, a fallback for `properties.id`.
    #[serde(default)]
    pub id: Option<String>,
    /// Direct boundary, when the alert carries one.
    #[serde(default)]
    pub geometry: Option<geojson::Geometry>,
    #[serde(default)]
    pub properties: AlertProperties,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AlertProperties {
    pub id: Option<String>,
    pub event: Option<String>,
    pub headline: Option<String>,
    /// Only `"Alert"` triggers delivery; `"Update"`/`"Cancel"` are skipped.
    pub message_type: Option<String>,
    /// Forecast-zone URLs to dereference when the alert has no direct boundary.
    pub affected_zones: Vec<String>,
}

impl AlertFeature {
    /// Stable identifier: `properties.id`, falling back to the feature id.
    pub fn alert_id(&self) -> Option<&str> {
        self.properties.id.as_deref().or(self.id.as_deref())
    }

    /// Event category, defaulting to the generic "Alert".
    pub fn event(&self) -> &str {
        self.properties.event.as_deref().unwrap_or("Alert")
    }

    /// Whether the direct geometry is a polygon or multi-polygon.
    pub fn has_polygonal_geometry(&self) -> bool {
        self.geometry.as_ref().is_some_and(is_polygonal)
    }
}

/// A dereferenced forecast-zone resource.
///
/// Comes in two shapes: a single feature with a `geometry`, or a feature
/// collection whose members may carry polygonal geometries.
#[derive(Debug, Clone, Deserialize)]
pub struct ZoneDocument {
    #[serde(default)]
    pub geometry: Option<geojson::Geometry>,
    #[serde(default)]
    pub features: Vec<ZoneFeature>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ZoneFeature {
    #[serde(default)]
    pub geometry: Option<geojson::Geometry>,
}

pub(crate) fn is_polygonal(geom: &geojson::Geometry) -> bool {
    matches!(geom.value, Value::Polygon(_) | Value::MultiPolygon(_))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alert_id_prefers_properties() {
        let alert: AlertFeature = serde_json::from_value(serde_json::json!({
            "id": "feature-id",
            "properties": { "id": "props-id" }
        }))
        .unwrap();
        assert_eq!(alert.alert_id(), Some("props-id"));
    }

    #[test]
    fn test_alert_id_falls_back_to_feature_id() {
        let alert: AlertFeature = serde_json::from_value(serde_json::json!({
            "id": "feature-id",
            "properties": {}
        }))
        .unwrap();
        assert_eq!(alert.alert_id(), Some("feature-id"));
    }

    #[test]
    fn test_feed_page_decodes() {
        let page: AlertCollection = serde_json::from_value(serde_json::json!({
            "features": [{
                "id": "urn:x:1",
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[-105.0, 40.0], [-104.0, 40.0], [-104.0, 41.0], [-105.0, 40.0]]]
                },
                "properties": {
                    "id": "urn:x:1",
                    "event": "Flood Warning",
                    "headline": "Flood Warning issued",
                    "messageType": "Alert",
                    "affectedZones": ["https://api.weather.gov/zones/forecast/COZ040"]
                }
            }],
            "pagination": { "next": "https://api.weather.gov/alerts/active?cursor=abc" }
        }))
        .unwrap();

        let alert = &page.features[0];
        assert!(alert.has_polygonal_geometry());
        assert_eq!(alert.event(), "Flood Warning");
        assert_eq!(alert.properties.affected_zones.len(), 1);
        assert!(page.pagination.unwrap().next.is_some());
    }

    #[test]
    fn test_nonpolygonal_geometry_is_not_a_boundary() {
        let alert: AlertFeature = serde_json::from_value(serde_json::json!({
            "id": "urn:x:2",
            "geometry": { "type": "Point", "coordinates": [-105.0, 40.0] },
            "properties": {}
        }))
        .unwrap();
        assert!(!alert.has_polygonal_geometry());
    }
}
