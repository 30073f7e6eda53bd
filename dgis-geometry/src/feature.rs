//! Conversion of a route document into a GeoJSON feature collection.

use crate::wkt;
use dgis_api::{Direction, Platform, RouteItem};
use geo::Coord;
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value as GeoJsonValue};
use serde_json::{Value as JsonValue, json};

/// Direction label for the outbound (`"forward"`) direction.
///
/// The labels match the site's own language; they end up verbatim in the
/// persisted artifacts.
pub const OUTBOUND_LABEL: &str = "Туда";

/// Direction label for the return direction.
pub const RETURN_LABEL: &str = "Обратно";

/// Human-readable label for a travel direction.
pub fn direction_label(direction: &Direction) -> &'static str {
    if direction.kind == "forward" {
        OUTBOUND_LABEL
    } else {
        RETURN_LABEL
    }
}

/// Converts a route document into a feature collection of stop points and
/// route-segment polylines.
///
/// Platforms without a decodable `POINT` centroid are skipped, and a
/// malformed `LINESTRING` drops only that segment; a single bad geometry
/// never invalidates the rest of the route.
pub fn route_feature_collection(route: &RouteItem) -> FeatureCollection {
    let mut features = Vec::new();

    for direction in &route.directions {
        let label = direction_label(direction);

        for platform in &direction.platforms {
            if let Some(feature) = stop_feature(platform, label) {
                features.push(feature);
            }
        }

        let segments = direction
            .geometry
            .iter()
            .flat_map(|geometry| &geometry.immersion);
        for segment in segments {
            let Some(selection) = segment.selection.as_deref() else {
                continue;
            };
            let coords = wkt::decode_line_string(selection).unwrap_or_default();
            if coords.is_empty() {
                continue;
            }
            features.push(segment_feature(&coords, route, label));
        }
    }

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

fn stop_feature(platform: &Platform, label: &str) -> Option<Feature> {
    let centroid = platform.geometry.as_ref()?.centroid.as_deref()?;
    let coord = wkt::decode_point(centroid).ok()?;

    let mut properties = JsonObject::new();
    properties.insert("name".into(), json!(platform.name));
    properties.insert(
        "station_id".into(),
        platform.station_id.clone().unwrap_or(JsonValue::Null),
    );
    properties.insert("direction".into(), json!(label));
    properties.insert("type".into(), json!("stop"));

    Some(Feature {
        bbox: None,
        geometry: Some(Geometry::new(GeoJsonValue::Point(vec![coord.x, coord.y]))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    })
}

fn segment_feature(coords: &[Coord<f64>], route: &RouteItem, label: &str) -> Feature {
    let positions: Vec<Vec<f64>> = coords.iter().map(|coord| vec![coord.x, coord.y]).collect();

    let mut properties = JsonObject::new();
    properties.insert(
        "name".into(),
        json!(format!(
            "{} — маршрут",
            route.name.as_deref().unwrap_or("unknown")
        )),
    );
    properties.insert("direction".into(), json!(label));
    properties.insert("type".into(), json!("route"));

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(GeoJsonValue::LineString(positions))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}
