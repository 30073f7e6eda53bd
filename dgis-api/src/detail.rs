use serde::Deserialize;
use serde_json::Value as JsonValue;

/// Envelope of a route detail ("byid") API response.
#[derive(Deserialize, Debug, Clone)]
pub struct DetailEnvelope {
    #[serde(default)]
    pub result: Option<DetailResult>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct DetailResult {
    #[serde(default)]
    pub items: Vec<RouteItem>,
}

impl DetailEnvelope {
    /// Returns the first result item describing a transit route, if any.
    pub fn first_route(&self) -> Option<&RouteItem> {
        self.result
            .as_ref()?
            .items
            .iter()
            .find(|item| item.kind == "route")
    }
}

/// One result item from a detail envelope.
///
/// Only items with `kind == "route"` describe a transit line; the same
/// endpoint also serves buildings, firms, and other map objects.
#[derive(Deserialize, Debug, Clone)]
pub struct RouteItem {
    /// The item kind (`"route"` for transit lines).
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Route identifier, stable across the detail and schedule streams.
    #[serde(default)]
    pub id: String,
    /// Display name (typically the route number, e.g. `"22"`).
    #[serde(default)]
    pub name: Option<String>,
    /// Name of the first terminus.
    #[serde(default)]
    pub from_name: Option<String>,
    /// Name of the last terminus.
    #[serde(default)]
    pub to_name: Option<String>,
    /// Travel directions, each with its own stops and geometry.
    #[serde(default)]
    pub directions: Vec<Direction>,
}

/// One travel direction of a route.
#[derive(Deserialize, Debug, Clone)]
pub struct Direction {
    /// `"forward"` for the outbound direction; anything else is the return.
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Stop points in travel order.
    #[serde(default)]
    pub platforms: Vec<Platform>,
    #[serde(default)]
    pub geometry: Option<DirectionGeometry>,
}

/// A named stop point.
#[derive(Deserialize, Debug, Clone)]
pub struct Platform {
    #[serde(default)]
    pub name: Option<String>,
    /// Station identifier; passed through to the geodata artifact verbatim.
    #[serde(default)]
    pub station_id: Option<JsonValue>,
    #[serde(default)]
    pub geometry: Option<PlatformGeometry>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct PlatformGeometry {
    /// WKT `POINT` centroid of the stop.
    #[serde(default)]
    pub centroid: Option<String>,
}

/// Polyline geometry of one direction, split into display segments.
#[derive(Deserialize, Debug, Clone)]
pub struct DirectionGeometry {
    #[serde(default)]
    pub immersion: Vec<GeometrySegment>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct GeometrySegment {
    /// WKT `LINESTRING` for this segment.
    #[serde(default)]
    pub selection: Option<String>,
}
