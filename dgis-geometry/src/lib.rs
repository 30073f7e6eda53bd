//! # Route geometry codec
//!
//! The 2GIS route API encodes geometry as a restricted well-known-text
//! subset: `POINT` for stop centroids and `LINESTRING` for route polyline
//! segments. This crate decodes (and re-encodes) that subset over
//! [`geo::Coord`], and converts a whole route document into a GeoJSON
//! feature collection of stop and route-segment features.

// Private modules by default
mod feature;
mod wkt;

pub use feature::{OUTBOUND_LABEL, RETURN_LABEL, direction_label, route_feature_collection};
pub use wkt::{WktError, decode_line_string, decode_point, encode_line_string, encode_point};
