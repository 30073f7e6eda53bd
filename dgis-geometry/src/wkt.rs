//! Decoding and encoding of the restricted WKT subset used by the route API.
//!
//! Only two geometry kinds occur in the payloads: `POINT(lon lat)` for stop
//! centroids and `LINESTRING(lon lat, lon lat, ...)` for polyline segments.
//! Coordinate pairs are space-separated, pairs are comma-separated, and
//! longitude always comes first.

use geo::{Coord, coord};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WktError {
    /// The input did not start with the expected geometry tag,
    /// or the parenthesized body was missing.
    #[error("expected a {expected} geometry, got {found:?}")]
    UnexpectedGeometry {
        expected: &'static str,
        found: String,
    },
    /// A coordinate pair was not two space-separated numbers.
    #[error("malformed coordinate pair {0:?}")]
    MalformedPair(String),
}

/// Strips `TAG( ... )` and returns the inner coordinate text.
fn geometry_body<'a>(wkt: &'a str, tag: &'static str) -> Result<&'a str, WktError> {
    let unexpected = || WktError::UnexpectedGeometry {
        expected: tag,
        found: truncated(wkt),
    };
    let rest = wkt.trim().strip_prefix(tag).ok_or_else(unexpected)?;
    rest.trim_start()
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
        .ok_or_else(unexpected)
}

fn parse_pair(pair: &str) -> Result<Coord<f64>, WktError> {
    let malformed = || WktError::MalformedPair(truncated(pair));
    let mut parts = pair.split_whitespace();
    let (Some(x), Some(y), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(malformed());
    };
    let x: f64 = x.parse().map_err(|_| malformed())?;
    let y: f64 = y.parse().map_err(|_| malformed())?;
    Ok(coord! { x: x, y: y })
}

/// Truncates pathological inputs so they don't blow up error messages.
fn truncated(input: &str) -> String {
    const LIMIT: usize = 48;
    if input.len() <= LIMIT {
        input.to_string()
    } else {
        let cut = input
            .char_indices()
            .map(|(index, _)| index)
            .take_while(|index| *index <= LIMIT)
            .last()
            .unwrap_or(0);
        format!("{}...", &input[..cut])
    }
}

/// Decodes a `POINT(lon lat)` string into a single coordinate.
///
/// # Errors
///
/// Fails if the input is not a `POINT` geometry or the coordinate pair is
/// not two numbers.
pub fn decode_point(wkt: &str) -> Result<Coord<f64>, WktError> {
    parse_pair(geometry_body(wkt, "POINT")?)
}

/// Decodes a `LINESTRING(lon lat, ...)` string into an ordered coordinate
/// sequence. Input order is preserved; the polyline direction matters for
/// display.
///
/// # Errors
///
/// Fails if the input is not a `LINESTRING` geometry or any coordinate pair
/// is malformed.
pub fn decode_line_string(wkt: &str) -> Result<Vec<Coord<f64>>, WktError> {
    geometry_body(wkt, "LINESTRING")?
        .split(',')
        .map(parse_pair)
        .collect()
}

/// Encodes a coordinate as `POINT(lon lat)`.
pub fn encode_point(coord: Coord<f64>) -> String {
    format!("POINT({} {})", coord.x, coord.y)
}

/// Encodes a coordinate sequence as `LINESTRING(lon lat, ...)`.
pub fn encode_line_string(coords: &[Coord<f64>]) -> String {
    let pairs: Vec<String> = coords
        .iter()
        .map(|coord| format!("{} {}", coord.x, coord.y))
        .collect();
    format!("LINESTRING({})", pairs.join(", "))
}

#[cfg(test)]
mod test {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn decodes_point() {
        let coord = decode_point("POINT(66.975196 39.654919)").expect("valid point");
        assert!((coord.x - 66.975_196).abs() < 1e-12);
        assert!((coord.y - 39.654_919).abs() < 1e-12);
    }

    #[test]
    fn decodes_point_with_whitespace() {
        let coord = decode_point("  POINT (1.5 -2.25)  ").expect("valid point");
        assert!((coord.x - 1.5).abs() < 1e-12);
        assert!((coord.y + 2.25).abs() < 1e-12);
    }

    #[test]
    fn decodes_line_string_in_order() {
        let coords = decode_line_string("LINESTRING(1 2, 3 4, 5 6)").expect("valid line");
        assert_eq!(coords.len(), 3);
        assert!((coords[0].x - 1.0).abs() < 1e-12);
        assert!((coords[2].y - 6.0).abs() < 1e-12);
    }

    #[test]
    fn rejects_wrong_tag() {
        assert!(matches!(
            decode_point("LINESTRING(1 2, 3 4)"),
            Err(WktError::UnexpectedGeometry { .. })
        ));
        assert!(matches!(
            decode_line_string("POINT(1 2)"),
            Err(WktError::UnexpectedGeometry { .. })
        ));
    }

    #[test]
    fn rejects_malformed_pairs() {
        assert!(matches!(
            decode_point("POINT(1)"),
            Err(WktError::MalformedPair(_))
        ));
        assert!(matches!(
            decode_line_string("LINESTRING(1 2, x y)"),
            Err(WktError::MalformedPair(_))
        ));
        assert!(matches!(
            decode_line_string("LINESTRING()"),
            Err(WktError::MalformedPair(_))
        ));
    }

    proptest! {
        #[test]
        fn point_round_trips(x in -180.0f64..180.0, y in -90.0f64..90.0) {
            let coord = geo::coord! { x: x, y: y };
            let decoded = decode_point(&encode_point(coord)).expect("round trip");
            // Display formatting of f64 is lossless, so this is exact.
            prop_assert_eq!(decoded, coord);
        }

        #[test]
        fn line_string_round_trips(
            pairs in prop::collection::vec((-180.0f64..180.0, -90.0f64..90.0), 1..64)
        ) {
            let coords: Vec<_> = pairs
                .iter()
                .map(|(x, y)| geo::coord! { x: *x, y: *y })
                .collect();
            let decoded = decode_line_string(&encode_line_string(&coords)).expect("round trip");
            prop_assert_eq!(decoded, coords);
        }
    }
}
