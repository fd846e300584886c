//! Round-trip serialization of analysis results.
//!
//! Only the minimal wire shapes the downstream persistence layer consumes:
//! the ownership map as JSON and point sets as 2-column CSV text. Label
//! images go out through the caller's image I/O, not here.

use crate::{Ownership, Point};

/// Serialize an ownership map to the documented JSON shape:
/// `{"<cell_label>": [{"location": [row, col], "intensity_mean": …,
/// "area": …, "perimeter": …}, …], …}`.
pub fn ownership_to_json(ownership: &Ownership) -> serde_json::Result<String> {
    serde_json::to_string_pretty(ownership)
}

/// Parse an ownership map serialized by [`ownership_to_json`].
pub fn ownership_from_json(json: &str) -> serde_json::Result<Ownership> {
    serde_json::from_str(json)
}

/// Malformed line in a point-set CSV.
#[derive(Debug, thiserror::Error)]
#[error("line {line}: expected `row,col`, got {content:?}")]
pub struct PointParseError {
    pub line: usize,
    pub content: String,
}

const POINTS_HEADER: &str = "axis-0,axis-1";

/// Render a point set as 2-column CSV text, one `row,col` pair per line.
pub fn points_to_csv(points: &[Point]) -> String {
    let mut out = String::from(POINTS_HEADER);
    out.push('\n');
    for &[r, c] in points {
        out.push_str(&format!("{r},{c}\n"));
    }
    out
}

/// Parse CSV text written by [`points_to_csv`]. The header line is optional.
pub fn points_from_csv(text: &str) -> Result<Vec<Point>, PointParseError> {
    let mut points = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || (index == 0 && line == POINTS_HEADER) {
            continue;
        }
        let bad = || PointParseError {
            line: index + 1,
            content: line.to_string(),
        };
        let (r, c) = line.split_once(',').ok_or_else(bad)?;
        let r = r.trim().parse().map_err(|_| bad())?;
        let c = c.trim().parse().map_err(|_| bad())?;
        points.push([r, c]);
    }
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SpotRecord;

    fn sample_ownership() -> Ownership {
        let mut ownership = Ownership::new();
        ownership.insert(1, Vec::new());
        ownership.insert(
            3,
            vec![
                SpotRecord {
                    location: [4, 7],
                    intensity_mean: 1234.5,
                    area: 12.0,
                    perimeter: 14.0,
                },
                SpotRecord {
                    location: [9, 2],
                    intensity_mean: 0.25,
                    area: 3.0,
                    perimeter: 8.0,
                },
            ],
        );
        ownership
    }

    #[test]
    fn ownership_round_trip_is_exact() {
        let ownership = sample_ownership();
        let json = ownership_to_json(&ownership).unwrap();
        let back = ownership_from_json(&json).unwrap();
        assert_eq!(back, ownership);
    }

    #[test]
    fn ownership_json_uses_the_documented_field_names() {
        let json = ownership_to_json(&sample_ownership()).unwrap();
        assert!(json.contains("\"3\""));
        assert!(json.contains("\"location\""));
        assert!(json.contains("\"intensity_mean\""));
        assert!(json.contains("\"area\""));
        assert!(json.contains("\"perimeter\""));
    }

    #[test]
    fn points_round_trip_preserves_order() {
        let points = vec![[5, 9], [0, 0], [123, 456]];
        let csv = points_to_csv(&points);
        assert!(csv.starts_with("axis-0,axis-1\n"));
        assert_eq!(points_from_csv(&csv).unwrap(), points);
    }

    #[test]
    fn headerless_csv_still_parses() {
        assert_eq!(points_from_csv("3,4\n5,6\n").unwrap(), vec![[3, 4], [5, 6]]);
    }

    #[test]
    fn malformed_line_reports_its_position() {
        let err = points_from_csv("axis-0,axis-1\n1,2\nnonsense\n").unwrap_err();
        assert_eq!(err.line, 3);
    }
}
