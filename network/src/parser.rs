//! Parser for the sectioned network description text format.
//!
//! ```text
//! [WATERBODY 1]
//! [WATER BOUNDRY]
//!   1, -5.0, 48.0
//!   2, -5.0, 52.0
//!   ...
//! [END]
//! [LAND]
//!   1, -4.2, 50.1
//!   ...
//! [END]
//! ```
//!
//! Section headers are case-insensitive; `#` starts a comment running to
//! the end of the line. Zero or more `[LAND]` holes per waterbody, zero or
//! more waterbodies per file.

use crate::boundaries::{BoundaryKind, WaterBoundaries};
use crate::{Result, RouteError};
use fairway_geo::{GeoPoint, Polygon};
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    WaterBoundary,
    Land,
}

/// Parse a network description from text.
pub fn parse_network_text(text: &str) -> Result<WaterBoundaries> {
    let mut polygons: Vec<Polygon> = Vec::new();

    let mut water_body_id = String::new();
    let mut outer: Vec<GeoPoint> = Vec::new();
    let mut holes: Vec<Vec<GeoPoint>> = Vec::new();
    let mut current: Vec<GeoPoint> = Vec::new();
    let mut section = Section::None;

    let mut finalize =
        |id: &str, outer: &mut Vec<GeoPoint>, holes: &mut Vec<Vec<GeoPoint>>| -> Result<()> {
            if outer.is_empty() && holes.is_empty() {
                return Ok(());
            }
            let polygon = Polygon::new(std::mem::take(outer), std::mem::take(holes), id)?;
            polygons.push(polygon);
            Ok(())
        };

    for (line_no, raw_line) in text.lines().enumerate() {
        let line_number = line_no + 1;

        // Strip comments and whitespace
        let line = match raw_line.find('#') {
            Some(i) => &raw_line[..i],
            None => raw_line,
        }
        .trim();
        if line.is_empty() {
            continue;
        }

        if let Some(header) = parse_section_header(line) {
            let lowered = header.to_lowercase();
            if let Some(id) = lowered.strip_prefix("waterbody") {
                finalize(&water_body_id, &mut outer, &mut holes)?;
                water_body_id = id.trim().to_string();
                section = Section::None;
            } else if lowered == "water boundry" || lowered == "water boundary" {
                section = Section::WaterBoundary;
                current.clear();
            } else if lowered == "land" {
                section = Section::Land;
                current.clear();
            } else if lowered == "end" {
                match section {
                    Section::WaterBoundary => outer = std::mem::take(&mut current),
                    Section::Land => holes.push(std::mem::take(&mut current)),
                    Section::None => {
                        return Err(RouteError::Parse {
                            line: line_number,
                            message: "[END] outside of any section".to_string(),
                        })
                    }
                }
                section = Section::None;
            } else {
                return Err(RouteError::Parse {
                    line: line_number,
                    message: format!("unknown section header [{}]", header),
                });
            }
            continue;
        }

        if section == Section::None {
            return Err(RouteError::Parse {
                line: line_number,
                message: format!("unexpected content outside a section: {}", line),
            });
        }

        current.push(parse_point_row(line, line_number)?);
    }

    finalize(&water_body_id, &mut outer, &mut holes)?;

    debug!(polygons = polygons.len(), "network text parsed");
    WaterBoundaries::new(polygons, BoundaryKind::Water)
}

/// Parse a network description file from disk.
pub fn parse_network_file(path: impl AsRef<Path>) -> Result<WaterBoundaries> {
    let text = std::fs::read_to_string(path)?;
    parse_network_text(&text)
}

fn parse_section_header(line: &str) -> Option<&str> {
    let inner = line.strip_prefix('[')?.strip_suffix(']')?;
    Some(inner.trim())
}

/// An `id, lon, lat` row.
fn parse_point_row(line: &str, line_number: usize) -> Result<GeoPoint> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() != 3 {
        return Err(RouteError::Parse {
            line: line_number,
            message: format!("expected 'id,lon,lat', got: {}", line),
        });
    }
    let id = fields[0];
    let lon: f64 = fields[1].parse().map_err(|_| RouteError::Parse {
        line: line_number,
        message: format!("invalid longitude: {}", fields[1]),
    })?;
    let lat: f64 = fields[2].parse().map_err(|_| RouteError::Parse {
        line: line_number,
        message: format!("invalid latitude: {}", fields[2]),
    })?;
    Ok(GeoPoint::with_id(lon, lat, id))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# A square waterbody with one island
[WATERBODY 1]
[WATER BOUNDRY]
1, 0.0, 0.0
2, 0.0, 10.0
3, 10.0, 10.0
4, 10.0, 0.0
[END]
[land]
1, 3.0, 3.0   # south-west corner of the island
2, 3.0, 7.0
3, 7.0, 7.0
4, 7.0, 3.0
[END]
";

    #[test]
    fn test_parse_sample() {
        let boundaries = parse_network_text(SAMPLE).unwrap();
        assert_eq!(boundaries.polygons().len(), 1);
        let polygon = &boundaries.polygons()[0];
        assert_eq!(polygon.id(), "1");
        assert_eq!(polygon.outer().len(), 4);
        assert_eq!(polygon.holes().len(), 1);
    }

    #[test]
    fn test_case_insensitive_sections() {
        let text = SAMPLE.to_uppercase();
        assert!(parse_network_text(&text).is_ok());
    }

    #[test]
    fn test_comments_stripped() {
        let boundaries = parse_network_text(SAMPLE).unwrap();
        let hole = &boundaries.polygons()[0].holes()[0];
        assert_eq!(hole[0].lon(), 3.0);
    }

    #[test]
    fn test_multiple_waterbodies() {
        let text = "\
[WATERBODY 1]
[WATER BOUNDRY]
1, 0.0, 0.0
2, 0.0, 5.0
3, 5.0, 5.0
[END]
[WATERBODY 2]
[WATER BOUNDRY]
1, 20.0, 20.0
2, 20.0, 25.0
3, 25.0, 25.0
[END]
";
        let boundaries = parse_network_text(text).unwrap();
        assert_eq!(boundaries.polygons().len(), 2);
        assert_eq!(boundaries.polygons()[1].id(), "2");
    }

    #[test]
    fn test_bad_point_row_reports_line() {
        let text = "\
[WATERBODY 1]
[WATER BOUNDRY]
1, not-a-number, 0.0
[END]
";
        let err = parse_network_text(text).unwrap_err();
        assert!(matches!(err, RouteError::Parse { line: 3, .. }));
    }

    #[test]
    fn test_content_outside_section_rejected() {
        let text = "1, 0.0, 0.0\n";
        assert!(parse_network_text(text).is_err());
    }
}
