//! Ring polygons with holes describing water bodies.

use crate::gline::{on_segment, orientation, segments_intersect, GeoLine, Orientation};
use crate::gpoint::GeoPoint;
use crate::{GeoError, Result};
use serde::{Deserialize, Serialize};

/// A polygon with one outer ring and zero or more hole rings.
///
/// Rings are stored open (closure to the first vertex is implicit). The
/// polygon carries the maximum speed permitted inside it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Polygon {
    outer: Vec<GeoPoint>,
    holes: Vec<Vec<GeoPoint>>,
    id: String,
    max_speed_ms: Option<f64>,
}

impl Polygon {
    /// Build a polygon, validating ring structure: the outer ring needs at
    /// least three distinct vertices, no ring self-intersects, and every
    /// hole vertex lies strictly inside the outer ring.
    pub fn new(
        outer: Vec<GeoPoint>,
        holes: Vec<Vec<GeoPoint>>,
        id: impl Into<String>,
    ) -> Result<Self> {
        let outer = strip_closing_vertex(outer);
        let holes: Vec<Vec<GeoPoint>> =
            holes.into_iter().map(strip_closing_vertex).collect();

        if outer.len() < 3 {
            return Err(GeoError::InvalidRing {
                message: "outer ring needs at least three vertices".to_string(),
            });
        }
        if ring_self_intersects(&outer) {
            return Err(GeoError::InvalidRing {
                message: "outer ring is self-intersecting".to_string(),
            });
        }
        for (i, hole) in holes.iter().enumerate() {
            if hole.len() < 3 {
                return Err(GeoError::InvalidRing {
                    message: format!("hole {} needs at least three vertices", i),
                });
            }
            if ring_self_intersects(hole) {
                return Err(GeoError::InvalidRing {
                    message: format!("hole {} is self-intersecting", i),
                });
            }
            for v in hole {
                if !point_in_ring(v, &outer) {
                    return Err(GeoError::InvalidRing {
                        message: format!("hole {} extends outside the outer ring", i),
                    });
                }
            }
        }

        Ok(Self {
            outer,
            holes,
            id: id.into(),
            max_speed_ms: None,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn outer(&self) -> &[GeoPoint] {
        &self.outer
    }

    pub fn holes(&self) -> &[Vec<GeoPoint>] {
        &self.holes
    }

    pub fn max_allowed_speed(&self) -> Option<f64> {
        self.max_speed_ms
    }

    pub fn set_max_allowed_speed(&mut self, max_speed_ms: f64) {
        self.max_speed_ms = Some(max_speed_ms);
    }

    /// Whether the point is a vertex of the outer ring or of any hole.
    pub fn has_vertex(&self, point: &GeoPoint) -> bool {
        self.outer.iter().any(|v| v == point)
            || self.holes.iter().any(|h| h.iter().any(|v| v == point))
    }

    /// Whether the point lies on an outer or hole edge.
    pub fn on_boundary(&self, point: &GeoPoint) -> bool {
        self.edge_endpoints().any(|(a, b)| {
            orientation(a, b, point) == Orientation::Collinear && on_segment(a, point, b)
        })
    }

    /// Ring inclusion with hole subtraction. Boundary vertices and points
    /// on boundary edges count as inside.
    pub fn contains(&self, point: &GeoPoint) -> bool {
        if self.has_vertex(point) || self.on_boundary(point) {
            return true;
        }
        if !point_in_ring(point, &self.outer) {
            return false;
        }
        for hole in &self.holes {
            if point_in_ring(point, hole) {
                return false;
            }
        }
        true
    }

    /// Whether the segment crosses any edge of the outer ring or a hole,
    /// ignoring crossings at shared polygon vertices (a visibility segment
    /// may legitimately start and end on the boundary).
    pub fn intersects_segment(&self, segment: &GeoLine) -> bool {
        self.edge_endpoints()
            .any(|(a, b)| segment_crosses_edge_properly(segment, a, b))
    }

    /// Minimum perpendicular clearance (m) from the segment to every polygon
    /// and hole vertex, the widest hull the segment can carry.
    pub fn max_clear_width(&self, segment: &GeoLine) -> f64 {
        let mut min_clearance = f64::INFINITY;
        for vertex in self
            .outer
            .iter()
            .chain(self.holes.iter().flat_map(|h| h.iter()))
        {
            let d = segment.perpendicular_distance(vertex);
            if d < min_clearance {
                min_clearance = d;
            }
        }
        min_clearance
    }

    /// Planar area of the outer ring minus the holes, in squared degrees.
    pub fn area(&self) -> f64 {
        let mut area = ring_area(&self.outer).abs();
        for hole in &self.holes {
            area -= ring_area(hole).abs();
        }
        area
    }

    /// Geodesic perimeter of the outer ring (m).
    pub fn perimeter(&self) -> f64 {
        (0..self.outer.len())
            .map(|i| {
                let next = (i + 1) % self.outer.len();
                self.outer[i].distance(&self.outer[next])
            })
            .sum()
    }

    /// All boundary edges as measured lines: outer ring plus hole rings,
    /// closing each ring.
    pub fn edges(&self) -> impl Iterator<Item = GeoLine> + '_ {
        self.edge_endpoints()
            .map(|(a, b)| GeoLine::new(a.clone(), b.clone()))
    }

    /// All boundary edges as endpoint pairs, avoiding the geodesic length
    /// computation of a full [`GeoLine`].
    fn edge_endpoints(&self) -> impl Iterator<Item = (&GeoPoint, &GeoPoint)> {
        ring_edge_pairs(&self.outer).chain(self.holes.iter().flat_map(|h| ring_edge_pairs(h)))
    }
}

/// Consecutive vertex pairs of a ring, closing back to the first vertex.
fn ring_edge_pairs(ring: &[GeoPoint]) -> impl Iterator<Item = (&GeoPoint, &GeoPoint)> {
    (0..ring.len()).map(move |i| (&ring[i], &ring[(i + 1) % ring.len()]))
}

/// Remove the explicit closing vertex when a ring repeats its first point.
fn strip_closing_vertex(mut ring: Vec<GeoPoint>) -> Vec<GeoPoint> {
    if ring.len() > 1 && ring.first() == ring.last() {
        ring.pop();
    }
    ring
}

/// Ray-crossing inclusion test against a single ring.
fn point_in_ring(point: &GeoPoint, ring: &[GeoPoint]) -> bool {
    let mut inside = false;
    let n = ring.len();
    let mut j = n - 1;
    for i in 0..n {
        let vi = &ring[i];
        let vj = &ring[j];
        let crosses = (vi.lat() > point.lat()) != (vj.lat() > point.lat());
        if crosses {
            let x_at_lat = (vj.lon() - vi.lon()) * (point.lat() - vi.lat())
                / (vj.lat() - vi.lat())
                + vi.lon();
            if point.lon() < x_at_lat {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

fn ring_area(ring: &[GeoPoint]) -> f64 {
    let n = ring.len();
    let mut sum = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        sum += ring[i].lon() * ring[j].lat() - ring[j].lon() * ring[i].lat();
    }
    sum / 2.0
}

fn ring_self_intersects(ring: &[GeoPoint]) -> bool {
    let n = ring.len();
    if n < 4 {
        return false;
    }
    for i in 0..n {
        for j in (i + 1)..n {
            // Adjacent edges share a vertex by construction
            if j == i + 1 || (i == 0 && j == n - 1) {
                continue;
            }
            if segments_intersect(
                &ring[i],
                &ring[(i + 1) % n],
                &ring[j],
                &ring[(j + 1) % n],
            ) {
                return true;
            }
        }
    }
    false
}

/// A crossing of the segment and the edge a–b that is not merely a shared
/// endpoint of the two.
fn segment_crosses_edge_properly(segment: &GeoLine, a: &GeoPoint, b: &GeoPoint) -> bool {
    if !segments_intersect(segment.start(), segment.end(), a, b) {
        return false;
    }
    let shares_endpoint = segment.start() == a
        || segment.start() == b
        || segment.end() == a
        || segment.end() == b;
    if !shares_endpoint {
        return true;
    }
    // Shared-vertex contact still blocks visibility when the other endpoint
    // pierces the edge interior.
    let interior_contact = |p: &GeoPoint| {
        p != a
            && p != b
            && orientation(a, b, p) == Orientation::Collinear
            && on_segment(a, p, b)
    };
    interior_contact(segment.start()) || interior_contact(segment.end())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(id: &str) -> Polygon {
        Polygon::new(
            vec![
                GeoPoint::new(0.0, 0.0),
                GeoPoint::new(0.0, 10.0),
                GeoPoint::new(10.0, 10.0),
                GeoPoint::new(10.0, 0.0),
            ],
            vec![],
            id,
        )
        .unwrap()
    }

    fn square_with_hole() -> Polygon {
        Polygon::new(
            vec![
                GeoPoint::new(0.0, 0.0),
                GeoPoint::new(0.0, 10.0),
                GeoPoint::new(10.0, 10.0),
                GeoPoint::new(10.0, 0.0),
            ],
            vec![vec![
                GeoPoint::new(3.0, 3.0),
                GeoPoint::new(3.0, 7.0),
                GeoPoint::new(7.0, 7.0),
                GeoPoint::new(7.0, 3.0),
            ]],
            "holed",
        )
        .unwrap()
    }

    #[test]
    fn test_containment() {
        let p = square("sq");
        assert!(p.contains(&GeoPoint::new(5.0, 5.0)));
        assert!(!p.contains(&GeoPoint::new(15.0, 5.0)));
        // Vertices count as inside
        assert!(p.contains(&GeoPoint::new(0.0, 0.0)));
    }

    #[test]
    fn test_hole_subtraction() {
        let p = square_with_hole();
        assert!(p.contains(&GeoPoint::new(1.0, 5.0)));
        assert!(!p.contains(&GeoPoint::new(5.0, 5.0)));
        // A hole vertex is on the navigable boundary
        assert!(p.contains(&GeoPoint::new(3.0, 3.0)));
    }

    #[test]
    fn test_segment_across_hole_intersects() {
        let p = square_with_hole();
        let crossing = GeoLine::new(GeoPoint::new(1.0, 5.0), GeoPoint::new(9.0, 5.0));
        assert!(p.intersects_segment(&crossing));
        let clear = GeoLine::new(GeoPoint::new(1.0, 1.0), GeoPoint::new(9.0, 1.0));
        assert!(!p.intersects_segment(&clear));
    }

    #[test]
    fn test_segment_between_vertices_is_clear() {
        let p = square_with_hole();
        // Corner-to-corner around the hole touches only shared vertices
        let hugging = GeoLine::new(GeoPoint::new(3.0, 3.0), GeoPoint::new(7.0, 3.0));
        assert!(!p.intersects_segment(&hugging));
    }

    #[test]
    fn test_rejects_degenerate_ring() {
        let r = Polygon::new(
            vec![GeoPoint::new(0.0, 0.0), GeoPoint::new(1.0, 1.0)],
            vec![],
            "bad",
        );
        assert!(r.is_err());
    }

    #[test]
    fn test_rejects_hole_outside_outer() {
        let r = Polygon::new(
            vec![
                GeoPoint::new(0.0, 0.0),
                GeoPoint::new(0.0, 10.0),
                GeoPoint::new(10.0, 10.0),
                GeoPoint::new(10.0, 0.0),
            ],
            vec![vec![
                GeoPoint::new(20.0, 20.0),
                GeoPoint::new(20.0, 25.0),
                GeoPoint::new(25.0, 25.0),
            ]],
            "bad",
        );
        assert!(r.is_err());
    }

    #[test]
    fn test_max_clear_width() {
        let p = square("sq");
        // A mid-channel segment is 5 degrees away from both walls
        let mid = GeoLine::new(GeoPoint::new(5.0, 2.0), GeoPoint::new(5.0, 8.0));
        let clearance = p.max_clear_width(&mid);
        assert!(clearance > 0.0);
        let hugging = GeoLine::new(GeoPoint::new(1.0, 2.0), GeoPoint::new(1.0, 8.0));
        assert!(p.max_clear_width(&hugging) < clearance);
    }

    #[test]
    fn test_closed_ring_input_accepted() {
        let p = Polygon::new(
            vec![
                GeoPoint::new(0.0, 0.0),
                GeoPoint::new(0.0, 10.0),
                GeoPoint::new(10.0, 10.0),
                GeoPoint::new(10.0, 0.0),
                GeoPoint::new(0.0, 0.0),
            ],
            vec![],
            "closed",
        )
        .unwrap();
        assert_eq!(p.outer().len(), 4);
    }
}
