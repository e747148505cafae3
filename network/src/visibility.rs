//! The visibility graph over boundary vertices.

use crate::boundaries::WaterBoundaries;
use crate::{Result, RouteError};
use fairway_geo::{GeoLine, GeoPoint};
use std::collections::HashMap;
use tracing::debug;

/// Coordinate bit-pattern key for exact vertex identity.
fn point_key(p: &GeoPoint) -> (u64, u64) {
    (p.lon().to_bits(), p.lat().to_bits())
}

/// A visibility graph: every pair of mutually visible boundary vertices is
/// connected by an edge weighted with its geodesic length.
///
/// The adjacency preserves insertion order (outer rings, then holes,
/// polygon by polygon, then waypoints in arrival order), which makes
/// shortest-path tie-breaking reproducible. Must-traverse waypoints are
/// layered on top of the base graph and can be cleared between queries.
#[derive(Debug, Clone)]
pub struct VisibilityGraph {
    boundaries: WaterBoundaries,
    vertices: Vec<GeoPoint>,
    adjacency: Vec<Vec<(usize, f64)>>,
    index: HashMap<(u64, u64), usize>,
    base_vertex_count: usize,
}

impl VisibilityGraph {
    /// Build the base graph over all polygon vertices.
    pub fn new(boundaries: WaterBoundaries) -> Self {
        let mut graph = Self {
            boundaries,
            vertices: Vec::new(),
            adjacency: Vec::new(),
            index: HashMap::new(),
            base_vertex_count: 0,
        };
        graph.build_base();
        graph
    }

    fn build_base(&mut self) {
        let boundary_vertices: Vec<GeoPoint> =
            self.boundaries.vertices().cloned().collect();
        for vertex in boundary_vertices {
            self.push_vertex_connected(vertex);
        }
        self.base_vertex_count = self.vertices.len();
        let edge_count: usize = self.adjacency.iter().map(|a| a.len()).sum();
        debug!(
            vertices = self.base_vertex_count,
            directed_edges = edge_count,
            "visibility graph built"
        );
    }

    /// Add a vertex (deduplicated by exact coordinates) and connect it to
    /// every visible existing vertex. Returns its index.
    fn push_vertex_connected(&mut self, vertex: GeoPoint) -> usize {
        let key = point_key(&vertex);
        if let Some(&i) = self.index.get(&key) {
            return i;
        }

        let i = self.vertices.len();
        self.vertices.push(vertex);
        self.adjacency.push(Vec::new());
        self.index.insert(key, i);

        for j in 0..i {
            let segment = GeoLine::new(self.vertices[j].clone(), self.vertices[i].clone());
            if self.boundaries.allows_segment(&segment) {
                let length = segment.length();
                self.adjacency[j].push((i, length));
                self.adjacency[i].push((j, length));
            }
        }
        i
    }

    pub fn boundaries(&self) -> &WaterBoundaries {
        &self.boundaries
    }

    pub fn vertices(&self) -> &[GeoPoint] {
        &self.vertices
    }

    pub fn neighbors(&self, index: usize) -> &[(usize, f64)] {
        &self.adjacency[index]
    }

    pub fn vertex_index(&self, point: &GeoPoint) -> Option<usize> {
        self.index.get(&point_key(point)).copied()
    }

    /// Insert a must-traverse waypoint, connecting it on demand. Fails when
    /// the point is not inside the navigable region.
    pub fn insert_waypoint(&mut self, point: &GeoPoint) -> Result<usize> {
        if let Some(i) = self.vertex_index(point) {
            return Ok(i);
        }
        if !self.boundaries.contains_point(point) {
            return Err(RouteError::WaypointNotInWater {
                lon: point.lon(),
                lat: point.lat(),
            });
        }
        Ok(self.push_vertex_connected(point.clone()))
    }

    /// Drop every waypoint layered on top of the base graph.
    pub fn clear_waypoints(&mut self) {
        let base = self.base_vertex_count;
        for removed in self.vertices.drain(base..) {
            self.index.remove(&point_key(&removed));
        }
        self.adjacency.truncate(base);
        for neighbors in &mut self.adjacency {
            neighbors.retain(|(j, _)| *j < base);
        }
    }

    /// Number of base (polygon) vertices.
    pub fn base_vertex_count(&self) -> usize {
        self.base_vertex_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundaries::BoundaryKind;
    use fairway_geo::Polygon;

    fn simple_square() -> VisibilityGraph {
        let polygon = Polygon::new(
            vec![
                GeoPoint::new(0.0, 0.0),
                GeoPoint::new(0.0, 10.0),
                GeoPoint::new(10.0, 10.0),
                GeoPoint::new(10.0, 0.0),
            ],
            vec![],
            "wb",
        )
        .unwrap();
        VisibilityGraph::new(WaterBoundaries::new(vec![polygon], BoundaryKind::Water).unwrap())
    }

    #[test]
    fn test_square_is_fully_connected() {
        let graph = simple_square();
        assert_eq!(graph.vertices().len(), 4);
        // Every corner sees every other corner in a convex polygon
        for i in 0..4 {
            assert_eq!(graph.neighbors(i).len(), 3);
        }
    }

    #[test]
    fn test_waypoint_insertion_and_clearing() {
        let mut graph = simple_square();
        let i = graph.insert_waypoint(&GeoPoint::new(5.0, 5.0)).unwrap();
        assert_eq!(i, 4);
        assert_eq!(graph.neighbors(i).len(), 4);

        graph.clear_waypoints();
        assert_eq!(graph.vertices().len(), 4);
        for i in 0..4 {
            assert!(graph.neighbors(i).iter().all(|(j, _)| *j < 4));
        }
    }

    #[test]
    fn test_waypoint_outside_water_rejected() {
        let mut graph = simple_square();
        let r = graph.insert_waypoint(&GeoPoint::new(50.0, 50.0));
        assert!(matches!(r, Err(RouteError::WaypointNotInWater { .. })));
    }

    #[test]
    fn test_duplicate_waypoint_reuses_vertex() {
        let mut graph = simple_square();
        let a = graph.insert_waypoint(&GeoPoint::new(5.0, 5.0)).unwrap();
        let b = graph.insert_waypoint(&GeoPoint::new(5.0, 5.0)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_hole_blocks_visibility() {
        let polygon = Polygon::new(
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
            "wb",
        )
        .unwrap();
        let mut graph = VisibilityGraph::new(
            WaterBoundaries::new(vec![polygon], BoundaryKind::Water).unwrap(),
        );

        let a = graph.insert_waypoint(&GeoPoint::new(1.0, 5.0)).unwrap();
        let b = graph.insert_waypoint(&GeoPoint::new(9.0, 5.0)).unwrap();
        // The direct edge would cross the hole
        assert!(!graph.neighbors(a).iter().any(|(j, _)| *j == b));
    }
}
