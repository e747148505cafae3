//! The assembled waterway network.

use crate::boundaries::WaterBoundaries;
use crate::parser;
use crate::path::{shortest_leg, PathAlgorithm, ShortestPathResult};
use crate::rasters::EnvironmentRasters;
use crate::seaport::{closest_port, SeaPort};
use crate::visibility::VisibilityGraph;
use crate::{Result, RouteError};
use fairway_geo::{GeoLine, GeoPoint};
use fairway_hydro::Environment;
use std::path::Path;
use tracing::info;

/// A waterway network: boundary polygons, the visibility graph over them,
/// environmental rasters and the attached seaports.
///
/// The graph and rasters are built once at load and thereafter read-only;
/// only the waypoint layer of the graph changes between route queries.
#[derive(Debug)]
pub struct Network {
    graph: VisibilityGraph,
    rasters: EnvironmentRasters,
    seaports: Vec<SeaPort>,
    region_name: String,
}

impl Network {
    pub fn new(boundaries: WaterBoundaries, region_name: impl Into<String>) -> Self {
        let region_name = region_name.into();
        let graph = VisibilityGraph::new(boundaries);
        info!(
            region = %region_name,
            vertices = graph.base_vertex_count(),
            "network loaded"
        );
        Self {
            graph,
            rasters: EnvironmentRasters::new(),
            seaports: Vec::new(),
            region_name,
        }
    }

    /// Load a network from the sectioned text format.
    pub fn from_file(path: impl AsRef<Path>, region_name: impl Into<String>) -> Result<Self> {
        let boundaries = parser::parse_network_file(path)?;
        Ok(Self::new(boundaries, region_name))
    }

    pub fn region_name(&self) -> &str {
        &self.region_name
    }

    pub fn boundaries(&self) -> &WaterBoundaries {
        self.graph.boundaries()
    }

    pub fn graph(&self) -> &VisibilityGraph {
        &self.graph
    }

    pub fn attach_rasters(&mut self, rasters: EnvironmentRasters) {
        self.rasters = rasters;
    }

    pub fn attach_seaports(&mut self, seaports: Vec<SeaPort>) {
        self.seaports = seaports;
    }

    pub fn seaports(&self) -> &[SeaPort] {
        &self.seaports
    }

    pub fn closest_seaport(&self, position: &GeoPoint) -> Option<&SeaPort> {
        closest_port(&self.seaports, position)
    }

    /// Sample the environment at a position.
    pub fn environment_at(&self, position: &GeoPoint) -> Environment {
        self.rasters.sample(
            position,
            &self.boundaries().min_map_point(),
            &self.boundaries().max_map_point(),
        )
    }

    /// Speed cap of the water body containing the position, if any.
    pub fn max_allowed_speed_at(&self, position: &GeoPoint) -> Option<f64> {
        self.boundaries().max_allowed_speed_at(position)
    }

    /// Chain shortest-path legs through every must-traverse point in order.
    ///
    /// Join vertices are not duplicated. Every waypoint must lie in the
    /// navigable region; an unreachable leg fails the whole route.
    pub fn shortest_path(
        &mut self,
        must_traverse: &[GeoPoint],
        algorithm: PathAlgorithm,
    ) -> Result<ShortestPathResult> {
        if must_traverse.len() < 2 {
            return Err(RouteError::TooFewWaypoints {
                count: must_traverse.len(),
            });
        }

        self.graph.clear_waypoints();
        let mut indices = Vec::with_capacity(must_traverse.len());
        for point in must_traverse {
            indices.push(self.graph.insert_waypoint(point)?);
        }

        let mut index_path: Vec<usize> = Vec::new();
        for leg in indices.windows(2) {
            let (from, to) = (leg[0], leg[1]);
            let leg_path = shortest_leg(&self.graph, from, to, algorithm).ok_or_else(|| {
                RouteError::NoPathFound {
                    from: self.graph.vertices()[from].to_string(),
                    to: self.graph.vertices()[to].to_string(),
                }
            })?;
            if index_path.is_empty() {
                index_path.extend(leg_path);
            } else {
                // The leg starts at the previous leg's end vertex
                index_path.extend(leg_path.into_iter().skip(1));
            }
        }

        let points: Vec<GeoPoint> = index_path
            .iter()
            .map(|&i| self.graph.vertices()[i].clone())
            .collect();

        let mut lines = Vec::with_capacity(points.len().saturating_sub(1));
        for pair in points.windows(2) {
            let mut line = GeoLine::new(pair[0].clone(), pair[1].clone());
            let clearance = self
                .boundaries()
                .polygons()
                .iter()
                .map(|p| p.max_clear_width(&line))
                .fold(f64::INFINITY, f64::min);
            if clearance.is_finite() {
                line.set_theoretical_width(clearance);
            }
            if let Some(max_speed) = self.max_allowed_speed_at(&line.midpoint()) {
                line.set_max_speed(max_speed);
            }
            lines.push(line);
        }

        Ok(ShortestPathResult { points, lines })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundaries::BoundaryKind;
    use fairway_geo::Polygon;

    fn square_network() -> Network {
        let polygon = Polygon::new(
            vec![
                GeoPoint::new(0.0, 0.0),
                GeoPoint::new(0.0, 10.0),
                GeoPoint::new(10.0, 10.0),
                GeoPoint::new(10.0, 0.0),
            ],
            vec![],
            "1",
        )
        .unwrap();
        Network::new(
            WaterBoundaries::new(vec![polygon], BoundaryKind::Water).unwrap(),
            "test",
        )
    }

    #[test]
    fn test_direct_route() {
        let mut network = square_network();
        let path = network
            .shortest_path(
                &[GeoPoint::new(1.0, 1.0), GeoPoint::new(9.0, 9.0)],
                PathAlgorithm::Dijkstra,
            )
            .unwrap();
        assert_eq!(path.points.len(), 2);
        assert_eq!(path.lines.len(), 1);
    }

    #[test]
    fn test_route_with_intermediate_port() {
        let mut network = square_network();
        let path = network
            .shortest_path(
                &[
                    GeoPoint::new(1.0, 1.0),
                    GeoPoint::new(5.0, 5.0),
                    GeoPoint::new(9.0, 9.0),
                ],
                PathAlgorithm::Dijkstra,
            )
            .unwrap();
        // Join vertex appears once
        assert_eq!(path.points.len(), 3);
        assert_eq!(path.lines.len(), 2);
    }

    #[test]
    fn test_waypoint_outside_region_fails() {
        let mut network = square_network();
        let r = network.shortest_path(
            &[GeoPoint::new(1.0, 1.0), GeoPoint::new(50.0, 50.0)],
            PathAlgorithm::Dijkstra,
        );
        assert!(matches!(r, Err(RouteError::WaypointNotInWater { .. })));
    }

    #[test]
    fn test_too_few_waypoints() {
        let mut network = square_network();
        let r = network.shortest_path(&[GeoPoint::new(1.0, 1.0)], PathAlgorithm::Dijkstra);
        assert!(matches!(r, Err(RouteError::TooFewWaypoints { .. })));
    }

    #[test]
    fn test_environment_defaults() {
        let network = square_network();
        let env = network.environment_at(&GeoPoint::new(5.0, 5.0));
        assert_eq!(env.water_depth_m, 50.0);
    }
}
