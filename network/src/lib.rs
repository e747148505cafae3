//! # Fairway Network Module
//!
//! Waterway networks: boundaries, visibility graphs, routing and
//! environment sampling.
//!
//! A network is a set of polygonal water boundaries, a visibility graph
//! precomputed over their vertices, and the environmental rasters sampled
//! under each ship. Routes are chained shortest paths through the
//! visibility graph between must-traverse waypoints.
//!
//! ## Features
//!
//! - **Boundaries**: water-interpreted or land-interpreted polygon sets
//! - **Visibility Graph**: insertion-ordered adjacency with on-demand
//!   waypoint insertion
//! - **Routing**: Dijkstra and A* with deterministic tie-breaking
//! - **Environment**: raster-backed salinity, wave, wind and depth lookup
//! - **Ingest**: the sectioned `[WATERBODY]` network text format
//!
//! ## Example
//!
//! ```rust
//! use fairway_geo::{GeoPoint, Polygon};
//! use fairway_network::{BoundaryKind, Network, PathAlgorithm, WaterBoundaries};
//!
//! let square = Polygon::new(
//!     vec![
//!         GeoPoint::new(0.0, 0.0),
//!         GeoPoint::new(0.0, 10.0),
//!         GeoPoint::new(10.0, 10.0),
//!         GeoPoint::new(10.0, 0.0),
//!     ],
//!     vec![],
//!     "1",
//! )
//! .unwrap();
//! let boundaries = WaterBoundaries::new(vec![square], BoundaryKind::Water).unwrap();
//! let mut network = Network::new(boundaries, "test");
//! let path = network
//!     .shortest_path(
//!         &[GeoPoint::new(1.0, 1.0), GeoPoint::new(9.0, 9.0)],
//!         PathAlgorithm::Dijkstra,
//!     )
//!     .unwrap();
//! assert_eq!(path.points.len(), 2);
//! ```

pub mod boundaries;
pub mod network;
pub mod parser;
pub mod path;
pub mod rasters;
pub mod seaport;
pub mod visibility;

pub use boundaries::*;
pub use network::*;
pub use parser::*;
pub use path::*;
pub use rasters::*;
pub use seaport::*;
pub use visibility::*;

use thiserror::Error;

/// Error types for network construction and routing
#[derive(Error, Debug)]
pub enum RouteError {
    #[error("Waypoint {lon:.6},{lat:.6} is not inside the water region")]
    WaypointNotInWater { lon: f64, lat: f64 },

    #[error("No path found between {from} and {to}")]
    NoPathFound { from: String, to: String },

    #[error("A route needs at least two must-traverse points, got {count}")]
    TooFewWaypoints { count: usize },

    #[error("Network file parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Boundary set is empty")]
    EmptyBoundarySet,

    #[error(transparent)]
    Geometry(#[from] fairway_geo::GeoError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for network operations
pub type Result<T> = std::result::Result<T, RouteError>;
