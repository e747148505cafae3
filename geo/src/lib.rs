//! # Fairway Geometry Module
//!
//! Geodetic and planar geometry primitives for waterway networks.
//!
//! This module provides the spatial foundation for the simulator: geodetic
//! points on the WGS84 ellipsoid, the projected coordinate systems used for
//! intermediate 2D math, line segments with visibility and clearance queries,
//! and ring polygons with holes describing water bodies.
//!
//! ## Features
//!
//! - **Geodetic Points**: WGS84 inverse/direct geodesic solutions, bearings
//! - **Projections**: World Behrmann cylindrical equal-area reprojection
//! - **Segments**: robust intersection tests, perpendicular clearance
//! - **Polygons**: outer ring + holes, containment, max-clear-width queries
//! - **Persistence**: fixed big-endian binary point records
//!
//! ## Example
//!
//! ```rust
//! use fairway_geo::GeoPoint;
//!
//! let rotterdam = GeoPoint::new(4.47917, 51.9225);
//! let singapore = GeoPoint::new(103.851959, 1.290270);
//! let distance_m = rotterdam.distance(&singapore);
//! assert!(distance_m > 10_000_000.0);
//! ```

pub mod bbox;
pub mod geodesic;
pub mod gline;
pub mod gpoint;
pub mod point;
pub mod polygon;
pub mod projection;

pub use bbox::*;
pub use gline::*;
pub use gpoint::*;
pub use point::*;
pub use polygon::*;
pub use projection::*;

use thiserror::Error;

/// Error types for geometry operations
#[derive(Error, Debug)]
pub enum GeoError {
    #[error("Invalid polygon ring: {message}")]
    InvalidRing { message: String },

    #[error("Coordinate reference system mismatch: {message}")]
    CrsMismatch { message: String },

    #[error("Geodesic solution did not converge after {iterations} iterations")]
    GeodesicDivergence { iterations: u32 },

    #[error("Point record framing error: {message}")]
    RecordFraming { message: String },

    #[error("Lines do not share a common endpoint")]
    NoCommonEndpoint,

    #[error("Distance {distance} is outside the segment length {length}")]
    DistanceOutOfSegment { distance: f64, length: f64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for geometry operations
pub type Result<T> = std::result::Result<T, GeoError>;

/// Collinearity tolerance for orientation tests
pub const ORIENTATION_EPSILON: f64 = 1e-9;
