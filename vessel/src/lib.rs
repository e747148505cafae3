//! # Fairway Vessel Module
//!
//! Ship state, hull-form derivations and longitudinal dynamics.
//!
//! A ship couples a hull description, a resistance stack, a propulsion
//! chain and a route into one steppable object: each tick it computes a
//! bounded acceleration from the gaps ahead, integrates its geodetic
//! position along the path, and debits its energy sources.
//!
//! ## Features
//!
//! - **Hull Derivations**: wetted surface, coefficients, entrance angle,
//!   added masses from partial hull descriptions
//! - **Dynamics**: car-following acceleration with jerk limiting and
//!   resistance-based braking
//! - **Path Following**: rudder-limited turning along a geodetic route
//! - **Lifecycle**: descriptor-map construction, load/unload/reset,
//!   JSON state snapshots
//!
//! ## Example
//!
//! ```rust
//! use fairway_vessel::ShipDescriptor;
//!
//! let mut descriptor = ShipDescriptor::new();
//! descriptor.set("ID", "demo");
//! assert!(descriptor.build().is_err()); // hull dimensions are required
//! ```

pub mod dynamics;
pub mod events;
pub mod hullcalc;
pub mod motion;
pub mod ship;
pub mod spec;

pub use dynamics::*;
pub use events::*;
pub use hullcalc::*;
pub use motion::*;
pub use ship::*;
pub use spec::*;

use thiserror::Error;

/// Error types for ship construction and stepping
#[derive(Error, Debug)]
pub enum VesselError {
    #[error("Ship configuration error: {message}")]
    Configuration { message: String },

    #[error("Ship path is invalid: {message}")]
    InvalidPath { message: String },

    #[error(transparent)]
    Hydro(#[from] fairway_hydro::HydroError),

    #[error(transparent)]
    Propulsion(#[from] fairway_propulsion::PropulsionError),
}

/// Result type for ship operations
pub type Result<T> = std::result::Result<T, VesselError>;
