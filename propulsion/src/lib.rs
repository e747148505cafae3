//! # Fairway Propulsion Module
//!
//! Energy sources, engines, gearboxes and B-series propellers.
//!
//! The propulsion chain converts stored fuel or charge into thrust:
//! energy source → engine → gearbox → propeller. Each stage follows its
//! manufacturer-style characteristics (tier curves, gear ratios, Wageningen
//! B-series polynomials) and the chain is balanced each tick by an
//! engine–propeller operating-point solver.
//!
//! ## Features
//!
//! - **Fuels**: density, calorific value, carbon/sulfur content, emissions
//! - **Energy Sources**: fuel tanks and batteries with SOC/DOD accounting
//! - **Engines**: tier II/III curves, operational load zones, throttle law
//! - **Gearboxes**: multi-engine aggregation through a gear ratio
//! - **Propellers**: Wageningen B-series thrust/torque with solvers
//!
//! ## Example
//!
//! ```rust
//! use fairway_propulsion::{FuelType, Tank};
//!
//! let tank = Tank::new(FuelType::Diesel, 1000.0, 0.9, 0.9).unwrap();
//! assert!(tank.current_weight_kg() > 0.0);
//! ```

pub mod battery;
pub mod context;
pub mod energy;
pub mod engine;
pub mod fuel;
pub mod gearbox;
pub mod propeller;
pub mod tank;

pub use battery::*;
pub use context::*;
pub use energy::*;
pub use engine::*;
pub use fuel::*;
pub use gearbox::*;
pub use propeller::*;
pub use tank::*;

use thiserror::Error;

/// Error types for the propulsion chain
#[derive(Error, Debug)]
pub enum PropulsionError {
    #[error("Missing or invalid parameter: {message}")]
    Configuration { message: String },

    #[error("B-series does not support {parameter} = {value}")]
    BSeriesOutOfRange { parameter: &'static str, value: f64 },

    #[error(
        "The power required to rotate the propeller within the RPM range \
         ({min_rpm:.1}, {max_rpm:.1}) exceeds the engine's available power"
    )]
    NoOperatingPoint { min_rpm: f64, max_rpm: f64 },

    #[error("RPM {rpm:.1} is outside the engine range ({min_rpm:.1}, {max_rpm:.1})")]
    RpmOutOfRange { rpm: f64, min_rpm: f64, max_rpm: f64 },

    #[error("{coefficient} coefficient is negative; use a custom efficiency curve instead of the B-series")]
    NegativeCoefficient { coefficient: &'static str },

    #[error("Cannot combine consumption records of different fuel types")]
    FuelTypeMismatch,

    #[error("Non-physical quantity: {message}")]
    NumericInvariant { message: String },
}

/// Result type for the propulsion chain
pub type Result<T> = std::result::Result<T, PropulsionError>;
