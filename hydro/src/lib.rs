//! # Fairway Hydrodynamics Module
//!
//! Hydrology, calm-water and added resistance models for ship simulation.
//!
//! This module carries the resistance stack of the simulator: the sampled
//! marine environment, seawater property helpers, the Holtrop & Mennen
//! calm-water decomposition and the Lang-Mao added wave/wind resistance.
//!
//! ## Features
//!
//! - **Environment**: salinity, temperature, waves, wind and depth records
//! - **Hydrology**: seawater density and viscosity, Froude/Reynolds numbers
//! - **Holtrop-Mennen**: full per-term calm-water resistance with
//!   efficiencies, wake fraction and speed of advance
//! - **Lang-Mao**: wave reflection + motion and wind added resistance
//!
//! ## Example
//!
//! ```rust
//! use fairway_hydro::{Environment, HoltropMennenMethod, HullInput};
//!
//! let hull = HullInput::example_bulk_carrier();
//! let env = Environment::calm(35.0, 15.0);
//! let method = HoltropMennenMethod::new();
//! let breakdown = method.total_resistance(&hull, &env, 8.0).unwrap();
//! assert!(breakdown.total > 0.0);
//! ```

pub mod environment;
pub mod holtrop;
pub mod hull;
pub mod hydrology;
pub mod langmao;
pub mod model;

pub use environment::*;
pub use holtrop::*;
pub use hull::*;
pub use hydrology::*;
pub use langmao::*;
pub use model::*;

use thiserror::Error;

/// Error types for resistance calculations
#[derive(Error, Debug)]
pub enum HydroError {
    #[error("Invalid hull parameters: {message}")]
    InvalidHullParameters { message: String },

    #[error("Non-physical quantity encountered: {message}")]
    NumericInvariant { message: String },

    #[error("Speed must be finite and non-negative, got {speed}")]
    InvalidSpeed { speed: f64 },
}

/// Result type for resistance calculations
pub type Result<T> = std::result::Result<T, HydroError>;
