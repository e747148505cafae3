//! # Fairway Simulation Module
//!
//! The time-stepped multi-ship simulation loop and its outputs.
//!
//! One simulator owns a shared read-only network and a set of ships. Each
//! tick it computes every loaded ship's gaps to the critical points ahead,
//! samples the environment under its keel, advances it one step, and fans
//! the results out to the trajectory and summary writers. The loop is
//! pausable, resumable and cancellable from a control thread.
//!
//! ## Features
//!
//! - **Lifecycle**: ships enter at their start times, arrive independently
//! - **Critical Points**: leading ships, ports, lower-speed links,
//!   destination
//! - **Outputs**: CSV trajectory rows, per-ship TXT summary blocks
//! - **Control**: pause/resume/stop gate checked at the top of each tick
//! - **Study Mode**: resistance/power sweeps without running the clock

pub mod control;
pub mod events;
pub mod output;
pub mod simulator;
pub mod study;

pub use control::*;
pub use events::*;
pub use output::*;
pub use simulator::*;
pub use study::*;

use thiserror::Error;

/// Error types for the simulation loop
#[derive(Error, Debug)]
pub enum SimError {
    #[error(transparent)]
    Vessel(#[from] fairway_vessel::VesselError),

    #[error(transparent)]
    Route(#[from] fairway_network::RouteError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for the simulation loop
pub type Result<T> = std::result::Result<T, SimError>;
