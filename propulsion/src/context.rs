//! Per-tick hull snapshot handed down the propulsion chain.

use fairway_hydro::Environment;

/// The hull quantities the propulsion chain needs from its ship, captured
/// once per tick. The chain holds no pointer back to the ship; it only
/// borrows this snapshot for the duration of a call.
#[derive(Debug, Clone, Copy)]
pub struct PropulsionContext {
    /// Current ship speed (m/s)
    pub speed_ms: f64,
    /// Ship design maximum speed (m/s)
    pub max_speed_ms: f64,
    /// Wake fraction w at the current state
    pub wake_fraction: f64,
    /// Hull efficiency η_H = (1−t)/(1−w)
    pub hull_efficiency: f64,
    /// Relative rotative efficiency η_R
    pub relative_rotative_efficiency: f64,
    /// Waterline length (m), for the propeller Reynolds correction
    pub waterline_length_m: f64,
    /// Environment at the ship position
    pub env: Environment,
}

impl PropulsionContext {
    /// Speed of advance into the propeller disk V_A = V(1−w).
    pub fn speed_of_advance(&self) -> f64 {
        self.speed_ms * (1.0 - self.wake_fraction)
    }

    /// Speed of advance at a hypothetical ship speed.
    pub fn speed_of_advance_at(&self, speed_ms: f64) -> f64 {
        speed_ms * (1.0 - self.wake_fraction)
    }
}
