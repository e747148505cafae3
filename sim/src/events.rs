//! Simulation-level event sinks.

use fairway_vessel::ShipEventSink;
use serde_json::Value;

/// Ship events plus the simulation-level notifications.
pub trait SimulationEventSink: ShipEventSink {
    /// Overall progress across all ships moved by a whole percent.
    fn progress_updated(&mut self, _percent: u8) {}

    /// The loop finished (all ships arrived, end time hit, or stopped).
    fn simulation_finished(&mut self, _simulation_time_s: f64) {}
}

/// Drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSimulationSink;

impl ShipEventSink for NullSimulationSink {
    fn reached_destination(&mut self, _ship_id: &str, _state: Value) {}
    fn path_deviation(&mut self, _ship_id: &str, _message: &str) {}
    fn sudden_acceleration(&mut self, _ship_id: &str, _message: &str) {}
    fn slow_speed_or_stopped(&mut self, _ship_id: &str, _message: &str) {}
}

impl SimulationEventSink for NullSimulationSink {}

/// Logs everything through tracing.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSimulationSink;

impl ShipEventSink for TracingSimulationSink {
    fn reached_destination(&mut self, ship_id: &str, _state: Value) {
        tracing::info!(ship_id, "ship reached destination");
    }

    fn path_deviation(&mut self, ship_id: &str, message: &str) {
        tracing::warn!(ship_id, message, "path deviation");
    }

    fn sudden_acceleration(&mut self, ship_id: &str, message: &str) {
        tracing::warn!(ship_id, message, "sudden acceleration change");
    }

    fn slow_speed_or_stopped(&mut self, ship_id: &str, message: &str) {
        tracing::warn!(ship_id, message, "slow speed or stopped under power");
    }
}

impl SimulationEventSink for TracingSimulationSink {
    fn progress_updated(&mut self, percent: u8) {
        tracing::info!(percent, "simulation progress");
    }

    fn simulation_finished(&mut self, simulation_time_s: f64) {
        tracing::info!(simulation_time_s, "simulation finished");
    }
}

/// Records everything for inspection in tests.
#[derive(Debug, Default, Clone)]
pub struct RecordingSimulationSink {
    pub reached: Vec<(String, Value)>,
    pub deviations: Vec<(String, String)>,
    pub sudden_accelerations: Vec<(String, String)>,
    pub slow_or_stopped: Vec<(String, String)>,
    pub progress: Vec<u8>,
    pub finished_at: Option<f64>,
}

impl ShipEventSink for RecordingSimulationSink {
    fn reached_destination(&mut self, ship_id: &str, state: Value) {
        self.reached.push((ship_id.to_string(), state));
    }

    fn path_deviation(&mut self, ship_id: &str, message: &str) {
        self.deviations.push((ship_id.to_string(), message.to_string()));
    }

    fn sudden_acceleration(&mut self, ship_id: &str, message: &str) {
        self.sudden_accelerations
            .push((ship_id.to_string(), message.to_string()));
    }

    fn slow_speed_or_stopped(&mut self, ship_id: &str, message: &str) {
        self.slow_or_stopped
            .push((ship_id.to_string(), message.to_string()));
    }
}

impl SimulationEventSink for RecordingSimulationSink {
    fn progress_updated(&mut self, percent: u8) {
        self.progress.push(percent);
    }

    fn simulation_finished(&mut self, simulation_time_s: f64) {
        self.finished_at = Some(simulation_time_s);
    }
}
