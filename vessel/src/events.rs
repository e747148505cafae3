//! Typed ship event notifications.

use serde_json::Value;

/// Receives the notifications a sailing ship raises.
///
/// The simulator holds one sink and threads it through every `sail` call.
pub trait ShipEventSink {
    /// The ship arrived at the final path point. The payload is the full
    /// state snapshot.
    fn reached_destination(&mut self, ship_id: &str, state: Value);

    /// The ship drifted off its path corridor (lateral or heading
    /// deviation beyond tolerance).
    fn path_deviation(&mut self, ship_id: &str, message: &str);

    /// The controller requested an acceleration change beyond the jerk
    /// limit.
    fn sudden_acceleration(&mut self, ship_id: &str, message: &str);

    /// Resistance exceeds available thrust; the ship is slow or stopped
    /// under power.
    fn slow_speed_or_stopped(&mut self, ship_id: &str, message: &str);
}

/// A sink that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEventSink;

impl ShipEventSink for NullEventSink {
    fn reached_destination(&mut self, _ship_id: &str, _state: Value) {}
    fn path_deviation(&mut self, _ship_id: &str, _message: &str) {}
    fn sudden_acceleration(&mut self, _ship_id: &str, _message: &str) {}
    fn slow_speed_or_stopped(&mut self, _ship_id: &str, _message: &str) {}
}

/// A sink that logs every event through tracing.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventSink;

impl ShipEventSink for TracingEventSink {
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

/// A sink that records events for inspection in tests.
#[derive(Debug, Default, Clone)]
pub struct RecordingEventSink {
    pub reached: Vec<(String, Value)>,
    pub deviations: Vec<String>,
    pub sudden_accelerations: Vec<String>,
    pub slow_or_stopped: Vec<String>,
}

impl ShipEventSink for RecordingEventSink {
    fn reached_destination(&mut self, ship_id: &str, state: Value) {
        self.reached.push((ship_id.to_string(), state));
    }

    fn path_deviation(&mut self, _ship_id: &str, message: &str) {
        self.deviations.push(message.to_string());
    }

    fn sudden_acceleration(&mut self, _ship_id: &str, message: &str) {
        self.sudden_accelerations.push(message.to_string());
    }

    fn slow_speed_or_stopped(&mut self, _ship_id: &str, message: &str) {
        self.slow_or_stopped.push(message.to_string());
    }
}
