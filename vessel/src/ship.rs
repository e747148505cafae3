//! The ship: hull, propulsion, route and per-tick stepping.

use crate::dynamics::CarFollowingModel;
use crate::events::ShipEventSink;
use crate::hullcalc;
use crate::motion::MotionState;
use crate::{Result, VesselError};
use fairway_geo::{GeoLine, GeoPoint};
use fairway_hydro::{Environment, HullInput, ResistanceStack};
use fairway_propulsion::{FuelType, Propeller, PropulsionContext, SharedEnergySource};
use serde_json::json;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Lateral corridor half-width before a path-deviation event (m).
const PATH_DEVIATION_DISTANCE_M: f64 = 10.0;

/// Heading tolerance before a path-deviation event (degrees).
const PATH_DEVIATION_HEADING_DEG: f64 = 5.0;

/// Everything the builder hands over to assemble a ship.
pub struct ShipParts {
    pub user_id: String,
    pub hull: HullInput,
    pub resistance: ResistanceStack,
    /// Lightship weight (t)
    pub vessel_weight_t: f64,
    /// Cargo weight (t)
    pub cargo_weight_t: f64,
    /// Design maximum speed (m/s)
    pub max_speed_ms: f64,
    /// Maximum rudder angle (degrees)
    pub rudder_max_angle_deg: f64,
    pub stop_if_no_energy: bool,
    /// Whether reversed thrust assists braking
    pub braking_thrust_available: bool,
    pub propellers: Vec<Propeller>,
    pub energy_sources: Vec<SharedEnergySource>,
    /// Simulation time at which the ship enters the water (s)
    pub start_time_s: f64,
}

/// A simulated ship.
#[derive(Debug)]
pub struct Ship {
    user_id: String,
    hull: HullInput,
    resistance: ResistanceStack,
    vessel_weight_t: f64,
    cargo_weight_t: f64,
    max_speed_ms: f64,
    rudder_max_angle_deg: f64,
    stop_if_no_energy: bool,
    braking_thrust_available: bool,

    motion: MotionState,
    speed_ms: f64,
    previous_speed_ms: f64,
    acceleration: f64,
    previous_acceleration: f64,
    max_acceleration: f64,
    total_thrust_n: f64,
    total_resistance_n: f64,

    path_points: Vec<GeoPoint>,
    path_lines: Vec<GeoLine>,
    links_cum_lengths: Vec<f64>,
    previous_path_point_index: usize,
    traveled_distance_m: f64,
    stopping_point_indices: Vec<usize>,

    propellers: Vec<Propeller>,
    energy_sources: Vec<SharedEnergySource>,

    cum_energy_kwh: f64,
    cum_fuel_l: HashMap<FuelType, f64>,
    total_cargo_ton_km: f64,
    trip_time_s: f64,
    running_avg_speed: f64,
    running_avg_acceleration: f64,

    loaded: bool,
    is_on: bool,
    reached_destination: bool,
    out_of_energy: bool,
    shown_no_power_warning: bool,

    env: Environment,
    model: CarFollowingModel,
    start_time_s: f64,
}

impl Ship {
    /// Assemble a ship and attach its route. The path must carry at least
    /// two points and its lines must chain the points in order.
    pub fn new(parts: ShipParts, points: Vec<GeoPoint>, lines: Vec<GeoLine>) -> Result<Self> {
        if points.len() < 2 {
            return Err(VesselError::InvalidPath {
                message: "ship path needs at least two points".to_string(),
            });
        }
        if lines.len() + 1 != points.len() {
            return Err(VesselError::InvalidPath {
                message: format!(
                    "path has {} points but {} lines",
                    points.len(),
                    lines.len()
                ),
            });
        }
        if parts.propellers.is_empty() {
            return Err(VesselError::Configuration {
                message: "ship needs at least one propeller".to_string(),
            });
        }

        let links_cum_lengths = cumulative_lengths(&lines);
        let stopping_point_indices = points
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_port())
            .map(|(i, _)| i)
            .collect();

        let motion = MotionState::new(points[0].clone(), points[1].clone());

        Ok(Self {
            user_id: parts.user_id,
            hull: parts.hull,
            resistance: parts.resistance,
            vessel_weight_t: parts.vessel_weight_t,
            cargo_weight_t: parts.cargo_weight_t,
            max_speed_ms: parts.max_speed_ms,
            rudder_max_angle_deg: parts.rudder_max_angle_deg,
            stop_if_no_energy: parts.stop_if_no_energy,
            braking_thrust_available: parts.braking_thrust_available,
            motion,
            speed_ms: 0.0,
            previous_speed_ms: 0.0,
            acceleration: 0.0,
            previous_acceleration: 0.0,
            max_acceleration: 0.0,
            total_thrust_n: 0.0,
            total_resistance_n: 0.0,
            path_points: points,
            path_lines: lines,
            links_cum_lengths,
            previous_path_point_index: 0,
            traveled_distance_m: 0.0,
            stopping_point_indices,
            propellers: parts.propellers,
            energy_sources: parts.energy_sources,
            cum_energy_kwh: 0.0,
            cum_fuel_l: HashMap::new(),
            total_cargo_ton_km: 0.0,
            trip_time_s: 0.0,
            running_avg_speed: 0.0,
            running_avg_acceleration: 0.0,
            loaded: false,
            is_on: true,
            reached_destination: false,
            out_of_energy: false,
            shown_no_power_warning: false,
            env: Environment::default(),
            model: CarFollowingModel::new(),
            start_time_s: parts.start_time_s,
        })
    }

    // ---- identity and flags -------------------------------------------------

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn is_on(&self) -> bool {
        self.is_on
    }

    pub fn is_out_of_energy(&self) -> bool {
        self.out_of_energy
    }

    pub fn has_reached_destination(&self) -> bool {
        self.reached_destination
    }

    pub fn start_time_s(&self) -> f64 {
        self.start_time_s
    }

    pub fn stop_if_no_energy(&self) -> bool {
        self.stop_if_no_energy
    }

    // ---- state accessors ----------------------------------------------------

    pub fn hull(&self) -> &HullInput {
        &self.hull
    }

    pub fn resistance_stack(&self) -> &ResistanceStack {
        &self.resistance
    }

    pub fn current_position(&self) -> &GeoPoint {
        self.motion.position()
    }

    pub fn current_heading_deg(&self) -> f64 {
        self.motion.heading_deg()
    }

    pub fn speed_ms(&self) -> f64 {
        self.speed_ms
    }

    pub fn previous_speed_ms(&self) -> f64 {
        self.previous_speed_ms
    }

    pub fn max_speed_ms(&self) -> f64 {
        self.max_speed_ms
    }

    pub fn acceleration(&self) -> f64 {
        self.acceleration
    }

    pub fn previous_acceleration(&self) -> f64 {
        self.previous_acceleration
    }

    pub fn total_thrust_n(&self) -> f64 {
        self.total_thrust_n
    }

    pub fn total_resistance_n(&self) -> f64 {
        self.total_resistance_n
    }

    pub fn traveled_distance_m(&self) -> f64 {
        self.traveled_distance_m
    }

    pub fn trip_time_s(&self) -> f64 {
        self.trip_time_s
    }

    pub fn running_average_speed_ms(&self) -> f64 {
        self.running_avg_speed
    }

    pub fn running_average_acceleration(&self) -> f64 {
        self.running_avg_acceleration
    }

    pub fn cumulative_energy_kwh(&self) -> f64 {
        self.cum_energy_kwh
    }

    pub fn cumulative_fuel_liters(&self) -> &HashMap<FuelType, f64> {
        &self.cum_fuel_l
    }

    pub fn overall_cumulative_fuel_liters(&self) -> f64 {
        self.cum_fuel_l.values().sum()
    }

    pub fn total_cargo_ton_km(&self) -> f64 {
        self.total_cargo_ton_km
    }

    pub fn vessel_weight_t(&self) -> f64 {
        self.vessel_weight_t
    }

    pub fn cargo_weight_t(&self) -> f64 {
        self.cargo_weight_t
    }

    pub fn energy_sources(&self) -> &[SharedEnergySource] {
        &self.energy_sources
    }

    pub fn propellers(&self) -> &[Propeller] {
        &self.propellers
    }

    pub fn current_environment(&self) -> &Environment {
        &self.env
    }

    pub fn set_current_environment(&mut self, env: Environment) {
        self.env = env;
    }

    // ---- path ---------------------------------------------------------------

    pub fn path_points(&self) -> &[GeoPoint] {
        &self.path_points
    }

    pub fn path_lines(&self) -> &[GeoLine] {
        &self.path_lines
    }

    pub fn links_cum_lengths(&self) -> &[f64] {
        &self.links_cum_lengths
    }

    pub fn total_path_length_m(&self) -> f64 {
        *self.links_cum_lengths.last().unwrap_or(&0.0)
    }

    pub fn previous_path_point_index(&self) -> usize {
        self.previous_path_point_index
    }

    /// Remaining path distance from node `i` to the destination (m).
    pub fn distance_to_finish_from_node(&self, i: usize) -> f64 {
        let total = self.total_path_length_m();
        if i == 0 {
            return total;
        }
        if i > self.links_cum_lengths.len() {
            return 0.0;
        }
        total - self.links_cum_lengths[i - 1]
    }

    /// Path distance from the current position to node `end_index` (m),
    /// walking through the next path node.
    pub fn distance_from_current_position_to_node(&self, end_index: usize) -> f64 {
        let next = self.previous_path_point_index + 1;
        if next >= self.path_points.len() {
            return 0.0;
        }
        let mut distance = self.motion.position().distance(&self.path_points[next]);
        if end_index > next {
            let passed = if next > 0 {
                self.links_cum_lengths[next - 1]
            } else {
                0.0
            };
            let end = self.links_cum_lengths[(end_index - 1).min(self.links_cum_lengths.len() - 1)];
            distance += end - passed;
        }
        distance
    }

    /// Remaining distance to the destination (m).
    pub fn remaining_distance_m(&self) -> f64 {
        self.distance_from_current_position_to_node(self.path_points.len() - 1)
    }

    /// Index and point of the next port stop at or after the current node,
    /// falling back to the destination.
    pub fn next_stopping_point(&self) -> (usize, &GeoPoint) {
        for &i in &self.stopping_point_indices {
            if i > self.previous_path_point_index {
                return (i, &self.path_points[i]);
            }
        }
        (
            self.path_points.len() - 1,
            self.path_points.last().expect("path is non-empty"),
        )
    }

    /// Trip completion in [0, 1].
    pub fn progress(&self) -> f64 {
        if !self.loaded {
            return 0.0;
        }
        if self.reached_destination {
            return 1.0;
        }
        let total = self.total_path_length_m();
        if total <= 0.0 {
            return 0.0;
        }
        ((total - self.remaining_distance_m()) / total).clamp(0.0, 1.0)
    }

    // ---- mass and propulsion coupling --------------------------------------

    /// Static weight afloat: lightship + cargo + remaining fuel (t).
    pub fn total_static_weight_t(&self) -> f64 {
        let fuel_t: f64 = self
            .energy_sources
            .iter()
            .map(|s| s.borrow().current_weight_kg() / 1000.0)
            .sum();
        self.vessel_weight_t + self.cargo_weight_t + fuel_t
    }

    /// Dynamic weight: static weight plus the surge added mass (t).
    pub fn total_dynamic_weight_t(&self) -> f64 {
        self.total_static_weight_t() + hullcalc::surge_added_mass_kg(&self.hull, &self.env) / 1000.0
    }

    /// The per-tick hull snapshot the propulsion chain reads.
    pub fn propulsion_context(&self) -> PropulsionContext {
        PropulsionContext {
            speed_ms: self.speed_ms,
            max_speed_ms: self.max_speed_ms,
            wake_fraction: self
                .resistance
                .calm
                .wake_fraction(&self.hull, &self.env, self.speed_ms),
            hull_efficiency: self
                .resistance
                .calm
                .hull_efficiency(&self.hull, &self.env, self.speed_ms),
            relative_rotative_efficiency: self
                .resistance
                .calm
                .propeller_rotation_efficiency(&self.hull),
            waterline_length_m: self.hull.lwl,
            env: self.env,
        }
    }

    /// Refresh thrust, resistance and the acceleration envelope.
    fn compute_envelope(&mut self) -> Result<()> {
        let ctx = self.propulsion_context();
        let mut thrust = 0.0;
        for propeller in &mut self.propellers {
            propeller.gearbox_mut().update_operating_state(&ctx);
            thrust += propeller.thrust(&ctx)?;
        }
        let resistance = self.resistance.total_resistance(
            &self.hull,
            &self.env,
            self.speed_ms,
            self.motion.heading_deg(),
        )?;

        self.total_thrust_n = thrust;
        self.total_resistance_n = resistance;
        let mass_kg = self.total_dynamic_weight_t() * 1000.0;
        self.max_acceleration = (thrust - resistance) / mass_kg;
        Ok(())
    }

    // ---- the tick ----------------------------------------------------------

    /// Advance the ship one time step.
    ///
    /// `gaps_m`, `is_following` and `leader_speeds_ms` describe the
    /// critical points ahead (same length each, destination last); the
    /// environment is the sample at the current position.
    #[allow(clippy::too_many_arguments)]
    pub fn sail(
        &mut self,
        time_step_s: f64,
        free_flow_speed_ms: f64,
        gaps_m: &[f64],
        is_following: &[bool],
        leader_speeds_ms: &[f64],
        env: Environment,
        sink: &mut dyn ShipEventSink,
    ) -> Result<()> {
        self.env = env;
        let free_flow = free_flow_speed_ms.min(self.max_speed_ms);

        let jerk_acceleration =
            self.step_acceleration(time_step_s, free_flow, gaps_m, is_following, leader_speeds_ms, sink)?;

        self.acceleration = jerk_acceleration;
        self.previous_speed_ms = self.speed_ms;
        self.speed_ms =
            self.model
                .speed_up_down(self.previous_speed_ms, self.acceleration, time_step_s, free_flow);
        self.acceleration =
            self.model
                .adjusted_acceleration(self.speed_ms, self.previous_speed_ms, time_step_s);

        if self
            .model
            .is_sudden_change(self.previous_acceleration, self.acceleration, time_step_s)
        {
            sink.sudden_acceleration(
                &self.user_id,
                "sudden acceleration change beyond the jerk limit",
            );
        }

        let step_distance = self.speed_ms * time_step_s;
        if step_distance > 0.0 {
            self.traveled_distance_m += step_distance;
            self.handle_step_distance(step_distance, time_step_s, sink);
        }

        self.consume_energy(time_step_s);
        self.update_general_stats(time_step_s);
        self.previous_acceleration = self.acceleration;

        // Arrival: the remaining distance fits inside one step's travel
        let remaining = self
            .path_points
            .last()
            .expect("path is non-empty")
            .distance(self.motion.position());
        if remaining <= step_distance.max(1e-9) && !self.reached_destination {
            self.immediate_stop();
            self.reached_destination = true;
            let snapshot = self.state_snapshot();
            sink.reached_destination(&self.user_id, snapshot);
        }

        Ok(())
    }

    fn step_acceleration(
        &mut self,
        time_step_s: f64,
        free_flow_speed_ms: f64,
        gaps_m: &[f64],
        is_following: &[bool],
        leader_speeds_ms: &[f64],
        sink: &mut dyn ShipEventSink,
    ) -> Result<f64> {
        self.compute_envelope()?;

        let amax = self.max_acceleration;
        let speed = self.speed_ms;
        let heading = self.motion.heading_deg();
        let previous_acceleration = self.previous_acceleration;

        let mass_kg = self.total_dynamic_weight_t() * 1000.0;
        let braking_thrust = if self.braking_thrust_available {
            self.total_thrust_n
        } else {
            0.0
        };

        let hull = &self.hull;
        let resistance = &self.resistance;
        let env = self.env;
        let mut decel_at = |at_speed: f64| -> f64 {
            let mut force = resistance
                .total_resistance(hull, &env, at_speed, heading)
                .unwrap_or(0.0);
            force += braking_thrust;
            -(force / mass_kg)
        };

        let mut candidates = Vec::with_capacity(gaps_m.len());
        for i in 0..gaps_m.len() {
            if is_following.get(i).copied().unwrap_or(false) {
                continue;
            }
            candidates.push(self.model.accelerate(
                gaps_m[i],
                0.0,
                speed,
                leader_speeds_ms.get(i).copied().unwrap_or(0.0),
                free_flow_speed_ms,
                time_step_s,
                amax,
                &mut decel_at,
            ));
        }
        if candidates.is_empty() {
            // Fall back to the last critical point (the destination)
            let last = gaps_m.len().saturating_sub(1);
            candidates.push(self.model.accelerate(
                gaps_m.get(last).copied().unwrap_or(f64::INFINITY),
                0.0,
                speed,
                0.0,
                free_flow_speed_ms,
                time_step_s,
                amax,
                &mut decel_at,
            ));
        }

        let raw = candidates.iter().copied().fold(f64::INFINITY, f64::min);

        if raw < 0.0
            && speed <= 0.001
            && gaps_m.last().copied().unwrap_or(0.0) > 50.0
            && !self.shown_no_power_warning
        {
            sink.slow_speed_or_stopped(
                &self.user_id,
                &format!(
                    "resistance is larger than tractive force at distance {:.1} m",
                    self.traveled_distance_m
                ),
            );
            self.shown_no_power_warning = true;
        }

        let smoothed = self.model.smooth(raw, previous_acceleration, amax);
        let jerked = self.model.jerk_limited(smoothed, previous_acceleration, time_step_s);

        // A stationary ship cannot accelerate backwards
        if (speed * 1000.0).round() / 1000.0 == 0.0 && jerked < 0.0 {
            return Ok(0.0);
        }
        Ok(jerked)
    }

    /// Rudder-limited turning radius (m).
    pub fn turning_radius_m(&self) -> f64 {
        self.hull.lwl / libm::tan(self.rudder_max_angle_deg.to_radians())
    }

    /// Maximum rate of turn (degrees per second) at the current speed.
    pub fn max_rate_of_turn(&self, turning_radius_m: f64) -> f64 {
        if turning_radius_m <= 0.0 {
            return f64::INFINITY;
        }
        self.speed_ms / turning_radius_m / 60.0
    }

    fn handle_step_distance(
        &mut self,
        step_distance_m: f64,
        time_step_s: f64,
        sink: &mut dyn ShipEventSink,
    ) {
        if self.path_points.len() < 2 {
            warn!("path is empty or has only one point, no movement will occur");
            return;
        }

        self.total_cargo_ton_km += self.cargo_weight_t * step_distance_m / 1000.0;

        let current_target = self.path_points[self.previous_path_point_index + 1].clone();
        let mut turn_radius = self.turning_radius_m();

        // Final segment: steer straight for the last point
        if self.previous_path_point_index + 2 > self.path_points.len() - 1 {
            let max_rot = self.max_rate_of_turn(turn_radius);
            self.motion.set_target_and_max_rot(current_target, max_rot);
            self.motion.move_by_distance(step_distance_m, time_step_s);
            self.check_path_corridor(sink);
            return;
        }

        let next_target = self.path_points[self.previous_path_point_index + 2].clone();
        let distance_to_target = self.motion.position().distance(&current_target);

        let turning_angle_deg = self.motion.angle_to(&next_target).abs();
        // tan(θ/2) blows up towards a reversal; within the rudder band
        // around 180° the turn starts at the target itself
        if turning_angle_deg > 180.0 - self.rudder_max_angle_deg {
            turn_radius = 0.0;
        }
        let distance_to_start_turning =
            turn_radius * libm::tan(turning_angle_deg.to_radians() / 2.0);

        // The lead distance is floored at one step's travel so the index
        // advances through collinear joints, where r·tan(θ/2) vanishes
        if distance_to_target <= distance_to_start_turning.max(step_distance_m) {
            // Advance to the next segment and steer for its end
            self.previous_path_point_index += 1;
            let max_rot = self.max_rate_of_turn(self.turning_radius_m());
            self.motion.set_target_and_max_rot(next_target, max_rot);
            self.motion.move_by_distance(step_distance_m, time_step_s);
        } else {
            let max_rot = self.max_rate_of_turn(self.turning_radius_m());
            self.motion.set_target_and_max_rot(current_target, max_rot);
            self.motion.move_by_distance(step_distance_m, time_step_s);
        }

        self.check_path_corridor(sink);
    }

    fn check_path_corridor(&mut self, sink: &mut dyn ShipEventSink) {
        let segment = &self.path_lines[self
            .previous_path_point_index
            .min(self.path_lines.len() - 1)];
        let lateral = segment.perpendicular_distance(self.motion.position());

        let segment_bearing = segment.start().bearing_to(segment.end());
        let mut heading_dev = (self.motion.heading_deg() - segment_bearing).abs() % 360.0;
        if heading_dev > 180.0 {
            heading_dev = 360.0 - heading_dev;
        }

        if lateral > PATH_DEVIATION_DISTANCE_M
            || (heading_dev > PATH_DEVIATION_HEADING_DEG && !self.motion.is_rotating())
        {
            sink.path_deviation(
                &self.user_id,
                &format!(
                    "lateral offset {:.1} m, heading deviation {:.1} deg",
                    lateral, heading_dev
                ),
            );
        }
    }

    /// Debit energy across all unique engines (shared engines consume
    /// once), and refresh the power flags.
    fn consume_energy(&mut self, time_step_s: f64) {
        let mut unique_engines: HashSet<u32> = HashSet::new();
        let mut any_engine_on = false;

        for propeller in &mut self.propellers {
            for engine in propeller.gearbox_mut().engines_mut() {
                if !unique_engines.insert(engine.id()) {
                    continue;
                }
                let record = engine.consume(time_step_s);
                *self.cum_fuel_l.entry(record.fuel_type).or_insert(0.0) +=
                    record.fuel_consumed_liters;
                self.cum_energy_kwh += record.energy_consumed_kwh;
                if engine.is_working() {
                    any_engine_on = true;
                }
            }
        }

        self.out_of_energy = !any_engine_on;
        self.is_on = any_engine_on;
    }

    fn update_general_stats(&mut self, time_step_s: f64) {
        self.trip_time_s += time_step_s;
        let n = (self.trip_time_s / time_step_s).max(1.0);
        self.running_avg_acceleration =
            self.running_avg_acceleration * ((n - 1.0) / n) + self.acceleration / n;
        self.running_avg_speed = self.running_avg_speed * ((n - 1.0) / n) + self.speed_ms / n;
    }

    /// Zero the kinematics in place (arrival, emergency stop).
    pub fn immediate_stop(&mut self) {
        self.previous_acceleration = self.acceleration;
        self.previous_speed_ms = self.speed_ms;
        self.speed_ms = 0.0;
        self.acceleration = 0.0;
    }

    // ---- lifecycle ----------------------------------------------------------

    /// Reset all counters and put the ship in the water at its start point.
    pub fn load(&mut self) {
        self.reset();
        self.loaded = true;
    }

    pub fn unload(&mut self) {
        self.loaded = false;
    }

    pub fn reset(&mut self) {
        self.acceleration = 0.0;
        self.previous_acceleration = 0.0;
        self.running_avg_acceleration = 0.0;
        self.speed_ms = 0.0;
        self.previous_speed_ms = 0.0;
        self.running_avg_speed = 0.0;
        self.traveled_distance_m = 0.0;
        self.trip_time_s = 0.0;
        self.cum_energy_kwh = 0.0;
        self.cum_fuel_l.clear();
        self.total_cargo_ton_km = 0.0;
        self.is_on = true;
        self.reached_destination = false;
        self.out_of_energy = false;
        self.loaded = false;
        self.shown_no_power_warning = false;
        self.previous_path_point_index = 0;
        self.total_thrust_n = 0.0;
        self.total_resistance_n = 0.0;
        self.motion = MotionState::new(self.path_points[0].clone(), self.path_points[1].clone());
        self.model.clear_cache();

        for source in &self.energy_sources {
            source.borrow_mut().reset();
        }
        for propeller in &mut self.propellers {
            for engine in propeller.gearbox_mut().engines_mut() {
                engine.reset();
            }
        }
        debug!(ship_id = %self.user_id, "ship state reset");
    }

    // ---- snapshot -----------------------------------------------------------

    /// The full state snapshot as JSON, for arrival events and read-only
    /// control-thread queries.
    pub fn state_snapshot(&self) -> serde_json::Value {
        let fuel_consumption: Vec<serde_json::Value> = self
            .cum_fuel_l
            .iter()
            .map(|(fuel, liters)| {
                json!({
                    "FuelType": fuel.display_name(),
                    "ConsumedVolumeLiters": liters,
                })
            })
            .collect();

        let energy_sources: Vec<serde_json::Value> = self
            .energy_sources
            .iter()
            .map(|source| {
                let source = source.borrow();
                json!({
                    "Capacity": source.current_state() * 100.0,
                    "FuelType": source.fuel_type().display_name(),
                    "EnergyConsumed": source.total_energy_consumed_kwh(),
                    "Weight": source.current_weight_kg(),
                })
            })
            .collect();

        let position = self.motion.position();
        json!({
            "ShipID": self.user_id,
            "TravelledDistance": self.traveled_distance_m,
            "CurrentAcceleration": self.acceleration,
            "PreviousAcceleration": self.previous_acceleration,
            "CurrentSpeed": self.speed_ms,
            "PreviousSpeed": self.previous_speed_ms,
            "TotalThrust": self.total_thrust_n,
            "TotalResistance": self.total_resistance_n,
            "VesselWeight": self.vessel_weight_t,
            "CargoWeight": self.cargo_weight_t,
            "IsOn": self.is_on,
            "OutOfEnergy": self.out_of_energy,
            "Loaded": self.loaded,
            "ReachedDestination": self.reached_destination,
            "Consumption": {
                "Energy": self.cum_energy_kwh,
                "FuelConsumption": fuel_consumption,
            },
            "EnergySources": energy_sources,
            "Position": {
                "Latitude": position.lat(),
                "Longitude": position.lon(),
                "Position": [position.lat(), position.lon()],
            },
            "Environment": {
                "WaterDepth": self.env.water_depth_m,
                "Salinity": self.env.salinity_ppt,
                "Temperature": self.env.temperature_c,
                "WaveHeight": self.env.wave_height_m,
                "WaveLength": self.env.wave_length_m,
                "WaveAngularFrequency": self.env.wave_angular_frequency,
            },
        })
    }
}

fn cumulative_lengths(lines: &[GeoLine]) -> Vec<f64> {
    let mut cum = Vec::with_capacity(lines.len());
    let mut total = 0.0;
    for line in lines {
        total += line.length();
        cum.push(total);
    }
    cum
}
