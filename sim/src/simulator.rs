//! The simulation loop.

use crate::control::SimulatorControl;
use crate::events::SimulationEventSink;
use crate::output::{SummaryWriter, TrajectoryWriter};
use crate::Result;
use fairway_network::Network;
use fairway_vessel::Ship;
use std::io::Write;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Simulator tunables.
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Tick length (s)
    pub time_step_s: f64,
    /// Wall-clock end of the simulated world (s); 0 runs until every ship
    /// reaches its destination
    pub end_time_s: f64,
    /// Emit a trajectory row every N ticks
    pub trajectory_frequency: usize,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            time_step_s: 1.0,
            end_time_s: 0.0,
            trajectory_frequency: 1,
        }
    }
}

/// Gaps to the critical points ahead of one ship. The destination is
/// always the last entry.
#[derive(Debug, Clone, Default)]
struct CriticalPoints {
    gaps_m: Vec<f64>,
    leader_speeds_ms: Vec<f64>,
    is_following: Vec<bool>,
}

/// A time-stepped simulator over one shared network.
///
/// Ships are stepped in insertion order every tick; the tick thread is the
/// only mutator of ship state. Control threads interact through the
/// [`SimulatorControl`] gate and read-only snapshots.
pub struct Simulator {
    network: Network,
    ships: Vec<Ship>,
    config: SimulatorConfig,
    simulation_time_s: f64,
    tick_count: u64,
    control: Arc<SimulatorControl>,
    trajectory: Option<TrajectoryWriter<Box<dyn Write + Send>>>,
}

impl Simulator {
    pub fn new(network: Network, ships: Vec<Ship>, config: SimulatorConfig) -> Self {
        Self {
            network,
            ships,
            config,
            simulation_time_s: 0.0,
            tick_count: 0,
            control: SimulatorControl::new(),
            trajectory: None,
        }
    }

    /// The control gate handle for pause/resume/stop from another thread.
    pub fn control(&self) -> Arc<SimulatorControl> {
        Arc::clone(&self.control)
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn ships(&self) -> &[Ship] {
        &self.ships
    }

    pub fn simulation_time_s(&self) -> f64 {
        self.simulation_time_s
    }

    pub fn set_time_step(&mut self, time_step_s: f64) {
        self.config.time_step_s = time_step_s;
    }

    pub fn set_end_time(&mut self, end_time_s: f64) {
        self.config.end_time_s = end_time_s;
    }

    pub fn add_ship(&mut self, ship: Ship) {
        self.ships.push(ship);
    }

    /// Stream trajectory rows into the given writer.
    pub fn export_trajectory(&mut self, out: Box<dyn Write + Send>) -> Result<()> {
        self.trajectory = Some(TrajectoryWriter::new(out)?);
        Ok(())
    }

    pub fn all_ships_reached_destination(&self) -> bool {
        !self.ships.is_empty() && self.ships.iter().all(|s| s.has_reached_destination())
    }

    /// Run until every ship arrives, the end time passes, or the control
    /// gate cancels. Returns the final simulation time.
    pub fn run<S: SimulationEventSink>(&mut self, sink: &mut S) -> Result<f64> {
        info!(
            ships = self.ships.len(),
            time_step_s = self.config.time_step_s,
            "simulation starting"
        );
        let mut last_percent: i32 = -1;

        loop {
            if !self.control.wait_if_paused() {
                info!("simulation cancelled");
                break;
            }
            if self.config.end_time_s > 0.0 && self.simulation_time_s >= self.config.end_time_s {
                break;
            }
            if self.ships.is_empty() || self.all_ships_reached_destination() {
                break;
            }

            self.step(sink)?;

            let percent = (self.overall_progress() * 100.0) as i32;
            if percent != last_percent {
                last_percent = percent;
                sink.progress_updated(percent.clamp(0, 100) as u8);
            }
        }

        if let Some(trajectory) = &mut self.trajectory {
            trajectory.flush()?;
        }
        sink.simulation_finished(self.simulation_time_s);
        Ok(self.simulation_time_s)
    }

    /// Mean progress across all ships in [0, 1].
    pub fn overall_progress(&self) -> f64 {
        if self.ships.is_empty() {
            return 1.0;
        }
        self.ships.iter().map(|s| s.progress()).sum::<f64>() / self.ships.len() as f64
    }

    /// Advance the world one tick.
    pub fn step<S: SimulationEventSink>(&mut self, sink: &mut S) -> Result<()> {
        let dt = self.config.time_step_s;

        // Ships whose start time has come enter the water
        for ship in &mut self.ships {
            if !ship.is_loaded()
                && !ship.has_reached_destination()
                && ship.start_time_s() <= self.simulation_time_s
            {
                ship.load();
                debug!(ship_id = %ship.user_id(), "ship loaded");
            }
        }

        // Plan phase: gaps and environment per eligible ship, read-only
        let mut plans = Vec::with_capacity(self.ships.len());
        for i in 0..self.ships.len() {
            let ship = &self.ships[i];
            if !ship.is_loaded() || ship.has_reached_destination() {
                plans.push(None);
                continue;
            }
            let env = self.network.environment_at(ship.current_position());
            let free_flow = self.free_flow_speed(ship);
            let critical_points = self.critical_points(i, free_flow);
            plans.push(Some((critical_points, env, free_flow)));
        }

        // Act phase: one sail per ship; a failing ship leaves the water
        // instead of stopping the world
        for (i, plan) in plans.into_iter().enumerate() {
            let Some((critical_points, env, free_flow)) = plan else {
                continue;
            };
            let ship = &mut self.ships[i];
            if let Err(error) = ship.sail(
                dt,
                free_flow,
                &critical_points.gaps_m,
                &critical_points.is_following,
                &critical_points.leader_speeds_ms,
                env,
                sink,
            ) {
                warn!(ship_id = %ship.user_id(), %error, "ship step failed, unloading");
                ship.unload();
            }
        }

        // Output phase
        if self.tick_count % self.config.trajectory_frequency.max(1) as u64 == 0 {
            if let Some(trajectory) = &mut self.trajectory {
                for ship in &self.ships {
                    if ship.is_loaded() {
                        trajectory.write_row(self.simulation_time_s, ship)?;
                    }
                }
                trajectory.flush()?;
            }
        }

        self.simulation_time_s += dt;
        self.tick_count += 1;
        Ok(())
    }

    /// The speed the ship would sail absent any critical point: its design
    /// maximum bounded by the water body and the current link.
    fn free_flow_speed(&self, ship: &Ship) -> f64 {
        let mut speed = ship.max_speed_ms();
        if let Some(zone_cap) = self
            .network
            .max_allowed_speed_at(ship.current_position())
        {
            speed = speed.min(zone_cap);
        }
        let line_index = ship
            .previous_path_point_index()
            .min(ship.path_lines().len().saturating_sub(1));
        if let Some(link_cap) = ship.path_lines().get(line_index).and_then(|l| l.max_speed()) {
            speed = speed.min(link_cap);
        }
        speed
    }

    /// Gaps to the critical points ahead of ship `index`: the closest ship
    /// on the same route, the next port, the next lower-speed link, and
    /// always the destination last.
    fn critical_points(&self, index: usize, free_flow_speed_ms: f64) -> CriticalPoints {
        let ship = &self.ships[index];
        let mut points = CriticalPoints::default();

        // Closest leading ship on an identical route
        let mut leader: Option<(f64, f64)> = None;
        for (j, other) in self.ships.iter().enumerate() {
            if j == index || !other.is_loaded() || other.has_reached_destination() {
                continue;
            }
            if other.path_points() != ship.path_points() {
                continue;
            }
            let gap = other.traveled_distance_m() - ship.traveled_distance_m();
            if gap > 0.0 {
                match leader {
                    Some((best_gap, _)) if gap >= best_gap => {}
                    _ => leader = Some((gap, other.speed_ms())),
                }
            }
        }
        if let Some((gap, leader_speed)) = leader {
            points.gaps_m.push(gap);
            points.leader_speeds_ms.push(leader_speed);
            points.is_following.push(false);
        }

        // Next port ahead, unless it is the destination
        let (port_index, _) = ship.next_stopping_point();
        if port_index < ship.path_points().len() - 1 {
            points
                .gaps_m
                .push(ship.distance_from_current_position_to_node(port_index));
            points.leader_speeds_ms.push(0.0);
            points.is_following.push(false);
        }

        // Next link with a cap below the current free-flow speed
        for line_index in (ship.previous_path_point_index() + 1)..ship.path_lines().len() {
            if let Some(cap) = ship.path_lines()[line_index].max_speed() {
                if cap < free_flow_speed_ms {
                    points
                        .gaps_m
                        .push(ship.distance_from_current_position_to_node(line_index));
                    points.leader_speeds_ms.push(cap);
                    points.is_following.push(false);
                    break;
                }
            }
        }

        // The destination is always the last critical point
        points.gaps_m.push(ship.remaining_distance_m());
        points.leader_speeds_ms.push(0.0);
        points.is_following.push(false);

        points
    }

    /// Write the end-of-run summary blocks.
    pub fn write_summary<W: Write>(&self, writer: &mut SummaryWriter<W>) -> Result<()> {
        writer.write_header(self.simulation_time_s)?;
        for ship in &self.ships {
            writer.write_ship_block(ship)?;
        }
        writer.flush()
    }
}
