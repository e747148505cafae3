//! The `fairway` binary: run simulations, query routes and sweep
//! resistance curves from the command line.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use fairway_geo::GeoPoint;
use fairway_network::{Network, PathAlgorithm};
use fairway_sim::{
    resistance_study, Simulator, SimulatorConfig, SummaryWriter, TracingSimulationSink,
};
use fairway_vessel::{Ship, ShipDescriptor};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fairway", version, about = "Maritime traffic simulator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a simulation over a network and a ships file
    Run {
        /// Network description file ([WATERBODY] text format)
        #[arg(long)]
        network: PathBuf,
        /// JSON file holding an array of ship descriptors
        #[arg(long)]
        ships: PathBuf,
        /// Time step in seconds
        #[arg(long, default_value_t = 1.0)]
        time_step: f64,
        /// End time in seconds; 0 runs until all ships arrive
        #[arg(long, default_value_t = 0.0)]
        end_time: f64,
        /// Output directory for the trajectory and summary files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
        /// Emit a trajectory row every N ticks; 0 disables the trajectory
        #[arg(long, default_value_t = 1)]
        trajectory_frequency: usize,
    },
    /// Compute a shortest path between waypoints and print it
    Route {
        /// Network description file
        #[arg(long)]
        network: PathBuf,
        /// Waypoints as lon,lat pairs, at least two
        #[arg(long, required = true, num_args = 2..)]
        waypoint: Vec<String>,
        /// Use A* instead of Dijkstra
        #[arg(long)]
        a_star: bool,
    },
    /// Sweep ship speed and print the resistance/power table
    ResistanceStudy {
        /// JSON file holding an array of ship descriptors
        #[arg(long)]
        ships: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command {
        Command::Run {
            network,
            ships,
            time_step,
            end_time,
            output_dir,
            trajectory_frequency,
        } => run_simulation(
            network,
            ships,
            time_step,
            end_time,
            output_dir,
            trajectory_frequency,
        ),
        Command::Route {
            network,
            waypoint,
            a_star,
        } => print_route(network, waypoint, a_star),
        Command::ResistanceStudy { ships } => print_resistance_study(ships),
    }
}

fn load_ships(path: &PathBuf, network: &mut Network) -> Result<Vec<Ship>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading ships file {}", path.display()))?;
    let json: serde_json::Value = serde_json::from_str(&text).context("parsing ships file")?;
    let entries = json
        .as_array()
        .context("ships file must be a JSON array of descriptors")?;

    let mut ships = Vec::with_capacity(entries.len());
    for entry in entries {
        let descriptor = ShipDescriptor::from_json(entry.clone())?;
        let ship = if descriptor.contains("PathPoints") {
            descriptor.build()?
        } else {
            // Route between Origin and Destination through the network
            let origin = parse_lon_lat_value(entry, "Origin")?;
            let destination = parse_lon_lat_value(entry, "Destination")?;
            let route = network.shortest_path(&[origin, destination], PathAlgorithm::Dijkstra)?;
            descriptor.build_with_path(route.points, route.lines)?
        };
        ships.push(ship);
    }
    Ok(ships)
}

fn parse_lon_lat_value(entry: &serde_json::Value, key: &str) -> Result<GeoPoint> {
    let pair = entry[key]
        .as_array()
        .with_context(|| format!("ship descriptor needs {} as [lon, lat] or PathPoints", key))?;
    if pair.len() != 2 {
        bail!("{} must be [lon, lat]", key);
    }
    Ok(GeoPoint::new(
        pair[0].as_f64().context("longitude must be a number")?,
        pair[1].as_f64().context("latitude must be a number")?,
    ))
}

fn run_simulation(
    network_path: PathBuf,
    ships_path: PathBuf,
    time_step: f64,
    end_time: f64,
    output_dir: PathBuf,
    trajectory_frequency: usize,
) -> Result<()> {
    let mut network = Network::from_file(&network_path, "cli")?;
    let ships = load_ships(&ships_path, &mut network)?;

    let mut simulator = Simulator::new(
        network,
        ships,
        SimulatorConfig {
            time_step_s: time_step,
            end_time_s: end_time,
            trajectory_frequency: trajectory_frequency.max(1),
        },
    );

    std::fs::create_dir_all(&output_dir)?;
    if trajectory_frequency > 0 {
        let trajectory_path = output_dir.join("shipTrajectory_fairway.csv");
        let file = File::create(&trajectory_path)
            .with_context(|| format!("creating {}", trajectory_path.display()))?;
        simulator.export_trajectory(Box::new(BufWriter::new(file)))?;
    }

    let mut sink = TracingSimulationSink;
    let final_time = simulator.run(&mut sink)?;

    let summary_path = output_dir.join("shipSummary_fairway.txt");
    let mut summary = SummaryWriter::create(&summary_path)?;
    simulator.write_summary(&mut summary)?;

    println!(
        "Simulation finished at t = {:.1} s; summary written to {}",
        final_time,
        summary_path.display()
    );
    Ok(())
}

fn print_route(network_path: PathBuf, waypoints: Vec<String>, a_star: bool) -> Result<()> {
    let mut network = Network::from_file(&network_path, "cli")?;

    let mut points = Vec::with_capacity(waypoints.len());
    for raw in &waypoints {
        let mut parts = raw.split(',');
        let (Some(lon), Some(lat), None) = (parts.next(), parts.next(), parts.next()) else {
            bail!("waypoint must be lon,lat: {}", raw);
        };
        points.push(GeoPoint::new(lon.trim().parse()?, lat.trim().parse()?));
    }

    let algorithm = if a_star {
        PathAlgorithm::AStar
    } else {
        PathAlgorithm::Dijkstra
    };
    let path = network.shortest_path(&points, algorithm)?;

    println!("{} points, {:.1} m total", path.points.len(), path.total_length());
    for point in &path.points {
        println!("{:.6},{:.6}", point.lon(), point.lat());
    }
    Ok(())
}

fn print_resistance_study(ships_path: PathBuf) -> Result<()> {
    let text = std::fs::read_to_string(&ships_path)?;
    let json: serde_json::Value = serde_json::from_str(&text)?;
    let entries = json
        .as_array()
        .context("ships file must be a JSON array of descriptors")?;

    for entry in entries {
        let descriptor = ShipDescriptor::from_json(entry.clone())?;
        let ship = if descriptor.contains("PathPoints") {
            descriptor.build()?
        } else {
            // A stub two-point path: the sweep never moves the ship
            let points = vec![GeoPoint::new(0.0, 0.0), GeoPoint::new(0.1, 0.0)];
            let lines = fairway_vessel::lines_between(&points);
            descriptor.build_with_path(points, lines)?
        };

        println!("Ship: {}", ship.user_id());
        println!("{:>8} {:>10} {:>14} {:>14}", "kn", "m/s", "R_total [N]", "P_E [kW]");
        for row in resistance_study(&ship)? {
            println!(
                "{:>8.1} {:>10.3} {:>14.0} {:>14.1}",
                row.speed_kn, row.speed_ms, row.total_resistance_n, row.effective_power_kw
            );
        }
        println!();
    }
    Ok(())
}
