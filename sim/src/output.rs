//! Trajectory and summary writers.

use crate::Result;
use fairway_vessel::Ship;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// CSV trajectory writer: one row per ship per configured tick.
pub struct TrajectoryWriter<W: Write> {
    out: W,
}

impl TrajectoryWriter<BufWriter<File>> {
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::create(path)?;
        Self::new(BufWriter::new(file))
    }
}

impl<W: Write> TrajectoryWriter<W> {
    pub fn new(mut out: W) -> Result<Self> {
        writeln!(
            out,
            "sim_time_s,ship_id,lat_deg,lon_deg,heading_deg,speed_m_s,\
             acceleration_m_s2,total_thrust_N,total_resistance_N,\
             cum_energy_kWh,cum_fuel_L"
        )?;
        Ok(Self { out })
    }

    pub fn write_row(&mut self, simulation_time_s: f64, ship: &Ship) -> Result<()> {
        let position = ship.current_position();
        writeln!(
            self.out,
            "{:.1},{},{:.8},{:.8},{:.3},{:.4},{:.5},{:.1},{:.1},{:.4},{:.3}",
            simulation_time_s,
            ship.user_id(),
            position.lat(),
            position.lon(),
            ship.current_heading_deg(),
            ship.speed_ms(),
            ship.acceleration(),
            ship.total_thrust_n(),
            ship.total_resistance_n(),
            ship.cumulative_energy_kwh(),
            ship.overall_cumulative_fuel_liters(),
        )?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

/// TXT summary writer: one block per ship at the end of the run.
pub struct SummaryWriter<W: Write> {
    out: W,
}

impl SummaryWriter<BufWriter<File>> {
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> SummaryWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn write_header(&mut self, simulation_time_s: f64) -> Result<()> {
        writeln!(self.out, "Fairway simulation summary")?;
        writeln!(self.out, "Generated: {}", chrono::Utc::now().to_rfc3339())?;
        writeln!(self.out, "Simulated time: {:.1} s", simulation_time_s)?;
        writeln!(self.out)?;
        Ok(())
    }

    pub fn write_ship_block(&mut self, ship: &Ship) -> Result<()> {
        let trip_time = ship.trip_time_s();
        let average_speed = if trip_time > 0.0 {
            ship.traveled_distance_m() / trip_time
        } else {
            0.0
        };

        writeln!(self.out, "Ship: {}", ship.user_id())?;
        writeln!(self.out, "  Reached destination: {}", ship.has_reached_destination())?;
        writeln!(
            self.out,
            "  Total travelled distance: {:.1} m",
            ship.traveled_distance_m()
        )?;
        writeln!(self.out, "  Trip time: {:.1} s", trip_time)?;
        writeln!(self.out, "  Average speed: {:.3} m/s", average_speed)?;
        writeln!(
            self.out,
            "  Running average speed: {:.3} m/s",
            ship.running_average_speed_ms()
        )?;
        writeln!(
            self.out,
            "  Running average acceleration: {:.5} m/s2",
            ship.running_average_acceleration()
        )?;
        writeln!(
            self.out,
            "  Total energy consumed: {:.2} kWh",
            ship.cumulative_energy_kwh()
        )?;

        let mut co2_kg = 0.0;
        let mut so2_kg = 0.0;
        for (fuel, liters) in ship.cumulative_fuel_liters() {
            writeln!(
                self.out,
                "  Fuel consumed ({}): {:.2} L",
                fuel.display_name(),
                liters
            )?;
            co2_kg += fuel.liters_to_co2_kg(*liters);
            so2_kg += fuel.liters_to_so2_kg(*liters);
        }
        writeln!(self.out, "  CO2 emitted: {:.2} kg", co2_kg)?;
        writeln!(self.out, "  SO2 emitted: {:.2} kg", so2_kg)?;

        if ship.total_cargo_ton_km() > 0.0 {
            writeln!(
                self.out,
                "  Energy per ton-km: {:.5} kWh/ton.km",
                ship.cumulative_energy_kwh() / ship.total_cargo_ton_km()
            )?;
        }
        writeln!(self.out)?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trajectory_header_and_row_shape() {
        let mut buffer = Vec::new();
        {
            let writer = TrajectoryWriter::new(&mut buffer).unwrap();
            drop(writer);
        }
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.starts_with("sim_time_s,ship_id,"));
        assert_eq!(text.lines().count(), 1);
        assert_eq!(text.lines().next().unwrap().split(',').count(), 11);
    }

    #[test]
    fn test_summary_header() {
        let mut buffer = Vec::new();
        {
            let mut writer = SummaryWriter::new(&mut buffer);
            writer.write_header(120.0).unwrap();
            writer.flush().unwrap();
        }
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("Simulated time: 120.0 s"));
    }
}
