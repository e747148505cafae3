//! Gearboxes aggregating one or more engines onto a shaft.

use crate::context::PropulsionContext;
use crate::engine::{Engine, EngineProperties};
use crate::{PropulsionError, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Gearbox construction parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GearboxConfig {
    /// Gear ratio engine:shaft (e.g. 4.0 means the shaft turns 4× slower)
    pub gear_ratio: f64,
    /// Mechanical transmission efficiency in (0, 1]
    pub efficiency: f64,
}

/// A gearbox owning its engines and reducing their speed onto one shaft.
#[derive(Debug, Clone)]
pub struct Gearbox {
    gear_ratio: f64,
    efficiency: f64,
    engines: Vec<Engine>,
    output_power_kw: f64,
}

impl Gearbox {
    pub fn new(config: GearboxConfig, engines: Vec<Engine>) -> Result<Self> {
        if config.gear_ratio <= 0.0 {
            return Err(PropulsionError::Configuration {
                message: "gearbox ratio is not defined; it should be a positive value"
                    .to_string(),
            });
        }
        let efficiency = if config.efficiency <= 0.0 || config.efficiency > 1.0 {
            warn!("gearbox efficiency is not defined, set to default 1.0");
            1.0
        } else {
            config.efficiency
        };
        if engines.is_empty() {
            return Err(PropulsionError::Configuration {
                message: "gearbox needs at least one engine".to_string(),
            });
        }
        Ok(Self {
            gear_ratio: config.gear_ratio,
            efficiency,
            engines,
            output_power_kw: 0.0,
        })
    }

    pub fn gear_ratio(&self) -> f64 {
        self.gear_ratio
    }

    pub fn efficiency(&self) -> f64 {
        self.efficiency
    }

    pub fn engines(&self) -> &[Engine] {
        &self.engines
    }

    pub fn engines_mut(&mut self) -> &mut [Engine] {
        &mut self.engines
    }

    /// Shaft speed (rpm): the power-weighted average of the engine speeds
    /// through the gear ratio. A single-engine box reduces to
    /// `engine rpm / ratio`.
    pub fn output_rpm(&self) -> f64 {
        if self.engines.is_empty() {
            return 0.0;
        }
        if self.engines.len() == 1 {
            return self.engines[0].rpm() / self.gear_ratio;
        }

        let mut total_power = 0.0;
        let mut weighted_rpm = 0.0;
        for engine in &self.engines {
            let power = engine.brake_power_kw();
            total_power += power;
            weighted_rpm += engine.rpm() * power;
        }
        if total_power == 0.0 {
            return 0.0;
        }
        weighted_rpm / total_power / self.gear_ratio
    }

    /// Shaft speed range (rpm) from the engine curve ends.
    pub fn output_rpm_range(&self) -> (f64, f64) {
        if self.engines.is_empty() {
            return (0.0, 0.0);
        }
        if self.engines.len() == 1 {
            let (lo, hi) = self.engines[0].rpm_range();
            return (lo / self.gear_ratio, hi / self.gear_ratio);
        }

        let mut total_power = 0.0;
        let mut weighted_lo = 0.0;
        let mut weighted_hi = 0.0;
        for engine in &self.engines {
            let rating = engine.rating_properties().break_power_kw;
            let (lo, hi) = engine.rpm_range();
            total_power += rating;
            weighted_lo += lo * rating;
            weighted_hi += hi * rating;
        }
        if total_power == 0.0 {
            return (0.0, 0.0);
        }
        (
            weighted_lo / total_power / self.gear_ratio,
            weighted_hi / total_power / self.gear_ratio,
        )
    }

    /// Shaft power (kW): the engine powers summed through the transmission
    /// efficiency.
    pub fn output_power_kw(&mut self) -> f64 {
        let total: f64 = self.engines.iter().map(|e| e.brake_power_kw()).sum();
        self.output_power_kw = total * self.efficiency;
        self.output_power_kw
    }

    pub fn previous_output_power_kw(&self) -> f64 {
        self.output_power_kw
    }

    /// Shaft torque (N·m) at the current state.
    pub fn output_torque_nm(&mut self) -> f64 {
        let rpm = self.output_rpm();
        if rpm == 0.0 {
            return 0.0;
        }
        let omega = rpm * 2.0 * std::f64::consts::PI / 60.0;
        self.output_power_kw() * 1000.0 / omega
    }

    /// The aggregate engine characteristics seen at the shaft for a given
    /// shaft speed: each engine is read at `rpm × ratio`, powers are summed
    /// through the efficiency, efficiency is power-weighted.
    pub fn properties_at_output_rpm(&self, shaft_rpm: f64) -> EngineProperties {
        let engine_rpm = shaft_rpm * self.gear_ratio;
        let mut total_power = 0.0;
        let mut weighted_eff = 0.0;
        for engine in &self.engines {
            let p = engine.properties_at_rpm(engine_rpm);
            total_power += p.break_power_kw;
            weighted_eff += p.efficiency * p.break_power_kw;
        }
        let efficiency = if total_power > 0.0 {
            weighted_eff / total_power
        } else {
            0.0
        };
        EngineProperties::new(total_power * self.efficiency, shaft_rpm, efficiency)
    }

    /// Drive the shaft to a target speed by distributing `target × ratio`
    /// across the engines weighted by their rating.
    pub fn set_output_rpm(&mut self, target_shaft_rpm: f64) -> Result<()> {
        let (lo, hi) = self.output_rpm_range();
        if target_shaft_rpm < lo || target_shaft_rpm > hi {
            return Err(PropulsionError::RpmOutOfRange {
                rpm: target_shaft_rpm,
                min_rpm: lo,
                max_rpm: hi,
            });
        }

        if self.engines.len() == 1 {
            self.engines[0].set_rpm(target_shaft_rpm * self.gear_ratio);
            return Ok(());
        }

        let total_rating: f64 = self
            .engines
            .iter()
            .map(|e| e.rating_properties().break_power_kw)
            .sum();
        if total_rating == 0.0 {
            return Ok(());
        }
        let n = self.engines.len() as f64;
        for engine in &mut self.engines {
            let weight = engine.rating_properties().break_power_kw / total_rating;
            engine.set_rpm(target_shaft_rpm * self.gear_ratio * weight * n);
        }
        Ok(())
    }

    /// Cap the load of every engine in the box.
    pub fn set_max_power_ratio(&mut self, ratio: f64) {
        for engine in &mut self.engines {
            engine.set_max_power_ratio(ratio);
        }
    }

    /// Refresh every engine operating point for the tick.
    pub fn update_operating_state(&mut self, ctx: &PropulsionContext) {
        for engine in &mut self.engines {
            engine.update_operating_point(ctx);
        }
    }

    /// Whether any engine in the box is still working.
    pub fn any_engine_working(&self) -> bool {
        self.engines.iter().any(|e| e.is_working())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::test_support::{cruising_context, linear_engine};
    use approx::assert_relative_eq;

    fn single_engine_box() -> Gearbox {
        Gearbox::new(
            GearboxConfig {
                gear_ratio: 4.0,
                efficiency: 0.98,
            },
            vec![linear_engine(1, 1e7)],
        )
        .unwrap()
    }

    #[test]
    fn test_single_engine_reduction() {
        let mut gb = single_engine_box();
        let ctx = cruising_context(8.0, 10.0);
        gb.update_operating_state(&ctx);

        let engine_rpm = gb.engines()[0].rpm();
        assert_relative_eq!(gb.output_rpm(), engine_rpm / 4.0, epsilon = 1e-12);

        let engine_power = gb.engines()[0].brake_power_kw();
        assert_relative_eq!(gb.output_power_kw(), engine_power * 0.98, epsilon = 1e-12);
    }

    #[test]
    fn test_weighted_rpm_for_twin_engines() {
        let mut gb = Gearbox::new(
            GearboxConfig {
                gear_ratio: 2.0,
                efficiency: 1.0,
            },
            vec![linear_engine(1, 1e7), linear_engine(2, 1e7)],
        )
        .unwrap();
        let ctx = cruising_context(8.0, 10.0);
        gb.update_operating_state(&ctx);

        // Identical engines: weighted average equals either engine's rpm
        let expected = gb.engines()[0].rpm() / 2.0;
        assert_relative_eq!(gb.output_rpm(), expected, epsilon = 1e-9);
    }

    #[test]
    fn test_set_output_rpm_range_check() {
        let mut gb = single_engine_box();
        let (lo, hi) = gb.output_rpm_range();
        assert!(gb.set_output_rpm(hi * 2.0).is_err());
        assert!(gb.set_output_rpm((lo + hi) / 2.0).is_ok());
        let engine_rpm = gb.engines()[0].rpm();
        assert_relative_eq!(engine_rpm, (lo + hi) / 2.0 * 4.0, epsilon = 1e-9);
    }

    #[test]
    fn test_properties_at_output_rpm() {
        let gb = single_engine_box();
        let (lo, hi) = gb.output_rpm_range();
        let mid = (lo + hi) / 2.0;
        let props = gb.properties_at_output_rpm(mid);
        assert!(props.break_power_kw > 0.0);
        assert_relative_eq!(props.rpm, mid);
        assert!(props.efficiency > 0.0);
    }

    #[test]
    fn test_invalid_ratio_rejected() {
        let r = Gearbox::new(
            GearboxConfig {
                gear_ratio: -1.0,
                efficiency: 1.0,
            },
            vec![linear_engine(1, 1e6)],
        );
        assert!(r.is_err());
    }
}
