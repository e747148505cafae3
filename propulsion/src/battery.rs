//! Batteries for electric and hybrid ships.

use crate::energy::EnergyConsumptionData;
use crate::fuel::FuelType;
use crate::{PropulsionError, Result};
use serde::{Deserialize, Serialize};

/// A ship battery.
///
/// Discharge per step is bounded by the C-rate; recharge runs at half the
/// discharge rate. The SOC hysteresis pair drives hybrid charging: the
/// recharge request flag flips on when SOC falls below the lower bound and
/// off again once the upper bound is reached. Regenerated energy and hybrid
/// generator energy are counted separately but raise SOC identically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Battery {
    max_charge_kwh: f64,
    initial_charge_kwh: f64,
    current_charge_kwh: f64,
    state_of_charge: f64,
    c_rate: f64,
    depth_of_discharge: f64,
    recharge_soc_upper: f64,
    recharge_soc_lower: f64,
    enable_recharge: bool,
    cumulative_consumed_kwh: f64,
    cumulative_regenerated_kwh: f64,
    cumulative_net_consumed_kwh: f64,
}

impl Battery {
    pub fn new(
        max_charge_kwh: f64,
        initial_charge_fraction: f64,
        depth_of_discharge: f64,
        c_rate: f64,
        recharge_soc_upper: f64,
        recharge_soc_lower: f64,
    ) -> Result<Self> {
        if max_charge_kwh <= 0.0 {
            return Err(PropulsionError::Configuration {
                message: "battery max charge must be positive".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&initial_charge_fraction) {
            return Err(PropulsionError::Configuration {
                message: "battery initial charge fraction must be within [0, 1]".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&depth_of_discharge) {
            return Err(PropulsionError::Configuration {
                message: "battery depth of discharge must be within [0, 1]".to_string(),
            });
        }
        if c_rate <= 0.0 {
            return Err(PropulsionError::Configuration {
                message: "battery C-rate must be positive".to_string(),
            });
        }
        if recharge_soc_lower >= recharge_soc_upper {
            return Err(PropulsionError::Configuration {
                message: "battery recharge SOC lower bound must be below the upper bound"
                    .to_string(),
            });
        }

        let initial_charge_kwh = max_charge_kwh * initial_charge_fraction;
        Ok(Self {
            max_charge_kwh,
            initial_charge_kwh,
            current_charge_kwh: initial_charge_kwh,
            state_of_charge: initial_charge_fraction,
            c_rate,
            depth_of_discharge,
            recharge_soc_upper,
            recharge_soc_lower,
            enable_recharge: false,
            cumulative_consumed_kwh: 0.0,
            cumulative_regenerated_kwh: 0.0,
            cumulative_net_consumed_kwh: 0.0,
        })
    }

    /// Battery with the common defaults: 90% recharge ceiling, 50% floor.
    pub fn with_default_hysteresis(
        max_charge_kwh: f64,
        initial_charge_fraction: f64,
        depth_of_discharge: f64,
        c_rate: f64,
    ) -> Result<Self> {
        Self::new(
            max_charge_kwh,
            initial_charge_fraction,
            depth_of_discharge,
            c_rate,
            0.9,
            0.5,
        )
    }

    pub fn max_charge_kwh(&self) -> f64 {
        self.max_charge_kwh
    }

    pub fn initial_charge_kwh(&self) -> f64 {
        self.initial_charge_kwh
    }

    pub fn current_charge_kwh(&self) -> f64 {
        self.current_charge_kwh
    }

    pub fn state_of_charge(&self) -> f64 {
        self.state_of_charge
    }

    pub fn c_rate(&self) -> f64 {
        self.c_rate
    }

    pub fn cumulative_energy_consumed_kwh(&self) -> f64 {
        self.cumulative_consumed_kwh
    }

    pub fn cumulative_energy_regenerated_kwh(&self) -> f64 {
        self.cumulative_regenerated_kwh
    }

    pub fn cumulative_net_energy_consumed_kwh(&self) -> f64 {
        self.cumulative_net_consumed_kwh
    }

    /// Batteries carry no fuel mass that depletes; cell weight is part of
    /// the lightship weight.
    pub fn current_weight_kg(&self) -> f64 {
        0.0
    }

    /// Maximum discharge within one time step at the C-rate (kWh).
    pub fn max_discharge_kwh(&self, time_step_s: f64) -> f64 {
        (self.max_charge_kwh / self.c_rate) * (time_step_s / 3600.0)
    }

    /// Maximum recharge within one time step, at half the discharge rate.
    pub fn max_recharge_kwh(&self, time_step_s: f64) -> f64 {
        0.5 * self.max_discharge_kwh(time_step_s)
    }

    /// Whether the requested charge can be drained this step.
    pub fn is_drainable(&self, requested_kwh: f64, time_step_s: f64) -> bool {
        requested_kwh <= self.max_discharge_kwh(time_step_s)
            && requested_kwh <= self.current_charge_kwh
            && self.state_of_charge > (1.0 - self.depth_of_discharge)
    }

    pub fn has_charge(&self) -> bool {
        self.state_of_charge > (1.0 - self.depth_of_discharge)
    }

    /// Whether the hysteresis currently requests hybrid recharging.
    pub fn is_recharge_required(&self) -> bool {
        self.enable_recharge
    }

    pub fn consume(&mut self, time_step_s: f64, requested_kwh: f64) -> EnergyConsumptionData {
        if !self.is_drainable(requested_kwh, time_step_s) {
            self.update_hysteresis();
            return EnergyConsumptionData::not_supplied(FuelType::Electric, requested_kwh);
        }

        self.current_charge_kwh -= requested_kwh;
        self.cumulative_consumed_kwh += requested_kwh;
        self.cumulative_net_consumed_kwh += requested_kwh;
        self.refresh_soc();
        self.update_hysteresis();

        EnergyConsumptionData::supplied(FuelType::Electric, requested_kwh, 0.0)
    }

    /// Recharge from the hybrid generator. Returns the accepted energy.
    pub fn recharge_for_hybrids(&mut self, time_step_s: f64, offered_kwh: f64) -> f64 {
        let accepted = self.bounded_recharge(time_step_s, offered_kwh);
        self.cumulative_net_consumed_kwh -= accepted;
        accepted
    }

    /// Recharge from regenerated energy. Returns the accepted energy.
    pub fn recharge_by_regenerated_energy(&mut self, time_step_s: f64, offered_kwh: f64) -> f64 {
        let accepted = self.bounded_recharge(time_step_s, offered_kwh);
        self.cumulative_regenerated_kwh += accepted;
        accepted
    }

    fn bounded_recharge(&mut self, time_step_s: f64, offered_kwh: f64) -> f64 {
        if offered_kwh <= 0.0 {
            return 0.0;
        }
        let headroom = self.max_charge_kwh - self.current_charge_kwh;
        let accepted = offered_kwh
            .min(self.max_recharge_kwh(time_step_s))
            .min(headroom);
        self.current_charge_kwh += accepted;
        self.refresh_soc();
        self.update_hysteresis();
        accepted
    }

    fn refresh_soc(&mut self) {
        self.state_of_charge = (self.current_charge_kwh / self.max_charge_kwh).max(0.0);
    }

    fn update_hysteresis(&mut self) {
        if self.state_of_charge < self.recharge_soc_lower {
            self.enable_recharge = true;
        } else if self.state_of_charge >= self.recharge_soc_upper {
            self.enable_recharge = false;
        }
    }

    pub fn reset(&mut self) {
        self.current_charge_kwh = self.initial_charge_kwh;
        self.cumulative_consumed_kwh = 0.0;
        self.cumulative_regenerated_kwh = 0.0;
        self.cumulative_net_consumed_kwh = 0.0;
        self.enable_recharge = false;
        self.refresh_soc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn battery() -> Battery {
        // 1000 kWh, full, 80% DOD, 1C
        Battery::new(1000.0, 1.0, 0.8, 1.0, 0.9, 0.5).unwrap()
    }

    #[test]
    fn test_c_rate_bounds_discharge() {
        let mut b = battery();
        // At 1C, one hour drains at most the full pack; one second 1/3600
        let limit = b.max_discharge_kwh(1.0);
        assert_relative_eq!(limit, 1000.0 / 3600.0, epsilon = 1e-9);
        let r = b.consume(1.0, limit * 2.0);
        assert!(!r.supplied);
        let r2 = b.consume(1.0, limit * 0.5);
        assert!(r2.supplied);
    }

    #[test]
    fn test_recharge_is_half_rate() {
        let b = battery();
        assert_relative_eq!(
            b.max_recharge_kwh(60.0),
            0.5 * b.max_discharge_kwh(60.0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_soc_hysteresis() {
        // 1C pack: a 360 s step moves at most 10% of the capacity
        let mut b = Battery::new(100.0, 0.6, 1.0, 1.0, 0.9, 0.5).unwrap();
        assert!(!b.is_recharge_required());

        // Drain below the 50% floor
        while b.state_of_charge() >= 0.5 {
            let r = b.consume(360.0, b.max_discharge_kwh(360.0));
            assert!(r.supplied);
        }
        assert!(b.is_recharge_required());

        // Recharge above the 90% ceiling flips the flag back off
        while b.state_of_charge() < 0.9 {
            let before = b.current_charge_kwh();
            b.recharge_for_hybrids(3600.0, 100.0);
            assert!(b.current_charge_kwh() > before);
        }
        assert!(!b.is_recharge_required());
    }

    #[test]
    fn test_overfill_clamps_at_max() {
        let mut b = Battery::new(100.0, 0.99, 1.0, 0.001, 0.9, 0.5).unwrap();
        b.recharge_for_hybrids(3600.0, 1e6);
        assert!(b.current_charge_kwh() <= 100.0 + 1e-9);
    }

    #[test]
    fn test_regen_and_hybrid_counted_separately() {
        let mut b = Battery::new(100.0, 0.5, 1.0, 0.01, 0.9, 0.2).unwrap();
        b.recharge_by_regenerated_energy(3600.0, 5.0);
        b.recharge_for_hybrids(3600.0, 5.0);
        assert!(b.cumulative_energy_regenerated_kwh() > 0.0);
        // Hybrid recharge reduces the net consumption counter instead
        assert!(b.cumulative_net_energy_consumed_kwh() < 0.0);
    }

    #[test]
    fn test_dod_floor() {
        let mut b = Battery::new(100.0, 1.0, 0.3, 1.0, 0.95, 0.1).unwrap();
        // Only 30% may be drained; at or below SOC 0.7 requests are refused
        loop {
            let r = b.consume(360.0, 5.0);
            if !r.supplied {
                break;
            }
        }
        assert!(b.state_of_charge() <= 0.7 + 1e-9);
        assert!(!b.has_charge());
    }
}
