//! Fuel tanks.

use crate::energy::EnergyConsumptionData;
use crate::fuel::FuelType;
use crate::{PropulsionError, Result};
use serde::{Deserialize, Serialize};

/// A fuel tank. Capacity accounting is volume-based; the depth-of-discharge
/// floor keeps the last fraction of the tank (sludge, unpumpable remainder)
/// out of reach.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tank {
    fuel_type: FuelType,
    max_capacity_l: f64,
    initial_capacity_l: f64,
    current_capacity_l: f64,
    state_of_capacity: f64,
    depth_of_discharge: f64,
    cumulative_consumed_l: f64,
    fuel_weight_kg: f64,
}

impl Tank {
    /// Build a tank from its characteristics. The initial fill is a
    /// fraction of the maximum capacity; the depth of discharge is the
    /// fraction of the tank that may be drained (1.0 = drain fully).
    pub fn new(
        fuel_type: FuelType,
        max_capacity_l: f64,
        initial_capacity_fraction: f64,
        depth_of_discharge: f64,
    ) -> Result<Self> {
        if max_capacity_l < 0.0 {
            return Err(PropulsionError::Configuration {
                message: "tank max capacity is not defined".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&initial_capacity_fraction) {
            return Err(PropulsionError::Configuration {
                message: "tank initial capacity fraction must be within [0, 1]".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&depth_of_discharge) {
            return Err(PropulsionError::Configuration {
                message: "the depth of discharge must be between 0.0 and 1.0; \
                          0.0: no discharge is allowed, 1.0: full discharge is allowed"
                    .to_string(),
            });
        }

        let initial_capacity_l = max_capacity_l * initial_capacity_fraction;
        Ok(Self {
            fuel_type,
            max_capacity_l,
            initial_capacity_l,
            current_capacity_l: initial_capacity_l,
            state_of_capacity: initial_capacity_fraction,
            depth_of_discharge,
            cumulative_consumed_l: 0.0,
            fuel_weight_kg: fuel_type.weight_kg(initial_capacity_l),
        })
    }

    pub fn fuel_type(&self) -> FuelType {
        self.fuel_type
    }

    pub fn max_capacity_liters(&self) -> f64 {
        self.max_capacity_l
    }

    pub fn initial_capacity_liters(&self) -> f64 {
        self.initial_capacity_l
    }

    pub fn current_capacity_liters(&self) -> f64 {
        self.current_capacity_l
    }

    /// Fill state in [0, 1].
    pub fn state_of_capacity(&self) -> f64 {
        self.state_of_capacity
    }

    pub fn depth_of_discharge(&self) -> f64 {
        self.depth_of_discharge
    }

    pub fn cumulative_consumed_liters(&self) -> f64 {
        self.cumulative_consumed_l
    }

    /// Weight of the remaining fuel (kg).
    pub fn current_weight_kg(&self) -> f64 {
        self.fuel_weight_kg
    }

    /// Whether the requested volume can be drained without crossing the
    /// depth-of-discharge floor.
    pub fn is_drainable(&self, requested_l: f64) -> bool {
        requested_l <= self.current_capacity_l
            && self.state_of_capacity > (1.0 - self.depth_of_discharge)
    }

    /// Whether usable fuel remains.
    pub fn has_fuel(&self) -> bool {
        self.state_of_capacity > (1.0 - self.depth_of_discharge)
    }

    /// Draw the requested energy as fuel volume. The time step does not
    /// bound a tank (unlike a battery's C-rate) and is ignored.
    pub fn consume(&mut self, _time_step_s: f64, requested_kwh: f64) -> EnergyConsumptionData {
        let requested_l = self.fuel_type.kwh_to_liters(requested_kwh);

        if !self.is_drainable(requested_l) {
            return EnergyConsumptionData::not_supplied(self.fuel_type, requested_kwh);
        }

        self.cumulative_consumed_l += requested_l;
        self.current_capacity_l -= requested_l;
        self.fuel_weight_kg = self.fuel_type.weight_kg(self.current_capacity_l);
        self.state_of_capacity = self.current_capacity_l / self.max_capacity_l;

        EnergyConsumptionData::supplied(self.fuel_type, requested_kwh, requested_l)
    }

    /// Total energy drawn since the last reset (kWh).
    pub fn total_energy_consumed_kwh(&self) -> f64 {
        self.fuel_type.liters_to_kwh(self.cumulative_consumed_l)
    }

    /// CO₂ mass emitted by the fuel burnt so far (kg).
    pub fn cumulative_co2_kg(&self) -> f64 {
        self.fuel_type.liters_to_co2_kg(self.cumulative_consumed_l)
    }

    /// SO₂ mass emitted by the fuel burnt so far (kg).
    pub fn cumulative_so2_kg(&self) -> f64 {
        self.fuel_type.liters_to_so2_kg(self.cumulative_consumed_l)
    }

    /// Revert to the initial fill and clear the consumption counter.
    pub fn reset(&mut self) {
        self.cumulative_consumed_l = 0.0;
        self.current_capacity_l = self.initial_capacity_l;
        self.state_of_capacity = self.current_capacity_l / self.max_capacity_l;
        self.fuel_weight_kg = self.fuel_type.weight_kg(self.current_capacity_l);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_consume_debits_volume_and_weight() {
        let mut tank = Tank::new(FuelType::Diesel, 10_000.0, 0.9, 0.9).unwrap();
        let before = tank.current_weight_kg();

        let r = tank.consume(1.0, 100.0);
        assert!(r.supplied);
        assert!(r.fuel_consumed_liters > 0.0);
        assert!(tank.current_weight_kg() < before);
        assert_relative_eq!(
            tank.cumulative_consumed_liters(),
            r.fuel_consumed_liters,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_dod_floor_blocks_draining() {
        // 50% DOD on a 90% fill: only the band above 50% state is usable
        let mut tank = Tank::new(FuelType::Diesel, 1000.0, 0.9, 0.5).unwrap();
        let usable_kwh = FuelType::Diesel.liters_to_kwh(1000.0 * (0.9 - 0.5));

        let r = tank.consume(1.0, usable_kwh * 0.9);
        assert!(r.supplied);

        // State is now under the floor: nothing more comes out
        let r2 = tank.consume(1.0, usable_kwh * 0.2);
        assert!(!r2.supplied);
        assert_eq!(r2.energy_consumed_kwh, 0.0);
    }

    #[test]
    fn test_over_request_is_refused_whole() {
        let mut tank = Tank::new(FuelType::Diesel, 100.0, 1.0, 1.0).unwrap();
        let too_much = FuelType::Diesel.liters_to_kwh(150.0);
        let r = tank.consume(1.0, too_much);
        assert!(!r.supplied);
        assert_eq!(r.energy_not_consumed_kwh, too_much);
        // Nothing was drained
        assert_relative_eq!(tank.current_capacity_liters(), 100.0);
    }

    #[test]
    fn test_reset_restores_initial_fill() {
        let mut tank = Tank::new(FuelType::Hfo, 1000.0, 0.8, 0.9).unwrap();
        tank.consume(1.0, 500.0);
        tank.reset();
        assert_relative_eq!(tank.current_capacity_liters(), 800.0);
        assert_eq!(tank.cumulative_consumed_liters(), 0.0);
    }

    #[test]
    fn test_mass_conservation() {
        let mut tank = Tank::new(FuelType::Diesel, 5000.0, 1.0, 1.0).unwrap();
        for _ in 0..10 {
            tank.consume(1.0, 50.0);
        }
        assert_relative_eq!(
            tank.cumulative_consumed_liters(),
            5000.0 - tank.current_capacity_liters(),
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_invalid_dod_rejected() {
        assert!(Tank::new(FuelType::Diesel, 100.0, 0.9, 1.5).is_err());
    }
}
