//! Energy consumption records and the energy-source dispatch.

use crate::battery::Battery;
use crate::fuel::FuelType;
use crate::tank::Tank;
use crate::{PropulsionError, Result};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;

/// Outcome of one consumption request against an energy source.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EnergyConsumptionData {
    /// Whether the source could deliver the full request
    pub supplied: bool,
    /// Energy actually drawn (kWh)
    pub energy_consumed_kwh: f64,
    /// Requested energy the source could not deliver (kWh)
    pub energy_not_consumed_kwh: f64,
    /// Fuel drawn to deliver the energy
    pub fuel_type: FuelType,
    /// Volume of that fuel (L); 0 for electric sources
    pub fuel_consumed_liters: f64,
}

impl EnergyConsumptionData {
    pub fn not_supplied(fuel_type: FuelType, requested_kwh: f64) -> Self {
        Self {
            supplied: false,
            energy_consumed_kwh: 0.0,
            energy_not_consumed_kwh: requested_kwh,
            fuel_type,
            fuel_consumed_liters: 0.0,
        }
    }

    pub fn supplied(fuel_type: FuelType, energy_kwh: f64, liters: f64) -> Self {
        Self {
            supplied: true,
            energy_consumed_kwh: energy_kwh,
            energy_not_consumed_kwh: 0.0,
            fuel_type,
            fuel_consumed_liters: liters,
        }
    }

    /// Combine two records of the same fuel type.
    pub fn checked_add(&self, other: &EnergyConsumptionData) -> Result<EnergyConsumptionData> {
        if self.fuel_type != other.fuel_type {
            return Err(PropulsionError::FuelTypeMismatch);
        }
        Ok(EnergyConsumptionData {
            supplied: self.supplied && other.supplied,
            energy_consumed_kwh: self.energy_consumed_kwh + other.energy_consumed_kwh,
            energy_not_consumed_kwh: self.energy_not_consumed_kwh + other.energy_not_consumed_kwh,
            fuel_type: self.fuel_type,
            fuel_consumed_liters: self.fuel_consumed_liters + other.fuel_consumed_liters,
        })
    }

    /// Difference of two records of the same fuel type.
    pub fn checked_sub(&self, other: &EnergyConsumptionData) -> Result<EnergyConsumptionData> {
        if self.fuel_type != other.fuel_type {
            return Err(PropulsionError::FuelTypeMismatch);
        }
        Ok(EnergyConsumptionData {
            supplied: self.supplied && other.supplied,
            energy_consumed_kwh: self.energy_consumed_kwh - other.energy_consumed_kwh,
            energy_not_consumed_kwh: self.energy_not_consumed_kwh - other.energy_not_consumed_kwh,
            fuel_type: self.fuel_type,
            fuel_consumed_liters: self.fuel_consumed_liters - other.fuel_consumed_liters,
        })
    }
}

/// An on-board energy store: a fuel tank or a battery. The variant set is
/// closed, so every consumer dispatches without trait objects.
#[derive(Debug, Clone)]
pub enum EnergySource {
    Tank(Tank),
    Battery(Battery),
}

impl EnergySource {
    /// Draw energy for one time step. Under-supply is reported in the
    /// result, never as an error: the caller decides what starving means.
    pub fn consume(&mut self, time_step_s: f64, requested_kwh: f64) -> EnergyConsumptionData {
        match self {
            EnergySource::Tank(t) => t.consume(time_step_s, requested_kwh),
            EnergySource::Battery(b) => b.consume(time_step_s, requested_kwh),
        }
    }

    /// Current fill state in [0, 1].
    pub fn current_state(&self) -> f64 {
        match self {
            EnergySource::Tank(t) => t.state_of_capacity(),
            EnergySource::Battery(b) => b.state_of_charge(),
        }
    }

    /// Weight of the stored energy carrier (kg).
    pub fn current_weight_kg(&self) -> f64 {
        match self {
            EnergySource::Tank(t) => t.current_weight_kg(),
            EnergySource::Battery(b) => b.current_weight_kg(),
        }
    }

    pub fn fuel_type(&self) -> FuelType {
        match self {
            EnergySource::Tank(t) => t.fuel_type(),
            EnergySource::Battery(_) => FuelType::Electric,
        }
    }

    /// Total energy drawn since the last reset (kWh).
    pub fn total_energy_consumed_kwh(&self) -> f64 {
        match self {
            EnergySource::Tank(t) => t.total_energy_consumed_kwh(),
            EnergySource::Battery(b) => b.cumulative_net_energy_consumed_kwh(),
        }
    }

    /// Whether any deliverable energy remains above the discharge floor.
    pub fn has_energy(&self) -> bool {
        match self {
            EnergySource::Tank(t) => t.has_fuel(),
            EnergySource::Battery(b) => b.has_charge(),
        }
    }

    /// Initial deliverable energy content (kWh).
    pub fn initial_energy_kwh(&self) -> f64 {
        match self {
            EnergySource::Tank(t) => t.fuel_type().liters_to_kwh(t.initial_capacity_liters()),
            EnergySource::Battery(b) => b.initial_charge_kwh(),
        }
    }

    /// Revert to the initial fill and clear the cumulative counters.
    pub fn reset(&mut self) {
        match self {
            EnergySource::Tank(t) => t.reset(),
            EnergySource::Battery(b) => b.reset(),
        }
    }
}

/// Sources are owned by the ship and referenced by its engines; the
/// simulator core is single-threaded (one tick thread mutates ships), so a
/// reference-counted cell is the whole synchronization story.
pub type SharedEnergySource = Rc<RefCell<EnergySource>>;

/// Wrap a source for sharing between the ship and its engines.
pub fn share(source: EnergySource) -> SharedEnergySource {
    Rc::new(RefCell::new(source))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_add_same_fuel() {
        let a = EnergyConsumptionData::supplied(FuelType::Diesel, 10.0, 1.0);
        let b = EnergyConsumptionData::supplied(FuelType::Diesel, 5.0, 0.5);
        let sum = a.checked_add(&b).unwrap();
        assert_eq!(sum.energy_consumed_kwh, 15.0);
        assert_eq!(sum.fuel_consumed_liters, 1.5);
        assert!(sum.supplied);
    }

    #[test]
    fn test_checked_add_rejects_mixed_fuels() {
        let a = EnergyConsumptionData::supplied(FuelType::Diesel, 10.0, 1.0);
        let b = EnergyConsumptionData::supplied(FuelType::Hfo, 5.0, 0.5);
        assert!(a.checked_add(&b).is_err());
    }

    #[test]
    fn test_under_supply_record() {
        let r = EnergyConsumptionData::not_supplied(FuelType::Diesel, 42.0);
        assert!(!r.supplied);
        assert_eq!(r.energy_not_consumed_kwh, 42.0);
        assert_eq!(r.energy_consumed_kwh, 0.0);
    }
}
