//! Marine fuel properties and conversions.

use serde::{Deserialize, Serialize};

/// Fuels the simulator knows about. Electric "fuel" carries NaN sentinels
/// for the volume-based properties; every volume operation on it yields 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FuelType {
    Diesel,
    /// Heavy fuel oil
    Hfo,
    /// Liquefied natural gas
    Lng,
    /// Marine diesel oil
    Mdo,
    /// Marine gas oil
    Mgo,
    Biofuel,
    Electric,
}

/// Physical fuel properties.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FuelProperties {
    /// Density (kg/L)
    pub density_kg_per_l: f64,
    /// Calorific value (MJ/kg)
    pub calorific_value_mj: f64,
    /// Carbon mass fraction
    pub carbon_content: f64,
    /// Sulfur mass fraction
    pub sulfur_content: f64,
}

const KWH_PER_MJ: f64 = 1.0 / 3.6;

impl FuelType {
    pub const ALL: [FuelType; 7] = [
        FuelType::Diesel,
        FuelType::Hfo,
        FuelType::Lng,
        FuelType::Mdo,
        FuelType::Mgo,
        FuelType::Biofuel,
        FuelType::Electric,
    ];

    pub fn properties(&self) -> FuelProperties {
        match self {
            FuelType::Diesel => FuelProperties {
                density_kg_per_l: 0.820,
                calorific_value_mj: 45.5,
                carbon_content: 0.875,
                sulfur_content: 0.000015,
            },
            FuelType::Hfo => FuelProperties {
                density_kg_per_l: 1.010,
                calorific_value_mj: 40.9,
                carbon_content: 0.85,
                sulfur_content: 0.02,
            },
            FuelType::Lng => FuelProperties {
                density_kg_per_l: 0.450,
                calorific_value_mj: 55.5,
                carbon_content: 0.75,
                sulfur_content: 0.001,
            },
            FuelType::Mdo => FuelProperties {
                density_kg_per_l: 0.890,
                calorific_value_mj: 44.0,
                carbon_content: 0.86,
                sulfur_content: 0.0015,
            },
            FuelType::Mgo => FuelProperties {
                density_kg_per_l: 0.860,
                calorific_value_mj: 45.84,
                carbon_content: 0.875,
                sulfur_content: 0.005,
            },
            FuelType::Biofuel => FuelProperties {
                density_kg_per_l: 0.860,
                calorific_value_mj: 39.0,
                carbon_content: 0.67,
                sulfur_content: 0.000015,
            },
            FuelType::Electric => FuelProperties {
                density_kg_per_l: f64::NAN,
                calorific_value_mj: f64::NAN,
                carbon_content: f64::NAN,
                sulfur_content: f64::NAN,
            },
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            FuelType::Diesel => "Diesel",
            FuelType::Hfo => "Heavy Fuel Oil",
            FuelType::Lng => "Liquefied Natural Gas",
            FuelType::Mdo => "Marine Diesel Oil",
            FuelType::Mgo => "Marine Gas Oil",
            FuelType::Biofuel => "Bio-Diesel",
            FuelType::Electric => "Electric",
        }
    }

    /// Weight (kg) of a fuel volume; 0 for Electric.
    pub fn weight_kg(&self, liters: f64) -> f64 {
        let p = self.properties();
        if p.density_kg_per_l.is_nan() {
            return 0.0;
        }
        liters * p.density_kg_per_l
    }

    /// Volume (L) holding the given energy; 0 for Electric.
    pub fn kwh_to_liters(&self, energy_kwh: f64) -> f64 {
        let p = self.properties();
        if p.density_kg_per_l.is_nan() {
            return 0.0;
        }
        let energy_mj = energy_kwh / KWH_PER_MJ;
        let mass_kg = energy_mj / p.calorific_value_mj;
        mass_kg / p.density_kg_per_l
    }

    /// Energy (kWh) stored in the given volume; 0 for Electric.
    pub fn liters_to_kwh(&self, liters: f64) -> f64 {
        let p = self.properties();
        if p.density_kg_per_l.is_nan() {
            return 0.0;
        }
        let mass_kg = liters * p.density_kg_per_l;
        mass_kg * p.calorific_value_mj * KWH_PER_MJ
    }

    /// CO₂ mass (kg) from burning the given volume, stoichiometric 44/12.
    pub fn liters_to_co2_kg(&self, liters: f64) -> f64 {
        let p = self.properties();
        if p.carbon_content.is_nan() {
            return 0.0;
        }
        p.carbon_content * (44.0 / 12.0) * self.weight_kg(liters)
    }

    /// SO₂ mass (kg) from burning the given volume, stoichiometric 64/32.
    pub fn liters_to_so2_kg(&self, liters: f64) -> f64 {
        let p = self.properties();
        if p.sulfur_content.is_nan() {
            return 0.0;
        }
        p.sulfur_content * (64.0 / 32.0) * self.weight_kg(liters)
    }
}

impl std::fmt::Display for FuelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_kwh_liter_round_trip() {
        for fuel in [FuelType::Diesel, FuelType::Hfo, FuelType::Lng] {
            let liters = fuel.kwh_to_liters(1000.0);
            assert!(liters > 0.0);
            assert_relative_eq!(fuel.liters_to_kwh(liters), 1000.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_electric_volume_operations_are_zero() {
        assert_eq!(FuelType::Electric.kwh_to_liters(100.0), 0.0);
        assert_eq!(FuelType::Electric.liters_to_kwh(100.0), 0.0);
        assert_eq!(FuelType::Electric.weight_kg(100.0), 0.0);
        assert_eq!(FuelType::Electric.liters_to_co2_kg(100.0), 0.0);
    }

    #[test]
    fn test_diesel_energy_density() {
        // 1 L diesel: 0.82 kg × 45.5 MJ/kg ≈ 37.3 MJ ≈ 10.36 kWh
        assert_relative_eq!(FuelType::Diesel.liters_to_kwh(1.0), 10.364, epsilon = 1e-2);
    }

    #[test]
    fn test_hfo_emits_more_sulfur_than_mgo() {
        let hfo = FuelType::Hfo.liters_to_so2_kg(1000.0);
        let mgo = FuelType::Mgo.liters_to_so2_kg(1000.0);
        assert!(hfo > mgo);
    }

    #[test]
    fn test_every_fuel_has_a_name_and_properties() {
        for fuel in FuelType::ALL {
            assert!(!fuel.display_name().is_empty());
            let p = fuel.properties();
            if fuel != FuelType::Electric {
                assert!(p.density_kg_per_l > 0.0);
                assert!(p.calorific_value_mj > 0.0);
            } else {
                assert!(p.density_kg_per_l.is_nan());
            }
        }
    }

    #[test]
    fn test_co2_stoichiometry() {
        // 1000 L diesel = 820 kg, 87.5% carbon, ×44/12
        assert_relative_eq!(
            FuelType::Diesel.liters_to_co2_kg(1000.0),
            820.0 * 0.875 * 44.0 / 12.0,
            epsilon = 1e-6
        );
    }
}
