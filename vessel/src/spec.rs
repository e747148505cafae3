//! Ship construction from a string-keyed descriptor map.
//!
//! The front-end supplies an associative map (typically parsed from JSON)
//! whose recognized keys describe the hull, the propulsion chain and the
//! energy sources. Required quantities missing from the map fail
//! construction before any ticking; derivable quantities are regressed
//! from the rest of the hull.

use crate::hullcalc;
use crate::ship::{Ship, ShipParts};
use crate::{Result, VesselError};
use fairway_geo::{GeoLine, GeoPoint};
use fairway_hydro::{
    hydrology, Appendage, CalmResistanceModel, DynamicResistanceModel, Environment, HullInput,
    ResistanceStack, SternShape,
};
use fairway_propulsion::{
    share, Battery, Engine, EngineProperties, EnergySource, FuelType, Gearbox, GearboxConfig,
    Propeller, PropellerConfig, SharedEnergySource, Tank,
};
use serde_json::Value;
use std::collections::HashMap;
use tracing::warn;

/// Default tank volume when the descriptor is silent (L).
const DEFAULT_TANK_SIZE_L: f64 = 11_356_235.35;
const DEFAULT_TANK_INITIAL_CAPACITY: f64 = 0.9;
const DEFAULT_TANK_DEPTH_OF_DISCHARGE: f64 = 0.9;
const DEFAULT_PROPELLER_COUNT: usize = 1;
const DEFAULT_ENGINES_PER_PROPELLER: usize = 1;
const DEFAULT_PROPELLER_BLADES: u32 = 4;
const DEFAULT_RUDDER_ANGLE_DEG: f64 = 35.0;

/// A string-keyed ship descriptor.
#[derive(Debug, Clone, Default)]
pub struct ShipDescriptor {
    values: HashMap<String, Value>,
}

impl ShipDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a JSON object as a descriptor.
    pub fn from_json(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self {
                values: map.into_iter().collect(),
            }),
            other => Err(VesselError::Configuration {
                message: format!("ship descriptor must be a JSON object, got {}", other),
            }),
        }
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.values.insert(key.to_string(), value.into());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    fn f64_opt(&self, key: &str) -> Result<Option<f64>> {
        match self.values.get(key) {
            None => Ok(None),
            Some(v) => v.as_f64().map(Some).ok_or_else(|| VesselError::Configuration {
                message: format!("{} must be a number", key),
            }),
        }
    }

    fn f64_required(&self, key: &str) -> Result<f64> {
        self.f64_opt(key)?.ok_or_else(|| VesselError::Configuration {
            message: format!("{} is not defined", key),
        })
    }

    fn f64_or(&self, key: &str, default: f64) -> Result<f64> {
        Ok(self.f64_opt(key)?.unwrap_or(default))
    }

    fn usize_or(&self, key: &str, default: usize) -> Result<usize> {
        match self.values.get(key) {
            None => Ok(default),
            Some(v) => v
                .as_u64()
                .map(|n| n as usize)
                .ok_or_else(|| VesselError::Configuration {
                    message: format!("{} must be a non-negative integer", key),
                }),
        }
    }

    fn bool_or(&self, key: &str, default: bool) -> Result<bool> {
        match self.values.get(key) {
            None => Ok(default),
            Some(v) => v.as_bool().ok_or_else(|| VesselError::Configuration {
                message: format!("{} must be a boolean", key),
            }),
        }
    }

    fn string_or(&self, key: &str, default: &str) -> String {
        self.values
            .get(key)
            .and_then(|v| v.as_str())
            .unwrap_or(default)
            .to_string()
    }

    /// Assemble the hull input, deriving what the map omits.
    fn build_hull(&self, propeller_diameter: f64, expanded_area_ratio: f64) -> Result<HullInput> {
        let lwl = self.f64_required("WaterlineLength")?;
        let beam = self.f64_required("Beam")?;

        let mean_draft = match self.f64_opt("MeanDraft")? {
            Some(t) => t,
            None => {
                let tf = self.f64_required("DraftAtForward")?;
                let ta = self.f64_required("DraftAtAft")?;
                (tf + ta) / 2.0
            }
        };
        let draft_forward = self.f64_or("DraftAtForward", mean_draft)?;
        let draft_aft = self.f64_or("DraftAtAft", mean_draft)?;
        let lbp = self.f64_or("LengthBetweenPerpendiculars", lwl)?;

        // Section coefficients: any two of {C_B, C_M, C_P} imply the third
        let cb_opt = self.f64_opt("BlockCoef")?;
        let cm_opt = self.f64_opt("MidshipSectionCoef")?;
        let cp_opt = self.f64_opt("PrismaticCoef")?;
        let vol_opt = self.f64_opt("VolumetricDisplacement")?;

        let (cb, cm, cp) = match (cb_opt, cm_opt, cp_opt) {
            (Some(cb), Some(cm), Some(cp)) => (cb, cm, cp),
            (Some(cb), Some(cm), None) => (cb, cm, hullcalc::prismatic_coef(cb, cm)),
            (Some(cb), None, Some(cp)) => (cb, hullcalc::midship_coef(cb, cp), cp),
            (None, Some(cm), Some(cp)) => (hullcalc::block_coef_from_sections(cm, cp), cm, cp),
            (Some(cb), None, None) => {
                warn!("midship section coefficient not defined, set to default 0.98");
                (cb, 0.98, hullcalc::prismatic_coef(cb, 0.98))
            }
            (None, _, _) => {
                let vol = vol_opt.ok_or_else(|| VesselError::Configuration {
                    message: "either BlockCoef or VolumetricDisplacement must be defined"
                        .to_string(),
                })?;
                let cb = vol / (lwl * beam * mean_draft);
                warn!(cb, "block coefficient derived from the volumetric displacement");
                (cb, 0.98, hullcalc::prismatic_coef(cb, 0.98))
            }
        };

        let volumetric_displacement = match vol_opt {
            Some(v) => v,
            None => lwl * beam * mean_draft * cb,
        };

        let cwp = match self.f64_opt("WaterplaneAreaCoef")? {
            Some(c) => c,
            None => hullcalc::waterplane_coef(cb, cp, hullcalc::WaterplaneCoefMethod::UShape),
        };

        let lcb_percent = self.f64_or("LongitudinalBuoyancyCenter", 0.0)?;
        let stern_shape = match self.string_or("SternShape", "Normal").as_str() {
            "PramWithGondola" => SternShape::PramWithGondola,
            "VShaped" => SternShape::VShaped,
            "UShapedHogner" => SternShape::UShapedHogner,
            _ => SternShape::Normal,
        };

        let mut hull = HullInput {
            lwl,
            lbp,
            beam,
            mean_draft,
            draft_forward,
            draft_aft,
            volumetric_displacement,
            wetted_surface: 0.0,
            bulbous_bow_area: self.f64_or("BulbousBowTransverseArea", 0.0)?,
            bulbous_center_height: self.f64_or("BulbousBowTransverseAreaCenterHeight", 0.0)?,
            immersed_transom_area: self.f64_or("ImmersedTransomArea", 0.0)?,
            half_entrance_angle_deg: 0.0,
            cb,
            cm,
            cp,
            cwp,
            lcb_percent,
            stern_shape,
            surface_roughness_m: self.f64_or("SurfaceRoughness", 150.0e-6)?,
            appendages: self.parse_appendages()?,
            above_water_transverse_area: self.f64_or("AboveWaterTransverseArea", 0.0)?,
            lengthwise_projection_area: self.f64_or("LengthwiseProjectionArea", 0.0)?,
            propeller_diameter,
            propeller_expanded_area_ratio: expanded_area_ratio,
        };

        hull.wetted_surface = match self.f64_opt("WettedHullSurface")? {
            Some(s) => s,
            None => hullcalc::wet_surface_holtrop(&hull),
        };
        hull.half_entrance_angle_deg = match self.f64_opt("HalfWaterlineEntranceAngle")? {
            Some(a) => a,
            None => hullcalc::half_entrance_angle_deg(&hull),
        };

        Ok(hull)
    }

    fn parse_appendages(&self) -> Result<Vec<(Appendage, f64)>> {
        let Some(value) = self.values.get("AppendagesWettedSurfaces") else {
            return Ok(Vec::new());
        };
        let map = value.as_object().ok_or_else(|| VesselError::Configuration {
            message: "AppendagesWettedSurfaces must be an object of name: area".to_string(),
        })?;

        let mut appendages = Vec::with_capacity(map.len());
        for (name, area) in map {
            let kind = match name.as_str() {
                "RudderBehindSkeg" => Appendage::RudderBehindSkeg,
                "RudderBehindStern" => Appendage::RudderBehindStern,
                "TwinScrewBalanceRudders" => Appendage::TwinScrewBalanceRudders,
                "ShaftBrackets" => Appendage::ShaftBrackets,
                "Skeg" => Appendage::Skeg,
                "StrutBossings" => Appendage::StrutBossings,
                "HullBossings" => Appendage::HullBossings,
                "ExposedShafts" => Appendage::ExposedShafts,
                "StabilizerFins" => Appendage::StabilizerFins,
                "Dome" => Appendage::Dome,
                "BilgeKeels" => Appendage::BilgeKeels,
                other => {
                    return Err(VesselError::Configuration {
                        message: format!("unknown appendage kind: {}", other),
                    })
                }
            };
            let area = area.as_f64().ok_or_else(|| VesselError::Configuration {
                message: format!("appendage area for {} must be a number", name),
            })?;
            appendages.push((kind, area));
        }
        Ok(appendages)
    }

    fn parse_fuel_type(&self) -> Result<FuelType> {
        Ok(match self.string_or("FuelType", "HFO").as_str() {
            "Diesel" => FuelType::Diesel,
            "HFO" => FuelType::Hfo,
            "LNG" => FuelType::Lng,
            "MDO" => FuelType::Mdo,
            "MGO" => FuelType::Mgo,
            "Biofuel" => FuelType::Biofuel,
            "Electric" => FuelType::Electric,
            other => {
                return Err(VesselError::Configuration {
                    message: format!("unknown fuel type: {}", other),
                })
            }
        })
    }

    fn parse_engine_curve(&self, key: &str) -> Result<Vec<EngineProperties>> {
        let Some(value) = self.values.get(key) else {
            return Ok(Vec::new());
        };
        let rows = value.as_array().ok_or_else(|| VesselError::Configuration {
            message: format!("{} must be an array of [kW, rpm, efficiency] rows", key),
        })?;
        let mut curve = Vec::with_capacity(rows.len());
        for row in rows {
            let triple = row.as_array().filter(|a| a.len() == 3).ok_or_else(|| {
                VesselError::Configuration {
                    message: format!("{} rows must be [kW, rpm, efficiency]", key),
                }
            })?;
            let get = |i: usize| -> Result<f64> {
                triple[i].as_f64().ok_or_else(|| VesselError::Configuration {
                    message: format!("{} entries must be numbers", key),
                })
            };
            curve.push(EngineProperties::new(get(0)?, get(1)?, get(2)?));
        }
        Ok(curve)
    }

    fn parse_power_settings(&self) -> Result<Vec<f64>> {
        let value = self
            .values
            .get("EngineOperationalPowerSettings")
            .ok_or_else(|| VesselError::Configuration {
                message: "EngineOperationalPowerSettings is not defined; engine \
                          properties must be defined at the corners of the engine layout"
                    .to_string(),
            })?;
        let rows = value.as_array().ok_or_else(|| VesselError::Configuration {
            message: "EngineOperationalPowerSettings must be an array of four kW values"
                .to_string(),
        })?;
        rows.iter()
            .map(|v| {
                v.as_f64().ok_or_else(|| VesselError::Configuration {
                    message: "EngineOperationalPowerSettings entries must be numbers".to_string(),
                })
            })
            .collect()
    }

    /// Build the ship parts (everything but the route).
    pub fn build_parts(&self) -> Result<ShipParts> {
        let user_id = self.string_or("ID", "ship");
        let max_speed_ms = self.f64_required("MaxSpeed")?;

        // Propulsion geometry feeds the hull regressions
        let propeller_diameter = self.f64_required("PropellerDiameter")?;
        let propeller_pitch = self.f64_required("PropellerPitch")?;
        let expanded_area_ratio = self.f64_required("PropellerExpandedAreaRatio")?;
        let blades = self.usize_or("PropellerBladesCount", DEFAULT_PROPELLER_BLADES as usize)? as u32;
        let shaft_efficiency = self.f64_required("ShaftEfficiency")?;

        let hull = self.build_hull(propeller_diameter, expanded_area_ratio)?;

        // Energy sources, shared by every engine. Electric ships carry a
        // battery; everything else a fuel tank.
        let fuel_type = self.parse_fuel_type()?;
        let source = if fuel_type == FuelType::Electric {
            EnergySource::Battery(Battery::new(
                self.f64_required("BatteryMaxCharge")?,
                self.f64_or("BatteryInitialChargePercentage", 1.0)?,
                self.f64_or("BatteryDepthOfDischarge", 0.9)?,
                self.f64_or("BatteryCRate", 1.0)?,
                self.f64_or("BatteryRechargeSOCUpperBound", 0.9)?,
                self.f64_or("BatteryRechargeSOCLowerBound", 0.5)?,
            )?)
        } else {
            EnergySource::Tank(Tank::new(
                fuel_type,
                self.f64_or("TankSize", DEFAULT_TANK_SIZE_L)?,
                self.f64_or("TankInitialCapacityPercentage", DEFAULT_TANK_INITIAL_CAPACITY)?,
                self.f64_or("TankDepthOfDischage", DEFAULT_TANK_DEPTH_OF_DISCHARGE)?,
            )?)
        };
        let sources: Vec<SharedEnergySource> = vec![share(source)];

        // Engines and gearboxes per propeller
        let propeller_count = self.usize_or("PropellerCount", DEFAULT_PROPELLER_COUNT)?;
        let engines_per_propeller =
            self.usize_or("EnginesCountPerPropeller", DEFAULT_ENGINES_PER_PROPELLER)?;
        if propeller_count == 0 || engines_per_propeller == 0 {
            return Err(VesselError::Configuration {
                message: "propeller and engine counts must be positive".to_string(),
            });
        }

        let power_settings = self.parse_power_settings()?;
        let tier2 = self.parse_engine_curve("EngineTierIIPropertiesPoints")?;
        let tier3 = self.parse_engine_curve("EngineTierIIIPropertiesPoints")?;
        let gearbox_ratio = match self.f64_opt("GearboxRatio")? {
            Some(r) => r,
            None => {
                warn!("gearbox ratio is not defined, set to default 1.0");
                1.0
            }
        };
        let gearbox_efficiency = self.f64_or("GearboxEfficiency", 1.0)?;
        let allow_optimization = self.bool_or("AllowPropellerEngineOptimization", false)?;

        let mut propellers = Vec::with_capacity(propeller_count);
        let mut engine_id: u32 = 0;
        for _ in 0..propeller_count {
            let mut engines = Vec::with_capacity(engines_per_propeller);
            for _ in 0..engines_per_propeller {
                engine_id += 1;
                engines.push(Engine::new(
                    engine_id,
                    power_settings.clone(),
                    tier2.clone(),
                    tier3.clone(),
                    sources.clone(),
                )?);
            }
            let gearbox = Gearbox::new(
                GearboxConfig {
                    gear_ratio: gearbox_ratio,
                    efficiency: gearbox_efficiency,
                },
                engines,
            )?;
            propellers.push(Propeller::new(
                PropellerConfig {
                    diameter_m: propeller_diameter,
                    pitch_m: propeller_pitch,
                    expanded_area_ratio,
                    blades,
                    shaft_efficiency,
                    allow_engine_optimization: allow_optimization,
                },
                gearbox,
            )?);
        }

        // Weights: lightship defaults to the displacement afloat minus cargo
        let cargo_weight_t = self.f64_or("CargoWeight", 0.0)?;
        let vessel_weight_t = match self.f64_opt("VesselWeight")? {
            Some(w) => w,
            None => {
                let env = Environment::calm(35.0, 15.0);
                let displacement_t = hull.volumetric_displacement
                    * hydrology::water_density(env.salinity_ppt, env.temperature_c)
                    / 1000.0;
                (displacement_t - cargo_weight_t).max(0.0)
            }
        };

        Ok(ShipParts {
            user_id,
            hull,
            resistance: ResistanceStack::new(
                CalmResistanceModel::holtrop_mennen(),
                Some(DynamicResistanceModel::lang_mao()),
            ),
            vessel_weight_t,
            cargo_weight_t,
            max_speed_ms,
            rudder_max_angle_deg: self.f64_or("MaxRudderAngle", DEFAULT_RUDDER_ANGLE_DEG)?,
            stop_if_no_energy: self.bool_or("StopIfNoEnergy", false)?,
            braking_thrust_available: self.bool_or("BrakingThrustAvailable", false)?,
            propellers,
            energy_sources: sources,
            start_time_s: self.f64_or("StartTime", 0.0)?,
        })
    }

    /// Build a ship with the route embedded in the descriptor under
    /// `PathPoints` (an array of `[lon, lat]` pairs).
    pub fn build(&self) -> Result<Ship> {
        let points = self.parse_path_points()?;
        let lines = lines_between(&points);
        Ship::new(self.build_parts()?, points, lines)
    }

    /// Build a ship on an externally computed route.
    pub fn build_with_path(&self, points: Vec<GeoPoint>, lines: Vec<GeoLine>) -> Result<Ship> {
        Ship::new(self.build_parts()?, points, lines)
    }

    fn parse_path_points(&self) -> Result<Vec<GeoPoint>> {
        let value = self.values.get("PathPoints").ok_or_else(|| {
            VesselError::Configuration {
                message: "PathPoints is not defined".to_string(),
            }
        })?;
        let rows = value.as_array().ok_or_else(|| VesselError::Configuration {
            message: "PathPoints must be an array of [lon, lat] pairs".to_string(),
        })?;
        let mut points = Vec::with_capacity(rows.len());
        for row in rows {
            let pair = row.as_array().filter(|a| a.len() >= 2).ok_or_else(|| {
                VesselError::Configuration {
                    message: "PathPoints entries must be [lon, lat]".to_string(),
                }
            })?;
            let lon = pair[0].as_f64().ok_or_else(|| VesselError::Configuration {
                message: "PathPoints longitudes must be numbers".to_string(),
            })?;
            let lat = pair[1].as_f64().ok_or_else(|| VesselError::Configuration {
                message: "PathPoints latitudes must be numbers".to_string(),
            })?;
            points.push(GeoPoint::new(lon, lat));
        }
        Ok(points)
    }
}

/// Connect consecutive points with lines.
pub fn lines_between(points: &[GeoPoint]) -> Vec<GeoLine> {
    points
        .windows(2)
        .map(|pair| GeoLine::new(pair[0].clone(), pair[1].clone()))
        .collect()
}

/// A complete descriptor for a mid-size diesel bulk carrier, used by the
/// test suites and as a documentation starting point.
pub fn example_descriptor() -> ShipDescriptor {
    let mut d = ShipDescriptor::new();
    d.set("ID", "bulk-1");
    d.set("WaterlineLength", 200.0);
    d.set("LengthBetweenPerpendiculars", 196.0);
    d.set("Beam", 32.0);
    d.set("MeanDraft", 10.0);
    d.set("BlockCoef", 0.7);
    d.set("MidshipSectionCoef", 0.98);
    d.set("MaxSpeed", 8.0);
    d.set("CargoWeight", 25_000.0);
    d.set("PropellerDiameter", 6.5);
    d.set("PropellerPitch", 5.2);
    d.set("PropellerExpandedAreaRatio", 0.6);
    d.set("PropellerBladesCount", 4);
    d.set("ShaftEfficiency", 0.99);
    d.set("GearboxRatio", 1.0);
    d.set("GearboxEfficiency", 0.98);
    d.set("FuelType", "HFO");
    d.set("TankSize", 2_000_000.0);
    d.set("TankInitialCapacityPercentage", 0.9);
    d.set("TankDepthOfDischage", 0.9);
    d.set(
        "EngineOperationalPowerSettings",
        serde_json::json!([2_000.0, 6_000.0, 9_000.0, 10_000.0]),
    );
    d.set(
        "EngineTierIIPropertiesPoints",
        serde_json::json!([[2_000.0, 40.0, 0.85], [10_000.0, 110.0, 0.88]]),
    );
    d.set("MaxRudderAngle", 35.0);
    d
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_hull_dimension_fails() {
        let mut d = example_descriptor();
        d.values.remove("WaterlineLength");
        d.set("PathPoints", serde_json::json!([[0.0, 0.0], [0.5, 0.0]]));
        let err = d.build().unwrap_err();
        assert!(matches!(err, VesselError::Configuration { .. }));
    }

    #[test]
    fn test_example_descriptor_builds() {
        let mut d = example_descriptor();
        d.set("PathPoints", serde_json::json!([[0.0, 0.0], [0.5, 0.0]]));
        let ship = d.build().unwrap();
        assert_eq!(ship.user_id(), "bulk-1");
        assert_eq!(ship.path_points().len(), 2);
        assert!(ship.hull().wetted_surface > 0.0);
        assert!(ship.hull().half_entrance_angle_deg > 0.0);
    }

    #[test]
    fn test_coefficient_completion() {
        let mut d = example_descriptor();
        d.values.remove("MidshipSectionCoef");
        d.set("PrismaticCoef", 0.72);
        d.set("PathPoints", serde_json::json!([[0.0, 0.0], [0.5, 0.0]]));
        let ship = d.build().unwrap();
        // C_M completed from C_B / C_P
        assert!((ship.hull().cm - 0.7 / 0.72).abs() < 1e-9);
    }

    #[test]
    fn test_displacement_derived_from_block() {
        let mut d = example_descriptor();
        d.set("PathPoints", serde_json::json!([[0.0, 0.0], [0.5, 0.0]]));
        let ship = d.build().unwrap();
        assert!(
            (ship.hull().volumetric_displacement - 200.0 * 32.0 * 10.0 * 0.7).abs() < 1e-6
        );
    }

    #[test]
    fn test_multi_propeller_assembly() {
        let mut d = example_descriptor();
        d.set("PropellerCount", 2);
        d.set("EnginesCountPerPropeller", 2);
        d.set("PathPoints", serde_json::json!([[0.0, 0.0], [0.5, 0.0]]));
        let ship = d.build().unwrap();
        assert_eq!(ship.propellers().len(), 2);
        assert_eq!(ship.propellers()[0].gearbox().engines().len(), 2);
        // Engine ids are unique across the whole ship
        let mut ids: Vec<u32> = ship
            .propellers()
            .iter()
            .flat_map(|p| p.gearbox().engines().iter().map(|e| e.id()))
            .collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 4);
    }

    #[test]
    fn test_electric_ship_gets_a_battery() {
        let mut d = example_descriptor();
        d.set("FuelType", "Electric");
        d.set("BatteryMaxCharge", 5000.0);
        d.set("PathPoints", serde_json::json!([[0.0, 0.0], [0.5, 0.0]]));
        let ship = d.build().unwrap();
        let source = ship.energy_sources()[0].borrow();
        assert!(matches!(&*source, EnergySource::Battery(_)));
        assert_eq!(source.fuel_type(), FuelType::Electric);
        drop(source);

        // Without a battery capacity the electric descriptor is incomplete
        let mut bad = example_descriptor();
        bad.set("FuelType", "Electric");
        bad.set("PathPoints", serde_json::json!([[0.0, 0.0], [0.5, 0.0]]));
        assert!(bad.build().is_err());
    }

    #[test]
    fn test_unknown_fuel_rejected() {
        let mut d = example_descriptor();
        d.set("FuelType", "Kerosene");
        d.set("PathPoints", serde_json::json!([[0.0, 0.0], [0.5, 0.0]]));
        assert!(d.build().is_err());
    }

    #[test]
    fn test_from_json_round_trip() {
        let json = serde_json::json!({
            "ID": "x",
            "MaxSpeed": 8.0,
        });
        let d = ShipDescriptor::from_json(json).unwrap();
        assert!(d.contains("ID"));
        assert!(!d.contains("Beam"));
    }
}
