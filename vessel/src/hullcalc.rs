//! Hull-form derivations for partially specified hulls.
//!
//! The descriptor may omit quantities a naval architect can regress from
//! the rest of the hull; these helpers fill the gaps the way the standard
//! design literature does.

use fairway_hydro::{hydrology, Environment, HullInput};
use libm::{exp, log, pow, sqrt, tan};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Wetted-surface estimation methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WetSurfaceMethod {
    Holtrop,
    Schenzle,
    Cargo,
    Trawlers,
}

/// Block-coefficient regressions in the Froude number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockCoefMethod {
    Ayre,
    Jensen,
    Schneekluth,
}

/// Waterplane-area coefficient families by section shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WaterplaneCoefMethod {
    UShape,
    AverageSection,
    VSection,
    GeneralCargo,
    Container,
}

/// Wetted surface by Holtrop's regression (on L_WL).
pub fn wet_surface_holtrop(hull: &HullInput) -> f64 {
    hull.lwl
        * (2.0 * hull.mean_draft + hull.beam)
        * sqrt(hull.cm)
        * (0.453 + 0.4425 * hull.cb - 0.2862 * hull.cm - 0.003467 * hull.beam / hull.mean_draft
            + 0.3696 * hull.cwp)
        + 2.38 * hull.bulbous_bow_area / hull.cb
}

/// Wetted surface by Schenzle's section-shape formula.
pub fn wet_surface_schenzle(hull: &HullInput) -> f64 {
    let b = hull.cwp * hull.beam / hull.mean_draft;
    let c = hull.lwl / hull.beam / hull.cm;
    let a1 = (1.0 + b / 2.0 - sqrt(1.0 + b * b / 4.0)) * (2.0 / b);
    let a2 = 1.0 + c - sqrt(1.0 + c * c);
    let cn1 = 0.8 + 0.2 * b;
    let cn2 = 1.15 + 0.2833 * c;
    let cpx = hull.cb / hull.cm;
    let cpz = hull.cb / hull.cwp;
    let c1 = 1.0 - a1 * sqrt(1.0 - pow(2.0 * cpz - 1.0, cn1));
    let c2 = 1.0 - a2 * sqrt(1.0 - pow(2.0 * cpx - 1.0, cn2));
    (2.0 + c1 * b + 2.0 * c2 / c) * hull.lwl * hull.mean_draft
}

/// Wetted surface by the selected method.
pub fn wet_surface(hull: &HullInput, method: WetSurfaceMethod) -> f64 {
    match method {
        WetSurfaceMethod::Holtrop => wet_surface_holtrop(hull),
        WetSurfaceMethod::Schenzle => wet_surface_schenzle(hull),
        WetSurfaceMethod::Cargo => {
            (hull.volumetric_displacement / hull.beam)
                * (1.7 / (hull.cb - 0.2 * (hull.cb - 0.65)))
                + hull.beam / hull.mean_draft
        }
        WetSurfaceMethod::Trawlers => {
            (hull.volumetric_displacement / hull.beam) * (1.7 / hull.cb)
                + (hull.beam / hull.mean_draft) * (0.92 + 0.092 / hull.cb)
        }
    }
}

/// Block coefficient from the volumetric displacement on L_WL.
pub fn block_coef_from_displacement(hull: &HullInput) -> f64 {
    hull.volumetric_displacement / (hull.beam * hull.mean_draft * hull.lwl)
}

/// Volumetric displacement from the block coefficient.
pub fn displacement_from_block_coef(hull: &HullInput) -> f64 {
    hull.lwl * hull.beam * hull.mean_draft * hull.cb
}

/// Volumetric displacement from the static weight afloat.
pub fn displacement_from_weight(total_weight_kg: f64, env: &Environment) -> f64 {
    total_weight_kg / hydrology::water_density(env.salinity_ppt, env.temperature_c)
}

/// Block coefficient regression at a design speed.
pub fn block_coef_at_speed(hull: &HullInput, speed_ms: f64, method: BlockCoefMethod) -> f64 {
    let ayre = |fn_: f64| 1.06 - 1.68 * fn_;
    let fn_ = hydrology::froude_number(speed_ms, hull.lwl);
    match method {
        BlockCoefMethod::Ayre => ayre(fn_),
        BlockCoefMethod::Jensen => {
            if fn_ > 0.15 && fn_ < 0.32 {
                -4.22 + 27.8 * sqrt(fn_) - 39.1 * fn_ + 46.6 * pow(fn_, 3.0)
            } else {
                warn!(
                    froude = fn_,
                    "froude number outside the Jensen method range, using Ayre instead"
                );
                ayre(fn_)
            }
        }
        BlockCoefMethod::Schneekluth => {
            if fn_ > 0.14 && fn_ < 0.32 {
                let fn_c = fn_.min(0.3);
                let cb = (0.14 / fn_c) * ((hull.lwl * hull.beam + 20.0) / 26.0);
                cb.clamp(0.48, 0.85)
            } else {
                warn!(
                    froude = fn_,
                    "froude number outside the Schneekluth method range, using Ayre instead"
                );
                ayre(fn_)
            }
        }
    }
}

/// C_M = C_B / C_P.
pub fn midship_coef(cb: f64, cp: f64) -> f64 {
    cb / cp
}

/// C_P = C_B / C_M.
pub fn prismatic_coef(cb: f64, cm: f64) -> f64 {
    cb / cm
}

/// C_B = C_M · C_P.
pub fn block_coef_from_sections(cm: f64, cp: f64) -> f64 {
    cm * cp
}

/// Waterplane-area coefficient by section family.
pub fn waterplane_coef(cb: f64, cp: f64, method: WaterplaneCoefMethod) -> f64 {
    match method {
        WaterplaneCoefMethod::UShape => 0.95 * cp + 0.17 * pow(1.0 - cp, 1.0 / 3.0),
        WaterplaneCoefMethod::AverageSection => (1.0 + 2.0 * cb) / 3.0,
        WaterplaneCoefMethod::VSection => sqrt(cb) - 0.025,
        WaterplaneCoefMethod::GeneralCargo => 0.763 * (cp + 0.34),
        WaterplaneCoefMethod::Container => 3.226 * (cp - 0.36),
    }
}

/// Half angle of waterline entrance i_E (degrees) by Holtrop's regression.
pub fn half_entrance_angle_deg(hull: &HullInput) -> f64 {
    1.0 + 89.0
        * exp(
            -pow(hull.lwl / hull.beam, 0.80856)
                * pow(1.0 - hull.cwp, 0.30484)
                * pow(1.0 - hull.cp - 0.0225 * hull.lcb_percent, 0.6367)
                * pow(hull.run_length() / hull.beam, 0.34574)
                * pow(
                    100.0 * hull.volumetric_displacement / pow(hull.lwl, 3.0),
                    0.16302,
                ),
        )
}

/// Length of entrance (m) from the half entrance angle.
pub fn entrance_length(hull: &HullInput) -> f64 {
    hull.beam / tan(hull.half_entrance_angle_deg.to_radians())
}

/// Surge added mass (kg) by the prolate-spheroid coefficient.
pub fn surge_added_mass_kg(hull: &HullInput, env: &Environment) -> f64 {
    let half_length = hull.lwl * 0.5;
    let e = sqrt(
        1.0 - ((3.0 * hull.volumetric_displacement)
            / (2.0 * std::f64::consts::PI * half_length))
            / pow(half_length, 2.0),
    );
    let alpha = ((2.0 * (1.0 - e * e)) / pow(e, 3.0)) * (0.5 * log((1.0 + e) / (1.0 - e)) - e);
    let k1 = alpha / (2.0 - alpha);
    let rho = hydrology::water_density(env.salinity_ppt, env.temperature_c);
    rho * hull.volumetric_displacement * k1
}

/// Transverse added weight (kg) of the entrained water.
pub fn added_weight_kg(hull: &HullInput, env: &Environment) -> f64 {
    let rho = hydrology::water_density(env.salinity_ppt, env.temperature_c);
    std::f64::consts::PI * rho * hull.mean_draft * hull.mean_draft * hull.beam * hull.cm / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn hull() -> HullInput {
        HullInput::example_bulk_carrier()
    }

    #[test]
    fn test_holtrop_wet_surface_plausible() {
        let s = wet_surface_holtrop(&hull());
        // A 200 m bulk carrier wets roughly 8000 m²
        assert!(s > 6000.0 && s < 10000.0, "S = {}", s);
    }

    #[test]
    fn test_schenzle_agrees_roughly_with_holtrop() {
        let h = hull();
        let a = wet_surface_holtrop(&h);
        let b = wet_surface_schenzle(&h);
        assert!((a - b).abs() / a < 0.2, "holtrop {} vs schenzle {}", a, b);
    }

    #[test]
    fn test_coefficient_identities() {
        assert_relative_eq!(midship_coef(0.7, 0.72) * 0.72, 0.7, epsilon = 1e-12);
        assert_relative_eq!(prismatic_coef(0.7, 0.98), 0.7 / 0.98);
        assert_relative_eq!(block_coef_from_sections(0.98, 0.72), 0.98 * 0.72);
    }

    #[test]
    fn test_block_from_displacement_round_trip() {
        let h = hull();
        let vol = displacement_from_block_coef(&h);
        let mut h2 = h.clone();
        h2.volumetric_displacement = vol;
        assert_relative_eq!(block_coef_from_displacement(&h2), h.cb, epsilon = 1e-12);
    }

    #[test]
    fn test_entrance_angle_in_physical_band() {
        let ie = half_entrance_angle_deg(&hull());
        assert!(ie > 1.0 && ie < 90.0, "i_E = {}", ie);
    }

    #[test]
    fn test_added_masses_positive() {
        let env = Environment::calm(35.0, 15.0);
        let h = hull();
        assert!(surge_added_mass_kg(&h, &env) > 0.0);
        assert!(added_weight_kg(&h, &env) > 0.0);
        // Surge added mass is a small fraction of the displacement
        let displacement_kg = h.volumetric_displacement * 1025.0;
        assert!(surge_added_mass_kg(&h, &env) < 0.2 * displacement_kg);
    }

    #[test]
    fn test_waterplane_families_are_distinct() {
        let u = waterplane_coef(0.7, 0.72, WaterplaneCoefMethod::UShape);
        let v = waterplane_coef(0.7, 0.72, WaterplaneCoefMethod::VSection);
        assert!(u > 0.0 && u < 1.0);
        assert!(v > 0.0 && v < 1.0);
        assert!((u - v).abs() > 1e-3);
    }
}
