//! Holtrop & Mennen calm-water resistance.
//!
//! Implements the full empirical decomposition for displacement hulls:
//! friction with form factor, appendages, wave making (with the blended
//! intermediate speed range), bulbous bow, immersed transom, model-ship
//! correlation with the roughness addition, and air resistance. The same
//! regressions supply the propulsion-coupling quantities: wake fraction,
//! thrust deduction, hull efficiency, relative rotative efficiency and the
//! speed of advance.
//!
//! ## References
//! - Holtrop, J. and Mennen, G.G.J. (1982). "An Approximate Power
//!   Prediction Method", International Shipbuilding Progress, Vol. 29
//! - Holtrop, J. (1984). "A Statistical Re-analysis of Resistance and
//!   Propulsion Data", International Shipbuilding Progress, Vol. 31

use crate::environment::Environment;
use crate::hull::HullInput;
use crate::hydrology;
use crate::{HydroError, Result};
use libm::{cos, exp, pow, sqrt};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Default air drag coefficient over the above-water transverse area
const AIR_DRAG_COEFFICIENT: f64 = 0.8;

/// Roughness above which the correlation allowance grows (m)
const STANDARD_ROUGHNESS_M: f64 = 150.0e-6;

/// Per-term calm-water resistance breakdown (all in N).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CalmResistanceBreakdown {
    pub friction: f64,
    pub appendage: f64,
    pub wave: f64,
    pub bulbous_bow: f64,
    pub transom: f64,
    pub correlation: f64,
    pub air: f64,
    pub total: f64,
}

/// Validity flags from the applicability check.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ApplicabilityFlags {
    pub froude_in_range: bool,
    pub cp_in_range: bool,
    pub length_beam_in_range: bool,
}

impl ApplicabilityFlags {
    pub fn all_valid(&self) -> bool {
        self.froude_in_range && self.cp_in_range && self.length_beam_in_range
    }
}

/// The Holtrop & Mennen calm-water method.
#[derive(Debug, Clone, Default)]
pub struct HoltropMennenMethod {
    _private: (),
}

impl HoltropMennenMethod {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check the regression validity envelope. Out-of-range hulls are
    /// warned about, never rejected: the regression keeps extrapolating.
    pub fn assess_applicability(
        &self,
        hull: &HullInput,
        speed_ms: f64,
    ) -> ApplicabilityFlags {
        let fn_ = hydrology::froude_number(speed_ms, hull.lwl);
        let lb = hull.lwl / hull.beam;

        let flags = ApplicabilityFlags {
            froude_in_range: fn_ <= 0.45,
            cp_in_range: (0.55..=0.85).contains(&hull.cp),
            length_beam_in_range: (3.9..=9.5).contains(&lb),
        };

        if !flags.froude_in_range {
            warn!(froude = fn_, "speed is outside the method range, calculations may not be accurate");
        }
        if !flags.cp_in_range {
            warn!(cp = hull.cp, "prismatic coefficient is outside the method range, calculations may not be accurate");
        }
        if !flags.length_beam_in_range {
            warn!(l_over_b = lb, "length/beam is outside the method range, calculations may not be accurate");
        }

        flags
    }

    /// Sum of every calm-water term at the given speed (m/s).
    pub fn total_resistance(
        &self,
        hull: &HullInput,
        env: &Environment,
        speed_ms: f64,
    ) -> Result<CalmResistanceBreakdown> {
        validate(hull, speed_ms)?;
        self.assess_applicability(hull, speed_ms);

        let friction = self.friction_resistance(hull, env, speed_ms);
        let appendage = self.appendage_resistance(hull, env, speed_ms);
        let wave = self.wave_resistance(hull, env, speed_ms);
        let bulbous_bow = self.bulbous_bow_resistance(hull, env, speed_ms);
        let transom = self.transom_resistance(hull, env, speed_ms);
        let correlation = self.correlation_resistance(hull, env, speed_ms);
        let air = self.air_resistance(hull, speed_ms);

        let total = friction + appendage + wave + bulbous_bow + transom + correlation + air;
        if !total.is_finite() {
            return Err(HydroError::NumericInvariant {
                message: format!("calm resistance is not finite at speed {speed_ms}"),
            });
        }

        debug!(
            friction,
            appendage, wave, bulbous_bow, transom, correlation, air, total,
            "holtrop calm-water breakdown"
        );

        Ok(CalmResistanceBreakdown {
            friction,
            appendage,
            wave,
            bulbous_bow,
            transom,
            correlation,
            air,
            total,
        })
    }

    /// ITTC-57 friction with the Holtrop form factor 1+k₁.
    pub fn friction_resistance(&self, hull: &HullInput, env: &Environment, speed_ms: f64) -> f64 {
        let rho = hydrology::water_density(env.salinity_ppt, env.temperature_c);
        let rn = hydrology::reynolds_number(speed_ms, hull.lwl, env.salinity_ppt, env.temperature_c);
        let cf = hydrology::ittc57_friction_coefficient(rn);
        0.5 * rho * speed_ms * speed_ms * hull.wetted_surface * cf * self.form_factor(hull)
    }

    /// Form factor 1+k₁.
    pub fn form_factor(&self, hull: &HullInput) -> f64 {
        let t_over_l = hull.mean_draft / hull.lwl;
        let c12 = if t_over_l > 0.05 {
            pow(t_over_l, 0.2228446)
        } else if t_over_l > 0.02 {
            48.20 * pow(t_over_l - 0.02, 2.078) + 0.479948
        } else {
            0.479948
        };
        let c13 = 1.0 + 0.003 * hull.stern_shape.coefficient();
        let lr = hull.run_length();

        c13 * (0.93
            + c12
                * pow(hull.beam / lr, 0.92497)
                * pow(0.95 - hull.cp, -0.521448)
                * pow(1.0 - hull.cp + 0.0225 * hull.lcb_percent, 0.6906))
    }

    /// Appendage resistance through the surface-weighted 1+k₂ factor.
    pub fn appendage_resistance(&self, hull: &HullInput, env: &Environment, speed_ms: f64) -> f64 {
        let s_app = hull.total_appendage_surface();
        if s_app <= 0.0 {
            return 0.0;
        }
        let rho = hydrology::water_density(env.salinity_ppt, env.temperature_c);
        let rn = hydrology::reynolds_number(speed_ms, hull.lwl, env.salinity_ppt, env.temperature_c);
        let cf = hydrology::ittc57_friction_coefficient(rn);
        0.5 * rho * speed_ms * speed_ms * s_app * hull.equivalent_appendage_factor() * cf
    }

    /// Wave-making and wave-breaking resistance, piecewise in Froude number
    /// with linear blending across the 0.40..0.55 hump region.
    pub fn wave_resistance(&self, hull: &HullInput, env: &Environment, speed_ms: f64) -> f64 {
        let fn_ = hydrology::froude_number(speed_ms, hull.lwl);
        if fn_ <= 0.0 {
            return 0.0;
        }
        if fn_ < 0.40 {
            self.wave_resistance_low(hull, env, fn_)
        } else if fn_ > 0.55 {
            self.wave_resistance_high(hull, env, fn_)
        } else {
            let low = self.wave_resistance_low(hull, env, 0.40);
            let high = self.wave_resistance_high(hull, env, 0.55);
            low + (10.0 * fn_ - 4.0) * (high - low) / 1.5
        }
    }

    fn wave_resistance_low(&self, hull: &HullInput, env: &Environment, fn_: f64) -> f64 {
        let rho = hydrology::water_density(env.salinity_ppt, env.temperature_c);
        let l = hull.lwl;
        let b = hull.beam;
        let t = hull.mean_draft;

        let b_over_l = b / l;
        let c7 = if b_over_l < 0.11 {
            0.229577 * pow(b_over_l, 1.0 / 3.0)
        } else if b_over_l < 0.25 {
            b_over_l
        } else {
            0.5 - 0.0625 * l / b
        };

        let c1 = 2223105.0
            * pow(c7, 3.78613)
            * pow(t / b, 1.07961)
            * pow(90.0 - hull.half_entrance_angle_deg, -1.37565);
        let c2 = self.bulb_interference_coefficient(hull);
        let c5 = 1.0 - 0.8 * hull.immersed_transom_area / (b * t * hull.cm);

        let m1 = 0.0140407 * l / t
            - 1.75254 * pow(hull.volumetric_displacement, 1.0 / 3.0) / l
            - 4.79323 * b / l
            - c16(hull.cp);

        let cw = c1
            * c2
            * c5
            * exp(m1 * pow(fn_, -0.9) + self.m4(hull, fn_) * cos(self.lambda(hull) * pow(fn_, -2.0)));

        cw * hull.volumetric_displacement * rho * hydrology::G
    }

    fn wave_resistance_high(&self, hull: &HullInput, env: &Environment, fn_: f64) -> f64 {
        let rho = hydrology::water_density(env.salinity_ppt, env.temperature_c);
        let l = hull.lwl;
        let b = hull.beam;

        let c17 = 6919.3
            * pow(hull.cm, -1.3346)
            * pow(hull.volumetric_displacement / (l * l * l), 2.00977)
            * pow(l / b - 2.0, 1.40692);
        let m3 = -7.2035 * pow(b / l, 0.326869) * pow(hull.mean_draft / b, 0.605375);
        let c2 = self.bulb_interference_coefficient(hull);
        let c5 = 1.0 - 0.8 * hull.immersed_transom_area / (b * hull.mean_draft * hull.cm);

        let cw = c17
            * c2
            * c5
            * exp(m3 * pow(fn_, -0.9) + self.m4(hull, fn_) * cos(self.lambda(hull) * pow(fn_, -2.0)));

        cw * hull.volumetric_displacement * rho * hydrology::G
    }

    fn lambda(&self, hull: &HullInput) -> f64 {
        let l_over_b = hull.lwl / hull.beam;
        if l_over_b < 12.0 {
            1.446 * hull.cp - 0.03 * l_over_b
        } else {
            1.446 * hull.cp - 0.36
        }
    }

    fn m4(&self, hull: &HullInput, fn_: f64) -> f64 {
        let l = hull.lwl;
        let l3_over_vol = l * l * l / hull.volumetric_displacement;
        let c15 = if l3_over_vol < 512.0 {
            -1.69385
        } else if l3_over_vol > 1727.0 {
            0.0
        } else {
            -1.69385 + (l / pow(hull.volumetric_displacement, 1.0 / 3.0) - 8.0) / 2.36
        };
        c15 * 0.4 * exp(-0.034 * pow(fn_, -3.29))
    }

    /// The bulbous-bow interference coefficient c₂ = exp(−1.89 √c₃).
    fn bulb_interference_coefficient(&self, hull: &HullInput) -> f64 {
        if hull.bulbous_bow_area <= 0.0 {
            return 1.0;
        }
        let c3 = 0.56 * pow(hull.bulbous_bow_area, 1.5)
            / (hull.beam
                * hull.mean_draft
                * (0.31 * sqrt(hull.bulbous_bow_area) + hull.draft_forward
                    - hull.bulbous_center_height));
        exp(-1.89 * sqrt(c3))
    }

    /// Additional pressure resistance of the bulbous bow near the surface.
    pub fn bulbous_bow_resistance(&self, hull: &HullInput, env: &Environment, speed_ms: f64) -> f64 {
        if hull.bulbous_bow_area <= 0.0 || speed_ms <= 0.0 {
            return 0.0;
        }
        let rho = hydrology::water_density(env.salinity_ppt, env.temperature_c);
        let pb = 0.56 * sqrt(hull.bulbous_bow_area)
            / (hull.draft_forward - 1.5 * hull.bulbous_center_height);
        let fni = speed_ms
            / sqrt(
                hydrology::G
                    * (hull.draft_forward
                        - hull.bulbous_center_height
                        - 0.25 * sqrt(hull.bulbous_bow_area))
                    + 0.15 * speed_ms * speed_ms,
            );
        0.11 * exp(-3.0 * pow(pb, -2.0)) * pow(fni, 3.0) * pow(hull.bulbous_bow_area, 1.5) * rho
            * hydrology::G
            / (1.0 + fni * fni)
    }

    /// Immersed transom pressure resistance.
    pub fn transom_resistance(&self, hull: &HullInput, env: &Environment, speed_ms: f64) -> f64 {
        if hull.immersed_transom_area <= 0.0 || speed_ms <= 0.0 {
            return 0.0;
        }
        let rho = hydrology::water_density(env.salinity_ppt, env.temperature_c);
        let fnt = speed_ms
            / sqrt(
                2.0 * hydrology::G * hull.immersed_transom_area
                    / (hull.beam + hull.beam * hull.cwp),
            );
        let c6 = if fnt < 5.0 { 0.2 * (1.0 - 0.2 * fnt) } else { 0.0 };
        0.5 * rho * speed_ms * speed_ms * hull.immersed_transom_area * c6
    }

    /// Model-ship correlation allowance, with the roughness addition when
    /// the hull is rougher than the 150 µm standard.
    pub fn correlation_resistance(&self, hull: &HullInput, env: &Environment, speed_ms: f64) -> f64 {
        let rho = hydrology::water_density(env.salinity_ppt, env.temperature_c);
        let l = hull.lwl;
        let tf_over_l = hull.draft_forward / l;
        let c4 = if tf_over_l <= 0.04 { tf_over_l } else { 0.04 };
        let c2 = self.bulb_interference_coefficient(hull);

        let mut ca = 0.006 * pow(l + 100.0, -0.16) - 0.00205
            + 0.003 * sqrt(l / 7.5) * pow(hull.cb, 4.0) * c2 * (0.04 - c4);

        if hull.surface_roughness_m > STANDARD_ROUGHNESS_M {
            ca += (0.105 * pow(hull.surface_roughness_m, 1.0 / 3.0) - 0.005579)
                / pow(l, 1.0 / 3.0);
        }

        0.5 * rho
            * speed_ms
            * speed_ms
            * (hull.wetted_surface + hull.total_appendage_surface())
            * ca
    }

    /// Still-air resistance over the above-water transverse area.
    pub fn air_resistance(&self, hull: &HullInput, speed_ms: f64) -> f64 {
        0.5 * hydrology::AIR_DENSITY
            * AIR_DRAG_COEFFICIENT
            * hull.above_water_transverse_area
            * speed_ms
            * speed_ms
    }

    /// Total viscous resistance coefficient C_V = (1+k₁)C_F + C_A,
    /// feeding the wake-fraction regression.
    fn viscous_coefficient(&self, hull: &HullInput, env: &Environment, speed_ms: f64) -> f64 {
        let rn = hydrology::reynolds_number(speed_ms, hull.lwl, env.salinity_ppt, env.temperature_c);
        let cf = hydrology::ittc57_friction_coefficient(rn);
        let l = hull.lwl;
        let tf_over_l = hull.draft_forward / l;
        let c4 = if tf_over_l <= 0.04 { tf_over_l } else { 0.04 };
        let c2 = self.bulb_interference_coefficient(hull);
        let ca = 0.006 * pow(l + 100.0, -0.16) - 0.00205
            + 0.003 * sqrt(l / 7.5) * pow(hull.cb, 4.0) * c2 * (0.04 - c4);
        self.form_factor(hull) * cf + ca
    }

    /// Single-screw wake fraction w by the 1984 re-analysis.
    pub fn wake_fraction(&self, hull: &HullInput, env: &Environment, speed_ms: f64) -> f64 {
        let l = hull.lwl;
        let b = hull.beam;
        let ta = hull.draft_aft;
        let d = hull.propeller_diameter;
        let s = hull.wetted_surface;
        let cv = self.viscous_coefficient(hull, env, speed_ms.max(0.1));

        let c8 = if b / ta < 5.0 {
            b * s / (l * d * ta)
        } else {
            s * (7.0 * b / ta - 25.0) / (l * d * (b / ta - 3.0))
        };
        let c9 = if c8 < 28.0 { c8 } else { 32.0 - 16.0 / (c8 - 24.0) };
        let c11 = if ta / d < 2.0 {
            ta / d
        } else {
            0.0833333 * pow(ta / d, 3.0) + 1.33333
        };
        let c19 = if hull.cp < 0.7 {
            0.12997 / (0.95 - hull.cb) - 0.11056 / (0.95 - hull.cp)
        } else {
            0.18567 / (1.3571 - hull.cm) - 0.71276 + 0.38648 * hull.cp
        };
        let c20 = 1.0 + 0.015 * hull.stern_shape.coefficient();
        let cp1 = 1.45 * hull.cp - 0.315 - 0.0225 * hull.lcb_percent;

        let w = c9 * c20 * cv * l / ta * (0.050776 + 0.93405 * c11 * cv / (1.0 - cp1))
            + 0.27915 * c20 * sqrt(b / (l * (1.0 - cp1)))
            + c19 * c20;

        w.clamp(0.0, 0.6)
    }

    /// Single-screw thrust deduction fraction t.
    pub fn thrust_deduction_fraction(&self, hull: &HullInput) -> f64 {
        let l = hull.lwl;
        let b = hull.beam;
        let t = 0.25014 * pow(b / l, 0.28956)
            * pow(sqrt(b * hull.mean_draft) / hull.propeller_diameter, 0.2624)
            / pow(1.0 - hull.cp + 0.0225 * hull.lcb_percent, 0.01762)
            + 0.0015 * hull.stern_shape.coefficient();
        t.clamp(0.0, 0.5)
    }

    /// Hull efficiency η_H = (1−t)/(1−w).
    pub fn hull_efficiency(&self, hull: &HullInput, env: &Environment, speed_ms: f64) -> f64 {
        let w = self.wake_fraction(hull, env, speed_ms);
        let t = self.thrust_deduction_fraction(hull);
        (1.0 - t) / (1.0 - w)
    }

    /// Relative rotative efficiency η_R.
    pub fn propeller_rotation_efficiency(&self, hull: &HullInput) -> f64 {
        0.9922 - 0.05908 * hull.propeller_expanded_area_ratio
            + 0.07424 * (hull.cp - 0.0225 * hull.lcb_percent)
    }

    /// Speed of advance into the propeller disk V_A = V(1−w).
    pub fn speed_of_advance(&self, hull: &HullInput, env: &Environment, speed_ms: f64) -> f64 {
        speed_ms * (1.0 - self.wake_fraction(hull, env, speed_ms))
    }
}

fn validate(hull: &HullInput, speed_ms: f64) -> Result<()> {
    if !speed_ms.is_finite() || speed_ms < 0.0 {
        return Err(HydroError::InvalidSpeed { speed: speed_ms });
    }
    let mut issues = Vec::new();
    if hull.lwl <= 0.0 {
        issues.push("waterline length must be positive");
    }
    if hull.beam <= 0.0 {
        issues.push("beam must be positive");
    }
    if hull.mean_draft <= 0.0 {
        issues.push("mean draft must be positive");
    }
    if hull.wetted_surface <= 0.0 {
        issues.push("wetted surface must be positive");
    }
    if hull.volumetric_displacement <= 0.0 {
        issues.push("volumetric displacement must be positive");
    }
    if !(0.0..=1.0).contains(&hull.cb) || hull.cb == 0.0 {
        issues.push("block coefficient must be in (0, 1]");
    }
    if !(0.0..=1.0).contains(&hull.cp) || hull.cp == 0.0 {
        issues.push("prismatic coefficient must be in (0, 1]");
    }
    if issues.is_empty() {
        Ok(())
    } else {
        Err(HydroError::InvalidHullParameters {
            message: issues.join("; "),
        })
    }
}

/// Holtrop helper coefficient c₁₆.
fn c16(cp: f64) -> f64 {
    if cp < 0.8 {
        8.07981 * cp - 13.8673 * cp * cp + 6.984388 * cp * cp * cp
    } else {
        1.73014 - 0.7067 * cp
    }
}
