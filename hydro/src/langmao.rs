//! Lang-Mao added resistance in waves and wind.
//!
//! The added resistance splits into a wave-reflection term dominating short
//! waves, a motion-induced term dominating wave lengths near the ship
//! length, and the head-wind drag on the lengthwise projection.
//!
//! ## Reference
//! - Lang, X. and Mao, W. (2020). "A semi-empirical model for ship speed
//!   loss prediction at head sea and its validation by full-scale
//!   measurements", Ocean Engineering, Vol. 209

use crate::environment::Environment;
use crate::hull::HullInput;
use crate::hydrology;
use crate::Result;
use libm::{ceil, cos, exp, floor, pow, sin, sqrt};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Longitudinal radius of gyration in terms of L_BP; the ITTC seakeeping
/// guideline value when the actual radius is unknown.
const K_YY: f64 = 0.25;

/// Added resistance breakdown (N).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DynamicResistanceBreakdown {
    pub wave_reflection: f64,
    pub wave_motion: f64,
    pub wind: f64,
    pub total: f64,
}

/// The Lang-Mao added resistance method.
#[derive(Debug, Clone, Default)]
pub struct LangMaoMethod {
    _private: (),
}

impl LangMaoMethod {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wave (reflection + motion) plus wind resistance at the given ship
    /// speed (m/s) and heading (degrees from north).
    pub fn total_resistance(
        &self,
        hull: &HullInput,
        env: &Environment,
        speed_ms: f64,
        heading_deg: f64,
    ) -> Result<DynamicResistanceBreakdown> {
        let wave_reflection = if env.has_waves() {
            self.wave_reflection_resistance(hull, env, speed_ms, heading_deg)
        } else {
            0.0
        };
        let wave_motion = if env.has_waves() {
            self.wave_motion_resistance(hull, env, speed_ms)
        } else {
            0.0
        };
        let wind = if env.has_wind() {
            self.wind_resistance(hull, env, heading_deg)
        } else {
            0.0
        };

        let total = wave_reflection + wave_motion + wind;
        debug!(wave_reflection, wave_motion, wind, total, "lang-mao breakdown");

        Ok(DynamicResistanceBreakdown {
            wave_reflection,
            wave_motion,
            wind,
            total,
        })
    }

    /// Resistance from waves reflecting off the bow.
    pub fn wave_reflection_resistance(
        &self,
        hull: &HullInput,
        env: &Environment,
        speed_ms: f64,
        heading_deg: f64,
    ) -> f64 {
        let rho = hydrology::water_density(env.salinity_ppt, env.temperature_c);
        let encounter = env.encounter_angle(heading_deg);

        // Bluntness of the entrance
        let e = hull.half_entrance_angle_deg.to_radians();
        let bf = 2.25 * sin(e) * sin(e);

        // Draft attenuation from the encounter wave number
        let alpha_t = {
            let k = 2.0 * std::f64::consts::PI / env.wave_length_m;
            let omega = env.wave_frequency_hz * 2.0 * std::f64::consts::PI;
            let ohm = speed_ms * omega / hydrology::G;
            let ke = k * pow(1.0 + ohm * cos(encounter), 2.0);
            1.0 - exp(-2.0 * ke * hull.mean_draft)
        };

        let fn_ = hydrology::froude_number(speed_ms, hull.lwl);
        let advance = {
            let c_u = (-310.0 * bf + 68.0).max(10.0);
            1.0 + c_u * fn_
        };

        let wave_amplitude = env.wave_height_m / 1.5;
        let length_ratio = env.wave_length_m / hull.lbp;

        0.5 * rho
            * hydrology::G
            * wave_amplitude
            * wave_amplitude
            * hull.beam
            * bf
            * alpha_t
            * advance
            * (0.19 / hull.cb)
            * pow(length_ratio, fn_ - 1.11)
    }

    /// Resistance from the wave-induced ship motions.
    pub fn wave_motion_resistance(&self, hull: &HullInput, env: &Environment, speed_ms: f64) -> f64 {
        let fr = hydrology::froude_number(speed_ms, hull.lwl);
        let cb = hull.cb;

        let a1 = 60.3 * pow(cb, 1.34) * pow(1.0 / cb, 1.0 + fr);

        let omega_delta = {
            let wave_angular = env.wave_frequency_hz * 2.0 * std::f64::consts::PI;
            let c1 = 0.4567 * (cb / K_YY) + 1.689;
            let term1 = sqrt(hull.lbp / hydrology::G);
            let term2 = pow(K_YY / hull.lbp, 1.0 / c1);
            let dom = 1.09 + ceil(K_YY / 0.25) * 0.08;
            let fr_eff = if fr < 0.05 { 0.05 } else { fr };
            term1 * term2 * pow(fr_eff, 0.143) * wave_angular / dom
        };

        let a2 = if fr < 0.12 {
            0.0072 + 0.24 * fr
        } else {
            pow(fr, -1.05 * cb + 2.3)
                * exp((-2.0 - ceil(K_YY / 0.25) - floor(K_YY / 0.25)) * fr)
        };

        let b1 = if omega_delta < 1.0 && cb < 0.75 {
            (19.77 * (cb / K_YY) - 36.39) / ceil(K_YY / 0.25)
        } else if omega_delta < 1.0 {
            11.0 / ceil(K_YY / 0.25)
        } else if cb < 0.75 {
            -12.5 / ceil(K_YY / 0.25)
        } else {
            -5.5 / ceil(K_YY / 0.25)
        };

        let d1 = if omega_delta < 1.0 && cb < 0.75 {
            14.0
        } else if omega_delta < 1.0 {
            566.0 * pow(hull.lbp / hull.beam, -2.66) * 2.0
        } else {
            -566.0 * pow(hull.lbp / hull.beam, -2.66) * 6.0
        };

        let rho = hydrology::water_density(env.salinity_ppt, env.temperature_c);
        let wave_amplitude = env.wave_height_m / 1.5;

        4.0 * rho
            * hydrology::G
            * wave_amplitude
            * wave_amplitude
            * (hull.beam * hull.beam / hull.lbp)
            * pow(omega_delta, b1)
            * exp((b1 / d1) * (1.0 - pow(omega_delta, d1)))
            * a1
            * a2
    }

    /// Head-wind drag on the lengthwise projection.
    pub fn wind_resistance(&self, hull: &HullInput, env: &Environment, heading_deg: f64) -> f64 {
        let heading = heading_deg.to_radians();
        let relative_wind =
            env.wind_east_ms * sin(heading) + env.wind_north_ms * cos(heading);
        0.5 * self.drag_coefficient() * relative_wind * hull.lengthwise_projection_area
    }

    /// Head-on wind drag coefficient.
    fn drag_coefficient(&self) -> f64 {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seaway() -> Environment {
        let mut env = Environment::calm(35.0, 15.0);
        env.wave_height_m = 2.0;
        env.wave_frequency_hz = 0.1;
        env.wave_angular_frequency = 2.0 * std::f64::consts::PI * 0.1;
        env.wind_north_ms = -8.0; // blowing south
        env.wind_east_ms = 0.0;
        env.wave_length_m = 8.0 / 0.1;
        env
    }

    #[test]
    fn test_calm_water_adds_nothing() {
        let method = LangMaoMethod::new();
        let hull = HullInput::example_bulk_carrier();
        let env = Environment::calm(35.0, 15.0);
        let r = method.total_resistance(&hull, &env, 8.0, 0.0).unwrap();
        assert_eq!(r.total, 0.0);
    }

    #[test]
    fn test_waves_add_resistance() {
        let method = LangMaoMethod::new();
        let hull = HullInput::example_bulk_carrier();
        let env = seaway();
        // Steaming north into a southward wind/sea
        let r = method.total_resistance(&hull, &env, 8.0, 0.0).unwrap();
        assert!(r.wave_reflection > 0.0);
        assert!(r.wave_motion > 0.0);
        assert!(r.total.is_finite());
    }

    #[test]
    fn test_wind_projection_sign() {
        let method = LangMaoMethod::new();
        let hull = HullInput::example_bulk_carrier();
        let mut env = Environment::calm(35.0, 15.0);
        env.wind_north_ms = 10.0;

        // Tail wind heading north is positive projection, head wind negative
        let tail = method.wind_resistance(&hull, &env, 0.0);
        let head = method.wind_resistance(&hull, &env, 180.0);
        assert!(tail > 0.0);
        assert!(head < 0.0);
    }

    #[test]
    fn test_higher_waves_cost_more() {
        let method = LangMaoMethod::new();
        let hull = HullInput::example_bulk_carrier();
        let mut low = seaway();
        low.wave_height_m = 1.0;
        let mut high = seaway();
        high.wave_height_m = 3.0;

        let r_low = method.total_resistance(&hull, &low, 8.0, 0.0).unwrap();
        let r_high = method.total_resistance(&hull, &high, 8.0, 0.0).unwrap();
        assert!(r_high.wave_reflection > r_low.wave_reflection);
        assert!(r_high.wave_motion > r_low.wave_motion);
    }
}
