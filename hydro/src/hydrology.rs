//! Seawater property helpers and non-dimensional numbers.

use libm::{log, sqrt};

/// Standard gravity (m/s²)
pub const G: f64 = 9.80665;

/// Air density at sea level (kg/m³)
pub const AIR_DENSITY: f64 = 1.225;

/// Seawater density (kg/m³) from salinity (ppt) and temperature (°C) by the
/// EOS-80 one-atmosphere equation of state.
pub fn water_density(salinity_ppt: f64, temperature_c: f64) -> f64 {
    let t = temperature_c;
    let s = salinity_ppt.max(0.0);

    // Pure water part
    let rho_w = 999.842594 + 6.793952e-2 * t - 9.095290e-3 * t * t
        + 1.001685e-4 * t.powi(3)
        - 1.120083e-6 * t.powi(4)
        + 6.536332e-9 * t.powi(5);

    let a = 8.24493e-1 - 4.0899e-3 * t + 7.6438e-5 * t * t - 8.2467e-7 * t.powi(3)
        + 5.3875e-9 * t.powi(4);
    let b = -5.72466e-3 + 1.0227e-4 * t - 1.6546e-6 * t * t;
    let c = 4.8314e-4;

    rho_w + a * s + b * s * sqrt(s) + c * s * s
}

/// Kinematic viscosity of water (m²/s) from salinity (ppt) and temperature
/// (°C), a quadratic fit of the ITTC water-property tables with linear
/// interpolation in salinity between fresh water and 35 ppt seawater.
pub fn kinematic_viscosity(salinity_ppt: f64, temperature_c: f64) -> f64 {
    let t = temperature_c;
    let nu_fresh = (1.7918 - 0.05148 * t + 0.000675 * t * t) * 1e-6;
    let nu_sea = (1.7775 - 0.04855 * t + 0.000618 * t * t) * 1e-6;
    let frac = (salinity_ppt / 35.0).clamp(0.0, 2.0);
    nu_fresh + (nu_sea - nu_fresh) * frac
}

/// Froude number `V / sqrt(g·L)`.
pub fn froude_number(speed_ms: f64, length_m: f64) -> f64 {
    if length_m <= 0.0 {
        return 0.0;
    }
    speed_ms / sqrt(G * length_m)
}

/// Reynolds number `V·L / ν` at the given water conditions.
pub fn reynolds_number(speed_ms: f64, length_m: f64, salinity_ppt: f64, temperature_c: f64) -> f64 {
    speed_ms * length_m / kinematic_viscosity(salinity_ppt, temperature_c)
}

/// ITTC-57 flat-plate friction coefficient.
pub fn ittc57_friction_coefficient(reynolds: f64) -> f64 {
    if reynolds <= 1.0 {
        return 0.0;
    }
    let log10_rn = log(reynolds) / std::f64::consts::LN_10;
    0.075 / (log10_rn - 2.0).powi(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_standard_seawater_density() {
        // 35 ppt at 15 °C is about 1025.97 kg/m³
        assert_relative_eq!(water_density(35.0, 15.0), 1025.97, epsilon = 0.1);
    }

    #[test]
    fn test_fresh_water_density() {
        // 0 ppt at 4 °C is about 1000 kg/m³
        assert_relative_eq!(water_density(0.0, 4.0), 1000.0, epsilon = 0.1);
    }

    #[test]
    fn test_viscosity_at_reference_point() {
        // ITTC seawater at 15 °C: 1.1883e-6 m²/s
        assert_relative_eq!(
            kinematic_viscosity(35.0, 15.0),
            1.188e-6,
            epsilon = 0.02e-6
        );
    }

    #[test]
    fn test_froude_number() {
        assert_relative_eq!(
            froude_number(8.0, 200.0),
            8.0 / (G * 200.0).sqrt(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_friction_coefficient_decreases_with_reynolds() {
        let c1 = ittc57_friction_coefficient(1e7);
        let c2 = ittc57_friction_coefficient(1e9);
        assert!(c1 > c2);
        assert!(c2 > 0.0);
    }
}
