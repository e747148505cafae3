//! Coordinate reference systems and the equal-area projection used for
//! intermediate 2D math.
//!
//! The process-wide default projected CRS is World Behrmann (cylindrical
//! equal-area, standard parallel 30°N, WGS84 ellipsoid, ESRI:54017). The
//! projection is evaluated directly from the ellipsoidal Lambert equal-area
//! formulas with authalic-latitude inversion on the way back.

use crate::geodesic::{WGS84_A, WGS84_F};
use crate::{GeoError, Result};
use libm::{asin, cos, log, sin, sqrt};
use serde::{Deserialize, Serialize};

/// Eccentricity squared of WGS84
const E2: f64 = WGS84_F * (2.0 - WGS84_F);

/// A coordinate reference system known to the simulator.
///
/// The set is closed: geographic WGS84 and the cylindrical equal-area family
/// cover every reprojection the core needs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Crs {
    /// Geographic longitude/latitude on WGS84
    Wgs84,
    /// Cylindrical equal-area on WGS84 with the given standard parallel
    CylindricalEqualArea { standard_parallel_deg: f64 },
}

impl Crs {
    /// World Behrmann (ESRI:54017), the default projected CRS.
    pub fn world_behrmann() -> Self {
        Crs::CylindricalEqualArea {
            standard_parallel_deg: 30.0,
        }
    }

    pub fn is_projected(&self) -> bool {
        matches!(self, Crs::CylindricalEqualArea { .. })
    }

    pub fn is_geographic(&self) -> bool {
        matches!(self, Crs::Wgs84)
    }
}

impl Default for Crs {
    fn default() -> Self {
        Crs::world_behrmann()
    }
}

/// The authalic q function: q(φ) such that the authalic latitude is
/// β = asin(q/q_p).
fn q(phi: f64) -> f64 {
    let e = sqrt(E2);
    let s = sin(phi);
    (1.0 - E2) * (s / (1.0 - E2 * s * s) - (1.0 / (2.0 * e)) * log((1.0 - e * s) / (1.0 + e * s)))
}

/// Scale factor along the standard parallel.
fn k0(phi_s: f64) -> f64 {
    cos(phi_s) / sqrt(1.0 - E2 * sin(phi_s) * sin(phi_s))
}

/// Forward cylindrical equal-area projection: lon/lat degrees → x/y meters.
pub fn cea_forward(lon_deg: f64, lat_deg: f64, standard_parallel_deg: f64) -> (f64, f64) {
    let lam = lon_deg.to_radians();
    let phi = lat_deg.to_radians();
    let k = k0(standard_parallel_deg.to_radians());
    let x = WGS84_A * k * lam;
    let y = WGS84_A * q(phi) / (2.0 * k);
    (x, y)
}

/// Inverse cylindrical equal-area projection: x/y meters → lon/lat degrees.
///
/// Recovers geodetic latitude from the authalic latitude with the standard
/// three-term series.
pub fn cea_inverse(x: f64, y: f64, standard_parallel_deg: f64) -> (f64, f64) {
    let k = k0(standard_parallel_deg.to_radians());
    let lam = x / (WGS84_A * k);

    let qp = q(std::f64::consts::FRAC_PI_2);
    let q_val = 2.0 * k * y / WGS84_A;
    let beta = asin((q_val / qp).clamp(-1.0, 1.0));

    let e2 = E2;
    let e4 = e2 * e2;
    let e6 = e4 * e2;
    let phi = beta
        + (e2 / 3.0 + 31.0 * e4 / 180.0 + 517.0 * e6 / 5040.0) * sin(2.0 * beta)
        + (23.0 * e4 / 360.0 + 251.0 * e6 / 3780.0) * sin(4.0 * beta)
        + (761.0 * e6 / 45360.0) * sin(6.0 * beta);

    (lam.to_degrees(), phi.to_degrees())
}

/// Project geographic coordinates into a projected CRS.
///
/// Fails when the target is not projected.
pub fn project(lon_deg: f64, lat_deg: f64, target: &Crs) -> Result<(f64, f64)> {
    match target {
        Crs::CylindricalEqualArea {
            standard_parallel_deg,
        } => Ok(cea_forward(lon_deg, lat_deg, *standard_parallel_deg)),
        Crs::Wgs84 => Err(GeoError::CrsMismatch {
            message: "projection target must be a projected CRS".to_string(),
        }),
    }
}

/// Unproject planar coordinates back to geographic WGS84.
///
/// Fails when the source is not projected or the target is not geographic.
pub fn unproject(x: f64, y: f64, source: &Crs, target: &Crs) -> Result<(f64, f64)> {
    if !target.is_geographic() {
        return Err(GeoError::CrsMismatch {
            message: "unprojection target must be a geographic CRS".to_string(),
        });
    }
    match source {
        Crs::CylindricalEqualArea {
            standard_parallel_deg,
        } => Ok(cea_inverse(x, y, *standard_parallel_deg)),
        Crs::Wgs84 => Err(GeoError::CrsMismatch {
            message: "unprojection source must be a projected CRS".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_behrmann_origin() {
        let (x, y) = cea_forward(0.0, 0.0, 30.0);
        assert_relative_eq!(x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(y, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_behrmann_round_trip() {
        for &(lon, lat) in &[(4.47917, 51.9225), (-70.0, -33.0), (139.7, 35.6), (0.0, 89.0)] {
            let (x, y) = cea_forward(lon, lat, 30.0);
            let (lon2, lat2) = cea_inverse(x, y, 30.0);
            assert_relative_eq!(lon, lon2, epsilon = 1e-9);
            // The authalic-latitude series truncates at e⁶
            assert_relative_eq!(lat, lat2, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_project_rejects_geographic_target() {
        assert!(project(0.0, 0.0, &Crs::Wgs84).is_err());
        assert!(project(0.0, 0.0, &Crs::world_behrmann()).is_ok());
    }

    #[test]
    fn test_unproject_rejects_projected_target() {
        let behrmann = Crs::world_behrmann();
        assert!(unproject(0.0, 0.0, &behrmann, &behrmann).is_err());
        assert!(unproject(0.0, 0.0, &behrmann, &Crs::Wgs84).is_ok());
    }
}
