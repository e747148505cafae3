//! Geodesic solutions on the WGS84 ellipsoid.
//!
//! Implements the inverse problem (distance and initial bearing between two
//! points) and the direct problem (destination from point, bearing and
//! distance) with Vincenty's iterative formulae. WGS84 is used exclusively;
//! it is the reference ellipsoid of GPS, ECDIS and AIS, so all maritime input
//! data is expected in it.

use libm::{atan, atan2, cos, sin, sqrt, tan};

/// WGS84 semi-major axis (m)
pub const WGS84_A: f64 = 6_378_137.0;
/// WGS84 inverse flattening
pub const WGS84_INV_F: f64 = 298.257_223_563;
/// WGS84 flattening
pub const WGS84_F: f64 = 1.0 / WGS84_INV_F;
/// WGS84 semi-minor axis (m)
pub const WGS84_B: f64 = WGS84_A * (1.0 - WGS84_F);

const MAX_ITERATIONS: u32 = 200;
const CONVERGENCE: f64 = 1e-12;

/// Result of the inverse geodesic problem.
#[derive(Debug, Clone, Copy)]
pub struct InverseSolution {
    /// Geodesic distance (m)
    pub distance: f64,
    /// Initial azimuth at the start point, degrees clockwise from north
    pub initial_bearing: f64,
    /// Final azimuth at the end point, degrees clockwise from north
    pub final_bearing: f64,
}

/// Solve the inverse geodesic problem between two lon/lat pairs (degrees).
///
/// Falls back to the auxiliary-sphere great circle for the nearly antipodal
/// pairs on which Vincenty's lambda iteration stalls.
pub fn inverse(lon1_deg: f64, lat1_deg: f64, lon2_deg: f64, lat2_deg: f64) -> InverseSolution {
    if lon1_deg == lon2_deg && lat1_deg == lat2_deg {
        return InverseSolution {
            distance: 0.0,
            initial_bearing: 0.0,
            final_bearing: 0.0,
        };
    }

    let lat1 = lat1_deg.to_radians();
    let lat2 = lat2_deg.to_radians();
    let l = (lon2_deg - lon1_deg).to_radians();

    // Reduced latitudes
    let u1 = atan((1.0 - WGS84_F) * tan(lat1));
    let u2 = atan((1.0 - WGS84_F) * tan(lat2));
    let (sin_u1, cos_u1) = (sin(u1), cos(u1));
    let (sin_u2, cos_u2) = (sin(u2), cos(u2));

    let mut lambda = l;
    let mut converged = false;

    let mut sin_sigma = 0.0;
    let mut cos_sigma = 0.0;
    let mut sigma = 0.0;
    let mut cos_sq_alpha = 0.0;
    let mut cos_2sigma_m = 0.0;

    for _ in 0..MAX_ITERATIONS {
        let (sin_lambda, cos_lambda) = (sin(lambda), cos(lambda));
        let t1 = cos_u2 * sin_lambda;
        let t2 = cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_lambda;
        sin_sigma = sqrt(t1 * t1 + t2 * t2);
        if sin_sigma == 0.0 {
            // Coincident points
            return InverseSolution {
                distance: 0.0,
                initial_bearing: 0.0,
                final_bearing: 0.0,
            };
        }
        cos_sigma = sin_u1 * sin_u2 + cos_u1 * cos_u2 * cos_lambda;
        sigma = atan2(sin_sigma, cos_sigma);
        let sin_alpha = cos_u1 * cos_u2 * sin_lambda / sin_sigma;
        cos_sq_alpha = 1.0 - sin_alpha * sin_alpha;
        cos_2sigma_m = if cos_sq_alpha != 0.0 {
            cos_sigma - 2.0 * sin_u1 * sin_u2 / cos_sq_alpha
        } else {
            // Equatorial geodesic
            0.0
        };
        let c = WGS84_F / 16.0 * cos_sq_alpha * (4.0 + WGS84_F * (4.0 - 3.0 * cos_sq_alpha));
        let lambda_prev = lambda;
        lambda = l
            + (1.0 - c)
                * WGS84_F
                * sin_alpha
                * (sigma
                    + c * sin_sigma
                        * (cos_2sigma_m
                            + c * cos_sigma * (-1.0 + 2.0 * cos_2sigma_m * cos_2sigma_m)));
        if (lambda - lambda_prev).abs() < CONVERGENCE {
            converged = true;
            break;
        }
    }

    if !converged {
        tracing::warn!(
            lon1_deg,
            lat1_deg,
            lon2_deg,
            lat2_deg,
            "vincenty inverse did not converge (near-antipodal pair), \
             using auxiliary-sphere arc"
        );
        let distance = WGS84_A * sigma;
        let bearing = spherical_initial_bearing(lon1_deg, lat1_deg, lon2_deg, lat2_deg);
        return InverseSolution {
            distance,
            initial_bearing: bearing,
            final_bearing: bearing,
        };
    }

    let u_sq = cos_sq_alpha * (WGS84_A * WGS84_A - WGS84_B * WGS84_B) / (WGS84_B * WGS84_B);
    let a_coef =
        1.0 + u_sq / 16384.0 * (4096.0 + u_sq * (-768.0 + u_sq * (320.0 - 175.0 * u_sq)));
    let b_coef = u_sq / 1024.0 * (256.0 + u_sq * (-128.0 + u_sq * (74.0 - 47.0 * u_sq)));
    let delta_sigma = b_coef
        * sin_sigma
        * (cos_2sigma_m
            + b_coef / 4.0
                * (cos_sigma * (-1.0 + 2.0 * cos_2sigma_m * cos_2sigma_m)
                    - b_coef / 6.0
                        * cos_2sigma_m
                        * (-3.0 + 4.0 * sin_sigma * sin_sigma)
                        * (-3.0 + 4.0 * cos_2sigma_m * cos_2sigma_m)));

    let distance = WGS84_B * a_coef * (sigma - delta_sigma);

    let (sin_lambda, cos_lambda) = (sin(lambda), cos(lambda));
    let alpha1 = atan2(
        cos_u2 * sin_lambda,
        cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_lambda,
    );
    let alpha2 = atan2(
        cos_u1 * sin_lambda,
        -sin_u1 * cos_u2 + cos_u1 * sin_u2 * cos_lambda,
    );

    InverseSolution {
        distance,
        initial_bearing: normalize_bearing(alpha1.to_degrees()),
        final_bearing: normalize_bearing(alpha2.to_degrees()),
    }
}

/// Solve the direct geodesic problem: destination lon/lat (degrees) from a
/// start point, an initial bearing (degrees clockwise from north) and a
/// distance (m).
pub fn direct(lon_deg: f64, lat_deg: f64, bearing_deg: f64, distance_m: f64) -> (f64, f64) {
    if distance_m == 0.0 {
        return (lon_deg, lat_deg);
    }

    let lat1 = lat_deg.to_radians();
    let alpha1 = bearing_deg.to_radians();

    let u1 = atan((1.0 - WGS84_F) * tan(lat1));
    let (sin_u1, cos_u1) = (sin(u1), cos(u1));
    let (sin_alpha1, cos_alpha1) = (sin(alpha1), cos(alpha1));

    let sigma1 = atan2(tan(u1), cos_alpha1);
    let sin_alpha = cos_u1 * sin_alpha1;
    let cos_sq_alpha = 1.0 - sin_alpha * sin_alpha;
    let u_sq = cos_sq_alpha * (WGS84_A * WGS84_A - WGS84_B * WGS84_B) / (WGS84_B * WGS84_B);
    let a_coef =
        1.0 + u_sq / 16384.0 * (4096.0 + u_sq * (-768.0 + u_sq * (320.0 - 175.0 * u_sq)));
    let b_coef = u_sq / 1024.0 * (256.0 + u_sq * (-128.0 + u_sq * (74.0 - 47.0 * u_sq)));

    let mut sigma = distance_m / (WGS84_B * a_coef);
    let mut cos_2sigma_m;
    let mut iterations = 0;
    loop {
        cos_2sigma_m = cos(2.0 * sigma1 + sigma);
        let sin_sigma = sin(sigma);
        let cos_sigma = cos(sigma);
        let delta_sigma = b_coef
            * sin_sigma
            * (cos_2sigma_m
                + b_coef / 4.0
                    * (cos_sigma * (-1.0 + 2.0 * cos_2sigma_m * cos_2sigma_m)
                        - b_coef / 6.0
                            * cos_2sigma_m
                            * (-3.0 + 4.0 * sin_sigma * sin_sigma)
                            * (-3.0 + 4.0 * cos_2sigma_m * cos_2sigma_m)));
        let sigma_prev = sigma;
        sigma = distance_m / (WGS84_B * a_coef) + delta_sigma;
        iterations += 1;
        if (sigma - sigma_prev).abs() < CONVERGENCE || iterations >= MAX_ITERATIONS {
            break;
        }
    }

    let (sin_sigma, cos_sigma) = (sin(sigma), cos(sigma));
    let tmp = sin_u1 * sin_sigma - cos_u1 * cos_sigma * cos_alpha1;
    let lat2 = atan2(
        sin_u1 * cos_sigma + cos_u1 * sin_sigma * cos_alpha1,
        (1.0 - WGS84_F) * sqrt(sin_alpha * sin_alpha + tmp * tmp),
    );
    let lambda = atan2(
        sin_sigma * sin_alpha1,
        cos_u1 * cos_sigma - sin_u1 * sin_sigma * cos_alpha1,
    );
    let c = WGS84_F / 16.0 * cos_sq_alpha * (4.0 + WGS84_F * (4.0 - 3.0 * cos_sq_alpha));
    let l = lambda
        - (1.0 - c)
            * WGS84_F
            * sin_alpha
            * (sigma
                + c * sin_sigma
                    * (cos_2sigma_m + c * cos_sigma * (-1.0 + 2.0 * cos_2sigma_m * cos_2sigma_m)));

    let lon2 = lon_deg + l.to_degrees();
    (normalize_longitude(lon2), lat2.to_degrees())
}

/// Great-circle initial bearing on the auxiliary sphere, degrees from north.
pub fn spherical_initial_bearing(lon1_deg: f64, lat1_deg: f64, lon2_deg: f64, lat2_deg: f64) -> f64 {
    let lat1 = lat1_deg.to_radians();
    let lat2 = lat2_deg.to_radians();
    let dlon = (lon2_deg - lon1_deg).to_radians();
    let y = sin(dlon) * cos(lat2);
    let x = cos(lat1) * sin(lat2) - sin(lat1) * cos(lat2) * cos(dlon);
    normalize_bearing(atan2(y, x).to_degrees())
}

/// Normalize a bearing to [0, 360) degrees.
pub fn normalize_bearing(bearing_deg: f64) -> f64 {
    let mut b = bearing_deg % 360.0;
    if b < 0.0 {
        b += 360.0;
    }
    b
}

/// Normalize a longitude to [-180, 180] degrees.
pub fn normalize_longitude(lon_deg: f64) -> f64 {
    let mut l = lon_deg;
    while l > 180.0 {
        l -= 360.0;
    }
    while l < -180.0 {
        l += 360.0;
    }
    l
}
