//! Geodetic points on the WGS84 ellipsoid.

use crate::geodesic;
use crate::point::ProjectedPoint;
use crate::projection::{project, Crs};
use crate::{GeoError, Result};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

/// A geodetic point: longitude/latitude in degrees on WGS84, optionally
/// carrying a user identifier and a port marking with a dwell time.
///
/// Equality is exact coordinate equality; [`GeoPoint::is_exactly_equal`]
/// additionally compares the identifier, the port flag and the dwell time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoPoint {
    lon_deg: f64,
    lat_deg: f64,
    user_id: String,
    is_port: bool,
    dwell_time_s: f64,
}

impl GeoPoint {
    pub fn new(lon_deg: f64, lat_deg: f64) -> Self {
        Self {
            lon_deg,
            lat_deg,
            user_id: String::new(),
            is_port: false,
            dwell_time_s: 0.0,
        }
    }

    pub fn with_id(lon_deg: f64, lat_deg: f64, user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Self::new(lon_deg, lat_deg)
        }
    }

    pub fn lon(&self) -> f64 {
        self.lon_deg
    }

    pub fn lat(&self) -> f64 {
        self.lat_deg
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn set_user_id(&mut self, id: impl Into<String>) {
        self.user_id = id.into();
    }

    pub fn is_valid(&self) -> bool {
        !(self.lon_deg.is_nan() || self.lat_deg.is_nan())
    }

    pub fn is_port(&self) -> bool {
        self.is_port
    }

    pub fn dwell_time_s(&self) -> f64 {
        self.dwell_time_s
    }

    /// Mark the point as a port with the given dwell time in seconds.
    pub fn mark_as_port(&mut self, dwell_time_s: f64) {
        self.is_port = true;
        self.dwell_time_s = dwell_time_s;
    }

    /// Geodesic distance to another point (m) on the WGS84 ellipsoid.
    pub fn distance(&self, other: &GeoPoint) -> f64 {
        geodesic::inverse(self.lon_deg, self.lat_deg, other.lon_deg, other.lat_deg).distance
    }

    /// Initial azimuth towards another point, degrees clockwise from north.
    pub fn bearing_to(&self, other: &GeoPoint) -> f64 {
        geodesic::inverse(self.lon_deg, self.lat_deg, other.lon_deg, other.lat_deg)
            .initial_bearing
    }

    /// Destination point at the given distance (m) and heading (degrees
    /// clockwise from north), solving the direct geodesic problem.
    pub fn point_at_distance_and_heading(&self, distance_m: f64, heading_deg: f64) -> GeoPoint {
        let (lon, lat) = geodesic::direct(self.lon_deg, self.lat_deg, heading_deg, distance_m);
        GeoPoint::new(lon, lat)
    }

    /// Midpoint along the geodesic to another point.
    pub fn midpoint(&self, other: &GeoPoint) -> GeoPoint {
        let sol = geodesic::inverse(self.lon_deg, self.lat_deg, other.lon_deg, other.lat_deg);
        self.point_at_distance_and_heading(sol.distance / 2.0, sol.initial_bearing)
    }

    /// Reproject into a projected CRS for intermediate planar math.
    pub fn project_to(&self, target: &Crs) -> Result<ProjectedPoint> {
        let (x, y) = project(self.lon_deg, self.lat_deg, target)?;
        Ok(ProjectedPoint::new(x, y, *target))
    }

    /// Reproject into the default projected CRS (World Behrmann).
    pub fn project_default(&self) -> ProjectedPoint {
        let crs = Crs::world_behrmann();
        let (x, y) = project(self.lon_deg, self.lat_deg, &crs)
            .expect("world behrmann is a projected CRS");
        ProjectedPoint::new(x, y, crs)
    }

    /// Full-state equality: coordinates, identifier, port flag and dwell.
    pub fn is_exactly_equal(&self, other: &GeoPoint) -> bool {
        self == other
            && self.user_id == other.user_id
            && self.is_port == other.is_port
            && self.dwell_time_s == other.dwell_time_s
    }

    /// Serialize to the fixed big-endian binary record:
    /// 8B lon, 8B lat, 8B id length, id bytes, 1B port flag, 8B dwell.
    pub fn serialize_binary<W: Write>(&self, out: &mut W) -> Result<()> {
        out.write_all(&self.lon_deg.to_bits().to_be_bytes())?;
        out.write_all(&self.lat_deg.to_bits().to_be_bytes())?;
        let id_bytes = self.user_id.as_bytes();
        out.write_all(&(id_bytes.len() as u64).to_be_bytes())?;
        out.write_all(id_bytes)?;
        out.write_all(&[self.is_port as u8])?;
        out.write_all(&self.dwell_time_s.to_bits().to_be_bytes())?;
        Ok(())
    }

    /// Deserialize from the fixed big-endian binary record.
    pub fn deserialize_binary<R: Read>(input: &mut R) -> Result<GeoPoint> {
        let mut buf8 = [0u8; 8];

        input.read_exact(&mut buf8)?;
        let lon_deg = f64::from_bits(u64::from_be_bytes(buf8));

        input.read_exact(&mut buf8)?;
        let lat_deg = f64::from_bits(u64::from_be_bytes(buf8));

        input.read_exact(&mut buf8)?;
        let id_len = u64::from_be_bytes(buf8) as usize;
        if id_len > 1_048_576 {
            return Err(GeoError::RecordFraming {
                message: format!("user id length {} exceeds the record limit", id_len),
            });
        }
        let mut id_bytes = vec![0u8; id_len];
        input.read_exact(&mut id_bytes)?;
        let user_id = String::from_utf8(id_bytes).map_err(|e| GeoError::RecordFraming {
            message: format!("user id is not valid UTF-8: {}", e),
        })?;

        let mut flag = [0u8; 1];
        input.read_exact(&mut flag)?;
        let is_port = flag[0] != 0;

        input.read_exact(&mut buf8)?;
        let dwell_time_s = f64::from_bits(u64::from_be_bytes(buf8));

        Ok(GeoPoint {
            lon_deg,
            lat_deg,
            user_id,
            is_port,
            dwell_time_s,
        })
    }
}

impl PartialEq for GeoPoint {
    fn eq(&self, other: &Self) -> bool {
        self.lon_deg == other.lon_deg && self.lat_deg == other.lat_deg
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lon_deg, self.lat_deg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn test_distance_symmetry() {
        let a = GeoPoint::new(4.47917, 51.9225);
        let b = GeoPoint::new(103.851959, 1.290270);
        assert_relative_eq!(a.distance(&b), b.distance(&a), epsilon = 1e-6);
    }

    #[test]
    fn test_port_marking() {
        let mut p = GeoPoint::new(0.0, 0.0);
        assert!(!p.is_port());
        p.mark_as_port(3600.0);
        assert!(p.is_port());
        assert_eq!(p.dwell_time_s(), 3600.0);
    }

    #[test]
    fn test_binary_record_layout() {
        let mut p = GeoPoint::with_id(12.5, -45.25, "wp-7");
        p.mark_as_port(120.0);
        let mut buf = Vec::new();
        p.serialize_binary(&mut buf).unwrap();
        // 8 + 8 + 8 + 4 + 1 + 8
        assert_eq!(buf.len(), 37);
        let restored = GeoPoint::deserialize_binary(&mut buf.as_slice()).unwrap();
        assert!(p.is_exactly_equal(&restored));
    }

    #[test]
    fn test_equality_is_coordinates_only() {
        let a = GeoPoint::with_id(1.0, 2.0, "a");
        let b = GeoPoint::with_id(1.0, 2.0, "b");
        assert_eq!(a, b);
        assert!(!a.is_exactly_equal(&b));
    }

    proptest! {
        #[test]
        fn prop_round_trip_serialization(
            lon in -180.0f64..180.0,
            lat in -89.9f64..89.9,
            id in "[a-z0-9]{0,12}",
            port in any::<bool>(),
            dwell in 0.0f64..1e6,
        ) {
            let mut p = GeoPoint::with_id(lon, lat, id);
            if port {
                p.mark_as_port(dwell);
            }
            let mut buf = Vec::new();
            p.serialize_binary(&mut buf).unwrap();
            let restored = GeoPoint::deserialize_binary(&mut buf.as_slice()).unwrap();
            prop_assert!(p.is_exactly_equal(&restored));
        }

        #[test]
        fn prop_distance_symmetry(
            lon1 in -89.0f64..89.0, lat1 in -80.0f64..80.0,
            dlon in -90.0f64..90.0, lat2 in -80.0f64..80.0,
        ) {
            // Longitude spread under 90° keeps the pairs away from the
            // near-antipodal band where the lambda iteration stalls
            let a = GeoPoint::new(lon1, lat1);
            let b = GeoPoint::new(lon1 + dlon, lat2);
            prop_assert!((a.distance(&b) - b.distance(&a)).abs() < 1e-6);
        }
    }
}
