//! Planar points in a projected CRS.

use crate::gpoint::GeoPoint;
use crate::projection::{unproject, Crs};
use crate::Result;
use serde::{Deserialize, Serialize};

/// A point in a projected (planar, meter-based) coordinate reference system.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ProjectedPoint {
    x: f64,
    y: f64,
    crs: Crs,
}

impl ProjectedPoint {
    pub fn new(x: f64, y: f64, crs: Crs) -> Self {
        Self { x, y, crs }
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn crs(&self) -> &Crs {
        &self.crs
    }

    /// Euclidean distance in the projection plane (m).
    pub fn distance(&self, other: &ProjectedPoint) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Reproject back to geographic WGS84.
    pub fn to_geodetic(&self) -> Result<GeoPoint> {
        let (lon, lat) = unproject(self.x, self.y, &self.crs, &Crs::Wgs84)?;
        Ok(GeoPoint::new(lon, lat))
    }
}

impl PartialEq for ProjectedPoint {
    fn eq(&self, other: &Self) -> bool {
        self.x == other.x && self.y == other.y && self.crs == other.crs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_planar_distance() {
        let crs = Crs::world_behrmann();
        let a = ProjectedPoint::new(0.0, 0.0, crs);
        let b = ProjectedPoint::new(3.0, 4.0, crs);
        assert_relative_eq!(a.distance(&b), 5.0);
    }

    #[test]
    fn test_to_geodetic_round_trip() {
        let p = GeoPoint::new(5.5, 52.25);
        let proj = p.project_default();
        let back = proj.to_geodetic().unwrap();
        assert_relative_eq!(back.lon(), 5.5, epsilon = 1e-9);
        assert_relative_eq!(back.lat(), 52.25, epsilon = 1e-6);
    }
}
