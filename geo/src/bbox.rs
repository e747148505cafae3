//! Axis-aligned bounding boxes for spatial pruning.

use crate::gline::GeoLine;
use crate::gpoint::GeoPoint;
use serde::{Deserialize, Serialize};

/// A four-corner bounding box in lon/lat space.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundingBox {
    min_lon: f64,
    min_lat: f64,
    max_lon: f64,
    max_lat: f64,
}

impl BoundingBox {
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }

    /// Tight box around a point set. Returns `None` for an empty set.
    pub fn from_points<'a, I: IntoIterator<Item = &'a GeoPoint>>(points: I) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bbox = Self::new(first.lon(), first.lat(), first.lon(), first.lat());
        for p in iter {
            bbox.expand(p);
        }
        Some(bbox)
    }

    pub fn expand(&mut self, point: &GeoPoint) {
        self.min_lon = self.min_lon.min(point.lon());
        self.min_lat = self.min_lat.min(point.lat());
        self.max_lon = self.max_lon.max(point.lon());
        self.max_lat = self.max_lat.max(point.lat());
    }

    pub fn min_corner(&self) -> GeoPoint {
        GeoPoint::new(self.min_lon, self.min_lat)
    }

    pub fn max_corner(&self) -> GeoPoint {
        GeoPoint::new(self.max_lon, self.max_lat)
    }

    pub fn contains(&self, point: &GeoPoint) -> bool {
        point.lon() >= self.min_lon
            && point.lon() <= self.max_lon
            && point.lat() >= self.min_lat
            && point.lat() <= self.max_lat
    }

    /// Conservative segment test: either endpoint inside, or the segment
    /// crosses one of the four box edges.
    pub fn intersects_segment(&self, segment: &GeoLine) -> bool {
        if self.contains(segment.start()) || self.contains(segment.end()) {
            return true;
        }
        self.edges().iter().any(|edge| segment.intersects(edge))
    }

    fn edges(&self) -> [GeoLine; 4] {
        let bl = GeoPoint::new(self.min_lon, self.min_lat);
        let br = GeoPoint::new(self.max_lon, self.min_lat);
        let tr = GeoPoint::new(self.max_lon, self.max_lat);
        let tl = GeoPoint::new(self.min_lon, self.max_lat);
        [
            GeoLine::new(bl.clone(), br.clone()),
            GeoLine::new(br, tr.clone()),
            GeoLine::new(tr, tl.clone()),
            GeoLine::new(tl, bl),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_points() {
        let pts = [
            GeoPoint::new(1.0, 2.0),
            GeoPoint::new(-3.0, 8.0),
            GeoPoint::new(5.0, 0.0),
        ];
        let bbox = BoundingBox::from_points(pts.iter()).unwrap();
        assert!(bbox.contains(&GeoPoint::new(0.0, 4.0)));
        assert!(!bbox.contains(&GeoPoint::new(6.0, 4.0)));
    }

    #[test]
    fn test_segment_crossing_box() {
        let bbox = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let through = GeoLine::new(GeoPoint::new(-5.0, 5.0), GeoPoint::new(15.0, 5.0));
        assert!(bbox.intersects_segment(&through));
        let outside = GeoLine::new(GeoPoint::new(-5.0, 20.0), GeoPoint::new(15.0, 20.0));
        assert!(!bbox.intersects_segment(&outside));
    }
}
