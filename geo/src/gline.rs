//! Geodetic line segments with visibility and clearance queries.

use crate::gpoint::GeoPoint;
use crate::{GeoError, Result, ORIENTATION_EPSILON};
use serde::{Deserialize, Serialize};

/// Winding of an ordered point triple in the lon/lat plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Collinear,
    Clockwise,
    CounterClockwise,
}

/// Which side of a directed segment a point falls on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideOfLine {
    Left,
    Right,
    OnLine,
}

/// An ordered pair of geodetic points.
///
/// The length is the geodesic distance between the endpoints. A line may
/// carry a theoretical clearance width (the widest hull that can traverse
/// it) and a maximum permitted speed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoLine {
    start: GeoPoint,
    end: GeoPoint,
    length_m: f64,
    theoretical_width_m: Option<f64>,
    max_speed_ms: Option<f64>,
}

impl GeoLine {
    pub fn new(start: GeoPoint, end: GeoPoint) -> Self {
        let length_m = start.distance(&end);
        Self {
            start,
            end,
            length_m,
            theoretical_width_m: None,
            max_speed_ms: None,
        }
    }

    pub fn with_max_speed(start: GeoPoint, end: GeoPoint, max_speed_ms: f64) -> Self {
        Self {
            max_speed_ms: Some(max_speed_ms),
            ..Self::new(start, end)
        }
    }

    pub fn start(&self) -> &GeoPoint {
        &self.start
    }

    pub fn end(&self) -> &GeoPoint {
        &self.end
    }

    pub fn length(&self) -> f64 {
        self.length_m
    }

    pub fn max_speed(&self) -> Option<f64> {
        self.max_speed_ms
    }

    pub fn set_max_speed(&mut self, max_speed_ms: f64) {
        self.max_speed_ms = Some(max_speed_ms);
    }

    pub fn theoretical_width(&self) -> Option<f64> {
        self.theoretical_width_m
    }

    pub fn set_theoretical_width(&mut self, width_m: f64) {
        self.theoretical_width_m = Some(width_m);
    }

    /// Segment intersection in the lon/lat plane.
    ///
    /// Two non-collinear segments intersect iff the orientations of the four
    /// endpoint triples alternate; a collinear pair counts only when an
    /// endpoint lies on the other segment.
    pub fn intersects(&self, other: &GeoLine) -> bool {
        segments_intersect(&self.start, &self.end, &other.start, &other.end)
    }

    /// Perpendicular distance from a point to the infinite line through the
    /// segment, measured in the default projected plane (m).
    pub fn perpendicular_distance(&self, point: &GeoPoint) -> f64 {
        let s = self.start.project_default();
        let e = self.end.project_default();
        let p = point.project_default();

        let a = e.y() - s.y();
        let b = s.x() - e.x();
        let c = e.x() * s.y() - s.x() * e.y();

        let denominator = (a * a + b * b).sqrt();
        if denominator == 0.0 {
            return s.distance(&p);
        }
        (a * p.x() + b * p.y() + c).abs() / denominator
    }

    /// Interior angle with another segment sharing an endpoint (radians).
    pub fn angle_with(&self, other: &GeoLine) -> Result<f64> {
        let (common, a, c) = if self.start == other.start {
            (&self.start, &self.end, &other.end)
        } else if self.start == other.end {
            (&self.start, &self.end, &other.start)
        } else if self.end == other.start {
            (&self.end, &self.start, &other.end)
        } else if self.end == other.end {
            (&self.end, &self.start, &other.start)
        } else {
            return Err(GeoError::NoCommonEndpoint);
        };

        let ax = a.lon() - common.lon();
        let ay = a.lat() - common.lat();
        let cx = c.lon() - common.lon();
        let cy = c.lat() - common.lat();

        let dot = ax * cx + ay * cy;
        let mag_a = (ax * ax + ay * ay).sqrt();
        let mag_c = (cx * cx + cy * cy).sqrt();
        if mag_a == 0.0 || mag_c == 0.0 {
            return Err(GeoError::NoCommonEndpoint);
        }

        Ok((dot / (mag_a * mag_c)).clamp(-1.0, 1.0).acos())
    }

    /// Point on the segment at the given geodesic distance from the start.
    pub fn point_by_distance(&self, distance_m: f64) -> Result<GeoPoint> {
        if distance_m < 0.0 || distance_m > self.length_m {
            return Err(GeoError::DistanceOutOfSegment {
                distance: distance_m,
                length: self.length_m,
            });
        }
        if self.length_m == 0.0 {
            return Ok(self.start.clone());
        }
        let bearing = self.start.bearing_to(&self.end);
        Ok(self.start.point_at_distance_and_heading(distance_m, bearing))
    }

    /// Which side of the directed segment the point falls on.
    pub fn side_of(&self, point: &GeoPoint) -> SideOfLine {
        let rel_x = point.lon() - self.start.lon();
        let rel_y = point.lat() - self.start.lat();
        let dir_x = self.end.lon() - self.start.lon();
        let dir_y = self.end.lat() - self.start.lat();

        let cross = dir_x * rel_y - dir_y * rel_x;
        if cross > 0.0 {
            SideOfLine::Left
        } else if cross < 0.0 {
            SideOfLine::Right
        } else {
            SideOfLine::OnLine
        }
    }

    /// Midpoint along the geodesic.
    pub fn midpoint(&self) -> GeoPoint {
        self.start.midpoint(&self.end)
    }
}

impl PartialEq for GeoLine {
    fn eq(&self, other: &Self) -> bool {
        self.start == other.start && self.end == other.end
    }
}

/// Segment intersection on raw endpoints: p1–q1 against p2–q2. The
/// building block behind [`GeoLine::intersects`], usable without paying
/// for a measured line.
pub fn segments_intersect(p1: &GeoPoint, q1: &GeoPoint, p2: &GeoPoint, q2: &GeoPoint) -> bool {
    let o1 = orientation(p1, q1, p2);
    let o2 = orientation(p1, q1, q2);
    let o3 = orientation(p2, q2, p1);
    let o4 = orientation(p2, q2, q1);

    if o1 != o2 && o3 != o4 {
        return true;
    }

    if o1 == Orientation::Collinear && on_segment(p1, p2, q1) {
        return true;
    }
    if o2 == Orientation::Collinear && on_segment(p1, q2, q1) {
        return true;
    }
    if o3 == Orientation::Collinear && on_segment(p2, p1, q2) {
        return true;
    }
    if o4 == Orientation::Collinear && on_segment(p2, q1, q2) {
        return true;
    }

    false
}

/// Winding of the triple (p, q, r) from the signed triangle area, with an
/// epsilon band treated as collinear.
pub fn orientation(p: &GeoPoint, q: &GeoPoint, r: &GeoPoint) -> Orientation {
    let val = (q.lat() - p.lat()) * (r.lon() - q.lon()) - (q.lon() - p.lon()) * (r.lat() - q.lat());

    if val.abs() < ORIENTATION_EPSILON {
        Orientation::Collinear
    } else if val > 0.0 {
        Orientation::Clockwise
    } else {
        Orientation::CounterClockwise
    }
}

/// Whether q lies within the axis-aligned box spanned by p and r. Only
/// meaningful when the triple is already known collinear.
pub fn on_segment(p: &GeoPoint, q: &GeoPoint, r: &GeoPoint) -> bool {
    q.lon() <= p.lon().max(r.lon())
        && q.lon() >= p.lon().min(r.lon())
        && q.lat() <= p.lat().max(r.lat())
        && q.lat() >= p.lat().min(r.lat())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn line(x1: f64, y1: f64, x2: f64, y2: f64) -> GeoLine {
        GeoLine::new(GeoPoint::new(x1, y1), GeoPoint::new(x2, y2))
    }

    #[test]
    fn test_crossing_segments_intersect() {
        let a = line(0.0, 0.0, 2.0, 2.0);
        let b = line(0.0, 2.0, 2.0, 0.0);
        assert!(a.intersects(&b));
    }

    #[test]
    fn test_parallel_segments_do_not_intersect() {
        let a = line(0.0, 0.0, 2.0, 0.0);
        let b = line(0.0, 1.0, 2.0, 1.0);
        assert!(!a.intersects(&b));
    }

    #[test]
    fn test_collinear_touching_endpoint_intersects() {
        let a = line(0.0, 0.0, 2.0, 0.0);
        let b = line(2.0, 0.0, 4.0, 0.0);
        assert!(a.intersects(&b));
    }

    #[test]
    fn test_collinear_disjoint_do_not_intersect() {
        let a = line(0.0, 0.0, 1.0, 0.0);
        let b = line(2.0, 0.0, 4.0, 0.0);
        assert!(!a.intersects(&b));
    }

    #[test]
    fn test_shared_endpoint_angle() {
        let a = line(0.0, 0.0, 1.0, 0.0);
        let b = line(0.0, 0.0, 0.0, 1.0);
        let angle = a.angle_with(&b).unwrap();
        assert!((angle - std::f64::consts::FRAC_PI_2).abs() < 1e-9);
    }

    #[test]
    fn test_side_of_line() {
        let l = line(0.0, 0.0, 1.0, 0.0);
        assert_eq!(l.side_of(&GeoPoint::new(0.5, 1.0)), SideOfLine::Left);
        assert_eq!(l.side_of(&GeoPoint::new(0.5, -1.0)), SideOfLine::Right);
        assert_eq!(l.side_of(&GeoPoint::new(0.5, 0.0)), SideOfLine::OnLine);
    }

    #[test]
    fn test_point_by_distance_bounds() {
        let l = line(0.0, 0.0, 1.0, 0.0);
        assert!(l.point_by_distance(-1.0).is_err());
        assert!(l.point_by_distance(l.length() * 2.0).is_err());
        let mid = l.point_by_distance(l.length() / 2.0).unwrap();
        assert!((mid.lon() - 0.5).abs() < 1e-3);
    }

    proptest! {
        #[test]
        fn prop_intersection_symmetry(
            ax in -10.0f64..10.0, ay in -10.0f64..10.0,
            bx in -10.0f64..10.0, by in -10.0f64..10.0,
            cx in -10.0f64..10.0, cy in -10.0f64..10.0,
            dx in -10.0f64..10.0, dy in -10.0f64..10.0,
        ) {
            let s = line(ax, ay, bx, by);
            let t = line(cx, cy, dx, dy);
            prop_assert_eq!(s.intersects(&t), t.intersects(&s));
        }
    }
}
