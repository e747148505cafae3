//! Geodetic motion state: position, heading and rate-of-turn limited
//! rotation towards a target.

use fairway_geo::GeoPoint;
use serde::{Deserialize, Serialize};

/// The kinematic state of a ship on the ellipsoid: where it is, which way
/// its bow points, and which path point it is steering for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotionState {
    position: GeoPoint,
    /// Heading, degrees clockwise from north
    heading_deg: f64,
    target: GeoPoint,
    /// Rate-of-turn cap (degrees per second)
    max_rot_deg_per_s: f64,
    is_rotating: bool,
}

impl MotionState {
    /// Start at a position with the bow pointing at the first target.
    pub fn new(position: GeoPoint, target: GeoPoint) -> Self {
        let heading_deg = position.bearing_to(&target);
        Self {
            position,
            heading_deg,
            target,
            max_rot_deg_per_s: 0.0,
            is_rotating: false,
        }
    }

    pub fn position(&self) -> &GeoPoint {
        &self.position
    }

    pub fn set_position(&mut self, position: GeoPoint) {
        self.position = position;
    }

    pub fn heading_deg(&self) -> f64 {
        self.heading_deg
    }

    pub fn set_heading_deg(&mut self, heading_deg: f64) {
        self.heading_deg = normalize_heading(heading_deg);
    }

    pub fn target(&self) -> &GeoPoint {
        &self.target
    }

    pub fn is_rotating(&self) -> bool {
        self.is_rotating
    }

    /// Retarget and cap the rate of turn for the coming steps.
    pub fn set_target_and_max_rot(&mut self, target: GeoPoint, max_rot_deg_per_s: f64) {
        self.target = target;
        self.max_rot_deg_per_s = max_rot_deg_per_s;
    }

    /// Signed angle from the current heading to another point, in
    /// [-180, 180] degrees.
    pub fn angle_to(&self, point: &GeoPoint) -> f64 {
        if &self.position == point {
            return 0.0;
        }
        let target_bearing = self.position.bearing_to(point);
        normalize_turn(target_bearing - self.heading_deg)
    }

    /// Rotate towards the target by at most ROT·Δt, then translate along
    /// the updated heading by the step distance.
    pub fn move_by_distance(&mut self, distance_m: f64, time_step_s: f64) {
        self.rotate_to_target(time_step_s);
        if distance_m > 0.0 {
            self.position = self
                .position
                .point_at_distance_and_heading(distance_m, self.heading_deg);
        }
    }

    fn rotate_to_target(&mut self, time_step_s: f64) {
        if self.position == self.target {
            self.is_rotating = false;
            return;
        }
        let target_bearing = self.position.bearing_to(&self.target);
        let diff = normalize_turn(target_bearing - self.heading_deg);
        let allowed = self.max_rot_deg_per_s * time_step_s;

        if diff.abs() < allowed || allowed <= 0.0 && diff.abs() < 1e-12 {
            self.heading_deg = target_bearing;
            self.is_rotating = false;
            return;
        }
        if allowed <= 0.0 {
            // No turn authority yet (stationary ship): snap onto the target
            self.heading_deg = target_bearing;
            self.is_rotating = false;
            return;
        }

        self.is_rotating = true;
        if diff > 0.0 {
            self.heading_deg = normalize_heading(self.heading_deg + allowed);
        } else {
            self.heading_deg = normalize_heading(self.heading_deg - allowed);
        }
    }
}

/// Normalize a heading to [0, 360).
fn normalize_heading(heading_deg: f64) -> f64 {
    let mut h = heading_deg % 360.0;
    if h < 0.0 {
        h += 360.0;
    }
    h
}

/// Normalize a turn angle to [-180, 180].
fn normalize_turn(angle_deg: f64) -> f64 {
    let mut a = angle_deg % 360.0;
    if a > 180.0 {
        a -= 360.0;
    }
    if a < -180.0 {
        a += 360.0;
    }
    a
}
