//! The car-following acceleration controller, adapted to marine braking.
//!
//! Ships have no brakes: deceleration comes from hull resistance (plus
//! reversed thrust when available), which makes the safe following gap a
//! function of the resistance curve. The controller composes a free-lane
//! term and a collision-avoidance term per critical point ahead, then
//! smooths and jerk-limits the result.

use std::collections::HashMap;

/// Reaction horizon T_s of the gap predictions (s).
pub const REACTION_TIME_S: f64 = 10.0;

/// Jerk cap (m/s³).
pub const MAX_JERK: f64 = 2.0;

/// Low-pass blend weight for the raw controller output.
pub const SMOOTHING_ALPHA: f64 = 0.8;

/// Hard cap on the safe-gap integration loop.
const MAX_SAFE_GAP_STEPS: usize = 10_000;

/// Speed below which the safe-gap integration stops (m/s).
const SAFE_GAP_SPEED_FLOOR: f64 = 0.5;

/// The per-ship car-following state: tunables and the safe-gap memo.
#[derive(Debug, Clone)]
pub struct CarFollowingModel {
    reaction_time_s: f64,
    gap_cache: HashMap<u64, f64>,
}

impl CarFollowingModel {
    pub fn new() -> Self {
        Self {
            reaction_time_s: REACTION_TIME_S,
            gap_cache: HashMap::new(),
        }
    }

    pub fn reaction_time_s(&self) -> f64 {
        self.reaction_time_s
    }

    /// Drop the memoized safe gaps (call when the resistance state
    /// changes qualitatively, e.g. on reload).
    pub fn clear_cache(&mut self) {
        self.gap_cache.clear();
    }

    /// Distance needed to come down from `speed` by resistance alone: a
    /// bounded explicit Euler integration of the deceleration curve,
    /// memoized per 0.1 m/s of speed. The `estimate` variant uses the
    /// closed-form uniform-deceleration approximation at free-flow speed.
    pub fn safe_gap(
        &mut self,
        initial_gap_m: f64,
        speed_ms: f64,
        free_flow_speed_ms: f64,
        time_step_s: f64,
        estimate: bool,
        decel_at: &mut dyn FnMut(f64) -> f64,
    ) -> f64 {
        if estimate {
            let d_des = decel_at(free_flow_speed_ms).abs().max(1e-6);
            return initial_gap_m
                + self.reaction_time_s * free_flow_speed_ms
                + free_flow_speed_ms * free_flow_speed_ms / (2.0 * d_des);
        }

        let rounded = (speed_ms * 10.0).round() / 10.0;
        let key = rounded.to_bits();
        if let Some(&gap) = self.gap_cache.get(&key) {
            return initial_gap_m + gap;
        }

        let mut current_speed = rounded;
        let mut gap = current_speed * time_step_s;
        let mut steps = 0;
        while current_speed > SAFE_GAP_SPEED_FLOOR && steps < MAX_SAFE_GAP_STEPS {
            let d = decel_at(current_speed);
            if d >= 0.0 {
                // No braking authority at this speed; the integration
                // cannot make progress
                break;
            }
            current_speed += d * time_step_s;
            gap += current_speed.max(0.0) * time_step_s;
            steps += 1;
        }

        self.gap_cache.insert(key, gap);
        initial_gap_m + gap
    }

    /// Predicted feasible speed at the next reaction horizon.
    pub fn next_time_step_speed(
        &self,
        gap_m: f64,
        min_gap_m: f64,
        speed_ms: f64,
        free_flow_speed_ms: f64,
        max_acceleration: f64,
        time_step_s: f64,
        decel_at: &mut dyn FnMut(f64) -> f64,
    ) -> f64 {
        let mut u_hat = ((gap_m - min_gap_m) / self.reaction_time_s).min(free_flow_speed_ms);
        if u_hat < speed_ms {
            u_hat = u_hat.max(speed_ms + decel_at(speed_ms) * time_step_s);
        } else if u_hat > speed_ms && u_hat != free_flow_speed_ms {
            u_hat = u_hat.min(speed_ms + max_acceleration * time_step_s);
        }
        u_hat
    }

    /// Time to collision with the leader, capped at 100 s.
    pub fn time_to_collision(
        &self,
        gap_m: f64,
        min_gap_m: f64,
        speed_ms: f64,
        leader_speed_ms: f64,
    ) -> f64 {
        ((gap_m - min_gap_m) / (speed_ms - leader_speed_ms).max(0.0001)).min(100.0)
    }

    /// One critical point's bounded acceleration (m/s²).
    #[allow(clippy::too_many_arguments)]
    pub fn accelerate(
        &mut self,
        gap_m: f64,
        min_gap_m: f64,
        speed_ms: f64,
        leader_speed_ms: f64,
        free_flow_speed_ms: f64,
        time_step_s: f64,
        max_acceleration: f64,
        decel_at: &mut dyn FnMut(f64) -> f64,
    ) -> f64 {
        let safe_gap = self.safe_gap(
            min_gap_m,
            speed_ms,
            free_flow_speed_ms,
            time_step_s,
            false,
            decel_at,
        );

        if gap_m > safe_gap && max_acceleration > 0.0 {
            if speed_ms < free_flow_speed_ms {
                return max_acceleration;
            }
            if speed_ms == free_flow_speed_ms {
                return 0.0;
            }
        }

        let u_hat = self.next_time_step_speed(
            gap_m,
            min_gap_m,
            speed_ms,
            free_flow_speed_ms,
            max_acceleration,
            time_step_s,
            decel_at,
        );
        let ttc = self.time_to_collision(gap_m, min_gap_m, speed_ms, leader_speed_ms);

        let an11 = ((u_hat - speed_ms) / ttc.max(0.0001)).max(decel_at(speed_ms));
        let an12 = ((u_hat - speed_ms) / self.reaction_time_s).min(max_acceleration);
        let beta1 = if an11 > 0.0 { 1.0 } else { 0.0 };
        let an13 = (1.0 - beta1) * an11 + beta1 * an12;
        let an14 = ((leader_speed_ms - speed_ms) / self.reaction_time_s)
            .min(max_acceleration)
            .max(decel_at(speed_ms));
        let beta2 = 1.0;
        let an1 = beta2 * an13 + (1.0 - beta2) * an14;

        let gamma = if speed_ms - leader_speed_ms > 0.0 { 1.0 } else { 0.0 };

        let d_des = decel_at(speed_ms).abs();
        let speed_sq_diff =
            speed_ms * speed_ms - leader_speed_ms * leader_speed_ms;
        let an2 = (speed_sq_diff * speed_sq_diff
            / (4.0 * d_des.max(1e-9) * (gap_m - min_gap_m).max(0.0001).powi(2)))
        .min(d_des);

        an1 * (1.0 - gamma) + gamma * (-an2).min(max_acceleration)
    }

    /// Low-pass blend with the previous acceleration, capped at the
    /// current maximum when one exists.
    pub fn smooth(
        &self,
        acceleration: f64,
        previous_acceleration: f64,
        max_acceleration: f64,
    ) -> f64 {
        let blended =
            SMOOTHING_ALPHA * acceleration + (1.0 - SMOOTHING_ALPHA) * previous_acceleration;
        if max_acceleration > 0.0 {
            blended.min(max_acceleration)
        } else {
            blended
        }
    }

    /// Bound the change to the previous acceleration by the jerk limit.
    pub fn jerk_limited(
        &self,
        acceleration: f64,
        previous_acceleration: f64,
        time_step_s: f64,
    ) -> f64 {
        let magnitude = acceleration
            .abs()
            .min(previous_acceleration.abs() + MAX_JERK * time_step_s);
        magnitude * if acceleration > 0.0 { 1.0 } else { -1.0 }
    }

    /// Whether the requested change violates the jerk limit.
    pub fn is_sudden_change(
        &self,
        previous_acceleration: f64,
        current_acceleration: f64,
        time_step_s: f64,
    ) -> bool {
        ((current_acceleration - previous_acceleration) / time_step_s).abs() > MAX_JERK
    }

    /// Integrate speed forward, confined to [0, free-flow].
    pub fn speed_up_down(
        &self,
        previous_speed_ms: f64,
        acceleration: f64,
        time_step_s: f64,
        free_flow_speed_ms: f64,
    ) -> f64 {
        (previous_speed_ms + acceleration * time_step_s)
            .min(free_flow_speed_ms)
            .max(0.0)
    }

    /// Recover the realized acceleration after the speed clamps.
    pub fn adjusted_acceleration(
        &self,
        speed_ms: f64,
        previous_speed_ms: f64,
        time_step_s: f64,
    ) -> f64 {
        (speed_ms - previous_speed_ms) / time_step_s
    }
}

impl Default for CarFollowingModel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A hull that can always shed 0.1 m/s² through resistance.
    fn constant_decel() -> impl FnMut(f64) -> f64 {
        |_speed| -0.1
    }

    #[test]
    fn test_open_water_accelerates_at_max() {
        let mut model = CarFollowingModel::new();
        let mut decel = constant_decel();
        let a = model.accelerate(1.0e6, 0.0, 3.0, 0.0, 8.0, 1.0, 0.5, &mut decel);
        assert_eq!(a, 0.5);
    }

    #[test]
    fn test_at_free_flow_speed_holds() {
        let mut model = CarFollowingModel::new();
        let mut decel = constant_decel();
        let a = model.accelerate(1.0e6, 0.0, 8.0, 0.0, 8.0, 1.0, 0.5, &mut decel);
        assert_eq!(a, 0.0);
    }

    #[test]
    fn test_short_gap_decelerates() {
        let mut model = CarFollowingModel::new();
        let mut decel = constant_decel();
        // 8 m/s towards a stopped leader 100 m ahead: far inside the safe
        // gap for a 0.1 m/s² braking hull
        let a = model.accelerate(100.0, 0.0, 8.0, 0.0, 8.0, 1.0, 0.5, &mut decel);
        assert!(a < 0.0, "a = {}", a);
    }

    #[test]
    fn test_safe_gap_grows_with_speed() {
        let mut model = CarFollowingModel::new();
        let mut decel = constant_decel();
        let slow = model.safe_gap(0.0, 2.0, 8.0, 1.0, false, &mut decel);
        let fast = model.safe_gap(0.0, 8.0, 8.0, 1.0, false, &mut decel);
        assert!(fast > slow);
    }

    #[test]
    fn test_safe_gap_memoization() {
        let mut model = CarFollowingModel::new();
        let calls = std::cell::Cell::new(0usize);
        let mut counting = |_s: f64| {
            calls.set(calls.get() + 1);
            -0.1
        };
        let first = model.safe_gap(0.0, 6.0, 8.0, 1.0, false, &mut counting);
        let calls_after_first = calls.get();
        let second = model.safe_gap(0.0, 6.0, 8.0, 1.0, false, &mut counting);
        assert_eq!(first, second);
        assert_eq!(calls.get(), calls_after_first, "second lookup must hit the memo");
    }

    #[test]
    fn test_safe_gap_estimate_closed_form() {
        let mut model = CarFollowingModel::new();
        let mut decel = constant_decel();
        let gap = model.safe_gap(10.0, 5.0, 8.0, 1.0, true, &mut decel);
        // 10 + 10·8 + 64/(2·0.1)
        assert!((gap - (10.0 + 80.0 + 320.0)).abs() < 1e-9);
    }

    #[test]
    fn test_no_braking_authority_terminates() {
        let mut model = CarFollowingModel::new();
        let mut no_brakes = |_s: f64| 0.0;
        // Must not loop forever
        let gap = model.safe_gap(0.0, 8.0, 8.0, 1.0, false, &mut no_brakes);
        assert!(gap.is_finite());
    }

    #[test]
    fn test_jerk_limit_caps_change() {
        let model = CarFollowingModel::new();
        let a = model.jerk_limited(10.0, 0.0, 1.0);
        assert_eq!(a, MAX_JERK);
        let a = model.jerk_limited(-10.0, 0.0, 1.0);
        assert_eq!(a, -MAX_JERK);
        // Within the limit the value passes through
        let a = model.jerk_limited(0.5, 0.0, 1.0);
        assert_eq!(a, 0.5);
    }

    #[test]
    fn test_sudden_change_detection() {
        let model = CarFollowingModel::new();
        assert!(model.is_sudden_change(0.0, 5.0, 1.0));
        assert!(!model.is_sudden_change(0.0, 1.0, 1.0));
    }

    #[test]
    fn test_speed_integration_clamps() {
        let model = CarFollowingModel::new();
        assert_eq!(model.speed_up_down(7.5, 1.0, 1.0, 8.0), 8.0);
        assert_eq!(model.speed_up_down(0.3, -1.0, 1.0, 8.0), 0.0);
        assert_eq!(model.speed_up_down(4.0, 0.5, 1.0, 8.0), 4.5);
    }

    #[test]
    fn test_ttc_cap() {
        let model = CarFollowingModel::new();
        assert_eq!(model.time_to_collision(1.0e9, 0.0, 5.0, 4.0), 100.0);
        let ttc = model.time_to_collision(50.0, 0.0, 5.0, 0.0);
        assert!((ttc - 10.0).abs() < 1e-9);
    }
}
