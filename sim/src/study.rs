//! Resistance study: sweep a ship's speed and tabulate the force balance
//! without running the clock.

use fairway_vessel::{Result, Ship};
use serde::Serialize;

/// One row of a resistance sweep.
#[derive(Debug, Clone, Serialize)]
pub struct ResistanceStudyRow {
    /// Sampled speed (m/s)
    pub speed_ms: f64,
    /// Sampled speed (knots)
    pub speed_kn: f64,
    /// Total calm + dynamic resistance (N)
    pub total_resistance_n: f64,
    /// Effective towing power R·V (kW)
    pub effective_power_kw: f64,
}

const MS_PER_KNOT: f64 = 0.514444;

/// Sweep the ship's speed from rest to its maximum in one-knot steps.
///
/// The ship's kinematic state is untouched; only the resistance stack is
/// exercised at each sampled speed and the current environment.
pub fn resistance_study(ship: &Ship) -> Result<Vec<ResistanceStudyRow>> {
    let env = *ship.current_environment();
    let heading = ship.current_heading_deg();

    let max_kn = (ship.max_speed_ms() / MS_PER_KNOT).ceil() as usize;
    let mut rows = Vec::with_capacity(max_kn + 1);
    for kn in 0..=max_kn {
        let speed_ms = (kn as f64 * MS_PER_KNOT).min(ship.max_speed_ms());
        let resistance = ship
            .resistance_stack()
            .total_resistance(ship.hull(), &env, speed_ms, heading)?;
        rows.push(ResistanceStudyRow {
            speed_ms,
            speed_kn: speed_ms / MS_PER_KNOT,
            total_resistance_n: resistance,
            effective_power_kw: resistance * speed_ms / 1000.0,
        });
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fairway_geo::GeoPoint;
    use fairway_vessel::{example_descriptor, lines_between};

    #[test]
    fn test_sweep_is_monotone() {
        let descriptor = example_descriptor();
        let points = vec![GeoPoint::new(0.0, 0.0), GeoPoint::new(0.5, 0.0)];
        let lines = lines_between(&points);
        let ship = descriptor.build_with_path(points, lines).unwrap();

        let rows = resistance_study(&ship).unwrap();
        assert!(rows.len() > 10);
        assert_eq!(rows[0].total_resistance_n, 0.0);
        for pair in rows.windows(2) {
            assert!(pair[1].total_resistance_n >= pair[0].total_resistance_n);
            assert!(pair[1].effective_power_kw >= pair[0].effective_power_kw);
        }
    }
}
