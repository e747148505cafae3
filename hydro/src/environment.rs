//! The marine environment at a sampled position.

use libm::atan2;
use serde::{Deserialize, Serialize};

/// Environmental conditions at a geodetic position, filled by the network's
/// raster sampler before each dynamics step.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Environment {
    /// Salinity (ppt)
    pub salinity_ppt: f64,
    /// Water temperature (°C)
    pub temperature_c: f64,
    /// Significant wave height (m)
    pub wave_height_m: f64,
    /// Wave frequency (Hz)
    pub wave_frequency_hz: f64,
    /// Wave angular frequency (rad/s)
    pub wave_angular_frequency: f64,
    /// Wave length (m)
    pub wave_length_m: f64,
    /// Wind speed northward component (m/s)
    pub wind_north_ms: f64,
    /// Wind speed eastward component (m/s)
    pub wind_east_ms: f64,
    /// Water depth (m)
    pub water_depth_m: f64,
}

impl Environment {
    /// Calm water at the given salinity and temperature: no waves, no wind,
    /// deep water.
    pub fn calm(salinity_ppt: f64, temperature_c: f64) -> Self {
        Self {
            salinity_ppt,
            temperature_c,
            wave_height_m: 0.0,
            wave_frequency_hz: 0.0,
            wave_angular_frequency: 0.0,
            wave_length_m: 0.0,
            wind_north_ms: 0.0,
            wind_east_ms: 0.0,
            water_depth_m: 50.0,
        }
    }

    /// Resultant wind speed (m/s).
    pub fn wind_speed(&self) -> f64 {
        (self.wind_north_ms * self.wind_north_ms + self.wind_east_ms * self.wind_east_ms).sqrt()
    }

    /// Bearing the wind (and the wind-driven waves) travel towards, degrees
    /// clockwise from north.
    pub fn wave_travel_bearing_deg(&self) -> f64 {
        let b = atan2(self.wind_east_ms, self.wind_north_ms).to_degrees();
        if b < 0.0 {
            b + 360.0
        } else {
            b
        }
    }

    /// Angle between the wave travel direction and the ship heading,
    /// normalized to [0, π] radians.
    pub fn encounter_angle(&self, heading_deg: f64) -> f64 {
        let mut diff = (self.wave_travel_bearing_deg() - heading_deg) % 360.0;
        if diff < 0.0 {
            diff += 360.0;
        }
        if diff > 180.0 {
            diff = 360.0 - diff;
        }
        diff.to_radians()
    }

    pub fn has_waves(&self) -> bool {
        self.wave_height_m > 0.0 && self.wave_frequency_hz > 0.0 && self.wave_length_m > 0.0
    }

    pub fn has_wind(&self) -> bool {
        self.wind_north_ms != 0.0 || self.wind_east_ms != 0.0
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::calm(0.0, 15.0)
    }
}
