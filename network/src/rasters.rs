//! Raster-backed environment sampling.

use fairway_geo::GeoPoint;
use fairway_hydro::Environment;
use ndarray::Array2;

/// Fallback values for missing or NaN raster cells.
const DEFAULT_SALINITY_PPT: f64 = 0.0;
const DEFAULT_WAVE_HEIGHT_M: f64 = 0.0;
const DEFAULT_WAVE_PERIOD_S: f64 = 40.0;
const DEFAULT_WIND_MS: f64 = 0.0;
const DEFAULT_WATER_DEPTH_M: f64 = 50.0;
/// Temperature has no raster source; a temperate-sea constant is used.
const DEFAULT_TEMPERATURE_C: f64 = 15.0;

/// Read-only environmental rasters covering the network's map area.
///
/// Cells are indexed by normalizing longitude/latitude between the map
/// corner points and scaling to row/column. Built once at load time and
/// never mutated, so the sampler can be shared across ships without
/// locking.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentRasters {
    salinity_ppt: Option<Array2<f32>>,
    wave_height_m: Option<Array2<f32>>,
    wave_period_s: Option<Array2<f32>>,
    wind_north_ms: Option<Array2<f32>>,
    wind_east_ms: Option<Array2<f32>>,
    water_depth_m: Option<Array2<f32>>,
}

impl EnvironmentRasters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_salinity(mut self, raster: Array2<f32>) -> Self {
        self.salinity_ppt = Some(raster);
        self
    }

    pub fn with_wave_height(mut self, raster: Array2<f32>) -> Self {
        self.wave_height_m = Some(raster);
        self
    }

    pub fn with_wave_period(mut self, raster: Array2<f32>) -> Self {
        self.wave_period_s = Some(raster);
        self
    }

    pub fn with_wind_north(mut self, raster: Array2<f32>) -> Self {
        self.wind_north_ms = Some(raster);
        self
    }

    pub fn with_wind_east(mut self, raster: Array2<f32>) -> Self {
        self.wind_east_ms = Some(raster);
        self
    }

    pub fn with_water_depth(mut self, raster: Array2<f32>) -> Self {
        self.water_depth_m = Some(raster);
        self
    }

    /// Map a position to a (row, col) cell by linear scaling between the
    /// map corner points.
    fn cell_index(
        raster: &Array2<f32>,
        position: &GeoPoint,
        min_corner: &GeoPoint,
        max_corner: &GeoPoint,
    ) -> Option<(usize, usize)> {
        let (rows, cols) = raster.dim();
        if rows == 0 || cols == 0 {
            return None;
        }
        let lon_span = max_corner.lon() - min_corner.lon();
        let lat_span = max_corner.lat() - min_corner.lat();
        if lon_span <= 0.0 || lat_span <= 0.0 {
            return None;
        }

        let x_norm = (position.lon() - min_corner.lon()) / lon_span;
        let y_norm = (position.lat() - min_corner.lat()) / lat_span;
        if !(0.0..=1.0).contains(&x_norm) || !(0.0..=1.0).contains(&y_norm) {
            return None;
        }

        let row = (y_norm * (rows - 1) as f64) as usize;
        let col = (x_norm * (cols - 1) as f64) as usize;
        Some((row, col))
    }

    fn sample_raster(
        raster: &Option<Array2<f32>>,
        position: &GeoPoint,
        min_corner: &GeoPoint,
        max_corner: &GeoPoint,
        fallback: f64,
    ) -> f64 {
        let Some(raster) = raster else {
            return fallback;
        };
        let Some((row, col)) = Self::cell_index(raster, position, min_corner, max_corner) else {
            return fallback;
        };
        let value = raster[(row, col)] as f64;
        if value.is_nan() {
            fallback
        } else {
            value
        }
    }

    /// Sample the full environment record at a position. Missing rasters
    /// and NaN cells fall back to the fixed defaults; the wave frequency,
    /// angular frequency and length are derived on the way out.
    pub fn sample(
        &self,
        position: &GeoPoint,
        min_corner: &GeoPoint,
        max_corner: &GeoPoint,
    ) -> Environment {
        let salinity = Self::sample_raster(
            &self.salinity_ppt,
            position,
            min_corner,
            max_corner,
            DEFAULT_SALINITY_PPT,
        );
        let wave_height = Self::sample_raster(
            &self.wave_height_m,
            position,
            min_corner,
            max_corner,
            DEFAULT_WAVE_HEIGHT_M,
        );
        let wave_period = Self::sample_raster(
            &self.wave_period_s,
            position,
            min_corner,
            max_corner,
            DEFAULT_WAVE_PERIOD_S,
        );
        let wind_north = Self::sample_raster(
            &self.wind_north_ms,
            position,
            min_corner,
            max_corner,
            DEFAULT_WIND_MS,
        );
        let wind_east = Self::sample_raster(
            &self.wind_east_ms,
            position,
            min_corner,
            max_corner,
            DEFAULT_WIND_MS,
        );
        let water_depth = Self::sample_raster(
            &self.water_depth_m,
            position,
            min_corner,
            max_corner,
            DEFAULT_WATER_DEPTH_M,
        );

        let wave_frequency = 1.0 / wave_period;
        let wind_resultant = (wind_north * wind_north + wind_east * wind_east).sqrt();

        Environment {
            salinity_ppt: salinity,
            temperature_c: DEFAULT_TEMPERATURE_C,
            wave_height_m: wave_height,
            wave_frequency_hz: wave_frequency,
            wave_angular_frequency: 2.0 * std::f64::consts::PI * wave_frequency,
            wave_length_m: wind_resultant / wave_frequency,
            wind_north_ms: wind_north,
            wind_east_ms: wind_east,
            water_depth_m: water_depth,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::arr2;

    fn corners() -> (GeoPoint, GeoPoint) {
        (GeoPoint::new(0.0, 0.0), GeoPoint::new(10.0, 10.0))
    }

    #[test]
    fn test_defaults_without_rasters() {
        let rasters = EnvironmentRasters::new();
        let (min, max) = corners();
        let env = rasters.sample(&GeoPoint::new(5.0, 5.0), &min, &max);
        assert_eq!(env.salinity_ppt, 0.0);
        assert_eq!(env.water_depth_m, 50.0);
        assert_relative_eq!(env.wave_frequency_hz, 1.0 / 40.0);
        assert_eq!(env.wave_length_m, 0.0); // no wind, no wave length
    }

    #[test]
    fn test_cell_lookup() {
        let salinity = arr2(&[[10.0f32, 20.0], [30.0, 40.0]]);
        let rasters = EnvironmentRasters::new().with_salinity(salinity);
        let (min, max) = corners();

        // South-west corner hits row 0, col 0
        let env = rasters.sample(&GeoPoint::new(0.0, 0.0), &min, &max);
        assert_eq!(env.salinity_ppt, 10.0);
        // North-east corner hits row 1, col 1
        let env = rasters.sample(&GeoPoint::new(10.0, 10.0), &min, &max);
        assert_eq!(env.salinity_ppt, 40.0);
    }

    #[test]
    fn test_nan_cell_falls_back() {
        let depth = arr2(&[[f32::NAN, 12.0], [13.0, 14.0]]);
        let rasters = EnvironmentRasters::new().with_water_depth(depth);
        let (min, max) = corners();
        let env = rasters.sample(&GeoPoint::new(0.0, 0.0), &min, &max);
        assert_eq!(env.water_depth_m, 50.0);
    }

    #[test]
    fn test_out_of_map_position_falls_back() {
        let depth = arr2(&[[12.0f32, 12.0], [12.0, 12.0]]);
        let rasters = EnvironmentRasters::new().with_water_depth(depth);
        let (min, max) = corners();
        let env = rasters.sample(&GeoPoint::new(50.0, 50.0), &min, &max);
        assert_eq!(env.water_depth_m, 50.0);
    }

    #[test]
    fn test_wave_length_from_wind() {
        let wind_north = arr2(&[[3.0f32]]);
        let wind_east = arr2(&[[4.0f32]]);
        let period = arr2(&[[10.0f32]]);
        let rasters = EnvironmentRasters::new()
            .with_wind_north(wind_north)
            .with_wind_east(wind_east)
            .with_wave_period(period);
        let (min, max) = corners();
        let env = rasters.sample(&GeoPoint::new(5.0, 5.0), &min, &max);
        // |wind| = 5, f = 0.1 → λ = 50
        assert_relative_eq!(env.wave_length_m, 50.0, epsilon = 1e-6);
    }
}
