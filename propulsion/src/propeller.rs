//! Wageningen B-series propellers and the engine–propeller solvers.

use crate::context::PropulsionContext;
use crate::engine::EngineProperties;
use crate::gearbox::Gearbox;
use crate::{PropulsionError, Result};
use fairway_hydro as hydro;
use libm::{cbrt, log, pow};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Fixed efficiency returned below J = 0.3, where the open-water
/// polynomials misbehave.
const PROPELLER_EFFICIENCY_AT_ZERO_SPEED: f64 = 0.8;

/// Reynolds number above which the polynomial correction applies.
const REYNOLDS_CORRECTION_THRESHOLD: f64 = 2.0e6;

/// RPM step of the operating-point search.
const RPM_SEARCH_STEP: f64 = 1.0;

/// J step of the optimum-efficiency search.
const J_SEARCH_STEP: f64 = 0.05;

/// Which coefficient a B-series table produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KCoefKind {
    Thrust,
    Torque,
}

/// One Wageningen B-series polynomial: coefficients and the exponent rows
/// for J, P/D, A_E/A_0 and Z.
struct BSeriesTable {
    c: &'static [f64],
    s: &'static [i32],
    t: &'static [i32],
    u: &'static [i32],
    v: &'static [i32],
    kind: KCoefKind,
}

const KT_TABLE: BSeriesTable = BSeriesTable {
    c: &[
        0.008805, -0.204554, 0.166351, 0.158114, -0.147581, -0.481497, 0.415437, 0.0144043,
        -0.0530054, 0.0143481, 0.0606826, -0.0125894, 0.0109689, -0.133698, 0.0063841,
        -0.0013272, 0.168496, -0.0507214, 0.0854559, -0.0504475, 0.010465, -0.0064827,
        -0.0084173, 0.0168424, -0.001023, -0.0317791, 0.018604, -0.004108, -0.0006068,
        -0.0049819, 0.0025983, -0.0005605, -0.0016365, -0.0003288, 0.0001165, 0.0006909,
        0.0042175, 0.00005652, -0.0014656,
    ],
    s: &[
        0, 1, 0, 0, 2, 1, 0, 0, 2, 0, 1, 0, 1, 0, 0, 2, 3, 0, 2, 3, 1, 2, 0, 1, 3, 0, 1, 0, 0,
        1, 2, 3, 1, 1, 2, 0, 0, 3, 0,
    ],
    t: &[
        0, 0, 1, 2, 0, 1, 2, 0, 0, 1, 1, 0, 0, 3, 6, 6, 0, 0, 0, 0, 6, 6, 3, 3, 3, 3, 0, 2, 0,
        0, 0, 0, 2, 6, 6, 0, 3, 6, 3,
    ],
    u: &[
        0, 0, 0, 0, 1, 1, 1, 0, 0, 0, 0, 1, 1, 0, 0, 0, 1, 2, 2, 2, 2, 2, 0, 0, 0, 1, 2, 2, 0,
        0, 0, 0, 0, 0, 0, 1, 1, 1, 2,
    ],
    v: &[
        0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 1, 1, 2,
        2, 2, 2, 2, 2, 2, 2, 2, 2, 2,
    ],
    kind: KCoefKind::Thrust,
};

const KQ_TABLE: BSeriesTable = BSeriesTable {
    c: &[
        0.0037937, 0.0088652, -0.032241, 0.0034478, -0.0408811, -0.108009, -0.0885381,
        0.188561, -0.0037087, 0.005137, 0.0209449, 0.0047432, -0.0072341, 0.0043839,
        -0.0269403, 0.0558082, 0.0161886, 0.0031809, 0.015896, 0.0471729, 0.0196283,
        -0.0502782, -0.030055, 0.0417122, -0.0397722, -0.0035002, -0.0106854, 0.001109,
        -0.0003139, 0.0035985, -0.0014212, -0.0038364, 0.0126803, -0.0031828, 0.0033427,
        -0.0018349, 0.0001125, -0.00002972, 0.0002696, 0.0008327, 0.0015533, 0.0003027,
        -0.0001843, -0.0004254, 0.00008692, -0.0004659, 0.00005542,
    ],
    s: &[
        0, 2, 1, 0, 0, 1, 2, 0, 1, 0, 1, 2, 2, 1, 0, 3, 0, 1, 0, 1, 3, 0, 3, 2, 0, 0, 3, 3, 0,
        3, 0, 1, 0, 2, 0, 1, 3, 3, 1, 2, 0, 0, 0, 0, 3, 0, 1,
    ],
    t: &[
        0, 0, 1, 2, 1, 1, 1, 2, 0, 1, 1, 1, 0, 1, 2, 0, 3, 3, 0, 0, 0, 1, 1, 2, 3, 6, 0, 3, 6,
        0, 6, 0, 2, 3, 6, 1, 2, 6, 0, 0, 2, 6, 0, 3, 3, 6, 6,
    ],
    u: &[
        0, 0, 0, 0, 1, 1, 1, 1, 0, 0, 0, 0, 1, 1, 1, 1, 1, 1, 2, 2, 2, 2, 2, 2, 2, 2, 0, 0, 0,
        1, 1, 2, 2, 2, 2, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2, 2,
    ],
    v: &[
        0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1,
        1, 1, 1, 1, 1, 1, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2,
    ],
    kind: KCoefKind::Torque,
};

impl BSeriesTable {
    /// Evaluate the polynomial at (J, P/D, A_E/A_0, Z), adding the Reynolds
    /// correction when R_n exceeds 2·10⁶.
    fn evaluate(&self, j: f64, pd: f64, area_ratio: f64, z: f64, rn: f64) -> f64 {
        let power = |base: f64, exp: i32| -> f64 {
            match exp {
                0 => 1.0,
                1 => base,
                _ => pow(base, exp as f64),
            }
        };

        let j = if j == 0.0 { 0.0001 } else { j };

        let mut result = 0.0;
        for i in 0..self.c.len() {
            result += self.c[i]
                * power(j, self.s[i])
                * power(pd, self.t[i])
                * power(area_ratio, self.u[i])
                * power(z, self.v[i]);
        }

        if rn > REYNOLDS_CORRECTION_THRESHOLD {
            // Correction variable log₁₀(Rn) − 0.301 = log₁₀(Rn/2) of the
            // published polynomials
            let log_r = log(rn) / std::f64::consts::LN_10 - 0.301;
            let log_r2 = log_r * log_r;
            let pd6 = power(pd, 6);
            let pd2 = power(pd, 2);
            match self.kind {
                KCoefKind::Thrust => {
                    let j2 = j * j;
                    result += 0.000353485
                        - 0.00333758 * area_ratio * j
                        - 0.00478125 * area_ratio * pd * j
                        + 0.000257792 * log_r2 * area_ratio * j2
                        + 0.0000643192 * log_r * pd6 * j2
                        - 0.0000110636 * log_r2 * pd6 * j2
                        - 0.0000276305 * log_r2 * z * area_ratio * j2
                        + 0.0000954 * log_r * z * area_ratio * pd * j
                        + 0.0000032049 * log_r * z * z * area_ratio * power(pd, 3) * j;
                }
                KCoefKind::Torque => {
                    result += -0.000591412 + 0.00696898 * pd
                        - 0.0000666654 * z * pd6
                        + 0.0160818 * area_ratio * area_ratio
                        - 0.000938091 * log_r * pd
                        - 0.00059593 * log_r * pd2
                        + 0.0000782099 * log_r2 * pd2
                        + 0.0000052199 * log_r * z * area_ratio * j * j
                        - 0.00000088528 * log_r2 * z * area_ratio * j
                        + 0.0000230171 * log_r * z * pd6
                        - 0.00000184341 * log_r2 * z * pd6
                        - 0.00400252 * log_r * area_ratio * area_ratio
                        + 0.000220915 * log_r2 * area_ratio * area_ratio;
                }
            }
        }

        result
    }
}

/// Propeller construction parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PropellerConfig {
    /// Propeller diameter D (m)
    pub diameter_m: f64,
    /// Propeller pitch P (m)
    pub pitch_m: f64,
    /// Expanded area ratio A_E/A_0
    pub expanded_area_ratio: f64,
    /// Blade count Z
    pub blades: u32,
    /// Shaft transmission efficiency in (0, 1]
    pub shaft_efficiency: f64,
    /// Solve for the engine–propeller intersection instead of only
    /// checking sufficiency
    pub allow_engine_optimization: bool,
}

/// A screw propeller driven through its gearbox, with B-series open-water
/// characteristics.
#[derive(Debug)]
pub struct Propeller {
    diameter_m: f64,
    pitch_m: f64,
    expanded_area_ratio: f64,
    blades: u32,
    disk_area_m2: f64,
    expanded_blade_area_m2: f64,
    shaft_efficiency: f64,
    allow_engine_optimization: bool,
    gearbox: Gearbox,
    previous_effective_power_kw: f64,
    last_best_j: f64,
    last_best_rpm: f64,
}

impl Propeller {
    /// Build a propeller, rejecting geometries outside the B-series
    /// validity band (Z ∈ [2, 7], P/D ∈ [0.5, 1.4], A_E/A_0 ∈ [0.3, 1.05]).
    pub fn new(config: PropellerConfig, gearbox: Gearbox) -> Result<Self> {
        if config.diameter_m <= 0.0 {
            return Err(PropulsionError::Configuration {
                message: "propeller diameter is not defined".to_string(),
            });
        }
        if config.pitch_m <= 0.0 {
            return Err(PropulsionError::Configuration {
                message: "propeller pitch is not defined".to_string(),
            });
        }
        if config.shaft_efficiency <= 0.0 || config.shaft_efficiency > 1.0 {
            return Err(PropulsionError::Configuration {
                message: "shaft efficiency is not defined".to_string(),
            });
        }

        let pd = config.pitch_m / config.diameter_m;
        if !(0.5..=1.4).contains(&pd) {
            return Err(PropulsionError::BSeriesOutOfRange {
                parameter: "P/D ratio",
                value: pd,
            });
        }
        if !(2..=7).contains(&config.blades) {
            return Err(PropulsionError::BSeriesOutOfRange {
                parameter: "blades count",
                value: config.blades as f64,
            });
        }
        if !(0.3..=1.05).contains(&config.expanded_area_ratio) {
            return Err(PropulsionError::BSeriesOutOfRange {
                parameter: "expanded area ratio",
                value: config.expanded_area_ratio,
            });
        }

        let disk_area = std::f64::consts::PI * config.diameter_m * config.diameter_m / 4.0;
        Ok(Self {
            diameter_m: config.diameter_m,
            pitch_m: config.pitch_m,
            expanded_area_ratio: config.expanded_area_ratio,
            blades: config.blades,
            disk_area_m2: disk_area,
            expanded_blade_area_m2: config.expanded_area_ratio * disk_area,
            shaft_efficiency: config.shaft_efficiency,
            allow_engine_optimization: config.allow_engine_optimization,
            gearbox,
            previous_effective_power_kw: 0.0,
            last_best_j: 0.8,
            last_best_rpm: 0.0,
        })
    }

    pub fn diameter_m(&self) -> f64 {
        self.diameter_m
    }

    /// Change the diameter; the disk and expanded blade areas are
    /// recomputed so they can never go stale.
    pub fn set_diameter(&mut self, diameter_m: f64) {
        self.diameter_m = diameter_m;
        self.disk_area_m2 = std::f64::consts::PI * diameter_m * diameter_m / 4.0;
        self.expanded_blade_area_m2 = self.expanded_area_ratio * self.disk_area_m2;
    }

    pub fn pitch_m(&self) -> f64 {
        self.pitch_m
    }

    pub fn pitch_diameter_ratio(&self) -> f64 {
        self.pitch_m / self.diameter_m
    }

    pub fn expanded_area_ratio(&self) -> f64 {
        self.expanded_area_ratio
    }

    pub fn blades(&self) -> u32 {
        self.blades
    }

    pub fn disk_area_m2(&self) -> f64 {
        self.disk_area_m2
    }

    pub fn expanded_blade_area_m2(&self) -> f64 {
        self.expanded_blade_area_m2
    }

    pub fn shaft_efficiency(&self) -> f64 {
        self.shaft_efficiency
    }

    pub fn gearbox(&self) -> &Gearbox {
        &self.gearbox
    }

    pub fn gearbox_mut(&mut self) -> &mut Gearbox {
        &mut self.gearbox
    }

    /// Shaft speed (rpm) from the gearbox.
    pub fn rpm(&self) -> f64 {
        self.gearbox.output_rpm()
    }

    /// Shaft power (kW) after shaft losses.
    pub fn shaft_power_kw(&mut self) -> f64 {
        self.gearbox.output_power_kw() * self.shaft_efficiency
    }

    /// Advance ratio J = V_A/(n·D), confined to [0, 1].
    pub fn advance_ratio(&self, rpm: f64, ctx: &PropulsionContext) -> f64 {
        let n = rpm / 60.0;
        if n == 0.0 {
            return 0.0;
        }
        let j = ctx.speed_of_advance() / (n * self.diameter_m);
        j.clamp(0.0, 1.0)
    }

    /// Ideal advance speed nP (m/s) with zero slip.
    pub fn ideal_advance_speed(&self, rpm: f64) -> f64 {
        rpm / 60.0 * self.pitch_m
    }

    /// Real slip ratio 1 − V_A/(nP).
    pub fn slip(&self, rpm: f64, ctx: &PropulsionContext) -> f64 {
        let ideal = self.ideal_advance_speed(rpm);
        if ideal == 0.0 {
            return 0.0;
        }
        1.0 - ctx.speed_of_advance() / ideal
    }

    fn reynolds(&self, ctx: &PropulsionContext) -> f64 {
        hydro::reynolds_number(
            ctx.speed_ms,
            ctx.waterline_length_m,
            ctx.env.salinity_ppt,
            ctx.env.temperature_c,
        )
    }

    /// Thrust coefficient KT at a shaft speed. A negative value indicates a
    /// geometry the B-series cannot model and is fatal.
    pub fn thrust_coefficient(&self, rpm: f64, ctx: &PropulsionContext) -> Result<f64> {
        let j = self.advance_ratio(rpm, ctx);
        let kt = KT_TABLE.evaluate(
            j,
            self.pitch_diameter_ratio(),
            self.expanded_area_ratio,
            self.blades as f64,
            self.reynolds(ctx),
        );
        if kt < 0.0 {
            return Err(PropulsionError::NegativeCoefficient {
                coefficient: "thrust",
            });
        }
        Ok(kt)
    }

    /// Torque coefficient KQ at a shaft speed.
    pub fn torque_coefficient(&self, rpm: f64, ctx: &PropulsionContext) -> Result<f64> {
        let j = self.advance_ratio(rpm, ctx);
        let kq = KQ_TABLE.evaluate(
            j,
            self.pitch_diameter_ratio(),
            self.expanded_area_ratio,
            self.blades as f64,
            self.reynolds(ctx),
        );
        if kq < 0.0 {
            return Err(PropulsionError::NegativeCoefficient {
                coefficient: "torque",
            });
        }
        Ok(kq)
    }

    /// Open-water efficiency η_O = (J/2π)(KT/KQ).
    pub fn open_water_efficiency(&self, j: f64, kt: f64, kq: f64) -> f64 {
        if kq == 0.0 {
            return 0.0;
        }
        (j / (2.0 * std::f64::consts::PI)) * (kt / kq)
    }

    /// Raw torque coefficient at a shaft speed, sign included. Solver
    /// probes use this to recognize infeasible speeds instead of failing.
    fn torque_coefficient_raw(&self, rpm: f64, ctx: &PropulsionContext) -> f64 {
        let j = self.advance_ratio(rpm, ctx);
        KQ_TABLE.evaluate(
            j,
            self.pitch_diameter_ratio(),
            self.expanded_area_ratio,
            self.blades as f64,
            self.reynolds(ctx),
        )
    }

    /// Shaft power (kW) the propeller absorbs at a shaft speed:
    /// P = 2πn·Q with Q = KQ·ρ·n²·D⁵.
    pub fn required_shaft_power_kw_at_rpm(&self, rpm: f64, ctx: &PropulsionContext) -> Result<f64> {
        let kq = self.torque_coefficient(rpm, ctx)?;
        let rho = hydro::water_density(ctx.env.salinity_ppt, ctx.env.temperature_c);
        let n = rpm / 60.0;
        let torque_nm = kq * rho * n * n * pow(self.diameter_m, 5.0);
        let omega = rpm * 2.0 * std::f64::consts::PI / 60.0;
        Ok(omega * torque_nm / 1000.0)
    }

    /// Engine-deliverable minus propeller-required shaft power at a shaft
    /// speed (kW). Positive means the engine can spin the propeller there;
    /// speeds outside the polynomial validity come back negative infinity
    /// so the searches skip them.
    pub fn power_surplus_at_rpm(&self, rpm: f64, ctx: &PropulsionContext) -> f64 {
        let kq = self.torque_coefficient_raw(rpm, ctx);
        if kq < 0.0 {
            return f64::NEG_INFINITY;
        }
        let available =
            self.gearbox.properties_at_output_rpm(rpm).break_power_kw * self.shaft_efficiency;
        let rho = hydro::water_density(ctx.env.salinity_ppt, ctx.env.temperature_c);
        let n = rpm / 60.0;
        let torque_nm = kq * rho * n * n * pow(self.diameter_m, 5.0);
        let omega = rpm * 2.0 * std::f64::consts::PI / 60.0;
        available - omega * torque_nm / 1000.0
    }

    /// Smallest non-negative surplus over the whole shaft range, by a
    /// linear scan at the search step.
    fn scan_feasible_operating_point(&self, ctx: &PropulsionContext) -> Option<(f64, f64)> {
        let (min_rpm, max_rpm) = self.gearbox.output_rpm_range();
        let mut best: Option<(f64, f64)> = None;

        let mut rpm = min_rpm;
        while rpm < max_rpm {
            let diff = self.power_surplus_at_rpm(rpm, ctx);
            if diff >= 0.0 {
                match best {
                    Some((_, best_diff)) if diff >= best_diff => {}
                    _ => best = Some((rpm, diff)),
                }
            }
            rpm += RPM_SEARCH_STEP;
        }
        best
    }

    /// Find the operating point where the engine curve meets the propeller
    /// demand curve: the smallest non-negative surplus.
    ///
    /// A hill climb warm-starts from the last solution and reverses
    /// direction on non-improvement; when the warm start sits in an
    /// infeasible band the whole range is scanned first. Fails when no
    /// feasible speed exists in range.
    pub fn solve_engine_propeller_intersection(
        &mut self,
        ctx: &PropulsionContext,
    ) -> Result<EngineProperties> {
        let (min_rpm, max_rpm) = self.gearbox.output_rpm_range();

        let mut n = self.last_best_rpm.clamp(min_rpm, max_rpm);
        let mut best_diff = self.power_surplus_at_rpm(n, ctx);

        if best_diff < 0.0 {
            match self.scan_feasible_operating_point(ctx) {
                Some((rpm, diff)) => {
                    n = rpm;
                    best_diff = diff;
                }
                None => return Err(PropulsionError::NoOperatingPoint { min_rpm, max_rpm }),
            }
        }

        let mut search_positive = true;
        loop {
            let mut updated = false;
            for _ in 0..2 {
                let candidate =
                    n + if search_positive { RPM_SEARCH_STEP } else { -RPM_SEARCH_STEP };
                if candidate <= max_rpm && candidate >= min_rpm {
                    let diff = self.power_surplus_at_rpm(candidate, ctx);
                    if diff >= 0.0 && diff < best_diff {
                        best_diff = diff;
                        n = candidate;
                        updated = true;
                        break;
                    }
                }
                // No improvement this way, try the other direction
                search_positive = !search_positive;
            }
            if !updated {
                break;
            }
        }

        self.last_best_rpm = n;
        debug!(rpm = n, surplus_kw = best_diff, "engine-propeller operating point");
        Ok(self.gearbox.properties_at_output_rpm(n))
    }

    /// Scan the shaft range for the smallest engine characteristics that
    /// can still rotate the propeller.
    pub fn min_engine_characteristics_for_rpm(
        &self,
        ctx: &PropulsionContext,
    ) -> Result<EngineProperties> {
        let (min_rpm, max_rpm) = self.gearbox.output_rpm_range();
        match self.scan_feasible_operating_point(ctx) {
            Some((rpm, _)) => Ok(self.gearbox.properties_at_output_rpm(rpm)),
            None => Err(PropulsionError::NoOperatingPoint { min_rpm, max_rpm }),
        }
    }

    /// Hill-climb on J within [0, 1] for the highest open-water efficiency
    /// at the current Reynolds number, warm-started from the last optimum.
    pub fn optimum_j(&mut self, ctx: &PropulsionContext) -> f64 {
        let pd = self.pitch_diameter_ratio();
        let ar = self.expanded_area_ratio;
        let z = self.blades as f64;
        let rn = self.reynolds(ctx);

        let efficiency_at = |j: f64| -> f64 {
            let kt = KT_TABLE.evaluate(j, pd, ar, z, rn);
            let kq = KQ_TABLE.evaluate(j, pd, ar, z, rn);
            self.open_water_efficiency(j, kt, kq)
        };

        let mut j = self.last_best_j;
        let mut best_eff = efficiency_at(j);
        let mut search_positive = true;

        loop {
            let mut updated = false;
            let candidate = j + if search_positive { J_SEARCH_STEP } else { -J_SEARCH_STEP };
            if (0.0..=1.0).contains(&candidate) {
                let eff = efficiency_at(candidate);
                if eff > best_eff {
                    best_eff = eff;
                    j = candidate;
                    updated = true;
                } else {
                    search_positive = !search_positive;
                    let candidate =
                        j + if search_positive { J_SEARCH_STEP } else { -J_SEARCH_STEP };
                    if (0.0..=1.0).contains(&candidate) {
                        let eff = efficiency_at(candidate);
                        if eff > best_eff {
                            best_eff = eff;
                            j = candidate;
                            updated = true;
                        }
                    }
                }
            } else {
                search_positive = !search_positive;
            }
            if !updated {
                break;
            }
        }

        self.last_best_j = j;
        j
    }

    /// Shaft speed realizing a given advance ratio at a ship speed.
    pub fn rpm_from_advance_ratio(&self, advance_ratio: f64, speed_ms: f64, ctx: &PropulsionContext) -> f64 {
        if advance_ratio <= 0.0 {
            return 0.0;
        }
        let va = ctx.speed_of_advance_at(speed_ms);
        va / (advance_ratio * self.diameter_m) * 60.0
    }

    /// Behind-hull propeller efficiency η_O·η_R with the operating-point
    /// policy applied:
    ///
    /// - below J = 0.3 the fixed zero-speed efficiency is returned;
    /// - with engine optimization on, the engine load cap is moved to the
    ///   solved intersection point;
    /// - otherwise the engine load cap is raised only when the engine is
    ///   starving the propeller at the current speed.
    pub fn efficiency(&mut self, ctx: &PropulsionContext) -> Result<f64> {
        let rpm = self.rpm();
        if self.advance_ratio(rpm, ctx) < 0.3 {
            return Ok(PROPELLER_EFFICIENCY_AT_ZERO_SPEED);
        }

        if self.allow_engine_optimization {
            let point = self.solve_engine_propeller_intersection(ctx)?;
            for engine in self.gearbox.engines_mut() {
                let rating = engine.rating_properties().break_power_kw;
                if rating > 0.0 {
                    engine.set_max_power_ratio(point.break_power_kw / rating);
                }
            }
        } else {
            if self.power_surplus_at_rpm(rpm, ctx) < 0.0 {
                let point = self.min_engine_characteristics_for_rpm(ctx)?;
                for engine in self.gearbox.engines_mut() {
                    let rating = engine.rating_properties().break_power_kw;
                    if rating > 0.0 {
                        engine.set_max_power_ratio(point.break_power_kw / rating);
                    }
                }
            } else {
                self.gearbox.set_max_power_ratio(1.0);
            }
            self.gearbox.update_operating_state(ctx);
        }

        let rpm = self.rpm();
        let j = self.advance_ratio(rpm, ctx);
        let kt = self.thrust_coefficient(rpm, ctx)?;
        let kq = self.torque_coefficient(rpm, ctx)?;
        Ok(self.open_water_efficiency(j, kt, kq) * ctx.relative_rotative_efficiency)
    }

    /// Effective towing power (kW): gearbox output through the propeller,
    /// shaft and hull efficiencies.
    pub fn effective_power_kw(&mut self, ctx: &PropulsionContext) -> Result<f64> {
        let gearbox_power = self.gearbox.output_power_kw();
        let propeller_eff = self.efficiency(ctx)?;
        let pe = gearbox_power * propeller_eff * self.shaft_efficiency * ctx.hull_efficiency;
        self.previous_effective_power_kw = pe;
        Ok(pe)
    }

    pub fn previous_effective_power_kw(&self) -> f64 {
        self.previous_effective_power_kw
    }

    /// Thrust (N) generated at the current state, bounded by the momentum
    /// limit T ≤ ∛(2ρ·A_disk·P_E²).
    pub fn thrust(&mut self, ctx: &PropulsionContext) -> Result<f64> {
        let pe_w = self.effective_power_kw(ctx)? * 1000.0;
        if pe_w <= 0.0 {
            return Ok(0.0);
        }

        let rho = hydro::water_density(ctx.env.salinity_ppt, ctx.env.temperature_c);
        let max_thrust = cbrt(2.0 * rho * self.disk_area_m2 * pe_w * pe_w);

        let va = ctx.speed_of_advance();
        if va <= 0.0 {
            return Ok(max_thrust);
        }
        Ok((pe_w / va).min(max_thrust))
    }

    /// Shaft torque (N·m) at the current state.
    pub fn torque_nm(&mut self, ctx: &PropulsionContext) -> Result<f64> {
        let rpm = self.rpm();
        if rpm == 0.0 {
            return Ok(0.0);
        }
        let pe_w = self.effective_power_kw(ctx)? * 1000.0;
        let omega = rpm * 2.0 * std::f64::consts::PI / 60.0;
        Ok(pe_w / omega)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::test_support::{cruising_context, linear_engine};
    use crate::gearbox::{Gearbox, GearboxConfig};
    use proptest::prelude::*;

    /// The reference fixture: a linear 30..120 rpm engine behind a 5 m
    /// B4-60 screw.
    fn propeller(allow_optimization: bool) -> Propeller {
        let gearbox = Gearbox::new(
            GearboxConfig {
                gear_ratio: 1.0,
                efficiency: 1.0,
            },
            vec![linear_engine(1, 1e8)],
        )
        .unwrap();
        Propeller::new(
            PropellerConfig {
                diameter_m: 5.0,
                pitch_m: 4.0,
                expanded_area_ratio: 0.6,
                blades: 4,
                shaft_efficiency: 0.99,
                allow_engine_optimization: allow_optimization,
            },
            gearbox,
        )
        .unwrap()
    }

    /// A fixture whose engine speed band keeps the cruise advance ratio
    /// well inside the polynomial validity region.
    fn matched_propeller() -> Propeller {
        let gearbox = Gearbox::new(
            GearboxConfig {
                gear_ratio: 1.0,
                efficiency: 1.0,
            },
            vec![crate::engine::test_support::fast_engine(1, 1e8)],
        )
        .unwrap();
        Propeller::new(
            PropellerConfig {
                diameter_m: 5.0,
                pitch_m: 4.0,
                expanded_area_ratio: 0.6,
                blades: 4,
                shaft_efficiency: 0.99,
                allow_engine_optimization: false,
            },
            gearbox,
        )
        .unwrap()
    }

    #[test]
    fn test_b_series_feasibility_checks() {
        let gearbox = || {
            Gearbox::new(
                GearboxConfig {
                    gear_ratio: 1.0,
                    efficiency: 1.0,
                },
                vec![linear_engine(1, 1e6)],
            )
            .unwrap()
        };
        let bad_pd = Propeller::new(
            PropellerConfig {
                diameter_m: 5.0,
                pitch_m: 10.0, // P/D = 2.0
                expanded_area_ratio: 0.6,
                blades: 4,
                shaft_efficiency: 0.99,
                allow_engine_optimization: false,
            },
            gearbox(),
        );
        assert!(matches!(
            bad_pd,
            Err(PropulsionError::BSeriesOutOfRange { parameter: "P/D ratio", .. })
        ));

        let bad_blades = Propeller::new(
            PropellerConfig {
                diameter_m: 5.0,
                pitch_m: 4.0,
                expanded_area_ratio: 0.6,
                blades: 9,
                shaft_efficiency: 0.99,
                allow_engine_optimization: false,
            },
            gearbox(),
        );
        assert!(bad_blades.is_err());
    }

    #[test]
    fn test_kt_kq_positive_in_working_range() {
        let p = propeller(false);
        let ctx = cruising_context(6.0, 10.0);
        let rn = 2.5e6;
        // For P/D = 0.8 the thrust crosses zero a little past J = 0.8 and
        // the torque a little later; the working band stays positive
        for i in 1..=7 {
            let j = i as f64 * 0.1;
            let kt = KT_TABLE.evaluate(j, p.pitch_diameter_ratio(), 0.6, 4.0, rn);
            let kq = KQ_TABLE.evaluate(j, p.pitch_diameter_ratio(), 0.6, 4.0, rn);
            assert!(kt > 0.0, "KT at J={} was {}", j, kt);
            assert!(kq > 0.0, "KQ at J={} was {}", j, kq);
        }
        let _ = ctx;
    }

    #[test]
    fn test_open_water_efficiency_peak_interior() {
        let mut p = propeller(false);
        let ctx = cruising_context(6.0, 10.0);
        let j = p.optimum_j(&ctx);
        assert!(j > 0.0 && j < 1.0);
    }

    #[test]
    fn test_advance_ratio_clamped() {
        let p = propeller(false);
        let ctx = cruising_context(6.0, 10.0);
        assert_eq!(p.advance_ratio(0.0, &ctx), 0.0);
        // Tiny rpm drives raw J far above 1, the clamp holds
        assert_eq!(p.advance_ratio(0.1, &ctx), 1.0);
    }

    #[test]
    fn test_slip_definition() {
        let p = propeller(false);
        let ctx = cruising_context(6.0, 10.0);
        // Ideal advance at 90 rpm: 1.5 rps × 4 m = 6 m/s; Va = 4.5 m/s
        let slip = p.slip(90.0, &ctx);
        assert!((slip - (1.0 - 4.5 / 6.0)).abs() < 1e-9);
    }

    #[test]
    fn test_operating_point_solver_surplus() {
        let mut p = propeller(false);
        let ctx = cruising_context(6.0, 10.0);
        let point = p.solve_engine_propeller_intersection(&ctx).unwrap();
        let surplus = p.power_surplus_at_rpm(point.rpm, &ctx);
        // The solver lands on a feasible point, locally optimal at the
        // search resolution within the shaft range
        assert!(surplus >= 0.0);
        let (min_rpm, max_rpm) = p.gearbox().output_rpm_range();
        for neighbor in [point.rpm - 1.0, point.rpm + 1.0] {
            if neighbor < min_rpm || neighbor > max_rpm {
                continue;
            }
            let d = p.power_surplus_at_rpm(neighbor, &ctx);
            assert!(d < 0.0 || d >= surplus, "neighbor {} beats the solution", neighbor);
        }
    }

    #[test]
    fn test_thrust_bounded_by_momentum_limit() {
        let mut p = matched_propeller();
        let mut ctx = cruising_context(6.0, 10.0);
        p.gearbox_mut().update_operating_state(&ctx);
        let thrust = p.thrust(&ctx).unwrap();
        assert!(thrust > 0.0);

        // At zero speed the momentum limit is the whole answer
        ctx.speed_ms = 0.0;
        p.gearbox_mut().update_operating_state(&ctx);
        let bollard = p.thrust(&ctx).unwrap();
        assert!(bollard >= 0.0);
    }

    #[test]
    fn test_zero_speed_efficiency_policy() {
        let mut p = propeller(false);
        let mut ctx = cruising_context(0.0, 10.0);
        ctx.wake_fraction = 0.25;
        p.gearbox_mut().update_operating_state(&ctx);
        // J = 0 → fixed efficiency
        let eff = p.efficiency(&ctx).unwrap();
        assert_eq!(eff, PROPELLER_EFFICIENCY_AT_ZERO_SPEED);
    }

    #[test]
    fn test_set_diameter_recomputes_areas() {
        let mut p = propeller(false);
        let a0 = p.disk_area_m2();
        p.set_diameter(6.0);
        assert!(p.disk_area_m2() > a0);
        assert!((p.expanded_blade_area_m2() - 0.6 * p.disk_area_m2()).abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn prop_b_series_sanity(
            j in 0.1f64..0.55,
            pd in 0.7f64..1.2,
            ar in 0.35f64..0.9,
            z in 3u32..6,
        ) {
            let kt = KT_TABLE.evaluate(j, pd, ar, z as f64, 2.5e6);
            let kq = KQ_TABLE.evaluate(j, pd, ar, z as f64, 2.5e6);
            // Advance ratios below the zero-thrust crossing of the
            // flattest admissible pitch stay positive for both tables
            prop_assert!(kt > 0.0);
            prop_assert!(kq > 0.0);
        }
    }
}
