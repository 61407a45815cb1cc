// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! Single epoch PVT solver
//!
//! Several [raw measurements](crate::navmeas::NavigationMeasurement) from the
//! same point in time can be processed to get an estimated PVT (position,
//! velocity, and time) solution.
//!
//! The estimator is an iterated weighted least squares fit of the receiver
//! position and clock against the measured pseudoranges, followed by a second
//! fit of the velocity and clock drift against the Dopplers when requested.
//! Receiver autonomous integrity monitoring (RAIM) checks the residuals of
//! the converged solution and tries to repair it by excluding faulty signals.

use crate::coords::{ECEF, LLHRadians, NED};
use crate::math::ecef2ned_matrix;
use crate::navmeas::NavigationMeasurement;
use crate::signal::{consts as sig_consts, Code, Constellation, GnssSignal};
use crate::time::GpsTime;
use nalgebra::{DMatrix, DVector, Matrix3, Matrix4};
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::time::Duration;

/// Dimension of the position/clock state
const N_STATE: usize = 4;
/// Newton iteration bound of the position fit
const PVT_MAX_ITERATIONS: u32 = 10;
/// Position correction norm below which the fit has converged [m]
const CONVERGENCE_THRESHOLD_M: f64 = 1e-3;
/// Largest number of signals RAIM will exclude before giving up
const RAIM_MAX_EXCLUSIONS: usize = 2;
/// Scale factor of the RAIM residual threshold
const RAIM_METRIC_FACTOR: f64 = 2.5;
/// Solutions with a GDOP above this are rejected
const MAX_GDOP: f64 = 20.0;
/// Lowest believable solution altitude [m]
const MIN_ALTITUDE_M: f64 = -1.0e3;
/// Highest believable solution altitude [m]
const MAX_ALTITUDE_M: f64 = 1.0e6;
/// Velocity bound mandated by the US export regulations, 1000 knots [m/s]
const EXPORT_VELOCITY_LIMIT_M_S: f64 = 514.444_444_444_444_4;
/// WGS84 earth rotation rate used for the Sagnac correction [rad/s]
const EARTH_ROTATION_RATE: f64 = 7.292_115_146_7e-5;
/// Residual above which a pseudorange is flagged as an outlier [m]
const OUTLIER_PSEUDORANGE_THRESHOLD_M: f64 = 30.0;
/// Residual above which a Doppler is flagged as an outlier [m/s]
const OUTLIER_DOPPLER_THRESHOLD_M_S: f64 = 5.0;
/// Residuals this many times over the threshold are left out of the per-code
/// bias estimate
const OUTLIER_BIAS_EXCLUSION_FACTOR: f64 = 10.0;

/// A position velocity and time solution
#[derive(Debug, Clone, PartialOrd, PartialEq)]
pub struct GnssSolution {
    pos_ecef: ECEF,
    pos_llh: LLHRadians,
    vel_ecef: ECEF,
    vel_ned: NED,
    err_cov: [f64; 7],
    vel_cov: [f64; 7],
    clock_offset: f64,
    clock_offset_var: f64,
    clock_drift: f64,
    clock_drift_var: f64,
    time: GpsTime,
    n_sats_used: u8,
    n_sigs_used: u8,
    valid: bool,
    velocity_valid: bool,
}

impl GnssSolution {
    fn new() -> GnssSolution {
        GnssSolution {
            pos_ecef: ECEF::default(),
            pos_llh: LLHRadians::default(),
            vel_ecef: ECEF::default(),
            vel_ned: NED::default(),
            err_cov: [0.0; 7],
            vel_cov: [0.0; 7],
            clock_offset: 0.0,
            clock_offset_var: 0.0,
            clock_drift: 0.0,
            clock_drift_var: 0.0,
            time: GpsTime::unknown(),
            n_sats_used: 0,
            n_sigs_used: 0,
            valid: false,
            velocity_valid: false,
        }
    }

    /// Checks to see if the position solution is valid
    #[must_use]
    pub fn pos_valid(&self) -> bool {
        self.valid
    }

    /// Checks to see if the velocity solution is valid
    #[must_use]
    pub fn vel_valid(&self) -> bool {
        self.velocity_valid
    }

    /// Gets the received position in latitude, longitude, and height coordinates
    #[must_use]
    pub fn pos_llh(&self) -> Option<LLHRadians> {
        if self.pos_valid() {
            Some(self.pos_llh)
        } else {
            None
        }
    }

    /// Gets the received position in earth centered earth fixed cartesian coordinates
    #[must_use]
    pub fn pos_ecef(&self) -> Option<ECEF> {
        if self.pos_valid() {
            Some(self.pos_ecef)
        } else {
            None
        }
    }

    /// Gets the receiver velocity in local north east down coordinates
    #[must_use]
    pub fn vel_ned(&self) -> Option<NED> {
        if self.vel_valid() {
            Some(self.vel_ned)
        } else {
            None
        }
    }

    /// Gets the receiver velocity in earth centered earth fixed cartesian coordinates
    #[must_use]
    pub fn vel_ecef(&self) -> Option<ECEF> {
        if self.vel_valid() {
            Some(self.vel_ecef)
        } else {
            None
        }
    }

    /// Gets the receiver position covariance matrix
    ///
    /// This is the row-first upper diagonal matrix of error covariances
    /// in x, y, z (all receiver clock covariance terms are ignored).
    ///
    /// Index 6 is the GDOP.
    #[must_use]
    pub fn err_cov(&self) -> Option<&[f64; 7]> {
        if self.pos_valid() {
            Some(&self.err_cov)
        } else {
            None
        }
    }

    /// Gets the receiver velocity covariance matrix
    ///
    /// See [`GnssSolution::err_cov`] for representation, minus the DOP element
    #[must_use]
    pub fn vel_cov(&self) -> Option<&[f64; 7]> {
        if self.vel_valid() {
            Some(&self.vel_cov)
        } else {
            None
        }
    }

    /// Gets the receiver clock offset [s]
    #[must_use]
    pub fn clock_offset(&self) -> f64 {
        self.clock_offset
    }

    /// Gets the receiver clock offset variance [s^2]
    #[must_use]
    pub fn clock_offset_var(&self) -> f64 {
        self.clock_offset_var
    }

    /// Gets the receiver clock drift [s/s]
    #[must_use]
    pub fn clock_drift(&self) -> f64 {
        self.clock_drift
    }

    /// Gets the receiver clock drift variance [(s/s)^2]
    #[must_use]
    pub fn clock_drift_var(&self) -> f64 {
        self.clock_drift_var
    }

    /// Gets the corrected time of the measurement
    #[must_use]
    pub fn time(&self) -> GpsTime {
        self.time
    }

    /// Gets the number of satellites used in the solution
    #[must_use]
    pub fn sats_used(&self) -> u8 {
        self.n_sats_used
    }

    /// Gets the number of signals used in the solution
    #[must_use]
    pub fn signals_used(&self) -> u8 {
        self.n_sigs_used
    }
}

/// Dilution of precision (DOP) of a solution
///
/// DOP is a measurement of how the satellite geometry impacts the precision of
/// the solution
#[derive(Debug, Clone, PartialOrd, PartialEq)]
pub struct Dops {
    pdop: f64,
    gdop: f64,
    tdop: f64,
    hdop: f64,
    vdop: f64,
}

impl Dops {
    /// Gets the position (3D) dilution of precision
    #[must_use]
    pub fn pdop(&self) -> f64 {
        self.pdop
    }

    /// Gets the geometric dilution of precision
    #[must_use]
    pub fn gdop(&self) -> f64 {
        self.gdop
    }

    /// Gets the time dilution of precision
    #[must_use]
    pub fn tdop(&self) -> f64 {
        self.tdop
    }

    /// Gets the horizontal dilution of precision
    #[must_use]
    pub fn hdop(&self) -> f64 {
        self.hdop
    }

    /// Gets the vertical dilution of precision
    #[must_use]
    pub fn vdop(&self) -> f64 {
        self.vdop
    }
}

/// Different strategies of how to choose which measurements to use in a solution
#[derive(Debug, Copy, Clone, PartialOrd, Ord, PartialEq, Eq, Hash)]
pub enum ProcessingStrategy {
    /// Only use GPS measurements
    GpsOnly,
    /// Use every measurement given
    AllConstellations,
    /// Use every GPS L1CA measurement, topping up with other signals only when
    /// there are too few for RAIM to operate on the GPS L1CA subset alone
    GpsL1caWhenPossible,
    /// Use GPS L1CA and Galileo E1B measurements
    L1Only,
}

/// Holds the settings to customize how the GNSS solution is calculated
#[derive(Debug, Copy, Clone, PartialOrd, Ord, PartialEq, Eq, Hash)]
pub struct PvtSettings {
    strategy: ProcessingStrategy,
    disable_raim: bool,
    disable_velocity: bool,
}

impl PvtSettings {
    /// Creates a default, least common denominator, set of settings
    ///
    /// Note: The default settings consist of
    ///  * Processing all constellations and signals
    ///  * Disabling RAIM
    ///  * Disabling velocity calculation
    #[must_use]
    pub fn new() -> PvtSettings {
        PvtSettings {
            strategy: ProcessingStrategy::AllConstellations,
            disable_raim: true,
            disable_velocity: true,
        }
    }

    /// Sets the processing strategy to use
    #[must_use]
    pub fn set_strategy(self, strategy: ProcessingStrategy) -> PvtSettings {
        PvtSettings { strategy, ..self }
    }

    /// Enables use of RAIM (receiver autonomous integrity monitoring)
    ///
    /// RAIM is an algorithm to detect and remove invalid measurements. Enabling
    /// RAIM means additional computations must take place to ensure the validity
    /// of the solution
    #[must_use]
    pub fn enable_raim(self) -> PvtSettings {
        PvtSettings {
            disable_raim: false,
            ..self
        }
    }

    /// Disables use of RAIM
    ///
    /// See [`PvtSettings::enable_raim()`] for more details
    #[must_use]
    pub fn disable_raim(self) -> PvtSettings {
        PvtSettings {
            disable_raim: true,
            ..self
        }
    }

    /// Enables calculation of a velocity solution
    ///
    /// Note: this requires the presence of doppler measurements
    #[must_use]
    pub fn enable_velocity(self) -> PvtSettings {
        PvtSettings {
            disable_velocity: false,
            ..self
        }
    }

    /// Disables calculation of a velocity solution
    #[must_use]
    pub fn disable_velocity(self) -> PvtSettings {
        PvtSettings {
            disable_velocity: true,
            ..self
        }
    }
}

impl Default for PvtSettings {
    fn default() -> PvtSettings {
        PvtSettings::new()
    }
}

/// Set of signals, as reported by the RAIM exclusion and outlier flagging
#[derive(Debug, Clone, Default)]
pub struct SidSet {
    sids: HashSet<GnssSignal>,
}

impl SidSet {
    /// Makes an empty set
    #[must_use]
    pub fn new() -> SidSet {
        SidSet::default()
    }

    /// Gets the number of satellites in the set
    #[must_use]
    pub fn sat_count(&self) -> u32 {
        let sats: HashSet<(Constellation, u16)> = self
            .sids
            .iter()
            .map(|sid| (sid.to_constellation(), sid.sat()))
            .collect();
        sats.len() as u32
    }

    /// Gets the number of signals in the set
    #[must_use]
    pub fn sig_count(&self) -> u32 {
        self.sids.len() as u32
    }

    /// Checks to see if a signal is present within the set
    #[must_use]
    pub fn contains(&self, sid: GnssSignal) -> bool {
        self.sids.contains(&sid)
    }

    fn insert(&mut self, sid: GnssSignal) {
        self.sids.insert(sid);
    }
}

/// Causes of a failed PVT solution
#[derive(Debug, Copy, Clone, PartialOrd, Ord, PartialEq, Eq, Hash)]
pub enum PvtError {
    /// The PDOP of the solution was unacceptably high
    HighPdop,
    /// Altitude of the solution was unacceptable
    UnreasonableAltitude,
    /// The velocity of the solution was >= 1000 kts
    HighVelocity,
    /// RAIM check and repair was unsuccessful
    RaimRepairFailed,
    /// RAIM check and repair was impossible due to not enough measurements
    RaimRepairImpossible,
    /// The least squares iteration failed to converge
    FailedToConverge,
    /// There were not enough measurements for a solution
    NotEnoughMeasurements,
}

/// Human readable failure messages, indexed by [`PvtError`] discriminant
const PVT_ERR_MSG: [&str; 7] = [
    "PDOP is too high",
    "Altitude is unreasonable",
    "Velocity is over the limit",
    "RAIM check and repair was unsuccessful",
    "RAIM check and repair was impossible, not enough measurements",
    "The least squares iteration failed to converge",
    "There were not enough measurements for a solution",
];

impl PvtError {
    /// The numeric return code of the failure, as reported on the wire
    #[must_use]
    pub fn code(&self) -> i8 {
        match self {
            PvtError::HighPdop => -1,
            PvtError::UnreasonableAltitude => -2,
            PvtError::HighVelocity => -3,
            PvtError::RaimRepairFailed => -4,
            PvtError::RaimRepairImpossible => -5,
            PvtError::FailedToConverge => -6,
            PvtError::NotEnoughMeasurements => -7,
        }
    }

    #[must_use]
    pub fn as_string_lossy(&self) -> Cow<'static, str> {
        Cow::Borrowed(PVT_ERR_MSG[*self as usize])
    }
}

impl fmt::Display for PvtError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PVT Error: {}", self.as_string_lossy())
    }
}

impl std::error::Error for PvtError {}

/// Indicates action taken while successfully calculating a solution
#[derive(Debug, Copy, Clone, PartialOrd, Ord, PartialEq, Eq, Hash)]
pub enum PvtStatus {
    /// Solution OK and RAIM check passed
    RaimPassed,
    /// Repaired solution, using fewer observations. The [`SidSet`] contains the removed measurements
    RepairedSolution,
    /// Solution OK, but the RAIM check was not used (not enough measurements for it) or disabled
    RaimSkipped,
}

/// Converged least squares fit
struct PvtSolve {
    rx_state: [f64; 8],
    cov: Matrix4<f64>,
    vel_cov: Option<Matrix4<f64>>,
    geometry: DMatrix<f64>,
    pr_residuals: DVector<f64>,
    vel_residuals: Option<DVector<f64>>,
}

/// Try to calculate a single point GNSS solution
///
/// The returned [`SidSet`] lists the signals excluded by RAIM, plus any
/// unused signals flagged as outliers against the final solution.
///
/// # Errors
///
/// Returns a [`PvtError`] when no solution could be produced from the given
/// measurements.
pub fn calc_pvt(
    measurements: &[NavigationMeasurement],
    tor: GpsTime,
    settings: PvtSettings,
) -> Result<(PvtStatus, GnssSolution, Dops, SidSet), PvtError> {
    assert!(measurements.len() <= u8::MAX as usize);
    calc_pvt_internal(measurements, tor, settings, false)
}

fn calc_pvt_internal(
    measurements: &[NavigationMeasurement],
    tor: GpsTime,
    settings: PvtSettings,
    is_pdop_retry: bool,
) -> Result<(PvtStatus, GnssSolution, Dops, SidSet), PvtError> {
    let selected = select_measurements(measurements, settings.strategy, settings.disable_velocity);

    if sat_count(&selected) < N_STATE {
        return Err(PvtError::NotEnoughMeasurements);
    }

    let allow_gps_fallback = !is_pdop_retry && settings.strategy != ProcessingStrategy::GpsOnly;
    let (status, solve, used, mut removed_sids) =
        solve_with_raim(&selected, settings, allow_gps_fallback)?;

    let used_meas: Vec<&NavigationMeasurement> = used.iter().map(|&i| selected[i]).collect();

    let dops = compute_dops(&solve.geometry, &solve.rx_state)
        .ok_or(PvtError::FailedToConverge)?;
    if dops.gdop > MAX_GDOP {
        if !is_pdop_retry && settings.strategy != ProcessingStrategy::AllConstellations {
            /* one retry using everything we were given */
            let retry_settings = settings.set_strategy(ProcessingStrategy::AllConstellations);
            return calc_pvt_internal(measurements, tor, retry_settings, true);
        }
        return Err(PvtError::HighPdop);
    }

    let mut soln = GnssSolution::new();
    soln.pos_ecef = ECEF::new(solve.rx_state[0], solve.rx_state[1], solve.rx_state[2]);
    soln.pos_llh = soln.pos_ecef.to_llh();

    let altitude = soln.pos_llh.height();
    if !(MIN_ALTITUDE_M..=MAX_ALTITUDE_M).contains(&altitude) {
        return Err(PvtError::UnreasonableAltitude);
    }

    soln.err_cov = [
        solve.cov[(0, 0)],
        solve.cov[(0, 1)],
        solve.cov[(0, 2)],
        solve.cov[(1, 1)],
        solve.cov[(1, 2)],
        solve.cov[(2, 2)],
        dops.gdop,
    ];
    soln.clock_offset = solve.rx_state[3] / sig_consts::C;
    soln.clock_offset_var = solve.cov[(3, 3)] / (sig_consts::C * sig_consts::C);

    if !settings.disable_velocity {
        soln.vel_ecef = ECEF::new(solve.rx_state[4], solve.rx_state[5], solve.rx_state[6]);
        if soln.vel_ecef.norm() >= EXPORT_VELOCITY_LIMIT_M_S {
            return Err(PvtError::HighVelocity);
        }
        soln.vel_ned = soln.vel_ecef.ned_vector_at(&soln.pos_ecef);
        soln.clock_drift = solve.rx_state[7] / sig_consts::C;
        if let Some(vel_cov) = &solve.vel_cov {
            soln.vel_cov = [
                vel_cov[(0, 0)],
                vel_cov[(0, 1)],
                vel_cov[(0, 2)],
                vel_cov[(1, 1)],
                vel_cov[(1, 2)],
                vel_cov[(2, 2)],
                0.0,
            ];
            soln.clock_drift_var = vel_cov[(3, 3)] / (sig_consts::C * sig_consts::C);
        }
        soln.velocity_valid = true;
    }

    /* report the time of the measurement corrected by the estimated bias */
    let mut time = tor;
    if soln.clock_offset >= 0.0 {
        time -= Duration::from_secs_f64(soln.clock_offset);
    } else {
        time += Duration::from_secs_f64(-soln.clock_offset);
    }
    soln.time = time;

    soln.n_sigs_used = used_meas.len() as u8;
    soln.n_sats_used = sat_count(&used_meas) as u8;
    soln.valid = true;

    /* check the leftover measurements for outliers against the solution */
    let used_sids: HashSet<GnssSignal> = used_meas.iter().map(|m| m.sid()).collect();
    flag_outliers(
        measurements,
        &used_sids,
        &solve.rx_state,
        settings.disable_velocity,
        &mut removed_sids,
    );

    Ok((status, soln, dops, removed_sids))
}

/// Applies the measurement selection strategy, preserving input order
fn select_measurements<'a>(
    measurements: &'a [NavigationMeasurement],
    strategy: ProcessingStrategy,
    disable_velocity: bool,
) -> Vec<&'a NavigationMeasurement> {
    let usable = |m: &&NavigationMeasurement| {
        m.pseudorange().is_some() && (disable_velocity || m.doppler_is_valid())
    };

    match strategy {
        ProcessingStrategy::AllConstellations => measurements.iter().filter(usable).collect(),
        ProcessingStrategy::GpsOnly => measurements
            .iter()
            .filter(usable)
            .filter(|m| m.sid().code().is_gps())
            .collect(),
        ProcessingStrategy::L1Only => measurements
            .iter()
            .filter(usable)
            .filter(|m| matches!(m.sid().code(), Code::GpsL1ca | Code::GalE1b))
            .collect(),
        ProcessingStrategy::GpsL1caWhenPossible => {
            let n_l1ca = measurements
                .iter()
                .filter(usable)
                .filter(|m| m.sid().code() == Code::GpsL1ca)
                .count();

            if n_l1ca >= N_STATE + RAIM_MAX_EXCLUSIONS {
                measurements
                    .iter()
                    .filter(usable)
                    .filter(|m| m.sid().code() == Code::GpsL1ca)
                    .collect()
            } else {
                /* top up with other signals, in sequence, until RAIM has
                 * enough redundancy to work with */
                let mut out: Vec<&NavigationMeasurement> = Vec::new();
                let mut n_other = 0;
                for m in measurements.iter().filter(usable) {
                    if m.sid().code() == Code::GpsL1ca {
                        out.push(m);
                    } else if n_l1ca + n_other < N_STATE + RAIM_MAX_EXCLUSIONS {
                        out.push(m);
                        n_other += 1;
                    }
                }
                out
            }
        }
    }
}

fn sat_count(measurements: &[&NavigationMeasurement]) -> usize {
    let sats: HashSet<(Constellation, u16)> = measurements
        .iter()
        .map(|m| (m.sid().to_constellation(), m.sid().sat()))
        .collect();
    sats.len()
}

/// Runs the least squares fit and the RAIM check/repair cycle
fn solve_with_raim(
    selected: &[&NavigationMeasurement],
    settings: PvtSettings,
    allow_gps_fallback: bool,
) -> Result<(PvtStatus, PvtSolve, Vec<usize>, SidSet), PvtError> {
    let all: Vec<usize> = (0..selected.len()).collect();
    let solve = pvt_solve(selected, &all, settings.disable_velocity);

    if settings.disable_raim {
        return match solve {
            Some(solve) => Ok((PvtStatus::RaimSkipped, solve, all, SidSet::new())),
            None => Err(PvtError::FailedToConverge),
        };
    }

    if let Some(solve) = solve {
        if selected.len() <= N_STATE {
            /* no redundancy to check against */
            return Ok((PvtStatus::RaimSkipped, solve, all, SidSet::new()));
        }

        let (metric, threshold) = raim_metric(selected, &all, &solve, settings.disable_velocity);
        if metric < threshold {
            /* a pass is only meaningful when a repair would also have been
             * possible, otherwise the check is reported as skipped */
            return if selected.len() >= N_STATE + 2 {
                Ok((PvtStatus::RaimPassed, solve, all, SidSet::new()))
            } else {
                Ok((PvtStatus::RaimSkipped, solve, all, SidSet::new()))
            };
        }

        #[cfg(feature = "log")]
        log::debug!("RAIM check failed, metric {metric:.2} over threshold {threshold:.2}");
    }

    raim_repair(selected, settings, allow_gps_fallback)
}

/// Iteratively exclude signals until the residual check passes
fn raim_repair(
    selected: &[&NavigationMeasurement],
    settings: PvtSettings,
    allow_gps_fallback: bool,
) -> Result<(PvtStatus, PvtSolve, Vec<usize>, SidSet), PvtError> {
    if selected.len() <= N_STATE {
        return Err(PvtError::RaimRepairImpossible);
    }

    let mut current: Vec<usize> = (0..selected.len()).collect();
    let mut excluded = SidSet::new();

    for _round in 0..RAIM_MAX_EXCLUSIONS {
        /* try each remaining signal as the exclusion candidate and keep the
         * one producing the best residual metric */
        let mut best: Option<(usize, f64, bool, PvtSolve)> = None;

        for (slot, &candidate) in current.iter().enumerate() {
            let subset: Vec<usize> = current
                .iter()
                .copied()
                .filter(|&i| i != candidate)
                .collect();

            let subset_meas: Vec<&NavigationMeasurement> =
                subset.iter().map(|&i| selected[i]).collect();
            if sat_count(&subset_meas) < N_STATE {
                continue;
            }

            /* a candidate fit that does not converge means this exclusion
             * did not help */
            let Some(solve) = pvt_solve(selected, &subset, settings.disable_velocity) else {
                continue;
            };

            let n_eff = effective_residual_count(subset.len(), settings.disable_velocity);
            let s_eff = effective_state_count(settings.disable_velocity);
            if n_eff <= s_eff {
                /* not enough redundancy left to validate the candidate */
                continue;
            }

            let (metric, threshold) =
                raim_metric(selected, &subset, &solve, settings.disable_velocity);
            let passes = metric < threshold;

            let better = match &best {
                Some((_, best_metric, _, _)) => metric < *best_metric,
                None => true,
            };
            if better {
                best = Some((slot, metric, passes, solve));
            }
        }

        let Some((slot, _metric, passes, solve)) = best else {
            break;
        };

        let removed = current.remove(slot);
        excluded.insert(selected[removed].sid());

        if passes {
            #[cfg(feature = "log")]
            log::debug!("RAIM repaired the solution by excluding {}", selected[removed].sid());
            return Ok((PvtStatus::RepairedSolution, solve, current, excluded));
        }
    }

    /* last resort, retry with the GPS signals alone */
    if allow_gps_fallback {
        let gps: Vec<usize> = (0..selected.len())
            .filter(|&i| selected[i].sid().code().is_gps())
            .collect();
        let gps_meas: Vec<&NavigationMeasurement> = gps.iter().map(|&i| selected[i]).collect();

        if !gps.is_empty() && gps.len() < selected.len() && sat_count(&gps_meas) >= N_STATE {
            if let Some(solve) = pvt_solve(selected, &gps, settings.disable_velocity) {
                let n_eff = effective_residual_count(gps.len(), settings.disable_velocity);
                let s_eff = effective_state_count(settings.disable_velocity);
                if n_eff > s_eff {
                    let (metric, threshold) =
                        raim_metric(selected, &gps, &solve, settings.disable_velocity);
                    if metric < threshold {
                        let mut excluded = SidSet::new();
                        for i in 0..selected.len() {
                            if !gps.contains(&i) {
                                excluded.insert(selected[i].sid());
                            }
                        }
                        return Ok((PvtStatus::RepairedSolution, solve, gps, excluded));
                    }
                }
            }
        }
    }

    Err(PvtError::RaimRepairFailed)
}

fn effective_residual_count(n_meas: usize, disable_velocity: bool) -> usize {
    if disable_velocity {
        n_meas
    } else {
        2 * n_meas
    }
}

fn effective_state_count(disable_velocity: bool) -> usize {
    if disable_velocity {
        N_STATE
    } else {
        2 * N_STATE
    }
}

/// Normalized residual metric of a converged fit, and the threshold it is
/// held against
fn raim_metric(
    selected: &[&NavigationMeasurement],
    used: &[usize],
    solve: &PvtSolve,
    disable_velocity: bool,
) -> (f64, f64) {
    let mut sum_sq = 0.0;

    for (row, &idx) in used.iter().enumerate() {
        let m = selected[idx];
        let pr_var = m.pseudorange_variance();
        let sigma = if pr_var > 0.0 { pr_var.sqrt() } else { 1.0 };
        let nr = solve.pr_residuals[row] / sigma;
        sum_sq += nr * nr;

        if let Some(vel_residuals) = &solve.vel_residuals {
            let lambda = m.sid().wavelength();
            let dop_var = m.doppler_variance();
            let sigma = if dop_var > 0.0 {
                dop_var.sqrt() * lambda
            } else {
                1.0
            };
            let nr = vel_residuals[row] / sigma;
            sum_sq += nr * nr;
        }
    }

    let n = effective_residual_count(used.len(), disable_velocity) as f64;
    let s = effective_state_count(disable_velocity) as f64;

    let metric = (sum_sq / (n - s)).sqrt();
    let threshold = RAIM_METRIC_FACTOR * (n / (n - s)).sqrt();
    (metric, threshold)
}

/// Iterated weighted least squares fit of position and clock, optionally
/// followed by the velocity fit
///
/// Returns `None` when the iteration fails to converge or the geometry is
/// singular.
fn pvt_solve(
    selected: &[&NavigationMeasurement],
    used: &[usize],
    disable_velocity: bool,
) -> Option<PvtSolve> {
    let n = used.len();
    let mut rx_state = [0.0f64; 8];
    let mut geometry = DMatrix::zeros(n, N_STATE);
    let mut omp = DVector::zeros(n);

    let weights = DVector::from_iterator(
        n,
        used.iter().map(|&i| {
            let var = selected[i].pseudorange_variance();
            if var > 0.0 {
                1.0 / var
            } else {
                1.0
            }
        }),
    );

    let mut converged = false;
    for _ in 0..PVT_MAX_ITERATIONS {
        build_geometry(selected, used, &rx_state, &mut geometry, &mut omp);

        let gtw = geometry.transpose() * DMatrix::from_diagonal(&weights);
        let normal: Matrix4<f64> = (&gtw * &geometry).fixed_view::<4, 4>(0, 0).into_owned();
        let inv = normal.try_inverse()?;
        let correction = inv * (&gtw * &omp);

        for i in 0..N_STATE {
            rx_state[i] += correction[i];
        }

        if correction.fixed_rows::<3>(0).norm() < CONVERGENCE_THRESHOLD_M {
            converged = true;
            break;
        }
    }

    if !converged {
        return None;
    }

    /* residuals and geometry at the converged state */
    build_geometry(selected, used, &rx_state, &mut geometry, &mut omp);
    let gtw = geometry.transpose() * DMatrix::from_diagonal(&weights);
    let normal: Matrix4<f64> = (&gtw * &geometry).fixed_view::<4, 4>(0, 0).into_owned();
    let cov = normal.try_inverse()?;

    let (vel_residuals, vel_cov) = if disable_velocity {
        (None, None)
    } else {
        let (residuals, cov) = vel_solve(selected, used, &geometry, &mut rx_state)?;
        (Some(residuals), Some(cov))
    };

    Some(PvtSolve {
        rx_state,
        cov,
        vel_cov,
        geometry,
        pr_residuals: omp,
        vel_residuals,
    })
}

/// Builds the geometry matrix rows and the observed minus predicted
/// pseudoranges for the current state estimate
fn build_geometry(
    selected: &[&NavigationMeasurement],
    used: &[usize],
    rx_state: &[f64; 8],
    geometry: &mut DMatrix<f64>,
    omp: &mut DVector<f64>,
) {
    let rx_pos = ECEF::new(rx_state[0], rx_state[1], rx_state[2]);

    for (row, &idx) in used.iter().enumerate() {
        let m = selected[idx];
        let sat_pos = m.sat_pos();

        /* Sagnac correction: rotate the satellite position by the small angle
         * the earth turns through during the signal flight time */
        let tau = (sat_pos - rx_pos).norm() / sig_consts::C;
        let wt = EARTH_ROTATION_RATE * tau;
        let rotated = ECEF::new(
            sat_pos.x() + wt * sat_pos.y(),
            sat_pos.y() - wt * sat_pos.x(),
            sat_pos.z(),
        );

        let los = rotated - rx_pos;
        let dist = los.norm();

        let predicted = dist + rx_state[3];
        let observed = m.pseudorange().unwrap_or(0.0) + sig_consts::C * m.sat_clock_err();
        omp[row] = observed - predicted;

        geometry[(row, 0)] = -los.x() / dist;
        geometry[(row, 1)] = -los.y() / dist;
        geometry[(row, 2)] = -los.z() / dist;
        geometry[(row, 3)] = 1.0;
    }
}

/// Velocity and clock drift fit, reusing the converged geometry matrix
fn vel_solve(
    selected: &[&NavigationMeasurement],
    used: &[usize],
    geometry: &DMatrix<f64>,
    rx_state: &mut [f64; 8],
) -> Option<(DVector<f64>, Matrix4<f64>)> {
    let n = used.len();

    let mut rhs = DVector::zeros(n);
    let mut weights = DVector::zeros(n);
    for (row, &idx) in used.iter().enumerate() {
        let m = selected[idx];
        let lambda = m.sid().wavelength();
        let doppler = m.any_doppler()?;

        /* line of sight from the geometry rows */
        let u = nalgebra::Vector3::new(
            -geometry[(row, 0)],
            -geometry[(row, 1)],
            -geometry[(row, 2)],
        );

        rhs[row] = -doppler * lambda - u.dot(m.sat_vel().as_vector_ref());

        let var = m.doppler_variance() * lambda * lambda;
        weights[row] = if var > 0.0 { 1.0 / var } else { 1.0 };
    }

    let gtw = geometry.transpose() * DMatrix::from_diagonal(&weights);
    let normal: Matrix4<f64> = (&gtw * geometry).fixed_view::<4, 4>(0, 0).into_owned();
    let cov = normal.try_inverse()?;
    let estimate = cov * (&gtw * &rhs);

    for i in 0..N_STATE {
        rx_state[N_STATE + i] = estimate[i];
    }

    let residuals = rhs - geometry * estimate;
    Some((residuals, cov))
}

/// Unweighted dilution of precision figures of the converged geometry
fn compute_dops(geometry: &DMatrix<f64>, rx_state: &[f64; 8]) -> Option<Dops> {
    let normal: Matrix4<f64> = (geometry.transpose() * geometry)
        .fixed_view::<4, 4>(0, 0)
        .into_owned();
    let h = normal.try_inverse()?;

    let pdop_sq = h[(0, 0)] + h[(1, 1)] + h[(2, 2)];
    let tdop_sq = h[(3, 3)];
    let gdop_sq = pdop_sq + tdop_sq;

    /* project the position covariance onto the local vertical */
    let pos = ECEF::new(rx_state[0], rx_state[1], rx_state[2]);
    let m = ecef2ned_matrix(pos.to_llh());
    let down = nalgebra::Vector3::new(m[(2, 0)], m[(2, 1)], m[(2, 2)]);
    let h3: Matrix3<f64> = h.fixed_view::<3, 3>(0, 0).into_owned();
    let vdop_sq = (down.transpose() * h3 * down)[(0, 0)];
    let hdop_sq = pdop_sq - vdop_sq;

    Some(Dops {
        pdop: pdop_sq.sqrt(),
        gdop: gdop_sq.sqrt(),
        tdop: tdop_sq.sqrt(),
        hdop: hdop_sq.sqrt(),
        vdop: vdop_sq.sqrt(),
    })
}

/// Flags measurements left out of the solve whose residuals against the
/// final solution are beyond the outlier thresholds
///
/// Signals of the same code frequently share a common bias (e.g. an
/// inter-frequency hardware delay), so a per-code mean bias is removed before
/// thresholding. Residuals well beyond the threshold are left out of the bias
/// estimate so a single large fault cannot mask itself.
fn flag_outliers(
    measurements: &[NavigationMeasurement],
    used_sids: &HashSet<GnssSignal>,
    rx_state: &[f64; 8],
    disable_velocity: bool,
    removed_sids: &mut SidSet,
) {
    let rx_pos = ECEF::new(rx_state[0], rx_state[1], rx_state[2]);
    let rx_vel = ECEF::new(rx_state[4], rx_state[5], rx_state[6]);

    struct Residual {
        sid: GnssSignal,
        pseudorange: f64,
        doppler: Option<f64>,
    }

    let mut by_code: HashMap<Code, Vec<Residual>> = HashMap::new();

    for m in measurements {
        if used_sids.contains(&m.sid()) {
            continue;
        }
        let Some(pseudorange) = m.pseudorange() else {
            continue;
        };

        let sat_pos = m.sat_pos();
        let tau = (sat_pos - rx_pos).norm() / sig_consts::C;
        let wt = EARTH_ROTATION_RATE * tau;
        let rotated = ECEF::new(
            sat_pos.x() + wt * sat_pos.y(),
            sat_pos.y() - wt * sat_pos.x(),
            sat_pos.z(),
        );
        let los = rotated - rx_pos;
        let dist = los.norm();

        let pr_residual =
            pseudorange + sig_consts::C * m.sat_clock_err() - (dist + rx_state[3]);

        let doppler_residual = if disable_velocity {
            None
        } else {
            m.any_doppler().map(|doppler| {
                let u = (1.0 / dist) * los;
                -doppler * m.sid().wavelength()
                    - u.dot(&(m.sat_vel() - rx_vel))
                    - rx_state[7]
            })
        };

        by_code.entry(m.sid().code()).or_default().push(Residual {
            sid: m.sid(),
            pseudorange: pr_residual,
            doppler: doppler_residual,
        });
    }

    for residuals in by_code.values() {
        let pr_bias = robust_mean(
            residuals.iter().map(|r| r.pseudorange),
            OUTLIER_BIAS_EXCLUSION_FACTOR * OUTLIER_PSEUDORANGE_THRESHOLD_M,
        );
        let dop_bias = robust_mean(
            residuals.iter().filter_map(|r| r.doppler),
            OUTLIER_BIAS_EXCLUSION_FACTOR * OUTLIER_DOPPLER_THRESHOLD_M_S,
        );

        for r in residuals {
            if (r.pseudorange - pr_bias).abs() > OUTLIER_PSEUDORANGE_THRESHOLD_M {
                removed_sids.insert(r.sid);
                continue;
            }
            if let Some(doppler) = r.doppler {
                if (doppler - dop_bias).abs() > OUTLIER_DOPPLER_THRESHOLD_M_S {
                    removed_sids.insert(r.sid);
                }
            }
        }
    }
}

/// Mean of the values whose magnitude stays below the cutoff
fn robust_mean(values: impl Iterator<Item = f64>, cutoff: f64) -> f64 {
    let mut sum = 0.0;
    let mut count = 0;
    for v in values {
        if v.abs() <= cutoff {
            sum += v;
            count += 1;
        }
    }
    if count == 0 {
        0.0
    } else {
        sum / f64::from(count)
    }
}
