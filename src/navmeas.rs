// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! Raw GNSS measurement representation
//!
//! Raw measurements of GNSS signals have several aspects to them, from the time
//! of flight of the signal (a.k.a. the pseudorange) to the relative velocity of
//! the satellite (a.k.a. doppler) and the signal quality (a.k.a. CN0). The
//! [`NavigationMeasurement`] struct stores all the needed components of a
//! single signal measurement. Several measurements from the same point in time
//! can be used in conjunction with [satellite ephemeris](crate::ephemeris::Ephemeris)
//! and the [PVT solver function](crate::solver::calc_pvt) to get a position,
//! velocity and time estimate.
//!
//! The noise model lives here as well: [`NavigationMeasurement::pseudorange_variance()`]
//! and [`NavigationMeasurement::doppler_variance()`] map a measurement's code,
//! signal quality, elevation and tracking state to the variances the solver
//! weights it with.

use crate::{ephemeris::SatelliteState, signal::Code, signal::GnssSignal, time::GpsTime};
use std::time::Duration;

const NAV_MEAS_FLAG_CODE_VALID: u16 = 1 << 0;
const NAV_MEAS_FLAG_PHASE_VALID: u16 = 1 << 1;
const NAV_MEAS_FLAG_MEAS_DOPPLER_VALID: u16 = 1 << 2;
const NAV_MEAS_FLAG_COMP_DOPPLER_VALID: u16 = 1 << 3;
const NAV_MEAS_FLAG_HALF_CYCLE_KNOWN: u16 = 1 << 4;
const NAV_MEAS_FLAG_CN0_VALID: u16 = 1 << 5;
pub const NAV_MEAS_FLAG_RAIM_EXCLUSION: u16 = 1 << 6;

/// C/N0 assumed for the noise model when no measured value is available [dB-Hz]
const DEFAULT_CN0_DBHZ: f64 = 30.0;

/// Baseline pseudorange variance of a GPS L1CA measurement [m^2]
const PSEUDORANGE_VAR_GPS_L1CA: f64 = 0.4;
/// Baseline pseudorange variance of GPS L2C and QZSS measurements [m^2]
const PSEUDORANGE_VAR_GPS_L2C: f64 = 1.0;
/// Baseline pseudorange variance of GLONASS measurements [m^2]
const PSEUDORANGE_VAR_GLO: f64 = 8.0;
/// Baseline pseudorange variance of BeiDou measurements [m^2]
const PSEUDORANGE_VAR_BDS: f64 = 0.5;
/// Baseline pseudorange variance of Galileo measurements [m^2]
const PSEUDORANGE_VAR_GAL: f64 = 0.4;
/// Baseline pseudorange variance of anything else [m^2]
const PSEUDORANGE_VAR_DEFAULT: f64 = 1.0;

/// Scale of the C/N0 dependent pseudorange variance term [m^2]
const PSEUDORANGE_CN0_COEFF: f64 = 780.0;
/// Divisor of the C/N0 exponent [dB-Hz]
const PSEUDORANGE_CN0_DIVISOR: f64 = 6.5;
/// Scale of the elevation dependent pseudorange variance term [m^2]
const PSEUDORANGE_ELE_COEFF: f64 = 0.1;
/// Floor on the sine of the elevation angle
const PSEUDORANGE_MIN_SIN_ELE: f64 = 0.1;

/// Baseline Doppler variance [Hz^2]
const DOPPLER_VAR_BASE: f64 = 0.1;
/// Scale of the C/N0 dependent Doppler variance term [Hz^2]
const DOPPLER_CN0_COEFF: f64 = 700.0;

/// Variance multiplier applied when the carrier tracking loop is not locked
const UNLOCKED_VAR_PENALTY: f64 = 16.0;
/// Lock time below which freshly locked signals are de-weighted [s]
const LOCK_TIME_SETTLED_SECS: f64 = 4.0;
/// Variance multiplier of a signal at zero lock time
const LOCK_TIME_MAX_PENALTY: f64 = 4.0;

/// Represents a single raw GNSS measurement
#[derive(Debug, Clone, PartialOrd, PartialEq)]
pub struct NavigationMeasurement {
    raw_pseudorange: f64,
    raw_carrier_phase: f64,
    raw_measured_doppler: f64,
    computed_doppler: f64,
    sat_pos: crate::coords::ECEF,
    sat_vel: crate::coords::ECEF,
    sat_acc: crate::coords::ECEF,
    sat_clock_err: f64,
    sat_clock_err_rate: f64,
    cn0: f64,
    lock_time: f64,
    elevation: f64,
    tot: GpsTime,
    sid: GnssSignal,
    flags: u16,
}

impl NavigationMeasurement {
    /// Makes a navigation measurement with all fields invalidated
    #[must_use]
    pub fn new() -> Self {
        NavigationMeasurement {
            raw_pseudorange: 0.0,
            raw_carrier_phase: 0.0,
            raw_measured_doppler: 0.0,
            computed_doppler: 0.0,
            sat_pos: crate::coords::ECEF::default(),
            sat_vel: crate::coords::ECEF::default(),
            sat_acc: crate::coords::ECEF::default(),
            sat_clock_err: 0.0,
            sat_clock_err_rate: 0.0,
            cn0: 0.0,
            lock_time: 0.0,
            elevation: 0.0,
            tot: GpsTime::unknown(),
            sid: GnssSignal::new(1, Code::GpsL1ca).unwrap(),
            flags: 0,
        }
    }

    /// Sets the pseudorange measurement value and marks it as valid
    ///
    /// Units of meters, time of flight multiplied by speed of light
    pub fn set_pseudorange(&mut self, value: f64) {
        self.raw_pseudorange = value;
        self.flags |= NAV_MEAS_FLAG_CODE_VALID;
    }

    /// Gets the pseudorange measurement, if a valid one has been set
    #[must_use]
    pub fn pseudorange(&self) -> Option<f64> {
        if self.flags & NAV_MEAS_FLAG_CODE_VALID != 0 {
            Some(self.raw_pseudorange)
        } else {
            None
        }
    }

    /// Marks the pseudorange measurement as invalid
    pub fn invalidate_pseudorange(&mut self) {
        self.flags &= !NAV_MEAS_FLAG_CODE_VALID;
    }

    /// Sets the carrier phase measurement and marks it as valid
    ///
    /// Units of cycles
    pub fn set_carrier_phase(&mut self, value: f64) {
        self.raw_carrier_phase = value;
        self.flags |= NAV_MEAS_FLAG_PHASE_VALID;
    }

    /// Gets the carrier phase measurement, if a valid one has been set
    #[must_use]
    pub fn carrier_phase(&self) -> Option<f64> {
        if self.flags & NAV_MEAS_FLAG_PHASE_VALID != 0 {
            Some(self.raw_carrier_phase)
        } else {
            None
        }
    }

    /// Marks the carrier phase measurement as invalid
    pub fn invalidate_carrier_phase(&mut self) {
        self.flags &= !NAV_MEAS_FLAG_PHASE_VALID;
    }

    /// Marks the carrier phase ambiguity as resolved to a half cycle
    pub fn set_half_cycle_known(&mut self, known: bool) {
        if known {
            self.flags |= NAV_MEAS_FLAG_HALF_CYCLE_KNOWN;
        } else {
            self.flags &= !NAV_MEAS_FLAG_HALF_CYCLE_KNOWN;
        }
    }

    /// Checks whether the carrier phase half cycle ambiguity is known
    #[must_use]
    pub fn half_cycle_known(&self) -> bool {
        self.flags & NAV_MEAS_FLAG_HALF_CYCLE_KNOWN != 0
    }

    /// Sets the measured doppler and marks it as valid
    ///
    /// Units of Hertz
    pub fn set_measured_doppler(&mut self, value: f64) {
        self.raw_measured_doppler = value;
        self.flags |= NAV_MEAS_FLAG_MEAS_DOPPLER_VALID;
    }

    /// Gets the measured doppler measurement, if a valid one has been set
    #[must_use]
    pub fn measured_doppler(&self) -> Option<f64> {
        if self.flags & NAV_MEAS_FLAG_MEAS_DOPPLER_VALID != 0 {
            Some(self.raw_measured_doppler)
        } else {
            None
        }
    }

    /// Marks the measured doppler measurement as invalid
    pub fn invalidate_measured_doppler(&mut self) {
        self.flags &= !NAV_MEAS_FLAG_MEAS_DOPPLER_VALID;
    }

    /// Sets the computed doppler and marks it as valid
    ///
    /// The computed Doppler comes from differentiating the carrier phase, and
    /// stands in for the measured Doppler when the receiver does not report
    /// one. Units of Hertz
    pub fn set_computed_doppler(&mut self, value: f64) {
        self.computed_doppler = value;
        self.flags |= NAV_MEAS_FLAG_COMP_DOPPLER_VALID;
    }

    /// Gets the computed doppler, if a valid one has been set
    #[must_use]
    pub fn computed_doppler(&self) -> Option<f64> {
        if self.flags & NAV_MEAS_FLAG_COMP_DOPPLER_VALID != 0 {
            Some(self.computed_doppler)
        } else {
            None
        }
    }

    /// The best available Doppler: the measured one when present, otherwise
    /// the computed one
    #[must_use]
    pub fn any_doppler(&self) -> Option<f64> {
        self.measured_doppler().or_else(|| self.computed_doppler())
    }

    /// Sets the state of the satellite from which the signal originated
    ///
    /// The satellite state is obtained by evaluating the satellite
    /// [ephemeris](crate::ephemeris::Ephemeris::calc_satellite_state) at the
    /// time of transmission of the signal
    pub fn set_satellite_state(&mut self, sat_state: &SatelliteState) {
        self.sat_pos = sat_state.pos;
        self.sat_vel = sat_state.vel;
        self.sat_acc = sat_state.acc;
        self.sat_clock_err = sat_state.clock_err;
        self.sat_clock_err_rate = sat_state.clock_rate_err;
    }

    /// Gets the cached satellite position [m]
    #[must_use]
    pub fn sat_pos(&self) -> crate::coords::ECEF {
        self.sat_pos
    }

    /// Gets the cached satellite velocity [m/s]
    #[must_use]
    pub fn sat_vel(&self) -> crate::coords::ECEF {
        self.sat_vel
    }

    /// Gets the cached satellite acceleration [m/s^2]
    #[must_use]
    pub fn sat_acc(&self) -> crate::coords::ECEF {
        self.sat_acc
    }

    /// Gets the cached satellite clock error [s]
    #[must_use]
    pub fn sat_clock_err(&self) -> f64 {
        self.sat_clock_err
    }

    /// Gets the cached satellite clock error rate [s/s]
    #[must_use]
    pub fn sat_clock_err_rate(&self) -> f64 {
        self.sat_clock_err_rate
    }

    /// Sets the signal CN0 measurement and marks it as valid
    ///
    /// Units of dB-Hz
    pub fn set_cn0(&mut self, value: f64) {
        self.cn0 = value;
        self.flags |= NAV_MEAS_FLAG_CN0_VALID;
    }

    /// Gets the signal CN0 measurement, if a valid one has been set
    #[must_use]
    pub fn cn0(&self) -> Option<f64> {
        if self.flags & NAV_MEAS_FLAG_CN0_VALID != 0 {
            Some(self.cn0)
        } else {
            None
        }
    }

    /// Marks the CN0 measurement as invalid
    pub fn invalidate_cn0(&mut self) {
        self.flags &= !NAV_MEAS_FLAG_CN0_VALID;
    }

    /// Sets the time the signal has been continuously tracked
    ///
    /// Sometimes referred to as the PLL lock time
    pub fn set_lock_time(&mut self, value: Duration) {
        self.lock_time = value.as_secs_f64();
    }

    #[must_use]
    pub fn lock_time(&self) -> Duration {
        Duration::from_secs_f64(self.lock_time)
    }

    /// Sets the elevation of the satellite as seen from the receiver [rad]
    pub fn set_elevation(&mut self, value: f64) {
        self.elevation = value;
    }

    /// Gets the elevation of the satellite [rad]
    #[must_use]
    pub fn elevation(&self) -> f64 {
        self.elevation
    }

    /// Sets the time of transmission of the measurement
    pub fn set_time_of_transmission(&mut self, value: GpsTime) {
        self.tot = value;
    }

    /// Gets the time of transmission of the measurement
    #[must_use]
    pub fn time_of_transmission(&self) -> GpsTime {
        self.tot
    }

    /// Sets the signal ID of the measured signal
    pub fn set_sid(&mut self, value: GnssSignal) {
        self.sid = value;
    }

    #[must_use]
    pub fn sid(&self) -> GnssSignal {
        self.sid
    }

    /// Sets the measurement flags
    pub fn set_flags(&mut self, flags: u16) {
        self.flags = flags;
    }

    #[must_use]
    pub fn flags(&self) -> u16 {
        self.flags
    }

    /// Checks to see if the pseudorange measurement is marked as valid
    #[must_use]
    pub fn pseudorange_is_valid(&self) -> bool {
        self.flags & NAV_MEAS_FLAG_CODE_VALID != 0
    }

    /// Checks whether the measurement carries a usable Doppler of either kind
    #[must_use]
    pub fn doppler_is_valid(&self) -> bool {
        self.flags & (NAV_MEAS_FLAG_MEAS_DOPPLER_VALID | NAV_MEAS_FLAG_COMP_DOPPLER_VALID) != 0
    }

    /// The common tracking state penalty applied to both variances
    fn tracking_penalty(&self) -> f64 {
        /* a carrier loop that has not locked yet is heavily de-weighted */
        let mut penalty = if self.flags & NAV_MEAS_FLAG_PHASE_VALID == 0 {
            UNLOCKED_VAR_PENALTY
        } else {
            1.0
        };

        /* freshly locked signals ramp from 4x down to 1x over the first
         * seconds of lock */
        let lock = self.lock_time.min(LOCK_TIME_SETTLED_SECS);
        penalty *= LOCK_TIME_MAX_PENALTY
            - (LOCK_TIME_MAX_PENALTY - 1.0) * lock / LOCK_TIME_SETTLED_SECS;

        penalty
    }

    fn cn0_or_default(&self) -> f64 {
        self.cn0().unwrap_or(DEFAULT_CN0_DBHZ)
    }

    /// Expected variance of the pseudorange measurement [m^2]
    ///
    /// The model combines a per-code baseline, an exponential term in the
    /// carrier to noise density ratio, and an elevation term, further
    /// penalized by the tracking state.
    #[must_use]
    pub fn pseudorange_variance(&self) -> f64 {
        let base = match self.sid.code() {
            Code::GpsL1ca => PSEUDORANGE_VAR_GPS_L1CA,
            code if code.is_gps() => PSEUDORANGE_VAR_GPS_L2C,
            code if code.is_qzss() => PSEUDORANGE_VAR_GPS_L2C,
            code if code.is_glo() => PSEUDORANGE_VAR_GLO,
            code if code.is_bds() => PSEUDORANGE_VAR_BDS,
            code if code.is_gal() => PSEUDORANGE_VAR_GAL,
            _ => PSEUDORANGE_VAR_DEFAULT,
        };

        let cn0_term =
            PSEUDORANGE_CN0_COEFF * (-self.cn0_or_default() / PSEUDORANGE_CN0_DIVISOR).exp();

        let sin_el = self.elevation.sin().max(PSEUDORANGE_MIN_SIN_ELE);
        let el_term = PSEUDORANGE_ELE_COEFF / (sin_el * sin_el);

        (base + cn0_term + el_term) * self.tracking_penalty()
    }

    /// Expected variance of the Doppler measurement [Hz^2]
    #[must_use]
    pub fn doppler_variance(&self) -> f64 {
        let cn0_term = DOPPLER_CN0_COEFF * (-self.cn0_or_default() / PSEUDORANGE_CN0_DIVISOR).exp();
        (DOPPLER_VAR_BASE + cn0_term) * self.tracking_penalty()
    }
}

impl Default for NavigationMeasurement {
    fn default() -> Self {
        Self::new()
    }
}

/// Encodes a [`Duration`] as an RTCM lock time
///
/// Note: It is encoded according to DF402 from the RTCM 10403.2 Amendment 2
/// specification.  Valid values range from 0 to 15 and the most significant
/// nibble is reserved for future use.
#[must_use]
pub fn encode_lock_time(nav_meas_lock_time: Duration) -> u8 {
    let ms = nav_meas_lock_time.as_millis();
    for encoded in (1..=15u8).rev() {
        if ms >= (32u128 << (u32::from(encoded) - 1)) {
            return encoded;
        }
    }
    0
}

/// Decodes an RTCM lock time value into a [`Duration`]
///
/// Note: It is encoded according to DF402 from the RTCM 10403.2 Amendment 2
/// specification.  Valid values range from 0 to 15 and the most significant
/// nibble is reserved for future use.
#[must_use]
pub fn decode_lock_time(rtcm_lock_time: u8) -> Duration {
    /* the most significant nibble is reserved */
    let value = rtcm_lock_time & 0x0F;
    if value == 0 {
        return Duration::from_secs(0);
    }
    Duration::from_millis(32u64 << (u32::from(value) - 1))
}
