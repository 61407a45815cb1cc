// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! Evaluation of satellite almanacs
//!
//! GNSS satellites broadcast almanac data which contains coarse position
//! information as well as satellite health information.
//!
//! Satellite almanac data is considered valid for a longer time than ephemeris
//! data, but the satellite position is also much less accurate. As such it
//! should only be used for very rough estimates or for determining if a
//! satellite is visible at a particular location and time. For accurate
//! positioning the broadcast ephemeris should be used instead.
//!
//! An almanac is a reduced set of the ephemeris parameters, so evaluating one
//! reuses the [ephemeris math](crate::ephemeris) with the harmonic and rate
//! terms zeroed out.

use crate::{
    coords::{AzimuthElevation, ECEF},
    ephemeris::{
        Ephemeris, EphemerisTerms, GroupDelay, InvalidEphemeris, KeplerTerms, XyzTerms,
    },
    signal::{Constellation, GnssSignal},
    time::GpsTime,
};

/// Representation of a satellite state from evaluating the almanac at a
/// certain time.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SatelliteState {
    /// Calculated satellite position, in meters
    pub pos: ECEF,
    /// Calculated satellite velocity, in meters/second
    pub vel: ECEF,
    /// Calculated satellite acceleration, meters/second/second
    pub acc: ECEF,
    /// Calculated satellite clock error, in seconds
    pub clock_err: f64,
    /// Calculated satellite clock error rate, in seconds/second
    pub clock_rate_err: f64,
}

/// An error indicating that the constellation of an almanac is
/// not currently supported
#[derive(Debug, Copy, Clone, PartialOrd, Ord, PartialEq, Eq, Hash, thiserror::Error)]
#[error("Unsupported almanac constellation ({0:?})")]
pub struct UnsupportedConstellation(Constellation);

/// An error indicating that an almanac was evaluated at a time that
/// it was not valid at
#[derive(Debug, Copy, Clone, PartialOrd, PartialEq, thiserror::Error)]
#[error("Almanac is not valid at {0:?}")]
pub struct InvalidTime(GpsTime);

/// Orbital terms of an almanac
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum AlmanacTerms {
    /// Reduced Keplerian elements, broadcast by GPS
    Kepler(AlmanacKepler),
    /// Cartesian state, broadcast by SBAS
    Xyz(AlmanacXyz),
}

/// The reduced Keplerian element set of an almanac
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AlmanacKepler {
    /// Mean anomaly at the reference time [rad]
    pub m0: f64,
    /// Eccentricity
    pub ecc: f64,
    /// Square root of the semi-major axis [m^(1/2)]
    pub sqrta: f64,
    /// Longitude of the ascending node at the weekly epoch [rad]
    pub omega0: f64,
    /// Rate of right ascension [rad/s]
    pub omegadot: f64,
    /// Argument of perigee [rad]
    pub w: f64,
    /// Inclination at the reference time [rad]
    pub inc: f64,
    /// Clock bias [s]
    pub af0: f64,
    /// Clock drift [s/s]
    pub af1: f64,
}

/// The Cartesian state of an SBAS almanac
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AlmanacXyz {
    /// ECEF position at the reference time [m]
    pub pos: ECEF,
    /// ECEF velocity at the reference time [m/s]
    pub vel: ECEF,
    /// ECEF acceleration at the reference time [m/s^2]
    pub acc: ECEF,
}

impl AlmanacTerms {
    /// Create new keplarian almanac terms from already decoded data
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new_kepler(
        m0: f64,
        ecc: f64,
        sqrta: f64,
        omega0: f64,
        omegadot: f64,
        w: f64,
        inc: f64,
        af0: f64,
        af1: f64,
    ) -> AlmanacTerms {
        AlmanacTerms::Kepler(AlmanacKepler {
            m0,
            ecc,
            sqrta,
            omega0,
            omegadot,
            w,
            inc,
            af0,
            af1,
        })
    }

    /// Create new XYZ almanac terms from already decoded data
    #[must_use]
    pub fn new_xyz(pos: ECEF, vel: ECEF, acc: ECEF) -> AlmanacTerms {
        AlmanacTerms::Xyz(AlmanacXyz { pos, vel, acc })
    }
}

/// Representation of a satellite almanac
#[derive(Debug, Clone, PartialEq)]
pub struct Almanac {
    sid: GnssSignal,
    toa: GpsTime,
    ura: f32,
    fit_interval: u32,
    valid: bool,
    health_bits: u8,
    terms: AlmanacTerms,
}

impl Almanac {
    /// Create new almanac from already decoded data
    ///
    /// # Errors
    ///
    /// Only GPS and SBAS almanacs are supported, other constellations return
    /// an error.
    pub fn new(
        sid: GnssSignal,
        toa: GpsTime,
        ura: f32,
        fit_interval: u32,
        valid: bool,
        health_bits: u8,
        terms: AlmanacTerms,
    ) -> Result<Almanac, UnsupportedConstellation> {
        match sid.to_constellation() {
            Constellation::Gps | Constellation::Sbas => Ok(Almanac {
                sid,
                toa,
                ura,
                fit_interval,
                valid,
                health_bits,
                terms,
            }),
            other_constellation => Err(UnsupportedConstellation(other_constellation)),
        }
    }

    /// Expands the almanac into an equivalent ephemeris with the missing
    /// parameters zeroed, so both can share one evaluation
    fn as_ephemeris(&self) -> Ephemeris {
        let terms = match &self.terms {
            AlmanacTerms::Kepler(kepler) => EphemerisTerms::Kepler(KeplerTerms {
                tgd: GroupDelay::Gps {
                    tgd: 0.0,
                    isc_l5: 0.0,
                },
                crc: 0.0,
                crs: 0.0,
                cuc: 0.0,
                cus: 0.0,
                cic: 0.0,
                cis: 0.0,
                dn: 0.0,
                m0: kepler.m0,
                ecc: kepler.ecc,
                sqrta: kepler.sqrta,
                omega0: kepler.omega0,
                omegadot: kepler.omegadot,
                w: kepler.w,
                inc: kepler.inc,
                inc_dot: 0.0,
                af0: kepler.af0,
                af1: kepler.af1,
                af2: 0.0,
                toc: self.toa,
                iodc: 0,
                iode: 0,
            }),
            AlmanacTerms::Xyz(xyz) => EphemerisTerms::Xyz(XyzTerms {
                pos: xyz.pos,
                vel: xyz.vel,
                acc: xyz.acc,
                a_gf0: 0.0,
                a_gf1: 0.0,
            }),
        };

        Ephemeris::new(
            self.sid,
            self.toa,
            self.ura,
            self.fit_interval,
            self.valid,
            self.health_bits,
            0,
            terms,
        )
    }

    /// Calculate satellite position, velocity and clock offset from an almanac
    ///
    /// # Errors
    ///
    /// Returns an error when the almanac is not valid at the given time.
    pub fn calc_satellite_state(&self, t: GpsTime) -> Result<SatelliteState, InvalidTime> {
        if !self.is_valid(t) || !self.is_healthy() {
            return Err(InvalidTime(t));
        }

        let state = self
            .as_ephemeris()
            .calc_satellite_state_unchecked(&t, Default::default())
            .map_err(|_: InvalidEphemeris| InvalidTime(t))?;

        Ok(SatelliteState {
            pos: state.pos,
            vel: state.vel,
            acc: state.acc,
            clock_err: state.clock_err,
            clock_rate_err: state.clock_rate_err,
        })
    }

    /// Calculate the azimuth and elevation of a satellite from a reference
    /// position given the satellite almanac
    ///
    /// # Errors
    ///
    /// Returns an error when the almanac is not valid at the given time.
    pub fn calc_satellite_az_el(
        &self,
        t: GpsTime,
        pos: ECEF,
    ) -> Result<AzimuthElevation, InvalidTime> {
        let state = self.calc_satellite_state(t)?;
        Ok(pos.azel_of(&state.pos))
    }

    /// Calculate the Doppler shift of a satellite as observed at a reference
    /// position given the satellite almanac
    ///
    /// # Errors
    ///
    /// Returns an error when the almanac is not valid at the given time.
    pub fn calc_satellite_doppler(&self, t: GpsTime, pos: ECEF) -> Result<f64, InvalidTime> {
        let state = self.calc_satellite_state(t)?;

        let los = state.pos - pos;
        let range_rate = state.vel.dot(&los) / los.norm();
        Ok(-range_rate * self.sid.get_carrier_frequency() / crate::signal::consts::C)
    }

    /// Checks to see if the almanac data is usable at a particular time
    #[must_use]
    pub fn is_valid(&self, t: GpsTime) -> bool {
        let mut toa = self.toa;
        toa.match_weeks(&t);
        self.valid && t.diff(&toa).abs() <= f64::from(self.fit_interval) / 2.0
    }

    /// Checks to see if the almanac data is healthy according to the health bits
    ///
    /// An almanac whose valid flag is cleared is presumed healthy, matching
    /// the ephemeris behaviour.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        if !self.valid {
            return true;
        }
        self.health_bits == 0
    }

    /// Gets the signal ID of the almanac
    #[must_use]
    pub fn sid(&self) -> GnssSignal {
        self.sid
    }

    /// Gets the reference time of the almanac
    #[must_use]
    pub fn toa(&self) -> GpsTime {
        self.toa
    }

    /// User range accuracy, in meters
    #[must_use]
    pub fn ura(&self) -> f32 {
        self.ura
    }

    /// Curve fit interval, in seconds
    #[must_use]
    pub fn fit_interval(&self) -> u32 {
        self.fit_interval
    }

    /// Satellite health status:
    /// - MSB 3: NAV data health status. See IS-GPS-200H
    ///   Table 20-VII: NAV Data Health Indications;
    /// - LSB 5: Signal health status. See IS-GPS-200H
    ///   Table 20-VIII. Codes for Health of SV Signal
    ///   Components
    #[must_use]
    pub fn health_bits(&self) -> u8 {
        self.health_bits
    }
}
