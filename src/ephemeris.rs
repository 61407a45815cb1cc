// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! Evaluation of broadcast satellite ephemerides
//!
//! GNSS satellites broadcast ephemerides, parameter sets which describe the
//! satellite's orbit and clock over a limited span of time. Evaluating an
//! ephemeris at a point in time yields the satellite's position, velocity,
//! acceleration, and clock state, which together with raw measurements feed
//! the [PVT solver](crate::solver::calc_pvt).
//!
//! Three broadcast formats exist. GPS, Galileo, BeiDou and QZSS send
//! Keplerian orbital elements with harmonic corrections, evaluated in closed
//! form. SBAS satellites send a Cartesian state extrapolated with constant
//! acceleration. GLONASS satellites send a Cartesian state that has to be
//! numerically integrated under a force model.
//!
//! Broadcast ephemerides are only valid for a particular period of time, and
//! the constellations update them regularly to make sure a valid one is
//! always available. The validity window and the satellite health flags are
//! checked by [`Ephemeris::calc_satellite_state()`]; use
//! [`Ephemeris::calc_satellite_state_unchecked()`] when the record has already
//! been vetted.

use crate::{
    coords::{AzimuthElevation, ECEF},
    signal::{consts as sig_consts, Code, Constellation, GnssSignal},
    time::GpsTime,
};
use nalgebra::Matrix3;

/// Gravitational constant of the WGS84 ellipsoid, used by GPS and QZSS [m^3/s^2]
const GPS_GM: f64 = 3.986005e14;
/// Gravitational constant of the GTRF ellipsoid, used by Galileo [m^3/s^2]
const GAL_GM: f64 = 3.986004418e14;
/// Gravitational constant of the CGCS2000 ellipsoid, used by BeiDou [m^3/s^2]
const BDS_GM: f64 = 3.986004418e14;
/// Gravitational constant of PZ-90.02, used by GLONASS [m^3/s^2]
const GLO_GM: f64 = 3.986004418e14;

/// Earth rotation rate of WGS84, used by GPS, QZSS and Galileo [rad/s]
const GPS_OMEGAE_DOT: f64 = 7.2921151467e-5;
/// Earth rotation rate of CGCS2000, used by BeiDou [rad/s]
const BDS_OMEGAE_DOT: f64 = 7.292115e-5;
/// Earth rotation rate of PZ-90.02, used by GLONASS [rad/s]
const GLO_OMEGAE_DOT: f64 = 7.292115e-5;

/// Equatorial radius of PZ-90.02 [m]
const GLO_A_E: f64 = 6_378_136.0;
/// Second zonal harmonic coefficient of PZ-90.02
const GLO_J02: f64 = 1.0826257e-3;

/// Longest Runge-Kutta step taken when propagating a GLONASS state [s]
const GLO_MAX_STEP_LENGTH: f64 = 30.0;
/// Bound on the number of Runge-Kutta steps per evaluation
const GLO_MAX_STEP_NUM: u32 = 30;

/// Inclination of the BeiDou GEO rotation, per the BDS ICD [rad]
const BDS_GEO_ROTATION_RAD: f64 = -5.0 * std::f64::consts::PI / 180.0;

/// Nominal one sigma user range accuracies for each broadcast URA index,
/// IS-GPS-200 Table 20-I [m]
const URA_TABLE: [f32; 16] = [
    2.0, 2.8, 4.0, 5.7, 8.0, 11.3, 16.0, 32.0, 64.0, 128.0, 256.0, 512.0, 1024.0, 2048.0, 4096.0,
    6144.0,
];

/// Encodes a user range accuracy in meters to the broadcast URA index
///
/// Returns `None` for negative, non-finite, or out of range accuracies.
#[must_use]
pub fn ura_to_index(ura: f32) -> Option<u8> {
    if !ura.is_finite() || ura < 0.0 {
        return None;
    }
    URA_TABLE
        .iter()
        .position(|&bound| ura <= bound)
        .map(|i| i as u8)
}

/// Decodes a broadcast URA index to its nominal accuracy in meters
#[must_use]
pub fn ura_from_index(index: u8) -> Option<f32> {
    URA_TABLE.get(usize::from(index)).copied()
}

/// Various statuses that an ephemeris can be in
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Status {
    /// The ephemeris has its valid flag cleared
    Invalid,
    /// The reference time has a week number of zero
    WnEqualsZero,
    /// The fit interval is zero
    FitIntervalEqualsZero,
    /// The satellite reports itself as unhealthy
    Unhealthy,
    /// An issue of data field is outside its broadcast range
    InvalidIod,
    /// The evaluation time is outside the fit interval
    TooOld,
    /// The ephemeris is usable
    Valid,
}

/// An error indicating that an ephemeris is not usable
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid ephemeris ({0:?})")]
pub struct InvalidEphemeris(Status);

impl InvalidEphemeris {
    /// The specific status which makes the ephemeris unusable
    #[must_use]
    pub fn status(&self) -> Status {
        self.0
    }
}

/// An error indicating that the queried signal has no applicable group delay
/// for the ephemeris
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
#[error("No group delay correction applicable to {0:?}")]
pub struct NoGroupDelay(Code);

type Result<T> = std::result::Result<T, InvalidEphemeris>;

/// Inter-signal group delay terms, one layout per broadcast format
///
/// The interpretation of the broadcast group delay words differs between
/// constellations, so each gets its own fields rather than sharing a
/// positional pair.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum GroupDelay {
    /// GPS L1/L2 timing group delay and the L1/L5 inter-signal correction [s]
    Gps { tgd: f64, isc_l5: f64 },
    /// QZSS timing group delay [s]
    Qzss { tgd: f64 },
    /// BeiDou B1 and B2 group delays [s]
    Bds { tgd1: f64, tgd2: f64 },
    /// Galileo broadcast group delays for the (E1, E5a) and (E1, E5b) pairs [s]
    Gal { bgd_e1e5a: f64, bgd_e1e5b: f64 },
}

/// Keplerian orbital elements, broadcast by GPS, Galileo, BeiDou and QZSS
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct KeplerTerms {
    /// Group delay terms
    pub tgd: GroupDelay,
    /// Amplitude of the cosine harmonic correction to the orbit radius [m]
    pub crc: f64,
    /// Amplitude of the sine harmonic correction to the orbit radius [m]
    pub crs: f64,
    /// Amplitude of the cosine harmonic correction to the argument of latitude [rad]
    pub cuc: f64,
    /// Amplitude of the sine harmonic correction to the argument of latitude [rad]
    pub cus: f64,
    /// Amplitude of the cosine harmonic correction to the inclination [rad]
    pub cic: f64,
    /// Amplitude of the sine harmonic correction to the inclination [rad]
    pub cis: f64,
    /// Mean motion difference from the computed value [rad/s]
    pub dn: f64,
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
    /// Rate of inclination [rad/s]
    pub inc_dot: f64,
    /// Clock bias polynomial coefficient [s]
    pub af0: f64,
    /// Clock drift polynomial coefficient [s/s]
    pub af1: f64,
    /// Clock drift rate polynomial coefficient [s/s^2]
    pub af2: f64,
    /// Reference time of the clock polynomial
    pub toc: GpsTime,
    /// Issue of data, clock
    pub iodc: u16,
    /// Issue of data, ephemeris
    pub iode: u16,
}

/// Cartesian orbital state, broadcast by SBAS
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct XyzTerms {
    /// ECEF position at the reference time [m]
    pub pos: ECEF,
    /// ECEF velocity at the reference time [m/s]
    pub vel: ECEF,
    /// ECEF acceleration at the reference time [m/s^2]
    pub acc: ECEF,
    /// Clock bias [s]
    pub a_gf0: f64,
    /// Clock drift [s/s]
    pub a_gf1: f64,
}

/// Cartesian orbital state in PZ-90.02, broadcast by GLONASS
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GloTerms {
    /// Relative deviation of the carrier frequency
    pub gamma: f64,
    /// Clock correction [s]
    pub tau: f64,
    /// Inter-band (L1/L2) equipment delay [s]
    pub d_tau: f64,
    /// ECEF position at the reference time [m]
    pub pos: ECEF,
    /// ECEF velocity at the reference time [m/s]
    pub vel: ECEF,
    /// Lunisolar acceleration at the reference time [m/s^2]
    ///
    /// The central gravity and oblateness terms are not included here, they
    /// are added back during integration.
    pub acc: ECEF,
    /// Frequency channel slot of the satellite, shifted into [0, 13]
    pub fcn: u16,
    /// Issue of ephemeris data
    pub iod: u8,
}

/// Orbital terms of an ephemeris
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum EphemerisTerms {
    /// GPS, BDS, GAL, and QZSS all broadcast their terms as keplarian elements
    Kepler(KeplerTerms),
    /// SBAS systems broadcast their terms as simple XYZ terms
    Xyz(XyzTerms),
    /// GLONASS broadcast their terms in a unique format and timeframe
    Glo(GloTerms),
}

/// BeiDou orbit regimes
///
/// The broadcast Keplerian elements do not say which regime the satellite is
/// in, but GEO satellites need a different evaluation, so the decoder layer
/// has to supply the regime alongside the ephemeris.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum OrbitType {
    /// Medium earth orbit
    #[default]
    Meo,
    /// Inclined geosynchronous orbit
    Igso,
    /// Geostationary orbit
    Geo,
}

/// Representation of a satellite state from evaluating its ephemeris at a
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
    /// Issue of data clock, unitless
    pub iodc: u16,
    /// Issue of data ephemeris, unitless
    pub iode: u16,
}

/// Representation of full ephemeris
#[derive(Debug, Clone, PartialEq)]
pub struct Ephemeris {
    sid: GnssSignal,
    toe: GpsTime,
    ura: f32,
    fit_interval: u32,
    valid: bool,
    health_bits: u8,
    source: u8,
    terms: EphemerisTerms,
}

impl Ephemeris {
    /// Create new ephemeris from already decoded data
    ///
    /// # Panics
    ///
    /// Panics when the terms variant does not match the constellation of the
    /// signal identifier.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        sid: GnssSignal,
        toe: GpsTime,
        ura: f32,
        fit_interval: u32,
        valid: bool,
        health_bits: u8,
        source: u8,
        terms: EphemerisTerms,
    ) -> Ephemeris {
        match &terms {
            EphemerisTerms::Kepler(kepler) => {
                assert!(matches!(
                    sid.to_constellation(),
                    Constellation::Gps | Constellation::Gal | Constellation::Bds | Constellation::Qzs
                ));
                let tgd_matches = matches!(
                    (sid.to_constellation(), &kepler.tgd),
                    (Constellation::Gps, GroupDelay::Gps { .. })
                        | (Constellation::Qzs, GroupDelay::Qzss { .. })
                        | (Constellation::Bds, GroupDelay::Bds { .. })
                        | (Constellation::Gal, GroupDelay::Gal { .. })
                );
                assert!(tgd_matches, "group delay terms do not match {sid}");
            }
            EphemerisTerms::Xyz(_) => {
                assert_eq!(sid.to_constellation(), Constellation::Sbas);
            }
            EphemerisTerms::Glo(_) => {
                assert_eq!(sid.to_constellation(), Constellation::Glo);
            }
        }

        Ephemeris {
            sid,
            toe,
            ura,
            fit_interval,
            valid,
            health_bits,
            source,
            terms,
        }
    }

    /// Gets the signal ID of the ephemeris
    #[must_use]
    pub fn sid(&self) -> GnssSignal {
        self.sid
    }

    /// Gets the reference time of the ephemeris
    #[must_use]
    pub fn toe(&self) -> GpsTime {
        self.toe
    }

    /// User range accuracy, in meters. Negative values mark an unknown accuracy
    #[must_use]
    pub fn ura(&self) -> f32 {
        self.ura
    }

    /// Curve fit interval, in seconds
    #[must_use]
    pub fn fit_interval(&self) -> u32 {
        self.fit_interval
    }

    /// The 8 bit health word broadcast alongside the ephemeris
    #[must_use]
    pub fn health_bits(&self) -> u8 {
        self.health_bits
    }

    /// Identifier of the broadcast stream the ephemeris was decoded from
    #[must_use]
    pub fn source(&self) -> u8 {
        self.source
    }

    /// The orbital terms of the ephemeris
    #[must_use]
    pub fn terms(&self) -> &EphemerisTerms {
        &self.terms
    }

    /// Gets the status of an ephemeris - is the ephemeris invalid, unhealthy,
    /// or has some other condition which makes it unusable?
    #[must_use]
    pub fn status(&self) -> Status {
        if !self.valid {
            return Status::Invalid;
        }
        if self.toe.wn() == 0 {
            return Status::WnEqualsZero;
        }
        if self.fit_interval == 0 {
            return Status::FitIntervalEqualsZero;
        }
        if !self.is_healthy(&self.sid.code()) {
            return Status::Unhealthy;
        }
        if !self.iod_in_bounds() {
            return Status::InvalidIod;
        }
        Status::Valid
    }

    /// Gets the status of the ephemeris at a particular time, additionally
    /// checking the fit interval
    #[must_use]
    pub fn status_at(&self, t: &GpsTime) -> Status {
        let status = self.status();
        if status == Status::Valid && !self.is_valid_at_time(t) {
            return Status::TooOld;
        }
        status
    }

    /// Is this ephemeris usable at the given time?
    #[must_use]
    pub fn is_valid_at_time(&self, t: &GpsTime) -> bool {
        let mut toe = self.toe;
        toe.match_weeks(t);
        let dt = t.diff(&toe);
        let fit = f64::from(self.fit_interval);

        /* With an unknown toe week the difference wraps into half a week, so
         * staleness beyond a week is not detectable here. */
        match self.sid.to_constellation() {
            Constellation::Bds | Constellation::Gal => (0.0..=fit).contains(&dt),
            _ => dt.abs() <= fit / 2.0,
        }
    }

    /// Check if this this ephemeris is healthy
    ///
    /// The health rules differ per constellation. An ephemeris whose valid
    /// flag is cleared is presumed healthy, so that newly acquired satellites
    /// can keep being tracked while their full ephemeris is still being
    /// received.
    #[must_use]
    pub fn is_healthy(&self, code: &Code) -> bool {
        if !self.valid {
            return true;
        }
        match self.sid.to_constellation() {
            Constellation::Gps => {
                ura_to_index(self.ura).is_some() && gps_health_word_ok(self.health_bits, *code)
            }
            Constellation::Gal | Constellation::Bds | Constellation::Glo => {
                self.ura.is_finite() && self.ura >= 0.0 && self.health_bits == 0
            }
            Constellation::Sbas | Constellation::Qzs => self.health_bits == 0,
        }
    }

    fn iod_in_bounds(&self) -> bool {
        match &self.terms {
            EphemerisTerms::Kepler(kepler) => match self.sid.to_constellation() {
                Constellation::Gps | Constellation::Qzs => {
                    kepler.iode <= 0xFF && kepler.iodc <= 0x3FF
                }
                Constellation::Gal => kepler.iode <= 0x3FF && kepler.iodc <= 0x3FF,
                Constellation::Bds => {
                    if matches!(self.sid.code(), Code::Bds2B1 | Code::Bds2B2) {
                        kepler.iode <= 240 && kepler.iodc <= 240
                    } else {
                        kepler.iode <= 0xFF && kepler.iodc <= 0x3FF
                    }
                }
                _ => unreachable!("constructor checks the constellation"),
            },
            EphemerisTerms::Xyz(_) => true,
            EphemerisTerms::Glo(glo) => glo.iod <= 0x7F,
        }
    }

    /// Gets the group delay correction of the ephemeris towards a signal [s]
    ///
    /// # Errors
    ///
    /// Returns an error when the queried signal has no applicable group delay,
    /// e.g. when asking for the correction of a signal from a different
    /// constellation.
    pub fn group_delay(&self, sid: &GnssSignal) -> std::result::Result<f64, NoGroupDelay> {
        let code = sid.code();
        match &self.terms {
            EphemerisTerms::Kepler(kepler) => match kepler.tgd {
                GroupDelay::Gps { tgd, isc_l5 } => {
                    if !code.is_gps() {
                        return Err(NoGroupDelay(code));
                    }
                    let freq = code.get_carrier_frequency();
                    let gamma = sig_consts::GPS_L1_HZ * sig_consts::GPS_L1_HZ / (freq * freq);
                    if matches!(code, Code::GpsL5i | Code::GpsL5q | Code::GpsL5x) {
                        Ok(isc_l5 * gamma)
                    } else {
                        Ok(tgd * gamma)
                    }
                }
                GroupDelay::Qzss { tgd } => {
                    if !code.is_qzss() {
                        return Err(NoGroupDelay(code));
                    }
                    let freq = code.get_carrier_frequency();
                    let gamma = sig_consts::QZS_L1_HZ * sig_consts::QZS_L1_HZ / (freq * freq);
                    Ok(tgd * gamma)
                }
                GroupDelay::Bds { tgd1, tgd2 } => match code {
                    Code::Bds2B1 | Code::Bds3B1ci | Code::Bds3B1cq | Code::Bds3B1cx => Ok(tgd1),
                    Code::Bds2B2 | Code::Bds3B7i | Code::Bds3B7q | Code::Bds3B7x => Ok(tgd2),
                    _ => Err(NoGroupDelay(code)),
                },
                GroupDelay::Gal {
                    bgd_e1e5a,
                    bgd_e1e5b,
                } => {
                    let freq = code.get_carrier_frequency();
                    let gamma = sig_consts::GAL_E1_HZ * sig_consts::GAL_E1_HZ / (freq * freq);
                    match code {
                        Code::GalE1b | Code::GalE1c | Code::GalE1x => Ok(bgd_e1e5a),
                        Code::GalE5i | Code::GalE5q | Code::GalE5x => Ok(bgd_e1e5a * gamma),
                        Code::GalE7i | Code::GalE7q | Code::GalE7x => Ok(bgd_e1e5b * gamma),
                        _ => Err(NoGroupDelay(code)),
                    }
                }
            },
            EphemerisTerms::Xyz(_) => {
                if code.is_sbas() {
                    Ok(0.0)
                } else {
                    Err(NoGroupDelay(code))
                }
            }
            EphemerisTerms::Glo(glo) => match code {
                Code::GloL1of | Code::GloL1p => Ok(0.0),
                Code::GloL2of | Code::GloL2p => Ok(glo.d_tau),
                _ => Err(NoGroupDelay(code)),
            },
        }
    }

    /// Calculate satellite position, velocity and clock offset from ephemeris.
    ///
    /// # Errors
    ///
    /// Returns an error carrying the offending [`Status`] when the ephemeris
    /// is not usable at the given time.
    pub fn calc_satellite_state(&self, t: &GpsTime) -> Result<SatelliteState> {
        self.calc_satellite_state_hinted(t, OrbitType::default())
    }

    /// Calculate satellite state with an explicit orbit regime hint
    ///
    /// The hint is only consulted for BeiDou satellites, whose GEO orbits use
    /// a different node evaluation.
    ///
    /// # Errors
    ///
    /// Returns an error carrying the offending [`Status`] when the ephemeris
    /// is not usable at the given time.
    pub fn calc_satellite_state_hinted(
        &self,
        t: &GpsTime,
        orbit: OrbitType,
    ) -> Result<SatelliteState> {
        match self.status_at(t) {
            Status::Valid => self.calc_satellite_state_unchecked(t, orbit),
            status => Err(InvalidEphemeris(status)),
        }
    }

    /// Calculate satellite state without checking the ephemeris validity
    ///
    /// For callers which have already vetted the ephemeris through
    /// [`Ephemeris::status_at()`].
    ///
    /// # Errors
    ///
    /// Returns an error when the ephemeris's own signal has no applicable
    /// group delay, which indicates a malformed record.
    pub fn calc_satellite_state_unchecked(
        &self,
        t: &GpsTime,
        orbit: OrbitType,
    ) -> Result<SatelliteState> {
        let tgd = self
            .group_delay(&self.sid)
            .map_err(|_| InvalidEphemeris(Status::Invalid))?;

        match &self.terms {
            EphemerisTerms::Kepler(kepler) => {
                Ok(self.calc_satellite_state_kepler(kepler, t, tgd, orbit))
            }
            EphemerisTerms::Xyz(xyz) => Ok(self.calc_satellite_state_xyz(xyz, t)),
            EphemerisTerms::Glo(glo) => Ok(self.calc_satellite_state_glo(glo, t, tgd)),
        }
    }

    /// Keplerian evaluation per IS-GPS-200D, Section 20.3.3.3.3.1, Table 20-IV
    ///
    /// Each stage of the algorithm is differentiated twice so that velocity
    /// and acceleration come out analytically instead of by finite
    /// differencing.
    fn calc_satellite_state_kepler(
        &self,
        kepler: &KeplerTerms,
        t: &GpsTime,
        tgd: f64,
        orbit: OrbitType,
    ) -> SatelliteState {
        let constellation = self.sid.to_constellation();

        /* Satellite clock terms, from the time of clock */
        let mut toc = kepler.toc;
        toc.match_weeks(t);
        let dt_c = t.diff(&toc);
        let clock_err = kepler.af0 + dt_c * (kepler.af1 + dt_c * kepler.af2) - tgd;
        let clock_rate_err = kepler.af1 + 2.0 * dt_c * kepler.af2;

        /* Seconds from the ephemeris reference epoch */
        let mut toe = self.toe;
        toe.match_weeks(t);
        let dt = t.diff(&toe);

        let gm = match constellation {
            Constellation::Gps | Constellation::Qzs => GPS_GM,
            Constellation::Bds => BDS_GM,
            Constellation::Gal => GAL_GM,
            _ => unreachable!("constructor checks the constellation"),
        };
        let omegae_dot = match constellation {
            Constellation::Bds => BDS_OMEGAE_DOT,
            _ => GPS_OMEGAE_DOT,
        };
        /* BDS time of ephemeris is offset from GPS time in the node term */
        let toe_tow = match constellation {
            Constellation::Bds => self.toe.tow() - crate::time::consts::BDS_SECOND_TO_GPS_SECOND,
            _ => self.toe.tow(),
        };

        /* Semi-major axis and corrected mean motion */
        let a = kepler.sqrta * kepler.sqrta;
        let ma_dot = (gm / (a * a * a)).sqrt() + kepler.dn;
        let ma = kepler.m0 + ma_dot * dt;

        /* Iteratively solve for the eccentric anomaly */
        let ecc = kepler.ecc;
        let mut ea = ma;
        let mut ea_old = ea + 1.0;
        let mut temp = 1.0 - ecc * ea.cos();
        let mut count = 0;
        while (ea - ea_old).abs() > 1e-14 {
            ea_old = ea;
            temp = 1.0 - ecc * ea_old.cos();
            ea += (ma - ea_old + ecc * ea_old.sin()) / temp;
            count += 1;
            if count > 5 {
                break;
            }
        }
        let (sin_ea, cos_ea) = ea.sin_cos();
        let ea_dot = ma_dot / temp;
        let temp_dot = ecc * sin_ea * ea_dot;
        let ea_ddot = -ecc * sin_ea * ea_dot * ea_dot / temp;

        /* True anomaly and argument of latitude */
        let ecc_factor = (1.0 - ecc * ecc).sqrt();
        let al = (ecc_factor * sin_ea).atan2(cos_ea - ecc) + kepler.w;
        let al_dot = ecc_factor * ea_dot / temp;
        let al_ddot = ecc_factor * (ea_ddot * temp - ea_dot * temp_dot) / (temp * temp);

        let (sin_2al, cos_2al) = (2.0 * al).sin_cos();

        /* Corrected argument of latitude */
        let cal = al + kepler.cus * sin_2al + kepler.cuc * cos_2al;
        let cal_dot = al_dot * (1.0 + 2.0 * (kepler.cus * cos_2al - kepler.cuc * sin_2al));
        let cal_ddot = al_ddot * (1.0 + 2.0 * (kepler.cus * cos_2al - kepler.cuc * sin_2al))
            - 4.0 * al_dot * al_dot * (kepler.cus * sin_2al + kepler.cuc * cos_2al);

        /* Corrected radius */
        let r = a * temp + kepler.crc * cos_2al + kepler.crs * sin_2al;
        let r_dot =
            a * ecc * sin_ea * ea_dot + 2.0 * al_dot * (kepler.crs * cos_2al - kepler.crc * sin_2al);
        let r_ddot = a * ecc * (cos_ea * ea_dot * ea_dot + sin_ea * ea_ddot)
            + 2.0 * al_ddot * (kepler.crs * cos_2al - kepler.crc * sin_2al)
            - 4.0 * al_dot * al_dot * (kepler.crs * sin_2al + kepler.crc * cos_2al);

        /* Corrected inclination */
        let inc = kepler.inc + kepler.inc_dot * dt + kepler.cic * cos_2al + kepler.cis * sin_2al;
        let inc_dot_c =
            kepler.inc_dot + 2.0 * al_dot * (kepler.cis * cos_2al - kepler.cic * sin_2al);
        let inc_ddot = 2.0 * al_ddot * (kepler.cis * cos_2al - kepler.cic * sin_2al)
            - 4.0 * al_dot * al_dot * (kepler.cis * sin_2al + kepler.cic * cos_2al);

        /* Position and its derivatives in the orbital plane */
        let (sin_cal, cos_cal) = cal.sin_cos();
        let x = r * cos_cal;
        let y = r * sin_cal;
        let x_dot = r_dot * cos_cal - y * cal_dot;
        let y_dot = r_dot * sin_cal + x * cal_dot;
        let x_ddot = r_ddot * cos_cal
            - 2.0 * r_dot * cal_dot * sin_cal
            - y * cal_ddot
            - x * cal_dot * cal_dot;
        let y_ddot = r_ddot * sin_cal + 2.0 * r_dot * cal_dot * cos_cal + x * cal_ddot
            - y * cal_dot * cal_dot;

        /* Corrected longitude of the ascending node. GEO satellites keep the
         * node in a quasi inertial frame and get rotated into ECEF below. */
        let is_bds_geo = constellation == Constellation::Bds && orbit == OrbitType::Geo;
        let om_dot = if is_bds_geo {
            kepler.omegadot
        } else {
            kepler.omegadot - omegae_dot
        };
        let om = kepler.omega0 + dt * om_dot - omegae_dot * toe_tow;

        let (sin_om, cos_om) = om.sin_cos();
        let (sin_inc, cos_inc) = inc.sin_cos();

        /* In-plane y projected through the inclination */
        let p = y * cos_inc;
        let p_dot = y_dot * cos_inc - y * sin_inc * inc_dot_c;
        let p_ddot = y_ddot * cos_inc
            - 2.0 * y_dot * sin_inc * inc_dot_c
            - y * cos_inc * inc_dot_c * inc_dot_c
            - y * sin_inc * inc_ddot;
        let q_dot = y_dot * sin_inc + y * cos_inc * inc_dot_c;
        let q_ddot = y_ddot * sin_inc + 2.0 * y_dot * cos_inc * inc_dot_c
            - y * sin_inc * inc_dot_c * inc_dot_c
            + y * cos_inc * inc_ddot;

        let pos_x = x * cos_om - p * sin_om;
        let pos_y = x * sin_om + p * cos_om;
        let pos_z = y * sin_inc;

        let vel_x = x_dot * cos_om - p_dot * sin_om - om_dot * pos_y;
        let vel_y = x_dot * sin_om + p_dot * cos_om + om_dot * pos_x;
        let vel_z = q_dot;

        let acc_x = x_ddot * cos_om - p_ddot * sin_om - 2.0 * om_dot * vel_y
            + om_dot * om_dot * pos_x;
        let acc_y =
            x_ddot * sin_om + p_ddot * cos_om + 2.0 * om_dot * vel_x + om_dot * om_dot * pos_y;
        let acc_z = q_ddot;

        let mut pos = ECEF::new(pos_x, pos_y, pos_z);
        let mut vel = ECEF::new(vel_x, vel_y, vel_z);
        let mut acc = ECEF::new(acc_x, acc_y, acc_z);

        if is_bds_geo {
            /* Rotate the quasi inertial state into ECEF, per the BDS ICD */
            let phi = omegae_dot * dt;
            let (sin_phi, cos_phi) = phi.sin_cos();
            let (sin_5, cos_5) = BDS_GEO_ROTATION_RAD.sin_cos();

            let rx = Matrix3::new(1.0, 0.0, 0.0, 0.0, cos_5, sin_5, 0.0, -sin_5, cos_5);
            let rz = Matrix3::new(
                cos_phi, sin_phi, 0.0, -sin_phi, cos_phi, 0.0, 0.0, 0.0, 1.0,
            );
            let rz_dot = omegae_dot
                * Matrix3::new(
                    -sin_phi, cos_phi, 0.0, -cos_phi, -sin_phi, 0.0, 0.0, 0.0, 0.0,
                );
            let rz_ddot = omegae_dot
                * omegae_dot
                * Matrix3::new(
                    -cos_phi, -sin_phi, 0.0, sin_phi, -cos_phi, 0.0, 0.0, 0.0, 0.0,
                );

            let p_gk = rx * pos.as_vector_ref();
            let v_gk = rx * vel.as_vector_ref();
            let a_gk = rx * acc.as_vector_ref();

            pos = ECEF::from_vector3(rz * p_gk);
            vel = ECEF::from_vector3(rz * v_gk + rz_dot * p_gk);
            acc = ECEF::from_vector3(rz * a_gk + 2.0 * rz_dot * v_gk + rz_ddot * p_gk);
        }

        SatelliteState {
            pos,
            vel,
            acc,
            clock_err,
            clock_rate_err,
            iodc: kepler.iodc,
            iode: kepler.iode,
        }
    }

    /// SBAS evaluation: constant acceleration extrapolation from the
    /// reference time
    fn calc_satellite_state_xyz(&self, xyz: &XyzTerms, t: &GpsTime) -> SatelliteState {
        let mut toe = self.toe;
        toe.match_weeks(t);
        let dt = t.diff(&toe);

        let clock_err = xyz.a_gf0 + dt * xyz.a_gf1;
        let clock_rate_err = xyz.a_gf1;

        let pos = xyz.pos + dt * xyz.vel + (0.5 * dt * dt) * xyz.acc;
        let vel = xyz.vel + dt * xyz.acc;

        SatelliteState {
            pos,
            vel,
            acc: xyz.acc,
            clock_err,
            clock_rate_err,
            iodc: 0,
            iode: 0,
        }
    }

    /// GLONASS evaluation: Runge-Kutta integration of the broadcast state
    /// under the ICD force model
    fn calc_satellite_state_glo(&self, glo: &GloTerms, t: &GpsTime, tgd: f64) -> SatelliteState {
        let mut toe = self.toe;
        toe.match_weeks(t);
        let mut dt = t.diff(&toe);

        let clock_err = -glo.tau + glo.gamma * dt - tgd;
        let clock_rate_err = glo.gamma;

        /* propagate in the satellite's own time scale */
        dt -= clock_err;

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let num_steps = ((dt.abs() / GLO_MAX_STEP_LENGTH).ceil() as u32).min(GLO_MAX_STEP_NUM);

        let mut state = [
            glo.pos.x(),
            glo.pos.y(),
            glo.pos.z(),
            glo.vel.x(),
            glo.vel.y(),
            glo.vel.z(),
        ];

        if num_steps > 0 {
            let h = dt / f64::from(num_steps);
            for _ in 0..num_steps {
                let k1 = glo_state_derivative(&state, &glo.acc);
                let k2 = glo_state_derivative(&state_step(&state, &k1, h / 2.0), &glo.acc);
                let k3 = glo_state_derivative(&state_step(&state, &k2, h / 2.0), &glo.acc);
                let k4 = glo_state_derivative(&state_step(&state, &k3, h), &glo.acc);
                for i in 0..6 {
                    state[i] += h / 6.0 * (k1[i] + 2.0 * k2[i] + 2.0 * k3[i] + k4[i]);
                }
            }
        }

        /* final acceleration from the integrated state */
        let deriv = glo_state_derivative(&state, &glo.acc);

        SatelliteState {
            pos: ECEF::new(state[0], state[1], state[2]),
            vel: ECEF::new(state[3], state[4], state[5]),
            acc: ECEF::new(deriv[3], deriv[4], deriv[5]),
            clock_err,
            clock_rate_err,
            iodc: u16::from(glo.iod),
            iode: u16::from(glo.iod),
        }
    }

    /// Calculate the azimuth and elevation of a satellite from a reference
    /// position given the satellite ephemeris.
    ///
    /// # Errors
    ///
    /// Returns an error when the ephemeris is not usable at the given time.
    pub fn calc_satellite_az_el(&self, t: &GpsTime, pos: &ECEF) -> Result<AzimuthElevation> {
        let sat = self.calc_satellite_state(t)?;
        Ok(pos.azel_of(&sat.pos))
    }

    /// Calculate the Doppler shift of a satellite as observed at a reference
    /// position given the satellite ephemeris.
    ///
    /// # Errors
    ///
    /// Returns an error when the ephemeris is not usable at the given time.
    pub fn calc_satellite_doppler(&self, t: &GpsTime, pos: &ECEF, vel: &ECEF) -> Result<f64> {
        let sat = self.calc_satellite_state(t)?;

        let los = sat.pos - pos;
        let dist = los.norm();
        let range_rate = (sat.vel - vel).dot(&los) / dist;

        /* an approaching satellite produces a positive Doppler shift */
        Ok(-range_rate * self.sid.get_carrier_frequency() / sig_consts::C)
    }
}

fn state_step(state: &[f64; 6], derivative: &[f64; 6], h: f64) -> [f64; 6] {
    let mut next = *state;
    for i in 0..6 {
        next[i] += derivative[i] * h;
    }
    next
}

/// Derivative of the GLONASS six-state under the ICD-defined force model:
/// central gravity, the J02 oblateness term, the rotating frame terms, and
/// the broadcast lunisolar acceleration
fn glo_state_derivative(state: &[f64; 6], acc_input: &ECEF) -> [f64; 6] {
    let (x, y, z) = (state[0], state[1], state[2]);
    let (vx, vy, vz) = (state[3], state[4], state[5]);

    let r = (x * x + y * y + z * z).sqrt();
    let m = GLO_GM / (r * r * r);
    let j = 1.5 * GLO_J02 * GLO_GM * GLO_A_E * GLO_A_E / (r * r * r * r * r);
    let omega_sq = GLO_OMEGAE_DOT * GLO_OMEGAE_DOT;
    let g = 5.0 * z * z / (r * r);

    [
        vx,
        vy,
        vz,
        (omega_sq - m - j * (1.0 - g)) * x + 2.0 * GLO_OMEGAE_DOT * vy + acc_input.x(),
        (omega_sq - m - j * (1.0 - g)) * y - 2.0 * GLO_OMEGAE_DOT * vx + acc_input.y(),
        -(m + j * (3.0 - g)) * z + acc_input.z(),
    ]
}

/// IS-GPS-200 Table 20-VII/20-VIII interpretation of the GPS six-bit health
/// word, filtered by the signal being queried
fn gps_health_word_ok(health_bits: u8, code: Code) -> bool {
    let health = health_bits & 0x3F;
    if health == 0 {
        return true;
    }

    /* The MSB summarises the health of the LNAV data stream */
    if health & 0x20 != 0 && code.requires_data_decoder() {
        return false;
    }

    /* The five LSBs code the health of individual signal components */
    let component = health & 0x1F;
    let (l1, l2) = gps_code_bands(code);
    let affected = match component {
        0 => false,
        /* all signals weak, dead, or without data */
        1..=3 => true,
        /* L1 P component faults */
        4..=6 => code == Code::GpsL1p,
        /* L2 P component faults */
        7..=9 => code == Code::GpsL2p,
        /* L1 C component faults */
        10..=12 => l1 && code != Code::GpsL1p,
        /* L2 C component faults */
        13..=15 => l2 && code != Code::GpsL2p,
        /* both P components */
        16..=18 => code == Code::GpsL1p || code == Code::GpsL2p,
        /* both C components */
        19..=21 => (l1 && code != Code::GpsL1p) || (l2 && code != Code::GpsL2p),
        /* whole L1 band, whole L2 band */
        22..=24 => l1,
        25..=27 => l2,
        /* SV out, signal deformed, or multiple faults */
        _ => true,
    };
    !affected
}

/// Which GPS carrier bands a code occupies
fn gps_code_bands(code: Code) -> (bool, bool) {
    match code {
        Code::GpsL1ca
        | Code::GpsL1p
        | Code::GpsL1ci
        | Code::GpsL1cq
        | Code::GpsL1cx
        | Code::AuxGps => (true, false),
        Code::GpsL2cm | Code::GpsL2cl | Code::GpsL2cx | Code::GpsL2p => (false, true),
        _ => (false, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::Code;
    use std::time::Duration;

    fn make_gps_eph() -> Ephemeris {
        /* A representative GPS LNAV ephemeris, already decoded */
        Ephemeris::new(
            GnssSignal::new(22, Code::GpsL1ca).unwrap(),
            GpsTime::new_unchecked(2097, 230_400.0),
            2.0,
            14400,
            true,
            0,
            0,
            EphemerisTerms::Kepler(KeplerTerms {
                tgd: GroupDelay::Gps {
                    tgd: -1.792_609_691_619_873e-8,
                    isc_l5: 0.0,
                },
                crc: 167.140_625,
                crs: -18.828_125,
                cuc: -9.010_545_909_404_755e-7,
                cus: 9.485_054_761_171_341e-6,
                cic: -4.097_819_328_308_105e-8,
                cis: 1.010_484_993_457_794_2e-7,
                dn: 3.902_305_403_826_421_4e-9,
                m0: 0.398_699_518_155_274_38,
                ecc: 0.004_370_969_254_523_515_7,
                sqrta: 5153.619_468_688_965,
                omega0: 2.243_115_620_094_951,
                omegadot: -6.689_207_203_758_471e-9,
                w: 0.395_904_130_401_868_3,
                inc: 0.954_483_989_037_925_7,
                inc_dot: -6.271_689_812_483_247e-10,
                af0: -0.000_507_630_873_471_498_5,
                af1: -1.301_980_745_438_413_6e-11,
                af2: 0.0,
                toc: GpsTime::new_unchecked(2097, 230_400.0),
                iodc: 160,
                iode: 160,
            }),
        )
    }

    fn make_gal_eph() -> Ephemeris {
        Ephemeris::new(
            GnssSignal::new(8, Code::GalE1b).unwrap(),
            GpsTime::new_unchecked(2090, 135_000.0),
            3.12,
            14400,
            true,
            0,
            0,
            EphemerisTerms::Kepler(KeplerTerms {
                tgd: GroupDelay::Gal {
                    bgd_e1e5a: -2.1e-9,
                    bgd_e1e5b: -2.5e-9,
                },
                crs: 62.375,
                crc: -54.0625,
                cuc: -2.374_872_565_269_470_2e-6,
                cus: 1.290_254_294_872_283_9e-5,
                cic: 7.450_580_596_923_828e-9,
                cis: 4.656_612_873_077_392_6e-8,
                dn: 2.964_766_351_561_699_2e-9,
                m0: 1.173_126_378_199_616_2,
                ecc: 0.000_217_023_538_425_564_77,
                sqrta: 5440.627_687_454_223_6,
                omega0: 0.710_153_620_063_052_6,
                omegadot: -5.363_080_536_688_408e-9,
                w: 0.399_996_763_687_900_66,
                inc: 0.959_570_294_800_119_57,
                inc_dot: 4.375_182_243_902_037_5e-10,
                af0: 0.006_228_847_254_533_319_8,
                af1: -5.442_757_355_922_366_6e-12,
                af2: 0.0,
                toc: GpsTime::new_unchecked(2090, 135_000.0),
                iodc: 97,
                iode: 97,
            }),
        )
    }

    fn make_glo_eph() -> Ephemeris {
        Ephemeris::new(
            GnssSignal::new(3, Code::GloL1of).unwrap(),
            GpsTime::new_unchecked(2097, 230_400.0),
            5.0,
            2400,
            true,
            0,
            0,
            EphemerisTerms::Glo(GloTerms {
                gamma: 9.094_947_017_729_282e-13,
                tau: -8.362_159_132_957_458e-5,
                d_tau: 2.793_967_723_846_436e-9,
                pos: ECEF::new(-14_432_342.773_437_5, -6_159_825.195_312_5, 19_585_066.894_531_25),
                vel: ECEF::new(-1616.329_017_639_160_2, -2812.128_532_409_667_8, -2104.549_362_182_617_2),
                acc: ECEF::new(1.862_645_149_230_957e-6, -9.313_225_746_154_785e-7, -1.862_645_149_230_957e-6),
                fcn: 13,
                iod: 15,
            }),
        )
    }

    fn make_sbas_eph() -> Ephemeris {
        Ephemeris::new(
            GnssSignal::new(131, Code::SbasL1ca).unwrap(),
            GpsTime::new_unchecked(2097, 230_400.0),
            10.0,
            600,
            true,
            0,
            0,
            EphemerisTerms::Xyz(XyzTerms {
                pos: ECEF::new(-40_097_170.0, 9_029_714.0, 49_100.0),
                vel: ECEF::new(0.25, -1.25, 0.5),
                acc: ECEF::new(1.25e-4, -2.5e-5, 6.25e-5),
                a_gf0: 2.5e-8,
                a_gf1: 1.25e-12,
            }),
        )
    }

    /// Velocity should match the symmetric finite difference of position, and
    /// acceleration the finite difference of velocity
    fn check_state_derivatives(e: &Ephemeris, t: &GpsTime, vel_tol: f64, acc_tol: f64) {
        let h = 0.5;
        let state = e.calc_satellite_state(t).unwrap();
        let before = e
            .calc_satellite_state(&(*t - Duration::from_secs_f64(h)))
            .unwrap();
        let after = e
            .calc_satellite_state(&(*t + Duration::from_secs_f64(h)))
            .unwrap();

        let vel_fd = (1.0 / (2.0 * h)) * (after.pos - before.pos);
        let acc_fd = (1.0 / (2.0 * h)) * (after.vel - before.vel);

        for i in 0..3 {
            assert!(
                (state.vel.as_array_ref()[i] - vel_fd.as_array_ref()[i]).abs() < vel_tol,
                "velocity component {i}: analytic {} vs finite difference {}",
                state.vel.as_array_ref()[i],
                vel_fd.as_array_ref()[i]
            );
            assert!(
                (state.acc.as_array_ref()[i] - acc_fd.as_array_ref()[i]).abs() < acc_tol,
                "acceleration component {i}: analytic {} vs finite difference {}",
                state.acc.as_array_ref()[i],
                acc_fd.as_array_ref()[i]
            );
        }
    }

    #[test]
    fn kepler_derivatives() {
        let e = make_gps_eph();
        let t = GpsTime::new(2097, 231_000.0).unwrap();
        check_state_derivatives(&e, &t, 1e-4, 1e-4);

        let e = make_gal_eph();
        let t = GpsTime::new(2090, 136_000.0).unwrap();
        check_state_derivatives(&e, &t, 1e-4, 1e-4);
    }

    #[test]
    fn kepler_orbit_radius() {
        /* the orbital radius has to stay near the semi-major axis for a
         * near-circular orbit */
        let e = make_gps_eph();
        let EphemerisTerms::Kepler(kepler) = *e.terms() else {
            unreachable!()
        };
        let a = kepler.sqrta * kepler.sqrta;

        for offset in [-3600.0, 0.0, 3600.0] {
            let t = GpsTime::new(2097, 230_400.0 + offset).unwrap();
            let state = e.calc_satellite_state(&t).unwrap();
            let r = state.pos.norm();
            assert!(
                (r - a).abs() < a * 0.01,
                "radius {r} too far from semi-major axis {a}"
            );

            /* the inertial speed obeys vis-viva; the earth rotation term has
             * to be added back to the earth fixed velocity first */
            let v_inertial = ECEF::new(
                state.vel.x() - GPS_OMEGAE_DOT * state.pos.y(),
                state.vel.y() + GPS_OMEGAE_DOT * state.pos.x(),
                state.vel.z(),
            );
            let vis_viva = (GPS_GM * (2.0 / r - 1.0 / a)).sqrt();
            assert!((v_inertial.norm() - vis_viva).abs() < 1.0);
        }
    }

    #[test]
    fn kepler_clock() {
        let e = make_gps_eph();
        let EphemerisTerms::Kepler(kepler) = *e.terms() else {
            unreachable!()
        };
        let GroupDelay::Gps { tgd, .. } = kepler.tgd else {
            unreachable!()
        };

        /* at toc the clock error is af0 less the group delay */
        let state = e.calc_satellite_state(&kepler.toc).unwrap();
        assert!((state.clock_err - (kepler.af0 - tgd)).abs() < 1e-15);
        assert!((state.clock_rate_err - kepler.af1).abs() < 1e-18);

        /* an hour later the af1 term has accumulated */
        let t = kepler.toc + Duration::from_secs(3600);
        let state = e.calc_satellite_state(&t).unwrap();
        assert!((state.clock_err - (kepler.af0 + 3600.0 * kepler.af1 - tgd)).abs() < 1e-15);
    }

    #[test]
    fn bds_geo_rotation() {
        /* the GEO evaluation differs from the MEO one only by a rotation, so
         * the geocentric distance must agree at the reference epoch */
        let sid = GnssSignal::new(25, Code::Bds2B1).unwrap();
        let toe = GpsTime::new_unchecked(2091, 460_800.0);
        let terms = EphemerisTerms::Kepler(KeplerTerms {
            tgd: GroupDelay::Bds {
                tgd1: -2.999_999_97e-9,
                tgd2: -2.999_999_97e-9,
            },
            crc: 167.140_625,
            crs: -18.828_125,
            cuc: -9.010_545_909_404_755e-7,
            cus: 9.485_054_761_171_341e-6,
            cic: -4.097_819_328_308_105e-8,
            cis: 1.010_484_993_457_794_2e-7,
            dn: 3.902_305_403_826_421_4e-9,
            m0: 0.398_699_518_155_274_38,
            ecc: 0.000_437_096_925_452_351_57,
            sqrta: 6493.3,
            omega0: 2.243_115_620_094_951,
            omegadot: -6.689_207_203_758_471e-9,
            w: 0.395_904_130_401_868_3,
            inc: 0.1,
            inc_dot: -6.271_689_812_483_247e-10,
            af0: -0.000_507_630_873_471_498_5,
            af1: -1.301_980_745_438_413_6e-11,
            af2: 0.0,
            toc: toe,
            iodc: 160,
            iode: 160,
        });
        let e = Ephemeris::new(sid, toe, 2.0, 14400, true, 0, 0, terms);

        let meo = e.calc_satellite_state_unchecked(&toe, OrbitType::Meo).unwrap();
        let geo = e.calc_satellite_state_unchecked(&toe, OrbitType::Geo).unwrap();

        /* at t = toe both regimes place the satellite at the same distance */
        assert!((meo.pos.norm() - geo.pos.norm()).abs() < 1e-3);

        /* away from toe the node evaluations diverge */
        let t = toe + Duration::from_secs(3600);
        let meo = e.calc_satellite_state_unchecked(&t, OrbitType::Meo).unwrap();
        let geo = e.calc_satellite_state_unchecked(&t, OrbitType::Geo).unwrap();
        assert!((meo.pos - geo.pos).norm() > 1.0);

        /* and the GEO derivatives stay consistent */
        let h = 0.5;
        let before = e
            .calc_satellite_state_unchecked(&(t - Duration::from_secs_f64(h)), OrbitType::Geo)
            .unwrap();
        let after = e
            .calc_satellite_state_unchecked(&(t + Duration::from_secs_f64(h)), OrbitType::Geo)
            .unwrap();
        let vel_fd = (1.0 / (2.0 * h)) * (after.pos - before.pos);
        assert!((geo.vel - vel_fd).norm() < 1e-3);
    }

    #[test]
    fn glo_derivatives() {
        let e = make_glo_eph();
        let t = GpsTime::new(2097, 230_700.0).unwrap();
        check_state_derivatives(&e, &t, 1e-4, 1e-4);
    }

    #[test]
    fn glo_integration_reversibility() {
        /* integrating forward and evaluating back at toe has to return the
         * broadcast state */
        let e = make_glo_eph();
        let EphemerisTerms::Glo(glo) = *e.terms() else {
            unreachable!()
        };

        let state_at_toe = e.calc_satellite_state(&e.toe()).unwrap();
        /* clock offset shifts the effective propagation time slightly */
        assert!((state_at_toe.pos - glo.pos).norm() < 1.0);

        let forward = e
            .calc_satellite_state(&(e.toe() + Duration::from_secs(600)))
            .unwrap();
        /* distance from the geocenter stays at GLONASS orbit radius */
        let r = forward.pos.norm();
        assert!((r - 25.5e6).abs() < 1.0e6, "r = {r}");
    }

    #[test]
    fn glo_clock() {
        let e = make_glo_eph();
        let EphemerisTerms::Glo(glo) = *e.terms() else {
            unreachable!()
        };

        let state = e.calc_satellite_state(&e.toe()).unwrap();
        assert!((state.clock_err - (-glo.tau)).abs() < 1e-12);
        assert!((state.clock_rate_err - glo.gamma).abs() < 1e-18);
        assert_eq!(state.iode, 15);
    }

    #[test]
    fn sbas_state() {
        let e = make_sbas_eph();
        let EphemerisTerms::Xyz(xyz) = *e.terms() else {
            unreachable!()
        };

        let state = e.calc_satellite_state(&e.toe()).unwrap();
        assert!((state.pos - xyz.pos).norm() < 1e-9);
        assert!((state.vel - xyz.vel).norm() < 1e-9);

        let dt = 120.0;
        let t = e.toe() + Duration::from_secs_f64(dt);
        let state = e.calc_satellite_state(&t).unwrap();
        let expected = xyz.pos + dt * xyz.vel + (0.5 * dt * dt) * xyz.acc;
        assert!((state.pos - expected).norm() < 1e-9);
        assert!((state.clock_err - (xyz.a_gf0 + dt * xyz.a_gf1)).abs() < 1e-18);
    }

    #[test]
    fn status_checks() {
        let mut e = make_gps_eph();
        assert_eq!(e.status(), Status::Valid);
        assert_eq!(e.status_at(&GpsTime::new(2097, 231_000.0).unwrap()), Status::Valid);

        /* outside the symmetric fit interval */
        assert_eq!(
            e.status_at(&GpsTime::new(2097, 230_400.0 + 7201.0).unwrap()),
            Status::TooOld
        );
        assert!(e
            .calc_satellite_state(&GpsTime::new(2097, 260_000.0).unwrap())
            .is_err());

        e.valid = false;
        assert_eq!(e.status(), Status::Invalid);
        e.valid = true;

        e.fit_interval = 0;
        assert_eq!(e.status(), Status::FitIntervalEqualsZero);
        e.fit_interval = 14400;

        e.toe = GpsTime::new_unchecked(0, 230_400.0);
        assert_eq!(e.status(), Status::WnEqualsZero);
        e.toe = GpsTime::new_unchecked(2097, 230_400.0);

        e.ura = -1.0;
        assert_eq!(e.status(), Status::Unhealthy);
        e.ura = 2.0;

        e.health_bits = 0x3F;
        assert_eq!(e.status(), Status::Unhealthy);
        e.health_bits = 0;

        if let EphemerisTerms::Kepler(ref mut kepler) = e.terms {
            kepler.iodc = 0x400;
        }
        assert_eq!(e.status(), Status::InvalidIod);
    }

    #[test]
    fn asymmetric_fit_interval() {
        /* BDS and GAL ephemerides are valid from toe forwards only */
        let e = make_gal_eph();
        let toe = e.toe();

        assert!(e.is_valid_at_time(&(toe + Duration::from_secs(10))));
        assert!(e.is_valid_at_time(&(toe + Duration::from_secs(14400))));
        assert!(!e.is_valid_at_time(&(toe + Duration::from_secs(14401))));
        assert!(!e.is_valid_at_time(&(toe - Duration::from_secs(10))));

        /* while GPS ephemerides are valid symmetrically around toe */
        let e = make_gps_eph();
        let toe = e.toe();
        assert!(e.is_valid_at_time(&(toe - Duration::from_secs(7200))));
        assert!(e.is_valid_at_time(&(toe + Duration::from_secs(7200))));
        assert!(!e.is_valid_at_time(&(toe + Duration::from_secs(7201))));
    }

    #[test]
    fn unknown_toe_week() {
        /* a toe with an unknown week number gets matched to the evaluation
         * time before the fit interval check */
        let mut e = make_gps_eph();
        e.toe = GpsTime::unknown_wn(230_400.0);
        if let EphemerisTerms::Kepler(ref mut kepler) = e.terms {
            kepler.toc = GpsTime::unknown_wn(230_400.0);
        }

        let t = GpsTime::new(2097, 231_000.0).unwrap();
        assert!(e.is_valid_at_time(&t));

        let known = make_gps_eph();
        let unknown_state = e.calc_satellite_state_unchecked(&t, OrbitType::Meo).unwrap();
        let known_state = known.calc_satellite_state(&t).unwrap();
        assert!((unknown_state.pos - known_state.pos).norm() < 1e-9);
    }

    #[test]
    fn ura_encoding() {
        assert_eq!(ura_to_index(0.0), Some(0));
        assert_eq!(ura_to_index(2.0), Some(0));
        assert_eq!(ura_to_index(2.1), Some(1));
        assert_eq!(ura_to_index(6144.0), Some(15));
        assert_eq!(ura_to_index(6145.0), None);
        assert_eq!(ura_to_index(-1.0), None);
        assert_eq!(ura_to_index(f32::NAN), None);

        assert_eq!(ura_from_index(0), Some(2.0));
        assert_eq!(ura_from_index(15), Some(6144.0));
        assert_eq!(ura_from_index(16), None);
    }

    #[test]
    fn gps_health_word() {
        let code = Code::GpsL1ca;
        assert!(gps_health_word_ok(0, code));
        assert!(!gps_health_word_ok(0x3F, code));
        /* all signals weak */
        assert!(!gps_health_word_ok(1, code));
        /* an L1 P fault doesn't make the C/A code unhealthy */
        assert!(gps_health_word_ok(4, Code::GpsL1ca));
        assert!(!gps_health_word_ok(4, Code::GpsL1p));
        /* an L2 fault doesn't touch L1 */
        assert!(gps_health_word_ok(25, Code::GpsL1ca));
        assert!(!gps_health_word_ok(25, Code::GpsL2cm));
        /* bad LNAV data only matters for codes that need the decoder */
        assert!(!gps_health_word_ok(0x20, Code::GpsL1ca));
        assert!(gps_health_word_ok(0x20, Code::GpsL5q));
        /* SV out takes down everything */
        assert!(!gps_health_word_ok(28, Code::GpsL5q));
    }

    #[test]
    fn invalid_presumed_healthy() {
        let mut e = make_gps_eph();
        e.valid = false;
        e.health_bits = 0x3F;
        assert!(e.is_healthy(&Code::GpsL1ca));
        /* but the ephemeris as a whole is still unusable */
        assert_eq!(e.status(), Status::Invalid);
    }

    #[test]
    fn group_delays() {
        let e = make_gps_eph();
        let l1 = e
            .group_delay(&GnssSignal::new(22, Code::GpsL1ca).unwrap())
            .unwrap();
        let l2 = e
            .group_delay(&GnssSignal::new(22, Code::GpsL2cm).unwrap())
            .unwrap();
        let gamma = (sig_consts::GPS_L1_HZ / sig_consts::GPS_L2_HZ).powi(2);
        assert!((l2 - l1 * gamma).abs() < 1e-18);
        /* a GLONASS signal has no GPS group delay */
        assert!(e
            .group_delay(&GnssSignal::new(1, Code::GloL1of).unwrap())
            .is_err());

        let e = make_gal_eph();
        let e1 = e
            .group_delay(&GnssSignal::new(8, Code::GalE1b).unwrap())
            .unwrap();
        let e5a = e
            .group_delay(&GnssSignal::new(8, Code::GalE5x).unwrap())
            .unwrap();
        let gamma = (sig_consts::GAL_E1_HZ / sig_consts::GAL_E5_HZ).powi(2);
        assert!((e5a - e1 * gamma).abs() < 1e-18);
        assert!(e
            .group_delay(&GnssSignal::new(8, Code::GalE6b).unwrap())
            .is_err());

        let e = make_glo_eph();
        let EphemerisTerms::Glo(glo) = *e.terms() else {
            unreachable!()
        };
        assert_eq!(
            e.group_delay(&GnssSignal::new(3, Code::GloL1of).unwrap())
                .unwrap(),
            0.0
        );
        assert_eq!(
            e.group_delay(&GnssSignal::new(3, Code::GloL2of).unwrap())
                .unwrap(),
            glo.d_tau
        );
        assert!(e
            .group_delay(&GnssSignal::new(1, Code::Bds2B1).unwrap())
            .is_err());
    }

    #[test]
    fn doppler_sign() {
        /* a satellite moving towards the receiver produces a positive shift */
        let e = make_sbas_eph();
        let pos = ECEF::new(-2_715_898.0, -4_266_139.6, 3_891_352.86);
        let doppler = e
            .calc_satellite_doppler(&e.toe(), &pos, &ECEF::default())
            .unwrap();

        let state = e.calc_satellite_state(&e.toe()).unwrap();
        let los = state.pos - pos;
        let closing = state.vel.dot(&los) < 0.0;
        assert_eq!(doppler > 0.0, closing);
    }

    #[test]
    fn ephemeris_equality() {
        let a = make_gps_eph();
        let b = make_gps_eph();
        assert_eq!(a, b);

        let mut c = make_gps_eph();
        if let EphemerisTerms::Kepler(ref mut kepler) = c.terms {
            kepler.iode = 161;
        }
        assert_ne!(a, c);
    }
}
