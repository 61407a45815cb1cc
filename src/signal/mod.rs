// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! GNSS Signals and related functionality
//!
//! Signals are specific to a satellite and code combination. A satellite is
//! identified by it's assigned number and the constellation it belongs to. Each
//! satellite can send out multiple signals.
//!
//! This module provides:
//! - [`Constellation`] - Representing the supporting GNSS constellations
//! - [`Code`] - Representing the codes broadcast from the GNSS satellites
//! - [`GnssSignal`] - Represents a [`Code`] broadcast by a specific satellite, using the satellite PRN as the identifier
//! - [`FcnMap`] - The satellite to frequency channel number mapping needed to
//!   resolve the carrier of the GLONASS FDMA signals
//!
//! # Examples
//!
//! ```rust
//! # use std::str::FromStr;
//! # use gnss_pvt::signal::{Code, Constellation, GnssSignal};
//! let sid = GnssSignal::new(22, Code::GpsL1ca).unwrap();
//!
//! assert_eq!(sid.to_constellation(), Constellation::Gps);
//! assert_eq!(sid.to_string(), "GPS L1CA 22");
//!
//! assert_eq!(Constellation::Gal.sat_count(), 36);
//!
//! let code = Code::from_str("BDS3 B1C").unwrap();
//! assert_eq!(code.get_carrier_frequency(), 1575.42e6);
//! ```
mod code;
mod constellation;
pub mod consts;

pub use code::*;
pub use constellation::*;
use std::fmt;

/// GNSS Signal identifier
#[derive(
    Debug,
    Copy,
    Clone,
    Ord,
    PartialOrd,
    Eq,
    PartialEq,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
pub struct GnssSignal {
    code: Code,
    sat: u16,
}

/// An error encountered when converting an integer into a [`GnssSignal`]
/// and satellite number is not in the valid range for the associated constellation
#[derive(thiserror::Error, Debug, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash)]
#[error("The satellite number is not valid for the associated constellation ({0})")]
pub struct InvalidSatellite(u16);

#[derive(thiserror::Error, Debug, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub enum InvalidGnssSignal {
    #[error("Invalid code")]
    InvalidCode(#[from] InvalidCodeInt),
    #[error("Invalid satellite")]
    InvalidSatellite(#[from] InvalidSatellite),
}

impl GnssSignal {
    /// Make a [`GnssSignal`] from its constituent parts, check for a valid satellite PRN
    ///
    /// The `sat` value is checked to be a valid PRN value for the given constellation
    pub fn new(sat: u16, code: Code) -> Result<GnssSignal, InvalidSatellite> {
        let constellation = code.to_constellation();
        if sat < constellation.first_prn()
            || sat >= (constellation.first_prn() + constellation.sat_count())
        {
            Err(InvalidSatellite(sat))
        } else {
            Ok(GnssSignal { code, sat })
        }
    }

    /// Get the satellite PRN of the signal
    #[must_use]
    pub fn sat(&self) -> u16 {
        self.sat
    }

    /// Get the [`Code`] of the signal
    #[must_use]
    pub fn code(&self) -> Code {
        self.code
    }

    /// Get the [`Constellation`] of the signal
    #[must_use]
    pub fn to_constellation(self) -> Constellation {
        self.code.to_constellation()
    }

    /// Get the carrier frequency of the signal
    ///
    /// # Note
    ///
    /// GLONASS FDMA codes return the center frequency. To get the channel
    /// frequency use [`GnssSignal::carrier_frequency_with()`] with a
    /// [`FcnMap`], or [`GnssSignal::get_glo_channel_frequency()`] when the
    /// channel slot is already known
    #[must_use]
    pub fn get_carrier_frequency(&self) -> f64 {
        self.code.get_carrier_frequency()
    }

    /// Get the channel frequency for the given GLONASS FDMA code and channel slot
    ///
    /// The code must be either GLO L1OF or L2OF. The slot number must be between -7 and +6
    ///
    /// # Panics
    ///
    /// This function will panic if the code is not a GLONASS FDMA code, or if the channel slot
    /// is invalid.
    #[must_use]
    pub fn get_glo_channel_frequency(&self, slot: i16) -> f64 {
        self.code.get_glo_channel_frequency(slot)
    }

    /// Get the carrier frequency of the signal, resolving GLONASS FDMA
    /// channels through the given [`FcnMap`]
    ///
    /// # Errors
    ///
    /// Returns an error when the signal is a GLONASS FDMA signal and the map
    /// has no channel recorded for the satellite.
    pub fn carrier_frequency_with(&self, fcn_map: &FcnMap) -> Result<f64, UnknownFcn> {
        if self.code.is_glo_fdma() {
            let slot = fcn_map.get(self.sat).ok_or(UnknownFcn(self.sat))?;
            Ok(self.code.get_glo_channel_frequency(slot))
        } else {
            Ok(self.code.get_carrier_frequency())
        }
    }

    /// Get the carrier wavelength of the signal, resolving GLONASS FDMA
    /// channels through the given [`FcnMap`]
    ///
    /// # Errors
    ///
    /// Returns an error when the signal is a GLONASS FDMA signal and the map
    /// has no channel recorded for the satellite.
    pub fn wavelength_with(&self, fcn_map: &FcnMap) -> Result<f64, UnknownFcn> {
        Ok(consts::C / self.carrier_frequency_with(fcn_map)?)
    }

    /// Get the carrier wavelength of the signal
    ///
    /// GLONASS FDMA codes use the band center frequency.
    #[must_use]
    pub fn wavelength(&self) -> f64 {
        consts::C / self.code.get_carrier_frequency()
    }
}

impl fmt::Display for GnssSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.sat)
    }
}

/// An error raised when a GLONASS satellite has no known frequency channel
#[derive(thiserror::Error, Debug, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash)]
#[error("No frequency channel number known for GLONASS satellite ({0})")]
pub struct UnknownFcn(u16);

/// Mapping from GLONASS satellite number to its FDMA frequency channel slot
///
/// The channel assignments are broadcast in the GLONASS almanac, so they only
/// become known as almanac pages are decoded. The map is a plain value: build
/// it wherever the almanac is processed and hand it to the signal frequency
/// queries that need it. Readers never lock, keep a single writer if the map
/// is shared across threads.
#[derive(Debug, Clone, Default)]
pub struct FcnMap {
    slots: [Option<i16>; consts::NUM_SATS_GLO as usize],
}

impl FcnMap {
    /// Creates a map with no known channel assignments
    #[must_use]
    pub fn new() -> FcnMap {
        FcnMap::default()
    }

    /// Records the channel slot of a satellite
    ///
    /// # Panics
    ///
    /// Panics when the satellite number or the slot are out of range.
    pub fn set(&mut self, sat: u16, slot: i16) {
        assert!(sat >= consts::GLO_FIRST_PRN && sat < consts::GLO_FIRST_PRN + consts::NUM_SATS_GLO);
        let fcn = slot + consts::GLO_FCN_OFFSET;
        assert!((consts::GLO_MIN_FCN..=consts::GLO_MAX_FCN).contains(&fcn));
        self.slots[(sat - consts::GLO_FIRST_PRN) as usize] = Some(slot);
    }

    /// Looks up the channel slot of a satellite
    #[must_use]
    pub fn get(&self, sat: u16) -> Option<i16> {
        if sat < consts::GLO_FIRST_PRN || sat >= consts::GLO_FIRST_PRN + consts::NUM_SATS_GLO {
            return None;
        }
        self.slots[(sat - consts::GLO_FIRST_PRN) as usize]
    }
}
