// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.

use super::{consts, Constellation};

/// Largest SV-induced Doppler magnitude on the GPS L1 carrier [Hz]
///
/// Dopplers on other carriers scale with the carrier frequency.
const GPS_L1_DOPPLER_MAX_HZ: f64 = 4200.0;

/// Code identifiers
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
    strum::AsRefStr,
    strum::Display,
    strum::EnumIter,
    strum::EnumString,
    strum::FromRepr,
    strum::IntoStaticStr,
)]
#[repr(u8)]
pub enum Code {
    #[strum(to_string = "GPS L1CA")]
    /// GPS L1CA: BPSK(1)
    GpsL1ca,
    #[strum(to_string = "GPS L2CM")]
    /// GPS L2C: 2 x BPSK(0.5)
    GpsL2cm,
    #[strum(to_string = "SBAS L1")]
    /// SBAS L1: BPSK(1)
    SbasL1ca,
    #[strum(to_string = "GLO L1OF")]
    /// GLONASS L1OF: FDMA BPSK(0.5)
    GloL1of,
    #[strum(to_string = "GLO L2OF")]
    /// GLONASS L2OF: FDMA BPSK(0.5)
    GloL2of,
    #[strum(to_string = "GPS L1P")]
    /// GPS L1P(Y): encrypted BPSK(10)
    GpsL1p,
    #[strum(to_string = "GPS L2P")]
    /// GPS L2P(Y): encrypted BPSK(10)
    GpsL2p,
    #[strum(to_string = "GPS L2CL")]
    GpsL2cl,
    #[strum(to_string = "GPS L2C")]
    GpsL2cx,
    #[strum(to_string = "GPS L5I")]
    /// GPS L5: QPSK(10) at 1150*f0
    GpsL5i,
    #[strum(to_string = "GPS L5Q")]
    GpsL5q,
    #[strum(to_string = "GPS L5")]
    GpsL5x,
    #[strum(to_string = "BDS B1")]
    /// BDS2 B1I: BPSK(2) at 1526*f0
    Bds2B1,
    #[strum(to_string = "BDS B2")]
    /// BDS2 B2I: BPSK(2) at 1180*f0
    Bds2B2,
    #[strum(to_string = "GAL E1B")]
    /// Galileo E1: CASM CBOC(1,1) at 1540*f0
    GalE1b,
    #[strum(to_string = "GAL E1C")]
    GalE1c,
    #[strum(to_string = "GAL E1")]
    GalE1x,
    #[strum(to_string = "GAL E6B")]
    /// Galileo E6: CASM BPSK(5) at 1250*f0
    GalE6b,
    #[strum(to_string = "GAL E6C")]
    GalE6c,
    #[strum(to_string = "GAL E6")]
    GalE6x,
    #[strum(to_string = "GAL E5bI")]
    /// Galileo E5b: QPSK(10) at 1180*f0
    GalE7i,
    #[strum(to_string = "GAL E5bQ")]
    GalE7q,
    #[strum(to_string = "GAL E5b")]
    GalE7x,
    #[strum(to_string = "GAL E8I")]
    /// Galileo E5AltBOC(15,10) at 1165*f0
    GalE8i,
    #[strum(to_string = "GAL E8Q")]
    GalE8q,
    #[strum(to_string = "GAL E8")]
    GalE8x,
    #[strum(to_string = "GAL E5aI")]
    /// Galileo E5a: QPSK(10) at 1150*f0
    GalE5i,
    #[strum(to_string = "GAL E5aQ")]
    GalE5q,
    #[strum(to_string = "GAL E5a")]
    GalE5x,
    #[strum(to_string = "GLO L1P")]
    /// GLONASS L1P: encrypted
    GloL1p,
    #[strum(to_string = "GLO L2P")]
    /// GLONASS L2P: encrypted
    GloL2p,
    #[strum(to_string = "QZS L1CA")]
    /// QZSS L1CA: BPSK(1) at 1540*f0
    QzsL1ca,
    #[strum(to_string = "QZS L1CI")]
    /// QZSS L1C: TM-BOC at 1540*f0
    QzsL1ci,
    #[strum(to_string = "QZS L1CQ")]
    QzsL1cq,
    #[strum(to_string = "QZS L1CX")]
    QzsL1cx,
    #[strum(to_string = "QZS L2CM")]
    /// QZSS L2C: 2 x BPSK(0.5) at 1200*f0
    QzsL2cm,
    #[strum(to_string = "QZS L2CL")]
    QzsL2cl,
    #[strum(to_string = "QZS L2C")]
    QzsL2cx,
    #[strum(to_string = "QZS L5I")]
    /// QZSS L5: QPSK(10) at 1150*f0
    QzsL5i,
    #[strum(to_string = "QZS L5Q")]
    QzsL5q,
    #[strum(to_string = "QZS L5")]
    QzsL5x,
    #[strum(to_string = "SBAS L5I")]
    /// SBAS L5: ? at 1150*f0
    SbasL5i,
    #[strum(to_string = "SBAS L5Q")]
    SbasL5q,
    #[strum(to_string = "SBAS L5")]
    SbasL5x,
    #[strum(to_string = "BDS3 B1CI")]
    /// BDS3 B1C: TM-BOC at 1540*f0
    Bds3B1ci,
    #[strum(to_string = "BDS3 B1CQ")]
    Bds3B1cq,
    #[strum(to_string = "BDS3 B1C")]
    Bds3B1cx,
    #[strum(to_string = "BDS3 B5I")]
    /// BDS3 B2a: QPSK(10) at 1150*f0
    Bds3B5i,
    #[strum(to_string = "BDS3 B5Q")]
    Bds3B5q,
    #[strum(to_string = "BDS3 B5")]
    Bds3B5x,
    #[strum(to_string = "BDS3 B7I")]
    /// BDS3 B2b: QPSK(10) at 1180*f0
    Bds3B7i,
    #[strum(to_string = "BDS3 B7Q")]
    Bds3B7q,
    #[strum(to_string = "BDS3 B7")]
    Bds3B7x,
    #[strum(to_string = "BDS3 B3I")]
    /// BDS3 B3I: QPSK(10) at 1240*f0
    Bds3B3i,
    #[strum(to_string = "BDS3 B3Q")]
    Bds3B3q,
    #[strum(to_string = "BDS3 B3")]
    Bds3B3x,
    #[strum(to_string = "GPS L1CI")]
    /// GPS L1C: TM-BOC at 1540*f0
    GpsL1ci,
    #[strum(to_string = "GPS L1CQ")]
    GpsL1cq,
    #[strum(to_string = "GPS L1C")]
    GpsL1cx,
    #[strum(to_string = "GPS AUX")]
    /// Auxiliary GPS antenna signals
    AuxGps,
    #[strum(to_string = "SBAS AUX")]
    /// Auxiliary SBAS antenna signals
    AuxSbas,
    #[strum(to_string = "GAL AUX")]
    /// Auxiliary GAL antenna signals
    AuxGal,
    #[strum(to_string = "QZS AUX")]
    /// Auxiliary QZSS antenna signals
    AuxQzs,
    #[strum(to_string = "BDS AUX")]
    /// Auxiliary BDS antenna signals
    AuxBds,
}

impl Code {
    /// Gets the corresponding [`Constellation`]
    #[must_use]
    pub fn to_constellation(self) -> Constellation {
        match self {
            Code::GpsL1ca
            | Code::GpsL2cm
            | Code::GpsL1p
            | Code::GpsL2p
            | Code::GpsL2cl
            | Code::GpsL2cx
            | Code::GpsL5i
            | Code::GpsL5q
            | Code::GpsL5x
            | Code::GpsL1ci
            | Code::GpsL1cq
            | Code::GpsL1cx
            | Code::AuxGps => Constellation::Gps,
            Code::SbasL1ca | Code::SbasL5i | Code::SbasL5q | Code::SbasL5x | Code::AuxSbas => {
                Constellation::Sbas
            }
            Code::GloL1of | Code::GloL2of | Code::GloL1p | Code::GloL2p => Constellation::Glo,
            Code::Bds2B1
            | Code::Bds2B2
            | Code::Bds3B1ci
            | Code::Bds3B1cq
            | Code::Bds3B1cx
            | Code::Bds3B5i
            | Code::Bds3B5q
            | Code::Bds3B5x
            | Code::Bds3B7i
            | Code::Bds3B7q
            | Code::Bds3B7x
            | Code::Bds3B3i
            | Code::Bds3B3q
            | Code::Bds3B3x
            | Code::AuxBds => Constellation::Bds,
            Code::GalE1b
            | Code::GalE1c
            | Code::GalE1x
            | Code::GalE6b
            | Code::GalE6c
            | Code::GalE6x
            | Code::GalE7i
            | Code::GalE7q
            | Code::GalE7x
            | Code::GalE8i
            | Code::GalE8q
            | Code::GalE8x
            | Code::GalE5i
            | Code::GalE5q
            | Code::GalE5x
            | Code::AuxGal => Constellation::Gal,
            Code::QzsL1ca
            | Code::QzsL1ci
            | Code::QzsL1cq
            | Code::QzsL1cx
            | Code::QzsL2cm
            | Code::QzsL2cl
            | Code::QzsL2cx
            | Code::QzsL5i
            | Code::QzsL5q
            | Code::QzsL5x
            | Code::AuxQzs => Constellation::Qzs,
        }
    }

    /// Checks if this is a GPS code
    #[must_use]
    pub fn is_gps(self) -> bool {
        self.to_constellation() == Constellation::Gps
    }

    /// Checks if this is a SBAS code
    #[must_use]
    pub fn is_sbas(self) -> bool {
        self.to_constellation() == Constellation::Sbas
    }

    /// Checks if this is a GLONASS code
    #[must_use]
    pub fn is_glo(self) -> bool {
        self.to_constellation() == Constellation::Glo
    }

    /// Checks if this is a BeiDou code
    #[must_use]
    pub fn is_bds(self) -> bool {
        self.to_constellation() == Constellation::Bds
    }

    /// Checks if this is a Galileo code
    #[must_use]
    pub fn is_gal(self) -> bool {
        self.to_constellation() == Constellation::Gal
    }

    /// Checks if this is a QZSS code
    #[must_use]
    pub fn is_qzss(self) -> bool {
        self.to_constellation() == Constellation::Qzs
    }

    /// Get the carrier frequency of the given code
    ///
    /// # Note
    ///
    /// GLONASS FDMA codes return the center frequency. To get the channel
    /// frequency use [`Code::get_glo_channel_frequency()`] instead
    #[must_use]
    pub fn get_carrier_frequency(&self) -> f64 {
        match &self {
            Code::GpsL1ca
            | Code::GpsL1p
            | Code::GpsL1ci
            | Code::GpsL1cq
            | Code::GpsL1cx
            | Code::AuxGps => consts::GPS_L1_HZ,
            Code::GpsL2cm | Code::GpsL2p | Code::GpsL2cl | Code::GpsL2cx => consts::GPS_L2_HZ,
            Code::GpsL5i | Code::GpsL5q | Code::GpsL5x => consts::GPS_L5_HZ,

            Code::SbasL1ca | Code::AuxSbas => consts::SBAS_L1_HZ,
            Code::SbasL5i | Code::SbasL5q | Code::SbasL5x => consts::SBAS_L5_HZ,
            Code::GloL1of | Code::GloL1p => consts::GLO_L1_HZ,
            Code::GloL2of | Code::GloL2p => consts::GLO_L2_HZ,
            Code::Bds2B1 | Code::AuxBds => consts::BDS2_B1I_HZ,
            Code::Bds3B1ci | Code::Bds3B1cq | Code::Bds3B1cx => consts::BDS3_B1C_HZ,
            Code::Bds2B2 => consts::BDS2_B2_HZ,
            Code::Bds3B3i | Code::Bds3B3q | Code::Bds3B3x => consts::BDS3_B3_HZ,
            Code::Bds3B5i | Code::Bds3B5q | Code::Bds3B5x => consts::BDS3_B5_HZ,
            Code::Bds3B7i | Code::Bds3B7q | Code::Bds3B7x => consts::BDS3_B7_HZ,
            Code::GalE1b | Code::GalE1c | Code::GalE1x | Code::AuxGal => consts::GAL_E1_HZ,
            Code::GalE5i | Code::GalE5q | Code::GalE5x => consts::GAL_E5_HZ,
            Code::GalE6b | Code::GalE6c | Code::GalE6x => consts::GAL_E6_HZ,
            Code::GalE7i | Code::GalE7q | Code::GalE7x => consts::GAL_E7_HZ,
            Code::GalE8i | Code::GalE8q | Code::GalE8x => consts::GAL_E8_HZ,
            Code::QzsL1ca | Code::QzsL1ci | Code::QzsL1cq | Code::QzsL1cx | Code::AuxQzs => {
                consts::QZS_L1_HZ
            }
            Code::QzsL2cm | Code::QzsL2cl | Code::QzsL2cx => consts::QZS_L2_HZ,
            Code::QzsL5i | Code::QzsL5q | Code::QzsL5x => consts::QZS_L5_HZ,
        }
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
        assert!(*self == Code::GloL1of || *self == Code::GloL2of);

        let fcn = slot + consts::GLO_FCN_OFFSET;
        assert!((consts::GLO_MIN_FCN..=consts::GLO_MAX_FCN).contains(&fcn));

        match &self {
            Code::GloL1of => {
                consts::GLO_L1_HZ + (fcn - consts::GLO_FCN_OFFSET) as f64 * consts::GLO_L1_DELTA_HZ
            }
            Code::GloL2of => {
                consts::GLO_L2_HZ + (fcn - consts::GLO_FCN_OFFSET) as f64 * consts::GLO_L2_DELTA_HZ
            }
            _ => panic!("You can't call get_glo_channel_frequency() on a non-GLONASS FDMA code!"),
        }
    }

    /// Checks if this code is one of the GLONASS FDMA codes, whose actual
    /// carrier depends on the satellite's frequency channel number
    #[must_use]
    pub fn is_glo_fdma(self) -> bool {
        self == Code::GloL1of || self == Code::GloL2of
    }

    /// Get the length of the spreading sequence in chips
    ///
    /// The encrypted P codes return the length of the weekly truncation.
    #[must_use]
    pub fn chip_count(&self) -> u64 {
        match &self {
            Code::GpsL1ca | Code::SbasL1ca | Code::QzsL1ca => 1023,
            Code::GpsL2cm | Code::QzsL2cm | Code::GpsL2cx | Code::QzsL2cx => 10230,
            Code::GpsL2cl | Code::QzsL2cl => 767_250,
            Code::GpsL1p | Code::GpsL2p => 6_187_104_000_000,
            Code::GpsL5i
            | Code::GpsL5q
            | Code::GpsL5x
            | Code::QzsL5i
            | Code::QzsL5q
            | Code::QzsL5x
            | Code::SbasL5i
            | Code::SbasL5q
            | Code::SbasL5x => 10230,
            Code::GloL1of | Code::GloL2of => 511,
            Code::GloL1p | Code::GloL2p => 5_110_000,
            Code::Bds2B1 | Code::Bds2B2 => 2046,
            Code::Bds3B1ci | Code::Bds3B1cq | Code::Bds3B1cx => 10230,
            Code::Bds3B5i
            | Code::Bds3B5q
            | Code::Bds3B5x
            | Code::Bds3B7i
            | Code::Bds3B7q
            | Code::Bds3B7x
            | Code::Bds3B3i
            | Code::Bds3B3q
            | Code::Bds3B3x => 10230,
            Code::GalE1b | Code::GalE1c | Code::GalE1x => 4092,
            Code::GalE6b | Code::GalE6c | Code::GalE6x => 5115,
            Code::GalE7i
            | Code::GalE7q
            | Code::GalE7x
            | Code::GalE8i
            | Code::GalE8q
            | Code::GalE8x
            | Code::GalE5i
            | Code::GalE5q
            | Code::GalE5x => 10230,
            Code::GpsL1ci | Code::GpsL1cq | Code::GpsL1cx => 10230,
            Code::QzsL1ci | Code::QzsL1cq | Code::QzsL1cx => 10230,
            Code::AuxGps | Code::AuxSbas | Code::AuxGal | Code::AuxQzs | Code::AuxBds => 0,
        }
    }

    /// Get the chipping rate of the spreading code [chips/s]
    #[must_use]
    pub fn chip_rate(&self) -> f64 {
        match &self {
            Code::GpsL1ca | Code::SbasL1ca | Code::QzsL1ca => consts::CHIP_RATE_1MCPS,
            Code::GpsL2cm
            | Code::GpsL2cl
            | Code::GpsL2cx
            | Code::QzsL2cm
            | Code::QzsL2cl
            | Code::QzsL2cx => consts::CHIP_RATE_L2C,
            Code::GpsL1p | Code::GpsL2p => consts::CHIP_RATE_10MCPS,
            Code::GpsL5i
            | Code::GpsL5q
            | Code::GpsL5x
            | Code::QzsL5i
            | Code::QzsL5q
            | Code::QzsL5x
            | Code::SbasL5i
            | Code::SbasL5q
            | Code::SbasL5x => consts::CHIP_RATE_10MCPS,
            Code::GloL1of | Code::GloL2of => consts::CHIP_RATE_GLO_OF,
            Code::GloL1p | Code::GloL2p => consts::CHIP_RATE_GLO_P,
            Code::Bds2B1 | Code::Bds2B2 => consts::CHIP_RATE_BDS2,
            Code::Bds3B1ci | Code::Bds3B1cq | Code::Bds3B1cx => consts::CHIP_RATE_1MCPS,
            Code::Bds3B5i
            | Code::Bds3B5q
            | Code::Bds3B5x
            | Code::Bds3B7i
            | Code::Bds3B7q
            | Code::Bds3B7x
            | Code::Bds3B3i
            | Code::Bds3B3q
            | Code::Bds3B3x => consts::CHIP_RATE_10MCPS,
            Code::GalE1b | Code::GalE1c | Code::GalE1x => consts::CHIP_RATE_1MCPS,
            Code::GalE6b | Code::GalE6c | Code::GalE6x => consts::CHIP_RATE_E6,
            Code::GalE7i
            | Code::GalE7q
            | Code::GalE7x
            | Code::GalE8i
            | Code::GalE8q
            | Code::GalE8x
            | Code::GalE5i
            | Code::GalE5q
            | Code::GalE5x => consts::CHIP_RATE_10MCPS,
            Code::GpsL1ci | Code::GpsL1cq | Code::GpsL1cx => consts::CHIP_RATE_1MCPS,
            Code::QzsL1ci | Code::QzsL1cq | Code::QzsL1cx => consts::CHIP_RATE_1MCPS,
            Code::AuxGps | Code::AuxSbas | Code::AuxGal | Code::AuxQzs | Code::AuxBds => 0.0,
        }
    }

    /// Get the repetition period of the PRN sequence [ms]
    ///
    /// Returns zero for codes without a usable short-cycle period, i.e. the
    /// weekly truncated encrypted codes and the auxiliary channels.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn prn_period_ms(&self) -> u32 {
        match &self {
            Code::GpsL1p | Code::GpsL2p => 0,
            Code::AuxGps | Code::AuxSbas | Code::AuxGal | Code::AuxQzs | Code::AuxBds => 0,
            _ => {
                let rate = self.chip_rate();
                let chips = self.chip_count() as f64;
                (chips / rate * 1000.0).round() as u32
            }
        }
    }

    /// Checks whether the code is short enough to be acquired directly,
    /// without handover from another signal
    #[must_use]
    pub fn requires_direct_acq(&self) -> bool {
        matches!(
            self,
            Code::GpsL1ca
                | Code::SbasL1ca
                | Code::QzsL1ca
                | Code::GloL1of
                | Code::GloL2of
                | Code::Bds2B1
                | Code::GalE1b
                | Code::GalE1c
                | Code::GalE1x
        )
    }

    /// Checks whether a navigation data decoder is needed to use the signal
    ///
    /// True for the data components of each signal, false for pilot
    /// components and the encrypted codes.
    #[must_use]
    pub fn requires_data_decoder(&self) -> bool {
        matches!(
            self,
            Code::GpsL1ca
                | Code::GpsL2cm
                | Code::GpsL2cx
                | Code::GpsL5i
                | Code::GpsL5x
                | Code::GpsL1ci
                | Code::GpsL1cx
                | Code::SbasL1ca
                | Code::SbasL5i
                | Code::SbasL5x
                | Code::GloL1of
                | Code::GloL2of
                | Code::Bds2B1
                | Code::Bds2B2
                | Code::Bds3B1ci
                | Code::Bds3B1cx
                | Code::Bds3B5i
                | Code::Bds3B5x
                | Code::Bds3B7i
                | Code::Bds3B7x
                | Code::Bds3B3i
                | Code::Bds3B3x
                | Code::GalE1b
                | Code::GalE1x
                | Code::GalE6b
                | Code::GalE6x
                | Code::GalE7i
                | Code::GalE7x
                | Code::GalE8i
                | Code::GalE8x
                | Code::GalE5i
                | Code::GalE5x
                | Code::QzsL1ca
                | Code::QzsL1ci
                | Code::QzsL1cx
                | Code::QzsL2cm
                | Code::QzsL2cx
                | Code::QzsL5i
                | Code::QzsL5x
        )
    }

    /// Carrier phase alignment offset of the code [cycles]
    ///
    /// Quadrature pilot components and the encrypted codes are broadcast a
    /// quarter cycle off from the in-phase data component of the same
    /// carrier, following the conventions of RINEX 3.03 Table A23.
    #[must_use]
    pub fn carrier_phase_alignment(&self) -> f64 {
        match &self {
            Code::GpsL1p
            | Code::GpsL2p
            | Code::GloL1p
            | Code::GloL2p
            | Code::GpsL5q
            | Code::GpsL1cq
            | Code::GpsL2cl
            | Code::QzsL5q
            | Code::QzsL1cq
            | Code::QzsL2cl
            | Code::SbasL5q
            | Code::GalE1c
            | Code::GalE6c
            | Code::GalE7q
            | Code::GalE8q
            | Code::GalE5q
            | Code::Bds3B1cq
            | Code::Bds3B5q
            | Code::Bds3B7q
            | Code::Bds3B3q => 0.25,
            _ => 0.0,
        }
    }

    /// The number of signals of this code broadcast by the constellation
    #[must_use]
    pub fn sig_count(&self) -> u16 {
        self.to_constellation().sat_count()
    }

    /// Largest SV-induced Doppler magnitude expected on this code [Hz]
    #[must_use]
    pub fn max_sv_doppler_hz(&self) -> f64 {
        GPS_L1_DOPPLER_MAX_HZ * self.get_carrier_frequency() / consts::GPS_L1_HZ
    }

    /// Get an iterator through the codes
    pub fn iter() -> CodeIter {
        <Self as strum::IntoEnumIterator>::iter()
    }
}

/// An error encountered when converting an integer into a [`Code`]
/// and no code is associated with the given value
#[derive(thiserror::Error, Debug, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash)]
#[error("Invalid integer for GNSS Code ({0})")]
pub struct InvalidCodeInt(u8);

impl std::convert::TryFrom<u8> for Code {
    type Error = InvalidCodeInt;
    fn try_from(value: u8) -> Result<Code, Self::Error> {
        Code::from_repr(value).ok_or(InvalidCodeInt(value))
    }
}
