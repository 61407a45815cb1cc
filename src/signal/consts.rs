// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
use crate::math::compile_time_max_u16;

/// The speed of light, as used by all GNSS interface control documents [m/s]
pub const C: f64 = 299_792_458.0;

/// Total number of satellites in the GPS constellation.
pub const NUM_SATS_GPS: u16 = 32;
/// Total number of satellites in the SBAS constellation.
pub const NUM_SATS_SBAS: u16 = 19;
/// Total number of satellites in the GLONASS constellation.
/// refer to <https://igscb.jpl.nasa.gov/pipermail/igsmail/2012/007771.html> and
/// <https://igscb.jpl.nasa.gov/pipermail/igsmail/2015/008391.html>
pub const NUM_SATS_GLO: u16 = 28;
/// Total number of satellites in the BeiDou constellation.
pub const NUM_SATS_BDS: u16 = 64;
/// Total number of satellites in the Galileo constellation.
pub const NUM_SATS_GAL: u16 = 36;
/// Total number of satellites in the QZSS constellation.
pub const NUM_SATS_QZS: u16 = 10;

/// Total number of satellites in all constellations
pub const NUM_SATS: u16 =
    NUM_SATS_GPS + NUM_SATS_SBAS + NUM_SATS_GLO + NUM_SATS_BDS + NUM_SATS_QZS + NUM_SATS_GAL;

/// The maximum number of satellites in a single constellation
pub const MAX_NUM_SATS: u16 = compile_time_max_u16(
    NUM_SATS_GPS,
    compile_time_max_u16(
        NUM_SATS_SBAS,
        compile_time_max_u16(
            NUM_SATS_GLO,
            compile_time_max_u16(
                NUM_SATS_BDS,
                compile_time_max_u16(NUM_SATS_QZS, NUM_SATS_GAL),
            ),
        ),
    ),
);

/// Max number of GLO frequency slot, correspond to frequency slot 6
pub const GLO_MAX_FCN: i16 = 14;

/// Min number of GLO frequency slot, correspond to frequency slot -7
pub const GLO_MIN_FCN: i16 = 1;

/// Used to produce an unshifted GLO frequency slot out of GLO slots in
/// GLO_MIN_FCN .. GLO_MAX_FCN range
pub const GLO_FCN_OFFSET: i16 = 8;

/// The first PRN number used in the GPS constellation.
pub const GPS_FIRST_PRN: u16 = 1;
/// The first PRN number used in the SBAS constellation.
pub const SBAS_FIRST_PRN: u16 = 120;
/// The first PRN number used in the GLONASS constellation.
pub const GLO_FIRST_PRN: u16 = 1;
/// The first PRN number used in the BeiDou constellation.
pub const BDS_FIRST_PRN: u16 = 1;
/// The first PRN number used in the Galileo constellation.
pub const GAL_FIRST_PRN: u16 = 1;
/// The first PRN number used in the QZSS constellation.
pub const QZS_FIRST_PRN: u16 = 193;

/// The GPS L1 center frequency in Hz.
pub const GPS_L1_HZ: f64 = 1.57542e9;
/// The GPS L2 center frequency in Hz.
pub const GPS_L2_HZ: f64 = 1.22760e9;
/// The GPS L5 center frequency in Hz.
pub const GPS_L5_HZ: f64 = 115. * 10.23e6;
/// The GLO L1 center frequency in Hz.
pub const GLO_L1_HZ: f64 = 1.602e9;
/// The GLO L2 center frequency in Hz.
pub const GLO_L2_HZ: f64 = 1.246e9;
/// Centre frequency of SBAS L1
pub const SBAS_L1_HZ: f64 = 1.023e6 * 1540.;
/// Centre frequency of SBAS L5
pub const SBAS_L5_HZ: f64 = 1.023e6 * 1150.;
/// Centre frequency of Beidou2 B1I
pub const BDS2_B1I_HZ: f64 = 1.023e6 * (1540. - 14.);
/// Centre frequency of Beidou2 B2
pub const BDS2_B2_HZ: f64 = 1.023e6 * 1180.;
/// Centre frequency of Beidou3 B1C
pub const BDS3_B1C_HZ: f64 = 154. * 10.23e6;
/// Centre frequency of Beidou3 B3
pub const BDS3_B3_HZ: f64 = 124. * 10.23e6;
/// Centre frequency of Beidou3 B2b
pub const BDS3_B7_HZ: f64 = 118. * 10.23e6;
/// Centre frequency of Beidou3 B2a
pub const BDS3_B5_HZ: f64 = 115. * 10.23e6;
/// Centre frequency of Galileo E1
pub const GAL_E1_HZ: f64 = 1.023e6 * 1540.;
/// Centre frequency of Galileo E6
pub const GAL_E6_HZ: f64 = 1.023e6 * 1250.;
/// Centre frequency of Galileo E5b
pub const GAL_E7_HZ: f64 = 1.023e6 * 1180.;
/// Centre frequency of Galileo E5AltBOC
pub const GAL_E8_HZ: f64 = 1.023e6 * 1165.;
/// Centre frequency of Galileo E5a
pub const GAL_E5_HZ: f64 = 1.023e6 * 1150.;
/// Centre frequency of QZSS L1CA
pub const QZS_L1_HZ: f64 = 1.023e6 * 1540.;
/// Centre frequency of QZSS L2C
pub const QZS_L2_HZ: f64 = 1.023e6 * 1200.;
/// Centre frequency of QZSS L5
pub const QZS_L5_HZ: f64 = 1.023e6 * 1150.;

/// Frequency range between two adjacent GLO channel in Hz for L1 band
pub const GLO_L1_DELTA_HZ: f64 = 5.625e5;
/// Frequency range between two adjacent GLO channel in Hz for L2 band
pub const GLO_L2_DELTA_HZ: f64 = 4.375e5;

/// Chipping rate of the legacy civil codes, BPSK(1) [chips/s]
pub const CHIP_RATE_1MCPS: f64 = 1.023e6;
/// Chipping rate of the modern 10x codes, BPSK(10)/QPSK(10) [chips/s]
pub const CHIP_RATE_10MCPS: f64 = 10.23e6;
/// Chipping rate of the GPS/QZSS L2C codes [chips/s]
pub const CHIP_RATE_L2C: f64 = 0.5115e6;
/// Chipping rate of the GLONASS civil FDMA codes [chips/s]
pub const CHIP_RATE_GLO_OF: f64 = 0.511e6;
/// Chipping rate of the GLONASS P codes [chips/s]
pub const CHIP_RATE_GLO_P: f64 = 5.11e6;
/// Chipping rate of the BeiDou2 civil codes [chips/s]
pub const CHIP_RATE_BDS2: f64 = 2.046e6;
/// Chipping rate of the Galileo E6 codes [chips/s]
pub const CHIP_RATE_E6: f64 = 5.115e6;
