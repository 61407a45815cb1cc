// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.

use crate::time::{consts, is_leap_year, GpsTime, UtcParams, MJD};

/* Total number of days in the year after each month, non-leap then leap year */
const DAYS_AFTER_MONTH: [[u16; 13]; 2] = [
    [0, 31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334, 365],
    [0, 31, 60, 91, 121, 152, 182, 213, 244, 274, 305, 335, 366],
];

/* Days before each year of the GLONASS four-year cycle. The cycle starts on a
 * leap year. */
const DAYS_BEFORE_CYCLE_YEAR: [u16; 4] = [0, 366, 731, 1096];

/// Representation of GLONASS Time
///
/// GLONASS time is Moscow decree time, UTC + 3 hours, counted as a day number
/// within a four-year cycle plus the time of day.
#[derive(Debug, Copy, Clone, serde::Serialize, serde::Deserialize)]
pub struct GloTime {
    /// Day number within the four-year interval [1-1461].
    /// Comes from the field NT in the GLO string 4.
    nt: u16,
    /// Four-year interval number starting from 1996 [1-31].
    /// Comes from the field N4 in the GLO string 5.
    n4: u8,
    /// Hours [0-23]
    h: u8,
    /// Minutes [0-59]
    m: u8,
    /// Seconds [0-60]
    s: f64,
}

impl GloTime {
    /// Creates a new `GloTime`
    ///
    /// `nt` - Day number within the four-year interval [1-1461].
    ///      Comes from the field NT in the GLO string 4.
    ///
    /// `n4` - Four-year interval number starting from 1996 [1-31].
    ///      Comes from the field N4 in the GLO string 5.
    ///
    /// h/m/s come either from the field tb in the GLO string 2
    ///      or the field tk in the GLO string 1
    /// `h` - Hours [0-24]
    /// `m` - Minutes [0-59]
    /// `s` - Seconds [0-60]
    #[must_use]
    pub fn new(nt: u16, n4: u8, h: u8, m: u8, s: f64) -> GloTime {
        GloTime { nt, n4, h, m, s }
    }

    #[must_use]
    pub fn nt(&self) -> u16 {
        self.nt
    }

    #[must_use]
    pub fn n4(&self) -> u8 {
        self.n4
    }

    #[must_use]
    pub fn h(&self) -> u8 {
        self.h
    }

    #[must_use]
    pub fn m(&self) -> u8 {
        self.m
    }

    #[must_use]
    pub fn s(&self) -> f64 {
        self.s
    }

    /// Converts a GLONASS time into a GPS time
    ///
    /// Returns the unknown time sentinel when NT or N4 are outside their
    /// defined ranges.
    #[must_use]
    pub fn to_gps(self, utc_params: &UtcParams) -> GpsTime {
        self.to_gps_internal(Some(utc_params))
    }

    /// Converts a GLONASS time into a GPS time using the hardcoded list of
    /// leap seconds.
    ///
    /// # ⚠️  🦘  ⏱  ⚠️  - Leap Seconds
    ///
    /// The hard coded list of leap seconds will get out of date, it is
    /// preferable to use [`GloTime::to_gps()`] with the newest set of UTC
    /// parameters
    #[must_use]
    pub fn to_gps_hardcoded(self) -> GpsTime {
        self.to_gps_internal(None)
    }

    pub(crate) fn to_gps_internal(self, params: Option<&UtcParams>) -> GpsTime {
        if self.n4 < 1 || self.n4 > consts::GLO_N4_MAX {
            return GpsTime::unknown();
        }
        if self.nt < 1 || self.nt > consts::GLO_NT_MAX {
            return GpsTime::unknown();
        }

        /* an input second count of 60 or more means the time stamp is inside a
         * positive leap second event, convert as :59 and restore the second at
         * the end */
        let is_lse = self.s >= 60.0;
        let s = if is_lse { self.s - 1.0 } else { self.s };

        let (year, doy) = cycle_to_year_doy(self.n4, self.nt);
        let (month, day) = doy_to_month_day(year, doy);

        let mjd = MJD::from_parts(year, month, day, self.h, self.m, s);
        /* remove the Moscow decree time offset to get UTC */
        let utc_mjd = MJD::from_f64(
            mjd.as_f64() - f64::from(consts::GLO_UTC_OFFSET_HOURS) / f64::from(consts::DAY_HOURS),
        );

        let mut gps = utc_mjd.to_gps_internal(params);

        if is_lse {
            gps += std::time::Duration::from_secs(1);
        }
        gps
    }

    pub(crate) fn from_gps_internal(gps: GpsTime, params: Option<&UtcParams>) -> GloTime {
        let utc = gps.internal_to_utc(params);

        /* apply the Moscow decree time offset, carrying into the calendar date
         * when the extra hours roll past midnight */
        let mut hour = utc.hour() + consts::GLO_UTC_OFFSET_HOURS as u8;
        let mut year = utc.year();
        let mut doy = utc.day_of_year();
        if hour >= consts::DAY_HOURS as u8 {
            hour -= consts::DAY_HOURS as u8;
            doy += 1;
            let year_len = if is_leap_year(year) {
                consts::LEAP_YEAR_DAYS as u16
            } else {
                consts::YEAR_DAYS as u16
            };
            if doy > year_len {
                doy = 1;
                year += 1;
            }
        }

        let (n4, nt) = year_doy_to_cycle(year, doy);

        GloTime {
            nt,
            n4,
            h: hour,
            m: utc.minute(),
            s: utc.seconds(),
        }
    }
}

/// Calendar year and day-of-year of a GLONASS cycle day number
fn cycle_to_year_doy(n4: u8, nt: u16) -> (u16, u16) {
    let base_year = 1996 + 4 * (u16::from(n4) - 1);
    for (i, days_before) in DAYS_BEFORE_CYCLE_YEAR.iter().enumerate().rev() {
        if nt > *days_before {
            return (base_year + i as u16, nt - days_before);
        }
    }
    (base_year, nt)
}

fn year_doy_to_cycle(year: u16, doy: u16) -> (u8, u16) {
    let years_since_epoch = year - 1996;
    let n4 = (years_since_epoch / 4 + 1) as u8;
    let year_in_cycle = (years_since_epoch % 4) as usize;
    (n4, doy + DAYS_BEFORE_CYCLE_YEAR[year_in_cycle])
}

fn doy_to_month_day(year: u16, doy: u16) -> (u8, u8) {
    let leap = usize::from(is_leap_year(year));
    for month in (1..=12).rev() {
        let days_before = DAYS_AFTER_MONTH[leap][month - 1];
        if doy > days_before {
            return (month as u8, (doy - days_before) as u8);
        }
    }
    (1, doy as u8)
}
