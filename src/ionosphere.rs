// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! Ionosphere delay calculation
//!
//! Ionospheric delays are typically modeled with the Klobuchar model. The model
//! parameters are broadcast by the GPS constellation.
//!
//! The computed delay is a pure addition to the signal flight time, so the
//! correction is applied by subtracting it from the pseudorange, and scaled
//! corrections add on the carrier phase.
//!
//! # References
//!  * IS-GPS-200H, Section 20.3.3.5.2.5 and Figure 20-4

use crate::signal::consts::C;
use crate::time::{consts, GpsTime};

/// Represents an ionosphere model
#[derive(Debug, Clone, PartialOrd, PartialEq)]
pub struct Ionosphere {
    /// Reference time of the parameters
    toa: GpsTime,
    a0: f64,
    a1: f64,
    a2: f64,
    a3: f64,
    b0: f64,
    b1: f64,
    b2: f64,
    b3: f64,
}

impl Ionosphere {
    /// Construct an ionosphere model from already decoded parameters
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        toa: GpsTime,
        a0: f64,
        a1: f64,
        a2: f64,
        a3: f64,
        b0: f64,
        b1: f64,
        b2: f64,
        b3: f64,
    ) -> Ionosphere {
        Ionosphere {
            toa,
            a0,
            a1,
            a2,
            a3,
            b0,
            b1,
            b2,
            b3,
        }
    }

    /// Reference time of the model parameters
    #[must_use]
    pub fn toa(&self) -> GpsTime {
        self.toa
    }

    /// Calculate ionospheric delay using Klobuchar model.
    ///
    /// * `t` - GPS time at which to calculate the ionospheric delay
    /// * `lat_u` - Latitude of the receiver \[rad\]
    /// * `lon_u` - Longitude of the receiver \[rad\]
    /// * `a` - Azimuth of the satellite, clockwise positive from North \[rad\]
    /// * `e` - Elevation of the satellite \[rad\]
    ///
    /// Returns the ionospheric delay distance for the GPS L1 frequency \[m\]
    #[must_use]
    pub fn calc_delay(&self, t: &GpsTime, lat_u: f64, lon_u: f64, a: f64, e: f64) -> f64 {
        /* the model works in semicircles */
        let lat_u = lat_u / std::f64::consts::PI;
        let lon_u = lon_u / std::f64::consts::PI;
        let e = e / std::f64::consts::PI;

        /* earth centered angle of the ionospheric pierce point */
        let psi = 0.0137 / (e + 0.11) - 0.022;

        /* subionospheric latitude, clamped towards the poles */
        let mut lat_i = lat_u + psi * a.cos();
        lat_i = lat_i.clamp(-0.416, 0.416);

        /* subionospheric longitude */
        let lon_i = lon_u + psi * a.sin() / (lat_i * std::f64::consts::PI).cos();

        /* geomagnetic latitude */
        let lat_m = lat_i + 0.064 * ((lon_i - 1.617) * std::f64::consts::PI).cos();

        /* local time at the pierce point */
        let mut t_local = 43200.0 * lon_i + t.tow();
        t_local -= (t_local / f64::from(consts::DAY_SECS)).floor() * f64::from(consts::DAY_SECS);

        /* obliquity factor */
        let sf = 1.0 + 16.0 * (0.53 - e).powi(3);

        /* period of the cosine model */
        let mut per = self.b0 + lat_m * (self.b1 + lat_m * (self.b2 + lat_m * self.b3));
        if per < 72000.0 {
            per = 72000.0;
        }

        /* amplitude of the cosine model */
        let mut amp = self.a0 + lat_m * (self.a1 + lat_m * (self.a2 + lat_m * self.a3));
        if amp < 0.0 {
            amp = 0.0;
        }

        let x = 2.0 * std::f64::consts::PI * (t_local - 50400.0) / per;

        let t_iono = if x.abs() < 1.57 {
            let x2 = x * x;
            sf * (5e-9 + amp * (1.0 - x2 / 2.0 + x2 * x2 / 24.0))
        } else {
            sf * 5e-9
        };

        t_iono * C
    }
}
