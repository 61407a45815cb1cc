// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.

use crate::coords::{AzimuthElevation, LLHRadians, ECEF, NED};
use crate::math::{compile_time_sqrt, ecef2ned_matrix};

/// Ellipsoid
///
/// An ellipsoid can be defined in terms of the semi-major axis and a second
/// parameter, here we choose to use the inverse flattening term. The other
/// parameters are derived from these two values.
pub trait Ellipsoid {
    /// Semi-major axis of the Earth in meters.
    const A: f64;
    /// Inverse flattening of the Earth.
    const IF: f64;

    /// The flattening of the Earth.
    const F: f64 = 1.0 / Self::IF;
    /// Semi-minor axis of the Earth in meters.
    const B: f64 = Self::A * (1.0 - Self::F);
    /// Eccentricity of the Earth,  where e^2 = 2f - f^2
    const E: f64 = compile_time_sqrt(2.0 * Self::F - Self::F * Self::F);

    /// Converts geodetic coordinates on this ellipsoid into ECEF coordinates
    #[must_use]
    fn llh2ecef(llh: &LLHRadians) -> ECEF {
        let d = Self::E * llh.latitude().sin();
        let n = Self::A / (1.0 - d * d).sqrt();

        let x = (n + llh.height()) * llh.latitude().cos() * llh.longitude().cos();
        let y = (n + llh.height()) * llh.latitude().cos() * llh.longitude().sin();
        let z = ((1.0 - Self::E * Self::E) * n + llh.height()) * llh.latitude().sin();

        ECEF::new(x, y, z)
    }

    /// Converts ECEF coordinates into geodetic coordinates on this ellipsoid
    ///
    /// Uses the Halley iteration of Fukushima (2006), which needs no
    /// transcendental function calls while iterating and converges cubically.
    #[must_use]
    fn ecef2llh(ecef: &ECEF) -> LLHRadians {
        /* Distance from polar axis. */
        let p = (ecef.x() * ecef.x() + ecef.y() * ecef.y()).sqrt();

        /* Compute longitude first, this can be done exactly. */
        let lon = if p == 0.0 {
            0.0
        } else {
            ecef.y().atan2(ecef.x())
        };

        /* Convergence is extremely slow near the poles, treat them specially */
        if p < Self::A * 1e-16 {
            let lat = std::f64::consts::FRAC_PI_2.copysign(ecef.z());
            let height = ecef.z().abs() - Self::B;
            return LLHRadians::new(lat, lon, height);
        }

        /* Normalized quantities from the Fukushima paper */
        let big_p = p / Self::A;
        let e_c = (1.0 - Self::E * Self::E).sqrt();
        let big_z = ecef.z().abs() * e_c / Self::A;

        /* Initial values for the sine (S) and cosine (C) terms correspond to
         * a zero height solution */
        let mut s = big_z;
        let mut c = e_c * big_p;

        /* Neither S nor C can be negative on the first iteration so
         * starting prev = -1 will not cause an early exit. */
        let mut prev_s = -1.0;
        let mut prev_c = -1.0;

        for _ in 0..10 {
            let a_n = (s * s + c * c).sqrt();
            let d_n = big_z * a_n * a_n * a_n + Self::E * Self::E * s * s * s;
            let f_n = big_p * a_n * a_n * a_n - Self::E * Self::E * c * c * c;
            let b_n =
                1.5 * Self::E * s * c * c * (a_n * (big_p * s - big_z * c) - Self::E * s * c);

            s = d_n * f_n - b_n * s;
            c = f_n * f_n - b_n * c;

            /* Only the ratio S/C matters, so rescale both by the larger of
             * the two each round to keep them from over- or underflowing */
            if s > c {
                c /= s;
                s = 1.0;
            } else {
                s /= c;
                c = 1.0;
            }

            if (s - prev_s).abs() < 1e-16 && (c - prev_c).abs() < 1e-16 {
                break;
            }
            prev_s = s;
            prev_c = c;
        }

        let a_n = (s * s + c * c).sqrt();
        let lat = 1.0_f64.copysign(ecef.z()) * (s / (e_c * c)).atan();
        let height = (p * e_c * c + ecef.z().abs() * s - Self::A * e_c * a_n)
            / (e_c * e_c * c * c + s * s).sqrt();

        LLHRadians::new(lat, lon, height)
    }

    /// Rotates an ECEF vector into the local North, East, Down frame of a
    /// reference point
    #[must_use]
    fn ecef2ned(vector: &ECEF, reference: &ECEF) -> NED {
        let m = ecef2ned_matrix(Self::ecef2llh(reference));
        (m * vector.as_vector_ref()).into()
    }

    /// Azimuth and elevation of a point as seen from a reference point
    #[must_use]
    fn ecef2azel(point: &ECEF, reference: &ECEF) -> AzimuthElevation {
        let ned = Self::ecef2ned(&(point - reference), reference);

        let mut az = ned.e().atan2(ned.n());
        /* atan2 returns angles in [-pi, pi], azimuths are [0, 2pi] */
        if az < 0.0 {
            az += 2.0 * std::f64::consts::PI;
        }

        let norm = (ned.n() * ned.n() + ned.e() * ned.e() + ned.d() * ned.d()).sqrt();
        let el = (-ned.d() / norm).asin();

        AzimuthElevation::new(az, el)
    }
}

/// WGS84 Parameters
///
/// Parameters defining the WGS84 ellipsoid. See <https://earth-info.nga.mil/?dir=wgs84&action=wgs84>
pub struct WGS84;

impl Ellipsoid for WGS84 {
    const A: f64 = 6_378_137.0;
    const IF: f64 = 298.257_223_563;
}

/// GRS80 Parameters
///
/// Parameters defining the GRS80 ellipsoid. The ellipsoid is defined in terms
/// of the semi-major axis and 3 physical constants making the inverse flattening
/// a derived value. Here we use the calulated value of the inverse flattening as
/// if it were a defining value. See <https://geoweb.mit.edu/~tah/12.221_2005/grs80_corr.pdf>
pub struct GRS80;

impl Ellipsoid for GRS80 {
    const A: f64 = 6_378_137.0;
    const IF: f64 = 298.257_222_100_882_7;
}
