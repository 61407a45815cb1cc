// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.

use crate::coords::LLHRadians;
use nalgebra::Matrix3;

/// We define a `const` max function since [`std::cmp::max`] isn't `const`
pub(crate) const fn compile_time_max_u16(a: u16, b: u16) -> u16 {
    if b < a {
        a
    } else {
        b
    }
}

/// Newton's method square root usable in `const` contexts, for deriving
/// ellipsoid parameters at compile time
pub(crate) const fn compile_time_sqrt(s: f64) -> f64 {
    let mut x = s;
    let mut i = 0;
    while i < 100 {
        x = 0.5 * (x + s / x);
        i += 1;
    }
    x
}

/// Rotation matrix from ECEF frame axes to the local North, East, Down frame
/// at the given geodetic reference point
pub(crate) fn ecef2ned_matrix(llh: LLHRadians) -> Matrix3<f64> {
    let (sin_lat, cos_lat) = llh.latitude().sin_cos();
    let (sin_lon, cos_lon) = llh.longitude().sin_cos();

    Matrix3::new(
        -sin_lat * cos_lon,
        -sin_lat * sin_lon,
        cos_lat,
        -sin_lon,
        cos_lon,
        0.0,
        -cos_lat * cos_lon,
        -cos_lat * sin_lon,
        -sin_lat,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn const_sqrt() {
        assert!((compile_time_sqrt(4.0) - 2.0).abs() < 1e-15);
        assert!((compile_time_sqrt(2.0) - std::f64::consts::SQRT_2).abs() < 1e-15);
    }

    #[test]
    fn ned_matrix_is_orthonormal() {
        let llh = LLHRadians::new(0.6593, -2.1361, 60.0);
        let m = ecef2ned_matrix(llh);
        let should_be_identity = m * m.transpose();
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!((should_be_identity[(i, j)] - expected).abs() < 1e-12);
            }
        }
    }
}
