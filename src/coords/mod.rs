// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! Coordinates and conversions
//!
//! These four coordinates types are defined:
//!  * [LLHDegrees]/[LLHRadians] - Geodetic coordinates, Latitude Lontitude Height
//!  * [ECEF] - Cartesian coordinates, Earth Centered, Earth Fixed
//!  * [NED] - Local direction coordinates, North East Down
//!  * [AzimuthElevation] - Relative direction coordinates, Azimith Elevation
//!
//! # Geodetic to Cartesian
//!
//! Conversion from geodetic coordinates latitude, longitude and height
//! ($\phi$, $\lambda$, $h$) into Cartesian coordinates ($X$, $Y$, $Z$) can be
//! achieved with the following formulae:
//! $$X = (N(\phi) + h) \cos{\phi}\cos{\lambda}$$
//! $$Y = (N(\phi) + h) \cos{\phi}\sin{\lambda}$$
//! $$Z = \left[(1-e^2)N(\phi) + h\right] \sin{\phi}$$
//!
//! Where the 'radius of curvature', $N(\phi)$, is defined as:
//!
//! $$N(\phi) = \frac{a}{\sqrt{1-e^2\sin^2 \phi}}$$
//!
//! and $a$ is the WGS84 semi-major axis and $e$ is the WGS84
//! eccentricity.
//!
//! # Cartesian to Geodetic
//!
//! Conversion from Cartesian to geodetic coordinates is a much harder problem
//! than conversion from geodetic to Cartesian. There is no satisfactory closed
//! form solution but many different iterative approaches exist.
//!
//! Here we implement a relatively new algorithm due to Fukushima (2006) that is
//! very computationally efficient, not requiring any transcendental function
//! calls during iteration and very few divisions. It also exhibits cubic
//! convergence rates compared to the quadratic rate of convergence seen with
//! the more common algortihms based on the Newton-Raphson method.
//!
//! ## References
//! * "A comparison of methods used in rectangular to Geodetic Coordinates
//!   Transformations", Burtch R. R. (2006), American Congress for Surveying
//!   and Mapping Annual Conference. Orlando, Florida.
//! * "Transformation from Cartesian to Geodetic Coordinates Accelerated by
//!   Halley’s Method", T. Fukushima (2006), Journal of Geodesy.

mod ecef;
mod ellipsoid;
mod llh;
mod ned;

pub use ecef::*;
pub use ellipsoid::*;
pub use llh::*;
pub use ned::*;

use nalgebra::{ArrayStorage, Vector2};

/// WGS84 local horizontal coordinates consisting of an Azimuth and Elevation, with angles stored as radians
///
/// Azimuth can range from $0$ to $2\pi$. North has an azimuth of $0$, east has an azimuth of $\frac{\pi}{2}$
///
/// Elevation can range from $-\frac{\pi}{2}$ to $\frac{\pi}{2}$. Up has an elevation of $\frac{\pi}{2}$, down an elevation of $-\frac{\pi}{2}$
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd, Default)]
pub struct AzimuthElevation(Vector2<f64>);

impl AzimuthElevation {
    /// Create an [`AzimuthElevation`] object from the given azimuth and elevation
    #[must_use]
    pub fn new(az: f64, el: f64) -> AzimuthElevation {
        AzimuthElevation(Vector2::new(az, el))
    }

    /// Create an [`AzimuthElevation`] object from an array
    ///
    /// Element 0 is azimuth, element 1 is elevation
    #[must_use]
    pub const fn from_array(array: &[f64; 2]) -> AzimuthElevation {
        AzimuthElevation(Vector2::from_array_storage(ArrayStorage([*array; 1])))
    }

    /// Get the Azimuth component
    #[must_use]
    pub fn az(&self) -> f64 {
        self.0[0]
    }

    /// Get the Elevation component
    #[must_use]
    pub fn el(&self) -> f64 {
        self.0[1]
    }
}
