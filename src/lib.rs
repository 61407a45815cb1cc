// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! `gnss-pvt` is a library that implements GNSS utility functions to perform
//! position estimations. The data used by `gnss-pvt` typically comes from GNSS
//! receiver chips as raw observation and ephemeris data. `gnss-pvt` is more of
//! a "bring your own algorithm" library, it provides a bunch of functionality
//! that is useful when processing raw GNSS data. Each module encompasses a
//! single set of functionality, and they are meant to be pretty
//! self-explanatory for developers familiar with GNSS processing.
//!
//! GNSS systems are used to estimate the location of the receiver by
//! determining the distance between the receiver and several satellites. The
//! satellites send out precisely timed periodic messages and the receiver
//! measures the delay of those messages. Knowing the location of the
//! satellites at the time of transmission and the delays of the messages the
//! receiver is able to determine the location of itself in relation to the
//! satellites.
//!
//! ## [Signal](`signal`)
//! Types for identifying GNSS signals. Each satellite can send out multiple
//! signals, and each constellation of satellites support their own set of
//! signals and keeping track which is which is important.
//!
//! ## [Time](`time`)
//! Time is a very important aspect of GNSS. `gnss-pvt` defaults to
//! representing all times as GPS times. It provides the ability to manipulate
//! GPS time stamps, as well as means to convert a GPS time stamp into various
//! other time bases (GLONASS time, UTC, MJD).
//!
//! ## [Coordinates](`coords`)
//! Several different coordinate types have representations and the ability to
//! convert between them. Earth centered earth fixed (ECEF), Latitude longitude
//! and height (both in radians and degrees), and Azimuth and elevation
//! coordinates are available.
//!
//! ## [Ephemeris](`ephemeris`)
//! Evaluation of broadcast satellite ephemerides, turning a decoded set of
//! orbital parameters into the satellite's position, velocity, acceleration
//! and clock state at a moment in time.
//!
//! ## [Measurements](`navmeas`)
//! Raw measurements of a single GNSS signal, and the noise model which maps a
//! measurement to its expected pseudorange and Doppler variances.
//!
//! ## [Solver](`solver`)
//! A single epoch PVT (position, velocity, and time) solver. Takes a set of
//! raw measurements with their associated satellite states and produces a
//! receiver state estimate, complete with RAIM fault detection and exclusion.

pub mod almanac;
pub mod coords;
pub mod ephemeris;
pub mod ionosphere;
mod math;
pub mod navmeas;
pub mod signal;
pub mod solver;
pub mod time;
pub mod troposphere;
