// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! Troposphere delay calculation
//!
//! Tropospheric delays are modeled with the UNB3m model. The model
//! parameters are hardcoded into the library, unlike the ionosphere model.
//!
//! # References
//! * UNB Neutral Atmosphere Models: Development and Performance. R Leandro,
//!   M Santos, and R B Langley

/// Average meteorological parameters, one row per 15 degrees of latitude
/// starting at 15. Columns are pressure [mbar], temperature [K], relative
/// humidity [%], temperature lapse rate [K/km] and water vapour lapse factor.
const AVG_TABLE: [[f64; 5]; 5] = [
    [1013.25, 299.65, 75.00, 6.30, 2.77],
    [1017.25, 294.15, 80.00, 6.05, 3.15],
    [1015.75, 283.15, 76.00, 5.58, 2.57],
    [1011.75, 272.15, 77.50, 5.39, 1.81],
    [1013.00, 263.65, 82.50, 4.53, 1.55],
];

/// Seasonal swing of the meteorological parameters about their averages
const AMP_TABLE: [[f64; 5]; 5] = [
    [0.00, 0.00, 0.00, 0.00, 0.00],
    [-3.75, 7.00, 0.00, 0.25, 0.33],
    [-2.25, 11.00, -1.00, 0.32, 0.46],
    [-1.75, 15.00, -2.50, 0.81, 0.74],
    [-0.50, 14.50, 2.50, 0.62, 0.30],
];

/// Niell hydrostatic mapping coefficients, averages
const NMF_HYD_AVG: [[f64; 3]; 5] = [
    [1.2769934e-3, 2.9153695e-3, 62.610505e-3],
    [1.2683230e-3, 2.9152299e-3, 62.837393e-3],
    [1.2465397e-3, 2.9288445e-3, 63.721774e-3],
    [1.2196049e-3, 2.9022565e-3, 63.824265e-3],
    [1.2045996e-3, 2.9024912e-3, 64.258455e-3],
];

/// Niell hydrostatic mapping coefficients, seasonal amplitudes
const NMF_HYD_AMP: [[f64; 3]; 5] = [
    [0.0, 0.0, 0.0],
    [1.2709626e-5, 2.1414979e-5, 9.0128400e-5],
    [2.6523662e-5, 3.0160779e-5, 4.3497037e-5],
    [3.4000452e-5, 7.2562722e-5, 84.795348e-5],
    [4.1202191e-5, 11.723375e-5, 170.37206e-5],
];

/// Niell wet mapping coefficients
const NMF_WET: [[f64; 3]; 5] = [
    [5.8021897e-4, 1.4275268e-3, 4.3472961e-2],
    [5.6794847e-4, 1.5138625e-3, 4.6729510e-2],
    [5.8118019e-4, 1.4572752e-3, 4.3908931e-2],
    [5.9727542e-4, 1.5007428e-3, 4.4626982e-2],
    [6.1641693e-4, 1.7599082e-3, 5.4736038e-2],
];

/// Niell height correction coefficients
const NMF_HT: [f64; 3] = [2.53e-5, 5.49e-3, 1.14e-3];

/// Day of year of the southern hemisphere meteorological minimum
const DOY_MIN_NORTH: f64 = 28.0;
/// Day of year of the northern hemisphere meteorological minimum
const DOY_MIN_SOUTH: f64 = 211.0;

const K1: f64 = 77.604;
const K2: f64 = 64.79;
const K3: f64 = 3.776e5;
/// Gas constant of dry air [J/(kg K)]
const RD: f64 = 287.054;
/// Surface gravity [m/s^2]
const G: f64 = 9.80665;
/// Mean gravity of the atmospheric column at sea level on the equator [m/s^2]
const GM_SEA_LEVEL: f64 = 9.784;
/// Ratio of the molar masses of water vapour and dry air
const EPSILON: f64 = 0.622;

/// Interpolates a latitude banded table, with bands every 15 degrees from 15
/// to 75
fn interpolate_table(table: &[[f64; 5]; 5], lat_deg: f64, col: usize) -> f64 {
    interpolate_rows(lat_deg, |row| table[row][col])
}

fn interpolate_table3(table: &[[f64; 3]; 5], lat_deg: f64, col: usize) -> f64 {
    interpolate_rows(lat_deg, |row| table[row][col])
}

fn interpolate_rows(lat_deg: f64, value: impl Fn(usize) -> f64) -> f64 {
    let lat = lat_deg.abs();
    if lat <= 15.0 {
        return value(0);
    }
    if lat >= 75.0 {
        return value(4);
    }
    let position = (lat - 15.0) / 15.0;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let row = position.floor() as usize;
    let frac = position - position.floor();
    value(row) + (value(row + 1) - value(row)) * frac
}

/// Niell continued fraction form of the mapping functions
fn mapping_fraction(sin_el: f64, a: f64, b: f64, c: f64) -> f64 {
    let numerator = 1.0 + a / (1.0 + b / (1.0 + c));
    let denominator = sin_el + a / (sin_el + b / (sin_el + c));
    numerator / denominator
}

///  Calculate tropospheric delay using UNB3m model.
///
/// Requires the day of year, the latitude (rad) and height (m) of the
/// receiver, and the elevation of the satellite (rad)
#[must_use]
pub fn calc_delay(doy: f64, lat: f64, h: f64, el: f64) -> f64 {
    let lat_deg = lat.to_degrees();

    /* mapping functions misbehave at and below the horizon */
    let el = el.max(0.001);
    let sin_el = el.sin();

    /* seasonal phase of the meteorological parameters */
    let doy_min = if lat >= 0.0 {
        DOY_MIN_NORTH
    } else {
        DOY_MIN_SOUTH
    };
    let cos_phase = (2.0 * std::f64::consts::PI * (doy - doy_min) / 365.25).cos();

    let meteo = |col: usize| {
        interpolate_table(&AVG_TABLE, lat_deg, col)
            - interpolate_table(&AMP_TABLE, lat_deg, col) * cos_phase
    };

    let pressure = meteo(0);
    let temperature = meteo(1);
    let humidity = meteo(2);
    let beta = meteo(3) * 1e-3; /* lapse rate in K/m */
    let lambda = meteo(4);

    /* mean gravity at the station */
    let gm = GM_SEA_LEVEL * (1.0 - 2.66e-3 * (2.0 * lat).cos() - 2.8e-7 * h);

    /* saturation vapour pressure, in mbar */
    let es = 0.01
        * (1.2378847e-5 * temperature * temperature - 1.9121316e-2 * temperature
            + 33.93711047
            - 6.3431645e3 / temperature)
            .exp();
    /* enhancement factor */
    let fw = 1.00062 + 3.14e-6 * pressure + 5.6e-7 * (temperature - 273.15).powi(2);
    let e0 = humidity / 100.0 * es * fw;

    /* zenith delays at mean sea level */
    let k2_prime = K2 - K1 * EPSILON;
    let zhd_msl = 1e-6 * K1 * RD * pressure / gm;
    let tm = temperature * (1.0 - beta * RD / (gm * (lambda + 1.0)));
    let zwd_msl = 1e-6 * (k2_prime + K3 / tm) * RD * e0 / (gm * (lambda + 1.0) - beta * RD);

    /* scale the zenith delays to the receiver height */
    let base = 1.0 - beta * h / temperature;
    let zhd = zhd_msl * base.powf(G / (RD * beta));
    let zwd = zwd_msl * base.powf((lambda + 1.0) * G / (RD * beta) - 1.0);

    /* hydrostatic Niell mapping, with its seasonal and height terms */
    let a = interpolate_table3(&NMF_HYD_AVG, lat_deg, 0)
        - interpolate_table3(&NMF_HYD_AMP, lat_deg, 0) * cos_phase;
    let b = interpolate_table3(&NMF_HYD_AVG, lat_deg, 1)
        - interpolate_table3(&NMF_HYD_AMP, lat_deg, 1) * cos_phase;
    let c = interpolate_table3(&NMF_HYD_AVG, lat_deg, 2)
        - interpolate_table3(&NMF_HYD_AMP, lat_deg, 2) * cos_phase;
    let mut map_hyd = mapping_fraction(sin_el, a, b, c);

    /* height correction of the hydrostatic mapping */
    let height_km = h / 1000.0;
    map_hyd += (1.0 / sin_el - mapping_fraction(sin_el, NMF_HT[0], NMF_HT[1], NMF_HT[2]))
        * height_km;

    /* wet Niell mapping */
    let a = interpolate_table3(&NMF_WET, lat_deg, 0);
    let b = interpolate_table3(&NMF_WET, lat_deg, 1);
    let c = interpolate_table3(&NMF_WET, lat_deg, 2);
    let map_wet = mapping_fraction(sin_el, a, b, c);

    zhd * map_hyd + zwd * map_wet
}

#[cfg(test)]
mod tests {
    use crate::troposphere::calc_delay;

    const D2R: f64 = std::f64::consts::PI / 180.0;

    #[test]
    fn calc_troposphere() {
        /* tolerance against "true" values computed with UNB3M.f */
        /* http://www2.unb.ca/gge/Personnel/Santos/UNB_pack.pdf */
        const D_TOL: f64 = 1e-1;

        let lat = 40.0 * D2R;
        let h = 1300.0;
        let doy = 32.5;
        let el = 45.0 * D2R;
        let d_true = 2.8567;

        let d_tropo = calc_delay(doy, lat, h, el);

        assert!(
            (d_tropo - d_true).abs() < D_TOL,
            "Distance didn't match hardcoded correct values {:.5}. Saw: {:.5}",
            d_true,
            d_tropo
        );

        let lat = -10. * D2R;
        let h = 0.0;
        let doy = 180.5;
        let el = 20. * D2R;
        let d_true = 7.4942;

        let d_tropo = calc_delay(doy, lat, h, el);

        assert!(
            (d_tropo - d_true).abs() < D_TOL,
            "Distance didn't match hardcoded correct values {:.5}. Saw: {:.5}",
            d_true,
            d_tropo
        );

        let lat = 75. * D2R;
        let h = 0.0;
        let doy = 50.5;
        let el = 10. * D2R;
        let d_true = 12.9007;

        let d_tropo = calc_delay(doy, lat, h, el);

        assert!(
            (d_tropo - d_true).abs() < D_TOL,
            "Distance didn't match hardcoded correct values {:.5}. Saw: {:.5}",
            d_true,
            d_tropo
        );

        /* altitude sanity tests */
        let max_tropo_correction = 30.0;
        let h = -5000.;
        let d_tropo = calc_delay(doy, lat, h, el);

        assert!(
            d_tropo.abs() < max_tropo_correction,
            "Sanity test fail at altitude {:.5}. : Correction was {:.5}",
            h,
            d_tropo
        );

        let h = 12000.;
        let d_tropo = calc_delay(doy, lat, h, el);

        assert!(
            d_tropo.abs() < max_tropo_correction,
            "Sanity test fail at altitude {:.5}. : Correction was {:.5}",
            h,
            d_tropo
        );

        /* satellite elevation sanity tests */
        let h = 100.;
        let elevation_testcases: [f64; 6] = [1e-3, 1e-4, 1e-5, 0., -1e3, -0.1];
        let max_tropo_correction = 100.0;

        for el in elevation_testcases.iter() {
            let d_tropo = calc_delay(doy, lat, h, *el);
            assert!(
                d_tropo.abs() < max_tropo_correction,
                "Sanity test fail at satellite elevation {:.5}. : Correction was {:.5}",
                el,
                d_tropo
            );
        }
    }

    #[test]
    fn zenith_bounds() {
        /* zenith delay at sea level sits near 2.3 m of hydrostatic delay plus
         * a modest wet component */
        let d = calc_delay(100.0, 37.0 * D2R, 0.0, 90.0 * D2R);
        assert!((2.0..3.0).contains(&d), "zenith delay {d}");

        /* delay grows towards the horizon */
        let low = calc_delay(100.0, 37.0 * D2R, 0.0, 5.0 * D2R);
        assert!(low > 5.0 * d);
    }

    #[test]
    fn hemispheres_are_out_of_phase() {
        /* northern winter is southern summer */
        let north_jan = calc_delay(15.0, 40.0 * D2R, 0.0, 30.0 * D2R);
        let north_jul = calc_delay(196.0, 40.0 * D2R, 0.0, 30.0 * D2R);
        let south_jan = calc_delay(15.0, -40.0 * D2R, 0.0, 30.0 * D2R);
        let south_jul = calc_delay(196.0, -40.0 * D2R, 0.0, 30.0 * D2R);

        assert!(north_jul > north_jan);
        assert!(south_jan > south_jul);
    }
}
