//! Top-of-atmosphere solar insolation.
//!
//! A first-order orbital approximation with fixed (1995) eccentricity,
//! obliquity and longitude of perihelion gives the solar declination and hour
//! angle for each timestamp. Values are normalised so the perihelion peak
//! equals `scale`, and the night side is clamped to zero.

use crate::error::{ForecastError, Result};
use chrono::{DateTime, Datelike, TimeZone, Utc};
use ndarray::{Array2, Array3, ArrayView2, ArrayViewD, Ix1, Ix2};
use std::f64::consts::PI;

/// Obliquity of the ecliptic (radians).
const OBLIQUITY: f64 = 23.4441 * PI / 180.0;
/// Orbital eccentricity.
const ECCENTRICITY: f64 = 0.016715;
/// Longitude of perihelion (radians).
const PERIHELION: f64 = 282.7 * PI / 180.0;
/// Day of year of the vernal equinox.
const EQUINOX_DAY: f64 = 80.5;
const DAYS_PER_YEAR: f64 = 365.0;

/// Fractional days elapsed since 00 UTC on January 1 of the same year.
pub fn day_of_year(time: &DateTime<Utc>) -> f64 {
    let start = Utc
        .with_ymd_and_hms(time.year(), 1, 1, 0, 0, 0)
        .single()
        .unwrap_or(*time);
    let elapsed = *time - start;
    elapsed.num_milliseconds() as f64 / 86_400_000.0
}

/// Insolation at each `(time, lat, lon)`, shaped `[time][y][x]`.
///
/// `lat` and `lon` are degrees and must both be 1-D (meshed to
/// `[lat][lon]`) or both 2-D with identical shapes. `scale` is the peak value
/// (e.g. the solar constant); `1.0` yields a normalised field.
pub fn insolation(
    times: &[DateTime<Utc>],
    lat: ArrayViewD<'_, f64>,
    lon: ArrayViewD<'_, f64>,
    scale: f64,
) -> Result<Array3<f32>> {
    if !scale.is_finite() || scale < 0.0 {
        return Err(ForecastError::InvalidParameter(format!(
            "insolation scale must be finite and non-negative, got {}",
            scale
        )));
    }
    if lat.ndim() != lon.ndim() {
        return Err(ForecastError::InvalidParameter(
            "'lat' and 'lon' must either both be 1d or both be 2d".to_string(),
        ));
    }
    let (lat2d, lon2d) = match lat.ndim() {
        1 => {
            let lat = lat
                .into_dimensionality::<Ix1>()
                .map_err(|e| ForecastError::InvalidParameter(e.to_string()))?;
            let lon = lon
                .into_dimensionality::<Ix1>()
                .map_err(|e| ForecastError::InvalidParameter(e.to_string()))?;
            let shape = (lat.len(), lon.len());
            (
                Array2::from_shape_fn(shape, |(y, _)| lat[y]),
                Array2::from_shape_fn(shape, |(_, x)| lon[x]),
            )
        }
        2 => {
            if lat.shape() != lon.shape() {
                return Err(ForecastError::ShapeMismatch {
                    expected: lat.shape().to_vec(),
                    got: lon.shape().to_vec(),
                });
            }
            let lat = lat
                .into_dimensionality::<Ix2>()
                .map_err(|e| ForecastError::InvalidParameter(e.to_string()))?;
            let lon = lon
                .into_dimensionality::<Ix2>()
                .map_err(|e| ForecastError::InvalidParameter(e.to_string()))?;
            (lat.to_owned(), lon.to_owned())
        }
        n => {
            return Err(ForecastError::InvalidParameter(format!(
                "'lat' and 'lon' must be 1d or 2d, got {}d",
                n
            )))
        }
    };
    Ok(insolation_mesh(times, lat2d.view(), lon2d.view(), scale))
}

/// Insolation on a regular grid given 1-D coordinate axes.
pub fn insolation_grid(
    times: &[DateTime<Utc>],
    lat: &ndarray::Array1<f64>,
    lon: &ndarray::Array1<f64>,
    scale: f64,
) -> Result<Array3<f32>> {
    insolation(times, lat.view().into_dyn(), lon.view().into_dyn(), scale)
}

fn insolation_mesh(
    times: &[DateTime<Utc>],
    lat: ArrayView2<'_, f64>,
    lon: ArrayView2<'_, f64>,
    scale: f64,
) -> Array3<f32> {
    let (ny, nx) = lat.dim();
    let beta = (1.0 - ECCENTRICITY.powi(2)).sqrt();
    let lambda_m0 = ECCENTRICITY * (1.0 + beta) * PERIHELION.sin();
    let perihelion_distance = 1.0 - ECCENTRICITY;
    let sin_lat = lat.mapv(|v| (v * PI / 180.0).sin());
    let cos_lat = lat.mapv(|v| (v * PI / 180.0).cos());

    let mut out = Array3::<f32>::zeros((times.len(), ny, nx));
    for (t, time) in times.iter().enumerate() {
        let days = day_of_year(time);
        let lambda_m = lambda_m0 + 2.0 * PI * (days - EQUINOX_DAY) / DAYS_PER_YEAR;
        let lambda = lambda_m + 2.0 * ECCENTRICITY * (lambda_m - PERIHELION).sin();
        let declination = (OBLIQUITY.sin() * lambda.sin()).asin();
        let rho = (1.0 - ECCENTRICITY.powi(2)) / (1.0 + ECCENTRICITY * (lambda - PERIHELION).cos());
        let distance_factor = (perihelion_distance / rho).powi(2);
        let (sin_dec, cos_dec) = declination.sin_cos();

        for y in 0..ny {
            for x in 0..nx {
                let hour_angle = 2.0 * PI * (days + lon[[y, x]] / 360.0);
                let cos_zenith =
                    sin_lat[[y, x]] * sin_dec - cos_lat[[y, x]] * cos_dec * hour_angle.cos();
                let sol = scale * cos_zenith * distance_factor;
                out[[t, y, x]] = sol.clamp(0.0, scale) as f32;
            }
        }
    }
    out
}
