//! Anomaly correlation coefficient.

use crate::error::{ForecastError, Result};
use ndarray::{Array1, ArrayD, ArrayViewD, Axis, IxDyn, Zip};

/// Centered anomaly correlation between `forecast` and `observed`.
///
/// Anomalies are taken against `climatology`, which must broadcast to the
/// data shape; without one the raw values are correlated. Points where
/// either value is NaN are skipped. Returns NaN when nothing is left or an
/// anomaly field is identically zero.
pub fn anomaly_correlation(
    forecast: ArrayViewD<'_, f32>,
    observed: ArrayViewD<'_, f32>,
    climatology: Option<ArrayViewD<'_, f32>>,
) -> Result<f64> {
    if forecast.shape() != observed.shape() {
        return Err(ForecastError::ShapeMismatch {
            expected: observed.shape().to_vec(),
            got: forecast.shape().to_vec(),
        });
    }
    match climatology {
        Some(climo) => correlate(forecast, observed, climo),
        None => correlate(forecast, observed, ArrayD::<f32>::zeros(IxDyn(&[])).view()),
    }
}

fn correlate(
    forecast: ArrayViewD<'_, f32>,
    observed: ArrayViewD<'_, f32>,
    climatology: ArrayViewD<'_, f32>,
) -> Result<f64> {
    let climo = climatology
        .broadcast(forecast.raw_dim())
        .ok_or_else(|| ForecastError::ShapeMismatch {
            expected: forecast.shape().to_vec(),
            got: climatology.shape().to_vec(),
        })?;

    let (mut fo, mut ff, mut oo) = (0.0f64, 0.0f64, 0.0f64);
    Zip::from(&forecast)
        .and(&observed)
        .and(&climo)
        .for_each(|&f, &o, &c| {
            if f.is_nan() || o.is_nan() || c.is_nan() {
                return;
            }
            let fa = f64::from(f) - f64::from(c);
            let oa = f64::from(o) - f64::from(c);
            fo += fa * oa;
            ff += fa * fa;
            oo += oa * oa;
        });
    let denom = (ff * oo).sqrt();
    if denom == 0.0 {
        return Ok(f64::NAN);
    }
    Ok(fo / denom)
}

/// [`anomaly_correlation`] for each lead step of `(lead, ...)` arrays.
///
/// `climatology` applies to every lead step.
pub fn anomaly_correlation_by_lead(
    forecast: ArrayViewD<'_, f32>,
    observed: ArrayViewD<'_, f32>,
    climatology: Option<ArrayViewD<'_, f32>>,
) -> Result<Array1<f64>> {
    if forecast.ndim() == 0 || forecast.shape() != observed.shape() {
        return Err(ForecastError::ShapeMismatch {
            expected: observed.shape().to_vec(),
            got: forecast.shape().to_vec(),
        });
    }
    forecast
        .axis_iter(Axis(0))
        .zip(observed.axis_iter(Axis(0)))
        .map(|(f, o)| anomaly_correlation(f, o, climatology.clone()))
        .collect::<Result<Vec<_>>>()
        .map(Array1::from)
}
