//! Per-lead-time forecast scores and baseline errors.
//!
//! Every entry point returns an array whose first axis is the lead step.
//! `axes` index the per-lead slice (the lead axis itself is excluded) and
//! `None` reduces everything, leaving one value per lead step. NaN values
//! are dropped from every mean.

use super::reduce::{nan_mean, reduce_error, stack_leads};
use super::ErrorMethod;
use crate::core::{SampleStore, Trajectory};
use crate::error::{ForecastError, Result};
use chrono::{DateTime, Datelike, Utc};
use log::debug;
use ndarray::{Array1, Array4, ArrayD, ArrayViewD, Axis, Slice};

fn require_time_axis(valid: &ArrayViewD<'_, f32>) -> Result<usize> {
    if valid.ndim() == 0 {
        return Err(ForecastError::InvalidParameter(
            "observations need a leading time axis".to_string(),
        ));
    }
    Ok(valid.len_of(Axis(0)))
}

fn require_steps(n_steps: usize) -> Result<()> {
    if n_steps < 1 {
        return Err(ForecastError::InvalidParameter(
            "'n_steps' must be an integer >= 1".to_string(),
        ));
    }
    Ok(())
}

/// Forecast for lead `f` against the observations shifted forward by `f`.
fn shifted_error<'a, F>(
    n_steps: usize,
    valid: &ArrayViewD<'_, f32>,
    forecast_for_lead: F,
    method: ErrorMethod,
    axes: Option<&[usize]>,
) -> Result<ArrayD<f64>>
where
    F: Fn(usize) -> ArrayViewD<'a, f32>,
{
    let n = valid.len_of(Axis(0));
    let per_lead = (0..n_steps)
        .map(|f| {
            let shift = f.min(n);
            let forecast = forecast_for_lead(f);
            reduce_error(
                forecast.slice_axis(Axis(0), Slice::from(..n - shift)),
                valid.slice_axis(Axis(0), Slice::from(shift..)),
                method,
                axes,
            )
        })
        .collect::<Result<Vec<_>>>()?;
    stack_leads(per_lead)
}

/// Score two lead-indexed arrays elementwise per lead step.
///
/// `valid` may hold more lead steps than `forecast`; only the first
/// `forecast.len_of(Axis(0))` are used.
pub fn compare_trajectories(
    forecast: ArrayViewD<'_, f32>,
    valid: ArrayViewD<'_, f32>,
    method: ErrorMethod,
    axes: Option<&[usize]>,
) -> Result<ArrayD<f64>> {
    if forecast.ndim() == 0 || forecast.ndim() != valid.ndim() {
        return Err(ForecastError::ShapeMismatch {
            expected: valid.shape().to_vec(),
            got: forecast.shape().to_vec(),
        });
    }
    let n_leads = forecast.len_of(Axis(0));
    if n_leads == 0 {
        return Err(ForecastError::EmptyData);
    }
    if valid.len_of(Axis(0)) < n_leads || forecast.shape()[1..] != valid.shape()[1..] {
        return Err(ForecastError::ShapeMismatch {
            expected: valid.shape().to_vec(),
            got: forecast.shape().to_vec(),
        });
    }
    let per_lead = (0..n_leads)
        .map(|f| {
            reduce_error(
                forecast.index_axis(Axis(0), f),
                valid.index_axis(Axis(0), f),
                method,
                axes,
            )
        })
        .collect::<Result<Vec<_>>>()?;
    stack_leads(per_lead)
}

/// Score a lead-indexed forecast `(lead, time, ...)` against a plain series `(time, ...)`.
///
/// Lead `f` of initialization `i` is compared with `valid[i + f]`, so the
/// overlap shrinks by one sample per lead step.
pub fn compare_against_series(
    forecast: ArrayViewD<'_, f32>,
    valid: ArrayViewD<'_, f32>,
    method: ErrorMethod,
    axes: Option<&[usize]>,
) -> Result<ArrayD<f64>> {
    let n = require_time_axis(&valid)?;
    if forecast.ndim() != valid.ndim() + 1 || forecast.shape()[1..] != *valid.shape() {
        let mut expected = vec![forecast.shape().first().copied().unwrap_or(0)];
        expected.extend_from_slice(valid.shape());
        return Err(ForecastError::ShapeMismatch {
            expected,
            got: forecast.shape().to_vec(),
        });
    }
    if n == 0 {
        return Err(ForecastError::EmptyData);
    }
    let n_leads = forecast.len_of(Axis(0));
    if n_leads == 0 {
        return Err(ForecastError::EmptyData);
    }
    shifted_error(
        n_leads,
        &valid,
        |f| forecast.clone().index_axis_move(Axis(0), f),
        method,
        axes,
    )
}

/// Score a forecast trajectory against a verification trajectory.
///
/// The verification is aligned to the forecast's channels by label, so
/// channel order may differ; a forecast channel the verification lacks is
/// `UnknownChannel`. Both are intersected on initialization time and must
/// agree on grid and the leading lead times.
pub fn score_trajectories(
    forecast: &Trajectory,
    verification: &Trajectory,
    method: ErrorMethod,
    axes: Option<&[usize]>,
) -> Result<ArrayD<f64>> {
    let verification = &verification.select_channels(forecast.channels())?;
    let grid = |t: &Trajectory| vec![t.lat().len(), t.lon().len()];
    if grid(forecast) != grid(verification) {
        return Err(ForecastError::ShapeMismatch {
            expected: grid(verification),
            got: grid(forecast),
        });
    }
    if verification.n_leads() < forecast.n_leads() {
        return Err(ForecastError::DimensionMismatch {
            expected: forecast.n_leads(),
            got: verification.n_leads(),
        });
    }
    if verification.lead_times()[..forecast.n_leads()] != *forecast.lead_times() {
        return Err(ForecastError::InvalidParameter(
            "forecast and verification lead times differ".to_string(),
        ));
    }
    let (forecast, verification) = forecast.intersect_init_times(verification)?;
    debug!(
        "scoring {} lead steps over {} common initializations with {}",
        forecast.n_leads(),
        forecast.n_inits(),
        method
    );
    compare_trajectories(
        forecast.data().into_dyn(),
        verification.data().into_dyn(),
        method,
        axes,
    )
}

/// Error of holding the initialization value fixed for `n_steps` lead steps.
///
/// `obs[i]` is the state at initialization `i`; `valid` is the verifying
/// series aligned as in [`compare_against_series`].
pub fn persistence_error(
    obs: ArrayViewD<'_, f32>,
    valid: ArrayViewD<'_, f32>,
    n_steps: usize,
    method: ErrorMethod,
    axes: Option<&[usize]>,
) -> Result<ArrayD<f64>> {
    require_steps(n_steps)?;
    require_time_axis(&valid)?;
    if obs.shape() != valid.shape() {
        return Err(ForecastError::ShapeMismatch {
            expected: valid.shape().to_vec(),
            got: obs.shape().to_vec(),
        });
    }
    shifted_error(n_steps, &valid, |_| obs.clone(), method, axes)
}

/// Error of predicting the all-time mean of `valid` at every lead step.
pub fn climo_error(
    valid: ArrayViewD<'_, f32>,
    n_steps: usize,
    method: ErrorMethod,
    axes: Option<&[usize]>,
) -> Result<ArrayD<f64>> {
    require_steps(n_steps)?;
    let n = require_time_axis(&valid)?;
    let climo = nan_mean(valid.mapv(f64::from).view(), Some(&[0]))?.mapv(|v| v as f32);
    let per_lead = (0..n_steps)
        .map(|f| {
            let truth = valid.slice_axis(Axis(0), Slice::from(..n - f.min(n)));
            let predicted = climo.broadcast(truth.raw_dim()).ok_or_else(|| {
                ForecastError::ShapeMismatch {
                    expected: truth.shape().to_vec(),
                    got: climo.shape().to_vec(),
                }
            })?;
            reduce_error(predicted, truth, method, axes)
        })
        .collect::<Result<Vec<_>>>()?;
    stack_leads(per_lead)
}

/// Mean state per calendar month, `[month - 1][channel][lat][lon]`.
///
/// Months with no samples are NaN.
pub fn monthly_climatology(store: &SampleStore) -> Result<Array4<f32>> {
    if store.is_empty() {
        return Err(ForecastError::EmptyData);
    }
    let (_, n_channel, n_lat, n_lon) = store.data().dim();
    let mut climo = Array4::from_elem((12, n_channel, n_lat, n_lon), f32::NAN);
    for month in 1..=12u32 {
        let idx: Vec<usize> = store
            .times()
            .iter()
            .enumerate()
            .filter(|(_, t)| t.month() == month)
            .map(|(i, _)| i)
            .collect();
        if idx.is_empty() {
            continue;
        }
        let subset = store.data().select(Axis(0), &idx).mapv(f64::from).into_dyn();
        let mean = nan_mean(subset.view(), Some(&[0]))?;
        climo
            .index_axis_mut(Axis(0), (month - 1) as usize)
            .assign(&mean.mapv(|v| v as f32));
    }
    Ok(climo)
}

/// Result of [`monthly_climo_error`].
#[derive(Debug, Clone)]
pub struct MonthlyClimoError {
    /// Error over every validation sample.
    pub error: f64,
    /// `error` repeated for each requested lead step.
    pub per_lead: Array1<f64>,
    /// Observed minus monthly mean, `[time][channel][lat][lon]`.
    pub anomaly: Array4<f32>,
}

/// Error of predicting the calendar-month mean of `store` at `val_times`.
///
/// Validation times absent from the store contribute NaN and are skipped.
pub fn monthly_climo_error(
    store: &SampleStore,
    val_times: &[DateTime<Utc>],
    n_steps: usize,
    method: ErrorMethod,
) -> Result<MonthlyClimoError> {
    require_steps(n_steps)?;
    if val_times.is_empty() {
        return Err(ForecastError::EmptyData);
    }
    let climo = monthly_climatology(store)?;
    let mut anomaly = store.reindex(val_times);
    for (i, time) in val_times.iter().enumerate() {
        let month = climo.index_axis(Axis(0), time.month0() as usize);
        let mut sample = anomaly.index_axis_mut(Axis(0), i);
        sample -= &month;
    }
    let point = method.pointwise();
    let errors = anomaly.mapv(|a| point(f64::from(a))).into_dyn();
    let mean = nan_mean(errors.view(), None)?;
    let error = method.finish()(mean.iter().next().copied().unwrap_or(f64::NAN));
    debug!("monthly climatology {} over {} times: {}", method, val_times.len(), error);
    Ok(MonthlyClimoError {
        error,
        per_lead: Array1::from_elem(n_steps, error),
        anomaly,
    })
}
