//! Verification trajectories built from observations.
//!
//! For every initialization time `t0` the observed states at
//! `t0 + dt, ..., t0 + n*dt` are looked up by exact time match. Times the
//! source does not hold become NaN; this is expected near the end of the
//! data and is never an error.

use crate::core::{
    check_time_span, lead_times, time_span, SampleStore, SampleWindows, Trajectory,
};
use crate::error::{ForecastError, Result};
use chrono::{DateTime, Duration, Utc};
use log::{info, warn};
use ndarray::{Array4, Array5, Axis};

/// Check the step count and spacing, returning the time spanned by all lead steps.
fn validate_steps(forecast_steps: usize, dt_hours: i64) -> Result<Duration> {
    if forecast_steps < 1 {
        return Err(ForecastError::InvalidParameter(
            "'forecast_steps' must be an integer >= 1".to_string(),
        ));
    }
    if dt_hours < 1 {
        return Err(ForecastError::InvalidParameter(
            "'dt' must be an integer >= 1".to_string(),
        ));
    }
    time_span(dt_hours, forecast_steps)
}

/// `start, start + dt, ..., start + (n-1)dt`
fn time_range(start: DateTime<Utc>, n: usize, dt: Duration) -> Vec<DateTime<Utc>> {
    (0..n as i32).map(|i| start + dt * i).collect()
}

fn fill<F>(
    n_steps: usize,
    inits: &[DateTime<Utc>],
    shape: (usize, usize, usize),
    lookup: F,
) -> Array5<f32>
where
    F: Fn(DateTime<Utc>) -> Array4<f32>,
{
    let (n_channel, n_lat, n_lon) = shape;
    let mut out = Array5::from_elem((n_steps, inits.len(), n_channel, n_lat, n_lon), f32::NAN);
    for (d, init) in inits.iter().enumerate() {
        out.index_axis_mut(Axis(1), d).assign(&lookup(*init));
    }
    out
}

fn log_gaps(verification: &Trajectory) {
    let missing = verification.data().iter().filter(|v| v.is_nan()).count();
    if missing > 0 {
        warn!(
            "verification has {} undefined of {} values",
            missing,
            verification.data().len()
        );
    }
}

/// Verification from a plain time series of states.
///
/// Initialization times are the sample times of `store`. Observations are
/// taken from `all_store` when given (typically a longer record covering
/// times past the end of `store`), otherwise from `store` itself.
pub fn verification_from_series(
    store: &SampleStore,
    all_store: Option<&SampleStore>,
    forecast_steps: usize,
    dt_hours: i64,
) -> Result<Trajectory> {
    let span = validate_steps(forecast_steps, dt_hours)?;
    check_time_span(store.times(), Duration::zero(), span)?;
    let source = all_store.unwrap_or(store);
    if source.channels() != store.channels() || source.grid_shape() != store.grid_shape() {
        return Err(ForecastError::InvalidParameter(
            "observation store must share the channels and grid of the initialization store"
                .to_string(),
        ));
    }
    info!(
        "building verification for {} initializations, {} steps of {}h",
        store.len(),
        forecast_steps,
        dt_hours
    );
    let dt = Duration::hours(dt_hours);
    let (n_lat, n_lon) = store.grid_shape();
    let data = fill(
        forecast_steps,
        store.times(),
        (store.channels().len(), n_lat, n_lon),
        |init| source.reindex(&time_range(init + dt, forecast_steps, dt)),
    );
    let verification = Trajectory::new(
        lead_times(dt_hours, forecast_steps),
        store.times().to_vec(),
        store.channels().to_vec(),
        store.lat().clone(),
        store.lon().clone(),
        data,
    )?;
    log_gaps(&verification);
    Ok(verification)
}

/// Verification from windowed samples whose first target step is one `dt` after the sample time.
///
/// Lead step `f` for sample `t0` is the first-step target of the sample
/// labelled `t0 + (f-1)dt`, looked up in `all_windows` when given.
pub fn verification_from_samples(
    windows: &SampleWindows,
    all_windows: Option<&SampleWindows>,
    forecast_steps: usize,
    dt_hours: i64,
) -> Result<Trajectory> {
    let span = validate_steps(forecast_steps, dt_hours)?;
    check_time_span(windows.samples(), Duration::zero(), span)?;
    let source = all_windows.unwrap_or(windows);
    if source.channels() != windows.channels()
        || source.lat().len() != windows.lat().len()
        || source.lon().len() != windows.lon().len()
    {
        return Err(ForecastError::InvalidParameter(
            "observation windows must share the channels and grid of the initialization windows"
                .to_string(),
        ));
    }
    info!(
        "building verification for {} samples, {} steps of {}h",
        windows.len(),
        forecast_steps,
        dt_hours
    );
    let dt = Duration::hours(dt_hours);
    let data = fill(
        forecast_steps,
        windows.samples(),
        (windows.channels().len(), windows.lat().len(), windows.lon().len()),
        |init| source.reindex_first_targets(&time_range(init, forecast_steps, dt)),
    );
    let verification = Trajectory::new(
        lead_times(dt_hours, forecast_steps),
        windows.samples().to_vec(),
        windows.channels().to_vec(),
        windows.lat().clone(),
        windows.lon().clone(),
        data,
    )?;
    log_gaps(&verification);
    Ok(verification)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Channel;
    use chrono::TimeZone;
    use ndarray::array;

    fn hours(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2007, 1, 1, 0, 0, 0).unwrap() + Duration::hours(n)
    }

    fn series(steps: std::ops::Range<usize>) -> SampleStore {
        let times = steps.clone().map(|i| hours(6 * i as i64)).collect();
        let values: Vec<f32> = steps.map(|i| i as f32).collect();
        let n = values.len();
        SampleStore::new(
            times,
            vec![Channel::new("HGT", "500")],
            array![45.0],
            array![0.0],
            Array4::from_shape_vec((n, 1, 1, 1), values).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn rejects_unrepresentable_time_steps() {
        let store = series(0..4);
        assert!(matches!(
            verification_from_series(&store, None, 1, i64::MAX),
            Err(ForecastError::InvalidParameter(_))
        ));
        // Representable as a duration, but not once added to 2007.
        assert!(matches!(
            verification_from_series(&store, None, 2, 24 * 365 * 200_000),
            Err(ForecastError::TimestampError(_))
        ));
    }

    #[test]
    fn series_verification_matches_future_observations() {
        let store = series(0..8);
        let v = verification_from_series(&store, None, 3, 6).unwrap();
        assert_eq!(v.data().dim(), (3, 8, 1, 1, 1));
        assert_eq!(v.lead_times(), lead_times(6, 3).as_slice());
        for i in 0..5 {
            for f in 0..3 {
                assert_eq!(v.data()[[f, i, 0, 0, 0]], (i + f + 1) as f32);
            }
        }
        // Past the end of the record.
        assert!(v.data()[[0, 7, 0, 0, 0]].is_nan());
        assert!(v.data()[[2, 5, 0, 0, 0]].is_nan());
        assert_eq!(v.data()[[1, 5, 0, 0, 0]], 7.0);
    }

    #[test]
    fn auxiliary_store_extends_the_record() {
        let validation = series(0..4);
        let all = series(0..20);
        let v = verification_from_series(&validation, Some(&all), 4, 6).unwrap();
        assert_eq!(v.init_times().len(), 4);
        assert!(v.data().iter().all(|x| x.is_finite()));
        assert_eq!(v.data()[[3, 3, 0, 0, 0]], 7.0);
    }

    #[test]
    fn dt_must_match_a_multiple_of_the_record() {
        let store = series(0..8);
        let v = verification_from_series(&store, None, 2, 12).unwrap();
        assert_eq!(v.data()[[0, 0, 0, 0, 0]], 2.0);
        assert_eq!(v.data()[[1, 0, 0, 0, 0]], 4.0);

        let v = verification_from_series(&store, None, 1, 3).unwrap();
        assert!(v.data().iter().all(|x| x.is_nan()));
    }

    #[test]
    fn rejects_bad_parameters() {
        let store = series(0..4);
        assert!(matches!(
            verification_from_series(&store, None, 0, 6),
            Err(ForecastError::InvalidParameter(_))
        ));
        assert!(matches!(
            verification_from_series(&store, None, 2, 0),
            Err(ForecastError::InvalidParameter(_))
        ));
    }

    #[test]
    fn samples_verification_uses_first_target_step() {
        // Sample i is labelled 6i hours and targets the value i + 1.
        let n = 6;
        let samples: Vec<_> = (0..n).map(|i| hours(6 * i as i64)).collect();
        let predictors = Array5::from_shape_fn((n, 1, 1, 1, 1), |(s, _, _, _, _)| s as f32);
        let targets = Array5::from_shape_fn((n, 1, 1, 1, 1), |(s, _, _, _, _)| (s + 1) as f32);
        let windows = SampleWindows::new(
            samples,
            vec![Channel::new("HGT", "500")],
            array![45.0],
            array![0.0],
            predictors,
            targets,
        )
        .unwrap();
        let v = verification_from_samples(&windows, None, 3, 6).unwrap();
        assert_eq!(v.data()[[0, 0, 0, 0, 0]], 1.0);
        assert_eq!(v.data()[[2, 0, 0, 0, 0]], 3.0);
        assert_eq!(v.data()[[2, 3, 0, 0, 0]], 6.0);
        assert!(v.data()[[2, 4, 0, 0, 0]].is_nan());

        // Same answer as reindexing the equivalent series.
        let store = series(0..n + 1);
        let from_series = verification_from_series(&store, None, 3, 6).unwrap();
        for i in 0..4 {
            for f in 0..3 {
                assert_eq!(v.data()[[f, i, 0, 0, 0]], from_series.data()[[f, i, 0, 0, 0]]);
            }
        }
    }
}
