//! Forecast/verification trajectories indexed by lead time and initialization time.

use crate::core::channel::{channel_indices, Channel};
use crate::core::store::{range_indices, validate_channels, validate_times, SampleStore};
use crate::error::{ForecastError, Result};
use chrono::{DateTime, Duration, Utc};
use ndarray::{Array1, Array5, ArrayView4, ArrayView5, Axis};

/// Lead-time coordinate `dt, 2dt, ..., n*dt`.
pub fn lead_times(dt_hours: i64, steps: usize) -> Vec<Duration> {
    (1..=steps as i64)
        .map(|f| Duration::hours(dt_hours * f))
        .collect()
}

/// Time covered by `steps` steps of `dt_hours`.
///
/// Fails when the span does not fit in a `Duration`.
pub(crate) fn time_span(dt_hours: i64, steps: usize) -> Result<Duration> {
    i64::try_from(steps)
        .ok()
        .and_then(|n| dt_hours.checked_mul(n))
        .and_then(Duration::try_hours)
        .ok_or_else(|| {
            ForecastError::InvalidParameter(format!(
                "{} steps of {}h exceed the representable time range",
                steps, dt_hours
            ))
        })
}

/// Check that every time can be moved back by `before` and forward by `after`.
pub(crate) fn check_time_span(
    times: &[DateTime<Utc>],
    before: Duration,
    after: Duration,
) -> Result<()> {
    let fits = |t: &&DateTime<Utc>| {
        t.checked_sub_signed(before).is_some() && t.checked_add_signed(after).is_some()
    };
    match times.iter().find(|t| !fits(t)) {
        Some(t) => Err(ForecastError::TimestampError(format!(
            "{} cannot be shifted by {}h",
            t,
            after.num_hours()
        ))),
        None => Ok(()),
    }
}

/// A dense `[lead][init][channel][lat][lon]` array with labelled axes.
///
/// Lead step `f` for initialization `t0` describes the state at
/// `t0 + lead_times[f]`. Forecasts and verifications share this layout so
/// they can be differenced once their initialization axes are intersected.
#[derive(Debug, Clone)]
pub struct Trajectory {
    lead_times: Vec<Duration>,
    init_times: Vec<DateTime<Utc>>,
    channels: Vec<Channel>,
    lat: Array1<f64>,
    lon: Array1<f64>,
    data: Array5<f32>,
}

impl Trajectory {
    pub fn new(
        lead_times: Vec<Duration>,
        init_times: Vec<DateTime<Utc>>,
        channels: Vec<Channel>,
        lat: Array1<f64>,
        lon: Array1<f64>,
        data: Array5<f32>,
    ) -> Result<Self> {
        if lead_times.iter().any(|l| *l <= Duration::zero())
            || lead_times.windows(2).any(|w| w[1] <= w[0])
        {
            return Err(ForecastError::InvalidParameter(
                "lead times must be positive and strictly increasing".to_string(),
            ));
        }
        validate_times(&init_times)?;
        validate_channels(&channels)?;
        let expected = vec![
            lead_times.len(),
            init_times.len(),
            channels.len(),
            lat.len(),
            lon.len(),
        ];
        if data.shape() != expected.as_slice() {
            return Err(ForecastError::ShapeMismatch {
                expected,
                got: data.shape().to_vec(),
            });
        }
        Ok(Self {
            lead_times,
            init_times,
            channels,
            lat,
            lon,
            data,
        })
    }

    /// Attach labels to a raw forecast array using the store it was initialized from.
    ///
    /// The store's times become the initialization axis. The number of lead
    /// times must match the first axis of `data`.
    pub fn from_store_metadata(
        data: Array5<f32>,
        lead_times: Vec<Duration>,
        store: &SampleStore,
    ) -> Result<Self> {
        if lead_times.len() != data.len_of(Axis(0)) {
            return Err(ForecastError::DimensionMismatch {
                expected: data.len_of(Axis(0)),
                got: lead_times.len(),
            });
        }
        Self::new(
            lead_times,
            store.times().to_vec(),
            store.channels().to_vec(),
            store.lat().clone(),
            store.lon().clone(),
            data,
        )
    }

    pub fn lead_times(&self) -> &[Duration] {
        &self.lead_times
    }

    pub fn init_times(&self) -> &[DateTime<Utc>] {
        &self.init_times
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn lat(&self) -> &Array1<f64> {
        &self.lat
    }

    pub fn lon(&self) -> &Array1<f64> {
        &self.lon
    }

    pub fn data(&self) -> ArrayView5<'_, f32> {
        self.data.view()
    }

    pub fn into_data(self) -> Array5<f32> {
        self.data
    }

    pub fn n_leads(&self) -> usize {
        self.lead_times.len()
    }

    pub fn n_inits(&self) -> usize {
        self.init_times.len()
    }

    /// All initializations at lead step `f` (0-based).
    pub fn lead(&self, f: usize) -> ArrayView4<'_, f32> {
        self.data.index_axis(Axis(0), f)
    }

    /// Absolute time described by lead step `f` of initialization `i`.
    pub fn valid_time(&self, f: usize, i: usize) -> DateTime<Utc> {
        self.init_times[i] + self.lead_times[f]
    }

    /// Restrict to initialization times, which must all be present.
    pub fn select_init_times(&self, times: &[DateTime<Utc>]) -> Result<Self> {
        validate_times(times)?;
        let idx = times
            .iter()
            .map(|t| {
                self.init_times.binary_search(t).map_err(|_| {
                    ForecastError::TimestampError(format!("initialization time {} not found", t))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            init_times: times.to_vec(),
            data: self.data.select(Axis(1), &idx),
            ..self.clone()
        })
    }

    /// Both trajectories restricted to their common initialization times.
    pub fn intersect_init_times(&self, other: &Trajectory) -> Result<(Self, Self)> {
        let common: Vec<_> = self
            .init_times
            .iter()
            .filter(|t| other.init_times.binary_search(t).is_ok())
            .copied()
            .collect();
        if common.is_empty() {
            return Err(ForecastError::EmptyData);
        }
        Ok((
            self.select_init_times(&common)?,
            other.select_init_times(&common)?,
        ))
    }

    /// Keep only the first `n` lead steps.
    pub fn truncate_leads(&self, n: usize) -> Self {
        let n = n.min(self.n_leads());
        Self {
            lead_times: self.lead_times[..n].to_vec(),
            data: self.data.slice_axis(Axis(0), (0..n).into()).to_owned(),
            ..self.clone()
        }
    }

    pub fn select_channels(&self, channels: &[Channel]) -> Result<Self> {
        validate_channels(channels)?;
        let idx = channel_indices(&self.channels, channels)?;
        Ok(Self {
            channels: channels.to_vec(),
            data: self.data.select(Axis(2), &idx),
            ..self.clone()
        })
    }

    pub fn select_lat_range(&self, a: f64, b: f64) -> Self {
        let idx = range_indices(&self.lat, a, b);
        Self {
            lat: self.lat.select(Axis(0), &idx),
            data: self.data.select(Axis(3), &idx),
            ..self.clone()
        }
    }

    pub fn select_lon_range(&self, a: f64, b: f64) -> Self {
        let idx = range_indices(&self.lon, a, b);
        Self {
            lon: self.lon.select(Axis(0), &idx),
            data: self.data.select(Axis(4), &idx),
            ..self.clone()
        }
    }

    /// Undo a standardisation: `value * std + mean`.
    pub fn rescale(&self, std: f32, mean: f32) -> Self {
        Self {
            data: self.data.mapv(|v| v * std + mean),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use ndarray::array;

    fn hours(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2007, 1, 1, 0, 0, 0).unwrap() + Duration::hours(n)
    }

    fn make_trajectory(inits: &[i64]) -> Trajectory {
        let init_times: Vec<_> = inits.iter().map(|h| hours(*h)).collect();
        let data = Array5::from_shape_fn((3, inits.len(), 1, 2, 1), |(f, i, _, y, _)| {
            (inits[i] + 6 * (f as i64 + 1)) as f32 + y as f32 * 0.5
        });
        Trajectory::new(
            lead_times(6, 3),
            init_times,
            vec![Channel::new("HGT", "500")],
            array![50.0, 30.0],
            array![0.0],
            data,
        )
        .unwrap()
    }

    #[test]
    fn lead_times_are_multiples_of_dt() {
        assert_eq!(
            lead_times(6, 3),
            vec![Duration::hours(6), Duration::hours(12), Duration::hours(18)]
        );
    }

    #[test]
    fn time_span_rejects_overflow() {
        assert_eq!(time_span(6, 4).unwrap(), Duration::hours(24));
        assert!(matches!(
            time_span(i64::MAX, 2),
            Err(ForecastError::InvalidParameter(_))
        ));
        assert!(time_span(i64::MAX / 2, 1).is_err());
    }

    #[test]
    fn time_span_must_fit_around_every_time() {
        let times = [hours(0), hours(6)];
        assert!(check_time_span(&times, Duration::hours(12), Duration::hours(48)).is_ok());
        let far = Duration::days(365 * 300_000);
        assert!(matches!(
            check_time_span(&times, Duration::zero(), far),
            Err(ForecastError::TimestampError(_))
        ));
        assert!(check_time_span(&times, far, Duration::zero()).is_err());
    }

    #[test]
    fn rejects_non_increasing_leads() {
        let err = Trajectory::new(
            vec![Duration::hours(6), Duration::hours(6)],
            vec![hours(0)],
            vec![Channel::surface("PWAT")],
            array![0.0],
            array![0.0],
            Array5::zeros((2, 1, 1, 1, 1)),
        )
        .unwrap_err();
        assert!(matches!(err, ForecastError::InvalidParameter(_)));
    }

    #[test]
    fn valid_time_adds_lead() {
        let t = make_trajectory(&[0, 6]);
        assert_eq!(t.valid_time(2, 1), hours(24));
    }

    #[test]
    fn intersects_initialization_axes() {
        let a = make_trajectory(&[0, 6, 12, 18]);
        let b = make_trajectory(&[6, 18, 30]);
        let (a2, b2) = a.intersect_init_times(&b).unwrap();
        assert_eq!(a2.init_times(), &[hours(6), hours(18)]);
        assert_eq!(b2.init_times(), &[hours(6), hours(18)]);
        assert_eq!(a2.data(), b2.data());
        assert_eq!(a2.data()[[0, 1, 0, 0, 0]], 24.0);

        let c = make_trajectory(&[100]);
        assert_eq!(
            a.intersect_init_times(&c).unwrap_err(),
            ForecastError::EmptyData
        );
    }

    #[test]
    fn truncates_and_selects() {
        let t = make_trajectory(&[0, 6]);
        let short = t.truncate_leads(2);
        assert_eq!(short.n_leads(), 2);
        assert_eq!(short.data().dim(), (2, 2, 1, 2, 1));
        assert_eq!(t.truncate_leads(10).n_leads(), 3);

        let band = t.select_lat_range(20.0, 40.0);
        assert_eq!(band.lat().to_vec(), vec![30.0]);
        assert_eq!(band.data()[[0, 0, 0, 0, 0]], 6.5);

        let rescaled = t.rescale(10.0, 5.0);
        assert_eq!(rescaled.data()[[0, 0, 0, 0, 0]], 65.0);
    }

    #[test]
    fn attaches_store_metadata() {
        let store = SampleStore::new(
            vec![hours(0), hours(6)],
            vec![Channel::new("HGT", "500")],
            array![50.0],
            array![0.0],
            ndarray::Array4::zeros((2, 1, 1, 1)),
        )
        .unwrap();
        let t = Trajectory::from_store_metadata(Array5::zeros((2, 2, 1, 1, 1)), lead_times(6, 2), &store)
            .unwrap();
        assert_eq!(t.init_times(), store.times());

        let err = Trajectory::from_store_metadata(Array5::zeros((3, 2, 1, 1, 1)), lead_times(6, 2), &store)
            .unwrap_err();
        assert_eq!(err, ForecastError::DimensionMismatch { expected: 3, got: 2 });
    }
}
