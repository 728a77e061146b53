//! Sample store: gridded atmospheric states tagged with absolute timestamps.

use crate::core::channel::{channel_indices, Channel};
use crate::error::{ForecastError, Result};
use chrono::{DateTime, Duration, Utc};
use ndarray::{Array1, Array4, ArrayView3, ArrayView4, Axis};

/// A read-only collection of atmospheric snapshots on a fixed lat/lon grid.
///
/// Data are laid out as `data[time][channel][lat][lon]`. Every sample shares
/// the same channel set and grid.
#[derive(Debug, Clone)]
pub struct SampleStore {
    times: Vec<DateTime<Utc>>,
    channels: Vec<Channel>,
    lat: Array1<f64>,
    lon: Array1<f64>,
    data: Array4<f32>,
}

impl SampleStore {
    /// Create a store, validating the shape and timestamp ordering.
    pub fn new(
        times: Vec<DateTime<Utc>>,
        channels: Vec<Channel>,
        lat: Array1<f64>,
        lon: Array1<f64>,
        data: Array4<f32>,
    ) -> Result<Self> {
        validate_times(&times)?;
        validate_channels(&channels)?;
        let expected = vec![times.len(), channels.len(), lat.len(), lon.len()];
        if data.shape() != expected.as_slice() {
            return Err(ForecastError::ShapeMismatch {
                expected,
                got: data.shape().to_vec(),
            });
        }
        Ok(Self {
            times,
            channels,
            lat,
            lon,
            data,
        })
    }

    pub fn times(&self) -> &[DateTime<Utc>] {
        &self.times
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

    pub fn data(&self) -> ArrayView4<'_, f32> {
        self.data.view()
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// `(n_lat, n_lon)`.
    pub fn grid_shape(&self) -> (usize, usize) {
        (self.lat.len(), self.lon.len())
    }

    /// Position of an exact timestamp, if present.
    pub fn time_index(&self, time: &DateTime<Utc>) -> Option<usize> {
        self.times.binary_search(time).ok()
    }

    pub fn contains(&self, time: &DateTime<Utc>) -> bool {
        self.time_index(time).is_some()
    }

    /// Spacing between the first two samples.
    pub fn cadence(&self) -> Option<Duration> {
        match self.times.as_slice() {
            [first, second, ..] => Some(*second - *first),
            _ => None,
        }
    }

    /// Snapshot at an exact time, `[channel][lat][lon]`.
    pub fn sample(&self, time: &DateTime<Utc>) -> Option<ArrayView3<'_, f32>> {
        self.time_index(time).map(|i| self.data.index_axis(Axis(0), i))
    }

    /// Field of one channel over all times, `[time][lat][lon]`.
    pub fn channel_data(&self, channel: &Channel) -> Result<ArrayView3<'_, f32>> {
        let idx = channel_indices(&self.channels, std::slice::from_ref(channel))?[0];
        Ok(self.data.index_axis(Axis(1), idx))
    }

    /// Exact-match lookup of `times`; absent times are filled with NaN.
    ///
    /// Never fails: a missing time is a data gap, not an error.
    pub fn reindex(&self, times: &[DateTime<Utc>]) -> Array4<f32> {
        let (_, n_channel, n_lat, n_lon) = self.data.dim();
        let mut out = Array4::from_elem((times.len(), n_channel, n_lat, n_lon), f32::NAN);
        for (i, time) in times.iter().enumerate() {
            if let Some(j) = self.time_index(time) {
                out.index_axis_mut(Axis(0), i)
                    .assign(&self.data.index_axis(Axis(0), j));
            }
        }
        out
    }

    /// Reindex onto an arbitrary (strictly increasing) set of times.
    pub fn select_times(&self, times: &[DateTime<Utc>]) -> Result<Self> {
        let data = self.reindex(times);
        Self::new(
            times.to_vec(),
            self.channels.clone(),
            self.lat.clone(),
            self.lon.clone(),
            data,
        )
    }

    /// Samples with `start <= time <= end`.
    pub fn select_time_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        let lo = self.times.partition_point(|t| *t < start);
        let hi = self.times.partition_point(|t| *t <= end).max(lo);
        Self {
            times: self.times[lo..hi].to_vec(),
            channels: self.channels.clone(),
            lat: self.lat.clone(),
            lon: self.lon.clone(),
            data: self.data.slice_axis(Axis(0), (lo..hi).into()).to_owned(),
        }
    }

    /// Restrict to the given channels, in the requested order.
    pub fn select_channels(&self, channels: &[Channel]) -> Result<Self> {
        validate_channels(channels)?;
        let idx = channel_indices(&self.channels, channels)?;
        Ok(Self {
            times: self.times.clone(),
            channels: channels.to_vec(),
            lat: self.lat.clone(),
            lon: self.lon.clone(),
            data: self.data.select(Axis(1), &idx),
        })
    }

    /// Latitudes within `[a, b]` (bounds in either order).
    pub fn select_lat_range(&self, a: f64, b: f64) -> Self {
        let idx = range_indices(&self.lat, a, b);
        Self {
            times: self.times.clone(),
            channels: self.channels.clone(),
            lat: self.lat.select(Axis(0), &idx),
            lon: self.lon.clone(),
            data: self.data.select(Axis(2), &idx),
        }
    }

    /// Longitudes within `[a, b]` (bounds in either order).
    pub fn select_lon_range(&self, a: f64, b: f64) -> Self {
        let idx = range_indices(&self.lon, a, b);
        Self {
            times: self.times.clone(),
            channels: self.channels.clone(),
            lat: self.lat.clone(),
            lon: self.lon.select(Axis(0), &idx),
            data: self.data.select(Axis(3), &idx),
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

pub(crate) fn validate_times(times: &[DateTime<Utc>]) -> Result<()> {
    for pair in times.windows(2) {
        if pair[1] <= pair[0] {
            return Err(ForecastError::TimestampError(
                "timestamps must be strictly increasing".to_string(),
            ));
        }
    }
    Ok(())
}

pub(crate) fn validate_channels(channels: &[Channel]) -> Result<()> {
    for (i, c) in channels.iter().enumerate() {
        if channels[..i].contains(c) {
            return Err(ForecastError::InvalidParameter(format!(
                "duplicate channel '{}'",
                c
            )));
        }
    }
    Ok(())
}

pub(crate) fn range_indices(coord: &Array1<f64>, a: f64, b: f64) -> Vec<usize> {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    coord
        .iter()
        .enumerate()
        .filter(|(_, v)| **v >= lo && **v <= hi)
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use ndarray::array;

    fn hours(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2007, 1, 1, 0, 0, 0).unwrap() + Duration::hours(n)
    }

    fn make_store() -> SampleStore {
        let times: Vec<_> = (0..4).map(|i| hours(6 * i)).collect();
        let channels = vec![Channel::new("HGT", "500"), Channel::new("THICK", "300-700")];
        let data = Array4::from_shape_fn((4, 2, 3, 2), |(t, c, y, x)| {
            (100 * t + 10 * c + 2 * y + x) as f32
        });
        SampleStore::new(
            times,
            channels,
            array![60.0, 40.0, 20.0],
            array![0.0, 180.0],
            data,
        )
        .unwrap()
    }

    #[test]
    fn rejects_bad_shapes_and_times() {
        let err = SampleStore::new(
            vec![hours(0)],
            vec![Channel::surface("PWAT")],
            array![0.0],
            array![0.0],
            Array4::zeros((1, 1, 1, 2)),
        )
        .unwrap_err();
        assert!(matches!(err, ForecastError::ShapeMismatch { .. }));

        let err = SampleStore::new(
            vec![hours(6), hours(0)],
            vec![Channel::surface("PWAT")],
            array![0.0],
            array![0.0],
            Array4::zeros((2, 1, 1, 1)),
        )
        .unwrap_err();
        assert!(matches!(err, ForecastError::TimestampError(_)));
    }

    #[test]
    fn reindex_fills_missing_with_nan() {
        let store = make_store();
        let out = store.reindex(&[hours(6), hours(7), hours(18), hours(24)]);
        assert_eq!(out.dim(), (4, 2, 3, 2));
        assert_eq!(out[[0, 1, 2, 1]], 115.0);
        assert!(out.index_axis(Axis(0), 1).iter().all(|v| v.is_nan()));
        assert_eq!(out[[2, 0, 0, 0]], 300.0);
        assert!(out.index_axis(Axis(0), 3).iter().all(|v| v.is_nan()));
    }

    #[test]
    fn selects_by_time_channel_and_box() {
        let store = make_store();

        let sub = store.select_time_range(hours(6), hours(12));
        assert_eq!(sub.times(), &[hours(6), hours(12)]);
        assert_eq!(sub.data()[[0, 0, 0, 0]], 100.0);

        let thick = store
            .select_channels(&[Channel::new("THICK", "300-700")])
            .unwrap();
        assert_eq!(thick.channels().len(), 1);
        assert_eq!(thick.data()[[0, 0, 0, 0]], 10.0);

        let band = store.select_lat_range(50.0, 20.0);
        assert_eq!(band.lat().to_vec(), vec![40.0, 20.0]);
        assert_eq!(band.data()[[0, 0, 0, 0]], 2.0);

        let east = store.select_lon_range(90.0, 360.0);
        assert_eq!(east.lon().to_vec(), vec![180.0]);
        assert_eq!(east.data()[[1, 0, 0, 0]], 101.0);
    }

    #[test]
    fn unknown_channel_is_reported() {
        let store = make_store();
        assert!(matches!(
            store.select_channels(&[Channel::new("T", "850")]),
            Err(ForecastError::UnknownChannel(_))
        ));
    }

    #[test]
    fn lookup_helpers() {
        let store = make_store();
        assert_eq!(store.cadence(), Some(Duration::hours(6)));
        assert!(store.contains(&hours(18)));
        assert!(!store.contains(&hours(19)));
        assert_eq!(store.sample(&hours(12)).unwrap()[[1, 0, 0]], 210.0);
        let z = store.channel_data(&Channel::new("HGT", "500")).unwrap();
        assert_eq!(z.dim(), (4, 3, 2));
        let scaled = store.rescale(2.0, 1.0);
        assert_eq!(scaled.data()[[1, 0, 0, 0]], 201.0);
    }
}
