//! Sliding input window shared by all initializations of a rollout.

use crate::error::{ForecastError, Result};
use crate::insolation::insolation_grid;
use chrono::{DateTime, Duration, Utc};
use ndarray::{Array1, Array2, Array4, Array5, ArrayView2, ArrayView5, Axis};

/// `k` consecutive states for each initialization, spaced exactly `dt` apart.
#[derive(Debug, Clone)]
pub struct SlidingWindow {
    /// `[init][time_step][channel][lat][lon]`
    data: Array5<f32>,
    /// `[init][time_step]`
    times: Array2<DateTime<Utc>>,
    dt: Duration,
}

impl SlidingWindow {
    /// Window times ending at each initialization time.
    pub fn times_ending_at(
        init_times: &[DateTime<Utc>],
        k: usize,
        dt: Duration,
    ) -> Array2<DateTime<Utc>> {
        Array2::from_shape_fn((init_times.len(), k), |(i, j)| {
            init_times[i] - dt * (k - 1 - j) as i32
        })
    }

    pub fn new(data: Array5<f32>, times: Array2<DateTime<Utc>>, dt: Duration) -> Result<Self> {
        let (n_init, k, ..) = data.dim();
        if times.dim() != (n_init, k) {
            return Err(ForecastError::ShapeMismatch {
                expected: vec![n_init, k],
                got: times.shape().to_vec(),
            });
        }
        if k == 0 {
            return Err(ForecastError::InvalidParameter(
                "window must hold at least one time step".to_string(),
            ));
        }
        Ok(Self { data, times, dt })
    }

    pub fn data(&self) -> ArrayView5<'_, f32> {
        self.data.view()
    }

    pub fn times(&self) -> ArrayView2<'_, DateTime<Utc>> {
        self.times.view()
    }

    pub fn time_steps(&self) -> usize {
        self.times.ncols()
    }

    /// Latest time of each initialization's window.
    pub fn latest(&self) -> Vec<DateTime<Utc>> {
        self.times.column(self.time_steps() - 1).to_vec()
    }

    /// Time one step after the end of each window.
    pub fn next_times(&self) -> Vec<DateTime<Utc>> {
        self.latest().into_iter().map(|t| t + self.dt).collect()
    }

    /// Drop the oldest step and append `sample` (`[init][channel][lat][lon]`) one `dt` later.
    pub fn advance(&mut self, sample: Array4<f32>) -> Result<()> {
        let (n_init, k, n_channel, n_lat, n_lon) = self.data.dim();
        if sample.dim() != (n_init, n_channel, n_lat, n_lon) {
            return Err(ForecastError::ShapeMismatch {
                expected: vec![n_init, n_channel, n_lat, n_lon],
                got: sample.shape().to_vec(),
            });
        }
        let next = self.next_times();
        for j in 0..k - 1 {
            let later = self.data.index_axis(Axis(1), j + 1).to_owned();
            self.data.index_axis_mut(Axis(1), j).assign(&later);
            let later_times = self.times.column(j + 1).to_owned();
            self.times.column_mut(j).assign(&later_times);
        }
        self.data.index_axis_mut(Axis(1), k - 1).assign(&sample);
        self.times.column_mut(k - 1).assign(&Array1::from(next));
        Ok(())
    }

    /// Insolation for every window step, `[init][time_step][lat][lon]`.
    pub fn insolation(
        &self,
        lat: &Array1<f64>,
        lon: &Array1<f64>,
        scale: f64,
    ) -> Result<Array4<f32>> {
        let (n_init, k) = self.times.dim();
        let flat: Vec<_> = self.times.iter().copied().collect();
        let sol = insolation_grid(&flat, lat, lon, scale)?;
        sol.into_shape_with_order((n_init, k, lat.len(), lon.len()))
            .map_err(|e| ForecastError::InvalidParameter(e.to_string()))
    }
}
