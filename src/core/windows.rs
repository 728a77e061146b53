//! Windowed predictor/target samples.

use crate::core::channel::Channel;
use crate::core::store::{validate_channels, validate_times, SampleStore};
use crate::error::{ForecastError, Result};
use chrono::{DateTime, Utc};
use ndarray::{Array1, Array4, Array5, ArrayView4, ArrayView5, Axis};

/// Which step of each window to keep when flattening windows to a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowStep {
    /// The earliest step in the window.
    First,
    /// The latest step in the window (the initialization time).
    #[default]
    Last,
}

/// Samples stored as fixed-length windows of predictors and targets.
///
/// Both arrays are laid out `[sample][time_step][channel][lat][lon]`. A
/// sample labelled `t` holds predictors ending at `t`; its first target step
/// is the state one cadence after `t`.
#[derive(Debug, Clone)]
pub struct SampleWindows {
    samples: Vec<DateTime<Utc>>,
    channels: Vec<Channel>,
    lat: Array1<f64>,
    lon: Array1<f64>,
    predictors: Array5<f32>,
    targets: Array5<f32>,
}

impl SampleWindows {
    pub fn new(
        samples: Vec<DateTime<Utc>>,
        channels: Vec<Channel>,
        lat: Array1<f64>,
        lon: Array1<f64>,
        predictors: Array5<f32>,
        targets: Array5<f32>,
    ) -> Result<Self> {
        validate_times(&samples)?;
        validate_channels(&channels)?;
        for array in [&predictors, &targets] {
            let (n_sample, n_step, n_channel, n_lat, n_lon) = array.dim();
            let expected = vec![samples.len(), n_step, channels.len(), lat.len(), lon.len()];
            let got = vec![n_sample, n_step, n_channel, n_lat, n_lon];
            if expected != got {
                return Err(ForecastError::ShapeMismatch { expected, got });
            }
            if n_step == 0 {
                return Err(ForecastError::InvalidParameter(
                    "windows must have at least one time step".to_string(),
                ));
            }
        }
        Ok(Self {
            samples,
            channels,
            lat,
            lon,
            predictors,
            targets,
        })
    }

    pub fn samples(&self) -> &[DateTime<Utc>] {
        &self.samples
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

    pub fn predictors(&self) -> ArrayView5<'_, f32> {
        self.predictors.view()
    }

    pub fn targets(&self) -> ArrayView5<'_, f32> {
        self.targets.view()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn input_time_steps(&self) -> usize {
        self.predictors.len_of(Axis(1))
    }

    /// Targets of the first future step, `[sample][channel][lat][lon]`.
    pub fn first_targets(&self) -> ArrayView4<'_, f32> {
        self.targets.index_axis(Axis(1), 0)
    }

    /// Exact-match lookup of first-step targets by sample label; NaN where absent.
    pub fn reindex_first_targets(&self, samples: &[DateTime<Utc>]) -> Array4<f32> {
        let (_, _, n_channel, n_lat, n_lon) = self.targets.dim();
        let first = self.first_targets();
        let mut out = Array4::from_elem((samples.len(), n_channel, n_lat, n_lon), f32::NAN);
        for (i, time) in samples.iter().enumerate() {
            if let Ok(j) = self.samples.binary_search(time) {
                out.index_axis_mut(Axis(0), i)
                    .assign(&first.index_axis(Axis(0), j));
            }
        }
        out
    }

    /// Flatten the predictor windows to a plain series labelled by sample time.
    pub fn to_series(&self, step: WindowStep) -> Result<SampleStore> {
        let idx = match step {
            WindowStep::First => 0,
            WindowStep::Last => self.input_time_steps() - 1,
        };
        SampleStore::new(
            self.samples.clone(),
            self.channels.clone(),
            self.lat.clone(),
            self.lon.clone(),
            self.predictors.index_axis(Axis(1), idx).to_owned(),
        )
    }
}
