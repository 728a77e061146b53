//! Persistence predictor.
//!
//! Forecasts the most recent state of the input window for every channel.

use crate::core::Channel;
use crate::error::{ForecastError, Result};
use crate::models::{PredictorInput, SequencePredictor};
use ndarray::{Array4, Axis};

/// Predictor that repeats the latest window step.
#[derive(Debug, Clone)]
pub struct Persistence {
    channels: Vec<Channel>,
    time_steps: usize,
}

impl Persistence {
    pub fn new(channels: Vec<Channel>, time_steps: usize) -> Self {
        Self {
            channels,
            time_steps,
        }
    }
}

impl SequencePredictor for Persistence {
    fn input_channels(&self) -> &[Channel] {
        &self.channels
    }

    fn output_channels(&self) -> &[Channel] {
        &self.channels
    }

    fn input_time_steps(&self) -> usize {
        self.time_steps
    }

    fn predict_one_step(&mut self, input: &PredictorInput<'_>) -> Result<Array4<f32>> {
        let steps = input.time_steps();
        if steps == 0 {
            return Err(ForecastError::EmptyData);
        }
        Ok(input.inputs.index_axis(Axis(1), steps - 1).to_owned())
    }

    fn name(&self) -> &str {
        "Persistence"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use ndarray::{Array2, Array5};

    #[test]
    fn repeats_latest_step() {
        let mut model = Persistence::new(vec![Channel::new("HGT", "500")], 2);
        let inputs = Array5::from_shape_fn((2, 2, 1, 1, 1), |(i, k, _, _, _)| (10 * i + k) as f32);
        let times = Array2::from_elem((2, 2), DateTime::<Utc>::UNIX_EPOCH);
        let out = model
            .predict_one_step(&PredictorInput {
                inputs: inputs.view(),
                times: times.view(),
                insolation: None,
            })
            .unwrap();
        assert_eq!(out[[0, 0, 0, 0]], 1.0);
        assert_eq!(out[[1, 0, 0, 0]], 11.0);
    }
}
