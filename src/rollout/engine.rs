//! Time-series rollout engine.
//!
//! Repeatedly applies a one-step [`SequencePredictor`] over a sliding window,
//! feeding predicted channels back as inputs and refreshing every other input
//! from observations, for all initialization times at once.

use crate::core::{
    channel_indices, check_time_span, lead_times, time_span, validate_times, Channel, ChannelRole,
    SampleStore, Trajectory,
};
use crate::error::{ForecastError, Result};
use crate::models::{PredictorInput, SequencePredictor};
use crate::rollout::config::{MissingDataPolicy, RolloutConfig};
use crate::rollout::window::SlidingWindow;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use ndarray::{s, Array5, Axis};

/// Where each model input comes from during a rollout.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelPlan {
    input_channels: Vec<Channel>,
    output_channels: Vec<Channel>,
    pass_through: Vec<Channel>,
    /// Per input channel: the output index fed back into it, or `None` if observed.
    feedback: Vec<Option<usize>>,
}

impl ChannelPlan {
    /// Resolve roles from a model's inputs and outputs.
    ///
    /// Every exclusion must name an output channel.
    pub fn new(inputs: &[Channel], outputs: &[Channel], exclusions: &[Channel]) -> Result<Self> {
        if inputs.is_empty() || outputs.is_empty() {
            return Err(ForecastError::InvalidParameter(
                "predictor must declare input and output channels".to_string(),
            ));
        }
        if let Some(c) = exclusions.iter().find(|c| !outputs.contains(c)) {
            return Err(ForecastError::InvalidParameter(format!(
                "feedback exclusion '{}' is not a predicted channel",
                c
            )));
        }
        let feedback = inputs
            .iter()
            .map(|c| {
                if exclusions.contains(c) {
                    None
                } else {
                    outputs.iter().position(|o| o == c)
                }
            })
            .collect();
        let pass_through = inputs
            .iter()
            .filter(|c| !outputs.contains(c))
            .cloned()
            .collect();
        Ok(Self {
            input_channels: inputs.to_vec(),
            output_channels: outputs.to_vec(),
            pass_through,
            feedback,
        })
    }

    pub fn input_channels(&self) -> &[Channel] {
        &self.input_channels
    }

    pub fn output_channels(&self) -> &[Channel] {
        &self.output_channels
    }

    pub fn pass_through(&self) -> &[Channel] {
        &self.pass_through
    }

    pub fn role(&self, channel: &Channel) -> Option<ChannelRole> {
        if self.output_channels.contains(channel) {
            Some(ChannelRole::Predicted)
        } else if self.pass_through.contains(channel) {
            Some(ChannelRole::PassThrough)
        } else {
            None
        }
    }

    /// Whether `channel` is an input fed from the previous step's prediction.
    pub fn is_fed_back(&self, channel: &Channel) -> bool {
        self.input_channels
            .iter()
            .zip(&self.feedback)
            .any(|(c, f)| c == channel && f.is_some())
    }

    /// Forecast channels: model outputs followed by pass-through inputs.
    pub fn trajectory_channels(&self) -> Vec<Channel> {
        self.output_channels
            .iter()
            .chain(self.pass_through.iter())
            .cloned()
            .collect()
    }

    /// Whether any input is refreshed from observations after the first step.
    pub fn needs_observations(&self) -> bool {
        self.feedback.iter().any(|f| f.is_none())
    }
}

/// Rolls a predictor forward from a batch of initialization times.
#[derive(Debug, Clone)]
pub struct RolloutEngine {
    config: RolloutConfig,
}

impl RolloutEngine {
    pub fn new(config: RolloutConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &RolloutConfig {
        &self.config
    }

    /// Channel roles for `predictor` under this configuration.
    pub fn plan<P>(&self, predictor: &P) -> Result<ChannelPlan>
    where
        P: SequencePredictor + ?Sized,
    {
        ChannelPlan::new(
            predictor.input_channels(),
            predictor.output_channels(),
            &self.config.feedback_exclusions,
        )
    }

    /// Produce a forecast trajectory for every time in `init_times`.
    ///
    /// The initial window for `t0` holds the observed states at
    /// `t0 - (k-1)dt, ..., t0`. Each lead step calls the predictor once for the
    /// whole batch. A predictor error aborts the rollout; no partial
    /// trajectory is returned.
    pub fn predict<P>(
        &self,
        predictor: &mut P,
        store: &SampleStore,
        init_times: &[DateTime<Utc>],
    ) -> Result<Trajectory>
    where
        P: SequencePredictor + ?Sized,
    {
        if init_times.is_empty() {
            return Err(ForecastError::EmptyData);
        }
        validate_times(init_times)?;
        let k = predictor.input_time_steps();
        if k == 0 {
            return Err(ForecastError::InvalidParameter(
                "predictor must use at least one input time step".to_string(),
            ));
        }
        check_time_span(
            init_times,
            time_span(self.config.dt_hours, k - 1)?,
            time_span(self.config.dt_hours, self.config.forecast_steps)?,
        )?;
        let plan = self.plan(predictor)?;
        let inputs = store.select_channels(plan.input_channels())?;
        let pass_idx = channel_indices(plan.input_channels(), plan.pass_through())?;
        let strict = self.config.missing_data == MissingDataPolicy::Strict;
        let dt = self.config.dt();
        let n_steps = self.config.forecast_steps;
        let n_init = init_times.len();
        let n_out = plan.output_channels().len();
        let (n_lat, n_lon) = store.grid_shape();
        let mut warned = false;

        let times = SlidingWindow::times_ending_at(init_times, k, dt);
        if let Some(t) = times.iter().find(|t| !store.contains(t)) {
            if strict {
                return Err(ForecastError::MissingData { time: *t });
            }
            warn!("initial window time {} not in store; filling with NaN", t);
            warned = true;
        }
        let mut data = Array5::zeros((n_init, k, plan.input_channels().len(), n_lat, n_lon));
        for j in 0..k {
            let column = times.column(j).to_vec();
            data.index_axis_mut(Axis(1), j)
                .assign(&inputs.reindex(&column));
        }
        let mut window = SlidingWindow::new(data, times, dt)?;
        predictor.reset();

        let channels = plan.trajectory_channels();
        let mut forecast =
            Array5::from_elem((n_steps, n_init, channels.len(), n_lat, n_lon), f32::NAN);

        info!(
            "rolling out {} for {} steps of {}h from {} initializations",
            predictor.name(),
            n_steps,
            self.config.dt_hours,
            n_init
        );
        for f in 0..n_steps {
            let insolation = if self.config.add_insolation {
                Some(window.insolation(store.lat(), store.lon(), self.config.insolation_scale)?)
            } else {
                None
            };
            let input = PredictorInput {
                inputs: window.data(),
                times: window.times(),
                insolation: insolation.as_ref().map(|a| a.view()),
            };
            let output = predictor.predict_one_step(&input)?;
            if output.dim() != (n_init, n_out, n_lat, n_lon) {
                return Err(ForecastError::PredictorFailure(format!(
                    "{} returned shape {:?}, expected {:?}",
                    predictor.name(),
                    output.shape(),
                    [n_init, n_out, n_lat, n_lon]
                )));
            }

            let next = window.next_times();
            if plan.needs_observations() {
                if let Some(t) = next.iter().find(|t| !store.contains(t)) {
                    if strict {
                        return Err(ForecastError::MissingData { time: *t });
                    }
                    if !warned {
                        warn!(
                            "observations for {} unavailable at lead step {}; NaN will propagate",
                            t,
                            f + 1
                        );
                        warned = true;
                    }
                }
            }
            let observed = inputs.reindex(&next);

            let mut step = forecast.index_axis_mut(Axis(0), f);
            step.slice_mut(s![.., ..n_out, .., ..]).assign(&output);
            for (p, &c) in pass_idx.iter().enumerate() {
                step.index_axis_mut(Axis(1), n_out + p)
                    .assign(&observed.index_axis(Axis(1), c));
            }

            let mut sample = observed;
            for (c, source) in plan.feedback.iter().enumerate() {
                if let Some(o) = source {
                    sample
                        .index_axis_mut(Axis(1), c)
                        .assign(&output.index_axis(Axis(1), *o));
                }
            }
            window.advance(sample)?;
            debug!("lead step {}/{} complete", f + 1, n_steps);
        }
        info!("rollout of {} complete", predictor.name());

        Trajectory::new(
            lead_times(self.config.dt_hours, n_steps),
            init_times.to_vec(),
            channels,
            store.lat().clone(),
            store.lon().clone(),
            forecast,
        )
    }
}
