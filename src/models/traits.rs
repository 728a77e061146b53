//! SequencePredictor trait defining the contract between a trained model and the rollout engine.

use crate::core::Channel;
use crate::error::Result;
use chrono::{DateTime, Utc};
use ndarray::{Array4, ArrayView2, ArrayView4, ArrayView5};

/// One batched model input: a window of `k` consecutive states per initialization.
#[derive(Debug, Clone, Copy)]
pub struct PredictorInput<'a> {
    /// `[init][time_step][channel][lat][lon]`, channels in the predictor's input order.
    pub inputs: ArrayView5<'a, f32>,
    /// `[init][time_step]` absolute time of every window step.
    pub times: ArrayView2<'a, DateTime<Utc>>,
    /// `[init][time_step][lat][lon]` insolation, when enabled.
    pub insolation: Option<ArrayView4<'a, f32>>,
}

impl<'a> PredictorInput<'a> {
    pub fn batch_size(&self) -> usize {
        self.inputs.shape()[0]
    }

    pub fn time_steps(&self) -> usize {
        self.inputs.shape()[1]
    }
}

/// Common interface for trained one-step sequence models.
///
/// Given a window of `input_time_steps()` states, a predictor produces the
/// next state for every channel in `output_channels()`, shaped
/// `[init][output channel][lat][lon]`. Output channels that also appear in
/// `input_channels()` are fed back during a rollout; the remaining inputs
/// are refreshed from observations.
///
/// Any internal state (e.g. recurrent memory) belongs to the implementor and
/// must be cleared with [`reset`](SequencePredictor::reset) between
/// independent rollouts. This trait is object-safe.
pub trait SequencePredictor {
    /// Channels the model consumes, in input order.
    fn input_channels(&self) -> &[Channel];

    /// Channels the model produces, in output order.
    fn output_channels(&self) -> &[Channel];

    /// Window length `k`.
    fn input_time_steps(&self) -> usize;

    /// Predict the state one step after the end of each input window.
    fn predict_one_step(&mut self, input: &PredictorInput<'_>) -> Result<Array4<f32>>;

    /// Clear any internal state.
    fn reset(&mut self) {}

    /// Get the model name.
    fn name(&self) -> &str;
}

/// Type alias for boxed predictor trait objects.
pub type BoxedPredictor = Box<dyn SequencePredictor>;

/// Named factory for building a fresh predictor per independent run.
///
/// # Example
///
/// ```
/// use wxcast::core::Channel;
/// use wxcast::models::{Persistence, PredictorSpec};
///
/// let channels = vec![Channel::new("HGT", "500")];
/// let spec = PredictorSpec::new("Persistence", move || {
///     Box::new(Persistence::new(channels.clone(), 2))
/// });
/// let model = spec.create();
/// assert_eq!(model.name(), "Persistence");
/// ```
pub struct PredictorSpec {
    /// Display name of the model
    pub name: String,
    factory: Box<dyn Fn() -> BoxedPredictor + Send + Sync>,
}

impl PredictorSpec {
    pub fn new<F>(name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> BoxedPredictor + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            factory: Box::new(factory),
        }
    }

    /// Create a new predictor instance.
    pub fn create(&self) -> BoxedPredictor {
        (self.factory)()
    }
}

impl std::fmt::Debug for PredictorSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredictorSpec")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
