//! Sequence predictors driven by the rollout engine.
//!
//! Trained networks live outside this crate; they plug in by implementing
//! [`SequencePredictor`]. A [`Persistence`] predictor is provided as a
//! reference baseline.

mod persistence;
mod traits;

pub use persistence::Persistence;
pub use traits::{BoxedPredictor, PredictorInput, PredictorSpec, SequencePredictor};
