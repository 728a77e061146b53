//! # wxcast
//!
//! Forecast rollout and verification for deep-learning weather prediction.
//!
//! A trained sequence predictor is rolled forward from windows of observed
//! gridded states, feeding its outputs back as inputs, to produce a
//! trajectory indexed by lead time and initialization time. Verification
//! trajectories are built from the same observations, and the two are
//! scored per lead step alongside persistence and climatology baselines.

// Allow some clippy warnings for cleaner code in specific cases
#![allow(clippy::too_many_arguments)]
#![allow(clippy::type_complexity)]
#![allow(clippy::needless_range_loop)]

pub mod core;
pub mod error;
pub mod insolation;
pub mod metrics;
pub mod models;
pub mod rollout;
pub mod utils;
pub mod verification;

pub use error::{ForecastError, Result};

pub mod prelude {
    pub use crate::core::{Channel, SampleStore, SampleWindows, Trajectory};
    pub use crate::error::{ForecastError, Result};
    pub use crate::metrics::{compare_trajectories, score_trajectories, ErrorMethod};
    pub use crate::models::{Persistence, PredictorSpec, SequencePredictor};
    pub use crate::rollout::{RolloutConfig, RolloutEngine};
    pub use crate::verification::{verification_from_samples, verification_from_series};
}
