//! Forecast verification metrics.
//!
//! Scores compare forecast trajectories with verification trajectories or
//! plain observation series, plus persistence and climatology baselines.
//! All reductions skip NaN values.

mod correlation;
mod method;
mod reduce;
mod scores;
mod weighted;

pub use correlation::{anomaly_correlation, anomaly_correlation_by_lead};
pub use method::ErrorMethod;
pub use reduce::{nan_mean, reduce_error};
pub use scores::{
    climo_error, compare_against_series, compare_trajectories, monthly_climatology,
    monthly_climo_error, persistence_error, score_trajectories, MonthlyClimoError,
};
pub use weighted::{LatitudeWeightedLoss, LatitudeWeighting};
