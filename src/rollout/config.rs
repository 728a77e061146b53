//! Rollout configuration.

use crate::core::{time_span, Channel};
use crate::error::{ForecastError, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};

/// What to do when ground truth needed during a rollout is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingDataPolicy {
    /// Fill with NaN and keep going; NaN propagates into later inputs.
    #[default]
    Propagate,
    /// Fail with `ForecastError::MissingData` at the first absent time.
    Strict,
}

/// Configuration for a time-series rollout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RolloutConfig {
    /// Number of lead steps to produce.
    pub forecast_steps: usize,
    /// Time step in hours.
    pub dt_hours: i64,
    /// Supply insolation for every window step.
    pub add_insolation: bool,
    /// Peak insolation value.
    pub insolation_scale: f64,
    /// Predicted channels that are not fed back; the next window takes their observed value.
    pub feedback_exclusions: Vec<Channel>,
    pub missing_data: MissingDataPolicy,
}

impl Default for RolloutConfig {
    fn default() -> Self {
        Self {
            forecast_steps: 1,
            dt_hours: 6,
            add_insolation: false,
            insolation_scale: 1.0,
            feedback_exclusions: Vec::new(),
            missing_data: MissingDataPolicy::Propagate,
        }
    }
}

impl RolloutConfig {
    /// Create a configuration for `forecast_steps` steps of `dt_hours`.
    pub fn new(forecast_steps: usize, dt_hours: i64) -> Self {
        Self {
            forecast_steps,
            dt_hours,
            ..Self::default()
        }
    }

    /// Enable insolation with the given peak value.
    pub fn with_insolation(mut self, scale: f64) -> Self {
        self.add_insolation = true;
        self.insolation_scale = scale;
        self
    }

    /// Exclude predicted channels from feedback.
    pub fn with_feedback_exclusions(mut self, channels: Vec<Channel>) -> Self {
        self.feedback_exclusions = channels;
        self
    }

    pub fn with_missing_data(mut self, policy: MissingDataPolicy) -> Self {
        self.missing_data = policy;
        self
    }

    pub fn dt(&self) -> Duration {
        Duration::hours(self.dt_hours)
    }

    /// Check parameter ranges.
    pub fn validate(&self) -> Result<()> {
        if self.forecast_steps < 1 {
            return Err(ForecastError::InvalidParameter(
                "'forecast_steps' must be an integer >= 1".to_string(),
            ));
        }
        if self.dt_hours < 1 {
            return Err(ForecastError::InvalidParameter(
                "'dt' must be an integer >= 1".to_string(),
            ));
        }
        time_span(self.dt_hours, self.forecast_steps)?;
        if self.add_insolation && !(self.insolation_scale.is_finite() && self.insolation_scale > 0.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "insolation scale must be positive, got {}",
                self.insolation_scale
            )));
        }
        Ok(())
    }
}
