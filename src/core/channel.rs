//! Channel identifiers ("varlev" pairs) and their rollout roles.

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A physical variable at a vertical level, treated as one data field.
///
/// Channels display and parse as `"VARIABLE/LEVEL"`, e.g. `"HGT/500"` or
/// `"THICK/300-700"`. Surface fields may omit the level.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Channel {
    variable: String,
    level: Option<String>,
}

impl Channel {
    /// Create a channel from a variable name and level.
    pub fn new(variable: impl Into<String>, level: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            level: Some(level.into()),
        }
    }

    /// Create a single-level (surface) channel.
    pub fn surface(variable: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            level: None,
        }
    }

    pub fn variable(&self) -> &str {
        &self.variable
    }

    pub fn level(&self) -> Option<&str> {
        self.level.as_deref()
    }

    /// The `"VARIABLE/LEVEL"` label.
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.level {
            Some(level) => write!(f, "{}/{}", self.variable, level),
            None => write!(f, "{}", self.variable),
        }
    }
}

impl FromStr for Channel {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ForecastError::InvalidParameter(
                "channel label must not be empty".to_string(),
            ));
        }
        match s.split_once('/') {
            Some((variable, level)) if !variable.is_empty() && !level.is_empty() => {
                Ok(Self::new(variable, level))
            }
            Some(_) => Err(ForecastError::InvalidParameter(format!(
                "malformed channel label '{}'",
                s
            ))),
            None => Ok(Self::surface(s)),
        }
    }
}

impl TryFrom<String> for Channel {
    type Error = ForecastError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Channel> for String {
    fn from(channel: Channel) -> Self {
        channel.to_string()
    }
}

/// How a model input channel is supplied during a rollout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelRole {
    /// Produced by the model and fed back as the next step's input.
    Predicted,
    /// Not produced by the model; refreshed from observations every step.
    PassThrough,
}

/// Find the position of each requested channel in `available`.
pub(crate) fn channel_indices(available: &[Channel], requested: &[Channel]) -> Result<Vec<usize>> {
    requested
        .iter()
        .map(|c| {
            available
                .iter()
                .position(|a| a == c)
                .ok_or_else(|| ForecastError::UnknownChannel(c.label()))
        })
        .collect()
}
