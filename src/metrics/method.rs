//! Error reduction methods.

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Pointwise error measure reduced by a NaN-excluding mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorMethod {
    /// Mean squared error.
    #[default]
    Mse,
    /// Mean absolute error.
    Mae,
    /// Root mean squared error.
    Rmse,
}

fn squared(d: f64) -> f64 {
    d * d
}

fn absolute(d: f64) -> f64 {
    d.abs()
}

fn identity(m: f64) -> f64 {
    m
}

fn root(m: f64) -> f64 {
    m.sqrt()
}

impl ErrorMethod {
    /// Error contributed by one difference `valid - forecast`.
    pub fn pointwise(self) -> fn(f64) -> f64 {
        match self {
            Self::Mse | Self::Rmse => squared,
            Self::Mae => absolute,
        }
    }

    /// Transform applied to the mean of the pointwise errors.
    pub fn finish(self) -> fn(f64) -> f64 {
        match self {
            Self::Mse | Self::Mae => identity,
            Self::Rmse => root,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mse => "mse",
            Self::Mae => "mae",
            Self::Rmse => "rmse",
        }
    }
}

impl fmt::Display for ErrorMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorMethod {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "mse" => Ok(Self::Mse),
            "mae" => Ok(Self::Mae),
            "rmse" => Ok(Self::Rmse),
            _ => Err(ForecastError::UnknownMethod(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_method_names() {
        assert_eq!("mse".parse::<ErrorMethod>().unwrap(), ErrorMethod::Mse);
        assert_eq!("MAE".parse::<ErrorMethod>().unwrap(), ErrorMethod::Mae);
        assert_eq!("rmse".parse::<ErrorMethod>().unwrap(), ErrorMethod::Rmse);
        assert_eq!(
            "mape".parse::<ErrorMethod>().unwrap_err(),
            ForecastError::UnknownMethod("mape".to_string())
        );
        assert_eq!(ErrorMethod::Rmse.to_string(), "rmse");
    }

    #[test]
    fn pointwise_and_finish() {
        assert_eq!(ErrorMethod::Mse.pointwise()(-3.0), 9.0);
        assert_eq!(ErrorMethod::Mae.pointwise()(-3.0), 3.0);
        assert_eq!(ErrorMethod::Rmse.finish()(9.0), 3.0);
        assert_eq!(ErrorMethod::Mse.finish()(9.0), 9.0);
        assert!(ErrorMethod::Mae.pointwise()(f64::NAN).is_nan());
    }
}
