//! Latitude-weighted training loss.

use super::reduce::nan_mean;
use super::ErrorMethod;
use crate::error::{ForecastError, Result};
use ndarray::{Array1, ArrayD, ArrayViewD, IxDyn, Zip};
use serde::{Deserialize, Serialize};

/// Latitude weighting profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LatitudeWeighting {
    /// `cos(lat)`, proportional to grid-cell area.
    #[default]
    Cosine,
    /// `cos(lat) + 0.5 sin²(2 lat)`: the equator is reduced relative to the mid-latitudes.
    Midlatitude,
}

impl LatitudeWeighting {
    pub fn weight(self, lat_degrees: f64) -> f64 {
        let lat = lat_degrees.to_radians();
        match self {
            Self::Cosine => lat.cos(),
            Self::Midlatitude => lat.cos() + 0.5 * (2.0 * lat).sin().powi(2),
        }
    }
}

/// Error in which each grid point's difference is scaled by its latitude weight.
///
/// The latitude axis is the second-to-last axis of the data. Weights are
/// expanded to the full data shape by [`configure`](Self::configure), which
/// must run before [`evaluate`](Self::evaluate).
#[derive(Debug, Clone)]
pub struct LatitudeWeightedLoss {
    lat_weights: Array1<f64>,
    weighting: LatitudeWeighting,
    method: ErrorMethod,
    weights: Option<ArrayD<f64>>,
}

impl LatitudeWeightedLoss {
    pub fn new(
        lats: &Array1<f64>,
        weighting: LatitudeWeighting,
        method: ErrorMethod,
    ) -> Result<Self> {
        if lats.is_empty() {
            return Err(ForecastError::EmptyData);
        }
        if lats.iter().any(|l| !l.is_finite() || l.abs() > 90.0) {
            return Err(ForecastError::InvalidParameter(
                "latitudes must be finite and within [-90, 90]".to_string(),
            ));
        }
        Ok(Self {
            lat_weights: lats.mapv(|l| weighting.weight(l)),
            weighting,
            method,
            weights: None,
        })
    }

    pub fn weighting(&self) -> LatitudeWeighting {
        self.weighting
    }

    pub fn method(&self) -> ErrorMethod {
        self.method
    }

    pub fn is_configured(&self) -> bool {
        self.weights.is_some()
    }

    /// Expand the weights to `shape`.
    pub fn configure(&mut self, shape: &[usize]) -> Result<()> {
        let ndim = shape.len();
        if ndim < 2 {
            return Err(ForecastError::InvalidParameter(format!(
                "need at least (lat, lon) axes, got shape {:?}",
                shape
            )));
        }
        if shape[ndim - 2] != self.lat_weights.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: self.lat_weights.len(),
                got: shape[ndim - 2],
            });
        }
        let lat_weights = &self.lat_weights;
        self.weights = Some(ArrayD::from_shape_fn(IxDyn(shape), |idx| {
            lat_weights[idx[ndim - 2]]
        }));
        Ok(())
    }

    /// Weighted error between `predicted` and `actual`, reduced to a scalar.
    pub fn evaluate(
        &self,
        predicted: ArrayViewD<'_, f32>,
        actual: ArrayViewD<'_, f32>,
    ) -> Result<f64> {
        let weights = self.weights.as_ref().ok_or(ForecastError::NotConfigured)?;
        for shape in [predicted.shape(), actual.shape()] {
            if shape != weights.shape() {
                return Err(ForecastError::ShapeMismatch {
                    expected: weights.shape().to_vec(),
                    got: shape.to_vec(),
                });
            }
        }
        let point = self.method.pointwise();
        let errors = Zip::from(&predicted)
            .and(&actual)
            .and(weights)
            .map_collect(|&p, &a, &w| point(w * (f64::from(a) - f64::from(p))));
        let mean = nan_mean(errors.view(), None)?;
        Ok(self.method.finish()(mean.iter().next().copied().unwrap_or(f64::NAN)))
    }
}
