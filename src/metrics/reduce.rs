//! NaN-excluding reductions over arbitrary axes.

use super::ErrorMethod;
use crate::error::{ForecastError, Result};
use ndarray::{stack, ArrayD, ArrayViewD, Axis, Zip};

/// Sorted, de-duplicated axes; `None` means every axis.
fn resolve_axes(ndim: usize, axes: Option<&[usize]>) -> Result<Vec<usize>> {
    let mut resolved = match axes {
        None => return Ok((0..ndim).collect()),
        Some(axes) => axes.to_vec(),
    };
    resolved.sort_unstable();
    let before = resolved.len();
    resolved.dedup();
    if resolved.len() != before {
        return Err(ForecastError::InvalidParameter(format!(
            "repeated axis in {:?}",
            axes.unwrap_or_default()
        )));
    }
    if let Some(&axis) = resolved.last() {
        if axis >= ndim {
            return Err(ForecastError::InvalidParameter(format!(
                "axis {} out of range for {}-dimensional data",
                axis, ndim
            )));
        }
    }
    Ok(resolved)
}

/// Mean over `axes` ignoring NaN entries.
///
/// Positions whose every contributing value is NaN come out as NaN.
pub fn nan_mean(values: ArrayViewD<'_, f64>, axes: Option<&[usize]>) -> Result<ArrayD<f64>> {
    let axes = resolve_axes(values.ndim(), axes)?;
    let mut sums = values.mapv(|v| if v.is_nan() { 0.0 } else { v });
    let mut counts = values.mapv(|v| if v.is_nan() { 0.0 } else { 1.0 });
    // Highest axis first so the remaining indices stay valid.
    for &axis in axes.iter().rev() {
        sums = sums.sum_axis(Axis(axis));
        counts = counts.sum_axis(Axis(axis));
    }
    Ok(sums / counts)
}

/// Error between two equally shaped arrays, reduced over `axes`.
pub fn reduce_error(
    forecast: ArrayViewD<'_, f32>,
    valid: ArrayViewD<'_, f32>,
    method: ErrorMethod,
    axes: Option<&[usize]>,
) -> Result<ArrayD<f64>> {
    if forecast.shape() != valid.shape() {
        return Err(ForecastError::ShapeMismatch {
            expected: valid.shape().to_vec(),
            got: forecast.shape().to_vec(),
        });
    }
    let point = method.pointwise();
    let errors = Zip::from(&forecast)
        .and(&valid)
        .map_collect(|&f, &v| point(f64::from(v) - f64::from(f)));
    let mut mean = nan_mean(errors.view(), axes)?;
    mean.mapv_inplace(method.finish());
    Ok(mean)
}

/// Stack per-lead results along a new leading axis.
pub(crate) fn stack_leads(per_lead: Vec<ArrayD<f64>>) -> Result<ArrayD<f64>> {
    if per_lead.is_empty() {
        return Err(ForecastError::EmptyData);
    }
    let views: Vec<_> = per_lead.iter().map(|a| a.view()).collect();
    stack(Axis(0), &views).map_err(|_| {
        ForecastError::InvalidParameter(
            "per-lead errors differ in shape; include the time axis in the reduction".to_string(),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{array, Array2};

    #[test]
    fn nan_mean_skips_missing_values() {
        let values = array![[1.0, f64::NAN], [3.0, 4.0]].into_dyn();
        let all = nan_mean(values.view(), None).unwrap();
        assert_eq!(all.ndim(), 0);
        assert_relative_eq!(all[[]], 8.0 / 3.0);

        let rows = nan_mean(values.view(), Some(&[1])).unwrap();
        assert_eq!(rows, array![1.0, 3.5].into_dyn());
        let cols = nan_mean(values.view(), Some(&[0])).unwrap();
        assert_eq!(cols, array![2.0, 4.0].into_dyn());
    }

    #[test]
    fn all_nan_reduces_to_nan() {
        let values = array![[f64::NAN, f64::NAN], [1.0, 2.0]].into_dyn();
        let rows = nan_mean(values.view(), Some(&[1])).unwrap();
        assert!(rows[[0]].is_nan());
        assert_eq!(rows[[1]], 1.5);
    }

    #[test]
    fn empty_axis_reduces_to_nan() {
        let values = Array2::<f64>::zeros((0, 3)).into_dyn();
        let mean = nan_mean(values.view(), Some(&[0])).unwrap();
        assert_eq!(mean.shape(), &[3]);
        assert!(mean.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn rejects_bad_axes() {
        let values = array![[1.0, 2.0]].into_dyn();
        assert!(nan_mean(values.view(), Some(&[2])).is_err());
        assert!(nan_mean(values.view(), Some(&[0, 0])).is_err());
    }

    #[test]
    fn reduce_error_methods() {
        let forecast = array![1.0f32, 2.0, 3.0, f32::NAN].into_dyn();
        let valid = array![2.0f32, 2.0, 5.0, 1.0].into_dyn();
        let mse = reduce_error(forecast.view(), valid.view(), ErrorMethod::Mse, None).unwrap();
        assert_relative_eq!(mse[[]], 5.0 / 3.0);
        let mae = reduce_error(forecast.view(), valid.view(), ErrorMethod::Mae, None).unwrap();
        assert_relative_eq!(mae[[]], 1.0);
        let rmse = reduce_error(forecast.view(), valid.view(), ErrorMethod::Rmse, None).unwrap();
        assert_relative_eq!(rmse[[]], (5.0f64 / 3.0).sqrt());
    }

    #[test]
    fn reduce_error_requires_equal_shapes() {
        let a = array![1.0f32, 2.0].into_dyn();
        let b = array![1.0f32, 2.0, 3.0].into_dyn();
        assert!(matches!(
            reduce_error(a.view(), b.view(), ErrorMethod::Mse, None),
            Err(ForecastError::ShapeMismatch { .. })
        ));
    }
}
