//! Train/test splitting and cleaning of windowed samples.

use crate::core::SampleWindows;
use crate::error::{ForecastError, Result};
use log::info;
use ndarray::{Array5, ArrayView5, Axis};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Magnitude at and above which values are treated as fill.
const LARGE_FILL_VALUE: f32 = 1.0e20;

/// How test samples are chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitMethod {
    /// The first `test_size` samples.
    First,
    /// The last `test_size` samples.
    Last,
    /// A uniformly random subset.
    #[default]
    Random,
}

impl FromStr for SplitMethod {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "first" => Ok(Self::First),
            "last" => Ok(Self::Last),
            "random" => Ok(Self::Random),
            _ => Err(ForecastError::InvalidParameter(
                "'method' must be 'first', 'last', or 'random'".to_string(),
            )),
        }
    }
}

/// Sorted train and test sample indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainTestSplit {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Split `0..n_samples` into train and test indices.
pub fn train_test_split<R: Rng + ?Sized>(
    n_samples: usize,
    test_size: usize,
    method: SplitMethod,
    rng: &mut R,
) -> Result<TrainTestSplit> {
    if test_size > n_samples {
        return Err(ForecastError::InvalidParameter(format!(
            "test size {} exceeds {} samples",
            test_size, n_samples
        )));
    }
    let test: Vec<usize> = match method {
        SplitMethod::First => (0..test_size).collect(),
        SplitMethod::Last => (n_samples - test_size..n_samples).collect(),
        SplitMethod::Random => {
            let mut picked = rand::seq::index::sample(rng, n_samples, test_size).into_vec();
            picked.sort_unstable();
            picked
        }
    };
    let mut is_test = vec![false; n_samples];
    for &i in &test {
        is_test[i] = true;
    }
    let train = (0..n_samples).filter(|&i| !is_test[i]).collect();
    Ok(TrainTestSplit { train, test })
}

fn select_windows(windows: &SampleWindows, idx: &[usize]) -> Result<SampleWindows> {
    SampleWindows::new(
        idx.iter().map(|&i| windows.samples()[i]).collect(),
        windows.channels().to_vec(),
        windows.lat().clone(),
        windows.lon().clone(),
        windows.predictors().select(Axis(0), idx),
        windows.targets().select(Axis(0), idx),
    )
}

/// Split windowed samples into `(train, test)`.
pub fn split_windows<R: Rng + ?Sized>(
    windows: &SampleWindows,
    test_size: usize,
    method: SplitMethod,
    rng: &mut R,
) -> Result<(SampleWindows, SampleWindows)> {
    let split = train_test_split(windows.len(), test_size, method, rng)?;
    Ok((
        select_windows(windows, &split.train)?,
        select_windows(windows, &split.test)?,
    ))
}

fn clean_fill(data: ArrayView5<'_, f32>, large_fill_value: bool) -> Array5<f32> {
    if large_fill_value {
        data.mapv(|v| if v.abs() >= LARGE_FILL_VALUE { f32::NAN } else { v })
    } else {
        data.to_owned()
    }
}

fn nan_fraction(sample: ArrayView5<'_, f32>, s: usize) -> f64 {
    let sample = sample.index_axis(Axis(0), s);
    if sample.is_empty() {
        return 0.0;
    }
    sample.iter().filter(|v| v.is_nan()).count() as f64 / sample.len() as f64
}

/// Drop samples containing missing values.
///
/// Without a threshold any NaN in a sample's predictors or targets removes
/// it; with one, samples whose NaN fraction in either array is at least
/// `threshold` are removed. With `large_fill_value`, values of magnitude
/// 1e20 or more count as missing and are replaced by NaN in the result.
pub fn delete_nan_samples(
    windows: &SampleWindows,
    threshold: Option<f64>,
    large_fill_value: bool,
) -> Result<SampleWindows> {
    if let Some(t) = threshold {
        if !(0.0..=1.0).contains(&t) {
            return Err(ForecastError::InvalidParameter(
                "'threshold' must be between 0 and 1".to_string(),
            ));
        }
    }
    let predictors = clean_fill(windows.predictors(), large_fill_value);
    let targets = clean_fill(windows.targets(), large_fill_value);
    let is_bad = |frac: f64| match threshold {
        None => frac > 0.0,
        Some(t) => frac >= t,
    };
    let keep: Vec<usize> = (0..windows.len())
        .filter(|&s| {
            !is_bad(nan_fraction(predictors.view(), s)) && !is_bad(nan_fraction(targets.view(), s))
        })
        .collect();
    let removed = windows.len() - keep.len();
    if removed > 0 {
        info!("removed {} of {} samples with missing values", removed, windows.len());
    }
    SampleWindows::new(
        keep.iter().map(|&i| windows.samples()[i]).collect(),
        windows.channels().to_vec(),
        windows.lat().clone(),
        windows.lon().clone(),
        predictors.select(Axis(0), &keep),
        targets.select(Axis(0), &keep),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Channel;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use ndarray::array;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn first_and_last_splits() {
        let mut rng = StdRng::seed_from_u64(42);
        let split = train_test_split(5, 2, SplitMethod::First, &mut rng).unwrap();
        assert_eq!(split.test, vec![0, 1]);
        assert_eq!(split.train, vec![2, 3, 4]);

        let split = train_test_split(5, 2, SplitMethod::Last, &mut rng).unwrap();
        assert_eq!(split.test, vec![3, 4]);
        assert_eq!(split.train, vec![0, 1, 2]);
    }

    #[test]
    fn random_split_partitions_indices() {
        let mut rng = StdRng::seed_from_u64(7);
        let split = train_test_split(20, 6, SplitMethod::Random, &mut rng).unwrap();
        assert_eq!(split.test.len(), 6);
        assert_eq!(split.train.len(), 14);
        assert!(split.test.windows(2).all(|w| w[0] < w[1]));
        let mut all: Vec<_> = split.train.iter().chain(&split.test).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..20).collect::<Vec<_>>());

        let mut again = StdRng::seed_from_u64(7);
        assert_eq!(
            train_test_split(20, 6, SplitMethod::Random, &mut again).unwrap(),
            split
        );
    }

    #[test]
    fn rejects_oversized_test_set_and_bad_method() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(train_test_split(3, 4, SplitMethod::First, &mut rng).is_err());
        assert!("middle".parse::<SplitMethod>().is_err());
        assert_eq!("LAST".parse::<SplitMethod>().unwrap(), SplitMethod::Last);
    }

    fn t(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap() + Duration::hours(6 * n)
    }

    fn windows_with(values: Vec<[f32; 2]>) -> SampleWindows {
        let n = values.len();
        let flat: Vec<f32> = values.iter().flatten().copied().collect();
        let predictors = Array5::from_shape_vec((n, 1, 1, 1, 2), flat).unwrap();
        let targets = Array5::zeros((n, 1, 1, 1, 2));
        SampleWindows::new(
            (0..n as i64).map(t).collect(),
            vec![Channel::new("HGT", "500")],
            array![45.0],
            array![0.0, 90.0],
            predictors,
            targets,
        )
        .unwrap()
    }

    #[test]
    fn deletes_samples_with_any_nan() {
        let windows = windows_with(vec![[1.0, 2.0], [f32::NAN, 2.0], [3.0, 4.0]]);
        let cleaned = delete_nan_samples(&windows, None, false).unwrap();
        assert_eq!(cleaned.samples(), &[t(0), t(2)]);
        assert_eq!(cleaned.predictors()[[1, 0, 0, 0, 0]], 3.0);
    }

    #[test]
    fn threshold_and_fill_values() {
        let windows = windows_with(vec![[f32::NAN, f32::NAN], [f32::NAN, 2.0], [1.0e21, 4.0]]);
        let cleaned = delete_nan_samples(&windows, Some(0.75), false).unwrap();
        assert_eq!(cleaned.samples(), &[t(1), t(2)]);

        let cleaned = delete_nan_samples(&windows, Some(0.5), true).unwrap();
        assert!(cleaned.is_empty());

        let cleaned = delete_nan_samples(&windows, Some(0.75), true).unwrap();
        assert!(cleaned.predictors()[[1, 0, 0, 0, 0]].is_nan());

        assert!(delete_nan_samples(&windows, Some(1.5), false).is_err());
    }

    #[test]
    fn splits_windows() {
        let windows = windows_with(vec![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]]);
        let mut rng = StdRng::seed_from_u64(1);
        let (train, test) = split_windows(&windows, 1, SplitMethod::Last, &mut rng).unwrap();
        assert_eq!(train.samples(), &[t(0), t(1)]);
        assert_eq!(test.samples(), &[t(2)]);
        assert_eq!(test.predictors()[[0, 0, 0, 0, 1]], 6.0);
    }
}
