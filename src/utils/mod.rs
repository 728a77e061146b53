//! Dataset utilities.

pub mod split;

pub use split::{delete_nan_samples, split_windows, train_test_split, SplitMethod, TrainTestSplit};
