//! Recursive multi-step forecasting with a one-step sequence predictor.

mod config;
mod engine;
mod window;

pub use config::{MissingDataPolicy, RolloutConfig};
pub use engine::{ChannelPlan, RolloutEngine};
pub use window::SlidingWindow;
