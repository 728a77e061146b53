//! Core data structures: channels, sample stores, and trajectories.

mod channel;
mod store;
mod trajectory;
mod windows;

pub use channel::{Channel, ChannelRole};
pub(crate) use channel::channel_indices;
pub use store::SampleStore;
pub(crate) use store::validate_times;
pub use trajectory::{lead_times, Trajectory};
pub(crate) use trajectory::{check_time_span, time_span};
pub use windows::{SampleWindows, WindowStep};
