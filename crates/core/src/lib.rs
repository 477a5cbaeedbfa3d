pub mod error;
pub mod source;
pub mod state;

pub use error::{MonitorError, Result};
pub use source::MetricSource;
pub use state::{MetricId, MetricKind, WorldSnapshot};
