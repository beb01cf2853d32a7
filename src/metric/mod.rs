//! Metric transformation
//!
//! Turns Prometheus time series into backend metric points: name prefixing,
//! path conversion, overrides, tag re-keying and value escaping.

mod name;
mod point;
mod transform;

pub use name::{escape_tag_value, sanitize_name};
pub use point::{MetricPoint, timestamp_seconds};
pub use transform::{MetricTransformer, TransformConfig};
