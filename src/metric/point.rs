//! Deliverable metric points

use std::collections::HashMap;

/// One sample after transformation, ready for encoding or a sender
#[derive(Debug, Clone, PartialEq)]
pub struct MetricPoint {
    pub name: String,
    pub value: f64,
    /// Seconds since the Unix epoch
    pub timestamp: i64,
    pub source: String,
    pub tags: HashMap<String, String>,
}

/// Convert a millisecond timestamp to seconds, rounding up
///
/// # Examples
/// ```
/// use prom_storage_adapter::metric::timestamp_seconds;
///
/// assert_eq!(timestamp_seconds(1_086_062_400_000), 1_086_062_400);
/// assert_eq!(timestamp_seconds(1_086_062_400_001), 1_086_062_401);
/// ```
#[must_use]
pub const fn timestamp_seconds(millis: i64) -> i64 {
    millis.saturating_add(999).div_euclid(1000)
}
