//! Line protocol encoding
//!
//! `<name> <value> <timestamp> source="<source>"[ <key>="<value>"]*\n`

use std::collections::HashMap;
use std::fmt::Write;

use crate::constants::line::VALUE_PRECISION;
use crate::metric::{MetricPoint, escape_tag_value};

/// Append one newline-terminated record for `point` to `buf`
///
/// Name, source and tag keys are expected to be sanitized already (the
/// transformer does it); tag values are escaped here. Tag order follows the
/// map and is not stable.
pub fn encode_point(point: &MetricPoint, buf: &mut String) {
    encode_record(
        buf,
        &point.name,
        point.value,
        point.timestamp,
        &point.source,
        &point.tags,
    );
}

/// Append one record built from its parts
pub fn encode_record(
    buf: &mut String,
    name: &str,
    value: f64,
    timestamp: i64,
    source: &str,
    tags: &HashMap<String, String>,
) {
    // Writing into a String cannot fail
    let _ = write!(buf, "{} ", name);
    write_value(buf, value);
    let _ = write!(buf, " {} source=\"{}\"", timestamp, source);
    for (key, value) in tags {
        let _ = write!(buf, " {}=\"{}\"", key, escape_tag_value(value));
    }
    buf.push('\n');
}

/// Fixed six decimals; infinities as `+Inf` / `-Inf`
fn write_value(buf: &mut String, value: f64) {
    if value.is_infinite() {
        buf.push_str(if value > 0.0 { "+Inf" } else { "-Inf" });
    } else {
        let _ = write!(buf, "{:.prec$}", value, prec = VALUE_PRECISION);
    }
}

/// Encode a single point into a fresh string
#[must_use]
pub fn encode_line(point: &MetricPoint) -> String {
    let mut buf = String::with_capacity(64 + point.name.len() + point.tags.len() * 24);
    encode_point(point, &mut buf);
    buf
}
