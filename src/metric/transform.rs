//! Time series to metric point transformation
//!
//! Everything here is a pure function of one series plus the static
//! [`TransformConfig`]; nothing is shared between calls.

use std::borrow::Cow;
use std::collections::HashMap;
use tracing::debug;

use super::name::{escape_tag_value, sanitize_name};
use super::point::{MetricPoint, timestamp_seconds};
use crate::constants::labels::{INSTANCE, NAME};
use crate::prompb::{Label, TimeSeries};

/// Static settings applied to every series
#[derive(Debug, Clone, PartialEq)]
pub struct TransformConfig {
    /// Prepended to metric names as `<prefix>_`
    pub prefix: String,
    /// Turn `_` into `.` in metric names
    pub convert_paths: bool,
    /// Turn `_` into `.` in tag keys
    pub convert_tag_paths: bool,
    /// Added to every point, winning over series labels
    pub tags: HashMap<String, String>,
    /// Exact metric name to final name; bypasses prefix and conversion
    pub name_overrides: HashMap<String, String>,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            convert_paths: true,
            convert_tag_paths: true,
            tags: HashMap::new(),
            name_overrides: HashMap::new(),
        }
    }
}

/// Converts decoded time series into metric points
#[derive(Debug, Clone, Default)]
pub struct MetricTransformer {
    config: TransformConfig,
}

impl MetricTransformer {
    #[must_use]
    pub fn new(config: TransformConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub const fn config(&self) -> &TransformConfig {
        &self.config
    }

    /// Final metric name for a raw `__name__` value
    #[must_use]
    pub fn build_metric_name(&self, raw: &str) -> String {
        if let Some(name) = self.config.name_overrides.get(raw)
            && !name.is_empty()
        {
            return name.clone();
        }

        let name = if self.config.prefix.is_empty() {
            Cow::Borrowed(raw)
        } else {
            Cow::Owned(format!("{}_{}", self.config.prefix, raw))
        };
        sanitize_name(&name, self.config.convert_paths).into_owned()
    }

    /// Final tag key for a raw label name
    #[must_use]
    pub fn build_tag_name<'a>(&self, raw: &'a str) -> Cow<'a, str> {
        if raw == NAME {
            return Cow::Borrowed(raw);
        }
        sanitize_name(raw, self.config.convert_tag_paths)
    }

    /// Split labels into the point source and its tag map
    ///
    /// Empty-valued labels are dropped, `instance` becomes the source and the
    /// configured tags are merged in last so they win on collisions.
    #[must_use]
    pub fn build_tags(&self, labels: &[Label]) -> (String, HashMap<String, String>) {
        let mut source = "";
        let mut tags = HashMap::with_capacity(labels.len() + self.config.tags.len());

        for label in labels {
            if label.value.is_empty() || label.name == NAME {
                continue;
            }
            if label.name == INSTANCE {
                source = label.value.as_str();
                continue;
            }
            tags.insert(
                self.build_tag_name(&label.name).into_owned(),
                label.value.clone(),
            );
        }

        for (key, value) in &self.config.tags {
            tags.insert(self.build_tag_name(key).into_owned(), value.clone());
        }

        (escape_tag_value(source).into_owned(), tags)
    }

    /// Transform one series into a point per non-NaN sample
    #[must_use]
    pub fn transform(&self, series: &TimeSeries) -> Vec<MetricPoint> {
        let Some(raw_name) = series.label(NAME).filter(|name| !name.is_empty()) else {
            debug!(
                "Dropping series without {} ({} labels)",
                NAME,
                series.labels.len()
            );
            return Vec::new();
        };

        let name = self.build_metric_name(raw_name);
        let (source, tags) = self.build_tags(&series.labels);

        series
            .samples
            .iter()
            // Prometheus sends NaN for missing data
            .filter(|sample| !sample.value.is_nan())
            .map(|sample| MetricPoint {
                name: name.clone(),
                value: sample.value,
                timestamp: timestamp_seconds(sample.timestamp),
                source: source.clone(),
                tags: tags.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompb::Sample;

    fn transformer(prefix: &str) -> MetricTransformer {
        MetricTransformer::new(TransformConfig {
            prefix: prefix.to_string(),
            ..TransformConfig::default()
        })
    }

    #[test]
    fn test_prefix_and_path_conversion() {
        let t = transformer("prom");
        assert_eq!(
            t.build_metric_name("cpu_utilization_percent"),
            "prom.cpu.utilization.percent"
        );
    }

    #[test]
    fn test_no_prefix() {
        let t = transformer("");
        assert_eq!(t.build_metric_name("node_load1"), "node.load1");
    }

    #[test]
    fn test_path_conversion_disabled_keeps_underscores() {
        let t = MetricTransformer::new(TransformConfig {
            prefix: "prom".to_string(),
            convert_paths: false,
            ..TransformConfig::default()
        });
        assert_eq!(
            t.build_metric_name("http requests_total"),
            "prom_http-requests_total"
        );
    }

    #[test]
    fn test_override_bypasses_prefix_and_conversion() {
        let t = MetricTransformer::new(TransformConfig {
            prefix: "prom".to_string(),
            name_overrides: HashMap::from([(
                "status_request_per_second".to_string(),
                "status.request_per_second".to_string(),
            )]),
            ..TransformConfig::default()
        });
        assert_eq!(
            t.build_metric_name("status_request_per_second"),
            "status.request_per_second"
        );
        assert_eq!(t.build_metric_name("other_metric"), "prom.other.metric");
    }

    #[test]
    fn test_empty_override_is_ignored() {
        let t = MetricTransformer::new(TransformConfig {
            name_overrides: HashMap::from([("up".to_string(), String::new())]),
            ..TransformConfig::default()
        });
        assert_eq!(t.build_metric_name("up"), "up");
    }

    #[test]
    fn test_tag_name_rules() {
        let t = transformer("");
        assert_eq!(t.build_tag_name("__name__"), "__name__");
        assert_eq!(t.build_tag_name("job_name"), "job.name");

        let keep = MetricTransformer::new(TransformConfig {
            convert_tag_paths: false,
            ..TransformConfig::default()
        });
        assert_eq!(keep.build_tag_name("job_name"), "job_name");
    }

    #[test]
    fn test_build_tags_extracts_source_and_drops_empty() {
        let t = MetricTransformer::new(TransformConfig {
            tags: HashMap::from([
                ("env".to_string(), "prod".to_string()),
                ("cpu".to_string(), "override".to_string()),
            ]),
            ..TransformConfig::default()
        });
        let labels = vec![
            Label::new("__name__", "cpu_seconds"),
            Label::new("instance", "host\"1*"),
            Label::new("cpu", "1"),
            Label::new("empty", ""),
        ];

        let (source, tags) = t.build_tags(&labels);
        assert_eq!(source, "host\\\"1-");
        assert_eq!(tags.len(), 2);
        assert_eq!(tags["env"], "prod");
        assert_eq!(tags["cpu"], "override");
        assert!(!tags.contains_key("empty"));
        assert!(!tags.contains_key("instance"));
    }

    #[test]
    fn test_missing_instance_gives_empty_source() {
        let t = transformer("");
        let (source, tags) = t.build_tags(&[Label::new("job", "node")]);
        assert_eq!(source, "");
        assert_eq!(tags["job"], "node");
    }

    #[test]
    fn test_transform_skips_nan_samples() {
        let t = transformer("prom");
        let series = TimeSeries::new(
            &[("__name__", "up"), ("instance", "localhost")],
            vec![
                Sample::new(1.0, 1_000),
                Sample::new(f64::NAN, 2_000),
                Sample::new(0.0, 3_500),
            ],
        );

        let points = t.transform(&series);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].name, "prom.up");
        assert_eq!(points[0].timestamp, 1);
        assert_eq!(points[1].value, 0.0);
        assert_eq!(points[1].timestamp, 4);
        assert!(points.iter().all(|p| p.source == "localhost"));
    }

    #[test]
    fn test_transform_drops_series_without_name() {
        let t = transformer("prom");
        let series = TimeSeries::new(&[("job", "node")], vec![Sample::new(1.0, 1_000)]);
        assert!(t.transform(&series).is_empty());
    }
}
