//! Configuration type definitions

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use super::defaults;
use crate::metric::TransformConfig;
use crate::constants::timeout::DIRECT_SEND;
use crate::pool::PoolConfig;
use crate::writer::SenderOptions;

/// Main adapter configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Config {
    /// Address to accept remote writes on, `[host:]port`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listen: Option<String>,
    /// Where metrics are delivered
    #[serde(default)]
    pub backend: BackendConfig,
    /// Naming and tagging of forwarded metrics
    #[serde(default)]
    pub metrics: MetricsConfig,
    /// Connection pool sizing for proxy mode
    #[serde(default)]
    pub pool: PoolSettings,
}

/// Backend selection: a proxy host, or a direct ingestion URL with token
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct BackendConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,
    #[serde(default = "defaults::proxy_port")]
    pub proxy_port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Records per direct ingestion request
    #[serde(default = "defaults::batch_size")]
    pub batch_size: usize,
    /// Records queued for direct ingestion before points are dropped
    #[serde(default = "defaults::buffer_size")]
    pub buffer_size: usize,
    #[serde(default = "defaults::flush_interval_secs")]
    pub flush_interval_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            proxy: None,
            proxy_port: defaults::proxy_port(),
            url: None,
            token: None,
            batch_size: defaults::batch_size(),
            buffer_size: defaults::buffer_size(),
            flush_interval_secs: defaults::flush_interval_secs(),
        }
    }
}

impl BackendConfig {
    #[must_use]
    pub const fn sender_options(&self) -> SenderOptions {
        SenderOptions {
            batch_size: self.batch_size,
            buffer_size: self.buffer_size,
            flush_interval: Duration::from_secs(self.flush_interval_secs),
            timeout: DIRECT_SEND,
        }
    }
}

/// Resolved delivery mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendMode {
    /// Line protocol to `host:port`
    Proxy { address: String },
    /// HTTP ingestion with an API token
    Direct { url: String, token: String },
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MetricsConfig {
    #[serde(default)]
    pub prefix: String,
    #[serde(default = "defaults::convert_paths")]
    pub convert_paths: bool,
    #[serde(default = "defaults::convert_paths")]
    pub convert_tag_paths: bool,
    /// Static tags added to every point
    #[serde(default)]
    pub tags: HashMap<String, String>,
    /// Metric name replacements, applied instead of prefix and conversion
    #[serde(default)]
    pub name_overrides: HashMap<String, String>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            convert_paths: defaults::convert_paths(),
            convert_tag_paths: defaults::convert_paths(),
            tags: HashMap::new(),
            name_overrides: HashMap::new(),
        }
    }
}

impl MetricsConfig {
    #[must_use]
    pub fn transform_config(&self) -> TransformConfig {
        TransformConfig {
            prefix: self.prefix.clone(),
            convert_paths: self.convert_paths,
            convert_tag_paths: self.convert_tag_paths,
            tags: self.tags.clone(),
            name_overrides: self.name_overrides.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct PoolSettings {
    #[serde(default = "defaults::max_idle")]
    pub max_idle: usize,
    #[serde(default = "defaults::max_overflow")]
    pub max_overflow: usize,
    #[serde(default = "defaults::idle_wait_ms")]
    pub idle_wait_ms: u64,
    #[serde(default = "defaults::create_wait_ms")]
    pub create_wait_ms: u64,
    #[serde(default = "defaults::write_deadline_secs")]
    pub write_deadline_secs: u64,
    #[serde(default = "defaults::write_timeout_secs")]
    pub write_timeout_secs: u64,
    #[serde(default = "defaults::connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_idle: defaults::max_idle(),
            max_overflow: defaults::max_overflow(),
            idle_wait_ms: defaults::idle_wait_ms(),
            create_wait_ms: defaults::create_wait_ms(),
            write_deadline_secs: defaults::write_deadline_secs(),
            write_timeout_secs: defaults::write_timeout_secs(),
            connect_timeout_secs: defaults::connect_timeout_secs(),
        }
    }
}

impl PoolSettings {
    #[must_use]
    pub const fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            max_idle: self.max_idle,
            max_overflow: self.max_overflow,
            idle_wait: Duration::from_millis(self.idle_wait_ms),
            create_wait: Duration::from_millis(self.create_wait_ms),
            write_deadline: Duration::from_secs(self.write_deadline_secs),
        }
    }

    #[must_use]
    pub const fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout_secs)
    }

    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}
