//! Command-line argument parsing
//!
//! Every flag can also come from the environment. Flags that are given
//! override the corresponding config file values.

use anyhow::Result;
use clap::Parser;

use crate::config::{Config, parse_tags};

/// Prometheus remote-write storage adapter
#[derive(Parser, Debug, Clone, Default)]
#[command(version, about)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, env = "ADAPTER_CONFIG")]
    pub config: Option<String>,

    /// Port/address to listen on, `[address:]port`
    #[arg(short, long, env)]
    pub listen: Option<String>,

    /// Host address of the proxy
    #[arg(long, env)]
    pub proxy: Option<String>,

    /// Proxy port
    #[arg(long, env)]
    pub proxy_port: Option<u16>,

    /// URL for direct ingestion
    #[arg(long, env)]
    pub url: Option<String>,

    /// API token for direct ingestion
    #[arg(long, env, hide_env_values = true)]
    pub token: Option<String>,

    /// Prefix for metric names
    #[arg(long, env)]
    pub prefix: Option<String>,

    /// Tags added to each point, "tag1=value1,tag2=value2..."
    #[arg(long, env)]
    pub tags: Option<String>,

    /// Turn `_` into `.` in metric names
    #[arg(long, env)]
    pub convert_paths: Option<bool>,

    /// Turn `_` into `.` in tag keys
    #[arg(long, env)]
    pub convert_tag_paths: Option<bool>,

    /// Records per direct ingestion request
    #[arg(long, env)]
    pub batch_size: Option<usize>,

    /// Records queued for direct ingestion before points are dropped
    #[arg(long, env)]
    pub buffer_size: Option<usize>,

    /// Seconds between posts of a partial direct ingestion batch
    #[arg(long, env)]
    pub flush_interval: Option<u64>,

    /// Idle connections kept per backend
    #[arg(long, env)]
    pub max_idle: Option<usize>,

    /// Extra connections allowed under load
    #[arg(long, env)]
    pub max_overflow: Option<usize>,

    /// Print detailed debug messages
    #[arg(short, long, env)]
    pub debug: bool,
}

impl Args {
    /// Overlay the flags that were given onto `config`
    pub fn apply(&self, config: &mut Config) -> Result<()> {
        if let Some(listen) = &self.listen {
            config.listen = Some(listen.clone());
        }
        if let Some(proxy) = &self.proxy {
            config.backend.proxy = Some(proxy.clone());
        }
        if let Some(port) = self.proxy_port {
            config.backend.proxy_port = port;
        }
        if let Some(url) = &self.url {
            config.backend.url = Some(url.clone());
        }
        if let Some(token) = &self.token {
            config.backend.token = Some(token.clone());
        }
        if let Some(batch_size) = self.batch_size {
            config.backend.batch_size = batch_size;
        }
        if let Some(buffer_size) = self.buffer_size {
            config.backend.buffer_size = buffer_size;
        }
        if let Some(secs) = self.flush_interval {
            config.backend.flush_interval_secs = secs;
        }
        if let Some(prefix) = &self.prefix {
            config.metrics.prefix = prefix.clone();
        }
        if let Some(tags) = &self.tags {
            config.metrics.tags.extend(parse_tags(tags)?);
        }
        if let Some(convert) = self.convert_paths {
            config.metrics.convert_paths = convert;
        }
        if let Some(convert) = self.convert_tag_paths {
            config.metrics.convert_tag_paths = convert;
        }
        if let Some(max_idle) = self.max_idle {
            config.pool.max_idle = max_idle;
        }
        if let Some(max_overflow) = self.max_overflow {
            config.pool.max_overflow = max_overflow;
        }
        Ok(())
    }

    /// Config file contents (if any) with the flags applied
    pub fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => crate::config::load_config(path)?,
            None => Config::default(),
        };
        self.apply(&mut config)?;
        Ok(config)
    }
}
