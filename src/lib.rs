//! Prometheus remote-write storage adapter
//!
//! Decodes remote-write batches, turns each sample into a metric point and
//! forwards it either as line protocol over a bounded pool of TCP
//! connections to a proxy, or through a [`MetricSender`] for direct
//! ingestion.

pub mod args;
pub mod config;
pub mod connection_error;
pub mod constants;
pub mod logging;
pub mod metric;
pub mod pool;
pub mod prompb;
pub mod server;
pub mod writer;

use anyhow::Result;
use std::sync::Arc;
use tracing::info;

pub use config::{BackendMode, Config, load_config, parse_tags};
pub use connection_error::ConnectionError;
pub use metric::{MetricPoint, MetricTransformer, TransformConfig};
pub use pool::{ConnectionPool, PoolConfig, PoolStatus, TcpConnector};
pub use writer::{
    Delivery, DirectSender, MetricSender, MetricWriter, SenderError, SenderOptions, WriteError,
    WriteSummary,
};

/// Build the writer described by a validated configuration
pub fn build_writer(config: &Config) -> Result<MetricWriter> {
    let transformer = MetricTransformer::new(config.metrics.transform_config());

    let delivery = match config.backend_mode()? {
        BackendMode::Proxy { address } => {
            let pool_config = config.pool.pool_config();
            info!(
                "Forwarding to proxy {} (max idle {}, max overflow {})",
                address, pool_config.max_idle, pool_config.max_overflow
            );
            Delivery::Proxy(Arc::new(ConnectionPool::tcp(
                address,
                pool_config,
                config.pool.connect_timeout(),
            )))
        }
        BackendMode::Direct { url, token } => {
            let options = config.backend.sender_options();
            info!(
                "Forwarding to direct ingestion at {} (batch size {}, buffer size {})",
                url, options.batch_size, options.buffer_size
            );
            Delivery::Sender(Arc::new(DirectSender::with_options(&url, token, options)?))
        }
    };

    Ok(MetricWriter::new(transformer, delivery).with_write_timeout(config.pool.write_timeout()))
}
