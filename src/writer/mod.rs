//! Metric delivery
//!
//! [`MetricWriter`] turns a remote-write batch into metric points and hands
//! them to the backend, either as line-protocol records over one pooled
//! connection per batch or point by point through a [`MetricSender`].

pub mod line_protocol;
pub mod sender;

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::{debug, warn};

use crate::connection_error::ConnectionError;
use crate::constants::health;
use crate::constants::line::{BUFFER_INITIAL, FLUSH_THRESHOLD};
use crate::constants::timeout::WRITE;
use crate::metric::{MetricPoint, MetricTransformer};
use crate::pool::{ConnectionPool, PooledConnection};
use crate::prompb::WriteRequest;

pub use line_protocol::{encode_line, encode_point, encode_record};
pub use sender::{DirectSender, MetricSender, SenderError, SenderOptions};

/// Errors that abort a batch
#[derive(Debug, Error)]
pub enum WriteError {
    /// No connection could be checked out (pool exhausted or dial failure)
    #[error("failed to acquire backend connection: {0}")]
    Acquire(#[source] ConnectionError),

    /// The connection failed mid-batch; earlier records may have been delivered
    #[error("write to backend failed after {delivered} points: {source}")]
    Write {
        delivered: usize,
        #[source]
        source: ConnectionError,
    },
}

impl WriteError {
    #[must_use]
    pub const fn is_pool_exhausted(&self) -> bool {
        matches!(self, Self::Acquire(e) if e.is_pool_exhausted())
    }

    /// Level to log this failure at, taken from the connection error
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        match self {
            Self::Acquire(e) | Self::Write { source: e, .. } => e.log_level(),
        }
    }
}

/// Where points go
#[derive(Debug, Clone)]
pub enum Delivery {
    /// Line protocol over pooled TCP connections
    Proxy(Arc<ConnectionPool>),
    /// One call per point on an external sender
    Sender(Arc<dyn MetricSender>),
}

/// Outcome of a successful `write`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteSummary {
    pub series: usize,
    /// Points accepted by the backend connection or queued by the sender
    pub points: usize,
    /// NaN samples and samples of unnamed series
    pub skipped_samples: usize,
    /// Points a sender rejected (managed-sender mode only)
    pub send_failures: usize,
}

/// Transforms batches and delivers them to the backend
#[derive(Debug, Clone)]
pub struct MetricWriter {
    transformer: MetricTransformer,
    delivery: Delivery,
    write_timeout: Duration,
}

impl MetricWriter {
    #[must_use]
    pub fn new(transformer: MetricTransformer, delivery: Delivery) -> Self {
        Self {
            transformer,
            delivery,
            write_timeout: WRITE,
        }
    }

    /// Bound each flush to the backend by `timeout`
    #[must_use]
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    #[must_use]
    pub const fn transformer(&self) -> &MetricTransformer {
        &self.transformer
    }

    #[must_use]
    pub const fn delivery(&self) -> &Delivery {
        &self.delivery
    }

    /// Transform and deliver every series in `request`
    pub async fn write(&self, request: &WriteRequest) -> Result<WriteSummary, WriteError> {
        let summary = match &self.delivery {
            Delivery::Proxy(pool) => self.write_pooled(pool, request).await?,
            Delivery::Sender(sender) => self.write_sender(sender.as_ref(), request).await,
        };
        debug!(
            "Wrote {} points from {} series ({} skipped, {} send failures)",
            summary.points, summary.series, summary.skipped_samples, summary.send_failures
        );
        Ok(summary)
    }

    async fn write_pooled(
        &self,
        pool: &ConnectionPool,
        request: &WriteRequest,
    ) -> Result<WriteSummary, WriteError> {
        let mut summary = WriteSummary {
            series: request.timeseries.len(),
            ..WriteSummary::default()
        };
        let mut conn = None;
        let mut buf = String::with_capacity(BUFFER_INITIAL);
        let mut pending = 0;

        for series in &request.timeseries {
            let points = self.transformer.transform(series);
            summary.skipped_samples += series.samples.len() - points.len();
            for point in &points {
                encode_point(point, &mut buf);
            }
            pending += points.len();

            if buf.len() >= FLUSH_THRESHOLD {
                self.flush_buffer(pool, &mut conn, &mut buf, summary.points).await?;
                summary.points += pending;
                pending = 0;
            }
        }

        if !buf.is_empty() {
            self.flush_buffer(pool, &mut conn, &mut buf, summary.points).await?;
            summary.points += pending;
        }

        if let Some(conn) = conn {
            pool.put_back(conn, false).await;
        }
        Ok(summary)
    }

    /// Write the buffered records, checking out the batch connection on first use
    ///
    /// On failure the connection is discarded and `conn` left empty.
    async fn flush_buffer(
        &self,
        pool: &ConnectionPool,
        conn: &mut Option<PooledConnection>,
        buf: &mut String,
        delivered: usize,
    ) -> Result<(), WriteError> {
        let mut active = match conn.take() {
            Some(active) => active,
            None => pool.get().await.map_err(WriteError::Acquire)?,
        };

        match active.write_all(buf.as_bytes(), self.write_timeout).await {
            Ok(()) => {
                buf.clear();
                *conn = Some(active);
                Ok(())
            }
            Err(source) => {
                warn!(
                    "Aborting batch on connection {} to {}: {}",
                    active.id(),
                    pool.backend(),
                    source
                );
                pool.put_back(active, true).await;
                Err(WriteError::Write { delivered, source })
            }
        }
    }

    async fn write_sender(
        &self,
        sender: &dyn MetricSender,
        request: &WriteRequest,
    ) -> WriteSummary {
        let mut summary = WriteSummary {
            series: request.timeseries.len(),
            ..WriteSummary::default()
        };

        for series in &request.timeseries {
            let points = self.transformer.transform(series);
            summary.skipped_samples += series.samples.len() - points.len();
            for point in &points {
                match send_point(sender, point).await {
                    Ok(()) => summary.points += 1,
                    Err(e) => {
                        warn!("Cannot send metric {}: {}", point.name, e);
                        summary.send_failures += 1;
                    }
                }
            }
        }
        summary
    }

    /// Deliver whatever a sender still holds
    ///
    /// Pooled writes are complete when `write` returns, so this only waits
    /// on a managed sender.
    pub async fn flush(&self) -> Result<(), SenderError> {
        match &self.delivery {
            Delivery::Proxy(_) => Ok(()),
            Delivery::Sender(sender) => sender.flush().await,
        }
    }

    /// Send a synthetic metric through the delivery path
    ///
    /// Returns `(200, "OK")` when it went through, `(503, <error>)` otherwise.
    pub async fn health_check(&self) -> (u16, String) {
        let point = health_point();
        let result = match &self.delivery {
            Delivery::Proxy(pool) => {
                let mut conn = None;
                let mut buf = encode_line(&point);
                match self.flush_buffer(pool, &mut conn, &mut buf, 0).await {
                    Ok(()) => {
                        if let Some(conn) = conn {
                            pool.put_back(conn, false).await;
                        }
                        Ok(())
                    }
                    Err(e) => Err(e.to_string()),
                }
            }
            Delivery::Sender(sender) => match send_point(sender.as_ref(), &point).await {
                Ok(()) => sender.flush().await.map_err(|e| e.to_string()),
                Err(e) => Err(e.to_string()),
            },
        };

        match result {
            Ok(()) => (200, "OK".to_string()),
            Err(message) => {
                warn!("Health check failed: {}", message);
                (503, message)
            }
        }
    }
}

async fn send_point(sender: &dyn MetricSender, point: &MetricPoint) -> Result<(), SenderError> {
    sender
        .send_metric(
            &point.name,
            point.value,
            point.timestamp,
            &point.source,
            &point.tags,
        )
        .await
}

fn health_point() -> MetricPoint {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs() as i64);
    MetricPoint {
        name: health::METRIC_NAME.to_string(),
        value: 1.0,
        timestamp: now,
        source: health::SOURCE.to_string(),
        tags: Default::default(),
    }
}
