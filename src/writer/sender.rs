//! Managed-sender delivery
//!
//! A [`MetricSender`] takes one point at a time and owns whatever buffering
//! or retrying it does. The writer only logs its failures.
//!
//! [`DirectSender`] queues encoded records on a bounded channel. A background
//! flusher posts them in batches, either when a batch fills or when the
//! flush interval elapses.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use std::collections::HashMap;
use std::fmt::Debug;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, warn};

use super::line_protocol::encode_record;
use crate::constants::sender::{DEFAULT_BATCH_SIZE, DEFAULT_BUFFER_SIZE, DEFAULT_FLUSH_INTERVAL};
use crate::constants::timeout::DIRECT_SEND;

/// Errors reported by a sender
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SenderError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("ingestion endpoint returned status {status}")]
    Status { status: u16 },

    /// The queue ahead of the flusher is full; the point was dropped
    #[error("send buffer full ({capacity} points queued)")]
    BufferFull { capacity: usize },

    #[error("sender is shut down")]
    Closed,

    #[error("{0}")]
    Other(String),
}

/// Capability to submit individual metric points
#[async_trait]
pub trait MetricSender: Send + Sync + Debug {
    async fn send_metric(
        &self,
        name: &str,
        value: f64,
        timestamp: i64,
        source: &str,
        tags: &HashMap<String, String>,
    ) -> Result<(), SenderError>;

    /// Deliver everything accepted so far
    async fn flush(&self) -> Result<(), SenderError> {
        Ok(())
    }
}

/// Batching knobs for [`DirectSender`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SenderOptions {
    pub batch_size: usize,
    pub buffer_size: usize,
    pub flush_interval: Duration,
    /// Per-request HTTP timeout
    pub timeout: Duration,
}

impl Default for SenderOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            buffer_size: DEFAULT_BUFFER_SIZE,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            timeout: DIRECT_SEND,
        }
    }
}

#[derive(Debug)]
enum Command {
    Record(String),
    Flush(oneshot::Sender<Result<(), SenderError>>),
}

/// Direct ingestion over HTTP with an API token
///
/// Records go to `<url>/report?f=wavefront`, newline-joined, up to
/// `batch_size` per request. `send_metric` returns once the point is
/// queued. Must be created inside a tokio runtime.
#[derive(Debug, Clone)]
pub struct DirectSender {
    endpoint: String,
    buffer_size: usize,
    queue: mpsc::Sender<Command>,
}

impl DirectSender {
    pub fn new(url: &str, token: impl Into<String>) -> Result<Self, SenderError> {
        Self::with_options(url, token, SenderOptions::default())
    }

    pub fn with_options(
        url: &str,
        token: impl Into<String>,
        options: SenderOptions,
    ) -> Result<Self, SenderError> {
        let client = reqwest::Client::builder()
            .timeout(options.timeout)
            .build()?;
        let endpoint = format!("{}/report?f=wavefront", url.trim_end_matches('/'));
        let buffer_size = options.buffer_size.max(1);
        let (queue, commands) = mpsc::channel(buffer_size);

        let flusher = Flusher {
            client,
            endpoint: endpoint.clone(),
            token: token.into(),
            batch_size: options.batch_size.max(1),
            batch: String::new(),
            pending: 0,
        };
        let flush_interval = options.flush_interval.max(Duration::from_millis(1));
        tokio::spawn(flusher.run(commands, flush_interval));

        Ok(Self {
            endpoint,
            buffer_size,
            queue,
        })
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl MetricSender for DirectSender {
    async fn send_metric(
        &self,
        name: &str,
        value: f64,
        timestamp: i64,
        source: &str,
        tags: &HashMap<String, String>,
    ) -> Result<(), SenderError> {
        let mut line = String::with_capacity(128);
        encode_record(&mut line, name, value, timestamp, source, tags);

        self.queue
            .try_send(Command::Record(line))
            .map_err(|e| match e {
                TrySendError::Full(_) => SenderError::BufferFull {
                    capacity: self.buffer_size,
                },
                TrySendError::Closed(_) => SenderError::Closed,
            })
    }

    /// Post the partial batch and everything queued before this call
    async fn flush(&self) -> Result<(), SenderError> {
        let (reply, done) = oneshot::channel();
        self.queue
            .send(Command::Flush(reply))
            .await
            .map_err(|_| SenderError::Closed)?;
        done.await.map_err(|_| SenderError::Closed)?
    }
}

/// Background task owning the HTTP client and the batch being built
struct Flusher {
    client: reqwest::Client,
    endpoint: String,
    token: String,
    batch_size: usize,
    batch: String,
    pending: usize,
}

impl Flusher {
    async fn run(mut self, mut commands: mpsc::Receiver<Command>, flush_interval: Duration) {
        let mut ticker = interval_at(Instant::now() + flush_interval, flush_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Record(line)) => {
                        self.batch.push_str(&line);
                        self.pending += 1;
                        if self.pending >= self.batch_size {
                            self.post_or_log().await;
                        }
                    }
                    Some(Command::Flush(reply)) => {
                        let _ = reply.send(self.post().await);
                    }
                    None => {
                        self.post_or_log().await;
                        debug!("Direct sender for {} stopped", self.endpoint);
                        return;
                    }
                },
                _ = ticker.tick() => self.post_or_log().await,
            }
        }
    }

    /// Post the current batch; it is dropped whether or not the post succeeds
    async fn post(&mut self) -> Result<(), SenderError> {
        if self.pending == 0 {
            return Ok(());
        }
        let body = std::mem::take(&mut self.batch);
        let points = std::mem::take(&mut self.pending);

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SenderError::Status {
                status: status.as_u16(),
            });
        }
        debug!("Posted {} points to {}", points, self.endpoint);
        Ok(())
    }

    async fn post_or_log(&mut self) {
        let points = self.pending;
        if let Err(e) = self.post().await {
            warn!("Dropped {} points for {}: {}", points, self.endpoint, e);
        }
    }
}
