//! Connections checked out of the pool

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::sync::OwnedSemaphorePermit;
use tokio::time::{Instant, timeout_at};

use super::connector::BoxedStream;
use crate::connection_error::ConnectionError;

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a pooled connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// A live backend stream plus the creation permit it occupies
///
/// Dropping the connection closes the stream and frees its permit, so a
/// connection lost on an error path never leaks pool capacity.
#[derive(Debug)]
pub struct PooledConnection {
    id: ConnectionId,
    backend: Arc<str>,
    stream: BoxedStream,
    deadline: Instant,
    _permit: OwnedSemaphorePermit,
}

impl PooledConnection {
    pub(crate) fn new(
        backend: Arc<str>,
        stream: BoxedStream,
        permit: OwnedSemaphorePermit,
        write_deadline: Duration,
    ) -> Self {
        Self {
            id: ConnectionId::next(),
            backend,
            stream,
            deadline: Instant::now() + write_deadline,
            _permit: permit,
        }
    }

    #[must_use]
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    #[must_use]
    pub fn backend(&self) -> &str {
        &self.backend
    }

    /// Instant after which writes on this checkout fail
    #[must_use]
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Reset the write deadline for a fresh checkout
    pub(crate) fn prepare(&mut self, write_deadline: Duration) {
        self.deadline = Instant::now() + write_deadline;
    }

    pub(crate) fn stream_mut(&mut self) -> &mut BoxedStream {
        &mut self.stream
    }

    /// Write and flush `buf`, bounded by `write_timeout` and the checkout deadline
    pub async fn write_all(
        &mut self,
        buf: &[u8],
        write_timeout: Duration,
    ) -> Result<(), ConnectionError> {
        let limit = self.deadline.min(Instant::now() + write_timeout);
        let stream = &mut self.stream;
        let write = async {
            stream.write_all(buf).await?;
            stream.flush().await
        };

        match timeout_at(limit, write).await {
            Ok(result) => result.map_err(ConnectionError::from),
            Err(_) => Err(ConnectionError::WriteTimeout {
                backend: self.backend.to_string(),
                timeout: write_timeout,
            }),
        }
    }

    /// Shut the stream down; the permit is released when `self` drops
    pub(crate) async fn close(mut self) -> std::io::Result<()> {
        self.stream.shutdown().await
    }
}
