//! In-memory connector for unit tests

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::io::DuplexStream;

use super::connector::{BoxedStream, Connector};
use crate::connection_error::ConnectionError;

const DUPLEX_BUFFER: usize = 64 * 1024;

/// Connector handing out duplex streams and keeping the far ends
#[derive(Debug, Default)]
pub struct MockConnector {
    peers: Mutex<Vec<DuplexStream>>,
    fail: AtomicBool,
    dials: AtomicUsize,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent dials fail with a refused connection
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn dials(&self) -> usize {
        self.dials.load(Ordering::SeqCst)
    }

    /// Drop every far end, as if the backend closed all connections
    pub fn close_peers(&self) {
        self.peers.lock().clear();
    }

    /// Take the far ends so a test can read what was written
    pub fn take_peers(&self) -> Vec<DuplexStream> {
        std::mem::take(&mut *self.peers.lock())
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self, backend: &str) -> Result<BoxedStream, ConnectionError> {
        self.dials.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(ConnectionError::TcpConnect {
                backend: backend.to_string(),
                source: std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    "connection creation error",
                ),
            });
        }

        let (local, peer) = tokio::io::duplex(DUPLEX_BUFFER);
        self.peers.lock().push(peer);
        Ok(Box::new(local))
    }
}
