//! Connection factories for the backend pool
//!
//! The pool never dials sockets itself; it asks a [`Connector`]. Production
//! code uses [`TcpConnector`], tests plug in in-memory streams.

use async_trait::async_trait;
use socket2::{SockRef, TcpKeepalive};
use std::fmt::Debug;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

use crate::connection_error::ConnectionError;
use crate::constants::timeout::{CONNECT, KEEPALIVE};

/// A bidirectional byte stream that can be pooled
pub trait BackendStream: AsyncRead + AsyncWrite + Unpin + Send + Sync + Debug {}

impl<T> BackendStream for T where T: AsyncRead + AsyncWrite + Unpin + Send + Sync + Debug {}

/// Type-erased stream held by pooled connections
pub type BoxedStream = Box<dyn BackendStream>;

/// Creates new connections to a backend
#[async_trait]
pub trait Connector: Send + Sync + Debug {
    /// Open a new stream to `backend` (`host:port`)
    async fn connect(&self, backend: &str) -> Result<BoxedStream, ConnectionError>;
}

/// Plain TCP connector with connect timeout and keepalive
#[derive(Debug, Clone)]
pub struct TcpConnector {
    connect_timeout: Duration,
    keepalive: Duration,
}

impl TcpConnector {
    #[must_use]
    pub fn new(connect_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            keepalive: KEEPALIVE,
        }
    }

    /// Override the TCP keepalive idle time
    #[must_use]
    pub fn with_keepalive(mut self, keepalive: Duration) -> Self {
        self.keepalive = keepalive;
        self
    }

    async fn resolve(&self, backend: &str) -> Result<SocketAddr, ConnectionError> {
        let mut addrs = tokio::net::lookup_host(backend).await.map_err(|source| {
            ConnectionError::DnsResolution {
                address: backend.to_string(),
                source,
            }
        })?;

        addrs.next().ok_or_else(|| ConnectionError::DnsResolution {
            address: backend.to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no addresses found"),
        })
    }

    fn tune(&self, stream: &TcpStream) -> std::io::Result<()> {
        stream.set_nodelay(true)?;
        let keepalive = TcpKeepalive::new().with_time(self.keepalive);
        SockRef::from(stream).set_tcp_keepalive(&keepalive)
    }
}

impl Default for TcpConnector {
    fn default() -> Self {
        Self::new(CONNECT)
    }
}

#[async_trait]
impl Connector for TcpConnector {
    async fn connect(&self, backend: &str) -> Result<BoxedStream, ConnectionError> {
        let addr = self.resolve(backend).await?;
        debug!("About to connect to {} ({})", backend, addr);

        let stream = match timeout(self.connect_timeout, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => {
                return Err(ConnectionError::TcpConnect {
                    backend: backend.to_string(),
                    source,
                });
            }
            Err(_) => {
                return Err(ConnectionError::TcpConnect {
                    backend: backend.to_string(),
                    source: std::io::Error::new(
                        std::io::ErrorKind::TimedOut,
                        format!("connect timed out after {:?}", self.connect_timeout),
                    ),
                });
            }
        };

        self.tune(&stream)?;
        Ok(Box::new(stream))
    }
}
