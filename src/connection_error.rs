//! Connection error types for the backend pool
//!
//! Distinguishes the ways a batch can fail to reach the backend so callers
//! and logs can tell an exhausted pool from a refused dial.

use std::fmt;
use std::time::Duration;

/// Errors that can occur while acquiring or using a backend connection
#[derive(Debug)]
#[non_exhaustive]
pub enum ConnectionError {
    /// No connection could be obtained within the wait window
    PoolExhausted { backend: String, max_size: usize },

    /// TCP connection failed
    TcpConnect {
        backend: String,
        source: std::io::Error,
    },

    /// DNS resolution failed or produced no addresses
    DnsResolution {
        address: String,
        source: std::io::Error,
    },

    /// A write did not complete before its deadline
    WriteTimeout { backend: String, timeout: Duration },

    /// I/O error during communication
    IoError(std::io::Error),
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PoolExhausted { backend, max_size } => {
                write!(
                    f,
                    "timeout waiting to build connection to '{}' (max size: {})",
                    backend, max_size
                )
            }
            Self::TcpConnect { backend, source } => {
                write!(f, "Failed to connect to {}: {}", backend, source)
            }
            Self::DnsResolution { address, source } => {
                write!(f, "Failed to resolve DNS for {}: {}", address, source)
            }
            Self::WriteTimeout { backend, timeout } => {
                write!(f, "Write to '{}' timed out after {:?}", backend, timeout)
            }
            Self::IoError(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for ConnectionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TcpConnect { source, .. } => Some(source),
            Self::DnsResolution { source, .. } => Some(source),
            Self::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl ConnectionError {
    /// Check if the pool ran out of connections
    #[must_use]
    pub const fn is_pool_exhausted(&self) -> bool {
        matches!(self, Self::PoolExhausted { .. })
    }

    /// Check if this is a dial-time network error
    #[must_use]
    pub const fn is_network_error(&self) -> bool {
        matches!(self, Self::TcpConnect { .. } | Self::DnsResolution { .. })
    }

    /// Get the appropriate log level for this error
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        match self {
            // Exhaustion is back-pressure, not a fault
            Self::PoolExhausted { .. } => tracing::Level::DEBUG,
            // An unresolvable backend needs an operator
            Self::DnsResolution { .. } => tracing::Level::ERROR,
            Self::IoError(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                tracing::Level::DEBUG
            }
            _ => tracing::Level::WARN,
        }
    }
}

impl From<std::io::Error> for ConnectionError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError(err)
    }
}
