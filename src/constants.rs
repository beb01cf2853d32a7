//! Constants used throughout the adapter
//!
//! Centralizes timeouts, pool sizing and wire-format values so the pool,
//! writer and configuration defaults agree on them.

use std::time::Duration;

/// Connection pool constants
pub mod pool {
    use super::Duration;

    /// Maximum number of idle connections kept for reuse
    pub const DEFAULT_MAX_IDLE: usize = 10;

    /// Connections allowed beyond the idle capacity during bursts
    ///
    /// Overflow connections are closed when returned instead of queued.
    pub const DEFAULT_MAX_OVERFLOW: usize = 10;

    /// How long `get` waits for an idle connection before trying to create one
    pub const IDLE_WAIT: Duration = Duration::from_millis(1);

    /// How long `get` waits for either an idle connection or a creation permit
    pub const CREATE_WAIT: Duration = Duration::from_millis(10);

    /// Deadline applied to a connection each time it is handed out
    pub const WRITE_DEADLINE: Duration = Duration::from_secs(60);

    /// Read deadline for the liveness probe run on returned connections
    pub const LIVENESS_PROBE_TIMEOUT: Duration = Duration::from_millis(2);

    /// Only 1 byte needed to detect a closed connection
    pub const LIVENESS_PROBE_BUFFER_SIZE: usize = 1;
}

/// Timeout constants
pub mod timeout {
    use super::Duration;

    /// Bound on a single flush of buffered records to the backend
    pub const WRITE: Duration = Duration::from_secs(5);

    /// Connection timeout for backend dials
    pub const CONNECT: Duration = Duration::from_secs(10);

    /// TCP keepalive idle time for backend sockets
    pub const KEEPALIVE: Duration = Duration::from_secs(60);

    /// Request timeout for the direct ingestion sender
    pub const DIRECT_SEND: Duration = Duration::from_secs(10);
}

/// Direct ingestion sender constants
pub mod sender {
    use super::Duration;

    /// Records posted per ingestion request
    pub const DEFAULT_BATCH_SIZE: usize = 10_000;

    /// Records queued ahead of the flusher before points are refused
    pub const DEFAULT_BUFFER_SIZE: usize = 50_000;

    /// A partial batch is posted once this much time has passed
    pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(1);
}

/// Line protocol constants
pub mod line {
    /// Records are flushed to the connection once the buffer reaches this size
    pub const FLUSH_THRESHOLD: usize = 64 * 1024;

    /// Initial capacity of a per-batch record buffer
    pub const BUFFER_INITIAL: usize = 8 * 1024;

    /// Decimal places used for metric values
    pub const VALUE_PRECISION: usize = 6;
}

/// Prometheus label names with special meaning
pub mod labels {
    /// Label carrying the metric name
    pub const NAME: &str = "__name__";

    /// Label carrying the source identity
    pub const INSTANCE: &str = "instance";
}

/// Health check constants
pub mod health {
    /// Metric sent through the delivery path by health checks
    pub const METRIC_NAME: &str = "prom.storage.adapter.health";

    /// Source reported on the synthetic health metric
    pub const SOURCE: &str = "prom-storage-adapter";
}

#[cfg(test)]
#[allow(clippy::assertions_on_constants)]
mod tests {
    use super::*;

    #[test]
    fn test_get_waits_are_short() {
        // Worst-case stall of `get` stays in the low milliseconds
        assert!(pool::IDLE_WAIT + pool::CREATE_WAIT < Duration::from_millis(100));
    }

    #[test]
    fn test_sender_buffer_holds_a_batch() {
        assert!(sender::DEFAULT_BUFFER_SIZE >= sender::DEFAULT_BATCH_SIZE);
    }

    #[test]
    fn test_write_timeout_within_deadline() {
        assert!(timeout::WRITE <= pool::WRITE_DEADLINE);
    }
}
