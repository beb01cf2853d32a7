//! Bounded, self-healing connection pool for one backend host
//!
//! Total outstanding connections (idle + checked out + being created) are
//! bounded by a semaphore of `max_idle + max_overflow` permits. Each
//! connection owns its permit for as long as it exists. Idle connections sit
//! in a queue of at most `max_idle` entries; anything returned beyond that is
//! overflow and gets closed.


use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{AcquireError, Notify, OwnedSemaphorePermit, Semaphore};
use tokio::time::timeout;
use tracing::debug;

use super::connection::PooledConnection;
use super::connector::{Connector, TcpConnector};
use super::health_check::is_peer_closed;
use crate::connection_error::ConnectionError;
use crate::constants::pool::{
    CREATE_WAIT, DEFAULT_MAX_IDLE, DEFAULT_MAX_OVERFLOW, IDLE_WAIT, WRITE_DEADLINE,
};

/// Pool sizing and timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    /// Idle connections kept for reuse
    pub max_idle: usize,
    /// Extra connections allowed under burst load
    pub max_overflow: usize,
    /// Fast-path wait for an idle connection
    pub idle_wait: Duration,
    /// Wait for an idle connection or a creation permit
    pub create_wait: Duration,
    /// Deadline set on every checkout
    pub write_deadline: Duration,
}

impl PoolConfig {
    /// Total number of connections the pool may have outstanding
    ///
    /// Capped at the semaphore's permit limit.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.max_idle
            .saturating_add(self.max_overflow)
            .min(Semaphore::MAX_PERMITS)
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_idle: DEFAULT_MAX_IDLE,
            max_overflow: DEFAULT_MAX_OVERFLOW,
            idle_wait: IDLE_WAIT,
            create_wait: CREATE_WAIT,
            write_deadline: WRITE_DEADLINE,
        }
    }
}

/// Point-in-time pool occupancy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatus {
    /// Connections waiting in the idle queue
    pub idle: usize,
    /// Permits held by idle, checked-out and in-creation connections
    pub outstanding: usize,
    pub max_idle: usize,
    pub capacity: usize,
}

enum Acquired {
    Idle(PooledConnection),
    Permit(Result<OwnedSemaphorePermit, AcquireError>),
}

/// Connection pool shared by all concurrent writers
#[derive(Debug)]
pub struct ConnectionPool {
    backend: Arc<str>,
    config: PoolConfig,
    idle: Mutex<VecDeque<PooledConnection>>,
    available: Notify,
    create_permits: Arc<Semaphore>,
    connector: Arc<dyn Connector>,
}

impl ConnectionPool {
    /// Create a pool that dials `backend` through `connector`
    pub fn new(
        backend: impl Into<String>,
        config: PoolConfig,
        connector: Arc<dyn Connector>,
    ) -> Self {
        Self {
            backend: Arc::from(backend.into()),
            idle: Mutex::new(VecDeque::with_capacity(config.max_idle)),
            available: Notify::new(),
            create_permits: Arc::new(Semaphore::new(config.capacity())),
            config,
            connector,
        }
    }

    /// Create a pool of plain TCP connections
    pub fn tcp(backend: impl Into<String>, config: PoolConfig, connect_timeout: Duration) -> Self {
        Self::new(backend, config, Arc::new(TcpConnector::new(connect_timeout)))
    }

    #[must_use]
    pub fn backend(&self) -> &str {
        &self.backend
    }

    #[must_use]
    pub const fn config(&self) -> &PoolConfig {
        &self.config
    }

    #[must_use]
    pub fn status(&self) -> PoolStatus {
        PoolStatus {
            idle: self.idle.lock().len(),
            outstanding: self.config.capacity() - self.create_permits.available_permits(),
            max_idle: self.config.max_idle,
            capacity: self.config.capacity(),
        }
    }

    /// Check out a ready-to-write connection
    ///
    /// Waits briefly for an idle connection, then races idle arrivals against
    /// a creation permit. Fails with [`ConnectionError::PoolExhausted`] once
    /// `idle_wait + create_wait` has passed without either.
    pub async fn get(&self) -> Result<PooledConnection, ConnectionError> {
        debug!("Trying to get connection to {}", self.backend);

        if let Ok(conn) = timeout(self.config.idle_wait, self.next_idle()).await {
            return Ok(self.prepare(conn));
        }

        debug!("No idle connection in pool for {}", self.backend);
        let acquired = timeout(self.config.create_wait, async {
            tokio::select! {
                biased;
                conn = self.next_idle() => Acquired::Idle(conn),
                permit = self.create_permits.clone().acquire_owned() => Acquired::Permit(permit),
            }
        })
        .await;

        match acquired {
            Ok(Acquired::Idle(conn)) => Ok(self.prepare(conn)),
            Ok(Acquired::Permit(Ok(permit))) => self.create(permit).await,
            // The semaphore is never closed; treat it like exhaustion regardless
            Ok(Acquired::Permit(Err(_))) | Err(_) => {
                debug!("Max connections exceeded for {}", self.backend);
                Err(ConnectionError::PoolExhausted {
                    backend: self.backend.to_string(),
                    max_size: self.config.capacity(),
                })
            }
        }
    }

    /// Hand a connection back to the pool
    ///
    /// Failed or peer-closed connections are closed and free their permit.
    /// Healthy ones are queued for reuse unless the idle queue is full.
    pub async fn put_back(&self, mut conn: PooledConnection, failed: bool) {
        if failed || is_peer_closed(&mut conn).await {
            self.discard(conn).await;
            return;
        }

        let overflow = {
            let mut idle = self.idle.lock();
            if idle.len() < self.config.max_idle {
                idle.push_back(conn);
                None
            } else {
                Some(conn)
            }
        };

        match overflow {
            None => self.available.notify_one(),
            Some(conn) => {
                debug!(
                    "Closing overflow connection {} to {}",
                    conn.id(),
                    self.backend
                );
                self.discard(conn).await;
            }
        }
    }

    async fn next_idle(&self) -> PooledConnection {
        loop {
            let next = self.idle.lock().pop_front();
            if let Some(conn) = next {
                return conn;
            }
            // notify_one stores a wakeup when nobody waits, so a return
            // landing between the pop and this await is not lost
            self.available.notified().await;
        }
    }

    async fn create(
        &self,
        permit: OwnedSemaphorePermit,
    ) -> Result<PooledConnection, ConnectionError> {
        match self.connector.connect(&self.backend).await {
            Ok(stream) => {
                let conn = PooledConnection::new(
                    self.backend.clone(),
                    stream,
                    permit,
                    self.config.write_deadline,
                );
                debug!("Created connection {} to {}", conn.id(), self.backend);
                Ok(conn)
            }
            Err(e) => {
                drop(permit);
                Err(e)
            }
        }
    }

    fn prepare(&self, mut conn: PooledConnection) -> PooledConnection {
        conn.prepare(self.config.write_deadline);
        conn
    }

    async fn discard(&self, conn: PooledConnection) {
        let id = conn.id();
        if let Err(e) = conn.close().await {
            debug!("Error closing connection {} to {}: {}", id, self.backend, e);
        }
    }
}
