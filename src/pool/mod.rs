//! Backend connection pooling
//!
//! A bounded set of TCP connections to one backend host, shared by every
//! concurrent writer. Connections are created lazily, reused while healthy,
//! and dropped when they fail or overflow the idle queue.

pub mod connection;
pub mod connection_pool;
pub mod connector;
pub mod health_check;

#[cfg(test)]
pub(crate) mod mock_connector;

pub use connection::{ConnectionId, PooledConnection};
pub use connection_pool::{ConnectionPool, PoolConfig, PoolStatus};
pub use connector::{BackendStream, BoxedStream, Connector, TcpConnector};
