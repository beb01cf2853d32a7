//! Liveness probe for connections coming back to the pool
//!
//! The probe only catches connections the peer already closed. It does not
//! validate protocol health: the line protocol has no request/response to
//! check against.

use tokio::io::AsyncReadExt;
use tokio::time::timeout;
use tracing::info;

use super::connection::PooledConnection;
use crate::constants::pool::{LIVENESS_PROBE_BUFFER_SIZE, LIVENESS_PROBE_TIMEOUT};

/// Check whether the peer has closed the connection
///
/// # How it works
/// - A 1-byte read is attempted with a short deadline
/// - `Ok(0)` means end-of-stream: the peer is gone
/// - A timeout is the expected case for an idle backend that never talks back
/// - Data or any other error is treated as alive; a broken socket will
///   surface as a write error on its next checkout
pub async fn is_peer_closed(conn: &mut PooledConnection) -> bool {
    let mut probe = [0u8; LIVENESS_PROBE_BUFFER_SIZE];

    match timeout(LIVENESS_PROBE_TIMEOUT, conn.stream_mut().read(&mut probe)).await {
        Ok(Ok(0)) => {
            info!("Connection {} is closed", conn.id());
            true
        }
        _ => false,
    }
}
