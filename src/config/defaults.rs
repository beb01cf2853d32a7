//! Default values for configuration fields
//!
//! Used by serde when a field is missing from the config file.

use crate::constants::{pool, sender, timeout};

/// Default line-protocol port of the proxy
#[inline]
pub const fn proxy_port() -> u16 {
    2878
}

#[inline]
pub const fn batch_size() -> usize {
    sender::DEFAULT_BATCH_SIZE
}

#[inline]
pub const fn buffer_size() -> usize {
    sender::DEFAULT_BUFFER_SIZE
}

#[inline]
pub const fn flush_interval_secs() -> u64 {
    sender::DEFAULT_FLUSH_INTERVAL.as_secs()
}

#[inline]
pub const fn convert_paths() -> bool {
    true
}

#[inline]
pub const fn max_idle() -> usize {
    pool::DEFAULT_MAX_IDLE
}

#[inline]
pub const fn max_overflow() -> usize {
    pool::DEFAULT_MAX_OVERFLOW
}

#[inline]
pub const fn idle_wait_ms() -> u64 {
    pool::IDLE_WAIT.as_millis() as u64
}

#[inline]
pub const fn create_wait_ms() -> u64 {
    pool::CREATE_WAIT.as_millis() as u64
}

#[inline]
pub const fn write_deadline_secs() -> u64 {
    pool::WRITE_DEADLINE.as_secs()
}

#[inline]
pub const fn write_timeout_secs() -> u64 {
    timeout::WRITE.as_secs()
}

#[inline]
pub const fn connect_timeout_secs() -> u64 {
    timeout::CONNECT.as_secs()
}
