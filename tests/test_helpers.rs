//! Test helpers for integration tests
//!
//! A mock line-protocol backend that records every received line, plus
//! small request builders.

#![allow(dead_code)]

use parking_lot::Mutex;
use prom_storage_adapter::prompb::{Sample, TimeSeries, WriteRequest};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Mock proxy accepting line-protocol connections
pub struct MockBackend {
    pub address: String,
    lines: Arc<Mutex<Vec<String>>>,
    accepted: Arc<AtomicUsize>,
    handle: JoinHandle<()>,
}

impl MockBackend {
    /// Bind on an ephemeral local port and start accepting
    pub async fn spawn() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();
        let lines = Arc::new(Mutex::new(Vec::new()));
        let accepted = Arc::new(AtomicUsize::new(0));

        let handle = {
            let lines = lines.clone();
            let accepted = accepted.clone();
            tokio::spawn(async move {
                while let Ok((stream, _)) = listener.accept().await {
                    accepted.fetch_add(1, Ordering::SeqCst);
                    let lines = lines.clone();
                    tokio::spawn(async move {
                        let mut reader = BufReader::new(stream).lines();
                        while let Ok(Some(line)) = reader.next_line().await {
                            lines.lock().push(line);
                        }
                    });
                }
            })
        };

        Self {
            address,
            lines,
            accepted,
            handle,
        }
    }

    /// Connections accepted so far
    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }

    /// Wait until at least `count` lines arrived, then return them all
    pub async fn wait_for_lines(&self, count: usize) -> Vec<String> {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        loop {
            {
                let lines = self.lines.lock();
                if lines.len() >= count || tokio::time::Instant::now() >= deadline {
                    return lines.clone();
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    /// Stop accepting new connections
    pub fn stop(&self) {
        self.handle.abort();
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// One series with a single sample
pub fn series(labels: &[(&str, &str)], value: f64, timestamp_ms: i64) -> TimeSeries {
    TimeSeries::new(labels, vec![Sample::new(value, timestamp_ms)])
}

pub fn request(timeseries: Vec<TimeSeries>) -> WriteRequest {
    WriteRequest { timeseries }
}
