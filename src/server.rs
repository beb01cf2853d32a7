//! HTTP listener for Prometheus remote write
//!
//! `POST /receive` takes a snappy-compressed `WriteRequest`, `GET /health`
//! pushes a synthetic metric through the writer and reports the outcome.

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use serde::Serialize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{Level, debug, error, info, warn};

use crate::prompb::decode_write_request;
use crate::writer::{MetricWriter, WriteError};

/// Body of `/health` responses
#[derive(Debug, Serialize)]
pub struct HealthMessage {
    pub message: String,
}

/// Build the adapter's routes around a shared writer
pub fn router(writer: Arc<MetricWriter>) -> Router {
    Router::new()
        .route("/receive", post(receive))
        .route("/health", get(health))
        .with_state(writer)
}

/// Serve requests on `listener` until the server fails
pub async fn serve(listener: TcpListener, writer: Arc<MetricWriter>) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("Listening for remote write on {}", addr);
    }
    axum::serve(listener, router(writer)).await
}

async fn receive(State(writer): State<Arc<MetricWriter>>, body: Bytes) -> Response {
    let request = match decode_write_request(&body) {
        Ok(request) => request,
        Err(e) => {
            debug!("Rejecting remote write body ({} bytes): {}", body.len(), e);
            return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
        }
    };

    match writer.write(&request).await {
        Ok(_) => StatusCode::OK.into_response(),
        Err(e) => {
            log_write_failure(&e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

fn log_write_failure(e: &WriteError) {
    match e.log_level() {
        Level::ERROR => error!("Remote write failed: {}", e),
        Level::WARN => warn!("Remote write failed: {}", e),
        Level::INFO => info!("Remote write failed: {}", e),
        _ => debug!("Remote write failed: {}", e),
    }
}

async fn health(State(writer): State<Arc<MetricWriter>>) -> Response {
    let (status, message) = writer.health_check().await;
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::SERVICE_UNAVAILABLE);
    (status, Json(HealthMessage { message })).into_response()
}
