//! Direct ingestion through the writer against a local HTTP endpoint

use anyhow::Result;
use axum::Router;
use axum::routing::post;
use prom_storage_adapter::prompb::{Sample, TimeSeries, WriteRequest};
use prom_storage_adapter::{
    Delivery, DirectSender, MetricTransformer, MetricWriter, SenderOptions, TransformConfig,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

/// Ingestion endpoint that forwards each request body
async fn spawn_ingest() -> Result<(String, mpsc::UnboundedReceiver<String>)> {
    let (tx, rx) = mpsc::unbounded_channel();
    let app = Router::new().route(
        "/report",
        post(move |body: String| {
            let tx = tx.clone();
            async move {
                let _ = tx.send(body);
                "accepted"
            }
        }),
    );
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{}", addr), rx))
}

fn direct_writer(url: &str, batch_size: usize) -> Result<MetricWriter> {
    let sender = DirectSender::with_options(
        url,
        "token",
        SenderOptions {
            batch_size,
            buffer_size: 10_000,
            flush_interval: Duration::from_secs(60),
            timeout: Duration::from_secs(5),
        },
    )?;
    Ok(MetricWriter::new(
        MetricTransformer::new(TransformConfig::default()),
        Delivery::Sender(Arc::new(sender)),
    ))
}

#[tokio::test]
async fn test_points_share_ingestion_requests() -> Result<()> {
    let (url, mut rx) = spawn_ingest().await?;
    let writer = direct_writer(&url, 100)?;

    let samples = (0..500).map(|i| Sample::new(i as f64, i * 1_000)).collect();
    let request = WriteRequest {
        timeseries: vec![TimeSeries::new(
            &[("__name__", "http_requests_total"), ("instance", "web-1")],
            samples,
        )],
    };

    let summary = writer.write(&request).await?;
    assert_eq!(summary.points, 500);
    assert_eq!(summary.send_failures, 0);
    writer.flush().await?;

    let mut bodies = Vec::new();
    while let Ok(body) = rx.try_recv() {
        bodies.push(body);
    }
    assert_eq!(bodies.len(), 5);

    let lines: Vec<&str> = bodies.iter().flat_map(|body| body.lines()).collect();
    assert_eq!(lines.len(), 500);
    assert_eq!(lines[0], "http.requests.total 0.000000 0 source=\"web-1\"");
    assert_eq!(
        lines[499],
        "http.requests.total 499.000000 499 source=\"web-1\""
    );
    Ok(())
}

#[tokio::test]
async fn test_health_check_reaches_endpoint() -> Result<()> {
    let (url, mut rx) = spawn_ingest().await?;
    let writer = direct_writer(&url, 100)?;

    assert_eq!(writer.health_check().await, (200, "OK".to_string()));
    let body = rx.try_recv()?;
    assert!(body.starts_with("prom.storage.adapter.health 1.000000 "));
    Ok(())
}
