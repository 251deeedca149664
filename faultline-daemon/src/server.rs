//! HTTP read surface for the aggregated error snapshot.
//!
//! A single `GET` route returns the exporter payload as `application/json`.
//! Encoding failures are logged and answered with `500` and an empty body,
//! so a scraper never mistakes a partial document for a valid snapshot.

use std::net::SocketAddr;

use anyhow::Result;
use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use faultline_aggregator::{CONTENT_TYPE_JSON, ErrorExporter};
use faultline_core::config::ExporterConfig;

/// Build the router serving the snapshot at `endpoint`.
pub fn router(exporter: ErrorExporter, endpoint: &str) -> Router {
    Router::new()
        .route(endpoint, get(export_errors))
        .with_state(exporter)
}

async fn export_errors(State(exporter): State<ErrorExporter>) -> Response {
    match exporter.export() {
        Ok(body) => ([(header::CONTENT_TYPE, CONTENT_TYPE_JSON)], body).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to export aggregated errors");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Bind the listener described by the `[exporter]` section.
pub async fn bind(config: &ExporterConfig) -> Result<TcpListener> {
    let addr: SocketAddr = format!("{}:{}", config.listen_addr, config.port)
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid exporter listen address: {}", e))?;

    TcpListener::bind(addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind exporter on {}: {}", addr, e))
}

/// Serve `router` on `listener` until a shutdown broadcast arrives.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<()> {
    let local_addr = listener.local_addr()?;
    tracing::info!(listen_addr = %local_addr, "exporter endpoint active");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        })
        .await
        .map_err(|e| anyhow::anyhow!("exporter server failed: {}", e))?;

    tracing::info!(listen_addr = %local_addr, "exporter endpoint stopped");
    Ok(())
}
