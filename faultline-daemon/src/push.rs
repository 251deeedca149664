//! Gateway push surface.
//!
//! [`GatewayPusher`] POSTs the current snapshot to `{gateway_url}/errors`.
//! A failed push leaves the collector untouched, so the next attempt still
//! carries everything accumulated so far.

use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use faultline_aggregator::{CONTENT_TYPE_JSON, ErrorExporter};
use faultline_core::config::PushConfig;
use faultline_core::error::{FaultlineError, TransportError};
use faultline_core::metrics as m;
use faultline_core::types::Severity;

/// Path appended to the gateway base URL.
pub const GATEWAY_ERRORS_PATH: &str = "/errors";

/// Pushes exporter snapshots to a remote gateway.
#[derive(Debug, Clone)]
pub struct GatewayPusher {
    client: reqwest::Client,
    url: String,
    exporter: ErrorExporter,
}

impl GatewayPusher {
    /// Create a pusher from the `[push]` section.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidDestination`] when the gateway URL is
    /// not an `http://` or `https://` URL.
    pub fn new(config: &PushConfig, exporter: ErrorExporter) -> Result<Self, FaultlineError> {
        let base = config.gateway_url.trim_end_matches('/');
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(TransportError::InvalidDestination(config.gateway_url.clone()).into());
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TransportError::Request(e.to_string()))?;

        Ok(Self {
            client,
            url: format!("{base}{GATEWAY_ERRORS_PATH}"),
            exporter,
        })
    }

    /// Full destination URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Export and POST one snapshot.
    pub async fn push(&self) -> Result<(), FaultlineError> {
        let result = self.send().await;
        let label = if result.is_ok() {
            m::RESULT_SUCCESS
        } else {
            m::RESULT_FAILURE
        };
        metrics::counter!(m::PUSHES_TOTAL, m::LABEL_RESULT => label).increment(1);
        result
    }

    async fn send(&self) -> Result<(), FaultlineError> {
        let body = self.exporter.export()?;
        let bytes = body.len();

        let response = self
            .client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, CONTENT_TYPE_JSON)
            .body(body)
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
            }
            .into());
        }

        tracing::debug!(url = %self.url, bytes, "snapshot pushed");
        Ok(())
    }

    /// Push, logging failures and reporting them to the collector as warnings.
    async fn push_and_report(&self) {
        if let Err(e) = self.push().await {
            tracing::warn!(url = %self.url, error = %e, "gateway push failed");
            self.exporter
                .collector()
                .report_with_severity(&e, Severity::Warning);
        }
    }
}

/// Spawn a task that pushes every `interval` until shutdown.
///
/// A final push is attempted when the shutdown broadcast arrives.
pub fn spawn_push_task(
    pusher: GatewayPusher,
    interval: Duration,
    mut shutdown: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // first tick completes immediately
        ticker.tick().await;

        tracing::info!(
            url = %pusher.url(),
            interval_secs = interval.as_secs(),
            "gateway push task started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => pusher.push_and_report().await,
                _ = shutdown.recv() => {
                    pusher.push_and_report().await;
                    break;
                }
            }
        }

        tracing::info!(url = %pusher.url(), "gateway push task stopped");
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use faultline_aggregator::ErrorCollector;

    use super::*;

    fn exporter() -> ErrorExporter {
        ErrorExporter::new(Arc::new(ErrorCollector::new()))
    }

    #[test]
    fn url_appends_errors_path() {
        let config = PushConfig {
            gateway_url: "http://localhost:6767/".to_owned(),
            ..Default::default()
        };
        let pusher = GatewayPusher::new(&config, exporter()).unwrap();
        assert_eq!(pusher.url(), "http://localhost:6767/errors");
    }

    #[test]
    fn rejects_non_http_destination() {
        let config = PushConfig {
            gateway_url: "ftp://gateway".to_owned(),
            ..Default::default()
        };
        let err = GatewayPusher::new(&config, exporter()).unwrap_err();
        assert!(matches!(
            err,
            FaultlineError::Transport(TransportError::InvalidDestination(_))
        ));
    }
}
