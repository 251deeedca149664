//! Daemon assembly and lifecycle.
//!
//! The [`Daemon`] builds the collector from configuration, starts the
//! enabled surfaces and waits for a shutdown trigger.
//!
//! # Startup order
//!
//! 1. Prometheus recorder (if `[metrics]` is enabled)
//! 2. Error collector and exporter
//! 3. HTTP read surface (if `[exporter]` is enabled)
//! 4. Gateway push task (if `[push]` is enabled)
//!
//! The gateway pusher is built and the listener bound before either task is
//! spawned.
//!
//! # Shutdown
//!
//! A single broadcast stops the HTTP server and the push task. The push
//! task performs one last push before exiting.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::broadcast;

use faultline_aggregator::{AggregatorConfig, ErrorCollector, ErrorExporter};
use faultline_core::config::FaultlineConfig;

use crate::metrics_server;
use crate::push::{GatewayPusher, spawn_push_task};
use crate::server;

/// The faultline daemon.
pub struct Daemon {
    config: FaultlineConfig,
    collector: Arc<ErrorCollector>,
    exporter: ErrorExporter,
    shutdown_tx: broadcast::Sender<()>,
}

impl Daemon {
    /// Load `faultline.toml`, apply environment overrides and build the daemon.
    pub async fn build(config_path: &Path) -> Result<Self> {
        let config = FaultlineConfig::load(config_path)
            .await
            .map_err(|e| anyhow::anyhow!("failed to load config: {}", e))?;
        Self::build_from_config(config)
    }

    /// Build from an already-loaded configuration.
    ///
    /// Installs the metrics recorder when enabled, which requires a Tokio runtime.
    pub fn build_from_config(config: FaultlineConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;

        if config.metrics.enabled {
            metrics_server::install_metrics_recorder(&config.metrics)?;
        }

        let collector = ErrorCollector::builder()
            .config(AggregatorConfig::from_core(&config.collector))
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build error collector: {}", e))?;
        let collector = Arc::new(collector);
        let exporter = ErrorExporter::new(Arc::clone(&collector));
        let (shutdown_tx, _) = broadcast::channel(4);

        tracing::info!(
            target_uuid = %collector.target_uuid(),
            exporter_enabled = config.exporter.enabled,
            push_enabled = config.push.enabled,
            "daemon initialized"
        );

        Ok(Self {
            config,
            collector,
            exporter,
            shutdown_tx,
        })
    }

    /// The hosted collector.
    pub fn collector(&self) -> &Arc<ErrorCollector> {
        &self.collector
    }

    /// The loaded configuration.
    pub fn config(&self) -> &FaultlineConfig {
        &self.config
    }

    /// Run until SIGTERM or SIGINT.
    pub async fn run(&self) -> Result<()> {
        self.run_until(async {
            match wait_for_shutdown_signal().await {
                Ok(signal) => tracing::info!(signal, "shutdown signal received"),
                Err(e) => tracing::error!(error = %e, "signal handling failed, shutting down"),
            }
        })
        .await
    }

    /// Run until `shutdown` completes.
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        // every fallible step runs before the first task is spawned
        let pusher = if self.config.push.enabled {
            let pusher = GatewayPusher::new(&self.config.push, self.exporter.clone())
                .map_err(|e| anyhow::anyhow!("failed to build gateway pusher: {}", e))?;
            Some(pusher)
        } else {
            None
        };
        let listener = if self.config.exporter.enabled {
            Some(server::bind(&self.config.exporter).await?)
        } else {
            None
        };

        let server_task = listener.map(|listener| {
            let router = server::router(self.exporter.clone(), &self.config.exporter.endpoint);
            tokio::spawn(server::serve(
                listener,
                router,
                self.shutdown_tx.subscribe(),
            ))
        });
        let push_task = pusher.map(|pusher| {
            spawn_push_task(
                pusher,
                Duration::from_secs(self.config.push.interval_secs),
                self.shutdown_tx.subscribe(),
            )
        });

        tracing::info!("daemon running");
        shutdown.await;

        let _ = self.shutdown_tx.send(());

        if let Some(task) = push_task {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "push task panicked");
            }
        }
        if let Some(task) = server_task {
            task.await
                .map_err(|e| anyhow::anyhow!("exporter task panicked: {}", e))??;
        }

        tracing::info!(
            aggregates = self.collector.store().len(),
            "daemon stopped"
        );
        Ok(())
    }
}

/// Wait for SIGTERM or SIGINT and return the signal name.
async fn wait_for_shutdown_signal() -> Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("failed to install SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("failed to install SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener as StdTcpListener;

    use super::*;

    fn free_port() -> u16 {
        let listener = StdTcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    }

    #[tokio::test]
    async fn pusher_failure_does_not_leave_server_running() {
        let mut config = FaultlineConfig::default();
        config.exporter.port = free_port();
        config.push.enabled = true;
        let port = config.exporter.port;

        let mut daemon = Daemon::build_from_config(config).unwrap();
        // bypasses validation to force a pusher construction error
        daemon.config.push.gateway_url = "ftp://gateway".to_owned();

        let result = daemon.run_until(std::future::pending()).await;
        assert!(result.is_err());

        // the exporter port was never taken
        StdTcpListener::bind(("127.0.0.1", port)).unwrap();
    }
}
