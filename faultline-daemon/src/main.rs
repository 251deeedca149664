use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use faultline_core::config::FaultlineConfig;
use faultline_daemon::Daemon;
use faultline_daemon::cli::DaemonCli;
use faultline_daemon::{logging, panic};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = DaemonCli::parse();

    let mut config = FaultlineConfig::load(&cli.config)
        .await
        .map_err(|e| anyhow::anyhow!("failed to load '{}': {}", cli.config.display(), e))?;
    cli.apply_overrides(&mut config);
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {}", e))?;

    if cli.validate {
        println!("configuration '{}' is valid", cli.config.display());
        return Ok(());
    }

    logging::init_tracing(&config.general)?;
    tracing::info!(config = %cli.config.display(), "faultline-daemon starting");

    let daemon = Daemon::build_from_config(config)?;
    panic::install_panic_reporter(Arc::clone(daemon.collector()));

    daemon.run().await?;

    tracing::info!("faultline-daemon shut down");
    Ok(())
}
