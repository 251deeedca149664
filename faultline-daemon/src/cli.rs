//! CLI argument definitions for faultline-daemon.
//!
//! Uses `clap` v4 derive macros to parse command-line arguments.

use std::path::PathBuf;

use clap::Parser;

use faultline_core::config::FaultlineConfig;

/// Faultline error aggregation daemon.
///
/// Hosts an error collector, serves its JSON snapshot over HTTP and
/// optionally pushes it to a remote gateway on a fixed interval.
#[derive(Parser, Debug)]
#[command(name = "faultline-daemon")]
#[command(version, about, long_about = None)]
pub struct DaemonCli {
    /// Path to faultline.toml configuration file.
    #[arg(short, long, default_value = "/etc/faultline/faultline.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_format: Option<String>,

    /// Validate configuration file and exit without starting the daemon.
    #[arg(long)]
    pub validate: bool,
}

impl DaemonCli {
    /// Apply command-line overrides on top of a loaded configuration.
    ///
    /// The caller is expected to re-validate the configuration afterwards.
    pub fn apply_overrides(&self, config: &mut FaultlineConfig) {
        if let Some(level) = &self.log_level {
            config.general.log_level.clone_from(level);
        }
        if let Some(format) = &self.log_format {
            config.general.log_format.clone_from(format);
        }
    }
}
