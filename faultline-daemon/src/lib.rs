//! Faultline daemon library.
//!
//! Exposes the daemon's building blocks for integration testing.
//! In production, `faultline-daemon` is used as a binary (main.rs).

pub mod cli;
pub mod daemon;
pub mod logging;
pub mod metrics_server;
pub mod panic;
pub mod push;
pub mod server;

pub use daemon::Daemon;
