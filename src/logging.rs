//! Logging setup for a Gatekeeper process.
//!
//! The library itself only emits `tracing` events. A host that already owns
//! logging skips this module; the bundled binary calls [`init`] and falls
//! back to [`init_console_only`].

use std::fs::{self, File};
use std::path::Path;
use std::sync::Arc;

use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::{GatekeeperError, Result};

/// Parse log level string to tracing Level.
fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

fn level_filter(level: &str) -> EnvFilter {
    EnvFilter::from_default_env().add_directive(parse_level(level).into())
}

fn already_installed(e: TryInitError) -> GatekeeperError {
    GatekeeperError::Logging(e.to_string())
}

/// Install a global subscriber writing to stdout and the configured file.
///
/// Fails with [`GatekeeperError::Logging`] if a global subscriber is
/// already installed, and with [`GatekeeperError::Io`] if the log file
/// cannot be created.
pub fn init(config: &LoggingConfig) -> Result<()> {
    if let Some(parent) = Path::new(&config.file).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let log_file = Arc::new(File::create(&config.file)?);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout.and(log_file))
                .with_ansi(false)
                .with_target(true),
        )
        .with(level_filter(&config.level))
        .try_init()
        .map_err(already_installed)
}

/// Install a global subscriber writing to stdout only.
pub fn init_console_only(level: &str) -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout)
                .with_target(true),
        )
        .with(level_filter(level))
        .try_init()
        .map_err(already_installed)
}
