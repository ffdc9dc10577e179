//! Logger Module
//!
//! A logging setup based on `tracing-subscriber` with support for:
//! - Console output with color control
//! - File output with multiple formats (Full, Compact, JSON)
//! - Level filtering through `EnvFilter`

pub mod config;
pub mod error;
pub(crate) mod writer;

#[cfg(test)]
mod tests;

pub use config::*;
pub use error::LoggerError;

use std::io::IsTerminal;

use tracing::Subscriber;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// A fully assembled subscriber, ready to be installed.
pub(crate) type BoxedSubscriber = Box<dyn Subscriber + Send + Sync + 'static>;

/// Install the global tracing subscriber for the given configuration.
///
/// Fails if a global subscriber is already set.
pub fn init_logger(config: LoggerConfig) -> anyhow::Result<()> {
    let subscriber = build_subscriber(&config)?;
    subscriber
        .try_init()
        .map_err(|e| LoggerError::subscriber(e.to_string()))?;
    Ok(())
}

/// Assemble the subscriber `init_logger` would install.
pub(crate) fn build_subscriber(config: &LoggerConfig) -> anyhow::Result<BoxedSubscriber> {
    config.validate()?;

    let filter = build_filter(&config.level);

    let subscriber = match (config.console.enabled, config.file.enabled) {
        (true, true) => build_both(config, filter)?,
        (true, false) => build_console_only(&config.console, filter),
        (false, true) => build_file_only(&config.file, filter)?,
        (false, false) => anyhow::bail!("At least one output (console or file) must be enabled"),
    };

    Ok(subscriber)
}

/// Level directives, falling back to `info` when unparsable.
fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
}

fn build_console_only(config: &ConsoleConfig, filter: EnvFilter) -> BoxedSubscriber {
    let use_ansi = config.colored && std::io::stdout().is_terminal();

    Box::new(
        tracing_subscriber::registry().with(filter).with(
            fmt::layer()
                .with_ansi(use_ansi)
                .with_target(true)
                .with_level(true),
        ),
    )
}

fn build_file_only(config: &FileConfig, filter: EnvFilter) -> Result<BoxedSubscriber, LoggerError> {
    let writer = writer::open_log_file(config)?;
    let registry = tracing_subscriber::registry().with(filter);

    let subscriber: BoxedSubscriber = match config.format {
        LogFormat::Full => Box::new(
            registry.with(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(true)
                    .with_writer(writer),
            ),
        ),
        LogFormat::Compact => Box::new(
            registry.with(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(true)
                    .compact()
                    .with_writer(writer),
            ),
        ),
        LogFormat::Json => Box::new(
            registry.with(fmt::layer().with_ansi(false).json().with_writer(writer)),
        ),
    };
    Ok(subscriber)
}

fn build_both(config: &LoggerConfig, filter: EnvFilter) -> Result<BoxedSubscriber, LoggerError> {
    let use_ansi = config.console.colored && std::io::stdout().is_terminal();
    let writer = writer::open_log_file(&config.file)?;
    let registry = tracing_subscriber::registry().with(filter);

    // File layer goes first so console ANSI settings never leak into the file
    // (tokio-rs/tracing#1817).
    let subscriber: BoxedSubscriber = match config.file.format {
        LogFormat::Full => {
            let file_layer = fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(writer);

            let console_layer = fmt::layer()
                .with_ansi(use_ansi)
                .with_target(true)
                .with_level(true);

            Box::new(registry.with(file_layer).with(console_layer))
        }
        LogFormat::Compact => {
            let file_layer = fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .compact()
                .with_writer(writer);

            let console_layer = fmt::layer()
                .with_ansi(use_ansi)
                .with_target(true)
                .with_level(true);

            Box::new(registry.with(file_layer).with(console_layer))
        }
        LogFormat::Json => {
            let file_layer = fmt::layer().with_ansi(false).json().with_writer(writer);

            let console_layer = fmt::layer()
                .with_ansi(use_ansi)
                .with_target(true)
                .with_level(true);

            Box::new(registry.with(file_layer).with(console_layer))
        }
    };
    Ok(subscriber)
}
