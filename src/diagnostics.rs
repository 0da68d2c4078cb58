//! Subscriber setup for the crate's own `tracing` events.
//!
//! Path fallbacks, writer failures and session transitions are reported via
//! `tracing`, never through the log files themselves. Applications that
//! already install a subscriber get these events for free; the helper below
//! is for those that don't.

use crate::config::DiagnosticsConfig;
use crate::Result;
#[cfg(feature = "diagnostics")]
use crate::Error;
#[cfg(feature = "diagnostics")]
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

/// Install a global subscriber for diagnostic events on stderr.
///
/// # Errors
///
/// Returns [`Error::Init`] if the filter is invalid or a global subscriber
/// is already installed.
#[cfg(feature = "diagnostics")]
pub fn init_diagnostics(config: &DiagnosticsConfig, cli_verbose: Option<u8>) -> Result<()> {
    let log_spec = effective_log_spec(config, cli_verbose);
    let env_filter = EnvFilter::try_new(&log_spec).map_err(|e| Error::Init(e.to_string()))?;

    if !config.console {
        return tracing_subscriber::registry()
            .with(env_filter)
            .try_init()
            .map_err(|e| Error::Init(e.to_string()));
    }

    let fmt_layer_builder = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(true);

    let fmt_layer = if config.format == "json" {
        fmt_layer_builder.json().boxed()
    } else {
        fmt_layer_builder.boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| Error::Init(e.to_string()))
}

#[cfg(not(feature = "diagnostics"))]
pub fn init_diagnostics(_config: &DiagnosticsConfig, _cli_verbose: Option<u8>) -> Result<()> {
    tracing::warn!("diagnostics feature not enabled: initialization is a no-op");
    Ok(())
}

/// Determine the effective filter, considering `RUST_LOG` and CLI overrides.
#[cfg_attr(not(feature = "diagnostics"), allow(dead_code))]
fn effective_log_spec(config: &DiagnosticsConfig, cli_verbose: Option<u8>) -> String {
    if let Ok(rust_log) = std::env::var("RUST_LOG")
        && !rust_log.is_empty()
    {
        return rust_log;
    }

    if let Some(verbose) = cli_verbose {
        return match verbose {
            0 => config.level.clone(),
            1 => format!("{},cerddolog=debug", config.level),
            2 => format!("{},cerddolog=trace", config.level),
            _ => "trace".to_string(),
        };
    }

    if config.level.is_empty() {
        "info,cerddolog=info".to_string()
    } else {
        format!("{},cerddolog={}", config.level, config.level)
    }
}
