// src/logging.rs

//! Log filter resolution and subscriber setup for the `schedgraph` binary.
//!
//! The filter is taken from `--log-level` (scoped to this crate), else from
//! `SCHEDGRAPH_LOG` as full `EnvFilter` directives (`schedgraph=debug,tokio=warn`),
//! else `schedgraph=info`. Logs go to stderr; stdout carries command results.

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::LogLevel;

/// Environment variable read when no `--log-level` is given.
pub const LOG_ENV: &str = "SCHEDGRAPH_LOG";

const DEFAULT_DIRECTIVES: &str = "schedgraph=info";

/// Install the global subscriber. Fails if one is already set.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env = std::env::var(LOG_ENV).ok();
    let filter = build_filter(cli_level, env.as_deref())?;

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialise logging: {e}"))?;

    Ok(())
}

/// Resolve the filter from the flag and the raw `SCHEDGRAPH_LOG` value.
///
/// A blank variable counts as unset. Malformed directives are an error
/// rather than silently falling back.
pub fn build_filter(cli_level: Option<LogLevel>, env: Option<&str>) -> Result<EnvFilter> {
    if let Some(level) = cli_level {
        return Ok(EnvFilter::new(format!("schedgraph={}", directive(level))));
    }

    match env.map(str::trim).filter(|s| !s.is_empty()) {
        Some(directives) => EnvFilter::try_new(directives)
            .with_context(|| format!("invalid {LOG_ENV} value {directives:?}")),
        None => Ok(EnvFilter::new(DEFAULT_DIRECTIVES)),
    }
}

fn directive(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}
