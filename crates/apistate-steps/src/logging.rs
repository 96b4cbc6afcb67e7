//! Structured logging setup using tracing.

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::StateConfig;

/// Install a global subscriber: `RUST_LOG` when set, the configured filter otherwise.
///
/// Calling it again after a subscriber is installed returns an error, which
/// test runners starting several suites may ignore.
pub fn init_logging(config: &StateConfig) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .context("Invalid log filter")?;

    let registry = tracing_subscriber::registry().with(env_filter);

    if config.json_logging {
        registry
            .with(fmt::layer().json().with_current_span(true).with_target(true))
            .try_init()
            .context("Failed to set global default subscriber")?;
    } else {
        registry
            .with(fmt::layer().pretty().with_target(true))
            .try_init()
            .context("Failed to set global default subscriber")?;
    }

    info!(
        log_format = if config.json_logging { "json" } else { "text" },
        filter = %config.log_filter,
        "Logging initialized"
    );

    Ok(())
}

/// Trait to add log context to results
pub trait LogExt<T, E> {
    /// Log the error at warn level before returning it
    fn log_err(self, message: &str) -> Result<T, E>;
}

impl<T, E: std::fmt::Display> LogExt<T, E> for Result<T, E> {
    fn log_err(self, message: &str) -> Result<T, E> {
        if let Err(ref e) = self {
            tracing::warn!("{}: {}", message, e);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_err_passes_result_through() {
        let ok: Result<u8, String> = Ok(1);
        assert_eq!(ok.log_err("should not log"), Ok(1));

        let err: Result<u8, String> = Err("boom".to_string());
        assert_eq!(err.log_err("step failed"), Err("boom".to_string()));
    }

    #[test]
    fn test_second_init_reports_error() {
        let config = StateConfig::default();
        let _ = init_logging(&config);
        assert!(init_logging(&config).is_err());
    }
}
