//! Tracing subscriber setup shared by the binaries.
//!
//! `RUST_LOG` takes precedence over the configured level. `LOG_FORMAT=json` switches the
//! output to one JSON object per line.

use std::env;
use std::io;

use tracing_subscriber::filter::Directive;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt};

/// Output format for log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

impl LogFormat {
    /// Parses a `LOG_FORMAT` value. Anything but `json` (in any case) is text.
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
    /// Output format.
    pub format: LogFormat,
}

impl LoggingConfig {
    /// Reads `LOG_FORMAT` from the environment; `verbose` raises the default level to debug.
    pub fn from_env(verbose: bool) -> Self {
        Self {
            level: if verbose { "debug" } else { "info" }.to_string(),
            format: env::var("LOG_FORMAT")
                .map(|v| LogFormat::parse(&v))
                .unwrap_or_default(),
        }
    }

    fn filter(&self) -> EnvFilter {
        let filter = match env::var("RUST_LOG") {
            Ok(directives) => EnvFilter::new(directives),
            Err(_) => EnvFilter::new(&self.level),
        };
        match "sqlx::query=warn".parse::<Directive>() {
            Ok(directive) => filter.add_directive(directive),
            Err(_) => filter,
        }
    }

    /// Installs the global subscriber.
    ///
    /// # Errors
    ///
    /// Fails if a global subscriber has already been installed.
    pub fn init(&self) -> Result<(), TryInitError> {
        let registry = tracing_subscriber::registry().with(self.filter());
        match self.format {
            LogFormat::Json => registry
                .with(fmt::layer().json().with_writer(io::stderr))
                .try_init(),
            LogFormat::Text => registry
                .with(fmt::layer().with_writer(io::stderr))
                .try_init(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_format_parse() {
        assert_eq!(LogFormat::parse("json"), LogFormat::Json);
        assert_eq!(LogFormat::parse(" JSON "), LogFormat::Json);
        assert_eq!(LogFormat::parse("pretty"), LogFormat::Text);
        assert_eq!(LogFormat::parse(""), LogFormat::Text);
    }

    #[test]
    fn verbose_raises_level() {
        assert_eq!(LoggingConfig::from_env(true).level, "debug");
        assert_eq!(LoggingConfig::from_env(false).level, "info");
    }
}
