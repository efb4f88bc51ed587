//! RB-011: Logging setup — tracing subscriber writing to stderr.
//!
//! Stdout carries results (text or JSON); all diagnostics go to stderr.
//! `RUST_LOG` overrides the default filter and `LOG_FORMAT` picks
//! `pretty`, `compact` or `json`.

use std::env;
use std::io;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
    Compact,
}

impl LogFormat {
    fn parse(value: Option<&str>) -> Self {
        match value {
            Some("json") => Self::Json,
            Some("compact") => Self::Compact,
            _ => Self::Pretty,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Default directive when `RUST_LOG` is unset
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn,recipe_beam=info".into(),
            format: LogFormat::default(),
        }
    }
}

impl LoggingConfig {
    /// Read `LOG_FORMAT`; `verbose` raises the crate's level to debug.
    pub fn from_env(verbose: bool) -> Self {
        let level = if verbose {
            "warn,recipe_beam=debug"
        } else {
            "warn,recipe_beam=info"
        };
        Self {
            level: level.into(),
            format: LogFormat::parse(env::var("LOG_FORMAT").ok().as_deref()),
        }
    }

    fn filter(&self) -> EnvFilter {
        env::var("RUST_LOG")
            .ok()
            .and_then(|directive| EnvFilter::try_new(directive).ok())
            .unwrap_or_else(|| EnvFilter::new(&self.level))
    }

    /// Install the global subscriber. A second call is a no-op.
    pub fn init(&self) {
        let registry = tracing_subscriber::registry().with(self.filter());
        let result = match self.format {
            LogFormat::Json => registry
                .with(fmt::layer().json().with_writer(io::stderr))
                .try_init(),
            LogFormat::Pretty => registry
                .with(fmt::layer().with_target(false).with_writer(io::stderr))
                .try_init(),
            LogFormat::Compact => registry
                .with(
                    fmt::layer()
                        .compact()
                        .with_target(false)
                        .with_writer(io::stderr),
                )
                .try_init(),
        };
        // Err means a subscriber is already installed
        let _ = result;
    }
}
