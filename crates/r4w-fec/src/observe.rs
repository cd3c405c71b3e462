//! # Structured Logging
//!
//! The codec emits `tracing` events: `debug` when codes and decoders are
//! built or the polynomial table changes, `trace` on every metric
//! renormalisation, `warn` on invalid decoder handles. Applications that
//! already install a subscriber need nothing from this module; the rest can
//! call [`init_logging`].
//!
//! ## Example
//!
//! ```rust,ignore
//! use r4w_fec::observe::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::development());
//! tracing::info!(frames = 16, "Decoding batch");
//! ```

use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Layer, Registry};

/// Log level configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Per-step events such as renormalisation
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per event
    Json,
    #[default]
    Pretty,
    /// One line per event
    Compact,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    pub timestamps: bool,
    /// Include source file and line
    pub source_location: bool,
    pub thread_ids: bool,
    pub thread_names: bool,
    /// Directive string overriding `level`, e.g. `"r4w_fec=trace"`
    pub filter: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Pretty,
            timestamps: true,
            source_location: false,
            thread_ids: false,
            thread_names: false,
            filter: None,
        }
    }
}

impl LogConfig {
    /// Verbose, pretty output with codec construction events.
    pub fn development() -> Self {
        Self {
            level: LogLevel::Debug,
            source_location: true,
            thread_names: true,
            ..Default::default()
        }
    }

    /// JSON output at info level.
    pub fn production() -> Self {
        Self {
            format: LogFormat::Json,
            thread_ids: true,
            ..Default::default()
        }
    }

    /// Errors only.
    pub fn quiet() -> Self {
        Self {
            level: LogLevel::Error,
            format: LogFormat::Compact,
            timestamps: false,
            ..Default::default()
        }
    }

    /// Filter directive used when `RUST_LOG` is unset.
    pub fn directive(&self) -> String {
        match &self.filter {
            Some(custom) => custom.clone(),
            None => self.level.to_string(),
        }
    }

    fn env_filter(&self) -> EnvFilter {
        if let Some(custom) = &self.filter {
            return EnvFilter::try_new(custom).unwrap_or_else(|_| EnvFilter::new(self.level.to_string()));
        }
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.directive()))
    }

    fn format_layer(&self) -> Box<dyn Layer<Registry> + Send + Sync> {
        let base = fmt::layer()
            .with_file(self.source_location)
            .with_line_number(self.source_location)
            .with_thread_ids(self.thread_ids)
            .with_thread_names(self.thread_names);

        match (self.format, self.timestamps) {
            (LogFormat::Json, true) => base.json().boxed(),
            (LogFormat::Json, false) => base.json().without_time().boxed(),
            (LogFormat::Pretty, true) => base.pretty().boxed(),
            (LogFormat::Pretty, false) => base.pretty().without_time().boxed(),
            (LogFormat::Compact, true) => base.compact().boxed(),
            (LogFormat::Compact, false) => base.compact().without_time().boxed(),
        }
    }
}

/// Install the global subscriber described by `config`.
///
/// Returns `false` if a global subscriber was already installed, in which
/// case nothing changes.
pub fn init_logging(config: &LogConfig) -> bool {
    let subscriber = tracing_subscriber::registry()
        .with(config.format_layer())
        .with(config.env_filter());
    tracing::subscriber::set_global_default(subscriber).is_ok()
}
