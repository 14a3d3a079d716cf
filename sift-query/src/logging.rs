//! Logging setup for Sift.
//!
//! Events are emitted through `tracing`; installing a subscriber is left to
//! the application unless the `tracing-subscriber` feature is enabled.
//!
//! # Environment Variables
//!
//! - `SIFT_DEBUG=true|1|yes` - Enable debug logging
//! - `SIFT_LOG_LEVEL=trace|debug|info|warn|error` - Set a specific level
//! - `SIFT_LOG_FORMAT=json|pretty|compact` - Set output format (default: json)
//!
//! Environment variables take precedence over the `[debug]` table of
//! [`SiftConfig`](crate::config::SiftConfig).
//!
//! ```rust,no_run
//! use sift_query::logging;
//!
//! logging::init();
//! ```

use std::env;
use std::fmt;
use std::sync::Once;

use serde::{Deserialize, Serialize};

use crate::config::DebugConfig;

static INIT: Once = Once::new();

/// Log level accepted by `SIFT_LOG_LEVEL` and the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Everything, including per-record evaluation.
    Trace,
    /// Predicate construction and SQL rendering.
    Debug,
    /// Initialisation messages.
    Info,
    /// Warnings only.
    #[default]
    Warn,
    /// Errors only.
    Error,
}

impl LogLevel {
    /// Parse a level name, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Some(Self::Trace),
            "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warn" => Some(Self::Warn),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    /// Directive name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output format of the installed subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per event.
    #[default]
    Json,
    /// Multi-line human readable output.
    Pretty,
    /// Single-line output.
    Compact,
}

impl LogFormat {
    /// Parse a format name; unknown names fall back to JSON.
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "pretty" => Self::Pretty,
            "compact" => Self::Compact,
            _ => Self::Json,
        }
    }
}

fn flag_enabled(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "1" | "yes")
}

/// Check if debug logging is enabled via `SIFT_DEBUG`.
#[inline]
pub fn is_debug_enabled() -> bool {
    env::var("SIFT_DEBUG").map(|v| flag_enabled(&v)).unwrap_or(false)
}

/// Resolved logging settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogSettings {
    /// Maximum level emitted.
    pub level: LogLevel,
    /// Output format.
    pub format: LogFormat,
    /// Whether anything asked for logging at all.
    pub requested: bool,
}

impl LogSettings {
    /// Resolve from raw env values, falling back to the config table.
    ///
    /// An unknown level name behaves as if it were unset.
    pub fn resolve(
        debug_var: Option<&str>,
        level_var: Option<&str>,
        format_var: Option<&str>,
        config: &DebugConfig,
    ) -> Self {
        let debug = debug_var.is_some_and(flag_enabled) || config.enabled;
        let explicit = level_var.and_then(LogLevel::parse).or(config.level);
        let level = explicit.unwrap_or(if debug { LogLevel::Debug } else { LogLevel::Warn });
        let format = format_var.map(LogFormat::parse).unwrap_or(config.format);

        Self {
            level,
            format,
            requested: debug || explicit.is_some(),
        }
    }

    /// Resolve from the process environment.
    pub fn from_env(config: &DebugConfig) -> Self {
        let debug = env::var("SIFT_DEBUG").ok();
        let level = env::var("SIFT_LOG_LEVEL").ok();
        let format = env::var("SIFT_LOG_FORMAT").ok();
        Self::resolve(debug.as_deref(), level.as_deref(), format.as_deref(), config)
    }

    /// The `EnvFilter` directive covering sift's crates.
    pub fn directive(&self) -> String {
        format!("sift={},sift_query={}", self.level, self.level)
    }
}

/// Initialize logging from the environment. Subsequent calls are no-ops.
pub fn init() {
    init_with_config(&DebugConfig::default());
}

/// Initialize logging from the environment and a config `[debug]` table.
///
/// Does nothing unless debug output was requested, or without the
/// `tracing-subscriber` feature.
pub fn init_with_config(config: &DebugConfig) {
    INIT.call_once(|| {
        let settings = LogSettings::from_env(config);
        if !settings.requested {
            return;
        }
        install(settings);
    });
}

#[cfg(feature = "tracing-subscriber")]
fn install(settings: LogSettings) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_new(settings.directive()).unwrap_or_else(|_| EnvFilter::new("warn"));
    let registry = tracing_subscriber::registry().with(filter);

    let installed = match settings.format {
        LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
        LogFormat::Compact => registry.with(fmt::layer().compact()).try_init(),
        LogFormat::Pretty => registry.with(fmt::layer().pretty()).try_init(),
    };

    if installed.is_ok() {
        tracing::info!(level = %settings.level, format = ?settings.format, "Sift logging initialized");
    }
}

#[cfg(not(feature = "tracing-subscriber"))]
fn install(_settings: LogSettings) {}

/// Debug-level event, emitted only when `SIFT_DEBUG` is set.
#[macro_export]
macro_rules! sift_debug {
    ($($arg:tt)*) => {
        if $crate::logging::is_debug_enabled() {
            tracing::debug!($($arg)*);
        }
    };
}

/// Trace-level event, emitted only when `SIFT_DEBUG` is set.
#[macro_export]
macro_rules! sift_trace {
    ($($arg:tt)*) => {
        if $crate::logging::is_debug_enabled() {
            tracing::trace!($($arg)*);
        }
    };
}
