//! Logging configuration for service-resolver
//!
//! The container emits `tracing` events under the `service_resolver` target.
//! This module installs a subscriber for them in one call.
//!
//! # Features
//!
//! - `logging` - Emit events (default)
//! - `logging-json` - Install a JSON subscriber (recommended for production)
//! - `logging-pretty` - Install a pretty subscriber (recommended for development)
//!
//! Without either subscriber feature the `init*` functions do nothing.
//!
//! # Example
//!
//! ```rust,ignore
//! use service_resolver::logging;
//!
//! // JSON if logging-json is enabled, pretty otherwise
//! logging::init();
//!
//! // Or configure explicitly
//! logging::builder()
//!     .with_level(tracing::Level::TRACE)
//!     .resolver_only()
//!     .compact()
//!     .init();
//! ```

use tracing::Level;

/// Target every event of this crate is emitted under
pub const TARGET: &str = "service_resolver";

/// Output format of the installed subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// JSON structured logging (production default)
    #[default]
    Json,
    /// Pretty multi-line output (development)
    Pretty,
    /// Compact single-line output
    Compact,
}

/// Builder for logging configuration
#[derive(Debug, Clone)]
#[cfg_attr(
    not(any(feature = "logging-json", feature = "logging-pretty")),
    allow(dead_code)
)]
pub struct LoggingBuilder {
    level: Level,
    format: LogFormat,
    target: Option<&'static str>,
    with_file: bool,
    with_line_number: bool,
    with_thread_ids: bool,
}

impl Default for LoggingBuilder {
    fn default() -> Self {
        Self {
            level: Level::DEBUG,
            format: LogFormat::Json,
            target: None,
            with_file: false,
            with_line_number: false,
            with_thread_ids: false,
        }
    }
}

impl LoggingBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the minimum log level
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Log every factory invocation
    pub fn trace(self) -> Self {
        self.with_level(Level::TRACE)
    }

    /// Log registrations, misses and cycles
    pub fn debug(self) -> Self {
        self.with_level(Level::DEBUG)
    }

    /// Only show logs from `target`
    pub fn with_target_filter(mut self, target: &'static str) -> Self {
        self.target = Some(target);
        self
    }

    /// Only show service-resolver logs
    pub fn resolver_only(self) -> Self {
        self.with_target_filter(TARGET)
    }

    pub fn with_file(mut self) -> Self {
        self.with_file = true;
        self
    }

    pub fn with_line_number(mut self) -> Self {
        self.with_line_number = true;
        self
    }

    pub fn with_thread_ids(mut self) -> Self {
        self.with_thread_ids = true;
        self
    }

    pub fn json(mut self) -> Self {
        self.format = LogFormat::Json;
        self
    }

    pub fn pretty(mut self) -> Self {
        self.format = LogFormat::Pretty;
        self
    }

    pub fn compact(mut self) -> Self {
        self.format = LogFormat::Compact;
        self
    }

    /// Directive string handed to `EnvFilter`
    #[cfg_attr(
        not(any(feature = "logging-json", feature = "logging-pretty")),
        allow(dead_code)
    )]
    fn filter_directive(&self) -> String {
        match self.target {
            Some(target) => format!("{}={}", target, self.level),
            None => self.level.to_string(),
        }
    }

    /// Install the configured subscriber as the global default.
    ///
    /// Does nothing if a global subscriber is already installed.
    #[cfg(any(feature = "logging-json", feature = "logging-pretty"))]
    pub fn init(self) {
        use tracing_subscriber::{EnvFilter, Layer, fmt, prelude::*};

        let filter = EnvFilter::new(self.filter_directive());

        let layer = fmt::layer()
            .with_file(self.with_file)
            .with_line_number(self.with_line_number)
            .with_thread_ids(self.with_thread_ids)
            .with_target(true);

        let layer = match self.format {
            #[cfg(feature = "logging-json")]
            LogFormat::Json => layer.json().boxed(),
            // Falls back to the default text format
            #[cfg(not(feature = "logging-json"))]
            LogFormat::Json => layer.boxed(),
            LogFormat::Pretty => layer.pretty().boxed(),
            LogFormat::Compact => layer.compact().boxed(),
        };

        // Err only means a subscriber is already installed.
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(layer)
            .try_init();
    }

    /// Initialize (no-op when subscriber features are not enabled)
    #[cfg(not(any(feature = "logging-json", feature = "logging-pretty")))]
    pub fn init(self) {}
}

/// Create a new logging builder
pub fn builder() -> LoggingBuilder {
    LoggingBuilder::new()
}

/// Initialize logging with default settings
///
/// Uses JSON format if `logging-json` is enabled, otherwise pretty.
pub fn init() {
    if cfg!(feature = "logging-json") {
        init_json();
    } else {
        init_pretty();
    }
}

/// Initialize JSON structured logging at DEBUG level
///
/// # Example output
/// ```json
/// {"timestamp":"2024-01-01T00:00:00.000Z","level":"DEBUG","fields":{"message":"Registering service factory","service":"u32","replaced":false,"service_count":1},"target":"service_resolver"}
/// ```
pub fn init_json() {
    builder().json().debug().init();
}

/// Initialize pretty logging at DEBUG level
pub fn init_pretty() {
    builder().pretty().debug().init();
}

/// Initialize logging for service-resolver events only
pub fn init_resolver_only() {
    builder().resolver_only().debug().init();
}
