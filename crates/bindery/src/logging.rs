//! Logging setup built on `tracing-subscriber`.
//!
//! The engine only emits `tracing` events; nothing is printed until the
//! application installs a subscriber. This module installs one, either by hand
//! or from a [`LoggingConfig`] that was itself bound from configuration.
//!
//! # Configuration-Based Initialization
//!
//! ```rust,ignore
//! use bindery::logging::{self, LoggingConfig};
//! use bindery::{Binder, Configurable};
//!
//! #[derive(Default, Configurable)]
//! struct AppConfig {
//!     #[config("logging,optional")]
//!     logging: LoggingConfig,
//! }
//!
//! let mut config = AppConfig::default();
//! Binder::layered("gateway")?.bind(&mut config)?;
//! logging::init_from_config(&config.logging);
//! ```
//!
//! # Manual Initialization
//!
//! ```rust,ignore
//! use bindery::logging::{LoggingBuilder, SpanEvents};
//!
//! LoggingBuilder::new()
//!     .directive("bindery=trace")
//!     .span_events(SpanEvents::LIFECYCLE)
//!     .init();
//! ```

use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;
use tracing::warn;
use tracing_subscriber::prelude::*;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, fmt as subscriber_fmt};

use crate::configurable::Configurable;
use crate::error::Mismatch;
use crate::shape::Shape;
use crate::value::Value;

/// An unrecognised keyword for one of the logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {setting} `{value}` (expected one of: {})", .expected.join(", "))]
pub struct UnknownKeyword {
    pub setting: &'static str,
    pub value: String,
    pub expected: &'static [&'static str],
}

/// Declares a keyword enum that parses from, and binds as, a string leaf.
macro_rules! keyword_setting {
    (
        $(#[$meta:meta])*
        $name:ident as $setting:literal {
            $($(#[$vmeta:meta])* $variant:ident => [$primary:literal $(, $alias:literal)*]),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
        pub enum $name {
            $($(#[$vmeta])* $variant,)*
        }

        impl $name {
            pub const KEYWORDS: &'static [&'static str] = &[$($primary),*];

            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $primary,)*
                }
            }
        }

        impl FromStr for $name {
            type Err = UnknownKeyword;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_ascii_lowercase().as_str() {
                    $($primary $(| $alias)* => Ok(Self::$variant),)*
                    _ => Err(UnknownKeyword {
                        setting: $setting,
                        value: s.to_string(),
                        expected: Self::KEYWORDS,
                    }),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Configurable for $name {
            fn shape(&self) -> Shape {
                Shape::String
            }

            fn assign(&mut self, value: Value) -> Result<(), Mismatch> {
                let Value::String(raw) = &value else {
                    return Err(Mismatch::new(Shape::String, &value));
                };
                *self = raw.parse().map_err(|e: UnknownKeyword| Mismatch {
                    expected: Shape::String,
                    found: e.to_string(),
                })?;
                Ok(())
            }
        }
    };
}

keyword_setting! {
    /// Global log level.
    LogLevel as "log level" {
        Trace => ["trace"],
        Debug => ["debug"],
        #[default]
        Info => ["info"],
        Warn => ["warn", "warning"],
        Error => ["error"],
    }
}

keyword_setting! {
    /// Log line format.
    LogFormat as "log format" {
        #[default]
        Compact => ["compact"],
        Full => ["full"],
        Pretty => ["pretty"],
        Json => ["json"],
    }
}

keyword_setting! {
    /// Log destination.
    LogOutput as "log output" {
        #[default]
        Stdout => ["stdout"],
        Stderr => ["stderr"],
        File => ["file"],
    }
}

impl LogLevel {
    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

/// Span event configuration for logging.
///
/// Each bind runs inside a `resolve` span; these flags control which of its
/// lifecycle events are logged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, crate::Configurable)]
pub struct SpanEvents {
    /// Log when a span is created.
    #[config(",optional")]
    pub new: bool,
    /// Log when a span is entered.
    #[config(",optional")]
    pub enter: bool,
    /// Log when a span is exited.
    #[config(",optional")]
    pub exit: bool,
    /// Log when a span is closed.
    #[config(",optional")]
    pub close: bool,
}

impl SpanEvents {
    /// No span events will be logged.
    pub const NONE: Self = Self {
        new: false,
        enter: false,
        exit: false,
        close: false,
    };

    /// Log span creation and close events.
    pub const LIFECYCLE: Self = Self {
        new: true,
        enter: false,
        exit: false,
        close: true,
    };

    /// Log all span events.
    pub const FULL: Self = Self {
        new: true,
        enter: true,
        exit: true,
        close: true,
    };

    fn to_fmt_span(self) -> subscriber_fmt::format::FmtSpan {
        use subscriber_fmt::format::FmtSpan;

        let mut span = FmtSpan::NONE;
        if self.new {
            span |= FmtSpan::NEW;
        }
        if self.enter {
            span |= FmtSpan::ENTER;
        }
        if self.exit {
            span |= FmtSpan::EXIT;
        }
        if self.close {
            span |= FmtSpan::CLOSE;
        }
        span
    }
}

/// The logging section of an application's configuration.
///
/// Every key is optional, so an empty section yields [`LoggingConfig::default`].
///
/// ```toml
/// [logging]
/// level = "debug"
/// format = "pretty"
/// output = "file"
/// file-path = "/var/log/gateway.log"
///
/// [logging.filters]
/// bindery = "trace"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, crate::Configurable)]
pub struct LoggingConfig {
    #[config(",optional")]
    pub level: LogLevel,
    #[config(",optional")]
    pub format: LogFormat,
    #[config(",optional")]
    pub output: LogOutput,
    #[config(",optional")]
    pub file_path: Option<PathBuf>,
    #[config(",optional")]
    pub thread_ids: bool,
    #[config(",optional")]
    pub file_location: bool,
    #[config(",optional")]
    pub span_events: SpanEvents,
    /// Per-target levels, e.g. `bindery = "trace"`.
    #[config(",optional")]
    pub filters: BTreeMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Compact,
            output: LogOutput::Stdout,
            file_path: None,
            thread_ids: false,
            file_location: false,
            span_events: SpanEvents::NONE,
            filters: BTreeMap::new(),
        }
    }
}

// =============================================================================
// Configuration-Based Initialization
// =============================================================================

/// Initialize logging from a [`LoggingConfig`].
///
/// Does nothing if a global subscriber is already installed.
pub fn init_from_config(config: &LoggingConfig) {
    let _ = LoggingBuilder::from_config(config).try_init();
}

// =============================================================================
// LoggingBuilder
// =============================================================================

/// A builder for configuring logging.
///
/// ```rust,ignore
/// use bindery::logging::{LogOutput, LoggingBuilder};
/// use tracing::Level;
///
/// LoggingBuilder::new()
///     .with_level(Level::DEBUG)
///     .output(LogOutput::Stderr)
///     .with_thread_ids(true)
///     .init();
/// ```
#[derive(Debug, Default)]
pub struct LoggingBuilder {
    directives: Vec<String>,
    level: Option<tracing::Level>,
    span_events: SpanEvents,
    format: LogFormat,
    output: LogOutput,
    with_target: bool,
    with_thread_ids: bool,
    with_file: bool,
    with_line_number: bool,
    file_path: Option<PathBuf>,
}

impl LoggingBuilder {
    pub fn new() -> Self {
        Self {
            with_target: true,
            ..Default::default()
        }
    }

    pub fn from_config(config: &LoggingConfig) -> Self {
        let mut builder = Self::new();

        builder.level = Some(config.level.to_tracing_level());
        builder.format = config.format;
        builder.output = config.output;
        builder.span_events = config.span_events;

        builder.with_thread_ids = config.thread_ids;
        builder.with_file = config.file_location;
        builder.with_line_number = config.file_location;
        builder.file_path.clone_from(&config.file_path);

        for (target, level) in &config.filters {
            builder.directives.push(format!("{target}={level}"));
        }

        builder
    }

    /// Set the global log level.
    pub fn with_level(mut self, level: tracing::Level) -> Self {
        self.level = Some(level);
        self
    }

    /// Add a filter directive such as `bindery::driver=trace`.
    pub fn directive(mut self, directive: &str) -> Self {
        self.directives.push(directive.to_string());
        self
    }

    pub fn span_events(mut self, events: SpanEvents) -> Self {
        self.span_events = events;
        self
    }

    pub fn format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn output(mut self, output: LogOutput) -> Self {
        self.output = output;
        self
    }

    /// Include the target (module path) in log output.
    pub fn with_target(mut self, enabled: bool) -> Self {
        self.with_target = enabled;
        self
    }

    pub fn with_thread_ids(mut self, enabled: bool) -> Self {
        self.with_thread_ids = enabled;
        self
    }

    pub fn with_file(mut self, enabled: bool) -> Self {
        self.with_file = enabled;
        self
    }

    pub fn with_line_number(mut self, enabled: bool) -> Self {
        self.with_line_number = enabled;
        self
    }

    /// Set file path for file output.
    pub fn file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    fn build_filter(&self) -> EnvFilter {
        let base_level = self.level.unwrap_or(tracing::Level::INFO);
        let base_filter = base_level.to_string().to_lowercase();

        // RUST_LOG takes precedence over the configured level
        let mut filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&base_filter));

        for directive in &self.directives {
            if let Ok(d) = directive.parse() {
                filter = filter.add_directive(d);
            }
        }

        filter
    }

    /// Initialize the logging system, ignoring an already installed subscriber.
    pub fn init(self) {
        let _ = self.try_init();
    }

    /// Try to initialize the logging system, returning an error on failure.
    pub fn try_init(self) -> Result<(), TryInitError> {
        let filter = self.build_filter();
        let span_events = self.span_events.to_fmt_span();

        macro_rules! configure_layer {
            ($layer:expr) => {
                $layer
                    .with_span_events(span_events.clone())
                    .with_target(self.with_target)
                    .with_thread_ids(self.with_thread_ids)
                    .with_file(self.with_file)
                    .with_line_number(self.with_line_number)
            };
        }

        macro_rules! init_with_writer {
            ($writer:expr) => {
                match self.format {
                    #[cfg(feature = "json-log")]
                    LogFormat::Json => {
                        let layer = subscriber_fmt::layer()
                            .json()
                            .with_span_events(span_events.clone())
                            .with_writer($writer);
                        tracing_subscriber::registry()
                            .with(layer)
                            .with(filter)
                            .try_init()
                    }
                    #[cfg(not(feature = "json-log"))]
                    LogFormat::Json => {
                        eprintln!("JSON logging requires the `json-log` feature, using compact");
                        let layer =
                            configure_layer!(subscriber_fmt::layer().compact().with_writer($writer));
                        tracing_subscriber::registry()
                            .with(layer)
                            .with(filter)
                            .try_init()
                    }
                    LogFormat::Compact => {
                        let layer =
                            configure_layer!(subscriber_fmt::layer().compact().with_writer($writer));
                        tracing_subscriber::registry()
                            .with(layer)
                            .with(filter)
                            .try_init()
                    }
                    LogFormat::Full => {
                        let layer = configure_layer!(subscriber_fmt::layer().with_writer($writer));
                        tracing_subscriber::registry()
                            .with(layer)
                            .with(filter)
                            .try_init()
                    }
                    LogFormat::Pretty => {
                        let layer =
                            configure_layer!(subscriber_fmt::layer().pretty().with_writer($writer));
                        tracing_subscriber::registry()
                            .with(layer)
                            .with(filter)
                            .try_init()
                    }
                }
            };
        }

        match self.output {
            LogOutput::Stdout => init_with_writer!(std::io::stdout),
            LogOutput::Stderr => init_with_writer!(std::io::stderr),
            LogOutput::File => {
                if let Some(path) = &self.file_path {
                    let file_appender = tracing_appender::rolling::never(
                        path.parent().unwrap_or_else(|| Path::new(".")),
                        path.file_name().unwrap_or_else(|| OsStr::new("bindery.log")),
                    );
                    init_with_writer!(file_appender)
                } else {
                    let result = init_with_writer!(std::io::stdout);
                    warn!("File output requested but no file path configured, logging to stdout");
                    result
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MapSource, bind};
    use serde_json::json;

    #[test]
    fn test_keyword_parse() {
        assert_eq!("DEBUG".parse::<LogLevel>(), Ok(LogLevel::Debug));
        assert_eq!("warning".parse::<LogLevel>(), Ok(LogLevel::Warn));
        assert_eq!("pretty".parse::<LogFormat>(), Ok(LogFormat::Pretty));
        assert_eq!("stderr".parse::<LogOutput>(), Ok(LogOutput::Stderr));

        let err = "loud".parse::<LogLevel>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "unknown log level `loud` (expected one of: trace, debug, info, warn, error)"
        );
    }

    #[test]
    fn test_keyword_assign() {
        let mut format = LogFormat::default();
        format.assign(Value::from("full")).unwrap();
        assert_eq!(format, LogFormat::Full);

        let err = format.assign(Value::from("fancy")).unwrap_err();
        assert!(err.found.contains("unknown log format `fancy`"));
        assert!(format.assign(Value::Integer(1)).is_err());
    }

    #[test]
    fn test_bind_empty_section_keeps_defaults() {
        let mut config = LoggingConfig::default();
        bind(&mut config, &[&MapSource::default()]).unwrap();
        assert_eq!(config, LoggingConfig::default());
    }

    #[test]
    fn test_bind_logging_section() {
        let source = MapSource::from_json(json!({
            "level": "debug",
            "format": "pretty",
            "output": "file",
            "file-path": "/tmp/app.log",
            "thread-ids": true,
            "span-events": { "close": true },
            "filters": { "bindery": "trace", "hyper": "warn" },
        }));
        let mut config = LoggingConfig::default();
        bind(&mut config, &[&source]).unwrap();

        assert_eq!(config.level, LogLevel::Debug);
        assert_eq!(config.format, LogFormat::Pretty);
        assert_eq!(config.output, LogOutput::File);
        assert_eq!(config.file_path, Some(PathBuf::from("/tmp/app.log")));
        assert!(config.thread_ids);
        assert!(!config.file_location);
        assert_eq!(
            config.span_events,
            SpanEvents {
                close: true,
                ..SpanEvents::NONE
            }
        );
        assert_eq!(config.filters.get("hyper").map(String::as_str), Some("warn"));
    }

    #[test]
    fn test_builder_from_config() {
        let mut config = LoggingConfig {
            level: LogLevel::Trace,
            file_location: true,
            ..Default::default()
        };
        config
            .filters
            .insert("bindery::driver".to_string(), "debug".to_string());

        let builder = LoggingBuilder::from_config(&config);
        assert_eq!(builder.level, Some(tracing::Level::TRACE));
        assert!(builder.with_file && builder.with_line_number);
        assert!(builder.with_target);
        assert_eq!(builder.directives, vec!["bindery::driver=debug"]);
    }
}
