//! Logging setup for the Phrasebook CLI
//!
//! This module provides:
//! - Structured logging setup on stderr (compact, full, JSON)
//! - Sensitive data redaction for anything echoed back to the user
//! - Performance timing spans

use crate::config::LoggingSettings;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::io::IsTerminal;
use tracing::{field, Span};
use tracing_subscriber::EnvFilter;

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter
    pub level: String,
    /// Output format: compact, full, json
    pub format: LogFormat,
    /// Include thread IDs
    pub thread_ids: bool,
    /// Include file and line numbers
    pub source_location: bool,
    /// Problems found before the subscriber exists, emitted once it does
    #[serde(skip)]
    pub deferred_warnings: Vec<String>,
}

/// Log output format
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LogFormat {
    /// Compact format for everyday use
    Compact,
    /// Full format with all details
    Full,
    /// JSON structured format
    Json,
}

impl LogFormat {
    /// Parse a format name, case-insensitively
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "compact" => Some(Self::Compact),
            "full" => Some(Self::Full),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Compact,
            thread_ids: false,
            source_location: false,
            deferred_warnings: Vec::new(),
        }
    }
}

impl LoggingConfig {
    /// Create logging config from verbosity level
    pub fn from_verbosity(verbosity: u8) -> Self {
        let mut config = Self::default();

        match verbosity {
            0 => {}
            1 => {
                config.level = "info".to_string();
            }
            2 => {
                config.level = "debug".to_string();
                config.source_location = true;
            }
            _ => {
                config.level = "trace".to_string();
                config.format = LogFormat::Full;
                config.source_location = true;
                config.thread_ids = true;
            }
        }

        config
    }

    /// Apply settings from the configuration file
    ///
    /// The file level only counts when no -v flag was given.
    pub fn apply_settings(&mut self, settings: &LoggingSettings, verbosity: u8) {
        if verbosity == 0 {
            if let Some(level) = &settings.level {
                self.level = level.clone();
            }
        }
        match LogFormat::from_name(&settings.format) {
            Some(format) => self.format = format,
            None => self.defer_invalid_format(&settings.format, "config file"),
        }
    }

    fn defer_invalid_format(&mut self, format: &str, origin: &str) {
        self.deferred_warnings.push(format!(
            "Invalid log format {:?} from {}, using {:?}",
            format, origin, self.format
        ));
    }

    /// Apply environment overrides
    pub fn merge_with_env(&mut self) {
        // RUST_LOG takes precedence
        if let Ok(rust_log) = std::env::var("RUST_LOG") {
            if !rust_log.trim().is_empty() {
                self.level = rust_log;
            }
        }

        if let Ok(format) = std::env::var("PHRASEBOOK_LOG_FORMAT") {
            match LogFormat::from_name(&format) {
                Some(parsed) => self.format = parsed,
                None => self.defer_invalid_format(&format, "PHRASEBOOK_LOG_FORMAT"),
            }
        }
    }
}

/// Initialize the global logging system
///
/// Logs go to stderr so command output on stdout stays machine readable.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let env_filter = EnvFilter::try_new(&config.level)
        .map_err(|e| Error::config(format!("Invalid log filter '{}': {}", config.level, e)))?;
    let ansi = std::io::stderr().is_terminal();

    // Separate arms keep the concrete subscriber types apart
    let result = match config.format {
        LogFormat::Compact => tracing::subscriber::set_global_default(
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_ansi(ansi)
                .with_thread_ids(config.thread_ids)
                .with_file(config.source_location)
                .with_line_number(config.source_location)
                .compact()
                .finish(),
        ),
        LogFormat::Json => tracing::subscriber::set_global_default(
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_ansi(false)
                .with_thread_ids(config.thread_ids)
                .with_file(config.source_location)
                .with_line_number(config.source_location)
                .json()
                .finish(),
        ),
        LogFormat::Full => tracing::subscriber::set_global_default(
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_ansi(ansi)
                .with_thread_ids(config.thread_ids)
                .with_file(config.source_location)
                .with_line_number(config.source_location)
                .finish(),
        ),
    };
    result.map_err(|e| Error::other(format!("Failed to initialize logging: {}", e)))?;

    for warning in &config.deferred_warnings {
        tracing::warn!("{}", warning);
    }
    tracing::debug!(config = ?config, "Logging system initialized");
    Ok(())
}

/// Create a span for a named CLI operation
pub fn create_operation_span(operation: &str, details: Option<&str>) -> Span {
    tracing::info_span!(
        "operation",
        operation = operation,
        details = details.unwrap_or(""),
        duration_ms = field::Empty,
    )
}

/// Sensitive data redaction utilities
pub mod redaction {
    use regex::Regex;
    use std::sync::OnceLock;

    static BOT_URL_REGEX: OnceLock<Option<Regex>> = OnceLock::new();
    static TOKEN_REGEX: OnceLock<Option<Regex>> = OnceLock::new();
    static API_KEY_REGEX: OnceLock<Option<Regex>> = OnceLock::new();

    fn compiled(cell: &'static OnceLock<Option<Regex>>, pattern: &str) -> Option<&'static Regex> {
        cell.get_or_init(|| Regex::new(pattern).ok()).as_ref()
    }

    /// Redact sensitive information from a string
    pub fn redact_sensitive(input: &str) -> String {
        let mut result = input.to_string();

        // Telegram puts the bot token in the URL path
        if let Some(regex) = compiled(&BOT_URL_REGEX, r"/bot[0-9]+:[A-Za-z0-9_-]+") {
            result = regex.replace_all(&result, "/bot***").to_string();
        }

        if let Some(regex) = compiled(
            &TOKEN_REGEX,
            r#"(?i)(token|bearer)([=:\s]+)['"]?([a-zA-Z0-9_.:-]{10,})['"]?"#,
        ) {
            result = regex.replace_all(&result, "$1$2***").to_string();
        }

        if let Some(regex) = compiled(
            &API_KEY_REGEX,
            r#"(?i)(api[_-]?key|apikey)([=:\s]+)['"]?([a-zA-Z0-9_.-]{10,})['"]?"#,
        ) {
            result = regex.replace_all(&result, "$1$2***").to_string();
        }

        result
    }

    /// Redact sensitive information from JSON values
    pub fn redact_json_value(value: &mut serde_json::Value) {
        match value {
            serde_json::Value::Object(map) => {
                for (key, val) in map.iter_mut() {
                    if is_sensitive_key(key) && !val.is_null() {
                        *val = serde_json::Value::String("***".to_string());
                    } else {
                        redact_json_value(val);
                    }
                }
            }
            serde_json::Value::Array(arr) => {
                for item in arr.iter_mut() {
                    redact_json_value(item);
                }
            }
            serde_json::Value::String(s) => {
                *s = redact_sensitive(s);
            }
            _ => {}
        }
    }

    // Suffix match so counters like `max_new_tokens` stay visible
    fn is_sensitive_key(key: &str) -> bool {
        let key_lower = key.to_lowercase();
        key_lower.ends_with("key")
            || key_lower.ends_with("token")
            || key_lower.contains("secret")
            || key_lower.contains("password")
            || key_lower.contains("authorization")
    }
}

/// Performance timing utilities
pub mod timing {
    use std::time::{Duration, Instant};
    use tracing::Span;

    /// A timer that logs its duration when finished or dropped
    pub struct Timer {
        start: Instant,
        span: Span,
        operation: String,
        finished: bool,
    }

    impl Timer {
        pub fn new(operation: &str) -> Self {
            Self::build(operation, None)
        }

        pub fn with_details(operation: &str, details: &str) -> Self {
            Self::build(operation, Some(details))
        }

        fn build(operation: &str, details: Option<&str>) -> Self {
            Self {
                start: Instant::now(),
                span: super::create_operation_span(operation, details),
                operation: operation.to_string(),
                finished: false,
            }
        }

        /// Finish the timer and log the duration
        pub fn finish(mut self) -> Duration {
            let duration = self.record();
            tracing::info!(
                operation = %self.operation,
                duration_ms = duration.as_millis() as u64,
                "Operation completed"
            );
            self.finished = true;
            duration
        }

        fn record(&self) -> Duration {
            let duration = self.start.elapsed();
            self.span.record("duration_ms", duration.as_millis() as u64);
            duration
        }
    }

    impl Drop for Timer {
        fn drop(&mut self) {
            if !self.finished {
                let duration = self.record();
                tracing::debug!(
                    operation = %self.operation,
                    duration_ms = duration.as_millis() as u64,
                    "Operation completed (auto-timed)"
                );
            }
        }
    }
}
