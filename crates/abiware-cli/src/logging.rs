//! Logging setup for the Abiware CLI
//!
//! This module provides:
//! - Request ID generation and tracking
//! - Sensitive data redaction
//! - Command timing
//! - Structured logging setup (compact, full, JSON) on stderr

use crate::config;
use crate::error::{Error, Result};
use is_terminal::IsTerminal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;
use std::time::{Duration, Instant};
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Layer};
use uuid::Uuid;

/// Global request ID for the current session
static REQUEST_ID: OnceLock<String> = OnceLock::new();

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter
    pub level: String,
    /// Output format: compact, full, json
    pub format: LogFormat,
    /// Colored console output
    pub console: bool,
    /// Include thread IDs
    pub thread_ids: bool,
    /// Include file and line numbers
    pub source_location: bool,
    /// Per-module level overrides
    pub module_filter: BTreeMap<String, String>,
}

/// Log output format
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Compact format for production
    Compact,
    /// Full format with all details
    Full,
    /// JSON structured format
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "compact" => Ok(LogFormat::Compact),
            "full" => Ok(LogFormat::Full),
            "json" => Ok(LogFormat::Json),
            other => Err(Error::config(format!(
                "Invalid log format '{}': expected compact, full or json",
                other
            ))),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Compact,
            console: true,
            thread_ids: false,
            source_location: false,
            module_filter: quiet_http_modules(),
        }
    }
}

/// Connection-level crates are noisy below warn
fn quiet_http_modules() -> BTreeMap<String, String> {
    ["hyper", "hyper_util", "h2", "rustls"]
        .into_iter()
        .map(|module| (module.to_string(), "warn".to_string()))
        .collect()
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
                config.module_filter.clear();
            }
        }

        config
    }

    /// Apply the `[logging]` section of the configuration file. An explicit
    /// `-v` wins over the file's level.
    pub fn apply_file_settings(&mut self, settings: &config::LoggingConfig, verbosity: u8) {
        if verbosity == 0 {
            if let Some(level) = settings.level.as_deref().filter(|l| !l.trim().is_empty()) {
                self.level = level.trim().to_string();
            }
        }
        if let Some(format) = settings.format.as_deref() {
            match format.parse() {
                Ok(format) => self.format = format,
                Err(e) => tracing::warn!("{}, using {:?}", e, self.format),
            }
        }
    }

    /// Apply environment overrides (`RUST_LOG`, `ABIWARE_LOG_FORMAT`)
    pub fn merge_with_env(&mut self) {
        self.merge_with(|key| std::env::var(key).ok());
    }

    fn merge_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        // RUST_LOG takes precedence
        if let Some(rust_log) = lookup("RUST_LOG").filter(|v| !v.trim().is_empty()) {
            self.level = rust_log;
            self.module_filter.clear();
        }

        if let Some(format) = lookup("ABIWARE_LOG_FORMAT") {
            match format.parse() {
                Ok(format) => self.format = format,
                Err(_) => tracing::warn!("Invalid log format: {}, using default", format),
            }
        }
    }
}

/// Initialize the global logging system
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let env_filter = create_env_filter(&config)?;
    let ansi = config.console && std::io::stderr().is_terminal();

    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(config.thread_ids)
        .with_file(config.source_location)
        .with_line_number(config.source_location);
    let layer = match config.format {
        LogFormat::Compact => layer.with_ansi(ansi).compact().boxed(),
        LogFormat::Full => layer.with_ansi(ansi).boxed(),
        LogFormat::Json => layer.with_ansi(false).json().boxed(),
    };

    let subscriber = tracing_subscriber::registry().with(layer).with(env_filter);
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::other(format!("Failed to initialize logging: {}", e)))?;

    let request_id = REQUEST_ID.get_or_init(generate_request_id);
    tracing::info!(
        request_id = %request_id,
        level = %config.level,
        format = ?config.format,
        "Logging system initialized"
    );

    Ok(())
}

/// Create environment filter based on configuration
fn create_env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    let mut filter = EnvFilter::try_new(&config.level)
        .map_err(|e| Error::config(format!("Invalid log level '{}': {}", config.level, e)))?;

    for (module, level) in &config.module_filter {
        filter = filter.add_directive(
            format!("{}={}", module, level)
                .parse()
                .map_err(|e| Error::other(format!("Invalid filter directive: {}", e)))?,
        );
    }

    Ok(filter)
}

/// Generate a unique request ID for this session
pub fn generate_request_id() -> String {
    format!("req_{}", Uuid::new_v4().simple())
}

/// Get the current request ID
pub fn current_request_id() -> Option<&'static str> {
    REQUEST_ID.get().map(|s| s.as_str())
}

/// Sensitive data redaction utilities
pub mod redaction {
    use regex::Regex;
    use serde_json::Value;
    use std::sync::OnceLock;

    static PATTERNS: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();

    fn patterns() -> &'static [(Regex, &'static str)] {
        PATTERNS.get_or_init(|| {
            [
                (
                    r#"(?i)"([a-z_]*(?:token|password|passwd|pwd|secret))"\s*:\s*"(?:[^"\\]|\\.)*""#,
                    r#""${1}":"***""#,
                ),
                (
                    r#"(?i)\b(bearer)\s+([a-zA-Z0-9_.~+/-]{8,}=*)"#,
                    "$1 ***",
                ),
                (
                    r#"(?i)\b([a-z_]*token)[=:\s]+['"]?([a-zA-Z0-9_.~+/-]{8,}=*)['"]?"#,
                    "$1=***",
                ),
                (
                    r#"(?i)\b(password|passwd|pwd|[a-z_]*secret)[=:\s]+['"]?([^\s'"&,]{3,})['"]?"#,
                    "$1=***",
                ),
            ]
            .into_iter()
            .map(|(pattern, replacement)| {
                (Regex::new(pattern).expect("redaction pattern"), replacement)
            })
            .collect()
        })
    }

    /// Redact sensitive information from a string
    pub fn redact_sensitive(input: &str) -> String {
        patterns()
            .iter()
            .fold(input.to_string(), |text, (regex, replacement)| {
                regex.replace_all(&text, *replacement).into_owned()
            })
    }

    /// Redact sensitive information from JSON values
    pub fn redact_json_value(value: &mut Value) {
        match value {
            Value::Object(map) => {
                for (key, val) in map.iter_mut() {
                    if is_sensitive_key(key) {
                        *val = Value::String("***".to_string());
                    } else {
                        redact_json_value(val);
                    }
                }
            }
            Value::Array(arr) => {
                for item in arr.iter_mut() {
                    redact_json_value(item);
                }
            }
            Value::String(s) => {
                *s = redact_sensitive(s);
            }
            _ => {}
        }
    }

    /// Check if a JSON key holds a credential
    fn is_sensitive_key(key: &str) -> bool {
        let key_lower = key.to_lowercase();
        key_lower.ends_with("token")
            || key_lower.contains("password")
            || key_lower.contains("passwd")
            || key_lower.contains("secret")
            || key_lower.contains("credential")
            || key_lower.contains("authorization")
    }
}

/// Logs how long a command took once dropped
pub struct Timer {
    operation: &'static str,
    start: Instant,
}

impl Timer {
    pub fn start(operation: &'static str) -> Self {
        Self {
            operation,
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        tracing::debug!(
            operation = self.operation,
            request_id = current_request_id().unwrap_or("unknown"),
            duration_ms = self.elapsed().as_millis() as u64,
            "Operation completed"
        );
    }
}
