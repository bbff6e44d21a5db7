//! Error types and handling for the CLI
//!
//! This module provides error types and utilities for handling
//! various failure modes in the CLI application.

use abiware_core::ErrorKind;
use std::io;
use std::path::PathBuf;

use crate::logging::redaction;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for CLI operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error (file operations, etc.)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Error from abiware-core
    #[error(transparent)]
    Core(#[from] abiware_core::Error),

    /// File not found
    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// Invalid file format
    #[error("Invalid file format for {}: expected {} format", path.display(), expected)]
    InvalidFormat {
        path: PathBuf,
        expected: String,
        #[source]
        source: anyhow::Error,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid argument combination
    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// TOML serialization error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::ser::Error),

    /// Generic error with context
    #[error("{message}")]
    Other { message: String },
}

impl Error {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an invalid arguments error
    pub fn invalid_args(message: impl Into<String>) -> Self {
        Self::InvalidArgs(message.into())
    }

    /// Create a generic error with message
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Io(_) => 1,
            Self::Core(e) => core_exit_code(e.kind()),
            Self::FileNotFound { .. } => 3,
            Self::InvalidFormat { .. } => 4,
            Self::Config(_) => 5,
            Self::InvalidArgs(_) => 6,
            Self::Json(_) => 7,
            Self::Yaml(_) => 8,
            Self::Toml(_) => 9,
            Self::Other { .. } => 99,
        }
    }

    /// Check if this error should display usage help
    pub fn should_show_help(&self) -> bool {
        matches!(self, Self::InvalidArgs(_))
    }
}

/// Exit codes for library failures. Payload problems share one code.
fn core_exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::Configuration => 5,
        ErrorKind::Json => 7,
        ErrorKind::Authentication => 10,
        ErrorKind::Transport => 11,
        ErrorKind::Submission => 12,
        ErrorKind::ResponseParse => 13,
        ErrorKind::MissingField | ErrorKind::IncompleteField | ErrorKind::Validation => 14,
        ErrorKind::AccessDenied => 15,
    }
}

/// Format an error for display to the user
pub fn format_error(error: &Error, use_color: bool) -> String {
    let mut message = if use_color {
        use colored::Colorize;
        format!("{} {}", "Error:".red().bold(), error)
    } else {
        format!("Error: {}", error)
    };

    // Status and body returned by the remote server
    if let Error::Core(core_error) = error {
        if let Some(status) = core_error.status_code() {
            message.push_str(&format!("\n  status: {}", status));
        }
        if let Some(body) = core_error.downstream_body().filter(|b| !b.trim().is_empty()) {
            message.push_str(&format!("\n  body: {}", redaction::redact_sensitive(body)));
        }
    }

    message
}
