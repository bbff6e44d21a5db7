//! Error types for the Abiware core library
//!
//! Every failure the connector can produce is a variant of [`Error`]. None of
//! them are recovered locally: they surface to the caller, which maps them to
//! an external status through [`Error::kind`].

use std::fmt;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for connector operations
#[derive(Error, Debug)]
pub enum Error {
    /// Token request failed or returned no usable access token
    #[error("Authentication failed: {message}")]
    Authentication {
        message: String,
        status_code: Option<u16>,
        body: Option<String>,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// A body expected to be JSON could not be parsed
    #[error("Failed to parse {context} response as JSON: {message}")]
    ResponseParse {
        context: String,
        message: String,
        body: String,
        #[source]
        source: serde_json::Error,
    },

    /// A required field group is absent from the inbound payload
    #[error("Missing field group '{field}' in inbound payload")]
    MissingField { field: String },

    /// A composite field has fewer positions than its schema requires
    #[error("Field group '{field}' has {actual} position(s), at least {required} required")]
    IncompleteField {
        field: String,
        required: usize,
        actual: usize,
    },

    /// A field group carries a value of the wrong shape
    #[error("Validation error: {field} - {message}")]
    Validation {
        field: String,
        message: String,
        expected: Option<String>,
    },

    /// The platform rejected the case submission
    #[error("Case submission rejected with status {status_code}: {body}")]
    Submission {
        status_code: u16,
        body: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// Network failure or timeout while talking to the platform
    #[error("Transport error: {message}")]
    Transport {
        message: String,
        timed_out: bool,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// Invalid connector settings
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// The access policy refused the caller
    #[error("Access denied: '{principal}' may not call {endpoint}")]
    AccessDenied { principal: String, endpoint: String },

    /// JSON serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Stable classification of [`Error`] variants for callers that map
/// failures to external statuses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Authentication,
    ResponseParse,
    MissingField,
    IncompleteField,
    Validation,
    Submission,
    Transport,
    Configuration,
    AccessDenied,
    Json,
}

impl Error {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Authentication { .. } => ErrorKind::Authentication,
            Error::ResponseParse { .. } => ErrorKind::ResponseParse,
            Error::MissingField { .. } => ErrorKind::MissingField,
            Error::IncompleteField { .. } => ErrorKind::IncompleteField,
            Error::Validation { .. } => ErrorKind::Validation,
            Error::Submission { .. } => ErrorKind::Submission,
            Error::Transport { .. } => ErrorKind::Transport,
            Error::Configuration { .. } => ErrorKind::Configuration,
            Error::AccessDenied { .. } => ErrorKind::AccessDenied,
            Error::Json { .. } => ErrorKind::Json,
        }
    }

    /// HTTP status reported by a downstream server, if any
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Authentication { status_code, .. } => *status_code,
            Error::Submission { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }

    /// Raw body returned by a downstream server, if any
    pub fn downstream_body(&self) -> Option<&str> {
        match self {
            Error::Authentication { body, .. } => body.as_deref(),
            Error::ResponseParse { body, .. } => Some(body),
            Error::Submission { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Whether the failure comes from the inbound payload rather than a
    /// downstream system
    pub fn is_payload_error(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::MissingField | ErrorKind::IncompleteField | ErrorKind::Validation
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Authentication => "authentication",
            ErrorKind::ResponseParse => "response_parse",
            ErrorKind::MissingField => "missing_field",
            ErrorKind::IncompleteField => "incomplete_field",
            ErrorKind::Validation => "validation",
            ErrorKind::Submission => "submission",
            ErrorKind::Transport => "transport",
            ErrorKind::Configuration => "configuration",
            ErrorKind::AccessDenied => "access_denied",
            ErrorKind::Json => "json",
        };
        f.write_str(name)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json {
            message: err.to_string(),
            source: err,
        }
    }
}
