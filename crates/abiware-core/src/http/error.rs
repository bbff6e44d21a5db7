//! HTTP error classification and conversion
//!
//! Captures what the authentication server or the platform answered so the
//! status and body reach the caller untouched.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::Error;

/// Classification of HTTP failures, used for logging and diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorClassification {
    /// Client errors (4xx)
    ClientError,
    /// Server errors (5xx)
    ServerError,
    /// Connection failures
    NetworkError,
    /// The request did not complete within the configured timeout
    Timeout,
    /// 401 / 403
    AuthenticationError,
    Unknown,
}

/// Normalized non-success HTTP response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpError {
    pub status_code: Option<u16>,
    pub classification: ErrorClassification,
    /// Best-effort human readable message extracted from the body
    pub message: String,
    /// Raw response body
    pub body: String,
    /// Parsed body when it is JSON
    pub details: Option<Value>,
    /// Why the body could not be read, when it could not
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_error: Option<String>,
}

impl HttpError {
    /// Create from a non-success reqwest Response
    pub async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status();
        let body = response.text().await.map_err(|e| e.to_string());
        Self::from_parts(status, body)
    }

    /// Build from a status and the outcome of reading the body. A failed
    /// read leaves `body` empty and is reported in `message` and
    /// `body_error`.
    pub fn from_parts(status: StatusCode, body: std::result::Result<String, String>) -> Self {
        let (body, body_error) = match body {
            Ok(body) => (body, None),
            Err(read_error) => (String::new(), Some(read_error)),
        };
        let details = serde_json::from_str::<Value>(&body).ok();
        let message = match &body_error {
            Some(read_error) => format!(
                "{} (response body unreadable: {})",
                status.canonical_reason().unwrap_or("no reason phrase"),
                read_error
            ),
            None => Self::extract_message(&details, &body, status),
        };

        Self {
            status_code: Some(status.as_u16()),
            classification: Self::classify_status(status),
            message,
            body,
            details,
            body_error,
        }
    }

    /// Classify HTTP status code
    pub fn classify_status(status: StatusCode) -> ErrorClassification {
        match status.as_u16() {
            401 | 403 => ErrorClassification::AuthenticationError,
            400..=499 => ErrorClassification::ClientError,
            500..=599 => ErrorClassification::ServerError,
            _ => ErrorClassification::Unknown,
        }
    }

    /// Classify a transport-level reqwest error
    pub fn classify_request_error(error: &reqwest::Error) -> ErrorClassification {
        if error.is_timeout() {
            ErrorClassification::Timeout
        } else if error.is_connect() {
            ErrorClassification::NetworkError
        } else {
            ErrorClassification::Unknown
        }
    }

    fn extract_message(details: &Option<Value>, body: &str, status: StatusCode) -> String {
        if let Some(json) = details {
            // OAuth2 error responses
            if let Some(description) = json.get("error_description").and_then(Value::as_str) {
                return description.to_string();
            }
            if let Some(message) = json.get("message").and_then(Value::as_str) {
                return message.to_string();
            }
            if let Some(error) = json.get("error").and_then(Value::as_str) {
                return error.to_string();
            }
        }

        if body.trim().is_empty() {
            status
                .canonical_reason()
                .unwrap_or("empty response body")
                .to_string()
        } else {
            body.to_string()
        }
    }

    /// Convert a rejected token request
    pub fn into_authentication_error(self) -> Error {
        Error::Authentication {
            message: format!("token request rejected: {}", self.message),
            status_code: self.status_code,
            body: Some(self.body),
            source: self.body_error.map(anyhow::Error::msg),
        }
    }

    /// Convert a rejected case submission
    pub fn into_submission_error(self) -> Error {
        Error::Submission {
            status_code: self.status_code.unwrap_or_default(),
            body: self.body,
            source: self.body_error.map(anyhow::Error::msg),
        }
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HTTP Error [{}]: {} (classification: {:?})",
            self.status_code
                .map(|c| c.to_string())
                .unwrap_or_else(|| "N/A".to_string()),
            self.message,
            self.classification
        )
    }
}

impl std::error::Error for HttpError {}

/// A network failure while requesting a token is an authentication failure
pub fn authentication_request_error(error: reqwest::Error) -> Error {
    let classification = HttpError::classify_request_error(&error);
    Error::Authentication {
        message: format!("token request failed ({:?}): {}", classification, error),
        status_code: error.status().map(|s| s.as_u16()),
        body: None,
        source: Some(error.into()),
    }
}

/// A network failure while submitting a case
pub fn transport_error(error: reqwest::Error) -> Error {
    let classification = HttpError::classify_request_error(&error);
    Error::Transport {
        message: format!("case submission failed ({:?}): {}", classification, error),
        timed_out: classification == ErrorClassification::Timeout,
        source: Some(error.into()),
    }
}

/// Parse a response body that must be JSON
pub fn parse_json_body(context: &str, body: String) -> crate::Result<Value> {
    serde_json::from_str(&body).map_err(|source| Error::ResponseParse {
        context: context.to_string(),
        message: source.to_string(),
        body,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http_error(status: u16, body: &str) -> HttpError {
        let status = StatusCode::from_u16(status).unwrap();
        HttpError::from_parts(status, Ok(body.to_string()))
    }

    #[test]
    fn test_classify_status() {
        assert_eq!(
            HttpError::classify_status(StatusCode::UNAUTHORIZED),
            ErrorClassification::AuthenticationError
        );
        assert_eq!(
            HttpError::classify_status(StatusCode::UNPROCESSABLE_ENTITY),
            ErrorClassification::ClientError
        );
        assert_eq!(
            HttpError::classify_status(StatusCode::BAD_GATEWAY),
            ErrorClassification::ServerError
        );
    }

    #[test]
    fn test_oauth_error_message() {
        let error = http_error(
            400,
            r#"{"error":"invalid_grant","error_description":"Invalid user credentials"}"#,
        );
        assert_eq!(error.message, "Invalid user credentials");

        let err = error.into_authentication_error();
        assert_eq!(err.status_code(), Some(400));
        assert!(err.to_string().contains("Invalid user credentials"));
        assert!(err.downstream_body().unwrap().contains("invalid_grant"));
    }

    #[test]
    fn test_plain_text_and_empty_bodies() {
        assert_eq!(http_error(500, "boom").message, "boom");
        assert_eq!(http_error(503, "").message, "Service Unavailable");
    }

    #[test]
    fn test_submission_error_keeps_body() {
        let body = r#"{"message":"zipCode is mandatory"}"#;
        match http_error(422, body).into_submission_error() {
            Error::Submission { status_code, body: kept, source } => {
                assert_eq!(status_code, 422);
                assert_eq!(kept, body);
                assert!(source.is_none());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_unreadable_body_is_reported() {
        let error = HttpError::from_parts(
            StatusCode::BAD_GATEWAY,
            Err("connection reset by peer".to_string()),
        );
        assert!(error.body.is_empty());
        assert!(error.message.contains("response body unreadable"));
        assert!(error.message.contains("connection reset by peer"));

        let err = error.clone().into_submission_error();
        assert_eq!(err.status_code(), Some(502));
        let source = std::error::Error::source(&err).unwrap();
        assert!(source.to_string().contains("connection reset by peer"));

        let err = error.into_authentication_error();
        assert!(err.to_string().contains("response body unreadable"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_parse_json_body() {
        assert_eq!(
            parse_json_body("token", r#"{"a":1}"#.to_string()).unwrap()["a"],
            1
        );
        let err = parse_json_body("token", "<html>".to_string()).unwrap_err();
        assert!(matches!(err, Error::ResponseParse { ref body, .. } if body == "<html>"));
        assert!(err.to_string().contains("token response"));
    }
}
