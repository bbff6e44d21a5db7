//! Core data types for the Abiware connector
//!
//! Credentials and settings come from the caller's configuration store, the
//! inbound payload comes from the caller's request, and the remaining types
//! are produced by the connector itself.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Error, Result};

/// Default timeout applied to both outbound calls
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// Configuration types
// ============================================================================

/// OAuth2 password-grant credentials
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Token endpoint of the authentication server
    pub auth_server_url: String,
    pub client_id: String,
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(
        auth_server_url: impl Into<String>,
        client_id: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            auth_server_url: auth_server_url.into(),
            client_id: client_id.into(),
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("auth_server_url", &self.auth_server_url)
            .field("client_id", &self.client_id)
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Everything the connector needs to reach the platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectorSettings {
    pub credentials: Credentials,
    /// Base URL of the platform API, e.g. `https://abiware.example/api/`
    pub api_base_url: String,
    /// Timeout applied to the token request and to the case submission
    pub timeout: Duration,
}

impl ConnectorSettings {
    pub fn new(credentials: Credentials, api_base_url: impl Into<String>) -> Self {
        Self {
            credentials,
            api_base_url: api_base_url.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Override the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

// ============================================================================
// Token types
// ============================================================================

/// Bearer token obtained from one password-grant exchange
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    value: String,
    token_type: String,
    expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    pub fn new(
        value: impl Into<String>,
        token_type: impl Into<String>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            value: value.into(),
            token_type: token_type.into(),
            expires_at,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Whether the token is past its expiry at `now`. Tokens without an
    /// expiry never report as expired.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expiry| now >= expiry)
    }

    /// Value for the `Authorization` header. The platform always expects the
    /// `Bearer` scheme whatever `token_type` says.
    pub fn bearer_header(&self) -> String {
        format!("Bearer {}", self.value)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"***")
            .field("token_type", &self.token_type)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Raw JSON returned by the authentication server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub raw: Value,
    pub received_at: DateTime<Utc>,
}

impl TokenResponse {
    pub fn new(raw: Value, received_at: DateTime<Utc>) -> Self {
        Self { raw, received_at }
    }

    /// Extract the access token, if the response carries a non-empty
    /// `access_token` string
    pub fn access_token(&self) -> Option<AccessToken> {
        let value = self
            .raw
            .get("access_token")
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())?;

        let token_type = self
            .raw
            .get("token_type")
            .and_then(Value::as_str)
            .unwrap_or("Bearer");

        let expires_in = self
            .raw
            .get("expires_in")
            .and_then(|v| match v {
                Value::Number(n) => n.as_i64(),
                Value::String(s) => s.trim().parse::<i64>().ok(),
                _ => None,
            })
            .filter(|secs| (1..=i64::from(u32::MAX)).contains(secs));
        let expires_at =
            expires_in.map(|secs| self.received_at + chrono::Duration::seconds(secs));

        Some(AccessToken::new(value, token_type, expires_at))
    }

    pub fn into_raw(self) -> Value {
        self.raw
    }
}

// ============================================================================
// Payload types
// ============================================================================

/// Inbound flat field map, in the order the caller supplied the keys
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InboundPayload {
    fields: Map<String, Value>,
}

impl InboundPayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON object body
    pub fn from_json_str(body: &str) -> Result<Self> {
        match serde_json::from_str::<Value>(body)? {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(Error::Validation {
                field: "$".to_string(),
                message: format!("inbound payload must be a JSON object, got {}", json_type(&other)),
                expected: Some("object".to_string()),
            }),
        }
    }

    /// Parse an `application/x-www-form-urlencoded` body. A repeated key
    /// keeps its first position and its last value.
    pub fn from_form_urlencoded(body: &str) -> Self {
        let mut payload = Self::new();
        for (key, value) in url::form_urlencoded::parse(body.trim().as_bytes()) {
            payload.insert(key.into_owned(), value.into_owned());
        }
        payload
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Builder-style [`insert`](Self::insert)
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for InboundPayload
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut payload = Self::new();
        for (key, value) in iter {
            payload.insert(key, value);
        }
        payload
    }
}

/// Structured body sent to `dossiers/request`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaseRequestBody {
    /// Allow-listed general keys, flattened at the top level
    #[serde(flatten)]
    pub general: Map<String, Value>,
    pub dossier: Map<String, Value>,
    pub request: Map<String, Value>,
    pub contacts: Vec<Map<String, Value>>,
}

impl CaseRequestBody {
    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

pub(crate) fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
