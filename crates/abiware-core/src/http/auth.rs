//! OAuth2 password-grant token acquisition and bearer authentication
//!
//! [`TokenProvider`] exchanges the configured credentials for a token on
//! every call; nothing is cached between requests.

use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use tracing::{debug, instrument, warn};

use super::error::{authentication_request_error, parse_json_body, HttpError};
use crate::{AccessToken, Credentials, Error, Result, TokenResponse};

/// OAuth2 grant type used by the platform
pub const GRANT_TYPE: &str = "password";

/// Trait for attaching credentials to outgoing requests
pub trait AuthHandler: Send + Sync {
    /// Apply authentication to request headers
    fn apply_auth(&self, headers: &mut HeaderMap) -> Result<()>;

    /// Check that the held credentials are usable
    fn validate_credentials(&self) -> Result<()>;
}

/// `Authorization: Bearer <token>` handler
#[derive(Debug, Clone)]
pub struct BearerAuth {
    token: AccessToken,
}

impl BearerAuth {
    pub fn new(token: AccessToken) -> Self {
        Self { token }
    }
}

impl AuthHandler for BearerAuth {
    fn apply_auth(&self, headers: &mut HeaderMap) -> Result<()> {
        self.validate_credentials()?;

        let mut value = HeaderValue::from_str(&self.token.bearer_header()).map_err(|e| {
            Error::Authentication {
                message: "access token contains characters not allowed in a header".to_string(),
                status_code: None,
                body: None,
                source: Some(e.into()),
            }
        })?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
        Ok(())
    }

    fn validate_credentials(&self) -> Result<()> {
        if self.token.value().is_empty() {
            return Err(Error::Authentication {
                message: "access token is empty".to_string(),
                status_code: None,
                body: None,
                source: None,
            });
        }
        if self.token.is_expired_at(Utc::now()) {
            return Err(Error::Authentication {
                message: "access token expired before the request was sent".to_string(),
                status_code: None,
                body: None,
                source: None,
            });
        }
        Ok(())
    }
}

/// Exchanges credentials for an access token
#[derive(Debug, Clone)]
pub struct TokenProvider {
    client: Client,
    credentials: Credentials,
}

impl TokenProvider {
    pub fn new(client: Client, credentials: Credentials) -> Self {
        Self { client, credentials }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// POST the password grant and return the server's JSON verbatim.
    ///
    /// Network failures and non-success statuses are
    /// [`Error::Authentication`]; a body that is not JSON is
    /// [`Error::ResponseParse`]. The response schema is not checked here.
    #[instrument(
        skip(self),
        fields(
            auth_server = %self.credentials.auth_server_url,
            client_id = %self.credentials.client_id,
        )
    )]
    pub async fn acquire_token(&self) -> Result<TokenResponse> {
        let form = [
            ("grant_type", GRANT_TYPE),
            ("client_id", self.credentials.client_id.as_str()),
            ("username", self.credentials.username.as_str()),
            ("password", self.credentials.password.as_str()),
        ];

        debug!("Requesting access token");
        let response = self
            .client
            .post(self.credentials.auth_server_url.trim())
            .form(&form)
            .send()
            .await
            .map_err(authentication_request_error)?;

        if !response.status().is_success() {
            let error = HttpError::from_response(response).await;
            warn!(
                status = ?error.status_code,
                classification = ?error.classification,
                "Token request rejected"
            );
            return Err(error.into_authentication_error());
        }

        let body = response.text().await.map_err(authentication_request_error)?;
        let raw = parse_json_body("token", body)?;
        debug!(has_access_token = raw.get("access_token").is_some(), "Token response received");

        Ok(TokenResponse::new(raw, Utc::now()))
    }

    /// Acquire a token and extract the bearer value, failing with
    /// [`Error::Authentication`] when the response has no `access_token`
    pub async fn access_token(&self) -> Result<AccessToken> {
        let response = self.acquire_token().await?;
        response.access_token().ok_or_else(|| {
            let keys = response
                .raw
                .as_object()
                .map(|map| map.keys().cloned().collect::<Vec<_>>().join(", "))
                .unwrap_or_default();
            warn!(keys = %keys, "Token response has no access_token");
            Error::Authentication {
                message: format!("token response has no access_token (keys: [{}])", keys),
                status_code: None,
                body: None,
                source: None,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_auth_header() {
        let auth = BearerAuth::new(AccessToken::new("abc123", "bearer", None));
        let mut headers = HeaderMap::new();

        auth.apply_auth(&mut headers).unwrap();

        let value = headers.get(AUTHORIZATION).unwrap();
        assert_eq!(value.to_str().unwrap(), "Bearer abc123");
        assert!(value.is_sensitive());
    }

    #[test]
    fn test_bearer_auth_rejects_expired_token() {
        let expired = Utc::now() - chrono::Duration::seconds(5);
        let auth = BearerAuth::new(AccessToken::new("abc123", "bearer", Some(expired)));
        let mut headers = HeaderMap::new();

        let err = auth.apply_auth(&mut headers).unwrap_err();
        assert!(matches!(err, Error::Authentication { .. }));
        assert!(err.to_string().contains("expired"));
        assert!(headers.is_empty());
    }

    #[test]
    fn test_bearer_auth_rejects_invalid_header_value() {
        let auth = BearerAuth::new(AccessToken::new("abc\n123", "bearer", None));
        let mut headers = HeaderMap::new();
        assert!(auth.apply_auth(&mut headers).is_err());
    }

    #[test]
    fn test_token_provider_debug_hides_password() {
        let provider = TokenProvider::new(
            Client::new(),
            Credentials::new("https://auth.example/token", "client", "user", "hunter2"),
        );
        assert!(!format!("{:?}", provider).contains("hunter2"));
    }
}
