//! Case submission client
//!
//! Ties the token provider and the payload translation together: one token
//! request, one body assembly, one authenticated POST. There are no retries;
//! a failed attempt is final.

use reqwest::header::HeaderMap;
use reqwest::{Client as ReqwestClient, Url};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use super::auth::{AuthHandler, BearerAuth, TokenProvider};
use super::error::{parse_json_body, transport_error, HttpError};
use crate::translation::build_case_body;
use crate::{
    AccessToken, CaseRequestBody, ConnectorSettings, Error, InboundPayload, Result,
    TokenResponse,
};

/// Path of the case creation endpoint, relative to the API base URL
pub const CASE_SUBMISSION_PATH: &str = "dossiers/request";

/// Client for the platform's case creation API
#[derive(Debug, Clone)]
pub struct AbiwareClient {
    client: ReqwestClient,
    token_provider: TokenProvider,
    submission_url: Url,
    settings: ConnectorSettings,
}

impl AbiwareClient {
    /// Create a client. Fails with [`Error::Configuration`] when a URL does
    /// not parse or the HTTP client cannot be built.
    pub fn new(settings: ConnectorSettings) -> Result<Self> {
        parse_url("authentication server URL", &settings.credentials.auth_server_url)?;
        let submission_url = submission_url(&settings.api_base_url)?;

        let client = ReqwestClient::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| Error::Configuration {
                message: format!("Failed to create HTTP client: {}", e),
                source: Some(e.into()),
            })?;

        let token_provider = TokenProvider::new(client.clone(), settings.credentials.clone());

        Ok(Self {
            client,
            token_provider,
            submission_url,
            settings,
        })
    }

    pub fn settings(&self) -> &ConnectorSettings {
        &self.settings
    }

    pub fn token_provider(&self) -> &TokenProvider {
        &self.token_provider
    }

    /// Fully resolved `dossiers/request` URL
    pub fn submission_url(&self) -> &Url {
        &self.submission_url
    }

    /// Raw token exchange, without using the token
    pub async fn get_token(&self) -> Result<TokenResponse> {
        self.token_provider.acquire_token().await
    }

    /// Assemble the body that [`submit_case`](Self::submit_case) would send,
    /// without any network call
    pub fn preview_case(&self, payload: &InboundPayload) -> Result<CaseRequestBody> {
        build_case_body(payload)
    }

    /// Acquire a token, translate `payload` and create the case.
    ///
    /// Returns the platform's JSON response verbatim.
    #[instrument(skip(self, payload), fields(fields = payload.len()))]
    pub async fn submit_case(&self, payload: &InboundPayload) -> Result<Value> {
        let token = self.token_provider.access_token().await?;
        let body = build_case_body(payload)?;
        self.send_case(&token, &body).await
    }

    /// POST an already assembled body with `token`
    #[instrument(skip(self, token, body), fields(url = %self.submission_url, contacts = body.contacts.len()))]
    pub async fn send_case(&self, token: &AccessToken, body: &CaseRequestBody) -> Result<Value> {
        let mut headers = HeaderMap::new();
        BearerAuth::new(token.clone()).apply_auth(&mut headers)?;

        debug!("Submitting case");
        let response = self
            .client
            .post(self.submission_url.clone())
            .headers(headers)
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let error = HttpError::from_response(response).await;
            warn!(
                status = status.as_u16(),
                classification = ?error.classification,
                message = %error.message,
                "Case submission rejected"
            );
            return Err(error.into_submission_error());
        }

        let text = response.text().await.map_err(transport_error)?;
        let value = parse_json_body("case submission", text)?;
        info!(status = status.as_u16(), "Case submitted");
        Ok(value)
    }
}

fn parse_url(what: &str, raw: &str) -> Result<Url> {
    Url::parse(raw.trim()).map_err(|e| Error::Configuration {
        message: format!("Invalid {}: '{}'", what, raw),
        source: Some(e.into()),
    })
}

/// Resolve `{api_base_url}dossiers/request`. A base without a trailing `/`
/// is treated as a directory.
pub fn submission_url(api_base_url: &str) -> Result<Url> {
    let mut base = parse_url("API base URL", api_base_url)?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }

    base.join(CASE_SUBMISSION_PATH).map_err(|e| Error::Configuration {
        message: format!("Failed to join path: {}", CASE_SUBMISSION_PATH),
        source: Some(e.into()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Credentials;
    use std::time::Duration;

    fn settings(api_base_url: &str) -> ConnectorSettings {
        ConnectorSettings::new(
            Credentials::new("https://auth.example/realms/x/token", "client", "user", "pw"),
            api_base_url,
        )
    }

    #[test]
    fn test_submission_url() {
        assert_eq!(
            submission_url("https://abiware.example/api/").unwrap().as_str(),
            "https://abiware.example/api/dossiers/request"
        );
        assert_eq!(
            submission_url("https://abiware.example/api").unwrap().as_str(),
            "https://abiware.example/api/dossiers/request"
        );
        assert_eq!(
            submission_url("https://abiware.example").unwrap().as_str(),
            "https://abiware.example/dossiers/request"
        );
    }

    #[test]
    fn test_invalid_urls_are_configuration_errors() {
        let err = AbiwareClient::new(settings("not a url")).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));

        let mut bad_auth = settings("https://abiware.example/api/");
        bad_auth.credentials.auth_server_url = "::".to_string();
        let err = AbiwareClient::new(bad_auth).unwrap_err();
        assert!(err.to_string().contains("authentication server URL"));
    }

    #[test]
    fn test_client_keeps_settings() {
        let client = AbiwareClient::new(
            settings("https://abiware.example/api/").with_timeout(Duration::from_secs(5)),
        )
        .unwrap();
        assert_eq!(client.settings().timeout, Duration::from_secs(5));
        assert_eq!(client.token_provider().credentials().username, "user");
        assert_eq!(
            client.submission_url().as_str(),
            "https://abiware.example/api/dossiers/request"
        );
    }
}
