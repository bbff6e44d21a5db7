//! Abiware Core - OAuth2 token acquisition and case submission
//!
//! This crate authenticates against the Abiware case-management platform
//! with an OAuth2 password grant and turns a flat inbound payload into the
//! nested body of the platform's "create case" API.
//!
//! # Main Components
//!
//! - **Token Provider** ([`http::TokenProvider`]): password-grant exchange
//! - **Translation** ([`translation`]): positional decoding of composite
//!   field groups and case body assembly
//! - **Client** ([`http::AbiwareClient`]): authenticated case submission
//! - **Endpoints** ([`endpoint`]): access-checked dispatch of the
//!   connector's operations
//!
//! # Example
//!
//! ```no_run
//! use abiware_core::{ConnectorSettings, Credentials, InboundPayload, Result};
//!
//! async fn example() -> Result<()> {
//!     let settings = ConnectorSettings::new(
//!         Credentials::new("https://auth.example/token", "client", "user", "secret"),
//!         "https://abiware.example/api/",
//!     );
//!     let payload = InboundPayload::new()
//!         .with("dossierCode", "D-1")
//!         .with("dossier_data", "Maison || Rue A || 12")
//!         .with("user_request", "REF1 || permit");
//!
//!     let response = abiware_core::submit_case(&payload, &settings).await?;
//!     println!("{}", response);
//!     Ok(())
//! }
//! ```

pub mod endpoint;
pub mod error;
pub mod http;
pub mod translation;
pub mod types;

// Re-export main types for convenience
pub use endpoint::{dispatch, AccessPolicy, AllowAll, AllowList, Endpoint};
pub use error::{Error, ErrorKind, Result};
pub use http::AbiwareClient;
pub use types::{
    AccessToken, CaseRequestBody, ConnectorSettings, Credentials, InboundPayload,
    TokenResponse, DEFAULT_TIMEOUT_SECS,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Exchange the configured credentials for a token
pub async fn acquire_token(settings: &ConnectorSettings) -> Result<TokenResponse> {
    AbiwareClient::new(settings.clone())?.get_token().await
}

/// Translate `payload` and create a case, fetching a fresh token first
pub async fn submit_case(
    payload: &InboundPayload,
    settings: &ConnectorSettings,
) -> Result<serde_json::Value> {
    AbiwareClient::new(settings.clone())?
        .submit_case(payload)
        .await
}

/// Assemble the case body for `payload` without sending it
pub fn preview_case(payload: &InboundPayload) -> Result<CaseRequestBody> {
    translation::build_case_body(payload)
}
