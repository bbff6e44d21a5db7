//! HTTP side of the connector
//!
//! This module provides:
//! - OAuth2 password-grant token acquisition
//! - Bearer authentication of outgoing requests
//! - Case submission to the platform API
//! - Classification of downstream failures

pub mod auth;
pub mod client;
pub mod error;

pub use auth::{AuthHandler, BearerAuth, TokenProvider, GRANT_TYPE};
pub use client::{submission_url, AbiwareClient, CASE_SUBMISSION_PATH};
pub use error::{ErrorClassification, HttpError};

// Re-export commonly used types
pub use reqwest::{StatusCode, Url};
