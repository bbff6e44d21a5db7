//! Connector endpoints and access control
//!
//! The connector exposes two operations: `get-token`, a diagnostic endpoint
//! returning the raw token response, and `submit-case`. Callers identify
//! themselves with a principal name and an [`AccessPolicy`] decides whether
//! they may call a given endpoint.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::http::AbiwareClient;
use crate::{Error, InboundPayload, Result};

/// Operations exposed by the connector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Endpoint {
    /// Fetch a token and return the authentication server's answer
    GetToken,
    /// Translate an inbound payload and create a case
    SubmitCase,
}

impl Endpoint {
    pub const ALL: [Endpoint; 2] = [Endpoint::GetToken, Endpoint::SubmitCase];

    pub fn name(&self) -> &'static str {
        match self {
            Endpoint::GetToken => "get-token",
            Endpoint::SubmitCase => "submit-case",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Endpoint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Endpoint::ALL
            .into_iter()
            .find(|endpoint| endpoint.name() == s)
            .ok_or_else(|| Error::Validation {
                field: "endpoint".to_string(),
                message: format!("unknown endpoint '{}'", s),
                expected: Some("get-token or submit-case".to_string()),
            })
    }
}

/// Decides whether a principal may call an endpoint
pub trait AccessPolicy: Send + Sync {
    /// Return [`Error::AccessDenied`] to refuse the call
    fn check(&self, principal: &str, endpoint: Endpoint) -> Result<()>;
}

/// Accepts every caller
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl AccessPolicy for AllowAll {
    fn check(&self, _principal: &str, _endpoint: Endpoint) -> Result<()> {
        Ok(())
    }
}

/// Accepts only the listed principals. An empty list accepts everyone.
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    principals: HashSet<String>,
}

impl AllowList {
    pub fn new<I, S>(principals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            principals: principals.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.principals.is_empty()
    }
}

impl AccessPolicy for AllowList {
    fn check(&self, principal: &str, endpoint: Endpoint) -> Result<()> {
        if self.is_open() || self.principals.contains(principal) {
            Ok(())
        } else {
            Err(Error::AccessDenied {
                principal: principal.to_string(),
                endpoint: endpoint.name().to_string(),
            })
        }
    }
}

impl<F> AccessPolicy for F
where
    F: Fn(&str, Endpoint) -> bool + Send + Sync,
{
    fn check(&self, principal: &str, endpoint: Endpoint) -> Result<()> {
        if self(principal, endpoint) {
            Ok(())
        } else {
            Err(Error::AccessDenied {
                principal: principal.to_string(),
                endpoint: endpoint.name().to_string(),
            })
        }
    }
}

/// Run `endpoint` on behalf of `principal`.
///
/// The access check happens before any network call. `SubmitCase` requires
/// a payload; `GetToken` ignores it.
#[instrument(skip(client, policy, payload))]
pub async fn dispatch(
    client: &AbiwareClient,
    policy: &dyn AccessPolicy,
    principal: &str,
    endpoint: Endpoint,
    payload: Option<&InboundPayload>,
) -> Result<Value> {
    if let Err(err) = policy.check(principal, endpoint) {
        warn!("Access denied");
        return Err(err);
    }

    let result = match endpoint {
        Endpoint::GetToken => client.get_token().await.map(|response| response.into_raw()),
        Endpoint::SubmitCase => {
            let payload = payload.ok_or_else(|| Error::MissingField {
                field: "payload".to_string(),
            })?;
            client.submit_case(payload).await
        }
    };

    match &result {
        Ok(_) => info!("Endpoint completed"),
        Err(err) => warn!(kind = %err.kind(), "Endpoint failed"),
    }
    result
}
