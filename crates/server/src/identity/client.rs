//! HTTP client for the identity provider's resolution endpoint.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use summit_core::{Email, UserId};

use super::{ExternalIdentity, IdentityError, IdentityProvider};
use crate::config::IdentityConfig;

/// Request timeout for identity resolution.
///
/// Resolution sits on the hot path of every request; a slow provider must
/// degrade to an unauthenticated view quickly rather than stall the page.
const RESOLVE_TIMEOUT: Duration = Duration::from_secs(5);

/// Wire shape of a resolution request.
#[derive(Serialize)]
struct ResolveRequest<'a> {
    credential: &'a str,
}

/// Wire shape of the provider's answer. `identity: null` means the
/// credential is unknown or expired.
#[derive(Deserialize)]
struct ResolveResponse {
    identity: Option<IdentityDto>,
}

#[derive(Deserialize)]
struct IdentityDto {
    id: String,
    name: String,
    email: String,
    image: Option<String>,
}

impl IdentityDto {
    fn into_identity(self) -> Result<ExternalIdentity, IdentityError> {
        if self.id.is_empty() {
            return Err(IdentityError::Protocol("identity with empty id".to_owned()));
        }
        let email = Email::parse(&self.email)
            .map_err(|e| IdentityError::Protocol(format!("identity with invalid email: {e}")))?;

        Ok(ExternalIdentity {
            id: UserId::new(self.id),
            name: self.name,
            email,
            image: self.image,
        })
    }
}

/// [`IdentityProvider`] implementation backed by the provider's HTTP API.
pub struct HttpIdentityProvider {
    http: reqwest::Client,
    resolve_url: String,
    api_token: SecretString,
}

impl HttpIdentityProvider {
    /// Create a client from the identity section of the server config.
    ///
    /// # Panics
    ///
    /// Panics if the underlying HTTP client cannot be constructed, which
    /// only happens with an invalid TLS backend configuration.
    #[must_use]
    pub fn new(config: &IdentityConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(RESOLVE_TIMEOUT)
            .build()
            .expect("failed to build identity HTTP client");

        Self {
            http,
            resolve_url: format!("{}/v1/identity/resolve", config.endpoint.trim_end_matches('/')),
            api_token: config.api_token.clone(),
        }
    }
}

#[async_trait::async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn identify(&self, credential: &str) -> Result<Option<ExternalIdentity>, IdentityError> {
        let response = self
            .http
            .post(&self.resolve_url)
            .bearer_auth(self.api_token.expose_secret())
            .json(&ResolveRequest { credential })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() || e.is_connect() {
                    IdentityError::Transient(e.to_string())
                } else {
                    IdentityError::Protocol(e.to_string())
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            // Provider signals an unknown credential as 404.
            return Ok(None);
        }
        if status.is_server_error() {
            return Err(IdentityError::Transient(format!("provider returned {status}")));
        }
        if !status.is_success() {
            // 401/403 here means our API token is wrong, not the member's
            // credential - that is a deployment problem, not a session state.
            return Err(IdentityError::Protocol(format!("provider returned {status}")));
        }

        let body: ResolveResponse = response
            .json()
            .await
            .map_err(|e| IdentityError::Protocol(format!("invalid resolution body: {e}")))?;

        match body.identity {
            Some(dto) => {
                let identity = dto.into_identity()?;
                debug!(member = %identity.id, "resolved identity");
                Ok(Some(identity))
            }
            None => Ok(None),
        }
    }
}
