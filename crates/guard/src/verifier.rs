//! External identity provider verification.
//!
//! Wraps each configured provider's credential-check endpoint behind the
//! [`ProviderClient`] trait so the sign-in flow can be exercised against a
//! mock. The raw credential is forwarded to the provider and nowhere else:
//! it is never persisted, never cached, and never written to a log line.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use banter_core::error::CoreError;
use serde::Deserialize;

use crate::config::GuardConfig;

/// Identity attributes a provider vouches for after verifying a credential.
#[derive(Debug, Clone, Deserialize)]
pub struct CanonicalIdentity {
    /// Provider-scoped stable account identifier.
    pub external_id: String,
    /// Display name as the provider currently knows it.
    pub display_name: String,
    /// Avatar URL, if the provider exposes one.
    pub avatar: Option<String>,
}

/// Ways a verification attempt can fail.
#[derive(Debug, thiserror::Error)]
pub enum VerificationFailure {
    /// The provider examined the credential and turned it down.
    #[error("provider rejected the credential")]
    InvalidCredential,

    /// The provider could not be reached or did not answer in time.
    #[error("provider unreachable: {0}")]
    Unreachable(String),

    /// The provider answered outside its contract (unexpected status or an
    /// unparseable body). Operator attention, not a caller problem.
    #[error("unexpected provider response ({status}): {detail}")]
    Rejected { status: u16, detail: String },

    /// No verification endpoint is configured for this provider name.
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
}

impl From<VerificationFailure> for CoreError {
    fn from(failure: VerificationFailure) -> Self {
        match failure {
            VerificationFailure::InvalidCredential => {
                CoreError::Unauthenticated("invalid credential".to_string())
            }
            VerificationFailure::Unreachable(detail) => CoreError::ProviderUnreachable(detail),
            VerificationFailure::Rejected { status, .. } => CoreError::Internal(format!(
                "unexpected response from identity provider ({status})"
            )),
            VerificationFailure::UnknownProvider(name) => CoreError::Internal(format!(
                "no verification endpoint configured for provider '{name}'"
            )),
        }
    }
}

/// Pluggable credential verification backend.
///
/// Implementations must not retry; transient failures surface as
/// [`VerificationFailure::Unreachable`] and the retry decision belongs to
/// the caller.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Verify `credential` with the named provider and return the identity
    /// it vouches for.
    async fn verify(
        &self,
        provider: &str,
        credential: &str,
    ) -> Result<CanonicalIdentity, VerificationFailure>;
}

/// Production [`ProviderClient`] hitting per-provider verification URLs.
///
/// Sends `POST {url}` with a JSON body `{"credential": "..."}` and expects
/// a JSON [`CanonicalIdentity`] back. Each request carries its own timeout.
pub struct HttpProviderClient {
    client: reqwest::Client,
    verify_urls: HashMap<String, String>,
    timeout: Duration,
}

impl HttpProviderClient {
    /// Create a client for the given provider endpoint map.
    pub fn new(verify_urls: HashMap<String, String>, timeout_secs: u64) -> Self {
        Self {
            client: reqwest::Client::new(),
            verify_urls,
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    /// Create a client from the guard configuration.
    pub fn from_config(config: &GuardConfig) -> Self {
        Self::new(config.provider_verify_urls.clone(), config.provider_timeout_secs)
    }
}

#[async_trait]
impl ProviderClient for HttpProviderClient {
    async fn verify(
        &self,
        provider: &str,
        credential: &str,
    ) -> Result<CanonicalIdentity, VerificationFailure> {
        let url = self
            .verify_urls
            .get(provider)
            .ok_or_else(|| VerificationFailure::UnknownProvider(provider.to_string()))?;

        let body = serde_json::json!({ "credential": credential });

        let response = self
            .client
            .post(url)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|err| classify_request_error(provider, &err))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            tracing::debug!(provider, "Provider declined credential");
            return Err(VerificationFailure::InvalidCredential);
        }
        if status.is_server_error() {
            tracing::warn!(provider, status = status.as_u16(), "Provider returned a server error");
            return Err(VerificationFailure::Unreachable(format!(
                "provider '{provider}' returned {status}"
            )));
        }
        if !status.is_success() {
            let detail = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            tracing::warn!(provider, status = status.as_u16(), "Unexpected provider response");
            return Err(VerificationFailure::Rejected { status: status.as_u16(), detail });
        }

        response.json::<CanonicalIdentity>().await.map_err(|err| {
            tracing::warn!(provider, error = %err, "Malformed provider response body");
            VerificationFailure::Rejected {
                status: status.as_u16(),
                detail: "malformed identity payload".to_string(),
            }
        })
    }
}

/// Classify a transport-level reqwest failure. Timeouts and connection
/// refusals are unreachable-provider cases; anything else still means the
/// round trip never completed, so it lands in the same bucket.
fn classify_request_error(provider: &str, err: &reqwest::Error) -> VerificationFailure {
    if err.is_timeout() {
        tracing::warn!(provider, "Provider verification timed out");
        return VerificationFailure::Unreachable(format!("provider '{provider}' timed out"));
    }
    tracing::warn!(provider, error = %err, "Provider request failed");
    VerificationFailure::Unreachable(format!("provider '{provider}' request failed"))
}
