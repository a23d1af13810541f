//! Client for the payment provider's checkout session API.
//!
//! Two calls are supported: `POST /v1/sessions` to open a checkout session
//! and `GET /v1/sessions/{id}` to poll it. Both authenticate with the
//! `x-fngs-public-key` / `x-fngs-secret-key` header pair.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{instrument, warn};
use url::Url;
use zeroize::Zeroizing;

use crate::CheckoutError;

/// Default API base of the payment provider.
pub const DEFAULT_API_URL: &str = "https://api.fungies.io";

/// Currency used for every checkout session.
pub const CHECKOUT_CURRENCY: &str = "USD";

const PUBLIC_KEY_HEADER: &str = "x-fngs-public-key";
const SECRET_KEY_HEADER: &str = "x-fngs-secret-key";

/// API key pair for the payment provider.
#[derive(Clone)]
pub struct FungiesCredentials {
    public_key: String,
    secret_key: Zeroizing<String>,
}

impl FungiesCredentials {
    pub fn new(public_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            public_key: public_key.into(),
            secret_key: Zeroizing::new(secret_key.into()),
        }
    }
}

impl std::fmt::Debug for FungiesCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FungiesCredentials")
            .field("public_key", &self.public_key)
            .field("secret_key", &"<REDACTED>")
            .finish()
    }
}

/// Input for opening a checkout session.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutRequest {
    /// Amount exactly as the caller supplied it (number or string).
    pub amount: Value,
    pub email: String,
    pub name: String,
    pub success_url: String,
    pub cancel_url: String,
}

/// An opened checkout session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSession {
    pub session_id: String,
    pub checkout_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionBody<'a> {
    amount: &'a Value,
    currency: &'a str,
    success_url: &'a str,
    cancel_url: &'a str,
    metadata: SessionMetadata<'a>,
}

#[derive(Debug, Serialize)]
struct SessionMetadata<'a> {
    email: &'a str,
    name: &'a str,
}

#[derive(Debug, Deserialize)]
struct SessionCreated {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    url: Option<String>,
}

/// Client for the checkout session endpoints.
#[derive(Clone)]
pub struct FungiesClient {
    http_client: reqwest::Client,
    base_url: Url,
    credentials: FungiesCredentials,
}

impl FungiesClient {
    /// Create a client for `base_url` (see [`DEFAULT_API_URL`]).
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Configuration`] for an unusable base URL.
    pub fn new(base_url: &str, credentials: FungiesCredentials) -> Result<Self, CheckoutError> {
        let base_url = Url::parse(base_url.trim()).map_err(|e| CheckoutError::Configuration {
            message: format!("invalid API URL '{}': {}", base_url, e),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(CheckoutError::Configuration {
                message: format!("API URL '{}' cannot be used as a base", base_url),
            });
        }

        let http_client = reqwest::Client::builder()
            .user_agent(format!("member-sync/{}", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| CheckoutError::Configuration {
                message: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            http_client,
            base_url,
            credentials,
        })
    }

    fn sessions_url(&self, session_id: Option<&str>) -> Result<Url, CheckoutError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| CheckoutError::Configuration {
                    message: "API URL cannot be used as a base".to_string(),
                })?;
            segments.pop_if_empty().extend(["v1", "sessions"]);
            if let Some(id) = session_id {
                segments.push(id);
            }
        }
        Ok(url)
    }

    fn authenticated(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header(PUBLIC_KEY_HEADER, &self.credentials.public_key)
            .header(SECRET_KEY_HEADER, self.credentials.secret_key.as_str())
    }

    /// Open a checkout session.
    #[instrument(skip(self, request))]
    pub async fn create_session(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, CheckoutError> {
        let body = SessionBody {
            amount: &request.amount,
            currency: CHECKOUT_CURRENCY,
            success_url: &request.success_url,
            cancel_url: &request.cancel_url,
            metadata: SessionMetadata {
                email: &request.email,
                name: &request.name,
            },
        };

        let url = self.sessions_url(None)?;
        let response = self
            .authenticated(self.http_client.post(url))
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let created: SessionCreated = decode(response).await?;
        let session_id = match created.id {
            Some(Value::String(id)) if !id.is_empty() => id,
            Some(Value::Number(id)) => id.to_string(),
            _ => {
                return Err(CheckoutError::InvalidResponse {
                    message: "session response has no id".to_string(),
                })
            }
        };
        let checkout_url = created.url.ok_or_else(|| CheckoutError::InvalidResponse {
            message: "session response has no url".to_string(),
        })?;

        Ok(CheckoutSession {
            session_id,
            checkout_url,
        })
    }

    /// Fetch a session as the provider reports it.
    #[instrument(skip(self))]
    pub async fn session_status(&self, session_id: &str) -> Result<Value, CheckoutError> {
        let url = self.sessions_url(Some(session_id))?;
        let response = self
            .authenticated(self.http_client.get(url))
            .send()
            .await
            .map_err(transport_error)?;

        decode(response).await
    }
}

impl std::fmt::Debug for FungiesClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FungiesClient")
            .field("base_url", &self.base_url.as_str())
            .field("credentials", &self.credentials)
            .finish()
    }
}

fn transport_error(error: reqwest::Error) -> CheckoutError {
    CheckoutError::Transport {
        message: error.to_string(),
    }
}

async fn decode<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, CheckoutError> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read error body".to_string());
        warn!(status = status.as_u16(), "Payment provider request failed");
        return Err(CheckoutError::Upstream {
            status: status.as_u16(),
            body,
        });
    }

    response
        .json::<T>()
        .await
        .map_err(|e| CheckoutError::InvalidResponse {
            message: format!("Failed to parse response body: {}", e),
        })
}

#[cfg(test)]
#[path = "checkout_tests.rs"]
mod tests;
