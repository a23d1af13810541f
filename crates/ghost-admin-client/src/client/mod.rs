//! Ghost Admin API client.
//!
//! [`GhostAdminClient`] wraps a `reqwest::Client`, the Admin API base URL
//! (`{site}/ghost/api/admin`) and an [`AdminTokenMinter`]. Every request gets
//! a freshly minted token in the `Authorization: Ghost <token>` header.

mod members;

use std::time::Duration;

use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::auth::{AdminKey, AdminTokenMinter};
use crate::error::ApiError;

pub use members::{CreateMemberRequest, Label, Member};

/// Path of the Admin API below the site URL.
pub const ADMIN_API_PATH: &str = "ghost/api/admin";

/// Configuration for Ghost Admin API client behaviour.
///
/// # Examples
///
/// ```
/// use ghost_admin_client::client::ClientConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig::default().with_timeout(Duration::from_secs(10));
/// assert_eq!(config.timeout, Duration::from_secs(10));
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// User agent string for API requests
    pub user_agent: String,
    /// Request timeout duration
    pub timeout: Duration,
    /// Value of the `Accept-Version` header
    pub accept_version: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("member-sync/{}", env!("CARGO_PKG_VERSION")),
            timeout: Duration::from_secs(30),
            accept_version: "v5.0".to_string(),
        }
    }
}

impl ClientConfig {
    /// Set the user agent string.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the `Accept-Version` header value.
    pub fn with_accept_version(mut self, version: impl Into<String>) -> Self {
        self.accept_version = version.into();
        self
    }
}

/// Client for the Ghost Admin API.
#[derive(Clone)]
pub struct GhostAdminClient {
    http_client: reqwest::Client,
    api_base: String,
    minter: AdminTokenMinter,
    config: ClientConfig,
}

impl GhostAdminClient {
    /// Create a client for `site_url` with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidUrl`] if `site_url` is not an absolute
    /// http(s) URL, or [`ApiError::Transport`] if the HTTP client cannot be
    /// built.
    pub fn new(site_url: &str, admin_key: AdminKey) -> Result<Self, ApiError> {
        Self::with_config(site_url, admin_key, ClientConfig::default())
    }

    /// Create a client with an explicit configuration.
    pub fn with_config(
        site_url: &str,
        admin_key: AdminKey,
        config: ClientConfig,
    ) -> Result<Self, ApiError> {
        let api_base = admin_api_base(site_url)?;

        let http_client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::Transport {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        debug!(api_base = %api_base, key_id = %admin_key.id(), "Created Ghost admin client");

        Ok(Self {
            http_client,
            api_base,
            minter: AdminTokenMinter::new(admin_key),
            config,
        })
    }

    /// The Admin API base URL, without a trailing slash.
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Build an authenticated request for `path` relative to the Admin API base.
    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let token = self.minter.mint()?;
        let url = format!("{}/{}", self.api_base, path.trim_start_matches('/'));

        Ok(self
            .http_client
            .request(method, url)
            .header("Authorization", token.authorization_header())
            .header("Accept-Version", &self.config.accept_version))
    }

    /// Send a request and decode a successful JSON body.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error body".to_string());
            warn!(status = status.as_u16(), "Ghost Admin API request failed");
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response.json::<T>().await.map_err(|e| ApiError::InvalidResponse {
            message: format!("Failed to parse response body: {}", e),
        })
    }
}

impl std::fmt::Debug for GhostAdminClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GhostAdminClient")
            .field("api_base", &self.api_base)
            .field("key_id", &self.minter.key_id())
            .field("config", &self.config)
            .finish()
    }
}

/// Derive `{site}/ghost/api/admin` from a site URL.
fn admin_api_base(site_url: &str) -> Result<String, ApiError> {
    let trimmed = site_url.trim().trim_end_matches('/');

    let parsed = Url::parse(trimmed).map_err(|e| ApiError::InvalidUrl {
        url: site_url.to_string(),
        message: e.to_string(),
    })?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ApiError::InvalidUrl {
            url: site_url.to_string(),
            message: format!("unsupported scheme '{}'", parsed.scheme()),
        });
    }

    Ok(format!("{}/{}", trimmed, ADMIN_API_PATH))
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
