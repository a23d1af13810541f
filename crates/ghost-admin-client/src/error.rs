//! Error types for Ghost Admin API operations.
//!
//! Credential problems are kept separate from transport and API failures so
//! callers can tell a misconfigured deployment apart from an unhealthy
//! upstream.

use thiserror::Error;

/// Problems with the configured admin API key.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AdminKeyError {
    /// No admin key was configured.
    #[error("Admin API key is not configured")]
    Missing,

    /// The key does not contain the `:` between id and secret.
    #[error("Admin API key must have the form 'id:secret'")]
    MissingSeparator,

    /// The id half of the key is empty.
    #[error("Admin API key id is empty")]
    EmptyId,

    /// The secret half is empty or not valid hex.
    #[error("Admin API key secret is invalid: {message}")]
    InvalidSecret { message: String },
}

/// Token minting errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The admin key could not be used.
    #[error("Invalid admin key: {0}")]
    InvalidAdminKey(#[from] AdminKeyError),

    /// The token could not be encoded or signed.
    #[error("Admin token signing failed: {message}")]
    SigningFailed { message: String },
}

/// Ghost Admin API errors.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Token minting failed before the request was sent.
    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// The configured site URL is unusable.
    #[error("Invalid site URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    /// Network connectivity or transport error.
    #[error("HTTP request failed: {message}")]
    Transport { message: String },

    /// Ghost answered with a non-success status code.
    #[error("Ghost Admin API returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body did not have the expected shape.
    #[error("Unexpected Ghost Admin API response: {message}")]
    InvalidResponse { message: String },
}

impl From<reqwest::Error> for ApiError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            Self::InvalidResponse {
                message: error.to_string(),
            }
        } else {
            Self::Transport {
                message: error.to_string(),
            }
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
