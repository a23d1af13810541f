//! Error types for the HTTP service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use member_sync_core::{CheckoutError, DirectoryError, NormalizeError};
use serde_json::json;
use tracing::{error, warn};

use crate::config::BridgeSettings;

/// Longest upstream body echoed back to the caller.
const MAX_DETAIL_LENGTH: usize = 500;

/// Request failures with their HTTP mapping
///
/// Each variant has a stable `error` code in the JSON body:
///
/// - `405` `method_not_allowed`
/// - `400` `invalid_json`, `missing_email`, `missing_fields`
/// - `401` `invalid_api_key`, `invalid_signature`
/// - `500` `missing_configuration`
/// - `502` `upstream_error`
///
/// Causes are logged server-side. Secret values never appear in either the
/// log or the body.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Request body is not valid JSON")]
    InvalidJson,

    #[error("Missing or invalid API key")]
    InvalidApiKey,

    #[error("Missing or invalid webhook signature")]
    InvalidSignature,

    #[error("Payload does not contain a subscriber email")]
    MissingEmail,

    #[error("Missing required fields")]
    MissingFields,

    /// A setting the request needs is absent or unusable.
    #[error("Missing configuration: {key}")]
    MissingConfiguration { key: &'static str },

    /// An upstream service failed or answered with an error.
    ///
    /// `status` is absent when no response was received.
    #[error("Upstream request failed: {body}")]
    Upstream { status: Option<u16>, body: String },
}

impl BridgeError {
    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            Self::MethodNotAllowed => "method_not_allowed",
            Self::InvalidJson => "invalid_json",
            Self::InvalidApiKey => "invalid_api_key",
            Self::InvalidSignature => "invalid_signature",
            Self::MissingEmail => "missing_email",
            Self::MissingFields => "missing_fields",
            Self::MissingConfiguration { .. } => "missing_configuration",
            Self::Upstream { .. } => "upstream_error",
        }
    }

    /// HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::InvalidJson | Self::MissingEmail | Self::MissingFields => {
                StatusCode::BAD_REQUEST
            }
            Self::InvalidApiKey | Self::InvalidSignature => StatusCode::UNAUTHORIZED,
            Self::MissingConfiguration { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Upstream { .. } => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for BridgeError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match &self {
            Self::MissingConfiguration { key } => {
                error!(key = %key, "Request needs configuration that is not set");
                json!({
                    "error": self.code(),
                    "message": self.to_string(),
                    "missing": key,
                })
            }
            Self::Upstream {
                status: upstream_status,
                body,
            } => {
                error!(upstream_status = ?upstream_status, "Upstream request failed");
                json!({
                    "error": self.code(),
                    "upstream_status": upstream_status,
                    "detail": truncate(body, MAX_DETAIL_LENGTH),
                })
            }
            _ => {
                warn!(error = self.code(), "Request rejected");
                json!({
                    "error": self.code(),
                    "message": self.to_string(),
                })
            }
        };

        (status, Json(body)).into_response()
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => format!("{}...", &text[..index]),
        None => text.to_string(),
    }
}

impl From<NormalizeError> for BridgeError {
    fn from(error: NormalizeError) -> Self {
        match error {
            NormalizeError::MissingEmail => Self::MissingEmail,
        }
    }
}

impl From<DirectoryError> for BridgeError {
    fn from(error: DirectoryError) -> Self {
        match error {
            DirectoryError::Upstream { status, body } => Self::Upstream {
                status: Some(status),
                body,
            },
            DirectoryError::Unavailable { message }
            | DirectoryError::InvalidResponse { message } => Self::Upstream {
                status: None,
                body: message,
            },
            DirectoryError::Configuration { message } => {
                warn!(error = %message, "Member directory rejected its configuration");
                Self::MissingConfiguration {
                    key: BridgeSettings::GHOST_ADMIN_API_KEY,
                }
            }
        }
    }
}

impl From<CheckoutError> for BridgeError {
    fn from(error: CheckoutError) -> Self {
        match error {
            CheckoutError::Upstream { status, body } => Self::Upstream {
                status: Some(status),
                body,
            },
            CheckoutError::Transport { message } | CheckoutError::InvalidResponse { message } => {
                Self::Upstream {
                    status: None,
                    body: message,
                }
            }
            CheckoutError::Configuration { message } => {
                warn!(error = %message, "Checkout client rejected its configuration");
                Self::MissingConfiguration {
                    key: BridgeSettings::FUNGIES_API_URL,
                }
            }
        }
    }
}

/// Service-level errors
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Failed to bind to address {address}: {message}")]
    BindFailed { address: String, message: String },

    #[error("Server failed: {message}")]
    ServerFailed { message: String },

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Configuration loading failed: {0}")]
    Load(#[from] ::config::ConfigError),
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;
