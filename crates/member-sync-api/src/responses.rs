//! Response bodies of the API.

use member_sync_core::LabelChange;
use serde::{Deserialize, Serialize};

use crate::config::BridgeSettings;

/// Webhook processing response
///
/// Either `{ok, event, action}` for an applied event or
/// `{ok, ignored, reason[, event]}` for an event the bridge skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookReply {
    pub ok: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<LabelChange>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignored: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl WebhookReply {
    /// Reason given when the product is not the configured one.
    pub const PRODUCT_MISMATCH: &'static str = "product_mismatch";

    /// Reason given for events that do not map to an action.
    pub const UNHANDLED_EVENT: &'static str = "unhandled_event";

    /// The event was applied.
    pub fn applied(event: impl Into<String>, action: LabelChange) -> Self {
        Self {
            ok: true,
            event: Some(event.into()),
            action: Some(action),
            ignored: None,
            reason: None,
        }
    }

    /// The event was accepted but not acted on.
    pub fn ignored(reason: &str, event: Option<String>) -> Self {
        Self {
            ok: true,
            event,
            action: None,
            ignored: Some(true),
            reason: Some(reason.to_string()),
        }
    }
}

/// Which settings are present, without their values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfiguredFlags {
    pub webhook_secret: bool,
    pub admin_api_key: bool,
    pub api_url: bool,
    pub product_filter: bool,
    pub api_key_gate: bool,
}

impl From<&BridgeSettings> for ConfiguredFlags {
    fn from(settings: &BridgeSettings) -> Self {
        Self {
            webhook_secret: settings.webhook_secret.is_some(),
            admin_api_key: settings.ghost_admin_api_key.is_some(),
            api_url: settings.ghost_api_url.is_some(),
            product_filter: settings.product_id.is_some(),
            api_key_gate: settings.api_key_gate_enabled(),
        }
    }
}

/// Webhook endpoint probe response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResponse {
    pub ok: bool,
    pub configured: ConfiguredFlags,
}

/// Health check response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
