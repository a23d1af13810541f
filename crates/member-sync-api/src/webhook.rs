//! Webhook endpoint.
//!
//! A POST passes through these gates in order, each failing closed:
//!
//! 1. API key (only when a read or write key is configured)
//! 2. Signature over the raw body
//! 3. JSON parse
//! 4. Event extraction, which requires an email
//! 5. Product filter (only when a product id is configured)
//! 6. Event to action mapping
//!
//! Only then is the member directory touched.

use axum::{extract::State, http::HeaderMap, response::Json};
use bytes::Bytes;
use member_sync_core::{payload, signature, MembershipAction, NormalizedEvent, Reconciler};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::config::BridgeSettings;
use crate::errors::BridgeError;
use crate::responses::{ConfiguredFlags, ProbeResponse, WebhookReply};
use crate::AppState;

/// Primary webhook path.
pub const WEBHOOK_PATH: &str = "/webhook";

/// Webhook path under the API prefix.
pub const WEBHOOK_API_PATH: &str = "/api/fungies-webhook";

/// Header carrying the write API key.
pub const WRITE_API_KEY_HEADER: &str = "x-write-api-key";

/// Header carrying the read API key.
pub const READ_API_KEY_HEADER: &str = "x-api-key";

/// Headers that may carry the signature, in priority order.
pub const SIGNATURE_HEADERS: &[&str] = &[
    "x-fungies-signature",
    "x-fungies-signature-sha256",
    "x-signature",
    "x-webhook-signature",
    "x-hub-signature",
];

/// Handle a payment provider notification
#[instrument(skip(state, headers, body), fields(body_size = body.len()))]
pub async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookReply>, BridgeError> {
    let bridge = state.bridge();

    check_api_key(bridge, &headers)?;

    let secret = bridge
        .webhook_secret
        .as_deref()
        .ok_or(BridgeError::MissingConfiguration {
            key: BridgeSettings::FUNGIES_WEBHOOK_SECRET,
        })?;

    let provided = signature_header(&headers).ok_or_else(|| {
        warn!("Webhook request carries no signature header");
        BridgeError::InvalidSignature
    })?;

    if !signature::verify(&body, secret, provided) {
        warn!("Webhook signature verification failed");
        return Err(BridgeError::InvalidSignature);
    }

    let document: Value = serde_json::from_slice(&body).map_err(|e| {
        warn!(error = %e, "Webhook body is not valid JSON");
        BridgeError::InvalidJson
    })?;

    let event = payload::normalize(&document)?;
    debug!(email = %event.email, product_id = ?event.product_id, "Normalized webhook event");

    if !product_allowed(bridge, &event) {
        info!(event_key = %event.event_key, product_id = ?event.product_id, "Ignoring event for another product");
        return Ok(Json(WebhookReply::ignored(
            WebhookReply::PRODUCT_MISMATCH,
            None,
        )));
    }

    let action = match MembershipAction::for_event(&event.event_key) {
        Some(action) => action,
        None => {
            info!(event_key = %event.event_key, "Ignoring unhandled event");
            return Ok(Json(WebhookReply::ignored(
                WebhookReply::UNHANDLED_EVENT,
                Some(event.event_key),
            )));
        }
    };

    let directory = state.member_directory()?;
    let outcome = Reconciler::new(directory).reconcile(&event, action).await?;

    info!(
        event_key = %event.event_key,
        member_id = %outcome.member_id,
        created = outcome.created,
        action = %outcome.change,
        "Webhook processed"
    );

    Ok(Json(WebhookReply::applied(event.event_key, outcome.change)))
}

/// Report which settings are present
pub async fn handle_probe(State(state): State<AppState>) -> Json<ProbeResponse> {
    Json(ProbeResponse {
        ok: true,
        configured: ConfiguredFlags::from(state.bridge()),
    })
}

/// Enforce the inbound API key when one is configured.
///
/// Each configured key is checked against its own header; any match passes.
pub fn check_api_key(bridge: &BridgeSettings, headers: &HeaderMap) -> Result<(), BridgeError> {
    let gates = [
        (bridge.write_api_key.as_deref(), WRITE_API_KEY_HEADER),
        (bridge.read_api_key.as_deref(), READ_API_KEY_HEADER),
    ];

    let mut configured = gates
        .iter()
        .filter_map(|(key, header)| key.map(|k| (k, *header)))
        .peekable();

    if configured.peek().is_none() {
        return Ok(());
    }

    let authorized = configured.any(|(expected, header)| {
        header_value(headers, header)
            .map(|provided| signature::secure_compare(provided.as_bytes(), expected.as_bytes()))
            .unwrap_or(false)
    });

    if authorized {
        Ok(())
    } else {
        warn!("Webhook request failed the API key check");
        Err(BridgeError::InvalidApiKey)
    }
}

/// First non-empty signature header.
pub fn signature_header(headers: &HeaderMap) -> Option<&str> {
    SIGNATURE_HEADERS
        .iter()
        .find_map(|name| header_value(headers, name))
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Whether the event passes the product filter.
///
/// Without a configured product every event passes; with one, an event
/// naming no product does not.
pub fn product_allowed(bridge: &BridgeSettings, event: &NormalizedEvent) -> bool {
    match bridge.product_id.as_deref() {
        Some(expected) => event.product_id.as_deref() == Some(expected),
        None => true,
    }
}

#[cfg(test)]
#[path = "webhook_tests.rs"]
mod tests;
