//! Checkout session creation and payment status polling.

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::Json,
};
use bytes::Bytes;
use member_sync_core::{CheckoutRequest, CheckoutSession};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::config::BridgeSettings;
use crate::errors::BridgeError;
use crate::AppState;

pub const CREATE_PAYMENT_PATH: &str = "/api/create-payment";
pub const PAYMENT_STATUS_PATH: &str = "/api/payment-status";

/// Query of the payment status endpoint
#[derive(Debug, Deserialize)]
pub struct PaymentStatusQuery {
    #[serde(rename = "sessionId", default)]
    pub session_id: Option<String>,
}

/// Open a checkout session for `{amount, email, name}`
#[instrument(skip(state, headers, body))]
pub async fn handle_create_payment(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<CheckoutSession>, BridgeError> {
    let document: Value = serde_json::from_slice(&body).map_err(|_| BridgeError::InvalidJson)?;

    let amount = document
        .get("amount")
        .filter(|v| is_present(v))
        .cloned()
        .ok_or(BridgeError::MissingFields)?;
    let email = text_field(&document, "email").ok_or(BridgeError::MissingFields)?;
    let name = text_field(&document, "name").ok_or(BridgeError::MissingFields)?;

    let payments = state.payments_client()?;
    let base = public_base_url(state.bridge(), &headers)?;
    debug!(email = %email, base = %base, "Creating checkout session");

    let request = CheckoutRequest {
        amount,
        email,
        name,
        success_url: format!("{}/payment-success", base),
        cancel_url: format!("{}/payment-cancel", base),
    };

    let session = payments.create_session(&request).await?;
    info!(session_id = %session.session_id, "Checkout session created");

    Ok(Json(session))
}

/// Proxy the provider's view of a checkout session
#[instrument(skip(state, query))]
pub async fn handle_payment_status(
    State(state): State<AppState>,
    Query(query): Query<PaymentStatusQuery>,
) -> Result<Json<Value>, BridgeError> {
    let session_id = query
        .session_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or(BridgeError::MissingFields)?;

    let payments = state.payments_client()?;
    let session = payments.session_status(&session_id).await?;

    Ok(Json(session))
}

/// Plain `OPTIONS` requests; CORS preflights are answered by the CORS layer.
pub async fn handle_preflight() -> StatusCode {
    StatusCode::OK
}

/// Base URL for the success and cancel pages.
///
/// `PUBLIC_BASE_URL` wins; otherwise `https://{Host}`.
pub fn public_base_url(bridge: &BridgeSettings, headers: &HeaderMap) -> Result<String, BridgeError> {
    if let Some(base) = bridge.public_base_url.as_deref() {
        return Ok(base.trim_end_matches('/').to_string());
    }

    headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|host| !host.is_empty())
        .map(|host| format!("https://{}", host))
        .ok_or(BridgeError::MissingConfiguration {
            key: BridgeSettings::PUBLIC_BASE_URL,
        })
}

/// Whether a JSON value counts as supplied.
///
/// `null`, `false`, zero and blank strings do not.
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn text_field(document: &Value, field: &str) -> Option<String> {
    document
        .get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

#[cfg(test)]
#[path = "checkout_tests.rs"]
mod tests;
