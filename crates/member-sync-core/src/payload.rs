//! Defensive field extraction from webhook payloads.
//!
//! The provider has shipped several payload shapes over time: fields at the
//! top level, nested under `data`, under `customer`, or inside the first line
//! item. Each field is described by an ordered list of dot paths and the
//! first path holding a non-empty string (or a number) wins. Numeric path
//! segments index into arrays, so `items.0.product_id` reads the first item.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::NormalizeError;

/// Locations of the event type, in priority order.
pub const EVENT_TYPE_PATHS: &[&str] = &[
    "type",
    "event",
    "action",
    "event.type",
    "data.type",
    "data.event",
];

/// Locations of the subscriber email, in priority order.
pub const EMAIL_PATHS: &[&str] = &[
    "email",
    "customer_email",
    "customer.email",
    "user.email",
    "data.customer.email",
    "subscription.customer.email",
    "data.metadata.email",
    "metadata.email",
];

/// Locations of the product identifier, in priority order.
pub const PRODUCT_ID_PATHS: &[&str] = &[
    "product_id",
    "productId",
    "product.id",
    "subscription.product.id",
    "data.product_id",
    "data.product.id",
    "items.0.product_id",
    "items.0.product.id",
    "line_items.0.product_id",
    "line_items.0.product.id",
    "data.items.0.product_id",
    "data.items.0.product.id",
];

/// Locations of the subscriber display name, in priority order.
pub const NAME_PATHS: &[&str] = &[
    "name",
    "customer_name",
    "customer.name",
    "data.customer.name",
    "data.metadata.name",
    "metadata.name",
];

/// Locations of the event id.
pub const EVENT_ID_PATHS: &[&str] = &["id", "data.id"];

/// Locations of the idempotency key.
pub const IDEMPOTENCY_KEY_PATHS: &[&str] =
    &["idempotency_key", "idempotencyKey", "data.idempotency_key"];

/// Fields extracted from a webhook payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedEvent {
    /// Canonical event key (lowercase, dot separated). Empty when the payload
    /// carries no event type.
    pub event_key: String,

    /// Subscriber email.
    pub email: String,

    /// Product the event refers to, if the payload names one.
    pub product_id: Option<String>,

    /// Subscriber display name, if the payload names one.
    pub name: Option<String>,
}

/// Resolve a dot-separated path against a JSON document.
///
/// Object segments are looked up by key; on arrays a segment that parses as
/// an index selects that element.
///
/// Example: `resolve_path(&json, "items.0.product.id")` returns
/// `&json["items"][0]["product"]["id"]`.
pub fn resolve_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Render a scalar node as a string.
///
/// Strings count only when they contain something besides whitespace and
/// are returned unmodified. Numbers are rendered in their JSON form.
fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Return the first path in `paths` that holds a usable scalar.
pub fn first_present(value: &Value, paths: &[&str]) -> Option<String> {
    paths
        .iter()
        .find_map(|path| resolve_path(value, path).and_then(scalar_string))
}

fn first_trimmed(value: &Value, paths: &[&str]) -> Option<String> {
    first_present(value, paths).map(|s| s.trim().to_string())
}

/// Canonicalize an event type: trim, lowercase and use `.` as separator.
///
/// `"Payment_Success"` and `"payment.success"` both become
/// `"payment.success"`.
pub fn canonical_event_key(raw: &str) -> String {
    raw.trim().to_lowercase().replace('_', ".")
}

/// The event type exactly as the payload spells it.
pub fn raw_event_type(value: &Value) -> Option<String> {
    first_present(value, EVENT_TYPE_PATHS)
}

/// Subscriber email with surrounding whitespace removed.
pub fn extract_email(value: &Value) -> Option<String> {
    first_trimmed(value, EMAIL_PATHS)
}

/// Product identifier with surrounding whitespace removed.
pub fn extract_product_id(value: &Value) -> Option<String> {
    first_trimmed(value, PRODUCT_ID_PATHS)
}

/// Subscriber display name with surrounding whitespace removed.
pub fn extract_name(value: &Value) -> Option<String> {
    first_trimmed(value, NAME_PATHS)
}

/// Extract every field the bridge needs from a payload.
///
/// # Errors
///
/// Returns [`NormalizeError::MissingEmail`] when no email location holds a
/// value. A missing event type or product is not an error.
pub fn normalize(value: &Value) -> Result<NormalizedEvent, NormalizeError> {
    let email = extract_email(value).ok_or(NormalizeError::MissingEmail)?;

    Ok(NormalizedEvent {
        event_key: raw_event_type(value)
            .map(|raw| canonical_event_key(&raw))
            .unwrap_or_default(),
        email,
        product_id: extract_product_id(value),
        name: extract_name(value),
    })
}

#[cfg(test)]
#[path = "payload_tests.rs"]
mod tests;
