//! Webhook signature verification.
//!
//! The payment provider signs webhook bodies with HMAC-SHA256, but the secret
//! is handed out in more than one encoding and the signature header has been
//! sent as hex, base64 and base64url. Verification therefore tries a fixed,
//! ordered set of secret decodings against a fixed, ordered set of candidate
//! messages and accepts on the first constant-time match.
//!
//! Candidate messages are the raw body first. When the body is JSON, the
//! fallbacks are the body re-serialized with sorted keys, the body
//! re-serialized in document order, and a few scalars taken from the payload.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde_json::{Map, Value};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::payload::{first_present, raw_event_type, EVENT_ID_PATHS, IDEMPOTENCY_KEY_PATHS};

type HmacSha256 = Hmac<Sha256>;

/// Prefix carried by secrets issued in the `sec_<base64>` form.
pub const SECRET_PREFIX: &str = "sec_";

/// Prefix some senders put in front of the signature.
pub const SIGNATURE_PREFIX: &str = "sha256=";

type SecretDecoder = fn(&str) -> Option<Vec<u8>>;

/// Secret decodings, tried in order.
const SECRET_DECODERS: [SecretDecoder; 3] = [decode_prefixed_base64, decode_hex, raw_bytes];

/// Verify `signature_header` over `raw_body` with the shared `secret`.
///
/// Returns `false` when the secret or signature is empty, when the signature
/// is neither hex nor base64, or when no candidate matches.
///
/// # Examples
///
/// ```
/// use hmac::{Hmac, Mac};
/// use member_sync_core::signature::verify;
/// use sha2::Sha256;
///
/// let body = br#"{"type":"payment.success"}"#;
/// let mut mac = Hmac::<Sha256>::new_from_slice(b"shared").unwrap();
/// mac.update(body);
/// let signature = hex::encode(mac.finalize().into_bytes());
///
/// assert!(verify(body, "shared", &signature));
/// assert!(!verify(body, "other", &signature));
/// ```
pub fn verify(raw_body: &[u8], secret: &str, signature_header: &str) -> bool {
    if secret.is_empty() {
        return false;
    }

    let expected = match decode_signature(signature_header) {
        Some(bytes) => bytes,
        None => {
            debug!("Signature header could not be decoded");
            return false;
        }
    };

    let keys = secret_candidates(secret);
    if keys.is_empty() {
        return false;
    }

    if matches_any(&keys, raw_body, &expected) {
        return true;
    }

    let payload: Value = match serde_json::from_slice(raw_body) {
        Ok(value) => value,
        Err(_) => return false,
    };

    let matched = message_candidates(&payload)
        .iter()
        .any(|message| matches_any(&keys, message, &expected));

    if matched {
        debug!("Signature matched a derived message");
    }
    matched
}

/// Decode a signature header into digest bytes.
///
/// Accepts an optional `sha256=` prefix, then hex, then base64url or
/// base64 with or without padding.
pub fn decode_signature(header: &str) -> Option<Vec<u8>> {
    let trimmed = header.trim();
    let value = trimmed.strip_prefix(SIGNATURE_PREFIX).unwrap_or(trimmed);
    if value.is_empty() {
        return None;
    }

    if let Ok(bytes) = hex::decode(value) {
        return non_empty(bytes);
    }

    let mut standard: String = value
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();
    while standard.len() % 4 != 0 {
        standard.push('=');
    }

    STANDARD.decode(standard).ok().and_then(non_empty)
}

/// Every usable decoding of `secret`, in priority order.
pub fn secret_candidates(secret: &str) -> Vec<Vec<u8>> {
    SECRET_DECODERS
        .iter()
        .filter_map(|decode| decode(secret))
        .collect()
}

fn decode_prefixed_base64(secret: &str) -> Option<Vec<u8>> {
    let encoded = secret.strip_prefix(SECRET_PREFIX).unwrap_or(secret);
    STANDARD.decode(encoded).ok().and_then(non_empty)
}

fn decode_hex(secret: &str) -> Option<Vec<u8>> {
    hex::decode(secret).ok().and_then(non_empty)
}

fn raw_bytes(secret: &str) -> Option<Vec<u8>> {
    non_empty(secret.as_bytes().to_vec())
}

fn non_empty(bytes: Vec<u8>) -> Option<Vec<u8>> {
    if bytes.is_empty() {
        None
    } else {
        Some(bytes)
    }
}

/// HMAC-SHA256 of `message` keyed by `key`.
pub fn compute_hmac(key: &[u8], message: &[u8]) -> Option<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(key).ok()?;
    mac.update(message);
    Some(mac.finalize().into_bytes().to_vec())
}

/// Constant-time comparison of two digests.
///
/// Slices of different length never match; the length itself is not secret.
pub fn secure_compare(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && bool::from(a.ct_eq(b))
}

fn matches_any(keys: &[Vec<u8>], message: &[u8], expected: &[u8]) -> bool {
    keys.iter().any(|key| {
        compute_hmac(key, message)
            .map(|digest| secure_compare(&digest, expected))
            .unwrap_or(false)
    })
}

/// Messages derived from a parsed payload, in the order they are tried.
pub fn message_candidates(payload: &Value) -> Vec<Vec<u8>> {
    let mut candidates: Vec<Vec<u8>> = Vec::new();
    let mut push = |candidate: Vec<u8>| {
        if !candidate.is_empty() && !candidates.contains(&candidate) {
            candidates.push(candidate);
        }
    };

    let script_form = script_numbers(payload);
    if let Ok(canonical) = serde_json::to_vec(&sort_keys(&script_form)) {
        push(canonical);
    }
    if let Ok(naive) = serde_json::to_vec(&script_form) {
        push(naive);
    }

    let id = first_present(payload, EVENT_ID_PATHS);
    let idempotency_key = first_present(payload, IDEMPOTENCY_KEY_PATHS);
    let event_type = raw_event_type(payload);

    for scalar in [&id, &idempotency_key, &event_type].into_iter().flatten() {
        push(scalar.clone().into_bytes());
    }

    let compounds = [
        (&id, &event_type),
        (&event_type, &id),
        (&idempotency_key, &id),
    ];
    for (first, second) in compounds {
        if let (Some(first), Some(second)) = (first, second) {
            push(format!("{}.{}", first, second).into_bytes());
        }
    }

    candidates
}

/// Copy of `value` with every object's keys in sorted order.
pub fn sort_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let mut sorted = Map::with_capacity(entries.len());
            for (key, child) in entries {
                sorted.insert(key.clone(), sort_keys(child));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_keys).collect()),
        other => other.clone(),
    }
}

/// Largest integer a JavaScript number holds exactly (2^53).
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Copy of `value` with whole-valued floats turned into integers.
///
/// Senders that re-serialize with `JSON.stringify` write `10.0` as `10`.
pub fn script_numbers(value: &Value) -> Value {
    match value {
        Value::Number(number) if number.is_f64() => number
            .as_f64()
            .filter(|f| f.fract() == 0.0 && f.abs() <= MAX_EXACT_INTEGER)
            .map(|f| Value::from(f as i64))
            .unwrap_or_else(|| value.clone()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, child)| (key.clone(), script_numbers(child)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(script_numbers).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
#[path = "signature_tests.rs"]
mod tests;
