//! Ghost admin authentication types.
//!
//! Ghost admin API keys have the form `{id}:{secret}` where the secret is
//! hex encoded. Requests to the Admin API carry a short-lived HS256 token
//! signed with the decoded secret and identified by the key id (`kid`).
//!
//! This module provides:
//! - [`AdminKey`]: a parsed, redacted admin API key
//! - [`AdminToken`]: a minted token with its validity window
//! - [`AdminTokenMinter`]: produces tokens from an [`AdminKey`]

mod token;

use chrono::{DateTime, Utc};
use std::str::FromStr;
use zeroize::Zeroizing;

use crate::error::AdminKeyError;

pub use token::{AdminTokenMinter, ADMIN_AUDIENCE, TOKEN_LIFETIME_SECONDS};

// ============================================================================
// AdminKey
// ============================================================================

/// A Ghost admin API key split into its id and decoded secret.
///
/// The secret bytes are zeroized on drop and never appear in `Debug` output.
///
/// # Examples
///
/// ```
/// use ghost_admin_client::auth::AdminKey;
///
/// let key = AdminKey::parse("6489f2a1c0ffee0001a1b2c3:0011aabb").unwrap();
/// assert_eq!(key.id(), "6489f2a1c0ffee0001a1b2c3");
/// assert!(!format!("{:?}", key).contains("0011aabb"));
/// ```
#[derive(Clone)]
pub struct AdminKey {
    id: String,
    secret: Zeroizing<Vec<u8>>,
}

impl AdminKey {
    /// Parse an admin key of the form `id:hexSecret`.
    ///
    /// Surrounding whitespace is ignored. The key is split on the first `:`.
    ///
    /// # Errors
    ///
    /// - [`AdminKeyError::Missing`] when the input is empty
    /// - [`AdminKeyError::MissingSeparator`] when there is no `:`
    /// - [`AdminKeyError::EmptyId`] when nothing precedes the `:`
    /// - [`AdminKeyError::InvalidSecret`] when the secret is empty or not hex
    pub fn parse(raw: &str) -> Result<Self, AdminKeyError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(AdminKeyError::Missing);
        }

        let (id, secret_hex) = raw
            .split_once(':')
            .ok_or(AdminKeyError::MissingSeparator)?;

        if id.is_empty() {
            return Err(AdminKeyError::EmptyId);
        }

        let secret = hex::decode(secret_hex).map_err(|e| AdminKeyError::InvalidSecret {
            message: format!("secret is not valid hex: {}", e),
        })?;

        if secret.is_empty() {
            return Err(AdminKeyError::InvalidSecret {
                message: "secret must not be empty".to_string(),
            });
        }

        Ok(Self {
            id: id.to_string(),
            secret: Zeroizing::new(secret),
        })
    }

    /// The key id, sent as the token's `kid` header.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub(crate) fn secret(&self) -> &[u8] {
        &self.secret
    }
}

impl FromStr for AdminKey {
    type Err = AdminKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Debug for AdminKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminKey")
            .field("id", &self.id)
            .field("secret", &"<REDACTED>")
            .finish()
    }
}

// ============================================================================
// AdminToken
// ============================================================================

/// A signed Ghost admin token.
///
/// Tokens are cheap to mint and valid for five minutes, so callers mint a
/// fresh one per request instead of caching.
#[derive(Clone)]
pub struct AdminToken {
    token: String,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl AdminToken {
    pub(crate) fn new(token: String, issued_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> Self {
        Self {
            token,
            issued_at,
            expires_at,
        }
    }

    /// The compact `header.claims.signature` string.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// When the token was issued.
    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    /// When the token stops being accepted.
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Value for the `Authorization` header of an Admin API request.
    pub fn authorization_header(&self) -> String {
        format!("Ghost {}", self.token)
    }
}

impl std::fmt::Debug for AdminToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminToken")
            .field("token", &"<REDACTED>")
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
