//! Admin token minting.
//!
//! Tokens are built by hand rather than through a JWT library: the format is
//! fixed (HS256, three claims) and the signing key is the raw hex-decoded
//! admin secret.
//!
//! ```text
//! base64url({"alg":"HS256","kid":"<id>","typ":"JWT"})
//!   . base64url({"iat":<now>,"exp":<now+300>,"aud":"/admin/"})
//!   . base64url(HMAC-SHA256(secret, header "." claims))
//! ```

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;

use super::{AdminKey, AdminToken};
use crate::error::AuthError;

/// Seconds an admin token stays valid.
pub const TOKEN_LIFETIME_SECONDS: i64 = 300;

/// Audience claim required by the Admin API.
pub const ADMIN_AUDIENCE: &str = "/admin/";

type HmacSha256 = Hmac<Sha256>;

#[derive(Serialize)]
struct TokenHeader<'a> {
    alg: &'static str,
    kid: &'a str,
    typ: &'static str,
}

#[derive(Serialize)]
struct TokenClaims {
    iat: i64,
    exp: i64,
    aud: &'static str,
}

/// Mints Ghost admin tokens from an [`AdminKey`].
///
/// # Examples
///
/// ```
/// use ghost_admin_client::auth::{AdminKey, AdminTokenMinter, TOKEN_LIFETIME_SECONDS};
///
/// let key = AdminKey::parse("6489f2a1c0ffee0001a1b2c3:00112233").unwrap();
/// let token = AdminTokenMinter::new(key).mint_at(1_700_000_000).unwrap();
///
/// assert_eq!(
///     (token.expires_at() - token.issued_at()).num_seconds(),
///     TOKEN_LIFETIME_SECONDS
/// );
/// ```
#[derive(Debug, Clone)]
pub struct AdminTokenMinter {
    key: AdminKey,
}

impl AdminTokenMinter {
    /// Create a minter for the given key.
    pub fn new(key: AdminKey) -> Self {
        Self { key }
    }

    /// Id of the key tokens are minted for.
    pub fn key_id(&self) -> &str {
        self.key.id()
    }

    /// Mint a token issued now.
    pub fn mint(&self) -> Result<AdminToken, AuthError> {
        self.mint_at(Utc::now().timestamp())
    }

    /// Mint a token issued at `issued_at` (unix seconds).
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::SigningFailed`] if the timestamp is out of range
    /// or the segments cannot be encoded.
    pub fn mint_at(&self, issued_at: i64) -> Result<AdminToken, AuthError> {
        let expires_at = issued_at + TOKEN_LIFETIME_SECONDS;

        let header = TokenHeader {
            alg: "HS256",
            kid: self.key.id(),
            typ: "JWT",
        };
        let claims = TokenClaims {
            iat: issued_at,
            exp: expires_at,
            aud: ADMIN_AUDIENCE,
        };

        let signing_input = format!(
            "{}.{}",
            encode_segment(&header)?,
            encode_segment(&claims)?
        );

        let mut mac = HmacSha256::new_from_slice(self.key.secret()).map_err(|e| {
            AuthError::SigningFailed {
                message: format!("Failed to initialise HMAC: {}", e),
            }
        })?;
        mac.update(signing_input.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(AdminToken::new(
            format!("{}.{}", signing_input, signature),
            timestamp(issued_at)?,
            timestamp(expires_at)?,
        ))
    }
}

fn encode_segment<T: Serialize>(value: &T) -> Result<String, AuthError> {
    let json = serde_json::to_vec(value).map_err(|e| AuthError::SigningFailed {
        message: format!("Failed to encode token segment: {}", e),
    })?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

fn timestamp(seconds: i64) -> Result<DateTime<Utc>, AuthError> {
    Utc.timestamp_opt(seconds, 0)
        .single()
        .ok_or_else(|| AuthError::SigningFailed {
            message: format!("Timestamp {} is out of range", seconds),
        })
}

#[cfg(test)]
#[path = "token_tests.rs"]
mod tests;
