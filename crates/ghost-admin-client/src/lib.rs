//! # Ghost Admin Client
//!
//! Minimal client for the Ghost Admin API as used by member-sync.
//!
//! This crate provides:
//! - Parsing of Ghost admin API keys (`id:hexSecret`)
//! - Local minting of short-lived admin tokens (HS256, five minute validity)
//! - A typed client for the member endpoints (lookup, fetch, create, label update)
//!
//! # Examples
//!
//! ## Minting an admin token
//!
//! ```rust
//! use ghost_admin_client::auth::{AdminKey, AdminTokenMinter};
//!
//! let key = AdminKey::parse("6489f2a1c0ffee0001a1b2c3:00112233445566778899aabbccddeeff").unwrap();
//! let minter = AdminTokenMinter::new(key);
//! let token = minter.mint().unwrap();
//!
//! assert_eq!(token.token().split('.').count(), 3);
//! assert!(token.authorization_header().starts_with("Ghost "));
//! ```
//!
//! ## Talking to the Admin API
//!
//! ```rust,no_run
//! use ghost_admin_client::auth::AdminKey;
//! use ghost_admin_client::client::GhostAdminClient;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let key = AdminKey::parse("6489f2a1c0ffee0001a1b2c3:00112233445566778899aabbccddeeff")?;
//! let client = GhostAdminClient::new("https://example.ghost.io", key)?;
//!
//! if let Some(member) = client.find_member_by_email("reader@example.com").await? {
//!     println!("member {} has labels {:?}", member.id, member.label_names());
//! }
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod error;

pub use auth::{AdminKey, AdminToken, AdminTokenMinter};
pub use client::{ClientConfig, CreateMemberRequest, GhostAdminClient, Label, Member};
pub use error::{AdminKeyError, ApiError, AuthError};
