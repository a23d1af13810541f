//! # Member Sync Core
//!
//! Domain logic for bridging payment provider webhooks to Ghost memberships.
//!
//! The crate is split along the stages a webhook goes through:
//! - [`signature`]: authenticate the raw body against the shared secret
//! - [`payload`]: pull the event type, email, product and name out of a
//!   payload whose shape varies between provider versions
//! - [`reconcile`]: map the event to a label mutation and apply it through a
//!   [`MemberDirectory`]
//!
//! [`checkout`] holds the small outbound client used to create and poll
//! checkout sessions. Infrastructure implementations of the core traits live
//! in [`adapters`].
//!
//! ## Usage
//!
//! ```rust
//! use member_sync_core::payload::canonical_event_key;
//! use member_sync_core::reconcile::MembershipAction;
//!
//! let key = canonical_event_key("Payment_Success");
//! assert_eq!(key, "payment.success");
//! assert_eq!(MembershipAction::for_event(&key), Some(MembershipAction::Grant));
//! ```

// ============================================================================
// Error Types
// ============================================================================

/// Failures reported by a [`MemberDirectory`] implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DirectoryError {
    /// The member store answered with a non-success status.
    #[error("Member directory returned {status}: {body}")]
    Upstream { status: u16, body: String },

    /// The member store could not be reached.
    #[error("Member directory unavailable: {message}")]
    Unavailable { message: String },

    /// The member store answered with an unexpected body.
    #[error("Invalid member directory response: {message}")]
    InvalidResponse { message: String },

    /// Credentials or site URL for the member store are unusable.
    #[error("Member directory misconfigured: {message}")]
    Configuration { message: String },
}

/// Failures talking to the payment provider's session API.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CheckoutError {
    #[error("Payment provider returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Payment provider request failed: {message}")]
    Transport { message: String },

    #[error("Invalid payment provider response: {message}")]
    InvalidResponse { message: String },

    #[error("Payment provider client misconfigured: {message}")]
    Configuration { message: String },
}

/// Payload normalization failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NormalizeError {
    /// None of the known email locations held a value.
    #[error("Payload does not contain a subscriber email")]
    MissingEmail,
}

// ============================================================================
// Module declarations
// ============================================================================

/// Webhook signature verification
pub mod signature;

/// Defensive payload field extraction
pub mod payload;

/// Membership label reconciliation
pub mod reconcile;

/// Payment provider checkout session client
pub mod checkout;

/// Infrastructure implementations of core traits
pub mod adapters;

pub use checkout::{CheckoutRequest, CheckoutSession, FungiesClient, FungiesCredentials};
pub use payload::{normalize, NormalizedEvent};
pub use reconcile::{
    ensure_label, LabelChange, MemberDirectory, MembershipAction, NewMember, ReconcileOutcome,
    Reconciler, SubscriberMember, ACTIVE_SUBSCRIBER_LABEL,
};
pub use signature::verify;

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
