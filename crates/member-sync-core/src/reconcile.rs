//! Membership label reconciliation.
//!
//! A normalized event maps to at most one [`MembershipAction`]. The
//! [`Reconciler`] then finds (or creates) the subscriber in the
//! [`MemberDirectory`], re-reads the record, and writes the label set back
//! only when adding or removing [`ACTIVE_SUBSCRIBER_LABEL`] changed it.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::payload::NormalizedEvent;
use crate::DirectoryError;

/// Label that marks a member as a paying subscriber.
pub const ACTIVE_SUBSCRIBER_LABEL: &str = "active-subscriber";

/// Note attached to members created by the bridge.
pub const MEMBER_NOTE: &str = "Created via Fungies payment";

/// Events that grant the subscriber label.
pub const GRANT_EVENTS: &[&str] = &[
    "subscription.created",
    "subscription.updated",
    "subscription.renewed",
    "subscription.interval",
    "payment.success",
];

/// Events that revoke the subscriber label.
pub const REVOKE_EVENTS: &[&str] = &[
    "subscription.cancelled",
    "payment.failed",
    "payment.refunded",
];

/// What an event asks the bridge to do with the subscriber label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipAction {
    Grant,
    Revoke,
}

impl MembershipAction {
    /// Map a canonical event key to an action. Unknown keys map to `None`.
    pub fn for_event(event_key: &str) -> Option<Self> {
        if GRANT_EVENTS.contains(&event_key) {
            Some(Self::Grant)
        } else if REVOKE_EVENTS.contains(&event_key) {
            Some(Self::Revoke)
        } else {
            None
        }
    }

    /// Whether the label should be present after the action.
    pub fn label_present(self) -> bool {
        matches!(self, Self::Grant)
    }
}

/// Add or remove `label` so that its presence matches `present`.
///
/// Removing drops every occurrence. Other labels keep their relative order.
/// Returns `true` when `labels` changed.
///
/// # Examples
///
/// ```
/// use member_sync_core::reconcile::ensure_label;
///
/// let mut labels = vec!["vip".to_string()];
/// assert!(ensure_label(&mut labels, "active-subscriber", true));
/// assert!(!ensure_label(&mut labels, "active-subscriber", true));
/// assert_eq!(labels, vec!["vip", "active-subscriber"]);
/// ```
pub fn ensure_label(labels: &mut Vec<String>, label: &str, present: bool) -> bool {
    let has_label = labels.iter().any(|l| l == label);

    match (present, has_label) {
        (true, false) => {
            labels.push(label.to_string());
            true
        }
        (false, true) => {
            labels.retain(|l| l != label);
            true
        }
        _ => false,
    }
}

/// Result of applying an action to a member's labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelChange {
    LabelAdded,
    LabelRemoved,
    NoChange,
}

impl LabelChange {
    /// Wire name of the change.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LabelAdded => "label_added",
            Self::LabelRemoved => "label_removed",
            Self::NoChange => "no_change",
        }
    }
}

impl std::fmt::Display for LabelChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A member as seen by the reconciler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriberMember {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    /// Label names, in the order the directory returned them.
    pub labels: Vec<String>,
}

/// Fields for creating a member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMember {
    pub email: String,
    pub name: Option<String>,
    pub note: String,
}

/// Interface to the store holding member records.
#[async_trait]
pub trait MemberDirectory: Send + Sync {
    /// Find the member with exactly this email.
    async fn find_by_email(&self, email: &str) -> Result<Option<SubscriberMember>, DirectoryError>;

    /// Fetch a member by id.
    async fn get(&self, member_id: &str) -> Result<SubscriberMember, DirectoryError>;

    /// Create a member with no labels.
    async fn create(&self, member: &NewMember) -> Result<SubscriberMember, DirectoryError>;

    /// Replace a member's labels.
    async fn update_labels(
        &self,
        member_id: &str,
        labels: &[String],
    ) -> Result<SubscriberMember, DirectoryError>;
}

/// What [`Reconciler::reconcile`] did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileOutcome {
    pub member_id: String,
    /// Whether the member was created by this call.
    pub created: bool,
    pub change: LabelChange,
    /// Labels after reconciliation.
    pub labels: Vec<String>,
}

/// Applies membership actions through a [`MemberDirectory`].
#[derive(Clone)]
pub struct Reconciler {
    directory: Arc<dyn MemberDirectory>,
}

impl Reconciler {
    pub fn new(directory: Arc<dyn MemberDirectory>) -> Self {
        Self { directory }
    }

    /// Bring the subscriber label of `event.email` in line with `action`.
    ///
    /// # Errors
    ///
    /// Propagates the first [`DirectoryError`]. Nothing is retried.
    #[instrument(skip(self, event), fields(event_key = %event.event_key, action = ?action))]
    pub async fn reconcile(
        &self,
        event: &NormalizedEvent,
        action: MembershipAction,
    ) -> Result<ReconcileOutcome, DirectoryError> {
        let (member_id, created) = match self.directory.find_by_email(&event.email).await? {
            Some(existing) => (existing.id, false),
            None => {
                let new_member = NewMember {
                    email: event.email.clone(),
                    name: event.name.clone(),
                    note: MEMBER_NOTE.to_string(),
                };
                let member = self.directory.create(&new_member).await?;
                info!(member_id = %member.id, "Created member");
                (member.id, true)
            }
        };

        // Re-read right before writing so labels added elsewhere survive.
        let current = self.directory.get(&member_id).await?;
        let mut labels = current.labels;

        let changed = ensure_label(&mut labels, ACTIVE_SUBSCRIBER_LABEL, action.label_present());
        if !changed {
            debug!(member_id = %member_id, "Subscriber label already up to date");
            return Ok(ReconcileOutcome {
                member_id,
                created,
                change: LabelChange::NoChange,
                labels,
            });
        }

        let updated = self.directory.update_labels(&member_id, &labels).await?;
        let change = match action {
            MembershipAction::Grant => LabelChange::LabelAdded,
            MembershipAction::Revoke => LabelChange::LabelRemoved,
        };
        info!(member_id = %member_id, change = %change, "Updated subscriber label");

        Ok(ReconcileOutcome {
            member_id,
            created,
            change,
            labels: updated.labels,
        })
    }
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "reconcile_tests.rs"]
mod tests;
