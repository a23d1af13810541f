//! Member endpoints of the Ghost Admin API.
//!
//! Ghost wraps every member payload in a `{"members": [...]}` envelope, both
//! in requests and responses.

use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::GhostAdminClient;
use crate::error::ApiError;

/// A label attached to a member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    /// Ghost-assigned id; absent when referencing a label by name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Display name. Labels are matched by name.
    pub name: String,

    /// URL slug; absent when referencing a label by name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

impl Label {
    /// Reference a label by name only. Ghost creates unknown labels on demand.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            slug: None,
        }
    }
}

/// A Ghost member record (only the fields member-sync reads).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub labels: Vec<Label>,
}

impl Member {
    /// Names of the member's labels in the order Ghost returned them.
    pub fn label_names(&self) -> Vec<String> {
        self.labels.iter().map(|l| l.name.clone()).collect()
    }
}

/// Body of a member creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateMemberRequest {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub labels: Vec<Label>,
}

impl CreateMemberRequest {
    /// A new member with the given email and no labels.
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: None,
            note: None,
            labels: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct MembersEnvelope {
    #[serde(default)]
    members: Vec<Member>,
}

#[derive(Debug, Serialize)]
struct MembersBody<T> {
    members: Vec<T>,
}

#[derive(Debug, Serialize)]
struct LabelsUpdate {
    labels: Vec<Label>,
}

impl MembersEnvelope {
    fn into_single(self, context: &str) -> Result<Member, ApiError> {
        self.members
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::InvalidResponse {
                message: format!("{} returned no member", context),
            })
    }
}

impl GhostAdminClient {
    /// Look up a member by exact email (`filter=email:'...'`, `limit=1`).
    ///
    /// Returns `Ok(None)` when no member has that email.
    #[instrument(skip(self, email))]
    pub async fn find_member_by_email(&self, email: &str) -> Result<Option<Member>, ApiError> {
        let filter = email_filter(email);
        let request = self
            .request(Method::GET, "members/")?
            .query(&[("filter", filter.as_str()), ("limit", "1")]);

        let envelope: MembersEnvelope = self.send(request).await?;
        let member = envelope.members.into_iter().next();

        debug!(found = member.is_some(), "Member lookup by email complete");
        Ok(member)
    }

    /// Fetch a member by id.
    #[instrument(skip(self))]
    pub async fn get_member(&self, member_id: &str) -> Result<Member, ApiError> {
        let request = self.request(Method::GET, &format!("members/{}/", member_id))?;
        let envelope: MembersEnvelope = self.send(request).await?;
        envelope.into_single("member fetch")
    }

    /// Create a member.
    #[instrument(skip(self, member))]
    pub async fn create_member(&self, member: &CreateMemberRequest) -> Result<Member, ApiError> {
        let body = MembersBody {
            members: vec![member],
        };
        let request = self.request(Method::POST, "members/")?.json(&body);
        let envelope: MembersEnvelope = self.send(request).await?;
        envelope.into_single("member creation")
    }

    /// Replace a member's labels with `label_names`.
    #[instrument(skip(self, label_names), fields(label_count = label_names.len()))]
    pub async fn update_member_labels(
        &self,
        member_id: &str,
        label_names: &[String],
    ) -> Result<Member, ApiError> {
        let body = MembersBody {
            members: vec![LabelsUpdate {
                labels: label_names.iter().map(Label::named).collect(),
            }],
        };
        let request = self
            .request(Method::PUT, &format!("members/{}/", member_id))?
            .json(&body);
        let envelope: MembersEnvelope = self.send(request).await?;
        envelope.into_single("member update")
    }
}

/// Ghost NQL filter matching one email exactly.
pub(crate) fn email_filter(email: &str) -> String {
    format!("email:'{}'", email.replace('\'', "\\'"))
}

#[cfg(test)]
#[path = "members_tests.rs"]
mod tests;
