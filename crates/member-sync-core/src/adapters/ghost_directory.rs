//! [`MemberDirectory`] backed by the Ghost Admin API.

use async_trait::async_trait;
use ghost_admin_client::{ApiError, CreateMemberRequest, GhostAdminClient, Member};

use crate::reconcile::{MemberDirectory, NewMember, SubscriberMember};
use crate::DirectoryError;

impl From<ApiError> for DirectoryError {
    fn from(error: ApiError) -> Self {
        match error {
            ApiError::Status { status, body } => DirectoryError::Upstream { status, body },
            ApiError::Transport { message } => DirectoryError::Unavailable { message },
            ApiError::InvalidResponse { message } => DirectoryError::InvalidResponse { message },
            ApiError::Auth(e) => DirectoryError::Configuration {
                message: e.to_string(),
            },
            ApiError::InvalidUrl { url, message } => DirectoryError::Configuration {
                message: format!("invalid site URL '{}': {}", url, message),
            },
        }
    }
}

/// Convert a Ghost member into the reconciler's view of it.
pub fn into_subscriber(member: Member) -> SubscriberMember {
    let labels = member.label_names();
    SubscriberMember {
        id: member.id,
        email: member.email,
        name: member.name,
        labels,
    }
}

#[async_trait]
impl MemberDirectory for GhostAdminClient {
    async fn find_by_email(&self, email: &str) -> Result<Option<SubscriberMember>, DirectoryError> {
        Ok(self.find_member_by_email(email).await?.map(into_subscriber))
    }

    async fn get(&self, member_id: &str) -> Result<SubscriberMember, DirectoryError> {
        Ok(into_subscriber(self.get_member(member_id).await?))
    }

    async fn create(&self, member: &NewMember) -> Result<SubscriberMember, DirectoryError> {
        let request = CreateMemberRequest {
            name: member.name.clone(),
            note: Some(member.note.clone()),
            ..CreateMemberRequest::new(member.email.clone())
        };
        Ok(into_subscriber(self.create_member(&request).await?))
    }

    async fn update_labels(
        &self,
        member_id: &str,
        labels: &[String],
    ) -> Result<SubscriberMember, DirectoryError> {
        Ok(into_subscriber(
            self.update_member_labels(member_id, labels).await?,
        ))
    }
}

#[cfg(test)]
#[path = "ghost_directory_tests.rs"]
mod tests;
