//! Common test utilities for member-sync integration tests
//!
//! This module provides:
//! - An in-memory [`MemberDirectory`] that records every call
//! - Webhook signing helpers
//! - Router and request helpers

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use hmac::{Hmac, Mac};
use member_sync_api::{create_router, AppState, BridgeSettings, ServiceConfig};
use member_sync_core::{DirectoryError, MemberDirectory, NewMember, SubscriberMember};
use serde_json::Value;
use sha2::Sha256;
use tower::ServiceExt;

pub const WEBHOOK_SECRET: &str = "whsec_integration";

// ============================================================================
// Recording member directory
// ============================================================================

/// A call made against the [`FakeDirectory`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryCall {
    FindByEmail(String),
    Get(String),
    Create(NewMember),
    UpdateLabels(String, Vec<String>),
}

/// In-memory directory keyed by member id
#[derive(Clone, Default)]
pub struct FakeDirectory {
    members: Arc<Mutex<HashMap<String, SubscriberMember>>>,
    calls: Arc<Mutex<Vec<DirectoryCall>>>,
}

impl FakeDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_member(self, id: &str, email: &str, labels: &[&str]) -> Self {
        self.members.lock().unwrap().insert(
            id.to_string(),
            SubscriberMember {
                id: id.to_string(),
                email: email.to_string(),
                name: None,
                labels: labels.iter().map(|l| l.to_string()).collect(),
            },
        );
        self
    }

    pub fn calls(&self) -> Vec<DirectoryCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn labels_of(&self, id: &str) -> Option<Vec<String>> {
        self.members.lock().unwrap().get(id).map(|m| m.labels.clone())
    }

    fn record(&self, call: DirectoryCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn not_found() -> DirectoryError {
        DirectoryError::Upstream {
            status: 404,
            body: "Member not found".to_string(),
        }
    }
}

#[async_trait::async_trait]
impl MemberDirectory for FakeDirectory {
    async fn find_by_email(&self, email: &str) -> Result<Option<SubscriberMember>, DirectoryError> {
        self.record(DirectoryCall::FindByEmail(email.to_string()));
        Ok(self
            .members
            .lock()
            .unwrap()
            .values()
            .find(|m| m.email == email)
            .cloned())
    }

    async fn get(&self, member_id: &str) -> Result<SubscriberMember, DirectoryError> {
        self.record(DirectoryCall::Get(member_id.to_string()));
        self.members
            .lock()
            .unwrap()
            .get(member_id)
            .cloned()
            .ok_or_else(Self::not_found)
    }

    async fn create(&self, member: &NewMember) -> Result<SubscriberMember, DirectoryError> {
        self.record(DirectoryCall::Create(member.clone()));
        let mut members = self.members.lock().unwrap();
        let created = SubscriberMember {
            id: format!("member-{}", members.len() + 1),
            email: member.email.clone(),
            name: member.name.clone(),
            labels: Vec::new(),
        };
        members.insert(created.id.clone(), created.clone());
        Ok(created)
    }

    async fn update_labels(
        &self,
        member_id: &str,
        labels: &[String],
    ) -> Result<SubscriberMember, DirectoryError> {
        self.record(DirectoryCall::UpdateLabels(
            member_id.to_string(),
            labels.to_vec(),
        ));
        let mut members = self.members.lock().unwrap();
        let member = members.get_mut(member_id).ok_or_else(Self::not_found)?;
        member.labels = labels.to_vec();
        Ok(member.clone())
    }
}

// ============================================================================
// Fixtures
// ============================================================================

/// Bridge settings with the webhook secret set
pub fn bridge_settings() -> BridgeSettings {
    BridgeSettings {
        webhook_secret: Some(WEBHOOK_SECRET.to_string()),
        ..BridgeSettings::default()
    }
}

/// Router whose member directory is `directory`
pub fn router_with(bridge: BridgeSettings, directory: &FakeDirectory) -> Router {
    let config = ServiceConfig {
        bridge,
        ..ServiceConfig::default()
    };
    let directory: Arc<dyn MemberDirectory> = Arc::new(directory.clone());
    create_router(AppState::new(config, Some(directory), None))
}

/// Hex HMAC-SHA256 of `body` keyed by the raw `secret`
pub fn sign(body: &[u8], secret: &str) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

/// POST `body` to `/webhook` signed with [`WEBHOOK_SECRET`]
pub fn signed_webhook(body: &str) -> Request<Body> {
    Request::post("/webhook")
        .header("content-type", "application/json")
        .header("x-fungies-signature", sign(body.as_bytes(), WEBHOOK_SECRET))
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Send `request` and decode the JSON response body
pub async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}
