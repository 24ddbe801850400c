//! Audit Log Entry
//!
//! Append-only record of privileged actions. Writing one is always
//! best-effort; a failed write never affects the operation it describes.

use chrono::{DateTime, Utc};
use platform::client::RequestMeta;
use uuid::Uuid;

/// Who performed the action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorType {
    Master,
    Workspace,
    Expert,
    System,
    Anonymous,
}

impl ActorType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ActorType::Master => "master",
            ActorType::Workspace => "workspace",
            ActorType::Expert => "expert",
            ActorType::System => "system",
            ActorType::Anonymous => "anonymous",
        }
    }
}

/// Outcome of the audited action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditResult {
    Success,
    Failure,
}

impl AuditResult {
    pub const fn as_str(&self) -> &'static str {
        match self {
            AuditResult::Success => "success",
            AuditResult::Failure => "failure",
        }
    }
}

/// One audit record
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub id: Uuid,
    pub actor_type: ActorType,
    pub actor_id: String,
    pub workspace_id: Option<Uuid>,
    pub action: String,
    pub target_type: Option<String>,
    pub target_id: Option<String>,
    pub result: AuditResult,
    pub status_code: Option<u16>,
    pub reason: Option<String>,
    pub request: RequestMeta,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl AuditEntry {
    /// Start a successful entry; use the builder methods for the rest
    pub fn new(actor_type: ActorType, actor_id: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            actor_type,
            actor_id: actor_id.into(),
            workspace_id: None,
            action: action.into(),
            target_type: None,
            target_id: None,
            result: AuditResult::Success,
            status_code: Some(200),
            reason: None,
            request: RequestMeta::default(),
            metadata: None,
            created_at: Utc::now(),
        }
    }

    pub fn failure(mut self, status_code: u16, reason: impl Into<String>) -> Self {
        self.result = AuditResult::Failure;
        self.status_code = Some(status_code);
        self.reason = Some(reason.into());
        self
    }

    pub fn with_workspace(mut self, workspace_id: Uuid) -> Self {
        self.workspace_id = Some(workspace_id);
        self
    }

    pub fn with_target(mut self, target_type: impl Into<String>, target_id: impl Into<String>) -> Self {
        self.target_type = Some(target_type.into());
        self.target_id = Some(target_id.into());
        self
    }

    pub fn with_request(mut self, meta: &RequestMeta) -> Self {
        self.request = meta.clone();
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let entry = AuditEntry::new(ActorType::Master, "master", "workspace_create")
            .with_target("workspace", "ws-1")
            .with_metadata(serde_json::json!({ "slug": "acme" }));

        assert_eq!(entry.result, AuditResult::Success);
        assert_eq!(entry.status_code, Some(200));
        assert_eq!(entry.target_type.as_deref(), Some("workspace"));
        assert_eq!(entry.target_id.as_deref(), Some("ws-1"));
    }

    #[test]
    fn test_failure_builder() {
        let entry = AuditEntry::new(ActorType::Anonymous, "unknown", "master_auth")
            .failure(401, "invalid_password");

        assert_eq!(entry.result, AuditResult::Failure);
        assert_eq!(entry.status_code, Some(401));
        assert_eq!(entry.reason.as_deref(), Some("invalid_password"));
    }
}
