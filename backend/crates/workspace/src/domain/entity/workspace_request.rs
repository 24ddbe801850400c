//! Workspace Request Entity
//!
//! A pending public application to create a workspace. Approval
//! deterministically produces the workspace and stamps the request.

use chrono::{DateTime, Utc};
use kernel::id::WorkspaceRequestId;

use crate::domain::entity::workspace::Workspace;
use crate::domain::value_object::slug::Slug;
use crate::error::{WorkspaceError, WorkspaceResult};

/// Request lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(RequestStatus::Pending),
            "approved" => Some(RequestStatus::Approved),
            "rejected" => Some(RequestStatus::Rejected),
            _ => None,
        }
    }
}

/// Workspace request entity
#[derive(Debug, Clone)]
pub struct WorkspaceRequest {
    pub id: WorkspaceRequestId,
    pub name: String,
    pub slug: Slug,
    /// Stored credential form; hashed at submission time
    pub password: String,
    pub contact_name: String,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub organization: Option<String>,
    pub sender_name: Option<String>,
    pub message: Option<String>,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub processed_by: Option<String>,
}

impl WorkspaceRequest {
    pub fn new(
        name: impl Into<String>,
        slug: Slug,
        password: String,
        contact_name: impl Into<String>,
        contact_email: impl Into<String>,
    ) -> Self {
        Self {
            id: WorkspaceRequestId::new(),
            name: name.into(),
            slug,
            password,
            contact_name: contact_name.into(),
            contact_email: contact_email.into(),
            contact_phone: None,
            organization: None,
            sender_name: None,
            message: None,
            status: RequestStatus::Pending,
            created_at: Utc::now(),
            processed_at: None,
            processed_by: None,
        }
    }

    /// Build the workspace this request describes.
    ///
    /// Only pending requests can be approved. Legacy rows created before
    /// submission-time hashing may still hold plaintext; they are hashed
    /// here so the workspace never starts with a plaintext credential.
    pub fn to_workspace(&self) -> WorkspaceResult<Workspace> {
        if self.status != RequestStatus::Pending {
            return Err(WorkspaceError::AlreadyProcessed);
        }

        let password = if platform::password::is_hashed(&self.password) {
            self.password.clone()
        } else {
            platform::password::hash_password(&self.password)
        };

        let mut workspace = Workspace::new(self.name.clone(), self.slug.clone(), password);
        workspace.contact_email = Some(self.contact_email.clone());
        workspace.contact_phone = self.contact_phone.clone();
        workspace.organization = self.organization.clone();
        workspace.sender_name = self
            .sender_name
            .clone()
            .or_else(|| self.organization.clone());

        Ok(workspace)
    }

    /// Stamp the request as processed
    pub fn mark_processed(&mut self, status: RequestStatus, by: impl Into<String>) {
        self.status = status;
        self.processed_at = Some(Utc::now());
        self.processed_by = Some(by.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform::password::{hash_password, is_hashed, verify_password};

    fn request() -> WorkspaceRequest {
        WorkspaceRequest::new(
            "Acme Lab",
            Slug::new("acme").unwrap(),
            hash_password("acme-pass"),
            "Jin",
            "jin@example.com",
        )
    }

    #[test]
    fn test_status_roundtrip() {
        for status in [
            RequestStatus::Pending,
            RequestStatus::Approved,
            RequestStatus::Rejected,
        ] {
            assert_eq!(RequestStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(RequestStatus::parse("bogus"), None);
    }

    #[test]
    fn test_to_workspace_carries_credential() {
        let req = request();
        let ws = req.to_workspace().unwrap();
        assert_eq!(ws.slug.as_str(), "acme");
        assert_eq!(ws.name, "Acme Lab");
        assert!(verify_password("acme-pass", &ws.password));
        assert_eq!(ws.contact_email.as_deref(), Some("jin@example.com"));
    }

    #[test]
    fn test_to_workspace_hashes_legacy_plaintext() {
        let mut req = request();
        req.password = "plain-secret".to_string();
        let ws = req.to_workspace().unwrap();
        assert!(is_hashed(&ws.password));
        assert!(verify_password("plain-secret", &ws.password));
    }

    #[test]
    fn test_to_workspace_rejects_processed() {
        let mut req = request();
        req.mark_processed(RequestStatus::Rejected, "master");
        assert!(matches!(
            req.to_workspace(),
            Err(WorkspaceError::AlreadyProcessed)
        ));
    }

    #[test]
    fn test_sender_name_falls_back_to_organization() {
        let mut req = request();
        req.organization = Some("Physics Dept".to_string());
        let ws = req.to_workspace().unwrap();
        assert_eq!(ws.sender_name.as_deref(), Some("Physics Dept"));
    }
}
