//! Workspace Entity
//!
//! An isolated organizational unit with its own credential, slug and set of
//! experts.

use chrono::{DateTime, Utc};
use kernel::id::WorkspaceId;

use crate::domain::value_object::slug::Slug;

/// Slug of the workspace exempt from retention sweeping.
/// Exactly one such workspace exists; it is seeded at startup.
pub const PROTECTED_WORKSPACE_SLUG: &str = "default";

/// Workspace entity
#[derive(Debug, Clone)]
pub struct Workspace {
    pub id: WorkspaceId,
    pub name: String,
    /// Globally unique, immutable after creation
    pub slug: Slug,
    /// Stored credential form (hashed; legacy rows may hold plaintext
    /// until the first successful login migrates them)
    pub password: String,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub organization: Option<String>,
    /// Display name used in outbound messages to experts
    pub sender_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Workspace {
    /// Create a new workspace. `password` must already be in stored form.
    pub fn new(name: impl Into<String>, slug: Slug, password: String) -> Self {
        Self {
            id: WorkspaceId::new(),
            name: name.into(),
            slug,
            password,
            contact_email: None,
            contact_phone: None,
            organization: None,
            sender_name: None,
            created_at: Utc::now(),
        }
    }

    /// Whether this workspace is exempt from retention sweeping
    pub fn is_protected(&self) -> bool {
        self.slug.as_str() == PROTECTED_WORKSPACE_SLUG
    }
}

/// Workspace row with its expert count, for master listings
#[derive(Debug, Clone)]
pub struct WorkspaceSummary {
    pub id: WorkspaceId,
    pub name: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
    pub expert_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protected_workspace() {
        let ws = Workspace::new("Default", Slug::new("default").unwrap(), "pw".into());
        assert!(ws.is_protected());

        let ws = Workspace::new("Acme", Slug::new("acme").unwrap(), "pw".into());
        assert!(!ws.is_protected());
    }
}
