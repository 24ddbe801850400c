//! Repository Traits
//!
//! Interfaces for data persistence. Implementation is in infrastructure layer.

use chrono::{DateTime, Utc};
use kernel::id::{WorkspaceId, WorkspaceRequestId};
use uuid::Uuid;

use crate::domain::entity::workspace::{Workspace, WorkspaceSummary};
use crate::domain::entity::workspace_request::WorkspaceRequest;
use crate::error::WorkspaceResult;

/// Workspace repository trait
#[trait_variant::make(WorkspaceRepository: Send)]
pub trait LocalWorkspaceRepository {
    /// Create a new workspace
    async fn create(&self, workspace: &Workspace) -> WorkspaceResult<()>;

    /// Find workspace by slug
    async fn find_by_slug(&self, slug: &str) -> WorkspaceResult<Option<Workspace>>;

    /// Find workspace by id
    async fn find_by_id(&self, id: &WorkspaceId) -> WorkspaceResult<Option<Workspace>>;

    /// Check if a slug is taken
    async fn exists_by_slug(&self, slug: &str) -> WorkspaceResult<bool>;

    /// List all workspaces with expert counts (master view)
    async fn list(&self) -> WorkspaceResult<Vec<WorkspaceSummary>>;

    /// Update all mutable fields (everything except id, slug, created_at)
    async fn update(&self, workspace: &Workspace) -> WorkspaceResult<()>;

    /// Rewrite only the stored credential (migrate-on-login)
    async fn update_password(&self, id: &WorkspaceId, stored: &str) -> WorkspaceResult<()>;

    /// Delete the workspace and every dependent row (experts, slots,
    /// responses, voter passwords) in one transaction
    async fn delete_cascade(&self, id: &WorkspaceId) -> WorkspaceResult<()>;
}

/// Workspace request repository trait
#[trait_variant::make(WorkspaceRequestRepository: Send)]
pub trait LocalWorkspaceRequestRepository {
    /// Create a new pending request
    async fn create_request(&self, request: &WorkspaceRequest) -> WorkspaceResult<()>;

    /// Find request by id
    async fn find_request(&self, id: &WorkspaceRequestId)
    -> WorkspaceResult<Option<WorkspaceRequest>>;

    /// All requests, newest first (master view)
    async fn list_requests(&self) -> WorkspaceResult<Vec<WorkspaceRequest>>;

    /// Whether a pending request already claims this slug
    async fn pending_exists_for_slug(&self, slug: &str) -> WorkspaceResult<bool>;

    /// Persist an approval: insert the workspace and stamp the request
    /// in one transaction
    async fn approve_request(
        &self,
        request: &WorkspaceRequest,
        workspace: &Workspace,
    ) -> WorkspaceResult<()>;

    /// Persist a status/processed stamp update
    async fn update_request(&self, request: &WorkspaceRequest) -> WorkspaceResult<()>;

    /// Delete a request
    async fn delete_request(&self, id: &WorkspaceRequestId) -> WorkspaceResult<()>;
}

/// Retention repository trait
///
/// Bulk-delete primitives for the retention sweeper. Cascades run inside a
/// single transaction each, so a crash never leaves a half-deleted expert
/// or workspace.
#[trait_variant::make(RetentionRepository: Send)]
pub trait LocalRetentionRepository {
    /// Purge workspace requests created before the cutoff
    async fn purge_requests_before(&self, cutoff: DateTime<Utc>) -> WorkspaceResult<u64>;

    /// Ids of experts created before the cutoff
    async fn expert_ids_before(&self, cutoff: DateTime<Utc>) -> WorkspaceResult<Vec<Uuid>>;

    /// Delete one expert and its dependent rows
    async fn delete_expert_cascade(&self, expert_id: &Uuid) -> WorkspaceResult<()>;

    /// Ids of non-protected workspaces created before the cutoff
    async fn stale_workspace_ids(
        &self,
        cutoff: DateTime<Utc>,
        protected_slug: &str,
    ) -> WorkspaceResult<Vec<Uuid>>;

    /// Delete one workspace and all descendants
    async fn delete_workspace_cascade(&self, workspace_id: &Uuid) -> WorkspaceResult<()>;
}
