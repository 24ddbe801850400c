//! Master Operator Use Cases
//!
//! Master authentication and site-wide workspace administration.

use std::sync::Arc;

use platform::client::RequestMeta;
use platform::crypto::constant_time_eq;
use platform::token::TokenClaims;
use serde_json::json;

use crate::application::config::WorkspaceConfig;
use crate::domain::entity::audit_log::{ActorType, AuditEntry};
use crate::domain::entity::workspace::{Workspace, WorkspaceSummary};
use crate::domain::repository::WorkspaceRepository;
use crate::domain::value_object::slug::Slug;
use crate::error::{WorkspaceError, WorkspaceResult};
use crate::infra::audit::AuditLogger;
use kernel::id::WorkspaceId;

/// Master authentication use case
pub struct MasterAuthUseCase {
    config: Arc<WorkspaceConfig>,
    audit: AuditLogger,
}

impl MasterAuthUseCase {
    pub fn new(config: Arc<WorkspaceConfig>, audit: AuditLogger) -> Self {
        Self { config, audit }
    }

    /// Verify the master password and issue a master token
    pub async fn authenticate(
        &self,
        password: &str,
        meta: &RequestMeta,
    ) -> WorkspaceResult<String> {
        let Some(expected) = self.config.master_password.as_deref() else {
            self.audit.record(
                AuditEntry::new(ActorType::Master, "master", "master_auth")
                    .failure(500, "missing_master_password")
                    .with_request(meta),
            );
            return Err(WorkspaceError::MasterPasswordUnset);
        };

        if !constant_time_eq(password.trim().as_bytes(), expected.trim().as_bytes()) {
            self.audit.record(
                AuditEntry::new(ActorType::Anonymous, "unknown", "master_auth")
                    .failure(401, "invalid_password")
                    .with_request(meta),
            );
            return Err(WorkspaceError::InvalidCredentials);
        }

        self.audit.record(
            AuditEntry::new(ActorType::Master, "master", "master_auth").with_request(meta),
        );

        Ok(self
            .config
            .token_service
            .issue(TokenClaims::master(), self.config.master_token_ttl))
    }
}

// ============================================================================
// Workspace administration
// ============================================================================

/// Input for creating a workspace directly (master only)
pub struct CreateWorkspaceInput {
    pub name: String,
    pub slug: String,
    pub password: String,
    pub organization: Option<String>,
    pub sender_name: Option<String>,
}

/// Input for updating a workspace (master only)
pub struct UpdateWorkspaceInput {
    pub name: Option<String>,
    pub password: Option<String>,
}

/// Site-wide workspace administration use case
pub struct WorkspaceAdminUseCase<R>
where
    R: WorkspaceRepository,
{
    repo: Arc<R>,
    audit: AuditLogger,
}

impl<R> WorkspaceAdminUseCase<R>
where
    R: WorkspaceRepository,
{
    pub fn new(repo: Arc<R>, audit: AuditLogger) -> Self {
        Self { repo, audit }
    }

    pub async fn list(&self) -> WorkspaceResult<Vec<WorkspaceSummary>> {
        self.repo.list().await
    }

    pub async fn create(
        &self,
        input: CreateWorkspaceInput,
        meta: &RequestMeta,
    ) -> WorkspaceResult<Workspace> {
        if input.name.trim().is_empty() {
            return Err(WorkspaceError::Validation(
                "Name, slug and password are required".to_string(),
            ));
        }

        let slug =
            Slug::new(&input.slug).map_err(|e| WorkspaceError::Validation(e.to_string()))?;
        let password = platform::password::validate_new_password(&input.password)?;

        if self.repo.exists_by_slug(slug.as_str()).await? {
            return Err(WorkspaceError::SlugTaken);
        }

        let mut workspace = Workspace::new(
            input.name.trim(),
            slug,
            platform::password::hash_password(&password),
        );
        workspace.organization = input.organization;
        workspace.sender_name = input.sender_name;

        self.repo.create(&workspace).await?;

        self.audit.record(
            AuditEntry::new(ActorType::Master, "master", "workspace_create")
                .with_target("workspace", workspace.id.to_string())
                .with_metadata(json!({
                    "slug": workspace.slug.as_str(),
                    "name": workspace.name,
                }))
                .with_request(meta),
        );

        Ok(workspace)
    }

    pub async fn update(
        &self,
        id: &WorkspaceId,
        input: UpdateWorkspaceInput,
        meta: &RequestMeta,
    ) -> WorkspaceResult<()> {
        if input.name.is_none() && input.password.is_none() {
            return Err(WorkspaceError::Validation("Nothing to update".to_string()));
        }

        let mut workspace = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or(WorkspaceError::WorkspaceNotFound)?;

        let changed_name = input.name.is_some();
        let changed_password = input.password.is_some();

        if let Some(name) = input.name {
            workspace.name = name;
        }
        if let Some(password) = input.password {
            let password = platform::password::validate_new_password(&password)?;
            workspace.password = platform::password::hash_password(&password);
        }

        self.repo.update(&workspace).await?;

        self.audit.record(
            AuditEntry::new(ActorType::Master, "master", "workspace_update")
                .with_target("workspace", id.to_string())
                .with_metadata(json!({
                    "changedName": changed_name,
                    "changedPassword": changed_password,
                }))
                .with_request(meta),
        );

        Ok(())
    }

    pub async fn delete(&self, id: &WorkspaceId, meta: &RequestMeta) -> WorkspaceResult<()> {
        if self.repo.find_by_id(id).await?.is_none() {
            return Err(WorkspaceError::WorkspaceNotFound);
        }

        self.repo.delete_cascade(id).await?;

        self.audit.record(
            AuditEntry::new(ActorType::Master, "master", "workspace_delete")
                .with_target("workspace", id.to_string())
                .with_request(meta),
        );

        Ok(())
    }
}
