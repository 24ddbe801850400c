//! Workspace Request Use Cases
//!
//! Public submission of workspace applications plus the master-side review
//! lifecycle (approve / reject / delete).

use std::sync::Arc;

use platform::client::RequestMeta;
use serde_json::json;

use crate::domain::entity::audit_log::{ActorType, AuditEntry};
use crate::domain::entity::workspace::Workspace;
use crate::domain::entity::workspace_request::{RequestStatus, WorkspaceRequest};
use crate::domain::repository::{WorkspaceRepository, WorkspaceRequestRepository};
use crate::domain::value_object::slug::Slug;
use crate::error::{WorkspaceError, WorkspaceResult};
use crate::infra::audit::AuditLogger;
use kernel::id::WorkspaceRequestId;

/// Input for the public request form
pub struct SubmitRequestInput {
    pub name: String,
    pub slug: String,
    pub password: String,
    pub contact_name: String,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub organization: Option<String>,
    pub message: Option<String>,
}

/// Workspace request use case
pub struct WorkspaceRequestsUseCase<R>
where
    R: WorkspaceRepository + WorkspaceRequestRepository,
{
    repo: Arc<R>,
    audit: AuditLogger,
}

impl<R> WorkspaceRequestsUseCase<R>
where
    R: WorkspaceRepository + WorkspaceRequestRepository,
{
    pub fn new(repo: Arc<R>, audit: AuditLogger) -> Self {
        Self { repo, audit }
    }

    /// Public submission. The credential is hashed before it is stored.
    pub async fn submit(&self, input: SubmitRequestInput) -> WorkspaceResult<WorkspaceRequest> {
        if input.name.trim().is_empty()
            || input.contact_name.trim().is_empty()
            || input.contact_email.trim().is_empty()
        {
            return Err(WorkspaceError::Validation(
                "Name, slug, password and contact details are required".to_string(),
            ));
        }

        let slug =
            Slug::new(&input.slug).map_err(|e| WorkspaceError::Validation(e.to_string()))?;
        let password = platform::password::validate_new_password(&input.password)?;

        // The slug must be free both among live workspaces and pending requests
        if self.repo.exists_by_slug(slug.as_str()).await?
            || self.repo.pending_exists_for_slug(slug.as_str()).await?
        {
            return Err(WorkspaceError::SlugTaken);
        }

        let mut request = WorkspaceRequest::new(
            input.name.trim(),
            slug,
            platform::password::hash_password(&password),
            input.contact_name.trim(),
            input.contact_email.trim(),
        );
        request.contact_phone = input.contact_phone;
        request.organization = input.organization;
        request.message = input.message;

        self.repo.create_request(&request).await?;

        Ok(request)
    }

    pub async fn list(&self) -> WorkspaceResult<Vec<WorkspaceRequest>> {
        self.repo.list_requests().await
    }

    /// Approve a pending request: creates the workspace and stamps the
    /// request in one transaction.
    pub async fn approve(
        &self,
        id: &WorkspaceRequestId,
        meta: &RequestMeta,
    ) -> WorkspaceResult<Workspace> {
        let mut request = self
            .repo
            .find_request(id)
            .await?
            .ok_or(WorkspaceError::RequestNotFound)?;

        let workspace = request.to_workspace()?;
        request.mark_processed(RequestStatus::Approved, "master");

        self.repo.approve_request(&request, &workspace).await?;

        self.audit.record(
            AuditEntry::new(ActorType::Master, "master", "workspace_request_approve")
                .with_target("workspace_request", id.to_string())
                .with_workspace(*workspace.id.as_uuid())
                .with_metadata(json!({ "slug": workspace.slug.as_str() }))
                .with_request(meta),
        );

        Ok(workspace)
    }

    pub async fn reject(&self, id: &WorkspaceRequestId, meta: &RequestMeta) -> WorkspaceResult<()> {
        let mut request = self
            .repo
            .find_request(id)
            .await?
            .ok_or(WorkspaceError::RequestNotFound)?;

        if request.status != RequestStatus::Pending {
            return Err(WorkspaceError::AlreadyProcessed);
        }

        request.mark_processed(RequestStatus::Rejected, "master");
        self.repo.update_request(&request).await?;

        self.audit.record(
            AuditEntry::new(ActorType::Master, "master", "workspace_request_reject")
                .with_target("workspace_request", id.to_string())
                .with_request(meta),
        );

        Ok(())
    }

    pub async fn delete(&self, id: &WorkspaceRequestId, meta: &RequestMeta) -> WorkspaceResult<()> {
        self.repo.delete_request(id).await?;

        self.audit.record(
            AuditEntry::new(ActorType::Master, "master", "workspace_request_delete")
                .with_target("workspace_request", id.to_string())
                .with_request(meta),
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::sqlite::SqliteWorkspaceRepository;
    use sqlx::SqlitePool;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("../../../database/migrations")
            .run(&pool)
            .await
            .unwrap();
        pool
    }

    fn use_case(pool: &SqlitePool) -> WorkspaceRequestsUseCase<SqliteWorkspaceRepository> {
        WorkspaceRequestsUseCase::new(
            Arc::new(SqliteWorkspaceRepository::new(pool.clone())),
            AuditLogger::new(pool.clone()),
        )
    }

    fn input(slug: &str) -> SubmitRequestInput {
        SubmitRequestInput {
            name: "Acme Lab".into(),
            slug: slug.into(),
            password: "pw-1234".into(),
            contact_name: "Jin".into(),
            contact_email: "jin@example.com".into(),
            contact_phone: None,
            organization: Some("Physics Dept".into()),
            message: None,
        }
    }

    #[tokio::test]
    async fn test_submit_hashes_password() {
        let pool = test_pool().await;
        let uc = use_case(&pool);

        let request = uc.submit(input("acme")).await.unwrap();
        assert!(platform::password::is_hashed(&request.password));
        assert_eq!(request.status, RequestStatus::Pending);
    }

    #[tokio::test]
    async fn test_submit_missing_fields_is_400() {
        let pool = test_pool().await;
        let uc = use_case(&pool);

        let mut bad = input("acme");
        bad.contact_email = "  ".into();
        let err = uc.submit(bad).await.unwrap_err();
        assert!(matches!(err, WorkspaceError::Validation(_)));
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn test_submit_rejects_taken_slug() {
        let pool = test_pool().await;
        let uc = use_case(&pool);

        uc.submit(input("acme")).await.unwrap();
        let err = uc.submit(input("acme")).await.unwrap_err();
        assert!(matches!(err, WorkspaceError::SlugTaken));
    }

    #[tokio::test]
    async fn test_approve_creates_workspace_once() {
        let pool = test_pool().await;
        let uc = use_case(&pool);
        let meta = RequestMeta::default();

        let request = uc.submit(input("acme")).await.unwrap();
        let workspace = uc.approve(&request.id, &meta).await.unwrap();
        assert_eq!(workspace.slug.as_str(), "acme");
        assert_eq!(workspace.sender_name.as_deref(), Some("Physics Dept"));

        // Login credential carried over from the request
        assert!(platform::password::verify_password(
            "pw-1234",
            &workspace.password
        ));

        // Approving again fails: already processed
        let err = uc.approve(&request.id, &meta).await.unwrap_err();
        assert!(matches!(err, WorkspaceError::AlreadyProcessed));
    }

    #[tokio::test]
    async fn test_reject_then_approve_fails() {
        let pool = test_pool().await;
        let uc = use_case(&pool);
        let meta = RequestMeta::default();

        let request = uc.submit(input("acme")).await.unwrap();
        uc.reject(&request.id, &meta).await.unwrap();

        let err = uc.approve(&request.id, &meta).await.unwrap_err();
        assert!(matches!(err, WorkspaceError::AlreadyProcessed));

        let err = uc.reject(&request.id, &meta).await.unwrap_err();
        assert!(matches!(err, WorkspaceError::AlreadyProcessed));

        // A rejected request frees the slug for a new submission
        uc.submit(input("acme")).await.unwrap();
    }

    #[tokio::test]
    async fn test_unknown_request_is_404() {
        let pool = test_pool().await;
        let uc = use_case(&pool);

        let err = uc
            .approve(&WorkspaceRequestId::new(), &RequestMeta::default())
            .await
            .unwrap_err();
        assert!(matches!(err, WorkspaceError::RequestNotFound));
    }
}
