//! SQLite Repository Implementations

use chrono::{DateTime, Utc};
use kernel::id::{Id, WorkspaceId, WorkspaceRequestId};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::domain::entity::workspace::{Workspace, WorkspaceSummary};
use crate::domain::entity::workspace_request::{RequestStatus, WorkspaceRequest};
use crate::domain::repository::{
    RetentionRepository, WorkspaceRepository, WorkspaceRequestRepository,
};
use crate::domain::value_object::slug::Slug;
use crate::error::{WorkspaceError, WorkspaceResult};

/// SQLite-backed workspace repository
#[derive(Clone)]
pub struct SqliteWorkspaceRepository {
    pool: SqlitePool,
}

impl SqliteWorkspaceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

// ============================================================================
// Row types
// ============================================================================

#[derive(Debug, sqlx::FromRow)]
struct WorkspaceRow {
    id: Uuid,
    name: String,
    slug: String,
    password: String,
    contact_email: Option<String>,
    contact_phone: Option<String>,
    organization: Option<String>,
    sender_name: Option<String>,
    created_at: DateTime<Utc>,
}

impl WorkspaceRow {
    fn into_workspace(self) -> WorkspaceResult<Workspace> {
        let slug = Slug::new(&self.slug)
            .map_err(|e| WorkspaceError::Internal(format!("Corrupt slug in store: {e}")))?;

        Ok(Workspace {
            id: Id::from_uuid(self.id),
            name: self.name,
            slug,
            password: self.password,
            contact_email: self.contact_email,
            contact_phone: self.contact_phone,
            organization: self.organization,
            sender_name: self.sender_name,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct WorkspaceSummaryRow {
    id: Uuid,
    name: String,
    slug: String,
    created_at: DateTime<Utc>,
    expert_count: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct WorkspaceRequestRow {
    id: Uuid,
    name: String,
    slug: String,
    password: String,
    contact_name: String,
    contact_email: String,
    contact_phone: Option<String>,
    organization: Option<String>,
    sender_name: Option<String>,
    message: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
    processed_at: Option<DateTime<Utc>>,
    processed_by: Option<String>,
}

impl WorkspaceRequestRow {
    fn into_request(self) -> WorkspaceResult<WorkspaceRequest> {
        let slug = Slug::new(&self.slug)
            .map_err(|e| WorkspaceError::Internal(format!("Corrupt slug in store: {e}")))?;
        let status = RequestStatus::parse(&self.status).ok_or_else(|| {
            WorkspaceError::Internal(format!("Unknown request status: {}", self.status))
        })?;

        Ok(WorkspaceRequest {
            id: Id::from_uuid(self.id),
            name: self.name,
            slug,
            password: self.password,
            contact_name: self.contact_name,
            contact_email: self.contact_email,
            contact_phone: self.contact_phone,
            organization: self.organization,
            sender_name: self.sender_name,
            message: self.message,
            status,
            created_at: self.created_at,
            processed_at: self.processed_at,
            processed_by: self.processed_by,
        })
    }
}

const WORKSPACE_COLUMNS: &str = "id, name, slug, password, contact_email, contact_phone, \
                                 organization, sender_name, created_at";

const REQUEST_COLUMNS: &str = "id, name, slug, password, contact_name, contact_email, \
                               contact_phone, organization, sender_name, message, status, \
                               created_at, processed_at, processed_by";

// ============================================================================
// Workspace Repository Implementation
// ============================================================================

impl WorkspaceRepository for SqliteWorkspaceRepository {
    async fn create(&self, workspace: &Workspace) -> WorkspaceResult<()> {
        sqlx::query(
            r#"
            INSERT INTO workspaces (
                id, name, slug, password, contact_email, contact_phone,
                organization, sender_name, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(workspace.id.as_uuid())
        .bind(&workspace.name)
        .bind(workspace.slug.as_str())
        .bind(&workspace.password)
        .bind(&workspace.contact_email)
        .bind(&workspace.contact_phone)
        .bind(&workspace.organization)
        .bind(&workspace.sender_name)
        .bind(workspace.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_slug(&self, slug: &str) -> WorkspaceResult<Option<Workspace>> {
        let row = sqlx::query_as::<_, WorkspaceRow>(&format!(
            "SELECT {WORKSPACE_COLUMNS} FROM workspaces WHERE slug = ?"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        row.map(WorkspaceRow::into_workspace).transpose()
    }

    async fn find_by_id(&self, id: &WorkspaceId) -> WorkspaceResult<Option<Workspace>> {
        let row = sqlx::query_as::<_, WorkspaceRow>(&format!(
            "SELECT {WORKSPACE_COLUMNS} FROM workspaces WHERE id = ?"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(WorkspaceRow::into_workspace).transpose()
    }

    async fn exists_by_slug(&self, slug: &str) -> WorkspaceResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM workspaces WHERE slug = ?)",
        )
        .bind(slug)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn list(&self) -> WorkspaceResult<Vec<WorkspaceSummary>> {
        let rows = sqlx::query_as::<_, WorkspaceSummaryRow>(
            r#"
            SELECT
                w.id,
                w.name,
                w.slug,
                w.created_at,
                (SELECT COUNT(*) FROM experts e WHERE e.workspace_id = w.id) AS expert_count
            FROM workspaces w
            ORDER BY w.created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| WorkspaceSummary {
                id: Id::from_uuid(r.id),
                name: r.name,
                slug: r.slug,
                created_at: r.created_at,
                expert_count: r.expert_count,
            })
            .collect())
    }

    async fn update(&self, workspace: &Workspace) -> WorkspaceResult<()> {
        sqlx::query(
            r#"
            UPDATE workspaces SET
                name = ?,
                password = ?,
                contact_email = ?,
                contact_phone = ?,
                organization = ?,
                sender_name = ?
            WHERE id = ?
            "#,
        )
        .bind(&workspace.name)
        .bind(&workspace.password)
        .bind(&workspace.contact_email)
        .bind(&workspace.contact_phone)
        .bind(&workspace.organization)
        .bind(&workspace.sender_name)
        .bind(workspace.id.as_uuid())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_password(&self, id: &WorkspaceId, stored: &str) -> WorkspaceResult<()> {
        sqlx::query("UPDATE workspaces SET password = ? WHERE id = ?")
            .bind(stored)
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete_cascade(&self, id: &WorkspaceId) -> WorkspaceResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "DELETE FROM voter_responses WHERE expert_id IN \
             (SELECT id FROM experts WHERE workspace_id = ?)",
        )
        .bind(id.as_uuid())
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "DELETE FROM voter_passwords WHERE expert_id IN \
             (SELECT id FROM experts WHERE workspace_id = ?)",
        )
        .bind(id.as_uuid())
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "DELETE FROM polling_slots WHERE expert_id IN \
             (SELECT id FROM experts WHERE workspace_id = ?)",
        )
        .bind(id.as_uuid())
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM experts WHERE workspace_id = ?")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM workspaces WHERE id = ?")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }
}

// ============================================================================
// Workspace Request Repository Implementation
// ============================================================================

impl WorkspaceRequestRepository for SqliteWorkspaceRepository {
    async fn create_request(&self, request: &WorkspaceRequest) -> WorkspaceResult<()> {
        sqlx::query(
            r#"
            INSERT INTO workspace_requests (
                id, name, slug, password, contact_name, contact_email,
                contact_phone, organization, sender_name, message, status,
                created_at, processed_at, processed_by
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(request.id.as_uuid())
        .bind(&request.name)
        .bind(request.slug.as_str())
        .bind(&request.password)
        .bind(&request.contact_name)
        .bind(&request.contact_email)
        .bind(&request.contact_phone)
        .bind(&request.organization)
        .bind(&request.sender_name)
        .bind(&request.message)
        .bind(request.status.as_str())
        .bind(request.created_at)
        .bind(request.processed_at)
        .bind(&request.processed_by)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_request(
        &self,
        id: &WorkspaceRequestId,
    ) -> WorkspaceResult<Option<WorkspaceRequest>> {
        let row = sqlx::query_as::<_, WorkspaceRequestRow>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM workspace_requests WHERE id = ?"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(WorkspaceRequestRow::into_request).transpose()
    }

    async fn list_requests(&self) -> WorkspaceResult<Vec<WorkspaceRequest>> {
        let rows = sqlx::query_as::<_, WorkspaceRequestRow>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM workspace_requests ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(WorkspaceRequestRow::into_request)
            .collect()
    }

    async fn pending_exists_for_slug(&self, slug: &str) -> WorkspaceResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM workspace_requests WHERE slug = ? AND status = 'pending')",
        )
        .bind(slug)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn approve_request(
        &self,
        request: &WorkspaceRequest,
        workspace: &Workspace,
    ) -> WorkspaceResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO workspaces (
                id, name, slug, password, contact_email, contact_phone,
                organization, sender_name, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(workspace.id.as_uuid())
        .bind(&workspace.name)
        .bind(workspace.slug.as_str())
        .bind(&workspace.password)
        .bind(&workspace.contact_email)
        .bind(&workspace.contact_phone)
        .bind(&workspace.organization)
        .bind(&workspace.sender_name)
        .bind(workspace.created_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE workspace_requests SET status = ?, processed_at = ?, processed_by = ? \
             WHERE id = ?",
        )
        .bind(request.status.as_str())
        .bind(request.processed_at)
        .bind(&request.processed_by)
        .bind(request.id.as_uuid())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(())
    }

    async fn update_request(&self, request: &WorkspaceRequest) -> WorkspaceResult<()> {
        sqlx::query(
            "UPDATE workspace_requests SET status = ?, processed_at = ?, processed_by = ? \
             WHERE id = ?",
        )
        .bind(request.status.as_str())
        .bind(request.processed_at)
        .bind(&request.processed_by)
        .bind(request.id.as_uuid())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_request(&self, id: &WorkspaceRequestId) -> WorkspaceResult<()> {
        sqlx::query("DELETE FROM workspace_requests WHERE id = ?")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

// ============================================================================
// Retention Repository Implementation
// ============================================================================

impl RetentionRepository for SqliteWorkspaceRepository {
    async fn purge_requests_before(&self, cutoff: DateTime<Utc>) -> WorkspaceResult<u64> {
        let deleted = sqlx::query("DELETE FROM workspace_requests WHERE created_at < ?")
            .bind(cutoff)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted)
    }

    async fn expert_ids_before(&self, cutoff: DateTime<Utc>) -> WorkspaceResult<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>("SELECT id FROM experts WHERE created_at < ?")
            .bind(cutoff)
            .fetch_all(&self.pool)
            .await?;

        Ok(ids)
    }

    async fn delete_expert_cascade(&self, expert_id: &Uuid) -> WorkspaceResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM voter_responses WHERE expert_id = ?")
            .bind(expert_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM voter_passwords WHERE expert_id = ?")
            .bind(expert_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM polling_slots WHERE expert_id = ?")
            .bind(expert_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM experts WHERE id = ?")
            .bind(expert_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }

    async fn stale_workspace_ids(
        &self,
        cutoff: DateTime<Utc>,
        protected_slug: &str,
    ) -> WorkspaceResult<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM workspaces WHERE slug != ? AND created_at < ?",
        )
        .bind(protected_slug)
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    async fn delete_workspace_cascade(&self, workspace_id: &Uuid) -> WorkspaceResult<()> {
        WorkspaceRepository::delete_cascade(self, &Id::from_uuid(*workspace_id)).await
    }
}
