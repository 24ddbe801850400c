//! Retention Sweeper
//!
//! Scheduled batch job purging workspaces, experts and requests older than
//! the configured age. The workspace with the protected slug is exempt.
//! One item failing to delete never aborts the rest of the sweep; the
//! summary reports what actually got removed.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::domain::entity::workspace::PROTECTED_WORKSPACE_SLUG;
use crate::domain::repository::RetentionRepository;
use crate::error::WorkspaceResult;

/// Default retention age in years
pub const DEFAULT_RETENTION_YEARS: u32 = 5;

/// Result of one sweep
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetentionSummary {
    pub retention_years: u32,
    pub cutoff: DateTime<Utc>,
    pub deleted_requests: u64,
    pub deleted_experts: u64,
    pub deleted_workspaces: u64,
}

/// Retention sweeper
pub struct RetentionSweeper<R>
where
    R: RetentionRepository,
{
    repo: Arc<R>,
    years: u32,
}

impl<R> RetentionSweeper<R>
where
    R: RetentionRepository,
{
    pub fn new(repo: Arc<R>, years: u32) -> Self {
        Self {
            repo,
            years: years.max(1),
        }
    }

    /// Parse a retention-years setting, falling back to the default for
    /// missing or nonsensical values
    pub fn parse_years(value: Option<&str>) -> u32 {
        value
            .and_then(|v| v.trim().parse::<u32>().ok())
            .filter(|&y| y > 0)
            .unwrap_or(DEFAULT_RETENTION_YEARS)
    }

    /// Run one sweep. Per-item failures are logged and skipped.
    pub async fn run(&self) -> WorkspaceResult<RetentionSummary> {
        let cutoff = Utc::now() - Duration::days(i64::from(self.years) * 365);

        // 1) Old workspace requests
        let deleted_requests = match self.repo.purge_requests_before(cutoff).await {
            Ok(n) => n,
            Err(e) => {
                tracing::warn!(error = %e, "Retention: request purge failed");
                0
            }
        };

        // 2) Old experts (regardless of their workspace's age)
        let mut deleted_experts = 0u64;
        match self.repo.expert_ids_before(cutoff).await {
            Ok(ids) => {
                for id in ids {
                    match self.repo.delete_expert_cascade(&id).await {
                        Ok(()) => deleted_experts += 1,
                        Err(e) => {
                            tracing::warn!(error = %e, expert_id = %id, "Retention: expert delete failed");
                        }
                    }
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Retention: expert scan failed");
            }
        }

        // 3) Old workspaces with all descendants, protected one excepted
        let mut deleted_workspaces = 0u64;
        match self
            .repo
            .stale_workspace_ids(cutoff, PROTECTED_WORKSPACE_SLUG)
            .await
        {
            Ok(ids) => {
                for id in ids {
                    match self.repo.delete_workspace_cascade(&id).await {
                        Ok(()) => deleted_workspaces += 1,
                        Err(e) => {
                            tracing::warn!(error = %e, workspace_id = %id, "Retention: workspace delete failed");
                        }
                    }
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Retention: workspace scan failed");
            }
        }

        let summary = RetentionSummary {
            retention_years: self.years,
            cutoff,
            deleted_requests,
            deleted_experts,
            deleted_workspaces,
        };

        tracing::info!(
            retention_years = summary.retention_years,
            deleted_requests = summary.deleted_requests,
            deleted_experts = summary.deleted_experts,
            deleted_workspaces = summary.deleted_workspaces,
            "Retention sweep completed"
        );

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::workspace::Workspace;
    use crate::domain::repository::WorkspaceRepository;
    use crate::domain::value_object::slug::Slug;
    use crate::infra::sqlite::SqliteWorkspaceRepository;
    use sqlx::SqlitePool;
    use sqlx::sqlite::SqlitePoolOptions;
    use uuid::Uuid;

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

    async fn seed_workspace(pool: &SqlitePool, slug: &str, age_days: i64) -> Workspace {
        let repo = SqliteWorkspaceRepository::new(pool.clone());
        let mut ws = Workspace::new(
            format!("{slug} workspace"),
            Slug::new(slug).unwrap(),
            platform::password::hash_password("pw-1234"),
        );
        ws.created_at = Utc::now() - Duration::days(age_days);
        repo.create(&ws).await.unwrap();
        ws
    }

    async fn seed_expert(pool: &SqlitePool, workspace_id: &Uuid, age_days: i64) -> Uuid {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO experts (id, workspace_id, name, status, created_at) \
             VALUES (?, ?, 'Dr. Old', 'none', ?)",
        )
        .bind(id)
        .bind(workspace_id)
        .bind(Utc::now() - Duration::days(age_days))
        .execute(pool)
        .await
        .unwrap();
        id
    }

    #[test]
    fn test_parse_years() {
        assert_eq!(RetentionSweeper::<SqliteWorkspaceRepository>::parse_years(None), 5);
        assert_eq!(
            RetentionSweeper::<SqliteWorkspaceRepository>::parse_years(Some("3")),
            3
        );
        assert_eq!(
            RetentionSweeper::<SqliteWorkspaceRepository>::parse_years(Some("0")),
            5
        );
        assert_eq!(
            RetentionSweeper::<SqliteWorkspaceRepository>::parse_years(Some("junk")),
            5
        );
    }

    #[tokio::test]
    async fn test_sweep_protects_default_workspace() {
        let pool = test_pool().await;
        let repo = Arc::new(SqliteWorkspaceRepository::new(pool.clone()));

        // Both workspaces are far past the cutoff
        let protected = seed_workspace(&pool, "default", 4000).await;
        let doomed = seed_workspace(&pool, "doomed", 4000).await;
        seed_expert(&pool, doomed.id.as_uuid(), 4000).await;

        let sweeper = RetentionSweeper::new(repo.clone(), 5);
        let summary = sweeper.run().await.unwrap();

        assert_eq!(summary.deleted_workspaces, 1);
        assert!(repo.find_by_id(&protected.id).await.unwrap().is_some());
        assert!(repo.find_by_id(&doomed.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sweep_purges_old_experts_in_young_workspaces() {
        let pool = test_pool().await;
        let repo = Arc::new(SqliteWorkspaceRepository::new(pool.clone()));

        let young = seed_workspace(&pool, "young", 10).await;
        let old_expert = seed_expert(&pool, young.id.as_uuid(), 4000).await;
        let fresh_expert = seed_expert(&pool, young.id.as_uuid(), 10).await;

        let sweeper = RetentionSweeper::new(repo.clone(), 5);
        let summary = sweeper.run().await.unwrap();

        assert_eq!(summary.deleted_experts, 1);
        assert_eq!(summary.deleted_workspaces, 0);

        let remaining: Vec<Uuid> = sqlx::query_scalar("SELECT id FROM experts")
            .fetch_all(&pool)
            .await
            .unwrap();
        assert_eq!(remaining, vec![fresh_expert]);
        assert_ne!(remaining[0], old_expert);
    }

    #[tokio::test]
    async fn test_sweep_on_empty_store() {
        let pool = test_pool().await;
        let repo = Arc::new(SqliteWorkspaceRepository::new(pool));

        let sweeper = RetentionSweeper::new(repo, 5);
        let summary = sweeper.run().await.unwrap();
        assert_eq!(summary.deleted_requests, 0);
        assert_eq!(summary.deleted_experts, 0);
        assert_eq!(summary.deleted_workspaces, 0);
    }
}
