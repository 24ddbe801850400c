//! Audit Logger
//!
//! Best-effort, non-blocking writer for the append-only audit log.
//! [`AuditLogger::record`] hands the insert to a background task; a failed
//! write surfaces only in our own logs and never in the caller's result.

use sqlx::SqlitePool;

use crate::domain::entity::audit_log::AuditEntry;
use crate::error::WorkspaceResult;

/// Cloneable handle used by every privileged handler
#[derive(Clone)]
pub struct AuditLogger {
    pool: SqlitePool,
}

impl AuditLogger {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Fire-and-forget append. Never blocks or fails the caller.
    pub fn record(&self, entry: AuditEntry) {
        let logger = self.clone();
        tokio::spawn(async move {
            if let Err(e) = logger.append(&entry).await {
                tracing::warn!(error = %e, action = %entry.action, "Audit log write failed");
            }
        });
    }

    /// Synchronous append, for call sites (and tests) that want the result
    pub async fn append(&self, entry: &AuditEntry) -> WorkspaceResult<()> {
        sqlx::query(
            r#"
            INSERT INTO admin_audit_logs (
                id, created_at, actor_type, actor_id, workspace_id, action,
                target_type, target_id, result, status_code, reason,
                ip, user_agent, origin, metadata
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(entry.id)
        .bind(entry.created_at)
        .bind(entry.actor_type.as_str())
        .bind(&entry.actor_id)
        .bind(entry.workspace_id)
        .bind(&entry.action)
        .bind(&entry.target_type)
        .bind(&entry.target_id)
        .bind(entry.result.as_str())
        .bind(entry.status_code.map(i64::from))
        .bind(&entry.reason)
        .bind(entry.request.ip.map(|ip| ip.to_string()))
        .bind(&entry.request.user_agent)
        .bind(&entry.request.origin)
        .bind(
            entry
                .metadata
                .as_ref()
                .map(|m| m.to_string()),
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::audit_log::{ActorType, AuditResult};
    use sqlx::sqlite::SqlitePoolOptions;

    async fn pool() -> SqlitePool {
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

    #[tokio::test]
    async fn test_append() {
        let pool = pool().await;
        let logger = AuditLogger::new(pool.clone());

        let entry = AuditEntry::new(ActorType::Master, "master", "workspace_create")
            .with_target("workspace", "ws-1")
            .with_metadata(serde_json::json!({ "slug": "acme" }));
        logger.append(&entry).await.unwrap();

        let (action, result, metadata): (String, String, Option<String>) = sqlx::query_as(
            "SELECT action, result, metadata FROM admin_audit_logs WHERE id = ?",
        )
        .bind(entry.id)
        .fetch_one(&pool)
        .await
        .unwrap();

        assert_eq!(action, "workspace_create");
        assert_eq!(result, AuditResult::Success.as_str());
        assert!(metadata.unwrap().contains("acme"));
    }

    #[tokio::test]
    async fn test_failure_entry_fields() {
        let pool = pool().await;
        let logger = AuditLogger::new(pool.clone());

        let entry = AuditEntry::new(ActorType::Anonymous, "unknown", "master_auth")
            .failure(401, "invalid_password");
        logger.append(&entry).await.unwrap();

        let (result, status_code, reason): (String, Option<i64>, Option<String>) = sqlx::query_as(
            "SELECT result, status_code, reason FROM admin_audit_logs WHERE id = ?",
        )
        .bind(entry.id)
        .fetch_one(&pool)
        .await
        .unwrap();

        assert_eq!(result, "failure");
        assert_eq!(status_code, Some(401));
        assert_eq!(reason.as_deref(), Some("invalid_password"));
    }
}
