//! Workspace Login Use Case
//!
//! Authenticates a workspace and issues its bearer token. The rate limiter
//! is consulted before any credential work: a blocked key is rejected with
//! a retry-after without touching the password service at all.

use std::sync::Arc;

use platform::client::RequestMeta;
use platform::rate_limit::{self, AuthRateLimitStore, RateLimitDecision};
use platform::token::TokenClaims;

use crate::application::config::WorkspaceConfig;
use crate::domain::entity::audit_log::{ActorType, AuditEntry};
use crate::domain::entity::workspace::Workspace;
use crate::domain::repository::WorkspaceRepository;
use crate::error::{WorkspaceError, WorkspaceResult};
use crate::infra::audit::AuditLogger;

/// Login output
#[derive(Debug)]
pub struct LoginOutput {
    /// Bearer token for the `x-workspace-token` header
    pub token: String,
}

/// Workspace login use case
pub struct LoginUseCase<R, L>
where
    R: WorkspaceRepository,
    L: AuthRateLimitStore,
{
    repo: Arc<R>,
    limiter: Arc<L>,
    config: Arc<WorkspaceConfig>,
    audit: AuditLogger,
}

impl<R, L> LoginUseCase<R, L>
where
    R: WorkspaceRepository,
    L: AuthRateLimitStore,
{
    pub fn new(
        repo: Arc<R>,
        limiter: Arc<L>,
        config: Arc<WorkspaceConfig>,
        audit: AuditLogger,
    ) -> Self {
        Self {
            repo,
            limiter,
            config,
            audit,
        }
    }

    pub async fn execute(
        &self,
        workspace: &Workspace,
        password: &str,
        meta: &RequestMeta,
    ) -> WorkspaceResult<LoginOutput> {
        let key = rate_limit::workspace_login_key(workspace.slug.as_str(), &meta.ip_string());

        let decision = self
            .limiter
            .check(&key, &self.config.login_rate_limit)
            .await?;
        if let RateLimitDecision::Blocked { .. } = decision {
            return Err(WorkspaceError::RateLimited {
                retry_after_secs: decision.retry_after_secs(),
            });
        }

        if !platform::password::verify_password(password, &workspace.password) {
            let outcome = self
                .limiter
                .register_failure(&key, &self.config.login_rate_limit)
                .await?;

            self.audit.record(
                AuditEntry::new(ActorType::Anonymous, "unknown", "workspace_login")
                    .with_workspace(*workspace.id.as_uuid())
                    .failure(401, "invalid_password")
                    .with_request(meta),
            );

            if outcome.blocked_now {
                return Err(WorkspaceError::RateLimited {
                    retry_after_secs: outcome.retry_after.as_secs().max(1),
                });
            }
            return Err(WorkspaceError::InvalidCredentials);
        }

        self.limiter.clear(&key).await?;

        // Migrate-on-login: rewrite legacy plaintext rows with the hashed form
        if !platform::password::is_hashed(&workspace.password) {
            let stored = platform::password::hash_password(password);
            self.repo.update_password(&workspace.id, &stored).await?;
            tracing::info!(workspace = %workspace.slug, "Migrated legacy credential to hashed form");
        }

        self.audit.record(
            AuditEntry::new(
                ActorType::Workspace,
                workspace.id.to_string(),
                "workspace_login",
            )
            .with_workspace(*workspace.id.as_uuid())
            .with_request(meta),
        );

        let claims = TokenClaims::workspace(workspace.id.to_string(), workspace.slug.as_str());
        let token = self
            .config
            .token_service
            .issue(claims, self.config.workspace_token_ttl);

        Ok(LoginOutput { token })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::slug::Slug;
    use crate::infra::rate_limit::SqliteRateLimitStore;
    use crate::infra::sqlite::SqliteWorkspaceRepository;
    use platform::token::Principal;
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

    fn use_case(
        pool: &SqlitePool,
    ) -> LoginUseCase<SqliteWorkspaceRepository, SqliteRateLimitStore> {
        let mut config = WorkspaceConfig::development();
        config.login_rate_limit = platform::rate_limit::AuthRateLimitConfig::new(3, 600, 900);
        LoginUseCase::new(
            Arc::new(SqliteWorkspaceRepository::new(pool.clone())),
            Arc::new(SqliteRateLimitStore::new(pool.clone())),
            Arc::new(config),
            AuditLogger::new(pool.clone()),
        )
    }

    async fn seed_workspace(pool: &SqlitePool, stored_password: &str) -> Workspace {
        let repo = SqliteWorkspaceRepository::new(pool.clone());
        let ws = Workspace::new(
            "Acme",
            Slug::new("acme").unwrap(),
            stored_password.to_string(),
        );
        repo.create(&ws).await.unwrap();
        ws
    }

    fn meta() -> RequestMeta {
        RequestMeta {
            ip: Some("10.0.0.1".parse().unwrap()),
            user_agent: Some("test".into()),
            origin: None,
        }
    }

    #[tokio::test]
    async fn test_login_success_issues_workspace_token() {
        let pool = test_pool().await;
        let stored = platform::password::hash_password("open-sesame");
        let ws = seed_workspace(&pool, &stored).await;
        let uc = use_case(&pool);

        let output = uc.execute(&ws, "open-sesame", &meta()).await.unwrap();
        let claims = uc.config.token_service.verify(&output.token).unwrap();
        assert_eq!(claims.principal, Principal::Workspace);
        assert_eq!(claims.slug.as_deref(), Some("acme"));
        assert_eq!(claims.workspace_id, Some(ws.id.to_string()));
    }

    #[tokio::test]
    async fn test_login_wrong_password_is_generic_401() {
        let pool = test_pool().await;
        let stored = platform::password::hash_password("open-sesame");
        let ws = seed_workspace(&pool, &stored).await;
        let uc = use_case(&pool);

        let err = uc.execute(&ws, "wrong", &meta()).await.unwrap_err();
        assert!(matches!(err, WorkspaceError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_login_migrates_legacy_plaintext() {
        let pool = test_pool().await;
        let ws = seed_workspace(&pool, "plain-old-password").await;
        let uc = use_case(&pool);

        uc.execute(&ws, "plain-old-password", &meta()).await.unwrap();

        let repo = SqliteWorkspaceRepository::new(pool.clone());
        let migrated = repo.find_by_id(&ws.id).await.unwrap().unwrap();
        assert!(platform::password::is_hashed(&migrated.password));
        assert!(platform::password::verify_password(
            "plain-old-password",
            &migrated.password
        ));

        // Second login against the migrated form still works
        let migrated_ws = migrated;
        uc.execute(&migrated_ws, "plain-old-password", &meta())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_login_saturation_blocks_then_clear_on_success() {
        let pool = test_pool().await;
        let stored = platform::password::hash_password("open-sesame");
        let ws = seed_workspace(&pool, &stored).await;
        let uc = use_case(&pool);

        for _ in 0..2 {
            let err = uc.execute(&ws, "wrong", &meta()).await.unwrap_err();
            assert!(matches!(err, WorkspaceError::InvalidCredentials));
        }

        // Third failure trips the block
        let err = uc.execute(&ws, "wrong", &meta()).await.unwrap_err();
        assert!(matches!(err, WorkspaceError::RateLimited { .. }));

        // Blocked: even the correct password is rejected before verification
        let err = uc.execute(&ws, "open-sesame", &meta()).await.unwrap_err();
        match err {
            WorkspaceError::RateLimited { retry_after_secs } => assert!(retry_after_secs >= 1),
            other => panic!("expected RateLimited, got {other:?}"),
        }

        // A different client IP is unaffected and resets its own history
        let other_meta = RequestMeta {
            ip: Some("10.9.9.9".parse().unwrap()),
            ..meta()
        };
        uc.execute(&ws, "open-sesame", &other_meta).await.unwrap();
    }
}
