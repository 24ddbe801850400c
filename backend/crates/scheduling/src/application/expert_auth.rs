//! Expert Authentication Use Case
//!
//! Issues expert-scoped tokens for the expert-side transitions
//! (select-slot, no-available-schedule). Rate-limited per expert + client
//! IP; experts without a credential get the same generic rejection as a
//! wrong password.

use std::sync::Arc;

use kernel::id::ExpertId;
use platform::client::RequestMeta;
use platform::rate_limit::{self, AuthRateLimitStore, RateLimitDecision};
use platform::token::TokenClaims;
use workspace::domain::entity::audit_log::{ActorType, AuditEntry};
use workspace::domain::entity::workspace::Workspace;
use workspace::infra::audit::AuditLogger;

use crate::application::config::SchedulingConfig;
use crate::domain::repository::SchedulingStore;
use crate::error::{SchedulingError, SchedulingResult};

/// Expert authentication use case
pub struct ExpertAuthUseCase<R, L>
where
    R: SchedulingStore,
    L: AuthRateLimitStore,
{
    repo: Arc<R>,
    limiter: Arc<L>,
    config: Arc<SchedulingConfig>,
    audit: AuditLogger,
}

impl<R, L> ExpertAuthUseCase<R, L>
where
    R: SchedulingStore,
    L: AuthRateLimitStore,
{
    pub fn new(
        repo: Arc<R>,
        limiter: Arc<L>,
        config: Arc<SchedulingConfig>,
        audit: AuditLogger,
    ) -> Self {
        Self {
            repo,
            limiter,
            config,
            audit,
        }
    }

    /// Verify the expert's credential and issue an expert token
    pub async fn authenticate(
        &self,
        workspace: &Workspace,
        expert_id: &ExpertId,
        password: &str,
        meta: &RequestMeta,
    ) -> SchedulingResult<String> {
        let expert = self
            .repo
            .find(&workspace.id, expert_id)
            .await?
            .ok_or(SchedulingError::ExpertNotFound)?;

        let key = rate_limit::expert_login_key(&expert_id.to_string(), &meta.ip_string());

        let decision = self
            .limiter
            .check(&key, &self.config.expert_rate_limit)
            .await?;
        if let RateLimitDecision::Blocked { .. } = decision {
            return Err(SchedulingError::RateLimited {
                retry_after_secs: decision.retry_after_secs(),
            });
        }

        // No credential set counts as a failed attempt, same as a wrong
        // password, so the responses stay indistinguishable
        let verified = expert
            .password
            .as_deref()
            .is_some_and(|stored| platform::password::verify_password(password, stored));

        if !verified {
            let outcome = self
                .limiter
                .register_failure(&key, &self.config.expert_rate_limit)
                .await?;

            self.audit.record(
                AuditEntry::new(ActorType::Anonymous, "unknown", "expert_login")
                    .with_workspace(*workspace.id.as_uuid())
                    .with_target("expert", expert.id.to_string())
                    .failure(401, "invalid_password")
                    .with_request(meta),
            );

            if outcome.blocked_now {
                return Err(SchedulingError::RateLimited {
                    retry_after_secs: outcome.retry_after.as_secs().max(1),
                });
            }
            return Err(SchedulingError::InvalidCredentials);
        }

        self.limiter.clear(&key).await?;

        // Migrate-on-login for legacy plaintext expert credentials
        if let Some(stored) = expert.password.as_deref() {
            if !platform::password::is_hashed(stored) {
                let migrated = platform::password::hash_password(password);
                self.repo.update_credential(expert_id, &migrated).await?;
            }
        }

        self.audit.record(
            AuditEntry::new(ActorType::Expert, expert.id.to_string(), "expert_login")
                .with_workspace(*workspace.id.as_uuid())
                .with_target("expert", expert.id.to_string())
                .with_request(meta),
        );

        let claims = TokenClaims::expert(
            expert.id.to_string(),
            workspace.id.to_string(),
            workspace.slug.as_str(),
        );

        Ok(self
            .config
            .token_service
            .issue(claims, self.config.expert_token_ttl))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::expert::Expert;
    use crate::domain::repository::ExpertRepository;
    use crate::infra::sqlite::SqliteSchedulingRepository;
    use chrono::Utc;
    use platform::token::Principal;
    use sqlx::SqlitePool;
    use sqlx::sqlite::SqlitePoolOptions;
    use workspace::domain::value_object::slug::Slug;
    use workspace::infra::rate_limit::SqliteRateLimitStore;

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

    async fn seed(
        pool: &SqlitePool,
        expert_password: Option<&str>,
    ) -> (Workspace, Expert, SqliteSchedulingRepository) {
        let workspace = Workspace::new("Acme", Slug::new("acme").unwrap(), "pw".to_string());
        sqlx::query(
            "INSERT INTO workspaces (id, name, slug, password, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(workspace.id.as_uuid())
        .bind(&workspace.name)
        .bind(workspace.slug.as_str())
        .bind(&workspace.password)
        .bind(Utc::now())
        .execute(pool)
        .await
        .unwrap();

        let repo = SqliteSchedulingRepository::new(pool.clone());
        let mut expert = Expert::new(workspace.id, "Dr. Kim");
        expert.password = expert_password.map(str::to_string);
        repo.create(&expert).await.unwrap();
        (workspace, expert, repo)
    }

    fn use_case(
        pool: &SqlitePool,
    ) -> ExpertAuthUseCase<SqliteSchedulingRepository, SqliteRateLimitStore> {
        let mut config = SchedulingConfig::development();
        config.expert_rate_limit = platform::rate_limit::AuthRateLimitConfig::new(3, 600, 600);
        ExpertAuthUseCase::new(
            Arc::new(SqliteSchedulingRepository::new(pool.clone())),
            Arc::new(SqliteRateLimitStore::new(pool.clone())),
            Arc::new(config),
            AuditLogger::new(pool.clone()),
        )
    }

    fn meta() -> RequestMeta {
        RequestMeta {
            ip: Some("10.0.0.1".parse().unwrap()),
            user_agent: None,
            origin: None,
        }
    }

    #[tokio::test]
    async fn test_authenticate_issues_expert_token() {
        let pool = test_pool().await;
        let stored = platform::password::hash_password("expert-pass");
        let (workspace, expert, _repo) = seed(&pool, Some(&stored)).await;
        let uc = use_case(&pool);

        let token = uc
            .authenticate(&workspace, &expert.id, "expert-pass", &meta())
            .await
            .unwrap();

        let claims = uc.config.token_service.verify(&token).unwrap();
        assert_eq!(claims.principal, Principal::Expert);
        assert_eq!(claims.expert_id, Some(expert.id.to_string()));
        assert_eq!(claims.workspace_id, Some(workspace.id.to_string()));
        assert_eq!(claims.slug.as_deref(), Some("acme"));
    }

    #[tokio::test]
    async fn test_no_credential_is_generic_401() {
        let pool = test_pool().await;
        let (workspace, expert, _repo) = seed(&pool, None).await;
        let uc = use_case(&pool);

        let err = uc
            .authenticate(&workspace, &expert.id, "anything", &meta())
            .await
            .unwrap_err();
        assert!(matches!(err, SchedulingError::InvalidCredentials));
        assert_eq!(err.to_string(), "Invalid credentials");
    }

    #[tokio::test]
    async fn test_migrates_legacy_plaintext_credential() {
        let pool = test_pool().await;
        let (workspace, expert, repo) = seed(&pool, Some("legacy-plain")).await;
        let uc = use_case(&pool);

        uc.authenticate(&workspace, &expert.id, "legacy-plain", &meta())
            .await
            .unwrap();

        let loaded = repo.find(&workspace.id, &expert.id).await.unwrap().unwrap();
        let stored = loaded.password.unwrap();
        assert!(platform::password::is_hashed(&stored));
        assert!(platform::password::verify_password("legacy-plain", &stored));
    }

    #[tokio::test]
    async fn test_saturation_blocks_expert_auth() {
        let pool = test_pool().await;
        let stored = platform::password::hash_password("expert-pass");
        let (workspace, expert, _repo) = seed(&pool, Some(&stored)).await;
        let uc = use_case(&pool);

        for _ in 0..2 {
            let err = uc
                .authenticate(&workspace, &expert.id, "wrong", &meta())
                .await
                .unwrap_err();
            assert!(matches!(err, SchedulingError::InvalidCredentials));
        }

        let err = uc
            .authenticate(&workspace, &expert.id, "wrong", &meta())
            .await
            .unwrap_err();
        assert!(matches!(err, SchedulingError::RateLimited { .. }));

        let err = uc
            .authenticate(&workspace, &expert.id, "expert-pass", &meta())
            .await
            .unwrap_err();
        assert!(matches!(err, SchedulingError::RateLimited { .. }));
    }

    #[tokio::test]
    async fn test_unknown_expert_is_404() {
        let pool = test_pool().await;
        let stored = platform::password::hash_password("expert-pass");
        let (workspace, _expert, _repo) = seed(&pool, Some(&stored)).await;
        let uc = use_case(&pool);

        let err = uc
            .authenticate(&workspace, &ExpertId::new(), "expert-pass", &meta())
            .await
            .unwrap_err();
        assert!(matches!(err, SchedulingError::ExpertNotFound));
    }
}
