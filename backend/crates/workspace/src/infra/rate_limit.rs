//! SQLite Rate Limit Store
//!
//! Sliding-window failure counters persisted in `auth_rate_limits`.
//! Records are transient and self-expiring; a periodic purge keeps the
//! table from accumulating dead rows.

use chrono::Utc;
use platform::rate_limit::{
    AuthRateLimitConfig, AuthRateLimitStore, FailureOutcome, RateLimitDecision, RateLimitError,
};
use sqlx::SqlitePool;
use std::time::Duration;

/// SQLite-backed implementation of [`AuthRateLimitStore`]
#[derive(Clone)]
pub struct SqliteRateLimitStore {
    pool: SqlitePool,
}

#[derive(Debug, sqlx::FromRow)]
struct RateLimitRow {
    attempt_count: i64,
    window_started_at: i64,
    blocked_until: i64,
}

impl SqliteRateLimitStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn find(&self, key: &str) -> Result<Option<RateLimitRow>, sqlx::Error> {
        sqlx::query_as::<_, RateLimitRow>(
            "SELECT attempt_count, window_started_at, blocked_until \
             FROM auth_rate_limits WHERE key = ?",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
    }

    /// Remove rows whose window aged out and whose block has lapsed.
    /// Called at startup; failures are non-fatal for the caller.
    pub async fn purge_stale(&self, older_than: Duration) -> Result<u64, sqlx::Error> {
        let now_ms = Utc::now().timestamp_millis();
        let horizon = now_ms - older_than.as_millis() as i64;

        let deleted =
            sqlx::query("DELETE FROM auth_rate_limits WHERE window_started_at < ? AND blocked_until < ?")
                .bind(horizon)
                .bind(now_ms)
                .execute(&self.pool)
                .await?
                .rows_affected();

        Ok(deleted)
    }
}

impl AuthRateLimitStore for SqliteRateLimitStore {
    async fn check(
        &self,
        key: &str,
        config: &AuthRateLimitConfig,
    ) -> Result<RateLimitDecision, RateLimitError> {
        let now_ms = Utc::now().timestamp_millis();

        let Some(row) = self.find(key).await? else {
            return Ok(RateLimitDecision::Allowed);
        };

        if row.blocked_until > now_ms {
            return Ok(RateLimitDecision::Blocked {
                retry_after: Duration::from_millis((row.blocked_until - now_ms) as u64),
            });
        }

        // Window aged out without reaching the cap: reset the counter
        if now_ms - row.window_started_at > config.window_ms() {
            sqlx::query("DELETE FROM auth_rate_limits WHERE key = ?")
                .bind(key)
                .execute(&self.pool)
                .await?;
        }

        Ok(RateLimitDecision::Allowed)
    }

    async fn register_failure(
        &self,
        key: &str,
        config: &AuthRateLimitConfig,
    ) -> Result<FailureOutcome, RateLimitError> {
        let now_ms = Utc::now().timestamp_millis();

        // First failure, or first failure of a fresh window
        let row = match self.find(key).await? {
            Some(row) if now_ms - row.window_started_at <= config.window_ms() => row,
            _ => {
                sqlx::query(
                    "INSERT OR REPLACE INTO auth_rate_limits \
                     (key, attempt_count, window_started_at, blocked_until) VALUES (?, 1, ?, 0)",
                )
                .bind(key)
                .bind(now_ms)
                .execute(&self.pool)
                .await?;

                return Ok(FailureOutcome {
                    blocked_now: false,
                    retry_after: Duration::ZERO,
                });
            }
        };

        let attempt_count = row.attempt_count + 1;
        let blocked_until = if attempt_count >= config.max_attempts as i64 {
            now_ms + config.block_ms()
        } else {
            0
        };

        sqlx::query("UPDATE auth_rate_limits SET attempt_count = ?, blocked_until = ? WHERE key = ?")
            .bind(attempt_count)
            .bind(blocked_until)
            .bind(key)
            .execute(&self.pool)
            .await?;

        let blocked_now = blocked_until > now_ms;
        Ok(FailureOutcome {
            blocked_now,
            retry_after: if blocked_now {
                config.block
            } else {
                Duration::ZERO
            },
        })
    }

    async fn clear(&self, key: &str) -> Result<(), RateLimitError> {
        sqlx::query("DELETE FROM auth_rate_limits WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn store() -> SqliteRateLimitStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("../../../database/migrations")
            .run(&pool)
            .await
            .unwrap();
        SqliteRateLimitStore::new(pool)
    }

    fn config() -> AuthRateLimitConfig {
        AuthRateLimitConfig::new(3, 600, 900)
    }

    #[tokio::test]
    async fn test_unknown_key_is_allowed() {
        let store = store().await;
        let decision = store.check("workspace:acme:1.2.3.4", &config()).await.unwrap();
        assert_eq!(decision, RateLimitDecision::Allowed);
    }

    #[tokio::test]
    async fn test_saturation_blocks_and_clear_unblocks() {
        let store = store().await;
        let config = config();
        let key = "workspace:acme:1.2.3.4";

        // Below the cap: still allowed
        for _ in 0..2 {
            let outcome = store.register_failure(key, &config).await.unwrap();
            assert!(!outcome.blocked_now);
            assert!(store.check(key, &config).await.unwrap().is_allowed());
        }

        // Third failure reaches max_attempts and trips the block
        let outcome = store.register_failure(key, &config).await.unwrap();
        assert!(outcome.blocked_now);
        assert!(outcome.retry_after > Duration::ZERO);

        let decision = store.check(key, &config).await.unwrap();
        assert!(matches!(decision, RateLimitDecision::Blocked { .. }));
        assert!(decision.retry_after_secs() >= 1);

        // Successful auth clears the record immediately
        store.clear(key).await.unwrap();
        assert!(store.check(key, &config).await.unwrap().is_allowed());
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let store = store().await;
        let config = config();

        for _ in 0..3 {
            store
                .register_failure("workspace:acme:1.2.3.4", &config)
                .await
                .unwrap();
        }

        // Same workspace, different client IP: unaffected
        assert!(
            store
                .check("workspace:acme:5.6.7.8", &config)
                .await
                .unwrap()
                .is_allowed()
        );
    }

    #[tokio::test]
    async fn test_stale_window_resets() {
        let store = store().await;
        // Window of zero seconds: every check sees a stale window
        let config = AuthRateLimitConfig::new(3, 0, 900);
        let key = "voter:ex-1:alice:1.2.3.4";

        store.register_failure(key, &config).await.unwrap();
        assert!(store.check(key, &config).await.unwrap().is_allowed());

        // The stale row was deleted; the next failure starts a fresh window
        let outcome = store.register_failure(key, &config).await.unwrap();
        assert!(!outcome.blocked_now);
    }

    #[tokio::test]
    async fn test_purge_stale() {
        let store = store().await;
        let config = AuthRateLimitConfig::new(5, 600, 900);

        // One ancient row, one current row
        sqlx::query(
            "INSERT INTO auth_rate_limits (key, attempt_count, window_started_at, blocked_until) \
             VALUES ('old-key', 1, 0, 0)",
        )
        .execute(&store.pool)
        .await
        .unwrap();
        store.register_failure("fresh-key", &config).await.unwrap();

        let purged = store.purge_stale(Duration::from_secs(3600)).await.unwrap();
        assert_eq!(purged, 1);

        // The fresh row survived
        assert!(store.find("fresh-key").await.unwrap().is_some());
        assert!(store.find("old-key").await.unwrap().is_none());
    }
}
