//! Candidate Slot Use Cases
//!
//! Slot creation and deletion, rejected once the owning expert's candidate
//! set is frozen (confirmed / registered / unavailable).

use std::sync::Arc;

use kernel::id::{ExpertId, SlotId, WorkspaceId};

use crate::domain::entity::polling_slot::PollingSlot;
use crate::domain::repository::SchedulingStore;
use crate::error::{SchedulingError, SchedulingResult};

/// Slot use case
pub struct SlotUseCase<R>
where
    R: SchedulingStore,
{
    repo: Arc<R>,
}

impl<R> SlotUseCase<R>
where
    R: SchedulingStore,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Add a candidate slot while the expert is pre-confirmation
    pub async fn add_slot(
        &self,
        workspace_id: &WorkspaceId,
        expert_id: &ExpertId,
        date: &str,
        time: &str,
    ) -> SchedulingResult<PollingSlot> {
        let expert = self
            .repo
            .find(workspace_id, expert_id)
            .await?
            .ok_or(SchedulingError::ExpertNotFound)?;

        if expert.status.slots_frozen() {
            return Err(SchedulingError::invalid_transition(format!(
                "Candidate slots are frozen once confirmed (current: {})",
                expert.status
            )));
        }

        if date.trim().is_empty() || time.trim().is_empty() {
            return Err(SchedulingError::Validation(
                "Date and time are required".to_string(),
            ));
        }

        let slot = PollingSlot::new(*expert_id, date.trim(), time.trim());
        self.repo.insert_slot(&slot).await?;

        Ok(slot)
    }

    /// Delete a candidate slot and its responses
    pub async fn delete_slot(
        &self,
        workspace_id: &WorkspaceId,
        expert_id: &ExpertId,
        slot_id: &SlotId,
    ) -> SchedulingResult<()> {
        let expert = self
            .repo
            .find(workspace_id, expert_id)
            .await?
            .ok_or(SchedulingError::ExpertNotFound)?;

        if expert.status.slots_frozen() {
            return Err(SchedulingError::invalid_transition(format!(
                "Candidate slots are frozen once confirmed (current: {})",
                expert.status
            )));
        }

        let slot = self
            .repo
            .find_slot(slot_id)
            .await?
            .ok_or(SchedulingError::SlotNotFound)?;
        if slot.expert_id != *expert_id {
            return Err(SchedulingError::SlotNotFound);
        }

        self.repo.delete_slot(slot_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::expert::Expert;
    use crate::domain::repository::{ExpertRepository, SlotRepository};
    use crate::infra::sqlite::SqliteSchedulingRepository;
    use chrono::Utc;
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

    async fn seed(pool: &SqlitePool) -> (WorkspaceId, Expert, SqliteSchedulingRepository) {
        let ws = WorkspaceId::new();
        sqlx::query(
            "INSERT INTO workspaces (id, name, slug, password, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(ws.as_uuid())
        .bind("Acme")
        .bind(format!("acme-{ws}"))
        .bind("pw")
        .bind(Utc::now())
        .execute(pool)
        .await
        .unwrap();

        let repo = SqliteSchedulingRepository::new(pool.clone());
        let expert = Expert::new(ws, "Dr. Kim");
        repo.create(&expert).await.unwrap();
        (ws, expert, repo)
    }

    #[tokio::test]
    async fn test_add_and_delete_while_open() {
        let pool = test_pool().await;
        let (ws, expert, repo) = seed(&pool).await;
        let uc = SlotUseCase::new(Arc::new(repo.clone()));

        let slot = uc
            .add_slot(&ws, &expert.id, "2026-09-01", "10:00-11:00")
            .await
            .unwrap();
        assert_eq!(repo.count_slots(&expert.id).await.unwrap(), 1);

        uc.delete_slot(&ws, &expert.id, &slot.id).await.unwrap();
        assert_eq!(repo.count_slots(&expert.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_frozen_set_rejects_mutation() {
        let pool = test_pool().await;
        let (ws, mut expert, repo) = seed(&pool).await;
        let uc = SlotUseCase::new(Arc::new(repo.clone()));

        let slot = uc
            .add_slot(&ws, &expert.id, "2026-09-01", "10:00-11:00")
            .await
            .unwrap();

        expert.start_polling(1).unwrap();
        expert.confirm(vec![slot.snapshot()]).unwrap();
        repo.save_state(&expert).await.unwrap();

        let err = uc
            .add_slot(&ws, &expert.id, "2026-09-02", "10:00-11:00")
            .await
            .unwrap_err();
        assert!(matches!(err, SchedulingError::InvalidTransition(_)));
        assert_eq!(err.status_code(), 400);

        let err = uc.delete_slot(&ws, &expert.id, &slot.id).await.unwrap_err();
        assert!(matches!(err, SchedulingError::InvalidTransition(_)));
    }

    #[tokio::test]
    async fn test_delete_foreign_slot_is_404() {
        let pool = test_pool().await;
        let (ws, expert, repo) = seed(&pool).await;

        let other = Expert::new(ws, "Dr. Lee");
        repo.create(&other).await.unwrap();
        let foreign = PollingSlot::new(other.id, "2026-09-01", "10:00-11:00");
        repo.insert_slot(&foreign).await.unwrap();

        let uc = SlotUseCase::new(Arc::new(repo));
        let err = uc.delete_slot(&ws, &expert.id, &foreign.id).await.unwrap_err();
        assert!(matches!(err, SchedulingError::SlotNotFound));
    }

    #[tokio::test]
    async fn test_blank_date_rejected() {
        let pool = test_pool().await;
        let (ws, expert, repo) = seed(&pool).await;
        let uc = SlotUseCase::new(Arc::new(repo));

        let err = uc.add_slot(&ws, &expert.id, " ", "10:00").await.unwrap_err();
        assert!(matches!(err, SchedulingError::Validation(_)));
    }
}
