//! SQLite Repository Implementations

use chrono::{DateTime, Utc};
use kernel::id::{ExpertId, Id, SlotId, WorkspaceId};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::domain::entity::expert::{Expert, SlotSnapshot};
use crate::domain::entity::polling_slot::PollingSlot;
use crate::domain::repository::{
    ExpertRepository, SlotRepository, VoteRepository, VoterPasswordRepository,
};
use crate::domain::status::ExpertStatus;
use crate::error::{SchedulingError, SchedulingResult};

/// SQLite-backed scheduling repository
#[derive(Clone)]
pub struct SqliteSchedulingRepository {
    pool: SqlitePool,
}

impl SqliteSchedulingRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

// ============================================================================
// Row types
// ============================================================================

#[derive(Debug, sqlx::FromRow)]
struct ExpertRow {
    id: Uuid,
    workspace_id: Uuid,
    name: String,
    organization: Option<String>,
    position: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    fee: Option<String>,
    status: String,
    password: Option<String>,
    selected_slot: Option<String>,
    confirmed_slots: Option<String>,
    created_at: DateTime<Utc>,
}

impl ExpertRow {
    fn into_expert(self) -> SchedulingResult<Expert> {
        let status = ExpertStatus::parse(&self.status).ok_or_else(|| {
            SchedulingError::Internal(format!("Unknown expert status: {}", self.status))
        })?;

        let selected_slot: Option<SlotSnapshot> = self
            .selected_slot
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(|e| SchedulingError::Internal(format!("Corrupt selected_slot: {e}")))?;

        let confirmed_slots: Vec<SlotSnapshot> = self
            .confirmed_slots
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(|e| SchedulingError::Internal(format!("Corrupt confirmed_slots: {e}")))?
            .unwrap_or_default();

        Ok(Expert {
            id: Id::from_uuid(self.id),
            workspace_id: Id::from_uuid(self.workspace_id),
            name: self.name,
            organization: self.organization,
            position: self.position,
            email: self.email,
            phone: self.phone,
            fee: self.fee,
            status,
            password: self.password,
            selected_slot,
            confirmed_slots,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SlotRow {
    id: Uuid,
    expert_id: Uuid,
    date: String,
    time: String,
}

impl SlotRow {
    fn into_slot(self) -> PollingSlot {
        PollingSlot {
            id: Id::from_uuid(self.id),
            expert_id: Id::from_uuid(self.expert_id),
            date: self.date,
            time: self.time,
        }
    }
}

const EXPERT_COLUMNS: &str = "id, workspace_id, name, organization, position, email, phone, \
                              fee, status, password, selected_slot, confirmed_slots, created_at";

fn snapshot_json(snapshot: &[SlotSnapshot]) -> SchedulingResult<Option<String>> {
    if snapshot.is_empty() {
        return Ok(None);
    }
    serde_json::to_string(snapshot)
        .map(Some)
        .map_err(|e| SchedulingError::Internal(format!("Snapshot serialization failed: {e}")))
}

fn selected_json(selected: &Option<SlotSnapshot>) -> SchedulingResult<Option<String>> {
    selected
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| SchedulingError::Internal(format!("Snapshot serialization failed: {e}")))
}

// ============================================================================
// Expert Repository Implementation
// ============================================================================

impl ExpertRepository for SqliteSchedulingRepository {
    async fn create(&self, expert: &Expert) -> SchedulingResult<()> {
        sqlx::query(
            r#"
            INSERT INTO experts (
                id, workspace_id, name, organization, position, email, phone,
                fee, status, password, selected_slot, confirmed_slots, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(expert.id.as_uuid())
        .bind(expert.workspace_id.as_uuid())
        .bind(&expert.name)
        .bind(&expert.organization)
        .bind(&expert.position)
        .bind(&expert.email)
        .bind(&expert.phone)
        .bind(&expert.fee)
        .bind(expert.status.as_str())
        .bind(&expert.password)
        .bind(selected_json(&expert.selected_slot)?)
        .bind(snapshot_json(&expert.confirmed_slots)?)
        .bind(expert.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find(
        &self,
        workspace_id: &WorkspaceId,
        id: &ExpertId,
    ) -> SchedulingResult<Option<Expert>> {
        let row = sqlx::query_as::<_, ExpertRow>(&format!(
            "SELECT {EXPERT_COLUMNS} FROM experts WHERE id = ? AND workspace_id = ?"
        ))
        .bind(id.as_uuid())
        .bind(workspace_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(ExpertRow::into_expert).transpose()
    }

    async fn list(&self, workspace_id: &WorkspaceId) -> SchedulingResult<Vec<Expert>> {
        let rows = sqlx::query_as::<_, ExpertRow>(&format!(
            "SELECT {EXPERT_COLUMNS} FROM experts WHERE workspace_id = ? ORDER BY created_at"
        ))
        .bind(workspace_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ExpertRow::into_expert).collect()
    }

    async fn update_profile(&self, expert: &Expert) -> SchedulingResult<()> {
        sqlx::query(
            r#"
            UPDATE experts SET
                name = ?,
                organization = ?,
                position = ?,
                email = ?,
                phone = ?,
                fee = ?,
                password = ?
            WHERE id = ?
            "#,
        )
        .bind(&expert.name)
        .bind(&expert.organization)
        .bind(&expert.position)
        .bind(&expert.email)
        .bind(&expert.phone)
        .bind(&expert.fee)
        .bind(&expert.password)
        .bind(expert.id.as_uuid())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn save_state(&self, expert: &Expert) -> SchedulingResult<()> {
        sqlx::query(
            "UPDATE experts SET status = ?, selected_slot = ?, confirmed_slots = ? WHERE id = ?",
        )
        .bind(expert.status.as_str())
        .bind(selected_json(&expert.selected_slot)?)
        .bind(snapshot_json(&expert.confirmed_slots)?)
        .bind(expert.id.as_uuid())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_credential(&self, id: &ExpertId, stored: &str) -> SchedulingResult<()> {
        sqlx::query("UPDATE experts SET password = ? WHERE id = ?")
            .bind(stored)
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete_cascade(&self, id: &ExpertId) -> SchedulingResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM voter_responses WHERE expert_id = ?")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM voter_passwords WHERE expert_id = ?")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM polling_slots WHERE expert_id = ?")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM experts WHERE id = ?")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }
}

// ============================================================================
// Slot Repository Implementation
// ============================================================================

impl SlotRepository for SqliteSchedulingRepository {
    async fn insert_slot(&self, slot: &PollingSlot) -> SchedulingResult<()> {
        sqlx::query("INSERT INTO polling_slots (id, expert_id, date, time) VALUES (?, ?, ?, ?)")
            .bind(slot.id.as_uuid())
            .bind(slot.expert_id.as_uuid())
            .bind(&slot.date)
            .bind(&slot.time)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete_slot(&self, id: &SlotId) -> SchedulingResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM voter_responses WHERE slot_id = ?")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM polling_slots WHERE id = ?")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }

    async fn find_slot(&self, id: &SlotId) -> SchedulingResult<Option<PollingSlot>> {
        let row = sqlx::query_as::<_, SlotRow>(
            "SELECT id, expert_id, date, time FROM polling_slots WHERE id = ?",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(SlotRow::into_slot))
    }

    async fn slots_for_expert(&self, expert_id: &ExpertId) -> SchedulingResult<Vec<PollingSlot>> {
        let rows = sqlx::query_as::<_, SlotRow>(
            "SELECT id, expert_id, date, time FROM polling_slots WHERE expert_id = ? \
             ORDER BY date, time",
        )
        .bind(expert_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(SlotRow::into_slot).collect())
    }

    async fn slots_by_ids(
        &self,
        expert_id: &ExpertId,
        ids: &[SlotId],
    ) -> SchedulingResult<Vec<PollingSlot>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        // Bound IN clause: the builder pairs every placeholder with its
        // value, no manual placeholder counting
        let mut builder: sqlx::QueryBuilder<sqlx::Sqlite> = sqlx::QueryBuilder::new(
            "SELECT id, expert_id, date, time FROM polling_slots WHERE expert_id = ",
        );
        builder.push_bind(expert_id.as_uuid());
        builder.push(" AND id IN (");

        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(id.as_uuid());
        }
        separated.push_unseparated(")");

        let rows = builder
            .build_query_as::<SlotRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(SlotRow::into_slot).collect())
    }

    async fn count_slots(&self, expert_id: &ExpertId) -> SchedulingResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM polling_slots WHERE expert_id = ?",
        )
        .bind(expert_id.as_uuid())
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

// ============================================================================
// Vote / Voter Password Repository Implementations
// ============================================================================

impl VoteRepository for SqliteSchedulingRepository {
    async fn replace_votes(
        &self,
        expert_id: &ExpertId,
        voter_name: &str,
        slot_ids: &[SlotId],
    ) -> SchedulingResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM voter_responses WHERE expert_id = ? AND voter_name = ?")
            .bind(expert_id.as_uuid())
            .bind(voter_name)
            .execute(&mut *tx)
            .await?;

        for slot_id in slot_ids {
            sqlx::query(
                "INSERT INTO voter_responses (expert_id, voter_name, slot_id) VALUES (?, ?, ?)",
            )
            .bind(expert_id.as_uuid())
            .bind(voter_name)
            .bind(slot_id.as_uuid())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(())
    }

    async fn responses_for_expert(
        &self,
        expert_id: &ExpertId,
    ) -> SchedulingResult<Vec<(SlotId, String)>> {
        let rows = sqlx::query_as::<_, (Uuid, String)>(
            "SELECT slot_id, voter_name FROM voter_responses WHERE expert_id = ?",
        )
        .bind(expert_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(slot_id, voter)| (Id::from_uuid(slot_id), voter))
            .collect())
    }
}

impl VoterPasswordRepository for SqliteSchedulingRepository {
    async fn find_voter_password(
        &self,
        expert_id: &ExpertId,
        voter_name: &str,
    ) -> SchedulingResult<Option<String>> {
        let stored = sqlx::query_scalar::<_, String>(
            "SELECT password FROM voter_passwords WHERE expert_id = ? AND voter_name = ?",
        )
        .bind(expert_id.as_uuid())
        .bind(voter_name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(stored)
    }

    async fn insert_voter_password(
        &self,
        expert_id: &ExpertId,
        voter_name: &str,
        stored: &str,
    ) -> SchedulingResult<()> {
        sqlx::query(
            "INSERT INTO voter_passwords (expert_id, voter_name, password) VALUES (?, ?, ?)",
        )
        .bind(expert_id.as_uuid())
        .bind(voter_name)
        .bind(stored)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_voter_password(
        &self,
        expert_id: &ExpertId,
        voter_name: &str,
        stored: &str,
    ) -> SchedulingResult<()> {
        sqlx::query("UPDATE voter_passwords SET password = ? WHERE expert_id = ? AND voter_name = ?")
            .bind(stored)
            .bind(expert_id.as_uuid())
            .bind(voter_name)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
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

    async fn seed_workspace(pool: &SqlitePool) -> WorkspaceId {
        let id = WorkspaceId::new();
        sqlx::query(
            "INSERT INTO workspaces (id, name, slug, password, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(id.as_uuid())
        .bind("Acme")
        .bind(format!("acme-{id}"))
        .bind("pw")
        .bind(Utc::now())
        .execute(pool)
        .await
        .unwrap();
        id
    }

    async fn seed_expert(repo: &SqliteSchedulingRepository, workspace_id: WorkspaceId) -> Expert {
        let expert = Expert::new(workspace_id, "Dr. Kim");
        repo.create(&expert).await.unwrap();
        expert
    }

    #[tokio::test]
    async fn test_create_find_list() {
        let pool = test_pool().await;
        let repo = SqliteSchedulingRepository::new(pool.clone());
        let ws = seed_workspace(&pool).await;

        let expert = seed_expert(&repo, ws).await;

        let found = repo.find(&ws, &expert.id).await.unwrap().unwrap();
        assert_eq!(found.name, "Dr. Kim");
        assert_eq!(found.status, ExpertStatus::None);
        assert!(found.confirmed_slots.is_empty());

        // Scoped lookup: the same id under another workspace resolves to nothing
        let other_ws = seed_workspace(&pool).await;
        assert!(repo.find(&other_ws, &expert.id).await.unwrap().is_none());

        assert_eq!(repo.list(&ws).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_save_state_roundtrips_snapshots() {
        let pool = test_pool().await;
        let repo = SqliteSchedulingRepository::new(pool.clone());
        let ws = seed_workspace(&pool).await;
        let mut expert = seed_expert(&repo, ws).await;

        let slot = PollingSlot::new(expert.id, "2026-09-01", "10:00-11:00");
        repo.insert_slot(&slot).await.unwrap();

        expert.start_polling(1).unwrap();
        expert.confirm(vec![slot.snapshot()]).unwrap();
        expert.select_slot(&slot.id.to_string()).unwrap();
        repo.save_state(&expert).await.unwrap();

        let loaded = repo.find(&ws, &expert.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, ExpertStatus::Registered);
        assert_eq!(loaded.confirmed_slots, expert.confirmed_slots);
        assert_eq!(loaded.selected_slot, expert.selected_slot);
    }

    #[tokio::test]
    async fn test_update_profile_preserves_lifecycle_columns() {
        let pool = test_pool().await;
        let repo = SqliteSchedulingRepository::new(pool.clone());
        let ws = seed_workspace(&pool).await;
        let mut expert = seed_expert(&repo, ws).await;

        let slot = PollingSlot::new(expert.id, "2026-09-01", "10:00-11:00");
        repo.insert_slot(&slot).await.unwrap();
        expert.start_polling(1).unwrap();
        expert.confirm(vec![slot.snapshot()]).unwrap();
        repo.save_state(&expert).await.unwrap();

        // Profile update must not clobber status or snapshots
        expert.name = "Dr. Kim (PhD)".to_string();
        expert.status = ExpertStatus::None; // deliberately stale in memory
        repo.update_profile(&expert).await.unwrap();

        let loaded = repo.find(&ws, &expert.id).await.unwrap().unwrap();
        assert_eq!(loaded.name, "Dr. Kim (PhD)");
        assert_eq!(loaded.status, ExpertStatus::Confirmed);
        assert_eq!(loaded.confirmed_slots.len(), 1);
    }

    #[tokio::test]
    async fn test_slots_by_ids_only_returns_owned_slots() {
        let pool = test_pool().await;
        let repo = SqliteSchedulingRepository::new(pool.clone());
        let ws = seed_workspace(&pool).await;
        let expert = seed_expert(&repo, ws).await;
        let other = seed_expert(&repo, ws).await;

        let mine = PollingSlot::new(expert.id, "2026-09-01", "10:00-11:00");
        let theirs = PollingSlot::new(other.id, "2026-09-02", "14:00-15:00");
        repo.insert_slot(&mine).await.unwrap();
        repo.insert_slot(&theirs).await.unwrap();

        let found = repo
            .slots_by_ids(&expert.id, &[mine.id, theirs.id, SlotId::new()])
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, mine.id);

        assert!(repo.slots_by_ids(&expert.id, &[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_replace_votes_leaves_no_residue() {
        let pool = test_pool().await;
        let repo = SqliteSchedulingRepository::new(pool.clone());
        let ws = seed_workspace(&pool).await;
        let expert = seed_expert(&repo, ws).await;

        let a = PollingSlot::new(expert.id, "2026-09-01", "10:00-11:00");
        let b = PollingSlot::new(expert.id, "2026-09-02", "10:00-11:00");
        let c = PollingSlot::new(expert.id, "2026-09-03", "10:00-11:00");
        for slot in [&a, &b, &c] {
            repo.insert_slot(slot).await.unwrap();
        }

        repo.replace_votes(&expert.id, "alice", &[a.id, b.id])
            .await
            .unwrap();
        repo.replace_votes(&expert.id, "bob", &[a.id]).await.unwrap();

        // Alice resubmits {c}; {a, b} must be fully removed
        repo.replace_votes(&expert.id, "alice", &[c.id]).await.unwrap();

        let mut responses = repo.responses_for_expert(&expert.id).await.unwrap();
        responses.sort_by(|x, y| x.1.cmp(&y.1));
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0], (c.id, "alice".to_string()));
        assert_eq!(responses[1], (a.id, "bob".to_string()));

        // Empty resubmission clears the voter entirely
        repo.replace_votes(&expert.id, "alice", &[]).await.unwrap();
        assert_eq!(repo.responses_for_expert(&expert.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_slot_removes_its_votes() {
        let pool = test_pool().await;
        let repo = SqliteSchedulingRepository::new(pool.clone());
        let ws = seed_workspace(&pool).await;
        let expert = seed_expert(&repo, ws).await;

        let a = PollingSlot::new(expert.id, "2026-09-01", "10:00-11:00");
        let b = PollingSlot::new(expert.id, "2026-09-02", "10:00-11:00");
        repo.insert_slot(&a).await.unwrap();
        repo.insert_slot(&b).await.unwrap();
        repo.replace_votes(&expert.id, "alice", &[a.id, b.id])
            .await
            .unwrap();

        repo.delete_slot(&a.id).await.unwrap();

        assert!(repo.find_slot(&a.id).await.unwrap().is_none());
        let responses = repo.responses_for_expert(&expert.id).await.unwrap();
        assert_eq!(responses, vec![(b.id, "alice".to_string())]);
    }

    #[tokio::test]
    async fn test_expert_cascade_delete_is_isolated() {
        let pool = test_pool().await;
        let repo = SqliteSchedulingRepository::new(pool.clone());
        let ws = seed_workspace(&pool).await;
        let doomed = seed_expert(&repo, ws).await;
        let kept = seed_expert(&repo, ws).await;

        let doomed_slot = PollingSlot::new(doomed.id, "2026-09-01", "10:00-11:00");
        let kept_slot = PollingSlot::new(kept.id, "2026-09-02", "10:00-11:00");
        repo.insert_slot(&doomed_slot).await.unwrap();
        repo.insert_slot(&kept_slot).await.unwrap();
        repo.replace_votes(&doomed.id, "alice", &[doomed_slot.id])
            .await
            .unwrap();
        repo.replace_votes(&kept.id, "alice", &[kept_slot.id])
            .await
            .unwrap();
        repo.insert_voter_password(&doomed.id, "alice", "stored")
            .await
            .unwrap();
        repo.insert_voter_password(&kept.id, "alice", "stored")
            .await
            .unwrap();

        repo.delete_cascade(&doomed.id).await.unwrap();

        assert!(repo.find(&ws, &doomed.id).await.unwrap().is_none());
        assert!(repo.slots_for_expert(&doomed.id).await.unwrap().is_empty());
        assert!(repo.responses_for_expert(&doomed.id).await.unwrap().is_empty());
        assert!(
            repo.find_voter_password(&doomed.id, "alice")
                .await
                .unwrap()
                .is_none()
        );

        // The other expert's rows are untouched
        assert!(repo.find(&ws, &kept.id).await.unwrap().is_some());
        assert_eq!(repo.slots_for_expert(&kept.id).await.unwrap().len(), 1);
        assert_eq!(repo.responses_for_expert(&kept.id).await.unwrap().len(), 1);
        assert!(
            repo.find_voter_password(&kept.id, "alice")
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn test_voter_password_insert_and_update() {
        let pool = test_pool().await;
        let repo = SqliteSchedulingRepository::new(pool.clone());
        let ws = seed_workspace(&pool).await;
        let expert = seed_expert(&repo, ws).await;

        assert!(
            repo.find_voter_password(&expert.id, "alice")
                .await
                .unwrap()
                .is_none()
        );

        repo.insert_voter_password(&expert.id, "alice", "first")
            .await
            .unwrap();
        assert_eq!(
            repo.find_voter_password(&expert.id, "alice").await.unwrap(),
            Some("first".to_string())
        );

        repo.update_voter_password(&expert.id, "alice", "second")
            .await
            .unwrap();
        assert_eq!(
            repo.find_voter_password(&expert.id, "alice").await.unwrap(),
            Some("second".to_string())
        );
    }
}
