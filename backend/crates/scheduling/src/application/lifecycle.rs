//! Lifecycle Use Cases
//!
//! Orchestrates the expert state machine against the store: loads the
//! expert, applies the entity transition, persists status and snapshot
//! columns together, and audits the change.

use std::sync::Arc;

use kernel::id::{ExpertId, SlotId, WorkspaceId};
use platform::client::RequestMeta;
use workspace::domain::entity::audit_log::{ActorType, AuditEntry};
use workspace::infra::audit::AuditLogger;

use crate::domain::entity::expert::{Expert, SlotSnapshot};
use crate::domain::repository::SchedulingStore;
use crate::error::{SchedulingError, SchedulingResult};

/// Lifecycle use case
pub struct LifecycleUseCase<R>
where
    R: SchedulingStore,
{
    repo: Arc<R>,
    audit: AuditLogger,
}

impl<R> LifecycleUseCase<R>
where
    R: SchedulingStore,
{
    pub fn new(repo: Arc<R>, audit: AuditLogger) -> Self {
        Self { repo, audit }
    }

    async fn load(
        &self,
        workspace_id: &WorkspaceId,
        expert_id: &ExpertId,
    ) -> SchedulingResult<Expert> {
        self.repo
            .find(workspace_id, expert_id)
            .await?
            .ok_or(SchedulingError::ExpertNotFound)
    }

    fn record(
        &self,
        actor: ActorType,
        workspace_id: &WorkspaceId,
        expert: &Expert,
        action: &str,
        meta: &RequestMeta,
    ) {
        self.audit.record(
            AuditEntry::new(actor, workspace_id.to_string(), action)
                .with_workspace(*workspace_id.as_uuid())
                .with_target("expert", expert.id.to_string())
                .with_request(meta),
        );
    }

    /// `none → polling` (workspace side)
    pub async fn start_polling(
        &self,
        workspace_id: &WorkspaceId,
        expert_id: &ExpertId,
        meta: &RequestMeta,
    ) -> SchedulingResult<Expert> {
        let mut expert = self.load(workspace_id, expert_id).await?;
        let slot_count = self.repo.count_slots(expert_id).await?;

        expert.start_polling(slot_count as usize)?;
        self.repo.save_state(&expert).await?;

        self.record(ActorType::Workspace, workspace_id, &expert, "expert_start_polling", meta);
        Ok(expert)
    }

    /// `polling → confirmed` (workspace side). Re-queries the live slot
    /// rows and freezes their current (id, date, time) as the snapshot.
    pub async fn confirm(
        &self,
        workspace_id: &WorkspaceId,
        expert_id: &ExpertId,
        slot_ids: &[SlotId],
        meta: &RequestMeta,
    ) -> SchedulingResult<Vec<SlotSnapshot>> {
        if slot_ids.is_empty() {
            return Err(SchedulingError::Validation("No slots selected".to_string()));
        }

        let mut expert = self.load(workspace_id, expert_id).await?;

        let slots = self.repo.slots_by_ids(expert_id, slot_ids).await?;
        if slots.len() != slot_ids.len() {
            return Err(SchedulingError::Validation(
                "A selected slot does not belong to this expert".to_string(),
            ));
        }

        let snapshot: Vec<SlotSnapshot> = slots.iter().map(|s| s.snapshot()).collect();
        expert.confirm(snapshot.clone())?;
        self.repo.save_state(&expert).await?;

        self.record(ActorType::Workspace, workspace_id, &expert, "expert_confirm_slots", meta);
        Ok(snapshot)
    }

    /// `confirmed → registered` (expert side)
    pub async fn select_slot(
        &self,
        workspace_id: &WorkspaceId,
        expert_id: &ExpertId,
        slot_id: &str,
        meta: &RequestMeta,
    ) -> SchedulingResult<SlotSnapshot> {
        let mut expert = self.load(workspace_id, expert_id).await?;

        let chosen = expert.select_slot(slot_id)?;
        self.repo.save_state(&expert).await?;

        self.record(ActorType::Expert, workspace_id, &expert, "expert_select_slot", meta);
        Ok(chosen)
    }

    /// `confirmed → unavailable` (expert side)
    pub async fn decline(
        &self,
        workspace_id: &WorkspaceId,
        expert_id: &ExpertId,
        meta: &RequestMeta,
    ) -> SchedulingResult<()> {
        let mut expert = self.load(workspace_id, expert_id).await?;

        expert.decline_all()?;
        self.repo.save_state(&expert).await?;

        self.record(ActorType::Expert, workspace_id, &expert, "expert_unavailable", meta);
        Ok(())
    }

    /// `{confirmed, registered, unavailable} → polling` (workspace side)
    pub async fn reset(
        &self,
        workspace_id: &WorkspaceId,
        expert_id: &ExpertId,
        meta: &RequestMeta,
    ) -> SchedulingResult<Expert> {
        let mut expert = self.load(workspace_id, expert_id).await?;

        expert.reset_to_polling()?;
        self.repo.save_state(&expert).await?;

        self.record(ActorType::Workspace, workspace_id, &expert, "expert_reset_confirmation", meta);
        Ok(expert)
    }
}
