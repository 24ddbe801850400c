//! Expert Administration Use Cases
//!
//! Profile create/update, detail assembly with derived vote tallies, and
//! cascade deletion. The lifecycle columns (`status`, `confirmed_slots`,
//! `selected_slot`) are never writable here; only the state machine in
//! [`lifecycle`](crate::application::lifecycle) touches them.

use std::collections::HashMap;
use std::sync::Arc;

use kernel::id::{ExpertId, Id, WorkspaceId};
use platform::client::RequestMeta;
use uuid::Uuid;
use workspace::domain::entity::audit_log::{ActorType, AuditEntry};
use workspace::infra::audit::AuditLogger;

use crate::domain::entity::expert::Expert;
use crate::domain::entity::polling_slot::SlotTally;
use crate::domain::repository::SchedulingStore;
use crate::error::{SchedulingError, SchedulingResult};

/// Profile fields accepted from the workspace admin.
/// Deliberately no status or slot fields.
pub struct ExpertUpsertInput {
    /// Present for updates, absent for creation
    pub id: Option<Uuid>,
    pub name: String,
    pub organization: Option<String>,
    pub position: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub fee: Option<String>,
    /// New credential for expert-side actions, hashed before storage
    pub password: Option<String>,
}

/// Expert with its derived per-slot vote state
pub struct ExpertDetail {
    pub expert: Expert,
    pub slots: Vec<SlotTally>,
}

/// Expert administration use case
pub struct ExpertAdminUseCase<R>
where
    R: SchedulingStore,
{
    repo: Arc<R>,
    audit: AuditLogger,
}

impl<R> ExpertAdminUseCase<R>
where
    R: SchedulingStore,
{
    pub fn new(repo: Arc<R>, audit: AuditLogger) -> Self {
        Self { repo, audit }
    }

    /// Create or update an expert profile
    pub async fn upsert(
        &self,
        workspace_id: &WorkspaceId,
        input: ExpertUpsertInput,
    ) -> SchedulingResult<Expert> {
        if input.name.trim().is_empty() {
            return Err(SchedulingError::Validation("Name is required".to_string()));
        }

        let existing = match input.id {
            Some(id) => self.repo.find(workspace_id, &Id::from_uuid(id)).await?,
            None => None,
        };

        let password = match input.password {
            Some(raw) => {
                let normalized = platform::password::validate_new_password(&raw)?;
                Some(platform::password::hash_password(&normalized))
            }
            None => None,
        };

        match existing {
            Some(mut expert) => {
                expert.name = input.name.trim().to_string();
                expert.organization = input.organization;
                expert.position = input.position;
                expert.email = input.email;
                expert.phone = input.phone;
                expert.fee = input.fee;
                if let Some(stored) = password {
                    expert.password = Some(stored);
                }

                self.repo.update_profile(&expert).await?;
                Ok(expert)
            }
            None => {
                let mut expert = Expert::new(*workspace_id, input.name.trim());
                if let Some(id) = input.id {
                    expert.id = Id::from_uuid(id);
                }
                expert.organization = input.organization;
                expert.position = input.position;
                expert.email = input.email;
                expert.phone = input.phone;
                expert.fee = input.fee;
                expert.password = password;

                self.repo.create(&expert).await?;
                Ok(expert)
            }
        }
    }

    /// One expert with slots and tallies
    pub async fn detail(
        &self,
        workspace_id: &WorkspaceId,
        id: &ExpertId,
    ) -> SchedulingResult<ExpertDetail> {
        let expert = self
            .repo
            .find(workspace_id, id)
            .await?
            .ok_or(SchedulingError::ExpertNotFound)?;

        let slots = self.assemble_tallies(&expert).await?;
        Ok(ExpertDetail { expert, slots })
    }

    /// All experts of a workspace with slots and tallies
    pub async fn list(&self, workspace_id: &WorkspaceId) -> SchedulingResult<Vec<ExpertDetail>> {
        let experts = self.repo.list(workspace_id).await?;

        let mut details = Vec::with_capacity(experts.len());
        for expert in experts {
            let slots = self.assemble_tallies(&expert).await?;
            details.push(ExpertDetail { expert, slots });
        }

        Ok(details)
    }

    /// Delete an expert and every dependent row
    pub async fn delete(
        &self,
        workspace_id: &WorkspaceId,
        id: &ExpertId,
        meta: &RequestMeta,
    ) -> SchedulingResult<()> {
        let expert = self
            .repo
            .find(workspace_id, id)
            .await?
            .ok_or(SchedulingError::ExpertNotFound)?;

        self.repo.delete_cascade(id).await?;

        self.audit.record(
            AuditEntry::new(ActorType::Workspace, workspace_id.to_string(), "expert_delete")
                .with_workspace(*workspace_id.as_uuid())
                .with_target("expert", expert.id.to_string())
                .with_request(meta),
        );

        Ok(())
    }

    async fn assemble_tallies(&self, expert: &Expert) -> SchedulingResult<Vec<SlotTally>> {
        let slots = self.repo.slots_for_expert(&expert.id).await?;
        let responses = self.repo.responses_for_expert(&expert.id).await?;

        let mut voters_by_slot: HashMap<_, Vec<String>> = HashMap::new();
        for (slot_id, voter) in responses {
            voters_by_slot.entry(slot_id).or_default().push(voter);
        }

        Ok(slots
            .into_iter()
            .map(|slot| {
                let mut voters = voters_by_slot.remove(&slot.id).unwrap_or_default();
                voters.sort();
                SlotTally { slot, voters }
            })
            .collect())
    }
}
