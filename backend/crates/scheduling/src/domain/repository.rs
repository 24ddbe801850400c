//! Repository Traits
//!
//! Interfaces for data persistence. Implementation is in infrastructure layer.

use kernel::id::{ExpertId, SlotId, WorkspaceId};

use crate::domain::entity::expert::Expert;
use crate::domain::entity::polling_slot::PollingSlot;
use crate::error::SchedulingResult;

/// Expert repository trait
#[trait_variant::make(ExpertRepository: Send)]
pub trait LocalExpertRepository {
    /// Insert a new expert
    async fn create(&self, expert: &Expert) -> SchedulingResult<()>;

    /// Find an expert within its workspace
    async fn find(&self, workspace_id: &WorkspaceId, id: &ExpertId)
    -> SchedulingResult<Option<Expert>>;

    /// All experts of a workspace
    async fn list(&self, workspace_id: &WorkspaceId) -> SchedulingResult<Vec<Expert>>;

    /// Update profile fields and credential; leaves status and the
    /// snapshot columns untouched
    async fn update_profile(&self, expert: &Expert) -> SchedulingResult<()>;

    /// Persist status + `confirmed_slots` + `selected_slot` together.
    /// The only writer of those columns.
    async fn save_state(&self, expert: &Expert) -> SchedulingResult<()>;

    /// Rewrite only the stored credential (migrate-on-login)
    async fn update_credential(&self, id: &ExpertId, stored: &str) -> SchedulingResult<()>;

    /// Delete the expert and its slots, responses and voter passwords in
    /// one transaction
    async fn delete_cascade(&self, id: &ExpertId) -> SchedulingResult<()>;
}

/// Polling slot repository trait
#[trait_variant::make(SlotRepository: Send)]
pub trait LocalSlotRepository {
    /// Insert a candidate slot
    async fn insert_slot(&self, slot: &PollingSlot) -> SchedulingResult<()>;

    /// Delete a slot and its responses in one transaction
    async fn delete_slot(&self, id: &SlotId) -> SchedulingResult<()>;

    /// Find one slot
    async fn find_slot(&self, id: &SlotId) -> SchedulingResult<Option<PollingSlot>>;

    /// All slots of an expert
    async fn slots_for_expert(&self, expert_id: &ExpertId) -> SchedulingResult<Vec<PollingSlot>>;

    /// The subset of `ids` that exists AND belongs to this expert
    async fn slots_by_ids(
        &self,
        expert_id: &ExpertId,
        ids: &[SlotId],
    ) -> SchedulingResult<Vec<PollingSlot>>;

    /// Number of candidate slots of an expert
    async fn count_slots(&self, expert_id: &ExpertId) -> SchedulingResult<i64>;
}

/// Voter response repository trait
#[trait_variant::make(VoteRepository: Send)]
pub trait LocalVoteRepository {
    /// Replace a voter's whole response set for this expert atomically
    /// (delete-then-insert in one transaction)
    async fn replace_votes(
        &self,
        expert_id: &ExpertId,
        voter_name: &str,
        slot_ids: &[SlotId],
    ) -> SchedulingResult<()>;

    /// All (slot id, voter name) pairs for an expert
    async fn responses_for_expert(
        &self,
        expert_id: &ExpertId,
    ) -> SchedulingResult<Vec<(SlotId, String)>>;
}

/// Everything the scheduling use cases need from one store
pub trait SchedulingStore:
    ExpertRepository
    + SlotRepository
    + VoteRepository
    + VoterPasswordRepository
    + Clone
    + Send
    + Sync
    + 'static
{
}

impl<T> SchedulingStore for T where
    T: ExpertRepository
        + SlotRepository
        + VoteRepository
        + VoterPasswordRepository
        + Clone
        + Send
        + Sync
        + 'static
{
}

/// Voter password repository trait
#[trait_variant::make(VoterPasswordRepository: Send)]
pub trait LocalVoterPasswordRepository {
    /// Stored credential for one (expert, voter) pair
    async fn find_voter_password(
        &self,
        expert_id: &ExpertId,
        voter_name: &str,
    ) -> SchedulingResult<Option<String>>;

    /// First submission establishes the credential
    async fn insert_voter_password(
        &self,
        expert_id: &ExpertId,
        voter_name: &str,
        stored: &str,
    ) -> SchedulingResult<()>;

    /// Rewrite the stored credential (migrate-on-login)
    async fn update_voter_password(
        &self,
        expert_id: &ExpertId,
        voter_name: &str,
        stored: &str,
    ) -> SchedulingResult<()>;
}
