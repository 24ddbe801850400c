//! Expert Entity
//!
//! An outside person being scheduled for an engagement. Owned by exactly
//! one workspace for its whole lifetime and cascade-deleted with it.
//!
//! The lifecycle transition methods are the only writers of `status`,
//! `confirmed_slots` and `selected_slot`; profile upserts must never touch
//! those fields.

use chrono::{DateTime, Utc};
use kernel::id::{ExpertId, WorkspaceId};
use serde::{Deserialize, Serialize};

use crate::domain::status::ExpertStatus;
use crate::error::{SchedulingError, SchedulingResult};

/// Value snapshot of a slot, frozen at confirm time.
///
/// Stored as JSON text in `confirmed_slots` / `selected_slot`, so later
/// edits or deletions of the live slot rows never change what was
/// confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotSnapshot {
    pub id: String,
    pub date: String,
    pub time: String,
}

/// Expert entity
#[derive(Debug, Clone)]
pub struct Expert {
    pub id: ExpertId,
    pub workspace_id: WorkspaceId,
    pub name: String,
    pub organization: Option<String>,
    pub position: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub fee: Option<String>,
    pub status: ExpertStatus,
    /// Optional stored credential for expert-side actions
    pub password: Option<String>,
    pub selected_slot: Option<SlotSnapshot>,
    pub confirmed_slots: Vec<SlotSnapshot>,
    pub created_at: DateTime<Utc>,
}

impl Expert {
    pub fn new(workspace_id: WorkspaceId, name: impl Into<String>) -> Self {
        Self {
            id: ExpertId::new(),
            workspace_id,
            name: name.into(),
            organization: None,
            position: None,
            email: None,
            phone: None,
            fee: None,
            status: ExpertStatus::None,
            password: None,
            selected_slot: None,
            confirmed_slots: Vec::new(),
            created_at: Utc::now(),
        }
    }

    // ========================================================================
    // Lifecycle transitions
    // ========================================================================

    /// `none → polling`. Requires at least one candidate slot.
    pub fn start_polling(&mut self, slot_count: usize) -> SchedulingResult<()> {
        if self.status != ExpertStatus::None {
            return Err(SchedulingError::invalid_transition(format!(
                "Polling can only start from the initial status (current: {})",
                self.status
            )));
        }
        if slot_count == 0 {
            return Err(SchedulingError::invalid_transition(
                "No candidate slots; add at least one before starting the poll",
            ));
        }

        self.status = ExpertStatus::Polling;
        Ok(())
    }

    /// `polling → confirmed`. The snapshot becomes the immutable shortlist.
    pub fn confirm(&mut self, snapshot: Vec<SlotSnapshot>) -> SchedulingResult<()> {
        if self.status != ExpertStatus::Polling {
            return Err(SchedulingError::invalid_transition(format!(
                "Slots can only be confirmed while polling (current: {})",
                self.status
            )));
        }
        if snapshot.is_empty() {
            return Err(SchedulingError::invalid_transition("No slots selected"));
        }

        self.confirmed_slots = snapshot;
        self.status = ExpertStatus::Confirmed;
        Ok(())
    }

    /// `confirmed → registered`. The chosen id must be in the confirmed
    /// shortlist; the stored selection is the snapshot entry, not the live
    /// slot row.
    pub fn select_slot(&mut self, slot_id: &str) -> SchedulingResult<SlotSnapshot> {
        if self.status != ExpertStatus::Confirmed {
            return Err(SchedulingError::invalid_transition(format!(
                "A slot can only be selected after confirmation (current: {})",
                self.status
            )));
        }

        let snapshot = self
            .confirmed_slots
            .iter()
            .find(|s| s.id == slot_id)
            .cloned()
            .ok_or_else(|| {
                SchedulingError::invalid_transition(
                    "The selected slot is not among the confirmed slots",
                )
            })?;

        self.selected_slot = Some(snapshot.clone());
        self.status = ExpertStatus::Registered;
        Ok(snapshot)
    }

    /// `confirmed → unavailable`. Slot fields stay untouched.
    pub fn decline_all(&mut self) -> SchedulingResult<()> {
        if self.status != ExpertStatus::Confirmed {
            return Err(SchedulingError::invalid_transition(format!(
                "Only a confirmed schedule can be declined (current: {})",
                self.status
            )));
        }

        self.status = ExpertStatus::Unavailable;
        Ok(())
    }

    /// `{confirmed, registered, unavailable} → polling`. Clears the
    /// shortlist and selection; existing slots and votes stay as they are.
    pub fn reset_to_polling(&mut self) -> SchedulingResult<()> {
        if !self.status.can_reset() {
            return Err(SchedulingError::invalid_transition(format!(
                "Nothing to reset (current: {})",
                self.status
            )));
        }

        self.status = ExpertStatus::Polling;
        self.confirmed_slots.clear();
        self.selected_slot = None;
        Ok(())
    }
}
