//! Polling Slot Entity
//!
//! A proposed date/time range open to member voting. Created only while
//! the owning expert is in a pre-confirmation status.

use kernel::id::{ExpertId, SlotId};

use crate::domain::entity::expert::SlotSnapshot;

/// Candidate slot
#[derive(Debug, Clone)]
pub struct PollingSlot {
    pub id: SlotId,
    pub expert_id: ExpertId,
    /// Calendar date, e.g. `2026-09-01`
    pub date: String,
    /// Time range, e.g. `10:00-11:00`
    pub time: String,
}

impl PollingSlot {
    pub fn new(expert_id: ExpertId, date: impl Into<String>, time: impl Into<String>) -> Self {
        Self {
            id: SlotId::new(),
            expert_id,
            date: date.into(),
            time: time.into(),
        }
    }

    /// Value snapshot for confirm-time freezing
    pub fn snapshot(&self) -> SlotSnapshot {
        SlotSnapshot {
            id: self.id.to_string(),
            date: self.date.clone(),
            time: self.time.clone(),
        }
    }
}

/// A slot with its derived vote state. The tally is recomputed from
/// `VoterResponse` rows at read time, never stored.
#[derive(Debug, Clone)]
pub struct SlotTally {
    pub slot: PollingSlot,
    pub voters: Vec<String>,
}

impl SlotTally {
    pub fn votes(&self) -> usize {
        self.voters.len()
    }
}
