//! Expert Lifecycle Status
//!
//! `none → polling → confirmed → registered`, with the side branch
//! `confirmed → unavailable` and a reset edge
//! `{confirmed, registered, unavailable} → polling`.

/// Lifecycle status of an expert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpertStatus {
    /// Registered in the workspace, no polling started
    None,
    /// Candidate slots are open for member voting
    Polling,
    /// The workspace confirmed a shortlist of slots
    Confirmed,
    /// The expert picked a final slot
    Registered,
    /// The expert declined every confirmed slot
    Unavailable,
}

impl ExpertStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ExpertStatus::None => "none",
            ExpertStatus::Polling => "polling",
            ExpertStatus::Confirmed => "confirmed",
            ExpertStatus::Registered => "registered",
            ExpertStatus::Unavailable => "unavailable",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "none" => Some(ExpertStatus::None),
            "polling" => Some(ExpertStatus::Polling),
            "confirmed" => Some(ExpertStatus::Confirmed),
            "registered" => Some(ExpertStatus::Registered),
            "unavailable" => Some(ExpertStatus::Unavailable),
            _ => None,
        }
    }

    /// Whether member voting is accepted.
    ///
    /// Policy decision: `unavailable` counts as closed. Voting only runs
    /// before the workspace freezes the schedule, never after the expert
    /// has already answered.
    pub const fn voting_open(&self) -> bool {
        matches!(self, ExpertStatus::None | ExpertStatus::Polling)
    }

    /// Whether the candidate-slot set is frozen (no adds or deletes)
    pub const fn slots_frozen(&self) -> bool {
        matches!(
            self,
            ExpertStatus::Confirmed | ExpertStatus::Registered | ExpertStatus::Unavailable
        )
    }

    /// Whether the status can be reset back to `polling`
    pub const fn can_reset(&self) -> bool {
        self.slots_frozen()
    }
}

impl std::fmt::Display for ExpertStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
