//! Voting Use Cases
//!
//! Voter password establishment/verification (rate-limited per
//! expert + voter + client IP) and the replace-all vote submission.
//! Both are publicly reachable; neither requires a principal token.

use std::collections::HashSet;
use std::sync::Arc;

use kernel::id::{ExpertId, SlotId, WorkspaceId};
use platform::client::RequestMeta;
use platform::rate_limit::{self, AuthRateLimitStore, RateLimitDecision};

use crate::application::config::SchedulingConfig;
use crate::domain::repository::SchedulingStore;
use crate::error::{SchedulingError, SchedulingResult};

/// Result of a voter password submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoterPasswordOutcome {
    /// True when this submission established the password
    pub is_new: bool,
}

/// Voting use case
pub struct VotingUseCase<R, L>
where
    R: SchedulingStore,
    L: AuthRateLimitStore,
{
    repo: Arc<R>,
    limiter: Arc<L>,
    config: Arc<SchedulingConfig>,
}

impl<R, L> VotingUseCase<R, L>
where
    R: SchedulingStore,
    L: AuthRateLimitStore,
{
    pub fn new(repo: Arc<R>, limiter: Arc<L>, config: Arc<SchedulingConfig>) -> Self {
        Self {
            repo,
            limiter,
            config,
        }
    }

    /// First submission for a (expert, voter) pair establishes the
    /// password; later submissions must match it. Legacy plaintext rows
    /// are migrated on the first successful verification.
    pub async fn verify_voter_password(
        &self,
        workspace_id: &WorkspaceId,
        expert_id: &ExpertId,
        voter_name: &str,
        password: &str,
        meta: &RequestMeta,
    ) -> SchedulingResult<VoterPasswordOutcome> {
        let voter_name = voter_name.trim();
        if voter_name.is_empty() || password.is_empty() {
            return Err(SchedulingError::Validation(
                "Voter name and password are required".to_string(),
            ));
        }

        self.repo
            .find(workspace_id, expert_id)
            .await?
            .ok_or(SchedulingError::ExpertNotFound)?;

        let key = rate_limit::voter_key(&expert_id.to_string(), voter_name, &meta.ip_string());

        let decision = self
            .limiter
            .check(&key, &self.config.voter_rate_limit)
            .await?;
        if let RateLimitDecision::Blocked { .. } = decision {
            return Err(SchedulingError::RateLimited {
                retry_after_secs: decision.retry_after_secs(),
            });
        }

        let Some(stored) = self.repo.find_voter_password(expert_id, voter_name).await? else {
            // First submission: establish the voter's password
            let stored = platform::password::hash_password(password);
            self.repo
                .insert_voter_password(expert_id, voter_name, &stored)
                .await?;
            return Ok(VoterPasswordOutcome { is_new: true });
        };

        if !platform::password::verify_password(password, &stored) {
            let outcome = self
                .limiter
                .register_failure(&key, &self.config.voter_rate_limit)
                .await?;
            if outcome.blocked_now {
                return Err(SchedulingError::RateLimited {
                    retry_after_secs: outcome.retry_after.as_secs().max(1),
                });
            }
            return Err(SchedulingError::InvalidCredentials);
        }

        self.limiter.clear(&key).await?;

        if !platform::password::is_hashed(&stored) {
            let migrated = platform::password::hash_password(password);
            self.repo
                .update_voter_password(expert_id, voter_name, &migrated)
                .await?;
        }

        Ok(VoterPasswordOutcome { is_new: false })
    }

    /// Replace the voter's whole response set. Every slot id must belong
    /// to this expert; an empty set clears the voter's responses.
    pub async fn vote(
        &self,
        workspace_id: &WorkspaceId,
        expert_id: &ExpertId,
        voter_name: &str,
        slot_ids: &[SlotId],
    ) -> SchedulingResult<()> {
        let voter_name = voter_name.trim();
        if voter_name.is_empty() {
            return Err(SchedulingError::Validation(
                "Voter name is required".to_string(),
            ));
        }

        let expert = self
            .repo
            .find(workspace_id, expert_id)
            .await?
            .ok_or(SchedulingError::ExpertNotFound)?;

        if !expert.status.voting_open() {
            return Err(SchedulingError::VotingClosed);
        }

        let unique: Vec<SlotId> = {
            let mut seen = HashSet::new();
            slot_ids
                .iter()
                .filter(|id| seen.insert(**id))
                .copied()
                .collect()
        };

        if !unique.is_empty() {
            let owned = self.repo.slots_by_ids(expert_id, &unique).await?;
            if owned.len() != unique.len() {
                return Err(SchedulingError::Validation(
                    "A selected slot does not belong to this expert".to_string(),
                ));
            }
        }

        self.repo.replace_votes(expert_id, voter_name, &unique).await
    }
}
