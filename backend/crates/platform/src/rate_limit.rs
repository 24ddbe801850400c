//! Rate Limiting Infrastructure
//!
//! Sliding-window counters with a hard block, used to throttle failed
//! authentication attempts per logical key. Keys combine scope, identity and
//! client IP so one user's failures cannot lock out unrelated identities.
//!
//! Callers must `check` before doing any credential work (a blocked key is
//! rejected without touching the password service), `register_failure` after
//! a bad credential, and `clear` after a successful one.

use std::time::Duration;

/// Rate limit configuration for one authentication flow
#[derive(Debug, Clone)]
pub struct AuthRateLimitConfig {
    /// Failures allowed within the window before the key is blocked
    pub max_attempts: u32,
    /// Window measured from the first failure
    pub window: Duration,
    /// Block duration once the cap is reached
    pub block: Duration,
}

impl Default for AuthRateLimitConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            window: Duration::from_secs(10 * 60),
            block: Duration::from_secs(15 * 60),
        }
    }
}

impl AuthRateLimitConfig {
    pub fn new(max_attempts: u32, window_secs: u64, block_secs: u64) -> Self {
        Self {
            max_attempts,
            window: Duration::from_secs(window_secs),
            block: Duration::from_secs(block_secs),
        }
    }

    pub fn window_ms(&self) -> i64 {
        self.window.as_millis() as i64
    }

    pub fn block_ms(&self) -> i64 {
        self.block.as_millis() as i64
    }
}

/// Result of a pre-authentication check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed,
    Blocked { retry_after: Duration },
}

impl RateLimitDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitDecision::Allowed)
    }

    /// Retry-after in whole seconds, rounded up, at least 1 when blocked
    pub fn retry_after_secs(&self) -> u64 {
        match self {
            RateLimitDecision::Allowed => 0,
            RateLimitDecision::Blocked { retry_after } => retry_after.as_secs().max(1),
        }
    }
}

/// Result of recording a failed attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureOutcome {
    /// Whether this failure tripped the block
    pub blocked_now: bool,
    pub retry_after: Duration,
}

pub type RateLimitError = Box<dyn std::error::Error + Send + Sync>;

/// Trait for rate limit storage backends
#[trait_variant::make(AuthRateLimitStore: Send)]
pub trait LocalAuthRateLimitStore {
    /// Check whether the key is currently blocked.
    /// Windows that aged out without reaching the cap are reset here.
    async fn check(
        &self,
        key: &str,
        config: &AuthRateLimitConfig,
    ) -> Result<RateLimitDecision, RateLimitError>;

    /// Record a failed attempt; reaching `max_attempts` blocks the key.
    async fn register_failure(
        &self,
        key: &str,
        config: &AuthRateLimitConfig,
    ) -> Result<FailureOutcome, RateLimitError>;

    /// Drop the key's record after a successful authentication.
    async fn clear(&self, key: &str) -> Result<(), RateLimitError>;
}

// ============================================================================
// Key builders
// ============================================================================

/// Key for workspace (tenant) login attempts
pub fn workspace_login_key(slug: &str, ip: &str) -> String {
    format!("workspace:{slug}:{ip}")
}

/// Key for expert login attempts
pub fn expert_login_key(expert_id: &str, ip: &str) -> String {
    format!("expert:{expert_id}:{ip}")
}

/// Key for voter password attempts
pub fn voter_key(expert_id: &str, voter_name: &str, ip: &str) -> String {
    format!("voter:{expert_id}:{voter_name}:{ip}")
}
