//! Application Configuration

use std::time::Duration;

use platform::rate_limit::AuthRateLimitConfig;
use platform::token::TokenService;

/// Scheduling application configuration
#[derive(Clone)]
pub struct SchedulingConfig {
    /// Shared token signer/verifier (same secret as the workspace side)
    pub token_service: TokenService,
    /// Expert token TTL (2 hours)
    pub expert_token_ttl: Duration,
    /// Rate limit for expert login attempts
    pub expert_rate_limit: AuthRateLimitConfig,
    /// Rate limit for voter password attempts
    pub voter_rate_limit: AuthRateLimitConfig,
}

impl SchedulingConfig {
    pub fn new(token_secret: impl Into<Vec<u8>>) -> Self {
        Self {
            token_service: TokenService::new(token_secret),
            expert_token_ttl: Duration::from_secs(2 * 3600),
            expert_rate_limit: AuthRateLimitConfig::new(5, 600, 600),
            voter_rate_limit: AuthRateLimitConfig::new(5, 600, 600),
        }
    }

    /// Config with a random token secret (for development and tests)
    pub fn development() -> Self {
        Self::new(platform::crypto::random_bytes(32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SchedulingConfig::new(b"secret".to_vec());
        assert_eq!(config.expert_token_ttl, Duration::from_secs(7200));
        assert_eq!(config.expert_rate_limit.max_attempts, 5);
        assert_eq!(config.voter_rate_limit.max_attempts, 5);
    }
}
