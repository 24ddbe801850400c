//! Application Configuration
//!
//! Configuration for the workspace application layer. TTLs are policy
//! choices per principal type; the token service itself is TTL-agnostic.

use std::time::Duration;

use platform::rate_limit::AuthRateLimitConfig;
use platform::token::TokenService;

/// Workspace application configuration
#[derive(Clone)]
pub struct WorkspaceConfig {
    /// Shared token signer/verifier
    pub token_service: TokenService,
    /// Master operator password; master auth returns 500 when unset
    pub master_password: Option<String>,
    /// Master token TTL (1 hour)
    pub master_token_ttl: Duration,
    /// Workspace token TTL (24 hours)
    pub workspace_token_ttl: Duration,
    /// Rate limit for workspace login attempts
    pub login_rate_limit: AuthRateLimitConfig,
    /// Retention age in years for the sweeper
    pub retention_years: u32,
}

impl WorkspaceConfig {
    pub fn new(token_secret: impl Into<Vec<u8>>) -> Self {
        Self {
            token_service: TokenService::new(token_secret),
            master_password: None,
            master_token_ttl: Duration::from_secs(3600),
            workspace_token_ttl: Duration::from_secs(24 * 3600),
            login_rate_limit: AuthRateLimitConfig::default(),
            retention_years: crate::application::retention::DEFAULT_RETENTION_YEARS,
        }
    }

    pub fn with_master_password(mut self, password: impl Into<String>) -> Self {
        self.master_password = Some(password.into());
        self
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
    fn test_ttl_defaults() {
        let config = WorkspaceConfig::new(b"secret".to_vec());
        assert_eq!(config.master_token_ttl, Duration::from_secs(3600));
        assert_eq!(config.workspace_token_ttl, Duration::from_secs(86400));
        assert!(config.master_password.is_none());
    }
}
