//! Signed Bearer Tokens
//!
//! Stateless, short-lived tokens of the form
//! `base64(claims_json) + "." + base64url(hmac_sha256(secret, claims_json))`.
//! The expiry travels inside the claims, so verification needs no storage.
//!
//! [`TokenService::verify`] collapses every failure (malformed structure,
//! signature mismatch, expiry) into `None`; callers must not distinguish
//! the causes in their responses.

use std::fmt;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose;
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Authenticated identity class of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Principal {
    /// Site-wide operator
    Master,
    /// A workspace (tenant) admin
    Workspace,
    /// An individual expert
    Expert,
}

/// Claims carried by a token.
///
/// `principal` is always present; the scoping fields depend on it:
/// workspace tokens carry `workspace_id` + `slug`, expert tokens carry all
/// three. The route guards check every scoping claim against the resolved
/// resource, not just the principal type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    #[serde(rename = "type")]
    pub principal: Principal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expert_id: Option<String>,
    /// Expiry as Unix timestamp in milliseconds, set by [`TokenService::issue`]
    #[serde(default)]
    pub exp_ms: i64,
}

impl TokenClaims {
    /// Claims for the master operator
    pub fn master() -> Self {
        Self {
            principal: Principal::Master,
            workspace_id: None,
            slug: None,
            expert_id: None,
            exp_ms: 0,
        }
    }

    /// Claims scoped to one workspace
    pub fn workspace(workspace_id: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            principal: Principal::Workspace,
            workspace_id: Some(workspace_id.into()),
            slug: Some(slug.into()),
            expert_id: None,
            exp_ms: 0,
        }
    }

    /// Claims scoped to one expert within a workspace
    pub fn expert(
        expert_id: impl Into<String>,
        workspace_id: impl Into<String>,
        slug: impl Into<String>,
    ) -> Self {
        Self {
            principal: Principal::Expert,
            workspace_id: Some(workspace_id.into()),
            slug: Some(slug.into()),
            expert_id: Some(expert_id.into()),
            exp_ms: 0,
        }
    }

    /// Whether the embedded expiry has passed
    pub fn is_expired(&self) -> bool {
        self.exp_ms <= Utc::now().timestamp_millis()
    }
}

/// Issues and verifies signed bearer tokens with a server-held secret.
///
/// TTL policy is the caller's choice; the service only embeds the expiry.
#[derive(Clone)]
pub struct TokenService {
    secret: Vec<u8>,
}

impl TokenService {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Issue a token for `claims` valid for `ttl` from now.
    pub fn issue(&self, mut claims: TokenClaims, ttl: Duration) -> String {
        claims.exp_ms = Utc::now().timestamp_millis() + ttl.as_millis() as i64;

        let json = serde_json::to_string(&claims).expect("token claims serialize to JSON");
        let signature = self.sign(json.as_bytes());

        format!(
            "{}.{}",
            general_purpose::STANDARD.encode(&json),
            general_purpose::URL_SAFE_NO_PAD.encode(signature)
        )
    }

    /// Verify a token and return its claims, or `None` if it is invalid
    /// in any way (structure, signature, expiry).
    pub fn verify(&self, token: &str) -> Option<TokenClaims> {
        let (payload_b64, signature_b64) = token.split_once('.')?;

        let json = general_purpose::STANDARD.decode(payload_b64).ok()?;
        let signature = general_purpose::URL_SAFE_NO_PAD.decode(signature_b64).ok()?;

        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .expect("HMAC can take key of any size");
        mac.update(&json);
        // Constant-time comparison
        mac.verify_slice(&signature).ok()?;

        let claims: TokenClaims = serde_json::from_slice(&json).ok()?;
        if claims.is_expired() {
            return None;
        }

        Some(claims)
    }

    fn sign(&self, data: &[u8]) -> Vec<u8> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .expect("HMAC can take key of any size");
        mac.update(data);
        mac.finalize().into_bytes().to_vec()
    }
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}
