//! API DTOs (Data Transfer Objects)
//!
//! Explicit request/response schemas per endpoint, validated at the
//! boundary. Responses never carry credential fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::application::retention::RetentionSummary;
use crate::domain::entity::workspace::{Workspace, WorkspaceSummary};
use crate::domain::entity::workspace_request::WorkspaceRequest;

// ============================================================================
// Workspace info / auth
// ============================================================================

/// Public workspace identity
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceInfo {
    pub id: String,
    pub name: String,
    pub slug: String,
}

impl From<&Workspace> for WorkspaceInfo {
    fn from(ws: &Workspace) -> Self {
        Self {
            id: ws.id.to_string(),
            name: ws.name.clone(),
            slug: ws.slug.as_str().to_string(),
        }
    }
}

/// Workspace login request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthRequest {
    pub password: String,
}

/// Workspace login response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub workspace: WorkspaceInfo,
}

/// Token validity echo
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub valid: bool,
    pub workspace: WorkspaceInfo,
}

// ============================================================================
// Workspace settings
// ============================================================================

/// Settings response (workspace auth required; no credential field)
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsResponse {
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub organization: Option<String>,
    pub sender_name: Option<String>,
}

/// Settings update. Contact fields are replaced as given; the password is
/// only changed when present.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettingsRequest {
    pub password: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub organization: Option<String>,
    pub sender_name: Option<String>,
}

/// Public subset of settings for form pages
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicSettingsResponse {
    pub sender_name: Option<String>,
}

// ============================================================================
// Master
// ============================================================================

/// Master login request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterAuthRequest {
    pub password: String,
}

/// Master login response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterAuthResponse {
    pub token: String,
}

/// Workspace listing entry for the master console
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceSummaryDto {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
    pub expert_count: i64,
}

impl From<WorkspaceSummary> for WorkspaceSummaryDto {
    fn from(s: WorkspaceSummary) -> Self {
        Self {
            id: s.id.to_string(),
            name: s.name,
            slug: s.slug,
            created_at: s.created_at,
            expert_count: s.expert_count,
        }
    }
}

/// Master-side workspace creation
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorkspaceRequest {
    pub name: String,
    pub slug: String,
    pub password: String,
    pub organization: Option<String>,
    pub sender_name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorkspaceResponse {
    pub id: String,
    pub slug: String,
}

/// Master-side workspace update
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWorkspaceRequest {
    pub name: Option<String>,
    pub password: Option<String>,
}

// ============================================================================
// Workspace requests
// ============================================================================

/// Public workspace application
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitWorkspaceRequest {
    pub name: String,
    pub slug: String,
    pub password: String,
    pub contact_name: String,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub organization: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitWorkspaceResponse {
    pub id: String,
}

/// Request listing entry for the master console (no credential field)
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceRequestDto {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub contact_name: String,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub organization: Option<String>,
    pub message: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub processed_by: Option<String>,
}

impl From<WorkspaceRequest> for WorkspaceRequestDto {
    fn from(r: WorkspaceRequest) -> Self {
        Self {
            id: r.id.to_string(),
            name: r.name,
            slug: r.slug.as_str().to_string(),
            contact_name: r.contact_name,
            contact_email: r.contact_email,
            contact_phone: r.contact_phone,
            organization: r.organization,
            message: r.message,
            status: r.status.as_str().to_string(),
            created_at: r.created_at,
            processed_at: r.processed_at,
            processed_by: r.processed_by,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveResponse {
    pub workspace_id: String,
}

// ============================================================================
// Maintenance
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetentionRunResponse {
    pub summary: RetentionSummary,
}
