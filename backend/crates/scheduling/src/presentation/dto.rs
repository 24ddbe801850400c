//! API DTOs (Data Transfer Objects)
//!
//! Two response shapes exist for experts: the authenticated workspace view
//! (with voter names) and the public view (tallies only). Neither carries
//! credential material.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::experts::ExpertDetail;
use crate::domain::entity::expert::SlotSnapshot;
use crate::domain::entity::polling_slot::SlotTally;

// ============================================================================
// Slots
// ============================================================================

/// Slot with voter names (workspace view)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotDto {
    pub id: String,
    pub date: String,
    pub time: String,
    pub votes: usize,
    pub voters: Vec<String>,
}

impl From<&SlotTally> for SlotDto {
    fn from(tally: &SlotTally) -> Self {
        Self {
            id: tally.slot.id.to_string(),
            date: tally.slot.date.clone(),
            time: tally.slot.time.clone(),
            votes: tally.votes(),
            voters: tally.voters.clone(),
        }
    }
}

/// Slot with tally only (public view, no voter names)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicSlotDto {
    pub id: String,
    pub date: String,
    pub time: String,
    pub votes: usize,
}

impl From<&SlotTally> for PublicSlotDto {
    fn from(tally: &SlotTally) -> Self {
        Self {
            id: tally.slot.id.to_string(),
            date: tally.slot.date.clone(),
            time: tally.slot.time.clone(),
            votes: tally.votes(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddSlotRequest {
    pub date: String,
    pub time: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddSlotResponse {
    pub id: String,
    pub date: String,
    pub time: String,
}

// ============================================================================
// Experts
// ============================================================================

/// Expert with everything the workspace console shows
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpertDto {
    pub id: String,
    pub name: String,
    pub organization: Option<String>,
    pub position: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub fee: Option<String>,
    pub status: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub polling_slots: Vec<SlotDto>,
    pub selected_slot: Option<SlotSnapshot>,
    pub confirmed_slots: Vec<SlotSnapshot>,
}

impl From<&ExpertDetail> for ExpertDto {
    fn from(detail: &ExpertDetail) -> Self {
        let e = &detail.expert;
        Self {
            id: e.id.to_string(),
            name: e.name.clone(),
            organization: e.organization.clone(),
            position: e.position.clone(),
            email: e.email.clone(),
            phone: e.phone.clone(),
            fee: e.fee.clone(),
            status: e.status.to_string(),
            created_at: e.created_at,
            polling_slots: detail.slots.iter().map(SlotDto::from).collect(),
            selected_slot: e.selected_slot.clone(),
            confirmed_slots: e.confirmed_slots.clone(),
        }
    }
}

/// Public expert view: no voter names, no credential material
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicExpertDto {
    pub id: String,
    pub name: String,
    pub organization: Option<String>,
    pub position: Option<String>,
    pub status: String,
    pub polling_slots: Vec<PublicSlotDto>,
    pub selected_slot: Option<SlotSnapshot>,
    pub confirmed_slots: Vec<SlotSnapshot>,
}

impl From<&ExpertDetail> for PublicExpertDto {
    fn from(detail: &ExpertDetail) -> Self {
        let e = &detail.expert;
        Self {
            id: e.id.to_string(),
            name: e.name.clone(),
            organization: e.organization.clone(),
            position: e.position.clone(),
            status: e.status.to_string(),
            polling_slots: detail.slots.iter().map(PublicSlotDto::from).collect(),
            selected_slot: e.selected_slot.clone(),
            confirmed_slots: e.confirmed_slots.clone(),
        }
    }
}

/// Create/update an expert profile. No status or slot fields: the
/// lifecycle endpoints own those.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertExpertRequest {
    pub id: Option<Uuid>,
    pub name: String,
    pub organization: Option<String>,
    pub position: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub fee: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertExpertResponse {
    pub id: String,
}

// ============================================================================
// Voting
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub voter_name: String,
    pub selected_slot_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyVoterPasswordRequest {
    pub voter_name: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyVoterPasswordResponse {
    pub verified: bool,
    /// True when this call established the voter's password
    pub is_new: bool,
}

// ============================================================================
// Expert auth + lifecycle
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpertAuthRequest {
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpertAuthResponse {
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmRequest {
    pub slot_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmResponse {
    pub confirmed_slots: Vec<SlotSnapshot>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectSlotRequest {
    /// Id of a slot in the confirmed shortlist
    pub slot_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectSlotResponse {
    pub selected_slot: SlotSnapshot,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub status: String,
}
