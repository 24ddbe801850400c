//! HTTP Handlers
//!
//! All routes are tenant-scoped and run behind `resolve_workspace`.
//! Workspace-side mutations verify the workspace token, expert-side
//! transitions verify the expert token (all three claim dimensions), and
//! the voting endpoints stay public behind the voter-password gate.

use axum::Json;
use axum::extract::{ConnectInfo, Extension, Path, State};
use axum::http::{HeaderMap, StatusCode};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use uuid::Uuid;

use kernel::id::{Id, SlotId};
use platform::client::RequestMeta;
use workspace::presentation::handlers::Limiter;
use workspace::presentation::middleware::{CurrentWorkspace, authorize_expert, authorize_workspace};

use crate::application::config::SchedulingConfig;
use crate::application::expert_auth::ExpertAuthUseCase;
use crate::application::experts::{ExpertAdminUseCase, ExpertUpsertInput};
use crate::application::lifecycle::LifecycleUseCase;
use crate::application::slots::SlotUseCase;
use crate::application::voting::VotingUseCase;
use crate::domain::repository::SchedulingStore;
use crate::error::SchedulingResult;
use crate::presentation::dto::{
    AddSlotRequest, AddSlotResponse, ConfirmRequest, ConfirmResponse, ExpertAuthRequest,
    ExpertAuthResponse, ExpertDto, PublicExpertDto, SelectSlotRequest, SelectSlotResponse,
    StatusResponse, UpsertExpertRequest, UpsertExpertResponse, VerifyVoterPasswordRequest,
    VerifyVoterPasswordResponse, VoteRequest,
};
use workspace::infra::audit::AuditLogger;

/// Shared state for scheduling handlers
#[derive(Clone)]
pub struct SchedulingAppState<R, L>
where
    R: SchedulingStore,
    L: Limiter,
{
    pub repo: Arc<R>,
    pub limiter: Arc<L>,
    pub config: Arc<SchedulingConfig>,
    pub audit: AuditLogger,
}

#[derive(Debug, Deserialize)]
pub struct ExpertPath {
    pub id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct SlotPath {
    pub id: Uuid,
    pub slot_id: Uuid,
}

fn request_meta(headers: &HeaderMap, addr: SocketAddr) -> RequestMeta {
    RequestMeta::from_headers(headers, Some(addr.ip()))
}

// ============================================================================
// Expert CRUD
// ============================================================================

/// GET /api/workspaces/{slug}/experts (workspace auth)
pub async fn list_experts<R, L>(
    State(state): State<SchedulingAppState<R, L>>,
    Extension(CurrentWorkspace(workspace)): Extension<CurrentWorkspace>,
    headers: HeaderMap,
) -> SchedulingResult<Json<Vec<ExpertDto>>>
where
    R: SchedulingStore,
    L: Limiter,
{
    authorize_workspace(&headers, &state.config.token_service, &workspace)?;

    let use_case = ExpertAdminUseCase::new(state.repo.clone(), state.audit.clone());
    let details = use_case.list(&workspace.id).await?;

    Ok(Json(details.iter().map(ExpertDto::from).collect()))
}

/// POST /api/workspaces/{slug}/experts (workspace auth)
pub async fn upsert_expert<R, L>(
    State(state): State<SchedulingAppState<R, L>>,
    Extension(CurrentWorkspace(workspace)): Extension<CurrentWorkspace>,
    headers: HeaderMap,
    Json(req): Json<UpsertExpertRequest>,
) -> SchedulingResult<Json<UpsertExpertResponse>>
where
    R: SchedulingStore,
    L: Limiter,
{
    authorize_workspace(&headers, &state.config.token_service, &workspace)?;

    let use_case = ExpertAdminUseCase::new(state.repo.clone(), state.audit.clone());
    let expert = use_case
        .upsert(
            &workspace.id,
            ExpertUpsertInput {
                id: req.id,
                name: req.name,
                organization: req.organization,
                position: req.position,
                email: req.email,
                phone: req.phone,
                fee: req.fee,
                password: req.password,
            },
        )
        .await?;

    Ok(Json(UpsertExpertResponse {
        id: expert.id.to_string(),
    }))
}

/// GET /api/workspaces/{slug}/experts/{id} (public, redacted)
pub async fn get_expert_public<R, L>(
    State(state): State<SchedulingAppState<R, L>>,
    Extension(CurrentWorkspace(workspace)): Extension<CurrentWorkspace>,
    Path(path): Path<ExpertPath>,
) -> SchedulingResult<Json<PublicExpertDto>>
where
    R: SchedulingStore,
    L: Limiter,
{
    let use_case = ExpertAdminUseCase::new(state.repo.clone(), state.audit.clone());
    let detail = use_case
        .detail(&workspace.id, &Id::from_uuid(path.id))
        .await?;

    Ok(Json(PublicExpertDto::from(&detail)))
}

/// DELETE /api/workspaces/{slug}/experts/{id} (workspace auth)
pub async fn delete_expert<R, L>(
    State(state): State<SchedulingAppState<R, L>>,
    Extension(CurrentWorkspace(workspace)): Extension<CurrentWorkspace>,
    Path(path): Path<ExpertPath>,
    headers: HeaderMap,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
) -> SchedulingResult<StatusCode>
where
    R: SchedulingStore,
    L: Limiter,
{
    authorize_workspace(&headers, &state.config.token_service, &workspace)?;

    let meta = request_meta(&headers, addr);
    let use_case = ExpertAdminUseCase::new(state.repo.clone(), state.audit.clone());
    use_case
        .delete(&workspace.id, &Id::from_uuid(path.id), &meta)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Slots
// ============================================================================

/// POST /api/workspaces/{slug}/experts/{id}/slots (workspace auth)
pub async fn add_slot<R, L>(
    State(state): State<SchedulingAppState<R, L>>,
    Extension(CurrentWorkspace(workspace)): Extension<CurrentWorkspace>,
    Path(path): Path<ExpertPath>,
    headers: HeaderMap,
    Json(req): Json<AddSlotRequest>,
) -> SchedulingResult<Json<AddSlotResponse>>
where
    R: SchedulingStore,
    L: Limiter,
{
    authorize_workspace(&headers, &state.config.token_service, &workspace)?;

    let use_case = SlotUseCase::new(state.repo.clone());
    let slot = use_case
        .add_slot(&workspace.id, &Id::from_uuid(path.id), &req.date, &req.time)
        .await?;

    Ok(Json(AddSlotResponse {
        id: slot.id.to_string(),
        date: slot.date,
        time: slot.time,
    }))
}

/// DELETE /api/workspaces/{slug}/experts/{id}/slots/{slot_id} (workspace auth)
pub async fn delete_slot<R, L>(
    State(state): State<SchedulingAppState<R, L>>,
    Extension(CurrentWorkspace(workspace)): Extension<CurrentWorkspace>,
    Path(path): Path<SlotPath>,
    headers: HeaderMap,
) -> SchedulingResult<StatusCode>
where
    R: SchedulingStore,
    L: Limiter,
{
    authorize_workspace(&headers, &state.config.token_service, &workspace)?;

    let use_case = SlotUseCase::new(state.repo.clone());
    use_case
        .delete_slot(
            &workspace.id,
            &Id::from_uuid(path.id),
            &Id::from_uuid(path.slot_id),
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Voting (public)
// ============================================================================

/// POST /api/workspaces/{slug}/experts/{id}/verify-password
pub async fn verify_voter_password<R, L>(
    State(state): State<SchedulingAppState<R, L>>,
    Extension(CurrentWorkspace(workspace)): Extension<CurrentWorkspace>,
    Path(path): Path<ExpertPath>,
    headers: HeaderMap,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(req): Json<VerifyVoterPasswordRequest>,
) -> SchedulingResult<Json<VerifyVoterPasswordResponse>>
where
    R: SchedulingStore,
    L: Limiter,
{
    let meta = request_meta(&headers, addr);
    let use_case = VotingUseCase::new(
        state.repo.clone(),
        state.limiter.clone(),
        state.config.clone(),
    );

    let outcome = use_case
        .verify_voter_password(
            &workspace.id,
            &Id::from_uuid(path.id),
            &req.voter_name,
            &req.password,
            &meta,
        )
        .await?;

    Ok(Json(VerifyVoterPasswordResponse {
        verified: true,
        is_new: outcome.is_new,
    }))
}

/// POST /api/workspaces/{slug}/experts/{id}/vote
pub async fn vote<R, L>(
    State(state): State<SchedulingAppState<R, L>>,
    Extension(CurrentWorkspace(workspace)): Extension<CurrentWorkspace>,
    Path(path): Path<ExpertPath>,
    Json(req): Json<VoteRequest>,
) -> SchedulingResult<StatusCode>
where
    R: SchedulingStore,
    L: Limiter,
{
    let slot_ids: Vec<SlotId> = req.selected_slot_ids.iter().map(|id| Id::from_uuid(*id)).collect();

    let use_case = VotingUseCase::new(
        state.repo.clone(),
        state.limiter.clone(),
        state.config.clone(),
    );
    use_case
        .vote(
            &workspace.id,
            &Id::from_uuid(path.id),
            &req.voter_name,
            &slot_ids,
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Expert auth (public)
// ============================================================================

/// POST /api/workspaces/{slug}/experts/{id}/auth
pub async fn expert_auth<R, L>(
    State(state): State<SchedulingAppState<R, L>>,
    Extension(CurrentWorkspace(workspace)): Extension<CurrentWorkspace>,
    Path(path): Path<ExpertPath>,
    headers: HeaderMap,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(req): Json<ExpertAuthRequest>,
) -> SchedulingResult<Json<ExpertAuthResponse>>
where
    R: SchedulingStore,
    L: Limiter,
{
    let meta = request_meta(&headers, addr);
    let use_case = ExpertAuthUseCase::new(
        state.repo.clone(),
        state.limiter.clone(),
        state.config.clone(),
        state.audit.clone(),
    );

    let token = use_case
        .authenticate(&workspace, &Id::from_uuid(path.id), &req.password, &meta)
        .await?;

    Ok(Json(ExpertAuthResponse { token }))
}

// ============================================================================
// Lifecycle: workspace side
// ============================================================================

/// POST /api/workspaces/{slug}/experts/{id}/start-polling (workspace auth)
pub async fn start_polling<R, L>(
    State(state): State<SchedulingAppState<R, L>>,
    Extension(CurrentWorkspace(workspace)): Extension<CurrentWorkspace>,
    Path(path): Path<ExpertPath>,
    headers: HeaderMap,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
) -> SchedulingResult<Json<StatusResponse>>
where
    R: SchedulingStore,
    L: Limiter,
{
    authorize_workspace(&headers, &state.config.token_service, &workspace)?;

    let meta = request_meta(&headers, addr);
    let use_case = LifecycleUseCase::new(state.repo.clone(), state.audit.clone());
    let expert = use_case
        .start_polling(&workspace.id, &Id::from_uuid(path.id), &meta)
        .await?;

    Ok(Json(StatusResponse {
        status: expert.status.to_string(),
    }))
}

/// POST /api/workspaces/{slug}/experts/{id}/confirm (workspace auth)
pub async fn confirm_slots<R, L>(
    State(state): State<SchedulingAppState<R, L>>,
    Extension(CurrentWorkspace(workspace)): Extension<CurrentWorkspace>,
    Path(path): Path<ExpertPath>,
    headers: HeaderMap,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(req): Json<ConfirmRequest>,
) -> SchedulingResult<Json<ConfirmResponse>>
where
    R: SchedulingStore,
    L: Limiter,
{
    authorize_workspace(&headers, &state.config.token_service, &workspace)?;

    let meta = request_meta(&headers, addr);
    let slot_ids: Vec<SlotId> = req.slot_ids.iter().map(|id| Id::from_uuid(*id)).collect();

    let use_case = LifecycleUseCase::new(state.repo.clone(), state.audit.clone());
    let confirmed_slots = use_case
        .confirm(&workspace.id, &Id::from_uuid(path.id), &slot_ids, &meta)
        .await?;

    Ok(Json(ConfirmResponse { confirmed_slots }))
}

/// POST /api/workspaces/{slug}/experts/{id}/reset-confirmation (workspace auth)
pub async fn reset_confirmation<R, L>(
    State(state): State<SchedulingAppState<R, L>>,
    Extension(CurrentWorkspace(workspace)): Extension<CurrentWorkspace>,
    Path(path): Path<ExpertPath>,
    headers: HeaderMap,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
) -> SchedulingResult<Json<StatusResponse>>
where
    R: SchedulingStore,
    L: Limiter,
{
    authorize_workspace(&headers, &state.config.token_service, &workspace)?;

    let meta = request_meta(&headers, addr);
    let use_case = LifecycleUseCase::new(state.repo.clone(), state.audit.clone());
    let expert = use_case
        .reset(&workspace.id, &Id::from_uuid(path.id), &meta)
        .await?;

    Ok(Json(StatusResponse {
        status: expert.status.to_string(),
    }))
}

// ============================================================================
// Lifecycle: expert side
// ============================================================================

/// POST /api/workspaces/{slug}/experts/{id}/select-slot (expert token)
pub async fn select_slot<R, L>(
    State(state): State<SchedulingAppState<R, L>>,
    Extension(CurrentWorkspace(workspace)): Extension<CurrentWorkspace>,
    Path(path): Path<ExpertPath>,
    headers: HeaderMap,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(req): Json<SelectSlotRequest>,
) -> SchedulingResult<Json<SelectSlotResponse>>
where
    R: SchedulingStore,
    L: Limiter,
{
    authorize_expert(
        &headers,
        &state.config.token_service,
        &workspace,
        &path.id.to_string(),
    )?;

    let meta = request_meta(&headers, addr);
    let use_case = LifecycleUseCase::new(state.repo.clone(), state.audit.clone());
    let selected_slot = use_case
        .select_slot(&workspace.id, &Id::from_uuid(path.id), &req.slot_id, &meta)
        .await?;

    Ok(Json(SelectSlotResponse { selected_slot }))
}

/// POST /api/workspaces/{slug}/experts/{id}/no-available-schedule (expert token)
pub async fn no_available_schedule<R, L>(
    State(state): State<SchedulingAppState<R, L>>,
    Extension(CurrentWorkspace(workspace)): Extension<CurrentWorkspace>,
    Path(path): Path<ExpertPath>,
    headers: HeaderMap,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
) -> SchedulingResult<Json<StatusResponse>>
where
    R: SchedulingStore,
    L: Limiter,
{
    authorize_expert(
        &headers,
        &state.config.token_service,
        &workspace,
        &path.id.to_string(),
    )?;

    let meta = request_meta(&headers, addr);
    let use_case = LifecycleUseCase::new(state.repo.clone(), state.audit.clone());
    use_case
        .decline(&workspace.id, &Id::from_uuid(path.id), &meta)
        .await?;

    Ok(Json(StatusResponse {
        status: crate::domain::status::ExpertStatus::Unavailable.to_string(),
    }))
}
