//! HTTP Handlers

use axum::Json;
use axum::extract::{ConnectInfo, Extension, Path, State};
use axum::http::{HeaderMap, StatusCode};
use std::net::SocketAddr;
use std::sync::Arc;
use uuid::Uuid;

use platform::client::RequestMeta;
use platform::rate_limit::AuthRateLimitStore;

use crate::application::config::WorkspaceConfig;
use crate::application::login::LoginUseCase;
use crate::application::master::{
    CreateWorkspaceInput, MasterAuthUseCase, UpdateWorkspaceInput, WorkspaceAdminUseCase,
};
use crate::application::requests::{SubmitRequestInput, WorkspaceRequestsUseCase};
use crate::application::retention::RetentionSweeper;
use crate::domain::entity::audit_log::{ActorType, AuditEntry};
use crate::domain::repository::{
    RetentionRepository, WorkspaceRepository, WorkspaceRequestRepository,
};
use crate::error::WorkspaceResult;
use crate::infra::audit::AuditLogger;
use crate::presentation::dto::{
    ApproveResponse, AuthRequest, AuthResponse, CreateWorkspaceRequest, CreateWorkspaceResponse,
    MasterAuthRequest, MasterAuthResponse, PublicSettingsResponse, RetentionRunResponse,
    SettingsResponse, SubmitWorkspaceRequest, SubmitWorkspaceResponse, UpdateSettingsRequest,
    UpdateWorkspaceRequest, VerifyResponse, WorkspaceInfo, WorkspaceRequestDto,
    WorkspaceSummaryDto,
};
use crate::presentation::middleware::CurrentWorkspace;
use kernel::id::Id;

/// Everything the workspace handlers need from one store
pub trait WorkspaceStore:
    WorkspaceRepository
    + WorkspaceRequestRepository
    + RetentionRepository
    + Clone
    + Send
    + Sync
    + 'static
{
}

impl<T> WorkspaceStore for T where
    T: WorkspaceRepository
        + WorkspaceRequestRepository
        + RetentionRepository
        + Clone
        + Send
        + Sync
        + 'static
{
}

/// Rate limit store bound used across handlers
pub trait Limiter: AuthRateLimitStore + Clone + Send + Sync + 'static {}

impl<T> Limiter for T where T: AuthRateLimitStore + Clone + Send + Sync + 'static {}

/// Shared state for workspace handlers
#[derive(Clone)]
pub struct WorkspaceAppState<R, L>
where
    R: WorkspaceStore,
    L: Limiter,
{
    pub repo: Arc<R>,
    pub limiter: Arc<L>,
    pub config: Arc<WorkspaceConfig>,
    pub audit: AuditLogger,
}

fn request_meta(headers: &HeaderMap, addr: SocketAddr) -> RequestMeta {
    RequestMeta::from_headers(headers, Some(addr.ip()))
}

// ============================================================================
// Workspace (tenant-scoped)
// ============================================================================

/// GET /api/workspaces/{slug}
pub async fn workspace_info(
    Extension(CurrentWorkspace(workspace)): Extension<CurrentWorkspace>,
) -> Json<WorkspaceInfo> {
    Json(WorkspaceInfo::from(workspace.as_ref()))
}

/// POST /api/workspaces/{slug}/auth
pub async fn workspace_auth<R, L>(
    State(state): State<WorkspaceAppState<R, L>>,
    Extension(CurrentWorkspace(workspace)): Extension<CurrentWorkspace>,
    headers: HeaderMap,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(req): Json<AuthRequest>,
) -> WorkspaceResult<Json<AuthResponse>>
where
    R: WorkspaceStore,
    L: Limiter,
{
    let meta = request_meta(&headers, addr);

    let use_case = LoginUseCase::new(
        state.repo.clone(),
        state.limiter.clone(),
        state.config.clone(),
        state.audit.clone(),
    );

    let output = use_case.execute(&workspace, &req.password, &meta).await?;

    Ok(Json(AuthResponse {
        token: output.token,
        workspace: WorkspaceInfo::from(workspace.as_ref()),
    }))
}

/// GET /api/workspaces/{slug}/verify
pub async fn workspace_verify(
    Extension(CurrentWorkspace(workspace)): Extension<CurrentWorkspace>,
) -> Json<VerifyResponse> {
    Json(VerifyResponse {
        valid: true,
        workspace: WorkspaceInfo::from(workspace.as_ref()),
    })
}

/// GET /api/workspaces/{slug}/settings
pub async fn get_settings(
    Extension(CurrentWorkspace(workspace)): Extension<CurrentWorkspace>,
) -> Json<SettingsResponse> {
    Json(SettingsResponse {
        contact_email: workspace.contact_email.clone(),
        contact_phone: workspace.contact_phone.clone(),
        organization: workspace.organization.clone(),
        sender_name: workspace.sender_name.clone(),
    })
}

/// PUT /api/workspaces/{slug}/settings
pub async fn update_settings<R, L>(
    State(state): State<WorkspaceAppState<R, L>>,
    Extension(CurrentWorkspace(workspace)): Extension<CurrentWorkspace>,
    Json(req): Json<UpdateSettingsRequest>,
) -> WorkspaceResult<StatusCode>
where
    R: WorkspaceStore,
    L: Limiter,
{
    let mut updated = (*workspace).clone();

    if let Some(password) = req.password {
        let password = platform::password::validate_new_password(&password)?;
        updated.password = platform::password::hash_password(&password);
    }
    updated.contact_email = req.contact_email;
    updated.contact_phone = req.contact_phone;
    updated.organization = req.organization;
    updated.sender_name = req.sender_name;

    state.repo.update(&updated).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/workspaces/{slug}/public-settings
pub async fn public_settings(
    Extension(CurrentWorkspace(workspace)): Extension<CurrentWorkspace>,
) -> Json<PublicSettingsResponse> {
    Json(PublicSettingsResponse {
        sender_name: workspace.sender_name.clone(),
    })
}

// ============================================================================
// Master
// ============================================================================

/// POST /api/master/auth
pub async fn master_auth<R, L>(
    State(state): State<WorkspaceAppState<R, L>>,
    headers: HeaderMap,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(req): Json<MasterAuthRequest>,
) -> WorkspaceResult<Json<MasterAuthResponse>>
where
    R: WorkspaceStore,
    L: Limiter,
{
    let meta = request_meta(&headers, addr);
    let use_case = MasterAuthUseCase::new(state.config.clone(), state.audit.clone());
    let token = use_case.authenticate(&req.password, &meta).await?;

    Ok(Json(MasterAuthResponse { token }))
}

/// GET /api/master/verify
pub async fn master_verify() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "valid": true }))
}

/// GET /api/master/workspaces
pub async fn list_workspaces<R, L>(
    State(state): State<WorkspaceAppState<R, L>>,
) -> WorkspaceResult<Json<Vec<WorkspaceSummaryDto>>>
where
    R: WorkspaceStore,
    L: Limiter,
{
    let use_case = WorkspaceAdminUseCase::new(state.repo.clone(), state.audit.clone());
    let summaries = use_case.list().await?;

    Ok(Json(summaries.into_iter().map(Into::into).collect()))
}

/// POST /api/master/workspaces
pub async fn create_workspace<R, L>(
    State(state): State<WorkspaceAppState<R, L>>,
    headers: HeaderMap,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(req): Json<CreateWorkspaceRequest>,
) -> WorkspaceResult<Json<CreateWorkspaceResponse>>
where
    R: WorkspaceStore,
    L: Limiter,
{
    let meta = request_meta(&headers, addr);
    let use_case = WorkspaceAdminUseCase::new(state.repo.clone(), state.audit.clone());

    let workspace = use_case
        .create(
            CreateWorkspaceInput {
                name: req.name,
                slug: req.slug,
                password: req.password,
                organization: req.organization,
                sender_name: req.sender_name,
            },
            &meta,
        )
        .await?;

    Ok(Json(CreateWorkspaceResponse {
        id: workspace.id.to_string(),
        slug: workspace.slug.as_str().to_string(),
    }))
}

/// PUT /api/master/workspaces/{id}
pub async fn update_workspace<R, L>(
    State(state): State<WorkspaceAppState<R, L>>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(req): Json<UpdateWorkspaceRequest>,
) -> WorkspaceResult<StatusCode>
where
    R: WorkspaceStore,
    L: Limiter,
{
    let meta = request_meta(&headers, addr);
    let use_case = WorkspaceAdminUseCase::new(state.repo.clone(), state.audit.clone());

    use_case
        .update(
            &Id::from_uuid(id),
            UpdateWorkspaceInput {
                name: req.name,
                password: req.password,
            },
            &meta,
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/master/workspaces/{id}
pub async fn delete_workspace<R, L>(
    State(state): State<WorkspaceAppState<R, L>>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
) -> WorkspaceResult<StatusCode>
where
    R: WorkspaceStore,
    L: Limiter,
{
    let meta = request_meta(&headers, addr);
    let use_case = WorkspaceAdminUseCase::new(state.repo.clone(), state.audit.clone());
    use_case.delete(&Id::from_uuid(id), &meta).await?;

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Workspace requests
// ============================================================================

/// POST /api/workspace-requests (public)
pub async fn submit_workspace_request<R, L>(
    State(state): State<WorkspaceAppState<R, L>>,
    Json(req): Json<SubmitWorkspaceRequest>,
) -> WorkspaceResult<Json<SubmitWorkspaceResponse>>
where
    R: WorkspaceStore,
    L: Limiter,
{
    let use_case = WorkspaceRequestsUseCase::new(state.repo.clone(), state.audit.clone());

    let request = use_case
        .submit(SubmitRequestInput {
            name: req.name,
            slug: req.slug,
            password: req.password,
            contact_name: req.contact_name,
            contact_email: req.contact_email,
            contact_phone: req.contact_phone,
            organization: req.organization,
            message: req.message,
        })
        .await?;

    Ok(Json(SubmitWorkspaceResponse {
        id: request.id.to_string(),
    }))
}

/// GET /api/master/workspace-requests
pub async fn list_workspace_requests<R, L>(
    State(state): State<WorkspaceAppState<R, L>>,
) -> WorkspaceResult<Json<Vec<WorkspaceRequestDto>>>
where
    R: WorkspaceStore,
    L: Limiter,
{
    let use_case = WorkspaceRequestsUseCase::new(state.repo.clone(), state.audit.clone());
    let requests = use_case.list().await?;

    Ok(Json(requests.into_iter().map(Into::into).collect()))
}

/// POST /api/master/workspace-requests/{id}/approve
pub async fn approve_workspace_request<R, L>(
    State(state): State<WorkspaceAppState<R, L>>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
) -> WorkspaceResult<Json<ApproveResponse>>
where
    R: WorkspaceStore,
    L: Limiter,
{
    let meta = request_meta(&headers, addr);
    let use_case = WorkspaceRequestsUseCase::new(state.repo.clone(), state.audit.clone());
    let workspace = use_case.approve(&Id::from_uuid(id), &meta).await?;

    Ok(Json(ApproveResponse {
        workspace_id: workspace.id.to_string(),
    }))
}

/// POST /api/master/workspace-requests/{id}/reject
pub async fn reject_workspace_request<R, L>(
    State(state): State<WorkspaceAppState<R, L>>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
) -> WorkspaceResult<StatusCode>
where
    R: WorkspaceStore,
    L: Limiter,
{
    let meta = request_meta(&headers, addr);
    let use_case = WorkspaceRequestsUseCase::new(state.repo.clone(), state.audit.clone());
    use_case.reject(&Id::from_uuid(id), &meta).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/master/workspace-requests/{id}
pub async fn delete_workspace_request<R, L>(
    State(state): State<WorkspaceAppState<R, L>>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
) -> WorkspaceResult<StatusCode>
where
    R: WorkspaceStore,
    L: Limiter,
{
    let meta = request_meta(&headers, addr);
    let use_case = WorkspaceRequestsUseCase::new(state.repo.clone(), state.audit.clone());
    use_case.delete(&Id::from_uuid(id), &meta).await?;

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Maintenance
// ============================================================================

/// POST /api/master/maintenance/retention-run
pub async fn run_retention<R, L>(
    State(state): State<WorkspaceAppState<R, L>>,
    headers: HeaderMap,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
) -> WorkspaceResult<Json<RetentionRunResponse>>
where
    R: WorkspaceStore,
    L: Limiter,
{
    let meta = request_meta(&headers, addr);
    let sweeper = RetentionSweeper::new(state.repo.clone(), state.config.retention_years);
    let summary = sweeper.run().await?;

    state.audit.record(
        AuditEntry::new(ActorType::Master, "master", "retention_run")
            .with_target("system", "retention")
            .with_metadata(serde_json::to_value(&summary).unwrap_or_default())
            .with_request(&meta),
    );

    Ok(Json(RetentionRunResponse { summary }))
}
