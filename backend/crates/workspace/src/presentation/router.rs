//! Workspace Routers
//!
//! Route tables for the master console, the tenant-scoped workspace routes
//! and the public workspace-request form. The tenant-scoped router expects
//! [`resolve_workspace`](crate::presentation::middleware::resolve_workspace)
//! to be applied around it by the composition root.

use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};
use std::sync::Arc;

use crate::application::config::WorkspaceConfig;
use crate::infra::audit::AuditLogger;
use crate::infra::rate_limit::SqliteRateLimitStore;
use crate::infra::sqlite::SqliteWorkspaceRepository;
use crate::presentation::handlers::{self, WorkspaceAppState};
use crate::presentation::middleware::{GuardState, require_master, require_workspace_auth};

type Repo = SqliteWorkspaceRepository;
type Limit = SqliteRateLimitStore;

/// Build the shared handler state
pub fn app_state(
    repo: Repo,
    limiter: Limit,
    config: Arc<WorkspaceConfig>,
    audit: AuditLogger,
) -> WorkspaceAppState<Repo, Limit> {
    WorkspaceAppState {
        repo: Arc::new(repo),
        limiter: Arc::new(limiter),
        config,
        audit,
    }
}

/// Guard state derived from the handler state
pub fn guard_state(state: &WorkspaceAppState<Repo, Limit>) -> GuardState<Repo> {
    GuardState {
        repo: state.repo.clone(),
        config: state.config.clone(),
    }
}

/// Master console router (`/api/master`)
pub fn master_router(state: WorkspaceAppState<Repo, Limit>) -> Router {
    let guard = guard_state(&state);

    let protected = Router::new()
        .route("/verify", get(handlers::master_verify))
        .route(
            "/workspaces",
            get(handlers::list_workspaces::<Repo, Limit>)
                .post(handlers::create_workspace::<Repo, Limit>),
        )
        .route(
            "/workspaces/{id}",
            put(handlers::update_workspace::<Repo, Limit>)
                .delete(handlers::delete_workspace::<Repo, Limit>),
        )
        .route(
            "/workspace-requests",
            get(handlers::list_workspace_requests::<Repo, Limit>),
        )
        .route(
            "/workspace-requests/{id}/approve",
            post(handlers::approve_workspace_request::<Repo, Limit>),
        )
        .route(
            "/workspace-requests/{id}/reject",
            post(handlers::reject_workspace_request::<Repo, Limit>),
        )
        .route(
            "/workspace-requests/{id}",
            delete(handlers::delete_workspace_request::<Repo, Limit>),
        )
        .route(
            "/maintenance/retention-run",
            post(handlers::run_retention::<Repo, Limit>),
        )
        .route_layer(middleware::from_fn_with_state(
            guard,
            require_master::<Repo>,
        ));

    Router::new()
        .route("/auth", post(handlers::master_auth::<Repo, Limit>))
        .merge(protected)
        .with_state(state)
}

/// Tenant-scoped workspace router, nested under `/api/workspaces/{slug}`
pub fn workspace_router(state: WorkspaceAppState<Repo, Limit>) -> Router {
    let guard = guard_state(&state);

    let protected = Router::new()
        .route("/verify", get(handlers::workspace_verify))
        .route(
            "/settings",
            get(handlers::get_settings).put(handlers::update_settings::<Repo, Limit>),
        )
        .route_layer(middleware::from_fn_with_state(
            guard,
            require_workspace_auth::<Repo>,
        ));

    Router::new()
        .route("/", get(handlers::workspace_info))
        .route("/auth", post(handlers::workspace_auth::<Repo, Limit>))
        .route("/public-settings", get(handlers::public_settings))
        .merge(protected)
        .with_state(state)
}

/// Public workspace application router (`/api/workspace-requests`)
pub fn workspace_request_router(state: WorkspaceAppState<Repo, Limit>) -> Router {
    Router::new()
        .route(
            "/",
            post(handlers::submit_workspace_request::<Repo, Limit>),
        )
        .with_state(state)
}
