//! Scheduling Router
//!
//! Tenant-scoped routes, nested under `/api/workspaces/{slug}` by the
//! composition root together with the workspace router. The caller applies
//! `resolve_workspace` around the nested tree; per-route principal checks
//! happen inside the handlers (workspace token, expert token, or none).

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use workspace::infra::audit::AuditLogger;
use workspace::infra::rate_limit::SqliteRateLimitStore;

use crate::application::config::SchedulingConfig;
use crate::infra::sqlite::SqliteSchedulingRepository;
use crate::presentation::handlers::{self, SchedulingAppState};

type Repo = SqliteSchedulingRepository;
type Limit = SqliteRateLimitStore;

/// Build the shared handler state
pub fn app_state(
    repo: Repo,
    limiter: Limit,
    config: Arc<SchedulingConfig>,
    audit: AuditLogger,
) -> SchedulingAppState<Repo, Limit> {
    SchedulingAppState {
        repo: Arc::new(repo),
        limiter: Arc::new(limiter),
        config,
        audit,
    }
}

/// Scheduling routes (relative to the workspace slug)
pub fn scheduling_router(state: SchedulingAppState<Repo, Limit>) -> Router {
    Router::new()
        .route(
            "/experts",
            get(handlers::list_experts::<Repo, Limit>)
                .post(handlers::upsert_expert::<Repo, Limit>),
        )
        .route(
            "/experts/{id}",
            get(handlers::get_expert_public::<Repo, Limit>)
                .delete(handlers::delete_expert::<Repo, Limit>),
        )
        .route("/experts/{id}/slots", post(handlers::add_slot::<Repo, Limit>))
        .route(
            "/experts/{id}/slots/{slot_id}",
            axum::routing::delete(handlers::delete_slot::<Repo, Limit>),
        )
        .route("/experts/{id}/auth", post(handlers::expert_auth::<Repo, Limit>))
        .route(
            "/experts/{id}/verify-password",
            post(handlers::verify_voter_password::<Repo, Limit>),
        )
        .route("/experts/{id}/vote", post(handlers::vote::<Repo, Limit>))
        .route(
            "/experts/{id}/start-polling",
            post(handlers::start_polling::<Repo, Limit>),
        )
        .route(
            "/experts/{id}/confirm",
            post(handlers::confirm_slots::<Repo, Limit>),
        )
        .route(
            "/experts/{id}/reset-confirmation",
            post(handlers::reset_confirmation::<Repo, Limit>),
        )
        .route(
            "/experts/{id}/select-slot",
            post(handlers::select_slot::<Repo, Limit>),
        )
        .route(
            "/experts/{id}/no-available-schedule",
            post(handlers::no_available_schedule::<Repo, Limit>),
        )
        .with_state(state)
}
