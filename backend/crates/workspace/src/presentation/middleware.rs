//! Authorization Middleware
//!
//! Two independent gates composed per route:
//! 1. Tenant resolution: the path slug must name an existing workspace
//!    (404 otherwise), which is attached to the request as
//!    [`CurrentWorkspace`].
//! 2. Principal checks: the bearer token in the principal's header must
//!    verify AND its scoping claims must match the resolved resource.
//!    A cryptographically valid token for workspace A is rejected with
//!    403 on workspace B's routes.

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use platform::token::{Principal, TokenClaims, TokenService};

use crate::application::config::WorkspaceConfig;
use crate::domain::entity::workspace::Workspace;
use crate::domain::repository::WorkspaceRepository;
use crate::error::{WorkspaceError, WorkspaceResult};

/// Bearer token headers, one per principal type
pub const MASTER_TOKEN_HEADER: &str = "x-master-token";
pub const WORKSPACE_TOKEN_HEADER: &str = "x-workspace-token";
pub const EXPERT_TOKEN_HEADER: &str = "x-expert-token";

/// Middleware state
#[derive(Clone)]
pub struct GuardState<R>
where
    R: WorkspaceRepository + Clone + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub config: Arc<WorkspaceConfig>,
}

/// The workspace resolved from the request path, attached as an extension
#[derive(Clone)]
pub struct CurrentWorkspace(pub Arc<Workspace>);

fn bearer<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Middleware that resolves the `{slug}` path parameter to a workspace.
///
/// An unknown slug is a hard 404, never a silent "no tenant": every
/// downstream authorization decision needs a concrete workspace.
pub async fn resolve_workspace<R>(
    State(state): State<GuardState<R>>,
    Path(params): Path<HashMap<String, String>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, Response>
where
    R: WorkspaceRepository + Clone + Send + Sync + 'static,
{
    let slug = params.get("slug").map(String::as_str).unwrap_or_default();

    let workspace = match state.repo.find_by_slug(slug).await {
        Ok(Some(workspace)) => workspace,
        Ok(None) => return Err(WorkspaceError::WorkspaceNotFound.into_response()),
        Err(e) => return Err(e.into_response()),
    };

    req.extensions_mut()
        .insert(CurrentWorkspace(Arc::new(workspace)));

    Ok(next.run(req).await)
}

/// Middleware that requires a valid master token
pub async fn require_master<R>(
    State(state): State<GuardState<R>>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, Response>
where
    R: WorkspaceRepository + Clone + Send + Sync + 'static,
{
    let claims = bearer(req.headers(), MASTER_TOKEN_HEADER)
        .and_then(|token| state.config.token_service.verify(token));

    match claims {
        Some(claims) if claims.principal == Principal::Master => Ok(next.run(req).await),
        _ => Err(WorkspaceError::InvalidCredentials.into_response()),
    }
}

/// Middleware that requires a workspace token scoped to the resolved
/// workspace. Must run after [`resolve_workspace`].
pub async fn require_workspace_auth<R>(
    State(state): State<GuardState<R>>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, Response>
where
    R: WorkspaceRepository + Clone + Send + Sync + 'static,
{
    let Some(CurrentWorkspace(workspace)) = req.extensions().get::<CurrentWorkspace>() else {
        return Err(
            WorkspaceError::Internal("Workspace not resolved before auth".to_string())
                .into_response(),
        );
    };

    if let Err(e) = authorize_workspace(req.headers(), &state.config.token_service, workspace) {
        return Err(e.into_response());
    }

    Ok(next.run(req).await)
}

/// Extract and verify a workspace token, binding it to the resolved
/// workspace. Shared by the middleware and by handlers that gate single
/// methods on an otherwise public path.
pub fn authorize_workspace(
    headers: &HeaderMap,
    token_service: &TokenService,
    workspace: &Workspace,
) -> WorkspaceResult<TokenClaims> {
    let claims = bearer(headers, WORKSPACE_TOKEN_HEADER)
        .and_then(|token| token_service.verify(token))
        .ok_or(WorkspaceError::InvalidCredentials)?;

    check_workspace_claims(&claims, workspace)?;

    Ok(claims)
}

/// Verify that workspace claims bind to the resolved workspace.
///
/// Wrong principal type reads as "not authenticated as a workspace" (401);
/// a valid workspace token for a different workspace is a scope error (403).
pub fn check_workspace_claims(
    claims: &TokenClaims,
    workspace: &Workspace,
) -> WorkspaceResult<()> {
    if claims.principal != Principal::Workspace {
        return Err(WorkspaceError::InvalidCredentials);
    }

    let workspace_id = workspace.id.to_string();
    if claims.slug.as_deref() != Some(workspace.slug.as_str())
        || claims.workspace_id.as_deref() != Some(workspace_id.as_str())
    {
        return Err(WorkspaceError::WrongScope);
    }

    Ok(())
}

/// Verify an expert token against all three dimensions: principal type,
/// workspace binding, and the expert id from the path.
pub fn authorize_expert(
    headers: &HeaderMap,
    token_service: &TokenService,
    workspace: &Workspace,
    expert_id: &str,
) -> WorkspaceResult<TokenClaims> {
    let claims = bearer(headers, EXPERT_TOKEN_HEADER)
        .and_then(|token| token_service.verify(token))
        .ok_or(WorkspaceError::InvalidCredentials)?;

    if claims.principal != Principal::Expert {
        return Err(WorkspaceError::InvalidCredentials);
    }

    let workspace_id = workspace.id.to_string();
    if claims.slug.as_deref() != Some(workspace.slug.as_str())
        || claims.workspace_id.as_deref() != Some(workspace_id.as_str())
        || claims.expert_id.as_deref() != Some(expert_id)
    {
        return Err(WorkspaceError::WrongScope);
    }

    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::slug::Slug;
    use axum::http::HeaderValue;
    use std::time::Duration;

    fn workspace(slug: &str) -> Workspace {
        Workspace::new(
            format!("{slug} workspace"),
            Slug::new(slug).unwrap(),
            "pw".to_string(),
        )
    }

    fn config() -> WorkspaceConfig {
        WorkspaceConfig::new(b"guard-test-secret".to_vec())
    }

    #[test]
    fn test_workspace_claims_accept_own_workspace() {
        let ws = workspace("acme");
        let claims = TokenClaims::workspace(ws.id.to_string(), "acme");
        assert!(check_workspace_claims(&claims, &ws).is_ok());
    }

    #[test]
    fn test_workspace_claims_reject_other_tenant() {
        // Valid token for workspace A used against workspace B: 403
        let a = workspace("tenant-a");
        let b = workspace("tenant-b");
        let claims = TokenClaims::workspace(a.id.to_string(), "tenant-a");

        let err = check_workspace_claims(&claims, &b).unwrap_err();
        assert!(matches!(err, WorkspaceError::WrongScope));
        assert_eq!(err.status_code(), 403);
    }

    #[test]
    fn test_workspace_claims_reject_forged_slug() {
        // Token carries B's slug but A's id: still rejected
        let a = workspace("tenant-a");
        let b = workspace("tenant-b");
        let claims = TokenClaims::workspace(a.id.to_string(), "tenant-b");

        assert!(check_workspace_claims(&claims, &b).is_err());
    }

    #[test]
    fn test_workspace_claims_reject_wrong_principal() {
        let ws = workspace("acme");
        let claims = TokenClaims::master();
        let err = check_workspace_claims(&claims, &ws).unwrap_err();
        assert!(matches!(err, WorkspaceError::InvalidCredentials));
        assert_eq!(err.status_code(), 401);
    }

    #[test]
    fn test_authorize_expert_checks_all_dimensions() {
        let config = config();
        let ws = workspace("acme");
        let expert_id = "7f7b0f3a-0000-4000-8000-000000000001";

        let token = config.token_service.issue(
            TokenClaims::expert(expert_id, ws.id.to_string(), "acme"),
            Duration::from_secs(7200),
        );
        let mut headers = HeaderMap::new();
        headers.insert(
            EXPERT_TOKEN_HEADER,
            HeaderValue::from_str(&token).unwrap(),
        );

        // Matching expert: allowed
        let claims = authorize_expert(&headers, &config.token_service, &ws, expert_id).unwrap();
        assert_eq!(claims.expert_id.as_deref(), Some(expert_id));

        // Same workspace, different expert id: 403
        let err =
            authorize_expert(&headers, &config.token_service, &ws, "another-expert").unwrap_err();
        assert!(matches!(err, WorkspaceError::WrongScope));

        // Different workspace: 403
        let other = workspace("other");
        let err = authorize_expert(&headers, &config.token_service, &other, expert_id).unwrap_err();
        assert!(matches!(err, WorkspaceError::WrongScope));
    }

    #[test]
    fn test_authorize_expert_rejects_workspace_token() {
        let config = config();
        let ws = workspace("acme");

        // A workspace token in the expert header is not expert auth
        let token = config.token_service.issue(
            TokenClaims::workspace(ws.id.to_string(), "acme"),
            Duration::from_secs(3600),
        );
        let mut headers = HeaderMap::new();
        headers.insert(
            EXPERT_TOKEN_HEADER,
            HeaderValue::from_str(&token).unwrap(),
        );

        let err = authorize_expert(&headers, &config.token_service, &ws, "ex-1").unwrap_err();
        assert!(matches!(err, WorkspaceError::InvalidCredentials));
    }

    #[test]
    fn test_authorize_expert_missing_or_garbage_token() {
        let config = config();
        let ws = workspace("acme");

        let headers = HeaderMap::new();
        assert!(matches!(
            authorize_expert(&headers, &config.token_service, &ws, "ex-1"),
            Err(WorkspaceError::InvalidCredentials)
        ));

        let mut headers = HeaderMap::new();
        headers.insert(EXPERT_TOKEN_HEADER, HeaderValue::from_static("garbage"));
        assert!(matches!(
            authorize_expert(&headers, &config.token_service, &ws, "ex-1"),
            Err(WorkspaceError::InvalidCredentials)
        ));
    }
}
