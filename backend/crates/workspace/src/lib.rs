//! Workspace (Tenant) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, repository traits
//! - `application/` - Use cases and application services
//! - `infra/` - Database implementations
//! - `presentation/` - HTTP handlers, DTOs, middleware, router
//!
//! ## Features
//! - Password-gated multi-tenant workspaces resolved by URL slug
//! - Master-operator administration (workspace CRUD, request review)
//! - Public workspace applications with an approval lifecycle
//! - Append-only audit log for privileged actions
//! - Retention sweeping with one protected default workspace
//!
//! ## Security Model
//! - Credentials stored as PBKDF2 hashes; legacy plaintext rows are
//!   migrated transparently on the first successful login
//! - Signed bearer tokens per principal (master / workspace / expert)
//! - Failed logins rate-limited per workspace + client IP

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::WorkspaceConfig;
pub use error::{WorkspaceError, WorkspaceResult};
pub use infra::audit::AuditLogger;
pub use infra::rate_limit::SqliteRateLimitStore;
pub use infra::sqlite::SqliteWorkspaceRepository;
pub use presentation::middleware::{CurrentWorkspace, GuardState};
pub use presentation::router::{master_router, workspace_request_router, workspace_router};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};
