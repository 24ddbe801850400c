//! Scheduling Backend Module
//!
//! Drives each expert through the polling workflow:
//! candidate slots are proposed, internal members vote on them, the
//! workspace confirms a shortlist, and the expert either selects a final
//! slot or declares themselves unavailable.
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, lifecycle state machine, repository traits
//! - `application/` - Use cases and application services
//! - `infra/` - Database implementations
//! - `presentation/` - HTTP handlers, DTOs, router
//!
//! ## Lifecycle
//! `none → polling → confirmed → registered`, with the side branch
//! `confirmed → unavailable` and a reset edge back to `polling`.
//! Candidate slots freeze once confirmed; voting closes with confirmation.

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::SchedulingConfig;
pub use domain::status::ExpertStatus;
pub use error::{SchedulingError, SchedulingResult};
pub use infra::sqlite::SqliteSchedulingRepository;
pub use presentation::router::scheduling_router;
