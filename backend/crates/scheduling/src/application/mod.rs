pub mod config;
pub mod expert_auth;
pub mod experts;
pub mod lifecycle;
pub mod slots;
pub mod voting;

pub use config::SchedulingConfig;
pub use expert_auth::ExpertAuthUseCase;
pub use experts::{ExpertAdminUseCase, ExpertDetail, ExpertUpsertInput};
pub use lifecycle::LifecycleUseCase;
pub use slots::SlotUseCase;
pub use voting::{VoterPasswordOutcome, VotingUseCase};
