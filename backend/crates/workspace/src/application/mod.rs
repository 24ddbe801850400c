pub mod config;
pub mod login;
pub mod master;
pub mod requests;
pub mod retention;

pub use config::WorkspaceConfig;
pub use login::LoginUseCase;
pub use master::{MasterAuthUseCase, WorkspaceAdminUseCase};
pub use requests::WorkspaceRequestsUseCase;
pub use retention::{RetentionSummary, RetentionSweeper};
