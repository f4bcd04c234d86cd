pub mod credential_vault;
pub mod diagram_view;
pub mod orchestrator;
pub mod session_controller;
pub mod usage_ledger;

#[cfg(test)]
pub(crate) mod test_support;

pub use credential_vault::CredentialVault;
pub use diagram_view::DiagramView;
pub use orchestrator::{GenerationOrchestrator, GenerationReport, SubmitFailure};
pub use session_controller::SessionController;
pub use usage_ledger::UsageLedger;
