//! Elusiv demo wallet core
//!
//! Bootstraps a session (keypair, connection, privacy SDK handle), queries the
//! shielded balance and runs the top-up and send workflows behind
//! [`WalletService`].

pub mod balance;
pub mod error;
pub mod service;
pub mod session;
pub mod settings;
pub mod state;
pub mod workflow;

#[cfg(test)]
mod tests;

pub use balance::fetch_private_balance;
pub use error::{BootstrapError, DisabledReason, WorkflowError};
pub use service::WalletService;
pub use session::{Bootstrapper, KeySource, Session, connector_for};
pub use settings::WalletSettings;
pub use state::{AppState, BalanceView, Readiness, StateEvent};
pub use workflow::{Workflow, WorkflowPhase};
