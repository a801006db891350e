use std::fmt;

use elusiv_demo_connection::ConnectionError;
use elusiv_demo_keypair::KeypairError;
use elusiv_demo_privacy::SdkError;
use thiserror::Error;

/// Bootstrap failures are terminal for the session.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("failed to load keypair: {0}")]
    Keypair(#[from] KeypairError),

    #[error("failed to open connection: {0}")]
    Connection(#[from] ConnectionError),

    #[error("failed to initialise privacy SDK: {0}")]
    Sdk(#[from] SdkError),
}

/// Why a workflow trigger was refused without calling the SDK.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisabledReason {
    SessionNotReady,
    InFlight,
    NoRecipient,
    BalanceUnknown,
    ZeroBalance,
}

impl fmt::Display for DisabledReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            DisabledReason::SessionNotReady => "session is not ready",
            DisabledReason::InFlight => "already in progress",
            DisabledReason::NoRecipient => "no recipient configured",
            DisabledReason::BalanceUnknown => "shielded balance is unknown",
            DisabledReason::ZeroBalance => "shielded balance is zero",
        };
        f.write_str(msg)
    }
}

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("disabled: {0}")]
    Disabled(DisabledReason),

    #[error("build failed: {0}")]
    Build(#[source] SdkError),

    #[error("signing failed: {0}")]
    Sign(#[source] SdkError),

    #[error("submission failed: {0}")]
    Submit(#[source] SdkError),

    #[error("balance query failed: {0}")]
    Balance(#[source] SdkError),

    #[error("cancelled")]
    Cancelled,

    #[error("workflow aborted: {0}")]
    Aborted(String),

    #[error("wallet service unavailable")]
    ServiceUnavailable,
}
