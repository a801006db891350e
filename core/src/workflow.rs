//! Top-up and send workflows
//!
//! ```text
//! top-up:  Idle ──▶ Building ──▶ Signing ──▶ Submitting ──▶ Complete
//! send:    Idle ──▶ Building ─────────────▶ Submitting ──▶ Complete
//!                      │            │             │
//!                      └────────────┴─────────────┴──▶ Failed | Cancelled
//! ```
//!
//! The functions here report only the in-flight phases. Terminal phases are
//! derived from the returned `Result` by the caller.

use elusiv_demo_privacy::TokenType;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use tracing::info;

use crate::error::WorkflowError;
use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Workflow {
    TopUp,
    Send,
}

impl Workflow {
    pub fn label(&self) -> &'static str {
        match self {
            Workflow::TopUp => "Top-up",
            Workflow::Send => "Send",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum WorkflowPhase {
    #[default]
    Idle,
    Building,
    Signing,
    Submitting,
    Complete(Signature),
    Failed(String),
    Cancelled,
}

impl WorkflowPhase {
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            WorkflowPhase::Building | WorkflowPhase::Signing | WorkflowPhase::Submitting
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            WorkflowPhase::Idle => "idle",
            WorkflowPhase::Building => "building",
            WorkflowPhase::Signing => "signing",
            WorkflowPhase::Submitting => "submitting",
            WorkflowPhase::Complete(_) => "complete",
            WorkflowPhase::Failed(_) => "failed",
            WorkflowPhase::Cancelled => "cancelled",
        }
    }
}

/// Moves `amount` of the owner's public funds into the shielded balance.
pub async fn top_up<F>(
    session: &Session,
    amount: u64,
    token: TokenType,
    mut on_phase: F,
) -> Result<Signature, WorkflowError>
where
    F: FnMut(WorkflowPhase) + Send,
{
    on_phase(WorkflowPhase::Building);
    let mut tx = session
        .sdk()
        .build_top_up_tx(amount, token)
        .await
        .map_err(WorkflowError::Build)?;

    on_phase(WorkflowPhase::Signing);
    tx.partial_sign(session.keypair())
        .map_err(WorkflowError::Sign)?;

    on_phase(WorkflowPhase::Submitting);
    let receipt = session
        .sdk()
        .send_elusiv_tx(tx)
        .await
        .map_err(WorkflowError::Submit)?;

    info!(signature = %receipt.signature, amount, %token, "Top-up complete");
    Ok(receipt.signature)
}

/// Pays `amount` out of the shielded balance to `recipient`.
///
/// No owner signature: the SDK authorises sends itself.
pub async fn send<F>(
    session: &Session,
    amount: u64,
    recipient: Pubkey,
    token: TokenType,
    mut on_phase: F,
) -> Result<Signature, WorkflowError>
where
    F: FnMut(WorkflowPhase) + Send,
{
    on_phase(WorkflowPhase::Building);
    let tx = session
        .sdk()
        .build_send_tx(amount, recipient, token)
        .await
        .map_err(WorkflowError::Build)?;

    on_phase(WorkflowPhase::Submitting);
    let receipt = session
        .sdk()
        .send_elusiv_tx(tx)
        .await
        .map_err(WorkflowError::Submit)?;

    info!(signature = %receipt.signature, amount, %recipient, %token, "Send complete");
    Ok(receipt.signature)
}
