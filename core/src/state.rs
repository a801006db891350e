//! Wallet view state
//!
//! One value, changed only through [`AppState::apply`]. Renderers read it and
//! derive which controls are enabled from it.

use elusiv_demo_privacy::TokenType;
use solana_sdk::pubkey::Pubkey;

use crate::error::DisabledReason;
use crate::workflow::{Workflow, WorkflowPhase};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Readiness {
    #[default]
    Loading,
    Ready,
    Failed(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum BalanceView {
    #[default]
    Fetching,
    Known(u64),
    Failed(String),
}

/// Everything that can change the wallet state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateEvent {
    SessionReady { owner: Pubkey, endpoint: String },
    SessionFailed(String),
    BalanceRequested,
    BalanceFetched(u64),
    BalanceFailed(String),
    /// Lamports the owner holds outside the pool
    PublicBalanceFetched(u64),
    Phase(Workflow, WorkflowPhase),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppState {
    pub readiness: Readiness,
    pub owner: Option<Pubkey>,
    pub endpoint: Option<String>,
    pub token: TokenType,
    pub balance: BalanceView,
    /// On-chain lamports as the connection reports them
    pub public_balance: Option<u64>,
    pub top_up: WorkflowPhase,
    pub send: WorkflowPhase,
    pub has_recipient: bool,
    /// Last successful workflow, shown as a notice
    pub notice: Option<String>,
    pub last_error: Option<String>,
}

impl AppState {
    pub fn new(token: TokenType, has_recipient: bool) -> Self {
        Self {
            token,
            has_recipient,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn apply(mut self, event: StateEvent) -> Self {
        match event {
            StateEvent::SessionReady { owner, endpoint } => {
                self.readiness = Readiness::Ready;
                self.owner = Some(owner);
                self.endpoint = Some(endpoint);
            }
            StateEvent::SessionFailed(msg) => {
                self.last_error = Some(format!("Initialisation failed: {msg}"));
                self.readiness = Readiness::Failed(msg);
            }
            StateEvent::BalanceRequested => {
                self.balance = BalanceView::Fetching;
            }
            StateEvent::BalanceFetched(amount) => {
                self.balance = BalanceView::Known(amount);
            }
            StateEvent::BalanceFailed(msg) => {
                self.last_error = Some(format!("Balance query failed: {msg}"));
                self.balance = BalanceView::Failed(msg);
            }
            StateEvent::PublicBalanceFetched(lamports) => {
                self.public_balance = Some(lamports);
            }
            StateEvent::Phase(workflow, phase) => {
                match &phase {
                    WorkflowPhase::Building => {
                        self.notice = None;
                        self.last_error = None;
                    }
                    WorkflowPhase::Complete(signature) => {
                        self.notice = Some(format!("{} complete: {signature}", workflow.label()));
                    }
                    WorkflowPhase::Failed(msg) => {
                        self.last_error = Some(format!("{} failed: {msg}", workflow.label()));
                    }
                    WorkflowPhase::Cancelled => {
                        self.last_error = Some(format!("{} cancelled", workflow.label()));
                    }
                    WorkflowPhase::Idle | WorkflowPhase::Signing | WorkflowPhase::Submitting => {}
                }
                *self.phase_mut(workflow) = phase;
            }
        }
        self
    }

    pub fn phase(&self, workflow: Workflow) -> &WorkflowPhase {
        match workflow {
            Workflow::TopUp => &self.top_up,
            Workflow::Send => &self.send,
        }
    }

    fn phase_mut(&mut self, workflow: Workflow) -> &mut WorkflowPhase {
        match workflow {
            Workflow::TopUp => &mut self.top_up,
            Workflow::Send => &mut self.send,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.readiness == Readiness::Ready
    }

    pub fn known_balance(&self) -> Option<u64> {
        match self.balance {
            BalanceView::Known(amount) => Some(amount),
            _ => None,
        }
    }

    /// `None` when a top-up may start now.
    pub fn top_up_blocker(&self) -> Option<DisabledReason> {
        if !self.is_ready() {
            return Some(DisabledReason::SessionNotReady);
        }
        if self.top_up.is_in_flight() {
            return Some(DisabledReason::InFlight);
        }
        None
    }

    /// `None` when a send may start now.
    pub fn send_blocker(&self) -> Option<DisabledReason> {
        if !self.is_ready() {
            return Some(DisabledReason::SessionNotReady);
        }
        if self.send.is_in_flight() {
            return Some(DisabledReason::InFlight);
        }
        if !self.has_recipient {
            return Some(DisabledReason::NoRecipient);
        }
        match self.balance {
            BalanceView::Known(0) => Some(DisabledReason::ZeroBalance),
            BalanceView::Known(_) => None,
            BalanceView::Fetching | BalanceView::Failed(_) => Some(DisabledReason::BalanceUnknown),
        }
    }

    pub fn top_up_enabled(&self) -> bool {
        self.top_up_blocker().is_none()
    }

    pub fn send_enabled(&self) -> bool {
        self.send_blocker().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::signature::Signature;

    fn ready(balance: u64) -> AppState {
        AppState::new(TokenType::Lamports, true)
            .apply(StateEvent::SessionReady {
                owner: Pubkey::new_unique(),
                endpoint: "loopback://local".to_string(),
            })
            .apply(StateEvent::BalanceFetched(balance))
    }

    #[test]
    fn test_initial_state_is_loading_and_disabled() {
        let state = AppState::new(TokenType::Lamports, true);
        assert_eq!(state.readiness, Readiness::Loading);
        assert_eq!(state.balance, BalanceView::Fetching);
        assert_eq!(state.top_up_blocker(), Some(DisabledReason::SessionNotReady));
        assert_eq!(state.send_blocker(), Some(DisabledReason::SessionNotReady));
    }

    #[test]
    fn test_failed_session_keeps_controls_disabled() {
        let state =
            AppState::new(TokenType::Lamports, true).apply(StateEvent::SessionFailed("boom".into()));
        assert_eq!(state.readiness, Readiness::Failed("boom".into()));
        assert!(!state.top_up_enabled());
        assert!(!state.send_enabled());
        assert!(state.last_error.as_deref().unwrap().contains("boom"));
    }

    #[test]
    fn test_send_gated_on_balance() {
        let zero = ready(0);
        assert!(zero.top_up_enabled());
        assert_eq!(zero.send_blocker(), Some(DisabledReason::ZeroBalance));

        let funded = ready(1);
        assert!(funded.send_enabled());

        let failed = funded
            .apply(StateEvent::PublicBalanceFetched(7))
            .apply(StateEvent::BalanceFailed("rpc down".into()));
        assert_eq!(failed.public_balance, Some(7));
        assert_eq!(failed.balance, BalanceView::Failed("rpc down".into()));
        assert_eq!(failed.send_blocker(), Some(DisabledReason::BalanceUnknown));
    }

    #[test]
    fn test_send_requires_recipient() {
        let mut state = ready(1_000);
        state.has_recipient = false;
        assert_eq!(state.send_blocker(), Some(DisabledReason::NoRecipient));
    }

    #[test]
    fn test_in_flight_phase_blocks_only_its_workflow() {
        let state = ready(1_000).apply(StateEvent::Phase(Workflow::Send, WorkflowPhase::Submitting));
        assert_eq!(state.send_blocker(), Some(DisabledReason::InFlight));
        assert!(state.top_up_enabled());

        let state = state.apply(StateEvent::Phase(Workflow::TopUp, WorkflowPhase::Signing));
        assert_eq!(state.top_up_blocker(), Some(DisabledReason::InFlight));
    }

    #[test]
    fn test_terminal_phases_set_notice_and_error() {
        let sig = Signature::default();
        let state = ready(1_000)
            .apply(StateEvent::Phase(Workflow::TopUp, WorkflowPhase::Building))
            .apply(StateEvent::Phase(Workflow::TopUp, WorkflowPhase::Complete(sig)));
        assert_eq!(state.top_up, WorkflowPhase::Complete(sig));
        assert!(state.notice.as_deref().unwrap().starts_with("Top-up complete"));
        assert!(state.top_up_enabled());

        let state = state
            .apply(StateEvent::Phase(Workflow::Send, WorkflowPhase::Building))
            .apply(StateEvent::Phase(
                Workflow::Send,
                WorkflowPhase::Failed("insufficient".into()),
            ));
        assert_eq!(state.notice, None);
        assert_eq!(state.last_error.as_deref(), Some("Send failed: insufficient"));
        assert!(state.send_enabled());
    }
}
