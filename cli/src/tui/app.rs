use elusiv_demo_core::{
    AppState, BalanceView, Readiness, WalletService, Workflow, WorkflowPhase,
};
use elusiv_demo_privacy::TokenType;

pub struct App {
    pub service: WalletService,
    pub state: AppState,
    pub status_message: String,
}

impl App {
    pub fn new(service: WalletService) -> Self {
        let state = service.state();
        Self {
            service,
            state,
            status_message: String::new(),
        }
    }

    /// Pull the latest published state.
    pub fn sync(&mut self) {
        self.state = self.service.state();
    }

    pub fn top_up(&mut self) {
        match self.state.top_up_blocker() {
            Some(reason) => self.status_message = format!("Top-up unavailable: {reason}"),
            None => {
                self.spawn_workflow(Workflow::TopUp);
                self.status_message = "Top-up started".to_string();
            }
        }
    }

    pub fn send(&mut self) {
        match self.state.send_blocker() {
            Some(reason) => self.status_message = format!("Send unavailable: {reason}"),
            None => {
                self.spawn_workflow(Workflow::Send);
                self.status_message = "Send started".to_string();
            }
        }
    }

    pub fn refresh(&mut self) {
        if !self.state.is_ready() {
            self.status_message = "Session is not ready".to_string();
            return;
        }
        let service = self.service.clone();
        tokio::spawn(async move {
            if let Err(e) = service.refresh_balance().await {
                log::debug!("Balance refresh did not complete: {}", e);
            }
        });
        self.status_message = "Refreshing balance".to_string();
    }

    fn spawn_workflow(&self, kind: Workflow) {
        let service = self.service.clone();
        tokio::spawn(async move {
            let result = match kind {
                Workflow::TopUp => service.top_up().await,
                Workflow::Send => service.send().await,
            };
            if let Err(e) = result {
                log::debug!("{} did not complete: {}", kind.label(), e);
            }
        });
    }
}

pub fn connection_text(state: &AppState) -> String {
    match (&state.readiness, &state.endpoint) {
        (Readiness::Loading, _) => "Connecting...".to_string(),
        (Readiness::Ready, Some(endpoint)) => format!("Connected to {endpoint}"),
        (Readiness::Ready, None) => "Connected".to_string(),
        (Readiness::Failed(_), _) => "Initialisation failed".to_string(),
    }
}

pub fn balance_text(state: &AppState) -> String {
    if let Readiness::Failed(_) = state.readiness {
        return "Unavailable".to_string();
    }
    match &state.balance {
        BalanceView::Known(amount) => state.token.format_amount(*amount),
        BalanceView::Fetching => "Loading...".to_string(),
        BalanceView::Failed(_) => "Unavailable".to_string(),
    }
}

/// Public funds are always native SOL.
pub fn public_balance_text(state: &AppState) -> String {
    match state.public_balance {
        Some(lamports) => TokenType::Lamports.format_amount(lamports),
        None => "-".to_string(),
    }
}

pub fn button_label(kind: Workflow, phase: &WorkflowPhase) -> &'static str {
    match (kind, phase.is_in_flight()) {
        (Workflow::TopUp, false) => "Topup",
        (Workflow::TopUp, true) => "Topping up...",
        (Workflow::Send, false) => "Send",
        (Workflow::Send, true) => "Sending...",
    }
}

pub fn phase_text(phase: &WorkflowPhase) -> String {
    match phase {
        WorkflowPhase::Idle => "idle".to_string(),
        WorkflowPhase::Building => "building transaction...".to_string(),
        WorkflowPhase::Signing => "signing...".to_string(),
        WorkflowPhase::Submitting => "submitting...".to_string(),
        WorkflowPhase::Complete(sig) => format!("complete ({sig})"),
        WorkflowPhase::Failed(_) => "failed".to_string(),
        WorkflowPhase::Cancelled => "cancelled".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use elusiv_demo_core::StateEvent;
    use solana_sdk::pubkey::Pubkey;

    #[test]
    fn test_public_balance_text() {
        let state = AppState::new(TokenType::Usdc, true);
        assert_eq!(public_balance_text(&state), "-");

        let state = state.apply(StateEvent::PublicBalanceFetched(2_500_000_000));
        assert_eq!(public_balance_text(&state), "2.5 SOL");
    }

    #[test]
    fn test_connection_and_balance_text() {
        let state = AppState::new(TokenType::Lamports, true);
        assert_eq!(connection_text(&state), "Connecting...");
        assert_eq!(balance_text(&state), "Loading...");

        let state = state
            .apply(StateEvent::SessionReady {
                owner: Pubkey::new_unique(),
                endpoint: "https://api.devnet.solana.com".into(),
            })
            .apply(StateEvent::BalanceFetched(1_500_000_000));
        assert_eq!(
            connection_text(&state),
            "Connected to https://api.devnet.solana.com"
        );
        assert_eq!(balance_text(&state), "1.5 SOL");

        let state = state.apply(StateEvent::BalanceFailed("timeout".into()));
        assert_eq!(balance_text(&state), "Unavailable");
    }

    #[test]
    fn test_button_labels_follow_phase() {
        assert_eq!(button_label(Workflow::Send, &WorkflowPhase::Idle), "Send");
        assert_eq!(
            button_label(Workflow::Send, &WorkflowPhase::Submitting),
            "Sending..."
        );
        assert_eq!(
            button_label(Workflow::TopUp, &WorkflowPhase::Signing),
            "Topping up..."
        );
    }
}
