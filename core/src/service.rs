//! Wallet Service
//!
//! Owns the session and the [`AppState`]. Callers talk to it through
//! [`WalletService`]; renderers follow state changes through a watch channel.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                           Wallet Service                             │
//! │                                                                      │
//! │  WalletService ──mpsc──▶ ┌────────────┐ ──watch──▶ renderers         │
//! │  (top_up, send,          │  service   │                              │
//! │   refresh, snapshot)     │    loop    │ ◀──progress── spawned tasks  │
//! │        ▲                 └────────────┘               │              │
//! │        │                       │ spawn                │              │
//! │        │                       ▼                      │              │
//! │        │            bootstrap / workflow / balance ───┘              │
//! │        └──────────────────oneshot reply──────────────┘               │
//! │                                                                      │
//! │  shutdown() cancels the root token; every spawned task races it.    │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use solana_sdk::signature::Signature;
use tokio::sync::{mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::balance::fetch_private_balance;
use crate::error::{BootstrapError, DisabledReason, WorkflowError};
use crate::session::{Bootstrapper, Session};
use crate::settings::WalletSettings;
use crate::state::{AppState, BalanceView, Readiness, StateEvent};
use crate::workflow::{self, Workflow, WorkflowPhase};

type Reply<T> = oneshot::Sender<Result<T, WorkflowError>>;

/// Commands accepted by the service loop
pub enum WalletCommand {
    TopUp(Reply<Signature>),
    Send(Reply<Signature>),
    RefreshBalance(Reply<u64>),
    Snapshot(oneshot::Sender<AppState>),
}

/// Reports from spawned tasks back to the loop
enum Progress {
    Bootstrapped(Result<Session, BootstrapError>),
    Phase(Workflow, WorkflowPhase),
    Finished(Workflow, WorkflowPhase),
    Balance(u64, Result<u64, String>),
    PublicBalance(u64, u64),
}

// Service Loop

struct WalletLoop {
    settings: WalletSettings,
    state: AppState,
    session: Option<Arc<Session>>,
    /// Only the newest balance query may update the state
    balance_generation: u64,
    state_tx: watch::Sender<AppState>,
    progress_tx: mpsc::UnboundedSender<Progress>,
    cancel: CancellationToken,
}

impl WalletLoop {
    fn apply(&mut self, event: StateEvent) {
        self.state = std::mem::take(&mut self.state).apply(event);
    }

    fn publish(&self) {
        self.state_tx.send_replace(self.state.clone());
    }

    fn spawn_bootstrap(&self, bootstrapper: Bootstrapper) {
        let progress = self.progress_tx.clone();
        let cancel = self.cancel.child_token();

        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Bootstrap abandoned");
                }
                result = bootstrapper.bootstrap() => {
                    let _ = progress.send(Progress::Bootstrapped(result));
                }
            }
        });
    }

    fn handle_command(&mut self, cmd: WalletCommand) {
        match cmd {
            WalletCommand::TopUp(reply) => self.start_workflow(Workflow::TopUp, reply),
            WalletCommand::Send(reply) => self.start_workflow(Workflow::Send, reply),
            WalletCommand::RefreshBalance(reply) => {
                if !self.state.is_ready() {
                    let _ = reply.send(Err(WorkflowError::Disabled(DisabledReason::SessionNotReady)));
                    return;
                }
                self.start_balance_query(Some(reply));
            }
            WalletCommand::Snapshot(reply) => {
                let _ = reply.send(self.state.clone());
            }
        }
    }

    fn handle_progress(&mut self, progress: Progress) {
        match progress {
            Progress::Bootstrapped(Ok(session)) => {
                info!(owner = %session.owner(), endpoint = session.endpoint(), "Session ready");
                self.apply(StateEvent::SessionReady {
                    owner: session.owner(),
                    endpoint: session.endpoint().to_string(),
                });
                self.session = Some(Arc::new(session));
                self.start_balance_query(None);
            }
            Progress::Bootstrapped(Err(e)) => {
                error!(error = %e, "Session bootstrap failed");
                self.apply(StateEvent::SessionFailed(e.to_string()));
            }
            Progress::Phase(kind, phase) => {
                self.apply(StateEvent::Phase(kind, phase));
            }
            Progress::Finished(kind, phase) => {
                let succeeded = matches!(phase, WorkflowPhase::Complete(_));
                if let WorkflowPhase::Failed(msg) = &phase {
                    warn!(workflow = kind.label(), error = %msg, "Workflow failed");
                }
                self.apply(StateEvent::Phase(kind, phase));
                if succeeded {
                    self.start_balance_query(None);
                }
            }
            Progress::PublicBalance(generation, lamports) => {
                if generation == self.balance_generation {
                    self.apply(StateEvent::PublicBalanceFetched(lamports));
                }
            }
            Progress::Balance(generation, result) => {
                if generation != self.balance_generation {
                    debug!(generation, "Dropping stale balance result");
                    return;
                }
                match result {
                    Ok(amount) => self.apply(StateEvent::BalanceFetched(amount)),
                    Err(msg) => {
                        warn!(error = %msg, "Balance query failed");
                        self.apply(StateEvent::BalanceFailed(msg));
                    }
                }
            }
        }
    }

    fn start_workflow(&mut self, kind: Workflow, reply: Reply<Signature>) {
        let blocker = match kind {
            Workflow::TopUp => self.state.top_up_blocker(),
            Workflow::Send => self.state.send_blocker(),
        };
        if let Some(reason) = blocker {
            debug!(workflow = kind.label(), %reason, "Trigger ignored");
            let _ = reply.send(Err(WorkflowError::Disabled(reason)));
            return;
        }
        let Some(session) = self.session.clone() else {
            let _ = reply.send(Err(WorkflowError::Disabled(DisabledReason::SessionNotReady)));
            return;
        };

        // Marked in flight before the task runs so a second trigger is refused.
        self.apply(StateEvent::Phase(kind, WorkflowPhase::Building));

        let settings = self.settings.clone();
        let progress = self.progress_tx.clone();
        let cancel = self.cancel.child_token();

        tokio::spawn(async move {
            let reporter = progress.clone();
            let on_phase = move |phase| {
                let _ = reporter.send(Progress::Phase(kind, phase));
            };

            let run = async move {
                match kind {
                    Workflow::TopUp => {
                        workflow::top_up(&session, settings.top_up_amount, settings.token, on_phase)
                            .await
                    }
                    Workflow::Send => match settings.recipient {
                        Some(recipient) => {
                            workflow::send(
                                &session,
                                settings.send_amount,
                                recipient,
                                settings.token,
                                on_phase,
                            )
                            .await
                        }
                        None => Err(WorkflowError::Disabled(DisabledReason::NoRecipient)),
                    },
                }
            };

            // A panicking SDK must still end the workflow.
            let task = tokio::spawn(run);
            let abort = task.abort_handle();
            let result = tokio::select! {
                _ = cancel.cancelled() => {
                    abort.abort();
                    Err(WorkflowError::Cancelled)
                }
                joined = task => match joined {
                    Ok(result) => result,
                    Err(e) => {
                        error!(workflow = kind.label(), error = %e, "Workflow task died");
                        Err(WorkflowError::Aborted(e.to_string()))
                    }
                },
            };

            let phase = match &result {
                Ok(signature) => WorkflowPhase::Complete(*signature),
                Err(WorkflowError::Cancelled) => WorkflowPhase::Cancelled,
                Err(e) => WorkflowPhase::Failed(e.to_string()),
            };
            let _ = progress.send(Progress::Finished(kind, phase));
            let _ = reply.send(result);
        });
    }

    fn start_balance_query(&mut self, reply: Option<Reply<u64>>) {
        let Some(session) = self.session.clone() else {
            if let Some(reply) = reply {
                let _ = reply.send(Err(WorkflowError::Disabled(DisabledReason::SessionNotReady)));
            }
            return;
        };

        self.balance_generation += 1;
        let generation = self.balance_generation;
        self.apply(StateEvent::BalanceRequested);

        let token = self.settings.token;
        let progress = self.progress_tx.clone();
        let cancel = self.cancel.child_token();

        tokio::spawn(async move {
            let fetch = async {
                let private = fetch_private_balance(&session, token).await;
                let public = session.connection().balance(&session.owner()).await;
                (private, public)
            };
            let fetched = tokio::select! {
                _ = cancel.cancelled() => None,
                fetched = fetch => Some(fetched),
            };

            // Public balance goes first so it is in place once the query settles.
            let result = match fetched {
                None => Err(WorkflowError::Cancelled),
                Some((private, public)) => {
                    match public {
                        Ok(lamports) => {
                            let _ = progress.send(Progress::PublicBalance(generation, lamports));
                        }
                        Err(e) => debug!(error = %e, "Public balance unavailable"),
                    }
                    private
                }
            };

            if !matches!(result, Err(WorkflowError::Cancelled)) {
                let view = match &result {
                    Ok(amount) => Ok(*amount),
                    Err(WorkflowError::Balance(source)) => Err(source.to_string()),
                    Err(e) => Err(e.to_string()),
                };
                let _ = progress.send(Progress::Balance(generation, view));
            }
            if let Some(reply) = reply {
                let _ = reply.send(result);
            }
        });
    }
}

// Wallet Service

/// Handle to the running wallet. Cheap to clone.
#[derive(Clone)]
pub struct WalletService {
    command_tx: mpsc::Sender<WalletCommand>,
    state_rx: watch::Receiver<AppState>,
    cancel: CancellationToken,
}

impl WalletService {
    /// Start the service loop and kick off session bootstrap.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(bootstrapper: Bootstrapper, settings: WalletSettings) -> Self {
        let (command_tx, mut command_rx) = mpsc::channel::<WalletCommand>(64);
        let (progress_tx, mut progress_rx) = mpsc::unbounded_channel::<Progress>();
        let initial = AppState::new(settings.token, settings.recipient.is_some());
        let (state_tx, state_rx) = watch::channel(initial.clone());
        let cancel = CancellationToken::new();

        let mut wallet = WalletLoop {
            settings,
            state: initial,
            session: None,
            balance_generation: 0,
            state_tx,
            progress_tx,
            cancel: cancel.clone(),
        };
        wallet.spawn_bootstrap(bootstrapper);

        let shutdown = cancel.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => break,
                    Some(progress) = progress_rx.recv() => {
                        wallet.handle_progress(progress);
                    }
                    cmd = command_rx.recv() => match cmd {
                        Some(cmd) => wallet.handle_command(cmd),
                        None => {
                            debug!("All wallet handles dropped");
                            break;
                        }
                    },
                }
                wallet.publish();
            }

            shutdown.cancel();
            info!("Wallet service stopped");
        });

        Self {
            command_tx,
            state_rx,
            cancel,
        }
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(Reply<T>) -> WalletCommand,
    ) -> Result<T, WorkflowError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command_tx
            .send(command(reply_tx))
            .await
            .map_err(|_| WorkflowError::ServiceUnavailable)?;
        reply_rx
            .await
            .map_err(|_| WorkflowError::ServiceUnavailable)?
    }

    /// Run the top-up workflow with the configured amount.
    pub async fn top_up(&self) -> Result<Signature, WorkflowError> {
        self.request(WalletCommand::TopUp).await
    }

    /// Run the send workflow with the configured amount and recipient.
    pub async fn send(&self) -> Result<Signature, WorkflowError> {
        self.request(WalletCommand::Send).await
    }

    pub async fn refresh_balance(&self) -> Result<u64, WorkflowError> {
        self.request(WalletCommand::RefreshBalance).await
    }

    /// State as seen by the loop after every earlier command
    pub async fn snapshot(&self) -> Result<AppState, WorkflowError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command_tx
            .send(WalletCommand::Snapshot(reply_tx))
            .await
            .map_err(|_| WorkflowError::ServiceUnavailable)?;
        reply_rx.await.map_err(|_| WorkflowError::ServiceUnavailable)
    }

    /// Last published state, without a round trip through the loop
    pub fn state(&self) -> AppState {
        self.state_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AppState> {
        self.state_rx.clone()
    }

    /// Wait until nothing is loading or in flight.
    pub async fn settled(&self) -> Result<AppState, WorkflowError> {
        let mut rx = self.state_rx.clone();
        let state = rx
            .wait_for(|s| match s.readiness {
                Readiness::Loading => false,
                Readiness::Failed(_) => true,
                Readiness::Ready => {
                    s.balance != BalanceView::Fetching
                        && !s.top_up.is_in_flight()
                        && !s.send.is_in_flight()
                }
            })
            .await
            .map_err(|_| WorkflowError::ServiceUnavailable)?;
        Ok(state.clone())
    }

    /// Cancel in-flight work and stop the loop. Pending callers resolve with
    /// [`WorkflowError::Cancelled`].
    pub fn shutdown(&self) {
        info!("Wallet service shutting down");
        self.cancel.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.cancel.is_cancelled()
    }
}
