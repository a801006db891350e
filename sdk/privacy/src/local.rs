//! Local shielded pool
//!
//! An in-process stand-in for the Elusiv program and relayer. It keeps plain
//! balances (no notes, no proofs) but enforces the same rules the wallet sees
//! from the real SDK:
//!
//! - top-ups are paid by the owner's public lamports and need the owner's signature
//! - sends are paid out of the shielded balance and signed by the relayer
//! - a transaction is processed at most once
//!
//! Public lamports are read through the session's connection; what the pool
//! has pulled in is tracked here as a debit against that balance.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use elusiv_demo_connection::Connection;
use elusiv_demo_keypair::Keypair;
use solana_sdk::hash::Hash;
use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::message::Message;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair as SolanaKeypair, Signature};
use solana_sdk::signer::Signer;
use solana_sdk::transaction::Transaction;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::SdkError;
use crate::token::TokenType;
use crate::transaction::{
    ElusivTransaction, KIND_SEND, KIND_TOP_UP, PoolInstruction, SendReceipt, TxKind,
};
use crate::{PrivacySdk, SdkProvider};

/// Flat network fee a top-up costs on top of the amount, in lamports
pub const NETWORK_FEE_LAMPORTS: u64 = 5_000;
/// Relayer fee on sends, in basis points of the amount
pub const SEND_FEE_BPS: u64 = 10;

pub fn pool_program_id() -> Pubkey {
    Pubkey::new_from_array(*blake3::hash(b"elusiv-demo/local-pool/program").as_bytes())
}

fn pool_vault() -> Pubkey {
    Pubkey::new_from_array(*blake3::hash(b"elusiv-demo/local-pool/vault").as_bytes())
}

pub fn send_fee(amount: u64) -> u64 {
    (amount as u128 * SEND_FEE_BPS as u128 / 10_000) as u64
}

#[derive(Default)]
struct PoolState {
    shielded: HashMap<(Pubkey, TokenType), u64>,
    public_debits: HashMap<Pubkey, u64>,
    paid_out: HashMap<(Pubkey, TokenType), u64>,
    processed: HashSet<Signature>,
}

/// Shared pool ledger. Hand out per-owner handles with [`LocalPool::handle`].
pub struct LocalPool {
    relayer: SolanaKeypair,
    state: Mutex<PoolState>,
}

impl Default for LocalPool {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalPool {
    pub fn new() -> Self {
        Self {
            relayer: SolanaKeypair::new(),
            state: Mutex::new(PoolState::default()),
        }
    }

    /// Fee payer and signer of every send transaction
    pub fn relayer(&self) -> Pubkey {
        self.relayer.pubkey()
    }

    pub async fn shielded_balance(&self, owner: &Pubkey, token: TokenType) -> u64 {
        let state = self.state.lock().await;
        state.shielded.get(&(*owner, token)).copied().unwrap_or(0)
    }

    /// Total released to `recipient` by sends
    pub async fn paid_out(&self, recipient: &Pubkey, token: TokenType) -> u64 {
        let state = self.state.lock().await;
        state.paid_out.get(&(*recipient, token)).copied().unwrap_or(0)
    }

    /// Seeds a shielded balance directly, bypassing top-up.
    pub async fn credit_shielded(&self, owner: &Pubkey, token: TokenType, amount: u64) {
        let mut state = self.state.lock().await;
        let entry = state.shielded.entry((*owner, token)).or_default();
        *entry = entry.saturating_add(amount);
    }

    pub fn handle(self: &Arc<Self>, owner: Pubkey, connection: Arc<dyn Connection>) -> LocalPoolHandle {
        LocalPoolHandle {
            pool: Arc::clone(self),
            owner,
            connection,
        }
    }
}

/// SDK handle bound to one owner.
pub struct LocalPoolHandle {
    pool: Arc<LocalPool>,
    owner: Pubkey,
    connection: Arc<dyn Connection>,
}

impl LocalPoolHandle {
    /// Public lamports left after what the pool has already pulled in.
    /// `on_chain` must be read before `state` is locked.
    fn available_public(&self, on_chain: u64, state: &PoolState) -> u64 {
        let debited = state.public_debits.get(&self.owner).copied().unwrap_or(0);
        on_chain.saturating_sub(debited)
    }

    fn unsigned(
        ix: &PoolInstruction,
        accounts: Vec<AccountMeta>,
        payer: &Pubkey,
        blockhash: &Hash,
    ) -> Result<Transaction, SdkError> {
        let instruction = Instruction {
            program_id: pool_program_id(),
            accounts,
            data: ix.encode()?,
        };
        let message = Message::new_with_blockhash(&[instruction], Some(payer), blockhash);
        Ok(Transaction::new_unsigned(message))
    }
}

#[async_trait]
impl PrivacySdk for LocalPoolHandle {
    async fn build_top_up_tx(
        &self,
        amount: u64,
        token: TokenType,
    ) -> Result<ElusivTransaction, SdkError> {
        if amount == 0 {
            return Err(SdkError::ZeroAmount);
        }
        if token != TokenType::Lamports {
            return Err(SdkError::UnsupportedToken(token));
        }

        let need = amount.saturating_add(NETWORK_FEE_LAMPORTS);
        let on_chain = self.connection.balance(&self.owner).await?;
        let have = {
            let state = self.pool.state.lock().await;
            self.available_public(on_chain, &state)
        };
        if have < need {
            return Err(SdkError::InsufficientFunds { token, have, need });
        }

        let ix = PoolInstruction {
            kind: KIND_TOP_UP,
            token: token.code(),
            amount,
            fee: NETWORK_FEE_LAMPORTS,
            owner: self.owner.to_bytes(),
            recipient: [0u8; 32],
        };
        let accounts = vec![
            AccountMeta::new(self.owner, true),
            AccountMeta::new(pool_vault(), false),
        ];
        let blockhash = self.connection.latest_blockhash().await?;
        let tx = Self::unsigned(&ix, accounts, &self.owner, &blockhash)?;
        debug!(amount, %token, "Built top-up transaction");

        Ok(ElusivTransaction {
            tx,
            kind: TxKind::TopUp,
            token,
            amount,
            fee: NETWORK_FEE_LAMPORTS,
            recipient: None,
        })
    }

    async fn build_send_tx(
        &self,
        amount: u64,
        recipient: Pubkey,
        token: TokenType,
    ) -> Result<ElusivTransaction, SdkError> {
        if amount == 0 {
            return Err(SdkError::ZeroAmount);
        }
        if recipient == Pubkey::default() {
            return Err(SdkError::InvalidRecipient(recipient));
        }

        let fee = send_fee(amount);
        let need = amount.saturating_add(fee);
        let have = self.pool.shielded_balance(&self.owner, token).await;
        if have < need {
            return Err(SdkError::InsufficientFunds { token, have, need });
        }

        let ix = PoolInstruction {
            kind: KIND_SEND,
            token: token.code(),
            amount,
            fee,
            owner: self.owner.to_bytes(),
            recipient: recipient.to_bytes(),
        };
        let relayer = self.pool.relayer();
        let accounts = vec![
            AccountMeta::new(relayer, true),
            AccountMeta::new(recipient, false),
            AccountMeta::new(pool_vault(), false),
        ];
        let blockhash = self.connection.latest_blockhash().await?;
        let mut tx = Self::unsigned(&ix, accounts, &relayer, &blockhash)?;
        // The relayer pays and signs; the owner authorises through the pool.
        tx.try_partial_sign(&[&self.pool.relayer], blockhash)
            .map_err(|e| SdkError::Signing(e.to_string()))?;
        debug!(amount, fee, %recipient, %token, "Built send transaction");

        Ok(ElusivTransaction {
            tx,
            kind: TxKind::Send,
            token,
            amount,
            fee,
            recipient: Some(recipient),
        })
    }

    async fn send_elusiv_tx(&self, etx: ElusivTransaction) -> Result<SendReceipt, SdkError> {
        if !etx.is_signed() {
            return Err(SdkError::MissingSignature);
        }

        let message = &etx.tx.message;
        let compiled = message
            .instructions
            .first()
            .ok_or_else(|| SdkError::Malformed("no instructions".into()))?;
        let program = message
            .account_keys
            .get(compiled.program_id_index as usize)
            .ok_or_else(|| SdkError::Malformed("program index out of range".into()))?;
        if *program != pool_program_id() {
            return Err(SdkError::Rejected(format!("{program} is not the pool program")));
        }

        let ix = PoolInstruction::decode(&compiled.data)?;
        let kind = ix.tx_kind()?;
        let token = ix.token_type()?;
        let owner = Pubkey::new_from_array(ix.owner);
        if owner != self.owner {
            return Err(SdkError::Rejected("transaction belongs to another wallet".into()));
        }

        let signature = etx
            .tx
            .signatures
            .first()
            .copied()
            .ok_or(SdkError::MissingSignature)?;
        let need = ix.amount.saturating_add(ix.fee);
        let on_chain = match kind {
            TxKind::TopUp => self.connection.balance(&owner).await?,
            TxKind::Send => 0,
        };

        let mut state = self.pool.state.lock().await;
        if state.processed.contains(&signature) {
            return Err(SdkError::Rejected(format!("{signature} already processed")));
        }

        match kind {
            TxKind::TopUp => {
                if message.account_keys.first() != Some(&owner) {
                    return Err(SdkError::MissingSignature);
                }
                let have = self.available_public(on_chain, &state);
                if have < need {
                    return Err(SdkError::InsufficientFunds { token, have, need });
                }
                *state.public_debits.entry(owner).or_default() += need;
                *state.shielded.entry((owner, token)).or_default() += ix.amount;
            }
            TxKind::Send => {
                let recipient = Pubkey::new_from_array(ix.recipient);
                let balance = state.shielded.entry((owner, token)).or_default();
                if *balance < need {
                    return Err(SdkError::InsufficientFunds {
                        token,
                        have: *balance,
                        need,
                    });
                }
                *balance -= need;
                *state.paid_out.entry((recipient, token)).or_default() += ix.amount;
            }
        }
        state.processed.insert(signature);

        info!(%signature, ?kind, amount = ix.amount, %token, "Pool transaction processed");
        Ok(SendReceipt { signature })
    }

    async fn get_latest_private_balance(&self, token: TokenType) -> Result<u64, SdkError> {
        Ok(self.pool.shielded_balance(&self.owner, token).await)
    }
}

/// Provides [`LocalPoolHandle`]s over one shared pool.
pub struct LocalPoolProvider {
    pool: Arc<LocalPool>,
}

impl LocalPoolProvider {
    pub fn new(pool: Arc<LocalPool>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &Arc<LocalPool> {
        &self.pool
    }
}

#[async_trait]
impl SdkProvider for LocalPoolProvider {
    async fn init(
        &self,
        keypair: &Keypair,
        connection: Arc<dyn Connection>,
    ) -> Result<Arc<dyn PrivacySdk>, SdkError> {
        info!(
            owner = %keypair.pubkey(),
            endpoint = connection.endpoint(),
            "Local pool handle initialised"
        );
        Ok(Arc::new(self.pool.handle(keypair.pubkey(), connection)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use elusiv_demo_connection::{ConnectionError, LoopbackConnection};
    use tokio::sync::{Notify, oneshot};
    use tokio::time::timeout;

    const SOL: u64 = 1_000_000_000;

    /// Loopback connection whose next balance read blocks until released.
    struct StalledConnection {
        inner: LoopbackConnection,
        gate: Mutex<Option<oneshot::Receiver<()>>>,
        entered: Notify,
    }

    impl StalledConnection {
        fn new(opening: u64) -> Self {
            Self {
                inner: LoopbackConnection::new(opening),
                gate: Mutex::new(None),
                entered: Notify::new(),
            }
        }

        async fn stall_next_balance(&self) -> oneshot::Sender<()> {
            let (tx, rx) = oneshot::channel();
            *self.gate.lock().await = Some(rx);
            tx
        }
    }

    #[async_trait]
    impl Connection for StalledConnection {
        fn endpoint(&self) -> &str {
            self.inner.endpoint()
        }

        async fn latest_blockhash(&self) -> Result<Hash, ConnectionError> {
            self.inner.latest_blockhash().await
        }

        async fn balance(&self, owner: &Pubkey) -> Result<u64, ConnectionError> {
            let gate = self.gate.lock().await.take();
            if let Some(gate) = gate {
                self.entered.notify_one();
                let _ = gate.await;
            }
            self.inner.balance(owner).await
        }

        async fn request_airdrop(
            &self,
            owner: &Pubkey,
            lamports: u64,
        ) -> Result<Signature, ConnectionError> {
            self.inner.request_airdrop(owner, lamports).await
        }
    }

    fn setup(opening: u64) -> (Arc<LocalPool>, Keypair, LocalPoolHandle) {
        let pool = Arc::new(LocalPool::new());
        let keypair = Keypair::new_random();
        let conn: Arc<dyn Connection> = Arc::new(LoopbackConnection::new(opening));
        let handle = pool.handle(keypair.pubkey(), conn);
        (pool, keypair, handle)
    }

    #[tokio::test]
    async fn test_top_up_requires_owner_signature() {
        let (_pool, keypair, sdk) = setup(2 * SOL);

        let tx = sdk.build_top_up_tx(SOL, TokenType::Lamports).await.unwrap();
        assert!(tx.needs_owner_signature());
        assert!(matches!(
            sdk.send_elusiv_tx(tx.clone()).await,
            Err(SdkError::MissingSignature)
        ));

        let mut tx = tx;
        tx.partial_sign(&keypair).unwrap();
        let receipt = sdk.send_elusiv_tx(tx).await.unwrap();
        assert_ne!(receipt.signature, Signature::default());

        assert_eq!(
            sdk.get_latest_private_balance(TokenType::Lamports).await.unwrap(),
            SOL
        );
    }

    #[tokio::test]
    async fn test_transaction_without_signers_is_rejected() {
        let (_pool, keypair, sdk) = setup(2 * SOL);
        let ix = PoolInstruction {
            kind: KIND_TOP_UP,
            token: TokenType::Lamports.code(),
            amount: SOL,
            fee: NETWORK_FEE_LAMPORTS,
            owner: keypair.pubkey().to_bytes(),
            recipient: [0u8; 32],
        };
        let instruction = Instruction {
            program_id: pool_program_id(),
            accounts: vec![AccountMeta::new(pool_vault(), false)],
            data: ix.encode().unwrap(),
        };
        let message = Message::new_with_blockhash(&[instruction], None, &Hash::default());
        let etx = ElusivTransaction {
            tx: Transaction::new_unsigned(message),
            kind: TxKind::TopUp,
            token: TokenType::Lamports,
            amount: SOL,
            fee: NETWORK_FEE_LAMPORTS,
            recipient: None,
        };
        assert!(etx.tx.signatures.is_empty());

        assert!(matches!(
            sdk.send_elusiv_tx(etx).await,
            Err(SdkError::MissingSignature)
        ));
        assert_eq!(
            sdk.get_latest_private_balance(TokenType::Lamports).await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_stalled_public_balance_does_not_block_private_balance() {
        let pool = Arc::new(LocalPool::new());
        let keypair = Keypair::new_random();
        let conn = Arc::new(StalledConnection::new(2 * SOL));
        let sdk = Arc::new(pool.handle(keypair.pubkey(), conn.clone()));

        let mut tx = sdk.build_top_up_tx(SOL, TokenType::Lamports).await.unwrap();
        tx.partial_sign(&keypair).unwrap();

        let release = conn.stall_next_balance().await;
        let submit = tokio::spawn({
            let sdk = Arc::clone(&sdk);
            async move { sdk.send_elusiv_tx(tx).await }
        });
        timeout(Duration::from_secs(5), conn.entered.notified())
            .await
            .unwrap();

        let balance = timeout(
            Duration::from_secs(1),
            sdk.get_latest_private_balance(TokenType::Lamports),
        )
        .await
        .expect("private balance waited on the public balance read");
        assert_eq!(balance.unwrap(), 0);

        release.send(()).unwrap();
        submit.await.unwrap().unwrap();
        assert_eq!(
            sdk.get_latest_private_balance(TokenType::Lamports).await.unwrap(),
            SOL
        );
    }

    #[tokio::test]
    async fn test_foreign_key_cannot_sign_top_up() {
        let (_pool, _keypair, sdk) = setup(2 * SOL);
        let mut tx = sdk.build_top_up_tx(SOL, TokenType::Lamports).await.unwrap();
        let stranger = Keypair::new_random();
        assert!(matches!(
            tx.partial_sign(&stranger),
            Err(SdkError::Signing(_))
        ));
    }

    #[tokio::test]
    async fn test_top_up_debits_public_funds_and_fee() {
        let (_pool, keypair, sdk) = setup(SOL + NETWORK_FEE_LAMPORTS);

        let mut tx = sdk.build_top_up_tx(SOL, TokenType::Lamports).await.unwrap();
        tx.partial_sign(&keypair).unwrap();
        sdk.send_elusiv_tx(tx).await.unwrap();

        // Public funds are exhausted now
        let err = sdk.build_top_up_tx(1, TokenType::Lamports).await.unwrap_err();
        assert!(matches!(
            err,
            SdkError::InsufficientFunds { have: 0, .. }
        ));
    }

    #[tokio::test]
    async fn test_replay_is_rejected() {
        let (_pool, keypair, sdk) = setup(10 * SOL);
        let mut tx = sdk.build_top_up_tx(SOL, TokenType::Lamports).await.unwrap();
        tx.partial_sign(&keypair).unwrap();

        sdk.send_elusiv_tx(tx.clone()).await.unwrap();
        assert!(matches!(
            sdk.send_elusiv_tx(tx).await,
            Err(SdkError::Rejected(_))
        ));
        assert_eq!(
            sdk.get_latest_private_balance(TokenType::Lamports).await.unwrap(),
            SOL
        );
    }

    #[tokio::test]
    async fn test_send_is_relayer_signed_and_charges_fee() {
        let (pool, keypair, sdk) = setup(0);
        pool.credit_shielded(&keypair.pubkey(), TokenType::Lamports, SOL)
            .await;
        let recipient = Pubkey::new_unique();

        let tx = sdk
            .build_send_tx(SOL / 2, recipient, TokenType::Lamports)
            .await
            .unwrap();
        assert!(!tx.needs_owner_signature());
        assert!(tx.is_signed());
        assert_eq!(tx.fee, send_fee(SOL / 2));

        sdk.send_elusiv_tx(tx).await.unwrap();
        assert_eq!(pool.paid_out(&recipient, TokenType::Lamports).await, SOL / 2);
        assert_eq!(
            sdk.get_latest_private_balance(TokenType::Lamports).await.unwrap(),
            SOL - SOL / 2 - send_fee(SOL / 2)
        );
    }

    #[tokio::test]
    async fn test_send_validation_errors() {
        let (pool, keypair, sdk) = setup(0);

        assert!(matches!(
            sdk.build_send_tx(SOL / 2, Pubkey::default(), TokenType::Lamports)
                .await,
            Err(SdkError::InvalidRecipient(_))
        ));
        assert!(matches!(
            sdk.build_send_tx(0, Pubkey::new_unique(), TokenType::Lamports)
                .await,
            Err(SdkError::ZeroAmount)
        ));
        assert!(matches!(
            sdk.build_send_tx(SOL / 2, Pubkey::new_unique(), TokenType::Lamports)
                .await,
            Err(SdkError::InsufficientFunds { have: 0, .. })
        ));

        pool.credit_shielded(&keypair.pubkey(), TokenType::Usdc, 5)
            .await;
        assert_eq!(
            sdk.get_latest_private_balance(TokenType::Usdc).await.unwrap(),
            5
        );
        assert_eq!(
            sdk.get_latest_private_balance(TokenType::Lamports).await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_top_up_only_mints_lamports() {
        let (_pool, _keypair, sdk) = setup(10 * SOL);
        assert!(matches!(
            sdk.build_top_up_tx(1, TokenType::Usdc).await,
            Err(SdkError::UnsupportedToken(TokenType::Usdc))
        ));
    }

    #[tokio::test]
    async fn test_handles_are_isolated() {
        let pool = Arc::new(LocalPool::new());
        let conn: Arc<dyn Connection> = Arc::new(LoopbackConnection::new(10 * SOL));
        let alice = Keypair::new_random();
        let bob = Keypair::new_random();
        let alice_sdk = pool.handle(alice.pubkey(), Arc::clone(&conn));
        let bob_sdk = pool.handle(bob.pubkey(), conn);

        let mut tx = alice_sdk
            .build_top_up_tx(SOL, TokenType::Lamports)
            .await
            .unwrap();
        tx.partial_sign(&alice).unwrap();

        // Bob's handle refuses Alice's transaction
        assert!(matches!(
            bob_sdk.send_elusiv_tx(tx.clone()).await,
            Err(SdkError::Rejected(_))
        ));
        alice_sdk.send_elusiv_tx(tx).await.unwrap();
        assert_eq!(
            bob_sdk.get_latest_private_balance(TokenType::Lamports).await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_provider_binds_owner() {
        let provider = LocalPoolProvider::new(Arc::new(LocalPool::new()));
        let keypair = Keypair::new_random();
        let conn: Arc<dyn Connection> = Arc::new(LoopbackConnection::new(0));
        let sdk = provider.init(&keypair, conn).await.unwrap();

        provider
            .pool()
            .credit_shielded(&keypair.pubkey(), TokenType::Lamports, 42)
            .await;
        assert_eq!(
            sdk.get_latest_private_balance(TokenType::Lamports).await.unwrap(),
            42
        );
    }
}
