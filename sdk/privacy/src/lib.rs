//! Elusiv Privacy SDK port
//!
//! The shielded pool (balances, proofs, notes, transaction construction) lives
//! in the external Elusiv SDK. This crate pins down the method-call contract
//! the wallet relies on and ships a local simulator that honours it.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       Wallet session                            │
//! │                                                                 │
//! │   Keypair ──┐                                                   │
//! │             ├──▶ SdkProvider::init ──▶ Arc<dyn PrivacySdk>      │
//! │ Connection ─┘                              │                    │
//! │                                            ▼                    │
//! │   build_top_up_tx / build_send_tx ──▶ ElusivTransaction         │
//! │                                            │ (owner signs       │
//! │                                            │  top-ups only)     │
//! │                                            ▼                    │
//! │                          send_elusiv_tx ──▶ SendReceipt         │
//! │                                                                 │
//! │   get_latest_private_balance ──▶ u64 (base units)               │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use elusiv_demo_connection::Connection;
use elusiv_demo_keypair::Keypair;
use solana_sdk::pubkey::Pubkey;

pub mod error;
pub mod local;
pub mod token;
pub mod transaction;

pub use error::SdkError;
pub use local::{LocalPool, LocalPoolHandle, LocalPoolProvider};
pub use token::TokenType;
pub use transaction::{ElusivTransaction, SendReceipt, TxKind};

/// Operations the wallet needs from the privacy SDK.
///
/// A handle is bound to one owner and one connection for its whole life.
#[async_trait]
pub trait PrivacySdk: Send + Sync {
    /// Build an unsigned transaction moving `amount` of the owner's public
    /// funds into the shielded balance. The owner must sign it before submission.
    async fn build_top_up_tx(
        &self,
        amount: u64,
        token: TokenType,
    ) -> Result<ElusivTransaction, SdkError>;

    /// Build a transaction paying `amount` out of the shielded balance.
    /// Authorised by the SDK itself, no owner signature needed.
    async fn build_send_tx(
        &self,
        amount: u64,
        recipient: Pubkey,
        token: TokenType,
    ) -> Result<ElusivTransaction, SdkError>;

    /// Submit a built (and, for top-ups, signed) transaction.
    async fn send_elusiv_tx(&self, tx: ElusivTransaction) -> Result<SendReceipt, SdkError>;

    /// Latest shielded balance of the owner, in base units of `token`
    async fn get_latest_private_balance(&self, token: TokenType) -> Result<u64, SdkError>;
}

/// Creates SDK handles bound to a keypair and a connection.
#[async_trait]
pub trait SdkProvider: Send + Sync {
    async fn init(
        &self,
        keypair: &Keypair,
        connection: Arc<dyn Connection>,
    ) -> Result<Arc<dyn PrivacySdk>, SdkError>;
}
