//! Network connection port
//!
//! The session holds one `Connection` for its whole lifetime. The privacy SDK
//! reads blockhashes and public balances through it; the CLI uses it for
//! airdrops.
//!
//! Two implementations ship with the wallet:
//! - [`RpcConnection`]: Solana JSON-RPC via `solana-client`
//! - [`LoopbackConnection`]: an in-process cluster for offline runs and tests

use std::sync::Arc;

use async_trait::async_trait;
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use thiserror::Error;

pub mod loopback;
pub mod rpc;

pub use loopback::{LoopbackConnection, LoopbackConnector};
pub use rpc::{RpcConnection, RpcConnector};

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("cannot reach {endpoint}: {reason}")]
    Unreachable { endpoint: String, reason: String },

    #[error("rpc request failed: {0}")]
    Rpc(String),

    #[error("airdrop {0} not confirmed in time")]
    AirdropTimeout(Signature),
}

/// A live handle to the cluster.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Human readable endpoint, shown in logs and the UI
    fn endpoint(&self) -> &str;

    /// Recent blockhash for new transactions
    async fn latest_blockhash(&self) -> Result<Hash, ConnectionError>;

    /// Public (non-shielded) lamport balance of an account
    async fn balance(&self, owner: &Pubkey) -> Result<u64, ConnectionError>;

    /// Ask the cluster faucet for lamports and wait for confirmation
    async fn request_airdrop(
        &self,
        owner: &Pubkey,
        lamports: u64,
    ) -> Result<Signature, ConnectionError>;
}

/// Opens connections. Bootstrap calls this exactly once.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> Result<Arc<dyn Connection>, ConnectionError>;
}
