//! In-process cluster
//!
//! Keeps a public lamport ledger and hands out deterministic blockhashes.
//! Every account starts with the configured opening balance, which stands in
//! for the devnet faucet.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use tokio::sync::Mutex;
use tracing::debug;

use crate::{Connection, ConnectionError, Connector};

pub const LOOPBACK_ENDPOINT: &str = "loopback://local";

pub struct LoopbackConnection {
    opening_balance: u64,
    ledger: Mutex<HashMap<Pubkey, u64>>,
    slot: AtomicU64,
}

impl LoopbackConnection {
    pub fn new(opening_balance: u64) -> Self {
        Self {
            opening_balance,
            ledger: Mutex::new(HashMap::new()),
            slot: AtomicU64::new(0),
        }
    }

    fn next_digest(&self, domain: &[u8]) -> blake3::OutputReader {
        let slot = self.slot.fetch_add(1, Ordering::Relaxed);
        let mut hasher = blake3::Hasher::new();
        hasher.update(domain);
        hasher.update(&slot.to_le_bytes());
        hasher.finalize_xof()
    }
}

#[async_trait]
impl Connection for LoopbackConnection {
    fn endpoint(&self) -> &str {
        LOOPBACK_ENDPOINT
    }

    async fn latest_blockhash(&self) -> Result<Hash, ConnectionError> {
        let mut bytes = [0u8; 32];
        self.next_digest(b"loopback-blockhash").fill(&mut bytes);
        Ok(Hash::new_from_array(bytes))
    }

    async fn balance(&self, owner: &Pubkey) -> Result<u64, ConnectionError> {
        let ledger = self.ledger.lock().await;
        Ok(ledger.get(owner).copied().unwrap_or(self.opening_balance))
    }

    async fn request_airdrop(
        &self,
        owner: &Pubkey,
        lamports: u64,
    ) -> Result<Signature, ConnectionError> {
        let mut ledger = self.ledger.lock().await;
        let entry = ledger.entry(*owner).or_insert(self.opening_balance);
        *entry = entry.saturating_add(lamports);
        debug!(%owner, lamports, balance = *entry, "Loopback airdrop");

        let mut bytes = [0u8; 64];
        self.next_digest(b"loopback-airdrop").fill(&mut bytes);
        Ok(Signature::from(bytes))
    }
}

/// Hands out a fresh [`LoopbackConnection`] per call.
pub struct LoopbackConnector {
    opening_balance: u64,
}

impl LoopbackConnector {
    pub fn new(opening_balance: u64) -> Self {
        Self { opening_balance }
    }
}

#[async_trait]
impl Connector for LoopbackConnector {
    async fn connect(&self) -> Result<Arc<dyn Connection>, ConnectionError> {
        Ok(Arc::new(LoopbackConnection::new(self.opening_balance)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_opening_balance_and_airdrop() {
        let conn = LoopbackConnection::new(1_000);
        let owner = Pubkey::new_unique();

        assert_eq!(conn.balance(&owner).await.unwrap(), 1_000);
        conn.request_airdrop(&owner, 500).await.unwrap();
        assert_eq!(conn.balance(&owner).await.unwrap(), 1_500);

        // Other accounts are untouched
        assert_eq!(conn.balance(&Pubkey::new_unique()).await.unwrap(), 1_000);
    }

    #[tokio::test]
    async fn test_blockhashes_advance() {
        let conn = LoopbackConnection::new(0);
        let a = conn.latest_blockhash().await.unwrap();
        let b = conn.latest_blockhash().await.unwrap();
        assert_ne!(a, b);
        assert_ne!(a, Hash::default());
    }

    #[tokio::test]
    async fn test_connector_hands_out_fresh_clusters() {
        let connector = LoopbackConnector::new(7);
        let conn = connector.connect().await.unwrap();
        assert_eq!(conn.endpoint(), LOOPBACK_ENDPOINT);
        assert_eq!(conn.balance(&Pubkey::new_unique()).await.unwrap(), 7);
    }
}
