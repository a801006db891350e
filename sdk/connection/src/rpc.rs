use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_commitment_config::CommitmentConfig;
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use tracing::{debug, info};

use crate::{Connection, ConnectionError, Connector};

const AIRDROP_CONFIRM_ATTEMPTS: u32 = 30;
const AIRDROP_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Connection backed by a Solana JSON-RPC endpoint.
pub struct RpcConnection {
    client: RpcClient,
    endpoint: String,
}

impl RpcConnection {
    pub fn new(url: impl Into<String>, commitment: CommitmentConfig) -> Self {
        let endpoint = url.into();
        Self {
            client: RpcClient::new_with_commitment(endpoint.clone(), commitment),
            endpoint,
        }
    }

    fn rpc_err(e: impl std::fmt::Display) -> ConnectionError {
        ConnectionError::Rpc(e.to_string())
    }
}

#[async_trait]
impl Connection for RpcConnection {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn latest_blockhash(&self) -> Result<Hash, ConnectionError> {
        self.client.get_latest_blockhash().await.map_err(Self::rpc_err)
    }

    async fn balance(&self, owner: &Pubkey) -> Result<u64, ConnectionError> {
        self.client.get_balance(owner).await.map_err(Self::rpc_err)
    }

    async fn request_airdrop(
        &self,
        owner: &Pubkey,
        lamports: u64,
    ) -> Result<Signature, ConnectionError> {
        let sig = self
            .client
            .request_airdrop(owner, lamports)
            .await
            .map_err(Self::rpc_err)?;
        info!(%sig, lamports, "Airdrop requested");

        for attempt in 0..AIRDROP_CONFIRM_ATTEMPTS {
            tokio::time::sleep(AIRDROP_POLL_INTERVAL).await;
            if self
                .client
                .confirm_transaction(&sig)
                .await
                .map_err(Self::rpc_err)?
            {
                return Ok(sig);
            }
            debug!(attempt, "Waiting for airdrop confirmation");
        }

        Err(ConnectionError::AirdropTimeout(sig))
    }
}

/// Opens an [`RpcConnection`] and checks the node answers before handing it out.
pub struct RpcConnector {
    url: String,
    commitment: CommitmentConfig,
}

impl RpcConnector {
    pub fn new(url: impl Into<String>, commitment: CommitmentConfig) -> Self {
        Self {
            url: url.into(),
            commitment,
        }
    }
}

#[async_trait]
impl Connector for RpcConnector {
    async fn connect(&self) -> Result<Arc<dyn Connection>, ConnectionError> {
        info!("Connecting to Solana RPC: {}", self.url);
        let conn = RpcConnection::new(self.url.clone(), self.commitment);

        let version = conn
            .client
            .get_version()
            .await
            .map_err(|e| ConnectionError::Unreachable {
                endpoint: self.url.clone(),
                reason: e.to_string(),
            })?;
        info!("Connected, node version {}", version.solana_core);

        Ok(Arc::new(conn))
    }
}
