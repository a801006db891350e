//! Session bootstrap
//!
//! keypair → connection → SDK handle, strictly in that order. No retries: a
//! failure anywhere leaves the wallet without a session.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use elusiv_demo_config::{NetworkMode, Settings};
use elusiv_demo_connection::{Connection, Connector, LoopbackConnector, RpcConnector};
use elusiv_demo_keypair::Keypair;
use elusiv_demo_privacy::PrivacySdk;
use elusiv_demo_privacy::SdkProvider;
use solana_sdk::pubkey::Pubkey;
use tracing::{info, warn};

use crate::error::BootstrapError;

/// Everything a workflow needs, created once by [`Bootstrapper::bootstrap`].
pub struct Session {
    keypair: Arc<Keypair>,
    connection: Arc<dyn Connection>,
    sdk: Arc<dyn PrivacySdk>,
}

impl Session {
    pub fn new(
        keypair: Arc<Keypair>,
        connection: Arc<dyn Connection>,
        sdk: Arc<dyn PrivacySdk>,
    ) -> Self {
        Self {
            keypair,
            connection,
            sdk,
        }
    }

    pub fn keypair(&self) -> &Keypair {
        &self.keypair
    }

    pub fn owner(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    pub fn connection(&self) -> &Arc<dyn Connection> {
        &self.connection
    }

    pub fn sdk(&self) -> &Arc<dyn PrivacySdk> {
        &self.sdk
    }

    pub fn endpoint(&self) -> &str {
        self.connection.endpoint()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("owner", &self.owner())
            .field("endpoint", &self.endpoint())
            .finish()
    }
}

/// Where the session keypair comes from
#[derive(Debug, Clone)]
pub enum KeySource {
    File(PathBuf),
    /// Fresh random key, gone when the process exits
    Ephemeral,
    Provided(Arc<Keypair>),
}

impl KeySource {
    pub fn from_settings(settings: &Settings) -> Self {
        match &settings.keypair_path {
            Some(path) => KeySource::File(path.clone()),
            None => KeySource::Ephemeral,
        }
    }

    fn load(&self) -> Result<Arc<Keypair>, BootstrapError> {
        match self {
            KeySource::File(path) => {
                let keypair = Keypair::from_file(path)?;
                info!(path = %path.display(), owner = %keypair.pubkey(), "Loaded keypair");
                Ok(Arc::new(keypair))
            }
            KeySource::Ephemeral => {
                let keypair = Keypair::new_random();
                warn!(owner = %keypair.pubkey(), "No keypair configured, using an ephemeral key");
                Ok(Arc::new(keypair))
            }
            KeySource::Provided(keypair) => Ok(Arc::clone(keypair)),
        }
    }
}

/// Connector matching the configured network mode
pub fn connector_for(settings: &Settings) -> Arc<dyn Connector> {
    match settings.network {
        NetworkMode::Rpc => Arc::new(RpcConnector::new(
            settings.rpc_url.clone(),
            settings.commitment,
        )),
        NetworkMode::Loopback => Arc::new(LoopbackConnector::new(settings.loopback_airdrop)),
    }
}

pub struct Bootstrapper {
    keys: KeySource,
    connector: Arc<dyn Connector>,
    provider: Arc<dyn SdkProvider>,
}

impl Bootstrapper {
    pub fn new(
        keys: KeySource,
        connector: Arc<dyn Connector>,
        provider: Arc<dyn SdkProvider>,
    ) -> Self {
        Self {
            keys,
            connector,
            provider,
        }
    }

    pub async fn bootstrap(&self) -> Result<Session, BootstrapError> {
        let keypair = self.keys.load()?;
        let connection = self.connector.connect().await?;
        info!(endpoint = connection.endpoint(), "Connection established");

        let sdk = self
            .provider
            .init(&keypair, Arc::clone(&connection))
            .await?;
        info!(owner = %keypair.pubkey(), "Privacy SDK initialised");

        Ok(Session::new(keypair, connection, sdk))
    }
}
