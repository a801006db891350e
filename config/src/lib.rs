//! Elusiv Demo Configuration
//!
//! Shared configuration crate for the demo wallet.
//!
//! Handles loading configuration from:
//! 1. ELUSIV_DEMO_CONFIG env var (explicit path)
//! 2. ./config.toml (current directory)
//! 3. ~/.elusiv-demo/config.toml (user home)
//!
//! Environment variables take precedence over TOML config.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use solana_commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::{env, fs};

const CONFIG_FILE_NAME: &str = "config.toml";
const CONFIG_DIR_NAME: &str = ".elusiv-demo";

/// Lamports in one SOL.
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

// ============================================================================
// Default Constants
// ============================================================================

const DEFAULT_RPC_URL: &str = "https://api.devnet.solana.com";
const DEFAULT_COMMITMENT: &str = "confirmed";
const DEFAULT_LOOPBACK_AIRDROP: u64 = 2 * LAMPORTS_PER_SOL;
const DEFAULT_TOKEN: &str = "LAMPORTS";
const DEFAULT_TOP_UP_AMOUNT: u64 = LAMPORTS_PER_SOL;
const DEFAULT_SEND_AMOUNT: u64 = LAMPORTS_PER_SOL / 2;

// ============================================================================
// Config Structs
// ============================================================================

/// Root configuration structure (matches TOML layout)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DemoConfig {
    #[serde(default)]
    pub solana: SolanaConfig,
    #[serde(default)]
    pub wallet: WalletConfig,
    #[serde(default)]
    pub transfer: TransferConfig,
}

/// Which kind of network connection the session opens.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NetworkMode {
    /// JSON-RPC against a Solana cluster
    #[default]
    Rpc,
    /// In-process cluster, nothing leaves the machine
    Loopback,
}

impl FromStr for NetworkMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "rpc" => Ok(NetworkMode::Rpc),
            "loopback" | "local" => Ok(NetworkMode::Loopback),
            other => bail!("unknown network mode '{other}' (expected 'rpc' or 'loopback')"),
        }
    }
}

/// Solana connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolanaConfig {
    #[serde(default)]
    pub network: NetworkMode,
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,
    #[serde(default = "default_commitment")]
    pub commitment: String,
    /// Public lamports credited to the wallet when the loopback cluster starts
    #[serde(default = "default_loopback_airdrop")]
    pub loopback_airdrop: u64,
}

impl Default for SolanaConfig {
    fn default() -> Self {
        Self {
            network: NetworkMode::default(),
            rpc_url: DEFAULT_RPC_URL.into(),
            commitment: DEFAULT_COMMITMENT.into(),
            loopback_airdrop: DEFAULT_LOOPBACK_AIRDROP,
        }
    }
}

fn default_rpc_url() -> String {
    DEFAULT_RPC_URL.into()
}
fn default_commitment() -> String {
    DEFAULT_COMMITMENT.into()
}
fn default_loopback_airdrop() -> u64 {
    DEFAULT_LOOPBACK_AIRDROP
}

/// Key material configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WalletConfig {
    /// Solana JSON key file. An ephemeral key is generated when unset.
    #[serde(default)]
    pub keypair_path: Option<String>,
}

/// Fixed workflow parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferConfig {
    #[serde(default = "default_token")]
    pub token: String,
    #[serde(default = "default_top_up_amount")]
    pub top_up_amount: u64,
    #[serde(default = "default_send_amount")]
    pub send_amount: u64,
    /// Base58 recipient of the send workflow
    #[serde(default)]
    pub recipient: Option<String>,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            token: DEFAULT_TOKEN.into(),
            top_up_amount: DEFAULT_TOP_UP_AMOUNT,
            send_amount: DEFAULT_SEND_AMOUNT,
            recipient: None,
        }
    }
}

fn default_token() -> String {
    DEFAULT_TOKEN.into()
}
fn default_top_up_amount() -> u64 {
    DEFAULT_TOP_UP_AMOUNT
}
fn default_send_amount() -> u64 {
    DEFAULT_SEND_AMOUNT
}

// ============================================================================
// Validated Settings
// ============================================================================

/// Configuration after validation. Everything here has been parsed.
#[derive(Debug, Clone)]
pub struct Settings {
    pub network: NetworkMode,
    pub rpc_url: String,
    pub commitment: CommitmentConfig,
    pub loopback_airdrop: u64,
    pub keypair_path: Option<PathBuf>,
    pub token: String,
    pub top_up_amount: u64,
    pub send_amount: u64,
    /// `None` when no recipient is configured; the send workflow stays disabled
    pub recipient: Option<Pubkey>,
}

fn parse_commitment(level: &str) -> Result<CommitmentConfig> {
    match level.to_ascii_lowercase().as_str() {
        "processed" => Ok(CommitmentConfig::processed()),
        "confirmed" => Ok(CommitmentConfig::confirmed()),
        "finalized" => Ok(CommitmentConfig::finalized()),
        other => bail!("unknown commitment level '{other}'"),
    }
}

/// Empty or whitespace-only recipients count as unset.
fn parse_recipient(raw: Option<&str>) -> Result<Option<Pubkey>> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    let key = Pubkey::from_str(raw).with_context(|| format!("Invalid recipient public key: {raw}"))?;
    if key == Pubkey::default() {
        bail!("Recipient public key must not be the all-zero address");
    }
    Ok(Some(key))
}

// ============================================================================
// Environment Variable Helpers
// ============================================================================

/// Set field from env var if present
fn env_string(key: &str, field: &mut String) {
    if let Ok(v) = env::var(key) {
        *field = v;
    }
}

/// Set Option<String> from env var if present
fn env_option_string(key: &str, field: &mut Option<String>) {
    if let Ok(v) = env::var(key) {
        *field = Some(v);
    }
}

/// Set field from env var if present and parseable
fn env_parse<T: FromStr>(key: &str, field: &mut T) {
    if let Ok(v) = env::var(key) {
        match v.parse() {
            Ok(parsed) => *field = parsed,
            Err(_) => log::warn!("Ignoring unparseable value for {key}: {v}"),
        }
    }
}

// ============================================================================
// Implementation
// ============================================================================

impl DemoConfig {
    /// Load configuration from config file with env var overrides
    pub fn load() -> Result<Self> {
        let mut config = match Self::find_config_file() {
            Some(path) => {
                log::info!("Loading config from: {}", path.display());
                Self::read_file(&path)?
            }
            None => {
                log::info!("No config file found, using defaults and environment variables");
                Self::default()
            }
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a specific file path
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = Self::read_file(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Find the config file path
    fn find_config_file() -> Option<PathBuf> {
        if let Ok(path) = env::var("ELUSIV_DEMO_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let local_path = PathBuf::from(CONFIG_FILE_NAME);
        if local_path.exists() {
            return Some(local_path);
        }

        Self::default_config_path().filter(|p| p.exists())
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // Solana
        env_parse("ELUSIV_NETWORK", &mut self.solana.network);
        env_string("SOLANA_RPC_URL", &mut self.solana.rpc_url);
        env_string("SOLANA_COMMITMENT", &mut self.solana.commitment);
        env_parse("ELUSIV_LOOPBACK_AIRDROP", &mut self.solana.loopback_airdrop);

        // Wallet
        env_option_string("ELUSIV_KEYPAIR", &mut self.wallet.keypair_path);

        // Transfer
        env_string("ELUSIV_TOKEN", &mut self.transfer.token);
        env_parse("ELUSIV_TOPUP_AMOUNT", &mut self.transfer.top_up_amount);
        env_parse("ELUSIV_SEND_AMOUNT", &mut self.transfer.send_amount);
        env_option_string("ELUSIV_RECIPIENT", &mut self.transfer.recipient);
    }

    /// Check every value a workflow depends on and produce runtime settings.
    pub fn validate(&self) -> Result<Settings> {
        if self.transfer.top_up_amount == 0 {
            bail!("transfer.top_up_amount must be greater than zero");
        }
        if self.transfer.send_amount == 0 {
            bail!("transfer.send_amount must be greater than zero");
        }
        if self.solana.network == NetworkMode::Rpc && self.solana.rpc_url.trim().is_empty() {
            bail!("solana.rpc_url must be set when solana.network = \"rpc\"");
        }

        Ok(Settings {
            network: self.solana.network,
            rpc_url: self.solana.rpc_url.clone(),
            commitment: parse_commitment(&self.solana.commitment)?,
            loopback_airdrop: self.solana.loopback_airdrop,
            keypair_path: self.wallet.keypair_path.as_ref().map(PathBuf::from),
            token: self.transfer.token.clone(),
            top_up_amount: self.transfer.top_up_amount,
            send_amount: self.transfer.send_amount,
            recipient: parse_recipient(self.transfer.recipient.as_deref())?,
        })
    }

    /// Get the default config file path
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Generate a sample config file
    pub fn generate_sample() -> String {
        let mut sample = Self::default();
        sample.wallet.keypair_path = Some("~/.config/solana/elusiv-demo/id.json".into());
        sample.transfer.recipient = Some(String::new());
        toml::to_string_pretty(&sample).unwrap_or_default()
    }
}

// ============================================================================
// Tests
// ============================================================================
