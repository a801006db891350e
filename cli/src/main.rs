mod airdrop;
mod demo;
mod tui;

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use elusiv_demo_config::{DemoConfig, NetworkMode, Settings};
use elusiv_demo_core::{Bootstrapper, KeySource, WalletService, WalletSettings, connector_for};
use elusiv_demo_keypair::{Keypair, default_keypair_path, expand_home};
use elusiv_demo_privacy::local::NETWORK_FEE_LAMPORTS;
use elusiv_demo_privacy::{LocalPool, LocalPoolProvider};

/// TUI mode logs here instead of stderr
const LOG_FILE: &str = "elusiv-demo.log";

#[derive(Parser)]
#[command(name = "elusiv-demo", version, about = "Elusiv privacy SDK demo wallet")]
struct Cli {
    /// Config file (overrides ELUSIV_DEMO_CONFIG and the default locations)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive wallet (default)
    Ui,
    /// Run bootstrap, top-up and send once and print each step
    Demo {
        /// Airdrop enough public funds for the top-up first (rpc network only)
        #[arg(long)]
        fund: bool,
    },
    /// Generate a new keypair file
    Genkey {
        /// Output path (default: ~/.config/solana/elusiv-demo/id.json)
        #[arg(long)]
        out: Option<PathBuf>,
        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
    /// Request a public airdrop for the configured keypair
    Airdrop {
        /// Amount in lamports
        lamports: u64,
    },
    /// Print a sample config file
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Ui);

    if let Err(e) = init_logging(cli.verbose, matches!(command, Command::Ui)) {
        eprintln!("❌ Error initialising logging: {:#}", e);
        std::process::exit(1);
    }

    let result = match command {
        Command::Ui => run_ui(cli.config.as_deref()),
        Command::Demo { fund } => run_demo(cli.config.as_deref(), fund).await,
        Command::Genkey { out, force } => genkey(out, force),
        Command::Airdrop { lamports } => run_airdrop(cli.config.as_deref(), lamports).await,
        Command::Config => {
            print!("{}", DemoConfig::generate_sample());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {:#}", e);
        std::process::exit(1);
    }
}

/// Default filter when RUST_LOG is unset
fn log_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

fn init_logging(verbose: u8, to_file: bool) -> Result<()> {
    let mut builder = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(log_filter(verbose)),
    );

    if to_file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(LOG_FILE)
            .with_context(|| format!("Failed to open log file {LOG_FILE}"))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    builder.init();
    Ok(())
}

fn load_settings(path: Option<&Path>) -> Result<Settings> {
    let config = match path {
        Some(path) => DemoConfig::load_from(path)?,
        None => DemoConfig::load()?,
    };
    config.validate()
}

fn start_wallet(settings: &Settings, keys: KeySource) -> Result<(WalletService, WalletSettings)> {
    let wallet = WalletSettings::from_settings(settings)?;
    let provider = Arc::new(LocalPoolProvider::new(Arc::new(LocalPool::new())));
    let bootstrapper = Bootstrapper::new(keys, connector_for(settings), provider);
    Ok((WalletService::start(bootstrapper, wallet.clone()), wallet))
}

fn run_ui(config: Option<&Path>) -> Result<()> {
    let settings = load_settings(config)?;
    let (service, _) = start_wallet(&settings, KeySource::from_settings(&settings))?;
    log::info!("Starting wallet UI ({:?} network)", settings.network);
    tui::run(service)
}

async fn run_demo(config: Option<&Path>, fund: bool) -> Result<()> {
    let settings = load_settings(config)?;

    let keys = if fund && settings.network == NetworkMode::Rpc {
        let keypair = Arc::new(match &settings.keypair_path {
            Some(path) => Keypair::from_file(path)?,
            None => Keypair::new_random(),
        });
        let connection = connector_for(&settings).connect().await?;
        println!("🌐 Funding {} on {}", keypair.pubkey(), connection.endpoint());
        airdrop::airdrop_if_needed(
            connection.as_ref(),
            &keypair.pubkey(),
            settings.top_up_amount + NETWORK_FEE_LAMPORTS,
        )
        .await?;
        KeySource::Provided(keypair)
    } else {
        if fund {
            println!("✓ Loopback network starts every account funded, skipping airdrop");
        }
        KeySource::from_settings(&settings)
    };

    let (service, wallet) = start_wallet(&settings, keys)?;
    let result = demo::run(&service, wallet.token).await;
    service.shutdown();
    result
}

fn genkey(out: Option<PathBuf>, force: bool) -> Result<()> {
    let path = match out {
        Some(path) => expand_home(&path),
        None => default_keypair_path().context("Could not determine home directory")?,
    };

    if path.exists() {
        if !force {
            anyhow::bail!(
                "File {} already exists. Remove it first or pass --force.",
                path.display()
            );
        }
        fs::remove_file(&path)
            .with_context(|| format!("Failed to remove {}", path.display()))?;
        println!("🗑️  Removed existing {}", path.display());
    }

    println!("🔐 Generating new keypair...");
    let key = Keypair::new_random();
    let written = key.write_new_file(&path)?;

    println!("✅ Wrote new keypair to {}", written.display());
    println!("🔑 Public key: {}", key.pubkey());
    Ok(())
}

async fn run_airdrop(config: Option<&Path>, lamports: u64) -> Result<()> {
    let settings = load_settings(config)?;
    let key_path = settings
        .keypair_path
        .clone()
        .or_else(default_keypair_path)
        .context("Could not determine home directory")?;

    println!("🔑 Loading keypair from {}...", key_path.display());
    let keypair = Keypair::from_file(&key_path)?;

    if settings.network == NetworkMode::Loopback {
        println!("⚠️  Loopback network: the airdrop only lasts for this process");
    }
    let connection = connector_for(&settings).connect().await?;
    println!("🌐 Connected to {}", connection.endpoint());

    airdrop::request_airdrop(connection.as_ref(), &keypair.pubkey(), lamports).await
}
