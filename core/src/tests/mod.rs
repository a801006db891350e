mod bootstrap;

use std::sync::Arc;
use std::time::Duration;

use elusiv_demo_config::LAMPORTS_PER_SOL;
use elusiv_demo_connection::LoopbackConnector;
use solana_sdk::pubkey::Pubkey;

use crate::session::{Bootstrapper, KeySource, Session};
use crate::settings::WalletSettings;
use mock::{MockProvider, MockSdk};

const TOP_UP: u64 = LAMPORTS_PER_SOL;
const SEND: u64 = LAMPORTS_PER_SOL / 2;
const WAIT: Duration = Duration::from_secs(5);

fn settings(recipient: Option<Pubkey>) -> WalletSettings {
    WalletSettings {
        recipient,
        ..WalletSettings::default()
    }
}

fn bootstrapper(sdk: &Arc<MockSdk>) -> Bootstrapper {
    Bootstrapper::new(
        KeySource::Ephemeral,
        Arc::new(LoopbackConnector::new(0)),
        Arc::new(MockProvider { sdk: sdk.clone() }),
    )
}

async fn session(sdk: &Arc<MockSdk>) -> Session {
    bootstrapper(sdk).bootstrap().await.unwrap()
}
