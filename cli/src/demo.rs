//! Scripted walk through the wallet: bootstrap, top-up, send.

use anyhow::{Result, bail};
use elusiv_demo_core::{AppState, BalanceView, Readiness, WalletService, WorkflowError};
use elusiv_demo_privacy::TokenType;

fn print_balance(state: &AppState) {
    match &state.balance {
        BalanceView::Known(amount) => {
            println!("💰 Private balance: {}", state.token.format_amount(*amount))
        }
        BalanceView::Fetching => println!("⏳ Private balance: loading..."),
        BalanceView::Failed(e) => println!("⚠️  Private balance unavailable: {}", e),
    }
    if let Some(lamports) = state.public_balance {
        println!(
            "🌐 Public balance: {}",
            TokenType::Lamports.format_amount(lamports)
        );
    }
}

pub async fn run(service: &WalletService, token: TokenType) -> Result<()> {
    println!("🔌 Initialising session...");
    let state = service.settled().await?;
    if let Readiness::Failed(e) = &state.readiness {
        bail!("session initialisation failed: {e}");
    }
    if let (Some(owner), Some(endpoint)) = (&state.owner, &state.endpoint) {
        println!("🌐 Connected to {}", endpoint);
        println!("🔑 Owner: {}", owner);
    }
    print_balance(&state);

    println!("\n📥 Step 1: Top-up ({})", token);
    let sig = service.top_up().await?;
    println!("✅ Top-up complete: {}", sig);
    print_balance(&service.settled().await?);

    println!("\n📤 Step 2: Send");
    match service.send().await {
        Ok(sig) => println!("✅ Send complete: {}", sig),
        Err(WorkflowError::Disabled(reason)) => println!("⏭️  Send skipped: {}", reason),
        Err(e) => return Err(e.into()),
    }
    print_balance(&service.settled().await?);

    println!("\n🎉 Done");
    Ok(())
}
