use anyhow::Result;
use elusiv_demo_connection::Connection;
use elusiv_demo_privacy::TokenType;
use solana_sdk::pubkey::Pubkey;

/// Requests an airdrop of `amount` and prints the balance before and after.
pub async fn request_airdrop(connection: &dyn Connection, pubkey: &Pubkey, amount: u64) -> Result<()> {
    let sol = TokenType::Lamports;
    let balance = connection.balance(pubkey).await?;
    println!("💰 Public balance: {}", sol.format_amount(balance));

    println!("💸 Requesting airdrop of {}...", sol.format_amount(amount));
    let sig = connection.request_airdrop(pubkey, amount).await?;

    let new_balance = connection.balance(pubkey).await?;
    println!("✅ Airdrop confirmed: {}", sig);
    println!("💰 New public balance: {}", sol.format_amount(new_balance));
    Ok(())
}

/// Tops up the public balance if it is below `min_balance`
pub async fn airdrop_if_needed(
    connection: &dyn Connection,
    pubkey: &Pubkey,
    min_balance: u64,
) -> Result<()> {
    let balance = connection.balance(pubkey).await?;
    if balance >= min_balance {
        println!(
            "✓ Sufficient public balance available ({})",
            TokenType::Lamports.format_amount(balance)
        );
        return Ok(());
    }
    request_airdrop(connection, pubkey, min_balance - balance).await
}
