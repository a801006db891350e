use elusiv_demo_privacy::TokenType;
use tracing::debug;

use crate::error::WorkflowError;
use crate::session::Session;

/// Latest shielded balance of the session owner, in base units of `token`.
pub async fn fetch_private_balance(
    session: &Session,
    token: TokenType,
) -> Result<u64, WorkflowError> {
    let balance = session
        .sdk()
        .get_latest_private_balance(token)
        .await
        .map_err(WorkflowError::Balance)?;
    debug!(owner = %session.owner(), %token, balance, "Fetched private balance");
    Ok(balance)
}
