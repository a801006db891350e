use elusiv_demo_connection::ConnectionError;
use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

use crate::token::TokenType;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("unknown token type: {0}")]
    UnknownToken(String),

    #[error("{0} is not supported by this pool")]
    UnsupportedToken(TokenType),

    #[error("amount must be greater than zero")]
    ZeroAmount,

    #[error("invalid recipient: {0}")]
    InvalidRecipient(Pubkey),

    #[error("insufficient {token} balance: have {have}, need {need}")]
    InsufficientFunds {
        token: TokenType,
        have: u64,
        need: u64,
    },

    #[error("transaction is missing a required signature")]
    MissingSignature,

    #[error("signing failed: {0}")]
    Signing(String),

    #[error("malformed transaction: {0}")]
    Malformed(String),

    #[error("transaction rejected: {0}")]
    Rejected(String),

    #[error(transparent)]
    Connection(#[from] ConnectionError),
}
