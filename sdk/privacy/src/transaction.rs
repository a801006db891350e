use elusiv_demo_keypair::Keypair;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;
use wincode::{SchemaRead, SchemaWrite};

use crate::error::SdkError;
use crate::token::TokenType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxKind {
    /// Public funds → shielded balance
    TopUp,
    /// Shielded balance → recipient
    Send,
}

/// A transaction built by the SDK and not yet submitted.
///
/// Lives only between build and submit; nothing keeps it afterwards.
#[derive(Debug, Clone)]
pub struct ElusivTransaction {
    pub tx: Transaction,
    pub kind: TxKind,
    pub token: TokenType,
    pub amount: u64,
    pub fee: u64,
    pub recipient: Option<Pubkey>,
}

impl ElusivTransaction {
    /// Top-ups spend the owner's public funds, so the owner must sign them.
    pub fn needs_owner_signature(&self) -> bool {
        self.kind == TxKind::TopUp
    }

    /// Adds `signer`'s signature against the transaction's own blockhash.
    pub fn partial_sign(&mut self, signer: &Keypair) -> Result<(), SdkError> {
        let blockhash = self.tx.message.recent_blockhash;
        self.tx
            .try_partial_sign(&[signer.solana_keypair()], blockhash)
            .map_err(|e| SdkError::Signing(e.to_string()))
    }

    pub fn is_signed(&self) -> bool {
        self.tx.is_signed()
    }
}

/// Result of a successful submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendReceipt {
    pub signature: Signature,
}

pub(crate) const KIND_TOP_UP: u8 = 1;
pub(crate) const KIND_SEND: u8 = 2;

/// Instruction payload understood by the local pool program.
#[derive(Debug, Clone, PartialEq, Eq, SchemaWrite, SchemaRead)]
pub(crate) struct PoolInstruction {
    pub kind: u8,
    pub token: u8,
    pub amount: u64,
    pub fee: u64,
    pub owner: [u8; 32],
    pub recipient: [u8; 32],
}

impl PoolInstruction {
    pub fn encode(&self) -> Result<Vec<u8>, SdkError> {
        wincode::serialize(self).map_err(|e| SdkError::Malformed(e.to_string()))
    }

    pub fn decode(data: &[u8]) -> Result<Self, SdkError> {
        wincode::deserialize::<PoolInstruction>(data).map_err(|e| SdkError::Malformed(e.to_string()))
    }

    pub fn tx_kind(&self) -> Result<TxKind, SdkError> {
        match self.kind {
            KIND_TOP_UP => Ok(TxKind::TopUp),
            KIND_SEND => Ok(TxKind::Send),
            other => Err(SdkError::Malformed(format!("unknown pool instruction {other}"))),
        }
    }

    pub fn token_type(&self) -> Result<TokenType, SdkError> {
        TokenType::from_code(self.token)
            .ok_or_else(|| SdkError::Malformed(format!("unknown token code {}", self.token)))
    }
}
