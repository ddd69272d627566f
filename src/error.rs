//! Error types for StakeChain

use crate::transaction::Amount;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    // Transaction validation
    #[error("Sender and recipient addresses must both be present")]
    InvalidAddress,
    #[error("Transaction amount must be positive, got {0}")]
    NonPositiveAmount(Amount),
    #[error("Insufficient balance: {balance} < {amount}")]
    InsufficientBalance { balance: Amount, amount: Amount },
    #[error("Cannot send funds to yourself")]
    SelfTransfer,

    // Pool admission
    #[error("Transaction {0} is already in the pool")]
    DuplicateTransaction(String),
    #[error("Transaction pool is full ({0} entries)")]
    PoolFull(usize),

    // Validator admission
    #[error("Minimum stake is {min}, got {stake}")]
    StakeTooLow { stake: u64, min: u64 },
    #[error("Stake {stake} would overflow the network total of {total}")]
    StakeOverflow { stake: u64, total: u64 },

    // Block production
    #[error("No pending transactions to process")]
    EmptyPool,

    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),
    #[error("Validator not found: {0}")]
    ValidatorNotFound(String),
    #[error("Block not found at index {0}")]
    BlockNotFound(u64),
    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),
    #[error("Cryptographic error: {0}")]
    Crypto(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ChainError {
    /// Stable name of the error kind, suitable for machine-readable responses.
    pub fn kind(&self) -> &'static str {
        match self {
            ChainError::InvalidAddress => "InvalidAddress",
            ChainError::NonPositiveAmount(_) => "NonPositiveAmount",
            ChainError::InsufficientBalance { .. } => "InsufficientBalance",
            ChainError::SelfTransfer => "SelfTransfer",
            ChainError::DuplicateTransaction(_) => "DuplicateTransaction",
            ChainError::PoolFull(_) => "PoolFull",
            ChainError::StakeTooLow { .. } => "StakeTooLow",
            ChainError::StakeOverflow { .. } => "StakeOverflow",
            ChainError::EmptyPool => "EmptyPool",
            ChainError::InvalidTransaction(_) => "InvalidTransaction",
            ChainError::ValidatorNotFound(_) => "ValidatorNotFound",
            ChainError::BlockNotFound(_) => "BlockNotFound",
            ChainError::TransactionNotFound(_) => "TransactionNotFound",
            ChainError::Crypto(_) => "CryptoError",
            ChainError::Config(_) => "ConfigError",
        }
    }
}

impl From<toml::de::Error> for ChainError {
    fn from(err: toml::de::Error) -> Self {
        ChainError::Config(err.to_string())
    }
}

impl From<std::io::Error> for ChainError {
    fn from(err: std::io::Error) -> Self {
        ChainError::Config(err.to_string())
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, ChainError>;
