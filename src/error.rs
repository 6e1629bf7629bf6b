//! Error types for minichain

use thiserror::Error;

/// Errors raised by the chain, the crypto layer and configuration loading.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    #[error("Chain has no blocks")]
    EmptyChain,
    #[error("Invalid block index. Expected {expected}, but got {got}.")]
    IndexMismatch { expected: u64, got: u64 },
    #[error("Invalid previous block hash. Expected {expected}, but got {got}.")]
    PrevHashMismatch { expected: String, got: String },
    #[error("Cryptographic error: {0}")]
    CryptoError(String),
    #[error("Signature verification failed")]
    VerificationFailed,
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Why a transaction was refused by the pool.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RejectReason {
    #[error("Invalid sender: {0}")]
    InvalidSender(String),
    #[error("Invalid receiver: {0}")]
    InvalidReceiver(String),
    #[error("Sender and receiver cannot be the same ({0})")]
    SameSenderReceiver(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(f64),
}

/// Which integrity check a block failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationFailure {
    /// Stored hash differs from the hash recomputed over the stored fields.
    HashMismatch,
    /// Stored `prev_hash` differs from the actual previous block's hash.
    LinkMismatch,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Block {index} failed validation: {reason:?}")]
pub struct ChainValidationError {
    pub index: u64,
    pub reason: ValidationFailure,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MiningError {
    #[error("Mining was cancelled")]
    Cancelled,
    #[error("Nonce space exhausted without meeting difficulty {0}")]
    NonceSpaceExhausted(usize),
    #[error(transparent)]
    Chain(#[from] ChainError),
    #[error("Mining worker failed: {0}")]
    Worker(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BalanceError {
    #[error("Insufficient balance for {who}: available {available:.2}, requested {requested:.2}")]
    InsufficientFunds {
        who: String,
        available: f64,
        requested: f64,
    },
    #[error("Unknown participant: {0}")]
    UnknownParticipant(String),
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, ChainError>;
