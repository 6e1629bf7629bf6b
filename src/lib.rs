//! minichain - a tamper-evident ledger of signed transfers sealed by proof-of-work
//!
//! # Architecture
//!
//! ## Core Blockchain
//! - [`blockchain`] - Block hashing, the chain and its integrity validation
//! - [`transaction`] - Transfers, canonical text and admission checks
//! - [`mempool`] - Bounded pool of signed, not-yet-mined transactions
//!
//! ## Consensus
//! - [`miner`] - Signature filtering and proof-of-work nonce search
//! - [`ledger`] - Thread-safe facade over chain, pool and miner
//!
//! ## Cryptography
//! - [`crypto`] - Signatures and verification (secp256k1)
//!
//! ## Caller-side views
//! - [`balances`] - Balance sheet rebuilt from the exported chain
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`error`] - Error types

#![forbid(unsafe_code)]

// ============================================================================
// Core Blockchain
// ============================================================================
pub mod blockchain;
pub mod mempool;
pub mod transaction;

// ============================================================================
// Consensus & Mining
// ============================================================================
pub mod ledger;
pub mod miner;

// ============================================================================
// Cryptography
// ============================================================================
pub mod crypto;

// ============================================================================
// Caller-side views
// ============================================================================
pub mod balances;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod config;
pub mod error;

pub use ledger::{BlockSummary, Ledger, MineOutcome};
