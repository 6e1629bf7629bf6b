//! Proof-of-work sealing of pending transactions
//!
//! The nonce search is sequential from zero and unbounded: at high
//! difficulty it can run for a very long time. Callers bound it with a
//! [`CancelFlag`], which is polled every [`CANCEL_CHECK_INTERVAL`] nonces.

use crate::blockchain::{now_timestamp, Block};
use crate::error::MiningError;
use crate::transaction::{Identity, PendingTransaction, TRANSACTION_DELIMITER};
use secp256k1::PublicKey;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const DEFAULT_DIFFICULTY: usize = 3;
/// A hex SHA-256 digest has 64 characters.
pub const MAX_DIFFICULTY: usize = 64;
pub const CANCEL_CHECK_INTERVAL: u64 = 1024;

/// Public keys of the participants, used to check who signed what.
pub type PublicKeys = HashMap<Identity, PublicKey>;

/// Shared flag that stops a running nonce search.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// True when `hash` starts with `difficulty` '0' characters.
pub fn meets_difficulty(hash: &str, difficulty: usize) -> bool {
    hash.len() >= difficulty && hash.bytes().take(difficulty).all(|b| b == b'0')
}

/// Pending transactions split by whether their signature checks out
/// against the key registered for the claimed sender.
#[derive(Debug, Default)]
pub struct Verified {
    pub valid: Vec<PendingTransaction>,
    pub dropped: Vec<PendingTransaction>,
}

pub fn verify_pending(pending: Vec<PendingTransaction>, keys: &PublicKeys) -> Verified {
    let mut verified = Verified::default();
    for tx in pending {
        let ok = keys
            .get(tx.sender())
            .map(|key| tx.verify(key))
            .unwrap_or(false);
        if ok {
            debug!(transaction = %tx.text, "Transaction verified");
            verified.valid.push(tx);
        } else {
            warn!(transaction = %tx.text, "Invalid transaction skipped");
            verified.dropped.push(tx);
        }
    }
    verified
}

/// Search nonces 0, 1, 2, … for the first whose block hash meets `difficulty`.
/// Returns the nonce together with the winning hash.
pub fn find_nonce(
    index: u64,
    prev_hash: &str,
    timestamp: u64,
    data: &str,
    difficulty: usize,
    cancel: &CancelFlag,
) -> Result<(u64, String), MiningError> {
    // Every field but the nonce is fixed for the whole search.
    let mut prefix = Sha256::new();
    prefix.update(index.to_string().as_bytes());
    prefix.update(prev_hash.as_bytes());
    prefix.update(timestamp.to_string().as_bytes());
    prefix.update(data.as_bytes());

    let mut nonce: u64 = 0;
    loop {
        if nonce % CANCEL_CHECK_INTERVAL == 0 && cancel.is_cancelled() {
            info!(index, tried = nonce, "Mining cancelled");
            return Err(MiningError::Cancelled);
        }

        let mut hasher = prefix.clone();
        hasher.update(nonce.to_string().as_bytes());
        let hash = hex::encode(hasher.finalize());
        if meets_difficulty(&hash, difficulty) {
            info!(index, nonce, "Nonce found");
            return Ok((nonce, hash));
        }

        nonce = nonce
            .checked_add(1)
            .ok_or(MiningError::NonceSpaceExhausted(difficulty))?;
    }
}

/// What a mining run produced.
#[derive(Debug)]
pub enum MinerOutput {
    Sealed {
        block: Block,
        included: Vec<PendingTransaction>,
        dropped: Vec<PendingTransaction>,
    },
    NoPendingTransactions,
    NoValidTransactions {
        dropped: Vec<PendingTransaction>,
    },
}

#[derive(Debug, Clone, Copy)]
pub struct Miner {
    difficulty: usize,
}

impl Default for Miner {
    fn default() -> Self {
        Miner::new(DEFAULT_DIFFICULTY)
    }
}

impl Miner {
    /// `difficulty` is capped at [`MAX_DIFFICULTY`]; 0 accepts any hash.
    pub fn new(difficulty: usize) -> Self {
        Miner {
            difficulty: difficulty.min(MAX_DIFFICULTY),
        }
    }

    pub fn difficulty(&self) -> usize {
        self.difficulty
    }

    /// Seal the verified subset of `pending` into a block extending `tail`,
    /// stamped with the current time.
    pub fn mine(
        &self,
        pending: Vec<PendingTransaction>,
        keys: &PublicKeys,
        tail: &Block,
        cancel: &CancelFlag,
    ) -> Result<MinerOutput, MiningError> {
        self.mine_at(pending, keys, tail, now_timestamp(), cancel)
    }

    /// Like [`Miner::mine`] with an explicit timestamp, sampled once for the
    /// whole search.
    pub fn mine_at(
        &self,
        pending: Vec<PendingTransaction>,
        keys: &PublicKeys,
        tail: &Block,
        timestamp: u64,
        cancel: &CancelFlag,
    ) -> Result<MinerOutput, MiningError> {
        if pending.is_empty() {
            info!("No pending transactions to mine");
            return Ok(MinerOutput::NoPendingTransactions);
        }

        let Verified { valid, dropped } = verify_pending(pending, keys);
        if valid.is_empty() {
            info!(dropped = dropped.len(), "No valid transactions to mine");
            return Ok(MinerOutput::NoValidTransactions { dropped });
        }

        let data = valid
            .iter()
            .map(PendingTransaction::text)
            .collect::<Vec<_>>()
            .join(TRANSACTION_DELIMITER);
        let index = tail.index() + 1;

        let (nonce, hash) = find_nonce(index, tail.hash(), timestamp, &data, self.difficulty, cancel)?;
        let block = Block::new(index, tail.hash(), timestamp, data, nonce);
        debug_assert_eq!(block.hash(), hash);

        Ok(MinerOutput::Sealed {
            block,
            included: valid,
            dropped,
        })
    }
}
