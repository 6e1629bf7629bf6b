//! The ledger: one chain, one transaction pool and a miner, shared safely
//! between callers.
//!
//! The pool has its own lock. The chain sits behind a reader-writer lock, so
//! `validate_chain` and `export_chain` can run while transactions are being
//! submitted. Mining runs are serialized by a dedicated mutex, so the tail a
//! run extends is still the tail when its block is appended.

use crate::blockchain::{Block, BlockView, Chain};
use crate::config::LedgerConfig;
use crate::crypto::KeyPair;
use crate::error::{ChainError, ChainValidationError, MiningError, RejectReason};
use crate::mempool::{Accepted, TransactionPool};
use crate::miner::{CancelFlag, Miner, MinerOutput, PublicKeys};
use crate::transaction::{Participants, PendingTransaction, Transfer};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Short description of a freshly mined block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockSummary {
    pub index: u64,
    pub hash: String,
    pub nonce: u64,
    pub timestamp: u64,
    /// Transactions sealed into the block.
    pub transactions: usize,
    /// Pending transactions discarded because their signature did not verify.
    pub dropped: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MineOutcome {
    Mined(BlockSummary),
    NoPendingTransactions,
    NoValidTransactions { dropped: usize },
}

impl MineOutcome {
    pub fn block(&self) -> Option<&BlockSummary> {
        match self {
            MineOutcome::Mined(summary) => Some(summary),
            _ => None,
        }
    }

    pub fn into_block(self) -> Option<BlockSummary> {
        match self {
            MineOutcome::Mined(summary) => Some(summary),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct Ledger {
    chain: RwLock<Chain>,
    pool: TransactionPool,
    miner: Miner,
    mining: Mutex<()>,
}

impl Ledger {
    pub fn new(config: &LedgerConfig) -> Result<Self, ChainError> {
        Self::with_chain(config, Chain::new())
    }

    /// Build a ledger on top of an existing chain, e.g. one with a fixed
    /// genesis timestamp.
    pub fn with_chain(config: &LedgerConfig, chain: Chain) -> Result<Self, ChainError> {
        config.validate()?;
        chain.latest()?;
        Ok(Ledger {
            chain: RwLock::new(chain),
            pool: TransactionPool::new(config.participants.clone(), config.transaction_limit),
            miner: Miner::new(config.difficulty),
            mining: Mutex::new(()),
        })
    }

    pub fn participants(&self) -> &Participants {
        self.pool.participants()
    }

    pub fn difficulty(&self) -> usize {
        self.miner.difficulty()
    }

    /// Validate, sign with `signing_key` and queue a transfer. Nothing is
    /// signed when the transfer is rejected.
    pub fn submit_transaction(
        &self,
        sender: &str,
        receiver: &str,
        amount: f64,
        signing_key: &KeyPair,
    ) -> Result<Accepted, RejectReason> {
        let transfer = Transfer::new(sender, receiver, amount);
        if let Err(reason) = self.pool.check(&transfer) {
            warn!(%reason, "Transaction rejected");
            return Err(reason);
        }
        self.pool.submit_signed(transfer.sign(signing_key))
    }

    /// Queue a transaction signed elsewhere.
    pub fn submit_signed(&self, tx: PendingTransaction) -> Result<Accepted, RejectReason> {
        self.pool.submit_signed(tx)
    }

    pub fn pending_transactions(&self) -> Vec<PendingTransaction> {
        self.pool.pending()
    }

    pub fn pending_len(&self) -> usize {
        self.pool.len()
    }

    /// Mine the pending transactions on the calling thread.
    ///
    /// Transactions whose signature does not verify against `keys` are
    /// discarded. If the search is cancelled or the block cannot be appended,
    /// every drained transaction goes back into the pool and the chain is
    /// left as it was.
    pub fn mine_blocking(
        &self,
        keys: &PublicKeys,
        cancel: &CancelFlag,
    ) -> Result<MineOutcome, MiningError> {
        let _mining = self.mining.lock();

        let tail = self.chain.read().latest()?.clone();
        let drained = self.pool.drain();

        let output = match self.miner.mine(drained.clone(), keys, &tail, cancel) {
            Ok(output) => output,
            Err(e) => {
                self.restore(drained);
                return Err(e);
            }
        };

        match output {
            MinerOutput::NoPendingTransactions => Ok(MineOutcome::NoPendingTransactions),
            MinerOutput::NoValidTransactions { dropped } => {
                Ok(MineOutcome::NoValidTransactions {
                    dropped: dropped.len(),
                })
            }
            MinerOutput::Sealed {
                block,
                included,
                dropped,
            } => {
                let summary = BlockSummary {
                    index: block.index(),
                    hash: block.hash().to_string(),
                    nonce: block.nonce(),
                    timestamp: block.timestamp(),
                    transactions: included.len(),
                    dropped: dropped.len(),
                };

                if let Err(e) = self.chain.write().append(block) {
                    self.restore(drained);
                    return Err(e.into());
                }

                info!(
                    index = summary.index,
                    nonce = summary.nonce,
                    transactions = summary.transactions,
                    "Pending transactions mined into a new block"
                );
                Ok(MineOutcome::Mined(summary))
            }
        }
    }

    /// Mine on tokio's blocking pool so submissions keep flowing meanwhile.
    /// Dropping the returned future does not stop the search; use `cancel`.
    pub async fn mine(
        self: &Arc<Self>,
        keys: PublicKeys,
        cancel: CancelFlag,
    ) -> Result<MineOutcome, MiningError> {
        let ledger = Arc::clone(self);
        tokio::task::spawn_blocking(move || ledger.mine_blocking(&keys, &cancel))
            .await
            .map_err(|e| MiningError::Worker(e.to_string()))?
    }

    fn restore(&self, drained: Vec<PendingTransaction>) {
        for tx in self.pool.restore(drained) {
            warn!(transaction = %tx.text, "Oldest transaction pruned while restoring");
        }
    }

    pub fn validate_chain(&self) -> Result<(), ChainValidationError> {
        let result = self.chain.read().validate();
        if result.is_ok() {
            info!("Blockchain is valid");
        }
        result
    }

    pub fn export_chain(&self) -> Vec<BlockView> {
        self.chain.read().export()
    }

    pub fn latest_block(&self) -> Result<Block, ChainError> {
        self.chain.read().latest().cloned()
    }

    pub fn chain_len(&self) -> usize {
        self.chain.read().len()
    }
}
