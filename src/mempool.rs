//! Bounded FIFO of signed transactions waiting to be mined
//!
//! Every operation takes the same lock, so a `drain` observes a consistent
//! snapshot: a concurrent `submit` lands either in the drained batch or in
//! the pool afterwards, never in both and never nowhere.

use crate::error::RejectReason;
use crate::transaction::{validate_transfer, Participants, PendingTransaction, Transfer};
use parking_lot::Mutex;
use std::collections::VecDeque;
use tracing::{info, warn};

pub const DEFAULT_TRANSACTION_LIMIT: usize = 2;

/// Result of a successful submission.
#[derive(Debug, Clone, PartialEq)]
pub struct Accepted {
    /// Canonical text of the accepted transaction.
    pub text: String,
    /// The oldest entry, if it was pushed out to respect the limit.
    pub evicted: Option<PendingTransaction>,
}

#[derive(Debug)]
pub struct TransactionPool {
    participants: Participants,
    limit: usize,
    pending: Mutex<VecDeque<PendingTransaction>>,
}

impl TransactionPool {
    /// `limit` is clamped to at least one entry.
    pub fn new(participants: Participants, limit: usize) -> Self {
        TransactionPool {
            participants,
            limit: limit.max(1),
            pending: Mutex::new(VecDeque::new()),
        }
    }

    pub fn participants(&self) -> &Participants {
        &self.participants
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Run the admission checks without touching the pool.
    pub fn check(&self, transfer: &Transfer) -> Result<(), RejectReason> {
        validate_transfer(&self.participants, transfer)
    }

    pub fn submit(
        &self,
        sender: &str,
        receiver: &str,
        amount: f64,
        signature: Vec<u8>,
    ) -> Result<Accepted, RejectReason> {
        let transfer = Transfer::new(sender, receiver, amount);
        self.submit_signed(PendingTransaction::new(transfer, signature))
    }

    /// Admit an already signed transaction. The signature itself is checked
    /// at mining time against the sender's registered key.
    pub fn submit_signed(&self, tx: PendingTransaction) -> Result<Accepted, RejectReason> {
        if let Err(reason) = self.check(&tx.transfer) {
            warn!(%reason, "Transaction rejected");
            return Err(reason);
        }

        let text = tx.text.clone();
        let evicted = {
            let mut pending = self.pending.lock();
            pending.push_back(tx);
            if pending.len() > self.limit {
                pending.pop_front()
            } else {
                None
            }
        };

        info!(transaction = %text, "Transaction added");
        if let Some(old) = &evicted {
            info!(transaction = %old.text, "Oldest transaction pruned");
        }

        Ok(Accepted { text, evicted })
    }

    /// Remove and return every pending transaction, oldest first.
    pub fn drain(&self) -> Vec<PendingTransaction> {
        self.pending.lock().drain(..).collect()
    }

    /// Put drained transactions back in front of anything submitted since,
    /// then trim to the limit. Returns the entries trimmed away.
    pub fn restore(&self, entries: Vec<PendingTransaction>) -> Vec<PendingTransaction> {
        let mut pending = self.pending.lock();
        for tx in entries.into_iter().rev() {
            pending.push_front(tx);
        }

        let mut evicted = Vec::new();
        while pending.len() > self.limit {
            if let Some(old) = pending.pop_front() {
                evicted.push(old);
            }
        }
        evicted
    }

    /// Snapshot of the pending transactions, oldest first.
    pub fn pending(&self) -> Vec<PendingTransaction> {
        self.pending.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    fn participants() -> Participants {
        ["Alice", "Bob"].into_iter().map(String::from).collect()
    }

    fn dummy_signature() -> Vec<u8> {
        vec![0u8; 64]
    }

    #[test]
    fn test_submit_accepts_and_orders() {
        let pool = TransactionPool::new(participants(), 10);
        let accepted = pool.submit("Alice", "Bob", 10.0, dummy_signature()).unwrap();
        assert_eq!(accepted.text, "Alice sends 10.00 to Bob");
        assert!(accepted.evicted.is_none());

        pool.submit("Bob", "Alice", 3.0, dummy_signature()).unwrap();
        let texts: Vec<_> = pool.pending().into_iter().map(|tx| tx.text).collect();
        assert_eq!(texts, vec!["Alice sends 10.00 to Bob", "Bob sends 3.00 to Alice"]);
    }

    #[test]
    fn test_rejections_leave_pool_unchanged() {
        let pool = TransactionPool::new(participants(), 2);
        pool.submit("Alice", "Bob", 1.0, dummy_signature()).unwrap();

        let cases = [
            ("Eve", "Bob", 1.0, RejectReason::InvalidSender("Eve".into())),
            ("Alice", "Eve", 1.0, RejectReason::InvalidReceiver("Eve".into())),
            ("Bob", "Bob", 1.0, RejectReason::SameSenderReceiver("Bob".into())),
            ("Alice", "Bob", 0.0, RejectReason::InvalidAmount(0.0)),
            ("Alice", "Bob", -1.0, RejectReason::InvalidAmount(-1.0)),
        ];
        for (sender, receiver, amount, reason) in cases {
            let err = pool
                .submit(sender, receiver, amount, dummy_signature())
                .unwrap_err();
            assert_eq!(err, reason);
            assert_eq!(pool.len(), 1);
        }
    }

    #[test]
    fn test_third_submission_evicts_oldest() {
        let pool = TransactionPool::new(participants(), DEFAULT_TRANSACTION_LIMIT);
        pool.submit("Alice", "Bob", 1.0, dummy_signature()).unwrap();
        pool.submit("Alice", "Bob", 2.0, dummy_signature()).unwrap();
        let accepted = pool.submit("Alice", "Bob", 3.0, dummy_signature()).unwrap();

        assert_eq!(accepted.evicted.unwrap().text, "Alice sends 1.00 to Bob");
        assert_eq!(pool.len(), 2);
        let texts: Vec<_> = pool.pending().into_iter().map(|tx| tx.text).collect();
        assert_eq!(texts, vec!["Alice sends 2.00 to Bob", "Alice sends 3.00 to Bob"]);
    }

    #[test]
    fn test_zero_limit_is_clamped() {
        let pool = TransactionPool::new(participants(), 0);
        assert_eq!(pool.limit(), 1);
        pool.submit("Alice", "Bob", 1.0, dummy_signature()).unwrap();
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_drain_empties_pool() {
        let pool = TransactionPool::new(participants(), 2);
        pool.submit("Alice", "Bob", 1.0, dummy_signature()).unwrap();
        pool.submit("Bob", "Alice", 2.0, dummy_signature()).unwrap();

        let drained = pool.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].sender(), "Alice");
        assert_eq!(drained[1].sender(), "Bob");
        assert!(pool.is_empty());
        assert!(pool.drain().is_empty());
    }

    #[test]
    fn test_restore_puts_drained_entries_first() {
        let pool = TransactionPool::new(participants(), 2);
        pool.submit("Alice", "Bob", 1.0, dummy_signature()).unwrap();
        let drained = pool.drain();
        pool.submit("Bob", "Alice", 2.0, dummy_signature()).unwrap();

        let evicted = pool.restore(drained);
        assert!(evicted.is_empty());
        let texts: Vec<_> = pool.pending().into_iter().map(|tx| tx.text).collect();
        assert_eq!(texts, vec!["Alice sends 1.00 to Bob", "Bob sends 2.00 to Alice"]);

        pool.submit("Alice", "Bob", 3.0, dummy_signature()).unwrap();
        let drained = pool.drain();
        pool.submit("Bob", "Alice", 4.0, dummy_signature()).unwrap();
        let evicted = pool.restore(drained);
        assert_eq!(evicted.len(), 1);
        assert_eq!(evicted[0].text, "Bob sends 2.00 to Alice");
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_concurrent_submit_and_drain_lose_nothing() {
        let pool = Arc::new(TransactionPool::new(participants(), 10_000));
        let writers: Vec<_> = (0..4)
            .map(|w| {
                let pool = pool.clone();
                thread::spawn(move || {
                    for i in 0..250 {
                        let amount = (w * 1000 + i + 1) as f64;
                        pool.submit("Alice", "Bob", amount, vec![0u8; 64]).unwrap();
                    }
                })
            })
            .collect();

        let drainer = {
            let pool = pool.clone();
            thread::spawn(move || {
                let mut seen = Vec::new();
                for _ in 0..200 {
                    seen.extend(pool.drain());
                    thread::yield_now();
                }
                seen
            })
        };

        for writer in writers {
            writer.join().unwrap();
        }
        let mut all = drainer.join().unwrap();
        all.extend(pool.drain());

        assert_eq!(all.len(), 1000);
        let unique: HashSet<_> = all.iter().map(|tx| tx.text.clone()).collect();
        assert_eq!(unique.len(), 1000);
    }
}
