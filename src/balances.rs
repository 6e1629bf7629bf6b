//! Caller-side balance view
//!
//! Balances are not part of chain state. The sheet is rebuilt from the
//! exported chain: committed balances come from mined blocks, tentative
//! balances additionally count transactions still waiting in the pool.

use crate::blockchain::BlockView;
use crate::error::BalanceError;
use crate::transaction::{split_block_data, Identity, PendingTransaction, Transfer};
use std::collections::BTreeMap;
use tracing::warn;

#[derive(Debug, Clone, PartialEq)]
pub struct BalanceSheet {
    opening: BTreeMap<Identity, f64>,
    committed: BTreeMap<Identity, f64>,
    tentative: BTreeMap<Identity, f64>,
}

impl BalanceSheet {
    pub fn new(opening: BTreeMap<Identity, f64>) -> Self {
        BalanceSheet {
            committed: opening.clone(),
            tentative: opening.clone(),
            opening,
        }
    }

    /// Opening balances for every participant, zero where none is configured.
    pub fn for_participants<'a>(
        participants: impl IntoIterator<Item = &'a Identity>,
        opening: &BTreeMap<Identity, f64>,
    ) -> Self {
        let opening = participants
            .into_iter()
            .map(|who| (who.clone(), opening.get(who).copied().unwrap_or(0.0)))
            .collect();
        Self::new(opening)
    }

    pub fn committed(&self, who: &str) -> f64 {
        self.committed.get(who).copied().unwrap_or(0.0)
    }

    pub fn tentative(&self, who: &str) -> f64 {
        self.tentative.get(who).copied().unwrap_or(0.0)
    }

    pub fn committed_balances(&self) -> &BTreeMap<Identity, f64> {
        &self.committed
    }

    /// Check a transfer against the sender's tentative balance, using the
    /// amount its canonical text will record.
    pub fn covers(&self, transfer: &Transfer) -> Result<(), BalanceError> {
        let requested = transfer.recorded_amount();
        let available = *self
            .tentative
            .get(&transfer.sender)
            .ok_or_else(|| BalanceError::UnknownParticipant(transfer.sender.clone()))?;
        if !self.tentative.contains_key(&transfer.receiver) {
            return Err(BalanceError::UnknownParticipant(transfer.receiver.clone()));
        }
        if available < requested {
            return Err(BalanceError::InsufficientFunds {
                who: transfer.sender.clone(),
                available,
                requested,
            });
        }
        Ok(())
    }

    /// Count a covered transfer as pending.
    pub fn reserve(&mut self, transfer: &Transfer) -> Result<(), BalanceError> {
        self.covers(transfer)?;
        apply_text(&mut self.tentative, &transfer.signable_message());
        Ok(())
    }

    /// Rebuild both views from the exported chain and the current pool.
    pub fn sync(&mut self, chain: &[BlockView], pending: &[PendingTransaction]) {
        let mut committed = self.opening.clone();
        for block in chain.iter().filter(|b| b.index > 0) {
            for text in split_block_data(&block.data) {
                apply_text(&mut committed, text);
            }
        }

        let mut tentative = committed.clone();
        for tx in pending {
            apply_text(&mut tentative, &tx.text);
        }

        self.committed = committed;
        self.tentative = tentative;
    }
}

fn apply_text(balances: &mut BTreeMap<Identity, f64>, text: &str) {
    let Some(transfer) = Transfer::parse(text) else {
        warn!(text, "Skipping unreadable transaction text");
        return;
    };
    *balances.entry(transfer.sender).or_insert(0.0) -= transfer.amount;
    *balances.entry(transfer.receiver).or_insert(0.0) += transfer.amount;
}
