/// Transaction types for minichain
use crate::crypto::{self, KeyPair};
use secp256k1::PublicKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Name of a participant, e.g. "Alice".
pub type Identity = String;

/// The whitelist of identities allowed to send and receive.
pub type Participants = BTreeSet<Identity>;

/// Separator between transaction texts inside a block's data.
pub const TRANSACTION_DELIMITER: &str = " | ";

/// Fragments of the canonical text that an identity must not contain.
pub const RESERVED_FRAGMENTS: [&str; 3] = [" sends ", " to ", TRANSACTION_DELIMITER];

/// Whether `name` can appear in canonical texts and still be parsed back.
pub fn is_usable_identity(name: &str) -> bool {
    !name.trim().is_empty() && !RESERVED_FRAGMENTS.iter().any(|frag| name.contains(frag))
}

/// An unsigned transfer of `amount` from `sender` to `receiver`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    pub sender: Identity,
    pub receiver: Identity,
    pub amount: f64,
}

impl Transfer {
    pub fn new(sender: impl Into<Identity>, receiver: impl Into<Identity>, amount: f64) -> Self {
        Transfer {
            sender: sender.into(),
            receiver: receiver.into(),
            amount,
        }
    }

    /// The amount as the canonical text records it, rounded to cents.
    pub fn recorded_amount(&self) -> f64 {
        (self.amount * 100.0).round() / 100.0
    }

    /// The text that is signed, verified and written into block data.
    pub fn signable_message(&self) -> String {
        format!("{} sends {:.2} to {}", self.sender, self.amount, self.receiver)
    }

    /// Parse a canonical text back into a transfer. The amount comes back
    /// rounded to the two decimals the text carries.
    pub fn parse(text: &str) -> Option<Self> {
        let (sender, rest) = text.split_once(" sends ")?;
        let (amount, receiver) = rest.rsplit_once(" to ")?;
        let amount = amount.parse::<f64>().ok()?;
        if sender.is_empty() || receiver.is_empty() {
            return None;
        }
        Some(Transfer::new(sender, receiver, amount))
    }

    pub fn sign(self, keypair: &KeyPair) -> PendingTransaction {
        let text = self.signable_message();
        let signature = keypair.sign(&text).to_vec();
        PendingTransaction {
            transfer: self,
            text,
            signature,
        }
    }
}

/// A signed transfer waiting in the pool to be mined.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingTransaction {
    pub transfer: Transfer,
    pub text: String,
    pub signature: Vec<u8>,
}

impl PendingTransaction {
    pub fn new(transfer: Transfer, signature: Vec<u8>) -> Self {
        let text = transfer.signable_message();
        PendingTransaction {
            transfer,
            text,
            signature,
        }
    }

    pub fn sender(&self) -> &str {
        &self.transfer.sender
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    pub fn verify(&self, public_key: &PublicKey) -> bool {
        crypto::verify(&self.text, &self.signature, public_key)
    }
}

/// Split a block's data back into its transaction texts.
pub fn split_block_data(data: &str) -> impl Iterator<Item = &str> {
    data.split(TRANSACTION_DELIMITER)
}
