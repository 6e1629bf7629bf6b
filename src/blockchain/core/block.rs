use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// `prev_hash` stored in the genesis block.
pub const GENESIS_PREV_HASH: &str = "0";
/// `data` stored in the genesis block.
pub const GENESIS_DATA: &str = "Genesis Block";

/// Current wall-clock time in whole seconds since the epoch.
pub fn now_timestamp() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

/// SHA-256 over `index ‖ prev_hash ‖ timestamp ‖ data ‖ nonce`, each in its
/// decimal or string form with no separator, as lowercase hex.
pub fn calculate_hash(index: u64, prev_hash: &str, timestamp: u64, data: &str, nonce: u64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(index.to_string().as_bytes());
    hasher.update(prev_hash.as_bytes());
    hasher.update(timestamp.to_string().as_bytes());
    hasher.update(data.as_bytes());
    hasher.update(nonce.to_string().as_bytes());
    hex::encode(hasher.finalize())
}

/// A sealed block. Fields are fixed at construction; the stored hash is
/// always computed from the other five.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub(crate) index: u64,
    pub(crate) prev_hash: String,
    pub(crate) timestamp: u64,
    pub(crate) data: String,
    pub(crate) hash: String,
    pub(crate) nonce: u64,
}

impl Block {
    pub fn new(
        index: u64,
        prev_hash: impl Into<String>,
        timestamp: u64,
        data: impl Into<String>,
        nonce: u64,
    ) -> Self {
        let prev_hash = prev_hash.into();
        let data = data.into();
        let hash = calculate_hash(index, &prev_hash, timestamp, &data, nonce);
        Block {
            index,
            prev_hash,
            timestamp,
            data,
            hash,
            nonce,
        }
    }

    pub fn genesis(timestamp: u64) -> Self {
        Block::new(0, GENESIS_PREV_HASH, timestamp, GENESIS_DATA, 0)
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn prev_hash(&self) -> &str {
        &self.prev_hash
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn data(&self) -> &str {
        &self.data
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn is_genesis(&self) -> bool {
        self.index == 0
    }

    /// Hash recomputed from the stored fields, ignoring the stored hash.
    pub fn recompute_hash(&self) -> String {
        calculate_hash(self.index, &self.prev_hash, self.timestamp, &self.data, self.nonce)
    }

    pub fn view(&self) -> BlockView {
        BlockView {
            index: self.index,
            hash: self.hash.clone(),
            prev_hash: self.prev_hash.clone(),
            timestamp: self.timestamp,
            data: self.data.clone(),
            nonce: self.nonce,
        }
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Block {} [Hash: {}]", self.index, self.hash)?;
        writeln!(f, "Data: {}", self.data)?;
        writeln!(f, "Previous Hash: {}", self.prev_hash)?;
        writeln!(f, "Timestamp: {}", self.timestamp)?;
        writeln!(f, "Nonce: {}", self.nonce)
    }
}

/// Detached copy of a block handed to callers for display or persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockView {
    pub index: u64,
    pub hash: String,
    pub prev_hash: String,
    pub timestamp: u64,
    pub data: String,
    pub nonce: u64,
}
