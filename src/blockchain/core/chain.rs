use crate::blockchain::core::block::{now_timestamp, Block, BlockView};
use crate::blockchain::core::validation::validate_blocks;
use crate::error::{ChainError, ChainValidationError};
use tracing::info;

/// Append-only sequence of blocks, starting with genesis.
#[derive(Debug, Clone)]
pub struct Chain {
    pub(crate) blocks: Vec<Block>,
}

impl Default for Chain {
    fn default() -> Self {
        Self::new()
    }
}

impl Chain {
    /// Create a chain holding a genesis block stamped with the current time.
    pub fn new() -> Self {
        Self::with_genesis_timestamp(now_timestamp())
    }

    pub fn with_genesis_timestamp(timestamp: u64) -> Self {
        Chain {
            blocks: vec![Block::genesis(timestamp)],
        }
    }

    pub fn genesis(&self) -> Result<&Block, ChainError> {
        self.blocks.first().ok_or(ChainError::EmptyChain)
    }

    pub fn latest(&self) -> Result<&Block, ChainError> {
        self.blocks.last().ok_or(ChainError::EmptyChain)
    }

    /// Append a block that extends the current tail. The chain is left
    /// untouched when the block does not link to it.
    pub fn append(&mut self, block: Block) -> Result<(), ChainError> {
        let latest = self.latest()?;

        let expected = latest.index() + 1;
        if block.index() != expected {
            return Err(ChainError::IndexMismatch {
                expected,
                got: block.index(),
            });
        }

        if block.prev_hash() != latest.hash() {
            return Err(ChainError::PrevHashMismatch {
                expected: latest.hash().to_string(),
                got: block.prev_hash().to_string(),
            });
        }

        info!(index = block.index(), hash = %block.hash(), "Block added to the blockchain");
        self.blocks.push(block);
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ChainValidationError> {
        validate_blocks(&self.blocks)
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn export(&self) -> Vec<BlockView> {
        self.blocks.iter().map(Block::view).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationFailure;

    fn extend(chain: &mut Chain, data: &str) {
        let latest = chain.latest().unwrap();
        let block = Block::new(
            latest.index() + 1,
            latest.hash(),
            latest.timestamp() + 1,
            data,
            0,
        );
        chain.append(block).unwrap();
    }

    fn sample_chain() -> Chain {
        let mut chain = Chain::with_genesis_timestamp(1_700_000_000);
        extend(&mut chain, "Alice sends 10.00 to Bob");
        extend(&mut chain, "Bob sends 2.50 to Alice");
        extend(&mut chain, "Alice sends 1.00 to Bob | Bob sends 3.00 to Alice");
        chain
    }

    #[test]
    fn test_new_chain_has_genesis() {
        let chain = Chain::new();
        assert_eq!(chain.len(), 1);
        assert!(chain.latest().unwrap().is_genesis());
        assert_eq!(chain.genesis().unwrap(), chain.latest().unwrap());
        assert!(chain.validate().is_ok());
    }

    #[test]
    fn test_valid_chain_validates() {
        let chain = sample_chain();
        assert_eq!(chain.len(), 4);
        assert_eq!(chain.latest().unwrap().index(), 3);
        assert!(chain.validate().is_ok());
    }

    #[test]
    fn test_empty_chain_reports_error() {
        let chain = Chain { blocks: Vec::new() };
        assert_eq!(chain.latest().unwrap_err(), ChainError::EmptyChain);
        assert!(chain.is_empty());
    }

    #[test]
    fn test_append_rejects_wrong_index() {
        let mut chain = sample_chain();
        let latest = chain.latest().unwrap().clone();
        let block = Block::new(latest.index() + 2, latest.hash(), 1, "x", 0);

        let err = chain.append(block).unwrap_err();
        assert_eq!(err, ChainError::IndexMismatch { expected: 4, got: 5 });
        assert_eq!(chain.len(), 4);
    }

    #[test]
    fn test_append_rejects_wrong_prev_hash() {
        let mut chain = sample_chain();
        let latest = chain.latest().unwrap().clone();
        let block = Block::new(latest.index() + 1, "not-the-tail", 1, "x", 0);

        let err = chain.append(block).unwrap_err();
        assert!(matches!(err, ChainError::PrevHashMismatch { .. }));
        assert_eq!(chain.len(), 4);
        assert!(chain.validate().is_ok());
    }

    #[test]
    fn test_tampered_fields_report_hash_mismatch() {
        let tampers: Vec<fn(&mut Block)> = vec![
            |b: &mut Block| b.data = "Alice sends 1000.00 to Bob".to_string(),
            |b: &mut Block| b.nonce += 1,
            |b: &mut Block| b.timestamp += 60,
            |b: &mut Block| b.prev_hash = "0".repeat(64),
            |b: &mut Block| b.index += 10,
        ];

        for k in 1..4 {
            for tamper in &tampers {
                let mut chain = sample_chain();
                tamper(&mut chain.blocks[k]);
                let err = chain.validate().unwrap_err();
                assert_eq!(err.index, k as u64);
                assert_eq!(err.reason, ValidationFailure::HashMismatch);
            }
        }
    }

    #[test]
    fn test_spliced_block_reports_link_mismatch() {
        let mut chain = sample_chain();
        let original = chain.blocks[2].clone();
        let foreign = Block::new(
            original.index(),
            "f".repeat(64),
            original.timestamp(),
            original.data(),
            original.nonce(),
        );
        assert_eq!(foreign.recompute_hash(), foreign.hash());
        chain.blocks[2] = foreign;

        let err = chain.validate().unwrap_err();
        assert_eq!(err.index, 2);
        assert_eq!(err.reason, ValidationFailure::LinkMismatch);
    }

    #[test]
    fn test_swapped_blocks_report_first_failure() {
        let mut chain = sample_chain();
        chain.blocks.swap(1, 2);

        let err = chain.validate().unwrap_err();
        assert_eq!(err.index, 1);
        assert_eq!(err.reason, ValidationFailure::LinkMismatch);
    }

    #[test]
    fn test_export_preserves_order() {
        let chain = sample_chain();
        let views = chain.export();
        assert_eq!(views.len(), 4);
        for (i, view) in views.iter().enumerate() {
            assert_eq!(view.index, i as u64);
            assert_eq!(view.hash, chain.blocks()[i].hash());
        }
        assert_eq!(views[1].prev_hash, views[0].hash);
    }
}
