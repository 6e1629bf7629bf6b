use crate::blockchain::core::block::Block;
use crate::error::{ChainValidationError, ValidationFailure};
use tracing::{debug, warn};

/// Checks every non-genesis block for a stale stored hash, then for a broken
/// link to its predecessor. Stops at the first failing block and reports its
/// position in the chain.
pub fn validate_blocks(blocks: &[Block]) -> Result<(), ChainValidationError> {
    for (offset, pair) in blocks.windows(2).enumerate() {
        let (prev, current) = (&pair[0], &pair[1]);
        // Position in the chain, not the stored index, which may itself be tampered.
        let index = offset as u64 + 1;

        if current.recompute_hash() != current.hash() {
            warn!(index, "Block has been tampered with");
            return Err(ChainValidationError {
                index,
                reason: ValidationFailure::HashMismatch,
            });
        }

        if current.prev_hash() != prev.hash() {
            warn!(index, "Block has an invalid previous hash");
            return Err(ChainValidationError {
                index,
                reason: ValidationFailure::LinkMismatch,
            });
        }
    }

    debug!(blocks = blocks.len(), "Blockchain is valid");
    Ok(())
}
