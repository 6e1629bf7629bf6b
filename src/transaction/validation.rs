/// Admission checks for transfers, separated from type definitions
use crate::error::RejectReason;
use crate::transaction::types::{Participants, Transfer};

/// Check a transfer before it is signed or pooled. Checks run in order:
/// sender, receiver, distinct parties, amount. The amount must stay
/// positive once rounded to the two decimals of the canonical text.
pub fn validate_transfer(participants: &Participants, transfer: &Transfer) -> Result<(), RejectReason> {
    if !participants.contains(&transfer.sender) {
        return Err(RejectReason::InvalidSender(transfer.sender.clone()));
    }
    if !participants.contains(&transfer.receiver) {
        return Err(RejectReason::InvalidReceiver(transfer.receiver.clone()));
    }
    if transfer.sender == transfer.receiver {
        return Err(RejectReason::SameSenderReceiver(transfer.sender.clone()));
    }
    if !transfer.amount.is_finite() || transfer.recorded_amount() <= 0.0 {
        return Err(RejectReason::InvalidAmount(transfer.amount));
    }
    Ok(())
}
