//! Transport idempotency record, one per delivered message id.
//!
//! Created with `init_if_needed` by the receiving instruction, so a
//! redelivery finds the record already marked and becomes a no-op.

use anchor_lang::prelude::*;

/// PDA Seeds: `[b"message", message_id.as_ref()]`
#[account]
#[derive(Default)]
pub struct ProcessedMessage {
    pub message_id: [u8; 32],
    pub source_chain_selector: u64,
    pub processed: bool,
    pub processed_at: i64,
    pub bump: u8,
}

impl ProcessedMessage {
    pub const LEN: usize = 32 + 8 + 1 + 8 + 1;
    pub const SEED_PREFIX: &'static [u8] = b"message";

    /// Marks the message processed. Returns false on a redelivery.
    pub fn first_delivery(
        &mut self,
        message_id: [u8; 32],
        source_chain_selector: u64,
        now: i64,
        bump: u8,
    ) -> bool {
        if self.processed {
            return false;
        }
        self.message_id = message_id;
        self.source_chain_selector = source_chain_selector;
        self.processed = true;
        self.processed_at = now;
        self.bump = bump;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redelivery_detected() {
        let mut record = ProcessedMessage::default();
        assert!(record.first_delivery([1u8; 32], 5, 100, 254));
        assert!(!record.first_delivery([1u8; 32], 5, 200, 254));
        assert_eq!(record.processed_at, 100);
    }
}
