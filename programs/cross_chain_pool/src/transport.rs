//! Transport payload shared by the primary and satellite pools.
//!
//! Five 32-byte words:
//! `kind | amount | correlation_id | destination_chain_selector | destination_address`.
//! Messages are delivered at least once with a stable message id; receivers
//! deduplicate on that id through `ProcessedMessage`.

use anchor_lang::prelude::*;

use crate::aggregator::{classify_submission_error, SubmissionErrorClass};
use crate::codec::{push_bytes32, push_u64, WordReader, WORD_LEN};
use crate::errors::PoolError;

pub const PAYLOAD_LEN: usize = WORD_LEN * 5;

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum InstructionKind {
    /// Primary → satellite: send `amount` back to the primary.
    RebalanceToPrimary,
    /// Primary → satellite: send `amount` to another satellite.
    MigrateLiquidity,
    /// Satellite → satellite: take delivered funds into local balance.
    CreditLiquidity,
    /// Satellite → primary: funds for a waiting withdrawal.
    RebalanceFunds,
}

impl InstructionKind {
    fn to_word(self) -> u64 {
        match self {
            Self::RebalanceToPrimary => 1,
            Self::MigrateLiquidity => 2,
            Self::CreditLiquidity => 3,
            Self::RebalanceFunds => 4,
        }
    }

    fn from_word(word: u64) -> Option<Self> {
        match word {
            1 => Some(Self::RebalanceToPrimary),
            2 => Some(Self::MigrateLiquidity),
            3 => Some(Self::CreditLiquidity),
            4 => Some(Self::RebalanceFunds),
            _ => None,
        }
    }

    /// Kinds that move funds out of a satellite; only the primary may send them.
    pub fn requires_primary_sender(self) -> bool {
        matches!(self, Self::RebalanceToPrimary | Self::MigrateLiquidity)
    }
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransportPayload {
    pub kind: InstructionKind,
    pub amount: u64,
    /// Withdrawal request id, or migration id for liquidity moves.
    pub correlation_id: [u8; 32],
    pub destination_chain_selector: u64,
    pub destination_address: [u8; 32],
}

impl TransportPayload {
    pub fn rebalance_to_primary(
        amount: u64,
        request_id: [u8; 32],
        primary_chain_selector: u64,
        primary_pool_address: [u8; 32],
    ) -> Self {
        Self {
            kind: InstructionKind::RebalanceToPrimary,
            amount,
            correlation_id: request_id,
            destination_chain_selector: primary_chain_selector,
            destination_address: primary_pool_address,
        }
    }

    pub fn migrate_liquidity(
        amount: u64,
        migration_id: [u8; 32],
        destination_chain_selector: u64,
        destination_address: [u8; 32],
    ) -> Self {
        Self {
            kind: InstructionKind::MigrateLiquidity,
            amount,
            correlation_id: migration_id,
            destination_chain_selector,
            destination_address,
        }
    }

    /// Outbound message a satellite queues after executing `self`.
    /// `None` for kinds that settle locally.
    pub fn follow_up(&self) -> Option<Self> {
        let kind = match self.kind {
            InstructionKind::RebalanceToPrimary => InstructionKind::RebalanceFunds,
            InstructionKind::MigrateLiquidity => InstructionKind::CreditLiquidity,
            InstructionKind::CreditLiquidity | InstructionKind::RebalanceFunds => return None,
        };
        Some(Self { kind, ..*self })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(PAYLOAD_LEN);
        push_u64(&mut out, self.kind.to_word());
        push_u64(&mut out, self.amount);
        push_bytes32(&mut out, &self.correlation_id);
        push_u64(&mut out, self.destination_chain_selector);
        push_bytes32(&mut out, &self.destination_address);
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        require!(bytes.len() == PAYLOAD_LEN, PoolError::InvalidPayload);
        let mut reader = WordReader::new(bytes);
        let invalid = || error!(PoolError::InvalidPayload);

        let kind = reader
            .read_u64()
            .and_then(InstructionKind::from_word)
            .ok_or_else(invalid)?;
        let amount = reader.read_u64().ok_or_else(invalid)?;
        let correlation_id = reader.read_bytes32().ok_or_else(invalid)?;
        let destination_chain_selector = reader.read_u64().ok_or_else(invalid)?;
        let destination_address = reader.read_bytes32().ok_or_else(invalid)?;

        Ok(Self {
            kind,
            amount,
            correlation_id,
            destination_chain_selector,
            destination_address,
        })
    }
}

/// What the transport reports back about a dispatched rebalance.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RebalanceOutcome {
    /// The message can no longer be delivered; a new attempt is safe.
    Dropped,
    /// The destination already holds this transfer. Treated as success.
    DuplicateSubmission,
}

impl RebalanceOutcome {
    pub fn from_submission_error(message: &str) -> Self {
        match classify_submission_error(message) {
            SubmissionErrorClass::DuplicateSubmission => Self::DuplicateSubmission,
            SubmissionErrorClass::Failure => Self::Dropped,
        }
    }
}
