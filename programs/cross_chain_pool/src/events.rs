//! Events emitted by the cross-chain pool program.
//! The aggregator executors, the transport relayer and the automation service
//! consume these; indexers rebuild request history from them.

use anchor_lang::prelude::*;

use crate::state::WithdrawalStatus;
use crate::transport::RebalanceOutcome;

#[event]
pub struct DepositStarted {
    pub pool: Pubkey,
    pub request_id: [u8; 32],
    pub depositor: Pubkey,
    pub amount: u64,
    pub timestamp: i64,
}

#[event]
pub struct DepositCompleted {
    pub pool: Pubkey,
    pub request_id: [u8; 32],
    pub depositor: Pubkey,
    pub amount: u64,
    pub shares_minted: u64,
    pub timestamp: i64,
}

#[event]
pub struct DepositExpired {
    pub pool: Pubkey,
    pub request_id: [u8; 32],
    pub refunded: u64,
    pub timestamp: i64,
}

/// Work order for the aggregator executors.
#[event]
pub struct AggregationRequested {
    pub pool: Pubkey,
    pub request_id: [u8; 32],
    pub attempt: u32,
    /// Encoded request words (see `aggregator::encode_request`).
    pub args: Vec<u8>,
    pub timestamp: i64,
}

#[event]
pub struct AggregationFulfilled {
    pub request_id: [u8; 32],
    pub attempt: u32,
    pub value: u64,
}

#[event]
pub struct AggregationFailed {
    pub request_id: [u8; 32],
    pub attempt: u32,
    pub failures: u16,
    pub error: Vec<u8>,
}

#[event]
pub struct WithdrawalRequested {
    pub pool: Pubkey,
    pub request_id: [u8; 32],
    pub requester: Pubkey,
    pub share_amount: u64,
    pub timestamp: i64,
}

#[event]
pub struct WithdrawalAmountComputed {
    pub request_id: [u8; 32],
    pub share_amount: u64,
    pub asset_amount_out: u64,
}

#[event]
pub struct WithdrawalAwaitingLiquidity {
    pub request_id: [u8; 32],
    pub asset_amount_out: u64,
    pub local_balance: u64,
}

#[event]
pub struct RebalanceTriggered {
    pub request_id: [u8; 32],
    pub source_chain_selector: u64,
    pub amount: u64,
    pub attempt: u32,
}

#[event]
pub struct RebalanceOutcomeReported {
    pub request_id: [u8; 32],
    pub attempt: u32,
    pub outcome: RebalanceOutcome,
    /// False when the report named a stale attempt and changed nothing.
    pub applied: bool,
}

#[event]
pub struct WithdrawalCompleted {
    pub pool: Pubkey,
    pub request_id: [u8; 32],
    pub requester: Pubkey,
    pub asset_amount_out: u64,
    pub timestamp: i64,
}

#[event]
pub struct WithdrawalCancelled {
    pub request_id: [u8; 32],
    pub shares_returned: u64,
    pub timestamp: i64,
}

#[event]
pub struct WithdrawalRetried {
    pub request_id: [u8; 32],
    pub status: WithdrawalStatus,
    pub retry_count: u16,
}

#[event]
pub struct UnmatchedFundsCredited {
    pub correlation_id: [u8; 32],
    pub amount: u64,
}

/// Outbound transport message. The relayer picks it up and delivers
/// `payload` to `receiver` on `destination_chain_selector`.
#[event]
pub struct TransportMessageQueued {
    pub source_chain_selector: u64,
    pub destination_chain_selector: u64,
    pub receiver: [u8; 32],
    pub correlation_id: [u8; 32],
    pub payload: Vec<u8>,
    pub timestamp: i64,
}

#[event]
pub struct TransportMessageProcessed {
    pub message_id: [u8; 32],
    pub source_chain_selector: u64,
    pub correlation_id: [u8; 32],
    pub amount: u64,
}

#[event]
pub struct SatelliteRegistered {
    pub registry: Pubkey,
    pub chain_selector: u64,
    pub pool_address: [u8; 32],
    pub rebalance_eligible: bool,
    pub version: u64,
}

#[event]
pub struct SatelliteRemoved {
    pub registry: Pubkey,
    pub chain_selector: u64,
    pub version: u64,
}

#[event]
pub struct RebalanceEligibilityUpdated {
    pub registry: Pubkey,
    pub chain_selector: u64,
    pub rebalance_eligible: bool,
    pub version: u64,
}

#[event]
pub struct SatelliteLiquidityReported {
    pub chain_selector: u64,
    pub liquidity: u64,
    pub timestamp: i64,
}

#[event]
pub struct LoanDrawn {
    pub pool: Pubkey,
    pub amount: u64,
    pub loans_in_use: u64,
}

#[event]
pub struct LoanRepaid {
    pub pool: Pubkey,
    pub amount: u64,
    pub loans_in_use: u64,
}

#[event]
pub struct PoolCapUpdated {
    pub pool: Pubkey,
    pub pool_cap: u64,
}

#[event]
pub struct PinnedLogicUpdated {
    pub logic_hash: [u8; 32],
    pub library_hash: [u8; 32],
}

#[event]
pub struct RetryPolicyUpdated {
    pub aggregation_timeout: i64,
    pub rebalance_timeout: i64,
    pub deposit_expiry: i64,
    pub max_retries: u16,
}

#[event]
pub struct PoolPauseToggled {
    pub pool: Pubkey,
    pub paused: bool,
}
