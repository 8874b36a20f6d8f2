//! # Cross-Chain Liquidity Pool Program
//!
//! A liquidity pool whose funds are spread over several chains. The primary
//! pool mints and burns shares and keeps the ledger; satellite pools hold
//! liquidity on other chains and move it on instruction from the primary.
//!
//! ## Flow
//! - Deposits and withdrawals are two-phase. `start_deposit` and
//!   `request_withdrawal` escrow funds or shares and emit an
//!   `AggregationRequested` work order; the oracle answers with the
//!   aggregated satellite value (deposits) or the owed asset amount
//!   (withdrawals).
//! - A withdrawal the vault cannot cover is locked and a satellite is told,
//!   through the transport, to send the funds back. Arrival completes it.
//! - Every callback carries the request id and attempt number; stale or
//!   finalized callbacks are rejected. Transport deliveries are deduplicated
//!   by message id.
//!
//! ## Security
//! - Anchor account validation and constraints
//! - Role-based access (admin, oracle, transport, automation, lender)
//! - Aggregator results accepted only from the pinned logic hash
//! - Emergency pause at config and pool level

pub mod aggregator;
pub mod automation;
pub mod codec;
pub mod errors;
pub mod events;
pub mod instructions;
pub mod settlement;
pub mod state;
pub mod transport;


use anchor_lang::prelude::*;

use aggregator::Fulfillment;
use automation::RetryPolicy;
use instructions::*;
use state::{LiquiditySnapshot, PinnedLogic};
use transport::RebalanceOutcome;

declare_id!("3khyE7sQ6NrwJSHFUny4oAy9ucwCjwfxMhJDF99TqrR9");

#[program]
pub mod cross_chain_pool {
    use super::*;

    // --- setup ---

    /// Initialize global protocol config. Must be called once before any pool.
    pub fn initialize_config(
        ctx: Context<InitializeConfig>,
        local_chain_selector: u64,
        pinned: PinnedLogic,
        retry_policy: RetryPolicy,
    ) -> Result<()> {
        instructions::initialize_config::handler(ctx, local_chain_selector, pinned, retry_policy)
    }

    /// Create the primary pool and its satellite registry for one asset mint.
    pub fn initialize_primary_pool(ctx: Context<InitializePrimaryPool>, pool_cap: u64) -> Result<()> {
        instructions::initialize_primary_pool::handler(ctx, pool_cap)
    }

    /// Create a satellite pool that only obeys `primary_pool_address`.
    pub fn initialize_satellite(
        ctx: Context<InitializeSatellite>,
        primary_chain_selector: u64,
        primary_pool_address: [u8; 32],
    ) -> Result<()> {
        instructions::initialize_satellite::handler(
            ctx,
            primary_chain_selector,
            primary_pool_address,
        )
    }

    // --- deposits ---

    pub fn start_deposit(ctx: Context<StartDeposit>, amount: u64) -> Result<()> {
        instructions::start_deposit::handler(ctx, amount)
    }

    pub fn fulfill_deposit_aggregation(
        ctx: Context<FulfillDepositAggregation>,
        request_id: [u8; 32],
        fulfillment: Fulfillment,
    ) -> Result<()> {
        instructions::fulfill_deposit_aggregation::handler(ctx, request_id, fulfillment)
    }

    pub fn complete_deposit(ctx: Context<CompleteDeposit>, request_id: [u8; 32]) -> Result<()> {
        instructions::complete_deposit::handler(ctx, request_id)
    }

    /// Refund a deposit the aggregator never priced.
    pub fn expire_deposit(ctx: Context<ExpireDeposit>, request_id: [u8; 32]) -> Result<()> {
        instructions::expire_deposit::handler(ctx, request_id)
    }

    pub fn reissue_deposit_aggregation(
        ctx: Context<ReissueDepositAggregation>,
        request_id: [u8; 32],
    ) -> Result<()> {
        instructions::reissue_deposit_aggregation::handler(ctx, request_id)
    }

    // --- withdrawals ---

    pub fn request_withdrawal(ctx: Context<RequestWithdrawal>, share_amount: u64) -> Result<()> {
        instructions::request_withdrawal::handler(ctx, share_amount)
    }

    pub fn fulfill_withdrawal_aggregation(
        ctx: Context<FulfillWithdrawalAggregation>,
        request_id: [u8; 32],
        fulfillment: Fulfillment,
    ) -> Result<()> {
        instructions::fulfill_withdrawal_aggregation::handler(ctx, request_id, fulfillment)
    }

    pub fn receive_rebalance_funds(
        ctx: Context<ReceiveRebalanceFunds>,
        message_id: [u8; 32],
        source_chain_selector: u64,
        sender: [u8; 32],
        payload: Vec<u8>,
    ) -> Result<()> {
        instructions::receive_rebalance_funds::handler(
            ctx,
            message_id,
            source_chain_selector,
            sender,
            payload,
        )
    }

    pub fn report_rebalance_outcome(
        ctx: Context<ReportRebalanceOutcome>,
        request_id: [u8; 32],
        attempt: u32,
        outcome: RebalanceOutcome,
    ) -> Result<()> {
        instructions::report_rebalance_outcome::handler(ctx, request_id, attempt, outcome)
    }

    /// Id-only retry for the automation forwarder. Idempotent.
    pub fn retry_withdrawal(ctx: Context<RetryWithdrawal>, request_id: [u8; 32]) -> Result<()> {
        instructions::retry_withdrawal::handler(ctx, request_id)
    }

    pub fn withdrawal_status(
        ctx: Context<WithdrawalStatusQuery>,
        request_id: [u8; 32],
    ) -> Result<WithdrawalView> {
        instructions::views::withdrawal_status(ctx, request_id)
    }

    // --- satellites ---

    pub fn receive_transport_message(
        ctx: Context<ReceiveTransportMessage>,
        message_id: [u8; 32],
        source_chain_selector: u64,
        sender: [u8; 32],
        payload: Vec<u8>,
    ) -> Result<()> {
        instructions::receive_transport_message::handler(
            ctx,
            message_id,
            source_chain_selector,
            sender,
            payload,
        )
    }

    pub fn supply_satellite_liquidity(
        ctx: Context<SupplySatelliteLiquidity>,
        amount: u64,
    ) -> Result<()> {
        instructions::supply_satellite_liquidity::handler(ctx, amount)
    }

    pub fn satellite_liquidity(ctx: Context<SatelliteLiquidityQuery>) -> Result<LiquiditySnapshot> {
        instructions::views::satellite_liquidity(ctx)
    }

    pub fn report_satellite_liquidity(
        ctx: Context<ReportSatelliteLiquidity>,
        chain_selector: u64,
        liquidity: u64,
        logic_hash: [u8; 32],
    ) -> Result<()> {
        instructions::report_satellite_liquidity::handler(ctx, chain_selector, liquidity, logic_hash)
    }

    // --- lending ---

    pub fn draw_loan(ctx: Context<DrawLoan>, amount: u64) -> Result<()> {
        instructions::draw_loan::handler(ctx, amount)
    }

    pub fn repay_loan(ctx: Context<RepayLoan>, amount: u64) -> Result<()> {
        instructions::repay_loan::handler(ctx, amount)
    }

    pub fn draw_satellite_loan(ctx: Context<SatelliteLoan>, amount: u64) -> Result<()> {
        instructions::satellite_loan::draw_satellite_loan(ctx, amount)
    }

    pub fn repay_satellite_loan(ctx: Context<SatelliteLoan>, amount: u64) -> Result<()> {
        instructions::satellite_loan::repay_satellite_loan(ctx, amount)
    }

    // --- admin ---

    pub fn add_satellite(
        ctx: Context<UpdateRegistry>,
        chain_selector: u64,
        pool_address: [u8; 32],
        rebalance_eligible: bool,
    ) -> Result<()> {
        instructions::admin::registry::add_satellite(
            ctx,
            chain_selector,
            pool_address,
            rebalance_eligible,
        )
    }

    pub fn remove_satellite(ctx: Context<UpdateRegistry>, chain_selector: u64) -> Result<()> {
        instructions::admin::registry::remove_satellite(ctx, chain_selector)
    }

    pub fn set_rebalance_eligibility(
        ctx: Context<UpdateRegistry>,
        chain_selector: u64,
        rebalance_eligible: bool,
    ) -> Result<()> {
        instructions::admin::registry::set_rebalance_eligibility(
            ctx,
            chain_selector,
            rebalance_eligible,
        )
    }

    pub fn migrate_satellite_liquidity(
        ctx: Context<MigrateSatelliteLiquidity>,
        from_chain_selector: u64,
        to_chain_selector: u64,
        amount: u64,
    ) -> Result<()> {
        instructions::admin::migrate_satellite_liquidity::handler(
            ctx,
            from_chain_selector,
            to_chain_selector,
            amount,
        )
    }

    pub fn cancel_withdrawal(ctx: Context<CancelWithdrawal>, request_id: [u8; 32]) -> Result<()> {
        instructions::admin::cancel_withdrawal::handler(ctx, request_id)
    }

    pub fn reset_retry_budget(ctx: Context<ResetRetryBudget>, request_id: [u8; 32]) -> Result<()> {
        instructions::admin::reset_retry_budget::handler(ctx, request_id)
    }

    pub fn set_pool_cap(ctx: Context<UpdatePool>, pool_cap: u64) -> Result<()> {
        instructions::admin::pool_settings::set_pool_cap(ctx, pool_cap)
    }

    /// Pause pool: no new deposits, withdrawals or loans. Admin-only (circuit breaker).
    pub fn pause_pool(ctx: Context<UpdatePool>) -> Result<()> {
        instructions::admin::pool_settings::pause_pool(ctx)
    }

    /// Resume pool after pause. Admin-only.
    pub fn resume_pool(ctx: Context<UpdatePool>) -> Result<()> {
        instructions::admin::pool_settings::resume_pool(ctx)
    }

    pub fn set_satellite_paused(ctx: Context<UpdateSatellite>, paused: bool) -> Result<()> {
        instructions::admin::pool_settings::set_satellite_paused(ctx, paused)
    }

    pub fn set_pinned_logic(ctx: Context<UpdateConfig>, pinned: PinnedLogic) -> Result<()> {
        instructions::admin::protocol_settings::set_pinned_logic(ctx, pinned)
    }

    pub fn set_retry_policy(ctx: Context<UpdateConfig>, retry_policy: RetryPolicy) -> Result<()> {
        instructions::admin::protocol_settings::set_retry_policy(ctx, retry_policy)
    }

    pub fn set_protocol_paused(ctx: Context<UpdateConfig>, paused: bool) -> Result<()> {
        instructions::admin::protocol_settings::set_protocol_paused(ctx, paused)
    }
}
