//! Read-only instructions. Results are returned through return data.

use anchor_lang::prelude::*;

use crate::errors::PoolError;
use crate::state::{
    LiquiditySnapshot, PrimaryPool, RebalanceTicket, SatellitePool, WithdrawalRequest,
    WithdrawalStatus,
};

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct WithdrawalView {
    pub status: WithdrawalStatus,
    pub share_amount_in: u64,
    pub asset_amount_out: u64,
    pub retry_count: u16,
    pub aggregation_attempt: u32,
    pub rebalance: RebalanceTicket,
}

impl From<&WithdrawalRequest> for WithdrawalView {
    fn from(request: &WithdrawalRequest) -> Self {
        Self {
            status: request.status,
            share_amount_in: request.share_amount_in,
            asset_amount_out: request.asset_amount_out,
            retry_count: request.retry_count,
            aggregation_attempt: request.aggregation.attempt,
            rebalance: request.rebalance,
        }
    }
}

#[derive(Accounts)]
#[instruction(request_id: [u8; 32])]
pub struct WithdrawalStatusQuery<'info> {
    #[account(
        seeds = [PrimaryPool::SEED_PREFIX, pool.asset_mint.as_ref()],
        bump = pool.bump
    )]
    pub pool: Account<'info, PrimaryPool>,

    #[account(
        seeds = [
            WithdrawalRequest::SEED_PREFIX,
            pool.key().as_ref(),
            &withdrawal_request.nonce.to_le_bytes(),
        ],
        bump = withdrawal_request.bump,
        constraint = withdrawal_request.id == request_id @ PoolError::RequestNotFound
    )]
    pub withdrawal_request: Account<'info, WithdrawalRequest>,
}

pub fn withdrawal_status(
    ctx: Context<WithdrawalStatusQuery>,
    _request_id: [u8; 32],
) -> Result<WithdrawalView> {
    let request: &WithdrawalRequest = &ctx.accounts.withdrawal_request;
    Ok(request.into())
}

#[derive(Accounts)]
pub struct SatelliteLiquidityQuery<'info> {
    #[account(
        seeds = [SatellitePool::SEED_PREFIX, satellite.asset_mint.as_ref()],
        bump = satellite.bump
    )]
    pub satellite: Account<'info, SatellitePool>,
}

pub fn satellite_liquidity(ctx: Context<SatelliteLiquidityQuery>) -> Result<LiquiditySnapshot> {
    Ok(ctx.accounts.satellite.snapshot())
}
