//! Automation entry point: re-emits a failed or timed-out deposit aggregation.

use anchor_lang::prelude::*;

use crate::aggregator::RequestKind;
use crate::errors::PoolError;
use crate::instructions::common::request_aggregation;
use crate::settlement;
use crate::state::{Config, DepositRequest, PrimaryPool, Registry};

#[derive(Accounts)]
#[instruction(request_id: [u8; 32])]
pub struct ReissueDepositAggregation<'info> {
    #[account(
        seeds = [PrimaryPool::SEED_PREFIX, pool.asset_mint.as_ref()],
        bump = pool.bump,
        constraint = pool.config == config.key()
    )]
    pub pool: Account<'info, PrimaryPool>,

    #[account(
        mut,
        seeds = [Registry::SEED_PREFIX, pool.key().as_ref()],
        bump = registry.bump
    )]
    pub registry: Account<'info, Registry>,

    #[account(
        seeds = [Config::SEED_PREFIX],
        bump = config.bump,
        constraint = config.is_retry_caller(&caller.key()) @ PoolError::UnauthorizedAutomation
    )]
    pub config: Account<'info, Config>,

    pub caller: Signer<'info>,

    #[account(
        mut,
        seeds = [
            DepositRequest::SEED_PREFIX,
            pool.key().as_ref(),
            &deposit_request.nonce.to_le_bytes(),
        ],
        bump = deposit_request.bump,
        constraint = deposit_request.id == request_id @ PoolError::RequestNotFound
    )]
    pub deposit_request: Account<'info, DepositRequest>,
}

pub fn handler(ctx: Context<ReissueDepositAggregation>, request_id: [u8; 32]) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let pool_key = ctx.accounts.pool.key();
    let config = &ctx.accounts.config;
    let registry = &mut ctx.accounts.registry;
    let request = &mut ctx.accounts.deposit_request;

    let attempt =
        settlement::reissue_deposit_aggregation(registry, request, &config.retry_policy, now)?;
    msg!("Deposit aggregation re-issued, attempt {}", attempt);

    request_aggregation(
        pool_key,
        request_id,
        &request.aggregation,
        RequestKind::TotalBalance,
        &config.pinned,
        registry,
        now,
    );
    Ok(())
}
