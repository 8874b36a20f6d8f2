//! Oracle refresh of the cached per-satellite liquidity used to pick
//! rebalance sources. Does not touch the registry version.

use anchor_lang::prelude::*;

use crate::errors::PoolError;
use crate::events::SatelliteLiquidityReported;
use crate::state::{Config, PrimaryPool, Registry};

#[derive(Accounts)]
pub struct ReportSatelliteLiquidity<'info> {
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
        constraint = config.oracle == oracle.key() @ PoolError::UnauthorizedOracle
    )]
    pub config: Account<'info, Config>,

    pub oracle: Signer<'info>,
}

pub fn handler(
    ctx: Context<ReportSatelliteLiquidity>,
    chain_selector: u64,
    liquidity: u64,
    logic_hash: [u8; 32],
) -> Result<()> {
    ctx.accounts.config.pinned.verify(&logic_hash)?;

    let now = Clock::get()?.unix_timestamp;
    ctx.accounts
        .registry
        .report_liquidity(chain_selector, liquidity, now)?;

    emit!(SatelliteLiquidityReported {
        chain_selector,
        liquidity,
        timestamp: now,
    });
    Ok(())
}
