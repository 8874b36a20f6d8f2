//! Per-pool settings and the circuit breaker.

use anchor_lang::prelude::*;

use crate::errors::PoolError;
use crate::events::{PoolCapUpdated, PoolPauseToggled};
use crate::state::{Config, PrimaryPool, SatellitePool};

#[derive(Accounts)]
pub struct UpdatePool<'info> {
    #[account(
        mut,
        seeds = [PrimaryPool::SEED_PREFIX, pool.asset_mint.as_ref()],
        bump = pool.bump,
        constraint = pool.config == config.key()
    )]
    pub pool: Account<'info, PrimaryPool>,

    #[account(
        seeds = [Config::SEED_PREFIX],
        bump = config.bump,
        constraint = config.admin == admin.key() @ PoolError::UnauthorizedAdmin
    )]
    pub config: Account<'info, Config>,

    pub admin: Signer<'info>,
}

/// A cap below current holdings only blocks new deposits.
pub fn set_pool_cap(ctx: Context<UpdatePool>, pool_cap: u64) -> Result<()> {
    require!(pool_cap > 0, PoolError::ZeroAmount);
    let pool_key = ctx.accounts.pool.key();
    ctx.accounts.pool.pool_cap = pool_cap;

    emit!(PoolCapUpdated {
        pool: pool_key,
        pool_cap,
    });
    Ok(())
}

/// Pause pool: no new deposits, withdrawals or loans. Callbacks for requests
/// already in flight still settle.
pub fn pause_pool(ctx: Context<UpdatePool>) -> Result<()> {
    set_paused(ctx, true)
}

pub fn resume_pool(ctx: Context<UpdatePool>) -> Result<()> {
    set_paused(ctx, false)
}

fn set_paused(ctx: Context<UpdatePool>, paused: bool) -> Result<()> {
    let pool_key = ctx.accounts.pool.key();
    ctx.accounts.pool.paused = paused;
    msg!("Pool {} paused: {}", pool_key, paused);
    emit!(PoolPauseToggled {
        pool: pool_key,
        paused,
    });
    Ok(())
}

#[derive(Accounts)]
pub struct UpdateSatellite<'info> {
    #[account(
        mut,
        seeds = [SatellitePool::SEED_PREFIX, satellite.asset_mint.as_ref()],
        bump = satellite.bump,
        constraint = satellite.config == config.key()
    )]
    pub satellite: Account<'info, SatellitePool>,

    #[account(
        seeds = [Config::SEED_PREFIX],
        bump = config.bump,
        constraint = config.admin == admin.key() @ PoolError::UnauthorizedAdmin
    )]
    pub config: Account<'info, Config>,

    pub admin: Signer<'info>,
}

pub fn set_satellite_paused(ctx: Context<UpdateSatellite>, paused: bool) -> Result<()> {
    let satellite_key = ctx.accounts.satellite.key();
    ctx.accounts.satellite.paused = paused;
    emit!(PoolPauseToggled {
        pool: satellite_key,
        paused,
    });
    Ok(())
}
