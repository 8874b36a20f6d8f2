//! Satellite registry management.
//!
//! Every change bumps the registry version, which invalidates aggregations
//! issued against the old set. Removal is refused while any aggregation is
//! pending.

use anchor_lang::prelude::*;

use crate::errors::PoolError;
use crate::events::{RebalanceEligibilityUpdated, SatelliteRegistered, SatelliteRemoved};
use crate::state::{Config, PrimaryPool, Registry};

#[derive(Accounts)]
pub struct UpdateRegistry<'info> {
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
        constraint = config.admin == admin.key() @ PoolError::UnauthorizedAdmin
    )]
    pub config: Account<'info, Config>,

    pub admin: Signer<'info>,
}

pub fn add_satellite(
    ctx: Context<UpdateRegistry>,
    chain_selector: u64,
    pool_address: [u8; 32],
    rebalance_eligible: bool,
) -> Result<()> {
    let registry_key = ctx.accounts.registry.key();
    let registry = &mut ctx.accounts.registry;
    registry.add_satellite(chain_selector, pool_address, rebalance_eligible)?;

    emit!(SatelliteRegistered {
        registry: registry_key,
        chain_selector,
        pool_address,
        rebalance_eligible,
        version: registry.version,
    });
    Ok(())
}

pub fn remove_satellite(ctx: Context<UpdateRegistry>, chain_selector: u64) -> Result<()> {
    let registry_key = ctx.accounts.registry.key();
    let registry = &mut ctx.accounts.registry;
    registry.remove_satellite(chain_selector)?;

    emit!(SatelliteRemoved {
        registry: registry_key,
        chain_selector,
        version: registry.version,
    });
    Ok(())
}

pub fn set_rebalance_eligibility(
    ctx: Context<UpdateRegistry>,
    chain_selector: u64,
    rebalance_eligible: bool,
) -> Result<()> {
    let registry_key = ctx.accounts.registry.key();
    let registry = &mut ctx.accounts.registry;
    registry.set_rebalance_eligibility(chain_selector, rebalance_eligible)?;

    emit!(RebalanceEligibilityUpdated {
        registry: registry_key,
        chain_selector,
        rebalance_eligible,
        version: registry.version,
    });
    Ok(())
}
