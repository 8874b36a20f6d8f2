//! Instructs a satellite to move liquidity to another satellite, typically
//! before the source is removed from the registry. Refused while any
//! aggregation is pending.

use anchor_lang::prelude::*;

use crate::errors::PoolError;
use crate::instructions::common::queue_transport_message;
use crate::state::primary_pool::MIGRATION_TAG;
use crate::state::{Config, PrimaryPool, Registry};
use crate::transport::TransportPayload;

#[derive(Accounts)]
pub struct MigrateSatelliteLiquidity<'info> {
    #[account(
        mut,
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

pub fn handler(
    ctx: Context<MigrateSatelliteLiquidity>,
    from_chain_selector: u64,
    to_chain_selector: u64,
    amount: u64,
) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let pool_key = ctx.accounts.pool.key();
    let admin = ctx.accounts.admin.key();
    let local_chain_selector = ctx.accounts.config.local_chain_selector;

    let (source, destination) =
        ctx.accounts
            .registry
            .begin_migration(from_chain_selector, to_chain_selector, amount)?;

    let (_, migration_id) =
        ctx.accounts
            .pool
            .next_request(MIGRATION_TAG, &pool_key, &admin, amount)?;
    let payload = TransportPayload::migrate_liquidity(
        amount,
        migration_id,
        destination.chain_selector,
        destination.pool_address,
    );
    queue_transport_message(
        local_chain_selector,
        source.chain_selector,
        source.pool_address,
        &payload,
        now,
    );

    msg!(
        "Migrating {} from chain {} to chain {}",
        amount,
        from_chain_selector,
        to_chain_selector
    );
    Ok(())
}
