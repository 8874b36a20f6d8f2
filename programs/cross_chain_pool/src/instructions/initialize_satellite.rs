//! Creates a satellite pool on a non-primary chain.

use anchor_lang::prelude::*;
use anchor_spl::token::{Mint, Token, TokenAccount};

use crate::errors::PoolError;
use crate::state::{Config, SatellitePool};

#[derive(Accounts)]
pub struct InitializeSatellite<'info> {
    #[account(
        init,
        payer = admin,
        space = 8 + SatellitePool::LEN,
        seeds = [SatellitePool::SEED_PREFIX, asset_mint.key().as_ref()],
        bump
    )]
    pub satellite: Account<'info, SatellitePool>,

    #[account(
        seeds = [Config::SEED_PREFIX],
        bump = config.bump,
        constraint = config.admin == admin.key() @ PoolError::UnauthorizedAdmin
    )]
    pub config: Account<'info, Config>,

    #[account(mut)]
    pub admin: Signer<'info>,

    pub asset_mint: Account<'info, Mint>,

    #[account(
        constraint = vault.mint == asset_mint.key(),
        constraint = vault.owner == satellite.key() @ PoolError::UnauthorizedAdmin
    )]
    pub vault: Account<'info, TokenAccount>,

    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
}

pub fn handler(
    ctx: Context<InitializeSatellite>,
    primary_chain_selector: u64,
    primary_pool_address: [u8; 32],
) -> Result<()> {
    let satellite = &mut ctx.accounts.satellite;
    satellite.config = ctx.accounts.config.key();
    satellite.asset_mint = ctx.accounts.asset_mint.key();
    satellite.vault = ctx.accounts.vault.key();
    satellite.primary_chain_selector = primary_chain_selector;
    satellite.primary_pool_address = primary_pool_address;
    satellite.local_balance = 0;
    satellite.loans_in_use = 0;
    satellite.sent_to_primary = 0;
    satellite.sent_to_satellites = 0;
    satellite.received_from_satellites = 0;
    satellite.paused = false;
    satellite.bump = ctx.bumps.satellite;

    msg!(
        "Satellite initialized, primary on chain {}",
        primary_chain_selector
    );
    Ok(())
}
