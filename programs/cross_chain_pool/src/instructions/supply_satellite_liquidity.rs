//! Seeds a satellite with liquidity from the admin treasury.

use anchor_lang::prelude::*;
use anchor_spl::token::{Token, TokenAccount};

use crate::errors::PoolError;
use crate::instructions::common::transfer_by_owner;
use crate::state::{Config, SatellitePool};

#[derive(Accounts)]
pub struct SupplySatelliteLiquidity<'info> {
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

    #[account(
        mut,
        constraint = admin_asset_account.mint == satellite.asset_mint,
        constraint = admin_asset_account.owner == admin.key()
    )]
    pub admin_asset_account: Account<'info, TokenAccount>,

    #[account(mut, constraint = vault.key() == satellite.vault)]
    pub vault: Account<'info, TokenAccount>,

    pub token_program: Program<'info, Token>,
}

pub fn handler(ctx: Context<SupplySatelliteLiquidity>, amount: u64) -> Result<()> {
    require!(amount > 0, PoolError::ZeroAmount);

    transfer_by_owner(
        ctx.accounts.token_program.to_account_info(),
        ctx.accounts.admin_asset_account.to_account_info(),
        ctx.accounts.vault.to_account_info(),
        ctx.accounts.admin.to_account_info(),
        amount,
    )?;
    ctx.accounts.satellite.credit(amount)?;

    msg!(
        "Satellite supplied {}, local balance {}",
        amount,
        ctx.accounts.satellite.local_balance
    );
    Ok(())
}
