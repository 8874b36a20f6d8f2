//! Lending hooks on a satellite. Same accounting as the primary: balance and
//! loans in use move together, so the aggregated satellite value is unchanged.

use anchor_lang::prelude::*;
use anchor_spl::token::{Token, TokenAccount};

use crate::errors::PoolError;
use crate::events::{LoanDrawn, LoanRepaid};
use crate::instructions::common::{transfer_by_owner, transfer_signed};
use crate::state::{Config, SatellitePool};

#[derive(Accounts)]
pub struct SatelliteLoan<'info> {
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
        constraint = config.lender == lender.key() @ PoolError::UnauthorizedLender
    )]
    pub config: Account<'info, Config>,

    pub lender: Signer<'info>,

    #[account(mut, constraint = vault.key() == satellite.vault)]
    pub vault: Account<'info, TokenAccount>,

    #[account(
        mut,
        constraint = lender_account.mint == satellite.asset_mint,
        constraint = lender_account.owner == lender.key()
    )]
    pub lender_account: Account<'info, TokenAccount>,

    pub token_program: Program<'info, Token>,
}

pub fn draw_satellite_loan(ctx: Context<SatelliteLoan>, amount: u64) -> Result<()> {
    let satellite_key = ctx.accounts.satellite.key();
    let satellite_info = ctx.accounts.satellite.to_account_info();

    let satellite = &mut ctx.accounts.satellite;
    satellite.require_not_paused()?;
    satellite.draw_loan(amount)?;

    let asset_mint = satellite.asset_mint;
    let bump = [satellite.bump];
    let seeds: &[&[u8]] = &[SatellitePool::SEED_PREFIX, asset_mint.as_ref(), &bump];
    transfer_signed(
        ctx.accounts.token_program.to_account_info(),
        ctx.accounts.vault.to_account_info(),
        ctx.accounts.lender_account.to_account_info(),
        satellite_info,
        &[seeds],
        amount,
    )?;

    emit!(LoanDrawn {
        pool: satellite_key,
        amount,
        loans_in_use: satellite.loans_in_use,
    });
    Ok(())
}

pub fn repay_satellite_loan(ctx: Context<SatelliteLoan>, amount: u64) -> Result<()> {
    let satellite_key = ctx.accounts.satellite.key();
    ctx.accounts.satellite.repay_loan(amount)?;

    transfer_by_owner(
        ctx.accounts.token_program.to_account_info(),
        ctx.accounts.lender_account.to_account_info(),
        ctx.accounts.vault.to_account_info(),
        ctx.accounts.lender.to_account_info(),
        amount,
    )?;

    emit!(LoanRepaid {
        pool: satellite_key,
        amount,
        loans_in_use: ctx.accounts.satellite.loans_in_use,
    });
    Ok(())
}
