//! Lending venue draws idle primary liquidity. Value-neutral: the amount
//! moves from local balance to loans in use.

use anchor_lang::prelude::*;
use anchor_spl::token::{Token, TokenAccount};

use crate::errors::PoolError;
use crate::events::LoanDrawn;
use crate::instructions::common::transfer_signed;
use crate::state::{Config, PrimaryPool};

#[derive(Accounts)]
pub struct DrawLoan<'info> {
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
        constraint = config.lender == lender.key() @ PoolError::UnauthorizedLender
    )]
    pub config: Account<'info, Config>,

    pub lender: Signer<'info>,

    #[account(mut, constraint = vault.key() == pool.vault)]
    pub vault: Account<'info, TokenAccount>,

    #[account(
        mut,
        constraint = lender_account.mint == pool.asset_mint,
        constraint = lender_account.owner == lender.key()
    )]
    pub lender_account: Account<'info, TokenAccount>,

    pub token_program: Program<'info, Token>,
}

pub fn handler(ctx: Context<DrawLoan>, amount: u64) -> Result<()> {
    ctx.accounts.config.require_not_paused()?;
    let pool_key = ctx.accounts.pool.key();
    let pool_info = ctx.accounts.pool.to_account_info();

    let pool = &mut ctx.accounts.pool;
    pool.require_not_paused()?;
    pool.ledger.draw_loan(amount)?;

    let asset_mint = pool.asset_mint;
    let bump = [pool.bump];
    let seeds: &[&[u8]] = &[PrimaryPool::SEED_PREFIX, asset_mint.as_ref(), &bump];
    transfer_signed(
        ctx.accounts.token_program.to_account_info(),
        ctx.accounts.vault.to_account_info(),
        ctx.accounts.lender_account.to_account_info(),
        pool_info,
        &[seeds],
        amount,
    )?;

    emit!(LoanDrawn {
        pool: pool_key,
        amount,
        loans_in_use: pool.ledger.loans_in_use(),
    });
    Ok(())
}
