//! Lending venue returns principal to the primary vault.

use anchor_lang::prelude::*;
use anchor_spl::token::{Token, TokenAccount};

use crate::errors::PoolError;
use crate::events::LoanRepaid;
use crate::instructions::common::transfer_by_owner;
use crate::state::{Config, PrimaryPool};

#[derive(Accounts)]
pub struct RepayLoan<'info> {
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

pub fn handler(ctx: Context<RepayLoan>, amount: u64) -> Result<()> {
    let pool_key = ctx.accounts.pool.key();
    ctx.accounts.pool.ledger.repay_loan(amount)?;

    transfer_by_owner(
        ctx.accounts.token_program.to_account_info(),
        ctx.accounts.lender_account.to_account_info(),
        ctx.accounts.vault.to_account_info(),
        ctx.accounts.lender.to_account_info(),
        amount,
    )?;

    emit!(LoanRepaid {
        pool: pool_key,
        amount,
        loans_in_use: ctx.accounts.pool.ledger.loans_in_use(),
    });
    Ok(())
}
