//! Admin cancellation of a withdrawal that never got a priced amount.
//! Only legal before any funds moved; the escrowed shares go back.

use anchor_lang::prelude::*;
use anchor_spl::token::{Token, TokenAccount};

use crate::errors::PoolError;
use crate::events::WithdrawalCancelled;
use crate::instructions::common::transfer_signed;
use crate::settlement;
use crate::state::{Config, PrimaryPool, Registry, WithdrawalRequest};

#[derive(Accounts)]
#[instruction(request_id: [u8; 32])]
pub struct CancelWithdrawal<'info> {
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

    #[account(
        mut,
        seeds = [
            WithdrawalRequest::SEED_PREFIX,
            pool.key().as_ref(),
            &withdrawal_request.nonce.to_le_bytes(),
        ],
        bump = withdrawal_request.bump,
        constraint = withdrawal_request.id == request_id @ PoolError::RequestNotFound
    )]
    pub withdrawal_request: Account<'info, WithdrawalRequest>,

    #[account(mut, constraint = share_escrow.key() == pool.share_escrow)]
    pub share_escrow: Account<'info, TokenAccount>,

    #[account(
        mut,
        constraint = requester_share_account.mint == pool.share_mint,
        constraint = requester_share_account.owner == withdrawal_request.requester
    )]
    pub requester_share_account: Account<'info, TokenAccount>,

    pub token_program: Program<'info, Token>,
}

pub fn handler(ctx: Context<CancelWithdrawal>, request_id: [u8; 32]) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let policy = ctx.accounts.config.retry_policy;

    let shares = settlement::cancel_withdrawal(
        &mut ctx.accounts.registry,
        &mut ctx.accounts.withdrawal_request,
        &policy,
        now,
    )?;

    let pool = &ctx.accounts.pool;
    let bump = [pool.bump];
    let seeds: &[&[u8]] = &[PrimaryPool::SEED_PREFIX, pool.asset_mint.as_ref(), &bump];
    transfer_signed(
        ctx.accounts.token_program.to_account_info(),
        ctx.accounts.share_escrow.to_account_info(),
        ctx.accounts.requester_share_account.to_account_info(),
        pool.to_account_info(),
        &[seeds],
        shares,
    )?;

    emit!(WithdrawalCancelled {
        request_id,
        shares_returned: shares,
        timestamp: now,
    });
    Ok(())
}
