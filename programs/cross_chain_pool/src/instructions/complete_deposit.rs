//! Deposit, phase two: mint the shares quoted when the aggregated value landed.

use anchor_lang::prelude::*;
use anchor_spl::token::{Mint, Token, TokenAccount};

use crate::errors::PoolError;
use crate::events::DepositCompleted;
use crate::instructions::common::mint_shares;
use crate::settlement;
use crate::state::{DepositRequest, PrimaryPool};

#[derive(Accounts)]
#[instruction(request_id: [u8; 32])]
pub struct CompleteDeposit<'info> {
    #[account(
        mut,
        seeds = [PrimaryPool::SEED_PREFIX, pool.asset_mint.as_ref()],
        bump = pool.bump
    )]
    pub pool: Account<'info, PrimaryPool>,

    #[account(
        mut,
        seeds = [
            DepositRequest::SEED_PREFIX,
            pool.key().as_ref(),
            &deposit_request.nonce.to_le_bytes(),
        ],
        bump = deposit_request.bump,
        constraint = deposit_request.id == request_id @ PoolError::RequestNotFound
    )]
    pub deposit_request: Account<'info, DepositRequest>,

    #[account(mut, constraint = share_mint.key() == pool.share_mint)]
    pub share_mint: Account<'info, Mint>,

    #[account(
        mut,
        constraint = depositor_share_account.mint == pool.share_mint,
        constraint = depositor_share_account.owner == deposit_request.depositor
    )]
    pub depositor_share_account: Account<'info, TokenAccount>,

    /// Anyone may complete a priced deposit; shares always go to the depositor.
    pub caller: Signer<'info>,

    pub token_program: Program<'info, Token>,
}

pub fn handler(ctx: Context<CompleteDeposit>, request_id: [u8; 32]) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let pool_key = ctx.accounts.pool.key();
    let pool_info = ctx.accounts.pool.to_account_info();

    let pool = &mut ctx.accounts.pool;
    let request = &mut ctx.accounts.deposit_request;
    let shares = settlement::complete_deposit(&mut pool.ledger, request)?;

    let asset_mint = pool.asset_mint;
    let bump = [pool.bump];
    let seeds: &[&[u8]] = &[PrimaryPool::SEED_PREFIX, asset_mint.as_ref(), &bump];
    mint_shares(
        ctx.accounts.token_program.to_account_info(),
        ctx.accounts.share_mint.to_account_info(),
        ctx.accounts.depositor_share_account.to_account_info(),
        pool_info,
        &[seeds],
        shares,
    )?;

    emit!(DepositCompleted {
        pool: pool_key,
        request_id,
        depositor: request.depositor,
        amount: request.asset_amount_in,
        shares_minted: shares,
        timestamp: now,
    });
    Ok(())
}
