//! Refunds a deposit the aggregator never priced.

use anchor_lang::prelude::*;
use anchor_spl::token::{Token, TokenAccount};

use crate::errors::PoolError;
use crate::events::DepositExpired;
use crate::instructions::common::transfer_signed;
use crate::settlement;
use crate::state::{Config, DepositRequest, PrimaryPool, Registry};

#[derive(Accounts)]
#[instruction(request_id: [u8; 32])]
pub struct ExpireDeposit<'info> {
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

    #[account(seeds = [Config::SEED_PREFIX], bump = config.bump)]
    pub config: Account<'info, Config>,

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

    #[account(mut, constraint = vault.key() == pool.vault)]
    pub vault: Account<'info, TokenAccount>,

    #[account(
        mut,
        constraint = depositor_asset_account.mint == pool.asset_mint,
        constraint = depositor_asset_account.owner == deposit_request.depositor
    )]
    pub depositor_asset_account: Account<'info, TokenAccount>,

    pub caller: Signer<'info>,

    pub token_program: Program<'info, Token>,
}

pub fn handler(ctx: Context<ExpireDeposit>, request_id: [u8; 32]) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let pool_key = ctx.accounts.pool.key();
    let pool_info = ctx.accounts.pool.to_account_info();
    let policy = ctx.accounts.config.retry_policy;

    let pool = &mut ctx.accounts.pool;
    let refunded = settlement::expire_deposit(
        &mut pool.ledger,
        &mut ctx.accounts.registry,
        &mut ctx.accounts.deposit_request,
        &policy,
        now,
    )?;

    let asset_mint = pool.asset_mint;
    let bump = [pool.bump];
    let seeds: &[&[u8]] = &[PrimaryPool::SEED_PREFIX, asset_mint.as_ref(), &bump];
    transfer_signed(
        ctx.accounts.token_program.to_account_info(),
        ctx.accounts.vault.to_account_info(),
        ctx.accounts.depositor_asset_account.to_account_info(),
        pool_info,
        &[seeds],
        refunded,
    )?;

    emit!(DepositExpired {
        pool: pool_key,
        request_id,
        refunded,
        timestamp: now,
    });
    Ok(())
}
