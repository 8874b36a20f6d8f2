//! Deposit, phase one: escrow the asset and ask the aggregator for the
//! satellite value the deposit will be priced against.

use anchor_lang::prelude::*;
use anchor_spl::token::{Token, TokenAccount};

use crate::aggregator::RequestKind;
use crate::errors::PoolError;
use crate::events::DepositStarted;
use crate::instructions::common::{request_aggregation, transfer_by_owner};
use crate::state::primary_pool::DEPOSIT_TAG;
use crate::state::{Config, DepositRequest, DepositStatus, PrimaryPool, Registry};

#[derive(Accounts)]
pub struct StartDeposit<'info> {
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

    /// PDA: ["deposit", pool, nonce]. Client derives using current pool.next_request_nonce.
    #[account(
        init,
        payer = depositor,
        space = 8 + DepositRequest::LEN,
        seeds = [
            DepositRequest::SEED_PREFIX,
            pool.key().as_ref(),
            &pool.next_request_nonce.to_le_bytes(),
        ],
        bump
    )]
    pub deposit_request: Account<'info, DepositRequest>,

    #[account(mut)]
    pub depositor: Signer<'info>,

    #[account(
        mut,
        constraint = depositor_asset_account.mint == pool.asset_mint,
        constraint = depositor_asset_account.owner == depositor.key()
    )]
    pub depositor_asset_account: Account<'info, TokenAccount>,

    #[account(mut, constraint = vault.key() == pool.vault)]
    pub vault: Account<'info, TokenAccount>,

    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
}

pub fn handler(ctx: Context<StartDeposit>, amount: u64) -> Result<()> {
    let config = &ctx.accounts.config;
    config.require_not_paused()?;
    require!(amount > 0, PoolError::ZeroAmount);

    let now = Clock::get()?.unix_timestamp;
    let pool_key = ctx.accounts.pool.key();
    let depositor = ctx.accounts.depositor.key();

    let pool = &mut ctx.accounts.pool;
    pool.require_not_paused()?;
    let pool_cap = pool.pool_cap;
    pool.ledger.escrow_deposit(amount, pool_cap)?;
    let (nonce, request_id) = pool.next_request(DEPOSIT_TAG, &pool_key, &depositor, amount)?;

    transfer_by_owner(
        ctx.accounts.token_program.to_account_info(),
        ctx.accounts.depositor_asset_account.to_account_info(),
        ctx.accounts.vault.to_account_info(),
        ctx.accounts.depositor.to_account_info(),
        amount,
    )?;

    let registry = &mut ctx.accounts.registry;
    let request = &mut ctx.accounts.deposit_request;
    request.pool = pool_key;
    request.id = request_id;
    request.nonce = nonce;
    request.depositor = depositor;
    request.asset_amount_in = amount;
    request.shares_minted = 0;
    request.created_at = now;
    request.status = DepositStatus::Started;
    request.quote = None;
    request.bump = ctx.bumps.deposit_request;
    registry.begin_aggregation(&mut request.aggregation, now)?;

    emit!(DepositStarted {
        pool: pool_key,
        request_id,
        depositor,
        amount,
        timestamp: now,
    });
    request_aggregation(
        pool_key,
        request_id,
        &request.aggregation,
        RequestKind::TotalBalance,
        &config.pinned,
        registry,
        now,
    );

    Ok(())
}
