//! Withdrawal, phase one: escrow shares and ask the aggregator how many
//! assets they redeem for.

use anchor_lang::prelude::*;
use anchor_spl::token::{Token, TokenAccount};

use crate::aggregator::RequestKind;
use crate::errors::PoolError;
use crate::events::WithdrawalRequested;
use crate::instructions::common::{request_aggregation, transfer_by_owner};
use crate::state::primary_pool::WITHDRAWAL_TAG;
use crate::state::{
    AggregationTicket, Config, PrimaryPool, RebalanceTicket, Registry, WithdrawalRequest,
    WithdrawalStatus,
};

#[derive(Accounts)]
pub struct RequestWithdrawal<'info> {
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

    /// PDA: ["withdrawal", pool, nonce]. Client derives using current pool.next_request_nonce.
    #[account(
        init,
        payer = requester,
        space = 8 + WithdrawalRequest::LEN,
        seeds = [
            WithdrawalRequest::SEED_PREFIX,
            pool.key().as_ref(),
            &pool.next_request_nonce.to_le_bytes(),
        ],
        bump
    )]
    pub withdrawal_request: Account<'info, WithdrawalRequest>,

    #[account(mut)]
    pub requester: Signer<'info>,

    #[account(
        mut,
        constraint = requester_share_account.mint == pool.share_mint,
        constraint = requester_share_account.owner == requester.key()
    )]
    pub requester_share_account: Account<'info, TokenAccount>,

    #[account(mut, constraint = share_escrow.key() == pool.share_escrow)]
    pub share_escrow: Account<'info, TokenAccount>,

    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
}

pub fn handler(ctx: Context<RequestWithdrawal>, share_amount: u64) -> Result<()> {
    let config = &ctx.accounts.config;
    config.require_not_paused()?;
    require!(share_amount > 0, PoolError::ZeroAmount);
    require!(
        ctx.accounts.requester_share_account.amount >= share_amount,
        PoolError::InsufficientShares
    );

    let now = Clock::get()?.unix_timestamp;
    let pool_key = ctx.accounts.pool.key();
    let requester = ctx.accounts.requester.key();

    let pool = &mut ctx.accounts.pool;
    pool.require_not_paused()?;
    let (nonce, request_id) =
        pool.next_request(WITHDRAWAL_TAG, &pool_key, &requester, share_amount)?;

    transfer_by_owner(
        ctx.accounts.token_program.to_account_info(),
        ctx.accounts.requester_share_account.to_account_info(),
        ctx.accounts.share_escrow.to_account_info(),
        ctx.accounts.requester.to_account_info(),
        share_amount,
    )?;

    let registry = &mut ctx.accounts.registry;
    let request = &mut ctx.accounts.withdrawal_request;
    request.pool = pool_key;
    request.id = request_id;
    request.nonce = nonce;
    request.requester = requester;
    request.share_amount_in = share_amount;
    request.asset_amount_out = 0;
    request.status = WithdrawalStatus::Requested;
    request.retry_count = 0;
    request.created_at = now;
    request.updated_at = now;
    request.aggregation = AggregationTicket::default();
    request.rebalance = RebalanceTicket::default();
    request.bump = ctx.bumps.withdrawal_request;
    registry.begin_aggregation(&mut request.aggregation, now)?;

    emit!(WithdrawalRequested {
        pool: pool_key,
        request_id,
        requester,
        share_amount,
        timestamp: now,
    });
    request_aggregation(
        pool_key,
        request_id,
        &request.aggregation,
        RequestKind::WithdrawableAmountForRequest {
            request_id,
            share_amount,
        },
        &config.pinned,
        registry,
        now,
    );

    Ok(())
}
