//! Oracle callback carrying the asset amount owed to a withdrawal.
//!
//! On success the amount is fixed, the escrowed shares are burned and the
//! payout is routed: paid from the vault if it covers it, otherwise locked
//! and pulled from a satellite.

use anchor_lang::prelude::*;
use anchor_spl::token::{Mint, Token, TokenAccount};

use crate::aggregator::{AggregationOutcome, Fulfillment};
use crate::errors::PoolError;
use crate::events::{AggregationFailed, AggregationFulfilled, WithdrawalAmountComputed};
use crate::instructions::common::{burn_escrowed_shares, execute_settlement, PayoutAccounts};
use crate::settlement;
use crate::state::{Config, PrimaryPool, Registry, WithdrawalRequest};

#[derive(Accounts)]
#[instruction(request_id: [u8; 32])]
pub struct FulfillWithdrawalAggregation<'info> {
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

    #[account(
        seeds = [Config::SEED_PREFIX],
        bump = config.bump,
        constraint = config.oracle == oracle.key() @ PoolError::UnauthorizedOracle
    )]
    pub config: Account<'info, Config>,

    pub oracle: Signer<'info>,

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

    #[account(mut, constraint = share_mint.key() == pool.share_mint)]
    pub share_mint: Account<'info, Mint>,

    #[account(mut, constraint = share_escrow.key() == pool.share_escrow)]
    pub share_escrow: Account<'info, TokenAccount>,

    #[account(mut, constraint = vault.key() == pool.vault)]
    pub vault: Account<'info, TokenAccount>,

    #[account(
        mut,
        constraint = requester_asset_account.mint == pool.asset_mint,
        constraint = requester_asset_account.owner == withdrawal_request.requester
    )]
    pub requester_asset_account: Account<'info, TokenAccount>,

    pub token_program: Program<'info, Token>,
}

pub fn handler(
    ctx: Context<FulfillWithdrawalAggregation>,
    request_id: [u8; 32],
    fulfillment: Fulfillment,
) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let pool_info = ctx.accounts.pool.to_account_info();
    let token_program = ctx.accounts.token_program.to_account_info();
    let payout_accounts = PayoutAccounts {
        token_program: token_program.clone(),
        vault: ctx.accounts.vault.to_account_info(),
        recipient: ctx.accounts.requester_asset_account.to_account_info(),
        pool: pool_info.clone(),
    };

    let config = &ctx.accounts.config;
    let pool = &mut ctx.accounts.pool;
    let registry = &mut ctx.accounts.registry;
    let request = &mut ctx.accounts.withdrawal_request;

    let (outcome, action) = settlement::fulfill_withdrawal(
        &mut pool.ledger,
        registry,
        &config.pinned,
        request,
        &fulfillment,
        now,
    )?;

    let action = match (outcome, action) {
        (AggregationOutcome::Value(value), Some(action)) => {
            emit!(AggregationFulfilled {
                request_id,
                attempt: fulfillment.attempt,
                value,
            });
            action
        }
        (AggregationOutcome::Failed(error), _) => {
            msg!(
                "Withdrawal aggregation attempt {} failed, awaiting retry",
                fulfillment.attempt
            );
            emit!(AggregationFailed {
                request_id,
                attempt: fulfillment.attempt,
                failures: request.aggregation.failures,
                error,
            });
            return Ok(());
        }
        (AggregationOutcome::Value(_), None) => return err!(PoolError::InvalidRequestStatus),
    };

    emit!(WithdrawalAmountComputed {
        request_id,
        share_amount: request.share_amount_in,
        asset_amount_out: request.asset_amount_out,
    });

    let asset_mint = pool.asset_mint;
    let bump = [pool.bump];
    let seeds: &[&[u8]] = &[PrimaryPool::SEED_PREFIX, asset_mint.as_ref(), &bump];
    burn_escrowed_shares(
        token_program,
        ctx.accounts.share_mint.to_account_info(),
        ctx.accounts.share_escrow.to_account_info(),
        pool_info,
        &[seeds],
        request.share_amount_in,
    )?;

    execute_settlement(
        action,
        payout_accounts,
        &[seeds],
        request,
        config.local_chain_selector,
        pool.ledger.total_local_balance(),
        now,
    )
}
