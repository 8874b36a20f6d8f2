//! Id-only retry entry point for the automation forwarder.

use anchor_lang::prelude::*;
use anchor_spl::token::{Token, TokenAccount};

use crate::aggregator::RequestKind;
use crate::errors::PoolError;
use crate::events::WithdrawalRetried;
use crate::instructions::common::{execute_settlement, request_aggregation, PayoutAccounts};
use crate::settlement::{self, RetryOutcome};
use crate::state::{Config, PrimaryPool, Registry, WithdrawalRequest};

#[derive(Accounts)]
#[instruction(request_id: [u8; 32])]
pub struct RetryWithdrawal<'info> {
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
        constraint = config.is_retry_caller(&caller.key()) @ PoolError::UnauthorizedAutomation
    )]
    pub config: Account<'info, Config>,

    pub caller: Signer<'info>,

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

pub fn handler(ctx: Context<RetryWithdrawal>, request_id: [u8; 32]) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let pool_key = ctx.accounts.pool.key();
    let payout_accounts = PayoutAccounts {
        token_program: ctx.accounts.token_program.to_account_info(),
        vault: ctx.accounts.vault.to_account_info(),
        recipient: ctx.accounts.requester_asset_account.to_account_info(),
        pool: ctx.accounts.pool.to_account_info(),
    };

    let config = &ctx.accounts.config;
    let pool = &mut ctx.accounts.pool;
    let registry = &mut ctx.accounts.registry;
    let request = &mut ctx.accounts.withdrawal_request;

    let outcome = settlement::retry_withdrawal(
        &mut pool.ledger,
        registry,
        request,
        &config.retry_policy,
        now,
    )?;

    match outcome {
        RetryOutcome::StillInMotion => {
            msg!(
                "Rebalance attempt {} still in motion, nothing to retry",
                request.rebalance.attempt
            );
            return Ok(());
        }
        RetryOutcome::Reissued { attempt } => {
            msg!("Withdrawal aggregation re-issued, attempt {}", attempt);
            request_aggregation(
                pool_key,
                request_id,
                &request.aggregation,
                RequestKind::WithdrawableAmountForRequest {
                    request_id,
                    share_amount: request.share_amount_in,
                },
                &config.pinned,
                registry,
                now,
            );
        }
        RetryOutcome::Settled(action) => {
            let asset_mint = pool.asset_mint;
            let bump = [pool.bump];
            let seeds: &[&[u8]] = &[PrimaryPool::SEED_PREFIX, asset_mint.as_ref(), &bump];
            execute_settlement(
                action,
                payout_accounts,
                &[seeds],
                request,
                config.local_chain_selector,
                pool.ledger.total_local_balance(),
                now,
            )?;
        }
    }

    emit!(WithdrawalRetried {
        request_id,
        status: request.status,
        retry_count: request.retry_count,
    });
    Ok(())
}
