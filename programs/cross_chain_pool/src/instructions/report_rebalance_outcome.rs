//! Transport report about a dispatched rebalance.
//!
//! `Dropped` frees the request for a new dispatch; `DuplicateSubmission`
//! means the transfer already exists and changes nothing.

use anchor_lang::prelude::*;

use crate::errors::PoolError;
use crate::events::RebalanceOutcomeReported;
use crate::settlement;
use crate::state::{Config, PrimaryPool, Registry, WithdrawalRequest};
use crate::transport::RebalanceOutcome;

#[derive(Accounts)]
#[instruction(request_id: [u8; 32])]
pub struct ReportRebalanceOutcome<'info> {
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
        constraint = config.transport == transport.key() @ PoolError::UnauthorizedTransport
    )]
    pub config: Account<'info, Config>,

    pub transport: Signer<'info>,

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
}

pub fn handler(
    ctx: Context<ReportRebalanceOutcome>,
    request_id: [u8; 32],
    attempt: u32,
    outcome: RebalanceOutcome,
) -> Result<()> {
    let pool = &mut ctx.accounts.pool;
    let registry = &mut ctx.accounts.registry;
    let request = &mut ctx.accounts.withdrawal_request;

    let applied = match outcome {
        RebalanceOutcome::Dropped => {
            settlement::rebalance_dropped(&mut pool.ledger, registry, request, attempt)?
        }
        RebalanceOutcome::DuplicateSubmission => {
            msg!("Duplicate submission for attempt {}, treated as sent", attempt);
            false
        }
    };
    if outcome == RebalanceOutcome::Dropped && !applied {
        msg!("Drop report for attempt {} is not the live transfer", attempt);
    }

    emit!(RebalanceOutcomeReported {
        request_id,
        attempt,
        outcome,
        applied,
    });
    Ok(())
}
