use anchor_lang::prelude::*;

use crate::errors::PoolError;
use crate::state::{Config, PrimaryPool, WithdrawalRequest};

#[derive(Accounts)]
#[instruction(request_id: [u8; 32])]
pub struct ResetRetryBudget<'info> {
    #[account(
        seeds = [PrimaryPool::SEED_PREFIX, pool.asset_mint.as_ref()],
        bump = pool.bump,
        constraint = pool.config == config.key()
    )]
    pub pool: Account<'info, PrimaryPool>,

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
}

pub fn handler(ctx: Context<ResetRetryBudget>, _request_id: [u8; 32]) -> Result<()> {
    let request = &mut ctx.accounts.withdrawal_request;
    require!(!request.status.is_terminal(), PoolError::NotRetryable);
    msg!("Retry budget reset after {} retries", request.retry_count);
    request.retry_count = 0;
    Ok(())
}
