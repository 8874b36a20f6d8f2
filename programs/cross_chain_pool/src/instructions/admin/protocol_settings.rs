//! Protocol-wide settings stored on `Config`.

use anchor_lang::prelude::*;

use crate::automation::RetryPolicy;
use crate::errors::PoolError;
use crate::events::{PinnedLogicUpdated, RetryPolicyUpdated};
use crate::state::{Config, PinnedLogic};

#[derive(Accounts)]
pub struct UpdateConfig<'info> {
    #[account(
        mut,
        seeds = [Config::SEED_PREFIX],
        bump = config.bump,
        constraint = config.admin == admin.key() @ PoolError::UnauthorizedAdmin
    )]
    pub config: Account<'info, Config>,

    pub admin: Signer<'info>,
}

/// Aggregations still pending under the old hash will be rejected on
/// fulfillment and must be re-issued.
pub fn set_pinned_logic(ctx: Context<UpdateConfig>, pinned: PinnedLogic) -> Result<()> {
    ctx.accounts.config.pinned = pinned;
    emit!(PinnedLogicUpdated {
        logic_hash: pinned.logic_hash,
        library_hash: pinned.library_hash,
    });
    Ok(())
}

pub fn set_retry_policy(ctx: Context<UpdateConfig>, retry_policy: RetryPolicy) -> Result<()> {
    retry_policy.validate()?;
    ctx.accounts.config.retry_policy = retry_policy;
    emit!(RetryPolicyUpdated {
        aggregation_timeout: retry_policy.aggregation_timeout,
        rebalance_timeout: retry_policy.rebalance_timeout,
        deposit_expiry: retry_policy.deposit_expiry,
        max_retries: retry_policy.max_retries,
    });
    Ok(())
}

pub fn set_protocol_paused(ctx: Context<UpdateConfig>, paused: bool) -> Result<()> {
    ctx.accounts.config.paused = paused;
    msg!("Protocol paused: {}", paused);
    Ok(())
}
