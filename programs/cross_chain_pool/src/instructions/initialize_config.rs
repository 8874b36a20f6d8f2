//! Global protocol config. Must be created once before any pool.

use anchor_lang::prelude::*;

use crate::automation::RetryPolicy;
use crate::state::{Config, PinnedLogic};

#[derive(Accounts)]
pub struct InitializeConfig<'info> {
    #[account(
        init,
        payer = admin,
        space = 8 + Config::LEN,
        seeds = [Config::SEED_PREFIX],
        bump
    )]
    pub config: Account<'info, Config>,

    #[account(mut)]
    pub admin: Signer<'info>,

    /// CHECK: aggregator fulfillment authority, stored in config
    pub oracle: UncheckedAccount<'info>,

    /// CHECK: transport delivery authority, stored in config
    pub transport: UncheckedAccount<'info>,

    /// CHECK: automation forwarder, stored in config
    pub automation: UncheckedAccount<'info>,

    /// CHECK: lending venue authority, stored in config
    pub lender: UncheckedAccount<'info>,

    pub system_program: Program<'info, System>,
}

pub fn handler(
    ctx: Context<InitializeConfig>,
    local_chain_selector: u64,
    pinned: PinnedLogic,
    retry_policy: RetryPolicy,
) -> Result<()> {
    retry_policy.validate()?;

    let config = &mut ctx.accounts.config;
    config.admin = ctx.accounts.admin.key();
    config.oracle = ctx.accounts.oracle.key();
    config.transport = ctx.accounts.transport.key();
    config.automation = ctx.accounts.automation.key();
    config.lender = ctx.accounts.lender.key();
    config.local_chain_selector = local_chain_selector;
    config.pinned = pinned;
    config.retry_policy = retry_policy;
    config.paused = false;
    config.bump = ctx.bumps.config;

    msg!("Config initialized for chain {}", local_chain_selector);
    Ok(())
}
