//! Creates the primary pool for one asset mint, with its satellite registry.
//!
//! The vault, share mint and share escrow are created by the caller and must
//! already be owned by the pool PDA.

use anchor_lang::prelude::*;
use anchor_lang::solana_program::program_option::COption;
use anchor_spl::token::{Mint, Token, TokenAccount};

use crate::errors::PoolError;
use crate::state::{Config, Ledger, PrimaryPool, Registry};

#[derive(Accounts)]
pub struct InitializePrimaryPool<'info> {
    #[account(
        init,
        payer = admin,
        space = 8 + PrimaryPool::LEN,
        seeds = [PrimaryPool::SEED_PREFIX, asset_mint.key().as_ref()],
        bump
    )]
    pub pool: Account<'info, PrimaryPool>,

    #[account(
        init,
        payer = admin,
        space = 8 + Registry::INIT_SPACE,
        seeds = [Registry::SEED_PREFIX, pool.key().as_ref()],
        bump
    )]
    pub registry: Account<'info, Registry>,

    #[account(
        seeds = [Config::SEED_PREFIX],
        bump = config.bump,
        constraint = config.admin == admin.key() @ PoolError::UnauthorizedAdmin
    )]
    pub config: Account<'info, Config>,

    #[account(mut)]
    pub admin: Signer<'info>,

    pub asset_mint: Account<'info, Mint>,

    #[account(
        constraint = vault.mint == asset_mint.key(),
        constraint = vault.owner == pool.key() @ PoolError::UnauthorizedAdmin
    )]
    pub vault: Account<'info, TokenAccount>,

    #[account(
        constraint = share_mint.key() != asset_mint.key(),
        constraint = share_mint.mint_authority == COption::Some(pool.key()) @ PoolError::UnauthorizedAdmin,
        constraint = share_mint.supply == 0
    )]
    pub share_mint: Account<'info, Mint>,

    #[account(
        constraint = share_escrow.mint == share_mint.key(),
        constraint = share_escrow.owner == pool.key() @ PoolError::UnauthorizedAdmin
    )]
    pub share_escrow: Account<'info, TokenAccount>,

    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
}

pub fn handler(ctx: Context<InitializePrimaryPool>, pool_cap: u64) -> Result<()> {
    require!(pool_cap > 0, PoolError::ZeroAmount);

    let pool_key = ctx.accounts.pool.key();

    let pool = &mut ctx.accounts.pool;
    pool.config = ctx.accounts.config.key();
    pool.asset_mint = ctx.accounts.asset_mint.key();
    pool.share_mint = ctx.accounts.share_mint.key();
    pool.vault = ctx.accounts.vault.key();
    pool.share_escrow = ctx.accounts.share_escrow.key();
    pool.ledger = Ledger::default();
    pool.pool_cap = pool_cap;
    pool.next_request_nonce = 0;
    pool.paused = false;
    pool.bump = ctx.bumps.pool;

    let registry = &mut ctx.accounts.registry;
    registry.pool = pool_key;
    registry.version = 0;
    registry.pending_aggregations = 0;
    registry.satellites = Vec::new();
    registry.bump = ctx.bumps.registry;

    msg!("Primary pool {} initialized, cap {}", pool_key, pool_cap);
    Ok(())
}
