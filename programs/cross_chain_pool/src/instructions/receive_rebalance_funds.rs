//! Transport delivery of rebalance funds to the primary pool.
//!
//! Deliveries are at least once; the `ProcessedMessage` record turns a
//! redelivery into a logged no-op. Funds for a request that no longer waits
//! are credited to local balance.

use anchor_lang::prelude::*;
use anchor_spl::token::{Token, TokenAccount};

use crate::errors::PoolError;
use crate::events::{TransportMessageProcessed, UnmatchedFundsCredited};
use crate::instructions::common::{execute_settlement, transfer_by_owner, PayoutAccounts};
use crate::settlement::{self, Arrival, SettlementAction};
use crate::state::{Config, PrimaryPool, ProcessedMessage, Registry, WithdrawalRequest};
use crate::transport::{InstructionKind, TransportPayload};

#[derive(Accounts)]
#[instruction(message_id: [u8; 32])]
pub struct ReceiveRebalanceFunds<'info> {
    #[account(
        mut,
        seeds = [PrimaryPool::SEED_PREFIX, pool.asset_mint.as_ref()],
        bump = pool.bump,
        constraint = pool.config == config.key()
    )]
    pub pool: Account<'info, PrimaryPool>,

    #[account(
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

    #[account(mut)]
    pub transport: Signer<'info>,

    #[account(
        init_if_needed,
        payer = transport,
        space = 8 + ProcessedMessage::LEN,
        seeds = [ProcessedMessage::SEED_PREFIX, message_id.as_ref()],
        bump
    )]
    pub processed_message: Account<'info, ProcessedMessage>,

    #[account(
        mut,
        seeds = [
            WithdrawalRequest::SEED_PREFIX,
            pool.key().as_ref(),
            &withdrawal_request.nonce.to_le_bytes(),
        ],
        bump = withdrawal_request.bump
    )]
    pub withdrawal_request: Account<'info, WithdrawalRequest>,

    /// Transport custody holding the delivered funds.
    #[account(
        mut,
        constraint = transport_custody.mint == pool.asset_mint,
        constraint = transport_custody.owner == transport.key() @ PoolError::UnauthorizedTransport
    )]
    pub transport_custody: Account<'info, TokenAccount>,

    #[account(mut, constraint = vault.key() == pool.vault)]
    pub vault: Account<'info, TokenAccount>,

    #[account(
        mut,
        constraint = requester_asset_account.mint == pool.asset_mint,
        constraint = requester_asset_account.owner == withdrawal_request.requester
    )]
    pub requester_asset_account: Account<'info, TokenAccount>,

    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
}

pub fn handler(
    ctx: Context<ReceiveRebalanceFunds>,
    message_id: [u8; 32],
    source_chain_selector: u64,
    sender: [u8; 32],
    payload: Vec<u8>,
) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;

    let bump = ctx.bumps.processed_message;
    if !ctx
        .accounts
        .processed_message
        .first_delivery(message_id, source_chain_selector, now, bump)
    {
        msg!("Message already processed, ignoring redelivery");
        return Ok(());
    }

    let payload = TransportPayload::decode(&payload)?;
    require!(
        payload.kind == InstructionKind::RebalanceFunds,
        PoolError::UnexpectedInstructionKind
    );
    let registered = ctx
        .accounts
        .registry
        .entry(source_chain_selector)
        .map(|entry| entry.pool_address == sender)
        .unwrap_or(false);
    require!(registered, PoolError::UnauthorizedSender);
    require!(
        payload.correlation_id == ctx.accounts.withdrawal_request.id,
        PoolError::RequestNotFound
    );

    transfer_by_owner(
        ctx.accounts.token_program.to_account_info(),
        ctx.accounts.transport_custody.to_account_info(),
        ctx.accounts.vault.to_account_info(),
        ctx.accounts.transport.to_account_info(),
        payload.amount,
    )?;

    let payout_accounts = PayoutAccounts {
        token_program: ctx.accounts.token_program.to_account_info(),
        vault: ctx.accounts.vault.to_account_info(),
        recipient: ctx.accounts.requester_asset_account.to_account_info(),
        pool: ctx.accounts.pool.to_account_info(),
    };
    let local_chain_selector = ctx.accounts.config.local_chain_selector;
    let pool = &mut ctx.accounts.pool;
    let request = &mut ctx.accounts.withdrawal_request;

    let arrival = settlement::funds_arrived(&mut pool.ledger, request, payload.amount, now)?;

    emit!(TransportMessageProcessed {
        message_id,
        source_chain_selector,
        correlation_id: payload.correlation_id,
        amount: payload.amount,
    });

    match arrival {
        Arrival::Settled { payout } => {
            let asset_mint = pool.asset_mint;
            let bump = [pool.bump];
            let seeds: &[&[u8]] = &[PrimaryPool::SEED_PREFIX, asset_mint.as_ref(), &bump];
            execute_settlement(
                SettlementAction::Payout { amount: payout },
                payout_accounts,
                &[seeds],
                request,
                local_chain_selector,
                pool.ledger.total_local_balance(),
                now,
            )
        }
        Arrival::Unmatched => {
            msg!("No request waits for these funds, credited to local balance");
            emit!(UnmatchedFundsCredited {
                correlation_id: payload.correlation_id,
                amount: payload.amount,
            });
            Ok(())
        }
    }
}
