//! Satellite side of the transport.
//!
//! Outbound kinds (`RebalanceToPrimary`, `MigrateLiquidity`) are only
//! accepted from the allow-listed primary pool; they move funds from the
//! vault into transport custody and queue the follow-up message.
//! `CreditLiquidity` takes delivered funds into the vault.

use anchor_lang::prelude::*;
use anchor_spl::token::{Token, TokenAccount};

use crate::errors::PoolError;
use crate::events::TransportMessageProcessed;
use crate::instructions::common::{queue_transport_message, transfer_by_owner, transfer_signed};
use crate::state::{Config, ProcessedMessage, SatellitePool};
use crate::transport::TransportPayload;

#[derive(Accounts)]
#[instruction(message_id: [u8; 32])]
pub struct ReceiveTransportMessage<'info> {
    #[account(
        mut,
        seeds = [SatellitePool::SEED_PREFIX, satellite.asset_mint.as_ref()],
        bump = satellite.bump,
        constraint = satellite.config == config.key()
    )]
    pub satellite: Account<'info, SatellitePool>,

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

    #[account(mut, constraint = vault.key() == satellite.vault)]
    pub vault: Account<'info, TokenAccount>,

    #[account(
        mut,
        constraint = transport_custody.mint == satellite.asset_mint,
        constraint = transport_custody.owner == transport.key() @ PoolError::UnauthorizedTransport
    )]
    pub transport_custody: Account<'info, TokenAccount>,

    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
}

pub fn handler(
    ctx: Context<ReceiveTransportMessage>,
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
    let local_chain_selector = ctx.accounts.config.local_chain_selector;
    let satellite_info = ctx.accounts.satellite.to_account_info();
    let token_program = ctx.accounts.token_program.to_account_info();
    let vault = ctx.accounts.vault.to_account_info();
    let custody = ctx.accounts.transport_custody.to_account_info();
    let transport = ctx.accounts.transport.to_account_info();

    let satellite = &mut ctx.accounts.satellite;
    let follow_up = satellite.apply_instruction(&payload, source_chain_selector, &sender)?;

    match follow_up {
        Some(follow_up) => {
            let asset_mint = satellite.asset_mint;
            let bump = [satellite.bump];
            let seeds: &[&[u8]] = &[SatellitePool::SEED_PREFIX, asset_mint.as_ref(), &bump];
            transfer_signed(
                token_program,
                vault,
                custody,
                satellite_info,
                &[seeds],
                payload.amount,
            )?;
            queue_transport_message(
                local_chain_selector,
                follow_up.destination_chain_selector,
                follow_up.destination_address,
                &follow_up,
                now,
            );
        }
        None => transfer_by_owner(token_program, custody, vault, transport, payload.amount)?,
    }

    emit!(TransportMessageProcessed {
        message_id,
        source_chain_selector,
        correlation_id: payload.correlation_id,
        amount: payload.amount,
    });
    Ok(())
}
