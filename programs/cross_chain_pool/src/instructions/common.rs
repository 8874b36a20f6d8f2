//! Helpers shared by the instruction handlers: token movements and event
//! emission for the outbound work orders.

use anchor_lang::prelude::*;
use anchor_spl::token::{self, Burn, MintTo, Transfer};

use crate::aggregator::{encode_request, AggregationRequest, RequestKind};
use crate::events::{
    AggregationRequested, RebalanceTriggered, TransportMessageQueued, WithdrawalAwaitingLiquidity,
    WithdrawalCompleted,
};
use crate::settlement::SettlementAction;
use crate::state::{AggregationTicket, PinnedLogic, Registry, WithdrawalRequest};
use crate::transport::TransportPayload;

/// Transfer signed by the owner of `from` (user or transport authority).
pub fn transfer_by_owner<'info>(
    token_program: AccountInfo<'info>,
    from: AccountInfo<'info>,
    to: AccountInfo<'info>,
    authority: AccountInfo<'info>,
    amount: u64,
) -> Result<()> {
    if amount == 0 {
        return Ok(());
    }
    let cpi_accounts = Transfer {
        from,
        to,
        authority,
    };
    token::transfer(CpiContext::new(token_program, cpi_accounts), amount)
}

/// Transfer out of an account owned by a program PDA.
pub fn transfer_signed<'info>(
    token_program: AccountInfo<'info>,
    from: AccountInfo<'info>,
    to: AccountInfo<'info>,
    authority: AccountInfo<'info>,
    signer_seeds: &[&[&[u8]]],
    amount: u64,
) -> Result<()> {
    if amount == 0 {
        return Ok(());
    }
    let cpi_accounts = Transfer {
        from,
        to,
        authority,
    };
    token::transfer(
        CpiContext::new_with_signer(token_program, cpi_accounts, signer_seeds),
        amount,
    )
}

pub fn mint_shares<'info>(
    token_program: AccountInfo<'info>,
    mint: AccountInfo<'info>,
    to: AccountInfo<'info>,
    pool: AccountInfo<'info>,
    signer_seeds: &[&[&[u8]]],
    amount: u64,
) -> Result<()> {
    let cpi_accounts = MintTo {
        mint,
        to,
        authority: pool,
    };
    token::mint_to(
        CpiContext::new_with_signer(token_program, cpi_accounts, signer_seeds),
        amount,
    )
}

/// Burns shares held in the pool's escrow account.
pub fn burn_escrowed_shares<'info>(
    token_program: AccountInfo<'info>,
    mint: AccountInfo<'info>,
    escrow: AccountInfo<'info>,
    pool: AccountInfo<'info>,
    signer_seeds: &[&[&[u8]]],
    amount: u64,
) -> Result<()> {
    if amount == 0 {
        return Ok(());
    }
    let cpi_accounts = Burn {
        mint,
        from: escrow,
        authority: pool,
    };
    token::burn(
        CpiContext::new_with_signer(token_program, cpi_accounts, signer_seeds),
        amount,
    )
}

/// Emits the work order for the aggregator executors.
pub fn request_aggregation(
    pool: Pubkey,
    request_id: [u8; 32],
    ticket: &AggregationTicket,
    kind: RequestKind,
    pinned: &PinnedLogic,
    registry: &Registry,
    now: i64,
) {
    let request = AggregationRequest::for_ticket(request_id, ticket, kind);
    let args = encode_request(&request, pinned, registry.valuation_set());
    emit!(AggregationRequested {
        pool,
        request_id,
        attempt: ticket.attempt,
        args,
        timestamp: now,
    });
}

/// Hands a payload to the transport relayer. The message is routed to
/// `receiver` on `destination_chain_selector`, which for outbound liquidity
/// instructions differs from where the payload sends the funds.
pub fn queue_transport_message(
    source_chain_selector: u64,
    destination_chain_selector: u64,
    receiver: [u8; 32],
    payload: &TransportPayload,
    now: i64,
) {
    emit!(TransportMessageQueued {
        source_chain_selector,
        destination_chain_selector,
        receiver,
        correlation_id: payload.correlation_id,
        payload: payload.encode(),
        timestamp: now,
    });
}

/// Accounts needed to pay a withdrawal out of the primary vault.
pub struct PayoutAccounts<'info> {
    pub token_program: AccountInfo<'info>,
    pub vault: AccountInfo<'info>,
    pub recipient: AccountInfo<'info>,
    pub pool: AccountInfo<'info>,
}

/// Carries out a settlement decision: pays the requester, queues the
/// rebalance message, or records that the request waits for liquidity.
pub fn execute_settlement<'info>(
    action: SettlementAction,
    accounts: PayoutAccounts<'info>,
    signer_seeds: &[&[&[u8]]],
    request: &WithdrawalRequest,
    local_chain_selector: u64,
    local_balance: u64,
    now: i64,
) -> Result<()> {
    match action {
        SettlementAction::Payout { amount } => {
            transfer_signed(
                accounts.token_program,
                accounts.vault,
                accounts.recipient,
                accounts.pool,
                signer_seeds,
                amount,
            )?;
            emit!(WithdrawalCompleted {
                pool: request.pool,
                request_id: request.id,
                requester: request.requester,
                asset_amount_out: amount,
                timestamp: now,
            });
        }
        SettlementAction::Rebalance(dispatch) => {
            let payload = TransportPayload::rebalance_to_primary(
                dispatch.amount,
                request.id,
                local_chain_selector,
                request.pool.to_bytes(),
            );
            queue_transport_message(
                local_chain_selector,
                dispatch.source.chain_selector,
                dispatch.source.pool_address,
                &payload,
                now,
            );
            emit!(RebalanceTriggered {
                request_id: request.id,
                source_chain_selector: dispatch.source.chain_selector,
                amount: dispatch.amount,
                attempt: dispatch.attempt,
            });
        }
        SettlementAction::AwaitLiquidity => {
            msg!("No satellite covers {}, waiting", request.asset_amount_out);
            emit!(WithdrawalAwaitingLiquidity {
                request_id: request.id,
                asset_amount_out: request.asset_amount_out,
                local_balance,
            });
        }
    }
    Ok(())
}
