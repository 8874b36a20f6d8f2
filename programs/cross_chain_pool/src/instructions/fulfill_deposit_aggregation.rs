//! Oracle callback carrying the satellite value for a deposit. The deposit is
//! priced here, against the ledger as it stands when the value lands.

use anchor_lang::prelude::*;

use crate::aggregator::{AggregationOutcome, Fulfillment};
use crate::errors::PoolError;
use crate::events::{AggregationFailed, AggregationFulfilled};
use crate::settlement;
use crate::state::{Config, DepositRequest, PrimaryPool, Registry};

#[derive(Accounts)]
#[instruction(request_id: [u8; 32])]
pub struct FulfillDepositAggregation<'info> {
    #[account(
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
            DepositRequest::SEED_PREFIX,
            pool.key().as_ref(),
            &deposit_request.nonce.to_le_bytes(),
        ],
        bump = deposit_request.bump,
        constraint = deposit_request.id == request_id @ PoolError::RequestNotFound
    )]
    pub deposit_request: Account<'info, DepositRequest>,
}

pub fn handler(
    ctx: Context<FulfillDepositAggregation>,
    request_id: [u8; 32],
    fulfillment: Fulfillment,
) -> Result<()> {
    let config = &ctx.accounts.config;
    let ledger = &ctx.accounts.pool.ledger;
    let registry = &mut ctx.accounts.registry;
    let request = &mut ctx.accounts.deposit_request;

    let outcome =
        settlement::fulfill_deposit(ledger, registry, &config.pinned, request, &fulfillment)?;
    match outcome {
        AggregationOutcome::Value(value) => {
            if let Some(quote) = request.quote {
                msg!("Deposit priced at {} shares", quote.shares);
            }
            emit!(AggregationFulfilled {
                request_id,
                attempt: fulfillment.attempt,
                value,
            });
        }
        AggregationOutcome::Failed(error) => {
            msg!(
                "Deposit aggregation attempt {} failed, awaiting retry",
                fulfillment.attempt
            );
            emit!(AggregationFailed {
                request_id,
                attempt: fulfillment.attempt,
                failures: request.aggregation.failures,
                error,
            });
        }
    }
    Ok(())
}
