//! Request lifecycle over the ledger, registry and request accounts.
//!
//! Handlers load accounts, call one function here, then perform the token
//! CPIs and emit events for the returned action. Nothing in this module
//! touches `Clock` or token accounts, so the protocol scenarios run as plain
//! unit tests.

use anchor_lang::prelude::*;

use crate::aggregator::{verify_fulfillment, AggregationOutcome, Fulfillment};
use crate::automation::{aggregation_stalled, deposit_expired, RetryPolicy};
use crate::errors::PoolError;
use crate::state::{
    DepositQuote, DepositRequest, Ledger, PinnedLogic, Registry, SatelliteEntry,
    WithdrawalRequest, WithdrawalStatus,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RebalanceDispatch {
    pub source: SatelliteEntry,
    pub amount: u64,
    pub attempt: u32,
}

/// What the handler must do after a withdrawal moved forward.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettlementAction {
    /// Transfer `amount` from the vault to the requester.
    Payout { amount: u64 },
    /// Queue a `RebalanceToPrimary` message to `source`.
    Rebalance(RebalanceDispatch),
    /// No satellite can cover the amount yet.
    AwaitLiquidity,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RetryOutcome {
    /// A new aggregation attempt was issued.
    Reissued { attempt: u32 },
    Settled(SettlementAction),
    /// The live transfer may still land; nothing was done.
    StillInMotion,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Arrival {
    /// Funds completed the waiting request; pay `payout` to the requester.
    Settled { payout: u64 },
    /// No request waits for these funds; they were added to local balance.
    Unmatched,
}

// --- deposits ---

/// Applies a deposit fulfillment. A value is priced against the ledger right
/// here, so the share amount never depends on when the deposit is completed.
pub fn fulfill_deposit(
    ledger: &Ledger,
    registry: &mut Registry,
    pinned: &PinnedLogic,
    request: &mut DepositRequest,
    fulfillment: &Fulfillment,
) -> Result<AggregationOutcome> {
    request.require_started()?;
    let outcome = verify_fulfillment(&request.aggregation, registry, pinned, fulfillment)?;
    match &outcome {
        AggregationOutcome::Value(satellite_value) => {
            let shares = ledger.quote_deposit(request.asset_amount_in, *satellite_value)?;
            request.record_quote(DepositQuote {
                satellite_value: *satellite_value,
                shares,
            })?;
        }
        AggregationOutcome::Failed(_) => request.aggregation.record_failure(),
    }
    registry.end_aggregation(&mut request.aggregation);
    Ok(outcome)
}

/// Settles a priced deposit. Returns the shares to mint.
pub fn complete_deposit(ledger: &mut Ledger, request: &mut DepositRequest) -> Result<u64> {
    let quote = request.quote()?;
    ledger.settle_deposit(request.asset_amount_in, quote.shares)?;
    request.complete(quote.shares)?;
    Ok(quote.shares)
}

pub fn reissue_deposit_aggregation(
    registry: &mut Registry,
    request: &mut DepositRequest,
    policy: &RetryPolicy,
    now: i64,
) -> Result<u32> {
    request.require_started()?;
    require!(!request.is_priced(), PoolError::InvalidRequestStatus);
    require!(
        aggregation_stalled(&request.aggregation, now, policy),
        PoolError::TimeoutNotElapsed
    );
    registry.begin_aggregation(&mut request.aggregation, now)?;
    Ok(request.aggregation.attempt)
}

/// Refunds an unpriced deposit past its expiry. Returns the refund amount.
pub fn expire_deposit(
    ledger: &mut Ledger,
    registry: &mut Registry,
    request: &mut DepositRequest,
    policy: &RetryPolicy,
    now: i64,
) -> Result<u64> {
    request.require_started()?;
    require!(
        deposit_expired(request, now, policy),
        PoolError::TimeoutNotElapsed
    );
    request.expire()?;
    ledger.refund_deposit(request.asset_amount_in)?;
    registry.end_aggregation(&mut request.aggregation);
    Ok(request.asset_amount_in)
}

// --- withdrawals ---

fn require_requested(request: &WithdrawalRequest) -> Result<()> {
    match request.status {
        WithdrawalStatus::Requested => Ok(()),
        WithdrawalStatus::Completed => err!(PoolError::AlreadyCompleted),
        _ => err!(PoolError::InvalidRequestStatus),
    }
}

/// Applies a withdrawal fulfillment. A value commits the payout and routes
/// it; an error-channel response leaves the request in `Requested`.
pub fn fulfill_withdrawal(
    ledger: &mut Ledger,
    registry: &mut Registry,
    pinned: &PinnedLogic,
    request: &mut WithdrawalRequest,
    fulfillment: &Fulfillment,
    now: i64,
) -> Result<(AggregationOutcome, Option<SettlementAction>)> {
    require_requested(request)?;
    let outcome = verify_fulfillment(&request.aggregation, registry, pinned, fulfillment)?;
    registry.end_aggregation(&mut request.aggregation);
    match &outcome {
        AggregationOutcome::Value(asset_amount_out) => {
            let action = commit_withdrawal(ledger, registry, request, *asset_amount_out, now)?;
            Ok((outcome, Some(action)))
        }
        AggregationOutcome::Failed(_) => {
            request.aggregation.record_failure();
            Ok((outcome, None))
        }
    }
}

/// Fixes `asset_amount_out`, burns the escrowed shares and routes the payout.
pub fn commit_withdrawal(
    ledger: &mut Ledger,
    registry: &mut Registry,
    request: &mut WithdrawalRequest,
    asset_amount_out: u64,
    now: i64,
) -> Result<SettlementAction> {
    request.commit_amount(asset_amount_out, now)?;
    ledger.burn_shares(request.share_amount_in)?;

    if ledger.can_pay_locally(asset_amount_out) {
        ledger.pay_out(asset_amount_out)?;
        request.complete(now)?;
        return Ok(SettlementAction::Payout {
            amount: asset_amount_out,
        });
    }

    ledger.lock_withdrawal(asset_amount_out)?;
    request.await_liquidity(now)?;
    dispatch_rebalance(ledger, registry, request, now)
}

fn pay_locked(
    ledger: &mut Ledger,
    request: &mut WithdrawalRequest,
    now: i64,
) -> Result<SettlementAction> {
    let amount = request.asset_amount_out;
    ledger.pay_locked(amount)?;
    request.complete(now)?;
    Ok(SettlementAction::Payout { amount })
}

fn dispatch_rebalance(
    ledger: &mut Ledger,
    registry: &mut Registry,
    request: &mut WithdrawalRequest,
    now: i64,
) -> Result<SettlementAction> {
    let amount = request.asset_amount_out;
    let Some(source) = registry.select_rebalance_source(amount) else {
        return Ok(SettlementAction::AwaitLiquidity);
    };
    let attempt = request.trigger(source.chain_selector, now)?;
    registry.reserve_liquidity(source.chain_selector, amount)?;
    ledger.rebalance_dispatched(amount)?;
    Ok(SettlementAction::Rebalance(RebalanceDispatch {
        source,
        amount,
        attempt,
    }))
}

/// Id-only retry. Safe to call any number of times: it never creates a
/// second live transfer and never re-prices a committed amount.
pub fn retry_withdrawal(
    ledger: &mut Ledger,
    registry: &mut Registry,
    request: &mut WithdrawalRequest,
    policy: &RetryPolicy,
    now: i64,
) -> Result<RetryOutcome> {
    match request.status {
        WithdrawalStatus::Completed | WithdrawalStatus::Failed => err!(PoolError::NotRetryable),
        WithdrawalStatus::AmountComputed => err!(PoolError::InvalidRequestStatus),
        WithdrawalStatus::Requested => {
            require!(
                aggregation_stalled(&request.aggregation, now, policy),
                PoolError::TimeoutNotElapsed
            );
            request.count_retry(policy.max_retries)?;
            registry.begin_aggregation(&mut request.aggregation, now)?;
            Ok(RetryOutcome::Reissued {
                attempt: request.aggregation.attempt,
            })
        }
        WithdrawalStatus::Triggered if request.rebalance.in_motion => {
            Ok(RetryOutcome::StillInMotion)
        }
        WithdrawalStatus::AwaitingLiquidity | WithdrawalStatus::Triggered => {
            if ledger.can_pay_locally(request.asset_amount_out) {
                return Ok(RetryOutcome::Settled(pay_locked(ledger, request, now)?));
            }
            // Only a dispatch spends the budget; waiting for liquidity is free.
            request.check_retry_budget(policy.max_retries)?;
            let action = dispatch_rebalance(ledger, registry, request, now)?;
            if let SettlementAction::Rebalance(_) = action {
                request.count_retry(policy.max_retries)?;
            }
            Ok(RetryOutcome::Settled(action))
        }
    }
}

/// Handles a `Dropped` report. Returns false when the report names an
/// attempt that is not the live one.
pub fn rebalance_dropped(
    ledger: &mut Ledger,
    registry: &mut Registry,
    request: &mut WithdrawalRequest,
    attempt: u32,
) -> Result<bool> {
    if request.status != WithdrawalStatus::Triggered || !request.rebalance.mark_dropped(attempt) {
        return Ok(false);
    }
    let amount = request.asset_amount_out;
    registry.release_liquidity(request.rebalance.source_chain_selector, amount)?;
    ledger.rebalance_dropped(amount)?;
    Ok(true)
}

/// Funds for `request` landed in the primary vault.
pub fn funds_arrived(
    ledger: &mut Ledger,
    request: &mut WithdrawalRequest,
    amount: u64,
    now: i64,
) -> Result<Arrival> {
    if request.status != WithdrawalStatus::Triggered {
        ledger.credit_unmatched(amount)?;
        return Ok(Arrival::Unmatched);
    }
    require!(
        amount == request.asset_amount_out,
        PoolError::RebalanceAmountMismatch
    );
    ledger.rebalance_arrived(amount, request.rebalance.in_motion)?;
    let SettlementAction::Payout { amount: payout } = pay_locked(ledger, request, now)? else {
        return err!(PoolError::InvalidRequestStatus);
    };
    Ok(Arrival::Settled { payout })
}

/// Admin cancellation of a withdrawal whose aggregation never produced an
/// amount. Returns the shares to hand back.
pub fn cancel_withdrawal(
    registry: &mut Registry,
    request: &mut WithdrawalRequest,
    policy: &RetryPolicy,
    now: i64,
) -> Result<u64> {
    require_requested(request)?;
    require!(
        aggregation_stalled(&request.aggregation, now, policy),
        PoolError::TimeoutNotElapsed
    );
    request.fail(now)?;
    registry.end_aggregation(&mut request.aggregation);
    Ok(request.share_amount_in)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::AggregatorResponse;
    use crate::state::AggregationTicket;

    const LOGIC: [u8; 32] = [0x11; 32];

    fn pinned() -> PinnedLogic {
        PinnedLogic {
            logic_hash: LOGIC,
            library_hash: [0x22; 32],
        }
    }

    fn policy() -> RetryPolicy {
        RetryPolicy {
            aggregation_timeout: 60,
            rebalance_timeout: 600,
            deposit_expiry: 3_600,
            max_retries: 3,
        }
    }

    fn registry() -> Registry {
        Registry {
            pool: Pubkey::new_unique(),
            version: 0,
            pending_aggregations: 0,
            satellites: Vec::new(),
            bump: 255,
        }
    }

    fn ledger(local: u64, supply: u64) -> Ledger {
        Ledger::with_balances(local, supply)
    }

    fn fulfillment(attempt: u32, value: u64) -> Fulfillment {
        Fulfillment {
            attempt,
            logic_hash: LOGIC,
            response: AggregatorResponse::success(value),
        }
    }

    fn requested(registry: &mut Registry, shares: u64) -> WithdrawalRequest {
        let mut request = WithdrawalRequest {
            id: [shares as u8; 32],
            share_amount_in: shares,
            ..WithdrawalRequest::default()
        };
        registry
            .begin_aggregation(&mut request.aggregation, 0)
            .unwrap();
        request
    }

    #[test]
    fn test_error_channel_keeps_request_requested() {
        let mut ledger = ledger(1_000, 1_000);
        let mut registry = registry();
        let mut request = requested(&mut registry, 100);

        let failed = Fulfillment {
            attempt: 1,
            logic_hash: LOGIC,
            response: AggregatorResponse::failure("rpc down"),
        };
        let (outcome, action) =
            fulfill_withdrawal(&mut ledger, &mut registry, &pinned(), &mut request, &failed, 5)
                .unwrap();

        assert!(matches!(outcome, AggregationOutcome::Failed(_)));
        assert_eq!(action, None);
        assert_eq!(request.status, WithdrawalStatus::Requested);
        assert_eq!(request.aggregation.failures, 1);
        assert_eq!(registry.pending_aggregations, 0);
        assert_eq!(ledger.total_share_supply(), 1_000);
    }

    #[test]
    fn test_tampered_logic_leaves_request_pending() {
        let mut ledger = ledger(1_000, 1_000);
        let mut registry = registry();
        let mut request = requested(&mut registry, 100);

        let tampered = Fulfillment {
            logic_hash: [0xEE; 32],
            ..fulfillment(1, 100)
        };
        assert_eq!(
            fulfill_withdrawal(&mut ledger, &mut registry, &pinned(), &mut request, &tampered, 5)
                .unwrap_err(),
            error!(PoolError::LogicHashMismatch)
        );
        assert!(request.aggregation.pending);
        assert_eq!(registry.pending_aggregations, 1);
    }

    #[test]
    fn test_local_liquidity_pays_immediately() {
        let mut ledger = ledger(1_000, 1_000);
        let mut registry = registry();
        let mut request = requested(&mut registry, 100);

        let (_, action) = fulfill_withdrawal(
            &mut ledger,
            &mut registry,
            &pinned(),
            &mut request,
            &fulfillment(1, 100),
            5,
        )
        .unwrap();

        assert_eq!(action, Some(SettlementAction::Payout { amount: 100 }));
        assert_eq!(request.status, WithdrawalStatus::Completed);
        assert_eq!(ledger.total_local_balance(), 900);
        assert_eq!(ledger.total_share_supply(), 900);
    }

    #[test]
    fn test_no_source_waits_then_retry_dispatches() {
        let mut ledger = ledger(100, 1_000);
        let mut registry = registry();
        registry.add_satellite(7, [7u8; 32], true).unwrap();
        let mut request = requested(&mut registry, 500);

        let (_, action) = fulfill_withdrawal(
            &mut ledger,
            &mut registry,
            &pinned(),
            &mut request,
            &fulfillment(1, 500),
            5,
        )
        .unwrap();
        assert_eq!(action, Some(SettlementAction::AwaitLiquidity));
        assert_eq!(request.status, WithdrawalStatus::AwaitingLiquidity);
        assert_eq!(ledger.withdrawal_amount_locked(), 500);

        // Waiting again does not spend the retry budget.
        for now in [600, 650] {
            assert_eq!(
                retry_withdrawal(&mut ledger, &mut registry, &mut request, &policy(), now)
                    .unwrap(),
                RetryOutcome::Settled(SettlementAction::AwaitLiquidity)
            );
        }
        assert_eq!(request.retry_count, 0);

        registry.report_liquidity(7, 800, 10).unwrap();
        let outcome =
            retry_withdrawal(&mut ledger, &mut registry, &mut request, &policy(), 700).unwrap();
        let RetryOutcome::Settled(SettlementAction::Rebalance(dispatch)) = outcome else {
            panic!("expected a dispatch, got {outcome:?}");
        };
        assert_eq!(dispatch.source.chain_selector, 7);
        assert_eq!(dispatch.attempt, 1);
        assert_eq!(registry.entry(7).unwrap().last_known_liquidity, 300);
        assert_eq!(ledger.withdrawals_in_flight(), 500);
        assert_eq!(request.retry_count, 1);
    }

    #[test]
    fn test_exhausted_budget_blocks_dispatch_without_side_effects() {
        let mut ledger = ledger(0, 1_000);
        let mut registry = registry();
        registry.add_satellite(7, [7u8; 32], true).unwrap();
        let mut request = requested(&mut registry, 500);
        commit_withdrawal(&mut ledger, &mut registry, &mut request, 500, 1).unwrap();
        request.retry_count = policy().max_retries;

        registry.report_liquidity(7, 800, 10).unwrap();
        assert_eq!(
            retry_withdrawal(&mut ledger, &mut registry, &mut request, &policy(), 700).unwrap_err(),
            error!(PoolError::RetryBudgetExhausted)
        );
        assert_eq!(request.status, WithdrawalStatus::AwaitingLiquidity);
        assert_eq!(registry.entry(7).unwrap().last_known_liquidity, 800);
        assert_eq!(ledger.withdrawals_in_flight(), 0);
    }

    #[test]
    fn test_retry_while_in_motion_is_noop() {
        let mut ledger = ledger(0, 1_000);
        let mut registry = registry();
        registry.add_satellite(7, [7u8; 32], true).unwrap();
        registry.report_liquidity(7, 1_000, 0).unwrap();
        let mut request = requested(&mut registry, 500);
        commit_withdrawal(&mut ledger, &mut registry, &mut request, 500, 1).unwrap();
        assert_eq!(request.status, WithdrawalStatus::Triggered);

        for now in [2, 700, 5_000] {
            assert_eq!(
                retry_withdrawal(&mut ledger, &mut registry, &mut request, &policy(), now).unwrap(),
                RetryOutcome::StillInMotion
            );
        }
        assert_eq!(request.rebalance.attempt, 1);
        assert_eq!(request.retry_count, 0);
        assert_eq!(ledger.withdrawals_in_flight(), 500);
    }

    #[test]
    fn test_drop_then_redispatch_uses_new_attempt() {
        let mut ledger = ledger(0, 1_000);
        let mut registry = registry();
        registry.add_satellite(7, [7u8; 32], true).unwrap();
        registry.report_liquidity(7, 1_000, 0).unwrap();
        let mut request = requested(&mut registry, 500);
        commit_withdrawal(&mut ledger, &mut registry, &mut request, 500, 1).unwrap();

        assert!(!rebalance_dropped(&mut ledger, &mut registry, &mut request, 9).unwrap());
        assert!(rebalance_dropped(&mut ledger, &mut registry, &mut request, 1).unwrap());
        assert!(!rebalance_dropped(&mut ledger, &mut registry, &mut request, 1).unwrap());
        assert_eq!(ledger.withdrawals_in_flight(), 0);
        assert_eq!(registry.entry(7).unwrap().last_known_liquidity, 1_000);

        let outcome =
            retry_withdrawal(&mut ledger, &mut registry, &mut request, &policy(), 2).unwrap();
        assert!(matches!(
            outcome,
            RetryOutcome::Settled(SettlementAction::Rebalance(RebalanceDispatch { attempt: 2, .. }))
        ));
        assert_eq!(request.retry_count, 1);
    }

    #[test]
    fn test_late_arrival_is_credited_once() {
        let mut ledger = ledger(0, 1_000);
        let mut registry = registry();
        registry.add_satellite(7, [7u8; 32], true).unwrap();
        registry.report_liquidity(7, 1_000, 0).unwrap();
        let mut request = requested(&mut registry, 500);
        commit_withdrawal(&mut ledger, &mut registry, &mut request, 500, 1).unwrap();

        assert_eq!(
            funds_arrived(&mut ledger, &mut request, 500, 2).unwrap(),
            Arrival::Settled { payout: 500 }
        );
        assert_eq!(ledger.total_local_balance(), 0);
        assert_eq!(ledger.withdrawal_amount_locked(), 0);
        assert_eq!(ledger.withdrawals_in_flight(), 0);

        assert_eq!(
            funds_arrived(&mut ledger, &mut request, 500, 3).unwrap(),
            Arrival::Unmatched
        );
        assert_eq!(ledger.total_local_balance(), 500);
    }

    #[test]
    fn test_arrival_amount_must_match_commitment() {
        let mut ledger = ledger(0, 1_000);
        let mut registry = registry();
        registry.add_satellite(7, [7u8; 32], true).unwrap();
        registry.report_liquidity(7, 1_000, 0).unwrap();
        let mut request = requested(&mut registry, 500);
        commit_withdrawal(&mut ledger, &mut registry, &mut request, 500, 1).unwrap();

        assert_eq!(
            funds_arrived(&mut ledger, &mut request, 499, 2).unwrap_err(),
            error!(PoolError::RebalanceAmountMismatch)
        );
    }

    #[test]
    fn test_retry_budget_applies_to_reissues() {
        let mut ledger = ledger(1_000, 1_000);
        let mut registry = registry();
        let mut request = requested(&mut registry, 100);

        assert_eq!(
            retry_withdrawal(&mut ledger, &mut registry, &mut request, &policy(), 10).unwrap_err(),
            error!(PoolError::TimeoutNotElapsed)
        );
        for (i, now) in [60, 120, 180].into_iter().enumerate() {
            assert_eq!(
                retry_withdrawal(&mut ledger, &mut registry, &mut request, &policy(), now).unwrap(),
                RetryOutcome::Reissued {
                    attempt: i as u32 + 2
                }
            );
        }
        assert_eq!(
            retry_withdrawal(&mut ledger, &mut registry, &mut request, &policy(), 240).unwrap_err(),
            error!(PoolError::RetryBudgetExhausted)
        );
        assert_eq!(registry.pending_aggregations, 1);
    }

    #[test]
    fn test_cancel_only_before_amount_is_known() {
        let mut ledger = ledger(1_000, 1_000);
        let mut registry = registry();
        let mut request = requested(&mut registry, 100);

        assert!(cancel_withdrawal(&mut registry, &mut request, &policy(), 30).is_err());
        assert_eq!(
            cancel_withdrawal(&mut registry, &mut request, &policy(), 60).unwrap(),
            100
        );
        assert_eq!(request.status, WithdrawalStatus::Failed);
        assert_eq!(registry.pending_aggregations, 0);
        assert_eq!(
            retry_withdrawal(&mut ledger, &mut registry, &mut request, &policy(), 100).unwrap_err(),
            error!(PoolError::NotRetryable)
        );

        let mut priced = requested(&mut registry, 50);
        commit_withdrawal(&mut ledger, &mut registry, &mut priced, 50, 1).unwrap();
        assert!(cancel_withdrawal(&mut registry, &mut priced, &policy(), 1_000).is_err());
    }

    #[test]
    fn test_deposit_priced_when_result_lands() {
        let mut ledger = ledger(1_000, 1_000);
        let mut registry = registry();
        ledger.escrow_deposit(300, u64::MAX).unwrap();
        let mut deposit = DepositRequest {
            asset_amount_in: 300,
            ..DepositRequest::default()
        };
        registry
            .begin_aggregation(&mut deposit.aggregation, 0)
            .unwrap();

        fulfill_deposit(&ledger, &mut registry, &pinned(), &mut deposit, &fulfillment(1, 2_000))
            .unwrap();
        assert_eq!(
            deposit.quote,
            Some(DepositQuote {
                satellite_value: 2_000,
                shares: 100,
            })
        );
        assert_eq!(registry.pending_aggregations, 0);

        // A payout before completion does not change the quoted shares.
        ledger.pay_out(600).unwrap();
        assert_eq!(complete_deposit(&mut ledger, &mut deposit).unwrap(), 100);
        assert_eq!(ledger.total_share_supply(), 1_100);
        assert_eq!(ledger.total_local_balance(), 700);
    }

    #[test]
    fn test_unpriceable_result_leaves_request_pending() {
        let mut ledger = ledger(0, 1_000);
        let mut registry = registry();
        ledger.escrow_deposit(10, u64::MAX).unwrap();
        let mut deposit = DepositRequest {
            asset_amount_in: 10,
            ..DepositRequest::default()
        };
        registry
            .begin_aggregation(&mut deposit.aggregation, 0)
            .unwrap();

        assert_eq!(
            fulfill_deposit(&ledger, &mut registry, &pinned(), &mut deposit, &fulfillment(1, 0))
                .unwrap_err(),
            error!(PoolError::PoolValueDepleted)
        );
        assert!(deposit.aggregation.pending);
        assert_eq!(registry.pending_aggregations, 1);
        assert!(!deposit.is_priced());
    }

    #[test]
    fn test_deposit_expiry_refunds_escrow() {
        let mut ledger = Ledger::default();
        let mut registry = registry();
        ledger.escrow_deposit(400, u64::MAX).unwrap();
        let mut deposit = DepositRequest {
            asset_amount_in: 400,
            aggregation: AggregationTicket::default(),
            ..DepositRequest::default()
        };
        registry
            .begin_aggregation(&mut deposit.aggregation, 0)
            .unwrap();

        assert_eq!(
            expire_deposit(&mut ledger, &mut registry, &mut deposit, &policy(), 100).unwrap_err(),
            error!(PoolError::TimeoutNotElapsed)
        );
        assert_eq!(
            reissue_deposit_aggregation(&mut registry, &mut deposit, &policy(), 100).unwrap(),
            2
        );
        assert_eq!(
            expire_deposit(&mut ledger, &mut registry, &mut deposit, &policy(), 3_600).unwrap(),
            400
        );
        assert_eq!(ledger.deposits_in_flight(), 0);
        assert_eq!(registry.pending_aggregations, 0);
        assert!(complete_deposit(&mut ledger, &mut deposit).is_err());
    }
}
