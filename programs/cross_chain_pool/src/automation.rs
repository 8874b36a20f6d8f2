//! Retry decisions for the automation service.
//!
//! Everything here is pure: the off-chain forwarder evaluates `should_retry`
//! over indexed requests and calls `retry_withdrawal(id)` for each candidate;
//! the program re-checks the same predicates before acting.

use anchor_lang::prelude::*;

use crate::errors::PoolError;
use crate::state::{
    AggregationTicket, DepositRequest, DepositStatus, WithdrawalRequest, WithdrawalStatus,
};

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Seconds an aggregation may stay unanswered before it is re-issued.
    pub aggregation_timeout: i64,
    /// Seconds a withdrawal may wait for liquidity or a dispatched transfer.
    pub rebalance_timeout: i64,
    /// Seconds after which an unpriced deposit may be refunded.
    pub deposit_expiry: i64,
    /// Re-issues plus re-dispatches allowed per request.
    pub max_retries: u16,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            aggregation_timeout: 5 * 60,
            rebalance_timeout: 60 * 60,
            deposit_expiry: 24 * 60 * 60,
            max_retries: 5,
        }
    }
}

impl RetryPolicy {
    pub const LEN: usize = 8 + 8 + 8 + 2;

    pub fn validate(&self) -> Result<()> {
        require!(
            self.aggregation_timeout > 0
                && self.rebalance_timeout > 0
                && self.deposit_expiry > self.aggregation_timeout
                && self.max_retries > 0,
            PoolError::InvalidRetryPolicy
        );
        Ok(())
    }
}

fn elapsed(since: i64, now: i64, timeout: i64) -> bool {
    now.saturating_sub(since) >= timeout
}

/// The last attempt came back through the error channel, or never came back.
pub fn aggregation_stalled(ticket: &AggregationTicket, now: i64, policy: &RetryPolicy) -> bool {
    !ticket.pending || elapsed(ticket.issued_at, now, policy.aggregation_timeout)
}

pub fn should_retry(request: &WithdrawalRequest, now: i64, policy: &RetryPolicy) -> bool {
    if request.retry_count >= policy.max_retries {
        return false;
    }
    match request.status {
        WithdrawalStatus::Requested => aggregation_stalled(&request.aggregation, now, policy),
        WithdrawalStatus::AwaitingLiquidity => {
            elapsed(request.updated_at, now, policy.rebalance_timeout)
        }
        WithdrawalStatus::Triggered => {
            !request.rebalance.in_motion
                || elapsed(request.rebalance.dispatched_at, now, policy.rebalance_timeout)
        }
        WithdrawalStatus::AmountComputed
        | WithdrawalStatus::Completed
        | WithdrawalStatus::Failed => false,
    }
}

/// Ids of the requests the forwarder should hand to `retry_withdrawal`.
pub fn retry_candidates<'a>(
    requests: impl IntoIterator<Item = &'a WithdrawalRequest>,
    now: i64,
    policy: &RetryPolicy,
) -> Vec<[u8; 32]> {
    requests
        .into_iter()
        .filter(|request| should_retry(request, now, policy))
        .map(|request| request.id)
        .collect()
}

pub fn deposit_expired(request: &DepositRequest, now: i64, policy: &RetryPolicy) -> bool {
    request.status == DepositStatus::Started
        && !request.is_priced()
        && elapsed(request.created_at, now, policy.deposit_expiry)
}

pub fn deposit_needs_reissue(request: &DepositRequest, now: i64, policy: &RetryPolicy) -> bool {
    request.status == DepositStatus::Started
        && !request.is_priced()
        && !deposit_expired(request, now, policy)
        && aggregation_stalled(&request.aggregation, now, policy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::DepositQuote;

    fn policy() -> RetryPolicy {
        RetryPolicy {
            aggregation_timeout: 60,
            rebalance_timeout: 600,
            deposit_expiry: 3_600,
            max_retries: 2,
        }
    }

    fn requested_at(issued_at: i64) -> WithdrawalRequest {
        let mut request = WithdrawalRequest {
            id: [issued_at as u8; 32],
            ..WithdrawalRequest::default()
        };
        request.aggregation.issue(0, issued_at).unwrap();
        request
    }

    #[test]
    fn test_default_policy_is_valid() {
        RetryPolicy::default().validate().unwrap();
        let zero = RetryPolicy {
            max_retries: 0,
            ..RetryPolicy::default()
        };
        assert_eq!(zero.validate().unwrap_err(), error!(PoolError::InvalidRetryPolicy));
    }

    #[test]
    fn test_pending_aggregation_waits_for_timeout() {
        let request = requested_at(100);
        assert!(!should_retry(&request, 159, &policy()));
        assert!(should_retry(&request, 160, &policy()));
    }

    #[test]
    fn test_failed_aggregation_is_retried_immediately() {
        let mut request = requested_at(100);
        request.aggregation.resolve();
        request.aggregation.record_failure();
        assert!(should_retry(&request, 101, &policy()));
    }

    #[test]
    fn test_in_motion_transfer_waits_for_timeout() {
        let mut request = WithdrawalRequest::default();
        request.commit_amount(500, 0).unwrap();
        request.await_liquidity(0).unwrap();
        request.trigger(7, 1_000).unwrap();

        assert!(!should_retry(&request, 1_200, &policy()));
        assert!(should_retry(&request, 1_600, &policy()));

        request.rebalance.mark_dropped(1);
        assert!(should_retry(&request, 1_001, &policy()));
    }

    #[test]
    fn test_terminal_and_exhausted_requests_are_skipped() {
        let mut done = WithdrawalRequest::default();
        done.commit_amount(1, 0).unwrap();
        done.complete(0).unwrap();
        assert!(!should_retry(&done, i64::MAX, &policy()));

        let mut exhausted = requested_at(0);
        exhausted.retry_count = 2;
        assert!(!should_retry(&exhausted, 10_000, &policy()));
    }

    #[test]
    fn test_candidates_keep_only_due_requests() {
        let due = requested_at(0);
        let fresh = requested_at(90);
        let candidates = retry_candidates([&due, &fresh], 100, &policy());
        assert_eq!(candidates, vec![due.id]);
    }

    #[test]
    fn test_deposit_reissue_then_expiry() {
        let mut deposit = DepositRequest {
            created_at: 0,
            ..DepositRequest::default()
        };
        deposit.aggregation.issue(0, 0).unwrap();

        assert!(!deposit_needs_reissue(&deposit, 30, &policy()));
        assert!(deposit_needs_reissue(&deposit, 60, &policy()));
        assert!(!deposit_expired(&deposit, 60, &policy()));

        assert!(deposit_expired(&deposit, 3_600, &policy()));
        assert!(!deposit_needs_reissue(&deposit, 3_600, &policy()));

        deposit.quote = Some(DepositQuote {
            satellite_value: 10,
            shares: 1,
        });
        assert!(!deposit_expired(&deposit, 10_000, &policy()));
    }
}
