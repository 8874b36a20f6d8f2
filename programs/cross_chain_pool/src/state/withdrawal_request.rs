//! Withdrawal request and its transitions.
//!
//! ```text
//! Requested ──> AmountComputed ──> Completed
//!     │               │
//!     │               └──> AwaitingLiquidity ──> Triggered ──> Completed
//!     │                           │                   ^
//!     └──> Failed                 └──> Completed      └─ (re-dispatch after a drop)
//! ```
//!
//! Each transition checks its predecessor status; the status field is the
//! only gate between concurrent callbacks.

use anchor_lang::prelude::*;

use crate::errors::PoolError;
use crate::state::tickets::{AggregationTicket, RebalanceTicket};

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WithdrawalStatus {
    #[default]
    Requested,
    AmountComputed,
    AwaitingLiquidity,
    Triggered,
    Completed,
    Failed,
}

impl WithdrawalStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// PDA Seeds: `[b"withdrawal", pool.key().as_ref(), &nonce.to_le_bytes()]`
#[account]
#[derive(Default, Debug)]
pub struct WithdrawalRequest {
    pub pool: Pubkey,
    pub id: [u8; 32],
    pub nonce: u64,
    pub requester: Pubkey,
    pub share_amount_in: u64,
    /// Fixed when leaving `Requested`; never recomputed.
    pub asset_amount_out: u64,
    pub status: WithdrawalStatus,
    /// Re-issued aggregations and re-dispatched transfers.
    pub retry_count: u16,
    pub created_at: i64,
    pub updated_at: i64,
    pub aggregation: AggregationTicket,
    pub rebalance: RebalanceTicket,
    pub bump: u8,
}

impl WithdrawalRequest {
    pub const LEN: usize = 32
        + 32
        + 8
        + 32
        + 8
        + 8
        + 1
        + 2
        + 8
        + 8
        + AggregationTicket::LEN
        + RebalanceTicket::LEN
        + 1;
    pub const SEED_PREFIX: &'static [u8] = b"withdrawal";

    fn transition(&mut self, from: &[WithdrawalStatus], to: WithdrawalStatus, now: i64) -> Result<()> {
        if !from.contains(&self.status) {
            if self.status == WithdrawalStatus::Completed {
                return err!(PoolError::AlreadyCompleted);
            }
            return err!(PoolError::InvalidRequestStatus);
        }
        self.status = to;
        self.updated_at = now;
        Ok(())
    }

    /// Fixes the payout. The only write to `asset_amount_out`.
    pub(crate) fn commit_amount(&mut self, asset_amount_out: u64, now: i64) -> Result<()> {
        self.transition(
            &[WithdrawalStatus::Requested],
            WithdrawalStatus::AmountComputed,
            now,
        )?;
        self.asset_amount_out = asset_amount_out;
        Ok(())
    }

    pub(crate) fn await_liquidity(&mut self, now: i64) -> Result<()> {
        self.transition(
            &[WithdrawalStatus::AmountComputed],
            WithdrawalStatus::AwaitingLiquidity,
            now,
        )
    }

    /// Records a dispatched transfer. Legal from `AwaitingLiquidity`, or from
    /// `Triggered` once the previous attempt was reported dead.
    pub(crate) fn trigger(&mut self, source_chain_selector: u64, now: i64) -> Result<u32> {
        require!(!self.rebalance.in_motion, PoolError::InvalidRequestStatus);
        self.transition(
            &[
                WithdrawalStatus::AwaitingLiquidity,
                WithdrawalStatus::Triggered,
            ],
            WithdrawalStatus::Triggered,
            now,
        )?;
        self.rebalance.dispatch(source_chain_selector, now)
    }

    pub(crate) fn complete(&mut self, now: i64) -> Result<()> {
        self.transition(
            &[
                WithdrawalStatus::AmountComputed,
                WithdrawalStatus::AwaitingLiquidity,
                WithdrawalStatus::Triggered,
            ],
            WithdrawalStatus::Completed,
            now,
        )?;
        self.rebalance.in_motion = false;
        Ok(())
    }

    /// Cancellation is only defined before any funds moved.
    pub(crate) fn fail(&mut self, now: i64) -> Result<()> {
        self.transition(&[WithdrawalStatus::Requested], WithdrawalStatus::Failed, now)
    }

    pub(crate) fn check_retry_budget(&self, max_retries: u16) -> Result<()> {
        require!(
            self.retry_count < max_retries,
            PoolError::RetryBudgetExhausted
        );
        Ok(())
    }

    pub(crate) fn count_retry(&mut self, max_retries: u16) -> Result<()> {
        self.check_retry_budget(max_retries)?;
        self.retry_count += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_written_once() {
        let mut request = WithdrawalRequest::default();
        request.commit_amount(500, 1).unwrap();
        assert!(request.commit_amount(900, 2).is_err());
        assert_eq!(request.asset_amount_out, 500);
    }

    #[test]
    fn test_failure_only_from_requested() {
        let mut request = WithdrawalRequest::default();
        request.commit_amount(500, 1).unwrap();
        assert_eq!(
            request.fail(2).unwrap_err(),
            error!(PoolError::InvalidRequestStatus)
        );

        let mut fresh = WithdrawalRequest::default();
        fresh.fail(2).unwrap();
        assert_eq!(fresh.status, WithdrawalStatus::Failed);
        assert!(fresh.status.is_terminal());
    }

    #[test]
    fn test_trigger_requires_awaiting_liquidity() {
        let mut request = WithdrawalRequest::default();
        assert!(request.trigger(1, 0).is_err());

        request.commit_amount(500, 1).unwrap();
        request.await_liquidity(2).unwrap();
        assert_eq!(request.trigger(1, 3).unwrap(), 1);
        assert!(request.trigger(1, 4).is_err());
        assert_eq!(request.status, WithdrawalStatus::Triggered);
    }

    #[test]
    fn test_completed_reports_already_completed() {
        let mut request = WithdrawalRequest::default();
        request.commit_amount(500, 1).unwrap();
        request.complete(2).unwrap();
        assert_eq!(
            request.complete(3).unwrap_err(),
            error!(PoolError::AlreadyCompleted)
        );
    }

    #[test]
    fn test_retry_budget() {
        let mut request = WithdrawalRequest::default();
        request.count_retry(2).unwrap();
        request.check_retry_budget(2).unwrap();
        request.count_retry(2).unwrap();
        assert_eq!(
            request.check_retry_budget(2).unwrap_err(),
            error!(PoolError::RetryBudgetExhausted)
        );
        assert_eq!(
            request.count_retry(2).unwrap_err(),
            error!(PoolError::RetryBudgetExhausted)
        );
        assert_eq!(request.retry_count, 2);
    }
}
