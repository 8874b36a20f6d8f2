//! Deposit request: escrowed funds waiting for an aggregated pool value.

use anchor_lang::prelude::*;

use crate::errors::PoolError;
use crate::state::tickets::AggregationTicket;

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DepositStatus {
    #[default]
    Started,
    Completed,
    Expired,
}

/// Price fixed in the same instruction that accepted the aggregator result.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct DepositQuote {
    pub satellite_value: u64,
    pub shares: u64,
}

/// PDA Seeds: `[b"deposit", pool.key().as_ref(), &nonce.to_le_bytes()]`
#[account]
#[derive(Default, Debug)]
pub struct DepositRequest {
    pub pool: Pubkey,
    pub id: [u8; 32],
    pub nonce: u64,
    pub depositor: Pubkey,
    pub asset_amount_in: u64,
    pub shares_minted: u64,
    pub created_at: i64,
    pub status: DepositStatus,
    pub aggregation: AggregationTicket,
    /// Written once, when the aggregator answers.
    pub quote: Option<DepositQuote>,
    pub bump: u8,
}

impl DepositRequest {
    pub const LEN: usize =
        32 + 32 + 8 + 32 + 8 + 8 + 8 + 1 + AggregationTicket::LEN + (1 + 8 + 8) + 1;
    pub const SEED_PREFIX: &'static [u8] = b"deposit";

    pub fn require_started(&self) -> Result<()> {
        match self.status {
            DepositStatus::Started => Ok(()),
            DepositStatus::Completed => err!(PoolError::AlreadyCompleted),
            DepositStatus::Expired => err!(PoolError::InvalidRequestStatus),
        }
    }

    pub fn is_priced(&self) -> bool {
        self.quote.is_some()
    }

    pub(crate) fn record_quote(&mut self, quote: DepositQuote) -> Result<()> {
        self.require_started()?;
        require!(!self.is_priced(), PoolError::InvalidRequestStatus);
        self.quote = Some(quote);
        Ok(())
    }

    /// Quote to settle against. Fails if the aggregator has not answered.
    pub fn quote(&self) -> Result<DepositQuote> {
        self.require_started()?;
        self.quote.ok_or(error!(PoolError::AggregatorResultMissing))
    }

    pub(crate) fn complete(&mut self, shares_minted: u64) -> Result<()> {
        self.require_started()?;
        self.shares_minted = shares_minted;
        self.status = DepositStatus::Completed;
        Ok(())
    }

    pub(crate) fn expire(&mut self) -> Result<()> {
        self.require_started()?;
        require!(!self.is_priced(), PoolError::InvalidRequestStatus);
        self.status = DepositStatus::Expired;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote(shares: u64) -> DepositQuote {
        DepositQuote {
            satellite_value: 800,
            shares,
        }
    }

    #[test]
    fn test_quote_recorded_once() {
        let mut request = DepositRequest::default();
        assert_eq!(
            request.quote().unwrap_err(),
            error!(PoolError::AggregatorResultMissing)
        );

        request.record_quote(quote(40)).unwrap();
        assert!(request.record_quote(quote(90)).is_err());
        assert_eq!(request.quote().unwrap(), quote(40));
    }

    #[test]
    fn test_completed_request_rejects_second_completion() {
        let mut request = DepositRequest::default();
        request.record_quote(quote(1_000)).unwrap();
        request.complete(1_000).unwrap();

        assert_eq!(
            request.complete(1_000).unwrap_err(),
            error!(PoolError::AlreadyCompleted)
        );
        assert_eq!(request.quote().unwrap_err(), error!(PoolError::AlreadyCompleted));
    }

    #[test]
    fn test_expiry_only_without_quote() {
        let mut priced = DepositRequest::default();
        priced.record_quote(quote(10)).unwrap();
        assert!(priced.expire().is_err());

        let mut unpriced = DepositRequest::default();
        unpriced.expire().unwrap();
        assert_eq!(unpriced.status, DepositStatus::Expired);
        assert!(unpriced.complete(1).is_err());
    }
}
