//! Correlation tickets carried by request accounts.
//!
//! An `AggregationTicket` identifies the outstanding aggregator attempt for a
//! request; a `RebalanceTicket` identifies the outstanding transport transfer.
//! Callbacks must present the attempt number they were issued with.

use anchor_lang::prelude::*;

use crate::errors::PoolError;

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AggregationTicket {
    /// Incremented on every issue; echoed back by the oracle.
    pub attempt: u32,
    /// Registry version the attempt was issued against.
    pub registry_version: u64,
    pub issued_at: i64,
    /// True while the attempt is counted against the registry fence.
    pub pending: bool,
    /// Responses that came back through the error channel.
    pub failures: u16,
}

impl AggregationTicket {
    pub const LEN: usize = 4 + 8 + 8 + 1 + 2;

    /// Starts a new attempt. Returns true if the ticket was not pending before,
    /// i.e. the caller must count it against the registry fence.
    pub(crate) fn issue(&mut self, registry_version: u64, now: i64) -> Result<bool> {
        let newly_pending = !self.pending;
        self.attempt = self
            .attempt
            .checked_add(1)
            .ok_or(error!(PoolError::MathOverflow))?;
        self.registry_version = registry_version;
        self.issued_at = now;
        self.pending = true;
        Ok(newly_pending)
    }

    /// Clears the pending flag. Returns true if it was set.
    pub(crate) fn resolve(&mut self) -> bool {
        std::mem::replace(&mut self.pending, false)
    }

    pub fn check_attempt(&self, attempt: u32) -> Result<()> {
        require!(
            self.pending && self.attempt == attempt,
            PoolError::StaleAggregatorResponse
        );
        Ok(())
    }

    pub fn record_failure(&mut self) {
        self.failures = self.failures.saturating_add(1);
    }
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RebalanceTicket {
    pub source_chain_selector: u64,
    pub attempt: u32,
    /// Set while a transfer for this request may still land. Never two live
    /// transfers per request.
    pub in_motion: bool,
    pub dispatched_at: i64,
}

impl RebalanceTicket {
    pub const LEN: usize = 8 + 4 + 1 + 8;

    pub(crate) fn dispatch(&mut self, source_chain_selector: u64, now: i64) -> Result<u32> {
        require!(!self.in_motion, PoolError::InvalidRequestStatus);
        self.attempt = self
            .attempt
            .checked_add(1)
            .ok_or(error!(PoolError::MathOverflow))?;
        self.source_chain_selector = source_chain_selector;
        self.in_motion = true;
        self.dispatched_at = now;
        Ok(self.attempt)
    }

    /// Marks the given attempt dead. Ignores reports for older attempts.
    pub(crate) fn mark_dropped(&mut self, attempt: u32) -> bool {
        if self.in_motion && self.attempt == attempt {
            self.in_motion = false;
            return true;
        }
        false
    }
}
