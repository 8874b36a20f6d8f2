//! Satellite registry.
//!
//! Every mutation bumps `version`. Aggregations record the version they were
//! issued against and are rejected on fulfillment if it moved. Removals and
//! migrations are refused outright while any aggregation is pending.
//!
//! Removed entries are never dropped from the valuation set: their transfer
//! counters pair with the counters of the satellites they sent funds to.

use anchor_lang::prelude::*;

use crate::errors::PoolError;
use crate::state::tickets::AggregationTicket;

pub const MAX_SATELLITES: usize = 16;

/// PDA Seeds: `[b"registry", pool.key().as_ref()]`
#[account]
#[derive(InitSpace)]
pub struct Registry {
    pub pool: Pubkey,
    pub version: u64,
    /// Aggregations issued and not yet resolved.
    pub pending_aggregations: u32,
    #[max_len(MAX_SATELLITES)]
    pub satellites: Vec<SatelliteEntry>,
    pub bump: u8,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq, InitSpace)]
pub struct SatelliteEntry {
    pub chain_selector: u64,
    /// Satellite pool address on its own chain (left-padded for 20-byte chains).
    pub pool_address: [u8; 32],
    pub rebalance_eligible: bool,
    pub active: bool,
    /// Last liquidity reported by the aggregator, net of dispatched rebalances.
    pub last_known_liquidity: u64,
    pub liquidity_reported_at: i64,
}

impl Registry {
    pub const SEED_PREFIX: &'static [u8] = b"registry";

    fn bump_version(&mut self) -> Result<()> {
        self.version = self
            .version
            .checked_add(1)
            .ok_or(error!(PoolError::MathOverflow))?;
        Ok(())
    }

    pub fn entry(&self, chain_selector: u64) -> Option<&SatelliteEntry> {
        self.satellites
            .iter()
            .find(|s| s.chain_selector == chain_selector)
    }

    fn entry_mut(&mut self, chain_selector: u64) -> Result<&mut SatelliteEntry> {
        self.satellites
            .iter_mut()
            .find(|s| s.chain_selector == chain_selector)
            .ok_or(error!(PoolError::SatelliteNotFound))
    }

    /// Every satellite ever registered, active or not. Aggregations sum the
    /// accounted value over this whole set.
    pub fn valuation_set(&self) -> impl Iterator<Item = &SatelliteEntry> {
        self.satellites.iter()
    }

    /// Registers a satellite, or reactivates a previously removed one.
    pub fn add_satellite(
        &mut self,
        chain_selector: u64,
        pool_address: [u8; 32],
        rebalance_eligible: bool,
    ) -> Result<()> {
        match self
            .satellites
            .iter_mut()
            .find(|s| s.chain_selector == chain_selector)
        {
            Some(existing) => {
                require!(!existing.active, PoolError::SatelliteAlreadyRegistered);
                *existing = SatelliteEntry {
                    chain_selector,
                    pool_address,
                    rebalance_eligible,
                    active: true,
                    ..SatelliteEntry::default()
                };
            }
            None => {
                require!(
                    self.satellites.len() < MAX_SATELLITES,
                    PoolError::RegistryFull
                );
                self.satellites.push(SatelliteEntry {
                    chain_selector,
                    pool_address,
                    rebalance_eligible,
                    active: true,
                    ..SatelliteEntry::default()
                });
            }
        }
        self.bump_version()
    }

    /// Deactivates a satellite. The entry stays so late transport deliveries
    /// from it can still be authenticated.
    pub fn remove_satellite(&mut self, chain_selector: u64) -> Result<()> {
        require!(self.pending_aggregations == 0, PoolError::RegistryFenced);
        let entry = self.entry_mut(chain_selector)?;
        require!(entry.active, PoolError::SatelliteNotFound);
        entry.active = false;
        entry.rebalance_eligible = false;
        self.bump_version()
    }

    /// Validates a satellite-to-satellite migration and moves the cached
    /// liquidity with it. Returns the source and destination entries.
    pub(crate) fn begin_migration(
        &mut self,
        from_chain_selector: u64,
        to_chain_selector: u64,
        amount: u64,
    ) -> Result<(SatelliteEntry, SatelliteEntry)> {
        require!(amount > 0, PoolError::ZeroAmount);
        require!(self.pending_aggregations == 0, PoolError::RegistryFenced);
        require!(
            from_chain_selector != to_chain_selector,
            PoolError::InvalidMigration
        );
        let active = |chain_selector| {
            self.entry(chain_selector)
                .filter(|entry| entry.active)
                .copied()
                .ok_or(error!(PoolError::InvalidMigration))
        };
        let source = active(from_chain_selector)?;
        let destination = active(to_chain_selector)?;

        self.reserve_liquidity(from_chain_selector, amount)?;
        self.release_liquidity(to_chain_selector, amount)?;
        Ok((source, destination))
    }

    pub fn set_rebalance_eligibility(&mut self, chain_selector: u64, eligible: bool) -> Result<()> {
        let entry = self.entry_mut(chain_selector)?;
        require!(entry.active, PoolError::SatelliteNotFound);
        entry.rebalance_eligible = eligible;
        self.bump_version()
    }

    pub fn report_liquidity(&mut self, chain_selector: u64, liquidity: u64, now: i64) -> Result<()> {
        let entry = self.entry_mut(chain_selector)?;
        entry.last_known_liquidity = liquidity;
        entry.liquidity_reported_at = now;
        Ok(())
    }

    /// Picks the satellite that funds a rebalance of `amount`: the eligible
    /// active entry with the largest known liquidity covering the amount,
    /// ties broken by the lowest chain selector.
    pub fn select_rebalance_source(&self, amount: u64) -> Option<SatelliteEntry> {
        self.satellites
            .iter()
            .filter(|s| s.active && s.rebalance_eligible && s.last_known_liquidity >= amount)
            .min_by(|a, b| {
                b.last_known_liquidity
                    .cmp(&a.last_known_liquidity)
                    .then(a.chain_selector.cmp(&b.chain_selector))
            })
            .copied()
    }

    pub(crate) fn reserve_liquidity(&mut self, chain_selector: u64, amount: u64) -> Result<()> {
        let entry = self.entry_mut(chain_selector)?;
        entry.last_known_liquidity = entry
            .last_known_liquidity
            .checked_sub(amount)
            .ok_or(error!(PoolError::InsufficientLiquidity))?;
        Ok(())
    }

    pub(crate) fn release_liquidity(&mut self, chain_selector: u64, amount: u64) -> Result<()> {
        let entry = self.entry_mut(chain_selector)?;
        entry.last_known_liquidity = entry.last_known_liquidity.saturating_add(amount);
        Ok(())
    }

    /// Issues (or re-issues) an aggregation attempt against the current version.
    pub fn begin_aggregation(&mut self, ticket: &mut AggregationTicket, now: i64) -> Result<()> {
        if ticket.issue(self.version, now)? {
            self.pending_aggregations = self
                .pending_aggregations
                .checked_add(1)
                .ok_or(error!(PoolError::MathOverflow))?;
        }
        Ok(())
    }

    pub fn end_aggregation(&mut self, ticket: &mut AggregationTicket) {
        if ticket.resolve() {
            self.pending_aggregations = self.pending_aggregations.saturating_sub(1);
        }
    }

    pub fn check_version(&self, ticket: &AggregationTicket) -> Result<()> {
        require!(
            ticket.registry_version == self.version,
            PoolError::RegistryVersionMismatch
        );
        Ok(())
    }
}
