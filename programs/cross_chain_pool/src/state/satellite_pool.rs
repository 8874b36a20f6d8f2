//! Satellite pool: local liquidity on a non-primary chain.
//!
//! Besides balance and loans the satellite keeps cumulative transfer
//! counters. Funds it has sent stay in its accounted value until the
//! receiving side counts them, so a transfer in transit is never missing
//! from, or doubled in, the aggregated sum.

use anchor_lang::prelude::*;

use crate::errors::PoolError;
use crate::transport::{InstructionKind, TransportPayload};

/// PDA Seeds: `[b"satellite", asset_mint.key().as_ref()]`
#[account]
#[derive(Default, Debug)]
pub struct SatellitePool {
    pub config: Pubkey,
    pub asset_mint: Pubkey,
    /// Token account holding the asset. Owner is this PDA.
    pub vault: Pubkey,
    /// Transport selector of the chain the primary pool lives on.
    pub primary_chain_selector: u64,
    /// Only sender allowed to instruct outbound transfers.
    pub primary_pool_address: [u8; 32],
    pub local_balance: u64,
    pub loans_in_use: u64,
    /// Cumulative amount moved to transport custody toward the primary.
    pub sent_to_primary: u64,
    /// Cumulative amount moved to transport custody toward other satellites.
    pub sent_to_satellites: u64,
    /// Cumulative amount credited from other satellites.
    pub received_from_satellites: u64,
    pub paused: bool,
    pub bump: u8,
}

/// Read-only view consumed by the aggregator.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LiquiditySnapshot {
    pub local_balance: u64,
    pub loans_in_use: u64,
    pub sent_to_primary: u64,
    pub sent_to_satellites: u64,
    pub received_from_satellites: u64,
}

impl LiquiditySnapshot {
    /// Holdings plus everything sent, minus what arrived from other
    /// satellites. Unchanged by any transfer between pools; `None` if the
    /// counters are inconsistent.
    pub fn accounted_value(&self) -> Option<u64> {
        self.local_balance
            .checked_add(self.loans_in_use)?
            .checked_add(self.sent_to_primary)?
            .checked_add(self.sent_to_satellites)?
            .checked_sub(self.received_from_satellites)
    }
}

fn add(a: u64, b: u64) -> Result<u64> {
    a.checked_add(b).ok_or(error!(PoolError::MathOverflow))
}

impl SatellitePool {
    pub const LEN: usize = 32 * 3 + 8 + 32 + 8 * 5 + 1 + 1;
    pub const SEED_PREFIX: &'static [u8] = b"satellite";

    pub fn require_not_paused(&self) -> Result<()> {
        require!(!self.paused, PoolError::PoolPaused);
        Ok(())
    }

    /// Allow-list check for instructions that move funds out of the satellite.
    pub fn authorize_sender(&self, source_chain_selector: u64, sender: &[u8; 32]) -> Result<()> {
        require!(
            source_chain_selector == self.primary_chain_selector
                && *sender == self.primary_pool_address,
            PoolError::UnauthorizedSender
        );
        Ok(())
    }

    pub fn snapshot(&self) -> LiquiditySnapshot {
        LiquiditySnapshot {
            local_balance: self.local_balance,
            loans_in_use: self.loans_in_use,
            sent_to_primary: self.sent_to_primary,
            sent_to_satellites: self.sent_to_satellites,
            received_from_satellites: self.received_from_satellites,
        }
    }

    /// Applies a delivered transport instruction to the counters. Outbound
    /// kinds need the allow-listed primary and an unpaused pool. Returns the
    /// message to queue once the funds are in custody, `None` when the
    /// delivery settles here.
    pub fn apply_instruction(
        &mut self,
        payload: &TransportPayload,
        source_chain_selector: u64,
        sender: &[u8; 32],
    ) -> Result<Option<TransportPayload>> {
        if payload.kind.requires_primary_sender() {
            self.require_not_paused()?;
            self.authorize_sender(source_chain_selector, sender)?;
        }
        match payload.kind {
            InstructionKind::RebalanceToPrimary => {
                self.debit(payload.amount)?;
                self.sent_to_primary = add(self.sent_to_primary, payload.amount)?;
            }
            InstructionKind::MigrateLiquidity => {
                self.debit(payload.amount)?;
                self.sent_to_satellites = add(self.sent_to_satellites, payload.amount)?;
            }
            InstructionKind::CreditLiquidity => {
                self.credit(payload.amount)?;
                self.received_from_satellites =
                    add(self.received_from_satellites, payload.amount)?;
            }
            InstructionKind::RebalanceFunds => return err!(PoolError::UnexpectedInstructionKind),
        }
        Ok(payload.follow_up())
    }

    pub(crate) fn credit(&mut self, amount: u64) -> Result<()> {
        self.local_balance = add(self.local_balance, amount)?;
        Ok(())
    }

    pub(crate) fn debit(&mut self, amount: u64) -> Result<()> {
        require!(amount > 0, PoolError::ZeroAmount);
        self.local_balance = self
            .local_balance
            .checked_sub(amount)
            .ok_or(error!(PoolError::InsufficientLiquidity))?;
        Ok(())
    }

    pub(crate) fn draw_loan(&mut self, amount: u64) -> Result<()> {
        self.debit(amount)?;
        self.loans_in_use = add(self.loans_in_use, amount)?;
        Ok(())
    }

    pub(crate) fn repay_loan(&mut self, amount: u64) -> Result<()> {
        require!(amount > 0, PoolError::ZeroAmount);
        require!(
            amount <= self.loans_in_use,
            PoolError::ExceedsOutstandingLoans
        );
        self.loans_in_use -= amount;
        self.credit(amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRIMARY: [u8; 32] = [0xAA; 32];

    fn satellite() -> SatellitePool {
        SatellitePool {
            primary_chain_selector: 1,
            primary_pool_address: PRIMARY,
            local_balance: 1_000,
            ..SatellitePool::default()
        }
    }

    #[test]
    fn test_allow_list_requires_chain_and_sender() {
        let pool = satellite();
        pool.authorize_sender(1, &PRIMARY).unwrap();
        assert_eq!(
            pool.authorize_sender(2, &PRIMARY).unwrap_err(),
            error!(PoolError::UnauthorizedSender)
        );
        assert!(pool.authorize_sender(1, &[0xBB; 32]).is_err());
    }

    #[test]
    fn test_debit_cannot_overdraw() {
        let mut pool = satellite();
        assert_eq!(
            pool.debit(1_001).unwrap_err(),
            error!(PoolError::InsufficientLiquidity)
        );
        pool.debit(400).unwrap();
        assert_eq!(pool.local_balance, 600);
    }

    #[test]
    fn test_loans_move_between_balance_and_loans() {
        let mut pool = satellite();
        pool.draw_loan(300).unwrap();
        assert_eq!((pool.local_balance, pool.loans_in_use), (700, 300));
        assert_eq!(pool.snapshot().accounted_value(), Some(1_000));

        assert!(pool.repay_loan(301).is_err());
        pool.repay_loan(300).unwrap();
        assert_eq!((pool.local_balance, pool.loans_in_use), (1_000, 0));
    }

    #[test]
    fn test_outbound_instruction_needs_primary_sender() {
        let mut pool = satellite();
        let rebalance = TransportPayload::rebalance_to_primary(400, [1u8; 32], 1, PRIMARY);

        assert_eq!(
            pool.apply_instruction(&rebalance, 1, &[0xBB; 32]).unwrap_err(),
            error!(PoolError::UnauthorizedSender)
        );
        assert_eq!(pool.local_balance, 1_000);

        pool.paused = true;
        assert_eq!(
            pool.apply_instruction(&rebalance, 1, &PRIMARY).unwrap_err(),
            error!(PoolError::PoolPaused)
        );
        pool.paused = false;

        let follow_up = pool.apply_instruction(&rebalance, 1, &PRIMARY).unwrap().unwrap();
        assert_eq!(follow_up.kind, InstructionKind::RebalanceFunds);
        assert_eq!((pool.local_balance, pool.sent_to_primary), (600, 400));
    }

    #[test]
    fn test_credit_accepted_from_any_satellite() {
        let mut pool = satellite();
        pool.paused = true;
        let credit = TransportPayload::migrate_liquidity(250, [2u8; 32], 7, [7u8; 32])
            .follow_up()
            .unwrap();

        assert_eq!(pool.apply_instruction(&credit, 42, &[0x42; 32]).unwrap(), None);
        assert_eq!((pool.local_balance, pool.received_from_satellites), (1_250, 250));

        let funds = TransportPayload {
            kind: InstructionKind::RebalanceFunds,
            ..credit
        };
        assert_eq!(
            pool.apply_instruction(&funds, 1, &PRIMARY).unwrap_err(),
            error!(PoolError::UnexpectedInstructionKind)
        );
    }

    #[test]
    fn test_transfers_leave_accounted_value_unchanged() {
        let mut source = satellite();
        let mut destination = SatellitePool {
            local_balance: 500,
            ..satellite()
        };
        let total = |a: &SatellitePool, b: &SatellitePool| {
            a.snapshot().accounted_value().unwrap() + b.snapshot().accounted_value().unwrap()
        };
        assert_eq!(total(&source, &destination), 1_500);

        let migrate = TransportPayload::migrate_liquidity(300, [3u8; 32], 9, [9u8; 32]);
        let credit = source.apply_instruction(&migrate, 1, &PRIMARY).unwrap().unwrap();
        assert_eq!(source.local_balance, 700);
        assert_eq!(total(&source, &destination), 1_500);

        destination.apply_instruction(&credit, 5, &[5u8; 32]).unwrap();
        assert_eq!(destination.local_balance, 800);
        assert_eq!(total(&source, &destination), 1_500);

        let rebalance = TransportPayload::rebalance_to_primary(200, [4u8; 32], 1, PRIMARY);
        destination.apply_instruction(&rebalance, 1, &PRIMARY).unwrap();
        assert_eq!(destination.local_balance, 600);
        assert_eq!(destination.snapshot().accounted_value(), Some(500));
    }
}
