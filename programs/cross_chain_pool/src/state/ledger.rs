//! Pool ledger: the single authoritative set of pool-wide counters.
//!
//! Fields are private. Every mutation goes through a method that keeps the
//! counters consistent with each other, so the value functions below can be
//! read at the end of any instruction.
//!
//! ```text
//! total_pool_value = total_local_balance + loans_in_use
//!                  + (satellite_value - received_from_satellites)
//!                  + deposits_in_flight - withdrawal_amount_locked
//! pricing_value    = total_pool_value - deposits_in_flight
//! ```
//!
//! `satellite_value` is the aggregated accounted value of the satellites,
//! which keeps everything a satellite has sent. Subtracting what the primary
//! has received leaves exactly the satellite holdings plus the funds still
//! in transit, so no transfer is counted twice or dropped at any step.

use anchor_lang::prelude::*;

use crate::errors::PoolError;

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Ledger {
    /// Asset units physically held by the primary pool vault and not escrowed.
    total_local_balance: u64,
    /// Asset units lent out from the primary chain.
    loans_in_use: u64,
    /// Deposits escrowed but not yet priced.
    deposits_in_flight: u64,
    /// Rebalance transfers dispatched toward the primary and not yet arrived.
    /// Bookkeeping only; the satellite counters carry transit into the value.
    withdrawals_in_flight: u64,
    /// Payouts committed to awaiting withdrawals.
    withdrawal_amount_locked: u64,
    /// Mirror of the share mint supply.
    total_share_supply: u64,
    /// Cumulative rebalance funds that arrived from satellites.
    received_from_satellites: u64,
}

fn add(a: u64, b: u64) -> Result<u64> {
    a.checked_add(b).ok_or(error!(PoolError::MathOverflow))
}

fn sub(a: u64, b: u64) -> Result<u64> {
    a.checked_sub(b).ok_or(error!(PoolError::MathOverflow))
}

/// `amount * numerator / denominator`, floored, with a u128 intermediate.
pub fn mul_div(amount: u64, numerator: u64, denominator: u64) -> Result<u64> {
    require!(denominator > 0, PoolError::MathOverflow);
    let value = (amount as u128)
        .checked_mul(numerator as u128)
        .ok_or(error!(PoolError::MathOverflow))?
        / denominator as u128;
    u64::try_from(value).map_err(|_| error!(PoolError::MathOverflow))
}

impl Ledger {
    pub const LEN: usize = 8 * 7;

    pub fn total_local_balance(&self) -> u64 {
        self.total_local_balance
    }

    pub fn loans_in_use(&self) -> u64 {
        self.loans_in_use
    }

    pub fn deposits_in_flight(&self) -> u64 {
        self.deposits_in_flight
    }

    pub fn withdrawals_in_flight(&self) -> u64 {
        self.withdrawals_in_flight
    }

    pub fn withdrawal_amount_locked(&self) -> u64 {
        self.withdrawal_amount_locked
    }

    pub fn total_share_supply(&self) -> u64 {
        self.total_share_supply
    }

    pub fn received_from_satellites(&self) -> u64 {
        self.received_from_satellites
    }

    #[cfg(test)]
    pub(crate) fn with_balances(total_local_balance: u64, total_share_supply: u64) -> Self {
        Self {
            total_local_balance,
            total_share_supply,
            ..Self::default()
        }
    }

    /// Conservation value: every asset unit the pool is accountable for.
    pub fn total_pool_value(&self, satellite_value: u64) -> Result<u64> {
        add(self.pricing_value(satellite_value)?, self.deposits_in_flight)
    }

    /// Share-price basis. Excludes deposits that have not been priced yet.
    pub fn pricing_value(&self, satellite_value: u64) -> Result<u64> {
        let gross = add(self.total_local_balance, self.loans_in_use)?;
        let gross = add(gross, satellite_value)?;
        let net = sub(gross, self.received_from_satellites)?;
        sub(net, self.withdrawal_amount_locked)
    }

    /// Asset amount redeemable for `shares` at the current pricing value.
    pub fn redeemable_assets(&self, shares: u64, satellite_value: u64) -> Result<u64> {
        require!(shares > 0, PoolError::ZeroAmount);
        require!(
            shares <= self.total_share_supply,
            PoolError::InsufficientShares
        );
        mul_div(
            shares,
            self.pricing_value(satellite_value)?,
            self.total_share_supply,
        )
    }

    // --- deposits ---

    pub fn escrow_deposit(&mut self, amount: u64, pool_cap: u64) -> Result<()> {
        require!(amount > 0, PoolError::ZeroAmount);
        let after = add(add(self.total_local_balance, self.deposits_in_flight)?, amount)?;
        require!(after <= pool_cap, PoolError::CapExceeded);
        self.deposits_in_flight = add(self.deposits_in_flight, amount)?;
        Ok(())
    }

    pub fn refund_deposit(&mut self, amount: u64) -> Result<()> {
        self.deposits_in_flight = sub(self.deposits_in_flight, amount)?;
        Ok(())
    }

    /// Shares `amount` buys at the current pricing value. Escrowed deposits
    /// are outside both the value and the supply, so quotes taken while
    /// other deposits are pending do not dilute each other.
    pub fn quote_deposit(&self, amount: u64, satellite_value: u64) -> Result<u64> {
        let shares = if self.total_share_supply == 0 {
            amount
        } else {
            let value = self.pricing_value(satellite_value)?;
            require!(value > 0, PoolError::PoolValueDepleted);
            mul_div(amount, self.total_share_supply, value)?
        };
        require!(shares > 0, PoolError::ZeroShares);
        Ok(shares)
    }

    /// Adds quoted shares to the supply mirror and moves the escrow into
    /// local balance.
    pub fn settle_deposit(&mut self, amount: u64, shares: u64) -> Result<()> {
        require!(shares > 0, PoolError::ZeroShares);
        self.deposits_in_flight = sub(self.deposits_in_flight, amount)?;
        self.total_local_balance = add(self.total_local_balance, amount)?;
        self.total_share_supply = add(self.total_share_supply, shares)?;
        Ok(())
    }

    // --- withdrawals ---

    pub fn burn_shares(&mut self, shares: u64) -> Result<()> {
        require!(
            shares <= self.total_share_supply,
            PoolError::InsufficientShares
        );
        self.total_share_supply -= shares;
        Ok(())
    }

    pub fn can_pay_locally(&self, amount: u64) -> bool {
        self.total_local_balance >= amount
    }

    /// Pays a freshly computed withdrawal straight from local balance.
    pub fn pay_out(&mut self, amount: u64) -> Result<()> {
        require!(
            self.can_pay_locally(amount),
            PoolError::InsufficientLiquidity
        );
        self.total_local_balance -= amount;
        Ok(())
    }

    pub fn lock_withdrawal(&mut self, amount: u64) -> Result<()> {
        self.withdrawal_amount_locked = add(self.withdrawal_amount_locked, amount)?;
        Ok(())
    }

    /// Pays a previously locked withdrawal from local balance.
    pub fn pay_locked(&mut self, amount: u64) -> Result<()> {
        require!(
            self.can_pay_locally(amount),
            PoolError::InsufficientLiquidity
        );
        self.withdrawal_amount_locked = sub(self.withdrawal_amount_locked, amount)?;
        self.total_local_balance -= amount;
        Ok(())
    }

    pub fn rebalance_dispatched(&mut self, amount: u64) -> Result<()> {
        self.withdrawals_in_flight = add(self.withdrawals_in_flight, amount)?;
        Ok(())
    }

    pub fn rebalance_dropped(&mut self, amount: u64) -> Result<()> {
        self.withdrawals_in_flight = sub(self.withdrawals_in_flight, amount)?;
        Ok(())
    }

    /// Funds for a live rebalance landed in the vault.
    pub fn rebalance_arrived(&mut self, amount: u64, counted_in_flight: bool) -> Result<()> {
        if counted_in_flight {
            self.withdrawals_in_flight = sub(self.withdrawals_in_flight, amount)?;
        }
        self.receive_from_satellite(amount)
    }

    /// Rebalance funds that no waiting request claims anymore.
    pub fn credit_unmatched(&mut self, amount: u64) -> Result<()> {
        self.receive_from_satellite(amount)
    }

    fn receive_from_satellite(&mut self, amount: u64) -> Result<()> {
        self.received_from_satellites = add(self.received_from_satellites, amount)?;
        self.total_local_balance = add(self.total_local_balance, amount)?;
        Ok(())
    }

    // --- lending ---

    pub fn draw_loan(&mut self, amount: u64) -> Result<()> {
        require!(amount > 0, PoolError::ZeroAmount);
        require!(
            self.can_pay_locally(amount),
            PoolError::InsufficientLiquidity
        );
        self.total_local_balance -= amount;
        self.loans_in_use = add(self.loans_in_use, amount)?;
        Ok(())
    }

    pub fn repay_loan(&mut self, amount: u64) -> Result<()> {
        require!(amount > 0, PoolError::ZeroAmount);
        require!(
            amount <= self.loans_in_use,
            PoolError::ExceedsOutstandingLoans
        );
        self.loans_in_use -= amount;
        self.total_local_balance = add(self.total_local_balance, amount)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deposit(ledger: &mut Ledger, amount: u64, satellite_value: u64) -> u64 {
        ledger.escrow_deposit(amount, u64::MAX).unwrap();
        let shares = ledger.quote_deposit(amount, satellite_value).unwrap();
        ledger.settle_deposit(amount, shares).unwrap();
        shares
    }

    #[test]
    fn test_bootstrap_deposit_mints_one_to_one() {
        let mut ledger = Ledger::default();
        ledger.escrow_deposit(1_000, 10_000).unwrap();
        let shares = ledger.quote_deposit(1_000, 0).unwrap();
        ledger.settle_deposit(1_000, shares).unwrap();

        assert_eq!(shares, 1_000);
        assert_eq!(ledger.total_share_supply(), 1_000);
        assert_eq!(ledger.total_local_balance(), 1_000);
        assert_eq!(ledger.deposits_in_flight(), 0);
    }

    #[test]
    fn test_deposit_priced_against_value_before_it() {
        // 1_200 local + 800 on satellites = 2_000 backing 1_000 shares.
        let mut ledger = Ledger::with_balances(1_200, 1_000);
        ledger.escrow_deposit(500, u64::MAX).unwrap();

        assert_eq!(ledger.pricing_value(800).unwrap(), 2_000);
        assert_eq!(ledger.total_pool_value(800).unwrap(), 2_500);

        let shares = ledger.quote_deposit(500, 800).unwrap();
        assert_eq!(shares, 250);
        ledger.settle_deposit(500, shares).unwrap();
        assert_eq!(ledger.total_share_supply(), 1_250);
        assert_eq!(ledger.pricing_value(800).unwrap(), 2_500);
    }

    #[test]
    fn test_in_flight_deposits_do_not_dilute_each_other() {
        let mut ledger = Ledger::with_balances(1_000, 1_000);
        ledger.escrow_deposit(1_000, u64::MAX).unwrap();
        ledger.escrow_deposit(1_000, u64::MAX).unwrap();

        let first = ledger.quote_deposit(1_000, 0).unwrap();
        let second = ledger.quote_deposit(1_000, 0).unwrap();
        ledger.settle_deposit(1_000, second).unwrap();
        ledger.settle_deposit(1_000, first).unwrap();
        assert_eq!((first, second), (1_000, 1_000));
    }

    #[test]
    fn test_cap_counts_escrowed_deposits() {
        let mut ledger = Ledger::default();
        ledger.escrow_deposit(600, 1_000).unwrap();

        let err = ledger.escrow_deposit(401, 1_000).unwrap_err();
        assert_eq!(err, error!(PoolError::CapExceeded));
        ledger.escrow_deposit(400, 1_000).unwrap();
    }

    #[test]
    fn test_zero_deposit_rejected() {
        let err = Ledger::default().escrow_deposit(0, 1_000).unwrap_err();
        assert_eq!(err, error!(PoolError::ZeroAmount));
    }

    #[test]
    fn test_depleted_pool_refuses_pricing() {
        let mut ledger = Ledger::with_balances(100, 100);
        ledger.pay_out(100).unwrap();
        ledger.escrow_deposit(10, u64::MAX).unwrap();

        let err = ledger.quote_deposit(10, 0).unwrap_err();
        assert_eq!(err, error!(PoolError::PoolValueDepleted));
    }

    #[test]
    fn test_locked_withdrawal_reduces_pricing_value() {
        let mut ledger = Ledger::with_balances(100, 100);
        ledger.burn_shares(50).unwrap();
        ledger.lock_withdrawal(500).unwrap();

        assert_eq!(ledger.pricing_value(900).unwrap(), 500);
    }

    #[test]
    fn test_dispatch_does_not_move_value() {
        // 1_000 local + 3_000 on the source satellite, 1_500 owed.
        let mut ledger = Ledger::with_balances(1_000, 1_000);
        ledger.burn_shares(300).unwrap();
        ledger.lock_withdrawal(1_500).unwrap();
        assert_eq!(ledger.pricing_value(3_000).unwrap(), 2_500);

        ledger.rebalance_dispatched(1_500).unwrap();
        assert_eq!(ledger.withdrawals_in_flight(), 1_500);
        assert_eq!(ledger.pricing_value(3_000).unwrap(), 2_500);

        // The satellite debit keeps its accounted value; arrival nets out.
        ledger.rebalance_arrived(1_500, true).unwrap();
        assert_eq!(ledger.received_from_satellites(), 1_500);
        assert_eq!(ledger.pricing_value(3_000).unwrap(), 2_500);

        ledger.pay_locked(1_500).unwrap();
        assert_eq!(ledger.total_local_balance(), 1_000);
        assert_eq!(ledger.withdrawals_in_flight(), 0);
        assert_eq!(ledger.withdrawal_amount_locked(), 0);
        assert_eq!(ledger.pricing_value(3_000).unwrap(), 2_500);
    }

    #[test]
    fn test_unmatched_arrival_is_value_neutral() {
        let mut ledger = Ledger::with_balances(100, 100);
        ledger.credit_unmatched(400).unwrap();
        assert_eq!(ledger.total_local_balance(), 500);
        assert_eq!(ledger.pricing_value(400).unwrap(), 500);
    }

    #[test]
    fn test_lending_is_value_neutral() {
        let mut ledger = Ledger::default();
        deposit(&mut ledger, 1_000, 0);
        let before = ledger.pricing_value(0).unwrap();

        ledger.draw_loan(400).unwrap();
        assert_eq!(ledger.pricing_value(0).unwrap(), before);
        assert_eq!(ledger.loans_in_use(), 400);

        let err = ledger.repay_loan(401).unwrap_err();
        assert_eq!(err, error!(PoolError::ExceedsOutstandingLoans));
        ledger.repay_loan(400).unwrap();
        assert_eq!(ledger.pricing_value(0).unwrap(), before);
    }

    #[test]
    fn test_redeemable_assets_floors() {
        let ledger = Ledger::with_balances(1_000, 3);
        assert_eq!(ledger.redeemable_assets(1, 0).unwrap(), 333);
    }
}
