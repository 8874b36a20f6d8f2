//! Global protocol config. Single instance per program deployment.

use anchor_lang::prelude::*;

use crate::automation::RetryPolicy;
use crate::errors::PoolError;

/// Content hashes of the off-chain aggregation logic the pool accepts results from.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PinnedLogic {
    pub logic_hash: [u8; 32],
    pub library_hash: [u8; 32],
}

impl PinnedLogic {
    pub const LEN: usize = 32 + 32;

    pub fn verify(&self, logic_hash: &[u8; 32]) -> Result<()> {
        require!(self.logic_hash == *logic_hash, PoolError::LogicHashMismatch);
        Ok(())
    }
}

/// PDA Seeds: `[b"config"]`
#[account]
#[derive(Default)]
pub struct Config {
    /// Authority for registry, caps, pinned logic, cancellation.
    pub admin: Pubkey,
    /// Aggregator fulfillment authority (stands in for the executor quorum).
    pub oracle: Pubkey,
    /// Transport delivery authority; also owns the transport custody accounts.
    pub transport: Pubkey,
    /// Scheduled caller allowed to hit the id-only retry entry points.
    pub automation: Pubkey,
    /// Lending venue authority allowed to draw and repay loans.
    pub lender: Pubkey,
    /// Transport chain selector of the chain this deployment runs on.
    pub local_chain_selector: u64,
    pub pinned: PinnedLogic,
    pub retry_policy: RetryPolicy,
    /// Protocol-level pause.
    pub paused: bool,
    pub bump: u8,
}

impl Config {
    pub const LEN: usize = 32 * 5 + 8 + PinnedLogic::LEN + RetryPolicy::LEN + 1 + 1;
    pub const SEED_PREFIX: &'static [u8] = b"config";

    pub fn require_not_paused(&self) -> Result<()> {
        require!(!self.paused, PoolError::PoolPaused);
        Ok(())
    }

    /// Retry entry points accept the automation forwarder or the admin.
    pub fn is_retry_caller(&self, caller: &Pubkey) -> bool {
        *caller == self.automation || *caller == self.admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pinned_logic_rejects_other_hash() {
        let pinned = PinnedLogic {
            logic_hash: [1u8; 32],
            library_hash: [2u8; 32],
        };
        pinned.verify(&[1u8; 32]).unwrap();
        assert_eq!(
            pinned.verify(&[2u8; 32]).unwrap_err(),
            error!(PoolError::LogicHashMismatch)
        );
    }

    #[test]
    fn test_retry_caller_is_automation_or_admin() {
        let config = Config {
            admin: Pubkey::new_unique(),
            automation: Pubkey::new_unique(),
            ..Config::default()
        };
        assert!(config.is_retry_caller(&config.admin));
        assert!(config.is_retry_caller(&config.automation));
        assert!(!config.is_retry_caller(&Pubkey::new_unique()));
    }
}
