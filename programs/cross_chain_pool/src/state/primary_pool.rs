//! Primary pool account: share-mint authority and owner of the ledger.

use anchor_lang::prelude::*;
use anchor_lang::solana_program::hash::hashv;

use crate::errors::PoolError;
use crate::state::ledger::Ledger;

/// PDA Seeds: `[b"pool", asset_mint.key().as_ref()]`
#[account]
#[derive(Default)]
pub struct PrimaryPool {
    pub config: Pubkey,
    /// Stable asset mint (e.g. USDC).
    pub asset_mint: Pubkey,
    /// Share token mint. Mint authority is this PDA.
    pub share_mint: Pubkey,
    /// Token account holding the asset. Owner is this PDA.
    pub vault: Pubkey,
    /// Share token account holding shares of pending withdrawals.
    pub share_escrow: Pubkey,
    pub ledger: Ledger,
    /// Upper bound on local balance plus escrowed deposits.
    pub pool_cap: u64,
    /// Next nonce for deposit and withdrawal ids. Never reused.
    pub next_request_nonce: u64,
    pub paused: bool,
    pub bump: u8,
}

pub const DEPOSIT_TAG: &[u8] = b"deposit";
pub const WITHDRAWAL_TAG: &[u8] = b"withdrawal";
pub const MIGRATION_TAG: &[u8] = b"migration";

/// Request id: `sha256(tag ‖ pool ‖ requester ‖ amount ‖ nonce)`.
pub fn derive_request_id(
    tag: &[u8],
    pool: &Pubkey,
    requester: &Pubkey,
    amount: u64,
    nonce: u64,
) -> [u8; 32] {
    hashv(&[
        tag,
        pool.as_ref(),
        requester.as_ref(),
        &amount.to_be_bytes(),
        &nonce.to_be_bytes(),
    ])
    .to_bytes()
}

impl PrimaryPool {
    pub const LEN: usize = 32 * 5 + Ledger::LEN + 8 + 8 + 1 + 1;
    pub const SEED_PREFIX: &'static [u8] = b"pool";

    pub fn require_not_paused(&self) -> Result<()> {
        require!(!self.paused, PoolError::PoolPaused);
        Ok(())
    }

    /// Consumes a nonce and returns it with the derived request id.
    pub fn next_request(
        &mut self,
        tag: &[u8],
        pool_key: &Pubkey,
        requester: &Pubkey,
        amount: u64,
    ) -> Result<(u64, [u8; 32])> {
        let nonce = self.next_request_nonce;
        self.next_request_nonce = nonce
            .checked_add(1)
            .ok_or(error!(PoolError::MathOverflow))?;
        Ok((nonce, derive_request_id(tag, pool_key, requester, amount, nonce)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_round_requests_get_distinct_ids() {
        let mut pool = PrimaryPool::default();
        let pool_key = Pubkey::new_unique();
        let depositor = Pubkey::new_unique();

        let (n1, id1) = pool.next_request(DEPOSIT_TAG, &pool_key, &depositor, 100).unwrap();
        let (n2, id2) = pool.next_request(DEPOSIT_TAG, &pool_key, &depositor, 100).unwrap();

        assert_eq!((n1, n2), (0, 1));
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_tag_separates_request_kinds() {
        let pool = Pubkey::new_unique();
        let user = Pubkey::new_unique();
        assert_ne!(
            derive_request_id(DEPOSIT_TAG, &pool, &user, 5, 0),
            derive_request_id(WITHDRAWAL_TAG, &pool, &user, 5, 0)
        );
    }
}
