//! The fungible asset sold by an auction.
//!
//! The token itself lives outside this crate; an auction only needs the calls
//! below, issued with the auction as `msg.sender` and as the token's owner.

use std::sync::Arc;

use alloy_primitives::{Address, U256};

pub trait AssetLedger: Send + Sync {
    /// Address of the token contract.
    fn address(&self) -> Address;

    /// Creates `amount` new units for `to`. Owner only.
    fn mint(&self, to: Address, amount: U256) -> Result<(), Vec<u8>>;

    /// Destroys `amount` units held by the caller. Owner only.
    fn burn(&self, amount: U256) -> Result<(), Vec<u8>>;

    /// Moves `amount` units from the caller to `to`.
    fn transfer(&self, to: Address, amount: U256) -> Result<(), Vec<u8>>;

    fn balance_of(&self, owner: Address) -> U256;

    fn total_supply(&self) -> U256;
}

/// Deploys a fresh token for a new auction.
pub trait LedgerDeployer: Send + Sync {
    /// Deploys `name`/`symbol` with `owner` holding the mint and burn rights.
    fn deploy(
        &self,
        name: &str,
        symbol: &str,
        owner: Address,
    ) -> Result<Arc<dyn AssetLedger>, Vec<u8>>;
}
