//! Registry configuration and per-auction creation parameters.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::{
    constants::{
        DEFAULT_AUCTION_DURATION, DEFAULT_DISTRIBUTION_BATCH_SIZE,
        DEFAULT_PRICE_SCHEDULE_INTERVAL, DEFAULT_UPKEEP_GAS_LIMIT,
    },
    errors::{InvalidConfig, RegistryError},
};

/// Parameters of a single sale, as submitted to `createAuction`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionParams {
    pub name: String,
    pub symbol: String,
    pub total_supply: U256,
    pub initial_price: U256,
    pub reserve_price: U256,
    pub minimum_bid: U256,
}

/// Injected wiring and tunables of an [`AuctionRegistry`](crate::AuctionRegistry).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegistryConfig {
    /// Identity of the registry itself; funding tokens are held here.
    pub address: Address,
    /// Identity allowed to call `perform_due` on every auction.
    pub automation_forwarder: Address,
    /// Funding token amount deposited for each new auction's upkeep.
    pub upkeep_funding: U256,
    pub upkeep_gas_limit: u32,
    /// Bidding window of every auction, in seconds.
    pub auction_duration: u64,
    pub distribution_batch_size: usize,
    pub price_schedule_interval: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            address: Address::ZERO,
            automation_forwarder: Address::ZERO,
            upkeep_funding: U256::ZERO,
            upkeep_gas_limit: DEFAULT_UPKEEP_GAS_LIMIT,
            auction_duration: DEFAULT_AUCTION_DURATION,
            distribution_batch_size: DEFAULT_DISTRIBUTION_BATCH_SIZE,
            price_schedule_interval: DEFAULT_PRICE_SCHEDULE_INTERVAL,
        }
    }
}

impl RegistryConfig {
    pub fn validate(&self) -> Result<(), RegistryError> {
        let reason = if self.address == Address::ZERO {
            "registry address is zero"
        } else if self.automation_forwarder == Address::ZERO {
            "automation forwarder is zero"
        } else if self.auction_duration == 0 {
            "auction duration is zero"
        } else if self.distribution_batch_size == 0 {
            "distribution batch size is zero"
        } else if self.price_schedule_interval == 0 {
            "price schedule interval is zero"
        } else {
            return Ok(());
        };
        Err(RegistryError::InvalidConfig(InvalidConfig {
            reason: reason.into(),
        }))
    }
}
