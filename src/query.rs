//! Read-only views across the registry.

use alloy_primitives::{Address, U256};
use serde::Serialize;

use crate::{
    auction::{DutchAuction, Phase},
    errors::RegistryError,
    price::PriceCurve,
    registry::AuctionRegistry,
};

/// Price of the curve `offset` seconds after the start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PricePoint {
    pub offset: u64,
    pub price: U256,
}

/// Samples `curve` every `interval` seconds, plus a closing point at the end of
/// the window. A zero interval yields the two endpoints only.
pub fn price_schedule(curve: &PriceCurve, interval: u64) -> Vec<PricePoint> {
    let mut points = Vec::new();
    if interval > 0 {
        let mut offset = 0;
        while offset < curve.duration {
            points.push(PricePoint {
                offset,
                price: curve.price_after(offset),
            });
            offset = match offset.checked_add(interval) {
                Some(next) => next,
                None => break,
            };
        }
    } else {
        points.push(PricePoint {
            offset: 0,
            price: curve.initial,
        });
    }
    points.push(PricePoint {
        offset: curve.duration,
        price: curve.reserve,
    });
    points
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionSummary {
    pub address: Address,
    pub owner: Address,
    pub token: Address,
    pub name: String,
    pub symbol: String,
    pub phase: Phase,
    pub paused: bool,
    pub start_time: u64,
    pub end_time: u64,
    pub current_price: U256,
    pub total_supply: U256,
    pub remaining_supply: U256,
    pub units_sold: U256,
    pub value_raised: U256,
    pub bidders: usize,
    pub clearing_price: Option<U256>,
}

impl DutchAuction {
    pub fn summary(&self, now: u64) -> AuctionSummary {
        AuctionSummary {
            address: self.address(),
            owner: self.owner(),
            token: self.ledger().address(),
            name: self.name().to_owned(),
            symbol: self.symbol().to_owned(),
            phase: self.phase(now),
            paused: self.is_paused(),
            start_time: self.start_time(),
            end_time: self.end_time(),
            current_price: self.current_price(now),
            total_supply: self.total_supply(),
            remaining_supply: self.remaining_supply(),
            units_sold: self.total_units_sold(),
            value_raised: self.total_value_raised(),
            bidders: self.bidder_count(),
            clearing_price: self.clearing_price(),
        }
    }
}

impl AuctionRegistry {
    /// Every auction in creation order.
    pub fn all_auctions(&self) -> Vec<Address> {
        self.auctions.iter().map(|auction| auction.address()).collect()
    }

    /// Auctions accepting bids at `now`.
    pub fn active_auctions(&self, now: u64) -> Vec<Address> {
        self.filter_by_phase(now, |phase| phase == Phase::Active)
    }

    /// Auctions not accepting bids at `now`: never started, or ended.
    pub fn inactive_auctions(&self, now: u64) -> Vec<Address> {
        self.filter_by_phase(now, |phase| phase != Phase::Active)
    }

    pub fn auctions_by_owner(&self, owner: Address) -> Vec<Address> {
        self.by_owner.get(&owner).cloned().unwrap_or_default()
    }

    /// Price points of `auction` at the configured sampling interval.
    pub fn price_schedule(&self, auction: Address) -> Result<Vec<PricePoint>, RegistryError> {
        let auction = self.require_auction(auction)?;
        Ok(price_schedule(
            &auction.curve(),
            self.config().price_schedule_interval,
        ))
    }

    pub fn auction_summary(
        &self,
        auction: Address,
        now: u64,
    ) -> Result<AuctionSummary, RegistryError> {
        Ok(self.require_auction(auction)?.summary(now))
    }

    fn filter_by_phase(&self, now: u64, keep: impl Fn(Phase) -> bool) -> Vec<Address> {
        self.auctions
            .iter()
            .filter(|auction| keep(auction.phase(now)))
            .map(|auction| auction.address())
            .collect()
    }
}
