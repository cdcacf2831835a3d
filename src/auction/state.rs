//! Mutable bookkeeping of one auction.

use std::collections::HashMap;

use alloy_primitives::{Address, U256};
use serde::Serialize;

/// Per-bidder accounting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BidderRecord {
    /// Value paid for accepted bids, excess already refunded.
    pub contributed: U256,
    /// Units requested across accepted bids.
    pub allocated: U256,
    /// Asset leg of the claim has been delivered.
    pub units_delivered: bool,
    /// Value leg of the claim has been paid.
    pub refund_paid: bool,
}

impl BidderRecord {
    /// Both legs of the claim are settled.
    pub fn claimed(&self) -> bool {
        self.units_delivered && self.refund_paid
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    /// Created, not started; bids are rejected.
    Pending,
    /// Started and inside the bidding window.
    Active,
    /// Latched, or the bidding window has elapsed.
    Ended,
}

#[derive(Debug, Default)]
pub(crate) struct AuctionState {
    pub start_time: u64,
    pub end_time: u64,
    pub ended: bool,
    pub paused: bool,

    pub remaining_supply: U256,
    pub total_units_sold: U256,
    pub total_value_raised: U256,

    pub bidders: Vec<Address>,
    pub records: HashMap<Address, BidderRecord>,

    /// Native value held by the instance.
    pub balance: U256,
    /// Set once at the latch.
    pub clearing_price: Option<U256>,
    /// Contributions of bidders whose refund leg has not been paid yet.
    pub unsettled_contributions: U256,
    pub withdrawn: U256,

    /// Next bidder index visited by batched distribution.
    pub distribution_cursor: usize,
    /// Units owed to the bidders the cursor has passed.
    pub owed_units_visited: U256,
    /// The rounding remainder has been burned, or there was none to burn.
    pub dust_settled: bool,
    pub units_delivered: U256,
}

impl AuctionState {
    pub fn started(&self) -> bool {
        self.start_time != 0
    }

    pub fn phase(&self, now: u64) -> Phase {
        if !self.started() {
            Phase::Pending
        } else if self.ended || now >= self.end_time {
            Phase::Ended
        } else {
            Phase::Active
        }
    }

    /// The latch may close: the window elapsed or nothing is left to sell.
    pub fn end_condition_met(&self, now: u64) -> bool {
        now >= self.end_time || self.remaining_supply.is_zero()
    }

    pub fn distribution_pending(&self) -> bool {
        self.ended && (self.distribution_cursor < self.bidders.len() || !self.dust_settled)
    }

    /// Value the owner may take without touching unpaid refunds.
    pub fn withdrawable(&self) -> U256 {
        if !self.ended {
            return U256::ZERO;
        }
        self.balance.saturating_sub(self.unsettled_contributions)
    }
}

/// Aggregates captured before a bid is booked, restored if its refund fails.
#[derive(Debug)]
pub(crate) struct BidCheckpoint {
    bidder: Address,
    record: Option<BidderRecord>,
    remaining_supply: U256,
    total_units_sold: U256,
    total_value_raised: U256,
    balance: U256,
}

impl BidCheckpoint {
    pub fn capture(state: &AuctionState, bidder: Address) -> Self {
        Self {
            bidder,
            record: state.records.get(&bidder).cloned(),
            remaining_supply: state.remaining_supply,
            total_units_sold: state.total_units_sold,
            total_value_raised: state.total_value_raised,
            balance: state.balance,
        }
    }

    pub fn restore(self, state: &mut AuctionState) {
        state.remaining_supply = self.remaining_supply;
        state.total_units_sold = self.total_units_sold;
        state.total_value_raised = self.total_value_raised;
        state.balance = self.balance;
        match self.record {
            Some(record) => {
                state.records.insert(self.bidder, record);
            }
            None => {
                state.records.remove(&self.bidder);
                if state.bidders.last() == Some(&self.bidder) {
                    state.bidders.pop();
                }
            }
        }
    }
}
