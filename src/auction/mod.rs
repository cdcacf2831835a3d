//! A single Dutch auction.
//!
//! The instance owns the price curve, the bid book and the native value paid
//! by bidders. Every state-mutating entry point runs under a per-instance
//! reentrancy guard, finishes its bookkeeping before any outbound transfer,
//! and restores the bookkeeping if that transfer fails.

use std::sync::{atomic::AtomicBool, Arc};

use alloy_primitives::{Address, U256};
use alloy_sol_types::SolEvent;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::{
    config::AuctionParams,
    errors::{
        AuctionAlreadyStarted, AuctionEnded, AuctionError, AuctionNotEnded, AuctionNotPaused,
        AuctionNotStarted, AuctionPaused, BidTooLow, InsufficientSupply, InvalidDuration,
        InvalidMinimumBid, InvalidPriceRange, InvalidQuantity, InvalidSupply, NothingToWithdraw,
        OnlyOwner, PriceNotMet, RefundFailed, ReentrantCall, WithdrawFailed,
    },
    events,
    guard::ReentrancyGuard,
    host::{self, CallContext, Host},
    ledger::AssetLedger,
    price::PriceCurve,
};

mod settlement;
mod state;
pub mod upkeep;

pub use settlement::{ClaimReport, DistributionProgress, Owed};
pub use state::{BidderRecord, Phase};

use state::{AuctionState, BidCheckpoint};

/// Construction inputs supplied by the registry.
#[derive(Debug, Clone)]
pub struct AuctionInit {
    /// Identity of the new instance.
    pub address: Address,
    /// Account allowed to run the administrative operations.
    pub owner: Address,
    /// Identity allowed to call `perform_due`.
    pub automation: Address,
    pub params: AuctionParams,
    pub duration: u64,
    pub distribution_batch_size: usize,
}

/// Outcome of an accepted bid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BidReceipt {
    /// Unit price at the time of the bid.
    pub price: U256,
    /// Value kept by the auction.
    pub cost: U256,
    /// Excess value returned to the bidder.
    pub refund: U256,
}

pub struct DutchAuction {
    address: Address,
    owner: Address,
    automation: Address,
    name: String,
    symbol: String,
    curve: PriceCurve,
    minimum_bid: U256,
    total_supply: U256,
    batch_size: usize,
    ledger: Arc<dyn AssetLedger>,
    host: Arc<dyn Host>,
    state: Mutex<AuctionState>,
    busy: AtomicBool,
}

impl DutchAuction {
    /// Checks sale parameters without touching any ledger and returns the price
    /// curve they describe.
    pub fn validate(params: &AuctionParams, duration: u64) -> Result<PriceCurve, AuctionError> {
        let AuctionParams {
            total_supply,
            initial_price,
            reserve_price,
            minimum_bid,
            ..
        } = *params;

        if total_supply.is_zero() {
            return Err(AuctionError::InvalidSupply(InvalidSupply {}));
        }
        if duration == 0 {
            return Err(AuctionError::InvalidDuration(InvalidDuration {}));
        }
        if reserve_price.is_zero() || initial_price <= reserve_price {
            return Err(AuctionError::InvalidPriceRange(InvalidPriceRange {
                initialPrice: initial_price,
                reservePrice: reserve_price,
            }));
        }
        // A bid worth less than one unit at the reserve can never clear.
        if minimum_bid.is_zero() || minimum_bid > reserve_price {
            return Err(AuctionError::InvalidMinimumBid(InvalidMinimumBid {
                minimumBid: minimum_bid,
                reservePrice: reserve_price,
            }));
        }
        let curve = PriceCurve::new(initial_price, reserve_price, duration);
        if !curve.is_bounded() {
            return Err(AuctionError::overflow());
        }
        Ok(curve)
    }

    /// Validates the sale parameters and mints the whole supply to the new instance.
    pub fn new(
        init: AuctionInit,
        ledger: Arc<dyn AssetLedger>,
        host: Arc<dyn Host>,
    ) -> Result<Self, AuctionError> {
        let curve = Self::validate(&init.params, init.duration)?;
        let AuctionParams {
            name,
            symbol,
            total_supply,
            initial_price,
            reserve_price,
            minimum_bid,
        } = init.params;

        ledger
            .mint(init.address, total_supply)
            .map_err(AuctionError::ledger)?;

        info!(
            auction = %init.address,
            owner = %init.owner,
            %total_supply,
            %initial_price,
            %reserve_price,
            "auction created"
        );

        Ok(Self {
            address: init.address,
            owner: init.owner,
            automation: init.automation,
            name,
            symbol,
            curve,
            minimum_bid,
            total_supply,
            batch_size: init.distribution_batch_size.max(1),
            ledger,
            host,
            state: Mutex::new(AuctionState {
                remaining_supply: total_supply,
                ..Default::default()
            }),
            busy: AtomicBool::new(false),
        })
    }

    /// Opens the bidding window at `ctx.timestamp`.
    pub fn start_auction(&self, ctx: &CallContext) -> Result<(), AuctionError> {
        let _guard = self.enter()?;
        self.only_owner(ctx.sender)?;

        let (start_time, end_time) = {
            let mut state = self.state.lock();
            if state.started() {
                return Err(AuctionError::AuctionAlreadyStarted(AuctionAlreadyStarted {}));
            }
            // Zero is the "not started" sentinel.
            let start_time = ctx.timestamp.max(1);
            let end_time = start_time
                .checked_add(self.curve.duration)
                .ok_or_else(AuctionError::overflow)?;
            state.start_time = start_time;
            state.end_time = end_time;
            (start_time, end_time)
        };

        info!(auction = %self.address, start_time, end_time, "auction started");
        self.emit(events::AuctionStarted {
            auction: self.address,
            startTime: U256::from(start_time),
            endTime: U256::from(end_time),
        });
        Ok(())
    }

    /// Buys `quantity` units at the current price, paying with `ctx.value`.
    ///
    /// The excess over `quantity * price` is refunded once the bid is booked. If the
    /// refund cannot be delivered the bid is unwound and nothing is retained.
    pub fn bid(&self, ctx: &CallContext, quantity: U256) -> Result<BidReceipt, AuctionError> {
        let _guard = self.enter()?;
        let bidder = ctx.sender;
        let now = ctx.timestamp;
        let paid = ctx.value;

        let (receipt, checkpoint) = {
            let mut state = self.state.lock();
            if !state.started() {
                return Err(AuctionError::AuctionNotStarted(AuctionNotStarted {}));
            }
            if state.ended || now >= state.end_time {
                return Err(AuctionError::AuctionEnded(AuctionEnded {}));
            }
            if state.paused {
                return Err(AuctionError::AuctionPaused(AuctionPaused {}));
            }
            if quantity.is_zero() {
                return Err(AuctionError::InvalidQuantity(InvalidQuantity {}));
            }
            if quantity > state.remaining_supply {
                return Err(AuctionError::InsufficientSupply(InsufficientSupply {
                    requested: quantity,
                    remaining: state.remaining_supply,
                }));
            }
            if paid < self.minimum_bid {
                return Err(AuctionError::BidTooLow(BidTooLow {
                    paid,
                    minimum: self.minimum_bid,
                }));
            }

            let price = self.curve.price_at(state.start_time, now);
            let cost = quantity.checked_mul(price).ok_or_else(AuctionError::overflow)?;
            if paid < cost {
                return Err(AuctionError::PriceNotMet(PriceNotMet { paid, cost }));
            }
            let refund = paid - cost;

            let record = state.records.get(&bidder).cloned().unwrap_or_default();
            let contributed = checked_add(record.contributed, cost)?;
            let allocated = checked_add(record.allocated, quantity)?;
            let units_sold = checked_add(state.total_units_sold, quantity)?;
            let value_raised = checked_add(state.total_value_raised, cost)?;
            let balance = checked_add(state.balance, cost)?;

            let checkpoint = BidCheckpoint::capture(&state, bidder);
            state.remaining_supply -= quantity;
            state.total_units_sold = units_sold;
            state.total_value_raised = value_raised;
            state.balance = balance;
            if !state.records.contains_key(&bidder) {
                state.bidders.push(bidder);
            }
            state.records.insert(
                bidder,
                BidderRecord {
                    contributed,
                    allocated,
                    ..record
                },
            );

            (BidReceipt { price, cost, refund }, checkpoint)
        };

        if !receipt.refund.is_zero() {
            if let Err(reason) = self
                .host
                .transfer_value(self.address, bidder, receipt.refund)
            {
                checkpoint.restore(&mut self.state.lock());
                warn!(
                    auction = %self.address,
                    %bidder,
                    refund = %receipt.refund,
                    reason = ?reason,
                    "refund rejected, bid unwound"
                );
                return Err(AuctionError::RefundFailed(RefundFailed {
                    to: bidder,
                    amount: receipt.refund,
                }));
            }
        }

        debug!(
            auction = %self.address,
            %bidder,
            %quantity,
            price = %receipt.price,
            cost = %receipt.cost,
            refund = %receipt.refund,
            "bid accepted"
        );
        self.emit(events::BidPlaced {
            bidder,
            quantity,
            price: receipt.price,
            cost: receipt.cost,
            refund: receipt.refund,
        });
        Ok(receipt)
    }

    /// Manual fallback for the automated end: latches the auction and burns the
    /// unsold supply.
    pub fn end_auction(&self, ctx: &CallContext) -> Result<(), AuctionError> {
        let _guard = self.enter()?;
        self.only_owner(ctx.sender)?;
        self.latch(ctx.timestamp)
    }

    /// Freezes bid admission. Accounting, claims and settlement are unaffected.
    pub fn pause(&self, ctx: &CallContext) -> Result<(), AuctionError> {
        let _guard = self.enter()?;
        self.only_owner(ctx.sender)?;
        {
            let mut state = self.state.lock();
            if state.paused {
                return Err(AuctionError::AuctionPaused(AuctionPaused {}));
            }
            state.paused = true;
        }
        info!(auction = %self.address, "auction paused");
        self.emit(events::Paused {
            account: ctx.sender,
        });
        Ok(())
    }

    pub fn unpause(&self, ctx: &CallContext) -> Result<(), AuctionError> {
        let _guard = self.enter()?;
        self.only_owner(ctx.sender)?;
        {
            let mut state = self.state.lock();
            if !state.paused {
                return Err(AuctionError::AuctionNotPaused(AuctionNotPaused {}));
            }
            state.paused = false;
        }
        info!(auction = %self.address, "auction unpaused");
        self.emit(events::Unpaused {
            account: ctx.sender,
        });
        Ok(())
    }

    /// Sends the owner every collected unit of value that is not reserved for a
    /// pending bidder refund. Returns the amount sent.
    pub fn withdraw(&self, ctx: &CallContext) -> Result<U256, AuctionError> {
        let _guard = self.enter()?;
        self.only_owner(ctx.sender)?;

        let amount = {
            let mut state = self.state.lock();
            if !state.ended {
                return Err(AuctionError::AuctionNotEnded(AuctionNotEnded {}));
            }
            let amount = state.withdrawable();
            if amount.is_zero() {
                return Err(AuctionError::NothingToWithdraw(NothingToWithdraw {}));
            }
            state.balance -= amount;
            state.withdrawn += amount;
            amount
        };

        if let Err(reason) = self.host.transfer_value(self.address, self.owner, amount) {
            let mut state = self.state.lock();
            state.balance += amount;
            state.withdrawn -= amount;
            warn!(auction = %self.address, %amount, reason = ?reason, "withdrawal rejected");
            return Err(AuctionError::WithdrawFailed(WithdrawFailed {
                to: self.owner,
                amount,
            }));
        }

        info!(auction = %self.address, %amount, "proceeds withdrawn");
        self.emit(events::ProceedsWithdrawn {
            to: self.owner,
            amount,
        });
        Ok(amount)
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn automation(&self) -> Address {
        self.automation
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn ledger(&self) -> &Arc<dyn AssetLedger> {
        &self.ledger
    }

    pub fn curve(&self) -> PriceCurve {
        self.curve
    }

    pub fn minimum_bid(&self) -> U256 {
        self.minimum_bid
    }

    pub fn total_supply(&self) -> U256 {
        self.total_supply
    }

    pub fn start_time(&self) -> u64 {
        self.state.lock().start_time
    }

    pub fn end_time(&self) -> u64 {
        self.state.lock().end_time
    }

    /// Whether the one-way end latch has closed.
    pub fn is_ended(&self) -> bool {
        self.state.lock().ended
    }

    pub fn is_paused(&self) -> bool {
        self.state.lock().paused
    }

    pub fn phase(&self, now: u64) -> Phase {
        self.state.lock().phase(now)
    }

    /// Unit price at `now`; the initial price until the auction starts.
    pub fn current_price(&self, now: u64) -> U256 {
        let state = self.state.lock();
        if !state.started() {
            return self.curve.initial;
        }
        self.curve.price_at(state.start_time, now)
    }

    pub fn remaining_supply(&self) -> U256 {
        self.state.lock().remaining_supply
    }

    pub fn total_units_sold(&self) -> U256 {
        self.state.lock().total_units_sold
    }

    pub fn total_value_raised(&self) -> U256 {
        self.state.lock().total_value_raised
    }

    /// Native value currently held.
    pub fn balance(&self) -> U256 {
        self.state.lock().balance
    }

    pub fn withdrawable(&self) -> U256 {
        self.state.lock().withdrawable()
    }

    pub fn clearing_price(&self) -> Option<U256> {
        self.state.lock().clearing_price
    }

    pub fn bidder(&self, bidder: Address) -> Option<BidderRecord> {
        self.state.lock().records.get(&bidder).cloned()
    }

    /// Bidders in first-bid order.
    pub fn bidders(&self) -> Vec<Address> {
        self.state.lock().bidders.clone()
    }

    pub fn bidder_count(&self) -> usize {
        self.state.lock().bidders.len()
    }

    pub fn distribution_cursor(&self) -> usize {
        self.state.lock().distribution_cursor
    }

    fn enter(&self) -> Result<ReentrancyGuard<'_>, AuctionError> {
        ReentrancyGuard::enter(&self.busy)
            .ok_or(AuctionError::ReentrantCall(ReentrantCall {}))
    }

    fn only_owner(&self, caller: Address) -> Result<(), AuctionError> {
        if caller != self.owner {
            return Err(AuctionError::OnlyOwner(OnlyOwner { caller }));
        }
        Ok(())
    }

    fn emit<E: SolEvent>(&self, event: E) {
        host::log(self.host.as_ref(), self.address, event);
    }
}

fn checked_add(a: U256, b: U256) -> Result<U256, AuctionError> {
    a.checked_add(b).ok_or_else(AuctionError::overflow)
}
