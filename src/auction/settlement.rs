//! End latch, proportional clearing and payout.
//!
//! Settlement prices every unit sold at one clearing price,
//! `max(reserve, floor(valueRaised / unitsSold))`, and hands each bidder a share
//! of the units sold proportional to the value they contributed. Whatever a
//! bidder's contribution does not buy at the clearing price is refunded.
//!
//! Payout to a bidder has two legs, the asset delivery and the value refund, each
//! latched exactly once. Either leg may be completed by the bidder (`claim`), by a
//! third party on the bidder's behalf (`claim_many`), or by batched distribution.

use alloy_primitives::{Address, U256, U512};
use tracing::{debug, info, warn};

use super::{state::AuctionState, BidderRecord, DutchAuction};
use crate::{
    errors::{
        AssetTransferFailed, AuctionAlreadyEnded, AuctionError, AuctionNotEnded,
        AuctionNotStarted, NothingToClaim, RefundFailed,
    },
    events,
    host::CallContext,
};

/// What a bidder receives at the clearing price.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Owed {
    pub units: U256,
    /// `units * clearingPrice`, kept by the auction.
    pub cost: U256,
    /// `contributed - cost`, returned to the bidder.
    pub refund: U256,
}

/// Result of [`DutchAuction::claim_many`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimReport {
    pub settled: Vec<(Address, Owed)>,
    /// Entries with nothing to claim or whose payout was rejected.
    pub skipped: Vec<Address>,
}

/// Position of batched distribution after one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DistributionProgress {
    pub cursor: usize,
    pub bidders: usize,
    /// Bidders in this batch whose payout was rejected.
    pub failed: usize,
    pub complete: bool,
}

/// Single clearing price for all units sold.
pub fn clearing_price(reserve: U256, value_raised: U256, units_sold: U256) -> U256 {
    if units_sold.is_zero() {
        return reserve;
    }
    (value_raised / units_sold).max(reserve)
}

/// Units and refund owed for `contributed` once the auction cleared at `clearing`.
pub fn owed_for(contributed: U256, value_raised: U256, units_sold: U256, clearing: U256) -> Owed {
    if contributed.is_zero() || value_raised.is_zero() || clearing.is_zero() {
        return Owed {
            refund: contributed,
            ..Default::default()
        };
    }
    let affordable = contributed / clearing;
    let scaled: U512 = contributed.widening_mul(units_sold);
    let proportional = U256::saturating_from(scaled / U512::from(value_raised));
    let units = proportional.min(affordable);
    let cost = units * clearing;
    Owed {
        units,
        cost,
        refund: contributed - cost,
    }
}

impl AuctionState {
    fn owed(&self, record: &BidderRecord, reserve: U256) -> Owed {
        owed_for(
            record.contributed,
            self.total_value_raised,
            self.total_units_sold,
            self.clearing_price.unwrap_or(reserve),
        )
    }
}

/// Legs of a bidder's payout taken by one settlement attempt.
#[derive(Debug, Clone, Copy)]
struct Legs {
    owed: Owed,
    contributed: U256,
    deliver: bool,
    pay: bool,
}

impl DutchAuction {
    /// Pulls the caller's units and refund.
    pub fn claim(&self, ctx: &CallContext) -> Result<Owed, AuctionError> {
        let _guard = self.enter()?;
        self.settle_bidder(ctx.sender)
    }

    /// Settles each listed bidder, skipping entries that have nothing to claim or
    /// whose payout is rejected.
    pub fn claim_many(
        &self,
        _ctx: &CallContext,
        bidders: &[Address],
    ) -> Result<ClaimReport, AuctionError> {
        let _guard = self.enter()?;
        if !self.state.lock().ended {
            return Err(AuctionError::AuctionNotEnded(AuctionNotEnded {}));
        }

        let mut report = ClaimReport::default();
        for &bidder in bidders {
            match self.settle_bidder(bidder) {
                Ok(owed) => report.settled.push((bidder, owed)),
                Err(AuctionError::NothingToClaim(_)) => report.skipped.push(bidder),
                Err(err) => {
                    self.report_failed_payout(bidder, err);
                    report.skipped.push(bidder);
                }
            }
        }
        Ok(report)
    }

    /// Units and refund `bidder` receives, once the auction has latched.
    pub fn owed(&self, bidder: Address) -> Option<Owed> {
        let state = self.state.lock();
        if !state.ended {
            return None;
        }
        let record = state.records.get(&bidder)?;
        Some(state.owed(record, self.curve.reserve))
    }

    /// Closes the one-way end latch, fixes the clearing price and burns the unsold
    /// supply. The caller holds the reentrancy guard.
    pub(crate) fn latch(&self, now: u64) -> Result<(), AuctionError> {
        let (clearing, units_sold, value_raised, unsold) = {
            let mut state = self.state.lock();
            if !state.started() {
                return Err(AuctionError::AuctionNotStarted(AuctionNotStarted {}));
            }
            if state.ended {
                return Err(AuctionError::AuctionAlreadyEnded(AuctionAlreadyEnded {}));
            }
            if !state.end_condition_met(now) {
                return Err(AuctionError::AuctionNotEnded(AuctionNotEnded {}));
            }
            let clearing = clearing_price(
                self.curve.reserve,
                state.total_value_raised,
                state.total_units_sold,
            );
            state.ended = true;
            state.clearing_price = Some(clearing);
            state.unsettled_contributions = state.total_value_raised;
            state.dust_settled = state.bidders.is_empty();
            (
                clearing,
                state.total_units_sold,
                state.total_value_raised,
                state.remaining_supply,
            )
        };

        if !unsold.is_zero() {
            if let Err(reason) = self.ledger.burn(unsold) {
                let mut state = self.state.lock();
                state.ended = false;
                state.clearing_price = None;
                state.unsettled_contributions = U256::ZERO;
                state.dust_settled = false;
                warn!(auction = %self.address, %unsold, "burn of unsold supply rejected");
                return Err(AuctionError::ledger(reason));
            }
        }

        info!(
            auction = %self.address,
            clearing_price = %clearing,
            %units_sold,
            %value_raised,
            %unsold,
            "auction settled"
        );
        self.emit(events::AuctionSettled {
            clearingPrice: clearing,
            unitsSold: units_sold,
            valueRaised: value_raised,
        });
        if !unsold.is_zero() {
            self.emit(events::UnsoldBurned { amount: unsold });
        }
        Ok(())
    }

    /// Settles the next batch of bidders after the latch and, once the cursor has
    /// passed every bidder, burns the rounding remainder. The caller holds the
    /// reentrancy guard.
    pub(crate) fn distribute_batch(&self) -> DistributionProgress {
        let (start, end) = {
            let state = self.state.lock();
            let start = state.distribution_cursor;
            (start, (start + self.batch_size).min(state.bidders.len()))
        };

        let mut failed = 0;
        for index in start..end {
            let bidder = {
                let mut state = self.state.lock();
                let bidder = state.bidders[index];
                let units = state
                    .records
                    .get(&bidder)
                    .map(|record| state.owed(record, self.curve.reserve).units)
                    .unwrap_or_default();
                state.owed_units_visited += units;
                state.distribution_cursor = index + 1;
                bidder
            };
            match self.settle_bidder(bidder) {
                Ok(_) | Err(AuctionError::NothingToClaim(_)) => {}
                Err(err) => {
                    failed += 1;
                    self.report_failed_payout(bidder, err);
                }
            }
        }

        let (cursor, bidders) = {
            let state = self.state.lock();
            (state.distribution_cursor, state.bidders.len())
        };
        if cursor == bidders {
            self.burn_dust();
        }
        self.emit(events::DistributionAdvanced {
            cursor: U256::from(cursor),
            bidders: U256::from(bidders),
        });

        let complete = !self.state.lock().distribution_pending();
        debug!(auction = %self.address, cursor, bidders, failed, complete, "distribution advanced");
        DistributionProgress {
            cursor,
            bidders,
            failed,
            complete,
        }
    }

    fn burn_dust(&self) {
        let dust = {
            let state = self.state.lock();
            if state.dust_settled {
                return;
            }
            state.total_units_sold.saturating_sub(state.owed_units_visited)
        };
        if !dust.is_zero() {
            if let Err(reason) = self.ledger.burn(dust) {
                warn!(auction = %self.address, %dust, reason = ?reason, "burn of rounding remainder rejected");
                return;
            }
            self.emit(events::DustBurned { amount: dust });
        }
        self.state.lock().dust_settled = true;
    }

    /// Pays out whichever legs of `bidder`'s settlement are still open. A rejected
    /// leg is reopened; a leg that went through stays closed.
    fn settle_bidder(&self, bidder: Address) -> Result<Owed, AuctionError> {
        let legs = {
            let mut state = self.state.lock();
            if !state.ended {
                return Err(AuctionError::AuctionNotEnded(AuctionNotEnded {}));
            }
            let reserve = self.curve.reserve;
            let (owed, contributed, deliver, pay) = match state.records.get(&bidder) {
                Some(record) if !record.claimed() && !record.contributed.is_zero() => (
                    state.owed(record, reserve),
                    record.contributed,
                    !record.units_delivered,
                    !record.refund_paid,
                ),
                _ => return Err(AuctionError::NothingToClaim(NothingToClaim { bidder })),
            };
            let legs = Legs {
                owed,
                contributed,
                deliver,
                pay,
            };
            apply_legs(&mut state, bidder, legs);
            legs
        };

        if legs.deliver && !legs.owed.units.is_zero() {
            if let Err(reason) = self.ledger.transfer(bidder, legs.owed.units) {
                revert_legs(&mut self.state.lock(), bidder, legs);
                warn!(auction = %self.address, %bidder, reason = ?reason, "asset delivery rejected");
                return Err(AuctionError::AssetTransferFailed(AssetTransferFailed {
                    to: bidder,
                    amount: legs.owed.units,
                }));
            }
        }

        if legs.pay && !legs.owed.refund.is_zero() {
            if let Err(reason) = self
                .host
                .transfer_value(self.address, bidder, legs.owed.refund)
            {
                revert_legs(
                    &mut self.state.lock(),
                    bidder,
                    Legs {
                        deliver: false,
                        ..legs
                    },
                );
                warn!(auction = %self.address, %bidder, reason = ?reason, "refund rejected");
                // The delivery went through and stays closed.
                if legs.deliver && !legs.owed.units.is_zero() {
                    self.emit(events::TokensClaimed {
                        bidder,
                        units: legs.owed.units,
                        refund: U256::ZERO,
                    });
                }
                return Err(AuctionError::RefundFailed(RefundFailed {
                    to: bidder,
                    amount: legs.owed.refund,
                }));
            }
        }

        let units = if legs.deliver { legs.owed.units } else { U256::ZERO };
        let refund = if legs.pay { legs.owed.refund } else { U256::ZERO };
        debug!(auction = %self.address, %bidder, %units, %refund, "bidder settled");
        self.emit(events::TokensClaimed {
            bidder,
            units,
            refund,
        });
        Ok(legs.owed)
    }

    fn report_failed_payout(&self, bidder: Address, err: AuctionError) {
        warn!(auction = %self.address, %bidder, error = ?err, "payout skipped");
        self.emit(events::DistributionFailed {
            bidder,
            reason: Vec::<u8>::from(err).into(),
        });
    }
}

fn apply_legs(state: &mut AuctionState, bidder: Address, legs: Legs) {
    if legs.deliver {
        state.units_delivered += legs.owed.units;
    }
    if legs.pay {
        state.unsettled_contributions -= legs.contributed;
        state.balance -= legs.owed.refund;
    }
    if let Some(record) = state.records.get_mut(&bidder) {
        record.units_delivered |= legs.deliver;
        record.refund_paid |= legs.pay;
    }
}

fn revert_legs(state: &mut AuctionState, bidder: Address, legs: Legs) {
    if legs.deliver {
        state.units_delivered -= legs.owed.units;
    }
    if legs.pay {
        state.unsettled_contributions += legs.contributed;
        state.balance += legs.owed.refund;
    }
    if let Some(record) = state.records.get_mut(&bidder) {
        if legs.deliver {
            record.units_delivered = false;
        }
        if legs.pay {
            record.refund_paid = false;
        }
    }
}
