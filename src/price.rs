//! Linear price decay.

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

/// A unit price falling linearly from `initial` to `reserve` over `duration` seconds.
///
/// The discount is recomputed from the two bounds on every call instead of from a
/// precomputed per-second rate, so the curve reaches `reserve` exactly at the end
/// of the window and never before.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceCurve {
    pub initial: U256,
    pub reserve: U256,
    pub duration: u64,
}

impl PriceCurve {
    pub fn new(initial: U256, reserve: U256, duration: u64) -> Self {
        Self {
            initial,
            reserve,
            duration,
        }
    }

    /// Whether `(initial - reserve) * duration` fits in 256 bits, which makes
    /// [`price_after`](Self::price_after) overflow-free for every elapsed time.
    pub fn is_bounded(&self) -> bool {
        self.initial >= self.reserve
            && (self.initial - self.reserve)
                .checked_mul(U256::from(self.duration))
                .is_some()
    }

    /// Price `elapsed` seconds after the start.
    pub fn price_after(&self, elapsed: u64) -> U256 {
        if elapsed == 0 {
            return self.initial;
        }
        if elapsed >= self.duration {
            return self.reserve;
        }
        let spread = self.initial - self.reserve;
        let discount = spread.saturating_mul(U256::from(elapsed)) / U256::from(self.duration);
        self.initial - discount
    }

    /// Price at `now` for a window opened at `start_time`.
    pub fn price_at(&self, start_time: u64, now: u64) -> U256 {
        self.price_after(now.saturating_sub(start_time))
    }
}
