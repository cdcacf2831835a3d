//! Autonomous lifecycle advancement driven by the automation network.
//!
//! `check_due` reports one of four states. `EndDue` and `DistributionDue` mean
//! `perform_due` has work: closing the end latch, or settling the next batch of
//! bidders. Both are re-derived from live state inside `perform_due`; the
//! caller-supplied payload is only compared against it for diagnostics.

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{sol, SolValue};
use tracing::debug;

use crate::{
    auction::DutchAuction,
    automation::AutomationCompatible,
    errors::{AuctionError, OnlyAutomation},
};

sol! {
    /// Hint passed from `check_due` to `perform_due`.
    #[derive(Debug, PartialEq, Eq)]
    struct UpkeepPayload {
        uint8 action;
        uint256 cursor;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum UpkeepAction {
    /// Not started, or still inside the bidding window with supply left.
    Idle = 0,
    EndDue = 1,
    DistributionDue = 2,
    /// Latched and every bidder has been visited.
    Done = 3,
}

impl UpkeepAction {
    pub fn is_due(self) -> bool {
        matches!(self, UpkeepAction::EndDue | UpkeepAction::DistributionDue)
    }

    fn from_u8(value: u8) -> Option<Self> {
        Some(match value {
            0 => UpkeepAction::Idle,
            1 => UpkeepAction::EndDue,
            2 => UpkeepAction::DistributionDue,
            3 => UpkeepAction::Done,
            _ => return None,
        })
    }
}

impl UpkeepPayload {
    /// Decodes a `perform_due` payload, if it is well-formed.
    pub fn decode(data: &[u8]) -> Option<(UpkeepAction, U256)> {
        let payload = <UpkeepPayload as SolValue>::abi_decode(data, true).ok()?;
        Some((UpkeepAction::from_u8(payload.action)?, payload.cursor))
    }
}

impl DutchAuction {
    /// Work the automation network should perform at `now`.
    pub fn upkeep_action(&self, now: u64) -> UpkeepAction {
        let state = self.state.lock();
        if !state.started() {
            UpkeepAction::Idle
        } else if !state.ended {
            if state.end_condition_met(now) {
                UpkeepAction::EndDue
            } else {
                UpkeepAction::Idle
            }
        } else if state.distribution_pending() {
            UpkeepAction::DistributionDue
        } else {
            UpkeepAction::Done
        }
    }
}

impl AutomationCompatible for DutchAuction {
    type Error = AuctionError;

    fn check_due(&self, now: u64, _check_data: &[u8]) -> (bool, Bytes) {
        let action = self.upkeep_action(now);
        let payload = UpkeepPayload {
            action: action as u8,
            cursor: U256::from(self.distribution_cursor()),
        };
        (action.is_due(), payload.abi_encode().into())
    }

    fn perform_due(
        &self,
        caller: Address,
        now: u64,
        perform_data: &[u8],
    ) -> Result<(), AuctionError> {
        let _guard = self.enter()?;
        if caller != self.automation {
            return Err(AuctionError::OnlyAutomation(OnlyAutomation { caller }));
        }

        let action = self.upkeep_action(now);
        let hint = UpkeepPayload::decode(perform_data);
        if hint.map(|(hinted, _)| hinted) != Some(action) {
            debug!(auction = %self.address, ?action, ?hint, "perform payload is stale");
        }

        match action {
            UpkeepAction::EndDue => self.latch(now),
            UpkeepAction::DistributionDue => {
                self.distribute_batch();
                Ok(())
            }
            UpkeepAction::Idle | UpkeepAction::Done => Ok(()),
        }
    }
}
