//! Interfaces shared with the external automation network.
//!
//! The network periodically calls `check_due` off-chain and, when it reports work,
//! submits `perform_due` from its forwarder. Upkeeps are paid for in a separate
//! funding token that the registry pre-deposits on behalf of each auction.

use alloy_primitives::{Address, Bytes, U256};

/// Check-then-act surface polled by the automation network.
pub trait AutomationCompatible {
    type Error;

    /// Read-only. Returns whether `perform_due` has work and a resumption hint.
    fn check_due(&self, now: u64, check_data: &[u8]) -> (bool, Bytes);

    /// Performs the due work. `perform_data` is only a hint and is never trusted.
    fn perform_due(
        &self,
        caller: Address,
        now: u64,
        perform_data: &[u8],
    ) -> Result<(), Self::Error>;
}

/// Registration request sent to the automation registrar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpkeepRequest {
    pub name: String,
    /// Contract whose `check_due`/`perform_due` is invoked.
    pub target: Address,
    pub gas_limit: u32,
    /// Account allowed to manage the upkeep on the registrar.
    pub admin: Address,
    /// Funding token amount deposited as the initial budget.
    pub amount: U256,
}

pub trait AutomationRegistrar: Send + Sync {
    fn address(&self) -> Address;

    /// Registers an upkeep and pulls `request.amount` of the funding token from the
    /// caller's allowance. Returns the upkeep id.
    fn register_upkeep(&self, caller: Address, request: &UpkeepRequest) -> Result<U256, Vec<u8>>;

    /// Adds `amount` to the upkeep's budget, pulled from the caller's allowance.
    fn add_funds(&self, caller: Address, upkeep_id: U256, amount: U256) -> Result<(), Vec<u8>>;

    /// Cancels the upkeep and returns its remaining budget to the caller. Returns
    /// the amount returned.
    fn cancel_upkeep(&self, caller: Address, upkeep_id: U256) -> Result<U256, Vec<u8>>;
}

/// The token used to pay for automation.
pub trait FundingToken: Send + Sync {
    fn transfer_from(
        &self,
        spender: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), Vec<u8>>;

    fn transfer(&self, from: Address, to: Address, amount: U256) -> Result<(), Vec<u8>>;

    fn approve(&self, owner: Address, spender: Address, amount: U256) -> Result<(), Vec<u8>>;

    fn balance_of(&self, owner: Address) -> U256;
}
