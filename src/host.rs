//! Execution context and host capabilities.
//!
//! An auction never reaches for globals: the caller identity, block time and
//! attached value arrive in a [`CallContext`], and everything that leaves the
//! instance (native value, logs) goes through an injected [`Host`].

use alloy_primitives::{Address, LogData, U256};
use alloy_sol_types::SolEvent;

/// Per-call environment, the equivalent of `msg` and `block`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    /// Caller of the operation.
    pub sender: Address,
    /// Block timestamp, in seconds.
    pub timestamp: u64,
    /// Native value attached to the call.
    pub value: U256,
}

impl CallContext {
    pub fn new(sender: Address, timestamp: u64) -> Self {
        Self {
            sender,
            timestamp,
            value: U256::ZERO,
        }
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }
}

/// Outbound effects of an auction or registry.
///
/// `transfer_value` may run arbitrary recipient code before it returns, including
/// calls back into the instance that issued the transfer.
pub trait Host: Send + Sync {
    /// Sends native value held by `from` to `to`. An `Err` carries the recipient's
    /// revert data.
    fn transfer_value(&self, from: Address, to: Address, amount: U256) -> Result<(), Vec<u8>>;

    /// Appends a log emitted by `emitter`.
    fn emit_log(&self, emitter: Address, log: LogData);
}

/// Encodes `event` and hands it to the host.
pub fn log<E: SolEvent>(host: &dyn Host, emitter: Address, event: E) {
    host.emit_log(emitter, event.encode_log_data());
}
