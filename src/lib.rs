//! Dutch Auction Factory
//!
//! Deploys descending-price token sales and keeps a registry of them:
//! - A fresh fungible token per auction, whole supply minted to the instance
//! - Linear price decay from an initial to a reserve price over a fixed window
//! - Proportional settlement at one clearing price, refunds for the excess
//! - Automation upkeep per auction to close the sale and push payouts

extern crate alloc;

pub mod auction;
pub mod automation;
pub mod config;
pub mod constants;
pub mod errors;
pub mod events;
pub(crate) mod guard;
pub mod host;
pub mod ledger;
pub mod price;
pub mod query;
pub mod registry;

#[cfg(test)]
pub(crate) mod testing;

pub use auction::{
    upkeep::{UpkeepAction, UpkeepPayload},
    AuctionInit, BidReceipt, BidderRecord, ClaimReport, DistributionProgress, DutchAuction, Owed,
    Phase,
};
pub use automation::{AutomationCompatible, AutomationRegistrar, FundingToken, UpkeepRequest};
pub use config::{AuctionParams, RegistryConfig};
pub use errors::{AuctionError, RegistryError};
pub use host::{CallContext, Host};
pub use ledger::{AssetLedger, LedgerDeployer};
pub use price::PriceCurve;
pub use query::{AuctionSummary, PricePoint};
pub use registry::AuctionRegistry;
