//! Protocol defaults. Every value here can be overridden through
//! [`RegistryConfig`](crate::config::RegistryConfig).

/// Length of the bidding window, in seconds, measured from `startAuction`.
pub const DEFAULT_AUCTION_DURATION: u64 = 1_200;

/// Bidders settled per `performDue` invocation while distributing.
pub const DEFAULT_DISTRIBUTION_BATCH_SIZE: usize = 50;

/// Spacing, in seconds, of the points returned by `getPriceSchedule`.
pub const DEFAULT_PRICE_SCHEDULE_INTERVAL: u64 = 60;

/// Gas limit requested for each registered upkeep.
pub const DEFAULT_UPKEEP_GAS_LIMIT: u32 = 500_000;
