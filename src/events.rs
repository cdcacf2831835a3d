//! Logs emitted by auctions and the registry.

use alloy_sol_types::sol;

sol! {
    #[derive(Debug, PartialEq, Eq)]
    event AuctionStarted(address indexed auction, uint256 startTime, uint256 endTime);

    #[derive(Debug, PartialEq, Eq)]
    event BidPlaced(
        address indexed bidder,
        uint256 quantity,
        uint256 price,
        uint256 cost,
        uint256 refund
    );

    #[derive(Debug, PartialEq, Eq)]
    event AuctionSettled(uint256 clearingPrice, uint256 unitsSold, uint256 valueRaised);

    #[derive(Debug, PartialEq, Eq)]
    event UnsoldBurned(uint256 amount);

    #[derive(Debug, PartialEq, Eq)]
    event DustBurned(uint256 amount);

    #[derive(Debug, PartialEq, Eq)]
    event TokensClaimed(address indexed bidder, uint256 units, uint256 refund);

    #[derive(Debug, PartialEq, Eq)]
    event DistributionAdvanced(uint256 cursor, uint256 bidders);

    #[derive(Debug, PartialEq, Eq)]
    event DistributionFailed(address indexed bidder, bytes reason);

    #[derive(Debug, PartialEq, Eq)]
    event Paused(address account);

    #[derive(Debug, PartialEq, Eq)]
    event Unpaused(address account);

    #[derive(Debug, PartialEq, Eq)]
    event ProceedsWithdrawn(address indexed to, uint256 amount);

    #[derive(Debug, PartialEq, Eq)]
    event AuctionCreated(
        address indexed auction,
        address indexed creator,
        uint256 id,
        uint256 upkeepId
    );

    #[derive(Debug, PartialEq, Eq)]
    event UpkeepFunded(address indexed auction, uint256 upkeepId, uint256 amount);

    #[derive(Debug, PartialEq, Eq)]
    event FactoryPaused(address account);

    #[derive(Debug, PartialEq, Eq)]
    event FactoryUnpaused(address account);
}
