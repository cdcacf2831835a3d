//! Revert reasons for the auction engine and the registry.
//!
//! Each failure is a Solidity custom error so it ABI-encodes into the same
//! revert bytes a front-end would decode from an on-chain call.

use alloy_sol_types::sol;
use stylus_sdk::prelude::SolidityError;

sol! {
    #[derive(Debug, PartialEq, Eq)]
    error AuctionNotStarted();
    #[derive(Debug, PartialEq, Eq)]
    error AuctionEnded();
    #[derive(Debug, PartialEq, Eq)]
    error AuctionAlreadyStarted();
    #[derive(Debug, PartialEq, Eq)]
    error AuctionAlreadyEnded();
    #[derive(Debug, PartialEq, Eq)]
    error AuctionNotEnded();
    #[derive(Debug, PartialEq, Eq)]
    error AuctionPaused();
    #[derive(Debug, PartialEq, Eq)]
    error AuctionNotPaused();

    #[derive(Debug, PartialEq, Eq)]
    error InvalidQuantity();
    #[derive(Debug, PartialEq, Eq)]
    error InsufficientSupply(uint256 requested, uint256 remaining);
    #[derive(Debug, PartialEq, Eq)]
    error BidTooLow(uint256 paid, uint256 minimum);
    #[derive(Debug, PartialEq, Eq)]
    error PriceNotMet(uint256 paid, uint256 cost);

    #[derive(Debug, PartialEq, Eq)]
    error NothingToClaim(address bidder);
    #[derive(Debug, PartialEq, Eq)]
    error NothingToWithdraw();

    #[derive(Debug, PartialEq, Eq)]
    error OnlyOwner(address caller);
    #[derive(Debug, PartialEq, Eq)]
    error OnlyAutomation(address caller);
    #[derive(Debug, PartialEq, Eq)]
    error ReentrantCall();

    #[derive(Debug, PartialEq, Eq)]
    error RefundFailed(address to, uint256 amount);
    #[derive(Debug, PartialEq, Eq)]
    error AssetTransferFailed(address to, uint256 amount);
    #[derive(Debug, PartialEq, Eq)]
    error WithdrawFailed(address to, uint256 amount);
    #[derive(Debug, PartialEq, Eq)]
    error LedgerFailure(bytes reason);

    #[derive(Debug, PartialEq, Eq)]
    error InvalidPriceRange(uint256 initialPrice, uint256 reservePrice);
    #[derive(Debug, PartialEq, Eq)]
    error InvalidMinimumBid(uint256 minimumBid, uint256 reservePrice);
    #[derive(Debug, PartialEq, Eq)]
    error InvalidSupply();
    #[derive(Debug, PartialEq, Eq)]
    error InvalidDuration();
    #[derive(Debug, PartialEq, Eq)]
    error ArithmeticOverflow();

    #[derive(Debug, PartialEq, Eq)]
    error FactoryPaused();
    #[derive(Debug, PartialEq, Eq)]
    error OnlyFactoryOwner(address caller);
    #[derive(Debug, PartialEq, Eq)]
    error UnknownAuction(address auction);
    #[derive(Debug, PartialEq, Eq)]
    error InvalidConfig(string reason);
    #[derive(Debug, PartialEq, Eq)]
    error LedgerDeploymentFailed(bytes reason);
    #[derive(Debug, PartialEq, Eq)]
    error UpkeepFundingFailed(bytes reason);
    #[derive(Debug, PartialEq, Eq)]
    error UpkeepRegistrationFailed(bytes reason);
    #[derive(Debug, PartialEq, Eq)]
    error UpkeepCancellationFailed(uint256 upkeepId, bytes reason);
    #[derive(Debug, PartialEq, Eq)]
    error FundingReturnFailed(address to, uint256 amount, bytes reason);
    #[derive(Debug, PartialEq, Eq)]
    error AuctionRejected(bytes reason);
}

/// Failures raised by a single auction instance.
#[derive(SolidityError, Debug, PartialEq, Eq)]
pub enum AuctionError {
    AuctionNotStarted(AuctionNotStarted),
    AuctionEnded(AuctionEnded),
    AuctionAlreadyStarted(AuctionAlreadyStarted),
    AuctionAlreadyEnded(AuctionAlreadyEnded),
    AuctionNotEnded(AuctionNotEnded),
    AuctionPaused(AuctionPaused),
    AuctionNotPaused(AuctionNotPaused),
    InvalidQuantity(InvalidQuantity),
    InsufficientSupply(InsufficientSupply),
    BidTooLow(BidTooLow),
    PriceNotMet(PriceNotMet),
    NothingToClaim(NothingToClaim),
    NothingToWithdraw(NothingToWithdraw),
    OnlyOwner(OnlyOwner),
    OnlyAutomation(OnlyAutomation),
    ReentrantCall(ReentrantCall),
    RefundFailed(RefundFailed),
    AssetTransferFailed(AssetTransferFailed),
    WithdrawFailed(WithdrawFailed),
    LedgerFailure(LedgerFailure),
    InvalidPriceRange(InvalidPriceRange),
    InvalidMinimumBid(InvalidMinimumBid),
    InvalidSupply(InvalidSupply),
    InvalidDuration(InvalidDuration),
    ArithmeticOverflow(ArithmeticOverflow),
}

/// Failures raised by the auction registry.
#[derive(SolidityError, Debug, PartialEq, Eq)]
pub enum RegistryError {
    FactoryPaused(FactoryPaused),
    OnlyFactoryOwner(OnlyFactoryOwner),
    UnknownAuction(UnknownAuction),
    InvalidConfig(InvalidConfig),
    LedgerDeploymentFailed(LedgerDeploymentFailed),
    UpkeepFundingFailed(UpkeepFundingFailed),
    UpkeepRegistrationFailed(UpkeepRegistrationFailed),
    UpkeepCancellationFailed(UpkeepCancellationFailed),
    FundingReturnFailed(FundingReturnFailed),
    AuctionRejected(AuctionRejected),
}

impl AuctionError {
    pub(crate) fn overflow() -> Self {
        AuctionError::ArithmeticOverflow(ArithmeticOverflow {})
    }

    pub(crate) fn ledger(reason: Vec<u8>) -> Self {
        AuctionError::LedgerFailure(LedgerFailure {
            reason: reason.into(),
        })
    }
}

impl From<AuctionError> for RegistryError {
    fn from(err: AuctionError) -> Self {
        RegistryError::AuctionRejected(AuctionRejected {
            reason: Vec::<u8>::from(err).into(),
        })
    }
}
