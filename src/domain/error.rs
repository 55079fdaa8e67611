//! Error taxonomy for the settlement engine and its collaborators.
//!
//! Every failure aborts the whole session. `ErrorClass` groups the
//! variants so callers can tell "nothing to do" (economic) apart from
//! misconfiguration or a venue-side rejection.

use alloy::primitives::{Address, I256, U256};
use thiserror::Error;

use super::route::{AssetId, Route};

/// Broad category of an engine failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Missing or invalid route, uncovered asset.
    Configuration,
    /// The opportunity did not pay: not a defect.
    Economic,
    /// Non-operator admin call or a foreign session callback.
    Authorization,
    /// Venue, yield source or token failure propagated as an abort.
    Venue,
    /// Bad input or arithmetic fault.
    Input,
}

impl ErrorClass {
    /// Stable label used for metrics and logs.
    pub fn label(self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::Economic => "no_profit",
            Self::Authorization => "unauthorized",
            Self::Venue => "venue",
            Self::Input => "input",
        }
    }
}

/// Constant-product pool math failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error("swap amount cannot be zero")]
    ZeroAmount,
    #[error("fee {0} pips is not below 100%")]
    InvalidFee(u32),
    #[error("insufficient liquidity: requested {requested}, reserve {reserve}")]
    InsufficientLiquidity { requested: U256, reserve: U256 },
    #[error("pool arithmetic overflow")]
    Overflow,
}

/// Position ledger failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("position overflow for {participant} in {asset}")]
    Overflow { participant: Address, asset: AssetId },
}

/// Real-balance transfer failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("insufficient {asset} balance for {holder}: have {available}, need {required}")]
    InsufficientBalance {
        asset: AssetId,
        holder: Address,
        available: U256,
        required: U256,
    },
    #[error("balance overflow for {holder} in {asset}")]
    Overflow { asset: AssetId, holder: Address },
}

/// Failures raised by the venue.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VenueError {
    #[error("no pool registered for route {0}")]
    UnknownRoute(Route),
    #[error("price limit exceeded on {route}: price {price} beyond limit {limit}")]
    PriceLimitExceeded { route: Route, price: U256, limit: U256 },
    #[error("session closed with unsettled position in {asset}: {position}")]
    UnsettledPosition { asset: AssetId, position: I256 },
    #[error(transparent)]
    Pool(#[from] PoolError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Token(#[from] TokenError),
}

/// Failures raised by the yield source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum YieldSourceError {
    #[error("price gate unmet: price {price} below threshold {threshold}")]
    PriceGateUnmet { price: U256, threshold: U256 },
    #[error("payment short: required {required} of {asset}")]
    InsufficientPayment { asset: AssetId, required: U256 },
    #[error("unknown strategy {0}")]
    UnknownStrategy(Address),
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error("yield source unavailable: {0}")]
    Unavailable(String),
}

/// Engine-level failure; every variant aborts the session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("strategy asset {0} is not in the known-assets list")]
    MissingCoverage(AssetId),
    #[error("no route configured for {0}")]
    MissingRoute(AssetId),
    #[error("route {route} does not contain {asset}")]
    InvalidRoute { asset: AssetId, route: Route },
    #[error("no route can settle residual position in {0}")]
    UnresolvedResidual(AssetId),
    #[error("canonical routes are not configured")]
    CanonicalRoutesUnset,
    #[error("profit route does not contain payment asset {payment_asset}")]
    ProfitRouteMismatch { payment_asset: AssetId },
    #[error("no profit in {asset}: position {position}")]
    NoProfit { asset: AssetId, position: I256 },
    #[error("caller {0} is not the operator")]
    Unauthorized(Address),
    #[error("session callback from {0}, expected the venue")]
    UnauthorizedCallback(Address),
    #[error("recipient must be non-zero")]
    InvalidRecipient,
    #[error("amount {0} does not fit a signed position")]
    AmountOverflow(U256),
    #[error("registry persistence failed: {0}")]
    Persistence(String),
    #[error(transparent)]
    Venue(#[from] VenueError),
    #[error(transparent)]
    YieldSource(#[from] YieldSourceError),
    #[error(transparent)]
    Token(#[from] TokenError),
}

impl EngineError {
    /// Category of this failure.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::MissingCoverage(_)
            | Self::MissingRoute(_)
            | Self::InvalidRoute { .. }
            | Self::UnresolvedResidual(_)
            | Self::CanonicalRoutesUnset
            | Self::ProfitRouteMismatch { .. } => ErrorClass::Configuration,
            Self::NoProfit { .. } => ErrorClass::Economic,
            Self::Unauthorized(_) | Self::UnauthorizedCallback(_) => ErrorClass::Authorization,
            Self::Venue(_) | Self::YieldSource(_) | Self::Token(_) | Self::Persistence(_) => {
                ErrorClass::Venue
            }
            Self::InvalidRecipient | Self::AmountOverflow(_) => ErrorClass::Input,
        }
    }

    /// Whether this is the expected "opportunity already gone" outcome.
    pub fn is_no_profit(&self) -> bool {
        matches!(self, Self::NoProfit { .. })
    }
}
