//! Domain layer - Core settlement types and pure logic.
//!
//! Routes, the route registry, the per-session position ledger, pool
//! math and the error taxonomy. No I/O lives here (hexagonal
//! architecture inner ring); everything is testable in isolation.

pub mod amm;
pub mod coverage;
pub mod error;
pub mod execution;
pub mod ledger;
pub mod registry;
pub mod route;
pub mod units;

// Re-export core types for convenience
pub use error::{
    EngineError, ErrorClass, LedgerError, PoolError, TokenError, VenueError, YieldSourceError,
};
pub use execution::{ExecutionParams, ExecutionReceipt, SessionOutcome, SessionPayload};
pub use ledger::PositionLedger;
pub use registry::{RouteRegistry, RouteSource};
pub use route::{AssetId, CanonicalRoutes, Route};
