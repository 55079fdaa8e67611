//! Use Cases Layer - Application Business Logic
//!
//! Orchestrates domain logic with port interfaces to implement the
//! engine's workflows.
//!
//! Use cases:
//! - `SettlementEngine`: Entry point; opens venue sessions, owns the registry
//! - `SessionOrchestrator`: Nine-stage pipeline run inside one session
//! - `ResidualSettlement`: Zeroes leftover pivot/target positions
//! - `CoverageValidator`: Strategy assets vs known assets
//! - Admin: operator-only registry setters and fund rescue

pub mod admin;
pub mod coverage;
pub mod engine;
pub mod residual;
pub mod session;

pub use coverage::CoverageValidator;
pub use engine::{ConfigChange, EngineEvent, SettlementEngine};
pub use residual::{ResidualAction, ResidualSettlement};
pub use session::{SessionOrchestrator, Stage};
