//! Adapters Layer - Hexagonal Architecture Outer Ring
//!
//! Implements the port traits defined in `crate::ports` with concrete
//! backends. Each sub-module groups adapters by infrastructure concern.
//!
//! Adapter categories:
//! - `simulated`: In-memory chain, venue and yield source
//! - `metrics`: Prometheus metrics fed by engine events
//! - `persistence`: Atomic JSON registry snapshots

pub mod metrics;
pub mod persistence;
pub mod simulated;
