//! Simulated Adapters - In-Memory Venue, Yield Source and Token Bank
//!
//! Reference implementations of the ports used by the binary, the
//! integration tests and the benches. All state lives in one
//! `SimulatedChain` so venue sessions can roll it back as a whole.

pub mod chain;
pub mod venue;
pub mod world;
pub mod yield_source;

pub use chain::{ChainState, SimulatedChain};
pub use venue::{SimulatedVenue, SwapRecord};
pub use world::SimulatedWorld;
pub use yield_source::{PriceGate, SimulatedYieldSource, YieldSourceSettings};
