//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) that the usecases layer requires
//! from the outside world. Adapters implement these traits.
//!
//! Port categories:
//! - `Venue` / `VenueSession`: atomic sessions over the shared ledger
//! - `YieldSource`: price-gated claim being arbitraged
//! - `TokenBank`: real token balances and transfers
//! - `RegistryStore`: route registry persistence

pub mod registry_store;
pub mod token_bank;
pub mod venue;
pub mod yield_source;
