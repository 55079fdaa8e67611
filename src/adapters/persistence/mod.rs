//! Persistence Adapters - JSON File Storage
//!
//! Implements the `RegistryStore` port with an atomic JSON snapshot.
//! No database dependency; the registry is small and rarely written.

pub mod registry_store;

pub use registry_store::JsonRegistryStore;
