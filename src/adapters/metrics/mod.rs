//! Metrics Adapters
//!
//! Prometheus counters, gauges and histograms derived from the engine's
//! event stream.

pub mod prometheus;

pub use prometheus::EngineMetrics;
