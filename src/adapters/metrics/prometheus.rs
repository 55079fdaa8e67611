//! Prometheus Metrics Registry - Settlement Observability
//!
//! Fed from the engine's event stream, so the use cases never touch
//! Prometheus directly. `render` produces the text exposition format for
//! whatever scrape surface the host process provides.

use std::sync::Arc;

use alloy::primitives::U256;
use prometheus::{
    Encoder, GaugeVec, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry,
    TextEncoder,
};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::usecases::engine::{ConfigChange, EngineEvent};

/// Outcome label for committed sessions.
const SUCCESS: &str = "success";

/// Engine metrics, all prefixed `claim_arb_`.
pub struct EngineMetrics {
    registry: Registry,
    /// Sessions by outcome (`success` or an error class label).
    pub sessions_total: IntCounterVec,
    /// Profit of the latest committed session, in base-asset base units.
    pub realized_profit: GaugeVec,
    /// Session wall time in microseconds.
    pub session_latency_us: HistogramVec,
    /// Operator registry changes by kind.
    pub config_changes_total: IntCounterVec,
    /// Rescue transfers performed.
    pub rescues_total: IntCounter,
}

fn as_f64(amount: U256) -> f64 {
    amount.to_string().parse().unwrap_or(f64::MAX)
}

impl EngineMetrics {
    /// Create and register all metrics.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let sessions_total = IntCounterVec::new(
            Opts::new("claim_arb_sessions_total", "Settlement sessions by outcome"),
            &["outcome"],
        )?;

        let realized_profit = GaugeVec::new(
            Opts::new(
                "claim_arb_realized_profit",
                "Profit paid by the latest session in base units",
            ),
            &["base_asset"],
        )?;

        let session_latency_us = HistogramVec::new(
            HistogramOpts::new(
                "claim_arb_session_latency_us",
                "Settlement session latency in microseconds",
            )
            .buckets(vec![
                50.0, 100.0, 500.0, 1000.0, 5000.0, 10000.0, 50000.0, 250000.0,
            ]),
            &["outcome"],
        )?;

        let config_changes_total = IntCounterVec::new(
            Opts::new("claim_arb_config_changes_total", "Operator registry changes"),
            &["kind"],
        )?;

        let rescues_total = IntCounter::new("claim_arb_rescues_total", "Rescue transfers")?;

        registry.register(Box::new(sessions_total.clone()))?;
        registry.register(Box::new(realized_profit.clone()))?;
        registry.register(Box::new(session_latency_us.clone()))?;
        registry.register(Box::new(config_changes_total.clone()))?;
        registry.register(Box::new(rescues_total.clone()))?;

        Ok(Self {
            registry,
            sessions_total,
            realized_profit,
            session_latency_us,
            config_changes_total,
            rescues_total,
        })
    }

    /// Fold one engine event into the metrics.
    pub fn observe(&self, event: &EngineEvent) {
        match event {
            EngineEvent::Executed {
                receipt,
                elapsed_us,
            } => {
                self.sessions_total.with_label_values(&[SUCCESS]).inc();
                self.session_latency_us
                    .with_label_values(&[SUCCESS])
                    .observe(*elapsed_us as f64);
                let base_asset = receipt.outcome.base_asset.to_string();
                self.realized_profit
                    .with_label_values(&[base_asset.as_str()])
                    .set(as_f64(receipt.outcome.profit));
            }
            EngineEvent::Aborted {
                class, elapsed_us, ..
            } => {
                self.sessions_total.with_label_values(&[class.label()]).inc();
                self.session_latency_us
                    .with_label_values(&[class.label()])
                    .observe(*elapsed_us as f64);
            }
            EngineEvent::ConfigChanged(change) => {
                let kind = match change {
                    ConfigChange::RouteSet { .. } => "route_set",
                    ConfigChange::KnownAssetAdded(_) => "known_asset_added",
                    ConfigChange::KnownAssetRemoved(_) => "known_asset_removed",
                    ConfigChange::CanonicalRoutesSet(_) => "canonical_routes_set",
                };
                self.config_changes_total.with_label_values(&[kind]).inc();
            }
            EngineEvent::Rescued { .. } => self.rescues_total.inc(),
            EngineEvent::OwnershipTransferred { .. } => {}
        }
    }

    /// Consume `events` until the engine is dropped.
    pub fn spawn_recorder(
        self: Arc<Self>,
        mut events: broadcast::Receiver<EngineEvent>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => self.observe(&event),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Metrics recorder lagged behind engine events");
                    }
                    Err(RecvError::Closed) => {
                        debug!("Engine event stream closed");
                        break;
                    }
                }
            }
        })
    }

    /// Prometheus text exposition of every registered metric.
    pub fn render(&self) -> anyhow::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::Address;

    use super::*;
    use crate::domain::error::ErrorClass;
    use crate::domain::execution::{ExecutionReceipt, SessionOutcome};

    #[test]
    fn test_success_and_abort_are_labelled() {
        let metrics = EngineMetrics::new().unwrap();
        let outcome = SessionOutcome {
            payment_asset: Address::repeat_byte(3),
            payment_surplus: U256::from(10),
            base_asset: Address::repeat_byte(4),
            profit: U256::from(9),
        };
        metrics.observe(&EngineEvent::Executed {
            receipt: ExecutionReceipt::new(Address::repeat_byte(9), outcome),
            elapsed_us: 120,
        });
        metrics.observe(&EngineEvent::Aborted {
            caller: Address::repeat_byte(9),
            class: ErrorClass::Economic,
            reason: "no profit".to_string(),
            elapsed_us: 80,
            at: chrono::Utc::now(),
        });

        assert_eq!(metrics.sessions_total.with_label_values(&["success"]).get(), 1);
        assert_eq!(metrics.sessions_total.with_label_values(&["no_profit"]).get(), 1);
        let base = Address::repeat_byte(4).to_string();
        assert_eq!(metrics.realized_profit.with_label_values(&[base.as_str()]).get(), 9.0);

        let text = metrics.render().unwrap();
        assert!(text.contains("claim_arb_sessions_total"));
        assert!(text.contains("claim_arb_session_latency_us"));
    }

    #[test]
    fn test_config_changes_counted_by_kind() {
        let metrics = EngineMetrics::new().unwrap();
        metrics.observe(&EngineEvent::ConfigChanged(ConfigChange::KnownAssetAdded(
            Address::repeat_byte(1),
        )));
        assert_eq!(
            metrics
                .config_changes_total
                .with_label_values(&["known_asset_added"])
                .get(),
            1
        );
    }
}
