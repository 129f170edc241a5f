// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod aggregator;
pub mod api;
pub mod config;
pub mod metrics;
pub mod payload;
pub mod sources;
pub mod store;
pub mod transport;

// ---- Re-exports for stable public API ----
pub use crate::aggregator::{AggregatedResults, MlDataAggregator};
pub use crate::api::router;
pub use crate::config::ServicesConfig;
pub use crate::payload::{PromotionPayload, ServiceTrendsPayload};
pub use crate::store::{DashboardSnapshot, DashboardStore, Phase, Readiness};
pub use crate::transport::{ErrorKind, FetchError, FetchResult, Transport};

use tracing::info;

/// Build a store from the default configuration (config file + env overrides).
pub fn build_store_from_env() -> anyhow::Result<DashboardStore> {
    let cfg = ServicesConfig::load_default()?;
    info!(
        service_trends = %cfg.service_trends_base_url,
        promotions = %cfg.promotions_base_url,
        timeout_ms = cfg.timeout_ms,
        "ml services config loaded"
    );
    let aggregator = MlDataAggregator::from_config(&cfg)?;
    Ok(DashboardStore::new(aggregator))
}
