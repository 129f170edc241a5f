//! # ML data aggregator
//! Fans out to both source clients and joins their results.
//!
//! The join waits for every source to settle: one failing source never cancels
//! or short-circuits the other. The aggregator itself never fails; deciding what a
//! partial result means is left to the caller.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Instant;

use crate::config::ServicesConfig;
use crate::payload::{PromotionPayload, ServiceTrendsPayload};
use crate::sources::{PromotionPredictionsClient, ServiceTrendsClient};
use crate::transport::{FetchResult, HttpTransport, Transport};

/// Both per-source results of one `fetch_all`.
#[derive(Debug, Clone)]
pub struct AggregatedResults {
    pub service_trends: FetchResult<ServiceTrendsPayload>,
    pub promotion_predictions: FetchResult<PromotionPayload>,
}

impl AggregatedResults {
    pub fn succeeded(&self) -> usize {
        usize::from(self.service_trends.is_ok()) + usize::from(self.promotion_predictions.is_ok())
    }
}

#[derive(Clone)]
pub struct MlDataAggregator {
    service_trends: ServiceTrendsClient,
    promotions: PromotionPredictionsClient,
}

impl MlDataAggregator {
    pub fn new(service_trends: ServiceTrendsClient, promotions: PromotionPredictionsClient) -> Self {
        Self {
            service_trends,
            promotions,
        }
    }

    /// Build both clients over one shared HTTP transport.
    pub fn from_config(cfg: &ServicesConfig) -> Result<Self> {
        let transport = HttpTransport::new().context("building http client")?;
        Self::with_transport(cfg, Arc::new(transport))
    }

    /// Same as `from_config`, with a caller-supplied transport.
    pub fn with_transport(cfg: &ServicesConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        let service_trends =
            ServiceTrendsClient::new(&cfg.service_trends_base_url, cfg.timeout(), transport.clone())
                .context("service trends client")?;
        let promotions =
            PromotionPredictionsClient::new(&cfg.promotions_base_url, cfg.timeout(), transport)
                .context("promotion predictions client")?;
        Ok(Self::new(service_trends, promotions))
    }

    pub async fn fetch_all(&self, business_id: &str) -> AggregatedResults {
        let t0 = Instant::now();
        let (service_trends, promotion_predictions) = tokio::join!(
            self.service_trends.fetch(business_id),
            self.promotions.fetch(business_id)
        );
        let out = AggregatedResults {
            service_trends,
            promotion_predictions,
        };
        tracing::debug!(
            business_id,
            succeeded = out.succeeded(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "fetch_all settled"
        );
        out
    }

    pub async fn fetch_service_trends_only(
        &self,
        business_id: &str,
    ) -> FetchResult<ServiceTrendsPayload> {
        self.service_trends.fetch(business_id).await
    }

    pub async fn fetch_promotions_only(&self, business_id: &str) -> FetchResult<PromotionPayload> {
        self.promotions.fetch(business_id).await
    }
}
