// src/sources/mod.rs
pub mod promotions;
pub mod service_trends;

pub use promotions::PromotionPredictionsClient;
pub use service_trends::ServiceTrendsClient;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::OnceCell;
use std::time::Instant;

use crate::payload::{decode_payload, UpstreamPayload};
use crate::transport::{EndpointDescriptor, FetchResult, Transport};

/// The two upstream ML services the dashboard reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    ServiceTrends,
    PromotionPredictions,
}

impl Source {
    pub fn name(&self) -> &'static str {
        match self {
            Source::ServiceTrends => "service_trends",
            Source::PromotionPredictions => "promotion_predictions",
        }
    }

    /// Message surfaced to the dashboard when this source fails, whatever the cause.
    pub fn failure_message(&self) -> &'static str {
        match self {
            Source::ServiceTrends => "could not retrieve service trends",
            Source::PromotionPredictions => "could not retrieve promotion predictions",
        }
    }
}

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "ml_source_requests_total",
            "Upstream ML source fetches by source and outcome."
        );
        describe_histogram!(
            "ml_source_fetch_ms",
            "Upstream ML source fetch time in milliseconds."
        );
    });
}

/// Send, decode and relabel. Shared by both source clients.
pub(crate) async fn fetch_payload<T: UpstreamPayload>(
    transport: &dyn Transport,
    descriptor: &EndpointDescriptor,
    source: Source,
) -> FetchResult<T> {
    ensure_metrics_described();
    let t0 = Instant::now();

    let result = match transport.send(descriptor).await {
        Ok(raw) => decode_payload::<T>(raw),
        Err(e) => Err(e),
    };

    let ms = t0.elapsed().as_secs_f64() * 1_000.0;
    histogram!("ml_source_fetch_ms", "source" => source.name()).record(ms);

    match result {
        Ok(payload) => {
            counter!("ml_source_requests_total", "source" => source.name(), "outcome" => "success")
                .increment(1);
            Ok(payload)
        }
        Err(e) => {
            counter!("ml_source_requests_total", "source" => source.name(), "outcome" => e.kind.as_str())
                .increment(1);
            tracing::warn!(
                source = source.name(),
                kind = e.kind.as_str(),
                error = %e.message,
                elapsed_ms = ms as u64,
                "source fetch failed"
            );
            Err(e.relabel(source.failure_message()))
        }
    }
}
