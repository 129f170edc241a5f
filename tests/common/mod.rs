// tests/common/mod.rs
//
// Scripted in-memory transport shared by the integration tests.
// Replies are keyed by (upstream, business id); queued replies are consumed
// first, then the sticky default applies.
#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use booking_ml_dashboard::transport::{
    EndpointDescriptor, FetchError, FetchResult, RawPayload, Transport,
};
use booking_ml_dashboard::{DashboardStore, MlDataAggregator, ServicesConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Upstream {
    Trends,
    Promotions,
}

#[derive(Debug, Clone)]
pub enum Reply {
    Ok(Value),
    Err(FetchError),
    Panic,
}

#[derive(Debug, Clone)]
struct Scripted {
    delay: Duration,
    reply: Reply,
}

#[derive(Default)]
pub struct StubTransport {
    queued: Mutex<HashMap<(Upstream, String), VecDeque<Scripted>>>,
    sticky: Mutex<HashMap<(Upstream, String), Scripted>>,
    calls: Mutex<Vec<(Upstream, String)>>,
}

impl StubTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Reply used for every call unless a queued reply is pending.
    pub fn respond(&self, up: Upstream, business_id: &str, delay_ms: u64, reply: Reply) {
        self.sticky.lock().unwrap().insert(
            (up, business_id.to_string()),
            Scripted {
                delay: Duration::from_millis(delay_ms),
                reply,
            },
        );
    }

    /// One-shot reply, consumed in FIFO order.
    pub fn enqueue(&self, up: Upstream, business_id: &str, delay_ms: u64, reply: Reply) {
        self.queued
            .lock()
            .unwrap()
            .entry((up, business_id.to_string()))
            .or_default()
            .push_back(Scripted {
                delay: Duration::from_millis(delay_ms),
                reply,
            });
    }

    pub fn calls(&self) -> Vec<(Upstream, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn send(&self, descriptor: &EndpointDescriptor) -> FetchResult<RawPayload> {
        let up = if descriptor.path_template().starts_with("/service-trends") {
            Upstream::Trends
        } else {
            Upstream::Promotions
        };
        let business_id = descriptor.param("businessId").unwrap_or_default().to_string();
        self.calls.lock().unwrap().push((up, business_id.clone()));

        let key = (up, business_id);
        let script = {
            let queued = self
                .queued
                .lock()
                .unwrap()
                .get_mut(&key)
                .and_then(|q| q.pop_front());
            queued.or_else(|| self.sticky.lock().unwrap().get(&key).cloned())
        };
        let Some(script) = script else {
            return Err(FetchError::upstream(404, "no stub reply"));
        };

        if !script.delay.is_zero() {
            tokio::time::sleep(script.delay).await;
        }
        match script.reply {
            Reply::Ok(v) => Ok(v),
            Reply::Err(e) => Err(e),
            Reply::Panic => panic!("stub transport asked to panic"),
        }
    }
}

pub fn trends_json(business_id: &str, tag: &str) -> Value {
    json!({
        "businessId": business_id,
        "predictions": [{ "service": "fade", "tag": tag }],
        "models": [{ "name": "prophet", "version": "3" }],
        "analytics": { "accuracy": 0.9 },
        "charts": { "weekly": [3, 5, 8] }
    })
}

pub fn promos_json(business_id: &str, tag: &str) -> Value {
    json!({
        "businessId": business_id,
        "activePromotions": [{ "code": tag }],
        "models": [],
        "analytics": { "uplift": 0.12 }
    })
}

pub fn aggregator_with(stub: Arc<StubTransport>) -> MlDataAggregator {
    MlDataAggregator::with_transport(&ServicesConfig::default(), stub).unwrap()
}

pub fn store_with(stub: Arc<StubTransport>) -> DashboardStore {
    DashboardStore::new(aggregator_with(stub))
}

pub fn trends_tag(snap: &booking_ml_dashboard::DashboardSnapshot) -> Option<String> {
    snap.service_trends
        .data()
        .and_then(|p| p.predictions.first())
        .and_then(|v| v.get("tag"))
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

pub fn promos_tag(snap: &booking_ml_dashboard::DashboardSnapshot) -> Option<String> {
    snap.promotion_predictions
        .data()
        .and_then(|p| p.active_promotions.first())
        .and_then(|v| v.get("code"))
        .and_then(|v| v.as_str())
        .map(str::to_string)
}
