//! # Dashboard store
//! View-model for one bound business: the two source slots, the lifecycle phase and
//! the last display error, plus the commands that re-fetch them.
//!
//! Lifecycle: `Uninitialized → Loading → Ready(..) → Refreshing → Ready(..)`.
//! Loading and refreshing are phases of one enum, so they can never both be set.
//!
//! Every request carries a ticket: the binding epoch it was issued under and, per
//! slot, its sequence number. On settlement a result is applied only if its epoch
//! is still current (identifier fencing) and it is the newest request for that slot.

use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::aggregator::MlDataAggregator;
use crate::payload::{PromotionPayload, ServiceTrendsPayload};
use crate::transport::{FetchError, FetchResult};

/// `last_error` when both sources failed.
pub const GENERIC_FAILURE_MESSAGE: &str = "could not retrieve dashboard data";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// Both sources succeeded.
    Full,
    /// Exactly one source succeeded.
    Partial,
    /// Neither source succeeded.
    Errored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Loading,
    Refreshing,
    Ready(Readiness),
}

impl Phase {
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Uninitialized => "uninitialized",
            Phase::Loading => "loading",
            Phase::Refreshing => "refreshing",
            Phase::Ready(Readiness::Full) => "full",
            Phase::Ready(Readiness::Partial) => "partial",
            Phase::Ready(Readiness::Errored) => "errored",
        }
    }
}

/// Per-source state. The payload is the last good one; `error` belongs to the
/// latest settled attempt. A failed refresh leaves the old payload in place.
#[derive(Debug)]
pub struct SourceSlot<T> {
    data: Option<Arc<T>>,
    error: Option<FetchError>,
    fetched_at: Option<DateTime<Utc>>,
}

impl<T> Default for SourceSlot<T> {
    fn default() -> Self {
        Self {
            data: None,
            error: None,
            fetched_at: None,
        }
    }
}

impl<T> Clone for SourceSlot<T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            error: self.error.clone(),
            fetched_at: self.fetched_at,
        }
    }
}

impl<T> SourceSlot<T> {
    pub fn data(&self) -> Option<&T> {
        self.data.as_deref()
    }

    pub fn error(&self) -> Option<&FetchError> {
        self.error.as_ref()
    }

    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.fetched_at
    }

    /// No attempt has settled yet.
    pub fn is_not_fetched(&self) -> bool {
        self.fetched_at.is_none()
    }

    /// The latest attempt succeeded.
    pub fn succeeded(&self) -> bool {
        self.data.is_some() && self.error.is_none()
    }

    fn record(&mut self, result: FetchResult<T>) {
        match result {
            Ok(payload) => {
                self.data = Some(Arc::new(payload));
                self.error = None;
            }
            Err(e) => self.error = Some(e),
        }
        self.fetched_at = Some(Utc::now());
    }
}

/// Read-only view handed to subscribers and presentation code.
#[derive(Debug, Clone)]
pub struct DashboardSnapshot {
    pub business_id: Option<String>,
    pub phase: Phase,
    pub service_trends: SourceSlot<ServiceTrendsPayload>,
    pub promotion_predictions: SourceSlot<PromotionPayload>,
    pub last_error: Option<String>,
}

impl DashboardSnapshot {
    fn unbound() -> Self {
        Self {
            business_id: None,
            phase: Phase::Uninitialized,
            service_trends: SourceSlot::default(),
            promotion_predictions: SourceSlot::default(),
            last_error: None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.phase == Phase::Loading
    }

    pub fn is_refreshing(&self) -> bool {
        self.phase == Phase::Refreshing
    }

    pub fn readiness(&self) -> Option<Readiness> {
        match self.phase {
            Phase::Ready(r) => Some(r),
            _ => None,
        }
    }

    fn classify(&mut self) {
        let readiness = match (
            self.service_trends.succeeded(),
            self.promotion_predictions.succeeded(),
        ) {
            (true, true) => Readiness::Full,
            (true, false) | (false, true) => Readiness::Partial,
            (false, false) => Readiness::Errored,
        };
        self.last_error = match (self.service_trends.error(), self.promotion_predictions.error()) {
            (Some(_), Some(_)) => Some(GENERIC_FAILURE_MESSAGE.to_string()),
            (Some(e), None) | (None, Some(e)) => Some(e.message.clone()),
            (None, None) => None,
        };
        self.phase = Phase::Ready(readiness);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    All,
    ServiceTrends,
    PromotionPredictions,
}

impl Scope {
    fn covers_trends(self) -> bool {
        matches!(self, Scope::All | Scope::ServiceTrends)
    }

    fn covers_promotions(self) -> bool {
        matches!(self, Scope::All | Scope::PromotionPredictions)
    }
}

#[derive(Debug, Clone, Copy)]
struct Ticket {
    epoch: u64,
    trends_seq: Option<u64>,
    promos_seq: Option<u64>,
}

#[derive(Default)]
struct Outcome {
    trends: Option<FetchResult<ServiceTrendsPayload>>,
    promos: Option<FetchResult<PromotionPayload>>,
}

struct Inner {
    snapshot: DashboardSnapshot,
    epoch: u64,
    trends_seq: u64,
    promos_seq: u64,
    in_flight: usize,
}

impl Inner {
    fn begin(&mut self, scope: Scope) -> Option<(String, Ticket)> {
        let business_id = self.snapshot.business_id.clone()?;
        let mut ticket = Ticket {
            epoch: self.epoch,
            trends_seq: None,
            promos_seq: None,
        };
        if scope.covers_trends() {
            self.trends_seq += 1;
            ticket.trends_seq = Some(self.trends_seq);
        }
        if scope.covers_promotions() {
            self.promos_seq += 1;
            ticket.promos_seq = Some(self.promos_seq);
        }
        self.in_flight += 1;
        // Loading stays Loading: there is nothing on screen to keep yet.
        if let Phase::Ready(_) = self.snapshot.phase {
            self.snapshot.phase = Phase::Refreshing;
        }
        Some((business_id, ticket))
    }
}

struct Shared {
    inner: Mutex<Inner>,
    tx: watch::Sender<DashboardSnapshot>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Nothing panics while the lock is held, so a poisoned state is still consistent.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, inner: &Inner) {
        self.tx.send_replace(inner.snapshot.clone());
    }

    /// Apply a settled request. `None` means the request was abandoned without a result.
    fn settle(&self, ticket: Ticket, outcome: Option<Outcome>) {
        let mut inner = self.lock();
        if ticket.epoch != inner.epoch {
            debug!(
                ticket_epoch = ticket.epoch,
                current_epoch = inner.epoch,
                "discarding result for a previous business binding"
            );
            return;
        }

        let outcome = outcome.unwrap_or_default();
        if let Some(result) = outcome.trends {
            if ticket.trends_seq == Some(inner.trends_seq) {
                inner.snapshot.service_trends.record(result);
            } else {
                debug!(source = "service_trends", "discarding superseded result");
            }
        }
        if let Some(result) = outcome.promos {
            if ticket.promos_seq == Some(inner.promos_seq) {
                inner.snapshot.promotion_predictions.record(result);
            } else {
                debug!(source = "promotion_predictions", "discarding superseded result");
            }
        }

        inner.in_flight = inner.in_flight.saturating_sub(1);
        if inner.in_flight == 0 {
            inner.snapshot.classify();
            debug!(
                business_id = inner.snapshot.business_id.as_deref().unwrap_or_default(),
                phase = inner.snapshot.phase.label(),
                "dashboard settled"
            );
        }
        self.publish(&inner);
    }
}

/// Marks one request as in flight until it settles. Dropping it unsettled (panic,
/// runtime shutdown) still releases the loading/refreshing phase.
struct InFlight {
    shared: Arc<Shared>,
    ticket: Ticket,
    settled: bool,
}

impl InFlight {
    fn settle(mut self, outcome: Outcome) {
        self.settled = true;
        self.shared.settle(self.ticket, Some(outcome));
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if !self.settled {
            warn!("dashboard fetch abandoned before settling");
            self.shared.settle(self.ticket, None);
        }
    }
}

/// Owns the dashboard state for one business at a time. Cheap to clone; clones
/// share state and subscribers.
#[derive(Clone)]
pub struct DashboardStore {
    aggregator: Arc<MlDataAggregator>,
    shared: Arc<Shared>,
}

impl DashboardStore {
    pub fn new(aggregator: MlDataAggregator) -> Self {
        let snapshot = DashboardSnapshot::unbound();
        let (tx, _rx) = watch::channel(snapshot.clone());
        Self {
            aggregator: Arc::new(aggregator),
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    snapshot,
                    epoch: 0,
                    trends_seq: 0,
                    promos_seq: 0,
                    in_flight: 0,
                }),
                tx,
            }),
        }
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        self.shared.lock().snapshot.clone()
    }

    /// Receiver updated on every state transition.
    pub fn subscribe(&self) -> watch::Receiver<DashboardSnapshot> {
        self.shared.tx.subscribe()
    }

    pub fn business_id(&self) -> Option<String> {
        self.shared.lock().snapshot.business_id.clone()
    }

    /// Bind a business and run the initial load. Empty or absent ids leave the store
    /// uninitialized without touching the network; rebinding the current id is a no-op.
    /// Results still in flight for a previous id are discarded when they arrive.
    pub async fn bind(&self, business_id: Option<&str>) -> DashboardSnapshot {
        let wanted = business_id
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let started = {
            let mut inner = self.shared.lock();
            if inner.snapshot.business_id == wanted {
                return inner.snapshot.clone();
            }
            inner.epoch += 1;
            inner.in_flight = 0;
            inner.snapshot = DashboardSnapshot::unbound();
            let started = match wanted {
                Some(id) => {
                    info!(business_id = %id, "binding dashboard");
                    inner.snapshot.business_id = Some(id);
                    inner.snapshot.phase = Phase::Loading;
                    inner.begin(Scope::All)
                }
                None => {
                    info!("dashboard unbound");
                    None
                }
            };
            self.shared.publish(&inner);
            started
        };

        match started {
            Some((id, ticket)) => self.run(id, ticket, Scope::All).await,
            None => self.snapshot(),
        }
    }

    /// Re-fetch both sources. Current data stays visible while the refresh runs.
    pub async fn refresh(&self) -> DashboardSnapshot {
        self.start(Scope::All).await
    }

    /// Re-fetch only the service-trends source.
    pub async fn fetch_service_trends(&self) -> DashboardSnapshot {
        self.start(Scope::ServiceTrends).await
    }

    /// Re-fetch only the promotion-predictions source.
    pub async fn fetch_promotion_predictions(&self) -> DashboardSnapshot {
        self.start(Scope::PromotionPredictions).await
    }

    async fn start(&self, scope: Scope) -> DashboardSnapshot {
        let started = {
            let mut inner = self.shared.lock();
            let started = inner.begin(scope);
            if started.is_some() {
                self.shared.publish(&inner);
            }
            started
        };
        match started {
            Some((id, ticket)) => self.run(id, ticket, scope).await,
            None => {
                debug!(?scope, "no business bound, fetch ignored");
                self.snapshot()
            }
        }
    }

    // The fetch runs on its own task: a caller that stops waiting does not abort the
    // request, and fencing decides whether its result still applies.
    async fn run(&self, business_id: String, ticket: Ticket, scope: Scope) -> DashboardSnapshot {
        let guard = InFlight {
            shared: self.shared.clone(),
            ticket,
            settled: false,
        };
        let aggregator = self.aggregator.clone();
        let task = tokio::spawn(async move {
            let outcome = match scope {
                Scope::All => {
                    let results = aggregator.fetch_all(&business_id).await;
                    Outcome {
                        trends: Some(results.service_trends),
                        promos: Some(results.promotion_predictions),
                    }
                }
                Scope::ServiceTrends => Outcome {
                    trends: Some(aggregator.fetch_service_trends_only(&business_id).await),
                    promos: None,
                },
                Scope::PromotionPredictions => Outcome {
                    trends: None,
                    promos: Some(aggregator.fetch_promotions_only(&business_id).await),
                },
            };
            guard.settle(outcome);
        });
        if let Err(e) = task.await {
            warn!(error = %e, "dashboard fetch task failed");
        }
        self.snapshot()
    }
}
