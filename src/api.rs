use axum::{
    extract::State,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::payload::{PromotionPayload, ServiceTrendsPayload};
use crate::store::{DashboardSnapshot, DashboardStore, SourceSlot};
use crate::transport::{ErrorKind, FetchError};

/// Router exposing the dashboard store to presentation clients.
pub fn router(store: DashboardStore) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/dashboard", get(get_dashboard))
        .route("/dashboard/business", put(bind_business))
        .route("/dashboard/refresh", post(refresh_all))
        .route("/dashboard/service-trends/refresh", post(refresh_service_trends))
        .route(
            "/dashboard/promotion-predictions/refresh",
            post(refresh_promotion_predictions),
        )
        .layer(CorsLayer::very_permissive())
        .with_state(store)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BindReq {
    #[serde(default)]
    business_id: Option<String>,
}

async fn get_dashboard(State(store): State<DashboardStore>) -> SnapshotResponse {
    SnapshotResponse(store.snapshot())
}

async fn bind_business(
    State(store): State<DashboardStore>,
    Json(body): Json<BindReq>,
) -> SnapshotResponse {
    SnapshotResponse(store.bind(body.business_id.as_deref()).await)
}

async fn refresh_all(State(store): State<DashboardStore>) -> SnapshotResponse {
    SnapshotResponse(store.refresh().await)
}

async fn refresh_service_trends(State(store): State<DashboardStore>) -> SnapshotResponse {
    SnapshotResponse(store.fetch_service_trends().await)
}

async fn refresh_promotion_predictions(State(store): State<DashboardStore>) -> SnapshotResponse {
    SnapshotResponse(store.fetch_promotion_predictions().await)
}

/// Serializes a snapshot as the dashboard view JSON.
pub struct SnapshotResponse(pub DashboardSnapshot);

impl IntoResponse for SnapshotResponse {
    fn into_response(self) -> Response {
        Json(DashboardView::new(&self.0)).into_response()
    }
}

/// JSON shape consumed by the dashboard front-end.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView<'a> {
    pub business_id: Option<&'a str>,
    pub status: &'static str,
    pub service_trends: Option<&'a ServiceTrendsPayload>,
    pub promotion_predictions: Option<&'a PromotionPayload>,
    pub loading: bool,
    pub is_refreshing: bool,
    pub error: Option<&'a str>,
    pub sources: SourcesView<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourcesView<'a> {
    pub service_trends: SlotView<'a>,
    pub promotion_predictions: SlotView<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotView<'a> {
    pub fetched_at: Option<DateTime<Utc>>,
    pub error: Option<ErrorView<'a>>,
}

#[derive(Serialize)]
pub struct ErrorView<'a> {
    pub kind: ErrorKind,
    pub message: &'a str,
    /// False for contract mismatches; the UI should flag those instead of offering retry.
    pub retryable: bool,
}

impl<'a> From<&'a FetchError> for ErrorView<'a> {
    fn from(e: &'a FetchError) -> Self {
        Self {
            kind: e.kind,
            message: &e.message,
            retryable: e.is_retryable(),
        }
    }
}

impl<'a, T> From<&'a SourceSlot<T>> for SlotView<'a> {
    fn from(slot: &'a SourceSlot<T>) -> Self {
        Self {
            fetched_at: slot.fetched_at(),
            error: slot.error().map(ErrorView::from),
        }
    }
}

impl<'a> DashboardView<'a> {
    pub fn new(s: &'a DashboardSnapshot) -> Self {
        Self {
            business_id: s.business_id.as_deref(),
            status: s.phase.label(),
            service_trends: s.service_trends.data(),
            promotion_predictions: s.promotion_predictions.data(),
            loading: s.is_loading(),
            is_refreshing: s.is_refreshing(),
            error: s.last_error.as_deref(),
            sources: SourcesView {
                service_trends: SlotView::from(&s.service_trends),
                promotion_predictions: SlotView::from(&s.promotion_predictions),
            },
        }
    }
}
