//! Booking ML dashboard: service entrypoint.
//! Boots the Axum HTTP server over a dashboard store wired to the two ML services.

use booking_ml_dashboard::metrics::Metrics;
use booking_ml_dashboard::{api, DashboardStore, MlDataAggregator, ServicesConfig};
use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Enable compact tracing logs in development only.
/// Activation requires BOTH:
///   - dev environment (debug build OR SHUTTLE_ENV in {local, development, dev})
///   - ML_DASHBOARD_DEV_LOG=1
fn enable_dev_tracing() {
    let dev_flag = std::env::var("ML_DASHBOARD_DEV_LOG")
        .ok()
        .is_some_and(|v| v == "1");

    let is_dev_env = cfg!(debug_assertions)
        || matches!(
            std::env::var("SHUTTLE_ENV")
                .unwrap_or_default()
                .to_ascii_lowercase()
                .as_str(),
            "local" | "development" | "dev"
        );

    if !(dev_flag && is_dev_env) {
        return;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("booking_ml_dashboard=debug,info"));

    // The runtime may already have installed a subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    enable_dev_tracing();

    let cfg = ServicesConfig::load_default()?;
    let metrics = Metrics::init(&cfg)?;
    let store = DashboardStore::new(MlDataAggregator::from_config(&cfg)?);

    // Optional pre-bound business (otherwise the front-end binds via PUT /dashboard/business).
    if let Ok(id) = std::env::var("BUSINESS_ID") {
        let store = store.clone();
        tokio::spawn(async move {
            let snap = store.bind(Some(&id)).await;
            tracing::info!(business_id = %id, status = snap.phase.label(), "initial dashboard load");
        });
    }

    let router = api::router(store).merge(metrics.router());
    Ok(router.into())
}
