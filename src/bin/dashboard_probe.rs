//! One-shot probe: bind a business, run the initial load, print the dashboard view as JSON.
//!
//! Usage: `dashboard_probe [BUSINESS_ID]` (falls back to `$BUSINESS_ID`).

use booking_ml_dashboard::api::DashboardView;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let business_id = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("BUSINESS_ID").ok())
        .unwrap_or_default();
    if business_id.trim().is_empty() {
        anyhow::bail!("usage: dashboard_probe <BUSINESS_ID> (or set BUSINESS_ID)");
    }

    let store = booking_ml_dashboard::build_store_from_env()?;

    let mut rx = store.subscribe();
    let watcher = tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let phase = rx.borrow_and_update().phase;
            tracing::info!(phase = phase.label(), "dashboard state changed");
        }
    });

    let snap = store.bind(Some(&business_id)).await;
    println!("{}", serde_json::to_string_pretty(&DashboardView::new(&snap))?);

    drop(store);
    watcher.abort();
    Ok(())
}
