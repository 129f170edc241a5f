// tests/metrics.rs
//
// Prometheus exposition after real source fetches. The recorder is process-global,
// so this file installs it exactly once.
mod common;

use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use serial_test::serial;
use tower::ServiceExt;

use booking_ml_dashboard::metrics::Metrics;
use booking_ml_dashboard::transport::FetchError;
use booking_ml_dashboard::ServicesConfig;
use common::{aggregator_with, trends_json, Reply, StubTransport, Upstream};

#[tokio::test]
#[serial]
async fn fetch_outcomes_show_up_on_metrics_route() {
    let cfg = ServicesConfig::default();
    let metrics = Metrics::init(&cfg).expect("install recorder");

    let stub = StubTransport::new();
    stub.respond(Upstream::Trends, "biz-42", 0, Reply::Ok(trends_json("biz-42", "t")));
    stub.respond(
        Upstream::Promotions,
        "biz-42",
        0,
        Reply::Err(FetchError::timeout("request timed out after 15000ms")),
    );
    let out = aggregator_with(stub).fetch_all("biz-42").await;
    assert!(out.service_trends.is_ok());
    assert!(out.promotion_predictions.is_err());

    let resp = metrics
        .router()
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body::to_bytes(resp.into_body(), 1_048_576).await.unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();

    for needle in [
        "ml_source_requests_total",
        "ml_source_fetch_ms",
        "ml_source_timeout_ms 15000",
        r#"source="service_trends""#,
        r#"source="promotion_predictions""#,
        r#"outcome="success""#,
        r#"outcome="timeout""#,
    ] {
        assert!(
            text.contains(needle),
            "metrics exposition missing '{needle}'\n{text}"
        );
    }
}
