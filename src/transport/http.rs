// src/transport/http.rs
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use std::time::{Duration, Instant};

use super::endpoint::EndpointDescriptor;
use super::types::{FetchError, FetchResult, RawPayload};
use super::Transport;

/// reqwest-backed transport. One shared connection pool; the descriptor's timeout
/// is the only deadline and covers connecting as well as reading the body.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .user_agent(concat!("booking-ml-dashboard/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()?;
        Ok(Self { client })
    }

    /// Wrap an existing client (tests, custom TLS setups).
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

fn classify_reqwest_error(e: &reqwest::Error, timeout: Duration) -> FetchError {
    if e.is_timeout() {
        FetchError::timeout(format!("request timed out after {}ms", timeout.as_millis()))
    } else if e.is_decode() {
        FetchError::decode(format!("malformed response body: {e}"))
    } else {
        FetchError::network(format!("request failed: {e}"))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, descriptor: &EndpointDescriptor) -> FetchResult<RawPayload> {
        let url = descriptor.url()?;
        let timeout = descriptor.timeout();
        let t0 = Instant::now();

        let resp = self
            .client
            .get(url.clone())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify_reqwest_error(&e, timeout))?;

        let status = resp.status();
        if !status.is_success() {
            tracing::debug!(%url, status = status.as_u16(), "upstream returned non-success status");
            return Err(FetchError::upstream(
                status.as_u16(),
                format!("HTTP {status} from {}", url.path()),
            ));
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| classify_reqwest_error(&e, timeout))?;
        let payload: RawPayload = serde_json::from_slice(&body)
            .map_err(|e| FetchError::decode(format!("response body is not valid JSON: {e}")))?;

        tracing::debug!(
            %url,
            elapsed_ms = t0.elapsed().as_millis() as u64,
            bytes = body.len(),
            "upstream fetch ok"
        );
        Ok(payload)
    }
}
