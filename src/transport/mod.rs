// src/transport/mod.rs
pub mod endpoint;
pub mod http;
pub mod types;

pub use endpoint::{EndpointDescriptor, DEFAULT_TIMEOUT};
pub use http::HttpTransport;
pub use types::{ErrorKind, FetchError, FetchResult, RawPayload};

/// A single GET against an endpoint. Implementations never retry.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, descriptor: &EndpointDescriptor) -> FetchResult<RawPayload>;
}
