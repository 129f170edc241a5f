use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

use super::{fetch_payload, Source};
use crate::payload::ServiceTrendsPayload;
use crate::transport::{EndpointDescriptor, FetchResult, Transport};

pub const SERVICE_TRENDS_PATH: &str = "/service-trends/dashboard/{businessId}";

/// Client for the service-trends model: demand predictions per service plus chart series.
#[derive(Clone)]
pub struct ServiceTrendsClient {
    endpoint: EndpointDescriptor,
    transport: Arc<dyn Transport>,
}

impl ServiceTrendsClient {
    pub fn new(base_url: &str, timeout: Duration, transport: Arc<dyn Transport>) -> Result<Self> {
        let endpoint = EndpointDescriptor::new(base_url, SERVICE_TRENDS_PATH)?
            .expecting_params(&["businessId"])?
            .with_timeout(timeout);
        Ok(Self {
            endpoint,
            transport,
        })
    }

    pub fn endpoint(&self) -> &EndpointDescriptor {
        &self.endpoint
    }

    /// Fresh request every call; the business id goes into the path.
    pub async fn fetch(&self, business_id: &str) -> FetchResult<ServiceTrendsPayload> {
        let descriptor = self
            .endpoint
            .clone()
            .with_path_param("businessId", business_id);
        fetch_payload(self.transport.as_ref(), &descriptor, Source::ServiceTrends).await
    }
}
