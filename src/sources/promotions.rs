use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

use super::{fetch_payload, Source};
use crate::payload::PromotionPayload;
use crate::transport::{EndpointDescriptor, FetchResult, Transport};

pub const PROMOTIONS_PATH: &str = "/promotion-predictions/dashboard";

#[derive(Clone)]
pub struct PromotionPredictionsClient {
    endpoint: EndpointDescriptor,
    transport: Arc<dyn Transport>,
}

impl PromotionPredictionsClient {
    pub fn new(base_url: &str, timeout: Duration, transport: Arc<dyn Transport>) -> Result<Self> {
        let endpoint = EndpointDescriptor::new(base_url, PROMOTIONS_PATH)?
            .expecting_params(&[])?
            .with_timeout(timeout);
        Ok(Self {
            endpoint,
            transport,
        })
    }

    pub fn endpoint(&self) -> &EndpointDescriptor {
        &self.endpoint
    }

    /// The promotions service takes the business id as a query parameter.
    pub async fn fetch(&self, business_id: &str) -> FetchResult<PromotionPayload> {
        let descriptor = self
            .endpoint
            .clone()
            .with_query_param("businessId", business_id);
        fetch_payload(self.transport.as_ref(), &descriptor, Source::PromotionPredictions).await
    }
}
