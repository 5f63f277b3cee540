use async_trait::async_trait;
use common::MetricsRecorder;
use domain::ProductId;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::{ClientError, ServiceClient};

/// Answers whether a product can cover a requested quantity
#[async_trait]
pub trait InventoryChecker: Send + Sync {
    async fn check_availability(
        &self,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<bool, ClientError>;
}

#[derive(Debug, Serialize)]
struct AvailabilityRequest {
    product_id: ProductId,
    quantity: i32,
}

#[derive(Debug, Deserialize)]
struct AvailabilityResponse {
    available: bool,
}

pub struct HttpInventoryChecker {
    client: ServiceClient,
}

impl HttpInventoryChecker {
    pub fn new(base_url: &str, timeout: Duration, metrics: Arc<dyn MetricsRecorder>) -> Self {
        Self {
            client: ServiceClient::new("inventory-service", base_url, timeout, metrics),
        }
    }
}

#[async_trait]
impl InventoryChecker for HttpInventoryChecker {
    async fn check_availability(
        &self,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<bool, ClientError> {
        let response: AvailabilityResponse = self
            .client
            .post_json(
                "/inventory/check",
                &AvailabilityRequest {
                    product_id,
                    quantity,
                },
            )
            .await?;

        debug!(
            product_id = %product_id,
            quantity = %quantity,
            available = %response.available,
            "Inventory checked"
        );
        Ok(response.available)
    }
}
