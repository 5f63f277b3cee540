use async_trait::async_trait;
use common::MetricsRecorder;
use domain::{CustomerId, OrderId, OrderStatus};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::{ClientError, ServiceClient};

#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    /// Tell the customer their order was placed
    async fn send_created(&self, order_id: OrderId) -> Result<(), ClientError>;

    async fn send_status_update(
        &self,
        order_id: OrderId,
        customer_id: CustomerId,
        status: OrderStatus,
    ) -> Result<(), ClientError>;
}

#[derive(Debug, Serialize)]
struct NotificationRequest {
    order_id: OrderId,
    #[serde(skip_serializing_if = "Option::is_none")]
    customer_id: Option<CustomerId>,
    message: String,
    status: OrderStatus,
}

pub struct HttpNotificationDispatcher {
    client: ServiceClient,
}

impl HttpNotificationDispatcher {
    pub fn new(base_url: &str, timeout: Duration, metrics: Arc<dyn MetricsRecorder>) -> Self {
        Self {
            client: ServiceClient::new("notification-service", base_url, timeout, metrics),
        }
    }

    async fn send(&self, request: NotificationRequest) -> Result<(), ClientError> {
        self.client.post("/notifications", &request).await?;
        debug!(order_id = %request.order_id, status = %request.status, "Notification sent");
        Ok(())
    }
}

#[async_trait]
impl NotificationDispatcher for HttpNotificationDispatcher {
    async fn send_created(&self, order_id: OrderId) -> Result<(), ClientError> {
        self.send(NotificationRequest {
            order_id,
            customer_id: None,
            message: format!("Your order #{} has been created", order_id),
            status: OrderStatus::Pending,
        })
        .await
    }

    async fn send_status_update(
        &self,
        order_id: OrderId,
        customer_id: CustomerId,
        status: OrderStatus,
    ) -> Result<(), ClientError> {
        self.send(NotificationRequest {
            order_id,
            customer_id: Some(customer_id),
            message: format!("Your order #{} is now {}", order_id, status),
            status,
        })
        .await
    }
}
