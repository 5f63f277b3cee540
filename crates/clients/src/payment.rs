use async_trait::async_trait;
use common::MetricsRecorder;
use domain::{CustomerId, OrderId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::{ClientError, ServiceClient};

/// Handle to a payment intent created for an order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub payment: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[async_trait]
pub trait PaymentAuthority: Send + Sync {
    async fn create_payment(
        &self,
        order_id: OrderId,
        customer_id: CustomerId,
        amount: f64,
        currency: &str,
    ) -> Result<PaymentIntent, ClientError>;
}

#[derive(Debug, Serialize)]
struct PaymentRequest<'a> {
    order_id: OrderId,
    customer_id: CustomerId,
    amount: f64,
    currency: &'a str,
}

pub struct HttpPaymentAuthority {
    client: ServiceClient,
}

impl HttpPaymentAuthority {
    pub fn new(base_url: &str, timeout: Duration, metrics: Arc<dyn MetricsRecorder>) -> Self {
        Self {
            client: ServiceClient::new("payment-service", base_url, timeout, metrics),
        }
    }
}

#[async_trait]
impl PaymentAuthority for HttpPaymentAuthority {
    async fn create_payment(
        &self,
        order_id: OrderId,
        customer_id: CustomerId,
        amount: f64,
        currency: &str,
    ) -> Result<PaymentIntent, ClientError> {
        let intent: PaymentIntent = self
            .client
            .post_json(
                "/payments",
                &PaymentRequest {
                    order_id,
                    customer_id,
                    amount,
                    currency,
                },
            )
            .await?;

        info!(order_id = %order_id, amount = %amount, currency = %currency, "Payment intent created");
        Ok(intent)
    }
}
