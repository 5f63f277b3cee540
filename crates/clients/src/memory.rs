//! In-memory collaborators for tests and local runs.

use async_trait::async_trait;
use domain::{CustomerId, OrderId, OrderStatus, ProductId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use crate::{ClientError, InventoryChecker, NotificationDispatcher, PaymentAuthority, PaymentIntent};

/// Stock levels per product; unknown products have no stock
#[derive(Default)]
pub struct InMemoryInventory {
    stock: Mutex<HashMap<ProductId, i32>>,
    unavailable: AtomicBool,
    delay: Option<Duration>,
    checks: AtomicUsize,
}

impl InMemoryInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stock(stock: impl IntoIterator<Item = (ProductId, i32)>) -> Self {
        Self {
            stock: Mutex::new(stock.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Make every check take at least `delay`
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn set_stock(&self, product_id: ProductId, quantity: i32) {
        self.stock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(product_id, quantity);
    }

    /// Simulate the inventory service being unreachable
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn checks(&self) -> usize {
        self.checks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InventoryChecker for InMemoryInventory {
    async fn check_availability(
        &self,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<bool, ClientError> {
        self.checks.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(ClientError::Unavailable("inventory-service".to_string()));
        }

        let stock = self
            .stock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&product_id)
            .copied()
            .unwrap_or(0);
        Ok(stock >= quantity)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRecord {
    pub order_id: OrderId,
    pub customer_id: CustomerId,
    pub amount: f64,
    pub currency: String,
}

/// Accepts every payment unless told to fail
#[derive(Default)]
pub struct InMemoryPayments {
    failing: AtomicBool,
    payments: Mutex<Vec<PaymentRecord>>,
}

impl InMemoryPayments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn payments(&self) -> Vec<PaymentRecord> {
        self.payments
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl PaymentAuthority for InMemoryPayments {
    async fn create_payment(
        &self,
        order_id: OrderId,
        customer_id: CustomerId,
        amount: f64,
        currency: &str,
    ) -> Result<PaymentIntent, ClientError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ClientError::Unavailable("payment-service".to_string()));
        }

        self.payments
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(PaymentRecord {
                order_id,
                customer_id,
                amount,
                currency: currency.to_string(),
            });

        Ok(PaymentIntent {
            payment: serde_json::json!({
                "id": format!("pi_{}", order_id),
                "amount": amount,
                "currency": currency,
                "status": "requires_payment_method",
            }),
            client_secret: Some(format!("pi_{}_secret", order_id)),
            message: None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentNotification {
    Created(OrderId),
    StatusUpdate {
        order_id: OrderId,
        customer_id: CustomerId,
        status: OrderStatus,
    },
}

/// Records every notification it is asked to deliver
#[derive(Default)]
pub struct InMemoryNotifications {
    failing: AtomicBool,
    sent: Mutex<Vec<SentNotification>>,
}

impl InMemoryNotifications {
    pub fn new() -> Self {
        Self::default()
    }

    /// Failed sends are still recorded as attempts
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<SentNotification> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn status_updates(&self) -> Vec<(OrderId, CustomerId, OrderStatus)> {
        self.sent()
            .into_iter()
            .filter_map(|n| match n {
                SentNotification::StatusUpdate {
                    order_id,
                    customer_id,
                    status,
                } => Some((order_id, customer_id, status)),
                SentNotification::Created(_) => None,
            })
            .collect()
    }

    fn record(&self, notification: SentNotification) -> Result<(), ClientError> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notification);

        if self.failing.load(Ordering::SeqCst) {
            return Err(ClientError::Unavailable("notification-service".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl NotificationDispatcher for InMemoryNotifications {
    async fn send_created(&self, order_id: OrderId) -> Result<(), ClientError> {
        self.record(SentNotification::Created(order_id))
    }

    async fn send_status_update(
        &self,
        order_id: OrderId,
        customer_id: CustomerId,
        status: OrderStatus,
    ) -> Result<(), ClientError> {
        self.record(SentNotification::StatusUpdate {
            order_id,
            customer_id,
            status,
        })
    }
}
