use async_trait::async_trait;
use domain::{NewOrder, Order, OrderId, OrderStatus, UpdateOrderCommand};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

use super::OrderRepository;
use crate::RepositoryError;

/// In-memory order store for tests and local runs
#[derive(Debug, Default)]
pub struct InMemoryOrderRepository {
    orders: RwLock<BTreeMap<OrderId, Order>>,
    next_id: AtomicI64,
    reads: AtomicUsize,
    read_delay: Option<Duration>,
    unavailable: AtomicBool,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every point read sleep first, to widen race windows in tests
    pub fn with_read_delay(mut self, delay: Duration) -> Self {
        self.read_delay = Some(delay);
        self
    }

    /// Number of point reads served so far
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Make every subsequent operation fail
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize {
        self.orders.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.orders.read().await.is_empty()
    }

    /// Remove a row behind the service's back
    pub async fn remove(&self, id: OrderId) -> Option<Order> {
        self.orders.write().await.remove(&id)
    }

    fn check_available(&self) -> Result<(), RepositoryError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable(
                "in-memory store switched off".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn insert(&self, order: &NewOrder) -> Result<OrderId, RepositoryError> {
        self.check_available()?;

        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.orders
            .write()
            .await
            .insert(id, order.clone().into_order(id));
        Ok(id)
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.read_delay {
            tokio::time::sleep(delay).await;
        }
        self.check_available()?;

        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Order>, RepositoryError> {
        self.check_available()?;
        Ok(self.orders.read().await.values().cloned().collect())
    }

    async fn update(
        &self,
        id: OrderId,
        order: &UpdateOrderCommand,
    ) -> Result<u64, RepositoryError> {
        self.check_available()?;

        match self.orders.write().await.get_mut(&id) {
            Some(stored) => {
                stored.customer_id = order.customer_id;
                stored.product_id = order.product_id;
                stored.quantity = order.quantity;
                stored.total_price = order.total_price;
                stored.status = order.status;
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<u64, RepositoryError> {
        self.check_available()?;

        match self.orders.write().await.get_mut(&id) {
            Some(stored) => {
                stored.status = status;
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete(&self, id: OrderId) -> Result<u64, RepositoryError> {
        self.check_available()?;
        Ok(u64::from(self.orders.write().await.remove(&id).is_some()))
    }
}
