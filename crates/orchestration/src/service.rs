use async_trait::async_trait;
use clients::{InventoryChecker, NotificationDispatcher, PaymentAuthority, PaymentIntent};
use common::{AppConfig, MetricsRecorder};
use domain::{
    CreateOrderCommand, CreateOrderWithPaymentCommand, DomainEvent, EventMetadata, NewOrder,
    Order, OrderCreatedEvent, OrderId, OrderStatus, UpdateOrderCommand,
};
use messaging::EventPublisher;
use persistence::{Cache, CacheAside, OrderRepository, RepositoryError};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};
use validator::Validate;

use crate::batch::OrderCreator;
use crate::errors::{OrderError, Result};
use crate::notifier::StatusNotifier;
use crate::tasks::TaskRunner;

const EVENT_SOURCE: &str = "order-service";

/// Collaborators the order pipeline calls out to
pub struct OrderDependencies {
    pub repository: Arc<dyn OrderRepository>,
    pub cache: Arc<dyn Cache>,
    pub inventory: Arc<dyn InventoryChecker>,
    pub payments: Arc<dyn PaymentAuthority>,
    pub publisher: Arc<dyn EventPublisher>,
    pub notifications: Arc<dyn NotificationDispatcher>,
    pub metrics: Arc<dyn MetricsRecorder>,
}

#[derive(Debug, Clone)]
pub struct OrderServiceConfig {
    /// How long a cached order is served before the store is read again
    pub cache_ttl: Duration,
    pub orders_topic: String,
    pub created_routing_key: String,
}

impl OrderServiceConfig {
    pub fn from_app(config: &AppConfig) -> Self {
        Self {
            cache_ttl: config.redis.order_ttl(),
            orders_topic: config.kafka.orders_topic.clone(),
            created_routing_key: config.kafka.created_routing_key.clone(),
        }
    }
}

impl Default for OrderServiceConfig {
    fn default() -> Self {
        Self::from_app(&AppConfig::default())
    }
}

/// Result of a payment intent request made after the order was persisted
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum PaymentOutcome {
    #[serde(rename = "payment")]
    Created(PaymentIntent),
    #[serde(rename = "payment_error")]
    Failed(String),
}

/// Serializes as `{order, payment}` or `{order, payment_error}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderWithPayment {
    pub order: Order,
    #[serde(flatten)]
    pub payment: PaymentOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusUpdateAck {
    pub order_id: OrderId,
    pub status: OrderStatus,
}

/// Per-order business pipeline:
/// validate, check inventory, persist, publish, notify.
pub struct OrderService {
    repository: Arc<dyn OrderRepository>,
    inventory: Arc<dyn InventoryChecker>,
    payments: Arc<dyn PaymentAuthority>,
    publisher: Arc<dyn EventPublisher>,
    notifications: Arc<dyn NotificationDispatcher>,
    notifier: StatusNotifier,
    metrics: Arc<dyn MetricsRecorder>,
    orders: CacheAside<Order, OrderError>,
    tasks: TaskRunner,
    config: OrderServiceConfig,
}

impl OrderService {
    pub fn new(deps: OrderDependencies, config: OrderServiceConfig) -> Self {
        Self {
            orders: CacheAside::new(deps.cache, "order", deps.metrics.clone()),
            notifier: StatusNotifier::new(deps.notifications.clone()),
            repository: deps.repository,
            inventory: deps.inventory,
            payments: deps.payments,
            publisher: deps.publisher,
            notifications: deps.notifications,
            metrics: deps.metrics,
            tasks: TaskRunner::new(),
            config,
        }
    }

    /// Runner holding creation notifications still in flight
    pub fn tasks(&self) -> &TaskRunner {
        &self.tasks
    }

    pub async fn create_order(&self, cmd: CreateOrderCommand) -> Result<Order> {
        let started = Instant::now();
        let result = self.place(&cmd).await;
        self.record("create_order", result.is_ok(), started);

        let order = result?;
        self.after_created(&order).await;
        Ok(order)
    }

    /// Create an order, then open a payment intent for it. A failed payment
    /// does not undo the order; it is reported alongside it.
    pub async fn create_order_with_payment(
        &self,
        cmd: CreateOrderWithPaymentCommand,
    ) -> Result<OrderWithPayment> {
        let started = Instant::now();
        let result = match cmd.validate() {
            Ok(()) => self.place(&cmd.order).await,
            Err(e) => Err(e.into()),
        };
        self.record("create_order_with_payment", result.is_ok(), started);
        let order = result?;

        let payment = match self
            .payments
            .create_payment(order.id, order.customer_id, order.total_price, &cmd.currency)
            .await
        {
            Ok(intent) => PaymentOutcome::Created(intent),
            Err(e) => {
                warn!(order_id = %order.id, error = %e, "Failed to create payment intent");
                PaymentOutcome::Failed(format!("Failed to create payment intent: {}", e))
            }
        };

        self.after_created(&order).await;
        Ok(OrderWithPayment { order, payment })
    }

    pub async fn list_orders(&self) -> Result<Vec<Order>> {
        let started = Instant::now();
        let result = self
            .repository
            .list()
            .await
            .map_err(|e| store_failure("list orders", e));
        self.record("list_orders", result.is_ok(), started);
        result
    }

    pub async fn get_order(&self, id: OrderId) -> Result<Order> {
        let started = Instant::now();
        // Updates and deletes do not evict this key, so a cached order may be
        // stale until its TTL runs out.
        let key = format!("order:{}", id);
        let result = self
            .orders
            .get_or_set(&key, self.config.cache_ttl, || self.load_order(id))
            .await;
        self.record("get_order", result.is_ok(), started);
        result
    }

    /// Overwrite every mutable field. Notifies the customer when the status
    /// changed.
    pub async fn update_order(&self, id: OrderId, cmd: UpdateOrderCommand) -> Result<Order> {
        let started = Instant::now();
        let result = self.overwrite(id, cmd).await;
        self.record("update_order", result.is_ok(), started);
        result
    }

    pub async fn update_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<StatusUpdateAck> {
        let started = Instant::now();
        let result = self.change_status(id, status).await;
        self.record("update_order_status", result.is_ok(), started);
        result
    }

    /// Delete an order and tell the customer it was cancelled
    pub async fn delete_order(&self, id: OrderId) -> Result<()> {
        let started = Instant::now();
        let result = self.remove(id).await;
        self.record("delete_order", result.is_ok(), started);
        result
    }

    async fn place(&self, cmd: &CreateOrderCommand) -> Result<Order> {
        cmd.validate()?;

        let available = self
            .inventory
            .check_availability(cmd.product_id, cmd.quantity)
            .await
            .map_err(|e| {
                error!(product_id = %cmd.product_id, error = %e, "Inventory check failed");
                OrderError::InventoryService(e.to_string())
            })?;

        if !available {
            info!(
                product_id = %cmd.product_id,
                quantity = %cmd.quantity,
                "Rejecting order, insufficient inventory"
            );
            return Err(OrderError::InsufficientInventory);
        }

        let new_order = NewOrder::pending(cmd);
        let id = self
            .repository
            .insert(&new_order)
            .await
            .map_err(|e| store_failure("insert order", e))?;

        self.metrics.order_created();
        self.metrics.increment_active_orders();
        info!(order_id = %id, customer_id = %cmd.customer_id, "Order created");

        Ok(new_order.into_order(id))
    }

    async fn after_created(&self, order: &Order) {
        self.publish_created(order).await;

        let notifications = self.notifications.clone();
        let order_id = order.id;
        self.tasks.spawn("order-created-notification", async move {
            notifications.send_created(order_id).await
        });
    }

    async fn publish_created(&self, order: &Order) {
        let payload = OrderCreatedEvent {
            order: order.clone(),
        }
        .to_envelope(order.id, EventMetadata::new(EVENT_SOURCE))
        .and_then(|envelope| serde_json::to_vec(&envelope));

        let payload = match payload {
            Ok(payload) => payload,
            Err(e) => {
                warn!(order_id = %order.id, error = %e, "Failed to encode order created event");
                return;
            }
        };

        if let Err(e) = self
            .publisher
            .publish(
                &self.config.orders_topic,
                &self.config.created_routing_key,
                &payload,
            )
            .await
        {
            warn!(order_id = %order.id, error = %e, "Failed to publish order created event");
        }
    }

    async fn load_order(&self, id: OrderId) -> Result<Order> {
        self.repository
            .get(id)
            .await
            .map_err(|e| store_failure("get order", e))?
            .ok_or(OrderError::NotFound(id))
    }

    async fn overwrite(&self, id: OrderId, cmd: UpdateOrderCommand) -> Result<Order> {
        cmd.validate()?;
        let existing = self.load_order(id).await?;

        let affected = self
            .repository
            .update(id, &cmd)
            .await
            .map_err(|e| store_failure("update order", e))?;
        if affected == 0 {
            warn!(order_id = %id, "Order disappeared before update");
            return Err(OrderError::NotFound(id));
        }

        if existing.status != cmd.status {
            self.notifier
                .status_changed(id, cmd.customer_id, cmd.status)
                .await;
        }

        info!(order_id = %id, "Order updated");
        Ok(Order {
            id,
            customer_id: cmd.customer_id,
            product_id: cmd.product_id,
            quantity: cmd.quantity,
            total_price: cmd.total_price,
            status: cmd.status,
            created_at: existing.created_at,
        })
    }

    async fn change_status(&self, id: OrderId, status: OrderStatus) -> Result<StatusUpdateAck> {
        let existing = self.load_order(id).await?;

        let affected = self
            .repository
            .update_status(id, status)
            .await
            .map_err(|e| store_failure("update order status", e))?;
        if affected == 0 {
            warn!(order_id = %id, "Order disappeared before status update");
            return Err(OrderError::NotFound(id));
        }

        self.metrics.order_status_updated(status.as_str());
        if status.is_terminal() {
            self.metrics.decrement_active_orders();
        }

        self.notifier
            .status_changed(id, existing.customer_id, status)
            .await;

        info!(order_id = %id, status = %status, "Order status updated");
        Ok(StatusUpdateAck {
            order_id: id,
            status,
        })
    }

    async fn remove(&self, id: OrderId) -> Result<()> {
        let existing = self.load_order(id).await?;

        let affected = self
            .repository
            .delete(id)
            .await
            .map_err(|e| store_failure("delete order", e))?;
        if affected == 0 {
            warn!(order_id = %id, "Order disappeared before delete");
            return Err(OrderError::NotFound(id));
        }

        self.notifier
            .status_changed(id, existing.customer_id, OrderStatus::Cancelled)
            .await;

        info!(order_id = %id, "Order deleted");
        Ok(())
    }

    fn record(&self, operation: &str, success: bool, started: Instant) {
        self.metrics
            .record_operation(operation, success, started.elapsed().as_secs_f64());
    }
}

#[async_trait]
impl OrderCreator for OrderService {
    async fn create_order(&self, cmd: CreateOrderCommand) -> Result<Order> {
        OrderService::create_order(self, cmd).await
    }
}

fn store_failure(operation: &str, err: RepositoryError) -> OrderError {
    error!(operation = %operation, error = %err, "Record store failure");
    err.into()
}
