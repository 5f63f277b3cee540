use clients::NotificationDispatcher;
use domain::{CustomerId, OrderId, OrderStatus};
use std::sync::Arc;
use tracing::{debug, warn};

/// Forwards status changes to the notification service. Failures are logged
/// and swallowed.
#[derive(Clone)]
pub struct StatusNotifier {
    dispatcher: Arc<dyn NotificationDispatcher>,
}

impl StatusNotifier {
    pub fn new(dispatcher: Arc<dyn NotificationDispatcher>) -> Self {
        Self { dispatcher }
    }

    pub async fn status_changed(
        &self,
        order_id: OrderId,
        customer_id: CustomerId,
        status: OrderStatus,
    ) {
        match self
            .dispatcher
            .send_status_update(order_id, customer_id, status)
            .await
        {
            Ok(()) => debug!(order_id = %order_id, status = %status, "Status update notification sent"),
            Err(e) => warn!(
                order_id = %order_id,
                status = %status,
                error = %e,
                "Failed to send status update notification"
            ),
        }
    }
}
