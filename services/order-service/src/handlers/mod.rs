pub mod batch_orders;
pub mod create_order;
pub mod delete_order;
pub mod get_order;
pub mod health;
pub mod metrics;
pub mod update_order;
