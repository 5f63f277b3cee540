pub mod memory;
pub mod order_repository;

pub use memory::InMemoryOrderRepository;
pub use order_repository::{OrderRepository, PostgresOrderRepository};
