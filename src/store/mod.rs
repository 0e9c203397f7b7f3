//! Persistence seam. Services talk to [`Store`]; PostgreSQL backs it in
//! production and [`memory::InMemoryStore`] backs it in tests.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::aggregates::{
    Cart, CartItem, Client, Employee, Notification, NotificationKind, Order, OrderStatus, Product,
};

pub use memory::InMemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("corrupt {entity} row {id}: {reason}")]
    Corrupt { entity: &'static str, id: String, reason: String },
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn product(&self, id: Uuid) -> StoreResult<Option<Product>>;
    /// Newest first, with the total row count.
    async fn list_products(&self, limit: i64, offset: i64) -> StoreResult<(Vec<Product>, i64)>;
    async fn client(&self, clerk_id: &str) -> StoreResult<Option<Client>>;
}

#[async_trait]
pub trait CartRepository: Send + Sync {
    /// The user's cart with its items, created empty on first access.
    async fn ensure_cart(&self, clerk_id: &str) -> StoreResult<Cart>;
    async fn insert_item(&self, item: &CartItem) -> StoreResult<()>;
    async fn update_item(&self, item: &CartItem) -> StoreResult<()>;
    /// Deletes only when the item belongs to `cart_id`.
    async fn delete_item(&self, cart_id: Uuid, item_id: Uuid) -> StoreResult<bool>;
    async fn clear_cart(&self, cart_id: Uuid) -> StoreResult<u64>;
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Persists the order and its items and empties the cart, atomically.
    async fn place_order(&self, order: &Order, cart_id: Uuid) -> StoreResult<()>;
    async fn order(&self, id: Uuid) -> StoreResult<Option<Order>>;
    async fn list_orders(&self, limit: i64) -> StoreResult<Vec<Order>>;
    async fn pending_orders_created_before(&self, cutoff: DateTime<Utc>) -> StoreResult<Vec<Order>>;
    async fn pending_orders_created_after(&self, cutoff: DateTime<Utc>) -> StoreResult<Vec<Order>>;
    async fn update_order_status(&self, id: Uuid, status: OrderStatus) -> StoreResult<bool>;
}

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn notification_exists(&self, order_id: Uuid, kind: NotificationKind) -> StoreResult<bool>;
    async fn insert_notification(&self, notification: &Notification) -> StoreResult<()>;
    async fn list_notifications(&self, recipient: &str, unread_only: bool, limit: i64) -> StoreResult<Vec<Notification>>;
    async fn mark_read(&self, id: Uuid) -> StoreResult<bool>;
    async fn mark_all_read(&self, recipient: &str) -> StoreResult<u64>;
}

#[async_trait]
pub trait EmployeeRepository: Send + Sync {
    async fn employee_by_email(&self, email: &str) -> StoreResult<Option<Employee>>;
}

/// Everything the services need from persistence.
pub trait Store:
    CatalogRepository + CartRepository + OrderRepository + NotificationRepository + EmployeeRepository
{
}

impl<T> Store for T where
    T: CatalogRepository + CartRepository + OrderRepository + NotificationRepository + EmployeeRepository
{
}
