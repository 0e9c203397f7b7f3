//! In-memory store, used by the test suites and for local experiments.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    CartRepository, CatalogRepository, EmployeeRepository, NotificationRepository, OrderRepository, StoreResult,
};
use crate::domain::aggregates::{
    Cart, CartItem, Client, Employee, Notification, NotificationKind, Order, OrderStatus, Product,
};

#[derive(Default)]
struct State {
    products: HashMap<Uuid, Product>,
    clients: HashMap<String, Client>,
    employees: Vec<Employee>,
    carts: HashMap<String, Cart>,
    orders: Vec<Order>,
    notifications: Vec<Notification>,
}

#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self { Self::default() }

    pub async fn put_product(&self, product: Product) {
        self.state.write().await.products.insert(product.id, product);
    }

    pub async fn put_client(&self, client: Client) {
        self.state.write().await.clients.insert(client.clerk_id.clone(), client);
    }

    pub async fn put_employee(&self, employee: Employee) {
        self.state.write().await.employees.push(employee);
    }

    /// Inserts an order as-is, keeping its `created_at`.
    pub async fn put_order(&self, order: Order) {
        self.state.write().await.orders.push(order);
    }

    pub async fn notifications(&self) -> Vec<Notification> {
        self.state.read().await.notifications.clone()
    }
}

fn newest_first(mut orders: Vec<Order>) -> Vec<Order> {
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    orders
}

#[async_trait]
impl CatalogRepository for InMemoryStore {
    async fn product(&self, id: Uuid) -> StoreResult<Option<Product>> {
        Ok(self.state.read().await.products.get(&id).cloned())
    }

    async fn list_products(&self, limit: i64, offset: i64) -> StoreResult<(Vec<Product>, i64)> {
        let state = self.state.read().await;
        let mut all: Vec<Product> = state.products.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = all.len() as i64;
        let page = all
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(0))
            .take(usize::try_from(limit).unwrap_or(0))
            .collect();
        Ok((page, total))
    }

    async fn client(&self, clerk_id: &str) -> StoreResult<Option<Client>> {
        Ok(self.state.read().await.clients.get(clerk_id).cloned())
    }
}

#[async_trait]
impl CartRepository for InMemoryStore {
    async fn ensure_cart(&self, clerk_id: &str) -> StoreResult<Cart> {
        let mut state = self.state.write().await;
        let cart = state.carts.entry(clerk_id.to_string()).or_insert_with(|| Cart::for_user(clerk_id));
        Ok(cart.clone())
    }

    async fn insert_item(&self, item: &CartItem) -> StoreResult<()> {
        let mut state = self.state.write().await;
        if let Some(cart) = state.carts.values_mut().find(|c| c.id == item.cart_id) {
            cart.items.push(item.clone());
            cart.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn update_item(&self, item: &CartItem) -> StoreResult<()> {
        let mut state = self.state.write().await;
        let existing = state.carts.values_mut().flat_map(|c| c.items.iter_mut()).find(|i| i.id == item.id);
        if let Some(existing) = existing {
            *existing = item.clone();
        }
        Ok(())
    }

    async fn delete_item(&self, cart_id: Uuid, item_id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        let Some(cart) = state.carts.values_mut().find(|c| c.id == cart_id) else {
            return Ok(false);
        };
        let before = cart.items.len();
        cart.items.retain(|i| i.id != item_id);
        Ok(cart.items.len() < before)
    }

    async fn clear_cart(&self, cart_id: Uuid) -> StoreResult<u64> {
        let mut state = self.state.write().await;
        let Some(cart) = state.carts.values_mut().find(|c| c.id == cart_id) else {
            return Ok(0);
        };
        let removed = cart.items.len() as u64;
        cart.items.clear();
        Ok(removed)
    }
}

#[async_trait]
impl OrderRepository for InMemoryStore {
    async fn place_order(&self, order: &Order, cart_id: Uuid) -> StoreResult<()> {
        let mut state = self.state.write().await;
        state.orders.push(order.clone());
        if let Some(cart) = state.carts.values_mut().find(|c| c.id == cart_id) {
            cart.items.clear();
        }
        Ok(())
    }

    async fn order(&self, id: Uuid) -> StoreResult<Option<Order>> {
        Ok(self.state.read().await.orders.iter().find(|o| o.id == id).cloned())
    }

    async fn list_orders(&self, limit: i64) -> StoreResult<Vec<Order>> {
        let orders = newest_first(self.state.read().await.orders.clone());
        Ok(orders.into_iter().take(usize::try_from(limit).unwrap_or(0)).collect())
    }

    async fn pending_orders_created_before(&self, cutoff: DateTime<Utc>) -> StoreResult<Vec<Order>> {
        let state = self.state.read().await;
        Ok(state.orders.iter().filter(|o| o.status == OrderStatus::Pending && o.created_at < cutoff).cloned().collect())
    }

    async fn pending_orders_created_after(&self, cutoff: DateTime<Utc>) -> StoreResult<Vec<Order>> {
        let state = self.state.read().await;
        Ok(state.orders.iter().filter(|o| o.status == OrderStatus::Pending && o.created_at >= cutoff).cloned().collect())
    }

    async fn update_order_status(&self, id: Uuid, status: OrderStatus) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        let Some(order) = state.orders.iter_mut().find(|o| o.id == id) else {
            return Ok(false);
        };
        order.status = status;
        order.updated_at = Utc::now();
        Ok(true)
    }
}

#[async_trait]
impl NotificationRepository for InMemoryStore {
    async fn notification_exists(&self, order_id: Uuid, kind: NotificationKind) -> StoreResult<bool> {
        Ok(self.state.read().await.notifications.iter().any(|n| n.covers(order_id, kind)))
    }

    async fn insert_notification(&self, notification: &Notification) -> StoreResult<()> {
        self.state.write().await.notifications.push(notification.clone());
        Ok(())
    }

    async fn list_notifications(&self, recipient: &str, unread_only: bool, limit: i64) -> StoreResult<Vec<Notification>> {
        let state = self.state.read().await;
        let mut found: Vec<Notification> = state
            .notifications
            .iter()
            .filter(|n| n.recipient == recipient && (!unread_only || !n.read))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        found.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(found)
    }

    async fn mark_read(&self, id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        let Some(n) = state.notifications.iter_mut().find(|n| n.id == id) else {
            return Ok(false);
        };
        n.read = true;
        Ok(true)
    }

    async fn mark_all_read(&self, recipient: &str) -> StoreResult<u64> {
        let mut state = self.state.write().await;
        let mut count = 0;
        for n in state.notifications.iter_mut().filter(|n| n.recipient == recipient && !n.read) {
            n.read = true;
            count += 1;
        }
        Ok(count)
    }
}

#[async_trait]
impl EmployeeRepository for InMemoryStore {
    async fn employee_by_email(&self, email: &str) -> StoreResult<Option<Employee>> {
        let state = self.state.read().await;
        Ok(state.employees.iter().find(|e| e.email.eq_ignore_ascii_case(email)).cloned())
    }
}
