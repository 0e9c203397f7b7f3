use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use storefront_api::auth::{AuthError, SessionClaims, TokenVerifier};
use storefront_api::domain::aggregates::{
    Cart, CartItem, Client, CustomerContact, Employee, EmployeeRole, Notification, NotificationKind, Order,
    OrderStatus, Product,
};
use storefront_api::domain::events::EventPublisher;
use storefront_api::store::{
    CartRepository, CatalogRepository, EmployeeRepository, InMemoryStore, NotificationRepository, OrderRepository,
    StoreError, StoreResult,
};
use storefront_api::{router, AppState};

/// In-memory store whose pending-order queries fail, as when the orders table is unreachable.
struct BrokenOrderQueries(InMemoryStore);

fn unavailable() -> StoreError {
    StoreError::Database(sqlx::Error::PoolTimedOut)
}

#[async_trait]
impl CatalogRepository for BrokenOrderQueries {
    async fn product(&self, id: Uuid) -> StoreResult<Option<Product>> {
        self.0.product(id).await
    }
    async fn list_products(&self, limit: i64, offset: i64) -> StoreResult<(Vec<Product>, i64)> {
        self.0.list_products(limit, offset).await
    }
    async fn client(&self, clerk_id: &str) -> StoreResult<Option<Client>> {
        self.0.client(clerk_id).await
    }
}

#[async_trait]
impl CartRepository for BrokenOrderQueries {
    async fn ensure_cart(&self, clerk_id: &str) -> StoreResult<Cart> {
        self.0.ensure_cart(clerk_id).await
    }
    async fn insert_item(&self, item: &CartItem) -> StoreResult<()> {
        self.0.insert_item(item).await
    }
    async fn update_item(&self, item: &CartItem) -> StoreResult<()> {
        self.0.update_item(item).await
    }
    async fn delete_item(&self, cart_id: Uuid, item_id: Uuid) -> StoreResult<bool> {
        self.0.delete_item(cart_id, item_id).await
    }
    async fn clear_cart(&self, cart_id: Uuid) -> StoreResult<u64> {
        self.0.clear_cart(cart_id).await
    }
}

#[async_trait]
impl OrderRepository for BrokenOrderQueries {
    async fn place_order(&self, order: &Order, cart_id: Uuid) -> StoreResult<()> {
        self.0.place_order(order, cart_id).await
    }
    async fn order(&self, id: Uuid) -> StoreResult<Option<Order>> {
        self.0.order(id).await
    }
    async fn list_orders(&self, limit: i64) -> StoreResult<Vec<Order>> {
        self.0.list_orders(limit).await
    }
    async fn pending_orders_created_before(&self, _cutoff: DateTime<Utc>) -> StoreResult<Vec<Order>> {
        Err(unavailable())
    }
    async fn pending_orders_created_after(&self, _cutoff: DateTime<Utc>) -> StoreResult<Vec<Order>> {
        Err(unavailable())
    }
    async fn update_order_status(&self, id: Uuid, status: OrderStatus) -> StoreResult<bool> {
        self.0.update_order_status(id, status).await
    }
}

#[async_trait]
impl NotificationRepository for BrokenOrderQueries {
    async fn notification_exists(&self, order_id: Uuid, kind: NotificationKind) -> StoreResult<bool> {
        self.0.notification_exists(order_id, kind).await
    }
    async fn insert_notification(&self, notification: &Notification) -> StoreResult<()> {
        self.0.insert_notification(notification).await
    }
    async fn list_notifications(&self, recipient: &str, unread_only: bool, limit: i64) -> StoreResult<Vec<Notification>> {
        self.0.list_notifications(recipient, unread_only, limit).await
    }
    async fn mark_read(&self, id: Uuid) -> StoreResult<bool> {
        self.0.mark_read(id).await
    }
    async fn mark_all_read(&self, recipient: &str) -> StoreResult<u64> {
        self.0.mark_all_read(recipient).await
    }
}

#[async_trait]
impl EmployeeRepository for BrokenOrderQueries {
    async fn employee_by_email(&self, email: &str) -> StoreResult<Option<Employee>> {
        self.0.employee_by_email(email).await
    }
}

struct AdminOnly;

#[axum::async_trait]
impl TokenVerifier for AdminOnly {
    async fn verify(&self, token: &str) -> Result<SessionClaims, AuthError> {
        if token != "admin" {
            return Err(AuthError::InvalidToken);
        }
        Ok(SessionClaims { sub: "a1".into(), email: Some("gerant@boutique.tn".into()), exp: usize::MAX, sid: None })
    }
}

#[tokio::test]
async fn test_failing_sweep_still_lists_notifications() {
    let inner = InMemoryStore::new();
    inner
        .put_employee(Employee {
            id: Uuid::now_v7(),
            email: "gerant@boutique.tn".into(),
            full_name: "Karim Gerant".into(),
            role: EmployeeRole::Admin,
            is_active: true,
        })
        .await;
    let mut order = Order::from_cart(&Cart::for_user("u1"), CustomerContact { full_name: "Salma".into(), ..Default::default() });
    order.created_at = Utc::now() - Duration::hours(3);
    inner.insert_notification(&Notification::new_order(&order)).await.unwrap();
    inner.put_order(order).await;

    let state = AppState::new(Arc::new(BrokenOrderQueries(inner)), Arc::new(AdminOnly), EventPublisher::disabled());
    let request = Request::builder()
        .uri("/notifications")
        .header(header::AUTHORIZATION, "Bearer admin")
        .body(Body::empty())
        .unwrap();
    let response = router(state).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let listed: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(listed.as_array().map(Vec::len), Some(1));
    assert_eq!(listed[0]["kind"], "new_order");
}
