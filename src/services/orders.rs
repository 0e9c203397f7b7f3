//! Checkout and order administration.

use std::sync::Arc;

use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::domain::aggregates::{CustomerContact, Notification, Order, OrderStatus};
use crate::domain::events::{DomainEvent, EventPublisher, NotificationEvent, OrderEvent};
use crate::error::{Result, StorefrontError};
use crate::stock::check_stock;
use crate::store::Store;

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    #[validate(length(min = 2, max = 120))]
    pub full_name: String,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 8, max = 20))]
    pub phone: String,
    #[validate(length(min = 5, max = 300))]
    pub address: String,
    #[validate(length(max = 120))]
    pub city: Option<String>,
    #[validate(length(max = 1000))]
    pub note: Option<String>,
}

impl From<CheckoutRequest> for CustomerContact {
    fn from(r: CheckoutRequest) -> Self {
        CustomerContact {
            full_name: r.full_name.trim().to_string(),
            email: r.email,
            phone: r.phone.trim().to_string(),
            address: r.address.trim().to_string(),
            city: r.city,
            note: r.note,
        }
    }
}

pub struct OrderService {
    store: Arc<dyn Store>,
    events: EventPublisher,
}

impl OrderService {
    pub fn new(store: Arc<dyn Store>, events: EventPublisher) -> Self {
        Self { store, events }
    }

    /// Turns the user's cart into a pending order and empties the cart.
    #[tracing::instrument(skip(self, req))]
    pub async fn checkout(&self, clerk_id: &str, req: CheckoutRequest) -> Result<Order> {
        req.validate()?;
        let cart = self.store.ensure_cart(clerk_id).await?;
        if cart.is_empty() {
            return Err(StorefrontError::Validation("Cart is empty".into()));
        }

        let unit = self.store.client(clerk_id).await?.map(|c| c.purchase_unit).unwrap_or_default();
        for line in &cart.items {
            let product = self.store.product(line.product_id).await?.ok_or_else(|| {
                StorefrontError::Validation(format!("{} is no longer available", line.title_at_add))
            })?;
            let combination = match line.combination_id.as_deref() {
                Some(id) => Some(product.combination(id).ok_or_else(|| {
                    StorefrontError::Validation(format!("{} is no longer available", line.title_at_add))
                })?),
                None => None,
            };
            let mode = product.sale_type.unit_for(unit).mode();
            let (_, mut check) = check_stock(&product, combination, mode, line.quantity);
            if !check.valid {
                check.message = check.message.map(|m| format!("{}: {m}", line.title_at_add));
                return Err(StorefrontError::Quantity(check));
            }
        }

        let order = Order::from_cart(&cart, req.into());
        self.store.place_order(&order, cart.id).await?;
        tracing::info!(order_id = %order.id, order_number = %order.order_number, total = %order.total, "order placed");

        let notification = Notification::new_order(&order);
        match self.store.insert_notification(&notification).await {
            Ok(()) => {
                self.events
                    .publish(DomainEvent::Notification(NotificationEvent::Created {
                        notification_id: notification.id,
                        order_id: notification.order_id,
                        kind: notification.kind,
                    }))
                    .await
            }
            // the new-order sweep on the next notification poll catches up
            Err(e) => tracing::warn!(order_id = %order.id, error = %e, "failed to record new-order notification"),
        }

        self.events
            .publish(DomainEvent::Order(OrderEvent::Created {
                order_id: order.id,
                order_number: order.order_number.clone(),
                clerk_id: order.clerk_id.clone(),
                total: order.total,
            }))
            .await;
        Ok(order)
    }

    /// Orders are only visible to the user who placed them.
    pub async fn get_for_user(&self, clerk_id: &str, id: Uuid) -> Result<Order> {
        self.store
            .order(id)
            .await?
            .filter(|o| o.clerk_id == clerk_id)
            .ok_or(StorefrontError::NotFound("Order"))
    }

    pub async fn list(&self, limit: i64) -> Result<Vec<Order>> {
        Ok(self.store.list_orders(limit.clamp(1, 200)).await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn update_status(&self, id: Uuid, next: OrderStatus) -> Result<Order> {
        let mut order = self.store.order(id).await?.ok_or(StorefrontError::NotFound("Order"))?;
        let from = order.status;
        if !from.can_transition_to(next) {
            return Err(StorefrontError::Validation(format!("Cannot move an order from {from} to {next}")));
        }
        if !self.store.update_order_status(id, next).await? {
            return Err(StorefrontError::NotFound("Order"));
        }
        order.status = next;
        self.events.publish(DomainEvent::Order(OrderEvent::StatusChanged { order_id: id, from, to: next })).await;
        Ok(order)
    }
}
