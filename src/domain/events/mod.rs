//! Domain events
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::aggregates::{NotificationKind, OrderStatus};

#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum DomainEvent {
    Cart(CartEvent),
    Order(OrderEvent),
    Notification(NotificationEvent),
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CartEvent {
    ItemAdded { clerk_id: String, product_id: Uuid, quantity: i32, unit_price: Decimal },
    Cleared { clerk_id: String },
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum OrderEvent {
    Created { order_id: Uuid, order_number: String, clerk_id: String, total: Decimal },
    StatusChanged { order_id: Uuid, from: OrderStatus, to: OrderStatus },
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum NotificationEvent {
    Created { notification_id: Uuid, order_id: Option<Uuid>, kind: Option<NotificationKind> },
}

impl DomainEvent {
    /// NATS subject the event is published on.
    pub fn subject(&self) -> &'static str {
        match self {
            Self::Cart(CartEvent::ItemAdded { .. }) => "storefront.cart.item_added",
            Self::Cart(CartEvent::Cleared { .. }) => "storefront.cart.cleared",
            Self::Order(OrderEvent::Created { .. }) => "storefront.order.created",
            Self::Order(OrderEvent::StatusChanged { .. }) => "storefront.order.status_changed",
            Self::Notification(NotificationEvent::Created { .. }) => "storefront.notification.created",
        }
    }
}

/// Fire-and-forget publisher; without a NATS connection events are dropped.
#[derive(Clone, Default)]
pub struct EventPublisher {
    nats: Option<async_nats::Client>,
}

impl EventPublisher {
    pub fn new(nats: Option<async_nats::Client>) -> Self { Self { nats } }

    pub fn disabled() -> Self { Self::default() }

    pub async fn publish(&self, event: DomainEvent) {
        let Some(client) = &self.nats else { return };
        let subject = event.subject();
        let payload = match serde_json::to_vec(&event) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(subject, error = %e, "failed to encode domain event");
                return;
            }
        };
        if let Err(e) = client.publish(subject.to_string(), payload.into()).await {
            tracing::warn!(subject, error = %e, "failed to publish domain event");
        }
    }
}
