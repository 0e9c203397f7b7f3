//! Notification Aggregate

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::domain::aggregates::order::Order;
use crate::domain::value_objects::text_enum;

/// Everything raised for the back-office goes to this recipient.
pub const ADMIN_RECIPIENT: &str = "admin";

text_enum! {
    /// De-duplication key: at most one notification per order per kind.
    pub enum NotificationKind: "notification kind" {
        OrderOverdue => "order_overdue",
        NewOrder => "new_order",
    }
}

impl NotificationKind {
    /// Substring carried by titles written before the kind column existed.
    pub fn legacy_title_marker(self) -> &'static str {
        match self {
            Self::OrderOverdue => "en retard",
            Self::NewOrder => "Nouvelle commande",
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub kind: Option<NotificationKind>,
    #[serde(rename = "type")]
    pub notification_type: String,
    pub title: String,
    pub message: String,
    pub payload: serde_json::Value,
    pub read: bool,
    pub recipient: String,
    pub order_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    fn for_order(order: &Order, kind: NotificationKind, title: String, message: String) -> Self {
        Self {
            id: Uuid::now_v7(),
            kind: Some(kind),
            notification_type: "order".to_string(),
            title,
            message,
            payload: json!({
                "kind": kind.as_str(),
                "orderId": order.id,
                "orderNumber": order.order_number,
                "total": order.total,
            }),
            read: false,
            recipient: ADMIN_RECIPIENT.to_string(),
            order_id: Some(order.id),
            created_at: Utc::now(),
        }
    }

    pub fn order_overdue(order: &Order, now: DateTime<Utc>) -> Self {
        let hours = order.age(now).num_hours();
        Self::for_order(
            order,
            NotificationKind::OrderOverdue,
            format!("Commande {} en retard", order.order_number),
            format!(
                "La commande {} de {} est en attente depuis {} h (passée le {}).",
                order.order_number,
                order.contact.full_name,
                hours,
                order.created_at.format("%d/%m/%Y %H:%M"),
            ),
        )
    }

    pub fn new_order(order: &Order) -> Self {
        Self::for_order(
            order,
            NotificationKind::NewOrder,
            format!("Nouvelle commande {}", order.order_number),
            format!(
                "{} a passé une commande de {} TND ({} article(s)).",
                order.contact.full_name,
                order.total,
                order.items.len(),
            ),
        )
    }

    /// Whether this notification already covers `kind` for `order_id`,
    /// by structured kind, payload marker, or legacy title wording.
    pub fn covers(&self, order_id: Uuid, kind: NotificationKind) -> bool {
        if self.order_id != Some(order_id) {
            return false;
        }
        self.kind == Some(kind)
            || self.payload.get("kind").and_then(|k| k.as_str()) == Some(kind.as_str())
            || self.title.contains(kind.legacy_title_marker())
    }
}
