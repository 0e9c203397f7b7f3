//! Order Aggregate

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::aggregates::cart::Cart;
use crate::domain::value_objects::{round_price, text_enum};

text_enum! {
    pub enum OrderStatus: "order status" {
        Pending => "pending",
        PendingPayment => "pending_payment",
        Paid => "paid",
        Shipped => "shipped",
        Delivered => "delivered",
        Cancelled => "cancelled",
    }
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        match (self, next) {
            (Pending, PendingPayment | Paid) | (PendingPayment, Paid) | (Paid, Shipped) | (Shipped, Delivered) => true,
            (current, Cancelled) => !current.is_terminal(),
            _ => false,
        }
    }
}

/// Who the order ships to.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerContact {
    pub full_name: String,
    pub email: Option<String>,
    pub phone: String,
    pub address: String,
    pub city: Option<String>,
    pub note: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub clerk_id: String,
    #[serde(flatten)]
    pub contact: CustomerContact,
    pub status: OrderStatus,
    pub total: Decimal,
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Immutable price snapshot of one ordered line.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub combination_id: Option<String>,
    pub options: BTreeMap<String, String>,
    pub title: String,
    pub image_url: Option<String>,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub line_total: Decimal,
}

impl Order {
    /// Snapshot every cart line into a new pending order.
    pub fn from_cart(cart: &Cart, contact: CustomerContact) -> Self {
        let id = Uuid::now_v7();
        let now = Utc::now();
        let items: Vec<OrderItem> = cart
            .items
            .iter()
            .map(|line| OrderItem {
                id: Uuid::now_v7(),
                order_id: id,
                product_id: line.product_id,
                combination_id: line.combination_id.clone(),
                options: line.options.clone(),
                title: line.title_at_add.clone(),
                image_url: line.image_at_add.clone(),
                unit_price: line.price_at_add,
                quantity: line.quantity,
                line_total: line.line_total(),
            })
            .collect();
        let total = round_price(items.iter().map(|i| i.line_total).sum());
        Self {
            id,
            order_number: order_number_for(id),
            clerk_id: cart.clerk_id.clone(),
            contact,
            status: OrderStatus::Pending,
            total,
            items,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration { now - self.created_at }
}

/// Human-facing reference built from the random tail of the id.
pub fn order_number_for(id: Uuid) -> String {
    let hex = id.simple().to_string();
    format!("CMD-{}", hex[hex.len() - 8..].to_uppercase())
}
