//! Cart Aggregate

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::value_objects::{line_total, round_price};

/// One cart per authenticated user.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub id: Uuid,
    pub clerk_id: String,
    pub items: Vec<CartItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A cart line. The `*_at_add` fields and the min/max bounds are snapshots
/// taken when the line was written; they are not refreshed when the product changes.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: Uuid,
    pub cart_id: Uuid,
    pub product_id: Uuid,
    pub combination_id: Option<String>,
    pub options: BTreeMap<String, String>,
    pub quantity: i32,
    pub price_at_add: Decimal,
    pub title_at_add: String,
    pub image_at_add: Option<String>,
    pub min_qty: i32,
    pub max_qty: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub id: Uuid,
    pub clerk_id: String,
    pub items: Vec<CartItem>,
    pub item_count: usize,
    pub total_quantity: i64,
    pub subtotal: Decimal,
}

impl CartItem {
    pub fn line_total(&self) -> Decimal { line_total(self.price_at_add, self.quantity) }

    /// Same product, same combination and same option selection.
    pub fn matches(&self, product_id: Uuid, combination_id: Option<&str>, options: &BTreeMap<String, String>) -> bool {
        self.product_id == product_id && self.combination_id.as_deref() == combination_id && &self.options == options
    }

    pub fn within_bounds(&self) -> bool {
        self.quantity >= self.min_qty && self.max_qty.map_or(true, |max| self.quantity <= max)
    }
}

impl Cart {
    pub fn for_user(clerk_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self { id: Uuid::now_v7(), clerk_id: clerk_id.into(), items: vec![], created_at: now, updated_at: now }
    }

    pub fn is_empty(&self) -> bool { self.items.is_empty() }

    pub fn item(&self, item_id: Uuid) -> Option<&CartItem> {
        self.items.iter().find(|i| i.id == item_id)
    }

    pub fn find_line(&self, product_id: Uuid, combination_id: Option<&str>, options: &BTreeMap<String, String>) -> Option<&CartItem> {
        self.items.iter().find(|i| i.matches(product_id, combination_id, options))
    }

    pub fn subtotal(&self) -> Decimal {
        round_price(self.items.iter().map(CartItem::line_total).sum())
    }

    pub fn view(self) -> CartView {
        let subtotal = self.subtotal();
        let total_quantity = self.items.iter().map(|i| i64::from(i.quantity)).sum();
        CartView {
            id: self.id,
            clerk_id: self.clerk_id,
            item_count: self.items.len(),
            total_quantity,
            subtotal,
            items: self.items,
        }
    }
}
