//! Cart operations for one user's cart: pricing, min/stock validation, persistence.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::domain::aggregates::{CartItem, CartView, Combination, Product};
use crate::domain::events::{CartEvent, DomainEvent, EventPublisher};
use crate::domain::value_objects::PurchaseUnit;
use crate::error::{Result, StorefrontError};
use crate::pricing::resolve_price;
use crate::stock::check_stock;
use crate::store::Store;

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub product_id: Uuid,
    pub combination_id: Option<String>,
    #[serde(default)]
    pub options: BTreeMap<String, String>,
    #[validate(range(min = 1, max = 100000))]
    pub quantity: i32,
    /// Unit price shown to the buyer. Stored verbatim when positive, without
    /// checking it against the catalog.
    #[validate(custom = "price_fits_column")]
    pub price_from_client: Option<Decimal>,
}

/// Rejects prices a `NUMERIC(12, 3)` column would round (more than 3 decimals) or overflow.
fn price_fits_column(price: &Decimal) -> std::result::Result<(), ValidationError> {
    if price.normalize().scale() > 3 {
        let mut err = ValidationError::new("price_scale");
        err.message = Some("must have at most 3 decimal places".into());
        return Err(err);
    }
    if price.abs() >= Decimal::from(1_000_000_000) {
        let mut err = ValidationError::new("price_range");
        err.message = Some("must be below 1000000000".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateQuantityRequest {
    #[validate(range(min = 1, max = 100000))]
    pub quantity: i32,
}

pub struct CartService {
    store: Arc<dyn Store>,
    events: EventPublisher,
}

/// "Title (v1 / v2)" for variant lines.
fn snapshot_title(product: &Product, options: &BTreeMap<String, String>) -> String {
    if options.is_empty() {
        return product.title.clone();
    }
    let values: Vec<&str> = options.values().map(String::as_str).collect();
    format!("{} ({})", product.title, values.join(" / "))
}

impl CartService {
    pub fn new(store: Arc<dyn Store>, events: EventPublisher) -> Self {
        Self { store, events }
    }

    async fn purchase_unit(&self, clerk_id: &str) -> Result<PurchaseUnit> {
        Ok(self.store.client(clerk_id).await?.map(|c| c.purchase_unit).unwrap_or_default())
    }

    async fn load_product(&self, id: Uuid) -> Result<Product> {
        self.store.product(id).await?.ok_or(StorefrontError::NotFound("Product"))
    }

    pub async fn get_with_items(&self, clerk_id: &str) -> Result<CartView> {
        Ok(self.store.ensure_cart(clerk_id).await?.view())
    }

    #[tracing::instrument(skip(self, req), fields(product_id = %req.product_id, quantity = req.quantity))]
    pub async fn add_or_update_item(&self, clerk_id: &str, req: AddItemRequest, now: DateTime<Utc>) -> Result<CartView> {
        req.validate()?;
        let product = self.load_product(req.product_id).await?;
        let combination: Option<&Combination> = match req.combination_id.as_deref() {
            Some(id) => Some(product.combination(id).ok_or(StorefrontError::NotFound("Combination"))?),
            None => product.find_combination(None, &req.options),
        };
        let options = match combination {
            Some(c) if req.options.is_empty() => c.options.clone(),
            _ => req.options.clone(),
        };
        let combination_id = combination.map(|c| c.id.clone());
        let unit = product.sale_type.unit_for(self.purchase_unit(clerk_id).await?);

        let price = match req.price_from_client {
            Some(p) if p > Decimal::ZERO => {
                tracing::debug!(price = %p, "using client-supplied price");
                p
            }
            _ => resolve_price(&product, combination, unit, now).price,
        };

        let cart = self.store.ensure_cart(clerk_id).await?;
        let existing = cart.find_line(product.id, combination_id.as_deref(), &options).cloned();
        let total_qty = existing.as_ref().map_or(0, |l| l.quantity).saturating_add(req.quantity);
        let (bounds, check) = check_stock(&product, combination, unit.mode(), total_qty);
        if !check.valid {
            tracing::info!(requested = total_qty, message = ?check.message, "cart quantity rejected");
            return Err(StorefrontError::Quantity(check));
        }

        let title = snapshot_title(&product, &options);
        let image = combination.and_then(|c| c.image_url.clone()).or_else(|| product.image_url.clone());
        match existing {
            Some(mut line) => {
                line.quantity = total_qty;
                line.price_at_add = price;
                line.title_at_add = title;
                line.image_at_add = image;
                line.min_qty = bounds.min_qty;
                line.max_qty = bounds.max_qty;
                line.updated_at = now;
                self.store.update_item(&line).await?;
            }
            None => {
                let line = CartItem {
                    id: Uuid::now_v7(),
                    cart_id: cart.id,
                    product_id: product.id,
                    combination_id,
                    options,
                    quantity: total_qty,
                    price_at_add: price,
                    title_at_add: title,
                    image_at_add: image,
                    min_qty: bounds.min_qty,
                    max_qty: bounds.max_qty,
                    created_at: now,
                    updated_at: now,
                };
                self.store.insert_item(&line).await?;
            }
        }

        self.events
            .publish(DomainEvent::Cart(CartEvent::ItemAdded {
                clerk_id: clerk_id.to_string(),
                product_id: product.id,
                quantity: req.quantity,
                unit_price: price,
            }))
            .await;
        self.get_with_items(clerk_id).await
    }

    /// Re-validates against the product as it is now, not against the line's snapshot.
    #[tracing::instrument(skip(self))]
    pub async fn update_quantity(&self, clerk_id: &str, item_id: Uuid, quantity: i32, now: DateTime<Utc>) -> Result<CartView> {
        let cart = self.store.ensure_cart(clerk_id).await?;
        let mut line = cart.item(item_id).cloned().ok_or(StorefrontError::NotFound("Cart item"))?;
        let product = self.load_product(line.product_id).await?;
        let combination = match line.combination_id.as_deref() {
            Some(id) => Some(product.combination(id).ok_or(StorefrontError::NotFound("Combination"))?),
            None => None,
        };
        let unit = product.sale_type.unit_for(self.purchase_unit(clerk_id).await?);
        let (bounds, check) = check_stock(&product, combination, unit.mode(), quantity);
        if !check.valid {
            return Err(StorefrontError::Quantity(check));
        }
        line.quantity = quantity;
        line.min_qty = bounds.min_qty;
        line.max_qty = bounds.max_qty;
        line.updated_at = now;
        self.store.update_item(&line).await?;
        self.get_with_items(clerk_id).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn remove_item(&self, clerk_id: &str, item_id: Uuid) -> Result<CartView> {
        let cart = self.store.ensure_cart(clerk_id).await?;
        if !self.store.delete_item(cart.id, item_id).await? {
            return Err(StorefrontError::NotFound("Cart item"));
        }
        self.get_with_items(clerk_id).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn clear(&self, clerk_id: &str) -> Result<CartView> {
        let cart = self.store.ensure_cart(clerk_id).await?;
        let removed = self.store.clear_cart(cart.id).await?;
        tracing::debug!(removed, "cart cleared");
        self.events.publish(DomainEvent::Cart(CartEvent::Cleared { clerk_id: clerk_id.to_string() })).await;
        self.get_with_items(clerk_id).await
    }
}
