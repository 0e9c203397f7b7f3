//! Minimum-order and stock rules for cart quantities.

use serde::Serialize;

use crate::domain::aggregates::{Combination, Product};
use crate::domain::value_objects::PurchaseMode;

/// Outcome of a quantity check. Business-rule failures are values, not errors.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuantityCheck {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_qty: Option<i32>,
}

impl QuantityCheck {
    pub fn ok() -> Self {
        Self { valid: true, message: None, suggested_qty: None }
    }

    fn invalid(message: String, suggested_qty: Option<i32>) -> Self {
        Self { valid: false, message: Some(message), suggested_qty }
    }
}

/// Min and max quantity a line may hold; `max_qty` is `None` for unlimited stock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuantityBounds {
    pub min_qty: i32,
    pub max_qty: Option<i32>,
}

fn pick(mode: PurchaseMode, retail: Option<i32>, wholesale: Option<i32>) -> Option<i32> {
    match mode {
        PurchaseMode::Retail => retail,
        PurchaseMode::Wholesale => wholesale,
    }
}

/// Combination override for the mode, then the product value, then 1.
pub fn effective_min_qty(product: &Product, combination: Option<&Combination>, mode: PurchaseMode) -> i32 {
    combination
        .and_then(|c| pick(mode, c.min_order_qty_retail, c.min_order_qty_wholesale))
        .filter(|m| *m >= 1)
        .or_else(|| pick(mode, product.min_order_qty_retail, product.min_order_qty_wholesale).filter(|m| *m >= 1))
        .unwrap_or(1)
}

/// Combination stock when set, otherwise the product's; `None` is unlimited.
pub fn available_stock(product: &Product, combination: Option<&Combination>) -> Option<i32> {
    combination.and_then(|c| c.stock).or(product.available_quantity)
}

pub fn bounds(product: &Product, combination: Option<&Combination>, mode: PurchaseMode) -> QuantityBounds {
    QuantityBounds {
        min_qty: effective_min_qty(product, combination, mode),
        max_qty: available_stock(product, combination).map(|s| s.max(0)),
    }
}

pub fn validate_quantity(requested: i32, min_qty: i32, stock: Option<i32>) -> QuantityCheck {
    if requested < min_qty {
        return QuantityCheck::invalid(format!("Minimum order quantity is {min_qty}"), Some(min_qty));
    }
    if let Some(stock) = stock {
        if stock < min_qty {
            return QuantityCheck::invalid(
                format!("Only {stock} in stock, which is below the minimum order quantity of {min_qty}"),
                None,
            );
        }
        if requested > stock {
            return QuantityCheck::invalid(format!("Only {stock} available in stock"), Some(stock));
        }
    }
    QuantityCheck::ok()
}

/// Checks `requested` against the bounds of a product/combination for a mode.
pub fn check_stock(
    product: &Product,
    combination: Option<&Combination>,
    mode: PurchaseMode,
    requested: i32,
) -> (QuantityBounds, QuantityCheck) {
    let b = bounds(product, combination, mode);
    (b, validate_quantity(requested, b.min_qty, b.max_qty))
}
