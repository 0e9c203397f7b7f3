//! Unit price resolution: base price fallback chain plus time-boxed flash discounts.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::aggregates::{Combination, FlashSale, Product};
use crate::domain::value_objects::{round_price, DiscountType, FlashTarget, PurchaseUnit};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedPrice {
    pub base_price: Decimal,
    pub price: Decimal,
    pub flash_applied: bool,
}

/// Combination price for `unit`, then its other column, then the product's
/// columns in the same order. Zero when nothing is set.
pub fn base_price(product: &Product, combination: Option<&Combination>, unit: PurchaseUnit) -> Decimal {
    combination
        .and_then(|c| c.price_for(unit).or_else(|| c.price_for(unit.other())))
        .or_else(|| product.price_for(unit).or_else(|| product.price_for(unit.other())))
        .unwrap_or(Decimal::ZERO)
}

/// Active flag set and `now` inside the inclusive window; a missing bound is open.
pub fn is_flash_active(flash: &FlashSale, now: DateTime<Utc>) -> bool {
    flash.active
        && flash.start_at.map_or(true, |start| now >= start)
        && flash.end_at.map_or(true, |end| now <= end)
}

pub fn flash_applies_to(flash: &FlashSale, combination: Option<&Combination>) -> bool {
    match flash.target {
        FlashTarget::Product => true,
        FlashTarget::Combinations => combination.is_some_and(|c| {
            flash.all_combinations || flash.combination_ids.iter().any(|id| id == &c.id)
        }),
    }
}

/// Missing or non-positive values leave the price untouched. Never negative.
pub fn apply_flash_discount(base: Decimal, discount_type: DiscountType, value: Option<Decimal>) -> Decimal {
    let Some(value) = value.filter(|v| v.is_sign_positive() && !v.is_zero()) else {
        return base;
    };
    let discounted = match discount_type {
        DiscountType::Percent => base - base * value / Decimal::ONE_HUNDRED,
        DiscountType::Fixed => base - value,
    };
    round_price(discounted.max(Decimal::ZERO))
}

pub fn resolve_price(
    product: &Product,
    combination: Option<&Combination>,
    unit: PurchaseUnit,
    now: DateTime<Utc>,
) -> ResolvedPrice {
    let base_price = base_price(product, combination, unit);
    let flash = &product.flash;
    let value = flash.value().filter(|v| v.is_sign_positive() && !v.is_zero());
    if value.is_none() || !is_flash_active(flash, now) || !flash_applies_to(flash, combination) {
        return ResolvedPrice { base_price, price: base_price, flash_applied: false };
    }
    ResolvedPrice {
        base_price,
        price: apply_flash_discount(base_price, flash.discount_type, value),
        flash_applied: true,
    }
}
