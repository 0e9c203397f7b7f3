//! Product Aggregate

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::value_objects::{DiscountType, FlashTarget, PurchaseUnit, SaleType};

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub title: String,
    pub category: Option<String>,
    pub sub_category: Option<String>,
    pub image_url: Option<String>,
    pub price_piece: Option<Decimal>,
    pub price_quantity: Option<Decimal>,
    pub sale_type: SaleType,
    /// `None` means unlimited.
    pub available_quantity: Option<i32>,
    pub min_order_qty_retail: Option<i32>,
    pub min_order_qty_wholesale: Option<i32>,
    pub combinations: Vec<Combination>,
    #[serde(flatten)]
    pub flash: FlashSale,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A variant selection (color, size, ...) with its own overrides.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Combination {
    pub id: String,
    #[serde(default)]
    pub options: BTreeMap<String, String>,
    pub price_piece: Option<Decimal>,
    pub price_quantity: Option<Decimal>,
    pub stock: Option<i32>,
    pub min_order_qty_retail: Option<i32>,
    pub min_order_qty_wholesale: Option<i32>,
    pub image_url: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct FlashSale {
    #[serde(rename = "venteFlashActive")]
    pub active: bool,
    #[serde(rename = "flashApplyTarget")]
    pub target: FlashTarget,
    #[serde(rename = "flashApplyAllCombinations")]
    pub all_combinations: bool,
    #[serde(rename = "flashCombinationIds")]
    pub combination_ids: Vec<String>,
    #[serde(rename = "flashDiscountType")]
    pub discount_type: DiscountType,
    #[serde(rename = "flashDiscountValue")]
    pub discount_value: Option<Decimal>,
    /// Older products only carry a percentage.
    #[serde(rename = "venteFlashPercentage")]
    pub legacy_percentage: Option<Decimal>,
    #[serde(rename = "flashStartAt")]
    pub start_at: Option<DateTime<Utc>>,
    #[serde(rename = "flashEndAt")]
    pub end_at: Option<DateTime<Utc>>,
}

impl FlashSale {
    /// The configured discount amount, falling back to the legacy percentage for percent discounts.
    pub fn value(&self) -> Option<Decimal> {
        match (self.discount_value, self.discount_type) {
            (Some(v), _) => Some(v),
            (None, DiscountType::Percent) => self.legacy_percentage,
            (None, DiscountType::Fixed) => None,
        }
    }
}

impl Product {
    pub fn create(title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            title: title.into(),
            category: None,
            sub_category: None,
            image_url: None,
            price_piece: None,
            price_quantity: None,
            sale_type: SaleType::default(),
            available_quantity: None,
            min_order_qty_retail: None,
            min_order_qty_wholesale: None,
            combinations: vec![],
            flash: FlashSale::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn price_for(&self, unit: PurchaseUnit) -> Option<Decimal> {
        match unit {
            PurchaseUnit::Piece => self.price_piece,
            PurchaseUnit::Quantity => self.price_quantity,
        }
    }

    pub fn combination(&self, id: &str) -> Option<&Combination> {
        self.combinations.iter().find(|c| c.id == id)
    }

    /// Look a combination up by id, or by its exact option selection when no id is given.
    pub fn find_combination(&self, id: Option<&str>, options: &BTreeMap<String, String>) -> Option<&Combination> {
        match id {
            Some(id) => self.combination(id),
            None if options.is_empty() => None,
            None => self.combinations.iter().find(|c| &c.options == options),
        }
    }

    /// Decode the stored combinations column and check every record.
    pub fn decode_combinations(raw: serde_json::Value) -> Result<Vec<Combination>, CombinationError> {
        let combinations: Vec<Combination> = match raw {
            serde_json::Value::Null => vec![],
            other => serde_json::from_value(other).map_err(|e| CombinationError::Malformed(e.to_string()))?,
        };
        let mut seen = HashSet::new();
        for c in &combinations {
            c.validate()?;
            if !seen.insert(c.id.as_str()) {
                return Err(CombinationError::DuplicateId(c.id.clone()));
            }
        }
        Ok(combinations)
    }
}

impl Combination {
    pub fn price_for(&self, unit: PurchaseUnit) -> Option<Decimal> {
        match unit {
            PurchaseUnit::Piece => self.price_piece,
            PurchaseUnit::Quantity => self.price_quantity,
        }
    }

    pub fn validate(&self) -> Result<(), CombinationError> {
        if self.id.trim().is_empty() {
            return Err(CombinationError::MissingId);
        }
        let prices = [self.price_piece, self.price_quantity];
        if prices.iter().flatten().any(|p| p.is_sign_negative()) {
            return Err(CombinationError::NegativePrice(self.id.clone()));
        }
        if self.stock.is_some_and(|s| s < 0) {
            return Err(CombinationError::NegativeStock(self.id.clone()));
        }
        let mins = [self.min_order_qty_retail, self.min_order_qty_wholesale];
        if mins.iter().flatten().any(|m| *m < 1) {
            return Err(CombinationError::InvalidMinimum(self.id.clone()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CombinationError {
    #[error("malformed combinations: {0}")]
    Malformed(String),
    #[error("combination without id")]
    MissingId,
    #[error("duplicate combination id {0}")]
    DuplicateId(String),
    #[error("combination {0} has a negative price")]
    NegativePrice(String),
    #[error("combination {0} has negative stock")]
    NegativeStock(String),
    #[error("combination {0} has a minimum order quantity below 1")]
    InvalidMinimum(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_combinations() {
        let raw = json!([
            { "id": "red-m", "options": { "color": "red", "size": "M" }, "pricePiece": 12.5, "stock": 3 },
            { "id": "blue-m", "options": { "color": "blue", "size": "M" }, "minOrderQtyWholesale": 10 }
        ]);
        let combos = Product::decode_combinations(raw).unwrap();
        assert_eq!(combos.len(), 2);
        assert_eq!(combos[0].price_piece, Some(Decimal::new(125, 1)));
        assert_eq!(combos[1].stock, None);
        assert!(Product::decode_combinations(serde_json::Value::Null).unwrap().is_empty());
    }

    #[test]
    fn test_decode_rejects_bad_records() {
        let dup = json!([{ "id": "a" }, { "id": "a" }]);
        assert_eq!(Product::decode_combinations(dup), Err(CombinationError::DuplicateId("a".into())));
        let neg = json!([{ "id": "a", "stock": -1 }]);
        assert_eq!(Product::decode_combinations(neg), Err(CombinationError::NegativeStock("a".into())));
        assert!(matches!(Product::decode_combinations(json!({"id": "a"})), Err(CombinationError::Malformed(_))));
    }

    #[test]
    fn test_find_combination_by_options() {
        let mut p = Product::create("Tee");
        let options: BTreeMap<String, String> = [("size".to_string(), "L".to_string())].into();
        p.combinations.push(Combination { id: "l".into(), options: options.clone(), ..Default::default() });
        assert_eq!(p.find_combination(None, &options).map(|c| c.id.as_str()), Some("l"));
        assert!(p.find_combination(None, &BTreeMap::new()).is_none());
        assert!(p.find_combination(Some("xl"), &options).is_none());
    }

    #[test]
    fn test_legacy_percentage() {
        let flash = FlashSale { legacy_percentage: Some(Decimal::from(15)), ..Default::default() };
        assert_eq!(flash.value(), Some(Decimal::from(15)));
        let fixed = FlashSale { discount_type: DiscountType::Fixed, legacy_percentage: Some(Decimal::from(15)), ..Default::default() };
        assert_eq!(fixed.value(), None);
    }

    #[test]
    fn test_flash_fields_serialize_flat() {
        let mut p = Product::create("Tee");
        p.flash.active = true;
        p.flash.combination_ids = vec!["l".into()];
        let v = serde_json::to_value(&p).unwrap();
        assert_eq!(v["venteFlashActive"], true);
        assert_eq!(v["flashCombinationIds"], json!(["l"]));
        assert!(v.get("flash").is_none());
        assert_eq!(v["title"], "Tee");
    }
}
