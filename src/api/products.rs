use axum::{
    extract::State,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::aggregates::Product;
use crate::domain::value_objects::PurchaseUnit;
use crate::error::{Result, StorefrontError};
use crate::pricing::{resolve_price, ResolvedPrice};
use crate::state::AppState;
use super::extract::{ApiPath, ApiQuery};

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ListParams {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn per_page(&self) -> u32 {
        self.per_page.unwrap_or(20).clamp(1, 100)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page() - 1) * i64::from(self.per_page())
    }
}

#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: u32,
}

pub async fn list_products(
    State(s): State<AppState>,
    ApiQuery(p): ApiQuery<ListParams>,
) -> Result<Json<PaginatedResponse<Product>>> {
    let (data, total) = s.store.list_products(i64::from(p.per_page()), p.offset()).await?;
    Ok(Json(PaginatedResponse { data, total, page: p.page() }))
}

pub async fn get_product(State(s): State<AppState>, ApiPath(id): ApiPath<Uuid>) -> Result<Json<Product>> {
    s.store.product(id).await?.map(Json).ok_or(StorefrontError::NotFound("Product"))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuery {
    pub combination_id: Option<String>,
    pub unit: Option<PurchaseUnit>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuote {
    pub product_id: Uuid,
    pub combination_id: Option<String>,
    pub unit: PurchaseUnit,
    #[serde(flatten)]
    pub resolved: ResolvedPrice,
}

/// Display price for one product, variant and purchase unit at the current time.
pub async fn get_price(
    State(s): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(q): ApiQuery<PriceQuery>,
) -> Result<Json<PriceQuote>> {
    let product = s.store.product(id).await?.ok_or(StorefrontError::NotFound("Product"))?;
    let combination = match q.combination_id.as_deref() {
        Some(cid) => Some(product.combination(cid).ok_or(StorefrontError::NotFound("Combination"))?),
        None => None,
    };
    let unit = product.sale_type.unit_for(q.unit.unwrap_or_default());
    let resolved = resolve_price(&product, combination, unit, Utc::now());
    Ok(Json(PriceQuote { product_id: product.id, combination_id: q.combination_id, unit, resolved }))
}
