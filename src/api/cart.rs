use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::auth::AuthUser;
use crate::domain::aggregates::CartView;
use crate::error::Result;
use crate::services::{AddItemRequest, UpdateQuantityRequest};
use crate::state::AppState;
use super::extract::{ApiJson, ApiPath};

pub async fn get_cart(State(s): State<AppState>, user: AuthUser) -> Result<Json<CartView>> {
    Ok(Json(s.carts().get_with_items(&user.user_id).await?))
}

pub async fn add_item(
    State(s): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<AddItemRequest>,
) -> Result<(StatusCode, Json<CartView>)> {
    let cart = s.carts().add_or_update_item(&user.user_id, req, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(cart)))
}

pub async fn update_item(
    State(s): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateQuantityRequest>,
) -> Result<Json<CartView>> {
    req.validate()?;
    Ok(Json(s.carts().update_quantity(&user.user_id, id, req.quantity, Utc::now()).await?))
}

pub async fn remove_item(State(s): State<AppState>, user: AuthUser, ApiPath(id): ApiPath<Uuid>) -> Result<Json<CartView>> {
    Ok(Json(s.carts().remove_item(&user.user_id, id).await?))
}

pub async fn clear_cart(State(s): State<AppState>, user: AuthUser) -> Result<Json<CartView>> {
    Ok(Json(s.carts().clear(&user.user_id).await?))
}
