use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::domain::aggregates::{Order, OrderStatus};
use crate::error::Result;
use crate::services::CheckoutRequest;
use crate::state::AppState;
use super::extract::{ApiJson, ApiPath, ApiQuery};

pub async fn checkout(
    State(s): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<CheckoutRequest>,
) -> Result<(StatusCode, Json<Order>)> {
    let order = s.orders().checkout(&user.user_id, req).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn get_order(State(s): State<AppState>, user: AuthUser, ApiPath(id): ApiPath<Uuid>) -> Result<Json<Order>> {
    Ok(Json(s.orders().get_for_user(&user.user_id, id).await?))
}

#[derive(Debug, Deserialize)]
pub struct OrderListQuery {
    pub limit: Option<i64>,
}

pub async fn list_orders(State(s): State<AppState>, ApiQuery(q): ApiQuery<OrderListQuery>) -> Result<Json<Vec<Order>>> {
    Ok(Json(s.orders().list(q.limit.unwrap_or(50)).await?))
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

pub async fn update_status(
    State(s): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateStatusRequest>,
) -> Result<Json<Order>> {
    Ok(Json(s.orders().update_status(id, req.status).await?))
}
