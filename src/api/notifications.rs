use axum::{
    extract::State,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::domain::aggregates::Notification;
use crate::error::Result;
use crate::state::AppState;
use super::extract::{ApiPath, ApiQuery};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationQuery {
    #[serde(default)]
    pub unread_only: bool,
    pub limit: Option<i64>,
}

/// Runs the pending-order sweeps, then lists the admin notifications.
pub async fn list_notifications(
    State(s): State<AppState>,
    ApiQuery(q): ApiQuery<NotificationQuery>,
) -> Result<Json<Vec<Notification>>> {
    let svc = s.notifications();
    svc.sweep(Utc::now()).await;
    Ok(Json(svc.list(q.unread_only, q.limit.unwrap_or(50)).await?))
}

pub async fn mark_read(State(s): State<AppState>, ApiPath(id): ApiPath<Uuid>) -> Result<Json<Value>> {
    s.notifications().mark_read(id).await?;
    Ok(Json(json!({"success": true})))
}

pub async fn mark_all_read(State(s): State<AppState>) -> Result<Json<Value>> {
    let updated = s.notifications().mark_all_read().await?;
    Ok(Json(json!({"success": true, "updated": updated})))
}
