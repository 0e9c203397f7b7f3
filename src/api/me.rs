use axum::{extract::State, Json};
use serde::Serialize;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::domain::aggregates::EmployeeRole;
use crate::error::Result;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleResponse {
    pub role: Option<EmployeeRole>,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

/// Back-office role of the caller; `role: null` for anyone who is not an employee.
pub async fn get_role(State(s): State<AppState>, user: AuthUser) -> Result<Json<RoleResponse>> {
    let employee = match user.email.as_deref() {
        Some(email) => s.store.employee_by_email(email).await?,
        None => None,
    };
    Ok(Json(match employee {
        Some(e) => RoleResponse { role: Some(e.role), is_active: e.is_active, id: Some(e.id), full_name: Some(e.full_name) },
        None => RoleResponse { role: None, is_active: false, id: None, full_name: None },
    }))
}
