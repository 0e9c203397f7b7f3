//! Clients and back-office employees

use serde::Serialize;
use uuid::Uuid;

use crate::domain::value_objects::{text_enum, PurchaseUnit};

/// Storefront customer, keyed by identity-provider user id.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: Uuid,
    pub clerk_id: String,
    pub purchase_unit: PurchaseUnit,
}

text_enum! {
    pub enum EmployeeRole: "employee role" {
        Admin => "admin",
        Manager => "manager",
        Staff => "staff",
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: EmployeeRole,
    pub is_active: bool,
}

impl Employee {
    pub fn is_admin(&self) -> bool {
        self.is_active && self.role == EmployeeRole::Admin
    }
}
