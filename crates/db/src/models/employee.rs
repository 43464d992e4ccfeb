//! Employee row model.

use assetflow_core::identity::{CallerIdentity, Role};
use assetflow_core::types::{AuthUserId, DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `employees` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Employee {
    pub id: DbId,
    pub auth_user_id: AuthUserId,
    pub full_name: String,
    pub email: String,
    pub role: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Employee {
    pub fn identity(&self) -> CallerIdentity {
        CallerIdentity {
            employee_id: self.id,
            role: Role::parse(&self.role),
        }
    }
}

/// DTO for creating an employee.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateEmployee {
    pub auth_user_id: AuthUserId,
    pub full_name: String,
    pub email: String,
    pub role: Option<String>,
}
