//! Repository for the `employees` table.

use assetflow_core::identity::ROLE_EMPLOYEE;
use assetflow_core::types::AuthUserId;
use sqlx::PgPool;

use crate::models::employee::{CreateEmployee, Employee};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, auth_user_id, full_name, email, role, created_at, updated_at";

/// Provides lookup and creation for employees.
pub struct EmployeeRepo;

impl EmployeeRepo {
    /// Insert a new employee, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateEmployee) -> Result<Employee, sqlx::Error> {
        let query = format!(
            "INSERT INTO employees (auth_user_id, full_name, email, role) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Employee>(&query)
            .bind(input.auth_user_id)
            .bind(&input.full_name)
            .bind(&input.email)
            .bind(input.role.as_deref().unwrap_or(ROLE_EMPLOYEE))
            .fetch_one(pool)
            .await
    }

    /// Find the employee linked to an authentication user.
    pub async fn find_by_auth_user_id(
        pool: &PgPool,
        auth_user_id: AuthUserId,
    ) -> Result<Option<Employee>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM employees WHERE auth_user_id = $1");
        sqlx::query_as::<_, Employee>(&query)
            .bind(auth_user_id)
            .fetch_optional(pool)
            .await
    }
}
