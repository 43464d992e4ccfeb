//! Caller identity resolution.
//!
//! There is one identity contract: the authentication user id of the current
//! session maps to exactly one employee row, and that employee's role decides
//! whether the caller sees their own requests or all of them.

use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::AuthError;
use crate::request::RequestScope;
use crate::types::DbId;

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_EMPLOYEE: &str = "employee";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Employee,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Employee => ROLE_EMPLOYEE,
            Self::Admin => ROLE_ADMIN,
        }
    }

    /// Anything other than `admin` is treated as a regular employee.
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case(ROLE_ADMIN) {
            Self::Admin
        } else {
            Self::Employee
        }
    }
}

/// The employee the reconciler is acting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerIdentity {
    pub employee_id: DbId,
    pub role: Role,
}

impl CallerIdentity {
    pub fn employee(employee_id: DbId) -> Self {
        Self {
            employee_id,
            role: Role::Employee,
        }
    }

    pub fn admin(employee_id: DbId) -> Self {
        Self {
            employee_id,
            role: Role::Admin,
        }
    }

    /// Admins reconcile every request; employees only their own.
    pub fn request_scope(&self) -> RequestScope {
        match self.role {
            Role::Admin => RequestScope::All,
            Role::Employee => RequestScope::Employee(self.employee_id),
        }
    }
}

/// Resolves the current session to a [`CallerIdentity`].
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(&self) -> Result<CallerIdentity, AuthError>;
}

/// Identity held in memory and swapped on sign-in / sign-out.
///
/// For embedders that already know the employee (for example after their own
/// login flow) and for tests.
#[derive(Debug, Default)]
pub struct SessionIdentity {
    current: RwLock<Option<CallerIdentity>>,
}

impl SessionIdentity {
    pub fn new(identity: Option<CallerIdentity>) -> Self {
        Self {
            current: RwLock::new(identity),
        }
    }

    pub fn sign_in(&self, identity: CallerIdentity) {
        *self.current.write().unwrap_or_else(|e| e.into_inner()) = Some(identity);
    }

    pub fn sign_out(&self) {
        *self.current.write().unwrap_or_else(|e| e.into_inner()) = None;
    }
}

#[async_trait]
impl IdentityResolver for SessionIdentity {
    async fn resolve(&self) -> Result<CallerIdentity, AuthError> {
        (*self.current.read().unwrap_or_else(|e| e.into_inner())).ok_or(AuthError::NoSession)
    }
}
