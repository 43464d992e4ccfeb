//! Caller resolution against the `employees` table.

use std::sync::RwLock;

use assetflow_core::error::AuthError;
use assetflow_core::identity::{CallerIdentity, IdentityResolver};
use assetflow_core::types::AuthUserId;
use async_trait::async_trait;

use crate::repositories::EmployeeRepo;
use crate::DbPool;

/// Resolves the signed-in auth user to an employee by `auth_user_id`.
///
/// The embedding app calls [`set_session`](Self::set_session) after login and
/// [`clear_session`](Self::clear_session) on logout.
pub struct PgIdentityResolver {
    pool: DbPool,
    session: RwLock<Option<AuthUserId>>,
}

impl PgIdentityResolver {
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool,
            session: RwLock::new(None),
        }
    }

    pub fn set_session(&self, auth_user_id: AuthUserId) {
        *self.session.write().unwrap_or_else(|e| e.into_inner()) = Some(auth_user_id);
    }

    pub fn clear_session(&self) {
        *self.session.write().unwrap_or_else(|e| e.into_inner()) = None;
    }

    fn current_session(&self) -> Option<AuthUserId> {
        *self.session.read().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl IdentityResolver for PgIdentityResolver {
    async fn resolve(&self) -> Result<CallerIdentity, AuthError> {
        let auth_user_id = self.current_session().ok_or(AuthError::NoSession)?;

        let employee = EmployeeRepo::find_by_auth_user_id(&self.pool, auth_user_id)
            .await
            .map_err(|e| AuthError::Lookup(e.to_string()))?
            .ok_or(AuthError::UnknownCaller)?;

        Ok(employee.identity())
    }
}
