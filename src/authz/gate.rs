// Admin capability check

use crate::db::{schema::UserRole, users};
use crate::errors::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Identity of the signed-in user, as supplied by the session layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: Uuid,
}

/// Outcome of an access check. Routing decides what each tag means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Authorized,
    Unauthenticated,
    Forbidden,
}

/// Role lookup by user id
#[async_trait]
pub trait RoleLookup: Send + Sync {
    async fn role_of(&self, user_id: Uuid) -> Result<Option<UserRole>>;
}

/// Role lookup against the users table
#[derive(Clone)]
pub struct PgRoleLookup {
    pool: PgPool,
}

impl PgRoleLookup {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoleLookup for PgRoleLookup {
    async fn role_of(&self, user_id: Uuid) -> Result<Option<UserRole>> {
        users::get_role(&self.pool, user_id).await
    }
}

/// Decide whether `session` may use the admin area.
///
/// Lookup failures are errors, not denials.
pub async fn check_admin(
    session: Option<&SessionUser>,
    roles: &dyn RoleLookup,
) -> Result<AccessDecision> {
    let Some(session) = session else {
        return Ok(AccessDecision::Unauthenticated);
    };

    let decision = match roles.role_of(session.id).await? {
        Some(UserRole::Admin) => AccessDecision::Authorized,
        Some(UserRole::User) | None => AccessDecision::Forbidden,
    };

    tracing::debug!(user_id = %session.id, decision = ?decision, "Admin access check");

    Ok(decision)
}


#[cfg(test)]
mod tests {
    use super::testing::StaticRoles;
    use super::*;
    use crate::errors::AppError;

    struct BrokenLookup;

    #[async_trait]
    impl RoleLookup for BrokenLookup {
        async fn role_of(&self, _user_id: Uuid) -> Result<Option<UserRole>> {
            Err(AppError::Internal("pool timed out".to_string()))
        }
    }

    #[tokio::test]
    async fn test_no_session_is_unauthenticated() {
        let roles = StaticRoles::default();
        assert_eq!(
            check_admin(None, &roles).await.unwrap(),
            AccessDecision::Unauthenticated
        );
    }

    #[tokio::test]
    async fn test_admin_is_authorized() {
        let id = Uuid::new_v4();
        let roles = StaticRoles::default().with(id, UserRole::Admin);
        let session = SessionUser { id };

        assert_eq!(
            check_admin(Some(&session), &roles).await.unwrap(),
            AccessDecision::Authorized
        );
    }

    #[tokio::test]
    async fn test_regular_user_is_forbidden() {
        let id = Uuid::new_v4();
        let roles = StaticRoles::default().with(id, UserRole::User);
        let session = SessionUser { id };

        assert_eq!(
            check_admin(Some(&session), &roles).await.unwrap(),
            AccessDecision::Forbidden
        );
    }

    #[tokio::test]
    async fn test_unknown_user_is_forbidden() {
        let roles = StaticRoles::default();
        let session = SessionUser { id: Uuid::new_v4() };

        assert_eq!(
            check_admin(Some(&session), &roles).await.unwrap(),
            AccessDecision::Forbidden
        );
    }

    #[tokio::test]
    async fn test_lookup_failure_is_an_error() {
        let session = SessionUser { id: Uuid::new_v4() };
        assert!(check_admin(Some(&session), &BrokenLookup).await.is_err());
    }
}
