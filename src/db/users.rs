// Database queries for users

use crate::db::schema::{User, UserRole};
use crate::errors::{AppError, Result};
use sqlx::PgPool;
use uuid::Uuid;

/// Get a user by ID
pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT
            id, full_name, email, university_id, university_card,
            status, role, last_activity_date, created_at
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

/// Look up the role of a user, `None` when the user does not exist
pub async fn get_role(pool: &PgPool, id: Uuid) -> Result<Option<UserRole>> {
    let role: Option<String> = sqlx::query_scalar("SELECT role FROM users WHERE id = $1 LIMIT 1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    role.map(|r| {
        r.parse::<UserRole>().map_err(|e| {
            tracing::error!(user_id = %id, "Unexpected role in users table: {}", e);
            AppError::Internal(e)
        })
    })
    .transpose()
}
