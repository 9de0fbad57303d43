//! Database query functions for the `profiles` and `user_roles` tables.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Profile, ProfileWithRole, Role};

/// Insert a profile together with its role row, in one transaction.
pub async fn insert_profile(
    pool: &PgPool,
    email: &str,
    full_name: &str,
    role: Role,
) -> Result<Profile> {
    let mut tx = pool.begin().await.context("failed to begin transaction")?;

    let profile = sqlx::query_as::<_, Profile>(
        "INSERT INTO profiles (email, full_name) VALUES ($1, $2) RETURNING *",
    )
    .bind(email)
    .bind(full_name)
    .fetch_one(&mut *tx)
    .await
    .with_context(|| format!("failed to insert profile {email:?}"))?;

    sqlx::query("INSERT INTO user_roles (user_id, role) VALUES ($1, $2)")
        .bind(profile.user_id)
        .bind(role)
        .execute(&mut *tx)
        .await
        .context("failed to insert user role")?;

    tx.commit().await.context("failed to commit transaction")?;
    Ok(profile)
}

/// Fetch a profile by email.
pub async fn get_profile_by_email(pool: &PgPool, email: &str) -> Result<Option<Profile>> {
    let profile = sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await
        .with_context(|| format!("failed to fetch profile by email {email:?}"))?;

    Ok(profile)
}

/// List all profiles with their role. Users without a role row read as `user`.
pub async fn list_profiles_with_roles(pool: &PgPool) -> Result<Vec<ProfileWithRole>> {
    let rows = sqlx::query_as::<_, ProfileWithRole>(
        "SELECT p.user_id, p.email, p.full_name, p.created_at, \
                COALESCE(r.role, 'user') AS role \
         FROM profiles p \
         LEFT JOIN user_roles r ON r.user_id = p.user_id \
         ORDER BY p.created_at ASC",
    )
    .fetch_all(pool)
    .await
    .context("failed to list profiles")?;

    Ok(rows)
}

/// Current role of a user. `None` if the user has no profile.
pub async fn get_role(pool: &PgPool, user_id: Uuid) -> Result<Option<Role>> {
    let role: Option<Role> = sqlx::query_scalar(
        "SELECT COALESCE(r.role, 'user') \
         FROM profiles p \
         LEFT JOIN user_roles r ON r.user_id = p.user_id \
         WHERE p.user_id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .context("failed to fetch user role")?;

    Ok(role)
}

/// Set a user's role, creating the role row if missing.
pub async fn set_role(pool: &PgPool, user_id: Uuid, role: Role) -> Result<()> {
    let result = sqlx::query(
        "INSERT INTO user_roles (user_id, role) \
         SELECT user_id, $2 FROM profiles WHERE user_id = $1 \
         ON CONFLICT (user_id) DO UPDATE SET role = EXCLUDED.role",
    )
    .bind(user_id)
    .bind(role)
    .execute(pool)
    .await
    .context("failed to update user role")?;

    if result.rows_affected() == 0 {
        anyhow::bail!("user {user_id} not found");
    }

    Ok(())
}
