//! Database query functions for the `subjects` table.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Priority, SubjectRow};

/// Insert a subject owned by `user_id`. Returns the row with server-generated
/// defaults (id, created_at).
pub async fn insert_subject(
    pool: &PgPool,
    user_id: Uuid,
    name: &str,
    deadline: NaiveDate,
    priority: Priority,
) -> Result<SubjectRow> {
    let row = sqlx::query_as::<_, SubjectRow>(
        "INSERT INTO subjects (user_id, name, deadline, priority) \
         VALUES ($1, $2, $3, $4) \
         RETURNING *",
    )
    .bind(user_id)
    .bind(name)
    .bind(deadline)
    .bind(priority)
    .fetch_one(pool)
    .await
    .with_context(|| format!("failed to insert subject {name:?}"))?;

    Ok(row)
}

/// List a user's subjects, nearest deadline first.
pub async fn list_subjects_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<SubjectRow>> {
    let rows = sqlx::query_as::<_, SubjectRow>(
        "SELECT * FROM subjects WHERE user_id = $1 ORDER BY deadline ASC, created_at ASC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .context("failed to list subjects for user")?;

    Ok(rows)
}

/// List every subject across all users, newest first.
pub async fn list_all_subjects(pool: &PgPool) -> Result<Vec<SubjectRow>> {
    let rows = sqlx::query_as::<_, SubjectRow>("SELECT * FROM subjects ORDER BY created_at DESC")
        .fetch_all(pool)
        .await
        .context("failed to list subjects")?;

    Ok(rows)
}

/// Delete a subject only if it belongs to `user_id`. Returns whether a row
/// was removed.
pub async fn delete_subject_for_user(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM subjects WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await
        .context("failed to delete subject")?;

    Ok(result.rows_affected() > 0)
}

/// Delete any subject regardless of owner. Returns whether a row was removed.
pub async fn delete_subject(pool: &PgPool, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM subjects WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .context("failed to delete subject")?;

    Ok(result.rows_affected() > 0)
}
