//! PostgreSQL-backed collaborators.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use studyplan_db::queries::{profiles, subjects};

use super::{AccessControl, ProfileWithRole, Role, SubjectRepository};
use crate::subject::{StoredSubject, Subject};

/// Subject repository and access control over one connection pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubjectRepository for PgStore {
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<StoredSubject>> {
        let rows = subjects::list_subjects_for_user(&self.pool, user_id).await?;
        Ok(rows.into_iter().map(StoredSubject::from).collect())
    }

    async fn list_all(&self) -> Result<Vec<StoredSubject>> {
        let rows = subjects::list_all_subjects(&self.pool).await?;
        Ok(rows.into_iter().map(StoredSubject::from).collect())
    }

    async fn insert(&self, user_id: Uuid, subject: &Subject) -> Result<StoredSubject> {
        let row = subjects::insert_subject(
            &self.pool,
            user_id,
            subject.name(),
            subject.deadline(),
            subject.priority(),
        )
        .await?;
        Ok(row.into())
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<bool> {
        subjects::delete_subject_for_user(&self.pool, user_id, id).await
    }

    async fn delete_any(&self, id: Uuid) -> Result<bool> {
        subjects::delete_subject(&self.pool, id).await
    }
}

#[async_trait]
impl AccessControl for PgStore {
    async fn role_of(&self, user_id: Uuid) -> Result<Option<Role>> {
        profiles::get_role(&self.pool, user_id).await
    }

    async fn list_users(&self) -> Result<Vec<ProfileWithRole>> {
        profiles::list_profiles_with_roles(&self.pool).await
    }

    async fn set_role(&self, user_id: Uuid, role: Role) -> Result<()> {
        profiles::set_role(&self.pool, user_id, role).await
    }
}
