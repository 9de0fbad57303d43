//! Collaborator interfaces for persistence and authorization.
//!
//! The HTTP layer and CLI only talk to these traits. [`PgStore`] is the
//! production implementation; tests use in-memory ones.

pub mod postgres;

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

pub use postgres::PgStore;
pub use studyplan_db::models::{ProfileWithRole, Role};

use crate::subject::{StoredSubject, Subject};

/// CRUD over a user's subjects.
#[async_trait]
pub trait SubjectRepository: Send + Sync {
    /// The user's subjects, nearest deadline first.
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<StoredSubject>>;

    /// Every subject across all users, newest first.
    async fn list_all(&self) -> Result<Vec<StoredSubject>>;

    async fn insert(&self, user_id: Uuid, subject: &Subject) -> Result<StoredSubject>;

    /// Delete a subject owned by `user_id`. `false` when no such subject.
    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<bool>;

    /// Delete a subject regardless of owner.
    async fn delete_any(&self, id: Uuid) -> Result<bool>;
}

/// Role lookups and changes.
#[async_trait]
pub trait AccessControl: Send + Sync {
    /// `None` when the user is unknown.
    async fn role_of(&self, user_id: Uuid) -> Result<Option<Role>>;

    async fn list_users(&self) -> Result<Vec<ProfileWithRole>>;

    async fn set_role(&self, user_id: Uuid, role: Role) -> Result<()>;
}

const _: () = {
    fn _assert_object_safe(_: &dyn SubjectRepository, _: &dyn AccessControl) {}
};
