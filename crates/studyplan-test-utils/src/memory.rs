//! In-memory collaborators for router and service tests.

use std::sync::Mutex;

use anyhow::{Result, bail};
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use studyplan_core::store::{AccessControl, ProfileWithRole, Role, SubjectRepository};
use studyplan_core::subject::{StoredSubject, Subject};

#[derive(Default)]
struct State {
    users: Vec<ProfileWithRole>,
    subjects: Vec<StoredSubject>,
}

/// Subject repository and access control backed by a mutex-guarded `Vec`.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user and return its id.
    pub fn add_user(&self, email: &str, role: Role) -> Uuid {
        let user_id = Uuid::new_v4();
        self.state.lock().unwrap().users.push(ProfileWithRole {
            user_id,
            email: email.to_owned(),
            full_name: String::new(),
            created_at: Utc::now(),
            role,
        });
        user_id
    }

    pub fn subject_count(&self) -> usize {
        self.state.lock().unwrap().subjects.len()
    }
}

#[async_trait]
impl SubjectRepository for MemoryStore {
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<StoredSubject>> {
        let state = self.state.lock().unwrap();
        let mut rows: Vec<StoredSubject> = state
            .subjects
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by_key(|s| (s.subject.deadline(), s.created_at));
        Ok(rows)
    }

    async fn list_all(&self) -> Result<Vec<StoredSubject>> {
        let state = self.state.lock().unwrap();
        // Insertion order is creation order; newest first.
        Ok(state.subjects.iter().rev().cloned().collect())
    }

    async fn insert(&self, user_id: Uuid, subject: &Subject) -> Result<StoredSubject> {
        let stored = StoredSubject {
            id: Uuid::new_v4(),
            user_id,
            subject: subject.clone(),
            created_at: Utc::now(),
        };
        self.state.lock().unwrap().subjects.push(stored.clone());
        Ok(stored)
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        let before = state.subjects.len();
        state
            .subjects
            .retain(|s| !(s.id == id && s.user_id == user_id));
        Ok(state.subjects.len() < before)
    }

    async fn delete_any(&self, id: Uuid) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        let before = state.subjects.len();
        state.subjects.retain(|s| s.id != id);
        Ok(state.subjects.len() < before)
    }
}

#[async_trait]
impl AccessControl for MemoryStore {
    async fn role_of(&self, user_id: Uuid) -> Result<Option<Role>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .users
            .iter()
            .find(|u| u.user_id == user_id)
            .map(|u| u.role))
    }

    async fn list_users(&self) -> Result<Vec<ProfileWithRole>> {
        Ok(self.state.lock().unwrap().users.clone())
    }

    async fn set_role(&self, user_id: Uuid, role: Role) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        match state.users.iter_mut().find(|u| u.user_id == user_id) {
            Some(user) => {
                user.role = role;
                Ok(())
            }
            None => bail!("user {user_id} not found"),
        }
    }
}
