//! Subject values: what a student is studying, by when, and how urgently.
//!
//! A [`Subject`] is validated on construction (and on deserialization) and
//! never changes afterwards. A [`SubjectBatch`] is the non-empty sequence the
//! prompt builder consumes.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub use studyplan_db::models::Priority;
use studyplan_db::models::SubjectRow;

/// Errors raised while building subjects or batches.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubjectError {
    #[error("название предмета не может быть пустым")]
    EmptyName,

    #[error("Добавьте хотя бы один предмет")]
    NoSubjects,
}

// ---------------------------------------------------------------------------
// Subject
// ---------------------------------------------------------------------------

/// A tracked academic item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SubjectInput")]
pub struct Subject {
    name: String,
    deadline: NaiveDate,
    priority: Priority,
}

impl Subject {
    /// Build a subject. The name is trimmed and must not be blank.
    pub fn new(
        name: impl AsRef<str>,
        deadline: NaiveDate,
        priority: Priority,
    ) -> Result<Self, SubjectError> {
        let name = name.as_ref().trim();
        if name.is_empty() {
            return Err(SubjectError::EmptyName);
        }
        Ok(Self {
            name: name.to_owned(),
            deadline,
            priority,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn deadline(&self) -> NaiveDate {
        self.deadline
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }
}

/// Wire shape of a subject: `priority` may be absent or null.
#[derive(Debug, Deserialize)]
struct SubjectInput {
    name: String,
    #[serde(deserialize_with = "deserialize_deadline")]
    deadline: NaiveDate,
    #[serde(default)]
    priority: Option<Priority>,
}

impl TryFrom<SubjectInput> for Subject {
    type Error = SubjectError;

    fn try_from(input: SubjectInput) -> Result<Self, Self::Error> {
        Subject::new(input.name, input.deadline, input.priority.unwrap_or_default())
    }
}

/// Parse a deadline from `YYYY-MM-DD`, or from an RFC 3339 timestamp
/// truncated to the calendar date it names.
pub fn parse_deadline(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

fn deserialize_deadline<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_deadline(&raw).ok_or_else(|| {
        serde::de::Error::custom(format!("invalid deadline {raw:?} (expected YYYY-MM-DD)"))
    })
}

// ---------------------------------------------------------------------------
// Batch
// ---------------------------------------------------------------------------

/// A non-empty, ordered sequence of subjects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectBatch(Vec<Subject>);

impl SubjectBatch {
    pub fn new(subjects: Vec<Subject>) -> Result<Self, SubjectError> {
        if subjects.is_empty() {
            return Err(SubjectError::NoSubjects);
        }
        Ok(Self(subjects))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Subject> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

impl TryFrom<Vec<Subject>> for SubjectBatch {
    type Error = SubjectError;

    fn try_from(subjects: Vec<Subject>) -> Result<Self, Self::Error> {
        Self::new(subjects)
    }
}

impl<'a> IntoIterator for &'a SubjectBatch {
    type Item = &'a Subject;
    type IntoIter = std::slice::Iter<'a, Subject>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// ---------------------------------------------------------------------------
// Stored subject
// ---------------------------------------------------------------------------

/// A subject together with the identity the persistence layer assigned it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredSubject {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(flatten)]
    pub subject: Subject,
    pub created_at: DateTime<Utc>,
}

impl From<SubjectRow> for StoredSubject {
    fn from(row: SubjectRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            // The table's CHECK constraint already rejects blank names.
            subject: Subject {
                name: row.name,
                deadline: row.deadline,
                priority: row.priority,
            },
            created_at: row.created_at,
        }
    }
}
