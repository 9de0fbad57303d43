//! Shared test utilities for studyplan integration tests.
//!
//! - [`pg`]: a PostgreSQL instance shared across tests, one database per test.
//! - [`memory`]: in-memory [`SubjectRepository`] and [`AccessControl`].
//! - [`model`]: a scripted [`PlanModel`] that records what it was sent.
//!
//! [`SubjectRepository`]: studyplan_core::store::SubjectRepository
//! [`AccessControl`]: studyplan_core::store::AccessControl
//! [`PlanModel`]: studyplan_core::gateway::PlanModel

pub mod memory;
pub mod model;
pub mod pg;

pub use memory::MemoryStore;
pub use model::{StubModel, StubReply};
pub use pg::{create_test_db, drop_test_db};
