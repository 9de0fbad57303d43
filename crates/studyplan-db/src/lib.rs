//! PostgreSQL persistence for studyplan: connection config, pool,
//! embedded migrations, row models, and query functions.

pub mod config;
pub mod models;
pub mod pool;
pub mod queries;
