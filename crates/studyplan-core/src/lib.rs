//! Core of the study planner.
//!
//! Two pure components sit at the centre: [`prompt`] turns a batch of
//! subjects into the instruction text for the model, and [`render`] turns
//! the model's markdown-like answer back into display blocks. Around them
//! are the [`gateway`] client for the one outbound model call, the
//! [`planner`] service that wires the three together, and the collaborator
//! traits in [`store`] and [`token`] that keep persistence and identity
//! swappable.

pub mod gateway;
pub mod planner;
pub mod prompt;
pub mod render;
pub mod store;
pub mod subject;
pub mod token;
