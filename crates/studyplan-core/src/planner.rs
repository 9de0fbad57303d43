//! Study-plan service: validate subjects, build the prompt, make the one
//! model call.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{error, info};

use crate::gateway::{GatewayError, PlanModel};
use crate::prompt::{SYSTEM_INSTRUCTION, build_prompt};
use crate::subject::{Subject, SubjectBatch, SubjectError};

/// Environment variable holding the model API key.
pub const API_KEY_ENV: &str = "STUDYPLAN_AI_API_KEY";

/// Errors from a plan-generation request.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error(transparent)]
    Subject(#[from] SubjectError),

    #[error("STUDYPLAN_AI_API_KEY is not configured")]
    MissingCredential,

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Generates study plans through a [`PlanModel`].
///
/// Holds no model when the API key is not configured; every request then
/// fails with [`PlanError::MissingCredential`] after input validation.
#[derive(Clone)]
pub struct StudyPlanner {
    model: Option<Arc<dyn PlanModel>>,
}

impl StudyPlanner {
    pub fn new(model: Arc<dyn PlanModel>) -> Self {
        Self { model: Some(model) }
    }

    pub fn unconfigured() -> Self {
        Self { model: None }
    }

    pub fn is_configured(&self) -> bool {
        self.model.is_some()
    }

    /// Generate a plan for `subjects` as of `now`.
    ///
    /// Empty input is rejected before anything else happens. The model is
    /// called at most once.
    pub async fn generate(
        &self,
        subjects: Vec<Subject>,
        now: DateTime<Utc>,
    ) -> Result<String, PlanError> {
        let batch = SubjectBatch::new(subjects)?;
        info!(subjects = batch.len(), "received subjects");

        let model = self.model.as_ref().ok_or(PlanError::MissingCredential)?;
        let prompt = build_prompt(&batch, now);

        match model.complete(SYSTEM_INSTRUCTION, &prompt).await {
            Ok(plan) => {
                info!(model = model.name(), "study plan generated");
                Ok(plan)
            }
            Err(e) => {
                error!(model = model.name(), error = %e, "study plan generation failed");
                Err(e.into())
            }
        }
    }
}

impl std::fmt::Debug for StudyPlanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StudyPlanner")
            .field("model", &self.model.as_ref().map(|m| m.name()))
            .finish()
    }
}
