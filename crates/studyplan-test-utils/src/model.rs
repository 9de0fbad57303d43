//! A scripted [`PlanModel`] for service and router tests.

use std::sync::Mutex;

use async_trait::async_trait;

use studyplan_core::gateway::{GatewayError, PlanModel};

/// What the stub answers with.
#[derive(Debug, Clone)]
pub enum StubReply {
    Text(String),
    /// Any upstream HTTP status; classified like a real gateway response.
    Status(u16),
    Timeout,
}

/// A model that returns a fixed reply and records every request.
pub struct StubModel {
    reply: StubReply,
    calls: Mutex<Vec<(String, String)>>,
}

impl StubModel {
    pub fn new(reply: StubReply) -> Self {
        Self {
            reply,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn text(plan: impl Into<String>) -> Self {
        Self::new(StubReply::Text(plan.into()))
    }

    pub fn status(status: u16) -> Self {
        Self::new(StubReply::Status(status))
    }

    /// `(system, prompt)` pairs received so far.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PlanModel for StubModel {
    fn name(&self) -> &str {
        "stub"
    }

    async fn complete(&self, system: &str, prompt: &str) -> Result<String, GatewayError> {
        self.calls
            .lock()
            .unwrap()
            .push((system.to_owned(), prompt.to_owned()));
        match &self.reply {
            StubReply::Text(text) => Ok(text.clone()),
            StubReply::Status(status) => Err(GatewayError::from_status(*status, String::new())),
            StubReply::Timeout => Err(GatewayError::Timeout),
        }
    }
}
