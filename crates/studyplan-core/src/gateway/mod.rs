//! Outbound call to the generative model.
//!
//! ```text
//! StudyPlanner
//!     |
//!     v
//! &dyn PlanModel --complete(system, prompt)--> Result<String, GatewayError>
//!     |
//!     v
//! GatewayClient (reqwest) --POST /chat/completions--> provider
//! ```
//!
//! Exactly one request per call. There is no retry anywhere in this module;
//! callers that want backoff implement it on top of the typed error.

pub mod client;

use async_trait::async_trait;
use thiserror::Error;

pub use client::{GatewayClient, GatewayConfig};

/// Plan text substituted when the provider answers successfully but without
/// any message content.
pub const FALLBACK_PLAN: &str = "Не удалось создать план";

/// Typed outcome of a failed model call.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Слишком много запросов. Подождите немного.")]
    RateLimited,

    #[error("Превышен лимит использования AI.")]
    QuotaExceeded,

    #[error("AI gateway error: {status}")]
    Upstream { status: u16, body: String },

    #[error("AI gateway request timed out")]
    Timeout,

    #[error("AI gateway request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("AI gateway returned an unreadable body: {0}")]
    Decode(#[source] reqwest::Error),
}

impl GatewayError {
    /// Classify a non-success HTTP status from the provider.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            429 => Self::RateLimited,
            402 => Self::QuotaExceeded,
            _ => Self::Upstream { status, body },
        }
    }

    /// Upstream HTTP status this error was derived from, if any.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            Self::RateLimited => Some(429),
            Self::QuotaExceeded => Some(402),
            Self::Upstream { status, .. } => Some(*status),
            Self::Timeout | Self::Transport(_) | Self::Decode(_) => None,
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Decode(err)
        } else {
            Self::Transport(err)
        }
    }
}

/// A text model that answers one prompt with one completion.
///
/// Object-safe so the planner can hold `Arc<dyn PlanModel>` and tests can
/// swap in a stub.
#[async_trait]
pub trait PlanModel: Send + Sync {
    /// Model identifier, for logs.
    fn name(&self) -> &str;

    /// Send `system` and `prompt` as a two-message exchange and return the
    /// completion text.
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, GatewayError>;
}

const _: () = {
    fn _assert_object_safe(_: &dyn PlanModel) {}
};
