//! OpenAI-compatible chat-completions client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info};

use super::{FALLBACK_PLAN, GatewayError, PlanModel};

/// Connection settings for the model gateway.
#[derive(Clone)]
pub struct GatewayConfig {
    /// Base URL without the trailing `/chat/completions`.
    pub base_url: String,
    /// Model identifier sent in the request body.
    pub model: String,
    /// Bearer token for the `Authorization` header.
    pub api_key: String,
    /// Upper bound on the whole request, connect through body.
    pub timeout: Duration,
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl GatewayConfig {
    pub const DEFAULT_BASE_URL: &str = "https://ai.gateway.lovable.dev/v1";
    pub const DEFAULT_MODEL: &str = "google/gemini-2.5-flash";
    pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: Self::DEFAULT_BASE_URL.to_owned(),
            model: Self::DEFAULT_MODEL.to_owned(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

/// Pull `choices[0].message.content`, or the fallback when any step of that
/// path is missing, null, not a string, or empty.
fn extract_plan_text(response: &Value) -> String {
    response
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .filter(|content| !content.is_empty())
        .map_or_else(|| FALLBACK_PLAN.to_owned(), str::to_owned)
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// [`PlanModel`] backed by an HTTP chat-completions endpoint.
pub struct GatewayClient {
    http: Client,
    config: GatewayConfig,
}

impl GatewayClient {
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(GatewayError::Transport)?;
        Ok(Self { http, config })
    }
}

#[async_trait]
impl PlanModel for GatewayClient {
    fn name(&self) -> &str {
        &self.config.model
    }

    async fn complete(&self, system: &str, prompt: &str) -> Result<String, GatewayError> {
        let body = ChatRequest {
            model: &self.config.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
        };

        info!(model = %self.config.model, "sending request to AI gateway");
        let response = self
            .http
            .post(self.config.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), body = %text, "AI gateway error");
            return Err(GatewayError::from_status(status.as_u16(), text));
        }

        let parsed: Value = response.json().await?;
        let plan = extract_plan_text(&parsed);
        debug!(chars = plan.chars().count(), "AI response received");
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan_from(json: &str) -> String {
        let value: Value = serde_json::from_str(json).unwrap();
        extract_plan_text(&value)
    }

    #[test]
    fn extracts_first_choice_content() {
        let text = plan_from(
            r###"{"choices":[{"message":{"role":"assistant","content":"## План"}},
                           {"message":{"content":"second"}}]}"###,
        );
        assert_eq!(text, "## План");
    }

    #[test]
    fn missing_choices_falls_back() {
        assert_eq!(plan_from("{}"), FALLBACK_PLAN);
        assert_eq!(plan_from(r#"{"choices":[]}"#), FALLBACK_PLAN);
    }

    #[test]
    fn null_choices_fall_back() {
        assert_eq!(plan_from(r#"{"choices":null}"#), FALLBACK_PLAN);
        assert_eq!(plan_from(r#"{"choices":[null]}"#), FALLBACK_PLAN);
        assert_eq!(plan_from(r#"{"choices":[{"message":null}]}"#), FALLBACK_PLAN);
    }

    #[test]
    fn missing_message_or_content_falls_back() {
        assert_eq!(plan_from(r#"{"choices":[{}]}"#), FALLBACK_PLAN);
        assert_eq!(
            plan_from(r#"{"choices":[{"message":{"content":null}}]}"#),
            FALLBACK_PLAN
        );
        assert_eq!(
            plan_from(r#"{"choices":[{"message":{"content":""}}]}"#),
            FALLBACK_PLAN
        );
        assert_eq!(
            plan_from(r#"{"choices":[{"message":{"content":42}}]}"#),
            FALLBACK_PLAN
        );
    }

    #[test]
    fn non_object_body_falls_back() {
        assert_eq!(plan_from("null"), FALLBACK_PLAN);
        assert_eq!(plan_from("[1,2]"), FALLBACK_PLAN);
    }

    #[test]
    fn endpoint_joins_without_double_slash() {
        let cfg = GatewayConfig::new("k").with_base_url("http://127.0.0.1:9/v1/");
        assert_eq!(cfg.endpoint(), "http://127.0.0.1:9/v1/chat/completions");
    }

    #[test]
    fn request_body_shape() {
        let body = ChatRequest {
            model: "m",
            messages: [
                ChatMessage {
                    role: "system",
                    content: "sys",
                },
                ChatMessage {
                    role: "user",
                    content: "hi",
                },
            ],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "model": "m",
                "messages": [
                    { "role": "system", "content": "sys" },
                    { "role": "user", "content": "hi" }
                ]
            })
        );
    }

    #[test]
    fn defaults() {
        let cfg = GatewayConfig::new("secret");
        assert_eq!(cfg.base_url, GatewayConfig::DEFAULT_BASE_URL);
        assert_eq!(cfg.model, "google/gemini-2.5-flash");
        assert_eq!(cfg.timeout, Duration::from_secs(60));
    }
}
