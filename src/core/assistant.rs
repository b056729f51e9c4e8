//! AI Assistant service.
//!
//! One question in, one answer out. No conversation memory: every call sends the system
//! prompt and the question only.

use crate::core::configuration::ConfigurationSnapshot;
use crate::core::traits::{Assistant, ConfigurationSource};
use crate::infrastructure::settings::Settings;
use async_trait::async_trait;
use di::{Ref, inject, injectable};
use log::{debug, error};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub const COMPLETION_TIMEOUT: Duration = Duration::from_secs(30);

/// Shown when the API answered with an error status.
pub const API_ERROR_REPLY: &str =
    "Извините, произошла ошибка при обработке вашего вопроса. Попробуйте позже.";
/// Shown when the API could not be reached or its answer could not be read.
pub const CALL_FAILED_REPLY: &str =
    "Произошла ошибка при связи с AI. Пожалуйста, попробуйте позже.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// OpenAI-compatible, non-streaming completion request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub model: String,
    pub stream: bool,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl CompletionRequest {
    pub fn new(snapshot: ConfigurationSnapshot, question: &str) -> CompletionRequest {
        CompletionRequest {
            messages: vec![
                ChatMessage {
                    role: Role::System,
                    content: snapshot.prompt,
                },
                ChatMessage {
                    role: Role::User,
                    content: question.to_owned(),
                },
            ],
            model: snapshot.parameters.model,
            stream: false,
            temperature: snapshot.parameters.temperature,
            max_tokens: snapshot.parameters.max_tokens,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: ChatMessage,
}

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("completion API returned {0}: {1}")]
    Status(StatusCode, String),
    #[error("completion call failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("completion response unusable: {0}")]
    Malformed(String),
}

impl CompletionError {
    /// The fixed text the user sees for this failure.
    pub fn user_reply(&self) -> &'static str {
        match self {
            CompletionError::Status(..) => API_ERROR_REPLY,
            CompletionError::Transport(_) | CompletionError::Malformed(_) => CALL_FAILED_REPLY,
        }
    }
}

pub struct GrokAssistant {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    configuration: Ref<dyn ConfigurationSource>,
}

#[injectable(Assistant)]
impl GrokAssistant {
    #[inject]
    pub fn create(
        settings: Ref<Settings>,
        configuration: Ref<dyn ConfigurationSource>,
    ) -> GrokAssistant {
        GrokAssistant::new(&settings.ai_api_base, &settings.ai_api_key, configuration)
    }
}

impl GrokAssistant {
    pub fn new(
        api_base: &str,
        api_key: &str,
        configuration: Ref<dyn ConfigurationSource>,
    ) -> GrokAssistant {
        let client = reqwest::Client::builder()
            .timeout(COMPLETION_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        GrokAssistant {
            client,
            endpoint: format!("{}/chat/completions", api_base.trim_end_matches('/')),
            api_key: api_key.to_owned(),
            configuration,
        }
    }

    /// Issues exactly one completion request.
    pub async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::Status(status, body));
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| CompletionError::Malformed(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| CompletionError::Malformed("no choices".to_owned()))
    }
}

#[async_trait]
impl Assistant for GrokAssistant {
    async fn answer(&self, question: &str) -> String {
        let snapshot = self.configuration.snapshot().await;
        debug!(
            "asking {} (temperature {})",
            snapshot.parameters.model, snapshot.parameters.temperature
        );

        match self.complete(&CompletionRequest::new(snapshot, question)).await {
            Ok(answer) => answer,
            Err(e) => {
                error!("{e}");
                e.user_reply().to_owned()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::configuration::{AiParameters, DEFAULT_SYSTEM_PROMPT};

    #[test]
    fn test_request_carries_prompt_and_question() {
        let request = CompletionRequest::new(ConfigurationSnapshot::default(), "Hello");

        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, Role::System);
        assert_eq!(request.messages[0].content, DEFAULT_SYSTEM_PROMPT);
        assert_eq!(request.messages[1].role, Role::User);
        assert_eq!(request.messages[1].content, "Hello");
        assert!(!request.stream);
    }

    #[test]
    fn test_request_uses_snapshot_parameters() {
        let snapshot = ConfigurationSnapshot {
            prompt: "Be brief".to_owned(),
            parameters: AiParameters {
                model: "grok-2".to_owned(),
                temperature: 0.1,
                max_tokens: 64,
            },
        };

        let request = CompletionRequest::new(snapshot, "Why?");
        assert_eq!(request.model, "grok-2");
        assert_eq!(request.temperature, 0.1);
        assert_eq!(request.max_tokens, 64);
    }

    #[test]
    fn test_roles_serialize_lowercase() {
        let message = ChatMessage {
            role: Role::Assistant,
            content: "Hi there!".to_owned(),
        };

        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["role"], "assistant");
        assert_eq!(json["content"], "Hi there!");
    }

    #[test]
    fn test_user_reply_distinguishes_status_from_transport() {
        let status = CompletionError::Status(StatusCode::BAD_GATEWAY, String::new());
        let malformed = CompletionError::Malformed("no choices".to_owned());

        assert_eq!(status.user_reply(), API_ERROR_REPLY);
        assert_eq!(malformed.user_reply(), CALL_FAILED_REPLY);
    }
}
