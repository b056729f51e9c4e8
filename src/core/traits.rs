//! DI "Interfaces"

use crate::core::configuration::{
    AiParameters, ConfigurationSnapshot, DEFAULT_SYSTEM_PROMPT, SettingsTable,
};
use async_trait::async_trait;
use log::{error, warn};
use thiserror::Error;

/// Failure of a best-effort external dependency.
///
/// Both variants lead to the same fallback; they are kept apart so the logs tell them apart.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DependencyError {
    /// Connectivity, authorization or "not configured".
    #[error("dependency unavailable: {0}")]
    Unavailable(String),
    /// The dependency answered, but with something unusable.
    #[error("dependency returned invalid data: {0}")]
    InvalidData(String),
}

impl DependencyError {
    fn log(&self, what: &str) {
        match self {
            DependencyError::Unavailable(reason) => {
                error!("{what}: source unavailable ({reason}), using default")
            }
            DependencyError::InvalidData(reason) => {
                warn!("{what}: invalid data ({reason}), using default")
            }
        }
    }
}

/// Source of the AI system prompt and call parameters.
#[async_trait]
pub trait ConfigurationSource: Send + Sync {
    /// Reads the system prompt.
    async fn fetch_prompt(&self) -> Result<String, DependencyError>;

    /// Reads the flat key/value settings table.
    async fn fetch_settings(&self) -> Result<SettingsTable, DependencyError>;

    /// The system prompt, or the built-in default when it can't be read.
    async fn prompt(&self) -> String {
        match self.fetch_prompt().await {
            Ok(prompt) => prompt,
            Err(e) => {
                e.log("system prompt");
                DEFAULT_SYSTEM_PROMPT.to_owned()
            }
        }
    }

    /// AI parameters with per-field defaults.
    async fn ai_parameters(&self) -> AiParameters {
        match self.fetch_settings().await {
            Ok(settings) => AiParameters::from_settings(&settings),
            Err(e) => {
                e.log("AI parameters");
                AiParameters::default()
            }
        }
    }

    /// Fresh snapshot for one request. Never cached.
    async fn snapshot(&self) -> ConfigurationSnapshot {
        let (prompt, parameters) = tokio::join!(self.prompt(), self.ai_parameters());
        ConfigurationSnapshot { prompt, parameters }
    }
}

/// Stateless question/answer bridge to the AI completion service.
#[async_trait]
pub trait Assistant: Send + Sync {
    /// Always returns something that can be shown to the user.
    async fn answer(&self, question: &str) -> String;
}

/// Outbound pushes that are not replies to the current message.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Sends a Markdown message to the given identity.
    async fn push(&self, identity: i64, text: &str) -> Result<(), DependencyError>;

    /// Shows a "typing" indicator in the chat.
    async fn show_typing(&self, chat: i64) -> Result<(), DependencyError>;
}
