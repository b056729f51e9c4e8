//! AI configuration values and the static fallback source.

use crate::core::traits::{ConfigurationSource, DependencyError};
use async_trait::async_trait;
use di::{inject, injectable};
use serde::Serialize;
use std::collections::HashMap;
use std::str::FromStr;

pub const DEFAULT_SYSTEM_PROMPT: &str =
    "Ты helpful AI-ассистент. Отвечай на русском языке кратко и по делу.";
pub const DEFAULT_MODEL: &str = "grok-beta";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

pub const KEY_MODEL: &str = "AI_Model";
pub const KEY_TEMPERATURE: &str = "AI_Temperature";
pub const KEY_MAX_TOKENS: &str = "AI_MaxTokens";

/// Flat key/value table read from the tabular source.
pub type SettingsTable = HashMap<String, String>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AiParameters {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for AiParameters {
    fn default() -> Self {
        AiParameters {
            model: DEFAULT_MODEL.to_owned(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

impl AiParameters {
    /// Overlays recognized keys onto the defaults.
    ///
    /// A numeric value that doesn't parse leaves only that field at its default.
    pub fn from_settings(settings: &SettingsTable) -> AiParameters {
        let mut parameters = AiParameters::default();

        if let Some(model) = settings.get(KEY_MODEL).filter(|m| !m.trim().is_empty()) {
            parameters.model = model.trim().to_owned();
        }
        if let Some(temperature) = settings
            .get(KEY_TEMPERATURE)
            .and_then(|t| f32::from_str(t.trim()).ok())
        {
            parameters.temperature = temperature;
        }
        if let Some(max_tokens) = settings
            .get(KEY_MAX_TOKENS)
            .and_then(|t| u32::from_str(t.trim()).ok())
        {
            parameters.max_tokens = max_tokens;
        }

        parameters
    }
}

/// What one AI request is made with.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigurationSnapshot {
    pub prompt: String,
    pub parameters: AiParameters,
}

impl Default for ConfigurationSnapshot {
    fn default() -> Self {
        ConfigurationSnapshot {
            prompt: DEFAULT_SYSTEM_PROMPT.to_owned(),
            parameters: AiParameters::default(),
        }
    }
}

/// Used when no spreadsheet is configured: always the built-in defaults.
pub struct StaticConfigurationSource;

#[injectable(ConfigurationSource)]
impl StaticConfigurationSource {
    #[inject]
    pub fn create() -> StaticConfigurationSource {
        StaticConfigurationSource
    }
}

#[async_trait]
impl ConfigurationSource for StaticConfigurationSource {
    async fn fetch_prompt(&self) -> Result<String, DependencyError> {
        Ok(DEFAULT_SYSTEM_PROMPT.to_owned())
    }

    async fn fetch_settings(&self) -> Result<SettingsTable, DependencyError> {
        Ok(SettingsTable::new())
    }
}
