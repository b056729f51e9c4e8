//! Process settings loaded from the environment

use di::{inject, injectable};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://bot_analytics.db?mode=rwc";
pub const DEFAULT_AI_API_BASE: &str = "https://api.x.ai/v1";
pub const DEFAULT_SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4";
pub const DEFAULT_SETTINGS_WORKSHEET: &str = "Настройки";

/// Immutable settings shared by every service.
///
/// Built once by the composition root; nothing reads the environment after that.
#[derive(Debug, Clone)]
pub struct Settings {
    pub bot_token: String,
    /// The single identity allowed to view statistics and receive intake notifications.
    pub operator_id: i64,
    pub database_url: String,
    pub ai_api_base: String,
    pub ai_api_key: String,
    pub spreadsheet_id: Option<String>,
    pub sheets_api_key: Option<String>,
    pub sheets_api_base: String,
    pub settings_worksheet: String,
    pub director_photo: PathBuf,
    pub operator_api_addr: Option<String>,
    /// Bearer token required by the operator API. The API stays off without one.
    pub operator_api_token: Option<String>,
}

#[injectable]
impl Settings {
    #[inject]
    pub fn create() -> Settings {
        dotenvy::dotenv().ok();

        Settings {
            bot_token: env::var("BOT_TOKEN").unwrap_or_default(),
            operator_id: env::var("ADMIN_ID")
                .ok()
                .and_then(|s| i64::from_str(s.trim()).ok())
                .unwrap_or(0),
            database_url: env::var("DATABASE_URL").unwrap_or(DEFAULT_DATABASE_URL.to_owned()),
            ai_api_base: env::var("AI_API_BASE").unwrap_or(DEFAULT_AI_API_BASE.to_owned()),
            ai_api_key: env::var("GROK_API_KEY").unwrap_or_default(),
            spreadsheet_id: non_empty_var("GOOGLE_SPREADSHEET_ID"),
            sheets_api_key: non_empty_var("GOOGLE_API_KEY"),
            sheets_api_base: env::var("SHEETS_API_BASE")
                .unwrap_or(DEFAULT_SHEETS_API_BASE.to_owned()),
            settings_worksheet: env::var("SETTINGS_WORKSHEET")
                .unwrap_or(DEFAULT_SETTINGS_WORKSHEET.to_owned()),
            director_photo: env::var("DIRECTOR_PHOTO")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("director.jpg")),
            operator_api_addr: non_empty_var("OPERATOR_API_ADDR"),
            operator_api_token: non_empty_var("OPERATOR_API_TOKEN"),
        }
    }
}

impl Settings {
    /// Whether a spreadsheet is configured as the configuration source.
    pub fn sheets_enabled(&self) -> bool {
        self.spreadsheet_id.is_some()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            bot_token: String::new(),
            operator_id: 0,
            database_url: DEFAULT_DATABASE_URL.to_owned(),
            ai_api_base: DEFAULT_AI_API_BASE.to_owned(),
            ai_api_key: String::new(),
            spreadsheet_id: None,
            sheets_api_key: None,
            sheets_api_base: DEFAULT_SHEETS_API_BASE.to_owned(),
            settings_worksheet: DEFAULT_SETTINGS_WORKSHEET.to_owned(),
            director_photo: PathBuf::from("director.jpg"),
            operator_api_addr: None,
            operator_api_token: None,
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}
