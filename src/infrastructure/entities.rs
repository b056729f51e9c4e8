//! Database entities

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use std::fmt::{self, Display};
use std::str::FromStr;

/// Category of a logged user action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum ActionKind {
    Start,
    ButtonAbout,
    ButtonCases,
    ButtonDirector,
    ButtonPhone,
    StartApplication,
    ApplicationSubmitted,
    AiQuestion,
    ViewStatistics,
}

impl ActionKind {
    pub const ALL: [ActionKind; 9] = [
        ActionKind::Start,
        ActionKind::ButtonAbout,
        ActionKind::ButtonCases,
        ActionKind::ButtonDirector,
        ActionKind::ButtonPhone,
        ActionKind::StartApplication,
        ActionKind::ApplicationSubmitted,
        ActionKind::AiQuestion,
        ActionKind::ViewStatistics,
    ];

    /// Stored representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Start => "start",
            ActionKind::ButtonAbout => "button_about",
            ActionKind::ButtonCases => "button_cases",
            ActionKind::ButtonDirector => "button_director",
            ActionKind::ButtonPhone => "button_phone",
            ActionKind::StartApplication => "start_application",
            ActionKind::ApplicationSubmitted => "application_submitted",
            ActionKind::AiQuestion => "ai_question",
            ActionKind::ViewStatistics => "view_statistics",
        }
    }

    /// Human readable name used in statistics reports.
    pub fn display_name(&self) -> &'static str {
        match self {
            ActionKind::Start => "🚀 /start",
            ActionKind::ButtonAbout => "📌 О нас",
            ActionKind::ButtonCases => "💼 Кейсы",
            ActionKind::ButtonDirector => "👤 Руководитель",
            ActionKind::ButtonPhone => "📞 Номер телефона",
            ActionKind::StartApplication => "📝 Начало заявки",
            ActionKind::ApplicationSubmitted => "✅ Заявка отправлена",
            ActionKind::AiQuestion => "🤖 Вопрос AI",
            ActionKind::ViewStatistics => "📊 Статистика",
        }
    }
}

impl Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActionKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or(())
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub identity: i64,
    pub handle: Option<String>,
    pub given_name: String,
    pub family_name: Option<String>,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

/// The descriptive part of a [`User`], as delivered by the chat transport.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct UserSummary {
    pub identity: i64,
    pub handle: Option<String>,
    pub given_name: String,
    pub family_name: Option<String>,
}

impl UserSummary {
    pub fn full_name(&self) -> String {
        format!(
            "{} {}",
            self.given_name,
            self.family_name.as_deref().unwrap_or_default()
        )
        .trim()
        .to_owned()
    }

    /// `@handle`, or a placeholder when the user has none.
    pub fn handle_label(&self) -> String {
        handle_label(self.handle.as_deref())
    }
}

pub fn handle_label(handle: Option<&str>) -> String {
    match handle {
        Some(handle) if !handle.is_empty() => format!("@{handle}"),
        _ => "без username".to_owned(),
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ActionEvent {
    pub id: i64,
    pub user_identity: i64,
    pub kind: ActionKind,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct IntakeRecord {
    pub id: i64,
    pub user_identity: i64,
    pub phone: String,
    pub created_at: DateTime<Utc>,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct ActionCount {
    pub kind: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct TopUser {
    pub identity: i64,
    pub given_name: String,
    pub handle: Option<String>,
    pub action_count: i64,
}

/// Aggregates over the whole event store.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Statistics {
    pub total_users: i64,
    /// Ordered by count, descending.
    pub action_counts: Vec<ActionCount>,
    /// At most ten users, most active first.
    pub top_users: Vec<TopUser>,
}
