//! Statistics report: percentages over the store's aggregates, rendered for chat or console.

use crate::core::templates;
use crate::infrastructure::entities::{ActionKind, Statistics, handle_label};
use chrono::{DateTime, TimeZone};
use minijinja::{Environment, context};
use serde::Serialize;
use std::fmt::Display;
use std::str::FromStr;

const CHAT_TOP_USERS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionShare {
    pub kind: String,
    pub name: String,
    pub count: i64,
    /// Share of all actions, 0 when there are none.
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserRow {
    pub identity: i64,
    pub name: String,
    pub handle: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticsReport {
    pub total_users: i64,
    pub total_actions: i64,
    pub actions: Vec<ActionShare>,
    pub top_users: Vec<UserRow>,
}

/// Percentage of `count` in `total`; 0 for an empty total.
pub fn percentage(count: i64, total: i64) -> f64 {
    if total > 0 {
        count as f64 / total as f64 * 100.0
    } else {
        0.0
    }
}

impl From<Statistics> for StatisticsReport {
    fn from(statistics: Statistics) -> Self {
        let total_actions = statistics.action_counts.iter().map(|a| a.count).sum();

        let actions = statistics
            .action_counts
            .into_iter()
            .map(|a| ActionShare {
                name: ActionKind::from_str(&a.kind)
                    .map(|kind| kind.display_name().to_owned())
                    .unwrap_or_else(|_| a.kind.clone()),
                percentage: percentage(a.count, total_actions),
                count: a.count,
                kind: a.kind,
            })
            .collect();

        let top_users = statistics
            .top_users
            .into_iter()
            .map(|u| UserRow {
                identity: u.identity,
                handle: handle_label(u.handle.as_deref()),
                name: u.given_name,
                count: u.action_count,
            })
            .collect();

        StatisticsReport {
            total_users: statistics.total_users,
            total_actions,
            actions,
            top_users,
        }
    }
}

#[derive(Serialize)]
struct RenderedShare<'a> {
    name: &'a str,
    count: i64,
    percentage: String,
}

impl StatisticsReport {
    fn rendered_actions(&self) -> Vec<RenderedShare<'_>> {
        self.actions
            .iter()
            .map(|a| RenderedShare {
                name: &a.name,
                count: a.count,
                percentage: format!("{:.1}", a.percentage),
            })
            .collect()
    }

    /// Markdown reply for the operator's chat command.
    pub fn render_chat(&self, env: &Environment<'_>) -> Result<String, minijinja::Error> {
        let top_users = &self.top_users[..self.top_users.len().min(CHAT_TOP_USERS)];

        env.get_template(templates::STATISTICS_CHAT)?.render(context! {
            total_users => self.total_users,
            total_actions => self.total_actions,
            actions => self.rendered_actions(),
            top_users => top_users,
        })
    }

    /// Plain-text report for the console.
    pub fn render_console<Tz>(
        &self,
        env: &Environment<'_>,
        generated_at: DateTime<Tz>,
    ) -> Result<String, minijinja::Error>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        env.get_template(templates::STATISTICS_CONSOLE)?
            .render(context! {
                total_users => self.total_users,
                total_actions => self.total_actions,
                actions => self.rendered_actions(),
                top_users => &self.top_users,
                generated_at => generated_at.format("%d.%m.%Y %H:%M:%S").to_string(),
            })
    }
}
