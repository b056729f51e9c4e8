//! DB Repository abstractions

use crate::infrastructure::database::DatabaseConnection;
use crate::infrastructure::entities::{
    ActionCount, ActionEvent, ActionKind, IntakeRecord, Statistics, TopUser, User, UserSummary,
};
use crate::infrastructure::traits::{EventStore, StoreError};
use async_trait::async_trait;
use chrono::Utc;
use di::{Ref, injectable};
use log::{error, info};
use sqlx::Row;

const TOP_USERS_LIMIT: i64 = 10;

#[injectable(EventStore)]
pub struct DbEventStore {
    connection: Ref<DatabaseConnection>,
}

impl DbEventStore {
    pub fn new(connection: Ref<DatabaseConnection>) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl EventStore for DbEventStore {
    async fn upsert_user(&self, user: &UserSummary) -> Result<(), StoreError> {
        let now = Utc::now();

        // last_seen never moves backwards, even if the wall clock does.
        let result = sqlx::query(
            "INSERT INTO users (identity, handle, given_name, family_name, first_seen, last_seen) VALUES (?, ?, ?, ?, ?, ?) \
             ON CONFLICT (identity) DO UPDATE SET handle = excluded.handle, given_name = excluded.given_name, family_name = excluded.family_name, \
             last_seen = CASE WHEN julianday(excluded.last_seen) >= julianday(users.last_seen) THEN excluded.last_seen ELSE users.last_seen END \
             RETURNING first_seen = last_seen AS created",
        )
        .bind(user.identity)
        .bind(&user.handle)
        .bind(&user.given_name)
        .bind(&user.family_name)
        .bind(now)
        .bind(now)
        .fetch_one(&**self.connection)
        .await
        .map_err(|e| {
            error!("failed to upsert user {}: {e}", user.identity);
            e
        })?;

        if result.try_get::<bool, _>("created").unwrap_or(false) {
            info!("new user {} ({})", user.identity, user.given_name);
        }

        Ok(())
    }

    async fn append_action(&self, identity: i64, kind: ActionKind) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO actions (user_identity, kind, created_at) VALUES (?, ?, ?)")
            .bind(identity)
            .bind(kind)
            .bind(Utc::now())
            .execute(&**self.connection)
            .await
            .map_err(|e| {
                error!("failed to append action {kind} for {identity}: {e}");
                e
            })?;

        info!("action {kind} by user {identity}");
        Ok(())
    }

    async fn append_intake(&self, identity: i64, phone: &str) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO intakes (user_identity, phone, created_at) VALUES (?, ?, ?)")
            .bind(identity)
            .bind(phone)
            .bind(Utc::now())
            .execute(&**self.connection)
            .await
            .map_err(|e| {
                error!("failed to store intake for {identity}: {e}");
                e
            })?;

        info!("new intake from user {identity}: {phone}");
        Ok(())
    }

    async fn user_summary(&self, identity: i64) -> Result<Option<UserSummary>, StoreError> {
        Ok(sqlx::query_as(
            "SELECT identity, handle, given_name, family_name FROM users WHERE identity = ?",
        )
        .bind(identity)
        .fetch_optional(&**self.connection)
        .await?)
    }

    async fn find_user(&self, identity: i64) -> Result<Option<User>, StoreError> {
        Ok(sqlx::query_as("SELECT * FROM users WHERE identity = ?")
            .bind(identity)
            .fetch_optional(&**self.connection)
            .await?)
    }

    async fn actions_for(&self, identity: i64) -> Result<Vec<ActionEvent>, StoreError> {
        Ok(
            sqlx::query_as("SELECT * FROM actions WHERE user_identity = ? ORDER BY id ASC")
                .bind(identity)
                .fetch_all(&**self.connection)
                .await?,
        )
    }

    async fn recent_intakes(&self, limit: i64) -> Result<Vec<IntakeRecord>, StoreError> {
        Ok(sqlx::query_as("SELECT * FROM intakes ORDER BY id DESC LIMIT ?")
            .bind(limit)
            .fetch_all(&**self.connection)
            .await?)
    }

    async fn statistics(&self) -> Result<Statistics, StoreError> {
        let (total_users,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&**self.connection)
            .await?;

        let action_counts: Vec<ActionCount> = sqlx::query_as(
            "SELECT kind, COUNT(*) AS count FROM actions GROUP BY kind ORDER BY count DESC, kind ASC",
        )
        .fetch_all(&**self.connection)
        .await?;

        let top_users: Vec<TopUser> = sqlx::query_as(
            "SELECT users.identity, users.given_name, users.handle, COUNT(actions.id) AS action_count \
             FROM users LEFT JOIN actions ON actions.user_identity = users.identity \
             GROUP BY users.identity \
             ORDER BY action_count DESC, julianday(users.first_seen) ASC \
             LIMIT ?",
        )
        .bind(TOP_USERS_LIMIT)
        .fetch_all(&**self.connection)
        .await?;

        Ok(Statistics {
            total_users,
            action_counts,
            top_users,
        })
    }
}
