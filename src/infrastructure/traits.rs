//! Infrastructure traits, used for DI on higher levels

use crate::infrastructure::entities;
use crate::infrastructure::entities::ActionKind;
use async_trait::async_trait;
use thiserror::Error;

/// Failure of the backing store. Fatal to the request that hit it.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Durable log of users, their actions and submitted intakes.
///
/// Every operation is atomic on its own; no transaction spans two calls.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Inserts the user on first sight, otherwise refreshes names, handle and last-seen.
    async fn upsert_user(&self, user: &entities::UserSummary) -> Result<(), StoreError>;

    async fn append_action(&self, identity: i64, kind: ActionKind) -> Result<(), StoreError>;

    /// Records a validated phone number with status `new`.
    async fn append_intake(&self, identity: i64, phone: &str) -> Result<(), StoreError>;

    async fn user_summary(
        &self,
        identity: i64,
    ) -> Result<Option<entities::UserSummary>, StoreError>;

    async fn find_user(&self, identity: i64) -> Result<Option<entities::User>, StoreError>;

    /// Actions of one user in append order.
    async fn actions_for(&self, identity: i64) -> Result<Vec<entities::ActionEvent>, StoreError>;

    /// Most recent intakes first.
    async fn recent_intakes(
        &self,
        limit: i64,
    ) -> Result<Vec<entities::IntakeRecord>, StoreError>;

    async fn statistics(&self) -> Result<entities::Statistics, StoreError>;
}
