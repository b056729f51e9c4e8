//! Pooled SQLite connection

use crate::infrastructure::settings::Settings;
use di::{Ref, inject, injectable};
use sqlx::SqlitePool;
use sqlx::migrate::MigrateError;
use sqlx::sqlite::SqlitePoolOptions;
use std::ops::Deref;

pub struct DatabaseConnection {
    connection: SqlitePool,
}

#[injectable]
impl DatabaseConnection {
    #[inject]
    pub fn create(settings: Ref<Settings>) -> DatabaseConnection {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_lazy(&settings.database_url)
            .expect("DATABASE_URL must be a valid SQLite URL");

        DatabaseConnection { connection: pool }
    }
}

impl DatabaseConnection {
    /// Wraps an already opened pool, e.g. an in-memory database.
    pub fn from_pool(connection: SqlitePool) -> DatabaseConnection {
        DatabaseConnection { connection }
    }

    /// Applies the embedded schema migrations.
    pub async fn migrate(&self) -> Result<(), MigrateError> {
        sqlx::migrate!().run(&self.connection).await
    }
}

impl Deref for DatabaseConnection {
    type Target = SqlitePool;

    fn deref(&self) -> &Self::Target {
        &self.connection
    }
}
