//! Mentionable store: Diesel-backed persistence for occurrence records.
//!
//! One table per mentionable kind, each with the same identity tuple
//! `(value, username, room_name, mention_time)` enforced by a unique index.
//! The unique index is the only cross-worker coordination primitive: two
//! concurrent inserts of the same tuple resolve to exactly one success and one
//! [`StoreError::Duplicate`](crate::error::StoreError).

pub mod dao;
pub mod schema;

pub use dao::{
    EntityMentionDao, EmojiMentionDao, MentionStore, MentionableDao, MessageSummaryDao,
};

use crate::error::StoreError;
use diesel::connection::SimpleConnection;
use diesel::r2d2::{self, ConnectionManager, CustomizeConnection};
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;
use std::time::Duration;

pub type Pool = r2d2::Pool<ConnectionManager<SqliteConnection>>;
pub type PooledConnection = r2d2::PooledConnection<ConnectionManager<SqliteConnection>>;

/// Database connection pool manager.
pub struct Database {
    pool: Arc<Pool>,
}

impl Database {
    /// Open (or create) the database at `database_url` with default pool
    /// settings and apply the schema.
    pub fn open(database_url: &str) -> Result<Self, StoreError> {
        let db = Self::open_with_config(database_url, DatabaseConfig::default())?;
        db.run_migrations()?;
        Ok(db)
    }

    /// Open a database with custom pool configuration. Does not apply the
    /// schema.
    pub fn open_with_config(
        database_url: &str,
        config: DatabaseConfig,
    ) -> Result<Self, StoreError> {
        let manager = ConnectionManager::<SqliteConnection>::new(database_url);

        let pool = r2d2::Pool::builder()
            .max_size(config.max_connections)
            .connection_timeout(Duration::from_secs(config.connection_timeout_secs))
            .connection_customizer(Box::new(ConnectionPragmas))
            .build(manager)
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        Ok(Database {
            pool: Arc::new(pool),
        })
    }

    /// Apply the schema DDL idempotently.
    pub fn run_migrations(&self) -> Result<(), StoreError> {
        let mut conn = self.connection()?;
        conn.batch_execute(schema::DDL)
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        tracing::debug!("mention store schema applied");
        Ok(())
    }

    /// Get a connection from the pool.
    pub fn connection(&self) -> Result<PooledConnection, StoreError> {
        self.pool
            .get()
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    /// Test database connectivity.
    pub fn test_connection(&self) -> Result<(), StoreError> {
        use diesel::prelude::*;
        let mut conn = self.connection()?;
        diesel::sql_query("SELECT 1")
            .execute(&mut conn)
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(())
    }

    pub fn pool(&self) -> &Arc<Pool> {
        &self.pool
    }
}

/// Database pool configuration options.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub connection_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            max_connections: 8,
            connection_timeout_secs: 30,
        }
    }
}

/// Per-connection pragmas: WAL for concurrent readers during writes, a busy
/// timeout so parallel workers queue instead of failing fast.
#[derive(Debug)]
struct ConnectionPragmas;

impl CustomizeConnection<SqliteConnection, r2d2::Error> for ConnectionPragmas {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), r2d2::Error> {
        conn.batch_execute(
            "PRAGMA journal_mode = WAL; \
             PRAGMA synchronous = NORMAL; \
             PRAGMA busy_timeout = 5000; \
             PRAGMA foreign_keys = ON;",
        )
        .map_err(r2d2::Error::QueryError)
    }
}
