//! Database module
//!
//! This module provides all database functionality including:
//! - Store opening and table creation
//! - Model definitions
//! - Repository layer for CRUD operations

pub mod models;
pub mod repository;
pub mod schema;

pub use models::*;
pub use repository::Repository;
pub use schema::initialize_database;

use crate::error::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Build connection options for a read-write store file.
fn connect_options(db_path: &Path) -> std::result::Result<SqliteConnectOptions, sqlx::Error> {
    SqliteConnectOptions::from_str(&format!("sqlite://{}?mode=rwc", db_path.display())).map(
        |opts| {
            opts.create_if_missing(true)
                .busy_timeout(Duration::from_secs(5))
                .journal_mode(SqliteJournalMode::Wal)
        },
    )
}

/// Open the store file and make sure the tables exist.
///
/// SQLite serializes writers; the busy timeout lets concurrent callers
/// wait for the write lock instead of failing immediately.
pub async fn create_pool(db_path: &Path) -> Result<SqlitePool> {
    tracing::info!("Opening store at: {:?}", db_path);

    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(connect_options(db_path)?)
        .await?;

    initialize_database(&pool).await?;

    tracing::info!("Store opened successfully");

    Ok(pool)
}

/// An open store and where it lives.
///
/// Constructed explicitly and handed to the gateway; closing it ends the
/// store's lifetime.
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
    location: Option<PathBuf>,
}

impl Store {
    pub async fn open(db_path: &Path) -> Result<Self> {
        let pool = create_pool(db_path).await?;
        Ok(Self {
            pool,
            location: Some(db_path.to_path_buf()),
        })
    }

    /// A private in-memory store on a single connection
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        initialize_database(&pool).await?;

        Ok(Self {
            pool,
            location: None,
        })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// File backing the store, `None` for in-memory stores
    pub fn location(&self) -> Option<&Path> {
        self.location.as_deref()
    }

    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("Store closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_open_creates_file_and_parent() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("nested").join("food.db");

        let store = Store::open(&db_path).await.unwrap();

        assert!(db_path.exists());
        assert_eq!(store.location(), Some(db_path.as_path()));
        store.close().await;
    }

    #[tokio::test]
    async fn test_reopen_keeps_rows() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("food.db");

        let store = Store::open(&db_path).await.unwrap();
        sqlx::query("INSERT INTO Catalogue (description) VALUES ('Apple')")
            .execute(store.pool())
            .await
            .unwrap();
        store.close().await;

        let store = Store::open(&db_path).await.unwrap();
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM Catalogue")
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_in_memory_has_no_location() {
        let store = Store::in_memory().await.unwrap();
        assert!(store.location().is_none());
    }
}
