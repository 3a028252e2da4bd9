//! Database schema
//!
//! Creates the three tables if they are missing. There are no migrations:
//! an existing store (for example one provisioned from a bundled snapshot)
//! is used as-is.

use crate::error::Result;
use crate::nutrients::NUTRIENT_COLUMNS;
use sqlx::sqlite::SqlitePool;

pub const CATALOGUE_TABLE: &str = "Catalogue";
pub const LOG_TABLE: &str = "Log";
pub const RECIPE_LINES_TABLE: &str = "RecipeLines";

/// `energy REAL NOT NULL DEFAULT 0, protein REAL ...`
fn nutrient_column_defs() -> String {
    NUTRIENT_COLUMNS
        .iter()
        .map(|column| format!("{} REAL NOT NULL DEFAULT 0", column))
        .collect::<Vec<_>>()
        .join(",\n            ")
}

fn table_statements() -> Vec<String> {
    let nutrients = nutrient_column_defs();

    vec![
        format!(
            r#"
        CREATE TABLE IF NOT EXISTS {CATALOGUE_TABLE} (
            food_id INTEGER PRIMARY KEY AUTOINCREMENT,
            description TEXT NOT NULL,
            {nutrients}
        )
        "#
        ),
        format!(
            r#"
        CREATE TABLE IF NOT EXISTS {LOG_TABLE} (
            eaten_id INTEGER PRIMARY KEY AUTOINCREMENT,
            description TEXT NOT NULL,
            amount_eaten REAL NOT NULL,
            date_eaten TEXT NOT NULL,
            time_eaten TEXT NOT NULL,
            eaten_ts INTEGER NOT NULL,
            {nutrients}
        )
        "#
        ),
        format!("CREATE INDEX IF NOT EXISTS idx_log_eaten_ts ON {LOG_TABLE} (eaten_ts)"),
        // food_id is not a FOREIGN KEY: 0 marks lines not yet attached to any food
        format!(
            r#"
        CREATE TABLE IF NOT EXISTS {RECIPE_LINES_TABLE} (
            recipe_id INTEGER PRIMARY KEY AUTOINCREMENT,
            food_id INTEGER NOT NULL DEFAULT 0,
            copy_fg INTEGER NOT NULL DEFAULT 0,
            amount REAL NOT NULL,
            description TEXT NOT NULL,
            {nutrients}
        )
        "#
        ),
        format!(
            "CREATE INDEX IF NOT EXISTS idx_recipe_lines_food_id ON {RECIPE_LINES_TABLE} (food_id)"
        ),
    ]
}

/// Initialize database with schema
pub async fn initialize_database(pool: &SqlitePool) -> Result<()> {
    tracing::info!("Initializing database schema");

    let mut tx = pool.begin().await?;
    for statement in table_statements() {
        sqlx::query(&statement).execute(&mut *tx).await?;
    }
    tx.commit().await?;

    tracing::info!("Database initialization complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;
    use sqlx::Row;

    async fn memory_pool() -> SqlitePool {
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap()
    }

    async fn column_names(pool: &SqlitePool, table: &str) -> Vec<String> {
        sqlx::query(&format!("PRAGMA table_info({})", table))
            .fetch_all(pool)
            .await
            .unwrap()
            .iter()
            .map(|row| row.get::<String, _>("name"))
            .collect()
    }

    #[tokio::test]
    async fn test_initialize_database() {
        let pool = memory_pool().await;

        initialize_database(&pool).await.unwrap();

        for table in [CATALOGUE_TABLE, LOG_TABLE, RECIPE_LINES_TABLE] {
            let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
                .fetch_one(&pool)
                .await
                .unwrap();
            assert_eq!(count, 0);
        }
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let pool = memory_pool().await;

        initialize_database(&pool).await.unwrap();
        initialize_database(&pool).await.unwrap();
    }

    #[tokio::test]
    async fn test_every_table_carries_all_nutrient_columns() {
        let pool = memory_pool().await;
        initialize_database(&pool).await.unwrap();

        for (table, identity) in [
            (CATALOGUE_TABLE, 2),
            (LOG_TABLE, 6),
            (RECIPE_LINES_TABLE, 5),
        ] {
            let columns = column_names(&pool, table).await;
            assert_eq!(columns.len(), identity + NUTRIENT_COLUMNS.len(), "{}", table);
            assert_eq!(&columns[identity..], &NUTRIENT_COLUMNS[..], "{}", table);
        }
    }
}
