//! Repository layer for database operations
//!
//! Typed CRUD over the Catalogue, Log and RecipeLines tables. Every
//! statement binds the nutrient columns from `NUTRIENT_COLUMNS`, so the
//! three tables are always written with the same field set and order.

use super::models::*;
use super::schema::{CATALOGUE_TABLE, LOG_TABLE, RECIPE_LINES_TABLE};
use crate::config::SENTINEL_FOOD_ID;
use crate::error::{AppError, Result};
use crate::nutrients::{NutrientRecord, NUTRIENT_COLUMNS, NUTRIENT_COUNT};
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments};
use sqlx::SqlitePool;

type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

/// `energy, protein, ...`
fn nutrient_columns() -> String {
    NUTRIENT_COLUMNS.join(", ")
}

/// `?, ?, ...` for `count` values
fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

/// `energy = ?, protein = ?, ...`
fn nutrient_assignments() -> String {
    NUTRIENT_COLUMNS
        .iter()
        .map(|column| format!("{} = ?", column))
        .collect::<Vec<_>>()
        .join(", ")
}

fn insert_sql(table: &str, columns: &[&str]) -> String {
    format!(
        "INSERT INTO {} ({}, {}) VALUES ({})",
        table,
        columns.join(", "),
        nutrient_columns(),
        placeholders(columns.len() + NUTRIENT_COUNT)
    )
}

fn bind_nutrients<'q>(mut query: SqliteQuery<'q>, nutrients: &NutrientRecord) -> SqliteQuery<'q> {
    for value in nutrients.to_array() {
        query = query.bind(value);
    }
    query
}

/// Repository for database operations
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ===== Catalogue =====

    /// Insert a catalogue food, returns the store-assigned id
    pub async fn insert_catalogue_food(&self, food: &NewCatalogueFood) -> Result<i64> {
        let sql = insert_sql(CATALOGUE_TABLE, &["description"]);
        let query = sqlx::query(&sql).bind(&food.description);

        let id = bind_nutrients(query, &food.nutrients)
            .execute(&self.pool)
            .await?
            .last_insert_rowid();

        tracing::debug!("Inserted catalogue food: {}", id);
        Ok(id)
    }

    /// Overwrite description and every nutrient of an existing food
    pub async fn update_catalogue_food(&self, food: &CatalogueFood) -> Result<()> {
        let sql = format!(
            "UPDATE {} SET description = ?, {} WHERE food_id = ?",
            CATALOGUE_TABLE,
            nutrient_assignments()
        );
        let query = sqlx::query(&sql).bind(&food.description);

        let rows = bind_nutrients(query, &food.nutrients)
            .bind(food.food_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::NotFound(format!("catalogue food {}", food.food_id)));
        }

        tracing::debug!("Updated catalogue food: {}", food.food_id);
        Ok(())
    }

    pub async fn delete_catalogue_food(&self, food_id: i64) -> Result<()> {
        let rows = sqlx::query(&format!("DELETE FROM {} WHERE food_id = ?", CATALOGUE_TABLE))
            .bind(food_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::NotFound(format!("catalogue food {}", food_id)));
        }

        tracing::debug!("Deleted catalogue food: {}", food_id);
        Ok(())
    }

    pub async fn get_catalogue_food(&self, food_id: i64) -> Result<Option<CatalogueFood>> {
        let food = sqlx::query_as::<_, CatalogueFood>(&format!(
            "SELECT * FROM {} WHERE food_id = ?",
            CATALOGUE_TABLE
        ))
        .bind(food_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(food)
    }

    pub async fn list_catalogue_foods(&self, order: CatalogueOrder) -> Result<Vec<CatalogueFood>> {
        let sql = match order {
            CatalogueOrder::Unordered => format!("SELECT * FROM {}", CATALOGUE_TABLE),
            CatalogueOrder::IdDescending => {
                format!("SELECT * FROM {} ORDER BY food_id DESC", CATALOGUE_TABLE)
            }
        };

        let foods = sqlx::query_as::<_, CatalogueFood>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(foods)
    }

    /// Case-sensitive substring match on `description`
    pub async fn search_catalogue_foods(&self, substring: &str) -> Result<Vec<CatalogueFood>> {
        // instr() is case-sensitive where LIKE folds ASCII case
        let foods = sqlx::query_as::<_, CatalogueFood>(&format!(
            "SELECT * FROM {} WHERE instr(description, ?) > 0",
            CATALOGUE_TABLE
        ))
        .bind(substring)
        .fetch_all(&self.pool)
        .await?;

        Ok(foods)
    }

    // ===== Log =====

    pub async fn insert_logged_food(&self, entry: &LogEntryValues) -> Result<i64> {
        let sql = insert_sql(
            LOG_TABLE,
            &["description", "amount_eaten", "date_eaten", "time_eaten", "eaten_ts"],
        );
        let query = sqlx::query(&sql)
            .bind(&entry.description)
            .bind(entry.amount_eaten)
            .bind(&entry.date_eaten)
            .bind(&entry.time_eaten)
            .bind(entry.eaten_ts);

        let id = bind_nutrients(query, &entry.nutrients)
            .execute(&self.pool)
            .await?
            .last_insert_rowid();

        tracing::debug!("Inserted logged food: {} (ts {})", id, entry.eaten_ts);
        Ok(id)
    }

    /// Overwrite every derived column of a log row
    pub async fn update_logged_food(&self, eaten_id: i64, entry: &LogEntryValues) -> Result<()> {
        let sql = format!(
            "UPDATE {} SET description = ?, amount_eaten = ?, date_eaten = ?, time_eaten = ?, \
             eaten_ts = ?, {} WHERE eaten_id = ?",
            LOG_TABLE,
            nutrient_assignments()
        );
        let query = sqlx::query(&sql)
            .bind(&entry.description)
            .bind(entry.amount_eaten)
            .bind(&entry.date_eaten)
            .bind(&entry.time_eaten)
            .bind(entry.eaten_ts);

        let rows = bind_nutrients(query, &entry.nutrients)
            .bind(eaten_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::NotFound(format!("logged food {}", eaten_id)));
        }

        tracing::debug!("Updated logged food: {}", eaten_id);
        Ok(())
    }

    pub async fn delete_logged_food(&self, eaten_id: i64) -> Result<()> {
        let rows = sqlx::query(&format!("DELETE FROM {} WHERE eaten_id = ?", LOG_TABLE))
            .bind(eaten_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::NotFound(format!("logged food {}", eaten_id)));
        }

        tracing::debug!("Deleted logged food: {}", eaten_id);
        Ok(())
    }

    pub async fn get_logged_food(&self, eaten_id: i64) -> Result<Option<LoggedFood>> {
        let entry = sqlx::query_as::<_, LoggedFood>(&format!(
            "SELECT * FROM {} WHERE eaten_id = ?",
            LOG_TABLE
        ))
        .bind(eaten_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entry)
    }

    /// Most recent first; rows logged in the same minute keep insertion order reversed
    pub async fn list_logged_foods(&self) -> Result<Vec<LoggedFood>> {
        let entries = sqlx::query_as::<_, LoggedFood>(&format!(
            "SELECT * FROM {} ORDER BY eaten_ts DESC, eaten_id DESC",
            LOG_TABLE
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    // ===== Recipe lines =====

    pub async fn insert_recipe_line(&self, line: &NewRecipeLine) -> Result<i64> {
        let sql = insert_sql(
            RECIPE_LINES_TABLE,
            &["food_id", "copy_fg", "amount", "description"],
        );
        let query = sqlx::query(&sql)
            .bind(line.food_id)
            .bind(line.copy_fg)
            .bind(line.amount)
            .bind(&line.description);

        let id = bind_nutrients(query, &line.nutrients)
            .execute(&self.pool)
            .await?
            .last_insert_rowid();

        tracing::debug!("Inserted recipe line: {} (food {})", id, line.food_id);
        Ok(id)
    }

    /// Overwrite a recipe line.
    ///
    /// An attached line keeps its `food_id`; only an in-progress line may be
    /// given a new one.
    pub async fn update_recipe_line(&self, line: &RecipeLine) -> Result<()> {
        let sql = format!(
            "UPDATE {} SET food_id = ?, copy_fg = ?, amount = ?, description = ?, {} \
             WHERE recipe_id = ? AND (food_id = ? OR food_id = ?)",
            RECIPE_LINES_TABLE,
            nutrient_assignments()
        );
        let query = sqlx::query(&sql)
            .bind(line.food_id)
            .bind(line.copy_fg)
            .bind(line.amount)
            .bind(&line.description);

        let rows = bind_nutrients(query, &line.nutrients)
            .bind(line.recipe_id)
            .bind(line.food_id)
            .bind(SENTINEL_FOOD_ID)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::NotFound(format!(
                "recipe line {} with food {} or unattached",
                line.recipe_id, line.food_id
            )));
        }

        tracing::debug!("Updated recipe line: {}", line.recipe_id);
        Ok(())
    }

    pub async fn delete_recipe_line(&self, recipe_id: i64) -> Result<()> {
        let rows = sqlx::query(&format!(
            "DELETE FROM {} WHERE recipe_id = ?",
            RECIPE_LINES_TABLE
        ))
        .bind(recipe_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if rows == 0 {
            return Err(AppError::NotFound(format!("recipe line {}", recipe_id)));
        }

        tracing::debug!("Deleted recipe line: {}", recipe_id);
        Ok(())
    }

    pub async fn get_recipe_line(&self, recipe_id: i64) -> Result<Option<RecipeLine>> {
        let line = sqlx::query_as::<_, RecipeLine>(&format!(
            "SELECT * FROM {} WHERE recipe_id = ?",
            RECIPE_LINES_TABLE
        ))
        .bind(recipe_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(line)
    }

    /// Delete every line with this `food_id`, returns the number removed
    pub async fn delete_recipe_lines_for_food(&self, food_id: i64) -> Result<u64> {
        let rows = sqlx::query(&format!(
            "DELETE FROM {} WHERE food_id = ?",
            RECIPE_LINES_TABLE
        ))
        .bind(food_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        tracing::debug!("Deleted {} recipe lines for food: {}", rows, food_id);
        Ok(rows)
    }

    /// Move every line from `from_food_id` to `to_food_id` in one statement
    pub async fn retarget_recipe_lines(&self, from_food_id: i64, to_food_id: i64) -> Result<u64> {
        let rows = sqlx::query(&format!(
            "UPDATE {} SET food_id = ? WHERE food_id = ?",
            RECIPE_LINES_TABLE
        ))
        .bind(to_food_id)
        .bind(from_food_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        tracing::debug!(
            "Retargeted {} recipe lines from food {} to {}",
            rows,
            from_food_id,
            to_food_id
        );
        Ok(rows)
    }

    /// Lines with this `food_id`, newest first
    pub async fn list_recipe_lines_for_food(&self, food_id: i64) -> Result<Vec<RecipeLine>> {
        let lines = sqlx::query_as::<_, RecipeLine>(&format!(
            "SELECT * FROM {} WHERE food_id = ? ORDER BY recipe_id DESC",
            RECIPE_LINES_TABLE
        ))
        .bind(food_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }
}
