//! Persistence gateway
//!
//! The public face of the store. Every operation derives scaled nutrients
//! and timestamps where needed, runs one statement through the repository,
//! and reports a plain success flag, optional id/entity, or list. Failures
//! are logged here and never reach the caller.

use crate::config::{AMOUNT_BASE, SENTINEL_FOOD_ID};
use crate::database::{
    CatalogueFood, CatalogueOrder, LogEntryValues, LoggedFood, NewCatalogueFood, NewRecipeLine,
    RecipeLine, Repository, Store,
};
use crate::error::{AppError, Result};
use crate::timestamp::DisplayFormat;
use chrono::{DateTime, TimeZone};
use std::fmt::Display;

/// Turn a typed result into the gateway's optional contract, logging failures
pub(crate) fn settle<T>(operation: &str, result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err @ (AppError::NotFound(_) | AppError::InvalidArgument(_))) => {
            tracing::warn!("{} rejected ({}): {}", operation, err.kind(), err);
            None
        }
        Err(err) => {
            tracing::error!("{} failed ({}): {}", operation, err.kind(), err);
            None
        }
    }
}

/// Bulk statements that must touch at least one row
fn require_rows(rows: u64, what: impl Display) -> Result<u64> {
    if rows == 0 {
        return Err(AppError::NotFound(what.to_string()));
    }
    Ok(rows)
}

/// `new / old` as a scaling ratio; a zero `old` gives a non-finite ratio
/// that scaling rejects.
fn rescale_ratio(new_amount: f64, old_amount: f64) -> f64 {
    new_amount / old_amount
}

/// Persistence gateway over the Catalogue, Log and RecipeLines tables
#[derive(Clone)]
pub struct Gateway {
    repo: Repository,
    format: DisplayFormat,
}

impl Gateway {
    pub fn new(store: &Store, format: DisplayFormat) -> Self {
        Self {
            repo: Repository::new(store.pool().clone()),
            format,
        }
    }

    // ===== Catalogue =====

    pub async fn insert_catalogue_food(&self, food: &NewCatalogueFood) -> bool {
        self.insert_catalogue_food_returning_id(food).await.is_some()
    }

    pub async fn insert_catalogue_food_returning_id(&self, food: &NewCatalogueFood) -> Option<i64> {
        settle(
            "insert catalogue food",
            self.repo.insert_catalogue_food(food).await,
        )
    }

    /// Overwrite description and all nutrients, keyed by `food_id`
    pub async fn update_catalogue_food(&self, food: &CatalogueFood) -> bool {
        settle(
            "update catalogue food",
            self.repo.update_catalogue_food(food).await,
        )
        .is_some()
    }

    /// Dependent log and recipe rows are left alone; see
    /// [`Gateway::delete_recipe_lines_by_food_id`].
    pub async fn delete_catalogue_food(&self, food_id: i64) -> bool {
        settle(
            "delete catalogue food",
            self.repo.delete_catalogue_food(food_id).await,
        )
        .is_some()
    }

    pub async fn get_catalogue_food_by_id(&self, food_id: i64) -> Option<CatalogueFood> {
        settle(
            "get catalogue food",
            self.repo.get_catalogue_food(food_id).await,
        )
        .flatten()
    }

    pub async fn list_catalogue_foods(&self, order: CatalogueOrder) -> Vec<CatalogueFood> {
        settle(
            "list catalogue foods",
            self.repo.list_catalogue_foods(order).await,
        )
        .unwrap_or_default()
    }

    /// Case-sensitive substring match. An empty substring is passed through
    /// to the store as-is.
    pub async fn search_catalogue_foods(&self, substring: &str) -> Vec<CatalogueFood> {
        settle(
            "search catalogue foods",
            self.repo.search_catalogue_foods(substring).await,
        )
        .unwrap_or_default()
    }

    // ===== Log =====

    /// Log `amount` of a catalogue food eaten at `moment`.
    ///
    /// Amount positivity is not checked: zero logs an all-zero entry, a
    /// negative amount fails in scaling.
    pub async fn log_food<Tz>(
        &self,
        food: &CatalogueFood,
        amount: f64,
        moment: &DateTime<Tz>,
    ) -> bool
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        self.log_food_returning_id(food, amount, moment).await.is_some()
    }

    pub async fn log_food_returning_id<Tz>(
        &self,
        food: &CatalogueFood,
        amount: f64,
        moment: &DateTime<Tz>,
    ) -> Option<i64>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let result = async {
            let nutrients = food.nutrients.scale(amount / AMOUNT_BASE)?;
            let stamp = self.format.stamp(moment);
            let entry = LogEntryValues {
                description: food.description.clone(),
                amount_eaten: amount,
                date_eaten: stamp.date_eaten,
                time_eaten: stamp.time_eaten,
                eaten_ts: stamp.eaten_ts,
                nutrients,
            };
            self.repo.insert_logged_food(&entry).await
        }
        .await;

        settle("log food", result)
    }

    /// Re-derive an entry for a new amount and time.
    ///
    /// Nutrients are rescaled from the entry's current (already scaled)
    /// values by `new_amount / amount_eaten`, so rounding from the original
    /// logging carries into the result.
    pub async fn update_logged_food<Tz>(
        &self,
        entry: &LoggedFood,
        new_amount: f64,
        new_moment: &DateTime<Tz>,
    ) -> bool
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let result = async {
            let ratio = rescale_ratio(new_amount, entry.amount_eaten);
            let nutrients = entry.nutrients.scale(ratio)?;
            let stamp = self.format.stamp(new_moment);
            let values = LogEntryValues {
                description: entry.description.clone(),
                amount_eaten: new_amount,
                date_eaten: stamp.date_eaten,
                time_eaten: stamp.time_eaten,
                eaten_ts: stamp.eaten_ts,
                nutrients,
            };
            self.repo.update_logged_food(entry.eaten_id, &values).await
        }
        .await;

        settle("update logged food", result).is_some()
    }

    pub async fn delete_logged_food(&self, eaten_id: i64) -> bool {
        settle(
            "delete logged food",
            self.repo.delete_logged_food(eaten_id).await,
        )
        .is_some()
    }

    pub async fn get_logged_food_by_id(&self, eaten_id: i64) -> Option<LoggedFood> {
        settle("get logged food", self.repo.get_logged_food(eaten_id).await).flatten()
    }

    /// Most recent first
    pub async fn list_logged_foods(&self) -> Vec<LoggedFood> {
        settle("list logged foods", self.repo.list_logged_foods().await).unwrap_or_default()
    }

    // ===== Recipe lines =====

    /// Add `amount` of a catalogue food to the recipe under construction
    pub async fn insert_recipe_line(&self, food: &CatalogueFood, amount: f64) -> bool {
        self.insert_recipe_line_returning_id(food, amount).await.is_some()
    }

    pub async fn insert_recipe_line_returning_id(
        &self,
        food: &CatalogueFood,
        amount: f64,
    ) -> Option<i64> {
        let result = async {
            let line = NewRecipeLine {
                food_id: SENTINEL_FOOD_ID,
                copy_fg: false,
                amount,
                description: food.description.clone(),
                nutrients: food.nutrients.scale(amount / AMOUNT_BASE)?,
            };
            self.repo.insert_recipe_line(&line).await
        }
        .await;

        settle("insert recipe line", result)
    }

    pub async fn update_recipe_line(&self, line: &RecipeLine) -> bool {
        settle(
            "update recipe line",
            self.repo.update_recipe_line(line).await,
        )
        .is_some()
    }

    /// Change a line's amount, rescaling its current nutrients by
    /// `new_amount / amount`
    pub async fn rescale_recipe_line(&self, line: &RecipeLine, new_amount: f64) -> bool {
        let result = async {
            let nutrients = line.nutrients.scale(rescale_ratio(new_amount, line.amount))?;
            let updated = RecipeLine {
                amount: new_amount,
                nutrients,
                ..line.clone()
            };
            self.repo.update_recipe_line(&updated).await
        }
        .await;

        settle("rescale recipe line", result).is_some()
    }

    /// Insert a copy of `line` flagged as a duplicate
    pub async fn duplicate_recipe_line(&self, line: &RecipeLine) -> bool {
        let copy = NewRecipeLine {
            copy_fg: true,
            ..NewRecipeLine::from(line)
        };

        settle(
            "duplicate recipe line",
            self.repo.insert_recipe_line(&copy).await,
        )
        .is_some()
    }

    pub async fn delete_recipe_line(&self, recipe_id: i64) -> bool {
        settle(
            "delete recipe line",
            self.repo.delete_recipe_line(recipe_id).await,
        )
        .is_some()
    }

    pub async fn get_recipe_line_by_id(&self, recipe_id: i64) -> Option<RecipeLine> {
        settle("get recipe line", self.repo.get_recipe_line(recipe_id).await).flatten()
    }

    /// Discard the recipe under construction; succeeds even when it is empty
    pub async fn delete_all_in_progress_recipe_lines(&self) -> bool {
        settle(
            "delete in-progress recipe lines",
            self.repo.delete_recipe_lines_for_food(SENTINEL_FOOD_ID).await,
        )
        .is_some()
    }

    /// Attach every in-progress line to `new_food_id` in one statement
    pub async fn retarget_in_progress_recipe_lines(&self, new_food_id: i64) -> bool {
        let result = async {
            if new_food_id == SENTINEL_FOOD_ID {
                return Err(AppError::InvalidArgument(
                    "cannot retarget recipe lines to the sentinel food id".into(),
                ));
            }
            let rows = self
                .repo
                .retarget_recipe_lines(SENTINEL_FOOD_ID, new_food_id)
                .await?;
            require_rows(rows, "in-progress recipe lines")
        }
        .await;

        settle("retarget recipe lines", result).is_some()
    }

    /// Remove the lines of a deleted catalogue food
    pub async fn delete_recipe_lines_by_food_id(&self, food_id: i64) -> bool {
        let result = async {
            let rows = self.repo.delete_recipe_lines_for_food(food_id).await?;
            require_rows(rows, format!("recipe lines for food {}", food_id))
        }
        .await;

        settle("delete recipe lines by food", result).is_some()
    }

    /// Lines of the recipe under construction, newest first
    pub async fn list_in_progress_recipe_lines(&self) -> Vec<RecipeLine> {
        self.list_recipe_lines_by_food_id(SENTINEL_FOOD_ID).await
    }

    /// Lines attached to `food_id`, newest first
    pub async fn list_recipe_lines_by_food_id(&self, food_id: i64) -> Vec<RecipeLine> {
        settle(
            "list recipe lines",
            self.repo.list_recipe_lines_for_food(food_id).await,
        )
        .unwrap_or_default()
    }
}
