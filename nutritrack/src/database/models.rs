//! Database models
//!
//! Rust structs representing the three stored entity kinds.
//! Each embeds a `NutrientRecord`; relationships are plain integer ids.

use crate::nutrients::NutrientRecord;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A reusable food definition with nutrients per 100 base units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct CatalogueFood {
    pub food_id: i64,
    pub description: String,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub nutrients: NutrientRecord,
}

/// Create catalogue food request
#[derive(Debug, Clone, Deserialize)]
pub struct NewCatalogueFood {
    pub description: String,
    /// Per 100 base units
    pub nutrients: NutrientRecord,
}

/// One consumption event, nutrients scaled to `amount_eaten`.
///
/// `description` is a copy taken at logging time, not a live reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct LoggedFood {
    pub eaten_id: i64,
    pub description: String,
    pub amount_eaten: f64,
    pub date_eaten: String,
    pub time_eaten: String,
    /// Minutes since the reference epoch
    pub eaten_ts: i64,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub nutrients: NutrientRecord,
}

/// A fully derived log row ready to insert or overwrite
#[derive(Debug, Clone)]
pub struct LogEntryValues {
    pub description: String,
    pub amount_eaten: f64,
    pub date_eaten: String,
    pub time_eaten: String,
    pub eaten_ts: i64,
    pub nutrients: NutrientRecord,
}

/// One component of a recipe, nutrients scaled to `amount`.
///
/// `food_id` is `SENTINEL_FOOD_ID` while the recipe is being built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct RecipeLine {
    pub recipe_id: i64,
    pub food_id: i64,
    /// Set on lines created by duplicating another line
    pub copy_fg: bool,
    pub amount: f64,
    pub description: String,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub nutrients: NutrientRecord,
}

/// A recipe line row ready to insert
#[derive(Debug, Clone)]
pub struct NewRecipeLine {
    pub food_id: i64,
    pub copy_fg: bool,
    pub amount: f64,
    pub description: String,
    pub nutrients: NutrientRecord,
}

impl From<&RecipeLine> for NewRecipeLine {
    fn from(line: &RecipeLine) -> Self {
        Self {
            food_id: line.food_id,
            copy_fg: line.copy_fg,
            amount: line.amount,
            description: line.description.clone(),
            nutrients: line.nutrients,
        }
    }
}

/// Ordering for catalogue listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CatalogueOrder {
    /// Whatever order the store returns
    #[default]
    Unordered,
    IdDescending,
}
