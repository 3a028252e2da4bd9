//! Recipe service
//!
//! Builds a recipe out of catalogue foods and turns it into a catalogue
//! food of its own. Lines accumulate under the sentinel food id; finalizing
//! inserts the new food and then retargets the lines to it.

use super::gateway::{settle, Gateway};
use crate::config::AMOUNT_BASE;
use crate::database::{CatalogueFood, NewCatalogueFood, RecipeLine};
use crate::nutrients::NutrientRecord;
use serde::Serialize;

/// Summed amount and nutrients of a set of recipe lines
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipeTotals {
    pub lines: usize,
    pub amount: f64,
    pub nutrients: NutrientRecord,
}

impl RecipeTotals {
    pub fn of(lines: &[RecipeLine]) -> Self {
        Self {
            lines: lines.len(),
            amount: lines.iter().map(|line| line.amount).sum(),
            nutrients: lines.iter().map(|line| &line.nutrients).sum(),
        }
    }
}

/// Service for the recipe workflow
#[derive(Clone)]
pub struct RecipeService {
    gateway: Gateway,
}

impl RecipeService {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub async fn add_ingredient(&self, food: &CatalogueFood, amount: f64) -> bool {
        tracing::debug!("Adding {} of food {} to recipe", amount, food.food_id);
        self.gateway.insert_recipe_line(food, amount).await
    }

    pub async fn in_progress(&self) -> Vec<RecipeLine> {
        self.gateway.list_in_progress_recipe_lines().await
    }

    pub async fn in_progress_totals(&self) -> RecipeTotals {
        RecipeTotals::of(&self.in_progress().await)
    }

    /// Lines of an already finalized recipe
    pub async fn lines_of(&self, food_id: i64) -> Vec<RecipeLine> {
        self.gateway.list_recipe_lines_by_food_id(food_id).await
    }

    /// Turn the recipe under construction into a catalogue food.
    ///
    /// The new food's nutrients are the summed lines normalized to 100 base
    /// units. The insert and the retarget are separate statements: if the
    /// retarget fails the new food stays in the catalogue without lines and
    /// `None` is returned.
    pub async fn finalize(&self, description: &str) -> Option<i64> {
        let totals = self.in_progress_totals().await;
        if totals.lines == 0 {
            tracing::warn!("Finalize requested with no in-progress recipe lines");
            return None;
        }

        let nutrients = settle(
            "normalize recipe",
            totals.nutrients.scale(AMOUNT_BASE / totals.amount),
        )?;

        let food_id = self
            .gateway
            .insert_catalogue_food_returning_id(&NewCatalogueFood {
                description: description.to_string(),
                nutrients,
            })
            .await?;

        if !self.gateway.retarget_in_progress_recipe_lines(food_id).await {
            tracing::error!(
                "Recipe food {} was created but its lines could not be attached",
                food_id
            );
            return None;
        }

        tracing::info!(
            "Finalized recipe '{}' as food {} ({} lines, {} units)",
            description,
            food_id,
            totals.lines,
            totals.amount
        );
        Some(food_id)
    }

    /// Throw away the recipe under construction
    pub async fn cancel(&self) -> bool {
        self.gateway.delete_all_in_progress_recipe_lines().await
    }

    /// Delete a recipe food and the lines attached to it.
    ///
    /// Returns whether the catalogue food was deleted; a food with no lines
    /// is still deleted.
    pub async fn delete_recipe_food(&self, food_id: i64) -> bool {
        let deleted = self.gateway.delete_catalogue_food(food_id).await;
        let lines_removed = self.gateway.delete_recipe_lines_by_food_id(food_id).await;

        tracing::info!(
            "Deleted recipe food {}: food={}, lines={}",
            food_id,
            deleted,
            lines_removed
        );
        deleted
    }
}
