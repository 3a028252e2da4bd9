//! Services module
//!
//! The persistence gateway and the recipe workflow built on it.

pub mod gateway;
pub mod recipes;

pub use gateway::Gateway;
pub use recipes::{RecipeService, RecipeTotals};
