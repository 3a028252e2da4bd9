//! Nutritrack library
//!
//! Nutrient persistence and proportional scaling for a food catalogue,
//! a consumption log and user-composed recipes.

pub mod app;
pub mod config;
pub mod database;
pub mod error;
pub mod nutrients;
pub mod services;
pub mod timestamp;
