//! Nutrient record and proportional scaling
//!
//! Every entity (catalogue food, logged food, recipe line) embeds the same
//! 23-field `NutrientRecord`. The struct, its column list and its array
//! conversions are generated from one field list so that scaling, binding
//! and row decoding always cover every nutrient in the same order.

use crate::config::ROUNDING_SCALE;
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::iter::Sum;
use std::ops::Add;

pub const NUTRIENT_COUNT: usize = 23;

macro_rules! nutrient_record {
    ($($(#[$meta:meta])* $field:ident),+ $(,)?) => {
        /// Nutrient values for one amount base.
        ///
        /// Catalogue foods hold values per 100 base units; logged foods and
        /// recipe lines hold values for their own amount.
        #[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, FromRow)]
        pub struct NutrientRecord {
            $($(#[$meta])* pub $field: f64,)+
        }

        /// Column names in storage order, one per `NutrientRecord` field
        pub const NUTRIENT_COLUMNS: [&str; NUTRIENT_COUNT] = [$(stringify!($field)),+];

        impl NutrientRecord {
            /// Values in `NUTRIENT_COLUMNS` order
            pub fn to_array(&self) -> [f64; NUTRIENT_COUNT] {
                [$(self.$field),+]
            }

            pub fn from_array(values: [f64; NUTRIENT_COUNT]) -> Self {
                let [$($field),+] = values;
                Self { $($field),+ }
            }
        }
    };
}

nutrient_record! {
    /// kJ
    energy,
    protein,
    fat_total,
    fat_saturated,
    fat_trans,
    fat_polyunsaturated,
    fat_monounsaturated,
    carbohydrate,
    sugars,
    dietary_fibre,
    /// mg
    sodium,
    calcium,
    potassium,
    thiamin_b1,
    riboflavin_b2,
    niacin_b3,
    /// µg
    folate,
    iron,
    magnesium,
    vitamin_c,
    caffeine,
    cholesterol,
    alcohol,
}

impl NutrientRecord {
    /// Apply `f` to every field
    pub fn map<F>(&self, f: F) -> Self
    where
        F: Fn(f64) -> f64,
    {
        Self::from_array(self.to_array().map(f))
    }

    /// Every field multiplied by `ratio` and rounded to two decimals.
    ///
    /// `ratio` must be finite and non-negative; zero yields an all-zero record.
    pub fn scale(&self, ratio: f64) -> Result<Self> {
        if !ratio.is_finite() || ratio < 0.0 {
            return Err(AppError::InvalidArgument(format!(
                "scaling ratio must be finite and non-negative, got {}",
                ratio
            )));
        }

        Ok(self.map(|value| round_scaled(value * ratio)))
    }

    /// Every field rounded to two decimals
    pub fn rounded(&self) -> Self {
        self.map(round_scaled)
    }

    /// (column, value) pairs in storage order
    pub fn columns(&self) -> impl Iterator<Item = (&'static str, f64)> {
        NUTRIENT_COLUMNS.into_iter().zip(self.to_array())
    }
}

impl Add for NutrientRecord {
    type Output = NutrientRecord;

    fn add(self, other: NutrientRecord) -> NutrientRecord {
        let mut values = self.to_array();
        for (value, addend) in values.iter_mut().zip(other.to_array()) {
            *value += addend;
        }
        NutrientRecord::from_array(values)
    }
}

impl Sum for NutrientRecord {
    fn sum<I: Iterator<Item = NutrientRecord>>(iter: I) -> Self {
        iter.fold(NutrientRecord::default(), Add::add)
    }
}

impl<'a> Sum<&'a NutrientRecord> for NutrientRecord {
    fn sum<I: Iterator<Item = &'a NutrientRecord>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

/// Scale `record` by `ratio`; see [`NutrientRecord::scale`]
pub fn scale(record: &NutrientRecord, ratio: f64) -> Result<NutrientRecord> {
    record.scale(ratio)
}

/// Round half-up on the value-times-100 representation
fn round_scaled(value: f64) -> f64 {
    (value * ROUNDING_SCALE).round() / ROUNDING_SCALE
}

#[cfg(test)]
pub(crate) fn sample_record(seed: f64) -> NutrientRecord {
    let mut values = [0.0; NUTRIENT_COUNT];
    for (i, value) in values.iter_mut().enumerate() {
        *value = seed * (i as f64 + 1.0) + (i as f64) * 0.137;
    }
    NutrientRecord::from_array(values)
}
