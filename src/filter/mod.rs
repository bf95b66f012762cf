//! Query-string filter for kitten listings.

use serde::Deserialize;
use sqlx::{QueryBuilder, Sqlite};

use crate::validation::ValidationErrors;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

impl SortOrder {
    /// Parse an `ordering` value: `created_at` or `-created_at`.
    /// `inserted_time` is accepted as an alias.
    pub fn parse(value: &str) -> Result<Self, ValidationErrors> {
        match value.trim() {
            "created_at" | "inserted_time" => Ok(SortOrder::OldestFirst),
            "-created_at" | "-inserted_time" | "" => Ok(SortOrder::NewestFirst),
            other => Err(ValidationErrors::single(
                "ordering",
                format!("Cannot order by '{}'. Use created_at or -created_at.", other),
            )),
        }
    }

    fn sql(self) -> &'static str {
        match self {
            SortOrder::NewestFirst => " ORDER BY k.created_at DESC, k.id DESC",
            SortOrder::OldestFirst => " ORDER BY k.created_at ASC, k.id ASC",
        }
    }
}

/// Breed and color match case-insensitively and exactly, without trimming;
/// an empty value means no condition. Ages are inclusive bounds in months.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KittenFilter {
    pub breed: Option<String>,
    pub color: Option<String>,
    pub min_age: Option<i64>,
    pub max_age: Option<i64>,
    pub ordering: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_deref().filter(|v| !v.is_empty()).map(str::to_string)
}

impl KittenFilter {
    pub fn sort_order(&self) -> Result<SortOrder, ValidationErrors> {
        match &self.ordering {
            Some(value) => SortOrder::parse(value),
            None => Ok(SortOrder::default()),
        }
    }

    /// Append WHERE and ORDER BY clauses to a query selecting from `kittens k`.
    pub(crate) fn push_sql(&self, query: &mut QueryBuilder<'_, Sqlite>) -> Result<(), ValidationErrors> {
        let order = self.sort_order()?;

        query.push(" WHERE 1 = 1");
        if let Some(breed) = non_empty(&self.breed) {
            query.push(" AND LOWER(k.breed) = LOWER(").push_bind(breed).push(")");
        }
        if let Some(color) = non_empty(&self.color) {
            query.push(" AND LOWER(k.color) = LOWER(").push_bind(color).push(")");
        }
        match (self.min_age, self.max_age) {
            (Some(min), Some(max)) if min == max => {
                query.push(" AND k.age_months = ").push_bind(min);
            }
            (min, max) => {
                if let Some(min) = min {
                    query.push(" AND k.age_months >= ").push_bind(min);
                }
                if let Some(max) = max {
                    query.push(" AND k.age_months <= ").push_bind(max);
                }
            }
        }
        query.push(order.sql());
        Ok(())
    }
}
