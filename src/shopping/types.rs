use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::schedule::types::MealType;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Manual,
    Auto,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Manual => "manual",
            SourceType::Auto => "auto",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.pad(self.as_str()) }
}

impl FromStr for SourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" => Ok(SourceType::Manual),
            "auto" => Ok(SourceType::Auto),
            other => Err(format!("unknown source_type: {other}")),
        }
    }
}

/// One line of a recipe's ingredient list, as read for aggregation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct IngredientLine {
    pub name: String,
    pub quantity: Option<String>,
    pub unit: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct RecipeIngredients {
    pub recipe_id: Uuid,
    pub ingredients: Vec<IngredientLine>,
}

/// A scheduled meal inside the generation window; `recipe` is None for an empty slot.
#[derive(Clone, Debug, Serialize)]
pub struct UpcomingMeal {
    pub schedule_id: Uuid,
    pub date: NaiveDate,
    pub meal_type: MealType,
    pub recipe: Option<RecipeIngredients>,
}

/// Merged view of every ingredient sharing one normalized key. Never persisted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct IngredientSummary {
    pub normalized_key: String,
    pub display_name: String,
    pub quantity: String,
    pub unit: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ShoppingItem {
    pub id: Uuid,
    pub group_id: Uuid,
    pub name: String,
    pub is_purchased: bool,
    pub source_type: SourceType,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ShoppingItemDraft {
    pub group_id: Uuid,
    pub name: String,
    pub is_purchased: bool,
    pub source_type: SourceType,
}

/// Deletes then inserts that bring a group's auto items in line with the schedule.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct WriteSet {
    pub to_delete: Vec<Uuid>,
    pub to_insert: Vec<ShoppingItemDraft>,
}

#[derive(Serialize)]
pub struct GeneratePlan {
    pub group_id: Uuid,
    pub from: NaiveDate,
    pub meals: usize,
    pub ingredients: Vec<IngredientSummary>,
    pub write_set: WriteSet,
}

#[derive(Serialize)]
pub struct GenerateResult {
    pub group_id: Uuid,
    pub from: NaiveDate,
    pub deleted: usize,
    pub inserted: Vec<ShoppingItem>,
}

#[derive(Serialize)]
pub struct ShoppingList {
    pub items: Vec<ShoppingItem>,
}

#[derive(Serialize)]
pub struct ItemRemoved {
    pub id: Uuid,
    pub removed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_type_matches_column_values() {
        assert_eq!("auto".parse::<SourceType>(), Ok(SourceType::Auto));
        assert_eq!("manual".parse::<SourceType>(), Ok(SourceType::Manual));
        assert!("Auto".parse::<SourceType>().is_err());
        assert_eq!(format!("{:<6}|", SourceType::Auto), "auto  |");
        assert_eq!(serde_json::to_string(&SourceType::Manual).unwrap(), "\"manual\"");
    }
}
