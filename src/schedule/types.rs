use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
            MealType::Snack => "snack",
        }
    }

    /// Position within a day; matches the ORDER BY used in the schedule queries.
    pub fn day_order(&self) -> u8 {
        match self {
            MealType::Breakfast => 1,
            MealType::Lunch => 2,
            MealType::Dinner => 3,
            MealType::Snack => 4,
        }
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.pad(self.as_str()) }
}

impl FromStr for MealType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "breakfast" => Ok(MealType::Breakfast),
            "lunch" => Ok(MealType::Lunch),
            "dinner" => Ok(MealType::Dinner),
            "snack" => Ok(MealType::Snack),
            other => Err(format!("unknown meal type: {other}")),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct ScheduleRow {
    pub id: Uuid,
    pub date: NaiveDate,
    pub meal_type: MealType,
    pub recipe_id: Option<Uuid>,
    pub recipe_name: Option<String>,
}

#[derive(Serialize)]
pub struct ScheduleDay {
    pub date: NaiveDate,
    pub meals: Vec<ScheduleRow>,
}

#[derive(Serialize)]
pub struct ScheduleList {
    pub days: Vec<ScheduleDay>,
}

#[derive(Serialize)]
pub struct ScheduleAdded {
    pub id: Uuid,
    pub date: NaiveDate,
    pub meal_type: MealType,
    pub recipe_id: Option<Uuid>,
}

#[derive(Serialize)]
pub struct ScheduleRemoved {
    pub id: Uuid,
    pub removed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meal_type_round_trips_through_text() {
        for m in [MealType::Breakfast, MealType::Lunch, MealType::Dinner, MealType::Snack] {
            assert_eq!(m.as_str().parse::<MealType>(), Ok(m));
        }
        assert!("brunch".parse::<MealType>().is_err());
    }

    #[test]
    fn day_order_is_breakfast_first_snack_last() {
        let mut meals = vec![MealType::Snack, MealType::Dinner, MealType::Breakfast, MealType::Lunch];
        meals.sort_by_key(MealType::day_order);
        assert_eq!(meals, vec![MealType::Breakfast, MealType::Lunch, MealType::Dinner, MealType::Snack]);
    }
}
