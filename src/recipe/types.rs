use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Ingredient as entered on `recipe add`; blank quantity/unit become None.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NewIngredient {
    pub name: String,
    pub quantity: Option<String>,
    pub unit: Option<String>,
}

#[derive(Serialize)]
pub struct RecipeRow {
    pub id: Uuid,
    pub name: String,
    pub instructions: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct RecipeDetail {
    pub recipe: RecipeRow,
    pub ingredients: Vec<NewIngredient>,
    pub tags: Vec<String>,
}

#[derive(Serialize)]
pub struct RecipeAdded {
    pub id: Uuid,
    pub ingredients: usize,
    pub tags: Vec<String>,
}

#[derive(Serialize)]
pub struct RecipeList {
    pub recipes: Vec<RecipeRow>,
}

/// `None` means the ingredient list or tag set was left as stored.
#[derive(Serialize)]
pub struct RecipeUpdated {
    pub id: Uuid,
    pub ingredients: Option<usize>,
    pub tags: Option<Vec<String>>,
}

#[derive(Serialize)]
pub struct RecipeRemoved {
    pub id: Uuid,
    pub removed: bool,
}
