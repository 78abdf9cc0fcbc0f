use anyhow::Result;
use chrono::NaiveDate;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use uuid::Uuid;

use super::store::ShoppingStore;
use super::types::{IngredientLine, RecipeIngredients, ShoppingItem, ShoppingItemDraft, SourceType, UpcomingMeal};
use crate::schedule::types::MealType;

const ITEM_COLUMNS: &str = "id, group_id, name, is_purchased, source_type, created_at";

pub struct PgShoppingStore {
    pool: PgPool,
}

impl PgShoppingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl ShoppingStore for PgShoppingStore {
    async fn fetch_upcoming_meals(&self, group_id: Uuid, from: NaiveDate) -> Result<Vec<UpcomingMeal>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT s.id AS schedule_id, s.date, s.meal_type,
                   r.id AS recipe_id,
                   i.name AS ingredient_name, i.quantity, i.unit
            FROM meal.schedules s
            LEFT JOIN meal.recipes r ON r.id = s.recipe_id
            LEFT JOIN meal.ingredients i ON i.recipe_id = r.id
            WHERE s.group_id = $1 AND s.date >= $2
            ORDER BY s.date,
                     CASE s.meal_type WHEN 'breakfast' THEN 1 WHEN 'lunch' THEN 2 WHEN 'dinner' THEN 3 ELSE 4 END,
                     s.created_at, s.id, i.position, i.id
            "#,
        )
        .bind(group_id)
        .bind(from)
        .fetch_all(&self.pool)
        .await?;

        let flat = rows.iter().map(meal_row).collect::<Result<Vec<_>, _>>()?;
        Ok(group_meal_rows(flat))
    }

    async fn fetch_shopping_items(&self, group_id: Uuid) -> Result<Vec<ShoppingItem>, sqlx::Error> {
        select_items(&self.pool, group_id, false).await
    }

    async fn delete_auto_items(&self, group_id: Uuid) -> Result<u64, sqlx::Error> {
        let res = sqlx::query("DELETE FROM meal.shopping_items WHERE group_id = $1 AND source_type = 'auto'")
            .bind(group_id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected())
    }

    async fn insert_items(&self, drafts: &[ShoppingItemDraft]) -> Result<Vec<ShoppingItem>, sqlx::Error> {
        if drafts.is_empty() {
            return Ok(Vec::new());
        }
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new("INSERT INTO meal.shopping_items (group_id, name, is_purchased, source_type) ");
        qb.push_values(drafts, |mut b, d| {
            b.push_bind(d.group_id)
                .push_bind(d.name.clone())
                .push_bind(d.is_purchased)
                .push_bind(d.source_type.as_str());
        });
        qb.push(" RETURNING ");
        qb.push(ITEM_COLUMNS);
        let rows = qb.build().fetch_all(&self.pool).await?;
        rows.iter().map(item_from_row).collect()
    }
}

pub struct MealRow {
    pub schedule_id: Uuid,
    pub date: NaiveDate,
    pub meal_type: MealType,
    pub recipe_id: Option<Uuid>,
    pub ingredient: Option<IngredientLine>,
}

fn meal_row(row: &PgRow) -> Result<MealRow, sqlx::Error> {
    let meal_type = row
        .try_get::<String, _>("meal_type")?
        .parse::<MealType>()
        .map_err(|e| sqlx::Error::Decode(e.into()))?;
    let ingredient = row
        .try_get::<Option<String>, _>("ingredient_name")?
        .map(|name| -> Result<IngredientLine, sqlx::Error> {
            Ok(IngredientLine {
                name,
                quantity: row.try_get("quantity")?,
                unit: row.try_get("unit")?,
            })
        })
        .transpose()?;
    Ok(MealRow {
        schedule_id: row.try_get("schedule_id")?,
        date: row.try_get("date")?,
        meal_type,
        recipe_id: row.try_get("recipe_id")?,
        ingredient,
    })
}

/// Collapse the LEFT JOIN rows (one per ingredient) back into one entry per scheduled meal.
/// Rows for the same schedule must be adjacent.
pub fn group_meal_rows(rows: Vec<MealRow>) -> Vec<UpcomingMeal> {
    let mut out: Vec<UpcomingMeal> = Vec::new();
    for row in rows {
        let same_meal = out.last().is_some_and(|m| m.schedule_id == row.schedule_id);
        if !same_meal {
            out.push(UpcomingMeal {
                schedule_id: row.schedule_id,
                date: row.date,
                meal_type: row.meal_type,
                recipe: row.recipe_id.map(|recipe_id| RecipeIngredients { recipe_id, ingredients: Vec::new() }),
            });
        }
        if let (Some(ing), Some(last)) = (row.ingredient, out.last_mut()) {
            if let Some(recipe) = last.recipe.as_mut() {
                recipe.ingredients.push(ing);
            }
        }
    }
    out
}

fn item_from_row(row: &PgRow) -> Result<ShoppingItem, sqlx::Error> {
    let source_type = row
        .try_get::<String, _>("source_type")?
        .parse::<SourceType>()
        .map_err(|e| sqlx::Error::Decode(e.into()))?;
    Ok(ShoppingItem {
        id: row.try_get("id")?,
        group_id: row.try_get("group_id")?,
        name: row.try_get("name")?,
        is_purchased: row.try_get("is_purchased")?,
        source_type,
        created_at: row.try_get("created_at")?,
    })
}

async fn select_items(pool: &PgPool, group_id: Uuid, pending_only: bool) -> Result<Vec<ShoppingItem>, sqlx::Error> {
    let sql = format!(
        "SELECT {ITEM_COLUMNS} FROM meal.shopping_items \
         WHERE group_id = $1 AND (NOT $2 OR is_purchased = FALSE) \
         ORDER BY created_at DESC, id"
    );
    let rows = sqlx::query(&sql).bind(group_id).bind(pending_only).fetch_all(pool).await?;
    rows.iter().map(item_from_row).collect()
}

pub async fn list_items(pool: &PgPool, group_id: Uuid, pending_only: bool) -> Result<Vec<ShoppingItem>> {
    Ok(select_items(pool, group_id, pending_only).await?)
}

pub async fn add_manual_item(pool: &PgPool, group_id: Uuid, name: &str) -> Result<ShoppingItem> {
    let sql = format!(
        "INSERT INTO meal.shopping_items (group_id, name, is_purchased, source_type) \
         VALUES ($1, $2, FALSE, 'manual') RETURNING {ITEM_COLUMNS}"
    );
    let row = sqlx::query(&sql).bind(group_id).bind(name).fetch_one(pool).await?;
    Ok(item_from_row(&row)?)
}

/// Flip `is_purchased`; None when the item does not exist in this group.
pub async fn toggle_item(pool: &PgPool, group_id: Uuid, id: Uuid) -> Result<Option<ShoppingItem>> {
    let sql = format!(
        "UPDATE meal.shopping_items SET is_purchased = NOT is_purchased \
         WHERE id = $1 AND group_id = $2 RETURNING {ITEM_COLUMNS}"
    );
    let row = sqlx::query(&sql).bind(id).bind(group_id).fetch_optional(pool).await?;
    Ok(row.as_ref().map(item_from_row).transpose()?)
}

pub async fn remove_item(pool: &PgPool, group_id: Uuid, id: Uuid) -> Result<bool> {
    let res = sqlx::query("DELETE FROM meal.shopping_items WHERE id = $1 AND group_id = $2")
        .bind(id)
        .bind(group_id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected() > 0)
}
