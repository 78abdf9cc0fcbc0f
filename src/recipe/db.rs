use anyhow::Result;
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, PgPool, Row};
use uuid::Uuid;

use super::types::{NewIngredient, RecipeRow};

pub struct NewRecipe<'a> {
    pub name: &'a str,
    pub instructions: &'a str,
    pub image_url: Option<&'a str>,
    pub ingredients: &'a [NewIngredient],
    pub tags: &'a [String],
}

/// Recipe, its ingredients (in the given order) and tag links in one transaction.
pub async fn insert_recipe(pool: &PgPool, group_id: Uuid, recipe: &NewRecipe<'_>) -> Result<Uuid> {
    let mut tx = pool.begin().await?;

    let recipe_id: Uuid = sqlx::query(
        r#"
        INSERT INTO meal.recipes (group_id, name, instructions, image_url)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(group_id)
    .bind(recipe.name)
    .bind(recipe.instructions)
    .bind(recipe.image_url)
    .fetch_one(&mut *tx)
    .await?
    .get("id");

    insert_ingredients(&mut tx, recipe_id, recipe.ingredients).await?;
    link_tags(&mut tx, group_id, recipe_id, recipe.tags).await?;

    tx.commit().await?;
    Ok(recipe_id)
}

/// Changes for `recipe edit`; `None` leaves the field (or the ingredient/tag set) as stored.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RecipeChanges {
    pub name: Option<String>,
    pub instructions: Option<String>,
    /// `Some(None)` clears the image.
    pub image_url: Option<Option<String>>,
    pub ingredients: Option<Vec<NewIngredient>>,
    pub tags: Option<Vec<String>>,
}

impl RecipeChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.instructions.is_none()
            && self.image_url.is_none()
            && self.ingredients.is_none()
            && self.tags.is_none()
    }
}

/// Applies `changes` in one transaction. Replaced ingredients are deleted and re-inserted in order,
/// replaced tags are unlinked and re-linked through the per-group upsert. False when the recipe is
/// not in the group.
pub async fn update_recipe(pool: &PgPool, group_id: Uuid, id: Uuid, changes: &RecipeChanges) -> Result<bool> {
    let mut tx = pool.begin().await?;

    let res = sqlx::query(
        r#"
        UPDATE meal.recipes
        SET name = COALESCE($3, name),
            instructions = COALESCE($4, instructions),
            image_url = CASE WHEN $5 THEN $6 ELSE image_url END
        WHERE id = $1 AND group_id = $2
        "#,
    )
    .bind(id)
    .bind(group_id)
    .bind(changes.name.as_deref())
    .bind(changes.instructions.as_deref())
    .bind(changes.image_url.is_some())
    .bind(changes.image_url.as_ref().and_then(|u| u.as_deref()))
    .execute(&mut *tx)
    .await?;
    if res.rows_affected() == 0 {
        return Ok(false);
    }

    if let Some(ingredients) = &changes.ingredients {
        sqlx::query("DELETE FROM meal.ingredients WHERE recipe_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        insert_ingredients(&mut tx, id, ingredients).await?;
    }

    if let Some(tags) = &changes.tags {
        sqlx::query("DELETE FROM meal.recipe_tags WHERE recipe_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        link_tags(&mut tx, group_id, id, tags).await?;
    }

    tx.commit().await?;
    Ok(true)
}

async fn insert_ingredients(conn: &mut PgConnection, recipe_id: Uuid, ingredients: &[NewIngredient]) -> Result<()> {
    for (position, ing) in ingredients.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO meal.ingredients (recipe_id, position, name, quantity, unit)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(recipe_id)
        .bind(position as i32)
        .bind(&ing.name)
        .bind(ing.quantity.as_deref())
        .bind(ing.unit.as_deref())
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

// Tags are unique per (group, name); existing ones are reused.
async fn link_tags(conn: &mut PgConnection, group_id: Uuid, recipe_id: Uuid, tags: &[String]) -> Result<()> {
    for tag in tags {
        let tag_id: Uuid = sqlx::query(
            r#"
            INSERT INTO meal.tags (group_id, name)
            VALUES ($1, $2)
            ON CONFLICT (group_id, name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id
            "#,
        )
        .bind(group_id)
        .bind(tag)
        .fetch_one(&mut *conn)
        .await?
        .get("id");

        sqlx::query("INSERT INTO meal.recipe_tags (recipe_id, tag_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
            .bind(recipe_id)
            .bind(tag_id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

fn recipe_from_row(row: &PgRow) -> RecipeRow {
    RecipeRow {
        id: row.get("id"),
        name: row.get("name"),
        instructions: row.get("instructions"),
        image_url: row.get("image_url"),
        created_at: row.get("created_at"),
    }
}

/// Newest first; `search` is a case-insensitive substring of the name.
pub async fn list_recipes(pool: &PgPool, group_id: Uuid, search: Option<&str>) -> Result<Vec<RecipeRow>> {
    let rows = sqlx::query(
        r#"
        SELECT id, name, instructions, image_url, created_at
        FROM meal.recipes
        WHERE group_id = $1
          AND ($2::text IS NULL OR name ILIKE '%' || $2 || '%')
        ORDER BY created_at DESC
        "#,
    )
    .bind(group_id)
    .bind(search)
    .fetch_all(pool)
    .await?;
    Ok(rows.iter().map(recipe_from_row).collect())
}

pub async fn get_recipe(pool: &PgPool, group_id: Uuid, id: Uuid) -> Result<Option<RecipeRow>> {
    let row = sqlx::query(
        r#"
        SELECT id, name, instructions, image_url, created_at
        FROM meal.recipes
        WHERE id = $1 AND group_id = $2
        "#,
    )
    .bind(id)
    .bind(group_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.as_ref().map(recipe_from_row))
}

pub async fn list_ingredients(pool: &PgPool, recipe_id: Uuid) -> Result<Vec<NewIngredient>> {
    let rows = sqlx::query(
        r#"
        SELECT name, quantity, unit
        FROM meal.ingredients
        WHERE recipe_id = $1
        ORDER BY position, id
        "#,
    )
    .bind(recipe_id)
    .fetch_all(pool)
    .await?;
    Ok(rows
        .into_iter()
        .map(|r| NewIngredient { name: r.get("name"), quantity: r.get("quantity"), unit: r.get("unit") })
        .collect())
}

pub async fn list_tags(pool: &PgPool, recipe_id: Uuid) -> Result<Vec<String>> {
    let rows = sqlx::query(
        r#"
        SELECT t.name
        FROM meal.recipe_tags rt
        JOIN meal.tags t ON t.id = rt.tag_id
        WHERE rt.recipe_id = $1
        ORDER BY t.name
        "#,
    )
    .bind(recipe_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(|r| r.get::<String, _>("name")).collect())
}

/// Ingredients and tag links cascade; schedules pointing at it become empty slots.
pub async fn delete_recipe(pool: &PgPool, group_id: Uuid, id: Uuid) -> Result<bool> {
    let res = sqlx::query("DELETE FROM meal.recipes WHERE id = $1 AND group_id = $2")
        .bind(id)
        .bind(group_id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected() > 0)
}
