use anyhow::Result;
use chrono::NaiveDate;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::types::{MealType, ScheduleRow};

/// Insert a meal slot. Returns None when `recipe_id` is not a recipe of this group.
pub async fn insert_schedule(
    pool: &PgPool,
    group_id: Uuid,
    date: NaiveDate,
    meal_type: MealType,
    recipe_id: Option<Uuid>,
) -> Result<Option<Uuid>> {
    let row = sqlx::query(
        r#"
        INSERT INTO meal.schedules (group_id, date, meal_type, recipe_id)
        SELECT $1, $2, $3, $4
        WHERE $4::uuid IS NULL
           OR EXISTS (SELECT 1 FROM meal.recipes r WHERE r.id = $4 AND r.group_id = $1)
        RETURNING id
        "#,
    )
    .bind(group_id)
    .bind(date)
    .bind(meal_type.as_str())
    .bind(recipe_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(|r| r.get::<Uuid, _>("id")))
}

pub async fn list_schedules(
    pool: &PgPool,
    group_id: Uuid,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<Vec<ScheduleRow>> {
    let rows = sqlx::query(
        r#"
        SELECT s.id, s.date, s.meal_type, s.recipe_id, r.name AS recipe_name
        FROM meal.schedules s
        LEFT JOIN meal.recipes r ON r.id = s.recipe_id
        WHERE s.group_id = $1
          AND ($2::date IS NULL OR s.date >= $2)
          AND ($3::date IS NULL OR s.date <= $3)
        ORDER BY s.date, s.created_at
        "#,
    )
    .bind(group_id)
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await?;

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let meal_type = row.get::<String, _>("meal_type").parse::<MealType>().map_err(anyhow::Error::msg)?;
        out.push(ScheduleRow {
            id: row.get("id"),
            date: row.get("date"),
            meal_type,
            recipe_id: row.get("recipe_id"),
            recipe_name: row.get("recipe_name"),
        });
    }
    Ok(out)
}

pub async fn delete_schedule(pool: &PgPool, group_id: Uuid, id: Uuid) -> Result<bool> {
    let res = sqlx::query("DELETE FROM meal.schedules WHERE id = $1 AND group_id = $2")
        .bind(id)
        .bind(group_id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected() > 0)
}
