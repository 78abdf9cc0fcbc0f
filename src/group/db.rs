use anyhow::Result;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::types::{GroupCreated, GroupRow};

/// Create the group and enrol its creator as admin. The invitation code is generated by the database.
pub async fn create_group(pool: &PgPool, name: &str, user_id: Uuid) -> Result<GroupCreated> {
    let mut tx = pool.begin().await?;
    let row = sqlx::query(
        r#"
        INSERT INTO meal.groups (name, created_by)
        VALUES ($1, $2)
        RETURNING id, name, invitation_code
        "#,
    )
    .bind(name)
    .bind(user_id)
    .fetch_one(&mut *tx)
    .await?;
    let created = GroupCreated {
        id: row.get("id"),
        name: row.get("name"),
        invitation_code: row.get("invitation_code"),
    };

    sqlx::query("INSERT INTO meal.group_members (group_id, user_id, role) VALUES ($1, $2, 'admin')")
        .bind(created.id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(created)
}

pub async fn find_by_code(pool: &PgPool, code: &str) -> Result<Option<(Uuid, String)>> {
    let row = sqlx::query("SELECT id, name FROM meal.groups WHERE invitation_code = $1")
        .bind(code)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|r| (r.get("id"), r.get("name"))))
}

pub async fn is_member(pool: &PgPool, group_id: Uuid, user_id: Uuid) -> Result<bool> {
    let found = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM meal.group_members WHERE group_id = $1 AND user_id = $2)",
    )
    .bind(group_id)
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    Ok(found)
}

/// Returns false when the membership already existed.
pub async fn add_member(pool: &PgPool, group_id: Uuid, user_id: Uuid) -> Result<bool> {
    let res = sqlx::query(
        r#"
        INSERT INTO meal.group_members (group_id, user_id, role)
        VALUES ($1, $2, 'member')
        ON CONFLICT (group_id, user_id) DO NOTHING
        "#,
    )
    .bind(group_id)
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(res.rows_affected() > 0)
}

pub async fn list_groups(pool: &PgPool, user_id: Uuid) -> Result<Vec<GroupRow>> {
    let rows = sqlx::query(
        r#"
        SELECT g.id, g.name, g.invitation_code, m.role, m.joined_at
        FROM meal.group_members m
        JOIN meal.groups g ON g.id = m.group_id
        WHERE m.user_id = $1
        ORDER BY m.joined_at
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(rows
        .into_iter()
        .map(|r| GroupRow {
            id: r.get("id"),
            name: r.get("name"),
            role: r.get("role"),
            invitation_code: r.get("invitation_code"),
            joined_at: r.get("joined_at"),
        })
        .collect())
}
