use chrono::Utc;
use sqlx::{Pool, Postgres, QueryBuilder};

use crate::{
    error::QueryError,
    schema::{NewPantryItem, PantryItem, Uuid},
};

pub async fn list_pantry_items(
    owner_id: &str,
    pool: &Pool<Postgres>,
) -> Result<Vec<PantryItem>, potion::Error> {
    let list: Vec<PantryItem> =
        sqlx::query_as("SELECT * FROM pantry_items WHERE owner_id = $1 ORDER BY created_at DESC")
            .bind(owner_id)
            .fetch_all(pool)
            .await
            .map_err(QueryError::from)?;

    Ok(list)
}

pub async fn add_pantry_items(
    owner_id: &str,
    items: &[NewPantryItem],
    pool: &Pool<Postgres>,
) -> Result<Vec<PantryItem>, potion::Error> {
    if items.is_empty() {
        return Ok(vec![]);
    }
    let now = Utc::now();

    let mut query: QueryBuilder<Postgres> =
        QueryBuilder::new("INSERT INTO pantry_items (id, owner_id, name, quantity, created_at) ");
    query.push_values(items, |mut row, item| {
        row.push_bind(Uuid::new_v4())
            .push_bind(owner_id)
            .push_bind(item.name.trim())
            .push_bind(item.quantity.trim())
            .push_bind(now);
    });
    query.push(" RETURNING *");

    let created: Vec<PantryItem> = query
        .build_query_as()
        .fetch_all(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(created)
}

/// Single statement, so concurrent edits of one item serialize on the row lock.
/// Blank values keep the stored ones.
/// `None` when the item does not exist or belongs to someone else.
pub async fn update_pantry_item(
    id: Uuid,
    owner_id: &str,
    name: &str,
    quantity: &str,
    pool: &Pool<Postgres>,
) -> Result<Option<PantryItem>, potion::Error> {
    let item: Option<PantryItem> = sqlx::query_as(
        "
        UPDATE pantry_items
        SET name = COALESCE(NULLIF(TRIM($1), ''), name),
            quantity = COALESCE(NULLIF(TRIM($2), ''), quantity)
        WHERE id = $3 AND owner_id = $4
        RETURNING *
    ",
    )
    .bind(name)
    .bind(quantity)
    .bind(id)
    .bind(owner_id)
    .fetch_optional(pool)
    .await
    .map_err(QueryError::from)?;

    Ok(item)
}

pub async fn delete_pantry_item(
    id: Uuid,
    owner_id: &str,
    pool: &Pool<Postgres>,
) -> Result<bool, potion::Error> {
    let result = sqlx::query("DELETE FROM pantry_items WHERE id = $1 AND owner_id = $2")
        .bind(id)
        .bind(owner_id)
        .execute(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(result.rows_affected() > 0)
}
