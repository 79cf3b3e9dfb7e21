use sqlx::{Pool, Postgres};

use crate::{
    error::QueryError,
    schema::{Limit, UsageKind, UsageQuota},
};

fn usage_column(kind: UsageKind) -> &'static str {
    match kind {
        UsageKind::PantryScan => "pantry_scans",
        UsageKind::Recommendation => "recommendations",
    }
}

pub async fn get_usage(user_id: &str, pool: &Pool<Postgres>) -> Result<UsageQuota, potion::Error> {
    let row: Option<UsageQuota> = sqlx::query_as("SELECT * FROM usage_quotas WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(row.unwrap_or_else(|| UsageQuota::new(user_id)))
}

/// Increments the counter only while it is below `limit`. `None` means the limit is reached.
pub async fn consume_usage(
    user_id: &str,
    kind: UsageKind,
    limit: Limit,
    pool: &Pool<Postgres>,
) -> Result<Option<UsageQuota>, potion::Error> {
    sqlx::query(
        "INSERT INTO usage_quotas (user_id, period_start, pantry_scans, recommendations)
            VALUES ($1, NOW(), 0, 0) ON CONFLICT DO NOTHING",
    )
    .bind(user_id)
    .execute(pool)
    .await
    .map_err(QueryError::from)?;

    let limit = match limit {
        Limit::Finite(n) => Some(i32::try_from(n).unwrap_or(i32::MAX)),
        Limit::Unlimited => None,
    };
    let column = usage_column(kind);

    let row: Option<UsageQuota> = sqlx::query_as(&format!(
        "UPDATE usage_quotas SET {column} = {column} + 1
            WHERE user_id = $1 AND ($2::INT IS NULL OR {column} < $2)
            RETURNING *"
    ))
    .bind(user_id)
    .bind(limit)
    .fetch_optional(pool)
    .await
    .map_err(QueryError::from)?;

    Ok(row)
}

pub async fn reset_usage(user_id: &str, pool: &Pool<Postgres>) -> Result<(), potion::Error> {
    sqlx::query(
        "UPDATE usage_quotas SET pantry_scans = 0, recommendations = 0, period_start = NOW()
            WHERE user_id = $1",
    )
    .bind(user_id)
    .execute(pool)
    .await
    .map_err(QueryError::from)?;

    Ok(())
}
