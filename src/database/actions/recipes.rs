use crate::{
    constants::SAVED_RECIPE_COUNT_PER_PAGE,
    error::QueryError,
    pagination::PageContext,
    schema::{Recipe, Uuid},
};

use sqlx::{Pool, Postgres};

#[derive(sqlx::FromRow)]
struct SavedRecipeRow {
    #[sqlx(flatten)]
    recipe: Recipe,
    count: i64,
}

pub async fn find_recipe(
    title: &str,
    pool: &Pool<Postgres>,
) -> Result<Option<Recipe>, potion::Error> {
    let row: Option<Recipe> =
        sqlx::query_as("SELECT * FROM recipes WHERE LOWER(title) = LOWER($1)")
            .bind(title.trim())
            .fetch_optional(pool)
            .await
            .map_err(QueryError::from)?;

    Ok(row)
}

pub async fn get_recipe(id: Uuid, pool: &Pool<Postgres>) -> Result<Option<Recipe>, potion::Error> {
    let row: Option<Recipe> = sqlx::query_as("SELECT * FROM recipes WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(row)
}

/// Persists a generated recipe. When another request already stored a recipe
/// under the same title, that one is returned instead.
pub async fn create_recipe(recipe: Recipe, pool: &Pool<Postgres>) -> Result<Recipe, potion::Error> {
    let inserted: Option<Recipe> = sqlx::query_as(
        "
        INSERT INTO recipes (id, title, description, cuisine, category, servings, prep_time, cook_time,
            image_url, ingredients, instructions, nutrition, tips, substitutions, author_id, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
        ON CONFLICT DO NOTHING RETURNING *
    ",
    )
    .bind(recipe.id)
    .bind(&recipe.title)
    .bind(&recipe.description)
    .bind(&recipe.cuisine)
    .bind(&recipe.category)
    .bind(recipe.servings)
    .bind(recipe.prep_time)
    .bind(recipe.cook_time)
    .bind(&recipe.image_url)
    .bind(&recipe.ingredients)
    .bind(&recipe.instructions)
    .bind(&recipe.nutrition)
    .bind(&recipe.tips)
    .bind(&recipe.substitutions)
    .bind(&recipe.author_id)
    .bind(recipe.created_at)
    .fetch_optional(pool)
    .await
    .map_err(QueryError::from)?;

    match inserted {
        Some(recipe) => Ok(recipe),
        None => find_recipe(&recipe.title, pool).await?.ok_or_else(|| {
            QueryError::new(format!("Recipe '{}' vanished after conflict", recipe.title)).into()
        }),
    }
}

pub async fn is_saved(
    recipe_id: Uuid,
    user_id: &str,
    pool: &Pool<Postgres>,
) -> Result<bool, potion::Error> {
    let result: Option<(Uuid,)> = sqlx::query_as(
        "
        SELECT recipe_id FROM saved_recipes WHERE recipe_id = $1 AND user_id = $2
    ",
    )
    .bind(recipe_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .map_err(QueryError::from)?;

    Ok(result.is_some())
}

pub async fn fetch_saved_recipes(
    user_id: &str,
    offset: i64,
    pool: &Pool<Postgres>,
) -> Result<PageContext<Recipe>, potion::Error> {
    let rows: Vec<SavedRecipeRow> = sqlx::query_as(
        "
        SELECT r.*, COUNT(*) OVER() AS count
        FROM saved_recipes s
        INNER JOIN recipes r ON r.id = s.recipe_id
        WHERE s.user_id = $1
        ORDER BY s.saved_at DESC
        LIMIT $2 OFFSET $3
    ",
    )
    .bind(user_id)
    .bind(SAVED_RECIPE_COUNT_PER_PAGE)
    .bind(offset)
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    let total_count = rows.first().map(|r| r.count).unwrap_or(0);
    let rows = rows.into_iter().map(|r| r.recipe).collect();

    Ok(PageContext::from_rows(
        rows,
        total_count,
        SAVED_RECIPE_COUNT_PER_PAGE,
        offset,
    ))
}

/// Returns `false` when the recipe was already in the collection.
pub async fn add_to_collection(
    recipe_id: Uuid,
    user_id: &str,
    pool: &Pool<Postgres>,
) -> Result<bool, potion::Error> {
    let result = sqlx::query(
        "INSERT INTO saved_recipes (user_id, recipe_id, saved_at) VALUES ($1, $2, NOW())
            ON CONFLICT DO NOTHING",
    )
    .bind(user_id)
    .bind(recipe_id)
    .execute(pool)
    .await
    .map_err(QueryError::from)?;

    Ok(result.rows_affected() > 0)
}

/// Returns `false` when there was nothing to remove.
pub async fn remove_from_collection(
    recipe_id: Uuid,
    user_id: &str,
    pool: &Pool<Postgres>,
) -> Result<bool, potion::Error> {
    let result = sqlx::query("DELETE FROM saved_recipes WHERE user_id = $1 AND recipe_id = $2")
        .bind(user_id)
        .bind(recipe_id)
        .execute(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(result.rows_affected() > 0)
}

// Run with `cargo test -- --ignored` against a Postgres `DATABASE_URL`.
#[cfg(test)]
mod tests {
    use sqlx::PgPool;

    use super::*;
    use crate::schema::RecipeDraft;

    fn recipe(title: &str) -> Recipe {
        let draft: RecipeDraft =
            serde_json::from_value(serde_json::json!({ "title": title })).unwrap();
        Recipe::from_draft(draft, "cook")
    }

    #[sqlx::test]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn conflicting_title_returns_stored_recipe(pool: PgPool) {
        let first = create_recipe(recipe("Carbonara"), &pool).await.ok().unwrap();
        let second = create_recipe(recipe("CARBONARA"), &pool).await.ok().unwrap();

        assert_eq!(second.id, first.id);
        assert_eq!(second.title, "Carbonara");

        let found = find_recipe(" carbonara ", &pool).await.ok().flatten().unwrap();
        assert_eq!(found.id, first.id);
    }

    #[sqlx::test]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn collection_is_scoped_and_idempotent(pool: PgPool) {
        let stored = create_recipe(recipe("Ramen"), &pool).await.ok().unwrap();

        assert!(add_to_collection(stored.id, "cook", &pool).await.is_ok_and(|added| added));
        assert!(add_to_collection(stored.id, "cook", &pool).await.is_ok_and(|added| !added));
        assert!(is_saved(stored.id, "cook", &pool).await.is_ok_and(|saved| saved));
        assert!(is_saved(stored.id, "other", &pool).await.is_ok_and(|saved| !saved));

        let page = fetch_saved_recipes("cook", 0, &pool).await.ok().unwrap();
        assert_eq!(page.total_rows, 1);
        assert_eq!(page.rows[0].id, stored.id);

        assert!(remove_from_collection(stored.id, "cook", &pool)
            .await
            .is_ok_and(|removed| removed));
        assert!(remove_from_collection(stored.id, "cook", &pool)
            .await
            .is_ok_and(|removed| !removed));
    }
}
