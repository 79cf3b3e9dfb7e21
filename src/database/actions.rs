mod pantry;
mod recipes;
mod usage;

pub use pantry::*;
pub use recipes::*;
pub use usage::*;

use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, Pool, Postgres};

use super::{
    error::QueryError,
    pagination::PageContext,
    schema::{Limit, NewPantryItem, PantryItem, Recipe, UsageKind, UsageQuota, Uuid},
    store::PrepprStore,
};

/// Postgres backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: Pool<Postgres>,
}

impl PgStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, potion::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(QueryError::from)?;

        log::info!("Connected to database ({max_connections} connections)");
        Ok(Self::new(pool))
    }

    pub async fn migrate(&self) -> Result<(), potion::Error> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| QueryError::from(sqlx::Error::from(e)))?;

        Ok(())
    }
}

#[async_trait]
impl PrepprStore for PgStore {
    fn backend_tag(&self) -> &'static str {
        "postgres"
    }

    async fn find_recipe(&self, title: &str) -> Result<Option<Recipe>, potion::Error> {
        find_recipe(title, &self.pool).await
    }

    async fn get_recipe(&self, id: Uuid) -> Result<Option<Recipe>, potion::Error> {
        get_recipe(id, &self.pool).await
    }

    async fn create_recipe(&self, recipe: Recipe) -> Result<Recipe, potion::Error> {
        create_recipe(recipe, &self.pool).await
    }

    async fn is_saved(&self, recipe_id: Uuid, user_id: &str) -> Result<bool, potion::Error> {
        is_saved(recipe_id, user_id, &self.pool).await
    }

    async fn add_to_collection(
        &self,
        recipe_id: Uuid,
        user_id: &str,
    ) -> Result<bool, potion::Error> {
        add_to_collection(recipe_id, user_id, &self.pool).await
    }

    async fn remove_from_collection(
        &self,
        recipe_id: Uuid,
        user_id: &str,
    ) -> Result<bool, potion::Error> {
        remove_from_collection(recipe_id, user_id, &self.pool).await
    }

    async fn fetch_saved_recipes(
        &self,
        user_id: &str,
        offset: i64,
    ) -> Result<PageContext<Recipe>, potion::Error> {
        fetch_saved_recipes(user_id, offset, &self.pool).await
    }

    async fn list_pantry_items(&self, owner_id: &str) -> Result<Vec<PantryItem>, potion::Error> {
        list_pantry_items(owner_id, &self.pool).await
    }

    async fn add_pantry_items(
        &self,
        owner_id: &str,
        items: &[NewPantryItem],
    ) -> Result<Vec<PantryItem>, potion::Error> {
        add_pantry_items(owner_id, items, &self.pool).await
    }

    async fn update_pantry_item(
        &self,
        id: Uuid,
        owner_id: &str,
        name: &str,
        quantity: &str,
    ) -> Result<Option<PantryItem>, potion::Error> {
        update_pantry_item(id, owner_id, name, quantity, &self.pool).await
    }

    async fn delete_pantry_item(&self, id: Uuid, owner_id: &str) -> Result<bool, potion::Error> {
        delete_pantry_item(id, owner_id, &self.pool).await
    }

    async fn get_usage(&self, user_id: &str) -> Result<UsageQuota, potion::Error> {
        get_usage(user_id, &self.pool).await
    }

    async fn consume_usage(
        &self,
        user_id: &str,
        kind: UsageKind,
        limit: Limit,
    ) -> Result<Option<UsageQuota>, potion::Error> {
        consume_usage(user_id, kind, limit, &self.pool).await
    }

    async fn reset_usage(&self, user_id: &str) -> Result<(), potion::Error> {
        reset_usage(user_id, &self.pool).await
    }
}
