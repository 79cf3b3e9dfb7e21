use async_trait::async_trait;

use super::{
    pagination::PageContext,
    schema::{Limit, NewPantryItem, PantryItem, Recipe, UsageKind, UsageQuota, Uuid},
};

/// Persistence used by the workflows. Every pantry and collection call is scoped by the owner's id.
#[async_trait]
pub trait PrepprStore: Send + Sync {
    fn backend_tag(&self) -> &'static str;

    /// Case-insensitive, whitespace-trimmed title lookup.
    async fn find_recipe(&self, title: &str) -> Result<Option<Recipe>, potion::Error>;

    async fn get_recipe(&self, id: Uuid) -> Result<Option<Recipe>, potion::Error>;

    /// Stores the recipe unless one with the same title exists, returning whichever is persisted.
    async fn create_recipe(&self, recipe: Recipe) -> Result<Recipe, potion::Error>;

    async fn is_saved(&self, recipe_id: Uuid, user_id: &str) -> Result<bool, potion::Error>;

    /// `true` when the recipe was newly added.
    async fn add_to_collection(&self, recipe_id: Uuid, user_id: &str)
        -> Result<bool, potion::Error>;

    /// `true` when a membership was removed.
    async fn remove_from_collection(
        &self,
        recipe_id: Uuid,
        user_id: &str,
    ) -> Result<bool, potion::Error>;

    async fn fetch_saved_recipes(
        &self,
        user_id: &str,
        offset: i64,
    ) -> Result<PageContext<Recipe>, potion::Error>;

    /// Newest first.
    async fn list_pantry_items(&self, owner_id: &str) -> Result<Vec<PantryItem>, potion::Error>;

    async fn add_pantry_items(
        &self,
        owner_id: &str,
        items: &[NewPantryItem],
    ) -> Result<Vec<PantryItem>, potion::Error>;

    /// Blank `name` or `quantity` keeps the stored value.
    /// `None` when no item with `id` belongs to `owner_id`.
    async fn update_pantry_item(
        &self,
        id: Uuid,
        owner_id: &str,
        name: &str,
        quantity: &str,
    ) -> Result<Option<PantryItem>, potion::Error>;

    async fn delete_pantry_item(&self, id: Uuid, owner_id: &str) -> Result<bool, potion::Error>;

    async fn get_usage(&self, user_id: &str) -> Result<UsageQuota, potion::Error>;

    /// Atomic check-and-increment. `None` when the counter already reached `limit`.
    async fn consume_usage(
        &self,
        user_id: &str,
        kind: UsageKind,
        limit: Limit,
    ) -> Result<Option<UsageQuota>, potion::Error>;

    async fn reset_usage(&self, user_id: &str) -> Result<(), potion::Error>;
}
