use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use super::{
    pagination::PageContext,
    schema::{
        recipe_key, Limit, NewPantryItem, PantryItem, Recipe, UsageKind, UsageQuota, UserId, Uuid,
    },
    store::PrepprStore,
};
use crate::constants::SAVED_RECIPE_COUNT_PER_PAGE;

#[derive(Default)]
struct MemoryState {
    recipes: HashMap<Uuid, Recipe>,
    titles: HashMap<String, Uuid>,
    saved: HashMap<UserId, Vec<(Uuid, DateTime<Utc>)>>,
    pantry: Vec<PantryItem>,
    usage: HashMap<UserId, UsageQuota>,
}

/// Process-local store. All state sits behind one lock, so every operation is serialized.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PrepprStore for MemoryStore {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }

    async fn find_recipe(&self, title: &str) -> Result<Option<Recipe>, potion::Error> {
        let state = self.state.lock().await;
        Ok(state
            .titles
            .get(&recipe_key(title))
            .and_then(|id| state.recipes.get(id))
            .cloned())
    }

    async fn get_recipe(&self, id: Uuid) -> Result<Option<Recipe>, potion::Error> {
        Ok(self.state.lock().await.recipes.get(&id).cloned())
    }

    async fn create_recipe(&self, recipe: Recipe) -> Result<Recipe, potion::Error> {
        let mut state = self.state.lock().await;
        let key = recipe_key(&recipe.title);

        if let Some(existing) = state.titles.get(&key).and_then(|id| state.recipes.get(id)) {
            return Ok(existing.clone());
        }

        state.titles.insert(key, recipe.id);
        state.recipes.insert(recipe.id, recipe.clone());
        Ok(recipe)
    }

    async fn is_saved(&self, recipe_id: Uuid, user_id: &str) -> Result<bool, potion::Error> {
        let state = self.state.lock().await;
        Ok(state
            .saved
            .get(user_id)
            .is_some_and(|saved| saved.iter().any(|(id, _)| *id == recipe_id)))
    }

    async fn add_to_collection(
        &self,
        recipe_id: Uuid,
        user_id: &str,
    ) -> Result<bool, potion::Error> {
        let mut state = self.state.lock().await;
        let saved = state.saved.entry(user_id.to_string()).or_default();

        if saved.iter().any(|(id, _)| *id == recipe_id) {
            return Ok(false);
        }
        saved.push((recipe_id, Utc::now()));
        Ok(true)
    }

    async fn remove_from_collection(
        &self,
        recipe_id: Uuid,
        user_id: &str,
    ) -> Result<bool, potion::Error> {
        let mut state = self.state.lock().await;
        let Some(saved) = state.saved.get_mut(user_id) else {
            return Ok(false);
        };

        let before = saved.len();
        saved.retain(|(id, _)| *id != recipe_id);
        Ok(saved.len() < before)
    }

    async fn fetch_saved_recipes(
        &self,
        user_id: &str,
        offset: i64,
    ) -> Result<PageContext<Recipe>, potion::Error> {
        let state = self.state.lock().await;
        let Some(saved) = state.saved.get(user_id) else {
            return Ok(PageContext::no_rows());
        };

        // Insertion order is save order; newest first.
        let recipes: Vec<Recipe> = saved
            .iter()
            .rev()
            .filter_map(|(id, _)| state.recipes.get(id).cloned())
            .collect();
        let total = recipes.len() as i64;

        let rows = recipes
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(SAVED_RECIPE_COUNT_PER_PAGE as usize)
            .collect();

        Ok(PageContext::from_rows(
            rows,
            total,
            SAVED_RECIPE_COUNT_PER_PAGE,
            offset,
        ))
    }

    async fn list_pantry_items(&self, owner_id: &str) -> Result<Vec<PantryItem>, potion::Error> {
        let state = self.state.lock().await;
        let mut items: Vec<PantryItem> = state
            .pantry
            .iter()
            .filter(|item| item.owner_id == owner_id)
            .cloned()
            .collect();

        // Stable sort keeps insertion order reversed for equal timestamps.
        items.reverse();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items)
    }

    async fn add_pantry_items(
        &self,
        owner_id: &str,
        items: &[NewPantryItem],
    ) -> Result<Vec<PantryItem>, potion::Error> {
        let mut state = self.state.lock().await;
        let now = Utc::now();

        let created: Vec<PantryItem> = items
            .iter()
            .map(|item| PantryItem {
                id: Uuid::new_v4(),
                owner_id: owner_id.to_string(),
                name: item.name.trim().to_string(),
                quantity: item.quantity.trim().to_string(),
                created_at: now,
            })
            .collect();

        state.pantry.extend(created.iter().cloned());
        Ok(created)
    }

    async fn update_pantry_item(
        &self,
        id: Uuid,
        owner_id: &str,
        name: &str,
        quantity: &str,
    ) -> Result<Option<PantryItem>, potion::Error> {
        let mut state = self.state.lock().await;

        Ok(state
            .pantry
            .iter_mut()
            .find(|item| item.id == id && item.owner_id == owner_id)
            .map(|item| {
                if !name.trim().is_empty() {
                    item.name = name.trim().to_string();
                }
                if !quantity.trim().is_empty() {
                    item.quantity = quantity.trim().to_string();
                }
                item.clone()
            }))
    }

    async fn delete_pantry_item(&self, id: Uuid, owner_id: &str) -> Result<bool, potion::Error> {
        let mut state = self.state.lock().await;
        let before = state.pantry.len();
        state
            .pantry
            .retain(|item| !(item.id == id && item.owner_id == owner_id));
        Ok(state.pantry.len() < before)
    }

    async fn get_usage(&self, user_id: &str) -> Result<UsageQuota, potion::Error> {
        let state = self.state.lock().await;
        Ok(state
            .usage
            .get(user_id)
            .cloned()
            .unwrap_or_else(|| UsageQuota::new(user_id)))
    }

    async fn consume_usage(
        &self,
        user_id: &str,
        kind: UsageKind,
        limit: Limit,
    ) -> Result<Option<UsageQuota>, potion::Error> {
        let mut state = self.state.lock().await;
        let quota = state
            .usage
            .entry(user_id.to_string())
            .or_insert_with(|| UsageQuota::new(user_id));

        if !limit.allows(quota.used(kind)) {
            return Ok(None);
        }
        match kind {
            UsageKind::PantryScan => quota.pantry_scans += 1,
            UsageKind::Recommendation => quota.recommendations += 1,
        }
        Ok(Some(quota.clone()))
    }

    async fn reset_usage(&self, user_id: &str) -> Result<(), potion::Error> {
        let mut state = self.state.lock().await;
        if let Some(quota) = state.usage.get_mut(user_id) {
            quota.pantry_scans = 0;
            quota.recommendations = 0;
            quota.period_start = Utc::now();
        }
        Ok(())
    }
}
