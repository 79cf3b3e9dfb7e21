use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use redis::aio::MultiplexedConnection;

use super::meal::{normalize_lookup, Area, Category, Meal, MealSummary, RecipeCatalog};
use crate::{
    cache::cache::{invalidate_catalog_cache, RedisValue},
    error::CacheError,
    CacheKeyType,
};

/// Serves catalog reads through the Redis cache layer.
pub struct CachedCatalog {
    inner: Arc<dyn RecipeCatalog>,
    cache: MultiplexedConnection,
}

impl CachedCatalog {
    pub fn new(inner: Arc<dyn RecipeCatalog>, cache: MultiplexedConnection) -> Self {
        Self { inner, cache }
    }

    pub async fn connect(
        inner: Arc<dyn RecipeCatalog>,
        redis_url: &str,
    ) -> Result<Self, potion::Error> {
        let client = redis::Client::open(redis_url).map_err(CacheError::from)?;
        let mut cache = client
            .get_multiplexed_async_connection()
            .await
            .map_err(CacheError::from)?;

        // Catalog lists cached by an earlier process are not trusted.
        invalidate_catalog_cache(&mut cache).await?;
        log::info!("Connected to catalog cache");
        Ok(Self::new(inner, cache))
    }
}

#[async_trait]
impl RecipeCatalog for CachedCatalog {
    async fn recipe_of_the_day(&self) -> Result<Option<Meal>, potion::Error> {
        let today = Utc::now().date_naive().to_string();
        let key = CacheKeyType::RecipeOfTheDay(today).new("");
        let inner = self.inner.clone();

        let value = RedisValue::get_or_optional(key, &mut self.cache.clone(), move || async move {
            inner.recipe_of_the_day().await
        })
        .await?;

        Ok(value.map(|v| v.value))
    }

    async fn categories(&self) -> Result<Vec<Category>, potion::Error> {
        let inner = self.inner.clone();

        let value = RedisValue::get_or(
            CacheKeyType::Categories.new(""),
            &mut self.cache.clone(),
            move || async move { inner.categories().await },
        )
        .await?;

        Ok(value.value)
    }

    async fn areas(&self) -> Result<Vec<Area>, potion::Error> {
        let inner = self.inner.clone();

        let value = RedisValue::get_or(
            CacheKeyType::Areas.new(""),
            &mut self.cache.clone(),
            move || async move { inner.areas().await },
        )
        .await?;

        Ok(value.value)
    }

    async fn meals_by_category(&self, category: &str) -> Result<Vec<MealSummary>, potion::Error> {
        let category = normalize_lookup(category);
        let key = CacheKeyType::MealsByCategory.new(category.clone());
        let inner = self.inner.clone();

        let value = RedisValue::get_or(key, &mut self.cache.clone(), move || async move {
            inner.meals_by_category(&category).await
        })
        .await?;

        Ok(value.value)
    }

    async fn meals_by_area(&self, area: &str) -> Result<Vec<MealSummary>, potion::Error> {
        let area = normalize_lookup(area);
        let key = CacheKeyType::MealsByArea.new(area.clone());
        let inner = self.inner.clone();

        let value = RedisValue::get_or(key, &mut self.cache.clone(), move || async move {
            inner.meals_by_area(&area).await
        })
        .await?;

        Ok(value.value)
    }
}
