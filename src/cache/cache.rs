use std::future::Future;

use potion::HtmlError;
use redis::{aio::MultiplexedConnection, AsyncCommands, FromRedisValue, ToRedisArgs};
use redis_macros::{FromRedisValue, ToRedisArgs};
use serde::{Deserialize, Serialize};

use crate::error::CacheError;

const CATALOG_CACHE_KEY: &str = "catalog-cache-key";

// Caching - keys

#[derive(Serialize, Clone, Debug)]
pub struct CacheKey<T: ToString + Serialize> {
    _value: T,
    _type: CacheKeyType,
}

impl<T: ToString + Serialize> CacheKey<T> {
    pub fn from(r#type: CacheKeyType, key: T) -> Self {
        Self {
            _value: key,
            _type: r#type,
        }
    }

    pub fn to_string(&self) -> String {
        self.into()
    }
}

impl<T: ToString + Serialize> From<&CacheKey<T>> for String {
    fn from(key: &CacheKey<T>) -> Self {
        let value = key._value.to_string().to_lowercase();
        match &key._type {
            CacheKeyType::RecipeOfTheDay(_) => "recipe-of-the-day".to_string(),
            CacheKeyType::Categories => "catalog-categories".to_string(),
            CacheKeyType::Areas => "catalog-areas".to_string(),
            CacheKeyType::MealsByCategory => format!("catalog-category-{value}"),
            CacheKeyType::MealsByArea => format!("catalog-area-{value}"),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum CacheKeyType {
    /// Bound to the calendar day it carries.
    RecipeOfTheDay(String),
    Categories,
    Areas,
    MealsByCategory,
    MealsByArea,
}

impl CacheKeyType {
    pub fn new<T: ToString + Serialize>(self, key: T) -> CacheKey<T> {
        CacheKey::from(self, key)
    }
}

impl<T: ToString + Serialize> From<CacheKey<T>> for CacheLifetime {
    fn from(key: CacheKey<T>) -> Self {
        match key._type {
            CacheKeyType::RecipeOfTheDay(day) => CacheLifetime::Custom(day),
            _ => CacheLifetime::BindCatalogCache,
        }
    }
}

// Cache - wrappers

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum CacheLifetime {
    Custom(String),
    BindCatalogCache,
}

impl CacheLifetime {
    pub async fn get_cache_bind(
        &self,
        cache: &mut MultiplexedConnection,
    ) -> Result<Option<String>, potion::Error> {
        match self {
            CacheLifetime::BindCatalogCache => {
                get_cache_value::<&str, String>(CATALOG_CACHE_KEY, cache).await
            }
            CacheLifetime::Custom(value) => Ok(Some(value.to_owned())),
        }
    }

    pub async fn validate_cache_bind(
        &self,
        bind: &Option<String>,
        lifetime: Self,
        cache: &mut MultiplexedConnection,
    ) -> Result<bool, potion::Error> {
        match self {
            CacheLifetime::Custom(value) => match lifetime {
                CacheLifetime::Custom(current) => Ok(value == &current),
                _ => {
                    log::error!("Found conflicting bindings");
                    Err(HtmlError::InternalServerError.new("Conflicting cache bindings"))
                }
            },
            CacheLifetime::BindCatalogCache => Ok(bind == &self.get_cache_bind(cache).await?),
        }
    }
}

#[derive(Serialize, serde::Deserialize, FromRedisValue, ToRedisArgs, Clone)]
pub struct RedisValue<T: serde::Serialize + Send + Sync + Clone> {
    pub value: T,
    _lifetime: CacheLifetime,
    _bind: Option<String>,
}

impl<T: serde::Serialize + Send + Sync + Clone + for<'a> Deserialize<'a>> RedisValue<T> {
    async fn new(
        value: T,
        lifetime: CacheLifetime,
        cache: &mut MultiplexedConnection,
    ) -> Result<Self, potion::Error> {
        let bind = lifetime.get_cache_bind(cache).await?;

        Ok(Self {
            value,
            _lifetime: lifetime,
            _bind: bind,
        })
    }

    async fn validate<K: ToString + Serialize>(
        &self,
        key: CacheKey<K>,
        cache: &mut MultiplexedConnection,
    ) -> Result<bool, potion::Error> {
        self._lifetime
            .validate_cache_bind(&self._bind, key.into(), cache)
            .await
    }

    /// Cached value still valid for `key`, if any. Undecodable entries are dropped.
    async fn lookup<K>(
        key: &CacheKey<K>,
        cache: &mut MultiplexedConnection,
    ) -> Result<Option<Self>, potion::Error>
    where
        K: ToString + Serialize + Clone,
    {
        let value = get_cache_value::<String, RedisValue<T>>(key.into(), cache)
            .await
            .unwrap_or_else(|_| {
                let mut c = cache.clone();
                let k = key.to_string();
                tokio::spawn(async move {
                    log::error!("> Failed to deserialize cached value. Deleting {}", &k);
                    if let Err(e) = delete_cache_value(k, &mut c).await {
                        log::error!("> Failed to delete cached value! {:?}", e.info);
                    }
                });
                None
            });

        // * Cannot use .map(|| {...}) due to async closures
        match value {
            Some(value) => {
                log::trace!("> Found {:?}", key.to_string());
                match value.validate(key.to_owned(), cache).await? {
                    true => Ok(Some(value)),
                    false => {
                        log::trace!("> Invalidated {}", key.to_string());
                        Ok(None)
                    }
                }
            }
            None => Ok(None),
        }
    }

    async fn store<K>(
        key: &CacheKey<K>,
        value: T,
        cache: &mut MultiplexedConnection,
    ) -> Result<Self, potion::Error>
    where
        K: ToString + Serialize + Clone,
    {
        let lifetime: CacheLifetime = key.to_owned().into();
        let value = RedisValue::new(value, lifetime, cache).await?;

        set_cache_value::<String, RedisValue<T>>(key.into(), value.clone(), cache).await?;
        Ok(value)
    }

    /// Like [`RedisValue::get_or`], but `None` results are passed through and never cached.
    pub async fn get_or_optional<'a, F, Fut, K>(
        key: CacheKey<K>,
        cache: &mut MultiplexedConnection,
        callback: F,
    ) -> Result<Option<RedisValue<T>>, potion::Error>
    where
        K: ToString + Serialize + Clone + Send + Sync,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Option<T>, potion::Error>> + Send + 'a,
    {
        if let Some(value) = Self::lookup(&key, cache).await? {
            return Ok(Some(value));
        }

        log::trace!("> Fetching {:?}", key.to_string());
        match callback().await? {
            Some(value) => match Self::store(&key, value.clone(), cache).await {
                Ok(value) => Ok(Some(value)),
                Err(e) => {
                    log::error!("{:?}", e.info);
                    Ok(Some(RedisValue {
                        value,
                        _lifetime: key.into(),
                        _bind: None,
                    }))
                }
            },
            None => Ok(None),
        }
    }

    pub async fn get_or<'a, F, Fut, K>(
        key: CacheKey<K>,
        cache: &mut MultiplexedConnection,
        callback: F,
    ) -> Result<RedisValue<T>, potion::Error>
    where
        K: ToString + Serialize + Clone + Send + Sync,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, potion::Error>> + Send + 'a,
    {
        if let Some(value) = Self::lookup(&key, cache).await? {
            return Ok(value);
        }

        log::trace!("> Fetching {:?}", key._value.to_string());
        let value = callback().await?;
        Self::store(&key, value, cache).await
    }
}

/// Moves the catalog bind, invalidating every catalog list cached under the old one.
pub async fn invalidate_catalog_cache(
    cache: &mut MultiplexedConnection,
) -> Result<(), potion::Error> {
    let bind = uuid::Uuid::new_v4().to_string();
    log::info!("Invalidating catalog cache ({bind})");
    set_cache_value(CATALOG_CACHE_KEY, bind, cache).await
}

// Cache - raw handlers

pub async fn set_cache_value<K: ToRedisArgs + Send + Sync, V: ToRedisArgs + Send + Sync>(
    key: K,
    value: V,
    cache: &mut MultiplexedConnection,
) -> Result<(), potion::Error> {
    let _: () = cache.set(key, value).await.map_err(CacheError::from)?;

    Ok(())
}

pub async fn delete_cache_value<K: ToRedisArgs + Send + Sync>(
    key: K,
    cache: &mut MultiplexedConnection,
) -> Result<(), potion::Error> {
    let _: () = cache.del(key).await.map_err(CacheError::from)?;

    Ok(())
}

pub async fn get_cache_value<K: ToRedisArgs + Send + Sync, V: FromRedisValue>(
    key: K,
    cache: &mut MultiplexedConnection,
) -> Result<Option<V>, potion::Error> {
    let value: Option<V> = cache.get(key).await.map_err(CacheError::from)?;

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_names() {
        let key = CacheKeyType::MealsByCategory.new("Seafood");
        assert_eq!(key.to_string(), "catalog-category-seafood");

        let key = CacheKeyType::RecipeOfTheDay("2025-03-01".to_string()).new("");
        assert_eq!(key.to_string(), "recipe-of-the-day");
        assert_eq!(CacheKeyType::Areas.new("").to_string(), "catalog-areas");
    }

    #[test]
    fn recipe_of_the_day_is_bound_to_its_day() {
        let lifetime: CacheLifetime = CacheKeyType::RecipeOfTheDay("2025-03-01".to_string())
            .new("")
            .into();
        assert_eq!(lifetime, CacheLifetime::Custom("2025-03-01".to_string()));

        let lifetime: CacheLifetime = CacheKeyType::MealsByArea.new("Thai").into();
        assert_eq!(lifetime, CacheLifetime::BindCatalogCache);
    }
}
