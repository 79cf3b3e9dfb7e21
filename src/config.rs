use std::{env, fmt::Display, str::FromStr};

use thiserror::Error;

use crate::constants::MEALDB_BASE_URL;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("Invalid {key} value: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    /// `None` keeps everything in process memory.
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    /// `None` disables catalog caching.
    pub redis_url: Option<String>,
    pub session_secret: String,
    pub llm_provider: String,
    pub llm_api_key: Option<String>,
    pub llm_base_url: String,
    pub llm_model: String,
    pub mealdb_base_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = optional(&lookup, "DATABASE_URL");
        if database_url.is_none() {
            log::warn!("DATABASE_URL not set, using the in-memory store");
        }

        let redis_url = optional(&lookup, "REDIS_URL");
        if redis_url.is_none() {
            log::warn!("REDIS_URL not set, catalog responses will not be cached");
        }

        Ok(Self {
            database_url,
            database_max_connections: try_load(&lookup, "DATABASE_MAX_CONNECTIONS", "5")?,
            redis_url,
            session_secret: optional(&lookup, "SESSION_SECRET")
                .ok_or(ConfigError::Missing("SESSION_SECRET"))?,
            llm_provider: try_load(&lookup, "LLM_PROVIDER", "openai")?,
            llm_api_key: optional(&lookup, "LLM_API_KEY"),
            llm_base_url: try_load(&lookup, "LLM_BASE_URL", "https://api.openai.com/v1")?,
            llm_model: try_load(&lookup, "LLM_MODEL", "gpt-4o-mini")?,
            mealdb_base_url: try_load(&lookup, "MEALDB_BASE_URL", MEALDB_BASE_URL)?,
        })
    }
}

fn optional<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn try_load<F, T>(lookup: &F, key: &'static str, default: &str) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    optional(lookup, key)
        .unwrap_or_else(|| {
            log::info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_fill_optional_values() {
        let config = Config::from_lookup(lookup(&[("SESSION_SECRET", "s3cret")])).unwrap();

        assert_eq!(config.session_secret, "s3cret");
        assert!(config.database_url.is_none());
        assert_eq!(config.database_max_connections, 5);
        assert_eq!(config.llm_provider, "openai");
        assert_eq!(config.mealdb_base_url, MEALDB_BASE_URL);
    }

    #[test]
    fn session_secret_is_required() {
        let result = Config::from_lookup(lookup(&[("SESSION_SECRET", "  ")]));
        assert!(matches!(result, Err(ConfigError::Missing("SESSION_SECRET"))));
    }

    #[test]
    fn rejects_unparseable_numbers() {
        let result = Config::from_lookup(lookup(&[
            ("SESSION_SECRET", "s3cret"),
            ("DATABASE_MAX_CONNECTIONS", "many"),
        ]));
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                key: "DATABASE_MAX_CONNECTIONS",
                ..
            })
        ));
    }
}
