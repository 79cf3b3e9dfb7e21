use std::sync::Arc;

use crate::{
    actions::PgStore,
    catalog::{cached::CachedCatalog, meal::RecipeCatalog, mealdb::MealDbClient},
    config::Config,
    error::GenerationError,
    generation::RecipeGenerator,
    llm::{create_provider, LlmProvider},
    memory::MemoryStore,
    store::PrepprStore,
};

/// Everything a request needs, shared across the server.
pub struct AppState {
    pub store: Arc<dyn PrepprStore>,
    pub generator: RecipeGenerator,
    pub catalog: Arc<dyn RecipeCatalog>,
    pub session_secret: Arc<String>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn PrepprStore>,
        provider: Arc<dyn LlmProvider>,
        catalog: Arc<dyn RecipeCatalog>,
        session_secret: &str,
    ) -> Self {
        Self {
            store,
            generator: RecipeGenerator::new(provider),
            catalog,
            session_secret: Arc::new(session_secret.to_string()),
        }
    }

    pub async fn from_config(config: &Config) -> Result<Arc<Self>, potion::Error> {
        let store: Arc<dyn PrepprStore> = match &config.database_url {
            Some(url) => {
                let store = PgStore::connect(url, config.database_max_connections).await?;
                store.migrate().await?;
                Arc::new(store)
            }
            None => Arc::new(MemoryStore::new()),
        };

        let provider = create_provider(config).map_err(GenerationError::from)?;

        let mealdb: Arc<dyn RecipeCatalog> = Arc::new(MealDbClient::new(&config.mealdb_base_url));
        let catalog: Arc<dyn RecipeCatalog> = match &config.redis_url {
            Some(url) => Arc::new(CachedCatalog::connect(mealdb, url).await?),
            None => mealdb,
        };

        log::info!(
            "Preppr ready ({} store, {} provider)",
            store.backend_tag(),
            provider.provider_name()
        );

        Ok(Arc::new(Self::new(
            store,
            provider,
            catalog,
            &config.session_secret,
        )))
    }
}
