use potion::HtmlError;
use serde::Serialize;

use crate::{
    jwt::SessionData,
    pagination::PageContext,
    permissions::ActionType,
    schema::{Recipe, Uuid},
    state::AppState,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedRecipe {
    pub success: bool,
    pub recipe: Recipe,
    pub recipe_id: Uuid,
    pub is_saved: bool,
    pub is_pro: bool,
    pub from_database: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveOutcome {
    pub success: bool,
    pub already_saved: bool,
}

#[derive(Debug, Serialize)]
pub struct RemoveOutcome {
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct SavedRecipes {
    pub success: bool,
    #[serde(flatten)]
    pub page: PageContext<Recipe>,
}

/// Returns the stored recipe for `recipe_name`, generating and storing it on first request.
pub async fn get_or_generate_recipe(
    session: &SessionData,
    recipe_name: &str,
    state: &AppState,
) -> Result<ResolvedRecipe, potion::Error> {
    let recipe_name = recipe_name.trim();
    if recipe_name.is_empty() {
        return Err(HtmlError::InvalidRequest.new("No recipe specified"));
    }

    if let Some(recipe) = state.store.find_recipe(recipe_name).await? {
        let is_saved = state.store.is_saved(recipe.id, &session.user_id).await?;
        log::debug!("Resolved '{recipe_name}' from the store");

        return Ok(ResolvedRecipe {
            success: true,
            recipe_id: recipe.id,
            recipe,
            is_saved,
            is_pro: session.is_pro,
            from_database: true,
        });
    }

    session.authenticate(ActionType::GenerateRecipes)?;

    let mut draft = state.generator.generate_recipe(recipe_name).await?;
    // Stored under the requested name so the next lookup finds it.
    draft.title = recipe_name.to_string();

    let candidate = Recipe::from_draft(draft, &session.user_id);
    let candidate_id = candidate.id;
    let recipe = state.store.create_recipe(candidate).await?;

    let is_saved = match recipe.id == candidate_id {
        true => false,
        false => {
            log::debug!("'{recipe_name}' was stored concurrently, using the stored copy");
            state.store.is_saved(recipe.id, &session.user_id).await?
        }
    };
    log::info!("Generated recipe '{}' ({})", recipe.title, recipe.id);

    Ok(ResolvedRecipe {
        success: true,
        recipe_id: recipe.id,
        recipe,
        is_saved,
        is_pro: session.is_pro,
        from_database: false,
    })
}

pub async fn save_recipe_to_collection(
    session: &SessionData,
    recipe_id: Uuid,
    state: &AppState,
) -> Result<SaveOutcome, potion::Error> {
    session.authenticate(ActionType::ManageOwnCollection)?;

    if state.store.get_recipe(recipe_id).await?.is_none() {
        return Err(HtmlError::InvalidRequest.new("Recipe not found"));
    }

    let added = state
        .store
        .add_to_collection(recipe_id, &session.user_id)
        .await?;

    Ok(SaveOutcome {
        success: true,
        already_saved: !added,
    })
}

/// Removing a recipe that is not in the collection still succeeds.
pub async fn remove_recipe_from_collection(
    session: &SessionData,
    recipe_id: Uuid,
    state: &AppState,
) -> Result<RemoveOutcome, potion::Error> {
    session.authenticate(ActionType::ManageOwnCollection)?;

    let removed = state
        .store
        .remove_from_collection(recipe_id, &session.user_id)
        .await?;
    if !removed {
        log::debug!("Recipe {recipe_id} was not saved by {}", session.user_id);
    }

    Ok(RemoveOutcome { success: true })
}

pub async fn get_saved_recipes(
    session: &SessionData,
    offset: i64,
    state: &AppState,
) -> Result<SavedRecipes, potion::Error> {
    session.authenticate(ActionType::ManageOwnCollection)?;

    let page = state
        .store
        .fetch_saved_recipes(&session.user_id, offset.max(0))
        .await?;

    Ok(SavedRecipes {
        success: true,
        page,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        llm::FakeProvider, memory::MemoryStore, schema::PlanTier, test_support::EmptyCatalog,
    };

    const RAMEN: &str = r#"{
        "title": "Shoyu Ramen",
        "servings": 2,
        "ingredients": [{"item": "noodles", "amount": "200 g"}],
        "instructions": [{"step": 1, "title": "Boil", "instruction": "Boil the noodles"}]
    }"#;

    fn state(provider: FakeProvider) -> AppState {
        AppState::new(
            Arc::new(MemoryStore::new()),
            Arc::new(provider),
            Arc::new(EmptyCatalog),
            "secret",
        )
    }

    #[tokio::test]
    async fn blank_name_is_rejected() {
        let state = state(FakeProvider::new());
        let session = SessionData::new("me", PlanTier::Free);

        let error = get_or_generate_recipe(&session, "   ", &state).await.err().unwrap();
        assert!((400..500).contains(&error.code));
    }

    #[tokio::test]
    async fn generated_recipe_takes_the_requested_name() {
        let state = state(FakeProvider::new().with_response("ramen", RAMEN));
        let session = SessionData::new("me", PlanTier::Pro);

        let resolved = get_or_generate_recipe(&session, " Ramen ", &state).await.ok().unwrap();
        assert_eq!(resolved.recipe.title, "Ramen");
        assert!(!resolved.from_database);
        assert!(resolved.is_pro);

        let again = get_or_generate_recipe(&session, "RAMEN", &state).await.ok().unwrap();
        assert!(again.from_database);
        assert_eq!(again.recipe_id, resolved.recipe_id);
    }

    #[tokio::test]
    async fn generation_failure_stores_nothing() {
        let state = state(FakeProvider::new());
        let session = SessionData::new("me", PlanTier::Free);

        let error = get_or_generate_recipe(&session, "Ramen", &state).await.err().unwrap();
        assert_eq!(error.code, 502);
        assert!(state.store.find_recipe("Ramen").await.ok().flatten().is_none());
    }

    #[tokio::test]
    async fn saving_unknown_recipe_is_invalid() {
        let state = state(FakeProvider::new());
        let session = SessionData::new("me", PlanTier::Free);

        let error = save_recipe_to_collection(&session, Uuid::new_v4(), &state)
            .await
            .err()
            .unwrap();
        assert!((400..500).contains(&error.code));
    }
}
