use std::sync::Arc;

use async_trait::async_trait;
use preppr_sdk::{
    catalog::meal::{Area, Category, Meal, MealSummary, RecipeCatalog},
    jwt::SessionData,
    llm::FakeProvider,
    memory::MemoryStore,
    schema::{Limit, NewPantryItem, PlanTier},
    state::AppState,
    workflows::{pantry, recipes},
};

const CARBONARA: &str = r#"{
    "title": "Spaghetti Carbonara",
    "cuisine": "Italian",
    "servings": 2,
    "ingredients": [
        {"item": "spaghetti", "amount": "200 g"},
        {"item": "eggs", "amount": "2"},
        {"item": "pancetta", "amount": "100 g"}
    ],
    "instructions": [{"step": 1, "title": "Cook", "instruction": "Cook and combine"}]
}"#;

const SUGGESTIONS: &str = r#"{"recipes": [
    {"title": "Toast", "ingredients": [{"item": "bread", "amount": "2 slices"}, {"item": "butter", "amount": "1 tbsp"}]},
    {"title": "Egg Fried Rice", "ingredients": [{"item": "rice", "amount": "1 cup"}, {"item": "eggs", "amount": "2"}, {"item": "soy sauce", "amount": "1 tbsp"}]},
    {"title": "Pancakes", "ingredients": [{"item": "flour", "amount": "1 cup"}, {"item": "milk", "amount": "1 cup"}, {"item": "eggs", "amount": "1"}, {"item": "sugar", "amount": "1 tbsp"}]}
]}"#;

struct NoCatalog;

#[async_trait]
impl RecipeCatalog for NoCatalog {
    async fn recipe_of_the_day(&self) -> Result<Option<Meal>, potion::Error> {
        Ok(None)
    }

    async fn categories(&self) -> Result<Vec<Category>, potion::Error> {
        Ok(vec![])
    }

    async fn areas(&self) -> Result<Vec<Area>, potion::Error> {
        Ok(vec![])
    }

    async fn meals_by_category(&self, _category: &str) -> Result<Vec<MealSummary>, potion::Error> {
        Ok(vec![])
    }

    async fn meals_by_area(&self, _area: &str) -> Result<Vec<MealSummary>, potion::Error> {
        Ok(vec![])
    }
}

fn state() -> AppState {
    let provider = FakeProvider::new()
        .with_response("write a complete recipe", CARBONARA)
        .with_response("pantry ingredients", SUGGESTIONS);

    AppState::new(
        Arc::new(MemoryStore::new()),
        Arc::new(provider),
        Arc::new(NoCatalog),
        "integration-secret",
    )
}

fn item(name: &str, quantity: &str) -> NewPantryItem {
    NewPantryItem {
        name: name.to_string(),
        quantity: quantity.to_string(),
    }
}

#[tokio::test]
async fn resolving_twice_reads_from_the_store() {
    let state = state();
    let session = SessionData::new("cook", PlanTier::Free);

    let first = recipes::get_or_generate_recipe(&session, "Carbonara", &state)
        .await
        .ok()
        .unwrap();
    assert!(!first.from_database);
    assert!(!first.is_saved);

    let second = recipes::get_or_generate_recipe(&session, "Carbonara", &state)
        .await
        .ok()
        .unwrap();
    assert!(second.from_database);
    assert_eq!(second.recipe_id, first.recipe_id);
    assert_eq!(second.recipe, first.recipe);

    let other_case = recipes::get_or_generate_recipe(&session, "  carbonara", &state)
        .await
        .ok()
        .unwrap();
    assert_eq!(other_case.recipe_id, first.recipe_id);
}

#[tokio::test]
async fn collection_round_trip() {
    let state = state();
    let session = SessionData::new("cook", PlanTier::Free);
    let recipe_id = recipes::get_or_generate_recipe(&session, "Carbonara", &state)
        .await
        .ok()
        .unwrap()
        .recipe_id;

    let saved = recipes::save_recipe_to_collection(&session, recipe_id, &state)
        .await
        .ok()
        .unwrap();
    assert!(!saved.already_saved);

    let again = recipes::save_recipe_to_collection(&session, recipe_id, &state)
        .await
        .ok()
        .unwrap();
    assert!(again.already_saved);

    let resolved = recipes::get_or_generate_recipe(&session, "Carbonara", &state)
        .await
        .ok()
        .unwrap();
    assert!(resolved.is_saved);

    assert!(recipes::remove_recipe_from_collection(&session, recipe_id, &state)
        .await
        .is_ok_and(|r| r.success));
    // Already removed.
    assert!(recipes::remove_recipe_from_collection(&session, recipe_id, &state)
        .await
        .is_ok_and(|r| r.success));

    let saved = recipes::save_recipe_to_collection(&session, recipe_id, &state)
        .await
        .ok()
        .unwrap();
    assert!(!saved.already_saved);

    let page = recipes::get_saved_recipes(&session, 0, &state)
        .await
        .ok()
        .unwrap()
        .page;
    assert_eq!(page.total_rows, 1);
    assert_eq!(page.rows[0].id, recipe_id);

    let stranger = SessionData::new("stranger", PlanTier::Free);
    let page = recipes::get_saved_recipes(&stranger, 0, &state)
        .await
        .ok()
        .unwrap()
        .page;
    assert_eq!(page.total_rows, 0);
}

#[tokio::test]
async fn pantry_edits_touch_only_their_item() {
    let state = state();
    let session = SessionData::new("cook", PlanTier::Free);

    let added = pantry::add_pantry_items(
        &session,
        vec![item("Eggs", "6"), item("Rice", "1 kg"), item("  ", "1")],
        &state,
    )
    .await
    .ok()
    .unwrap();
    assert_eq!(added.items.len(), 2);

    let eggs = added.items.iter().find(|i| i.name == "Eggs").unwrap().clone();
    let rice = added.items.iter().find(|i| i.name == "Rice").unwrap().clone();

    pantry::update_pantry_item(&session, eggs.id, "Eggs", "12", &state)
        .await
        .ok()
        .unwrap();

    let items = pantry::get_pantry_items(&session, &state).await.ok().unwrap().items;
    let updated = items.iter().find(|i| i.id == eggs.id).unwrap();
    assert_eq!(updated.quantity, "12");
    assert_eq!(items.iter().find(|i| i.id == rice.id), Some(&rice));

    pantry::delete_pantry_item(&session, rice.id, &state)
        .await
        .ok()
        .unwrap();
    let remaining = pantry::get_pantry_items(&session, &state).await.ok().unwrap().items;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, eggs.id);

    assert!(pantry::delete_pantry_item(&session, rice.id, &state)
        .await
        .is_ok_and(|r| r.success));
}

#[tokio::test]
async fn suggestions_are_ranked_by_match() {
    let state = state();
    let session = SessionData::new("cook", PlanTier::Free);
    pantry::add_pantry_items(
        &session,
        vec![item("Eggs", "6"), item("Rice", "1 kg"), item("Bread", "1 loaf")],
        &state,
    )
    .await
    .ok()
    .unwrap();

    let suggestions = pantry::get_recipes_by_pantry_ingredients(&session, &state)
        .await
        .ok()
        .flatten()
        .unwrap();

    assert!(suggestions.success);
    assert_eq!(suggestions.recommendations_limit, Limit::Finite(5));
    assert!(suggestions.ingredients_used.contains("Rice"));

    let percentages: Vec<u8> = suggestions
        .recipes
        .iter()
        .map(|s| s.match_percentage)
        .collect();
    assert!(percentages.iter().all(|p| *p <= 100));
    assert!(percentages.windows(2).all(|w| w[0] >= w[1]));
    assert_eq!(suggestions.recipes[0].recipe.title, "Egg Fried Rice");
}

#[tokio::test]
async fn empty_pantry_spends_no_quota() {
    let state = state();
    let session = SessionData::new("cook", PlanTier::Free);

    let suggestions = pantry::get_recipes_by_pantry_ingredients(&session, &state)
        .await
        .ok()
        .flatten()
        .unwrap();
    assert!(!suggestions.success);
    assert!(suggestions.recipes.is_empty());

    let usage = state.store.get_usage("cook").await.ok().unwrap();
    assert_eq!(usage.recommendations, 0);
}

#[tokio::test]
async fn exhausted_quota_returns_none_until_reset() {
    let state = state();
    let session = SessionData::new("cook", PlanTier::Free);
    pantry::add_pantry_items(&session, vec![item("Eggs", "6")], &state)
        .await
        .ok()
        .unwrap();

    for _ in 0..5 {
        assert!(pantry::get_recipes_by_pantry_ingredients(&session, &state)
            .await
            .is_ok_and(|s| s.is_some()));
    }
    assert!(pantry::get_recipes_by_pantry_ingredients(&session, &state)
        .await
        .is_ok_and(|s| s.is_none()));

    pantry::reset_usage("cook", &state).await.ok().unwrap();
    assert!(pantry::get_recipes_by_pantry_ingredients(&session, &state)
        .await
        .is_ok_and(|s| s.is_some()));
}

#[tokio::test]
async fn pro_plan_is_unlimited() {
    let state = state();
    let session = SessionData::new("chef", PlanTier::Pro);
    pantry::add_pantry_items(&session, vec![item("Eggs", "6")], &state)
        .await
        .ok()
        .unwrap();

    for _ in 0..8 {
        let suggestions = pantry::get_recipes_by_pantry_ingredients(&session, &state)
            .await
            .ok()
            .flatten()
            .unwrap();
        assert_eq!(suggestions.recommendations_limit, Limit::Unlimited);
    }
}
