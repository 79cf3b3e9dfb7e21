use base64::{engine::general_purpose::STANDARD, Engine};
use potion::HtmlError;
use serde::Serialize;

use crate::{
    constants::SUGGESTION_COUNT,
    generation::DetectedIngredient,
    jwt::SessionData,
    llm::ImageInput,
    matching::{rank_suggestions, Suggestion},
    permissions::ActionType,
    schema::{Limit, NewPantryItem, PantryItem, UsageKind, Uuid},
    state::AppState,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PantryItems {
    pub success: bool,
    pub items: Vec<PantryItem>,
    pub scans_limit: Limit,
    pub scans_used: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PantrySuggestions {
    pub success: bool,
    pub recipes: Vec<Suggestion>,
    pub ingredients_used: String,
    pub recommendations_limit: Limit,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PantryScan {
    pub success: bool,
    pub ingredients: Vec<DetectedIngredient>,
    pub scans_limit: Limit,
}

#[derive(Debug, Serialize)]
pub struct AddedItems {
    pub success: bool,
    pub items: Vec<PantryItem>,
}

#[derive(Debug, Serialize)]
pub struct PantryOutcome {
    pub success: bool,
}

pub async fn get_pantry_items(
    session: &SessionData,
    state: &AppState,
) -> Result<PantryItems, potion::Error> {
    session.authenticate(ActionType::ManageOwnPantry)?;

    let items = state.store.list_pantry_items(&session.user_id).await?;
    let usage = state.store.get_usage(&session.user_id).await?;

    Ok(PantryItems {
        success: true,
        items,
        scans_limit: session.plan.limit(UsageKind::PantryScan),
        scans_used: usage.used(UsageKind::PantryScan),
    })
}

/// Items with a blank name are skipped.
pub async fn add_pantry_items(
    session: &SessionData,
    items: Vec<NewPantryItem>,
    state: &AppState,
) -> Result<AddedItems, potion::Error> {
    session.authenticate(ActionType::ManageOwnPantry)?;

    let items: Vec<NewPantryItem> = items
        .into_iter()
        .filter(|item| !item.name.trim().is_empty())
        .collect();
    if items.is_empty() {
        return Err(HtmlError::InvalidRequest.new("No ingredients provided"));
    }

    let items = state
        .store
        .add_pantry_items(&session.user_id, &items)
        .await?;
    log::debug!("Added {} pantry items for {}", items.len(), session.user_id);

    Ok(AddedItems {
        success: true,
        items,
    })
}

/// Blank `name` or `quantity` keeps the current value.
pub async fn update_pantry_item(
    session: &SessionData,
    item_id: Uuid,
    name: &str,
    quantity: &str,
    state: &AppState,
) -> Result<PantryOutcome, potion::Error> {
    session.authenticate(ActionType::ManageOwnPantry)?;

    match state
        .store
        .update_pantry_item(item_id, &session.user_id, name, quantity)
        .await?
    {
        Some(_) => Ok(PantryOutcome { success: true }),
        None => Err(HtmlError::InvalidRequest.new("Pantry item not found")),
    }
}

/// Deleting an item that is already gone still succeeds.
pub async fn delete_pantry_item(
    session: &SessionData,
    item_id: Uuid,
    state: &AppState,
) -> Result<PantryOutcome, potion::Error> {
    session.authenticate(ActionType::ManageOwnPantry)?;

    state
        .store
        .delete_pantry_item(item_id, &session.user_id)
        .await?;

    Ok(PantryOutcome { success: true })
}

/// `None` when the user has no recommendations left this cycle.
///
/// An empty pantry answers with `success: false` before any quota is spent. Otherwise the
/// attempt is charged before generation, so a failed generation still counts.
pub async fn get_recipes_by_pantry_ingredients(
    session: &SessionData,
    state: &AppState,
) -> Result<Option<PantrySuggestions>, potion::Error> {
    session.authenticate(ActionType::GenerateRecipes)?;

    let limit = session.plan.limit(UsageKind::Recommendation);
    let items = state.store.list_pantry_items(&session.user_id).await?;

    if items.is_empty() {
        return Ok(Some(PantrySuggestions {
            success: false,
            recipes: vec![],
            ingredients_used: String::new(),
            recommendations_limit: limit,
        }));
    }

    let Some(usage) = state
        .store
        .consume_usage(&session.user_id, UsageKind::Recommendation, limit)
        .await?
    else {
        log::debug!("{} is out of recommendations ({limit})", session.user_id);
        return Ok(None);
    };
    log::trace!(
        "{} used {} recommendations of {limit}",
        session.user_id,
        usage.recommendations
    );

    let names: Vec<String> = items.into_iter().map(|item| item.name).collect();
    let drafts = state
        .generator
        .suggest_recipes(&names, SUGGESTION_COUNT)
        .await?;

    Ok(Some(PantrySuggestions {
        success: true,
        recipes: rank_suggestions(drafts, &names),
        ingredients_used: names.join(", "),
        recommendations_limit: limit,
    }))
}

/// `None` when the user has no scans left this cycle. Detected items are not stored.
pub async fn scan_pantry_image(
    session: &SessionData,
    image: &str,
    mime_type: &str,
    state: &AppState,
) -> Result<Option<PantryScan>, potion::Error> {
    session.authenticate(ActionType::ScanPantry)?;

    let image = decode_image(image, mime_type)?;
    let limit = session.plan.limit(UsageKind::PantryScan);

    if state
        .store
        .consume_usage(&session.user_id, UsageKind::PantryScan, limit)
        .await?
        .is_none()
    {
        log::debug!("{} is out of pantry scans ({limit})", session.user_id);
        return Ok(None);
    }

    let ingredients = state.generator.detect_ingredients(&image).await?;

    Ok(Some(PantryScan {
        success: true,
        ingredients,
        scans_limit: limit,
    }))
}

/// Starts a new billing cycle for `user_id`.
pub async fn reset_usage(user_id: &str, state: &AppState) -> Result<(), potion::Error> {
    state.store.reset_usage(user_id).await?;
    log::info!("Reset usage for {user_id}");
    Ok(())
}

/// Accepts raw base64 or a `data:<mime>;base64,` URL.
fn decode_image(image: &str, mime_type: &str) -> Result<ImageInput, potion::Error> {
    let (mime_type, data) = match image.trim().strip_prefix("data:") {
        Some(rest) => match rest.split_once(";base64,") {
            Some((mime, data)) => (mime.to_string(), data.to_string()),
            None => return Err(HtmlError::InvalidRequest.new("Invalid image data")),
        },
        None => (mime_type.trim().to_string(), image.trim().to_string()),
    };

    if !mime_type.starts_with("image/") {
        return Err(HtmlError::InvalidRequest.new("Unsupported image type"));
    }
    if data.is_empty() || STANDARD.decode(&data).is_err() {
        return Err(HtmlError::InvalidRequest.new("Invalid image data"));
    }

    Ok(ImageInput { data, mime_type })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        llm::FakeProvider, memory::MemoryStore, schema::PlanTier, test_support::EmptyCatalog,
    };

    fn state(provider: FakeProvider) -> AppState {
        AppState::new(
            Arc::new(MemoryStore::new()),
            Arc::new(provider),
            Arc::new(EmptyCatalog),
            "secret",
        )
    }

    fn item(name: &str, quantity: &str) -> NewPantryItem {
        NewPantryItem {
            name: name.to_string(),
            quantity: quantity.to_string(),
        }
    }

    #[test]
    fn decodes_data_urls_and_raw_base64() {
        let image = decode_image("data:image/jpeg;base64,aGVsbG8=", "").ok().unwrap();
        assert_eq!(image.mime_type, "image/jpeg");
        assert_eq!(image.data, "aGVsbG8=");

        assert!(decode_image("aGVsbG8=", "image/png").is_ok());
        assert!(decode_image("aGVsbG8=", "text/plain").is_err());
        assert!(decode_image("not base64!", "image/png").is_err());
    }

    #[tokio::test]
    async fn blank_update_keeps_previous_values() {
        let state = state(FakeProvider::new());
        let session = SessionData::new("me", PlanTier::Free);
        let added = add_pantry_items(&session, vec![item("Rice", "1 kg")], &state)
            .await
            .ok()
            .unwrap();

        update_pantry_item(&session, added.items[0].id, "Brown rice", " ", &state)
            .await
            .ok()
            .unwrap();

        let items = get_pantry_items(&session, &state).await.ok().unwrap().items;
        assert_eq!(items[0].name, "Brown rice");
        assert_eq!(items[0].quantity, "1 kg");
        assert_eq!(items[0].created_at, added.items[0].created_at);
    }

    #[tokio::test]
    async fn foreign_items_cannot_be_updated() {
        let state = state(FakeProvider::new());
        let owner = SessionData::new("owner", PlanTier::Free);
        let other = SessionData::new("other", PlanTier::Free);
        let added = add_pantry_items(&owner, vec![item("Rice", "1 kg")], &state)
            .await
            .ok()
            .unwrap();

        let error = update_pantry_item(&other, added.items[0].id, "Mine", "2", &state)
            .await
            .err()
            .unwrap();
        assert!((400..500).contains(&error.code));
    }

    #[tokio::test]
    async fn blank_items_are_rejected() {
        let state = state(FakeProvider::new());
        let session = SessionData::new("me", PlanTier::Free);

        assert!(add_pantry_items(&session, vec![item(" ", "1")], &state)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn scan_is_charged_and_returns_detections() {
        let provider = FakeProvider::new().with_response(
            "pantry photo",
            r#"[{"name": "Eggs", "quantity": "6", "confidence": 0.9}]"#,
        );
        let state = state(provider);
        let session = SessionData::new("me", PlanTier::Free);

        let scan = scan_pantry_image(&session, "aGVsbG8=", "image/png", &state)
            .await
            .ok()
            .flatten()
            .unwrap();
        assert_eq!(scan.ingredients[0].name, "Eggs");

        let items = get_pantry_items(&session, &state).await.ok().unwrap();
        assert!(items.items.is_empty());
        assert_eq!(items.scans_used, 1);
    }
}
