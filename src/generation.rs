use std::sync::Arc;

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{
    error::GenerationError,
    llm::{ImageInput, LlmError, LlmProvider},
    schema::RecipeDraft,
};

/// An ingredient recognised in a pantry photo. Not stored until the user confirms it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedIngredient {
    pub name: String,
    #[serde(default)]
    pub quantity: String,
    #[serde(default)]
    pub confidence: f64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DraftList {
    Bare(Vec<RecipeDraft>),
    Wrapped { recipes: Vec<RecipeDraft> },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DetectionList {
    Bare(Vec<DetectedIngredient>),
    Wrapped { ingredients: Vec<DetectedIngredient> },
}

const RECIPE_SHAPE: &str = r#"{
  "title": string,
  "description": string,
  "cuisine": string,
  "category": string,
  "servings": number,
  "prepTime": number (minutes),
  "cookTime": number (minutes),
  "ingredients": [{ "item": string, "amount": string, "category": string }],
  "instructions": [{ "step": number, "title": string, "instruction": string, "tip": string }],
  "nutrition": { "calories": string, "protein": string, "carbs": string, "fat": string },
  "tips": [string],
  "substitutions": [{ "original": string, "alternatives": [string] }]
}"#;

pub fn recipe_prompt(recipe_name: &str) -> String {
    format!(
        "You are a professional chef. Write a complete recipe for \"{recipe_name}\".\n\
         Respond with a single JSON object and nothing else, shaped like:\n{RECIPE_SHAPE}"
    )
}

pub fn suggestions_prompt(ingredients: &[String], count: usize) -> String {
    format!(
        "You are a professional chef. Suggest {count} recipes that mostly use these pantry ingredients: {}.\n\
         Common staples like salt, pepper and water may be assumed.\n\
         Respond with a JSON array of {count} objects and nothing else, each shaped like:\n{RECIPE_SHAPE}",
        ingredients.join(", ")
    )
}

pub const SCAN_PROMPT: &str = "Identify the food ingredients visible in this pantry photo. \
Respond with a JSON array and nothing else, each element shaped like \
{ \"name\": string, \"quantity\": string, \"confidence\": number between 0 and 1 }.";

/// Removes a surrounding markdown code fence, if any.
fn strip_code_fence(response: &str) -> &str {
    let trimmed = response.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    let inner = inner.split_once('\n').map(|(_, rest)| rest).unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

pub fn parse_json<T: DeserializeOwned>(response: &str) -> Result<T, LlmError> {
    serde_json::from_str(strip_code_fence(response))
        .map_err(|e| LlmError::ParseError(e.to_string()))
}

/// Turns model output into recipe drafts and pantry detections.
#[derive(Clone)]
pub struct RecipeGenerator {
    provider: Arc<dyn LlmProvider>,
}

impl RecipeGenerator {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }

    pub async fn generate_recipe(&self, recipe_name: &str) -> Result<RecipeDraft, potion::Error> {
        log::debug!(
            "Generating '{recipe_name}' with {}/{}",
            self.provider.provider_name(),
            self.provider.model_name()
        );

        let response = self
            .provider
            .complete(&recipe_prompt(recipe_name))
            .await
            .map_err(GenerationError::from)?;
        let mut draft: RecipeDraft = parse_json(&response).map_err(GenerationError::from)?;

        if draft.title.trim().is_empty() {
            draft.title = recipe_name.trim().to_string();
        }
        if draft.ingredients.is_empty() || draft.instructions.is_empty() {
            return Err(GenerationError::new(format!(
                "Recipe '{recipe_name}' came back without ingredients or instructions"
            ))
            .into());
        }

        Ok(draft)
    }

    pub async fn suggest_recipes(
        &self,
        ingredients: &[String],
        count: usize,
    ) -> Result<Vec<RecipeDraft>, potion::Error> {
        let response = self
            .provider
            .complete(&suggestions_prompt(ingredients, count))
            .await
            .map_err(GenerationError::from)?;

        let drafts = match parse_json(&response).map_err(GenerationError::from)? {
            DraftList::Bare(drafts) | DraftList::Wrapped { recipes: drafts } => drafts,
        };

        Ok(drafts
            .into_iter()
            .filter(|d| !d.title.trim().is_empty())
            .take(count)
            .collect())
    }

    pub async fn detect_ingredients(
        &self,
        image: &ImageInput,
    ) -> Result<Vec<DetectedIngredient>, potion::Error> {
        let response = self
            .provider
            .complete_with_image(SCAN_PROMPT, image)
            .await
            .map_err(GenerationError::from)?;

        let detected = match parse_json(&response).map_err(GenerationError::from)? {
            DetectionList::Bare(items) | DetectionList::Wrapped { ingredients: items } => items,
        };

        Ok(detected
            .into_iter()
            .filter(|i| !i.name.trim().is_empty())
            .map(|mut i| {
                i.name = i.name.trim().to_string();
                i.confidence = i.confidence.clamp(0.0, 1.0);
                i
            })
            .collect())
    }
}
