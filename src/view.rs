use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::{
    catalog::meal::MealSummary, constants::RECIPE_LINK_BASE, matching::Suggestion, schema::Recipe,
};

const LINK_ORIGIN: &str = "http://preppr.local";

/// Every shape a recipe reaches the front-end in.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum RecipeSource {
    Catalog(MealSummary),
    Generated(Suggestion),
    Saved(Recipe),
}

/// Canonical card view-model for any [`RecipeSource`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeCard {
    pub source: &'static str,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub cuisine: Option<String>,
    pub prep_time: Option<i32>,
    pub cook_time: Option<i32>,
    pub total_time: Option<i32>,
    pub servings: Option<i32>,
    pub match_percentage: Option<u8>,
    pub missing_ingredients: Vec<String>,
    pub image: Option<String>,
    pub href: String,
    pub show_image: bool,
}

/// Link to the recipe page, which resolves the recipe by name.
pub fn recipe_href(title: &str) -> String {
    Url::parse_with_params(&format!("{LINK_ORIGIN}{RECIPE_LINK_BASE}"), &[("cook", title)])
        .map(|url| format!("{}?{}", url.path(), url.query().unwrap_or_default()))
        .unwrap_or_else(|_| RECIPE_LINK_BASE.to_string())
}

fn text(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn positive(value: i32) -> Option<i32> {
    (value > 0).then_some(value)
}

struct Details<'a> {
    title: &'a str,
    description: &'a str,
    category: &'a str,
    cuisine: &'a str,
    prep_time: i32,
    cook_time: i32,
    servings: i32,
    image: Option<&'a str>,
}

impl RecipeCard {
    fn from_details(source: &'static str, details: Details) -> Self {
        let prep_time = positive(details.prep_time);
        let cook_time = positive(details.cook_time);
        let total_time = match (prep_time, cook_time) {
            (None, None) => None,
            (prep, cook) => Some(prep.unwrap_or(0) + cook.unwrap_or(0)),
        };
        let image = details.image.and_then(text);

        Self {
            source,
            title: details.title.trim().to_string(),
            description: text(details.description),
            category: text(details.category),
            cuisine: text(details.cuisine),
            prep_time,
            cook_time,
            total_time,
            servings: positive(details.servings),
            match_percentage: None,
            missing_ingredients: Vec::new(),
            show_image: image.is_some(),
            image,
            href: recipe_href(details.title.trim()),
        }
    }
}

impl From<&RecipeSource> for RecipeCard {
    fn from(source: &RecipeSource) -> Self {
        match source {
            RecipeSource::Catalog(meal) => Self::from_details(
                "catalog",
                Details {
                    title: &meal.name,
                    description: "",
                    category: "",
                    cuisine: "",
                    prep_time: 0,
                    cook_time: 0,
                    servings: 0,
                    image: meal.thumbnail.as_deref(),
                },
            ),
            RecipeSource::Generated(suggestion) => {
                let recipe = &suggestion.recipe;
                let mut card = Self::from_details(
                    "generated",
                    Details {
                        title: &recipe.title,
                        description: &recipe.description,
                        category: &recipe.category,
                        cuisine: &recipe.cuisine,
                        prep_time: recipe.prep_time,
                        cook_time: recipe.cook_time,
                        servings: recipe.servings,
                        image: recipe.image_url.as_deref(),
                    },
                );
                card.match_percentage = Some(suggestion.match_percentage.min(100));
                card.missing_ingredients = suggestion.missing_ingredients.clone();
                card
            }
            RecipeSource::Saved(recipe) => Self::from_details(
                "saved",
                Details {
                    title: &recipe.title,
                    description: &recipe.description,
                    category: &recipe.category,
                    cuisine: &recipe.cuisine,
                    prep_time: recipe.prep_time,
                    cook_time: recipe.cook_time,
                    servings: recipe.servings,
                    image: recipe.image_url.as_deref(),
                },
            ),
        }
    }
}

impl From<RecipeSource> for RecipeCard {
    fn from(source: RecipeSource) -> Self {
        Self::from(&source)
    }
}
