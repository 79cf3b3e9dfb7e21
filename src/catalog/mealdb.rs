use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize};

use super::meal::{normalize_lookup, Area, Category, Meal, MealSummary, RecipeCatalog};
use crate::error::CatalogError;

/// TheMealDB wraps every list in `{ "meals": [...] }`, with `null` for no results.
#[derive(Deserialize)]
struct MealsEnvelope<T> {
    meals: Option<Vec<T>>,
}

pub fn parse_meals<T: DeserializeOwned>(body: &str) -> Result<Vec<T>, potion::Error> {
    let envelope: MealsEnvelope<T> = serde_json::from_str(body)
        .map_err(|e| CatalogError::new(format!("Unexpected catalog response: {e}")))?;

    Ok(envelope.meals.unwrap_or_default())
}

/// HTTP client for TheMealDB's public API.
#[derive(Clone)]
pub struct MealDbClient {
    base_url: String,
    client: reqwest::Client,
}

impl MealDbClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>, potion::Error> {
        log::debug!("Catalog request {endpoint} {query:?}");

        let body = self
            .client
            .get(format!("{}/{endpoint}", self.base_url))
            .query(query)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(CatalogError::from)?
            .text()
            .await
            .map_err(CatalogError::from)?;

        parse_meals(&body)
    }
}

#[async_trait]
impl RecipeCatalog for MealDbClient {
    async fn recipe_of_the_day(&self) -> Result<Option<Meal>, potion::Error> {
        let meals: Vec<Meal> = self.fetch("random.php", &[]).await?;
        Ok(meals.into_iter().next())
    }

    async fn categories(&self) -> Result<Vec<Category>, potion::Error> {
        self.fetch("list.php", &[("c", "list")]).await
    }

    async fn areas(&self) -> Result<Vec<Area>, potion::Error> {
        self.fetch("list.php", &[("a", "list")]).await
    }

    async fn meals_by_category(&self, category: &str) -> Result<Vec<MealSummary>, potion::Error> {
        let category = normalize_lookup(category);
        self.fetch("filter.php", &[("c", category.as_str())]).await
    }

    async fn meals_by_area(&self, area: &str) -> Result<Vec<MealSummary>, potion::Error> {
        let area = normalize_lookup(area);
        self.fetch("filter.php", &[("a", area.as_str())]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_meal_lists() {
        let body = r#"{"meals": [
            {"strMeal": "Baked salmon", "strMealThumb": "https://img/1.jpg", "idMeal": "52959"},
            {"strMeal": "Kedgeree", "strMealThumb": null, "idMeal": "52887"}
        ]}"#;

        let meals: Vec<MealSummary> = parse_meals(body).ok().unwrap();
        assert_eq!(meals.len(), 2);
        assert_eq!(meals[0].name, "Baked salmon");
        assert!(meals[1].thumbnail.is_none());
    }

    #[test]
    fn null_meals_is_empty() {
        let meals: Vec<MealSummary> = parse_meals(r#"{"meals": null}"#).ok().unwrap();
        assert!(meals.is_empty());
    }

    #[test]
    fn garbage_is_a_catalog_error() {
        let error = parse_meals::<Area>("<html>").err().unwrap();
        assert_eq!(error.code, 502);
    }

    #[test]
    fn parses_full_meal() {
        let body = r#"{"meals": [{
            "idMeal": "52772", "strMeal": "Teriyaki Chicken Casserole",
            "strCategory": "Chicken", "strArea": "Japanese",
            "strInstructions": "Preheat oven to 350.", "strMealThumb": "https://img/2.jpg",
            "strTags": "Meat,Casserole"
        }]}"#;

        let meals: Vec<Meal> = parse_meals(body).ok().unwrap();
        assert_eq!(meals[0].area.as_deref(), Some("Japanese"));
        assert_eq!(MealSummary::from(&meals[0]).id, "52772");
    }
}
