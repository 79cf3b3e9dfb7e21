use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A full catalog meal, as shown for the recipe of the day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    #[serde(rename = "idMeal")]
    pub id: String,
    #[serde(rename = "strMeal")]
    pub name: String,
    #[serde(rename = "strMealThumb", default)]
    pub thumbnail: Option<String>,
    #[serde(rename = "strCategory", default)]
    pub category: Option<String>,
    #[serde(rename = "strArea", default)]
    pub area: Option<String>,
    #[serde(rename = "strInstructions", default)]
    pub instructions: Option<String>,
}

/// A catalog grid entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealSummary {
    #[serde(rename = "idMeal")]
    pub id: String,
    #[serde(rename = "strMeal")]
    pub name: String,
    #[serde(rename = "strMealThumb", default)]
    pub thumbnail: Option<String>,
}

impl From<&Meal> for MealSummary {
    fn from(meal: &Meal) -> Self {
        Self {
            id: meal.id.clone(),
            name: meal.name.clone(),
            thumbnail: meal.thumbnail.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    #[serde(alias = "strCategory")]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Area {
    #[serde(alias = "strArea")]
    pub name: String,
}

/// Capitalizes the first letter, as the catalog's lookup keys are.
pub fn normalize_lookup(value: &str) -> String {
    let value = value.trim();
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[async_trait]
pub trait RecipeCatalog: Send + Sync {
    /// `None` when the catalog has nothing to offer today.
    async fn recipe_of_the_day(&self) -> Result<Option<Meal>, potion::Error>;

    async fn categories(&self) -> Result<Vec<Category>, potion::Error>;

    async fn areas(&self) -> Result<Vec<Area>, potion::Error>;

    async fn meals_by_category(&self, category: &str) -> Result<Vec<MealSummary>, potion::Error>;

    async fn meals_by_area(&self, area: &str) -> Result<Vec<MealSummary>, potion::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups_are_capitalized() {
        assert_eq!(normalize_lookup("seafood"), "Seafood");
        assert_eq!(normalize_lookup(" italian "), "Italian");
        assert_eq!(normalize_lookup("Beef"), "Beef");
        assert_eq!(normalize_lookup(""), "");
    }

    #[test]
    fn categories_read_catalog_names_and_write_plain_names() {
        let category: Category = serde_json::from_str(r#"{"strCategory": "Dessert"}"#).unwrap();
        assert_eq!(category.name, "Dessert");
        assert_eq!(
            serde_json::to_value(&category).unwrap(),
            serde_json::json!({ "name": "Dessert" })
        );
    }
}
