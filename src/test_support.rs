use async_trait::async_trait;

use crate::catalog::meal::{Area, Category, Meal, MealSummary, RecipeCatalog};

/// A catalog with nothing in it.
pub struct EmptyCatalog;

#[async_trait]
impl RecipeCatalog for EmptyCatalog {
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
