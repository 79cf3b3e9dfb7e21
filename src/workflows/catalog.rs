use serde::Serialize;

use crate::{
    catalog::meal::{Area, Category, Meal, MealSummary},
    state::AppState,
};

#[derive(Debug, Serialize)]
pub struct RecipeOfTheDay {
    pub recipe: Option<Meal>,
}

#[derive(Debug, Serialize)]
pub struct Categories {
    pub categories: Vec<Category>,
}

#[derive(Debug, Serialize)]
pub struct Areas {
    pub areas: Vec<Area>,
}

#[derive(Debug, Serialize)]
pub struct Meals {
    pub meals: Vec<MealSummary>,
}

pub async fn get_recipe_of_the_day(state: &AppState) -> Result<RecipeOfTheDay, potion::Error> {
    Ok(RecipeOfTheDay {
        recipe: state.catalog.recipe_of_the_day().await?,
    })
}

pub async fn get_categories(state: &AppState) -> Result<Categories, potion::Error> {
    Ok(Categories {
        categories: state.catalog.categories().await?,
    })
}

pub async fn get_areas(state: &AppState) -> Result<Areas, potion::Error> {
    Ok(Areas {
        areas: state.catalog.areas().await?,
    })
}

pub async fn get_meals_by_category(
    category: &str,
    state: &AppState,
) -> Result<Meals, potion::Error> {
    Ok(Meals {
        meals: state.catalog.meals_by_category(category).await?,
    })
}

pub async fn get_meals_by_area(area: &str, state: &AppState) -> Result<Meals, potion::Error> {
    Ok(Meals {
        meals: state.catalog.meals_by_area(area).await?,
    })
}
