pub const SAVED_RECIPE_COUNT_PER_PAGE: i64 = 24;
pub const SUGGESTION_COUNT: usize = 5;

pub const FREE_PANTRY_SCANS_PER_CYCLE: u32 = 10;
pub const FREE_RECOMMENDATIONS_PER_CYCLE: u32 = 5;

/// Minimum combined similarity for two ingredient names to count as the same item.
pub const INGREDIENT_MATCH_THRESHOLD: f64 = 0.93;

pub const SESSION_COOKIE: &str = "session";
pub const SESSION_LIFETIME_HOURS: i64 = 1;

pub const MEALDB_BASE_URL: &str = "https://www.themealdb.com/api/json/v1/1";
pub const RECIPE_LINK_BASE: &str = "/recipe";
