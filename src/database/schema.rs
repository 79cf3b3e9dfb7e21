use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use sqlx::types::Json;

use crate::constants::{FREE_PANTRY_SCANS_PER_CYCLE, FREE_RECOMMENDATIONS_PER_CYCLE};

pub type Uuid = uuid::Uuid;
pub type UserId = String;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanTier {
    Free,
    Pro,
}

impl PlanTier {
    pub fn limit(&self, kind: UsageKind) -> Limit {
        match (self, kind) {
            (PlanTier::Pro, _) => Limit::Unlimited,
            (PlanTier::Free, UsageKind::PantryScan) => Limit::Finite(FREE_PANTRY_SCANS_PER_CYCLE),
            (PlanTier::Free, UsageKind::Recommendation) => {
                Limit::Finite(FREE_RECOMMENDATIONS_PER_CYCLE)
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UsageKind {
    PantryScan,
    Recommendation,
}

/// A usage limit. Serialized as a plain integer, or the string `"unlimited"`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Limit {
    Finite(u32),
    Unlimited,
}

impl Limit {
    pub fn allows(&self, used: u32) -> bool {
        match self {
            Limit::Finite(limit) => used < *limit,
            Limit::Unlimited => true,
        }
    }
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Limit::Finite(n) => write!(f, "{n}"),
            Limit::Unlimited => write!(f, "unlimited"),
        }
    }
}

impl Serialize for Limit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Limit::Finite(n) => serializer.serialize_u32(*n),
            Limit::Unlimited => serializer.serialize_str("unlimited"),
        }
    }
}

impl<'de> Deserialize<'de> for Limit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        match &value {
            Value::String(s) if s == "unlimited" => Ok(Limit::Unlimited),
            Value::Number(n) => n
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .map(Limit::Finite)
                .ok_or_else(|| serde::de::Error::custom("limit out of range")),
            _ => Err(serde::de::Error::custom(format!("invalid limit {value}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub item: String,
    pub amount: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstructionStep {
    pub step: i32,
    pub title: String,
    pub instruction: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tip: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionFacts {
    pub calories: String,
    pub protein: String,
    pub carbs: String,
    pub fat: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Substitution {
    pub original: String,
    pub alternatives: Vec<String>,
}

/// Recipe content as produced by the generator, before it gets an identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub cuisine: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub servings: i32,
    #[serde(default)]
    pub prep_time: i32,
    #[serde(default)]
    pub cook_time: i32,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub instructions: Vec<InstructionStep>,
    #[serde(default)]
    pub nutrition: Option<NutritionFacts>,
    #[serde(default)]
    pub tips: Vec<String>,
    #[serde(default)]
    pub substitutions: Vec<Substitution>,
}

#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub cuisine: String,
    pub category: String,
    pub servings: i32,
    pub prep_time: i32,
    pub cook_time: i32,
    pub image_url: Option<String>,

    pub ingredients: Json<Vec<Ingredient>>,
    pub instructions: Json<Vec<InstructionStep>>,
    pub nutrition: Option<Json<NutritionFacts>>,
    pub tips: Json<Vec<String>>,
    pub substitutions: Json<Vec<Substitution>>,

    pub author_id: UserId,
    pub created_at: DateTime<Utc>,
}

impl Recipe {
    pub fn from_draft(draft: RecipeDraft, author_id: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: draft.title.trim().to_string(),
            description: draft.description,
            cuisine: draft.cuisine,
            category: draft.category,
            servings: draft.servings,
            prep_time: draft.prep_time,
            cook_time: draft.cook_time,
            image_url: draft.image_url,
            ingredients: Json(draft.ingredients),
            instructions: Json(draft.instructions),
            nutrition: draft.nutrition.map(Json),
            tips: Json(draft.tips),
            substitutions: Json(draft.substitutions),
            author_id: author_id.to_string(),
            created_at: Utc::now(),
        }
    }
}

/// Lookup key for recipe names: surrounding whitespace and letter case are ignored.
pub fn recipe_key(name: &str) -> String {
    name.trim().to_lowercase()
}

#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PantryItem {
    pub id: Uuid,
    pub owner_id: UserId,
    pub name: String,
    pub quantity: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPantryItem {
    pub name: String,
    #[serde(default)]
    pub quantity: String,
}

#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageQuota {
    pub user_id: UserId,
    pub period_start: DateTime<Utc>,
    pub pantry_scans: i32,
    pub recommendations: i32,
}

impl UsageQuota {
    pub fn new(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            period_start: Utc::now(),
            pantry_scans: 0,
            recommendations: 0,
        }
    }

    pub fn used(&self, kind: UsageKind) -> u32 {
        let used = match kind {
            UsageKind::PantryScan => self.pantry_scans,
            UsageKind::Recommendation => self.recommendations,
        };
        used.max(0) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_wire_format() {
        assert_eq!(serde_json::to_string(&Limit::Unlimited).unwrap(), "\"unlimited\"");
        assert_eq!(serde_json::to_string(&Limit::Finite(5)).unwrap(), "5");

        let limit: Limit = serde_json::from_str("\"unlimited\"").unwrap();
        assert_eq!(limit, Limit::Unlimited);
        let limit: Limit = serde_json::from_str("10").unwrap();
        assert_eq!(limit, Limit::Finite(10));
        assert!(serde_json::from_str::<Limit>("\"lots\"").is_err());
    }

    #[test]
    fn free_plan_is_capped_and_pro_is_not() {
        let scans = PlanTier::Free.limit(UsageKind::PantryScan);
        assert!(scans.allows(FREE_PANTRY_SCANS_PER_CYCLE - 1));
        assert!(!scans.allows(FREE_PANTRY_SCANS_PER_CYCLE));

        assert!(PlanTier::Pro.limit(UsageKind::Recommendation).allows(u32::MAX));
    }

    #[test]
    fn recipe_key_ignores_case_and_padding() {
        assert_eq!(recipe_key("  Spaghetti Carbonara "), recipe_key("spaghetti carbonara"));
        assert_ne!(recipe_key("Carbonara"), recipe_key("Carbonara Pie"));
    }

    #[test]
    fn draft_parses_with_missing_optional_sections() {
        let draft: RecipeDraft = serde_json::from_str(
            r#"{
                "title": "Shakshuka",
                "servings": 2,
                "prepTime": 10,
                "cookTime": 20,
                "ingredients": [{"item": "eggs", "amount": "4"}],
                "instructions": [{"step": 1, "title": "Simmer", "instruction": "Simmer the sauce"}]
            }"#,
        )
        .unwrap();

        assert_eq!(draft.prep_time, 10);
        assert!(draft.nutrition.is_none());
        assert!(draft.tips.is_empty());

        let recipe = Recipe::from_draft(draft, "user_1");
        assert_eq!(recipe.ingredients.0[0].item, "eggs");
        assert_eq!(recipe.author_id, "user_1");
    }
}
