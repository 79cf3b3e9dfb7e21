use std::{cmp::Ordering, collections::HashSet};

use serde::{Deserialize, Serialize};

use crate::{constants::INGREDIENT_MATCH_THRESHOLD, schema::RecipeDraft};

/// A generated recipe ranked against a pantry. Never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    #[serde(flatten)]
    pub recipe: RecipeDraft,
    pub match_percentage: u8,
    pub missing_ingredients: Vec<String>,
}

const FILLER_WORDS: &[&str] = &[
    "fresh", "freshly", "chopped", "minced", "sliced", "diced", "grated", "ground", "dried",
    "large", "small", "medium", "whole", "extra", "virgin", "optional", "to", "taste", "of",
    "a", "and", "or", "for", "boneless", "skinless", "raw", "cooked",
];

fn singular(word: &str) -> String {
    if word.len() > 4 && word.ends_with("oes") {
        word[..word.len() - 2].to_string()
    } else if word.len() > 3 && word.ends_with('s') && !word.ends_with("ss") {
        word[..word.len() - 1].to_string()
    } else {
        word.to_string()
    }
}

/// Lowercased, singular tokens of an ingredient name without preparation words.
pub fn normalize_ingredient(name: &str) -> Vec<String> {
    name.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .filter(|w| !FILLER_WORDS.contains(w))
        .filter(|w| !w.chars().all(|c| c.is_ascii_digit()))
        .map(singular)
        .collect()
}

fn word_ngrams(words: &[String], n: usize) -> HashSet<String> {
    if words.len() < n {
        return words.iter().cloned().collect();
    }

    words.windows(n).map(|w| w.join(" ")).collect()
}

fn jaccard_similarity(set1: &HashSet<String>, set2: &HashSet<String>) -> f64 {
    let intersection = set1.intersection(set2).count();
    let union = set1.union(set2).count();

    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

/// Word n-gram Jaccard blended with Jaro-Winkler over the joined words.
pub fn combined_similarity(s1: &[String], s2: &[String], n: usize, alpha: f64) -> f64 {
    let jaccard = jaccard_similarity(&word_ngrams(s1, n), &word_ngrams(s2, n));
    let jw_score = strsim::jaro_winkler(&s1.join(" "), &s2.join(" "));

    alpha * jaccard + (1.0 - alpha) * jw_score
}

fn contains_all(outer: &[String], inner: &[String]) -> bool {
    inner.iter().all(|w| outer.contains(w))
}

/// Whether a pantry item covers a recipe ingredient.
///
/// A pantry item covers any ingredient it is at least as specific as ("chicken breast" covers
/// "chicken"). A more generic pantry item does not cover a more specific ingredient ("butter"
/// does not cover "peanut butter"); beyond containment both names must share their head noun
/// and be similar overall.
pub fn ingredient_matches(recipe_item: &[String], pantry_item: &[String]) -> bool {
    let (Some(recipe_head), Some(pantry_head)) = (recipe_item.last(), pantry_item.last()) else {
        return false;
    };
    if contains_all(pantry_item, recipe_item) {
        return true;
    }
    if strsim::jaro_winkler(recipe_head, pantry_head) < INGREDIENT_MATCH_THRESHOLD {
        return false;
    }

    let score = match (recipe_item, pantry_item) {
        ([a], [b]) => strsim::jaro_winkler(a, b),
        _ => combined_similarity(recipe_item, pantry_item, 2, 0.5),
    };
    score >= INGREDIENT_MATCH_THRESHOLD
}

/// Coverage of `draft` by `pantry`, as a percentage in `0..=100` and the uncovered items.
pub fn score_recipe(draft: &RecipeDraft, pantry: &[Vec<String>]) -> (u8, Vec<String>) {
    if draft.ingredients.is_empty() {
        return (0, Vec::new());
    }

    let missing: Vec<String> = draft
        .ingredients
        .iter()
        .filter(|ingredient| {
            let tokens = normalize_ingredient(&ingredient.item);
            !pantry.iter().any(|p| ingredient_matches(&tokens, p))
        })
        .map(|ingredient| ingredient.item.clone())
        .collect();

    let total = draft.ingredients.len();
    let covered = total - missing.len();
    let percentage = (covered as f64 * 100.0 / total as f64).round().clamp(0.0, 100.0) as u8;

    (percentage, missing)
}

/// Highest match first, then fewer missing ingredients, then title.
fn rank(a: &Suggestion, b: &Suggestion) -> Ordering {
    b.match_percentage
        .cmp(&a.match_percentage)
        .then_with(|| a.missing_ingredients.len().cmp(&b.missing_ingredients.len()))
        .then_with(|| a.recipe.title.cmp(&b.recipe.title))
}

pub fn rank_suggestions<S: AsRef<str>>(
    drafts: Vec<RecipeDraft>,
    pantry_names: &[S],
) -> Vec<Suggestion> {
    let pantry: Vec<Vec<String>> = pantry_names
        .iter()
        .map(|name| normalize_ingredient(name.as_ref()))
        .filter(|tokens| !tokens.is_empty())
        .collect();

    let mut suggestions: Vec<Suggestion> = drafts
        .into_iter()
        .map(|recipe| {
            let (match_percentage, missing_ingredients) = score_recipe(&recipe, &pantry);
            Suggestion {
                recipe,
                match_percentage,
                missing_ingredients,
            }
        })
        .collect();

    suggestions.sort_by(rank);
    suggestions
}
