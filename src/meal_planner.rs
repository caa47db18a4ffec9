use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::{Arc, OnceLock};

use regex::Regex;
use serde::Serialize;
use tracing::info;

use crate::recipe::{DietFilter, RecipeMatch};
use crate::search::matcher::RecipeMatcher;

const CANDIDATES_PER_SLOT: usize = 3;

const MEASUREMENT_WORDS: &[&str] = &[
    "cup", "cups", "tsp", "tbsp", "teaspoon", "tablespoon", "gram", "grams", "kg", "pound",
    "pounds", "lb", "lbs", "ounce", "ounces", "oz", "ml", "liter", "litre", "pinch", "dash",
    "some", "few",
];

const PANTRY_STAPLES: &[&str] = &[
    "salt", "pepper", "water", "oil", "vegetable oil", "olive oil", "sugar", "flour", "rice",
    "butter", "garlic", "onion", "ginger", "spices", "turmeric", "cumin", "coriander",
    "chili powder", "soy sauce", "vinegar", "baking powder", "baking soda",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum MealSlot {
    Breakfast,
    Lunch,
    Dinner,
}

impl MealSlot {
    pub const ALL: [MealSlot; 3] = [MealSlot::Breakfast, MealSlot::Lunch, MealSlot::Dinner];
}

#[derive(Debug, Clone, Serialize)]
pub struct WeeklyPlan {
    pub weekly_plan: BTreeMap<Weekday, BTreeMap<MealSlot, RecipeMatch>>,
    pub shopping_list: Vec<String>,
}

fn is_bare_number(word: &str) -> bool {
    let digits: String = word.chars().filter(|c| *c != '.').collect();
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

/// "to taste" and "as needed", only as whole words.
fn measurement_phrases() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\b(?:to taste|as needed)\b")
            .expect("measurement phrase pattern is a valid regex")
    })
}

/// Lowercased, whitespace-collapsed name with quantities and units removed.
pub fn clean_ingredient_name(name: &str) -> String {
    let cleaned = name.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
    let cleaned = measurement_phrases().replace_all(&cleaned, " ");
    cleaned
        .split_whitespace()
        .filter(|word| !is_bare_number(word) && !MEASUREMENT_WORDS.contains(word))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn is_pantry_staple(cleaned: &str) -> bool {
    PANTRY_STAPLES.contains(&cleaned)
}

pub struct MealPlanner {
    matcher: Arc<RecipeMatcher>,
}

impl MealPlanner {
    pub fn new(matcher: Arc<RecipeMatcher>) -> Self {
        Self { matcher }
    }

    /// Seven days of three meals each. Every slot asks the matcher
    /// independently, so one recipe may fill the whole week.
    pub fn generate_weekly_plan<S: AsRef<str>>(
        &self,
        available_ingredients: &[S],
        diet_preference: Option<DietFilter>,
    ) -> WeeklyPlan {
        let available: HashSet<String> = available_ingredients
            .iter()
            .map(|i| i.as_ref().split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase())
            .collect();

        let mut weekly_plan = BTreeMap::new();
        let mut shopping_list = BTreeSet::new();

        for day in Weekday::ALL {
            let meals: &mut BTreeMap<MealSlot, RecipeMatch> =
                weekly_plan.entry(day).or_default();
            for slot in MealSlot::ALL {
                let candidates = self.matcher.find_similar_recipes(
                    available_ingredients,
                    CANDIDATES_PER_SLOT,
                    diet_preference,
                );
                let Some(selected) = candidates.into_iter().next() else {
                    continue;
                };

                for ingredient in &selected.recipe.ingredients {
                    let name = ingredient.name();
                    let cleaned = clean_ingredient_name(name);
                    if !cleaned.is_empty()
                        && !available.contains(&cleaned)
                        && !is_pantry_staple(&cleaned)
                    {
                        shopping_list.insert(name.to_string());
                    }
                }
                meals.insert(slot, selected);
            }
        }

        info!(items = shopping_list.len(), "Generated weekly meal plan");
        WeeklyPlan {
            weekly_plan,
            shopping_list: shopping_list.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::{Difficulty, Ingredient, Recipe};

    fn recipe(id: u64, title: &str, ingredients: Vec<Ingredient>) -> Recipe {
        Recipe {
            id,
            title: title.to_string(),
            ingredients,
            instructions: vec!["Cook".to_string()],
            cooking_time: 20,
            difficulty: Difficulty::Easy,
            dietary_tags: vec![],
            cuisine: None,
        }
    }

    #[test]
    fn test_clean_ingredient_name() {
        assert_eq!(clean_ingredient_name("2 cups  Basmati Rice"), "basmati rice");
        assert_eq!(clean_ingredient_name("1.5 kg chicken"), "chicken");
        assert_eq!(clean_ingredient_name("Salt to taste"), "salt");
        assert_eq!(clean_ingredient_name("Coriander as needed"), "coriander");
        assert_eq!(clean_ingredient_name("1/2 onion"), "1/2 onion");
        assert_eq!(clean_ingredient_name("  3  "), "");
    }

    #[test]
    fn test_measurement_phrases_only_match_whole_words() {
        assert_eq!(clean_ingredient_name("bananas needed"), "bananas needed");
        assert_eq!(clean_ingredient_name("pesto tasted"), "pesto tasted");
        assert_eq!(clean_ingredient_name("Pepper  TO TASTE"), "pepper");
        assert_eq!(clean_ingredient_name("1 cup pesto, as needed"), "pesto,");
    }

    #[test]
    fn test_pantry_staples() {
        assert!(is_pantry_staple("olive oil"));
        assert!(is_pantry_staple("salt"));
        assert!(!is_pantry_staple("sesame oil"));
    }

    #[test]
    fn test_weekly_plan_fills_every_slot() {
        let corpus = vec![
            recipe(
                1,
                "Tomato Pasta",
                vec!["pasta".into(), "tomatoes".into(), "2 tbsp olive oil".into(), "basil".into()],
            ),
            recipe(2, "Egg Fried Rice", vec!["eggs".into(), "rice".into(), "scallions".into()]),
            recipe(3, "Chicken Salad", vec!["chicken".into(), "lettuce".into()]),
        ];
        let planner = MealPlanner::new(Arc::new(RecipeMatcher::new(corpus)));
        let plan = planner.generate_weekly_plan(&["Pasta", "tomatoes"], None);

        assert_eq!(plan.weekly_plan.len(), 7);
        for meals in plan.weekly_plan.values() {
            assert_eq!(meals.len(), 3);
            assert!(meals.values().all(|m| m.recipe.title == "Tomato Pasta"));
        }
        assert_eq!(plan.shopping_list, vec!["basil".to_string()]);
    }

    #[test]
    fn test_shopping_list_uses_structured_names() {
        let corpus = vec![recipe(
            1,
            "Paneer Tikka",
            vec![
                Ingredient::structured("paneer", "200 g"),
                Ingredient::structured("yogurt", "1 cup"),
                Ingredient::structured("turmeric", "1 tsp"),
            ],
        )];
        let planner = MealPlanner::new(Arc::new(RecipeMatcher::new(corpus)));
        let plan = planner.generate_weekly_plan(&["paneer"], None);
        assert_eq!(plan.shopping_list, vec!["yogurt".to_string()]);
    }

    #[test]
    fn test_diet_filter_can_empty_slots() {
        let corpus = vec![
            recipe(1, "Beef Stew", vec!["beef".into(), "potatoes".into()]),
            recipe(2, "Chicken Soup", vec!["chicken".into(), "carrots".into()]),
            recipe(3, "Fish Tacos", vec!["fish".into(), "tortillas".into()]),
        ];
        let planner = MealPlanner::new(Arc::new(RecipeMatcher::new(corpus)));
        let plan = planner.generate_weekly_plan(&["beef"], Some(DietFilter::Vegetarian));

        assert_eq!(plan.weekly_plan.len(), 7);
        assert!(plan.weekly_plan.values().all(BTreeMap::is_empty));
        assert!(plan.shopping_list.is_empty());
    }

    #[test]
    fn test_plan_serializes_with_day_names() {
        let corpus = vec![recipe(1, "Toast", vec!["bread".into()])];
        let planner = MealPlanner::new(Arc::new(RecipeMatcher::new(corpus)));
        let plan = planner.generate_weekly_plan(&["bread"], None);
        let value = serde_json::to_value(&plan).unwrap();
        assert_eq!(value["weekly_plan"]["Monday"]["Dinner"]["title"], "Toast");
        assert!(value["weekly_plan"]["Sunday"]["Breakfast"].is_object());
    }
}
