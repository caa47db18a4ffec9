use crate::recipe::Difficulty;

const BASE_MINUTES: u32 = 10;
pub const MIN_MINUTES: u32 = 15;
pub const MAX_MINUTES: u32 = 120;

/// Keyword -> minutes added. Order matters: the first keyword found in an
/// ingredient wins, so "sweet potatoes" counts as "potatoes".
const INGREDIENT_MINUTES: &[(&str, u32)] = &[
    // Meats
    ("chicken", 20), ("beef", 25), ("pork", 22), ("fish", 15), ("mutton", 40), ("lamb", 35),
    ("prawn", 8), ("shrimp", 8), ("crab", 15), ("eggs", 8),
    // Grains & carbs
    ("rice", 20), ("pasta", 12), ("noodles", 10), ("potatoes", 25), ("sweet potato", 30),
    ("bread", 5), ("quinoa", 15), ("oats", 10),
    // Vegetables
    ("carrots", 10), ("broccoli", 8), ("cauliflower", 10), ("spinach", 3), ("cabbage", 12),
    ("onion", 8), ("garlic", 5), ("ginger", 5), ("tomatoes", 8), ("bell peppers", 8),
    ("mushrooms", 10), ("zucchini", 8), ("eggplant", 15), ("okra", 12), ("beans", 25),
    ("peas", 8), ("corn", 10), ("lettuce", 2),
    // Legumes
    ("lentils", 30), ("chickpeas", 35), ("tofu", 10), ("paneer", 8),
    // Dairy
    ("cheese", 5), ("milk", 2), ("cream", 3), ("yogurt", 2), ("butter", 2),
];

fn minutes_for(ingredient: &str) -> u32 {
    let lowered = ingredient.to_lowercase();
    INGREDIENT_MINUTES
        .iter()
        .find(|(keyword, _)| lowered.contains(keyword))
        .map_or(0, |(_, minutes)| *minutes)
}

/// Estimated minutes for a recipe, always within `[15, 120]`.
///
/// Unknown difficulty (`None`) keeps the unscaled total.
pub fn predict_time<S: AsRef<str>>(ingredient_names: &[S], difficulty: Option<Difficulty>) -> u32 {
    let total: u32 = BASE_MINUTES
        + ingredient_names
            .iter()
            .map(|name| minutes_for(name.as_ref()))
            .sum::<u32>();
    let percent = difficulty.map_or(100, Difficulty::time_percent);
    let adjusted = total.saturating_mul(percent) / 100;
    adjusted.clamp(MIN_MINUTES, MAX_MINUTES)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_driven_estimates() {
        let cases: &[(&[&str], Option<Difficulty>, u32)] = &[
            (&[], Some(Difficulty::Medium), 15),
            (&["rice"], Some(Difficulty::Medium), 30),
            (&["rice"], Some(Difficulty::Easy), 24),
            (&["rice"], Some(Difficulty::Hard), 39),
            (&["rice"], None, 30),
            (&["chicken", "rice"], Some(Difficulty::Hard), 65),
            (&["Chicken Breast", "BASMATI RICE", "onion"], Some(Difficulty::Medium), 58),
            (&["lettuce"], Some(Difficulty::Easy), 15),
            (&["mutton", "lamb", "chickpeas"], Some(Difficulty::Hard), 120),
            (&["saffron", "vanilla"], Some(Difficulty::Medium), 15),
        ];
        for (ingredients, difficulty, expected) in cases {
            assert_eq!(
                predict_time(ingredients, *difficulty),
                *expected,
                "ingredients {:?} at {:?}",
                ingredients,
                difficulty
            );
        }
    }

    #[test]
    fn test_first_keyword_wins_per_ingredient() {
        // "sweet potatoes" hits "potatoes" (25) before "sweet potato" (30).
        assert_eq!(predict_time(&["sweet potatoes"], Some(Difficulty::Medium)), 35);
        // "chicken and eggs" is one ingredient: only "chicken" counts.
        assert_eq!(predict_time(&["chicken and eggs"], Some(Difficulty::Medium)), 30);
    }

    #[test]
    fn test_always_within_bounds() {
        let all: Vec<&str> = INGREDIENT_MINUTES.iter().map(|(k, _)| *k).collect();
        for difficulty in [None, Some(Difficulty::Easy), Some(Difficulty::Medium), Some(Difficulty::Hard)] {
            for n in 0..=all.len() {
                let minutes = predict_time(&all[..n], difficulty);
                assert!((MIN_MINUTES..=MAX_MINUTES).contains(&minutes));
            }
        }
    }
}
