use tracing::{info, warn};

use crate::api_connection::edamam::{EdamamClient, NutritionApiError};
use crate::api_connection::endpoints::{NutritionDetailsRequest, NutritionDetailsResponse};
use crate::recipe::{Ingredient, NutritionRecord, NutritionSource};

/// Per-keyword macros: (keyword, calories, protein, carbs, fat). The first
/// keyword contained in an ingredient name wins.
const NUTRITION_TABLE: &[(&str, f64, f64, f64, f64)] = &[
    // Proteins
    ("chicken", 165.0, 31.0, 0.0, 3.6),
    ("beef", 250.0, 26.0, 0.0, 15.0),
    ("fish", 206.0, 22.0, 0.0, 12.0),
    ("eggs", 72.0, 6.0, 0.4, 5.0),
    ("paneer", 265.0, 18.0, 2.0, 20.0),
    ("tofu", 76.0, 8.0, 2.0, 4.0),
    // Grains
    ("rice", 130.0, 2.7, 28.0, 0.3),
    ("pasta", 131.0, 5.0, 25.0, 1.0),
    ("bread", 265.0, 9.0, 49.0, 3.0),
    // Vegetables
    ("tomatoes", 18.0, 0.9, 3.9, 0.2),
    ("onion", 40.0, 1.1, 9.0, 0.1),
    ("potatoes", 77.0, 2.0, 17.0, 0.1),
    ("carrots", 41.0, 0.9, 10.0, 0.2),
    ("spinach", 23.0, 2.9, 3.6, 0.4),
    ("broccoli", 34.0, 2.8, 7.0, 0.4),
    // Dairy
    ("milk", 42.0, 3.4, 5.0, 1.0),
    ("cheese", 113.0, 7.0, 0.9, 9.0),
    ("butter", 717.0, 0.9, 0.1, 81.0),
    ("cream", 345.0, 2.1, 2.9, 37.0),
    // Legumes
    ("lentils", 116.0, 9.0, 20.0, 0.4),
    ("beans", 132.0, 9.0, 24.0, 0.5),
    ("chickpeas", 139.0, 7.0, 23.0, 2.0),
];

/// Added when fewer than two ingredients matched the table, standing in for
/// unlisted oil and seasoning.
const BASELINE: (f64, f64, f64, f64) = (200.0, 8.0, 15.0, 10.0);
const MIN_MATCHED_FOR_NO_BASELINE: usize = 2;

/// Keyword-table estimate; never fails.
pub fn estimate_nutrition(ingredients: &[Ingredient]) -> NutritionRecord {
    let (mut calories, mut protein, mut carbs, mut fat) = (0.0_f64, 0.0_f64, 0.0_f64, 0.0_f64);
    let mut matched = 0;

    for ingredient in ingredients {
        let name = ingredient.name().to_lowercase();
        if let Some(&(_, kcal, p, c, f)) = NUTRITION_TABLE
            .iter()
            .find(|(keyword, ..)| name.contains(keyword))
        {
            calories += kcal;
            protein += p;
            carbs += c;
            fat += f;
            matched += 1;
        }
    }

    if matched < MIN_MATCHED_FOR_NO_BASELINE {
        calories += BASELINE.0;
        protein += BASELINE.1;
        carbs += BASELINE.2;
        fat += BASELINE.3;
    }

    NutritionRecord {
        calories,
        protein,
        carbs,
        fat,
        fiber: None,
        sugar: None,
        sodium: None,
        source: NutritionSource::Estimated,
    }
}

fn record_from_response(response: NutritionDetailsResponse) -> NutritionRecord {
    let totals = response.total_nutrients;
    NutritionRecord {
        calories: response.calories,
        protein: totals.protein.quantity,
        carbs: totals.carbs.quantity,
        fat: totals.fat.quantity,
        fiber: Some(totals.fiber.quantity),
        sugar: Some(totals.sugar.quantity),
        sodium: Some(totals.sodium.quantity),
        source: NutritionSource::Edamam,
    }
}

pub struct NutritionAnalyzer {
    client: EdamamClient,
}

impl NutritionAnalyzer {
    pub fn new(client: EdamamClient) -> Self {
        Self { client }
    }

    /// External analysis only; errors carry the reason the call was unusable.
    pub async fn analyze_remote(
        &self,
        title: &str,
        ingredients: &[Ingredient],
    ) -> Result<NutritionRecord, NutritionApiError> {
        let request = NutritionDetailsRequest {
            title: title.to_string(),
            ingr: ingredients.iter().map(Ingredient::nutrition_line).collect(),
        };
        let response = self.client.nutrition_details(&request).await?;
        Ok(record_from_response(response))
    }

    /// Remote analysis when credentials are configured, keyword estimate
    /// otherwise or when the remote call fails.
    pub async fn analyze_recipe(&self, title: &str, ingredients: &[Ingredient]) -> NutritionRecord {
        if self.client.is_configured() {
            match self.analyze_remote(title, ingredients).await {
                Ok(record) => {
                    info!(title, "Nutrition analyzed by external service");
                    return record;
                }
                Err(e) => warn!(error = %e, "Nutrition API call failed, estimating instead"),
            }
        }
        estimate_nutrition(ingredients)
    }
}
