use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::api_connection::{EdamamClient, NutritionApiError, Provider};
use crate::config::AppConfig;
use crate::generator::RecipeGenerator;
use crate::meal_planner::{MealPlanner, WeeklyPlan};
use crate::nutrition::NutritionAnalyzer;
use crate::recipe::{DietFilter, GeneratedRecipe, Ingredient, NewRecipe, NutritionRecord, Recipe, RecipeMatch};
use crate::search::cluster::ClusterError;
use crate::search::matcher::RecipeMatcher;
use crate::store::{RecipeStore, StoreError};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Health {
    pub status: &'static str,
    pub recipes_loaded: usize,
}

/// Everything the API needs, built once at startup and shared read-only.
pub struct PantryService {
    matcher: Arc<RecipeMatcher>,
    store: RecipeStore,
    generator: RecipeGenerator,
    nutrition: NutritionAnalyzer,
    planner: MealPlanner,
}

impl PantryService {
    pub fn new(
        corpus: Vec<Recipe>,
        store: RecipeStore,
        generator: RecipeGenerator,
        nutrition: NutritionAnalyzer,
    ) -> Self {
        let matcher = Arc::new(RecipeMatcher::new(corpus));
        let planner = MealPlanner::new(Arc::clone(&matcher));
        Self {
            matcher,
            store,
            generator,
            nutrition,
            planner,
        }
    }

    /// Loads the corpus and wires the external clients from configuration.
    pub async fn from_config(config: &AppConfig) -> Result<Self, NutritionApiError> {
        let store = RecipeStore::new(config.recipes_path.clone());
        let corpus = store.load().await;

        let provider = Provider::openai(
            config.openai_api_key.clone(),
            config.openai_base_url.clone(),
            config.openai_model.clone(),
        );
        let edamam = EdamamClient::new(
            config.edamam_credentials(),
            config.edamam_url.clone(),
            config.nutrition_timeout,
        )?;

        let service = Self::new(
            corpus,
            store,
            RecipeGenerator::new(provider),
            NutritionAnalyzer::new(edamam),
        );
        info!(recipes = service.matcher.corpus().len(), "All services initialized");
        Ok(service)
    }

    pub fn list_recipes(&self) -> &[Recipe] {
        self.matcher.corpus()
    }

    /// Unknown diet names are ignored.
    pub fn search<S: AsRef<str>>(
        &self,
        ingredients: &[S],
        top_n: usize,
        diet: Option<&str>,
    ) -> Vec<RecipeMatch> {
        let diet = diet.and_then(DietFilter::parse);
        self.matcher.find_similar_recipes(ingredients, top_n, diet)
    }

    /// Generated recipe with its nutrition attached.
    pub async fn generate_recipe(
        &self,
        ingredients: &[String],
        diet: &str,
        cuisine: &str,
    ) -> GeneratedRecipe {
        let mut recipe = self.generator.generate_recipe(ingredients, diet, cuisine).await;
        let nutrition = self
            .nutrition
            .analyze_recipe(&recipe.title, &recipe.ingredients)
            .await;
        recipe.nutrition = Some(nutrition);
        recipe
    }

    pub async fn analyze_nutrition(&self, title: &str, ingredients: &[Ingredient]) -> NutritionRecord {
        self.nutrition.analyze_recipe(title, ingredients).await
    }

    pub fn meal_plan<S: AsRef<str>>(&self, ingredients: &[S], diet: Option<&str>) -> WeeklyPlan {
        let diet = diet.and_then(DietFilter::parse);
        self.planner.generate_weekly_plan(ingredients, diet)
    }

    pub fn clusters(&self) -> Result<BTreeMap<usize, Vec<Recipe>>, ClusterError> {
        self.matcher.get_clusters()
    }

    /// Persists the recipe. The in-memory corpus keeps serving the startup
    /// snapshot until the next restart.
    pub async fn save_recipe(&self, recipe: NewRecipe) -> Result<Recipe, StoreError> {
        let saved = self.store.save(recipe).await?;
        info!(id = saved.id, title = %saved.title, "Recipe saved");
        Ok(saved)
    }

    pub fn health(&self) -> Health {
        Health {
            status: "healthy",
            recipes_loaded: self.matcher.corpus().len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api_connection::edamam::DEFAULT_TIMEOUT;
    use crate::recipe::{GenerationSource, NutritionSource};
    use crate::store::sample_recipes;
    use tempfile::TempDir;

    fn offline_service(dir: &TempDir, corpus: Vec<Recipe>) -> PantryService {
        PantryService::new(
            corpus,
            RecipeStore::new(dir.path().join("recipes.json")),
            RecipeGenerator::new(Provider::openai(None, None, None)),
            NutritionAnalyzer::new(EdamamClient::new(None, None, DEFAULT_TIMEOUT).unwrap()),
        )
    }

    #[tokio::test]
    async fn test_generate_attaches_estimated_nutrition() {
        let dir = TempDir::new().unwrap();
        let service = offline_service(&dir, sample_recipes());
        let ingredients = vec!["tofu".to_string(), "broccoli".to_string()];

        let recipe = service.generate_recipe(&ingredients, "vegan", "asian").await;
        assert_eq!(recipe.source, GenerationSource::Fallback);
        let nutrition = recipe.nutrition.unwrap();
        assert_eq!(nutrition.source, NutritionSource::Estimated);
        // tofu 76 + broccoli 34, two matches so no baseline
        assert_eq!(nutrition.calories, 110.0);
    }

    #[tokio::test]
    async fn test_saved_recipe_not_visible_until_restart() {
        let dir = TempDir::new().unwrap();
        let service = offline_service(&dir, sample_recipes());
        let before = service.list_recipes().len();

        let saved = service
            .save_recipe(NewRecipe {
                title: "Toast".to_string(),
                ingredients: vec!["bread".into()],
                instructions: vec![],
                cooking_time: 5,
                difficulty: Default::default(),
                dietary_tags: vec![],
                cuisine: None,
            })
            .await
            .unwrap();
        assert_eq!(saved.id, 1);
        assert_eq!(service.list_recipes().len(), before);
        assert_eq!(service.health().recipes_loaded, before);
    }

    #[test]
    fn test_unknown_diet_is_ignored() {
        let dir = TempDir::new().unwrap();
        let service = offline_service(&dir, sample_recipes());
        let unfiltered = service.search(&["chicken"], 5, None);
        let keto = service.search(&["chicken"], 5, Some("keto"));
        assert_eq!(unfiltered, keto);

        let vegetarian = service.search(&["chicken"], 5, Some("vegetarian"));
        assert!(vegetarian
            .iter()
            .all(|m| m.recipe.title != "Classic Chicken Curry"));
    }

    #[test]
    fn test_clusters_need_three_recipes() {
        let dir = TempDir::new().unwrap();
        let service = offline_service(&dir, sample_recipes());
        assert!(matches!(
            service.clusters(),
            Err(ClusterError::InsufficientData { have: 2, need: 3 })
        ));
    }
}
