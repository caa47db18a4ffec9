use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::error::ApiError;
use crate::recipe::{Ingredient, NewRecipe};
use crate::service::PantryService;

pub type AppState = Arc<PantryService>;

const DEFAULT_TOP_N: usize = 5;
const DEFAULT_NUTRITION_TITLE: &str = "Generated Recipe";

fn default_top_n() -> usize {
    DEFAULT_TOP_N
}

fn default_nutrition_title() -> String {
    DEFAULT_NUTRITION_TITLE.to_string()
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub diet_filter: Option<String>,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub diet: Option<String>,
    #[serde(default)]
    pub cuisine: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NutritionRequest {
    #[serde(default = "default_nutrition_title")]
    pub title: String,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
}

#[derive(Debug, Deserialize)]
pub struct MealPlanRequest {
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub diet_preference: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SaveRecipeRequest {
    #[serde(default)]
    pub recipe: Option<Value>,
}

/// GET /
pub async fn index() -> impl IntoResponse {
    Json(json!({
        "message": "PantryAI API is running!",
        "endpoints": {
            "GET /api/recipes": "Get all recipes",
            "POST /api/recipes": "Find recipes by ingredients",
            "POST /api/generate-recipe": "Generate new recipe with AI",
            "POST /api/analyze-nutrition": "Analyze recipe nutrition",
            "POST /api/meal-plan": "Generate weekly meal plan",
            "GET /api/clusters": "Get recipe clusters",
            "POST /api/save-recipe": "Save a recipe",
            "GET /api/health": "Health check"
        }
    }))
}

/// GET /api/recipes
pub async fn list_recipes(State(service): State<AppState>) -> impl IntoResponse {
    let recipes = service.list_recipes();
    Json(json!({
        "recipes": recipes,
        "total": recipes.len(),
    }))
}

/// POST /api/recipes
pub async fn search_recipes(
    State(service): State<AppState>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;
    if request.ingredients.is_empty() {
        return Err(ApiError::NoIngredients);
    }
    info!(
        ingredients = ?request.ingredients,
        diet = ?request.diet_filter,
        "Received search request"
    );

    let recipes = service.search(
        &request.ingredients,
        request.top_n,
        request.diet_filter.as_deref(),
    );
    Ok(Json(json!({
        "count": recipes.len(),
        "recipes": recipes,
        "ingredients_searched": request.ingredients,
    })))
}

/// POST /api/generate-recipe
pub async fn generate_recipe(
    State(service): State<AppState>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;
    if request.ingredients.is_empty() {
        return Err(ApiError::NoIngredients);
    }

    let recipe = service
        .generate_recipe(
            &request.ingredients,
            request.diet.as_deref().unwrap_or_default(),
            request.cuisine.as_deref().unwrap_or_default(),
        )
        .await;
    Ok(Json(json!({
        "recipe": recipe,
        "ingredients_used": request.ingredients,
    })))
}

/// POST /api/analyze-nutrition
pub async fn analyze_nutrition(
    State(service): State<AppState>,
    payload: Result<Json<NutritionRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;
    let nutrition = service
        .analyze_nutrition(&request.title, &request.ingredients)
        .await;
    Ok(Json(json!({
        "nutrition": nutrition,
        "recipe_title": request.title,
    })))
}

/// POST /api/meal-plan
pub async fn meal_plan(
    State(service): State<AppState>,
    payload: Result<Json<MealPlanRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;
    if request.ingredients.is_empty() {
        return Err(ApiError::NoIngredients);
    }
    let plan = service.meal_plan(&request.ingredients, request.diet_preference.as_deref());
    Ok(Json(plan))
}

/// GET /api/clusters
///
/// Too few recipes is reported in the body with a 200.
pub async fn clusters(State(service): State<AppState>) -> impl IntoResponse {
    match service.clusters() {
        Ok(clusters) => Json(json!(clusters)),
        Err(e) => Json(json!({ "error": e.to_string() })),
    }
}

/// POST /api/save-recipe
pub async fn save_recipe(
    State(service): State<AppState>,
    payload: Result<Json<SaveRecipeRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;
    let raw = request
        .recipe
        .filter(|value| !value.is_null())
        .ok_or(ApiError::NoRecipe)?;
    let recipe: NewRecipe = serde_json::from_value(raw)?;

    let saved = service.save_recipe(recipe).await?;
    Ok(Json(json!({
        "message": "Recipe saved successfully",
        "recipe": saved,
    })))
}

/// GET /api/health
pub async fn health(State(service): State<AppState>) -> impl IntoResponse {
    Json(service.health())
}
