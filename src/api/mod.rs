pub mod error;
pub mod handlers;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::warn;

use crate::config::AppConfig;
pub use error::ApiError;
pub use handlers::AppState;

/// Permissive in development; production only admits the configured origin.
pub fn cors_layer(config: &AppConfig) -> CorsLayer {
    if !config.production {
        return CorsLayer::permissive();
    }
    let restricted = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);
    match config.cors_origin.as_deref().map(HeaderValue::from_str) {
        Some(Ok(origin)) => restricted.allow_origin(origin),
        Some(Err(e)) => {
            warn!(error = %e, "Invalid CORS_ORIGIN, cross-origin requests disabled");
            restricted
        }
        None => {
            warn!("CORS_ORIGIN not set in production, cross-origin requests disabled");
            restricted
        }
    }
}

pub fn router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route(
            "/api/recipes",
            get(handlers::list_recipes).post(handlers::search_recipes),
        )
        .route("/api/generate-recipe", post(handlers::generate_recipe))
        .route("/api/analyze-nutrition", post(handlers::analyze_nutrition))
        .route("/api/meal-plan", post(handlers::meal_plan))
        .route("/api/clusters", get(handlers::clusters))
        .route("/api/save-recipe", post(handlers::save_recipe))
        .route("/api/health", get(handlers::health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
