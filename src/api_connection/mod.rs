pub mod connection;
pub mod edamam;
pub mod endpoints;

pub use connection::ApiConnectionError;
pub use edamam::{EdamamClient, EdamamCredentials, NutritionApiError};
pub use endpoints::{ChatCompletionRequest, ChatMessage, Provider};
