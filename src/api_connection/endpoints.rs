use serde::{Deserialize, Serialize};

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_EDAMAM_URL: &str = "https://api.edamam.com/api/nutrition-details";

#[derive(Clone, Debug)]
pub enum Provider {
    /// Any OpenAI-compatible chat completion endpoint.
    OpenAi {
        api_key: Option<String>,
        base_url: String,
        model: String,
    },
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatCompletionResponseMessage {
    pub role: String,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatCompletionChoice {
    pub message: ChatCompletionResponseMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
    #[serde(default)]
    pub index: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatCompletionUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: Option<u32>,
    pub total_tokens: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub model: String,
    pub choices: Vec<ChatCompletionChoice>,
    #[serde(default)]
    pub usage: Option<ChatCompletionUsage>,
}

impl ChatCompletionResponse {
    /// Text of the first choice, if any.
    pub fn first_content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
    }
}

/// Body of a nutrition-details request.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct NutritionDetailsRequest {
    pub title: String,
    pub ingr: Vec<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct NutrientQuantity {
    #[serde(default)]
    pub quantity: f64,
}

/// Nutrient totals keyed by the service's nutrient codes.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct TotalNutrients {
    #[serde(default, rename = "PROCNT")]
    pub protein: NutrientQuantity,
    #[serde(default, rename = "CHOCDF")]
    pub carbs: NutrientQuantity,
    #[serde(default, rename = "FAT")]
    pub fat: NutrientQuantity,
    #[serde(default, rename = "FIBTG")]
    pub fiber: NutrientQuantity,
    #[serde(default, rename = "SUGAR")]
    pub sugar: NutrientQuantity,
    #[serde(default, rename = "NA")]
    pub sodium: NutrientQuantity,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NutritionDetailsResponse {
    #[serde(default)]
    pub calories: f64,
    #[serde(default, rename = "totalNutrients")]
    pub total_nutrients: TotalNutrients,
}
