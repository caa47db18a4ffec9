use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api_connection::connection::ApiConnectionError;
use crate::api_connection::endpoints::{ChatCompletionRequest, ChatMessage, Provider};
use crate::cooking_time::predict_time;
use crate::recipe::{lenient_difficulty, Difficulty, GeneratedRecipe, GenerationSource, Ingredient};

const SYSTEM_PROMPT: &str =
    "You are a creative chef that generates practical, delicious recipes. Always respond with valid JSON.";
const TEMPERATURE: f32 = 0.7;
const MAX_TOKENS: u32 = 800;

const RESPONSE_TEMPLATE: &str = r#"Please provide the response in this exact JSON format:
{
    "title": "Creative recipe name",
    "ingredients": [
        {"name": "ingredient1", "amount": "quantity and unit"},
        {"name": "ingredient2", "amount": "quantity and unit"}
    ],
    "instructions": ["Step 1...", "Step 2..."],
    "cooking_time": 30,
    "difficulty": "easy/medium/hard",
    "servings": 2,
    "tips": "Helpful cooking tips",
    "dietary_tags": ["tag1", "tag2"]
}

Make sure the recipe is practical and uses common cooking techniques.
Include the original ingredients in the recipe."#;

const FALLBACK_COOKING_TIME: u32 = 25;
const DEFAULT_SERVINGS: u32 = 2;
const FALLBACK_TIPS: &str = "Adjust spices according to your taste preference!";
const FALLBACK_TAG: &str = "custom-recipe";

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Language model call failed: {0}")]
    Api(#[from] ApiConnectionError),
    #[error("Language model returned no content")]
    EmptyContent,
    #[error("No JSON object found in language model response")]
    NoJsonObject,
    #[error("Malformed recipe JSON: {0}")]
    Malformed(#[from] serde_json::Error),
}

fn default_servings() -> u32 {
    DEFAULT_SERVINGS
}

/// Accepts integral or fractional minutes; anything else counts as absent.
fn lenient_minutes<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| {
        value
            .as_u64()
            .or_else(|| value.as_f64().filter(|v| *v >= 0.0).map(|v| v as u64))
            .map(|v| v.min(u32::MAX as u64) as u32)
    }))
}

/// Numbers, or strings with a leading count such as "2-3". Zero and anything
/// unreadable fall back to the default.
fn lenient_servings<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    let servings = match raw {
        Some(Value::Number(number)) => number
            .as_u64()
            .or_else(|| number.as_f64().filter(|v| *v >= 0.0).map(|v| v as u64))
            .map(|v| v.min(u32::MAX as u64) as u32),
        Some(Value::String(text)) => {
            let digits: String = text
                .trim()
                .chars()
                .take_while(|c| c.is_ascii_digit())
                .collect();
            digits.parse().ok()
        }
        _ => None,
    };
    Ok(servings.filter(|n| *n > 0).unwrap_or(DEFAULT_SERVINGS))
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

/// A list of strings, a single string, or null.
fn lenient_strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::Array(items)) => items.iter().filter_map(value_text).collect(),
        Some(other) => value_text(&other).into_iter().collect(),
        None => Vec::new(),
    })
}

/// Tips arrive as one string, a list of strings, or not at all.
fn lenient_tips<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_strings(deserializer).map(|tips| tips.join(" "))
}

/// Keeps entries that are a non-empty string or an object with a string
/// `name`; everything else is dropped.
fn lenient_ingredients<'de, D>(deserializer: D) -> Result<Vec<Ingredient>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::Array(entries)) => entries.iter().filter_map(model_ingredient).collect(),
        _ => Vec::new(),
    })
}

fn model_ingredient(entry: &Value) -> Option<Ingredient> {
    match entry {
        Value::String(text) if !text.trim().is_empty() => Some(Ingredient::Plain(text.clone())),
        Value::Object(fields) => {
            let name = fields
                .get("name")
                .and_then(Value::as_str)
                .filter(|name| !name.trim().is_empty())?;
            Some(Ingredient::Structured {
                name: name.to_string(),
                amount: fields.get("amount").and_then(value_text),
            })
        }
        _ => None,
    }
}

/// Shape the model is asked to answer with. Only `title` is required; the
/// other fields tolerate the usual deviations in type.
#[derive(Debug, Deserialize)]
struct ModelRecipe {
    title: String,
    #[serde(default, deserialize_with = "lenient_ingredients")]
    ingredients: Vec<Ingredient>,
    #[serde(default, deserialize_with = "lenient_strings")]
    instructions: Vec<String>,
    #[serde(default, deserialize_with = "lenient_minutes")]
    cooking_time: Option<u32>,
    #[serde(default, deserialize_with = "lenient_difficulty")]
    difficulty: Difficulty,
    #[serde(default = "default_servings", deserialize_with = "lenient_servings")]
    servings: u32,
    #[serde(default, deserialize_with = "lenient_tips")]
    tips: String,
    #[serde(default, deserialize_with = "lenient_strings")]
    dietary_tags: Vec<String>,
}

pub(crate) fn build_prompt(ingredients: &[String], diet: &str, cuisine: &str) -> String {
    let mut prompt = format!(
        "Create a detailed, practical recipe using primarily these ingredients: {}.\n",
        ingredients.join(", ")
    );
    if !diet.trim().is_empty() {
        prompt.push_str(&format!("Dietary restrictions: {}. ", diet.trim()));
    }
    if !cuisine.trim().is_empty() {
        prompt.push_str(&format!("Cuisine style: {}. ", cuisine.trim()));
    }
    prompt.push('\n');
    prompt.push_str(RESPONSE_TEMPLATE);
    prompt
}

/// Slice from the first `{` to the last `}`.
fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

/// Turns the model's text into a recipe, keeping every requested ingredient.
pub(crate) fn parse_model_response(
    text: &str,
    requested: &[String],
    cuisine: &str,
) -> Result<GeneratedRecipe, GenerationError> {
    let json = extract_json_object(text).ok_or(GenerationError::NoJsonObject)?;
    let parsed: ModelRecipe = serde_json::from_str(json)?;

    let mut ingredients: Vec<Ingredient> = parsed
        .ingredients
        .iter()
        .map(|ingredient| Ingredient::Plain(ingredient.display()))
        .collect();
    for original in requested {
        let present = ingredients
            .iter()
            .any(|ingredient| ingredient.name().to_lowercase() == original.to_lowercase());
        if !present {
            ingredients.push(Ingredient::Plain(original.clone()));
        }
    }

    let cooking_time = parsed.cooking_time.unwrap_or_else(|| {
        let names: Vec<&str> = ingredients.iter().map(Ingredient::name).collect();
        predict_time(&names, Some(parsed.difficulty))
    });

    Ok(GeneratedRecipe {
        title: parsed.title,
        ingredients,
        instructions: parsed.instructions,
        cooking_time,
        difficulty: parsed.difficulty,
        servings: parsed.servings,
        tips: parsed.tips,
        dietary_tags: parsed.dietary_tags,
        cuisine: non_blank(cuisine),
        source: GenerationSource::Gpt,
        nutrition: None,
    })
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// First letter upper, the rest lower.
fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Upper-cases every letter that follows a non-letter, lower-cases the rest.
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for c in text.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

/// Deterministic templated recipe used whenever the model path is unavailable.
pub fn fallback_recipe(ingredients: &[String], cuisine: &str) -> GeneratedRecipe {
    let cuisine_prefix = match non_blank(cuisine) {
        Some(cuisine) => format!("{} ", capitalize(&cuisine)),
        None => String::new(),
    };
    let lead: Vec<&str> = ingredients.iter().take(2).map(String::as_str).collect();
    let title = format!("{}{} Special", cuisine_prefix, title_case(&lead.join(" ")));

    let first = ingredients
        .first()
        .map(String::as_str)
        .unwrap_or("main ingredient");
    let instructions = vec![
        format!("Prepare all your ingredients: {}", ingredients.join(", ")),
        "Heat oil in a pan over medium heat".to_string(),
        format!("Start by cooking {}", first),
        "Add remaining ingredients and cook until done".to_string(),
        "Season to taste and serve hot".to_string(),
    ];

    GeneratedRecipe {
        title,
        ingredients: ingredients
            .iter()
            .map(|name| Ingredient::structured(name.as_str(), "as needed"))
            .collect(),
        instructions,
        cooking_time: FALLBACK_COOKING_TIME,
        difficulty: Difficulty::Easy,
        servings: DEFAULT_SERVINGS,
        tips: FALLBACK_TIPS.to_string(),
        dietary_tags: vec![FALLBACK_TAG.to_string()],
        cuisine: non_blank(cuisine),
        source: GenerationSource::Fallback,
        nutrition: None,
    }
}

pub struct RecipeGenerator {
    provider: Provider,
}

impl RecipeGenerator {
    pub fn new(provider: Provider) -> Self {
        if !provider.has_credentials() {
            info!("Language model API key not configured, recipes will use the fallback template");
        }
        Self { provider }
    }

    pub fn is_configured(&self) -> bool {
        self.provider.has_credentials()
    }

    /// Model-backed generation; every failure is returned to the caller.
    pub async fn try_generate(
        &self,
        ingredients: &[String],
        diet: &str,
        cuisine: &str,
    ) -> Result<GeneratedRecipe, GenerationError> {
        let request = ChatCompletionRequest {
            model: self.provider.model().to_string(),
            messages: vec![
                ChatMessage::system(SYSTEM_PROMPT),
                ChatMessage::user(build_prompt(ingredients, diet, cuisine)),
            ],
            temperature: Some(TEMPERATURE),
            max_tokens: Some(MAX_TOKENS),
        };

        let response = self.provider.call_chat_completion(request).await?;
        let content = response
            .first_content()
            .map(str::trim)
            .filter(|content| !content.is_empty())
            .ok_or(GenerationError::EmptyContent)?;
        debug!(chars = content.len(), "Received recipe from language model");

        parse_model_response(content, ingredients, cuisine)
    }

    /// Never fails: falls back to the template when the model is not
    /// configured or anything along the model path goes wrong.
    pub async fn generate_recipe(
        &self,
        ingredients: &[String],
        diet: &str,
        cuisine: &str,
    ) -> GeneratedRecipe {
        if self.is_configured() {
            match self.try_generate(ingredients, diet, cuisine).await {
                Ok(recipe) => {
                    info!(title = %recipe.title, "Generated recipe with language model");
                    return recipe;
                }
                Err(e) => warn!(error = %e, "Recipe generation failed, using fallback"),
            }
        }
        fallback_recipe(ingredients, cuisine)
    }
}
