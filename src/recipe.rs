use serde::{Deserialize, Deserializer, Serialize};

/// A single ingredient entry. Stored recipes mostly hold plain strings, the
/// language model answers with `{name, amount}` objects, and both shapes flow
/// through the same code paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Ingredient {
    Plain(String),
    Structured {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        amount: Option<String>,
    },
}

impl Ingredient {
    pub fn structured(name: impl Into<String>, amount: impl Into<String>) -> Self {
        Ingredient::Structured {
            name: name.into(),
            amount: Some(amount.into()),
        }
    }

    /// The ingredient's name, without any quantity.
    pub fn name(&self) -> &str {
        match self {
            Ingredient::Plain(text) => text,
            Ingredient::Structured { name, .. } => name,
        }
    }

    fn amount(&self) -> Option<&str> {
        match self {
            Ingredient::Structured {
                amount: Some(amount),
                ..
            } if !amount.trim().is_empty() => Some(amount),
            _ => None,
        }
    }

    /// "amount name" for structured entries with an amount, the name otherwise.
    pub fn display(&self) -> String {
        match self.amount() {
            Some(amount) => format!("{} {}", amount, self.name()),
            None => self.name().to_string(),
        }
    }

    /// Every value of the entry joined by a space, lowercased. This is the
    /// text the vectorizer and the diet filter look at.
    pub fn search_text(&self) -> String {
        match self {
            Ingredient::Plain(text) => text.to_lowercase(),
            Ingredient::Structured { name, amount } => match amount {
                Some(amount) => format!("{} {}", name, amount).to_lowercase(),
                None => name.to_lowercase(),
            },
        }
    }

    /// Ingredient line in the "<amount> <name>" form nutrition services expect.
    pub fn nutrition_line(&self) -> String {
        format!("{} {}", self.amount().unwrap_or("1 portion"), self.name())
    }
}

impl From<&str> for Ingredient {
    fn from(value: &str) -> Self {
        Ingredient::Plain(value.to_string())
    }
}

impl From<String> for Ingredient {
    fn from(value: String) -> Self {
        Ingredient::Plain(value)
    }
}

/// Concatenated lowercase text of a whole ingredient list.
pub fn ingredients_text(ingredients: &[Ingredient]) -> String {
    ingredients
        .iter()
        .map(Ingredient::search_text)
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "medium" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Time multiplier in percent.
    pub fn time_percent(self) -> u32 {
        match self {
            Difficulty::Easy => 80,
            Difficulty::Medium => 100,
            Difficulty::Hard => 130,
        }
    }
}

/// Accepts any string (or null) and maps unrecognized values to `Medium`.
pub(crate) fn lenient_difficulty<'de, D>(deserializer: D) -> Result<Difficulty, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .as_deref()
        .and_then(Difficulty::parse)
        .unwrap_or_default())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DietFilter {
    Vegetarian,
    Vegan,
    GlutenFree,
}

impl DietFilter {
    /// Unknown diets yield `None`, which callers treat as "no filter".
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "vegetarian" => Some(DietFilter::Vegetarian),
            "vegan" => Some(DietFilter::Vegan),
            "gluten-free" => Some(DietFilter::GlutenFree),
            _ => None,
        }
    }

    pub fn forbidden_keywords(self) -> &'static [&'static str] {
        match self {
            DietFilter::Vegetarian => &[
                "chicken", "beef", "pork", "fish", "mutton", "lamb", "meat", "seafood",
            ],
            DietFilter::Vegan => &[
                "chicken", "beef", "pork", "fish", "mutton", "lamb", "meat", "seafood", "eggs",
                "milk", "cheese", "butter", "cream", "yogurt", "ghee",
            ],
            DietFilter::GlutenFree => &["wheat", "bread", "pasta", "flour", "maida", "semolina"],
        }
    }

    /// Substring match on purpose: "butternut" trips the "butter" keyword.
    pub fn allows(self, ingredients: &[Ingredient]) -> bool {
        let text = ingredients_text(ingredients);
        !self
            .forbidden_keywords()
            .iter()
            .any(|keyword| text.contains(keyword))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    #[serde(default)]
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub instructions: Vec<String>,
    #[serde(default = "default_cooking_time")]
    pub cooking_time: u32,
    #[serde(default, deserialize_with = "lenient_difficulty")]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub dietary_tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cuisine: Option<String>,
}

pub(crate) fn default_cooking_time() -> u32 {
    30
}

/// A recipe as returned by the matcher, with its cosine score when it came
/// out of the ranking step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeMatch {
    #[serde(flatten)]
    pub recipe: Recipe,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity_score: Option<f64>,
}

impl RecipeMatch {
    pub fn unscored(recipe: Recipe) -> Self {
        Self {
            recipe,
            similarity_score: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NutritionSource {
    Edamam,
    Estimated,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionRecord {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fiber: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sugar: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sodium: Option<f64>,
    pub source: NutritionSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationSource {
    Gpt,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedRecipe {
    pub title: String,
    pub ingredients: Vec<Ingredient>,
    pub instructions: Vec<String>,
    pub cooking_time: u32,
    pub difficulty: Difficulty,
    pub servings: u32,
    pub tips: String,
    pub dietary_tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cuisine: Option<String>,
    pub source: GenerationSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutrition: Option<NutritionRecord>,
}

/// A recipe submitted for saving. Accepts both stored and generated shapes;
/// missing fields take the store defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewRecipe {
    pub title: String,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub instructions: Vec<String>,
    #[serde(default = "default_cooking_time")]
    pub cooking_time: u32,
    #[serde(default, deserialize_with = "lenient_difficulty")]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub dietary_tags: Vec<String>,
    #[serde(default)]
    pub cuisine: Option<String>,
}

impl NewRecipe {
    /// Persisted shape: structured ingredients are flattened to their names.
    pub fn into_recipe(self, id: u64) -> Recipe {
        Recipe {
            id,
            title: self.title,
            ingredients: self
                .ingredients
                .iter()
                .map(|ingredient| Ingredient::Plain(ingredient.name().to_string()))
                .collect(),
            instructions: self.instructions,
            cooking_time: self.cooking_time,
            difficulty: self.difficulty,
            dietary_tags: self.dietary_tags,
            cuisine: self.cuisine,
        }
    }
}

impl From<GeneratedRecipe> for NewRecipe {
    fn from(generated: GeneratedRecipe) -> Self {
        Self {
            title: generated.title,
            ingredients: generated.ingredients,
            instructions: generated.instructions,
            cooking_time: generated.cooking_time,
            difficulty: generated.difficulty,
            dietary_tags: generated.dietary_tags,
            cuisine: generated.cuisine,
        }
    }
}
