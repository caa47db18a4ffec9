use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs;
use tracing::{error, info, warn};

use crate::recipe::{Difficulty, Ingredient, NewRecipe, Recipe};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Recipe file not found at: {0:?}")]
    NotFound(PathBuf),
    #[error("Failed to access recipe file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Recipe file {path:?} is not a valid recipe array: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Flat JSON file holding every recipe as one array.
///
/// Saves rewrite the whole file without any locking: two concurrent saves can
/// lose one of the records or hand out the same id.
#[derive(Debug, Clone)]
pub struct RecipeStore {
    path: PathBuf,
}

impl RecipeStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn try_load(&self) -> Result<Vec<Recipe>, StoreError> {
        let content = fs::read_to_string(&self.path).await.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                StoreError::NotFound(self.path.clone())
            } else {
                StoreError::Io {
                    path: self.path.clone(),
                    source: e,
                }
            }
        })?;
        serde_json::from_str(&content).map_err(|e| StoreError::Malformed {
            path: self.path.clone(),
            source: e,
        })
    }

    /// Startup load. A missing file yields the built-in samples, any other
    /// failure an empty corpus.
    pub async fn load(&self) -> Vec<Recipe> {
        match self.try_load().await {
            Ok(recipes) => {
                info!(count = recipes.len(), path = ?self.path, "Loaded recipes from file");
                recipes
            }
            Err(StoreError::NotFound(path)) => {
                warn!(?path, "Recipe file not found, using sample recipes");
                sample_recipes()
            }
            Err(e) => {
                error!(error = %e, "Error loading recipes");
                Vec::new()
            }
        }
    }

    /// Appends `new_recipe` with `id = max(existing) + 1` and rewrites the file.
    pub async fn save(&self, new_recipe: NewRecipe) -> Result<Recipe, StoreError> {
        let mut recipes = match self.try_load().await {
            Ok(recipes) => recipes,
            Err(StoreError::NotFound(_)) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "Error reading recipe file, starting from an empty list");
                Vec::new()
            }
        };

        let id = next_id(&recipes);
        let recipe = new_recipe.into_recipe(id);
        recipes.push(recipe.clone());

        let json = serde_json::to_string_pretty(&recipes).map_err(|e| StoreError::Malformed {
            path: self.path.clone(),
            source: e,
        })?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(|e| StoreError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        fs::write(&self.path, json).await.map_err(|e| StoreError::Io {
            path: self.path.clone(),
            source: e,
        })?;

        info!(id, "Recipe saved");
        Ok(recipe)
    }
}

fn next_id(recipes: &[Recipe]) -> u64 {
    recipes.iter().map(|r| r.id).max().map_or(1, |max| max + 1)
}

pub fn sample_recipes() -> Vec<Recipe> {
    let plain = |items: &[&str]| items.iter().map(|s| Ingredient::from(*s)).collect();
    let strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
    vec![
        Recipe {
            id: 1,
            title: "Quick Vegetable Stir Fry".to_string(),
            ingredients: plain(&["mixed vegetables", "soy sauce", "garlic", "oil", "rice"]),
            instructions: strings(&[
                "Heat oil in pan",
                "Add garlic and stir-fry",
                "Add vegetables and cook",
                "Add soy sauce",
                "Serve with rice",
            ]),
            cooking_time: 20,
            difficulty: Difficulty::Easy,
            dietary_tags: strings(&["vegetarian", "vegan"]),
            cuisine: Some("asian".to_string()),
        },
        Recipe {
            id: 2,
            title: "Classic Chicken Curry".to_string(),
            ingredients: plain(&["chicken", "onion", "tomatoes", "spices", "oil", "rice"]),
            instructions: strings(&[
                "Heat oil and sauté onions",
                "Add chicken and brown",
                "Add tomatoes and spices",
                "Simmer until cooked",
                "Serve with rice",
            ]),
            cooking_time: 40,
            difficulty: Difficulty::Medium,
            dietary_tags: strings(&["non-vegetarian"]),
            cuisine: Some("indian".to_string()),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    fn new_recipe(title: &str) -> NewRecipe {
        serde_json::from_value(serde_json::json!({
            "title": title,
            "ingredients": ["rice", {"name": "peas", "amount": "1 cup"}],
            "instructions": ["Cook"]
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_missing_file_yields_samples() {
        let dir = TempDir::new().unwrap();
        let store = RecipeStore::new(dir.path().join("recipes.json"));
        let recipes = store.load().await;
        assert_eq!(recipes.len(), 2);
        assert_eq!(recipes[0].title, "Quick Vegetable Stir Fry");
        assert_eq!(recipes[1].title, "Classic Chicken Curry");
    }

    #[tokio::test]
    async fn test_malformed_file_yields_empty_corpus() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{{ not an array").unwrap();
        let store = RecipeStore::new(file.path());
        assert!(matches!(store.try_load().await, Err(StoreError::Malformed { .. })));
        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_save_to_empty_store_assigns_one() {
        let dir = TempDir::new().unwrap();
        let store = RecipeStore::new(dir.path().join("data").join("recipes.json"));
        let saved = store.save(new_recipe("First")).await.unwrap();
        assert_eq!(saved.id, 1);
        assert_eq!(store.try_load().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_save_after_existing_ids_assigns_next() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("recipes.json");
        let existing = serde_json::to_string(&sample_recipes()).unwrap();
        std::fs::write(&path, existing).unwrap();

        let store = RecipeStore::new(&path);
        let saved = store.save(new_recipe("Pea Pilaf")).await.unwrap();
        assert_eq!(saved.id, 3);
        assert_eq!(
            saved.ingredients,
            vec![Ingredient::from("rice"), Ingredient::from("peas")]
        );

        let on_disk = std::fs::read_to_string(&path).unwrap();
        assert!(on_disk.starts_with("[\n  {"), "expected 2-space indentation");
        let reloaded = store.try_load().await.unwrap();
        assert_eq!(reloaded.len(), 3);
        assert_eq!(reloaded[2].title, "Pea Pilaf");
    }

    #[test]
    fn test_next_id_uses_max_not_len() {
        let mut recipes = sample_recipes();
        recipes[0].id = 10;
        assert_eq!(next_id(&recipes), 11);
        assert_eq!(next_id(&[]), 1);
    }
}
