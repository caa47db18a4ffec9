use std::collections::BTreeMap;
use std::sync::Arc;

use rayon::prelude::*;
use thiserror::Error;
use tracing::{info, warn};

use crate::recipe::{ingredients_text, DietFilter, Difficulty, Recipe, RecipeMatch};
use crate::search::cluster::{ClusterError, ClusterIndex};
use crate::search::tfidf::{cosine_similarity, SparseVector, TfidfVectorizer, VectorizeError};

const FALLBACK_COUNT: usize = 3;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MatchError {
    #[error("No recipes available for matching")]
    EmptyCorpus,
    #[error("Vector space unavailable: {0}")]
    VectorizerUnavailable(#[from] VectorizeError),
}

/// The fitted vectorizer plus one vector per corpus recipe, aligned by index.
#[derive(Debug, Clone)]
pub struct VectorSpace {
    vectorizer: TfidfVectorizer,
    vectors: Vec<SparseVector>,
}

impl VectorSpace {
    pub fn fit(corpus: &[Recipe]) -> Result<Self, VectorizeError> {
        let documents: Vec<String> = corpus
            .iter()
            .map(|recipe| ingredients_text(&recipe.ingredients))
            .collect();
        let (vectorizer, vectors) = TfidfVectorizer::fit_transform(&documents)?;
        Ok(Self {
            vectorizer,
            vectors,
        })
    }

    pub fn vectorizer(&self) -> &TfidfVectorizer {
        &self.vectorizer
    }

    pub fn vectors(&self) -> &[SparseVector] {
        &self.vectors
    }
}

/// Trims, lowercases and collapses whitespace runs.
pub fn preprocess_ingredient(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Ranks the corpus against a user's ingredients.
///
/// The corpus, its vectors and the cluster labels are built once and never
/// mutated; recipes saved afterwards are invisible here until the next start.
#[derive(Debug)]
pub struct RecipeMatcher {
    corpus: Arc<Vec<Recipe>>,
    space: Result<VectorSpace, VectorizeError>,
    clusters: Result<ClusterIndex, ClusterError>,
}

impl RecipeMatcher {
    pub fn new(corpus: Vec<Recipe>) -> Self {
        let space = VectorSpace::fit(&corpus);
        match &space {
            Ok(space) => info!(
                recipes = corpus.len(),
                vocabulary = space.vectorizer().dimension(),
                "TF-IDF vectors created"
            ),
            Err(e) => warn!(error = %e, "TF-IDF fitting skipped"),
        }

        let clusters = match &space {
            Ok(space) => ClusterIndex::build(space.vectors(), space.vectorizer().dimension()),
            Err(_) => Err(ClusterError::VectorsUnavailable),
        };
        if let Err(e) = &clusters {
            info!(reason = %e, "Clustering skipped");
        }

        Self {
            corpus: Arc::new(corpus),
            space,
            clusters,
        }
    }

    pub fn corpus(&self) -> &[Recipe] {
        &self.corpus
    }

    /// Ranked matches or the reason ranking is impossible.
    pub fn try_find_similar_recipes<S: AsRef<str>>(
        &self,
        user_ingredients: &[S],
        top_n: usize,
        diet_filter: Option<DietFilter>,
    ) -> Result<Vec<RecipeMatch>, MatchError> {
        if self.corpus.is_empty() {
            return Err(MatchError::EmptyCorpus);
        }
        let space = self.space.as_ref().map_err(|e| MatchError::from(e.clone()))?;

        let query_text = user_ingredients
            .iter()
            .map(|i| preprocess_ingredient(i.as_ref()))
            .collect::<Vec<_>>()
            .join(" ");
        let query = space.vectorizer.transform(&query_text);

        let scores: Vec<f64> = space
            .vectors
            .par_iter()
            .map(|vector| cosine_similarity(&query, vector))
            .collect();

        let mut ranked: Vec<usize> = (0..scores.len()).collect();
        ranked.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]).then(a.cmp(&b)));
        ranked.truncate(top_n);

        let mut results: Vec<RecipeMatch> = ranked
            .into_iter()
            .filter_map(|idx| {
                self.corpus.get(idx).map(|recipe| RecipeMatch {
                    recipe: recipe.clone(),
                    similarity_score: Some(scores[idx]),
                })
            })
            .collect();

        if let Some(diet) = diet_filter {
            results.retain(|m| diet.allows(&m.recipe.ingredients));
        }
        info!(count = results.len(), "Found matching recipes");
        Ok(results)
    }

    /// Never fails: ranking problems degrade to the head of the corpus, or to
    /// a single placeholder recipe when the corpus is empty.
    pub fn find_similar_recipes<S: AsRef<str>>(
        &self,
        user_ingredients: &[S],
        top_n: usize,
        diet_filter: Option<DietFilter>,
    ) -> Vec<RecipeMatch> {
        match self.try_find_similar_recipes(user_ingredients, top_n, diet_filter) {
            Ok(results) => results,
            Err(e) => {
                warn!(error = %e, "Recipe matching failed, using fallback recipes");
                self.fallback_recipes()
            }
        }
    }

    fn fallback_recipes(&self) -> Vec<RecipeMatch> {
        if self.corpus.is_empty() {
            return vec![RecipeMatch::unscored(placeholder_recipe())];
        }
        self.corpus
            .iter()
            .take(FALLBACK_COUNT)
            .cloned()
            .map(RecipeMatch::unscored)
            .collect()
    }

    pub fn get_clusters(&self) -> Result<BTreeMap<usize, Vec<Recipe>>, ClusterError> {
        self.clusters
            .as_ref()
            .map(|index| index.group(&self.corpus))
            .map_err(Clone::clone)
    }
}

pub fn placeholder_recipe() -> Recipe {
    Recipe {
        id: 999,
        title: "Mixed Vegetable Delight".to_string(),
        ingredients: ["mixed vegetables", "oil", "salt", "basic spices"]
            .iter()
            .map(|s| (*s).into())
            .collect(),
        instructions: [
            "Heat oil in pan",
            "Add vegetables and stir fry",
            "Season with salt and spices",
            "Serve hot",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect(),
        cooking_time: 20,
        difficulty: Difficulty::Easy,
        dietary_tags: vec!["vegetarian".to_string(), "vegan".to_string()],
        cuisine: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::Ingredient;

    fn recipe(id: u64, title: &str, ingredients: &[&str]) -> Recipe {
        Recipe {
            id,
            title: title.to_string(),
            ingredients: ingredients.iter().map(|s| Ingredient::from(*s)).collect(),
            instructions: vec![],
            cooking_time: 20,
            difficulty: Difficulty::Medium,
            dietary_tags: vec![],
            cuisine: None,
        }
    }

    fn corpus() -> Vec<Recipe> {
        vec![
            recipe(1, "Chicken Rice", &["chicken", "rice", "onion"]),
            recipe(2, "Veg Stir Fry", &["broccoli", "carrots", "soy sauce"]),
            recipe(3, "Cheese Pasta", &["pasta", "cheese", "milk"]),
            recipe(4, "Tofu Bowl", &["tofu", "rice", "broccoli"]),
        ]
    }

    #[test]
    fn test_preprocess_collapses_whitespace() {
        assert_eq!(preprocess_ingredient("  Soy   SAUCE \t"), "soy sauce");
    }

    #[test]
    fn test_results_sorted_and_bounded() {
        let matcher = RecipeMatcher::new(corpus());
        let results = matcher.find_similar_recipes(&["chicken", "rice"], 3, None);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].recipe.title, "Chicken Rice");
        let scores: Vec<f64> = results.iter().map(|r| r.similarity_score.unwrap()).collect();
        assert!(scores.windows(2).all(|w| w[0] >= w[1]));
        assert!(scores.iter().all(|s| (0.0..=1.0).contains(s)));
    }

    #[test]
    fn test_ties_keep_corpus_order() {
        let matcher = RecipeMatcher::new(corpus());
        let results = matcher.find_similar_recipes(&["durian"], 4, None);
        let ids: Vec<u64> = results.iter().map(|r| r.recipe.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        assert!(results.iter().all(|r| r.similarity_score == Some(0.0)));
    }

    #[test]
    fn test_vegan_filter_removes_without_backfill() {
        let matcher = RecipeMatcher::new(corpus());
        let results =
            matcher.find_similar_recipes(&["chicken", "cheese", "milk"], 2, Some(DietFilter::Vegan));
        assert!(results.is_empty());

        let results = matcher.find_similar_recipes(&["rice"], 4, Some(DietFilter::Vegan));
        let titles: Vec<&str> = results.iter().map(|r| r.recipe.title.as_str()).collect();
        assert!(!titles.contains(&"Chicken Rice"));
        assert!(!titles.contains(&"Cheese Pasta"));
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_empty_corpus_returns_placeholder() {
        let matcher = RecipeMatcher::new(Vec::new());
        assert_eq!(
            matcher.try_find_similar_recipes(&["rice"], 5, None).unwrap_err(),
            MatchError::EmptyCorpus
        );
        let results = matcher.find_similar_recipes(&["rice"], 5, None);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].recipe.id, 999);
        assert!(results[0].similarity_score.is_none());
    }

    #[test]
    fn test_unusable_vocabulary_returns_corpus_head() {
        let stop_word_corpus: Vec<Recipe> = (1..=4).map(|i| recipe(i, "Odd", &["the", "a"])).collect();
        let matcher = RecipeMatcher::new(stop_word_corpus);
        assert!(matches!(
            matcher.try_find_similar_recipes(&["rice"], 5, None),
            Err(MatchError::VectorizerUnavailable(VectorizeError::EmptyVocabulary))
        ));
        let results = matcher.find_similar_recipes(&["rice"], 5, None);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].recipe.id, 1);
        assert_eq!(
            matcher.get_clusters().unwrap_err(),
            ClusterError::VectorsUnavailable
        );
    }

    #[test]
    fn test_clusters_cover_corpus() {
        let matcher = RecipeMatcher::new(corpus());
        let clusters = matcher.get_clusters().unwrap();
        assert_eq!(clusters.len(), 4);
        let mut ids: Vec<u64> = clusters.values().flatten().map(|r| r.id).collect();
        ids.sort();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_small_corpus_reports_insufficient_data() {
        let matcher = RecipeMatcher::new(corpus().into_iter().take(2).collect());
        assert!(matches!(
            matcher.get_clusters(),
            Err(ClusterError::InsufficientData { have: 2, .. })
        ));
    }
}
