pub mod cluster;
pub mod matcher;
pub mod tfidf;

pub use cluster::{ClusterError, ClusterIndex, KMeans};
pub use matcher::{MatchError, RecipeMatcher, VectorSpace};
pub use tfidf::{SparseVector, TfidfVectorizer, VectorizeError};
