//! # reelmatch Similarity
//!
//! The build-and-query engine behind reelmatch: catalog records become
//! weighted text blobs, blobs become TF-IDF vectors, vectors become a dense
//! all-pairs cosine matrix, and titles resolve to matrix rows.
//!
//! ## Example
//!
//! ```rust
//! use reelmatch_core::CatalogRecord;
//! use reelmatch_similarity::{
//!     FeatureBuilder, NeighborIndex, SimilarityMatrix, TfidfVectorizer, VectorizerConfig,
//! };
//!
//! let records = vec![
//!     CatalogRecord::new("Stranger Things").with_genres("Sci-Fi, Horror").with_description("kids fight monsters"),
//!     CatalogRecord::new("Dark").with_genres("Sci-Fi, Mystery").with_description("time travel monsters"),
//!     CatalogRecord::new("Friends").with_genres("Comedy").with_description("six friends in New York"),
//! ];
//!
//! let builder = FeatureBuilder::default();
//! let blobs: Vec<String> = records.iter().map(|r| builder.build(r)).collect();
//! let (_, vectors) = TfidfVectorizer::fit_transform(VectorizerConfig::default(), &blobs, 1024).unwrap();
//! let matrix = SimilarityMatrix::from_vectors(&vectors).unwrap();
//!
//! let ranked = matrix.top_k(0, 2).unwrap();
//! assert_eq!(ranked.first().unwrap().row, 1);
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Feature    │────>│   TF-IDF    │────>│ Similarity  │
//! │  Builder    │     │ Vectorizer  │     │   Matrix    │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!                                                │
//!                     ┌─────────────┐            │
//!                     │ Title Index │───────────>│ top_k(row)
//!                     └─────────────┘
//! ```

pub mod feature;
pub mod matrix;
pub mod title_index;
pub mod tokenize;
pub mod vectorizer;

pub use feature::{clean_text, FeatureBuilder, FeatureConfig, FieldWeights, DEFAULT_MAX_WORDS};
pub use matrix::{cross_similarity, rank_against, score_against, NeighborIndex, SimilarityMatrix};
pub use title_index::{fold_title, LookupMode, MatchTier, TitleIndex, TitleMatch};
pub use tokenize::{tokenize, StopWords, ENGLISH_STOP_WORDS};
pub use vectorizer::{TfidfVectorizer, VectorizerConfig, DEFAULT_MAX_FEATURES};
