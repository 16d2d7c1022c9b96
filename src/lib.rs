//! # reelmatch
//!
//! Content-based recommendations for a catalog of movies and shows.
//!
//! Descriptive metadata (title, genres, description, cast, director,
//! country) is folded into one weighted text blob per item, vectorized with
//! TF-IDF and compared pairwise with cosine similarity. The resulting dense
//! matrix answers "more like this" queries by title, with case-insensitive
//! and partial title matching, or by free text.
//!
//! ## Quick Start
//!
//! ### From the command line
//!
//! ```bash
//! reelmatch build --corpus data/netflix_titles.csv --out artifacts/
//! reelmatch recommend --artifacts artifacts/ "Stranger Things" -k 5
//! reelmatch serve --artifacts artifacts/ --port 8080
//! ```
//!
//! ### As a Library
//!
//! ```rust,no_run
//! use reelmatch::prelude::*;
//!
//! let catalog = load_catalog("data/netflix_titles.csv").unwrap();
//! let (set, report) = IndexBuilder::new(BuildConfig::default())
//!     .build(catalog.records)
//!     .unwrap();
//! ArtifactStore::new("artifacts").save(&set).unwrap();
//!
//! let recommender = Recommender::open("artifacts");
//! for item in recommender.recommend("Stranger Things", 5).unwrap().items {
//!     println!("{} ({:.3})", item.title, item.similarity_score);
//! }
//! ```
//!
//! ## Crate Structure
//!
//! - [`reelmatch-core`](https://docs.rs/reelmatch-core) - Records, sparse vectors, ranked neighbors, errors
//! - [`reelmatch-similarity`](https://docs.rs/reelmatch-similarity) - Feature blobs, TF-IDF, similarity matrix, title index
//! - [`reelmatch-storage`](https://docs.rs/reelmatch-storage) - CSV loading, build pipeline, artifact persistence
//! - [`reelmatch-api`](https://docs.rs/reelmatch-api) - Recommender, batch export, REST API

// Re-export core types
pub use reelmatch_core::{
    CatalogField, CatalogRecord, Error, Neighbor, RankedNeighbors, Result, SparseVector,
};

// Re-export the engine
pub use reelmatch_similarity::{
    FeatureBuilder, FeatureConfig, FieldWeights, LookupMode, MatchTier, NeighborIndex,
    SimilarityMatrix, StopWords, TfidfVectorizer, TitleIndex, VectorizerConfig,
};

// Re-export storage
pub use reelmatch_storage::{
    load_catalog, parse_catalog, ArtifactSet, ArtifactStore, BuildConfig, BuildReport, Catalog,
    IndexBuilder, Manifest,
};

// Re-export API
pub use reelmatch_api::{
    export, export_to_path, ArtifactSource, ExportOptions, ExportReport, RecommendOptions,
    Recommendation, Recommendations, Recommender, RestApi,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        load_catalog, ArtifactSet, ArtifactStore, BuildConfig, CatalogRecord, Error,
        ExportOptions, IndexBuilder, LookupMode, NeighborIndex, RecommendOptions,
        Recommendations, Recommender, Result,
    };
}
