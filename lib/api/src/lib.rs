pub mod export;
pub mod recommender;
pub mod rest;

pub use export::{export, export_to_path, ExportOptions, ExportReport, EXPORT_COLUMNS};
pub use recommender::{
    ArtifactSource, RecommendOptions, Recommendation, Recommendations, Recommender, ResolvedTitle,
    TitleHit, DEFAULT_SEARCH_LIMIT, DEFAULT_TOP_K,
};
pub use rest::RestApi;
