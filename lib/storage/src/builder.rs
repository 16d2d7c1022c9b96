//! Build pipeline
//!
//! records → feature blobs → TF-IDF fit/transform → similarity matrix →
//! title index, producing one in-memory [`ArtifactSet`]. Row positions are
//! assigned after un-indexable records are dropped and never change after.

use crate::artifacts::ArtifactSet;
use crate::manifest::Manifest;
use reelmatch_core::{CatalogRecord, Error, Result};
use reelmatch_similarity::{
    FeatureBuilder, FeatureConfig, SimilarityMatrix, TfidfVectorizer, TitleIndex, VectorizerConfig,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// Everything that shapes an index. Stored in the manifest of every build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    pub features: FeatureConfig,
    pub vectorizer: VectorizerConfig,
    /// Documents per transform chunk.
    pub chunk_size: usize,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            features: FeatureConfig::default(),
            vectorizer: VectorizerConfig::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl BuildConfig {
    pub fn validate(&self) -> Result<()> {
        self.features.validate()?;
        self.vectorizer.validate()?;
        if self.chunk_size == 0 {
            return Err(Error::InvalidConfig("chunk_size must be positive".to_string()));
        }
        Ok(())
    }

    /// Read a JSON config file; absent keys keep their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            Error::InvalidConfig(format!("cannot read config {}: {}", path.display(), e))
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|e| {
            Error::InvalidConfig(format!("bad config {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }
}

/// Summary of one build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildReport {
    pub input_rows: usize,
    pub rows: usize,
    pub skipped_empty: usize,
    pub duplicate_titles: usize,
    pub vocab_size: usize,
}

pub struct IndexBuilder {
    config: BuildConfig,
}

impl IndexBuilder {
    pub fn new(config: BuildConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Run the whole pipeline over `records`. Any error aborts the build;
    /// nothing is written to disk here.
    pub fn build(&self, records: Vec<CatalogRecord>) -> Result<(ArtifactSet, BuildReport)> {
        self.config.validate()?;
        let start = Instant::now();
        let input_rows = records.len();

        let features = FeatureBuilder::new(self.config.features.clone());
        let mut catalog = Vec::with_capacity(records.len());
        let mut blobs = Vec::with_capacity(records.len());
        let mut skipped_empty = 0;
        for record in records {
            let blob = features.build(&record);
            if blob.is_empty() {
                skipped_empty += 1;
                continue;
            }
            catalog.push(record);
            blobs.push(blob);
        }
        if skipped_empty > 0 {
            warn!("Skipped {} records with an empty feature blob", skipped_empty);
        }
        if catalog.is_empty() {
            return Err(Error::EmptyCorpus(format!(
                "none of the {} input records has indexable text",
                input_rows
            )));
        }

        let (vectorizer, vectors) = TfidfVectorizer::fit_transform(
            self.config.vectorizer.clone(),
            &blobs,
            self.config.chunk_size,
        )?;
        let matrix = SimilarityMatrix::from_vectors(&vectors)?;
        let index = TitleIndex::build(catalog.iter().map(|r| r.title.clone()));

        let manifest = Manifest::new(
            self.config.clone(),
            catalog.len(),
            vectorizer.vocabulary(),
            skipped_empty,
            index.duplicate_count(),
        );
        let report = BuildReport {
            input_rows,
            rows: catalog.len(),
            skipped_empty,
            duplicate_titles: index.duplicate_count(),
            vocab_size: vectorizer.dim(),
        };

        info!(
            "Index built: {} rows, {} terms in {:.2?}",
            report.rows,
            report.vocab_size,
            start.elapsed()
        );

        let set = ArtifactSet {
            vectorizer,
            vectors,
            matrix,
            index,
            catalog,
            manifest,
        };
        Ok((set, report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelmatch_similarity::NeighborIndex;
    use std::io::Write;

    fn records() -> Vec<CatalogRecord> {
        vec![
            CatalogRecord::new("Stranger Things")
                .with_genres("Sci-Fi, Horror")
                .with_description("kids fight monsters"),
            CatalogRecord::new("???"),
            CatalogRecord::new("Dark")
                .with_genres("Sci-Fi, Mystery")
                .with_description("time travel monsters"),
            CatalogRecord::new("Friends")
                .with_genres("Comedy")
                .with_description("six friends in New York"),
        ]
    }

    #[test]
    fn test_build_skips_empty_and_aligns_rows() {
        let (set, report) = IndexBuilder::new(BuildConfig::default())
            .build(records())
            .unwrap();
        assert_eq!(report.input_rows, 4);
        assert_eq!(report.rows, 3);
        assert_eq!(report.skipped_empty, 1);
        assert_eq!(set.catalog.len(), 3);
        assert_eq!(set.vectors.len(), 3);
        assert_eq!(set.matrix.len(), 3);
        assert_eq!(set.index.title(1), Some("Dark"));
        assert_eq!(set.manifest.rows, 3);
        assert_eq!(set.manifest.vocab_size, set.vectorizer.dim());
    }

    #[test]
    fn test_build_is_deterministic() {
        let builder = IndexBuilder::new(BuildConfig::default());
        let (a, _) = builder.build(records()).unwrap();
        let (b, _) = builder.build(records()).unwrap();
        assert_eq!(a.matrix, b.matrix);
        assert_eq!(a.vectorizer.vocabulary(), b.vectorizer.vocabulary());
    }

    #[test]
    fn test_all_empty_is_empty_corpus() {
        let err = IndexBuilder::new(BuildConfig::default())
            .build(vec![CatalogRecord::default(), CatalogRecord::new("!!")])
            .unwrap_err();
        assert!(matches!(err, Error::EmptyCorpus(_)));
    }

    #[test]
    fn test_invalid_config_rejected_before_work() {
        let config = BuildConfig {
            chunk_size: 0,
            ..Default::default()
        };
        let err = IndexBuilder::new(config).build(records()).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_config_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"vectorizer": {{"max_features": 100}}, "features": {{"weights": {{"title": 2}}}}}}"#
        )
        .unwrap();
        let config = BuildConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.vectorizer.max_features, 100);
        assert_eq!(config.features.weights.title, 2);
        assert_eq!(config.features.weights.description, 3);
        assert_eq!(config.chunk_size, DEFAULT_CHUNK_SIZE);

        let mut bad = tempfile::NamedTempFile::new().unwrap();
        write!(bad, r#"{{"chunk_size": 0}}"#).unwrap();
        assert!(matches!(
            BuildConfig::from_json_file(bad.path()),
            Err(Error::InvalidConfig(_))
        ));
    }
}
