//! Query surface
//!
//! [`Recommender`] owns the loaded artifact set. Every caller (CLI, REPL,
//! batch export, REST) goes through it, so a title resolves and ranks the
//! same way everywhere.

use parking_lot::RwLock;
use reelmatch_core::{CatalogRecord, Error, Neighbor, Result};
use reelmatch_similarity::{rank_against, FeatureBuilder, LookupMode, MatchTier, NeighborIndex};
use reelmatch_storage::{ArtifactSet, ArtifactStore};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

pub const DEFAULT_TOP_K: usize = 10;
pub const DEFAULT_SEARCH_LIMIT: usize = 20;

/// Where a recommender gets its artifacts from.
pub trait ArtifactSource: Send + Sync {
    fn load(&self) -> Result<ArtifactSet>;

    /// Human-readable origin for logs.
    fn describe(&self) -> String;
}

impl ArtifactSource for ArtifactStore {
    fn load(&self) -> Result<ArtifactSet> {
        ArtifactStore::load(self)
    }

    fn describe(&self) -> String {
        self.dir().display().to_string()
    }
}

/// An in-memory set, straight from a build.
impl ArtifactSource for ArtifactSet {
    fn load(&self) -> Result<ArtifactSet> {
        Ok(self.clone())
    }

    fn describe(&self) -> String {
        format!("in-memory set ({} rows)", self.len())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendOptions {
    pub top_k: usize,
    pub lookup: LookupMode,
    /// Drop neighbors whose type equals the query item's type.
    pub exclude_same_type: bool,
}

impl Default for RecommendOptions {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            lookup: LookupMode::Fuzzy,
            exclude_same_type: false,
        }
    }
}

impl RecommendOptions {
    pub fn top_k(top_k: usize) -> Self {
        Self {
            top_k,
            ..Default::default()
        }
    }
}

/// One recommended item joined to its catalog row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub row: usize,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub release_year: Option<i32>,
    pub rating: String,
    pub listed_in: String,
    pub description: String,
    pub similarity_score: f32,
}

impl Recommendation {
    fn from_record(row: usize, record: &CatalogRecord, score: f32) -> Self {
        Self {
            row,
            title: record.title.clone(),
            kind: record.kind.clone(),
            release_year: record.release_year,
            rating: record.rating.clone(),
            listed_in: record.listed_in.clone(),
            description: record.description.clone(),
            similarity_score: score,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedTitle {
    pub row: usize,
    pub title: String,
    pub tier: MatchTier,
}

/// Answer to one query. `resolved` is `None` when the title did not match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendations {
    pub query: String,
    pub resolved: Option<ResolvedTitle>,
    pub items: Vec<Recommendation>,
}

impl Recommendations {
    fn unresolved(query: &str) -> Self {
        Self {
            query: query.to_string(),
            resolved: None,
            items: Vec::new(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn titles(&self) -> Vec<&str> {
        self.items.iter().map(|r| r.title.as_str()).collect()
    }
}

/// Substring search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleHit {
    pub row: usize,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub release_year: Option<i32>,
}

/// Lazily loaded, shareable recommender.
pub struct Recommender {
    source: Box<dyn ArtifactSource>,
    loaded: RwLock<Option<Arc<ArtifactSet>>>,
}

impl Recommender {
    pub fn new<S: ArtifactSource + 'static>(source: S) -> Self {
        Self {
            source: Box::new(source),
            loaded: RwLock::new(None),
        }
    }

    /// Recommender over an artifact directory.
    pub fn open<P: AsRef<Path>>(dir: P) -> Self {
        Self::new(ArtifactStore::new(dir))
    }

    /// Load the artifact set once; later calls return the cached set.
    /// Concurrent first callers load exactly once.
    pub fn load(&self) -> Result<Arc<ArtifactSet>> {
        if let Some(set) = self.loaded.read().as_ref() {
            return Ok(Arc::clone(set));
        }
        let mut slot = self.loaded.write();
        if let Some(set) = slot.as_ref() {
            return Ok(Arc::clone(set));
        }
        let set = Arc::new(self.source.load()?);
        info!(
            "Recommender ready: {} rows from {}",
            set.len(),
            self.source.describe()
        );
        *slot = Some(Arc::clone(&set));
        Ok(set)
    }

    /// Drop the cached set; the next query reloads it.
    pub fn close(&self) {
        *self.loaded.write() = None;
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.read().is_some()
    }

    pub fn source(&self) -> String {
        self.source.describe()
    }

    pub fn recommend(&self, query: &str, top_k: usize) -> Result<Recommendations> {
        self.recommend_with(query, &RecommendOptions::top_k(top_k))
    }

    /// Resolve `query` to a row and return its nearest neighbors. An
    /// unknown title is an empty answer, not an error.
    pub fn recommend_with(&self, query: &str, options: &RecommendOptions) -> Result<Recommendations> {
        let set = self.load()?;
        let matched = match set.index.require(query, options.lookup) {
            Ok(matched) => matched,
            Err(Error::TitleNotFound(title)) => {
                debug!("No title matches {:?}", title);
                return Ok(Recommendations::unresolved(query));
            }
            Err(e) => return Err(e),
        };

        let ranked = if options.exclude_same_type {
            let kind = set.record(matched.row)?.kind.as_str();
            set.matrix.top_k_where(matched.row, options.top_k, &|row| {
                set.catalog.get(row).map_or(false, |r| r.kind != kind)
            })?
        } else {
            set.matrix.top_k(matched.row, options.top_k)?
        };

        Ok(Recommendations {
            query: query.to_string(),
            resolved: Some(ResolvedTitle {
                row: matched.row,
                title: set.record(matched.row)?.title.clone(),
                tier: matched.tier,
            }),
            items: join(&set, ranked.as_slice())?,
        })
    }

    /// Neighbors of a row by position.
    pub fn recommend_row(&self, row: usize, top_k: usize) -> Result<Vec<Recommendation>> {
        let set = self.load()?;
        let ranked = set.matrix.top_k(row, top_k)?;
        join(&set, ranked.as_slice())
    }

    /// Score free text against every item. Nothing is excluded; a query with
    /// no known terms returns no items.
    pub fn recommend_by_text(&self, text: &str, top_k: usize) -> Result<Recommendations> {
        let set = self.load()?;
        let features = FeatureBuilder::new(set.manifest.config.features.clone());
        let vector = set.vectorizer.transform(&features.build_query(text))?;
        if vector.is_zero() {
            debug!("Query {:?} has no terms in the vocabulary", text);
            return Ok(Recommendations::unresolved(text));
        }
        let ranked = rank_against(&vector, &set.vectors, top_k)?;
        Ok(Recommendations {
            query: text.to_string(),
            resolved: None,
            items: join(&set, ranked.as_slice())?,
        })
    }

    /// Substring title search, corpus order.
    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<TitleHit>> {
        let set = self.load()?;
        set.index
            .search(query, limit)
            .into_iter()
            .map(|row| {
                let record = set.record(row)?;
                Ok(TitleHit {
                    row,
                    title: record.title.clone(),
                    kind: record.kind.clone(),
                    release_year: record.release_year,
                })
            })
            .collect()
    }

    pub fn record(&self, row: usize) -> Result<CatalogRecord> {
        Ok(self.load()?.record(row)?.clone())
    }

    /// Distinct titles (first occurrences) in corpus order.
    pub fn titles(&self) -> Result<Vec<String>> {
        let set = self.load()?;
        Ok(set.index.entries().map(|(_, t)| t.to_string()).collect())
    }
}

fn join(set: &ArtifactSet, neighbors: &[Neighbor]) -> Result<Vec<Recommendation>> {
    neighbors
        .iter()
        .map(|n| Ok(Recommendation::from_record(n.row, set.record(n.row)?, n.score)))
        .collect()
}
