//! TF-IDF vectorizer
//!
//! Fitted once over the whole corpus of feature blobs. Terms that are
//! frequent inside a document but rare across the corpus get the largest
//! weights; every output vector is L2-normalized.

use crate::tokenize::{tokenize, StopWords};
use ahash::AHashMap;
use rayon::prelude::*;
use reelmatch_core::{Error, Result, SparseVector};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use tracing::{debug, info};

/// Default cap on the vocabulary size.
pub const DEFAULT_MAX_FEATURES: usize = 5000;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct VectorizerConfig {
    /// Keep at most this many terms, by corpus-wide term count.
    pub max_features: usize,
    pub stop_words: StopWords,
}

impl Default for VectorizerConfig {
    fn default() -> Self {
        Self {
            max_features: DEFAULT_MAX_FEATURES,
            stop_words: StopWords::English,
        }
    }
}

impl VectorizerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_features == 0 {
            return Err(Error::InvalidConfig(
                "max_features must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Persisted form of the vectorizer; the term lookup is rebuilt on load.
#[derive(Serialize, Deserialize)]
struct TfidfState {
    config: VectorizerConfig,
    vocabulary: Vec<String>,
    idf: Vec<f32>,
    n_docs: usize,
}

/// Fitted TF-IDF state: vocabulary in column order plus per-column idf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "TfidfState", into = "TfidfState")]
pub struct TfidfVectorizer {
    config: VectorizerConfig,
    vocabulary: Vec<String>,
    idf: Vec<f32>,
    n_docs: usize,
    lookup: AHashMap<String, u32>,
}

impl From<TfidfState> for TfidfVectorizer {
    fn from(state: TfidfState) -> Self {
        let lookup = build_lookup(&state.vocabulary);
        Self {
            config: state.config,
            vocabulary: state.vocabulary,
            idf: state.idf,
            n_docs: state.n_docs,
            lookup,
        }
    }
}

impl From<TfidfVectorizer> for TfidfState {
    fn from(v: TfidfVectorizer) -> Self {
        Self {
            config: v.config,
            vocabulary: v.vocabulary,
            idf: v.idf,
            n_docs: v.n_docs,
        }
    }
}

fn build_lookup(vocabulary: &[String]) -> AHashMap<String, u32> {
    vocabulary
        .iter()
        .enumerate()
        .map(|(col, term)| (term.clone(), col as u32))
        .collect()
}

impl TfidfVectorizer {
    /// Fit vocabulary and idf weights over the whole corpus.
    ///
    /// The vocabulary keeps the `max_features` terms with the highest total
    /// count (ties broken lexicographically) and assigns columns in
    /// lexicographic order, so the same corpus always yields the same space.
    pub fn fit<S: AsRef<str>>(config: VectorizerConfig, blobs: &[S]) -> Result<Self> {
        config.validate()?;
        if blobs.is_empty() {
            return Err(Error::EmptyCorpus(
                "cannot fit a vectorizer on zero documents".to_string(),
            ));
        }

        // term -> (total count, document frequency)
        let mut stats: AHashMap<&str, (u64, u32)> = AHashMap::new();
        for blob in blobs {
            let mut doc_counts: AHashMap<&str, u32> = AHashMap::new();
            for term in tokenize(blob.as_ref(), config.stop_words) {
                *doc_counts.entry(term).or_insert(0) += 1;
            }
            for (term, count) in doc_counts {
                let entry = stats.entry(term).or_insert((0, 0));
                entry.0 += u64::from(count);
                entry.1 += 1;
            }
        }

        if stats.is_empty() {
            return Err(Error::InvalidConfig(
                "empty vocabulary: every document contains only stop words".to_string(),
            ));
        }

        let mut ranked: Vec<(&str, u64, u32)> = stats
            .iter()
            .map(|(term, &(total, df))| (*term, total, df))
            .collect();
        ranked.sort_unstable_by_key(|&(term, total, _)| (Reverse(total), term));
        ranked.truncate(config.max_features);
        ranked.sort_unstable_by_key(|&(term, _, _)| term);

        let n = blobs.len() as f64;
        let vocabulary: Vec<String> = ranked.iter().map(|(t, _, _)| t.to_string()).collect();
        let idf: Vec<f32> = ranked
            .iter()
            .map(|&(_, _, df)| (((1.0 + n) / (1.0 + f64::from(df))).ln() + 1.0) as f32)
            .collect();

        info!(
            "Fitted TF-IDF vocabulary: {} terms ({} distinct before cap) over {} documents",
            vocabulary.len(),
            stats.len(),
            blobs.len()
        );

        let lookup = build_lookup(&vocabulary);
        Ok(Self {
            config,
            vocabulary,
            idf,
            n_docs: blobs.len(),
            lookup,
        })
    }

    /// Fit then transform the same corpus.
    pub fn fit_transform<S: AsRef<str> + Sync>(
        config: VectorizerConfig,
        blobs: &[S],
        chunk_size: usize,
    ) -> Result<(Self, Vec<SparseVector>)> {
        let vectorizer = Self::fit(config, blobs)?;
        let vectors = vectorizer.transform_batch(blobs, chunk_size)?;
        Ok((vectorizer, vectors))
    }

    /// Vector for one blob. Terms outside the vocabulary are ignored; a blob
    /// without known terms maps to the zero vector.
    pub fn transform(&self, blob: &str) -> Result<SparseVector> {
        let mut counts: AHashMap<u32, u32> = AHashMap::new();
        for term in tokenize(blob, self.config.stop_words) {
            if let Some(&col) = self.lookup.get(term) {
                *counts.entry(col).or_insert(0) += 1;
            }
        }
        let pairs: Vec<(u32, f32)> = counts
            .into_iter()
            .map(|(col, tf)| (col, tf as f32 * self.idf[col as usize]))
            .collect();
        let mut vector = SparseVector::from_pairs(self.dim(), pairs)?;
        vector.normalize();
        Ok(vector)
    }

    /// Transform blobs in fixed-size chunks, preserving order. Chunking only
    /// bounds the working set; results do not depend on `chunk_size`.
    pub fn transform_batch<S: AsRef<str> + Sync>(
        &self,
        blobs: &[S],
        chunk_size: usize,
    ) -> Result<Vec<SparseVector>> {
        if chunk_size == 0 {
            return Err(Error::InvalidConfig("chunk_size must be positive".to_string()));
        }
        let mut vectors = Vec::with_capacity(blobs.len());
        for (i, chunk) in blobs.chunks(chunk_size).enumerate() {
            let encoded: Vec<SparseVector> = chunk
                .par_iter()
                .map(|blob| self.transform(blob.as_ref()))
                .collect::<Result<_>>()?;
            vectors.extend(encoded);
            debug!(
                "Encoded chunk {} ({}/{} documents)",
                i + 1,
                vectors.len(),
                blobs.len()
            );
        }
        Ok(vectors)
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.vocabulary.len()
    }

    /// Terms in column order.
    #[inline]
    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    #[inline]
    pub fn idf(&self) -> &[f32] {
        &self.idf
    }

    #[inline]
    pub fn n_docs(&self) -> usize {
        self.n_docs
    }

    #[inline]
    pub fn config(&self) -> &VectorizerConfig {
        &self.config
    }

    pub fn term_index(&self, term: &str) -> Option<u32> {
        self.lookup.get(term).copied()
    }
}
