//! Dense all-pairs similarity
//!
//! The matrix is fully materialized: O(N²·D) time and O(N²) space. That is
//! fine for catalogs of a few thousand up to ~10⁵ items; larger corpora need a
//! sparse or approximate backend behind [`NeighborIndex`].

use rayon::prelude::*;
use reelmatch_core::{cosine_with_norms, Error, Neighbor, RankedNeighbors, Result, SparseVector};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Read-only nearest-neighbor queries over a fixed row space.
pub trait NeighborIndex: Send + Sync {
    /// Number of rows.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Similarity between two rows.
    fn score(&self, a: usize, b: usize) -> Result<f32>;

    /// Best `k` rows for `row`, never including `row` itself, restricted to
    /// rows accepted by `keep`.
    fn top_k_where(
        &self,
        row: usize,
        k: usize,
        keep: &dyn Fn(usize) -> bool,
    ) -> Result<RankedNeighbors>;

    /// Best `k` rows for `row`, never including `row` itself.
    fn top_k(&self, row: usize, k: usize) -> Result<RankedNeighbors> {
        self.top_k_where(row, k, &|_| true)
    }
}

/// Square, symmetric N×N cosine similarity matrix stored row-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityMatrix {
    n: usize,
    data: Vec<f32>,
}

impl SimilarityMatrix {
    /// Build the matrix from one vector per row.
    ///
    /// The upper triangle is computed with rows in parallel and then mirrored,
    /// so `m[i][j] == m[j][i]` holds exactly.
    pub fn from_vectors(vectors: &[SparseVector]) -> Result<Self> {
        let n = vectors.len();
        if let Some(first) = vectors.first() {
            let dim = first.dim();
            if let Some(bad) = vectors.iter().find(|v| v.dim() != dim) {
                return Err(Error::InvalidDimension {
                    expected: dim,
                    actual: bad.dim(),
                });
            }
        }

        let norms: Vec<f32> = vectors.par_iter().map(SparseVector::norm).collect();
        let mut data = vec![0.0f32; n * n];

        if n > 0 {
            data.par_chunks_mut(n).enumerate().for_each(|(i, row)| {
                for j in i..n {
                    row[j] = cosine_with_norms(&vectors[i], norms[i], &vectors[j], norms[j]);
                }
            });
            for i in 0..n {
                for j in (i + 1)..n {
                    data[j * n + i] = data[i * n + j];
                }
            }
        }

        info!("Built {}x{} similarity matrix", n, n);
        Ok(Self { n, data })
    }

    /// Rebuild from a flat row-major buffer, checking the shape.
    pub fn from_raw(n: usize, data: Vec<f32>) -> Result<Self> {
        if data.len() != n * n {
            return Err(Error::InvalidDimension {
                expected: n * n,
                actual: data.len(),
            });
        }
        Ok(Self { n, data })
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.n
    }

    /// One full row of scores.
    pub fn row(&self, row: usize) -> Result<&[f32]> {
        self.check(row)?;
        Ok(&self.data[row * self.n..(row + 1) * self.n])
    }

    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    #[inline]
    fn check(&self, row: usize) -> Result<()> {
        if row >= self.n {
            return Err(Error::IndexOutOfRange {
                index: row,
                len: self.n,
            });
        }
        Ok(())
    }
}

impl NeighborIndex for SimilarityMatrix {
    fn len(&self) -> usize {
        self.n
    }

    fn score(&self, a: usize, b: usize) -> Result<f32> {
        self.check(a)?;
        self.check(b)?;
        Ok(self.data[a * self.n + b])
    }

    fn top_k_where(
        &self,
        row: usize,
        k: usize,
        keep: &dyn Fn(usize) -> bool,
    ) -> Result<RankedNeighbors> {
        let scores = self.row(row)?;
        if k == 0 {
            return Ok(RankedNeighbors::default());
        }
        let candidates: Vec<Neighbor> = scores
            .iter()
            .enumerate()
            .filter(|&(j, _)| j != row && keep(j))
            .map(|(j, &score)| Neighbor::new(j, score))
            .collect();
        Ok(RankedNeighbors::top_k(candidates, k))
    }
}

/// Score one query vector against every row of a corpus.
pub fn score_against(query: &SparseVector, corpus: &[SparseVector]) -> Result<Vec<f32>> {
    if let Some(bad) = corpus.iter().find(|v| v.dim() != query.dim()) {
        return Err(Error::InvalidDimension {
            expected: query.dim(),
            actual: bad.dim(),
        });
    }
    let query_norm = query.norm();
    Ok(corpus
        .par_iter()
        .map(|v| cosine_with_norms(query, query_norm, v, v.norm()))
        .collect())
}

/// Cross-corpus similarity: one row per query, one column per corpus vector.
pub fn cross_similarity(queries: &[SparseVector], corpus: &[SparseVector]) -> Result<Vec<Vec<f32>>> {
    queries.iter().map(|q| score_against(q, corpus)).collect()
}

/// Best `k` corpus rows for a free-text query vector (no self-exclusion).
pub fn rank_against(query: &SparseVector, corpus: &[SparseVector], k: usize) -> Result<RankedNeighbors> {
    let scores = score_against(query, corpus)?;
    let candidates = scores
        .into_iter()
        .enumerate()
        .map(|(row, score)| Neighbor::new(row, score))
        .collect();
    Ok(RankedNeighbors::top_k(candidates, k))
}
