use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A sparse vector of non-zero `f32` components.
///
/// Indices are strictly increasing and below `dim`. Two vectors are only
/// comparable when they share the same `dim` (same fitted vocabulary).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SparseVector {
    dim: usize,
    indices: Vec<u32>,
    values: Vec<f32>,
}

impl SparseVector {
    /// Build a vector from parallel index/value lists.
    pub fn new(dim: usize, indices: Vec<u32>, values: Vec<f32>) -> Result<Self> {
        if indices.len() != values.len() {
            return Err(Error::InvalidDimension {
                expected: indices.len(),
                actual: values.len(),
            });
        }
        for pair in indices.windows(2) {
            if pair[0] >= pair[1] {
                return Err(Error::InvalidConfig(format!(
                    "sparse indices must be strictly increasing, found {} before {}",
                    pair[0], pair[1]
                )));
            }
        }
        if let Some(&last) = indices.last() {
            if last as usize >= dim {
                return Err(Error::InvalidDimension {
                    expected: dim,
                    actual: last as usize + 1,
                });
            }
        }
        Ok(Self { dim, indices, values })
    }

    /// Build from unordered `(index, value)` pairs, summing duplicates and
    /// dropping zeros.
    pub fn from_pairs(dim: usize, mut pairs: Vec<(u32, f32)>) -> Result<Self> {
        pairs.sort_by_key(|&(i, _)| i);
        let mut indices: Vec<u32> = Vec::with_capacity(pairs.len());
        let mut values: Vec<f32> = Vec::with_capacity(pairs.len());
        for (i, v) in pairs {
            if indices.last() == Some(&i) {
                if let Some(last) = values.last_mut() {
                    *last += v;
                }
            } else {
                indices.push(i);
                values.push(v);
            }
        }
        let (indices, values): (Vec<u32>, Vec<f32>) = indices
            .into_iter()
            .zip(values)
            .filter(|&(_, v)| v != 0.0)
            .unzip();
        Self::new(dim, indices, values)
    }

    #[inline]
    #[must_use]
    pub fn zeros(dim: usize) -> Self {
        Self {
            dim,
            indices: Vec::new(),
            values: Vec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of stored (non-zero) components.
    #[inline]
    #[must_use]
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.values.iter().all(|v| *v == 0.0)
    }

    #[inline]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    #[inline]
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    #[inline]
    pub fn norm(&self) -> f32 {
        self.values.iter().map(|v| v * v).sum::<f32>().sqrt()
    }

    /// Dot product by merge-join over the sorted index lists.
    ///
    /// Matching components are visited in ascending index order whichever
    /// side is `self`, so `a.dot(b) == b.dot(a)` bit for bit.
    pub fn dot(&self, other: &SparseVector) -> f32 {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0f32;
        while i < self.indices.len() && j < other.indices.len() {
            match self.indices[i].cmp(&other.indices[j]) {
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
                Ordering::Equal => {
                    sum += self.values[i] * other.values[j];
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }

    /// Cosine similarity, `0.0` whenever either vector has zero norm or the
    /// dimensions disagree.
    #[inline]
    pub fn cosine_similarity(&self, other: &SparseVector) -> f32 {
        if self.dim != other.dim {
            return 0.0;
        }
        cosine_with_norms(self, self.norm(), other, other.norm())
    }

    /// Normalize the vector to unit length. Zero vectors stay zero.
    #[inline]
    pub fn normalize(&mut self) {
        let norm = self.norm();
        if norm > f32::EPSILON {
            let inv_norm = 1.0 / norm;
            for x in &mut self.values {
                *x *= inv_norm;
            }
        }
    }

    #[inline]
    #[must_use]
    pub fn normalized(&self) -> Self {
        let mut v = self.clone();
        v.normalize();
        v
    }
}

/// Cosine similarity given precomputed norms, clamped to `[-1, 1]`.
#[inline]
pub fn cosine_with_norms(a: &SparseVector, norm_a: f32, b: &SparseVector, norm_b: f32) -> f32 {
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (a.dot(b) / (norm_a * norm_b)).clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sv(dim: usize, pairs: &[(u32, f32)]) -> SparseVector {
        SparseVector::from_pairs(dim, pairs.to_vec()).unwrap()
    }

    #[test]
    fn test_cosine_similarity() {
        let v1 = sv(4, &[(0, 1.0)]);
        let v2 = sv(4, &[(0, 1.0)]);
        assert!((v1.cosine_similarity(&v2) - 1.0).abs() < 1e-6);

        let v3 = sv(4, &[(0, 1.0)]);
        let v4 = sv(4, &[(1, 1.0)]);
        assert!((v3.cosine_similarity(&v4) - 0.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_vectors_have_zero_similarity() {
        let a = SparseVector::zeros(8);
        let b = SparseVector::zeros(8);
        let sim = a.cosine_similarity(&b);
        assert_eq!(sim, 0.0);
        assert!(!sim.is_nan());
    }

    #[test]
    fn test_dot_is_symmetric() {
        let a = sv(10, &[(1, 0.3), (4, 0.7), (9, 0.1)]);
        let b = sv(10, &[(0, 0.5), (4, 0.2), (9, 0.9)]);
        assert_eq!(a.dot(&b).to_bits(), b.dot(&a).to_bits());
        assert!((a.dot(&b) - (0.7 * 0.2 + 0.1 * 0.9)).abs() < 1e-6);
    }

    #[test]
    fn test_from_pairs_merges_and_sorts() {
        let v = sv(5, &[(3, 1.0), (1, 2.0), (3, 1.5), (2, 0.0)]);
        assert_eq!(v.indices(), &[1, 3]);
        assert_eq!(v.values(), &[2.0, 2.5]);
    }

    #[test]
    fn test_new_rejects_out_of_range_index() {
        let err = SparseVector::new(3, vec![0, 3], vec![1.0, 1.0]).unwrap_err();
        assert!(matches!(err, Error::InvalidDimension { expected: 3, actual: 4 }));
    }

    #[test]
    fn test_normalize() {
        let mut v = sv(2, &[(0, 3.0), (1, 4.0)]);
        v.normalize();
        assert!((v.norm() - 1.0).abs() < 1e-6);

        let mut z = SparseVector::zeros(2);
        z.normalize();
        assert!(z.is_zero());
    }
}
