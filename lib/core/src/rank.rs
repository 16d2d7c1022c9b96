use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::cmp::{Ordering, Reverse};

/// A scored row of the similarity space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub row: usize,
    pub score: f32,
}

impl Neighbor {
    #[inline]
    #[must_use]
    pub fn new(row: usize, score: f32) -> Self {
        Self { row, score }
    }

    /// Ranking order: higher score first, then lower row.
    #[inline]
    pub fn rank_cmp(&self, other: &Neighbor) -> Ordering {
        Self::rank_key(self).cmp(&Self::rank_key(other))
    }

    #[inline]
    fn rank_key(n: &Neighbor) -> (Reverse<OrderedFloat<f32>>, usize) {
        (Reverse(OrderedFloat(n.score)), n.row)
    }
}

/// Neighbors ordered by descending score, ties broken by ascending row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RankedNeighbors {
    neighbors: Vec<Neighbor>,
}

impl RankedNeighbors {
    /// Rank `candidates` and keep the best `k`.
    ///
    /// Uses a partial selection when `k` is smaller than the candidate count;
    /// the comparator is a total order so the result is deterministic.
    pub fn top_k(mut candidates: Vec<Neighbor>, k: usize) -> Self {
        if k == 0 {
            return Self::default();
        }
        if k < candidates.len() {
            candidates.select_nth_unstable_by(k - 1, Neighbor::rank_cmp);
            candidates.truncate(k);
        }
        candidates.sort_unstable_by(Neighbor::rank_cmp);
        Self {
            neighbors: candidates,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.neighbors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[Neighbor] {
        &self.neighbors
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Neighbor> {
        self.neighbors.iter()
    }

    pub fn rows(&self) -> impl Iterator<Item = usize> + '_ {
        self.neighbors.iter().map(|n| n.row)
    }

    pub fn first(&self) -> Option<&Neighbor> {
        self.neighbors.first()
    }
}

impl IntoIterator for RankedNeighbors {
    type Item = Neighbor;
    type IntoIter = std::vec::IntoIter<Neighbor>;

    fn into_iter(self) -> Self::IntoIter {
        self.neighbors.into_iter()
    }
}

impl<'a> IntoIterator for &'a RankedNeighbors {
    type Item = &'a Neighbor;
    type IntoIter = std::slice::Iter<'a, Neighbor>;

    fn into_iter(self) -> Self::IntoIter {
        self.neighbors.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descending_with_row_tiebreak() {
        let candidates = vec![
            Neighbor::new(4, 0.5),
            Neighbor::new(1, 0.9),
            Neighbor::new(3, 0.5),
            Neighbor::new(0, 0.1),
        ];
        let ranked = RankedNeighbors::top_k(candidates, 10);
        assert_eq!(ranked.rows().collect::<Vec<_>>(), vec![1, 3, 4, 0]);
    }

    #[test]
    fn test_partial_selection_keeps_best() {
        let candidates: Vec<Neighbor> = (0..50)
            .map(|row| Neighbor::new(row, (row % 7) as f32))
            .collect();
        let ranked = RankedNeighbors::top_k(candidates, 3);
        assert_eq!(ranked.rows().collect::<Vec<_>>(), vec![6, 13, 20]);
    }

    #[test]
    fn test_zero_k_is_empty() {
        let ranked = RankedNeighbors::top_k(vec![Neighbor::new(0, 1.0)], 0);
        assert!(ranked.is_empty());
    }
}
