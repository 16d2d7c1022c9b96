//! Title → row lookup
//!
//! Resolution runs through three tiers and stops at the first hit: exact
//! (case-sensitive), case-insensitive, then case-insensitive substring in
//! corpus order. Duplicate titles resolve to their first occurrence.

use ahash::AHashMap;
use reelmatch_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// Which tiers a lookup may use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LookupMode {
    /// Exact and case-insensitive matches only.
    Exact,
    /// Exact, case-insensitive, then substring.
    #[default]
    Fuzzy,
}

/// The tier that resolved a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    Exact,
    CaseInsensitive,
    Substring,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleMatch {
    pub row: usize,
    pub tier: MatchTier,
}

/// Normalized lookup key: trimmed and lower-cased.
#[inline]
pub fn fold_title(title: &str) -> String {
    title.trim().to_lowercase()
}

/// Bidirectional title/row mapping built in corpus order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TitleIndex {
    titles: Vec<String>,
    folded: Vec<String>,
    exact: AHashMap<String, usize>,
    by_folded: AHashMap<String, usize>,
    duplicates: usize,
}

impl TitleIndex {
    pub fn build<I, S>(titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut index = Self::default();
        for title in titles {
            index.push(title.into());
        }
        if index.duplicates > 0 {
            warn!(
                "{} duplicate titles; lookups resolve to the first occurrence",
                index.duplicates
            );
        }
        index
    }

    fn push(&mut self, title: String) {
        let row = self.titles.len();
        let folded = fold_title(&title);
        self.exact.entry(title.trim().to_string()).or_insert(row);
        if self.by_folded.contains_key(&folded) {
            self.duplicates += 1;
        } else {
            self.by_folded.insert(folded.clone(), row);
        }
        self.titles.push(title);
        self.folded.push(folded);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.titles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }

    /// Rows whose folded title repeats an earlier one.
    #[inline]
    pub fn duplicate_count(&self) -> usize {
        self.duplicates
    }

    /// Original title at `row`.
    pub fn title(&self, row: usize) -> Option<&str> {
        self.titles.get(row).map(String::as_str)
    }

    /// Titles in row order.
    pub fn titles(&self) -> &[String] {
        &self.titles
    }

    /// Resolve a query to one row, or `None` when no tier matches.
    ///
    /// The exact tier is keyed on original case, so a later row whose title
    /// differs from an earlier one only by case still answers a query spelled
    /// exactly like it. Such rows are folded duplicates and do not appear in
    /// [`entries`](Self::entries) or [`to_map`](Self::to_map).
    pub fn resolve(&self, query: &str, mode: LookupMode) -> Option<TitleMatch> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }
        if let Some(&row) = self.exact.get(query) {
            return Some(TitleMatch {
                row,
                tier: MatchTier::Exact,
            });
        }
        let folded = query.to_lowercase();
        if let Some(&row) = self.by_folded.get(&folded) {
            return Some(TitleMatch {
                row,
                tier: MatchTier::CaseInsensitive,
            });
        }
        if mode == LookupMode::Fuzzy {
            if let Some(row) = self.folded.iter().position(|t| t.contains(&folded)) {
                return Some(TitleMatch {
                    row,
                    tier: MatchTier::Substring,
                });
            }
        }
        None
    }

    /// Like [`TitleIndex::resolve`] but reports a miss as `TitleNotFound`.
    pub fn require(&self, query: &str, mode: LookupMode) -> Result<TitleMatch> {
        self.resolve(query, mode)
            .ok_or_else(|| Error::TitleNotFound(query.trim().to_string()))
    }

    /// All rows whose folded title contains the folded query, in corpus
    /// order, at most `limit`.
    pub fn search(&self, query: &str, limit: usize) -> Vec<usize> {
        let folded = fold_title(query);
        if folded.is_empty() {
            return Vec::new();
        }
        self.folded
            .iter()
            .enumerate()
            .filter(|(_, t)| t.contains(&folded))
            .map(|(row, _)| row)
            .take(limit)
            .collect()
    }

    /// First-occurrence rows with their original titles, in corpus order.
    pub fn entries(&self) -> impl Iterator<Item = (usize, &str)> + '_ {
        self.titles
            .iter()
            .enumerate()
            .filter(|(row, _)| self.by_folded.get(&self.folded[*row]) == Some(row))
            .map(|(row, title)| (row, title.as_str()))
    }

    /// Folded title → row, the persisted form of the index.
    pub fn to_map(&self) -> BTreeMap<String, usize> {
        self.by_folded
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect()
    }
}
