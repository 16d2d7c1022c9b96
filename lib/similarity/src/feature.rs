//! Feature blobs
//!
//! Turns one catalog record into a single normalized text string. Field
//! importance is expressed by literal repetition of the cleaned field text,
//! because the vectorizer only sees term frequency.

use reelmatch_core::{CatalogField, CatalogRecord, Error, Result};
use serde::{Deserialize, Serialize};

/// Repeat-weights per descriptive field. A weight of 0 leaves the field out.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FieldWeights {
    pub title: u32,
    pub description: u32,
    pub listed_in: u32,
    pub cast: u32,
    pub director: u32,
    pub country: u32,
}

impl Default for FieldWeights {
    fn default() -> Self {
        Self {
            title: 1,
            description: 3,
            listed_in: 2,
            cast: 1,
            director: 1,
            country: 1,
        }
    }
}

impl FieldWeights {
    pub fn weight(&self, field: CatalogField) -> u32 {
        match field {
            CatalogField::Title => self.title,
            CatalogField::Description => self.description,
            CatalogField::ListedIn => self.listed_in,
            CatalogField::Cast => self.cast,
            CatalogField::Director => self.director,
            CatalogField::Country => self.country,
        }
    }

    pub fn total(&self) -> u32 {
        CatalogField::ALL.iter().map(|f| self.weight(*f)).sum()
    }
}

/// Default cap on the number of words kept from a combined blob.
pub const DEFAULT_MAX_WORDS: usize = 200;

/// Feature builder configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FeatureConfig {
    pub weights: FieldWeights,
    /// Head-truncate the combined blob to this many words. `None` keeps
    /// every word.
    pub max_words: Option<usize>,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            weights: FieldWeights::default(),
            max_words: Some(DEFAULT_MAX_WORDS),
        }
    }
}

impl FeatureConfig {
    pub fn validate(&self) -> Result<()> {
        if self.weights.total() == 0 {
            return Err(Error::InvalidConfig(
                "at least one field weight must be non-zero".to_string(),
            ));
        }
        if self.max_words == Some(0) {
            return Err(Error::InvalidConfig(
                "max_words must be positive when set".to_string(),
            ));
        }
        Ok(())
    }
}

/// Lower-case, replace everything that is not an ASCII alphanumeric with a
/// space, collapse whitespace and trim.
pub fn clean_text(text: &str) -> String {
    let mapped: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { ' ' })
        .collect();
    mapped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Builds weighted feature blobs from catalog records.
#[derive(Debug, Clone, Default)]
pub struct FeatureBuilder {
    config: FeatureConfig,
}

impl FeatureBuilder {
    pub fn new(config: FeatureConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    /// Feature blob for one record. Never fails; an all-empty record gives
    /// an empty string.
    pub fn build(&self, record: &CatalogRecord) -> String {
        let mut parts: Vec<String> = Vec::new();
        for field in CatalogField::ALL {
            let weight = self.config.weights.weight(field);
            if weight == 0 {
                continue;
            }
            let cleaned = clean_text(record.field(field));
            if cleaned.is_empty() {
                continue;
            }
            for _ in 0..weight {
                parts.push(cleaned.clone());
            }
        }

        let combined = parts.join(" ");
        match self.config.max_words {
            Some(max) => truncate_words(&combined, max),
            None => combined,
        }
    }

    /// Feature blob for a free-text query, cleaned the same way as records
    /// but without field weighting.
    pub fn build_query(&self, text: &str) -> String {
        let cleaned = clean_text(text);
        match self.config.max_words {
            Some(max) => truncate_words(&cleaned, max),
            None => cleaned,
        }
    }
}

fn truncate_words(text: &str, max: usize) -> String {
    text.split(' ').take(max).collect::<Vec<_>>().join(" ")
}
