// Tokenization for feature blobs and free-text queries
use serde::{Deserialize, Serialize};

/// English function words dropped before vectorizing.
pub const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "almost", "along", "already",
    "also", "although", "always", "am", "among", "an", "and", "another", "any", "anyone",
    "anything", "are", "around", "as", "at", "be", "became", "because", "become", "been",
    "before", "being", "below", "between", "both", "but", "by", "can", "cannot", "could",
    "did", "do", "does", "doing", "done", "down", "during", "each", "either", "else", "enough",
    "even", "ever", "every", "few", "for", "from", "further", "get", "gets", "had", "has",
    "have", "having", "he", "her", "here", "hers", "herself", "him", "himself", "his", "how",
    "however", "if", "in", "into", "is", "it", "its", "itself", "just", "last", "least",
    "less", "many", "may", "me", "might", "more", "most", "much", "must", "my", "myself",
    "neither", "never", "no", "nor", "not", "now", "of", "off", "often", "on", "once", "one",
    "only", "onto", "or", "other", "others", "our", "ours", "ourselves", "out", "over", "own",
    "per", "perhaps", "rather", "same", "she", "should", "since", "so", "some", "still",
    "such", "than", "that", "the", "their", "theirs", "them", "themselves", "then", "there",
    "these", "they", "this", "those", "though", "through", "thus", "to", "together", "too",
    "toward", "towards", "under", "until", "up", "upon", "us", "very", "was", "we", "well",
    "were", "what", "whatever", "when", "where", "whether", "which", "while", "who", "whoever",
    "whole", "whom", "whose", "why", "will", "with", "within", "without", "would", "yet",
    "you", "your", "yours", "yourself", "yourselves",
];

/// Stop-word list for the working language.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StopWords {
    #[default]
    English,
    None,
}

impl StopWords {
    #[inline]
    pub fn contains(&self, word: &str) -> bool {
        match self {
            StopWords::English => ENGLISH_STOP_WORDS.binary_search(&word).is_ok(),
            StopWords::None => false,
        }
    }
}

/// Split a cleaned blob into terms. Single-character tokens and stop words
/// are dropped; the input is expected to be lower-cased already.
#[inline]
pub fn tokenize<'a>(text: &'a str, stop_words: StopWords) -> impl Iterator<Item = &'a str> + 'a {
    text.split(|c: char| c.is_whitespace() || c.is_ascii_punctuation())
        .filter(|s| s.chars().count() > 1)
        .filter(move |s| !stop_words.contains(s))
}
