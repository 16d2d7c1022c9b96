// Catalog CSV loading with encoding fallback and row cleanup
use reelmatch_core::{CatalogRecord, Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Columns the loader understands. Only `title` is mandatory.
pub const KNOWN_COLUMNS: [&str; 11] = [
    "show_id",
    "title",
    "type",
    "release_year",
    "rating",
    "duration",
    "listed_in",
    "description",
    "cast",
    "director",
    "country",
];

/// Encodings tried in order; Latin-1 decodes any byte string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextEncoding {
    Utf8,
    Latin1,
}

impl TextEncoding {
    pub fn name(&self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Latin1 => "iso-8859-1",
        }
    }
}

/// Decode raw bytes with the first encoding that accepts them.
pub fn decode(bytes: &[u8]) -> (String, TextEncoding) {
    let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    match std::str::from_utf8(body) {
        Ok(text) => (text.to_string(), TextEncoding::Utf8),
        Err(_) => (
            body.iter().map(|&b| char::from(b)).collect(),
            TextEncoding::Latin1,
        ),
    }
}

/// One CSV row as it appears on disk. `release_year` is kept as text and
/// parsed leniently ("2016", "2016.0", "" or junk).
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawRecord {
    show_id: String,
    title: String,
    #[serde(rename = "type")]
    kind: String,
    release_year: String,
    rating: String,
    duration: String,
    listed_in: String,
    description: String,
    cast: String,
    director: String,
    country: String,
}

impl From<RawRecord> for CatalogRecord {
    fn from(raw: RawRecord) -> Self {
        CatalogRecord {
            show_id: raw.show_id.trim().to_string(),
            title: raw.title,
            kind: raw.kind.trim().to_string(),
            release_year: parse_year(&raw.release_year),
            rating: raw.rating.trim().to_string(),
            duration: raw.duration.trim().to_string(),
            listed_in: raw.listed_in,
            description: raw.description,
            cast: raw.cast,
            director: raw.director,
            country: raw.country,
        }
    }
}

fn parse_year(text: &str) -> Option<i32> {
    let text = text.trim();
    text.parse::<i32>().ok().or_else(|| {
        text.parse::<f64>()
            .ok()
            .filter(|y| y.is_finite() && y.fract() == 0.0)
            .map(|y| y as i32)
    })
}

/// Loaded, cleaned catalog plus what happened on the way in.
#[derive(Debug, Clone)]
pub struct Catalog {
    pub records: Vec<CatalogRecord>,
    pub encoding: TextEncoding,
    /// Rows dropped because the title was blank.
    pub blank_titles: usize,
    /// Rows dropped because their `show_id` repeated an earlier row.
    pub duplicate_ids: usize,
    pub missing_columns: Vec<String>,
}

impl Catalog {
    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Load and clean a catalog CSV from disk.
pub fn load_catalog<P: AsRef<Path>>(path: P) -> Result<Catalog> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(Error::InvalidConfig(format!(
            "corpus file not found: {}",
            path.display()
        )));
    }
    let bytes = fs::read(path)?;
    let catalog = parse_catalog(&bytes)?;
    info!(
        "Loaded {} catalog rows from {} ({})",
        catalog.len(),
        path.display(),
        catalog.encoding.name()
    );
    Ok(catalog)
}

/// Parse catalog CSV bytes. Header names are trimmed and lower-cased.
pub fn parse_catalog(bytes: &[u8]) -> Result<Catalog> {
    let (text, encoding) = decode(bytes);
    if encoding != TextEncoding::Utf8 {
        warn!("Corpus is not valid UTF-8; decoded as {}", encoding.name());
    }

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: csv::StringRecord = reader
        .headers()
        .map_err(|e| Error::Serialization(format!("CSV header: {}", e)))?
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();
    if !headers.iter().any(|h| h == "title") {
        return Err(Error::InvalidConfig(
            "corpus has no 'title' column".to_string(),
        ));
    }
    let missing_columns: Vec<String> = KNOWN_COLUMNS
        .iter()
        .copied()
        .filter(|c| !headers.iter().any(|h| h == *c))
        .map(|c| c.to_string())
        .collect();
    if !missing_columns.is_empty() {
        warn!("Corpus is missing columns {:?}; treating them as empty", missing_columns);
    }
    reader.set_headers(headers);

    let mut records = Vec::new();
    let mut seen_ids: HashSet<String> = HashSet::new();
    let mut blank_titles = 0;
    let mut duplicate_ids = 0;

    for (line, row) in reader.deserialize::<RawRecord>().enumerate() {
        let raw = row.map_err(|e| Error::Serialization(format!("CSV row {}: {}", line + 1, e)))?;
        let record = CatalogRecord::from(raw);
        if record.title.trim().is_empty() {
            blank_titles += 1;
            continue;
        }
        if !record.show_id.is_empty() && !seen_ids.insert(record.show_id.clone()) {
            duplicate_ids += 1;
            continue;
        }
        records.push(record);
    }

    if blank_titles > 0 {
        warn!("Dropped {} rows with a blank title", blank_titles);
    }
    if duplicate_ids > 0 {
        warn!("Dropped {} rows with a repeated show_id", duplicate_ids);
    }

    Ok(Catalog {
        records,
        encoding,
        blank_titles,
        duplicate_ids,
        missing_columns,
    })
}
