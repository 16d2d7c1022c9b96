// Batch CSV export of top-K neighbors for every title
use crate::recommender::{RecommendOptions, Recommender};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use reelmatch_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

pub const EXPORT_COLUMNS: [&str; 5] = [
    "source_title",
    "title",
    "type",
    "similarity_score",
    "listed_in",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Neighbors per source title.
    pub top_k: usize,
    /// Only export `limit` titles: the first ones, or a seeded random
    /// sample when `sample_seed` is set.
    pub limit: Option<usize>,
    pub sample_seed: Option<u64>,
    /// Prefix the file with a UTF-8 byte-order mark.
    pub bom: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            top_k: 5,
            limit: None,
            sample_seed: None,
            bom: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportReport {
    pub sources: usize,
    pub rows: usize,
    /// Source titles that did not resolve.
    pub skipped: usize,
}

#[derive(Serialize)]
struct ExportRow<'a> {
    source_title: &'a str,
    title: &'a str,
    kind: &'a str,
    similarity_score: f32,
    listed_in: &'a str,
}

fn csv_error(e: csv::Error) -> Error {
    Error::Serialization(format!("CSV export: {}", e))
}

/// Write one row per (source title, neighbor) pair to `out`.
pub fn export<W: Write>(
    recommender: &Recommender,
    mut out: W,
    options: &ExportOptions,
) -> Result<ExportReport> {
    let start = Instant::now();
    let titles = recommender.titles()?;
    let sources: Vec<&String> = match (options.limit, options.sample_seed) {
        (Some(limit), Some(seed)) => {
            let mut rng = StdRng::seed_from_u64(seed);
            titles.choose_multiple(&mut rng, limit).collect()
        }
        (Some(limit), None) => titles.iter().take(limit).collect(),
        (None, _) => titles.iter().collect(),
    };

    if options.bom {
        out.write_all(UTF8_BOM)?;
    }
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(out);
    writer.write_record(EXPORT_COLUMNS).map_err(csv_error)?;

    let query = RecommendOptions::top_k(options.top_k);
    let mut report = ExportReport::default();
    for source in sources {
        report.sources += 1;
        let result = recommender.recommend_with(source, &query)?;
        if result.resolved.is_none() {
            report.skipped += 1;
            continue;
        }
        for item in &result.items {
            writer
                .serialize(ExportRow {
                    source_title: source.as_str(),
                    title: &item.title,
                    kind: &item.kind,
                    similarity_score: item.similarity_score,
                    listed_in: &item.listed_in,
                })
                .map_err(csv_error)?;
            report.rows += 1;
        }
    }
    writer.flush()?;

    if report.skipped > 0 {
        warn!("Export skipped {} unresolvable titles", report.skipped);
    }
    info!(
        "Exported {} rows for {} titles in {:.2?}",
        report.rows,
        report.sources,
        start.elapsed()
    );
    Ok(report)
}

/// Export straight to a file, creating parent directories as needed.
pub fn export_to_path<P: AsRef<Path>>(
    recommender: &Recommender,
    path: P,
    options: &ExportOptions,
) -> Result<ExportReport> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let file = BufWriter::new(File::create(path)?);
    export(recommender, file, options)
}
