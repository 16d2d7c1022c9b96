// Artifact set persistence: atomic, fingerprinted save and verified load
use crate::manifest::{sha256_hex, Manifest, FORMAT_VERSION};
use atomicwrites::{AtomicFile, OverwriteBehavior};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use reelmatch_core::{CatalogRecord, Error, Result, SparseVector};
use reelmatch_similarity::{NeighborIndex, SimilarityMatrix, TfidfVectorizer, TitleIndex};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const VECTORIZER_FILE: &str = "vectorizer.bin";
pub const VECTORS_FILE: &str = "vectors.bin";
pub const MATRIX_FILE: &str = "similarity.bin.gz";
pub const INDEX_MAP_FILE: &str = "index_map.json";
pub const TITLES_FILE: &str = "titles.txt";
pub const CATALOG_FILE: &str = "catalog.bin";
pub const MANIFEST_FILE: &str = "manifest.json";

/// Data files in write order. The manifest always goes last.
pub const DATA_FILES: [&str; 6] = [
    VECTORIZER_FILE,
    VECTORS_FILE,
    MATRIX_FILE,
    INDEX_MAP_FILE,
    TITLES_FILE,
    CATALOG_FILE,
];

/// Everything a query needs, row-aligned: vector `i`, matrix row `i`,
/// title index row `i` and `catalog[i]` describe the same item.
#[derive(Debug, Clone)]
pub struct ArtifactSet {
    pub vectorizer: TfidfVectorizer,
    pub vectors: Vec<SparseVector>,
    pub matrix: SimilarityMatrix,
    pub index: TitleIndex,
    pub catalog: Vec<CatalogRecord>,
    pub manifest: Manifest,
}

impl ArtifactSet {
    #[inline]
    pub fn len(&self) -> usize {
        self.catalog.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.catalog.is_empty()
    }

    pub fn record(&self, row: usize) -> Result<&CatalogRecord> {
        self.catalog.get(row).ok_or(Error::IndexOutOfRange {
            index: row,
            len: self.catalog.len(),
        })
    }
}

/// One line per title; embedded line breaks become spaces.
fn titles_text(catalog: &[CatalogRecord]) -> String {
    let mut text = String::new();
    for record in catalog {
        text.push_str(&record.title.replace(|c: char| c == '\n' || c == '\r', " "));
        text.push('\n');
    }
    text
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    AtomicFile::new(path, OverwriteBehavior::AllowOverwrite)
        .write(|f| f.write_all(bytes))
        .map_err(|e| match e {
            atomicwrites::Error::Internal(e) | atomicwrites::Error::User(e) => Error::Io(e),
        })
}

fn encode<T: serde::Serialize>(name: &str, value: &T) -> Result<Vec<u8>> {
    bincode::serialize(value).map_err(|e| Error::Serialization(format!("{}: {}", name, e)))
}

fn decode<T: DeserializeOwned>(name: &str, bytes: &[u8]) -> Result<T> {
    bincode::deserialize(bytes)
        .map_err(|e| Error::ArtifactInconsistent(format!("{}: cannot decode: {}", name, e)))
}

fn gzip(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes)?;
    Ok(encoder.finish()?)
}

fn gunzip(name: &str, bytes: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    GzDecoder::new(bytes)
        .read_to_end(&mut out)
        .map_err(|e| Error::ArtifactInconsistent(format!("{}: cannot decompress: {}", name, e)))?;
    Ok(out)
}

fn inconsistent(msg: String) -> Error {
    Error::ArtifactInconsistent(msg)
}

/// Artifact directory on disk.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    #[inline]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    /// True when a manifest exists; says nothing about consistency.
    pub fn exists(&self) -> bool {
        self.path(MANIFEST_FILE).is_file()
    }

    /// Persist a full set. The previous manifest is removed first and the
    /// new one written last, so a crash mid-save leaves a set that refuses
    /// to load rather than a mixed one.
    pub fn save(&self, set: &ArtifactSet) -> Result<Manifest> {
        fs::create_dir_all(&self.dir)?;
        let manifest_path = self.path(MANIFEST_FILE);
        if manifest_path.exists() {
            fs::remove_file(&manifest_path)?;
        }

        let index_map = serde_json::to_vec_pretty(&set.index.to_map())
            .map_err(|e| Error::Serialization(format!("{}: {}", INDEX_MAP_FILE, e)))?;
        let payloads: Vec<(&str, Vec<u8>)> = vec![
            (VECTORIZER_FILE, encode(VECTORIZER_FILE, &set.vectorizer)?),
            (VECTORS_FILE, encode(VECTORS_FILE, &set.vectors)?),
            (MATRIX_FILE, gzip(&encode(MATRIX_FILE, &set.matrix)?)?),
            (INDEX_MAP_FILE, index_map),
            (TITLES_FILE, titles_text(&set.catalog).into_bytes()),
            (CATALOG_FILE, encode(CATALOG_FILE, &set.catalog)?),
        ];

        let mut files = BTreeMap::new();
        for (name, bytes) in payloads {
            write_atomic(&self.path(name), &bytes)?;
            debug!("Wrote {} ({} bytes)", name, bytes.len());
            files.insert(name.to_string(), sha256_hex(&bytes));
        }

        let mut manifest = set.manifest.clone();
        manifest.files = files;
        let json = serde_json::to_vec_pretty(&manifest)
            .map_err(|e| Error::Serialization(format!("{}: {}", MANIFEST_FILE, e)))?;
        write_atomic(&manifest_path, &json)?;

        info!(
            "Saved artifact set ({} rows, {} terms) to {}",
            manifest.rows,
            manifest.vocab_size,
            self.dir.display()
        );
        Ok(manifest)
    }

    fn read(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.path(name);
        if !path.is_file() {
            return Err(Error::ArtifactMissing(name.to_string()));
        }
        Ok(fs::read(path)?)
    }

    fn read_verified(&self, manifest: &Manifest, name: &str) -> Result<Vec<u8>> {
        let bytes = self.read(name)?;
        manifest.verify_file(name, &bytes)?;
        Ok(bytes)
    }

    /// Load and verify a full set. Returns a consistent set or an error,
    /// never a partial one.
    pub fn load(&self) -> Result<ArtifactSet> {
        for name in std::iter::once(MANIFEST_FILE).chain(DATA_FILES) {
            if !self.path(name).is_file() {
                return Err(Error::ArtifactMissing(name.to_string()));
            }
        }

        let manifest: Manifest = serde_json::from_slice(&self.read(MANIFEST_FILE)?)
            .map_err(|e| inconsistent(format!("{}: {}", MANIFEST_FILE, e)))?;
        if manifest.format != FORMAT_VERSION {
            return Err(inconsistent(format!(
                "format version {} (expected {})",
                manifest.format, FORMAT_VERSION
            )));
        }

        let vectorizer: TfidfVectorizer = decode(VECTORIZER_FILE, &self.read_verified(&manifest, VECTORIZER_FILE)?)?;
        manifest.verify_vocabulary(vectorizer.vocabulary())?;

        let vectors: Vec<SparseVector> = decode(VECTORS_FILE, &self.read_verified(&manifest, VECTORS_FILE)?)?;
        if vectors.len() != manifest.rows {
            return Err(inconsistent(format!(
                "{} vectors for {} rows",
                vectors.len(),
                manifest.rows
            )));
        }
        if let Some(bad) = vectors.iter().position(|v| v.dim() != manifest.vocab_size) {
            return Err(inconsistent(format!(
                "vector {} has dimension {} (vocabulary has {})",
                bad,
                vectors[bad].dim(),
                manifest.vocab_size
            )));
        }

        let matrix: SimilarityMatrix = decode(
            MATRIX_FILE,
            &gunzip(MATRIX_FILE, &self.read_verified(&manifest, MATRIX_FILE)?)?,
        )?;
        if matrix.len() != manifest.rows || matrix.as_slice().len() != manifest.rows * manifest.rows {
            return Err(inconsistent(format!(
                "similarity matrix is {}x{} for {} rows",
                matrix.len(),
                matrix.len(),
                manifest.rows
            )));
        }

        let catalog: Vec<CatalogRecord> = decode(CATALOG_FILE, &self.read_verified(&manifest, CATALOG_FILE)?)?;
        if catalog.len() != manifest.rows {
            return Err(inconsistent(format!(
                "catalog has {} rows, manifest says {}",
                catalog.len(),
                manifest.rows
            )));
        }

        let titles = String::from_utf8(self.read_verified(&manifest, TITLES_FILE)?)
            .map_err(|e| inconsistent(format!("{}: {}", TITLES_FILE, e)))?;
        if titles != titles_text(&catalog) {
            return Err(inconsistent(format!(
                "{} has {} lines and does not match the catalog",
                TITLES_FILE,
                titles.lines().count()
            )));
        }

        let index = TitleIndex::build(catalog.iter().map(|r| r.title.clone()));
        let stored: BTreeMap<String, usize> =
            serde_json::from_slice(&self.read_verified(&manifest, INDEX_MAP_FILE)?)
                .map_err(|e| inconsistent(format!("{}: {}", INDEX_MAP_FILE, e)))?;
        if stored != index.to_map() {
            return Err(inconsistent(format!(
                "{} does not match the catalog titles",
                INDEX_MAP_FILE
            )));
        }

        info!(
            "Loaded artifact set from {} ({} rows, {} terms, built {})",
            self.dir.display(),
            manifest.rows,
            manifest.vocab_size,
            manifest.created_at.format("%Y-%m-%dT%H:%M:%SZ")
        );

        Ok(ArtifactSet {
            vectorizer,
            vectors,
            matrix,
            index,
            catalog,
            manifest,
        })
    }
}
