pub mod artifacts;
pub mod builder;
pub mod corpus;
pub mod manifest;

pub use artifacts::{ArtifactSet, ArtifactStore, DATA_FILES, MANIFEST_FILE};
pub use builder::{BuildConfig, BuildReport, IndexBuilder, DEFAULT_CHUNK_SIZE};
pub use corpus::{load_catalog, parse_catalog, Catalog, TextEncoding};
pub use manifest::{Manifest, FORMAT_VERSION};
