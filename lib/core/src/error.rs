use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Empty corpus: {0}")]
    EmptyCorpus(String),

    #[error("Artifact missing: {0}")]
    ArtifactMissing(String),

    #[error("Artifact inconsistent: {0}")]
    ArtifactInconsistent(String),

    #[error("Title not found: {0}")]
    TitleNotFound(String),

    #[error("Row index {index} out of range for {len} rows")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Invalid vector dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_piece() {
        let err = Error::ArtifactMissing("similarity.bin.gz".into());
        assert_eq!(err.to_string(), "Artifact missing: similarity.bin.gz");

        let err = Error::IndexOutOfRange { index: 9, len: 3 };
        assert_eq!(err.to_string(), "Row index 9 out of range for 3 rows");
    }
}
