//! Result and error types shared by every module in this crate.
use thiserror::Error;

pub type SearchResult<T> = Result<T, SearchError>;

/// Fatal, crate-wide error type. Saturation of a DP score bin is *not* represented
/// here: it is expected control flow at the DP boundary and is modeled by
/// [`crate::dp::Saturation`] / `Result<_, Saturation>` instead.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("I/O problem: {0}")]
    Io(#[from] std::io::Error),

    #[error("incorrectly formatted FASTA/FASTQ header: {0}")]
    InvalidHeader(String),

    #[error("unable to parse \"{0}\" as integer")]
    InvalidInteger(String),

    #[error("unable to find file {0}")]
    MissingFile(String),

    #[error("empty header found in sequence file")]
    MissingHeader,

    #[error("unable to serialize/deserialize item: {0}")]
    Serialize(#[from] bincode::Error),

    #[error("found invalid UTF-8 input ({0})")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("error reading FASTQ record: {0}")]
    FastqRead(String),

    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("input exceeds the representable id range: {0}")]
    InputScaleOverflow(String),

    #[error("traceback score did not match recomputed score for target {target}: stored {stored}, recomputed {recomputed}")]
    TracebackInconsistency {
        target: u32,
        stored: i64,
        recomputed: i64,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<bio::io::fastq::Error> for SearchError {
    fn from(e: bio::io::fastq::Error) -> Self {
        SearchError::FastqRead(e.to_string())
    }
}

impl From<bio::io::fasta::Error> for SearchError {
    fn from(e: bio::io::fasta::Error) -> Self {
        SearchError::InvalidHeader(e.to_string())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn displays_readable_message() {
        let e = SearchError::MissingFile("db.bin".to_string());
        assert_eq!(e.to_string(), "unable to find file db.bin");
    }

    #[test]
    fn bridges_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let e: SearchError = io_err.into();
        assert!(matches!(e, SearchError::Io(_)));
    }
}
