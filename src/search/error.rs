use thiserror::Error;

pub type Result<T> = std::result::Result<T, SearchError>;

type BoxedCause = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum SearchError {
    /// Search setup was rejected before any blob was read.
    #[error("failed to initialize search: {0}")]
    Initialization(String),

    #[error("accession not found: {0}")]
    AccessionNotFound(String),

    #[error("failed to open archive {accession}: {source}")]
    ArchiveOpen {
        accession: String,
        #[source]
        source: BoxedCause,
    },

    /// Fragment resolution failed; the buffer that raised it should not be used again.
    #[error("no fragment metadata for offset {offset} in blob {blob}: {reason}")]
    Metadata {
        blob: String,
        offset: usize,
        reason: String,
    },

    #[error("archive lock poisoned by a panicked worker")]
    LockPoisoned,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SearchError {
    pub(crate) fn archive_open<E>(accession: &str, source: E) -> Self
    where
        E: Into<BoxedCause>,
    {
        SearchError::ArchiveOpen {
            accession: accession.to_string(),
            source: source.into(),
        }
    }
}
