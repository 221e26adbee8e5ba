use std::sync::Arc;

use crate::search::archive::ArchiveOpener;
use crate::search::blob::BlobMatchIterator;
use crate::search::data::Match;
use crate::search::error::Result;
use crate::search::fragment::FragmentMatchIterator;
use crate::search::matcher::MatcherFactory;

/// One independently drainable unit of search work. A buffer is drained by a
/// single worker; different buffers may be drained concurrently.
pub trait SearchBuffer: Send {
    /// Next confirmed match, or `None` once the buffer is exhausted. Keeps
    /// returning `None` after that.
    fn next_match(&mut self) -> Result<Option<Match>>;

    /// Stable label for diagnostics, e.g. the row range the buffer covers.
    fn buffer_id(&self) -> String;
}

/// Hands out search buffers for one accession. Safe to call from many
/// workers; no two calls receive overlapping work.
pub trait MatchIterator: Send + Sync {
    fn next_buffer(&self) -> Result<Option<Box<dyn SearchBuffer>>>;

    fn accession(&self) -> &str;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Strategy {
    /// Scan whole blobs, validating hits against fragment extents.
    #[default]
    Blob,
    /// Scan one fragment at a time.
    Fragment,
}

impl Strategy {
    pub fn iterator(
        self,
        factory: Arc<dyn MatcherFactory>,
        opener: &dyn ArchiveOpener,
        accession: &str,
    ) -> Result<Box<dyn MatchIterator>> {
        let archive = opener.open(accession)?;
        Ok(match self {
            Strategy::Blob => Box::new(BlobMatchIterator::new(factory, archive)),
            Strategy::Fragment => Box::new(FragmentMatchIterator::new(factory, archive)),
        })
    }
}
