use std::sync::Arc;

use tracing::debug;

use crate::search::archive::{BlobSource, SequenceArchive, SharedArchive, resolve_locked};
use crate::search::data::{Blob, Match};
use crate::search::error::Result;
use crate::search::iterator::{MatchIterator, SearchBuffer};
use crate::search::lock::{ArchiveLock, LockStats};
use crate::search::matcher::{MatcherFactory, PatternMatcher};

/// Hands out one buffer per blob like [`BlobMatchIterator`], but its buffers
/// search fragment by fragment, so no hit ever spans two fragments.
///
/// [`BlobMatchIterator`]: crate::search::BlobMatchIterator
pub struct FragmentMatchIterator {
    factory: Arc<dyn MatcherFactory>,
    accession: String,
    archive: SharedArchive,
}

impl FragmentMatchIterator {
    pub fn new(factory: Arc<dyn MatcherFactory>, archive: Box<dyn SequenceArchive>) -> Self {
        let accession = archive.accession().to_string();
        Self {
            factory,
            accession,
            archive: Arc::new(ArchiveLock::new(archive)),
        }
    }

    pub fn lock_stats(&self) -> LockStats {
        self.archive.stats()
    }
}

impl MatchIterator for FragmentMatchIterator {
    fn next_buffer(&self) -> Result<Option<Box<dyn SearchBuffer>>> {
        let blob = {
            let mut archive = self.archive.acquire()?;
            if !archive.has_more() {
                return Ok(None);
            }
            archive.next_blob()?
        };
        debug!(accession = %self.accession, buffer = %blob.row_label(), "handing out fragments");
        Ok(Some(Box::new(FragmentSearchBuffer {
            matcher: self.factory.make_matcher(),
            accession: self.accession.clone(),
            archive: Arc::clone(&self.archive),
            blob,
            cursor: 0,
        })))
    }

    fn accession(&self) -> &str {
        &self.accession
    }
}

pub struct FragmentSearchBuffer {
    matcher: Box<dyn PatternMatcher>,
    accession: String,
    archive: SharedArchive,
    blob: Blob,
    cursor: usize,
}

impl SearchBuffer for FragmentSearchBuffer {
    fn next_match(&mut self) -> Result<Option<Match>> {
        while self.cursor < self.blob.len() {
            let fragment = resolve_locked(&self.archive, &self.blob, self.cursor)?;
            let bytes = &self.blob.data()[fragment.start..fragment.end()];
            self.cursor = fragment.end();
            if fragment.biological && self.matcher.first_match(bytes).is_some() {
                return Ok(Some(Match::new(
                    self.accession.clone(),
                    fragment.id,
                    bytes.to_vec(),
                )));
            }
        }
        Ok(None)
    }

    fn buffer_id(&self) -> String {
        self.blob.row_label()
    }
}
