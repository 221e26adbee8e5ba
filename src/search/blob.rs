use std::sync::Arc;

use tracing::{debug, trace};

use crate::search::archive::{BlobSource, SequenceArchive, SharedArchive, resolve_locked};
use crate::search::data::{Blob, Match};
use crate::search::error::Result;
use crate::search::iterator::{MatchIterator, SearchBuffer};
use crate::search::lock::{ArchiveLock, LockStats};
use crate::search::matcher::{MatcherFactory, PatternMatcher};

/// Splits an accession into one search buffer per blob.
pub struct BlobMatchIterator {
    factory: Arc<dyn MatcherFactory>,
    accession: String,
    archive: SharedArchive,
}

impl BlobMatchIterator {
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

impl MatchIterator for BlobMatchIterator {
    fn next_buffer(&self) -> Result<Option<Box<dyn SearchBuffer>>> {
        let blob = {
            let mut archive = self.archive.acquire()?;
            if !archive.has_more() {
                return Ok(None);
            }
            archive.next_blob()?
        };
        let buffer = BlobSearchBuffer::new(
            self.factory.make_matcher(),
            self.accession.clone(),
            Arc::clone(&self.archive),
            blob,
        );
        debug!(accession = %self.accession, buffer = %buffer.buffer_id(), "handing out blob");
        Ok(Some(Box::new(buffer)))
    }

    fn accession(&self) -> &str {
        &self.accession
    }
}

/// Searches one blob. Raw matcher hits are attributed to the fragment that
/// owns their first byte; hits running past that fragment's end are
/// confirmed by re-running the matcher on the fragment alone.
pub struct BlobSearchBuffer {
    matcher: Box<dyn PatternMatcher>,
    accession: String,
    archive: SharedArchive,
    blob: Blob,
    cursor: usize,
}

impl BlobSearchBuffer {
    pub(crate) fn new(
        matcher: Box<dyn PatternMatcher>,
        accession: String,
        archive: SharedArchive,
        blob: Blob,
    ) -> Self {
        Self {
            matcher,
            accession,
            archive,
            blob,
            cursor: 0,
        }
    }

    /// Next unexamined offset in the blob; equals the blob length once drained.
    pub fn cursor(&self) -> usize {
        self.cursor
    }
}

impl SearchBuffer for BlobSearchBuffer {
    fn next_match(&mut self) -> Result<Option<Match>> {
        while self.cursor < self.blob.len() {
            let Some((start, end)) = self.matcher.first_match(&self.blob.data()[self.cursor..])
            else {
                break;
            };
            let hit_start = start + self.cursor;
            let hit_end = end + self.cursor;

            let fragment = resolve_locked(&self.archive, &self.blob, hit_start)?;
            let fragment_end = fragment.end();
            // resume with the next fragment whatever the outcome
            self.cursor = fragment_end;

            if !fragment.biological {
                trace!(fragment = %fragment.id, "skipping hit in technical fragment");
                continue;
            }
            let confirmed = hit_end < fragment_end
                || self
                    .matcher
                    .first_match(&self.blob.data()[fragment.start..fragment_end])
                    .is_some();
            if !confirmed {
                debug!(
                    fragment = %fragment.id,
                    hit_start,
                    hit_end,
                    "retracting hit that crosses the fragment boundary"
                );
                continue;
            }
            let subject = self.blob.data()[fragment.start..fragment_end].to_vec();
            return Ok(Some(Match::new(self.accession.clone(), fragment.id, subject)));
        }
        self.cursor = self.blob.len();
        Ok(None)
    }

    fn buffer_id(&self) -> String {
        self.blob.row_label()
    }
}
