use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::search::{
    ArchiveLock, Blob, BlobSearchBuffer, BlobSource, FragmentInfo, FragmentResolver,
    InMemoryArchive, LoadedFragment, Match, MatchIterator, PatternMatcher, Result, SearchBuffer,
    SearchError, SequenceArchive, SharedArchive,
};

pub(super) type MatchKey = (String, String, String);

/// `(id, sequence, biological)` triples packed into fragments.
pub(super) fn fragments(specs: &[(&str, &str, bool)]) -> Vec<LoadedFragment> {
    specs
        .iter()
        .map(|(id, sequence, biological)| LoadedFragment {
            id: id.to_string(),
            sequence: sequence.as_bytes().to_vec(),
            biological: *biological,
        })
        .collect()
}

pub(super) fn archive(
    accession: &str,
    specs: &[(&str, &str, bool)],
    blob_bases: usize,
) -> Box<dyn SequenceArchive> {
    Box::new(InMemoryArchive::pack(accession, fragments(specs), blob_bases).unwrap())
}

/// A single-blob buffer over `specs`, plus the shared archive it resolves
/// against.
pub(super) fn single_blob_buffer(
    matcher: Box<dyn PatternMatcher>,
    accession: &str,
    specs: &[(&str, &str, bool)],
) -> (BlobSearchBuffer, SharedArchive) {
    let mut archive = archive(accession, specs, usize::MAX);
    let blob = archive.next_blob().unwrap();
    let shared: SharedArchive = Arc::new(ArchiveLock::new(archive));
    let buffer = BlobSearchBuffer::new(matcher, accession.to_string(), shared.clone(), blob);
    (buffer, shared)
}

pub(super) fn drain(buffer: &mut dyn SearchBuffer) -> Vec<Match> {
    let mut matches = Vec::new();
    while let Some(found) = buffer.next_match().unwrap() {
        matches.push(found);
    }
    matches
}

/// Single-threaded reference: every buffer drained in hand-out order.
pub(super) fn drain_sequential(iterator: &dyn MatchIterator) -> Vec<Match> {
    let mut matches = Vec::new();
    while let Some(mut buffer) = iterator.next_buffer().unwrap() {
        matches.extend(drain(buffer.as_mut()));
    }
    matches
}

pub(super) fn match_keys(matches: &[Match]) -> BTreeSet<MatchKey> {
    matches
        .iter()
        .map(|m| {
            (
                m.accession().to_string(),
                m.fragment_id().to_string(),
                m.subject_string(),
            )
        })
        .collect()
}

/// Fragments of random length; roughly one in eight is technical.
pub(super) fn random_fragments(seed: u64, count: usize) -> Vec<LoadedFragment> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|index| {
            let length = rng.gen_range(3..33);
            let sequence = (0..length).map(|_| b"ACGT"[rng.gen_range(0..4)]).collect();
            LoadedFragment {
                id: format!("SRR42.{}", index + 1),
                sequence,
                biological: rng.gen_range(0..8) != 0,
            }
        })
        .collect()
}

/// Returns canned answers in order, then `None`; remembers every range it
/// was asked to search.
pub(super) struct ScriptedMatcher {
    answers: Vec<Option<(usize, usize)>>,
    pub(super) seen: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl ScriptedMatcher {
    pub(super) fn new(answers: Vec<Option<(usize, usize)>>) -> Self {
        Self {
            answers: answers.into_iter().rev().collect(),
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl PatternMatcher for ScriptedMatcher {
    fn first_match(&mut self, bytes: &[u8]) -> Option<(usize, usize)> {
        self.seen.lock().unwrap().push(bytes.to_vec());
        self.answers.pop().flatten()
    }
}

/// Serves blobs normally but fails every fragment lookup.
pub(super) struct FailingResolverArchive {
    pub(super) inner: InMemoryArchive,
}

impl BlobSource for FailingResolverArchive {
    fn has_more(&self) -> bool {
        self.inner.has_more()
    }

    fn next_blob(&mut self) -> Result<Blob> {
        self.inner.next_blob()
    }
}

impl FragmentResolver for FailingResolverArchive {
    fn resolve(&self, blob: &Blob, offset: usize) -> Result<FragmentInfo> {
        Err(SearchError::Metadata {
            blob: blob.row_label(),
            offset,
            reason: "corrupt fragment table".to_string(),
        })
    }
}

impl SequenceArchive for FailingResolverArchive {
    fn accession(&self) -> &str {
        self.inner.accession()
    }
}
