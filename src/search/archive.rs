use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::search::data::{Blob, FragmentInfo, InputMode};
use crate::search::error::{Result, SearchError};
use crate::search::lock::ArchiveLock;
use crate::search::loaders::{LoadedFragment, load_fragments_from_path};

/// Hands out an archive's blobs in storage order. Consuming; callers must
/// hold the archive lock.
pub trait BlobSource {
    fn has_more(&self) -> bool;
    fn next_blob(&mut self) -> Result<Blob>;
}

/// Maps a byte offset inside a blob to the fragment that owns it. Not
/// assumed thread-safe; callers must hold the archive lock.
pub trait FragmentResolver {
    fn resolve(&self, blob: &Blob, offset: usize) -> Result<FragmentInfo>;
}

pub trait SequenceArchive: BlobSource + FragmentResolver + Send {
    fn accession(&self) -> &str;
}

/// An open archive shared by an iterator and every buffer it hands out.
/// Blob pulls and fragment resolution both go through its lock.
pub type SharedArchive = Arc<ArchiveLock<Box<dyn SequenceArchive>>>;

/// Resolves `offset` under the archive lock, releasing the lock before the
/// result (or error) is handed back. Rejects fragments that do not own the
/// offset or run past the blob end.
pub(crate) fn resolve_locked(archive: &SharedArchive, blob: &Blob, offset: usize) -> Result<FragmentInfo> {
    let fragment = {
        let archive = archive.acquire()?;
        archive.resolve(blob, offset)
    }?;
    let owns_offset = fragment
        .checked_end()
        .is_some_and(|end| fragment.start <= offset && offset < end && end <= blob.len());
    if !owns_offset {
        return Err(SearchError::Metadata {
            blob: blob.row_label(),
            offset,
            reason: format!(
                "resolved fragment {} starts at {} with length {} which does not own the offset",
                fragment.id, fragment.start, fragment.length
            ),
        });
    }
    Ok(fragment)
}

pub trait ArchiveOpener: Send + Sync {
    fn open(&self, accession: &str) -> Result<Box<dyn SequenceArchive>>;
}

/// Fragments packed into blobs in memory, in the order they were loaded.
#[derive(Debug)]
pub struct InMemoryArchive {
    accession: String,
    blobs: VecDeque<Blob>,
}

impl InMemoryArchive {
    /// Packs fragments back-to-back, starting a new blob whenever the next
    /// fragment would push the current one past `blob_bases`. Every blob
    /// holds at least one fragment; rows are numbered from 1.
    pub fn pack(accession: &str, fragments: Vec<LoadedFragment>, blob_bases: usize) -> Result<Self> {
        if blob_bases == 0 {
            return Err(SearchError::Initialization(
                "blob size must be at least one base".to_string(),
            ));
        }
        let mut blobs = VecDeque::new();
        let mut data = Vec::new();
        let mut table = Vec::new();
        let mut first_row = 1i64;
        let mut row = 1i64;
        for fragment in fragments {
            if !table.is_empty() && data.len() + fragment.sequence.len() > blob_bases {
                let count = table.len() as u64;
                blobs.push_back(Blob::new(
                    std::mem::take(&mut data),
                    first_row,
                    count,
                    std::mem::take(&mut table),
                ));
                first_row = row;
            }
            table.push(FragmentInfo::new(
                fragment.id,
                data.len(),
                fragment.sequence.len(),
                fragment.biological,
            ));
            data.extend_from_slice(&fragment.sequence);
            row += 1;
        }
        if !table.is_empty() {
            let count = table.len() as u64;
            blobs.push_back(Blob::new(data, first_row, count, table));
        }
        debug!(accession, blobs = blobs.len(), "packed archive");
        Ok(Self {
            accession: accession.to_string(),
            blobs,
        })
    }

    /// Wraps blobs that were assembled elsewhere.
    pub fn from_blobs(accession: &str, blobs: Vec<Blob>) -> Self {
        Self {
            accession: accession.to_string(),
            blobs: blobs.into(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.blobs.len()
    }
}

impl BlobSource for InMemoryArchive {
    fn has_more(&self) -> bool {
        !self.blobs.is_empty()
    }

    fn next_blob(&mut self) -> Result<Blob> {
        self.blobs.pop_front().ok_or_else(|| SearchError::Metadata {
            blob: "<none>".to_string(),
            offset: 0,
            reason: format!("archive {} has no blobs left", self.accession),
        })
    }
}

impl FragmentResolver for InMemoryArchive {
    fn resolve(&self, blob: &Blob, offset: usize) -> Result<FragmentInfo> {
        let fragments = blob.fragments();
        let index = fragments.partition_point(|fragment| fragment.end() <= offset);
        match fragments.get(index) {
            Some(fragment) if fragment.contains(offset) => Ok(fragment.clone()),
            _ => Err(SearchError::Metadata {
                blob: blob.row_label(),
                offset,
                reason: format!("offset is not covered by any fragment (blob length {})", blob.len()),
            }),
        }
    }
}

impl SequenceArchive for InMemoryArchive {
    fn accession(&self) -> &str {
        &self.accession
    }
}

const ARCHIVE_EXTENSIONS: [&str; 5] = ["", ".fa", ".fasta", ".fq", ".fastq"];

/// Resolves accessions to FASTA/FASTQ files under a root directory and
/// loads them into an [`InMemoryArchive`].
#[derive(Clone, Debug)]
pub struct DirectoryArchive {
    root: PathBuf,
    blob_bases: usize,
    mode: InputMode,
}

impl DirectoryArchive {
    pub fn new(root: impl Into<PathBuf>, blob_bases: usize, mode: InputMode) -> Self {
        Self {
            root: root.into(),
            blob_bases,
            mode,
        }
    }

    /// First existing file for the accession, or the accession itself when it
    /// names a file. Returns the path and the accession id to report.
    pub fn locate(&self, accession: &str) -> Option<(PathBuf, String)> {
        let direct = Path::new(accession);
        if direct.is_file() {
            let id = accession_id_for_path(direct).unwrap_or_else(|| accession.to_string());
            return Some((direct.to_path_buf(), id));
        }
        ARCHIVE_EXTENSIONS
            .iter()
            .flat_map(|ext| [format!("{accession}{ext}"), format!("{accession}{ext}.gz")])
            .map(|name| self.root.join(name))
            .find(|path| path.is_file())
            .map(|path| (path, accession.to_string()))
    }
}

impl ArchiveOpener for DirectoryArchive {
    fn open(&self, accession: &str) -> Result<Box<dyn SequenceArchive>> {
        let (path, id) = self
            .locate(accession)
            .ok_or_else(|| SearchError::AccessionNotFound(accession.to_string()))?;
        debug!(accession = %id, path = %path.display(), "opening archive");
        let fragments = load_fragments_from_path(&path, self.mode, &id)
            .map_err(|err| SearchError::archive_open(&id, err))?;
        Ok(Box::new(InMemoryArchive::pack(&id, fragments, self.blob_bases)?))
    }
}

fn accession_id_for_path(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    let name = name.strip_suffix(".gz").unwrap_or(name);
    let stem = ARCHIVE_EXTENSIONS
        .iter()
        .filter(|ext| !ext.is_empty())
        .find_map(|ext| name.strip_suffix(ext))
        .unwrap_or(name);
    Some(stem.to_string())
}
