mod archive;
mod blob;
mod data;
mod driver;
mod error;
mod fragment;
mod iterator;
mod loaders;
mod lock;
mod matcher;
#[cfg(test)]
mod tests;

pub use archive::{
    ArchiveOpener, BlobSource, DirectoryArchive, FragmentResolver, InMemoryArchive,
    SequenceArchive, SharedArchive,
};
pub use blob::{BlobMatchIterator, BlobSearchBuffer};
pub use data::{Blob, FragmentInfo, InputMode, Match};
pub use driver::{SearchOptions, SearchPool, SearchStats, collect_matches, for_each_match};
pub use error::{Result, SearchError};
pub use fragment::{FragmentMatchIterator, FragmentSearchBuffer};
pub use iterator::{MatchIterator, SearchBuffer, Strategy};
pub use loaders::{LoadedFragment, load_fragments_from_path};
pub use lock::{ArchiveGuard, ArchiveLock, LockStats};
pub use matcher::{
    Algorithm, ApproximateMatcher, LiteralMatcher, MatcherFactory, PatternMatcher,
};
