//! Parallel pattern search over blob-packed sequence archives.
//!
//! An archive stores many short fragments back-to-back in blobs. A
//! [`MatchIterator`] hands each blob to exactly one [`SearchBuffer`]; workers
//! drain their buffers concurrently, and every raw hit is attributed to the
//! fragment that owns it before it is reported as a [`Match`].
//!
//! ```no_run
//! use blob_search::{Algorithm, DirectoryArchive, InputMode, SearchOptions, Strategy, collect_matches};
//!
//! # fn main() -> blob_search::Result<()> {
//! let opener = DirectoryArchive::new("archives", 5_000_000, InputMode::Stream);
//! let factory = Algorithm::Literal.factory("ACGTACGT")?;
//! let iterator = Strategy::Blob.iterator(factory, &opener, "SRR000001")?;
//! for found in collect_matches(iterator.as_ref(), SearchOptions::default())? {
//!     println!("{}\t{}", found.accession(), found.fragment_id());
//! }
//! # Ok(())
//! # }
//! ```

pub mod search;

pub use search::{
    Algorithm, DirectoryArchive, InputMode, Match, MatchIterator, Result, SearchBuffer,
    SearchError, SearchOptions, SearchPool, SearchStats, Strategy, collect_matches, for_each_match,
};
