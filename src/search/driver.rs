use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Sender};

use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, info};

use crate::search::data::Match;
use crate::search::error::{Result, SearchError};
use crate::search::iterator::MatchIterator;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SearchOptions {
    pub threads: usize,
    /// Stop once this many matches have been delivered.
    pub max_matches: Option<usize>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            threads: num_cpus::get(),
            max_matches: None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub buffers: usize,
    pub matches: usize,
}

/// A rayon pool sized once from [`SearchOptions`] and reused for every
/// accession searched with it.
pub struct SearchPool {
    pool: ThreadPool,
    options: SearchOptions,
}

impl SearchPool {
    pub fn new(options: SearchOptions) -> Result<Self> {
        if options.threads == 0 {
            return Err(SearchError::Initialization(
                "at least one worker thread is required".to_string(),
            ));
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(options.threads)
            .thread_name(|index| format!("blob-search-{index}"))
            .build()
            .map_err(|err| SearchError::Initialization(err.to_string()))?;
        debug!(threads = options.threads, "search pool ready");
        Ok(Self { pool, options })
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Drains every buffer of `iterator` on the pool's workers and hands each
    /// match to `on_match` on the calling thread. Matches from different
    /// buffers arrive in no particular order.
    pub fn for_each_match<F>(&self, iterator: &dyn MatchIterator, mut on_match: F) -> Result<SearchStats>
    where
        F: FnMut(Match) -> Result<()>,
    {
        let workers = self.options.threads;
        let max_matches = self.options.max_matches;
        let stop = AtomicBool::new(false);
        let buffers = AtomicUsize::new(0);
        let mut delivered = 0usize;
        let mut first_error: Option<SearchError> = None;

        self.pool.in_place_scope(|scope| {
            let (tx, rx) = mpsc::channel::<Result<Match>>();
            for _ in 0..workers {
                let tx = tx.clone();
                let stop = &stop;
                let buffers = &buffers;
                scope.spawn(move |_| drain_buffers(iterator, tx, stop, buffers));
            }
            drop(tx);

            for item in rx {
                if stop.load(Ordering::Acquire) {
                    continue;
                }
                match item {
                    Ok(found) => {
                        if let Err(err) = on_match(found) {
                            first_error = Some(err);
                            stop.store(true, Ordering::Release);
                            continue;
                        }
                        delivered += 1;
                        if max_matches.is_some_and(|max| delivered >= max) {
                            stop.store(true, Ordering::Release);
                        }
                    }
                    Err(err) => {
                        first_error = Some(err);
                        stop.store(true, Ordering::Release);
                    }
                }
            }
        });

        if let Some(err) = first_error {
            return Err(err);
        }
        let stats = SearchStats {
            buffers: buffers.load(Ordering::Acquire),
            matches: delivered,
        };
        info!(
            accession = iterator.accession(),
            buffers = stats.buffers,
            matches = stats.matches,
            "search finished"
        );
        Ok(stats)
    }

    pub fn collect_matches(&self, iterator: &dyn MatchIterator) -> Result<Vec<Match>> {
        let mut matches = Vec::new();
        self.for_each_match(iterator, |found| {
            matches.push(found);
            Ok(())
        })?;
        Ok(matches)
    }
}

/// One-off search on a pool built for this call only. Use [`SearchPool`]
/// when searching several accessions.
pub fn for_each_match<F>(
    iterator: &dyn MatchIterator,
    options: SearchOptions,
    on_match: F,
) -> Result<SearchStats>
where
    F: FnMut(Match) -> Result<()>,
{
    SearchPool::new(options)?.for_each_match(iterator, on_match)
}

pub fn collect_matches(iterator: &dyn MatchIterator, options: SearchOptions) -> Result<Vec<Match>> {
    SearchPool::new(options)?.collect_matches(iterator)
}

/// Worker loop: take a buffer, drain it, repeat until the iterator runs dry,
/// the receiver hangs up, or the stop flag is raised.
fn drain_buffers(
    iterator: &dyn MatchIterator,
    tx: Sender<Result<Match>>,
    stop: &AtomicBool,
    buffers: &AtomicUsize,
) {
    while !stop.load(Ordering::Acquire) {
        let mut buffer = match iterator.next_buffer() {
            Ok(Some(buffer)) => buffer,
            Ok(None) => return,
            Err(err) => {
                let _ = tx.send(Err(err));
                return;
            }
        };
        buffers.fetch_add(1, Ordering::AcqRel);
        debug!(buffer = %buffer.buffer_id(), "draining buffer");
        while !stop.load(Ordering::Acquire) {
            match buffer.next_match() {
                Ok(Some(found)) => {
                    if tx.send(Ok(found)).is_err() {
                        return;
                    }
                }
                Ok(None) => break,
                Err(err) => {
                    let _ = tx.send(Err(err));
                    return;
                }
            }
        }
    }
}
