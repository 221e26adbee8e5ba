use std::collections::HashSet;
use std::sync::Mutex;
use std::thread;

use crate::search::{
    Algorithm, BlobMatchIterator, FragmentMatchIterator, InMemoryArchive, MatchIterator,
    SearchError, SearchOptions, SearchPool, collect_matches, for_each_match,
};

use super::helpers::{
    FailingResolverArchive, drain_sequential, fragments, match_keys, random_fragments,
};

fn options(threads: usize) -> SearchOptions {
    SearchOptions {
        threads,
        max_matches: None,
    }
}

fn blob_iterator(pattern: &str, seed: u64, blob_bases: usize) -> BlobMatchIterator {
    let factory = Algorithm::Literal.factory(pattern).unwrap();
    let archive = InMemoryArchive::pack("SRR42", random_fragments(seed, 240), blob_bases).unwrap();
    BlobMatchIterator::new(factory, Box::new(archive))
}

#[test]
fn four_workers_match_sequential_result_set() {
    let sequential_iterator = blob_iterator("ACG", 5, 1000);
    let sequential = drain_sequential(&sequential_iterator);
    let parallel_iterator = blob_iterator("ACG", 5, 1000);
    let stats = for_each_match(&parallel_iterator, options(4), |_| Ok(())).unwrap();
    let parallel = collect_matches(&blob_iterator("ACG", 5, 1000), options(4)).unwrap();

    assert!(stats.buffers >= 4);
    assert_eq!(stats.matches, sequential.len());
    assert!(!sequential.is_empty());
    assert_eq!(parallel.len(), sequential.len());
    assert_eq!(match_keys(&parallel), match_keys(&sequential));
    assert_eq!(parallel_iterator.lock_stats().held(), 0);
}

#[test]
fn concurrent_next_buffer_never_repeats_a_blob() {
    let iterator = blob_iterator("ACGT", 11, 64);
    let seen = Mutex::new(Vec::new());
    thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                while let Some(buffer) = iterator.next_buffer().unwrap() {
                    seen.lock().unwrap().push(buffer.buffer_id());
                }
                assert!(iterator.next_buffer().unwrap().is_none());
            });
        }
    });
    let seen = seen.into_inner().unwrap();
    let distinct: HashSet<_> = seen.iter().collect();
    assert_eq!(distinct.len(), seen.len());

    let expected = {
        let reference = blob_iterator("ACGT", 11, 64);
        let mut count = 0;
        while reference.next_buffer().unwrap().is_some() {
            count += 1;
        }
        count
    };
    assert_eq!(seen.len(), expected);
}

#[test]
fn fragment_strategy_runs_in_parallel_too() {
    let factory = Algorithm::Literal.factory("ACG").unwrap();
    let fragment = FragmentMatchIterator::new(
        factory,
        Box::new(InMemoryArchive::pack("SRR42", random_fragments(5, 240), 1600).unwrap()),
    );
    let by_fragment = collect_matches(&fragment, options(3)).unwrap();
    let by_blob = drain_sequential(&blob_iterator("ACG", 5, 1600));
    assert_eq!(match_keys(&by_fragment), match_keys(&by_blob));
}

#[test]
fn max_matches_stops_delivery() {
    let iterator = blob_iterator("A", 3, 200);
    let stats = for_each_match(
        &iterator,
        SearchOptions {
            threads: 2,
            max_matches: Some(5),
        },
        |_| Ok(()),
    )
    .unwrap();
    assert_eq!(stats.matches, 5);
}

#[test]
fn resolver_failure_surfaces_from_driver() {
    let inner = InMemoryArchive::pack(
        "acc1",
        fragments(&[("F1", "ACGT", true), ("F2", "ACGT", true)]),
        4,
    )
    .unwrap();
    let factory = Algorithm::Literal.factory("ACGT").unwrap();
    let iterator = BlobMatchIterator::new(factory, Box::new(FailingResolverArchive { inner }));
    let err = collect_matches(&iterator, options(2)).unwrap_err();
    assert!(matches!(err, SearchError::Metadata { .. }));
    assert_eq!(iterator.lock_stats().held(), 0);
}

#[test]
fn callback_error_stops_search() {
    let iterator = blob_iterator("ACG", 5, 100);
    let result = for_each_match(&iterator, options(2), |_| {
        Err(SearchError::Initialization("sink closed".to_string()))
    });
    assert!(matches!(result, Err(SearchError::Initialization(reason)) if reason == "sink closed"));
}

#[test]
fn zero_threads_is_rejected() {
    let iterator = blob_iterator("ACG", 5, 100);
    assert!(matches!(
        collect_matches(&iterator, options(0)),
        Err(SearchError::Initialization(_))
    ));
}

#[test]
fn one_pool_serves_several_accessions() {
    let pool = SearchPool::new(options(3)).unwrap();
    assert_eq!(pool.threads(), 3);
    for seed in [5, 8, 11] {
        let expected = drain_sequential(&blob_iterator("ACG", seed, 300));
        let iterator = blob_iterator("ACG", seed, 300);
        let found = pool.collect_matches(&iterator).unwrap();
        assert_eq!(match_keys(&found), match_keys(&expected), "seed {seed}");
        assert_eq!(iterator.lock_stats().held(), 0);
    }
}

#[test]
fn pool_keeps_max_matches_per_search() {
    let pool = SearchPool::new(SearchOptions {
        threads: 2,
        max_matches: Some(3),
    })
    .unwrap();
    for _ in 0..2 {
        let stats = pool
            .for_each_match(&blob_iterator("A", 3, 200), |_| Ok(()))
            .unwrap();
        assert_eq!(stats.matches, 3);
    }
}

#[test]
fn zero_thread_pool_is_rejected() {
    assert!(matches!(
        SearchPool::new(options(0)),
        Err(SearchError::Initialization(_))
    ));
}

#[test]
fn stats_count_every_buffer() {
    let iterator = blob_iterator("ACG", 8, 500);
    let expected_buffers = {
        let reference = blob_iterator("ACG", 8, 500);
        let mut count = 0;
        while reference.next_buffer().unwrap().is_some() {
            count += 1;
        }
        count
    };
    let stats = for_each_match(&iterator, options(4), |_| Ok(())).unwrap();
    assert_eq!(stats.buffers, expected_buffers);
    assert!(iterator.next_buffer().unwrap().is_none());
}
