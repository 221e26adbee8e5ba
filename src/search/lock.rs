use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::search::error::{Result, SearchError};

/// Snapshot of how often an [`ArchiveLock`] has been taken and given back.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LockStats {
    pub acquisitions: u64,
    pub releases: u64,
}

impl LockStats {
    pub fn held(&self) -> u64 {
        self.acquisitions - self.releases
    }
}

/// The single mutual-exclusion point over an open archive. Shared behind an
/// `Arc` by the iterator and every buffer it hands out.
#[derive(Debug)]
pub struct ArchiveLock<T> {
    inner: Mutex<T>,
    acquisitions: AtomicU64,
    releases: AtomicU64,
}

impl<T> ArchiveLock<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(value),
            acquisitions: AtomicU64::new(0),
            releases: AtomicU64::new(0),
        }
    }

    /// Blocks until the lock is free. The lock is released when the returned
    /// guard goes out of scope, whichever way the scope is left.
    pub fn acquire(&self) -> Result<ArchiveGuard<'_, T>> {
        let guard = self.inner.lock().map_err(|_| SearchError::LockPoisoned)?;
        self.acquisitions.fetch_add(1, Ordering::AcqRel);
        Ok(ArchiveGuard { guard, lock: self })
    }

    pub fn stats(&self) -> LockStats {
        LockStats {
            acquisitions: self.acquisitions.load(Ordering::Acquire),
            releases: self.releases.load(Ordering::Acquire),
        }
    }
}

pub struct ArchiveGuard<'a, T> {
    guard: MutexGuard<'a, T>,
    lock: &'a ArchiveLock<T>,
}

impl<T> Deref for ArchiveGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.guard
    }
}

impl<T> DerefMut for ArchiveGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.guard
    }
}

impl<T> Drop for ArchiveGuard<'_, T> {
    fn drop(&mut self) {
        // counted before the mutex itself unlocks (field drop follows)
        self.lock.releases.fetch_add(1, Ordering::AcqRel);
    }
}
