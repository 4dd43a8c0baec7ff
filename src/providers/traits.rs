use thiserror::Error;

use crate::selector::Candidate;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TerminateError {
    #[error("process {0} not found")]
    NotFound(u32),
    #[error("permission denied terminating process {0}")]
    Denied(u32),
    #[error("termination backend error: {0}")]
    Backend(String),
}

/// Page counters sampled at the start of a round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryStats {
    pub free_pages: u64,
    pub file_pages: u64,
    pub shmem_pages: u64,
    pub swapcache_pages: u64,
    pub active_anon: u64,
    pub inactive_anon: u64,
    pub active_file: u64,
    pub inactive_file: u64,
}

impl MemoryStats {
    /// Free and file-page counts only; the LRU lists stay empty.
    pub fn new(free_pages: u64, file_pages: u64) -> Self {
        Self {
            free_pages,
            file_pages,
            ..Default::default()
        }
    }

    /// File pages that can actually be dropped: file minus shmem and swap
    /// cache, or zero when those exceed the file count.
    #[must_use]
    pub fn other_file(&self) -> u64 {
        let unreclaimable = self.shmem_pages.saturating_add(self.swapcache_pages);
        if unreclaimable < self.file_pages {
            self.file_pages - unreclaimable
        } else {
            0
        }
    }

    /// Sum of the LRU lists, reported to the caller as "could be reclaimed".
    #[must_use]
    pub fn reclaimable_estimate(&self) -> u64 {
        self.active_anon
            .saturating_add(self.inactive_anon)
            .saturating_add(self.active_file)
            .saturating_add(self.inactive_file)
    }
}

/// Snapshot of the live process set.
pub trait ProcessProvider: Send + Sync {
    fn enumerate(&self) -> Vec<Candidate>;
}

/// Current memory counters.
pub trait MemoryProbe: Send + Sync {
    fn sample(&self) -> MemoryStats;
}

/// Fire-and-forget kill. Must tolerate being called twice for one id.
pub trait Terminator: Send + Sync {
    fn terminate(&self, victim: &Candidate) -> Result<(), TerminateError>;
}
