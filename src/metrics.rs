// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use std::sync::atomic::{AtomicU64, Ordering::Relaxed};

/// Running block cache counters, accumulated across operations.
#[derive(Debug, Default)]
pub struct Metrics {
    cache_calls: AtomicU64,
    disk_reads: AtomicU64,
    disk_writes: AtomicU64,
}

impl Metrics {
    pub fn count_cache_call(&self) {
        self.cache_calls.fetch_add(1, Relaxed);
    }

    pub fn count_disk_read(&self) {
        self.disk_reads.fetch_add(1, Relaxed);
    }

    pub fn count_disk_write(&self) {
        self.disk_writes.fetch_add(1, Relaxed);
    }

    /// Snapshots the counters and resets them to zero.
    pub fn take(&self) -> CacheStats {
        CacheStats {
            cache_calls: self.cache_calls.swap(0, Relaxed),
            disk_reads: self.disk_reads.swap(0, Relaxed),
            disk_writes: self.disk_writes.swap(0, Relaxed),
        }
    }
}

/// Block cache activity since the previous snapshot.
///
/// Returned by [`IsamFile::cache_stats`](crate::IsamFile::cache_stats),
/// which resets the running counters.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct CacheStats {
    /// Number of block lookups that went through the cache.
    pub cache_calls: u64,

    /// Number of blocks read from disk.
    pub disk_reads: u64,

    /// Number of block and header writes to disk.
    pub disk_writes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taking_stats_resets_counters() {
        let metrics = Metrics::default();
        metrics.count_cache_call();
        metrics.count_cache_call();
        metrics.count_disk_read();
        metrics.count_disk_write();

        assert_eq!(
            CacheStats {
                cache_calls: 2,
                disk_reads: 1,
                disk_writes: 1,
            },
            metrics.take()
        );
        assert_eq!(CacheStats::default(), metrics.take());
    }
}
