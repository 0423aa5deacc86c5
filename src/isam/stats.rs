// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use super::IsamFile;
use crate::record::{key_str_len, Slot, FLAG_SPECIAL};

/// Occupancy of one block class (regular or overflow).
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct BlockClassStats {
    /// Blocks without any used slot
    pub blocks_empty: u64,

    /// Blocks with both used and free slots
    pub blocks_partial: u64,

    /// Blocks whose slots are all used
    pub blocks_full: u64,

    /// Smallest observed number of used slots in a block
    pub used_min: u64,

    /// Largest observed number of used slots in a block
    pub used_max: u64,

    /// Average number of used slots per block, rounded down
    pub used_average: u64,

    /// Total free slots in this class
    pub records_empty: u64,

    /// Total used slots in this class
    pub records_used: u64,
}

#[derive(Default)]
struct ClassAccumulator {
    stats: BlockClassStats,
    used_min: Option<u64>,
    used_sum: u64,
}

impl ClassAccumulator {
    fn add_block(&mut self, used: u64, empty: u64, slots: u64) {
        self.stats.records_used += used;
        self.stats.records_empty += empty;

        if empty == slots {
            self.stats.blocks_empty += 1;
        } else if used == slots {
            self.stats.blocks_full += 1;
        } else {
            self.stats.blocks_partial += 1;
        }

        self.used_min = Some(self.used_min.map_or(used, |min| min.min(used)));
        self.stats.used_max = self.stats.used_max.max(used);
        self.used_sum += used;
    }

    fn finish(mut self) -> BlockClassStats {
        let blocks =
            self.stats.blocks_empty + self.stats.blocks_partial + self.stats.blocks_full;
        if blocks > 0 {
            self.stats.used_average = self.used_sum / blocks;
        }
        self.stats.used_min = self.used_min.unwrap_or(0);
        self.stats
    }
}

/// Statistics gathered by a full scan of the file.
///
/// Returned by [`IsamFile::file_stats`]. The dummy first record counts as
/// a used slot; deleted sticky slots count as free.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct FileStats {
    /// Occupancy of the regular (indexed) block area
    pub regular: BlockClassStats,

    /// Occupancy of the overflow area
    pub overflow: BlockClassStats,

    /// Shortest stored key, in bytes before the NUL padding
    pub key_min: u64,

    /// Longest stored key
    pub key_max: u64,

    /// Average stored key length, rounded down
    pub key_average: u64,
}

impl IsamFile {
    /// Scans all blocks and collects occupancy and key-length statistics.
    ///
    /// Leaves the file positioned at its start, like
    /// [`set_key`](IsamFile::set_key) with an empty key.
    ///
    /// # Errors
    ///
    /// Returns an I/O error variant if a block cannot be loaded.
    pub fn file_stats(&mut self) -> crate::Result<FileStats> {
        let res = self.file_stats_inner();
        self.finish(res)
    }

    fn file_stats_inner(&mut self) -> crate::Result<FileStats> {
        let mut regular = ClassAccumulator::default();
        let mut overflow = ClassAccumulator::default();

        let mut key_min: Option<u64> = None;
        let mut key_max = 0u64;
        let mut key_sum = 0u64;
        let mut key_count = 0u64;

        let slots = self.head.records_per_block;

        for block in 0..self.head.cur_blocks {
            let cache_slot = self.fetch(block)?;

            let mut used = 0;
            let mut empty = 0;

            for rec_no in 0..slots {
                let view = Slot::new(self.cache.buf(cache_slot), &self.head, rec_no);
                let head = view.head();

                if head.is_valid() {
                    used += 1;

                    let len = key_str_len(view.key()) as u64;
                    key_min = Some(key_min.map_or(len, |min| min.min(len)));
                    key_max = key_max.max(len);
                    key_sum += len;
                    key_count += 1;
                } else if head.status & FLAG_SPECIAL != 0 {
                    // the dummy first record occupies its slot
                    used += 1;
                } else {
                    empty += 1;
                }
            }

            if block < self.head.block_count {
                regular.add_block(used, empty, slots);
            } else {
                overflow.add_block(used, empty, slots);
            }
        }

        // leave the file in a well-defined position
        self.fetch(0)?;
        self.cursor = 0;

        Ok(FileStats {
            regular: regular.finish(),
            overflow: overflow.finish(),
            key_min: key_min.unwrap_or(0),
            key_max,
            key_average: if key_count > 0 { key_sum / key_count } else { 0 },
        })
    }
}
