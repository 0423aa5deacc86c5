// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::{file, header::FileHeader, metrics::Metrics};
use std::fs::File;

/// Number of block buffers the cache holds in memory.
///
/// A design parameter: six buffers are enough to keep the up-to-three
/// blocks touched by one mutation plus their neighborhood resident.
pub const CACHE_SLOTS: usize = 6;

/// A fixed-capacity FIFO cache of raw block buffers.
///
/// All data block I/O goes through this cache. It is write-through: the
/// cache holds no dirty bit and callers must write a mutated block back
/// via [`BlockCache::write_back`] before anything else is fetched, so
/// eviction only ever discards clean buffers.
pub struct BlockCache {
    blocks: [Option<u64>; CACHE_SLOTS],
    buffers: Vec<Box<[u8]>>,
    last_in: usize,
}

// NOTE: slot indices come from `next_slot` or a resident-block scan and
// are always below `CACHE_SLOTS`, which also sizes `blocks` and `buffers`
#[allow(clippy::indexing_slicing)]
impl BlockCache {
    pub fn new(block_size: usize) -> Self {
        Self {
            blocks: [None; CACHE_SLOTS],
            buffers: (0..CACHE_SLOTS)
                .map(|_| vec![0; block_size].into_boxed_slice())
                .collect(),
            last_in: 0,
        }
    }

    /// The buffer of a filled cache slot.
    pub fn buf(&self, slot: usize) -> &[u8] {
        &self.buffers[slot]
    }

    pub fn buf_mut(&mut self, slot: usize) -> &mut [u8] {
        &mut self.buffers[slot]
    }

    /// Makes `block` resident and returns its slot.
    ///
    /// A block at or beyond the current end of the file extends the file:
    /// the chosen buffer is zeroed and written out, and the header is
    /// rewritten with the grown block count.
    pub fn fetch(
        &mut self,
        fd: &mut File,
        head: &mut FileHeader,
        metrics: &Metrics,
        block: u64,
    ) -> crate::Result<usize> {
        metrics.count_cache_call();

        if block >= head.cur_blocks {
            let slot = self.next_slot();
            self.buffers[slot].fill(0);
            self.blocks[slot] = Some(block);
            self.write_back(fd, head, metrics, slot)?;

            head.cur_blocks = block + 1;
            head.write_to(fd, metrics)?;

            log::trace!("extended file to {} blocks", head.cur_blocks);

            return Ok(slot);
        }

        if let Some(slot) = self.blocks.iter().position(|b| *b == Some(block)) {
            return Ok(slot);
        }

        let slot = self.next_slot();
        file::read_exact_at(fd, head.block_offset(block), &mut self.buffers[slot])?;
        self.blocks[slot] = Some(block);
        metrics.count_disk_read();

        Ok(slot)
    }

    /// Writes a cached block back to its position in the file.
    #[allow(clippy::expect_used)]
    pub fn write_back(
        &mut self,
        fd: &mut File,
        head: &FileHeader,
        metrics: &Metrics,
        slot: usize,
    ) -> crate::Result<()> {
        let block = self.blocks[slot].expect("cache slot must hold a block");
        file::write_all_at(fd, head.block_offset(block), &self.buffers[slot])?;
        metrics.count_disk_write();
        Ok(())
    }

    /// Places externally composed block contents into the next FIFO slot.
    pub fn insert(&mut self, block: u64, contents: &[u8]) -> usize {
        let slot = self.next_slot();
        self.buffers[slot].copy_from_slice(contents);
        self.blocks[slot] = Some(block);
        slot
    }

    fn next_slot(&mut self) -> usize {
        self.last_in = (self.last_in + 1) % CACHE_SLOTS;
        self.last_in
    }
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::coding::Encode;
    use test_log::test;

    fn setup() -> crate::Result<(File, FileHeader, Metrics)> {
        let mut fd = tempfile::tempfile().map_err(crate::Error::OpenFail)?;
        let mut head = FileHeader::new(8, 8, 4, 4);
        head.data_start = crate::header::HEADER_LEN as u64;
        let metrics = Metrics::default();
        file::write_all_at(&mut fd, 0, &head.encode_into_vec())?;
        Ok((fd, head, metrics))
    }

    #[test]
    fn fetch_extends_the_file() -> crate::Result<()> {
        let (mut fd, mut head, metrics) = setup()?;
        let mut cache = BlockCache::new(head.block_size());

        let slot = cache.fetch(&mut fd, &mut head, &metrics, 0)?;
        assert_eq!(1, head.cur_blocks);
        assert!(cache.buf(slot).iter().all(|&b| b == 0));

        // fresh block is written through plus a header rewrite
        let stats = metrics.take();
        assert_eq!(1, stats.cache_calls);
        assert_eq!(0, stats.disk_reads);
        assert_eq!(2, stats.disk_writes);

        Ok(())
    }

    #[test]
    fn fetch_hits_resident_blocks() -> crate::Result<()> {
        let (mut fd, mut head, metrics) = setup()?;
        let mut cache = BlockCache::new(head.block_size());

        let first = cache.fetch(&mut fd, &mut head, &metrics, 0)?;
        let again = cache.fetch(&mut fd, &mut head, &metrics, 0)?;
        assert_eq!(first, again);

        let stats = metrics.take();
        assert_eq!(2, stats.cache_calls);
        assert_eq!(0, stats.disk_reads);

        Ok(())
    }

    #[test]
    fn fifo_rotates_over_all_slots() -> crate::Result<()> {
        let (mut fd, mut head, metrics) = setup()?;
        let mut cache = BlockCache::new(head.block_size());

        // allocate more blocks than the cache holds
        let mut slots = Vec::new();
        for block in 0..(CACHE_SLOTS as u64 + 2) {
            slots.push(cache.fetch(&mut fd, &mut head, &metrics, block)?);
        }
        assert_eq!(CACHE_SLOTS as u64 + 2, head.cur_blocks);

        // the first two slots have been reused in FIFO order
        assert_eq!(slots[0], slots[CACHE_SLOTS]);
        assert_eq!(slots[1], slots[CACHE_SLOTS + 1]);

        // block 0 was evicted and must be read back from disk
        metrics.take();
        cache.fetch(&mut fd, &mut head, &metrics, 0)?;
        let stats = metrics.take();
        assert_eq!(1, stats.disk_reads);

        Ok(())
    }

    #[test]
    fn write_back_round_trips() -> crate::Result<()> {
        let (mut fd, mut head, metrics) = setup()?;
        let mut cache = BlockCache::new(head.block_size());

        let slot = cache.fetch(&mut fd, &mut head, &metrics, 0)?;
        cache.buf_mut(slot)[7] = 0xAB;
        cache.write_back(&mut fd, &head, &metrics, slot)?;

        // force eviction, then read back
        for block in 1..=CACHE_SLOTS as u64 {
            cache.fetch(&mut fd, &mut head, &metrics, block)?;
        }
        let slot = cache.fetch(&mut fd, &mut head, &metrics, 0)?;
        assert_eq!(0xAB, cache.buf(slot)[7]);

        Ok(())
    }
}
