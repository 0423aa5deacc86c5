// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

mod read;
mod remove;
pub mod stats;
mod write;

pub use read::KvPair;

use crate::{
    cache::BlockCache,
    coding::{Decode, DecodeError, Encode},
    config::Config,
    error::ErrorKind,
    file,
    header::{FileHeader, HEADER_LEN},
    index::{Index, IndexError},
    metrics::{CacheStats, Metrics},
    record::{pad_to, RecordHead, Slot, SlotMut, FLAG_SPECIAL},
    Error,
};
use std::{
    cell::Cell,
    cmp::Ordering,
    fs::{File, OpenOptions},
    path::Path,
};

/// A single-file ISAM key-value store.
///
/// Records carry fixed-length keys and fixed-length opaque values and are
/// kept in ascending key order by a doubly-linked list threaded through
/// the record slots. A static index narrows every key lookup down to the
/// data block where the ordered walk starts.
///
/// A handle owns its file exclusively and performs strictly synchronous
/// I/O; there is no locking and no background work.
pub struct IsamFile {
    fd: File,
    head: FileHeader,
    index: Index,
    cache: BlockCache,
    metrics: Metrics,

    /// The highest key currently in the file, padded to the key length
    max_key: Box<[u8]>,

    /// Flat ordinal of the record the file is positioned on
    cursor: u64,

    last_error: Cell<ErrorKind>,
}

impl std::fmt::Debug for IsamFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "IsamFile(records={}, blocks={})",
            self.head.record_count, self.head.cur_blocks,
        )
    }
}

impl IsamFile {
    pub(crate) fn create(config: Config) -> crate::Result<Self> {
        if !(8..=40).contains(&config.key_len) {
            return Err(Error::KeyLen);
        }

        // an existing file is never touched; a dangling link counts too
        if std::fs::metadata(&config.path).is_ok() {
            return Err(Error::FileExists);
        }
        if std::fs::symlink_metadata(&config.path).is_ok() {
            return Err(Error::LinkExists);
        }

        let mut fd = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(&config.path)
            .map_err(Error::OpenFail)?;

        let index = Index::new(config.block_count, config.key_len as usize);

        let mut head = FileHeader::new(
            config.key_len,
            config.data_len,
            config.records_per_block,
            config.block_count,
        );
        head.data_start = (HEADER_LEN + index.serialized_len()) as u64;

        let metrics = Metrics::default();
        head.write_to(&mut fd, &metrics)?;
        file::write_all_at(&mut fd, HEADER_LEN as u64, &index.encode_into_vec())?;

        // block 0 starts with the dummy first record, which anchors the
        // previous-chain for the lifetime of the file
        let mut cache = BlockCache::new(head.block_size());
        let block = vec![0u8; head.block_size()];
        let slot = cache.insert(0, &block);
        SlotMut::new(cache.buf_mut(slot), &head, 0).set_status(FLAG_SPECIAL);
        cache.write_back(&mut fd, &head, &metrics, slot)?;

        head.cur_blocks = 1;
        head.write_to(&mut fd, &metrics)?;

        log::debug!(
            "created {:?}: key_len={}, data_len={}, records_per_block={}, block_count={}",
            config.path,
            head.key_len,
            head.data_len,
            head.records_per_block,
            head.block_count,
        );

        let key_len = head.key_len as usize;

        Ok(Self {
            fd,
            head,
            index,
            cache,
            metrics,
            max_key: vec![0; key_len].into_boxed_slice(),
            cursor: 0,
            last_error: Cell::new(ErrorKind::NoError),
        })
    }

    /// Opens an existing ISAM file read-write.
    ///
    /// # Errors
    ///
    /// Returns [`NoSuchFile`](Error::NoSuchFile) if the path names no
    /// file, [`BadMagic`](Error::BadMagic) /
    /// [`BadVersion`](Error::BadVersion) /
    /// [`HeaderError`](Error::HeaderError) if the header does not
    /// describe a supported ISAM file, or an I/O error variant.
    pub fn open<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();

        if std::fs::metadata(path).is_err() {
            return Err(Error::NoSuchFile);
        }

        let mut fd = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(Error::OpenFail)?;

        let head = FileHeader::decode_from(&mut fd).map_err(|e| match e {
            DecodeError::Io(e) => Error::ReadError(e),
            DecodeError::InvalidHeader(_) => Error::HeaderError("file header"),
        })?;
        head.validate()?;

        // the index image sits right after the header
        let index = Index::decode_from(&mut fd).map_err(IndexError::from)?;
        if index.key_len() != head.key_len as usize {
            return Err(Error::Index(IndexError::Corrupt("key length mismatch")));
        }

        if head.is_updating() {
            log::warn!("{path:?} was left mid-update; no recovery is attempted");
        }

        let key_len = head.key_len as usize;
        let block_size = head.block_size();

        let mut file = Self {
            fd,
            head,
            index,
            cache: BlockCache::new(block_size),
            metrics: Metrics::default(),
            max_key: vec![0; key_len].into_boxed_slice(),
            cursor: 0,
            last_error: Cell::new(ErrorKind::NoError),
        };

        // the maximum key is not part of the header; load it from its record
        let max_ord = file.head.max_key_rec;
        let slot = file.fetch(file.head.block_of(max_ord))?;
        let key = Slot::new(file.cache.buf(slot), &file.head, file.head.slot_of(max_ord)).key();
        file.max_key.copy_from_slice(key);

        log::debug!(
            "opened {path:?}: {} records in {} blocks",
            file.head.record_count,
            file.head.cur_blocks,
        );

        Ok(file)
    }

    /// Closes the file.
    ///
    /// Every mutation is written through when it happens, so this is a
    /// formality; dropping the handle is equivalent.
    ///
    /// # Errors
    ///
    /// Currently infallible; the signature leaves room for a flush step.
    pub fn close(self) -> crate::Result<()> {
        Ok(())
    }

    /// Number of live records, excluding the hidden dummy first record.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.head.record_count
    }

    /// Whether the file holds no live records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The fixed key length in bytes.
    #[must_use]
    pub fn key_len(&self) -> usize {
        self.head.key_len as usize
    }

    /// The fixed value length in bytes.
    #[must_use]
    pub fn data_len(&self) -> usize {
        self.head.data_len as usize
    }

    /// Block cache counters since the previous call; reading resets them.
    pub fn cache_stats(&self) -> CacheStats {
        self.metrics.take()
    }

    /// The error kind of the most recent failed operation, or
    /// [`ErrorKind::NoError`] after a successful one.
    pub fn last_error(&self) -> ErrorKind {
        self.last_error.get()
    }

    #[doc(hidden)]
    pub fn block_for_key<K: AsRef<[u8]>>(&self, key: K) -> crate::Result<u64> {
        let key = pad_to(key.as_ref(), self.key_len());
        Ok(self.index.key_to_block(&key)?)
    }

    pub(crate) fn finish<T>(&self, res: crate::Result<T>) -> crate::Result<T> {
        self.last_error.set(match &res {
            Ok(_) => ErrorKind::NoError,
            Err(e) => e.kind(),
        });
        res
    }

    pub(crate) fn fetch(&mut self, block: u64) -> crate::Result<usize> {
        self.cache
            .fetch(&mut self.fd, &mut self.head, &self.metrics, block)
    }

    pub(crate) fn write_block(&mut self, slot: usize) -> crate::Result<()> {
        self.cache
            .write_back(&mut self.fd, &self.head, &self.metrics, slot)
    }

    pub(crate) fn write_head(&mut self) -> crate::Result<()> {
        self.head.write_to(&mut self.fd, &self.metrics)
    }

    /// Rewrites the index image in place after it grew.
    pub(crate) fn write_index(&mut self) -> crate::Result<()> {
        file::write_all_at(&mut self.fd, HEADER_LEN as u64, &self.index.encode_into_vec())
    }

    /// Record header of the slot at `ordinal`, read through the cache.
    pub(crate) fn rec_head(&mut self, ordinal: u64) -> crate::Result<RecordHead> {
        let slot = self.fetch(self.head.block_of(ordinal))?;
        Ok(Slot::new(self.cache.buf(slot), &self.head, self.head.slot_of(ordinal)).head())
    }

    /// Record header plus the ordering of `key` against the stored key.
    pub(crate) fn probe(&mut self, ordinal: u64, key: &[u8]) -> crate::Result<(RecordHead, Ordering)> {
        let slot = self.fetch(self.head.block_of(ordinal))?;
        let view = Slot::new(self.cache.buf(slot), &self.head, self.head.slot_of(ordinal));
        Ok((view.head(), key.cmp(view.key())))
    }

    /// First free slot in the cached block, honoring the reservation of
    /// the last slot where requested.
    pub(crate) fn first_free_in(&self, cache_slot: usize, reserve_last: bool) -> Option<u64> {
        let limit = if reserve_last {
            self.head.records_per_block - 1
        } else {
            self.head.records_per_block
        };
        (0..limit).find(|&rec_no| {
            Slot::new(self.cache.buf(cache_slot), &self.head, rec_no)
                .head()
                .is_free()
        })
    }
}
