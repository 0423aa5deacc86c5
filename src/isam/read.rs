// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use super::IsamFile;
use crate::{
    record::{pad_to, Slot},
    Error,
};
use std::cmp::Ordering;

/// A key (trimmed at the first NUL) and its value, as returned by the
/// cursor reads.
pub type KvPair = (Vec<u8>, Vec<u8>);

impl IsamFile {
    /// Positions the cursor on the last valid record with a key smaller
    /// than `key`.
    ///
    /// The following [`read_next`](IsamFile::read_next) then yields the
    /// record with `key` if it exists, or the smallest larger key
    /// otherwise. An empty key rewinds to the start of the file.
    ///
    /// # Errors
    ///
    /// Returns an I/O error variant if a block cannot be loaded.
    pub fn set_key<K: AsRef<[u8]>>(&mut self, key: K) -> crate::Result<()> {
        let res = self.set_key_inner(key.as_ref());
        self.finish(res)
    }

    fn set_key_inner(&mut self, key: &[u8]) -> crate::Result<()> {
        if matches!(key.first(), None | Some(&0)) {
            // rewind to the dummy first record
            self.cursor = 0;
            return Ok(());
        }

        let key = pad_to(key, self.key_len());
        let block = self.index.key_to_block(&key)?;
        let mut cur = self.head.ordinal(block, 0);

        // skip all records with smaller keys
        loop {
            let (head, ord) = self.probe(cur, &key)?;
            if ord != Ordering::Greater || head.next == 0 {
                break;
            }
            cur = head.next;
        }

        // back up to the last valid record with a smaller key; ordinal 0
        // is a legal resting point even though it is not valid
        loop {
            let (head, ord) = self.probe(cur, &key)?;
            if ord == Ordering::Greater && head.is_valid() {
                break;
            }
            cur = head.previous;
            if cur == 0 {
                break;
            }
        }

        self.cursor = cur;
        Ok(())
    }

    /// Reads the next valid record and advances the cursor to it.
    ///
    /// # Errors
    ///
    /// Returns [`EndOfFile`](Error::EndOfFile) past the last valid
    /// record, or an I/O error variant.
    pub fn read_next(&mut self) -> crate::Result<KvPair> {
        let res = self.read_next_inner();
        self.finish(res)
    }

    fn read_next_inner(&mut self) -> crate::Result<KvPair> {
        let mut cur = self.cursor;
        loop {
            let head = self.rec_head(cur)?;
            if head.next == 0 {
                return Err(Error::EndOfFile);
            }
            cur = head.next;
            if self.rec_head(cur)?.is_valid() {
                break;
            }
        }

        self.cursor = cur;
        self.read_record(cur)
    }

    /// Reads the record under the cursor, then backs the cursor up to the
    /// preceding valid record (or the start of the file).
    ///
    /// # Errors
    ///
    /// Returns [`StartOfFile`](Error::StartOfFile) if the cursor is not
    /// on a valid record, or an I/O error variant.
    pub fn read_prev(&mut self) -> crate::Result<KvPair> {
        let res = self.read_prev_inner();
        self.finish(res)
    }

    fn read_prev_inner(&mut self) -> crate::Result<KvPair> {
        if !self.rec_head(self.cursor)?.is_valid() {
            return Err(Error::StartOfFile);
        }

        let pair = self.read_record(self.cursor)?;

        let mut cur = self.cursor;
        loop {
            let head = self.rec_head(cur)?;
            cur = head.previous;
            if cur == 0 || self.rec_head(cur)?.is_valid() {
                break;
            }
        }

        self.cursor = cur;
        Ok(pair)
    }

    /// Reads the value of the record with exactly this key.
    ///
    /// # Errors
    ///
    /// Returns [`NoSuchKey`](Error::NoSuchKey) if a different key is
    /// found, [`EndOfFile`](Error::EndOfFile) if the walk runs off the
    /// end of the file, or an I/O error variant.
    pub fn read_by_key<K: AsRef<[u8]>>(&mut self, key: K) -> crate::Result<Vec<u8>> {
        let res = self.read_by_key_inner(key.as_ref());
        self.finish(res)
    }

    fn read_by_key_inner(&mut self, key: &[u8]) -> crate::Result<Vec<u8>> {
        self.set_key_inner(key)?;
        let (found, data) = self.read_next_inner()?;

        if pad_to(&found, self.key_len()) != pad_to(key, self.key_len()) {
            return Err(Error::NoSuchKey);
        }
        Ok(data)
    }

    /// Key (trimmed at the NUL padding) and value of the slot at `ordinal`.
    pub(crate) fn read_record(&mut self, ordinal: u64) -> crate::Result<KvPair> {
        let slot = self.fetch(self.head.block_of(ordinal))?;
        let view = Slot::new(self.cache.buf(slot), &self.head, self.head.slot_of(ordinal));
        let key = view
            .key()
            .iter()
            .copied()
            .take_while(|&b| b != 0)
            .collect();
        Ok((key, view.data().to_vec()))
    }
}
