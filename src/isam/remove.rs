// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use super::IsamFile;
use crate::{
    record::{pad_to, Slot, SlotMut, FLAG_DELETED},
    Error,
};
use std::cmp::Ordering;

impl IsamFile {
    /// Deletes the record with this key.
    ///
    /// As a safeguard the caller must present the stored value; the full
    /// data length is compared byte for byte.
    ///
    /// The first record of a regular block is only marked deleted and
    /// stays linked, because the index keeps referencing its key; every
    /// other record is unlinked and its slot freed for reuse.
    ///
    /// # Errors
    ///
    /// Returns [`NullKey`](Error::NullKey) for an empty key,
    /// [`NoSuchKey`](Error::NoSuchKey) if no valid record carries the
    /// key, [`DataMismatch`](Error::DataMismatch) if the presented value
    /// disagrees, or an I/O error variant.
    pub fn delete<K: AsRef<[u8]>, V: AsRef<[u8]>>(&mut self, key: K, data: V) -> crate::Result<()> {
        let res = self.delete_inner(key.as_ref(), data.as_ref());
        self.finish(res)
    }

    pub(crate) fn delete_inner(&mut self, key: &[u8], data: &[u8]) -> crate::Result<()> {
        if matches!(key.first(), None | Some(&0)) {
            return Err(Error::NullKey);
        }

        let key = pad_to(key, self.key_len());
        let block = self.index.key_to_block(&key)?;
        let mut cur = self.head.ordinal(block, 0);

        // walk to the record carrying the key
        let head = loop {
            let (head, ord) = self.probe(cur, &key)?;
            match ord {
                Ordering::Greater if head.next != 0 => cur = head.next,
                Ordering::Equal => break head,
                _ => return Err(Error::NoSuchKey),
            }
        };
        if !head.is_valid() {
            return Err(Error::NoSuchKey);
        }

        let data = pad_to(data, self.data_len());
        let cache_slot = self.fetch(self.head.block_of(cur))?;
        {
            let view = Slot::new(self.cache.buf(cache_slot), &self.head, self.head.slot_of(cur));
            if view.data() != &*data {
                return Err(Error::DataMismatch);
            }
        }

        SlotMut::new(self.cache.buf_mut(cache_slot), &self.head, self.head.slot_of(cur))
            .set_status(FLAG_DELETED);

        self.head.record_count -= 1;
        self.head.set_updating(true);
        self.write_head()?;

        let rec_no = self.head.slot_of(cur);
        let block_no = self.head.block_of(cur);

        if rec_no == 0 && block_no < self.head.block_count {
            // the index references this key: keep the record linked and
            // its key intact, only the deleted mark goes to disk
            self.write_block(cache_slot)?;
            log::trace!("sticky delete in block {block_no}");
        } else {
            log::trace!("unlinking record {cur} in block {block_no}");

            // unlink: the predecessor always exists, a successor may not
            let prev_slot = self.fetch(self.head.block_of(head.previous))?;
            SlotMut::new(self.cache.buf_mut(prev_slot), &self.head, self.head.slot_of(head.previous))
                .set_next(head.next);
            self.write_block(prev_slot)?;

            if head.next != 0 {
                let next_slot = self.fetch(self.head.block_of(head.next))?;
                SlotMut::new(self.cache.buf_mut(next_slot), &self.head, self.head.slot_of(head.next))
                    .set_previous(head.previous);
                self.write_block(next_slot)?;
            } else if key == self.max_key {
                // the maximum was removed; its predecessor takes over
                let prev_slot = self.fetch(self.head.block_of(head.previous))?;
                let prev_key =
                    Slot::new(self.cache.buf(prev_slot), &self.head, self.head.slot_of(head.previous))
                        .key();
                self.max_key.copy_from_slice(prev_key);
                self.head.max_key_rec = head.previous;
            }

            // release the slot
            let cache_slot = self.fetch(block_no)?;
            SlotMut::new(self.cache.buf_mut(cache_slot), &self.head, rec_no).set_status(0);
            self.write_block(cache_slot)?;
        }

        self.head.set_updating(false);
        self.write_head()?;

        // rest on the preceding valid record (or the dummy first)
        let mut cur = head.previous;
        while cur != 0 && !self.rec_head(cur)?.is_valid() {
            cur = self.rec_head(cur)?.previous;
        }
        self.cursor = cur;

        Ok(())
    }

    /// Replaces the value of an existing record.
    ///
    /// Equivalent to a delete of the old value followed by a fresh write;
    /// the record may physically move.
    ///
    /// # Errors
    ///
    /// Fails like [`delete`](IsamFile::delete) (checked against
    /// `old_data`) and then like [`write_new`](IsamFile::write_new).
    pub fn update<K: AsRef<[u8]>, V: AsRef<[u8]>, W: AsRef<[u8]>>(
        &mut self,
        key: K,
        old_data: V,
        new_data: W,
    ) -> crate::Result<()> {
        let key = key.as_ref();
        let res = self
            .delete_inner(key, old_data.as_ref())
            .and_then(|()| self.write_new_inner(key, new_data.as_ref()));
        self.finish(res)
    }
}
