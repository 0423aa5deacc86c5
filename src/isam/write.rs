// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use super::IsamFile;
use crate::{
    record::{pad_to, SlotMut, FLAG_VALID},
    Error,
};
use std::cmp::Ordering;

impl IsamFile {
    /// Writes a new record; the key must not be in use.
    ///
    /// Keys at or above the current maximum append at the end of the
    /// chain; smaller keys are linked in after their predecessor,
    /// re-using the sticky slot of an equal deleted key if there is one.
    ///
    /// # Errors
    ///
    /// Returns [`NullKey`](Error::NullKey) for an empty key,
    /// [`RecordExists`](Error::RecordExists) if a valid record already
    /// carries the key, or an I/O error variant.
    pub fn write_new<K: AsRef<[u8]>, V: AsRef<[u8]>>(
        &mut self,
        key: K,
        data: V,
    ) -> crate::Result<()> {
        let res = self.write_new_inner(key.as_ref(), data.as_ref());
        self.finish(res)
    }

    pub(crate) fn write_new_inner(&mut self, key: &[u8], data: &[u8]) -> crate::Result<()> {
        if matches!(key.first(), None | Some(&0)) {
            return Err(Error::NullKey);
        }

        let key = pad_to(key, self.key_len());
        if key >= self.max_key {
            return self.append(&key, data);
        }

        // find the successor: the first record with key >= the new key.
        // The append dispatch above guarantees the walk cannot run off
        // the end of the chain.
        let block = self.index.key_to_block(&key)?;
        let mut cur = self.head.ordinal(block, 0);
        let succ_head = loop {
            let (head, ord) = self.probe(cur, &key)?;
            match ord {
                Ordering::Greater => {
                    assert_ne!(head.next, 0, "ordered chain ended before the insert position");
                    cur = head.next;
                }
                Ordering::Equal => {
                    return if head.is_deleted() {
                        self.revive(cur, data)
                    } else {
                        Err(Error::RecordExists)
                    };
                }
                Ordering::Less => break head,
            }
        };
        let succ = cur;
        let prev = succ_head.previous;

        // home hunt: the predecessor's block first, then forward block by
        // block (eventually into overflow, which grows on demand).
        // Inserts may use the last slot that appends leave free.
        let mut new_block = self.head.block_of(prev);
        let new_slot = loop {
            let cache_slot = self.fetch(new_block)?;
            if let Some(rec_no) = self.first_free_in(cache_slot, false) {
                break rec_no;
            }
            new_block += 1;
        };
        let new = self.head.ordinal(new_block, new_slot);

        let cache_slot = self.fetch(new_block)?;
        {
            let mut slot = SlotMut::new(self.cache.buf_mut(cache_slot), &self.head, new_slot);
            slot.set_key(&key);
            slot.set_data(data);
            slot.set_status(FLAG_VALID);
            slot.set_previous(prev);
            slot.set_next(succ);
        }

        self.head.record_count += 1;
        self.head.set_updating(true);
        self.write_head()?;

        // link the neighbors, folding co-located updates into one write
        let prev_block = self.head.block_of(prev);
        let succ_block = self.head.block_of(succ);

        if prev_block == new_block {
            SlotMut::new(self.cache.buf_mut(cache_slot), &self.head, self.head.slot_of(prev))
                .set_next(new);
        }
        if succ_block == new_block {
            SlotMut::new(self.cache.buf_mut(cache_slot), &self.head, self.head.slot_of(succ))
                .set_previous(new);
        }
        self.write_block(cache_slot)?;

        if prev_block != new_block {
            let cache_slot = self.fetch(prev_block)?;
            SlotMut::new(self.cache.buf_mut(cache_slot), &self.head, self.head.slot_of(prev))
                .set_next(new);
            if succ_block == prev_block {
                SlotMut::new(self.cache.buf_mut(cache_slot), &self.head, self.head.slot_of(succ))
                    .set_previous(new);
            }
            self.write_block(cache_slot)?;
        }

        if succ_block != new_block && succ_block != prev_block {
            let cache_slot = self.fetch(succ_block)?;
            SlotMut::new(self.cache.buf_mut(cache_slot), &self.head, self.head.slot_of(succ))
                .set_previous(new);
            self.write_block(cache_slot)?;
        }

        self.cursor = new;
        self.head.set_updating(false);
        self.write_head()
    }

    /// Appends a record whose key is at or above the current maximum.
    fn append(&mut self, key: &[u8], data: &[u8]) -> crate::Result<()> {
        let block = self.index.key_to_block(key)?;
        let mut cur = self.head.ordinal(block, 0);

        // walk to the end of the chain
        let (mut head, mut ord) = self.probe(cur, key)?;
        while head.next != 0 {
            cur = head.next;
            (head, ord) = self.probe(cur, key)?;
        }

        assert_ne!(
            ord,
            Ordering::Less,
            "append key must not be below the chain's last key",
        );

        if ord == Ordering::Equal {
            // the chain's last record carries this key already: either a
            // live duplicate, or the sticky slot of a deleted
            // first-of-block record that can be reused in place
            if head.is_valid() {
                return Err(Error::RecordExists);
            }
            assert!(
                head.is_deleted(),
                "record with the maximum key is neither live nor deleted",
            );
            assert_eq!(
                key,
                &*self.max_key,
                "sticky record at the chain end must carry the maximum key",
            );
            return self.revive(cur, data);
        }
        let max_ord = cur;

        // choose the append slot, scanning forward from the old maximum.
        // Regular blocks keep their last slot free for later inserts;
        // overflow blocks do not.
        let mut new_block = self.head.block_of(max_ord);
        let new_slot = loop {
            let cache_slot = self.fetch(new_block)?;
            let reserve_last = new_block < self.head.block_count;
            if let Some(rec_no) = self.first_free_in(cache_slot, reserve_last) {
                break rec_no;
            }
            new_block += 1;
        };
        let new = self.head.ordinal(new_block, new_slot);

        if new_block < self.head.block_count {
            log::trace!("appending record {new} to regular block {new_block}");
        } else {
            log::trace!("appending record {new} to overflow block {new_block}");
        }

        let cache_slot = self.fetch(new_block)?;
        {
            let mut slot = SlotMut::new(self.cache.buf_mut(cache_slot), &self.head, new_slot);
            slot.set_key(key);
            slot.set_data(data);
            slot.set_status(FLAG_VALID);
            slot.set_previous(max_ord);
            slot.set_next(0);
        }
        self.max_key.copy_from_slice(key);
        self.cursor = new;

        self.head.record_count += 1;
        self.head.max_key_rec = new;
        self.head.set_updating(true);
        self.write_head()?;

        // a freshly started regular block enters the index
        if new_slot == 0 && new_block < self.head.block_count {
            self.index.add_key(key, new_block)?;
            self.write_index()?;
            log::trace!("indexed block {new_block}");
        }

        if new_block == self.head.block_of(max_ord) {
            SlotMut::new(self.cache.buf_mut(cache_slot), &self.head, self.head.slot_of(max_ord))
                .set_next(new);
            self.write_block(cache_slot)?;
        } else {
            self.write_block(cache_slot)?;

            let cache_slot = self.fetch(self.head.block_of(max_ord))?;
            SlotMut::new(self.cache.buf_mut(cache_slot), &self.head, self.head.slot_of(max_ord))
                .set_next(new);
            self.write_block(cache_slot)?;
        }

        self.head.set_updating(false);
        self.write_head()
    }

    /// Brings a sticky deleted slot back to life with fresh data.
    fn revive(&mut self, ordinal: u64, data: &[u8]) -> crate::Result<()> {
        log::trace!("reviving deleted record {ordinal}");

        let cache_slot = self.fetch(self.head.block_of(ordinal))?;
        {
            let mut slot =
                SlotMut::new(self.cache.buf_mut(cache_slot), &self.head, self.head.slot_of(ordinal));
            slot.set_data(data);
            slot.set_status(FLAG_VALID);
        }

        self.head.record_count += 1;
        self.head.set_updating(true);
        self.write_head()?;
        self.write_block(cache_slot)?;

        self.cursor = ordinal;
        self.head.set_updating(false);
        self.write_head()
    }
}
