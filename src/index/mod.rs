// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! The static key index.
//!
//! An N-ary tree with a fixed fan-out of 4, dimensioned at file creation
//! time by the number of regular data blocks and kept fully in memory.
//! Leaf entries map keys to data block numbers; inner entries map keys to
//! the child record's position in the next level. The index is
//! append-only: keys enter through [`Index::add_key`] in strictly
//! ascending order, one per freshly started regular block, and nothing is
//! ever removed or rebalanced. A deleted record can therefore still be
//! referenced by the index; the engine keeps such slots readable.

mod record;

use crate::coding::{Decode, DecodeError, Encode, EncodeError};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use record::IndexRecord;
use std::io::{Read, Write};

pub(crate) const FAN_OUT: usize = 4;

/// Maximum number of non-root levels the disk image can carry.
const MAX_LEVELS: usize = 8;

/// Represents errors that can occur in the key index
#[derive(Debug)]
pub enum IndexError {
    /// The index has reached its fixed key capacity
    Full,

    /// The appended key is not larger than the current maximum
    KeyNotLarger,

    /// No indexed key was less than or equal to the queried key
    Indexing,

    /// The disk image is inconsistent
    Corrupt(&'static str),

    /// I/O error while reading or writing the disk image
    Io(std::io::Error),
}

impl std::fmt::Display for IndexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "IndexError: {self:?}")
    }
}

impl std::error::Error for IndexError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DecodeError> for IndexError {
    fn from(value: DecodeError) -> Self {
        match value {
            DecodeError::Io(e) => Self::Io(e),
            DecodeError::InvalidHeader(name) => Self::Corrupt(name),
        }
    }
}

/// The in-memory index tree.
///
/// `levels` holds the non-root levels, topmost first; the last entry is
/// the leaf level. All records are pre-allocated at their fixed per-level
/// counts, and per-record key counts track the filled prefix. A tree of
/// depth 1 consists of the root record alone, whose entries then point
/// directly at data blocks.
pub struct Index {
    key_len: usize,
    key_count: u64,
    root: IndexRecord,
    levels: Vec<Vec<IndexRecord>>,
}

impl Index {
    /// Builds the empty index for a file with `block_count` regular blocks.
    ///
    /// The single key present from the start is the empty key, mapping to
    /// block 0, which anchors every descent.
    pub fn new(block_count: u64, key_len: usize) -> Self {
        let mut depth = 0usize;
        let mut n = block_count;
        while n > 1 {
            depth += 1;
            n = n.div_ceil(FAN_OUT as u64);
        }
        let depth = depth.max(1);

        // sizes bottom-up: the leaf level has ceil(block_count / 4)
        // records, each level above a quarter of that
        let mut sizes = Vec::with_capacity(depth - 1);
        let mut n = (block_count as usize).div_ceil(FAN_OUT);
        for _ in 1..depth {
            sizes.push(n);
            n = n.div_ceil(FAN_OUT);
        }
        sizes.reverse();

        let levels = sizes
            .into_iter()
            .map(|size| {
                let mut records = vec![IndexRecord::new(key_len); size];
                if let Some(first) = records.first_mut() {
                    first.key_count = 1;
                }
                records
            })
            .collect();

        let mut root = IndexRecord::new(key_len);
        root.key_count = 1;

        Self {
            key_len,
            key_count: 1,
            root,
            levels,
        }
    }

    pub fn key_len(&self) -> usize {
        self.key_len
    }

    /// Total key capacity: four keys per leaf record.
    pub fn capacity(&self) -> u64 {
        (FAN_OUT * self.levels.last().map_or(1, Vec::len)) as u64
    }

    /// Resolves a key to the data block where a lookup should start.
    ///
    /// Returns the block whose first indexed key is the largest one not
    /// exceeding `key`. The key must be padded to the index key length.
    pub fn key_to_block(&self, key: &[u8]) -> Result<u64, IndexError> {
        debug_assert_eq!(self.key_len, key.len());

        let mut entry = self.root.find(key).ok_or(IndexError::Indexing)?;
        for level in &self.levels {
            let record = level.get(entry as usize).ok_or(IndexError::Indexing)?;
            entry = record.find(key).ok_or(IndexError::Indexing)?;
        }
        Ok(entry)
    }

    /// Appends a key mapping to a data block.
    ///
    /// Keys must arrive in strictly ascending order. Whenever the
    /// insertion starts a new record at some level, the key also enters
    /// the parent level, possibly all the way up to the root.
    // NOTE: the capacity check keeps every position inside the
    // pre-allocated level arrays, and entry slots stay below the fan-out
    #[allow(clippy::indexing_slicing)]
    pub fn add_key(&mut self, key: &[u8], block: u64) -> Result<(), IndexError> {
        debug_assert_eq!(self.key_len, key.len());

        if self.key_count >= self.capacity() {
            return Err(IndexError::Full);
        }
        if key <= self.max_key() {
            return Err(IndexError::KeyNotLarger);
        }

        let mut pos = self.key_count as usize;
        let mut entry = block;

        for level in self.levels.iter_mut().rev() {
            let rec_no = pos / FAN_OUT;
            let slot = pos % FAN_OUT;
            let record = &mut level[rec_no];
            record.set_key(slot, key);
            record.entries[slot] = entry;
            record.key_count += 1;

            if slot != 0 {
                self.key_count += 1;
                return Ok(());
            }

            // a new record started; its parent needs the key as well
            entry = rec_no as u64;
            pos = rec_no;
        }

        // reached the root; its children sit at their own positions
        debug_assert!(pos < FAN_OUT, "root fan-out exceeded");
        self.root.set_key(pos, key);
        self.root.entries[pos] = if self.levels.is_empty() {
            block
        } else {
            pos as u64
        };
        self.root.key_count += 1;

        self.key_count += 1;
        Ok(())
    }

    /// The largest key currently in the index.
    // NOTE: `key_count` never exceeds the capacity of the leaf level
    #[allow(clippy::indexing_slicing)]
    fn max_key(&self) -> &[u8] {
        let pos = (self.key_count - 1) as usize;
        match self.levels.last() {
            Some(leaves) => leaves[pos / FAN_OUT].key(pos % FAN_OUT),
            None => self.root.key(pos),
        }
    }

    /// Byte length of one serialized index record.
    fn record_len(&self) -> usize {
        8 + FAN_OUT * 8 + FAN_OUT * self.key_len
    }

    /// Byte length of the whole disk image.
    pub fn serialized_len(&self) -> usize {
        let records = 1 + self.levels.iter().map(Vec::len).sum::<usize>();
        (4 + MAX_LEVELS) * 8 + records * self.record_len()
    }
}

impl Encode for Index {
    fn encode_into<W: Write>(&self, writer: &mut W) -> Result<(), EncodeError> {
        writer.write_u64::<LittleEndian>(self.levels.len() as u64)?;
        writer.write_u64::<LittleEndian>(self.key_len as u64)?;
        writer.write_u64::<LittleEndian>(self.key_count)?;
        writer.write_u64::<LittleEndian>(self.record_len() as u64)?;

        let mut per_level = [0u64; MAX_LEVELS];
        for (n, level) in per_level.iter_mut().zip(&self.levels) {
            *n = level.len() as u64;
        }
        for n in per_level {
            writer.write_u64::<LittleEndian>(n)?;
        }

        self.root.encode_into(writer)?;
        for level in &self.levels {
            for record in level {
                record.encode_into(writer)?;
            }
        }
        Ok(())
    }
}

impl Decode for Index {
    fn decode_from<R: Read>(reader: &mut R) -> Result<Self, DecodeError> {
        let level_count = reader.read_u64::<LittleEndian>()? as usize;
        let key_len = reader.read_u64::<LittleEndian>()? as usize;
        let key_count = reader.read_u64::<LittleEndian>()?;
        let record_len = reader.read_u64::<LittleEndian>()? as usize;

        let mut per_level = [0u64; MAX_LEVELS];
        for n in &mut per_level {
            *n = reader.read_u64::<LittleEndian>()?;
        }

        if level_count > MAX_LEVELS {
            return Err(DecodeError::InvalidHeader("Index"));
        }
        if key_len == 0 || record_len != 8 + FAN_OUT * 8 + FAN_OUT * key_len {
            return Err(DecodeError::InvalidHeader("Index"));
        }
        if key_count == 0 {
            return Err(DecodeError::InvalidHeader("Index"));
        }

        let root = IndexRecord::decode_from(reader, key_len)?;

        let mut levels = Vec::with_capacity(level_count);
        for &n in per_level.iter().take(level_count) {
            if n == 0 {
                return Err(DecodeError::InvalidHeader("Index"));
            }
            let mut records = Vec::with_capacity(n as usize);
            for _ in 0..n {
                records.push(IndexRecord::decode_from(reader, key_len)?);
            }
            levels.push(records);
        }

        Ok(Self {
            key_len,
            key_count,
            root,
            levels,
        })
    }
}
