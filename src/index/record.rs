// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use super::FAN_OUT;
use crate::coding::{DecodeError, Encode, EncodeError};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::{
    cmp::Ordering,
    io::{Read, Write},
};

/// One index node: up to four keys with their child entries.
///
/// At the leaf level an entry is a data block number; everywhere else it
/// is the child record's position in the next level. Keys within a record
/// ascend, and only the first `key_count` positions are meaningful.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IndexRecord {
    pub key_count: u64,
    pub entries: [u64; FAN_OUT],
    keys: Box<[u8]>,
}

// NOTE: key slots are bounded by the fixed fan-out, `keys` holds exactly
// `FAN_OUT` keys and `find` caps its scan at `FAN_OUT` entries
#[allow(clippy::indexing_slicing)]
impl IndexRecord {
    pub fn new(key_len: usize) -> Self {
        Self {
            key_count: 0,
            entries: [0; FAN_OUT],
            keys: vec![0; FAN_OUT * key_len].into_boxed_slice(),
        }
    }

    fn key_len(&self) -> usize {
        self.keys.len() / FAN_OUT
    }

    pub fn key(&self, slot: usize) -> &[u8] {
        let key_len = self.key_len();
        &self.keys[slot * key_len..(slot + 1) * key_len]
    }

    pub fn set_key(&mut self, slot: usize, key: &[u8]) {
        let key_len = self.key_len();
        self.keys[slot * key_len..(slot + 1) * key_len].copy_from_slice(key);
    }

    /// The entry of the largest key not exceeding `key`, if any.
    pub fn find(&self, key: &[u8]) -> Option<u64> {
        let mut found = None;
        for slot in 0..(self.key_count as usize).min(FAN_OUT) {
            match key.cmp(self.key(slot)) {
                Ordering::Less => break,
                Ordering::Equal => {
                    found = Some(self.entries[slot]);
                    break;
                }
                Ordering::Greater => found = Some(self.entries[slot]),
            }
        }
        found
    }

    pub fn decode_from<R: Read>(reader: &mut R, key_len: usize) -> Result<Self, DecodeError> {
        let key_count = reader.read_u64::<LittleEndian>()?;
        if key_count > FAN_OUT as u64 {
            return Err(DecodeError::InvalidHeader("IndexRecord"));
        }

        let mut entries = [0u64; FAN_OUT];
        for entry in &mut entries {
            *entry = reader.read_u64::<LittleEndian>()?;
        }

        let mut keys = vec![0; FAN_OUT * key_len].into_boxed_slice();
        reader.read_exact(&mut keys)?;

        Ok(Self {
            key_count,
            entries,
            keys,
        })
    }
}

impl Encode for IndexRecord {
    fn encode_into<W: Write>(&self, writer: &mut W) -> Result<(), EncodeError> {
        writer.write_u64::<LittleEndian>(self.key_count)?;
        for entry in self.entries {
            writer.write_u64::<LittleEndian>(entry)?;
        }
        writer.write_all(&self.keys)?;
        Ok(())
    }
}
