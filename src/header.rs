// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::{
    coding::{Decode, DecodeError, Encode, EncodeError},
    file::{self, MAGIC},
    metrics::Metrics,
    record::RECORD_HEAD_LEN,
    Error,
};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::{
    fs::File,
    io::{Read, Write},
};

/// Serialized size of the file header: twelve little-endian u64 words.
pub const HEADER_LEN: usize = 96;

/// Bit set in `file_state` while a multi-write mutation is in flight.
pub const STATE_UPDATING: u64 = 1024;

/// The fixed header at byte offset 0 of every ISAM file.
///
/// Geometry fields (`block_count`, `records_per_block`, `key_len`,
/// `data_len`, `record_len`, `data_start`) are fixed at creation time;
/// the remaining fields track the live state of the file.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FileHeader {
    pub magic: u64,
    pub version: u64,

    /// Number of regular data blocks (blocks beyond this are overflow)
    pub block_count: u64,

    /// Record slots per data block
    pub records_per_block: u64,

    /// Maximum key length in bytes
    pub key_len: u64,

    /// Value length in bytes
    pub data_len: u64,

    /// Number of live records, excluding the dummy first record
    pub record_count: u64,

    /// Byte offset of data block 0 (right after the index image)
    pub data_start: u64,

    /// Slot size: header + key + value, rounded up to a multiple of 8
    pub record_len: u64,

    /// Number of blocks currently allocated on disk, overflow included
    pub cur_blocks: u64,

    /// Flat ordinal of the record holding the maximum key
    pub max_key_rec: u64,

    /// State bits, see [`STATE_UPDATING`]
    pub file_state: u64,
}

impl FileHeader {
    pub fn new(key_len: u64, data_len: u64, records_per_block: u64, block_count: u64) -> Self {
        let raw_len = RECORD_HEAD_LEN as u64 + key_len + data_len;
        Self {
            magic: MAGIC,
            version: 0,
            block_count,
            records_per_block,
            key_len,
            data_len,
            record_count: 0,
            data_start: 0,
            record_len: raw_len.div_ceil(8) * 8,
            cur_blocks: 0,
            max_key_rec: 0,
            file_state: 0,
        }
    }

    pub fn block_size(&self) -> usize {
        (self.records_per_block * self.record_len) as usize
    }

    /// Byte offset of the given data block.
    pub fn block_offset(&self, block: u64) -> u64 {
        self.data_start + block * self.block_size() as u64
    }

    pub fn block_of(&self, ordinal: u64) -> u64 {
        ordinal / self.records_per_block
    }

    pub fn slot_of(&self, ordinal: u64) -> u64 {
        ordinal % self.records_per_block
    }

    pub fn ordinal(&self, block: u64, slot: u64) -> u64 {
        block * self.records_per_block + slot
    }

    pub fn is_updating(&self) -> bool {
        self.file_state & STATE_UPDATING != 0
    }

    pub fn set_updating(&mut self, updating: bool) {
        if updating {
            self.file_state |= STATE_UPDATING;
        } else {
            self.file_state &= !STATE_UPDATING;
        }
    }

    /// Checks magic, version and geometry after reading a header from disk.
    pub fn validate(&self) -> crate::Result<()> {
        if self.magic != MAGIC {
            return Err(Error::BadMagic);
        }
        if self.version > 0 {
            return Err(Error::BadVersion);
        }
        if self.block_count == 0 || self.records_per_block == 0 {
            return Err(Error::HeaderError("empty geometry"));
        }
        if !(8..=40).contains(&self.key_len) {
            return Err(Error::HeaderError("key length out of range"));
        }
        let raw_len = RECORD_HEAD_LEN as u64 + self.key_len + self.data_len;
        if self.record_len != raw_len.div_ceil(8) * 8 {
            return Err(Error::HeaderError("record length mismatch"));
        }
        if self.data_start < HEADER_LEN as u64 {
            return Err(Error::HeaderError("data area overlaps header"));
        }
        Ok(())
    }

    /// Rewrites the header at offset 0. Counts as a disk write.
    pub fn write_to(&self, file: &mut File, metrics: &Metrics) -> crate::Result<()> {
        file::write_all_at(file, 0, &self.encode_into_vec())?;
        metrics.count_disk_write();
        Ok(())
    }
}

impl Encode for FileHeader {
    fn encode_into<W: Write>(&self, writer: &mut W) -> Result<(), EncodeError> {
        writer.write_u64::<LittleEndian>(self.magic)?;
        writer.write_u64::<LittleEndian>(self.version)?;
        writer.write_u64::<LittleEndian>(self.block_count)?;
        writer.write_u64::<LittleEndian>(self.records_per_block)?;
        writer.write_u64::<LittleEndian>(self.key_len)?;
        writer.write_u64::<LittleEndian>(self.data_len)?;
        writer.write_u64::<LittleEndian>(self.record_count)?;
        writer.write_u64::<LittleEndian>(self.data_start)?;
        writer.write_u64::<LittleEndian>(self.record_len)?;
        writer.write_u64::<LittleEndian>(self.cur_blocks)?;
        writer.write_u64::<LittleEndian>(self.max_key_rec)?;
        writer.write_u64::<LittleEndian>(self.file_state)?;
        Ok(())
    }
}

impl Decode for FileHeader {
    fn decode_from<R: Read>(reader: &mut R) -> Result<Self, DecodeError> {
        let magic = reader.read_u64::<LittleEndian>()?;
        let version = reader.read_u64::<LittleEndian>()?;
        let block_count = reader.read_u64::<LittleEndian>()?;
        let records_per_block = reader.read_u64::<LittleEndian>()?;
        let key_len = reader.read_u64::<LittleEndian>()?;
        let data_len = reader.read_u64::<LittleEndian>()?;
        let record_count = reader.read_u64::<LittleEndian>()?;
        let data_start = reader.read_u64::<LittleEndian>()?;
        let record_len = reader.read_u64::<LittleEndian>()?;
        let cur_blocks = reader.read_u64::<LittleEndian>()?;
        let max_key_rec = reader.read_u64::<LittleEndian>()?;
        let file_state = reader.read_u64::<LittleEndian>()?;

        Ok(Self {
            magic,
            version,
            block_count,
            records_per_block,
            key_len,
            data_len,
            record_count,
            data_start,
            record_len,
            cur_blocks,
            max_key_rec,
            file_state,
        })
    }
}
