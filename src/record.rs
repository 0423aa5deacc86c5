// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Record slot layout.
//!
//! A slot is a `record_len`-sized byte window inside a block buffer:
//! a 24-byte header (next, previous, status), `key_len` key bytes and
//! `data_len` value bytes, zero-padded to a multiple of 8. Because the
//! geometry is only known at runtime, slots are accessed through the
//! [`Slot`] / [`SlotMut`] views instead of a compile-time struct.

// Every range below is cut from the same geometry that sized the block
// buffers (`records_per_block * record_len`), with slot numbers already
// reduced modulo `records_per_block`, so the raw indexing stays in
// bounds.
#![allow(clippy::indexing_slicing)]

use crate::header::FileHeader;
use byteorder::{ByteOrder, LittleEndian};

/// Serialized size of a record header: three little-endian u64 words.
pub const RECORD_HEAD_LEN: usize = 24;

/// Status bit of a live record.
pub const FLAG_VALID: u64 = 1;

/// Status bit of a deleted record whose key must stay visible.
pub const FLAG_DELETED: u64 = 2;

/// Status bit of the dummy first record.
pub const FLAG_SPECIAL: u64 = 4;

/// The fixed part of a record slot.
///
/// `next` and `previous` are flat record ordinals
/// (`block * records_per_block + slot`); ordinal 0 is the dummy first
/// record and doubles as the chain terminator.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct RecordHead {
    pub next: u64,
    pub previous: u64,
    pub status: u64,
}

impl RecordHead {
    pub fn is_valid(&self) -> bool {
        self.status & FLAG_VALID != 0
    }

    pub fn is_deleted(&self) -> bool {
        self.status & FLAG_DELETED != 0
    }

    pub fn is_free(&self) -> bool {
        self.status == 0
    }
}

/// Read-only view of one record slot inside a block buffer.
pub struct Slot<'a> {
    buf: &'a [u8],
    key_len: usize,
    data_len: usize,
}

impl<'a> Slot<'a> {
    pub fn new(block: &'a [u8], head: &FileHeader, rec_no: u64) -> Self {
        let record_len = head.record_len as usize;
        let offset = rec_no as usize * record_len;
        Self {
            buf: &block[offset..offset + record_len],
            key_len: head.key_len as usize,
            data_len: head.data_len as usize,
        }
    }

    pub fn head(&self) -> RecordHead {
        RecordHead {
            next: LittleEndian::read_u64(&self.buf[0..8]),
            previous: LittleEndian::read_u64(&self.buf[8..16]),
            status: LittleEndian::read_u64(&self.buf[16..24]),
        }
    }

    pub fn key(&self) -> &'a [u8] {
        &self.buf[RECORD_HEAD_LEN..RECORD_HEAD_LEN + self.key_len]
    }

    pub fn data(&self) -> &'a [u8] {
        let start = RECORD_HEAD_LEN + self.key_len;
        &self.buf[start..start + self.data_len]
    }
}

/// Mutable view of one record slot inside a block buffer.
pub struct SlotMut<'a> {
    buf: &'a mut [u8],
    key_len: usize,
    data_len: usize,
}

impl<'a> SlotMut<'a> {
    pub fn new(block: &'a mut [u8], head: &FileHeader, rec_no: u64) -> Self {
        let record_len = head.record_len as usize;
        let offset = rec_no as usize * record_len;
        Self {
            buf: &mut block[offset..offset + record_len],
            key_len: head.key_len as usize,
            data_len: head.data_len as usize,
        }
    }

    pub fn set_next(&mut self, next: u64) {
        LittleEndian::write_u64(&mut self.buf[0..8], next);
    }

    pub fn set_previous(&mut self, previous: u64) {
        LittleEndian::write_u64(&mut self.buf[8..16], previous);
    }

    pub fn set_status(&mut self, status: u64) {
        LittleEndian::write_u64(&mut self.buf[16..24], status);
    }

    /// Stores a key, zero-padded or truncated to the key length.
    pub fn set_key(&mut self, key: &[u8]) {
        let field = &mut self.buf[RECORD_HEAD_LEN..RECORD_HEAD_LEN + self.key_len];
        copy_padded(field, key);
    }

    /// Stores a value, zero-padded or truncated to the data length.
    pub fn set_data(&mut self, data: &[u8]) {
        let start = RECORD_HEAD_LEN + self.key_len;
        let field = &mut self.buf[start..start + self.data_len];
        copy_padded(field, data);
    }
}

fn copy_padded(field: &mut [u8], src: &[u8]) {
    let n = src.len().min(field.len());
    field[..n].copy_from_slice(&src[..n]);
    field[n..].fill(0);
}

/// Zero-padded fixed-size copy of `bytes`, truncated at `len`.
///
/// Stored keys are NUL-padded, so comparing two padded buffers bytewise
/// is equivalent to `strncmp(.., .., len)` on the original strings.
pub fn pad_to(bytes: &[u8], len: usize) -> Box<[u8]> {
    let mut buf = vec![0; len].into_boxed_slice();
    let n = bytes.len().min(len);
    buf[..n].copy_from_slice(&bytes[..n]);
    buf
}

/// Length of the NUL-terminated string inside a fixed-size key field.
pub fn key_str_len(key: &[u8]) -> usize {
    key.iter().position(|&b| b == 0).unwrap_or(key.len())
}
