// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::Error;
use std::{
    fs::File,
    io::{Read, Seek, SeekFrom, Write},
};

/// First word of every ISAM file.
pub const MAGIC: u64 = 0x15A8_F17E;

/// Reads exactly `buf.len()` bytes at the given byte offset.
pub fn read_exact_at(file: &mut File, offset: u64, buf: &mut [u8]) -> crate::Result<()> {
    file.seek(SeekFrom::Start(offset)).map_err(Error::SeekError)?;
    file.read_exact(buf).map_err(Error::ReadError)?;
    Ok(())
}

/// Writes the whole buffer at the given byte offset.
pub fn write_all_at(file: &mut File, offset: u64, buf: &[u8]) -> crate::Result<()> {
    file.seek(SeekFrom::Start(offset)).map_err(Error::SeekError)?;
    file.write_all(buf).map_err(Error::WriteFail)?;
    Ok(())
}
