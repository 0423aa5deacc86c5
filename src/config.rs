// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::IsamFile;
use std::path::{Path, PathBuf};

/// File configuration builder.
///
/// Geometry is fixed for the lifetime of a file; it is consulted by
/// [`Config::create`] only. Existing files carry their geometry in the
/// file header and are opened with [`IsamFile::open`].
#[derive(Clone, Debug)]
pub struct Config {
    /// Path of the file to create
    #[doc(hidden)]
    pub path: PathBuf,

    /// Maximum key length in bytes (8..=40)
    pub key_len: u64,

    /// Value length in bytes
    pub data_len: u64,

    /// Record slots per data block
    pub records_per_block: u64,

    /// Number of regular data blocks; also dimensions the index
    pub block_count: u64,
}

impl Config {
    /// Initializes a new config
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().into(),
            key_len: 16,
            data_len: 64,
            records_per_block: 16,
            block_count: 64,
        }
    }

    /// Sets the maximum key length in bytes.
    ///
    /// Must be between 8 and 40.
    ///
    /// Default = 16
    #[must_use]
    pub fn key_len(mut self, n: u64) -> Self {
        self.key_len = n;
        self
    }

    /// Sets the value length in bytes.
    ///
    /// Every record stores exactly this many value bytes.
    ///
    /// Default = 64
    #[must_use]
    pub fn data_len(mut self, n: u64) -> Self {
        self.data_len = n;
        self
    }

    /// Sets the number of record slots per data block.
    ///
    /// The last slot of a regular block is reserved for out-of-order
    /// inserts, so sequential writes fill one slot less per block.
    ///
    /// Default = 16
    #[must_use]
    pub fn records_per_block(mut self, n: u64) -> Self {
        self.records_per_block = n;
        self
    }

    /// Sets the number of regular data blocks.
    ///
    /// Writes beyond this capacity spill into the overflow area, which
    /// grows on demand but is never indexed.
    ///
    /// Default = 64
    #[must_use]
    pub fn block_count(mut self, n: u64) -> Self {
        self.block_count = n;
        self
    }

    /// Creates the file, which must not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`KeyLen`](crate::Error::KeyLen) if the key length is out
    /// of range, [`FileExists`](crate::Error::FileExists) if the path
    /// already names a file, or an I/O error variant.
    pub fn create(self) -> crate::Result<IsamFile> {
        IsamFile::create(self)
    }
}
