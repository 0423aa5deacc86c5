// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! A single-file ISAM (indexed sequential access method) key-value store.
//!
//! ##### About
//!
//! This crate exports an [`IsamFile`]: an on-disk store of fixed-length
//! string keys and fixed-length opaque values, kept in key order and
//! addressable by key.
//!
//! Records live in fixed-size blocks of fixed-size slots. A doubly-linked
//! list threaded through the slots carries the logical key order, which is
//! independent of where a record physically lands. A static fan-out-four
//! index, built once at creation time, maps a key to the data block where
//! a lookup should start; a small FIFO cache of block buffers carries all
//! block I/O. Every mutation is written through immediately, bracketed by
//! an "updating" marker in the file header, so a partially applied change
//! is detectable on disk.
//!
//! Geometry (key length, value length, slots per block, number of regular
//! blocks) is fixed when a file is created. Writes past the regular area
//! spill into an overflow area that grows on demand.
//!
//! # Example usage
//!
//! ```
//! use isam_file::Config;
//! #
//! # let dir = tempfile::tempdir().unwrap();
//! let path = dir.path().join("cities.isam");
//!
//! // Geometry is fixed at creation time
//! let mut file = Config::new(&path)
//!     .key_len(16)
//!     .data_len(8)
//!     .records_per_block(8)
//!     .block_count(16)
//!     .create()?;
//!
//! file.write_new("amsterdam", b"01020304")?;
//! assert_eq!(b"01020304".to_vec(), file.read_by_key("amsterdam")?);
//!
//! // Traversal follows key order, not insertion order
//! file.write_new("zwolle", b"00000000")?;
//! file.write_new("utrecht", b"00000000")?;
//!
//! file.set_key("")?;
//! let (key, _value) = file.read_next()?;
//! assert_eq!(b"amsterdam".to_vec(), key);
//! #
//! # Ok::<(), isam_file::Error>(())
//! ```

#![forbid(unsafe_code)]
#![deny(clippy::all, missing_docs, clippy::cargo)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::indexing_slicing)]
#![warn(clippy::pedantic, clippy::nursery)]
#![warn(clippy::expect_used)]
#![allow(clippy::missing_const_for_fn)]
#![warn(clippy::multiple_crate_versions)]
#![allow(clippy::option_if_let_else)]

mod cache;
mod coding;
mod config;
mod error;
mod file;
mod header;
mod index;
mod isam;
mod metrics;
mod record;

pub use {
    cache::CACHE_SLOTS,
    coding::{DecodeError, EncodeError},
    config::Config,
    error::{Error, ErrorKind, Result},
    index::IndexError,
    isam::{
        stats::{BlockClassStats, FileStats},
        IsamFile, KvPair,
    },
    metrics::CacheStats,
};
