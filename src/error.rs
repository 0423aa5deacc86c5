// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::index::IndexError;

/// The fixed error taxonomy.
///
/// Numeric codes are stable and assigned by declaration order, matching
/// the on-disk format's historical error table; [`ErrorKind::message`]
/// maps every kind to its fixed human-readable message.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// No error occurred
    NoError,

    /// A write did not complete
    WriteFail,

    /// Key length outside the supported range (8..=40)
    KeyLen,

    /// The path already names a file
    FileExists,

    /// The path names an existing (possibly dangling) link
    LinkExists,

    /// The file could not be opened or created
    OpenFail,

    /// The path names no file
    NoSuchFile,

    /// Too many open handles
    OpenCount,

    /// The index could not resolve or accept a key
    IndexError,

    /// A read did not complete
    ReadError,

    /// The first file word is not the magic number
    BadMagic,

    /// The format version is unsupported
    BadVersion,

    /// The file header carries inconsistent geometry
    HeaderError,

    /// The file was not opened for updating
    OpenForUpdate,

    /// The handle is not a valid ISAM file handle
    IdentInvalid,

    /// No record with the requested key exists
    NoSuchKey,

    /// The key is empty
    NullKey,

    /// The supplied data does not match the stored record
    DataMismatch,

    /// A valid record with this key already exists
    RecordExists,

    /// A seek did not complete
    SeekError,

    /// Positioned before the first valid record
    StartOfFile,

    /// Positioned after the last valid record
    EndOfFile,
}

impl ErrorKind {
    /// Stable numeric code of this kind.
    #[must_use]
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Fixed human-readable message for this kind.
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::NoError => "no error",
            Self::WriteFail => "write failed",
            Self::KeyLen => "invalid key length",
            Self::FileExists => "file already exists",
            Self::LinkExists => "path is an existing link",
            Self::OpenFail => "open failed",
            Self::NoSuchFile => "no such file",
            Self::OpenCount => "too many open files",
            Self::IndexError => "index error",
            Self::ReadError => "read failed",
            Self::BadMagic => "bad magic number",
            Self::BadVersion => "unsupported version",
            Self::HeaderError => "malformed file header",
            Self::OpenForUpdate => "file not opened for update",
            Self::IdentInvalid => "invalid file handle",
            Self::NoSuchKey => "no such key",
            Self::NullKey => "key is empty",
            Self::DataMismatch => "data does not match stored record",
            Self::RecordExists => "record already exists",
            Self::SeekError => "seek failed",
            Self::StartOfFile => "start of file",
            Self::EndOfFile => "end of file",
        }
    }
}

/// Represents errors that can occur when operating on an ISAM file
#[derive(Debug)]
pub enum Error {
    /// A write did not complete
    WriteFail(std::io::Error),

    /// Key length outside the supported range (8..=40)
    KeyLen,

    /// The path already names a file
    FileExists,

    /// The path names an existing (possibly dangling) link
    LinkExists,

    /// The file could not be opened or created
    OpenFail(std::io::Error),

    /// The path names no file
    NoSuchFile,

    /// The index could not resolve or accept a key
    Index(IndexError),

    /// A read did not complete
    ReadError(std::io::Error),

    /// The first file word is not the magic number
    BadMagic,

    /// The format version is unsupported
    BadVersion,

    /// The file header carries inconsistent geometry
    HeaderError(&'static str),

    /// No record with the requested key exists
    NoSuchKey,

    /// The key is empty
    NullKey,

    /// The supplied data does not match the stored record
    DataMismatch,

    /// A valid record with this key already exists
    RecordExists,

    /// A seek did not complete
    SeekError(std::io::Error),

    /// Positioned before the first valid record
    StartOfFile,

    /// Positioned after the last valid record
    EndOfFile,
}

impl Error {
    /// The taxonomy kind of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::WriteFail(_) => ErrorKind::WriteFail,
            Self::KeyLen => ErrorKind::KeyLen,
            Self::FileExists => ErrorKind::FileExists,
            Self::LinkExists => ErrorKind::LinkExists,
            Self::OpenFail(_) => ErrorKind::OpenFail,
            Self::NoSuchFile => ErrorKind::NoSuchFile,
            Self::Index(_) => ErrorKind::IndexError,
            Self::ReadError(_) => ErrorKind::ReadError,
            Self::BadMagic => ErrorKind::BadMagic,
            Self::BadVersion => ErrorKind::BadVersion,
            Self::HeaderError(_) => ErrorKind::HeaderError,
            Self::NoSuchKey => ErrorKind::NoSuchKey,
            Self::NullKey => ErrorKind::NullKey,
            Self::DataMismatch => ErrorKind::DataMismatch,
            Self::RecordExists => ErrorKind::RecordExists,
            Self::SeekError(_) => ErrorKind::SeekError,
            Self::StartOfFile => ErrorKind::StartOfFile,
            Self::EndOfFile => ErrorKind::EndOfFile,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = self.kind();
        write!(f, "IsamError({}): {}", kind.code(), kind.message())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::WriteFail(e) | Self::OpenFail(e) | Self::ReadError(e) | Self::SeekError(e) => {
                Some(e)
            }
            Self::Index(e) => Some(e),
            _ => None,
        }
    }
}

impl From<IndexError> for Error {
    fn from(value: IndexError) -> Self {
        Self::Index(value)
    }
}

/// ISAM file result
pub type Result<T> = std::result::Result<T, Error>;
