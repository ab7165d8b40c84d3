//! Error type for ROOT file access.

use thiserror::Error;

/// Errors raised while reading or writing ROOT files.
#[derive(Error, Debug)]
pub enum RootError {
    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file does not start with the `root` magic.
    #[error("not a ROOT file (bad magic)")]
    BadMagic,

    /// Attempted to read past the end of a buffer.
    #[error("buffer underflow at offset {offset}: need {need} bytes, have {have}")]
    BufferUnderflow {
        /// Read position.
        offset: usize,
        /// Bytes requested.
        need: usize,
        /// Bytes available.
        have: usize,
    },

    /// A compressed block could not be decoded.
    #[error("decompression error: {0}")]
    Decompression(String),

    /// Streamed object layout did not match expectations.
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// Object class is not a supported histogram type.
    #[error("unsupported class: {0}")]
    UnsupportedClass(String),

    /// No key with the requested name.
    #[error("key not found: {0}")]
    KeyNotFound(String),

    /// The writer was given an object it cannot encode.
    #[error("write error: {0}")]
    Write(String),
}

/// Result alias for ROOT operations.
pub type Result<T> = std::result::Result<T, RootError>;
