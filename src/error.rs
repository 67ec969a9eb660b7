//! Error types for kernel host operations.
//!
//! This module provides the error hierarchy using `thiserror` for every
//! layer of the host: the compute-module boundary, linear memory access,
//! file I/O and configuration.
//!
//! Malformed markup is deliberately absent: unknown link ids and color
//! codes are dropped by the parser and never surface as errors.

use thiserror::Error;

/// Result type alias for kernel host operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for kernel host operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Compute module boundary errors (missing exports, load failures, traps).
    #[error("module error: {0}")]
    Module(#[from] ModuleError),

    /// Linear memory access errors.
    #[error("memory error: {0}")]
    Memory(#[from] MemoryError),

    /// I/O errors (file operations).
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// Configuration errors.
    #[error("configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },
}

/// Errors raised at the boundary with the compute module.
#[derive(Error, Debug)]
pub enum ModuleError {
    /// A required entry point is not exported (module not loaded or built
    /// without it).
    #[error("entry point unavailable: {export}")]
    Unavailable {
        /// Export name that was looked up.
        export: &'static str,
    },

    /// The module binary could not be fetched or decoded.
    #[error("failed to load module: {path}: {reason}")]
    Load {
        /// Path of the module binary.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// The module decoded but could not be linked or started.
    #[error("failed to instantiate module: {0}")]
    Instantiate(String),

    /// An entry point trapped while running.
    #[error("{export} trapped: {reason}")]
    Trap {
        /// Export that was running.
        export: &'static str,
        /// Trap description.
        reason: String,
    },
}

/// Errors reading or writing the module's linear memory.
#[derive(Error, Debug)]
pub enum MemoryError {
    /// Offset lies outside the current buffer.
    #[error("offset {offset} outside linear memory of {len} bytes")]
    OutOfRange {
        /// Requested offset.
        offset: usize,
        /// Current buffer length.
        len: usize,
    },

    /// Slot has no room for even the terminating zero byte.
    #[error("slot needs {needed} bytes but only {capacity} are available")]
    SlotTooSmall {
        /// Bytes needed.
        needed: usize,
        /// Bytes available.
        capacity: usize,
    },
}

/// I/O-specific errors for file operations.
#[derive(Error, Debug)]
pub enum IoError {
    /// File not found.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path to the file that was not found.
        path: String,
    },

    /// Failed to read file.
    #[error("failed to read file: {path}: {reason}")]
    ReadFailed {
        /// Path to the file.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// Failed to write file.
    #[error("failed to write file: {path}: {reason}")]
    WriteFailed {
        /// Path to the file.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// Memory mapping error.
    #[error("memory mapping failed: {path}: {reason}")]
    MmapFailed {
        /// Path to the file.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// Directory creation error.
    #[error("failed to create directory: {path}: {reason}")]
    DirectoryFailed {
        /// Path to the directory.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// Generic I/O error wrapper.
    #[error("I/O error: {0}")]
    Generic(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(IoError::Generic(err.to_string()))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Config {
            message: err.to_string(),
        }
    }
}
