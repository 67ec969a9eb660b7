//! File access for kernel binaries, config files and page snapshots.
//!
//! Kernel binaries are read whole before instantiation. Binaries at or
//! above [`MMAP_THRESHOLD`] are memory mapped and copied out in one pass
//! instead of going through a read buffer.

// Memory mapping requires unsafe
#![allow(unsafe_code)]

use crate::error::{IoError, Result};
use memmap2::Mmap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Size at which reads switch to memory mapping (1MB).
pub const MMAP_THRESHOLD: u64 = 1024 * 1024;

/// Largest file the host will load (256MB). Wasm32 memory tops out at
/// 4GB, but no sane kernel binary comes near this.
const MAX_FILE_SIZE: u64 = 256 * 1024 * 1024;

/// An opened file with its size already checked.
///
/// # Examples
///
/// ```no_run
/// use kernel_host::io::FileReader;
///
/// let reader = FileReader::open("kernel.wasm").unwrap();
/// let bytes = reader.read_to_bytes().unwrap();
/// assert_eq!(bytes.len() as u64, reader.size());
/// ```
#[derive(Debug)]
pub struct FileReader {
    file: File,
    size: u64,
    path: String,
}

impl FileReader {
    /// Opens a file for reading.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist, cannot be opened, or
    /// exceeds the size limit.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let path = path_ref.to_string_lossy().to_string();

        if !path_ref.exists() {
            return Err(IoError::FileNotFound { path }.into());
        }

        let read_failed = |e: std::io::Error| IoError::ReadFailed {
            path: path.clone(),
            reason: e.to_string(),
        };
        let file = File::open(path_ref).map_err(read_failed)?;
        let size = file.metadata().map_err(read_failed)?.len();

        if size > MAX_FILE_SIZE {
            return Err(IoError::ReadFailed {
                path,
                reason: format!("file too large: {size} bytes (max: {MAX_FILE_SIZE} bytes)"),
            }
            .into());
        }

        Ok(Self { file, size, path })
    }

    /// Returns the file size in bytes.
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }

    /// Returns the file path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Reads the whole file.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or mapping fails.
    pub fn read_to_bytes(&self) -> Result<Vec<u8>> {
        if self.size >= MMAP_THRESHOLD {
            tracing::debug!(path = %self.path, size = self.size, "mapping file");
            // Safety: the map is read-only and dropped before returning
            let mmap = unsafe {
                Mmap::map(&self.file).map_err(|e| IoError::MmapFailed {
                    path: self.path.clone(),
                    reason: e.to_string(),
                })?
            };
            return Ok(mmap.to_vec());
        }

        let mut buffer = Vec::with_capacity(usize::try_from(self.size).unwrap_or_default());
        (&self.file)
            .read_to_end(&mut buffer)
            .map_err(|e| IoError::ReadFailed {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;
        Ok(buffer)
    }

    /// Reads the whole file as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns an error if reading fails or the content is not valid UTF-8.
    pub fn read_to_string(&self) -> Result<String> {
        String::from_utf8(self.read_to_bytes()?).map_err(|e| {
            IoError::ReadFailed {
                path: self.path.clone(),
                reason: format!("invalid UTF-8: {e}"),
            }
            .into()
        })
    }
}

/// Reads a text file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid UTF-8.
///
/// # Examples
///
/// ```no_run
/// use kernel_host::io::read_file;
///
/// let content = read_file("config.json").unwrap();
/// ```
pub fn read_file<P: AsRef<Path>>(path: P) -> Result<String> {
    FileReader::open(path)?.read_to_string()
}

/// Writes content to a file, creating parent directories if needed.
///
/// # Errors
///
/// Returns an error if directory creation or file writing fails.
pub fn write_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
    let path_ref = path.as_ref();

    if let Some(parent) = path_ref.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent).map_err(|e| IoError::DirectoryFailed {
            path: parent.to_string_lossy().to_string(),
            reason: e.to_string(),
        })?;
    }

    std::fs::write(path_ref, content).map_err(|e| IoError::WriteFailed {
        path: path_ref.to_string_lossy().to_string(),
        reason: e.to_string(),
    })?;

    Ok(())
}
