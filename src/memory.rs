//! C-string marshaling across the module's linear memory.
//!
//! [`MemoryView`] holds only limits, never a slice: every operation takes
//! the module and re-derives its byte view on the spot, because any module
//! call may grow memory and move the buffer. Pointers handed out by the
//! module are decoded immediately and never kept.

use crate::error::{MemoryError, Result};
use crate::io::find_char_boundary;
use crate::module::{ComputeModule, Export};

/// Longest string a single read will scan before giving up on finding the
/// terminator (64KB).
pub const DEFAULT_SCAN_LIMIT: usize = 64 * 1024;

/// Bytes the host assumes the module reserves for its input slot,
/// terminator included.
pub const DEFAULT_SLOT_CAPACITY: usize = 4096;

/// Reads and writes null-terminated UTF-8 strings in module memory.
///
/// # Examples
///
/// ```
/// use kernel_host::memory::MemoryView;
/// use kernel_host::module::ScriptedModule;
///
/// let mut module = ScriptedModule::new();
/// let view = MemoryView::default();
/// let ptr = view.write_cstring(&mut module, "uname -a").unwrap();
/// assert_eq!(view.read_cstring(&module, ptr), "uname -a");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryView {
    scan_limit: usize,
    slot_capacity: usize,
}

impl Default for MemoryView {
    fn default() -> Self {
        Self::new(DEFAULT_SCAN_LIMIT, DEFAULT_SLOT_CAPACITY)
    }
}

impl MemoryView {
    /// Creates a view with explicit limits.
    ///
    /// # Arguments
    ///
    /// * `scan_limit` - Maximum bytes scanned for a terminator.
    /// * `slot_capacity` - Bytes reserved for the input slot, terminator included.
    #[must_use]
    pub const fn new(scan_limit: usize, slot_capacity: usize) -> Self {
        Self {
            scan_limit,
            slot_capacity,
        }
    }

    /// Decodes the C-string starting at `offset`.
    ///
    /// An offset outside the current buffer yields an empty string, since
    /// the buffer may have been resized after the pointer was issued.
    /// Invalid UTF-8 is replaced, not rejected.
    pub fn read_cstring<M: ComputeModule + ?Sized>(&self, module: &M, offset: usize) -> String {
        match self.try_read_cstring(module.memory(), offset) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, "C-string read out of range");
                String::new()
            }
        }
    }

    /// Decodes the C-string at `offset` in `memory`.
    ///
    /// Stops at the first zero byte, the end of the buffer, or the scan
    /// limit, whichever comes first.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryError::OutOfRange`] if `offset` is past the buffer.
    pub fn try_read_cstring(&self, memory: &[u8], offset: usize) -> Result<String> {
        let tail = memory.get(offset..).ok_or(MemoryError::OutOfRange {
            offset,
            len: memory.len(),
        })?;
        let window = &tail[..tail.len().min(self.scan_limit)];
        let end = window.iter().position(|&b| b == 0).unwrap_or_else(|| {
            tracing::warn!(offset, scanned = window.len(), "no terminator found, truncating");
            window.len()
        });
        Ok(String::from_utf8_lossy(&window[..end]).into_owned())
    }

    /// Reads the string at the module's output slot.
    ///
    /// # Errors
    ///
    /// Returns an error if the module does not export the output slot.
    pub fn read_output<M: ComputeModule + ?Sized>(&self, module: &mut M) -> Result<String> {
        let ptr = module.pointer(Export::OutputSlot)?;
        Ok(self.read_cstring(module, ptr))
    }

    /// Copies `text` plus a terminator into the module's input slot.
    ///
    /// Returns the slot offset. Text that does not fit the slot capacity,
    /// or the bytes left in memory, is cut at a character boundary.
    ///
    /// # Errors
    ///
    /// Returns an error if the module does not export the input slot or
    /// the slot lies outside linear memory.
    pub fn write_cstring<M: ComputeModule + ?Sized>(&self, module: &mut M, text: &str) -> Result<usize> {
        let ptr = module.pointer(Export::InputSlot)?;
        let memory = module.memory_mut();
        let len = memory.len();

        let room = len
            .checked_sub(ptr)
            .filter(|&room| room > 0)
            .ok_or(MemoryError::OutOfRange { offset: ptr, len })?
            .min(self.slot_capacity);
        if room == 0 {
            return Err(MemoryError::SlotTooSmall {
                needed: text.len() + 1,
                capacity: room,
            }
            .into());
        }

        let end = find_char_boundary(text, room - 1);
        if end < text.len() {
            tracing::warn!(
                requested = text.len(),
                written = end,
                "input truncated to fit slot"
            );
        }

        memory[ptr..ptr + end].copy_from_slice(&text.as_bytes()[..end]);
        memory[ptr + end] = 0;
        Ok(ptr)
    }
}
