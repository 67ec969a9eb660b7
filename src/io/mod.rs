//! I/O utilities for the kernel host.
//!
//! Provides module-binary reading with memory mapping support for large
//! kernels, snapshot writing, and the Unicode helpers used when text must
//! fit a fixed-size slot in linear memory.

pub mod reader;
pub mod unicode;

pub use reader::{FileReader, read_file, write_file};
pub use unicode::{find_char_boundary, truncate_to_bytes};
