//! CLI layer for kernel-host.
//!
//! Provides the command-line interface using clap, with commands for
//! running a kernel binary and rendering markup.

pub mod commands;
pub mod output;
pub mod parser;

pub use commands::execute;
pub use output::{OutputFormat, StreamSurface};
pub use parser::{Cli, Commands};
