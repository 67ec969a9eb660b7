//! # kernel-host
//!
//! Host layer for terminal-style kernels compiled to WebAssembly.
//!
//! A kernel exposes a linear memory buffer and a handful of entry points.
//! This crate boots it, marshals C-strings across its memory, turns its
//! escape markup into safe HTML, and runs the fixed-cadence loop that keeps
//! the transcript, status frame and live memory dump up to date.
//!
//! ## Features
//!
//! - **String Marshaling**: Bounded C-string reads and writes that never
//!   hold a view across module calls
//! - **Escape Markup**: Single-pass scanner for link and color tags with
//!   HTML escaping of everything else
//! - **Panels**: Transcript, status frame, memory dump and clock renderers
//!   over a pluggable [`Surface`]
//! - **Scheduler**: Single-task `tokio` loop with independent timers and
//!   single-flight command execution
//! - **Kernels**: `wasmi`-backed [`WasmModule`] (feature `wasm`) or the
//!   in-process [`ScriptedModule`]

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
// Note: unsafe is needed for memory-mapped I/O (memmap2)
#![warn(unsafe_code)]

pub mod cli;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod io;
pub mod markup;
pub mod memory;
pub mod module;
pub mod probe;
pub mod render;
pub mod scheduler;
pub mod session;

// Re-export commonly used types at crate root
pub use error::{Error, Result};

// Re-export boundary types
#[cfg(feature = "wasm")]
pub use module::WasmModule;
pub use module::{ComputeModule, Export, Reply, ScriptedModule};

// Re-export core components
pub use config::HostConfig;
pub use dispatch::{Dispatch, dispatch};
pub use markup::{MarkupParser, escape_html};
pub use memory::MemoryView;
pub use probe::{HostProbe, StaticProbe, SystemProbe};
pub use render::{HtmlPage, Surface, TerminalLine};
pub use scheduler::Scheduler;
pub use session::Session;

// Re-export CLI types
pub use cli::{Cli, Commands, OutputFormat};
