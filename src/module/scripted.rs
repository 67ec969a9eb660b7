//! In-process compute module.
//!
//! Behaves like a kernel binary from the host's point of view (own linear
//! memory, slot pointers, setters) while command handling is a Rust closure.
//! Used to embed the host without a wasm binary and throughout the tests.

use crate::error::{ModuleError, Result};
use crate::io::find_char_boundary;
use crate::module::{ComputeModule, Export, Signature};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// Default linear memory size (one wasm page).
const DEFAULT_MEMORY_SIZE: usize = 64 * 1024;

/// Offset of the input slot.
const INPUT_OFFSET: usize = 0x0400;

/// Offset of the output slot.
const OUTPUT_OFFSET: usize = 0x2000;

/// Capacity of the output slot, terminator included.
const OUTPUT_CAPACITY: usize = 0x4000;

/// Offset of the status frame.
const FRAME_OFFSET: usize = 0x8000;

/// Capacity of the status frame, terminator included.
const FRAME_CAPACITY: usize = 0x2000;

/// Most calls kept in the call log. The older half is dropped when full.
const CALL_LOG_CAPACITY: usize = 1024;

/// Result of running one command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reply {
    /// Text placed in the output slot.
    pub output: String,
    /// Whether the module asks the host to clear the transcript.
    pub clear: bool,
}

impl Reply {
    /// A reply that prints `output`.
    #[must_use]
    pub fn text(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            clear: false,
        }
    }

    /// A reply that clears the transcript and prints nothing.
    #[must_use]
    pub fn clear() -> Self {
        Self {
            output: String::new(),
            clear: true,
        }
    }
}

/// Closure that turns a command line into a reply.
pub type CommandHandler = Box<dyn FnMut(&str) -> Reply>;

/// In-process compute module with closure-defined commands.
///
/// # Examples
///
/// ```
/// use kernel_host::module::{ComputeModule, Export, Reply, ScriptedModule};
///
/// let mut module = ScriptedModule::new()
///     .with_handler(|cmd| Reply::text(format!("ran {cmd}")));
/// module.set_input("ls");
/// module.invoke(Export::ExecuteCommand).unwrap();
/// assert_eq!(module.output(), "ran ls");
/// ```
pub struct ScriptedModule {
    memory: Vec<u8>,
    exports: BTreeSet<Export>,
    handler: CommandHandler,
    tick_outputs: VecDeque<String>,
    stats: BTreeMap<Export, i32>,
    strings: BTreeMap<Export, String>,
    calls: Vec<Export>,
    hexdump_base: usize,
    clear_requested: bool,
    initialized: bool,
}

impl std::fmt::Debug for ScriptedModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedModule")
            .field("memory_len", &self.memory.len())
            .field("exports", &self.exports)
            .field("calls", &self.calls.len())
            .field("initialized", &self.initialized)
            .finish_non_exhaustive()
    }
}

impl Default for ScriptedModule {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedModule {
    /// Creates a module exporting every entry point, with one page of
    /// memory and a handler that prints nothing.
    #[must_use]
    pub fn new() -> Self {
        Self {
            memory: vec![0; DEFAULT_MEMORY_SIZE],
            exports: Export::ALL.into_iter().collect(),
            handler: Box::new(|_| Reply::default()),
            tick_outputs: VecDeque::new(),
            stats: BTreeMap::new(),
            strings: BTreeMap::new(),
            calls: Vec::new(),
            hexdump_base: 0,
            clear_requested: false,
            initialized: false,
        }
    }

    /// Sets the command handler.
    #[must_use]
    pub fn with_handler<F>(mut self, handler: F) -> Self
    where
        F: FnMut(&str) -> Reply + 'static,
    {
        self.handler = Box::new(handler);
        self
    }

    /// Removes an export, as if the module had been built without it.
    #[must_use]
    pub fn without_export(mut self, export: Export) -> Self {
        self.exports.remove(&export);
        self
    }

    /// Sets the base offset reported to the hex dump.
    #[must_use]
    pub const fn with_hexdump_base(mut self, base: usize) -> Self {
        self.hexdump_base = base;
        self
    }

    /// Queues output for the next heartbeat.
    pub fn queue_tick_output(&mut self, output: impl Into<String>) {
        self.tick_outputs.push_back(output.into());
    }

    /// Replaces the status frame text.
    pub fn set_frame(&mut self, frame: &str) {
        self.write_region(FRAME_OFFSET, FRAME_CAPACITY, frame);
    }

    /// Writes a command into the input slot.
    pub fn set_input(&mut self, input: &str) {
        let capacity = OUTPUT_OFFSET - INPUT_OFFSET;
        self.write_region(INPUT_OFFSET, capacity, input);
    }

    /// Reads the output slot.
    #[must_use]
    pub fn output(&self) -> String {
        self.read_region(OUTPUT_OFFSET)
    }

    /// Copies raw bytes into memory, growing it if needed.
    pub fn poke(&mut self, offset: usize, bytes: &[u8]) {
        let end = offset + bytes.len();
        if end > self.memory.len() {
            self.memory.resize(end, 0);
        }
        self.memory[offset..end].copy_from_slice(bytes);
    }

    /// Grows linear memory, reallocating the buffer like `memory.grow`.
    pub fn grow(&mut self, additional: usize) {
        let mut grown = Vec::with_capacity(self.memory.len() + additional);
        grown.extend_from_slice(&self.memory);
        grown.resize(self.memory.len() + additional, 0);
        self.memory = grown;
    }

    /// Shrinks linear memory (never happens in wasm, useful for bounds tests).
    pub fn truncate_memory(&mut self, len: usize) {
        self.memory.truncate(len);
    }

    /// Returns the last value pushed through a numeric setter.
    #[must_use]
    pub fn stat(&self, export: Export) -> Option<i32> {
        self.stats.get(&export).copied()
    }

    /// Returns the last string pushed through a pointer setter.
    #[must_use]
    pub fn pushed_string(&self, export: Export) -> Option<&str> {
        self.strings.get(&export).map(String::as_str)
    }

    /// Returns the most recent calls, oldest first.
    #[must_use]
    pub fn calls(&self) -> &[Export] {
        &self.calls
    }

    /// Returns whether `init_system` ran.
    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn write_region(&mut self, offset: usize, capacity: usize, text: &str) {
        let end = find_char_boundary(text, capacity.saturating_sub(1));
        let bytes = &text.as_bytes()[..end];
        self.poke(offset, bytes);
        self.poke(offset + bytes.len(), &[0]);
    }

    fn read_region(&self, offset: usize) -> String {
        let tail = self.memory.get(offset..).unwrap_or_default();
        let end = tail.iter().position(|&b| b == 0).unwrap_or(tail.len());
        String::from_utf8_lossy(&tail[..end]).into_owned()
    }

    fn run_command(&mut self) {
        let input = self.read_region(INPUT_OFFSET);
        let reply = (self.handler)(&input);
        self.clear_requested |= reply.clear;
        self.write_region(OUTPUT_OFFSET, OUTPUT_CAPACITY, &reply.output);
    }

    fn run_tick(&mut self) {
        let output = self.tick_outputs.pop_front().unwrap_or_default();
        self.write_region(OUTPUT_OFFSET, OUTPUT_CAPACITY, &output);
    }
}

impl ComputeModule for ScriptedModule {
    fn has_export(&self, export: Export) -> bool {
        self.exports.contains(&export)
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    fn call(&mut self, export: Export, arg: Option<i32>) -> Result<Option<i32>> {
        if !self.has_export(export) {
            return Err(ModuleError::Unavailable {
                export: export.name(),
            }
            .into());
        }
        if self.calls.len() >= CALL_LOG_CAPACITY {
            self.calls.drain(..CALL_LOG_CAPACITY / 2);
        }
        self.calls.push(export);

        match export.signature() {
            Signature::Action => {
                match export {
                    Export::Initialize => self.initialized = true,
                    Export::Tick => self.run_tick(),
                    _ => self.run_command(),
                }
                Ok(None)
            }
            Signature::Pointer => {
                let offset = match export {
                    Export::GetFrame => FRAME_OFFSET,
                    Export::GetHexdumpBase => self.hexdump_base,
                    Export::InputSlot => INPUT_OFFSET,
                    _ => OUTPUT_OFFSET,
                };
                Ok(Some(offset as u32 as i32))
            }
            Signature::Setter => {
                let value = arg.ok_or_else(|| ModuleError::Trap {
                    export: export.name(),
                    reason: "missing argument".to_string(),
                })?;
                if matches!(export, Export::SetUptime | Export::SetTerminal) {
                    #[allow(clippy::cast_sign_loss)]
                    let text = self.read_region(value as u32 as usize);
                    self.strings.insert(export, text);
                } else {
                    self.stats.insert(export, value);
                }
                Ok(None)
            }
        }
    }

    fn memory(&self) -> &[u8] {
        &self.memory
    }

    fn memory_mut(&mut self) -> &mut [u8] {
        &mut self.memory
    }

    fn take_clear_request(&mut self) -> bool {
        std::mem::take(&mut self.clear_requested)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_round_trip() {
        let mut module = ScriptedModule::new().with_handler(|cmd| Reply::text(cmd.to_uppercase()));
        module.set_input("whoami");
        module.invoke(Export::ExecuteCommand).unwrap();
        assert_eq!(module.output(), "WHOAMI");
    }

    #[test]
    fn test_tick_drains_queue() {
        let mut module = ScriptedModule::new();
        module.queue_tick_output("beat");
        module.invoke(Export::Tick).unwrap();
        assert_eq!(module.output(), "beat");
        module.invoke(Export::Tick).unwrap();
        assert_eq!(module.output(), "");
    }

    #[test]
    fn test_clear_request_is_one_shot() {
        let mut module = ScriptedModule::new().with_handler(|_| Reply::clear());
        module.invoke(Export::ExecuteCommand).unwrap();
        assert!(module.take_clear_request());
        assert!(!module.take_clear_request());
    }

    #[test]
    fn test_grow_preserves_contents() {
        let mut module = ScriptedModule::new();
        module.set_frame("frame");
        module.grow(4096);
        assert_eq!(module.memory().len(), DEFAULT_MEMORY_SIZE + 4096);
        assert_eq!(module.read_region(FRAME_OFFSET), "frame");
    }

    #[test]
    fn test_missing_export_is_unavailable() {
        let mut module = ScriptedModule::new().without_export(Export::Tick);
        assert!(module.invoke(Export::Tick).is_err());
        assert!(module.calls().is_empty());
    }

    #[test]
    fn test_call_log_is_bounded() {
        let mut module = ScriptedModule::new();
        for _ in 0..10 * CALL_LOG_CAPACITY {
            module.invoke(Export::Tick).unwrap();
            module.pointer(Export::OutputSlot).unwrap();
        }
        let calls = module.calls();
        assert!(calls.len() <= CALL_LOG_CAPACITY);
        assert!(calls.len() > CALL_LOG_CAPACITY / 2);
        assert_eq!(calls.last(), Some(&Export::OutputSlot));
        assert_eq!(calls[calls.len() - 2], Export::Tick);
    }

    #[test]
    fn test_string_setter_decodes_pointer() {
        let mut module = ScriptedModule::new();
        module.set_input("3m 2s");
        let ptr = module.pointer(Export::InputSlot).unwrap();
        let ptr = i32::try_from(ptr).unwrap();
        assert!(module.push(Export::SetUptime, ptr));
        assert_eq!(module.pushed_string(Export::SetUptime), Some("3m 2s"));
    }
}
