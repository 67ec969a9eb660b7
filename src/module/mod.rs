//! Boundary with the compute module.
//!
//! A compute module exposes a linear memory buffer and a fixed set of
//! named entry points. The host never assumes an entry point exists: every
//! call goes through a capability check so a module built without, say,
//! `set_system_battery` still runs.
//!
//! # Feature Flags
//!
//! - `wasm`: Enables [`WasmModule`], which loads kernel binaries through
//!   the `wasmi` interpreter
//! - Without the feature: only the in-process [`ScriptedModule`] is available

mod scripted;

#[cfg(feature = "wasm")]
mod wasm;

pub use scripted::{CommandHandler, Reply, ScriptedModule};

#[cfg(feature = "wasm")]
pub use wasm::WasmModule;

use crate::error::{ModuleError, Result};

/// Entry points a compute module may export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Export {
    /// One-shot initialization, called after load.
    Initialize,
    /// Advances module state one heartbeat; output lands in the output slot.
    Tick,
    /// Consumes the input slot and fills the output slot.
    ExecuteCommand,
    /// Returns a pointer to the current status frame.
    GetFrame,
    /// Returns the base offset for the live memory dump.
    GetHexdumpBase,
    /// Returns the input slot pointer.
    InputSlot,
    /// Returns the output slot pointer.
    OutputSlot,
    /// Screen width in pixels.
    SetWindowWidth,
    /// Screen height in pixels.
    SetWindowHeight,
    /// Pointer to a terminal/locale string.
    SetTerminal,
    /// Logical core count.
    SetCores,
    /// Device memory in GiB.
    SetRam,
    /// Host memory usage in bytes.
    SetMemoryUsage,
    /// Battery charge percentage.
    SetBattery,
    /// Pointer to a formatted uptime string.
    SetUptime,
}

/// Call shape of an entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signature {
    /// `() -> ()`
    Action,
    /// `() -> i32`, the result is an offset into linear memory.
    Pointer,
    /// `(i32) -> ()`
    Setter,
}

impl Export {
    /// Every export the host knows about.
    pub const ALL: [Self; 15] = [
        Self::Initialize,
        Self::Tick,
        Self::ExecuteCommand,
        Self::GetFrame,
        Self::GetHexdumpBase,
        Self::InputSlot,
        Self::OutputSlot,
        Self::SetWindowWidth,
        Self::SetWindowHeight,
        Self::SetTerminal,
        Self::SetCores,
        Self::SetRam,
        Self::SetMemoryUsage,
        Self::SetBattery,
        Self::SetUptime,
    ];

    /// Returns the symbol name the kernel exports this entry point under.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Initialize => "init_system",
            Self::Tick => "kernel_tick",
            Self::ExecuteCommand => "exec_cmd",
            Self::GetFrame => "get_frame",
            Self::GetHexdumpBase => "get_hexdump_ptr",
            Self::InputSlot => "get_g_input_buffer",
            Self::OutputSlot => "get_g_output_buffer",
            Self::SetWindowWidth => "set_window_width",
            Self::SetWindowHeight => "set_window_height",
            Self::SetTerminal => "set_terminal",
            Self::SetCores => "set_system_cores",
            Self::SetRam => "set_system_ram",
            Self::SetMemoryUsage => "set_memory_usage",
            Self::SetBattery => "set_system_battery",
            Self::SetUptime => "set_uptime",
        }
    }

    /// Returns the call shape of this entry point.
    #[must_use]
    pub const fn signature(self) -> Signature {
        match self {
            Self::Initialize | Self::Tick | Self::ExecuteCommand => Signature::Action,
            Self::GetFrame | Self::GetHexdumpBase | Self::InputSlot | Self::OutputSlot => {
                Signature::Pointer
            }
            Self::SetWindowWidth
            | Self::SetWindowHeight
            | Self::SetTerminal
            | Self::SetCores
            | Self::SetRam
            | Self::SetMemoryUsage
            | Self::SetBattery
            | Self::SetUptime => Signature::Setter,
        }
    }
}

/// A compute module: linear memory plus callable entry points.
///
/// The memory slice returned by [`memory`](Self::memory) is only valid
/// until the next call, since any call may grow and relocate the buffer.
/// The borrow checker enforces this: a `&[u8]` view cannot be held across
/// `&mut self` calls, so every reader re-derives its view.
///
/// # Examples
///
/// ```
/// use kernel_host::module::{ComputeModule, Export, ScriptedModule};
///
/// let mut module = ScriptedModule::new();
/// assert!(module.has_export(Export::ExecuteCommand));
/// let slot = module.pointer(Export::InputSlot).unwrap();
/// assert!(slot < module.memory().len());
/// ```
pub trait ComputeModule {
    /// Returns whether the module exports this entry point.
    fn has_export(&self, export: Export) -> bool;

    /// Calls an entry point.
    ///
    /// `arg` is passed to setters; pointer queries return `Some(offset)`.
    ///
    /// # Errors
    ///
    /// Returns [`ModuleError::Unavailable`] when the export is missing and
    /// [`ModuleError::Trap`] when the call traps.
    fn call(&mut self, export: Export, arg: Option<i32>) -> Result<Option<i32>>;

    /// Returns the current linear memory.
    fn memory(&self) -> &[u8];

    /// Returns the current linear memory for writing.
    fn memory_mut(&mut self) -> &mut [u8];

    /// Returns and resets the module's "clear the transcript" request.
    fn take_clear_request(&mut self) -> bool;

    /// Calls an entry point that takes and returns nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the export is missing or traps.
    fn invoke(&mut self, export: Export) -> Result<()> {
        self.call(export, None).map(|_| ())
    }

    /// Calls a pointer query and returns the offset it yields.
    ///
    /// Wasm pointers are unsigned 32-bit values carried in an `i32`.
    ///
    /// # Errors
    ///
    /// Returns an error if the export is missing, traps, or returns nothing.
    #[allow(clippy::cast_sign_loss)]
    fn pointer(&mut self, export: Export) -> Result<usize> {
        let raw = self
            .call(export, None)?
            .ok_or(ModuleError::Unavailable {
                export: export.name(),
            })?;
        Ok(raw as u32 as usize)
    }

    /// Pushes a value through a setter if the module exports it.
    ///
    /// Absence is a no-op and traps are logged, so callers can fire and
    /// forget. Returns whether the value was delivered.
    fn push(&mut self, export: Export, value: i32) -> bool {
        if !self.has_export(export) {
            tracing::trace!(export = export.name(), "setter not exported, skipping");
            return false;
        }
        match self.call(export, Some(value)) {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(export = export.name(), error = %e, "setter failed");
                false
            }
        }
    }
}

impl<M: ComputeModule + ?Sized> ComputeModule for Box<M> {
    fn has_export(&self, export: Export) -> bool {
        (**self).has_export(export)
    }

    fn call(&mut self, export: Export, arg: Option<i32>) -> Result<Option<i32>> {
        (**self).call(export, arg)
    }

    fn memory(&self) -> &[u8] {
        (**self).memory()
    }

    fn memory_mut(&mut self) -> &mut [u8] {
        (**self).memory_mut()
    }

    fn take_clear_request(&mut self) -> bool {
        (**self).take_clear_request()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_names_are_unique() {
        let mut names: Vec<_> = Export::ALL.iter().map(|e| e.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), Export::ALL.len());
    }

    #[test]
    fn test_export_signatures() {
        assert_eq!(Export::Tick.signature(), Signature::Action);
        assert_eq!(Export::GetFrame.signature(), Signature::Pointer);
        assert_eq!(Export::SetUptime.signature(), Signature::Setter);
    }

    #[test]
    fn test_push_missing_setter_is_noop() {
        let mut module = ScriptedModule::new().without_export(Export::SetBattery);
        assert!(!module.push(Export::SetBattery, 80));
        assert!(module.push(Export::SetCores, 8));
        assert_eq!(module.stat(Export::SetCores), Some(8));
        assert_eq!(module.stat(Export::SetBattery), None);
    }

    #[test]
    fn test_pointer_missing_export() {
        let mut module = ScriptedModule::new().without_export(Export::GetFrame);
        let err = module.pointer(Export::GetFrame).unwrap_err();
        assert!(err.to_string().contains("get_frame"));
    }

    #[test]
    fn test_boxed_module_delegates() {
        let mut module: Box<dyn ComputeModule> = Box::new(ScriptedModule::new());
        assert!(module.has_export(Export::Tick));
        assert!(module.invoke(Export::Tick).is_ok());
        assert!(!module.memory().is_empty());
    }
}
