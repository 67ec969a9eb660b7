//! Kernel binaries loaded through the `wasmi` interpreter.
//!
//! The kernel imports a single host function, `env.clear`, which it calls
//! to wipe the transcript. Everything else flows through its exports and
//! its exported `memory`.

use crate::error::{ModuleError, Result};
use crate::io::FileReader;
use crate::module::{ComputeModule, Export, Signature};
use std::collections::HashMap;
use std::path::Path;
use wasmi::{Caller, Engine, Linker, Memory, Module, Store, TypedFunc};

/// Host state reachable from imported functions.
#[derive(Debug, Default)]
struct HostState {
    clear_requested: bool,
}

/// A resolved export, typed by its call shape.
///
/// Kernels compiled from C sometimes return a status from `void`-ish
/// entry points, so each shape has a variant that discards an `i32`.
enum Resolved {
    Action(TypedFunc<(), ()>),
    ActionWithStatus(TypedFunc<(), i32>),
    Pointer(TypedFunc<(), i32>),
    Setter(TypedFunc<i32, ()>),
    SetterWithStatus(TypedFunc<i32, i32>),
}

/// Compute module backed by a `.wasm` kernel binary.
pub struct WasmModule {
    store: Store<HostState>,
    memory: Memory,
    exports: HashMap<Export, Resolved>,
}

impl std::fmt::Debug for WasmModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut exports: Vec<_> = self.exports.keys().map(|e| e.name()).collect();
        exports.sort_unstable();
        f.debug_struct("WasmModule")
            .field("memory_len", &self.memory.data(&self.store).len())
            .field("exports", &exports)
            .finish_non_exhaustive()
    }
}

impl WasmModule {
    /// Loads and instantiates a kernel binary from disk.
    ///
    /// # Errors
    ///
    /// Returns [`ModuleError::Load`] if the file cannot be read or decoded
    /// and [`ModuleError::Instantiate`] if linking or start-up fails.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let path_str = path_ref.to_string_lossy().to_string();

        let bytes = FileReader::open(path_ref)
            .and_then(|reader| reader.read_to_bytes())
            .map_err(|e| ModuleError::Load {
                path: path_str.clone(),
                reason: e.to_string(),
            })?;

        Self::from_bytes(&bytes).map_err(|e| match e {
            crate::Error::Module(ModuleError::Instantiate(reason)) => {
                ModuleError::Instantiate(reason).into()
            }
            other => ModuleError::Load {
                path: path_str,
                reason: other.to_string(),
            }
            .into(),
        })
    }

    /// Instantiates a kernel from an in-memory binary.
    ///
    /// # Errors
    ///
    /// Returns an error if the binary does not decode, link, or start, or
    /// if it does not export a linear memory named `memory`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let engine = Engine::default();
        let module = Module::new(&engine, bytes).map_err(|e| ModuleError::Load {
            path: "<memory>".to_string(),
            reason: e.to_string(),
        })?;

        let mut store = Store::new(&engine, HostState::default());
        let mut linker = <Linker<HostState>>::new(&engine);
        linker
            .func_wrap("env", "clear", |mut caller: Caller<'_, HostState>| {
                caller.data_mut().clear_requested = true;
            })
            .map_err(|e| ModuleError::Instantiate(e.to_string()))?;

        let instance = linker
            .instantiate(&mut store, &module)
            .map_err(|e| ModuleError::Instantiate(e.to_string()))?
            .start(&mut store)
            .map_err(|e| ModuleError::Instantiate(e.to_string()))?;

        let memory = instance
            .get_memory(&store, "memory")
            .ok_or_else(|| ModuleError::Instantiate("no exported memory".to_string()))?;

        let mut exports = HashMap::new();
        for export in Export::ALL {
            let name = export.name();
            let resolved = match export.signature() {
                Signature::Action => instance
                    .get_typed_func::<(), ()>(&store, name)
                    .map(Resolved::Action)
                    .or_else(|_| {
                        instance
                            .get_typed_func::<(), i32>(&store, name)
                            .map(Resolved::ActionWithStatus)
                    }),
                Signature::Pointer => instance
                    .get_typed_func::<(), i32>(&store, name)
                    .map(Resolved::Pointer),
                Signature::Setter => instance
                    .get_typed_func::<i32, ()>(&store, name)
                    .map(Resolved::Setter)
                    .or_else(|_| {
                        instance
                            .get_typed_func::<i32, i32>(&store, name)
                            .map(Resolved::SetterWithStatus)
                    }),
            };
            match resolved {
                Ok(func) => {
                    exports.insert(export, func);
                }
                Err(e) if instance.get_export(&store, name).is_some() => {
                    tracing::warn!(export = name, error = %e, "export has unexpected signature, treating as absent");
                }
                Err(_) => tracing::debug!(export = name, "export not present"),
            }
        }

        tracing::info!(
            exports = exports.len(),
            memory_bytes = memory.data(&store).len(),
            "kernel instantiated"
        );

        Ok(Self {
            store,
            memory,
            exports,
        })
    }
}

impl ComputeModule for WasmModule {
    fn has_export(&self, export: Export) -> bool {
        self.exports.contains_key(&export)
    }

    fn call(&mut self, export: Export, arg: Option<i32>) -> Result<Option<i32>> {
        let func = self
            .exports
            .get(&export)
            .ok_or(ModuleError::Unavailable {
                export: export.name(),
            })?;
        let value = arg.unwrap_or_default();
        let store = &mut self.store;

        let result = match func {
            Resolved::Action(f) => f.call(store, ()).map(|()| None).map_err(|e| e.to_string()),
            Resolved::ActionWithStatus(f) => f.call(store, ()).map(|_| None).map_err(|e| e.to_string()),
            Resolved::Pointer(f) => f.call(store, ()).map(Some).map_err(|e| e.to_string()),
            Resolved::Setter(f) => f.call(store, value).map(|()| None).map_err(|e| e.to_string()),
            Resolved::SetterWithStatus(f) => {
                f.call(store, value).map(|_| None).map_err(|e| e.to_string())
            }
        };
        result.map_err(|reason| {
            ModuleError::Trap {
                export: export.name(),
                reason,
            }
            .into()
        })
    }

    fn memory(&self) -> &[u8] {
        self.memory.data(&self.store)
    }

    fn memory_mut(&mut self) -> &mut [u8] {
        self.memory.data_mut(&mut self.store)
    }

    fn take_clear_request(&mut self) -> bool {
        std::mem::take(&mut self.store.data_mut().clear_requested)
    }
}
