//! Command dispatch.
//!
//! One call runs one command to completion: echo, write the input slot,
//! execute, read the output slot, route. Nothing else touches the slots
//! in between, since the call holds the session mutably throughout.

use crate::error::Result;
use crate::module::{ComputeModule, Export};
use crate::render::Surface;
use crate::session::Session;

/// Line shown when the module cannot execute commands.
pub const UNAVAILABLE_MESSAGE: &str = "Error: Kernel not loaded or exec_cmd missing.";

/// Entry points a command needs, in the order they are checked.
const COMMAND_EXPORTS: [Export; 3] = [
    Export::ExecuteCommand,
    Export::InputSlot,
    Export::OutputSlot,
];

/// Line shown when `export` is missing.
fn unavailable_message(export: Export) -> String {
    format!("Error: Kernel not loaded or {} missing.", export.name())
}

/// How a command's result was routed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// The line was blank; nothing happened.
    Ignored,
    /// A command entry point is missing; the error line was shown.
    Unavailable,
    /// A directory change; the prompt now shows this path.
    PathChanged(String),
    /// Output was appended to the transcript.
    Printed,
    /// The command produced no output.
    Silent,
}

/// Returns whether `command` changes directory.
fn is_directory_change(command: &str) -> bool {
    command == "cd" || command.starts_with("cd ")
}

/// Runs one command line.
///
/// # Errors
///
/// Returns an error if the input slot cannot be written, the command
/// traps, or the output slot cannot be read. The echo line stays in the
/// transcript either way.
///
/// # Examples
///
/// ```
/// use kernel_host::config::HostConfig;
/// use kernel_host::dispatch::{Dispatch, dispatch};
/// use kernel_host::module::{Reply, ScriptedModule};
/// use kernel_host::render::HtmlPage;
/// use kernel_host::session::Session;
///
/// let module = ScriptedModule::new().with_handler(|cmd| match cmd {
///     "cd /home" => Reply::text("/home"),
///     _ => Reply::default(),
/// });
/// let mut session = Session::new(module, HtmlPage::default(), &HostConfig::default());
///
/// let outcome = dispatch(&mut session, "cd /home").unwrap();
/// assert_eq!(outcome, Dispatch::PathChanged("/home".to_string()));
/// assert_eq!(session.current_path(), "/home");
/// ```
pub fn dispatch<M: ComputeModule, S: Surface>(
    session: &mut Session<M, S>,
    line: &str,
) -> Result<Dispatch> {
    let command = line.trim();
    if command.is_empty() {
        return Ok(Dispatch::Ignored);
    }

    session.echo(command);
    session.record(command);

    if let Some(missing) = COMMAND_EXPORTS
        .into_iter()
        .find(|&export| !session.module().has_export(export))
    {
        tracing::warn!(command, export = missing.name(), "entry point unavailable");
        session.notice(&unavailable_message(missing));
        return Ok(Dispatch::Unavailable);
    }

    let view = *session.view();
    view.write_cstring(session.module_mut(), command)?;
    session.module_mut().invoke(Export::ExecuteCommand)?;
    session.apply_clear_request();
    let output = view.read_output(session.module_mut())?;
    tracing::debug!(command, output_len = output.len(), "command executed");

    let trimmed = output.trim();
    if is_directory_change(command) && trimmed.starts_with('/') {
        session.set_path(trimmed);
        return Ok(Dispatch::PathChanged(trimmed.to_string()));
    }

    if session.append_output(output) {
        Ok(Dispatch::Printed)
    } else {
        Ok(Dispatch::Silent)
    }
}
