//! CLI command implementations.
//!
//! Contains the business logic for each CLI command.

use crate::cli::output::{OutputFormat, StreamSurface, format_markup};
use crate::cli::parser::{Cli, Commands};
use crate::config::HostConfig;
use crate::error::Result;
use crate::markup::MarkupParser;
use crate::module::ComputeModule;
use crate::probe::SystemProbe;
use crate::render::{HtmlPage, Surface, TerminalLine, strip_markup};
use crate::scheduler::Scheduler;
use crate::session::Session;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

/// Line shown when the kernel binary cannot be loaded.
pub const LOAD_FAILURE_MESSAGE: &str = "CRITICAL ERROR: Could not load kernel.wasm";

/// Executes the CLI command.
///
/// # Arguments
///
/// * `cli` - Parsed CLI arguments.
///
/// # Returns
///
/// Result with output string on success. `run` streams its output while
/// it runs and returns an empty string.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or the command
/// fails to execute.
pub fn execute(cli: &Cli) -> Result<String> {
    let format = OutputFormat::parse(&cli.format);
    let config = HostConfig::load(cli.config.as_deref())?;

    match &cli.command {
        Commands::Run {
            module,
            snapshot,
            no_boot_command,
        } => cmd_run(&config, module, snapshot.clone(), *no_boot_command, format),
        Commands::Markup { text } => cmd_markup(&config.markup_parser(), text.as_deref(), format),
    }
}

fn cmd_markup(parser: &MarkupParser, text: Option<&str>, format: OutputFormat) -> Result<String> {
    let input = match text {
        Some(text) => text.to_string(),
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };
    Ok(format_markup(
        &parser.parse(&input),
        &strip_markup(&input),
        format,
    ))
}

fn cmd_run(
    config: &HostConfig,
    module_path: &Path,
    snapshot: Option<PathBuf>,
    no_boot_command: bool,
    format: OutputFormat,
) -> Result<String> {
    let stdout = io::stdout();
    let clear_screen = stdout.is_terminal();
    let mut surface = StreamSurface::new(
        HtmlPage::new(config.hexdump.height_px),
        stdout,
        format,
        clear_screen,
    );

    let module = match load_module(module_path) {
        Ok(module) => module,
        Err(e) => {
            tracing::error!(path = %module_path.display(), error = %e, "boot failed");
            surface.append_line(TerminalLine::Notice {
                text: LOAD_FAILURE_MESSAGE.to_string(),
            });
            return Err(e);
        }
    };

    run_loop(config, module, surface, snapshot, no_boot_command)?;
    Ok(String::new())
}

#[cfg(feature = "wasm")]
fn load_module(path: &Path) -> Result<crate::module::WasmModule> {
    crate::module::WasmModule::load(path)
}

#[cfg(not(feature = "wasm"))]
fn load_module(path: &Path) -> Result<crate::module::ScriptedModule> {
    Err(crate::error::ModuleError::Load {
        path: path.to_string_lossy().to_string(),
        reason: "built without the `wasm` feature".to_string(),
    }
    .into())
}

fn run_loop<M, S>(
    config: &HostConfig,
    module: M,
    surface: S,
    snapshot: Option<PathBuf>,
    no_boot_command: bool,
) -> Result<()>
where
    M: ComputeModule,
    S: Surface,
{
    let session = Session::new(module, surface, config);
    let mut scheduler = Scheduler::new(session, SystemProbe::new(config), config);
    if no_boot_command {
        scheduler = scheduler.with_boot_command(None);
    }
    if snapshot.is_some() {
        scheduler = scheduler.with_snapshot(snapshot);
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;

    runtime.block_on(async move {
        scheduler.boot()?;

        let (tx, rx) = mpsc::channel::<String>(32);
        tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if tx.send(line).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        tracing::warn!(error = %e, "stdin read failed");
                        break;
                    }
                }
            }
        });

        let scheduler = scheduler.run(rx).await;
        tracing::debug!(
            commands = scheduler.session().history().len(),
            "session ended"
        );
        Ok::<(), crate::error::Error>(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markup_from_argument() {
        let out = cmd_markup(
            &MarkupParser::default(),
            Some("\x1b[31mred\x1b[0m & more"),
            OutputFormat::Text,
        )
        .unwrap();
        assert_eq!(
            out,
            "<span style=\"color: #ff5555\">red</span> &amp; more\n"
        );
    }

    #[test]
    fn test_markup_json() {
        let out = cmd_markup(
            &MarkupParser::default(),
            Some("\x1b[Lghmgh\x1b[Lem"),
            OutputFormat::Json,
        )
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["plain"], "gh");
        assert!(value["html"].as_str().unwrap().contains("href=\"https://github.com/billie-bytes\""));
    }

    #[test]
    fn test_run_missing_module_fails() {
        let config = HostConfig::default();
        let result = cmd_run(
            &config,
            Path::new("/nonexistent/kernel.wasm"),
            None,
            true,
            OutputFormat::Json,
        );
        assert!(result.is_err());
    }
}
