//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// kernel-host: run a terminal-style kernel compiled to WebAssembly.
///
/// Boots the kernel, drives its heartbeat and panels, and feeds it
/// commands read line by line from stdin.
#[derive(Parser, Debug)]
#[command(name = "kernel-host")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to a JSON config file.
    ///
    /// Defaults to `kernel-host/config.json` under the platform config
    /// directory, if present.
    #[arg(short, long, env = "KERNEL_HOST_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, default_value = "text", global = true)]
    pub format: String,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Boot a kernel binary and run it.
    ///
    /// Transcript lines stream to stdout. The host stops when stdin closes.
    Run {
        /// Path to the kernel `.wasm` binary.
        module: PathBuf,

        /// Rewrite the full page as HTML to this file every clock tick.
        #[arg(long)]
        snapshot: Option<PathBuf>,

        /// Skip the command normally run once boot completes.
        #[arg(long)]
        no_boot_command: bool,
    },

    /// Render escape markup to HTML.
    ///
    /// Reads from stdin when no text is given.
    Markup {
        /// Markup text.
        text: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parse() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_flags() {
        let cli = Cli::try_parse_from([
            "kernel-host",
            "--format",
            "json",
            "run",
            "kernel.wasm",
            "--snapshot",
            "out.html",
            "--no-boot-command",
        ])
        .unwrap();
        assert_eq!(cli.format, "json");
        assert!(matches!(
            cli.command,
            Commands::Run {
                ref module,
                snapshot: Some(ref snapshot),
                no_boot_command: true,
            } if module == &PathBuf::from("kernel.wasm") && snapshot == &PathBuf::from("out.html")
        ));
    }

    #[test]
    fn test_markup_text_is_optional() {
        let cli = Cli::try_parse_from(["kernel-host", "markup"]).unwrap();
        assert!(matches!(cli.command, Commands::Markup { text: None }));
    }
}
