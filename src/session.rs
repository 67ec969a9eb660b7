//! Host session state.
//!
//! A [`Session`] is created at boot and lives as long as the host. It owns
//! the module, the surface and everything the renderers and the dispatcher
//! share: the memory view, the markup parser, the working directory, the
//! command history and the boot instant. There is no teardown.

use crate::config::HostConfig;
use crate::markup::MarkupParser;
use crate::memory::MemoryView;
use crate::module::{ComputeModule, Export};
use crate::render::{
    HexGeometry, Surface, TerminalLine, Transcript, frame::render_frame, render_hexdump,
    render_prompt,
};
use std::time::{Duration, Instant};

/// Shared state of a running host.
#[derive(Debug)]
pub struct Session<M, S> {
    module: M,
    surface: S,
    view: MemoryView,
    parser: MarkupParser,
    transcript: Transcript,
    hex: HexGeometry,
    identity: String,
    current_path: String,
    history: Vec<String>,
    booted_at: Instant,
}

impl<M: ComputeModule, S: Surface> Session<M, S> {
    /// Creates a session at path `/` with an empty history.
    #[must_use]
    pub fn new(module: M, surface: S, config: &HostConfig) -> Self {
        Self {
            module,
            surface,
            view: config.memory_view(),
            parser: config.markup_parser(),
            transcript: Transcript::new(),
            hex: config.hexdump,
            identity: config.identity.clone(),
            current_path: "/".to_string(),
            history: Vec::new(),
            booted_at: Instant::now(),
        }
    }

    /// The compute module.
    pub const fn module(&self) -> &M {
        &self.module
    }

    /// The compute module, mutably.
    pub const fn module_mut(&mut self) -> &mut M {
        &mut self.module
    }

    /// The surface.
    pub const fn surface(&self) -> &S {
        &self.surface
    }

    /// The surface, mutably.
    pub const fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// The memory view.
    pub const fn view(&self) -> &MemoryView {
        &self.view
    }

    /// The module's working directory as last reported.
    pub fn current_path(&self) -> &str {
        &self.current_path
    }

    /// Every nonblank command entered, oldest first.
    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Time since the session was created.
    pub fn uptime(&self) -> Duration {
        self.booted_at.elapsed()
    }

    /// Records a command in the history.
    pub fn record(&mut self, command: &str) {
        self.history.push(command.to_string());
    }

    /// Appends the echo of a command at the current prompt.
    pub fn echo(&mut self, command: &str) {
        let line = TerminalLine::Command {
            identity: self.identity.clone(),
            path: self.current_path.clone(),
            text: command.to_string(),
        };
        self.transcript.append(&mut self.surface, line);
    }

    /// Appends a plain-text host message.
    pub fn notice(&mut self, text: &str) {
        let line = TerminalLine::Notice {
            text: text.to_string(),
        };
        self.transcript.append(&mut self.surface, line);
    }

    /// Appends module output as one transcript entry. Empty output adds
    /// nothing. Returns whether a line was added.
    pub fn append_output(&mut self, raw: String) -> bool {
        if raw.is_empty() {
            return false;
        }
        let html = self.parser.parse_lines(&raw);
        self.transcript
            .append(&mut self.surface, TerminalLine::Output { raw, html });
        true
    }

    /// Clears the transcript if the module asked for it during its last
    /// call. Returns whether it cleared.
    pub fn apply_clear_request(&mut self) -> bool {
        if self.module.take_clear_request() {
            tracing::debug!("module requested transcript clear");
            self.transcript.clear(&mut self.surface);
            true
        } else {
            false
        }
    }

    /// Changes the working directory and redraws the prompt.
    pub fn set_path(&mut self, path: &str) {
        path.clone_into(&mut self.current_path);
        self.render_prompt();
    }

    /// Redraws the prompt.
    pub fn render_prompt(&mut self) {
        let html = render_prompt(&self.identity, &self.current_path);
        self.surface.set_prompt(html);
    }

    /// Redraws the status frame. Skipped when the module cannot supply one.
    pub fn render_frame(&mut self) {
        match render_frame(&mut self.module, &self.view, &self.parser) {
            Ok(html) => self.surface.set_frame(html),
            Err(e) => tracing::trace!(error = %e, "frame skipped"),
        }
    }

    /// Redraws the memory dump. Skipped when the module has no dump base.
    pub fn render_hexdump(&mut self) {
        let base = match self.module.pointer(Export::GetHexdumpBase) {
            Ok(base) => base,
            Err(e) => {
                tracing::trace!(error = %e, "memory dump skipped");
                return;
            }
        };
        let rows = self.hex.rows_for_height(self.surface.hexdump_height_px());
        let html = render_hexdump(self.module.memory(), base, rows);
        self.surface.set_hexdump(html);
    }

    /// Performs a scroll left pending by the previous turn.
    pub fn flush_scroll(&mut self) -> bool {
        self.transcript.flush_scroll(&mut self.surface)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::ScriptedModule;
    use crate::render::HtmlPage;

    fn session() -> Session<ScriptedModule, HtmlPage> {
        Session::new(ScriptedModule::new(), HtmlPage::default(), &HostConfig::default())
    }

    #[test]
    fn test_initial_state() {
        let mut session = session();
        assert_eq!(session.current_path(), "/");
        assert!(session.history().is_empty());
        session.render_prompt();
        assert!(session.surface().prompt().starts_with("billie-bytes@portfolio:"));
    }

    #[test]
    fn test_empty_output_adds_nothing() {
        let mut session = session();
        assert!(!session.append_output(String::new()));
        assert!(session.surface().lines().is_empty());
    }

    #[test]
    fn test_output_keeps_raw_and_html() {
        let mut session = session();
        assert!(session.append_output("a\nb".to_string()));
        assert_eq!(
            session.surface().lines(),
            &[TerminalLine::Output {
                raw: "a\nb".to_string(),
                html: "a<br>b".to_string(),
            }]
        );
    }

    #[test]
    fn test_set_path_redraws_prompt() {
        let mut session = session();
        session.set_path("/home");
        assert_eq!(session.current_path(), "/home");
        assert!(session.surface().prompt().contains(">/home</span>$"));
    }

    #[test]
    fn test_hexdump_rows_follow_panel_height() {
        let mut session = Session::new(
            ScriptedModule::new(),
            HtmlPage::new(30 + 12 * 3),
            &HostConfig::default(),
        );
        session.render_hexdump();
        assert_eq!(session.surface().hexdump().matches("<br>").count(), 3);
    }

    #[test]
    fn test_missing_exports_skip_panels() {
        let module = ScriptedModule::new()
            .without_export(Export::GetFrame)
            .without_export(Export::GetHexdumpBase);
        let mut session = Session::new(module, HtmlPage::default(), &HostConfig::default());
        session.render_frame();
        session.render_hexdump();
        assert_eq!(session.surface().frame(), "");
        assert_eq!(session.surface().hexdump(), "");
    }
}
