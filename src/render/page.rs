//! In-memory page holding every region as HTML.

use crate::render::{Surface, TerminalLine};
use std::fmt::Write;

/// A [`Surface`] that keeps the page in memory.
///
/// # Examples
///
/// ```
/// use kernel_host::render::{HtmlPage, Surface, TerminalLine};
///
/// let mut page = HtmlPage::new(400);
/// page.append_line(TerminalLine::Notice { text: "hello".to_string() });
/// assert!(page.render_document().contains("<div>hello</div>"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlPage {
    lines: Vec<TerminalLine>,
    prompt: String,
    frame: String,
    hexdump: String,
    clock: String,
    hexdump_height_px: u32,
    scrolled_lines: usize,
}

impl Default for HtmlPage {
    fn default() -> Self {
        Self::new(400)
    }
}

impl HtmlPage {
    /// Creates an empty page whose dump panel is `hexdump_height_px` tall.
    #[must_use]
    pub const fn new(hexdump_height_px: u32) -> Self {
        Self {
            lines: Vec::new(),
            prompt: String::new(),
            frame: String::new(),
            hexdump: String::new(),
            clock: String::new(),
            hexdump_height_px,
            scrolled_lines: 0,
        }
    }

    /// Transcript lines, oldest first.
    #[must_use]
    pub fn lines(&self) -> &[TerminalLine] {
        &self.lines
    }

    /// Current prompt HTML.
    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Current status frame HTML.
    #[must_use]
    pub fn frame(&self) -> &str {
        &self.frame
    }

    /// Current memory dump HTML.
    #[must_use]
    pub fn hexdump(&self) -> &str {
        &self.hexdump
    }

    /// Current clock HTML.
    #[must_use]
    pub fn clock(&self) -> &str {
        &self.clock
    }

    /// Number of lines visible after the last scroll.
    #[must_use]
    pub const fn scrolled_lines(&self) -> usize {
        self.scrolled_lines
    }

    /// Renders a standalone HTML document of the page.
    #[must_use]
    pub fn render_document(&self) -> String {
        let mut doc = String::from(
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>kernel</title>\n</head>\n<body>\n",
        );
        doc.push_str("<main id=\"terminal-main\">\n<div id=\"terminal-output\">\n");
        for line in &self.lines {
            let _ = writeln!(doc, "<div>{}</div>", line.to_html());
        }
        let _ = write!(
            doc,
            "</div>\n<span id=\"prompt\">{}</span>\n</main>\n",
            self.prompt
        );
        let _ = write!(
            doc,
            "<pre id=\"neofetch-output\">{}</pre>\n<div id=\"status-panel-2\">{}</div>\n<div id=\"digital-clock-vertical\">{}</div>\n",
            self.frame, self.hexdump, self.clock
        );
        doc.push_str("</body>\n</html>\n");
        doc
    }
}

impl Surface for HtmlPage {
    fn append_line(&mut self, line: TerminalLine) {
        self.lines.push(line);
    }

    fn clear_transcript(&mut self) {
        self.lines.clear();
        self.scrolled_lines = 0;
    }

    fn set_prompt(&mut self, html: String) {
        self.prompt = html;
    }

    fn set_frame(&mut self, html: String) {
        self.frame = html;
    }

    fn set_hexdump(&mut self, html: String) {
        self.hexdump = html;
    }

    fn set_clock(&mut self, html: String) {
        self.clock = html;
    }

    fn scroll_transcript_to_end(&mut self) {
        self.scrolled_lines = self.lines.len();
    }

    fn hexdump_height_px(&self) -> u32 {
        self.hexdump_height_px
    }

    fn snapshot(&self) -> Option<String> {
        Some(self.render_document())
    }
}
