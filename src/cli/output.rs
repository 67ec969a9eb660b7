//! Output formatting for CLI commands.
//!
//! Supports text and JSON output formats. While a kernel runs, transcript
//! lines stream to stdout as they are appended: plain text with markup
//! stripped, or one JSON object per line.

use crate::error::Error;
use crate::render::{HtmlPage, Surface, TerminalLine};
use serde::Serialize;
use std::io::Write;

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// JSON output.
    Json,
}

impl OutputFormat {
    /// Parses format from string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Rendered markup, as returned by the `markup` command.
#[derive(Debug, Serialize)]
struct RenderedMarkup<'a> {
    html: &'a str,
    plain: &'a str,
}

/// Formats the result of rendering markup.
#[must_use]
pub fn format_markup(html: &str, plain: &str, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format!("{html}\n"),
        OutputFormat::Json => format!("{}\n", format_json(&RenderedMarkup { html, plain })),
    }
}

/// Formats an error for display.
#[must_use]
pub fn format_error(error: &Error, format: OutputFormat) -> String {
    #[derive(Serialize)]
    struct ErrorOutput {
        error: String,
    }

    match format {
        OutputFormat::Text => error.to_string(),
        OutputFormat::Json => format_json(&ErrorOutput {
            error: error.to_string(),
        }),
    }
}

fn format_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
}

/// Clears the screen and homes the cursor.
const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// A [`Surface`] that streams transcript changes to a writer.
///
/// Every region is also kept in an [`HtmlPage`], which backs snapshots.
pub struct StreamSurface<W: Write> {
    page: HtmlPage,
    out: W,
    format: OutputFormat,
    clear_screen: bool,
}

impl<W: Write> std::fmt::Debug for StreamSurface<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamSurface")
            .field("page", &self.page)
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}

impl<W: Write> StreamSurface<W> {
    /// Creates a streaming surface.
    ///
    /// # Arguments
    ///
    /// * `page` - Page holding every region.
    /// * `out` - Destination for transcript changes.
    /// * `format` - Text or JSON lines.
    /// * `clear_screen` - Whether a transcript clear in text mode clears
    ///   the terminal. Only sensible when `out` is a terminal.
    #[must_use]
    pub const fn new(page: HtmlPage, out: W, format: OutputFormat, clear_screen: bool) -> Self {
        Self {
            page,
            out,
            format,
            clear_screen,
        }
    }

    /// Consumes the surface, returning the page and writer.
    pub fn into_parts(self) -> (HtmlPage, W) {
        (self.page, self.out)
    }

    fn emit(&mut self, text: &str) {
        let result = self
            .out
            .write_all(text.as_bytes())
            .and_then(|()| self.out.flush());
        if let Err(e) = result {
            tracing::warn!(error = %e, "failed to write transcript output");
        }
    }
}

impl<W: Write> Surface for StreamSurface<W> {
    fn append_line(&mut self, line: TerminalLine) {
        let text = match self.format {
            OutputFormat::Text => format!("{}\n", line.to_plain()),
            OutputFormat::Json => format!("{}\n", format_json(&line)),
        };
        self.emit(&text);
        self.page.append_line(line);
    }

    fn clear_transcript(&mut self) {
        match self.format {
            OutputFormat::Text if self.clear_screen => self.emit(CLEAR_SCREEN),
            OutputFormat::Text => {}
            OutputFormat::Json => self.emit("{\"kind\":\"clear\"}\n"),
        }
        self.page.clear_transcript();
    }

    fn set_prompt(&mut self, html: String) {
        self.page.set_prompt(html);
    }

    fn set_frame(&mut self, html: String) {
        self.page.set_frame(html);
    }

    fn set_hexdump(&mut self, html: String) {
        self.page.set_hexdump(html);
    }

    fn set_clock(&mut self, html: String) {
        self.page.set_clock(html);
    }

    fn scroll_transcript_to_end(&mut self) {
        self.page.scroll_transcript_to_end();
    }

    fn hexdump_height_px(&self) -> u32 {
        self.page.hexdump_height_px()
    }

    fn snapshot(&self) -> Option<String> {
        self.page.snapshot()
    }
}
