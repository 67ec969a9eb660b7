//! Panel renderers and the page they draw on.
//!
//! The page has five regions: the transcript, the prompt, the status
//! frame, the live memory dump and the clock. Renderers never touch a
//! region directly; they go through a [`Surface`], so the same render loop
//! can drive an in-memory [`HtmlPage`], a streaming terminal front end, or
//! anything else that can hold HTML fragments.

pub mod clock;
pub mod frame;
pub mod hexdump;
pub mod page;
pub mod transcript;

pub use clock::{format_uptime, render_clock};
pub use hexdump::{HexGeometry, render_hexdump};
pub use page::HtmlPage;
pub use transcript::Transcript;

use crate::markup::{Scanner, Token, escape_html};
use serde::Serialize;

/// Region mutations a renderer may perform.
///
/// Every setter replaces the region's whole content; only the transcript
/// accumulates.
pub trait Surface {
    /// Appends one line to the transcript.
    fn append_line(&mut self, line: TerminalLine);

    /// Removes every transcript line.
    fn clear_transcript(&mut self);

    /// Replaces the prompt.
    fn set_prompt(&mut self, html: String);

    /// Replaces the status frame.
    fn set_frame(&mut self, html: String);

    /// Replaces the memory dump.
    fn set_hexdump(&mut self, html: String);

    /// Replaces the clock.
    fn set_clock(&mut self, html: String);

    /// Scrolls the transcript so its last line is visible.
    fn scroll_transcript_to_end(&mut self);

    /// Current pixel height of the memory dump panel.
    fn hexdump_height_px(&self) -> u32;

    /// Returns a standalone document of the whole page, if the surface can
    /// produce one.
    fn snapshot(&self) -> Option<String> {
        None
    }
}

/// One transcript entry. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TerminalLine {
    /// A command echoed after the prompt it was entered at.
    Command {
        /// Prompt identity, e.g. `user@host`.
        identity: String,
        /// Working directory at the time of entry.
        path: String,
        /// The trimmed command text.
        text: String,
    },
    /// Module output.
    Output {
        /// Raw markup as read from the output slot.
        raw: String,
        /// Parsed HTML with line breaks.
        html: String,
    },
    /// A host message rendered as plain text.
    Notice {
        /// Message text.
        text: String,
    },
}

impl TerminalLine {
    /// Renders the line as an HTML fragment.
    #[must_use]
    pub fn to_html(&self) -> String {
        match self {
            Self::Command {
                identity,
                path,
                text,
            } => format!(
                r#"<span class="prompt">{}:<span style="color: #be94f9ff">{}</span>$</span> <span style="color: #ffffffff">{}</span>"#,
                escape_html(identity),
                escape_html(path),
                escape_html(text)
            ),
            Self::Output { html, .. } => html.clone(),
            Self::Notice { text } => escape_html(text),
        }
    }

    /// Renders the line as plain text with all markup removed.
    #[must_use]
    pub fn to_plain(&self) -> String {
        match self {
            Self::Command {
                identity,
                path,
                text,
            } => format!("{identity}:{path}$ {text}"),
            Self::Output { raw, .. } => strip_markup(raw),
            Self::Notice { text } => text.clone(),
        }
    }
}

/// Renders the prompt for `path`.
///
/// # Examples
///
/// ```
/// use kernel_host::render::render_prompt;
///
/// assert_eq!(
///     render_prompt("me@box", "/home"),
///     r#"me@box:<span style="color: #bd93f9">/home</span>$"#
/// );
/// ```
#[must_use]
pub fn render_prompt(identity: &str, path: &str) -> String {
    format!(
        r#"{}:<span style="color: #bd93f9">{}</span>$"#,
        escape_html(identity),
        escape_html(path)
    )
}

/// Drops every link and color tag, keeping only the text.
#[must_use]
pub fn strip_markup(raw: &str) -> String {
    Scanner::new(raw)
        .filter_map(|token| match token {
            Token::Text(text) => Some(text),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line_escapes_text() {
        let line = TerminalLine::Command {
            identity: "me@box".to_string(),
            path: "/".to_string(),
            text: "echo <b>".to_string(),
        };
        let html = line.to_html();
        assert!(html.starts_with(r#"<span class="prompt">me@box:"#));
        assert!(html.ends_with(r#"<span style="color: #ffffffff">echo &lt;b&gt;</span>"#));
        assert_eq!(line.to_plain(), "me@box:/$ echo <b>");
    }

    #[test]
    fn test_notice_is_plain_text() {
        let line = TerminalLine::Notice {
            text: "a < b".to_string(),
        };
        assert_eq!(line.to_html(), "a &lt; b");
    }

    #[test]
    fn test_output_plain_strips_markup() {
        let line = TerminalLine::Output {
            raw: "\x1b[32mok\x1b[0m \x1b[Lghmgh\x1b[Lem".to_string(),
            html: String::new(),
        };
        assert_eq!(line.to_plain(), "ok gh");
    }

    #[test]
    fn test_line_serializes_with_kind_tag() {
        let line = TerminalLine::Notice {
            text: "hi".to_string(),
        };
        let json = serde_json::to_string(&line).unwrap();
        assert_eq!(json, r#"{"kind":"notice","text":"hi"}"#);
    }

    #[test]
    fn test_prompt_escapes_path() {
        assert_eq!(
            render_prompt("u@h", "/a<b"),
            r#"u@h:<span style="color: #bd93f9">/a&lt;b</span>$"#
        );
    }
}
