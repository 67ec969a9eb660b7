//! Append-only transcript with deferred scrolling.

use crate::render::{Surface, TerminalLine};

/// Transcript renderer.
///
/// Appending marks a scroll as pending instead of scrolling at once; the
/// scheduler flushes it at the start of its next turn, after every
/// mutation of the current turn has landed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Transcript {
    scroll_pending: bool,
}

impl Transcript {
    /// Creates a transcript renderer with nothing pending.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            scroll_pending: false,
        }
    }

    /// Appends a line and schedules a scroll.
    pub fn append<S: Surface + ?Sized>(&mut self, surface: &mut S, line: TerminalLine) {
        surface.append_line(line);
        self.scroll_pending = true;
    }

    /// Clears every line.
    pub fn clear<S: Surface + ?Sized>(&mut self, surface: &mut S) {
        surface.clear_transcript();
    }

    /// Returns whether a scroll is waiting for the next turn.
    #[must_use]
    pub const fn scroll_pending(&self) -> bool {
        self.scroll_pending
    }

    /// Performs the pending scroll, if any. Returns whether it scrolled.
    pub fn flush_scroll<S: Surface + ?Sized>(&mut self, surface: &mut S) -> bool {
        if std::mem::take(&mut self.scroll_pending) {
            surface.scroll_transcript_to_end();
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::HtmlPage;

    fn notice(text: &str) -> TerminalLine {
        TerminalLine::Notice {
            text: text.to_string(),
        }
    }

    #[test]
    fn test_scroll_is_deferred() {
        let mut page = HtmlPage::default();
        let mut transcript = Transcript::new();

        transcript.append(&mut page, notice("one"));
        assert_eq!(page.lines().len(), 1);
        assert_eq!(page.scrolled_lines(), 0);
        assert!(transcript.scroll_pending());

        assert!(transcript.flush_scroll(&mut page));
        assert_eq!(page.scrolled_lines(), 1);
        assert!(!transcript.flush_scroll(&mut page));
    }

    #[test]
    fn test_many_appends_one_scroll() {
        let mut page = HtmlPage::default();
        let mut transcript = Transcript::new();
        for i in 0..5 {
            transcript.append(&mut page, notice(&i.to_string()));
        }
        assert!(transcript.flush_scroll(&mut page));
        assert_eq!(page.scrolled_lines(), 5);
    }

    #[test]
    fn test_clear_removes_lines() {
        let mut page = HtmlPage::default();
        let mut transcript = Transcript::new();
        transcript.append(&mut page, notice("gone"));
        transcript.clear(&mut page);
        assert!(page.lines().is_empty());
    }
}
