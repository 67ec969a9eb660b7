//! Escape markup to HTML.
//!
//! Module output carries a small escape grammar: link tags that wrap text
//! in anchors and color tags that wrap it in styled spans. Everything else
//! is literal text and is HTML-escaped, so the only structural HTML in the
//! output is what this parser emits itself.
//!
//! Unknown link ids and unknown color codes are dropped silently while the
//! text they wrap still renders.
//!
//! Elements are tracked on a stack, which keeps the output well formed:
//! - a color tag while a span is innermost replaces that span
//! - `ESC[0m` closes the innermost span and anything opened inside it
//! - `ESC[Lem` closes the innermost anchor and anything opened inside it
//! - closes with nothing to close are dropped
//! - whatever is still open at end of input is closed there

mod scanner;
mod tables;

pub use scanner::{Scanner, Token};
pub use tables::{ColorTable, LinkTable};

use std::fmt::Write;

/// An element the parser has opened and not yet closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Open {
    Span,
    Anchor,
}

impl Open {
    const fn close_tag(self) -> &'static str {
        match self {
            Self::Span => "</span>",
            Self::Anchor => "</a>",
        }
    }
}

/// Converts module output to safe HTML.
///
/// # Examples
///
/// ```
/// use kernel_host::markup::MarkupParser;
///
/// let parser = MarkupParser::default();
/// assert_eq!(
///     parser.parse("\u{1b}[31mred\u{1b}[0m <b>"),
///     r#"<span style="color: #ff5555">red</span> &lt;b&gt;"#
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkupParser {
    links: LinkTable,
    colors: ColorTable,
}

impl MarkupParser {
    /// Creates a parser with the given tables.
    #[must_use]
    pub const fn new(links: LinkTable, colors: ColorTable) -> Self {
        Self { links, colors }
    }

    /// Parses markup into an HTML fragment.
    #[must_use]
    pub fn parse(&self, raw: &str) -> String {
        let mut out = String::with_capacity(raw.len() + raw.len() / 4);
        let mut open: Vec<Open> = Vec::new();

        for token in Scanner::new(raw) {
            match token {
                Token::Text(text) => escape_into(&mut out, text),
                Token::LinkOpen(id) => match self.links.get(id) {
                    Some(href) => {
                        let _ = write!(
                            out,
                            r#"<a href="{}" target="_blank" class="terminal-link">"#,
                            escape_attr(href)
                        );
                        open.push(Open::Anchor);
                    }
                    None => tracing::trace!(id, "unknown link id dropped"),
                },
                Token::LinkClose => close_through(&mut out, &mut open, Open::Anchor),
                Token::Color("0") => close_through(&mut out, &mut open, Open::Span),
                Token::Color(code) => match self.colors.get(code) {
                    Some(color) => {
                        if open.last() == Some(&Open::Span) {
                            open.pop();
                            out.push_str(Open::Span.close_tag());
                        }
                        let _ = write!(out, r#"<span style="color: {}">"#, escape_attr(color));
                        open.push(Open::Span);
                    }
                    None => tracing::trace!(code, "unknown color code dropped"),
                },
            }
        }

        while let Some(element) = open.pop() {
            out.push_str(element.close_tag());
        }
        out
    }

    /// Parses markup for a transcript entry: like [`parse`](Self::parse),
    /// with each newline turned into a `<br>`.
    #[must_use]
    pub fn parse_lines(&self, raw: &str) -> String {
        self.parse(raw).replace('\n', "<br>")
    }
}

/// Closes the innermost `kind` element and everything opened inside it.
fn close_through(out: &mut String, open: &mut Vec<Open>, kind: Open) {
    if let Some(index) = open.iter().rposition(|&element| element == kind) {
        for element in open.drain(index..).rev() {
            out.push_str(element.close_tag());
        }
    }
}

/// Escapes `&`, `<` and `>` for use as HTML text.
///
/// # Examples
///
/// ```
/// use kernel_host::markup::escape_html;
///
/// assert_eq!(escape_html("a < b && c"), "a &lt; b &amp;&amp; c");
/// ```
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    escape_into(&mut out, text);
    out
}

fn escape_into(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

/// Escapes text for a double-quoted attribute value.
fn escape_attr(value: &str) -> String {
    escape_html(value).replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    const GH: &str = r#"<a href="https://github.com/billie-bytes" target="_blank" class="terminal-link">"#;

    fn parse(raw: &str) -> String {
        MarkupParser::default().parse(raw)
    }

    #[test_case("plain text", "plain text" ; "plain")]
    #[test_case("<script>alert(1)</script>", "&lt;script&gt;alert(1)&lt;/script&gt;" ; "injected tags")]
    #[test_case("fish & chips", "fish &amp; chips" ; "ampersand")]
    #[test_case("&lt;", "&amp;lt;" ; "pre-escaped entity")]
    #[test_case("say \"hi\"", "say \"hi\"" ; "quotes untouched")]
    #[test_case("\x1b[31mred\x1b[0m", r#"<span style="color: #ff5555">red</span>"# ; "color span")]
    #[test_case("\x1b[99mtext\x1b[0m", "text" ; "unknown color dropped")]
    #[test_case("\x1b[031mtext", "text" ; "leading zero is not the same code")]
    #[test_case("\x1b[0mtext", "text" ; "reset with nothing open")]
    #[test_case("\x1b[Lxxmlink\x1b[Lem", "link" ; "unknown link id dropped")]
    #[test_case("\x1b[Lemtext", "text" ; "link close with nothing open")]
    #[test_case("a\x1bb", "a\x1bb" ; "lone escape stays literal")]
    fn test_parse_cases(raw: &str, expected: &str) {
        assert_eq!(parse(raw), expected);
    }

    #[test]
    fn test_link_wraps_text() {
        assert_eq!(parse("\x1b[Lghmlink \x1b[Lem"), format!("{GH}link </a>"));
    }

    #[test]
    fn test_unknown_link_preserves_enclosed_text() {
        assert_eq!(parse("see \x1b[Lxxm<here>\x1b[Lem!"), "see &lt;here&gt;!");
    }

    #[test]
    fn test_color_switch_replaces_span() {
        assert_eq!(
            parse("\x1b[31ma\x1b[32mb\x1b[0m"),
            r#"<span style="color: #ff5555">a</span><span style="color: #50fa7b">b</span>"#
        );
    }

    #[test]
    fn test_colored_link() {
        assert_eq!(
            parse("\x1b[36m\x1b[Lghmgithub\x1b[Lem\x1b[0m"),
            format!(r#"<span style="color: #be94f9ff">{GH}github</a></span>"#)
        );
    }

    #[test]
    fn test_color_inside_link_nests() {
        assert_eq!(
            parse("\x1b[Lghm\x1b[31mx\x1b[0my\x1b[Lem"),
            format!(r#"{GH}<span style="color: #ff5555">x</span>y</a>"#)
        );
    }

    #[test]
    fn test_color_change_inside_link_inside_span_nests() {
        assert_eq!(
            parse("\x1b[31m\x1b[Lghm\x1b[32mx"),
            format!(
                r#"<span style="color: #ff5555">{GH}<span style="color: #50fa7b">x</span></a></span>"#
            )
        );
    }

    #[test]
    fn test_reset_closes_elements_opened_inside_span() {
        assert_eq!(
            parse("\x1b[31m\x1b[Lghmx\x1b[0my"),
            format!(r#"<span style="color: #ff5555">{GH}x</a></span>y"#)
        );
    }

    #[test]
    fn test_unclosed_elements_closed_at_end() {
        assert_eq!(
            parse("\x1b[Lghm\x1b[33mopen"),
            format!(r#"{GH}<span style="color: #f1fa8c">open</span></a>"#)
        );
    }

    #[test]
    fn test_escaping_happens_before_tag_substitution() {
        // A literal "<a" in module output can never become a real anchor.
        let html = parse("<a href=\"x\">\x1b[Lghmok\x1b[Lem");
        assert!(html.starts_with("&lt;a href=\"x\"&gt;"));
        assert_eq!(html.matches("<a ").count(), 1);
    }

    #[test]
    fn test_custom_tables_escape_attributes() {
        let parser = MarkupParser::new(
            LinkTable::from_pairs([("q", "https://x.test/?a=1&b=\"2\"")]),
            ColorTable::from_pairs([("1", "red\"><script>")]),
        );
        assert_eq!(
            parser.parse("\x1b[Lqm.\x1b[Lem"),
            r#"<a href="https://x.test/?a=1&amp;b=&quot;2&quot;" target="_blank" class="terminal-link">.</a>"#
        );
        assert_eq!(
            parser.parse("\x1b[1m."),
            r#"<span style="color: red&quot;&gt;&lt;script&gt;">.</span>"#
        );
    }

    #[test]
    fn test_parse_lines_converts_newlines() {
        let parser = MarkupParser::default();
        assert_eq!(parser.parse_lines("hello\nworld"), "hello<br>world");
        assert_eq!(
            parser.parse_lines("\x1b[32mok\x1b[0m\n"),
            r#"<span style="color: #50fa7b">ok</span><br>"#
        );
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html(""), "");
        assert_eq!(escape_html("<>&"), "&lt;&gt;&amp;");
    }
}
