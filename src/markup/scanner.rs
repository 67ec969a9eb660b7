//! Single-pass tokenizer for the escape markup.
//!
//! Two tag families share the `ESC [` introducer:
//!
//! ```text
//! ESC [ L e m        close link
//! ESC [ L <id> m     open link, id = one or more chars up to the first 'm'
//! ESC [ <digits> m   color code
//! ```
//!
//! A link id never spans ESC, CR or LF. Anything that starts like a tag but
//! does not complete one is literal text, ESC included.

const ESC: u8 = 0x1b;

/// One unit of parsed markup. Borrowed from the input, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// A run of literal text.
    Text(&'a str),
    /// `ESC[L<id>m`
    LinkOpen(&'a str),
    /// `ESC[Lem`
    LinkClose,
    /// `ESC[<digits>m`
    Color(&'a str),
}

/// Iterator over the tokens of a markup string.
///
/// # Examples
///
/// ```
/// use kernel_host::markup::{Scanner, Token};
///
/// let tokens: Vec<_> = Scanner::new("a\u{1b}[31mb").collect();
/// assert_eq!(tokens, vec![Token::Text("a"), Token::Color("31"), Token::Text("b")]);
/// ```
#[derive(Debug, Clone)]
pub struct Scanner<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    /// Creates a scanner over `input`.
    #[must_use]
    pub const fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    /// Tries to read a tag at `start`, which holds an ESC byte.
    /// Returns the token and the offset just past it.
    fn tag_at(&self, start: usize) -> Option<(Token<'a>, usize)> {
        let bytes = self.input.as_bytes();
        if bytes.get(start + 1) != Some(&b'[') {
            return None;
        }
        let body = start + 2;

        if bytes.get(body) == Some(&b'L') {
            let id_start = body + 1;
            if bytes.get(id_start..id_start + 2) == Some(&b"em"[..]) {
                return Some((Token::LinkClose, id_start + 2));
            }
            // At least one id byte, then the first 'm' after it.
            let first = *bytes.get(id_start)?;
            if matches!(first, ESC | b'\n' | b'\r') {
                return None;
            }
            let rest = &bytes[id_start + 1..];
            let stop = rest
                .iter()
                .position(|&b| matches!(b, b'm' | ESC | b'\n' | b'\r'))?;
            let end = id_start + 1 + stop;
            if bytes[end] != b'm' {
                return None;
            }
            return Some((Token::LinkOpen(&self.input[id_start..end]), end + 1));
        }

        let digits = bytes[body..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count();
        let end = body + digits;
        if digits > 0 && bytes.get(end) == Some(&b'm') {
            return Some((Token::Color(&self.input[body..end]), end + 1));
        }
        None
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let bytes = self.input.as_bytes();
        if self.pos >= bytes.len() {
            return None;
        }

        if bytes[self.pos] == ESC {
            if let Some((token, next)) = self.tag_at(self.pos) {
                self.pos = next;
                return Some(token);
            }
            // Lone ESC: literal, then resume scanning after it.
            let start = self.pos;
            self.pos += 1;
            return Some(Token::Text(&self.input[start..self.pos]));
        }

        let start = self.pos;
        let run = bytes[start..]
            .iter()
            .position(|&b| b == ESC)
            .unwrap_or(bytes.len() - start);
        self.pos = start + run;
        Some(Token::Text(&self.input[start..self.pos]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(input: &str) -> Vec<Token<'_>> {
        Scanner::new(input).collect()
    }

    #[test]
    fn test_plain_text_is_one_token() {
        assert_eq!(scan("hello world"), vec![Token::Text("hello world")]);
        assert!(scan("").is_empty());
    }

    #[test]
    fn test_link_open_and_close() {
        assert_eq!(
            scan("\x1b[Lghmsite\x1b[Lem"),
            vec![Token::LinkOpen("gh"), Token::Text("site"), Token::LinkClose]
        );
    }

    #[test]
    fn test_link_id_stops_at_first_m() {
        assert_eq!(scan("\x1b[Lmmx"), vec![Token::LinkOpen("m"), Token::Text("x")]);
        assert_eq!(
            scan("\x1b[Lhomem"),
            vec![Token::LinkOpen("ho"), Token::Text("em")]
        );
    }

    #[test]
    fn test_link_id_cannot_swallow_next_tag() {
        assert_eq!(
            scan("\x1b[Lxx \x1b[Lem"),
            vec![Token::Text("\x1b"), Token::Text("[Lxx "), Token::LinkClose]
        );
    }

    #[test]
    fn test_link_id_cannot_span_lines() {
        assert_eq!(
            scan("\x1b[Lab\ncdm"),
            vec![Token::Text("\x1b"), Token::Text("[Lab\ncdm")]
        );
    }

    #[test]
    fn test_color_codes() {
        assert_eq!(
            scan("\x1b[31mred\x1b[0m"),
            vec![Token::Color("31"), Token::Text("red"), Token::Color("0")]
        );
    }

    #[test]
    fn test_incomplete_tags_are_literal() {
        assert_eq!(scan("\x1b[31"), vec![Token::Text("\x1b"), Token::Text("[31")]);
        assert_eq!(scan("\x1b[m"), vec![Token::Text("\x1b"), Token::Text("[m")]);
        assert_eq!(scan("\x1b["), vec![Token::Text("\x1b"), Token::Text("[")]);
        assert_eq!(scan("\x1b"), vec![Token::Text("\x1b")]);
        assert_eq!(scan("\x1b[L"), vec![Token::Text("\x1b"), Token::Text("[L")]);
    }

    #[test]
    fn test_multibyte_text_around_tags() {
        assert_eq!(
            scan("世\x1b[32m界"),
            vec![Token::Text("世"), Token::Color("32"), Token::Text("界")]
        );
    }
}
