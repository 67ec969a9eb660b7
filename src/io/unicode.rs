//! Unicode helpers for fitting text into fixed-size byte slots.
//!
//! Strings handed to the module are measured in bytes, since that is what
//! the slot holds, but must never be cut inside a code point, and the
//! host-supplied ones (locale names) should not be cut inside a grapheme.

use unicode_segmentation::UnicodeSegmentation;

/// Finds a valid UTF-8 character boundary at or before the given position.
///
/// # Examples
///
/// ```
/// use kernel_host::io::find_char_boundary;
///
/// let s = "Hello 世界";
/// assert_eq!(find_char_boundary(s, 6), 6); // Before '世'
/// assert_eq!(find_char_boundary(s, 7), 6); // Middle of '世', backs up
/// ```
#[must_use]
pub const fn find_char_boundary(s: &str, pos: usize) -> usize {
    if pos >= s.len() {
        return s.len();
    }
    let bytes = s.as_bytes();
    let mut boundary = pos;
    // UTF-8 continuation bytes start with 10xxxxxx (0x80-0xBF)
    while boundary > 0 && (bytes[boundary] & 0xC0) == 0x80 {
        boundary -= 1;
    }
    boundary
}

/// Truncates a string to at most `max_bytes` bytes on a grapheme boundary.
///
/// # Examples
///
/// ```
/// use kernel_host::io::truncate_to_bytes;
///
/// assert_eq!(truncate_to_bytes("en-US", 31), "en-US");
/// assert_eq!(truncate_to_bytes("e\u{301}x", 2), ""); // 'é' is 3 bytes
/// ```
#[must_use]
pub fn truncate_to_bytes(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = 0;
    for grapheme in s.graphemes(true) {
        if end + grapheme.len() > max_bytes {
            break;
        }
        end += grapheme.len();
    }
    &s[..end]
}
