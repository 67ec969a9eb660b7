//! Live memory dump renderer.
//!
//! Shows 16 bytes per row starting at a module-chosen base, as many rows
//! as fit the panel. Rows are cut short at the end of linear memory and
//! never padded; a row whose first byte lies past the end is not emitted.

use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Bytes shown per row.
pub const BYTES_PER_ROW: usize = 16;

/// Pixel geometry of the dump panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HexGeometry {
    /// Panel height used when the surface reports none.
    pub height_px: u32,
    /// Height taken by the header line.
    pub header_px: u32,
    /// Height of one row.
    pub row_px: u32,
}

impl Default for HexGeometry {
    fn default() -> Self {
        Self {
            height_px: 400,
            header_px: 30,
            row_px: 12,
        }
    }
}

impl HexGeometry {
    /// Number of rows that fit a panel of `height_px`, never less than one.
    ///
    /// # Examples
    ///
    /// ```
    /// use kernel_host::render::HexGeometry;
    ///
    /// let geometry = HexGeometry::default();
    /// assert_eq!(geometry.rows_for_height(400), 30);
    /// assert_eq!(geometry.rows_for_height(10), 1);
    /// ```
    #[must_use]
    pub fn rows_for_height(&self, height_px: u32) -> usize {
        let rows = height_px.saturating_sub(self.header_px) / self.row_px.max(1);
        usize::try_from(rows).unwrap_or(usize::MAX).max(1)
    }
}

const fn byte_color(byte: u8) -> &'static str {
    match byte {
        0 => "#333",
        33..=126 => "#fff",
        _ => "#97b1f1",
    }
}

/// Renders `rows` rows of `memory` starting at `base`.
///
/// Never indexes at or past `memory.len()`, whatever `base` and `rows` are.
#[must_use]
pub fn render_hexdump(memory: &[u8], base: usize, rows: usize) -> String {
    let mut html = String::from(
        r#"<div class="hex-grid" style="font-family: monospace; font-size: 10px; line-height: 1.15;">"#,
    );
    html.push_str(
        r#"<div style="color: #888; margin-bottom: 5px; font-weight:bold;">LIVE MEMORY DUMP</div>"#,
    );

    for row in 0..rows {
        let Some(start) = row
            .checked_mul(BYTES_PER_ROW)
            .and_then(|offset| base.checked_add(offset))
            .filter(|&start| start < memory.len())
        else {
            break;
        };
        let end = start.saturating_add(BYTES_PER_ROW).min(memory.len());
        let bytes = &memory[start..end];

        let _ = write!(html, r#"<span style="color: #555">0x{start:04X}: </span>"#);

        html.push_str(r#"<span style="margin-right: 10px">"#);
        for &byte in bytes {
            let _ = write!(
                html,
                r#"<span style="color: {}">{byte:02X}</span> "#,
                byte_color(byte)
            );
        }
        html.push_str("</span>");

        html.push_str(
            r#"<span style="color: #aaa; border-left: 1px solid #444; padding-left: 5px;">"#,
        );
        for &byte in bytes {
            match byte {
                b'&' => html.push_str("&amp;"),
                b'<' => html.push_str("&lt;"),
                b'>' => html.push_str("&gt;"),
                32..=126 => html.push(char::from(byte)),
                _ => html.push('.'),
            }
        }
        html.push_str("</span><br>");
    }

    html.push_str("</div>");
    html
}
