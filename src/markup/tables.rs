//! Lookup tables for link ids and color codes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Maps link ids (`ESC[L<id>m`) to hrefs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkTable(BTreeMap<String, String>);

impl Default for LinkTable {
    fn default() -> Self {
        Self::from_pairs([
            ("gh", "https://github.com/billie-bytes"),
            (
                "ln",
                "https://github.com/billie-linkedin.com/in/billie-bhaskara-wibawa-288a81345",
            ),
            ("ml", "mailto:billiebaskarawibawa101@gmail.com"),
        ])
    }
}

impl LinkTable {
    /// Builds a table from `(id, href)` pairs.
    #[must_use]
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self(
            pairs
                .into_iter()
                .map(|(id, href)| (id.to_string(), href.to_string()))
                .collect(),
        )
    }

    /// Returns the href for `id`.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&str> {
        self.0.get(id).map(String::as_str)
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Maps numeric color codes (`ESC[<code>m`) to CSS colors.
///
/// Code `0` is the reset and is never looked up here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColorTable(BTreeMap<String, String>);

impl Default for ColorTable {
    fn default() -> Self {
        Self::from_pairs([
            ("31", "#ff5555"),
            ("32", "#50fa7b"),
            ("33", "#f1fa8c"),
            ("34", "#97b1f1"),
            ("35", "#ffffffff"),
            ("36", "#be94f9ff"),
            ("90", "#6272a4"),
        ])
    }
}

impl ColorTable {
    /// Builds a table from `(code, color)` pairs.
    #[must_use]
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self(
            pairs
                .into_iter()
                .map(|(code, color)| (code.to_string(), color.to_string()))
                .collect(),
        )
    }

    /// Returns the color for `code`. Codes match exactly, so `031` is not `31`.
    #[must_use]
    pub fn get(&self, code: &str) -> Option<&str> {
        self.0.get(code).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_link_table() {
        let links = LinkTable::default();
        assert_eq!(links.len(), 3);
        assert_eq!(links.get("gh"), Some("https://github.com/billie-bytes"));
        assert!(links.get("ml").is_some_and(|h| h.starts_with("mailto:")));
        assert_eq!(links.get("xx"), None);
    }

    #[test]
    fn test_default_color_table() {
        let colors = ColorTable::default();
        assert_eq!(colors.get("31"), Some("#ff5555"));
        assert_eq!(colors.get("90"), Some("#6272a4"));
        assert_eq!(colors.get("031"), None);
        assert_eq!(colors.get("0"), None);
    }

    #[test]
    fn test_tables_deserialize_from_json_objects() {
        let links: LinkTable = serde_json::from_str(r#"{"docs": "https://docs.rs"}"#).unwrap();
        assert_eq!(links.get("docs"), Some("https://docs.rs"));

        let colors: ColorTable = serde_json::from_str(r#"{"91": "red"}"#).unwrap();
        assert_eq!(colors.get("91"), Some("red"));
    }
}
