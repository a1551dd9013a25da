//! Archive manifest parsing.
//!
//! Manifests are `Key: value` lines. A line starting with a single space
//! continues the previous value. The main section ends at the first blank
//! line; later (per-entry) sections are ignored. Attribute names compare
//! case-insensitively.

use std::collections::BTreeSet;

/// Main-section attributes of an archive manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    attributes: Vec<(String, String)>,
}

impl Manifest {
    /// Parses the main section of `text`.
    ///
    /// Lines without a `:` separator are skipped.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut attributes: Vec<(String, String)> = Vec::new();
        for line in text.lines() {
            let trimmed_end = line.trim_end_matches('\r');
            if trimmed_end.is_empty() {
                break;
            }
            if let Some(continuation) = trimmed_end.strip_prefix(' ') {
                if let Some((_, value)) = attributes.last_mut() {
                    value.push_str(continuation);
                }
                continue;
            }
            if let Some((name, value)) = trimmed_end.split_once(':') {
                attributes.push((name.trim().to_owned(), value.trim_start().to_owned()));
            }
        }
        Self { attributes }
    }

    /// Returns the value of `name`, matched case-insensitively.
    ///
    /// When the attribute repeats, the last occurrence wins.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .rev()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Splits the value of `name` as a comma-separated list.
    ///
    /// Missing attributes yield an empty set.
    #[must_use]
    pub fn list(&self, name: &str) -> BTreeSet<String> {
        self.attribute(name).map(split_list).unwrap_or_default()
    }
}

/// Splits a comma-separated value, trimming tokens and dropping empties.
#[must_use]
pub fn split_list(value: &str) -> BTreeSet<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}
