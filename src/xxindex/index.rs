//! The xpath index: normalized xpath -> byte ranges in document order.

use std::collections::{HashMap, HashSet};
use std::fmt;

use super::types::models::IndexElement;

/// Strips one trailing `/` from an xpath, the only normalization keys receive.
pub fn normalize_xpath(xpath: &str) -> &str {
    xpath.strip_suffix('/').unwrap_or(xpath)
}

/// Mapping from absolute xpath to every recorded occurrence of it.
///
/// Built once by [`Indexer`](crate::Indexer) and read-only afterwards; it can be
/// shared across threads for concurrent lookups.
#[derive(Debug, Clone, Default)]
pub struct XpathIndex {
    entries: HashMap<String, Vec<IndexElement>>,
    /// Keys in the order they were first recorded.
    order: Vec<String>,
    inclusion_set: Option<HashSet<String>>,
    record_line_numbers: bool,
    checksum: String,
}

impl XpathIndex {
    /// Creates an empty index.
    ///
    /// With an inclusion set, only the listed xpaths are ever stored. Entries
    /// are normalized here, so a caller may list `/a/b/` or `/a/b`.
    pub fn new(inclusion_set: Option<HashSet<String>>) -> Self {
        let inclusion_set = inclusion_set.map(|set| {
            set.into_iter()
                .map(|xpath| normalize_xpath(&xpath).to_owned())
                .collect()
        });
        Self {
            entries: HashMap::new(),
            order: Vec::new(),
            inclusion_set,
            record_line_numbers: true,
            checksum: String::new(),
        }
    }

    /// Appends one occurrence of `xpath`.
    ///
    /// Silently ignored when an inclusion set is configured and does not list
    /// the xpath. The line is dropped when line recording is disabled.
    pub fn put(&mut self, xpath: &str, start: u64, stop: u64, line: Option<u64>) {
        let xpath = normalize_xpath(xpath);
        if !self.includes(xpath) {
            return;
        }
        let line = if self.record_line_numbers { line } else { None };
        let element = IndexElement::new(start, stop, line);

        match self.entries.get_mut(xpath) {
            Some(list) => list.push(element),
            None => {
                self.order.push(xpath.to_owned());
                self.entries.insert(xpath.to_owned(), vec![element]);
            }
        }
    }

    /// Returns `true` if the inclusion set (if any) admits `xpath`.
    pub fn includes(&self, xpath: &str) -> bool {
        let xpath = normalize_xpath(xpath);
        self.inclusion_set
            .as_ref()
            .map_or(true, |set| set.contains(xpath))
    }

    /// All occurrences of `xpath` in document order; empty if never seen.
    pub fn elements(&self, xpath: &str) -> &[IndexElement] {
        self.entries
            .get(normalize_xpath(xpath))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of occurrences of `xpath`, or `None` if it was never recorded.
    pub fn element_count(&self, xpath: &str) -> Option<usize> {
        self.entries.get(normalize_xpath(xpath)).map(Vec::len)
    }

    pub fn contains_xpath(&self, xpath: &str) -> bool {
        self.entries
            .get(normalize_xpath(xpath))
            .is_some_and(|list| !list.is_empty())
    }

    /// Recorded xpaths, in the order they were first recorded.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Number of distinct xpaths.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Number of occurrences across all xpaths.
    pub fn total_elements(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Hex digest of every byte the index was built from.
    pub fn checksum(&self) -> &str {
        &self.checksum
    }

    pub fn records_line_numbers(&self) -> bool {
        self.record_line_numbers
    }

    pub fn inclusion_set(&self) -> Option<&HashSet<String>> {
        self.inclusion_set.as_ref()
    }

    pub(crate) fn set_record_line_numbers(&mut self, record: bool) {
        self.record_line_numbers = record;
    }

    pub(crate) fn set_checksum(&mut self, checksum: String) {
        self.checksum = checksum;
    }

    /// Full listing: every xpath followed by each of its ranges.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for key in self.keys() {
            out.push_str("xPath: ");
            out.push_str(key);
            out.push('\n');
            for element in self.elements(key) {
                out.push_str(&format!("\tLocation : {}-{}", element.start, element.stop));
                if let Some(line) = element.line {
                    out.push_str(&format!(" in line: {}", line));
                }
                out.push('\n');
            }
        }
        out
    }
}

impl fmt::Display for XpathIndex {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for key in self.keys() {
            writeln!(f, "xPath: {} entries: {}", key, self.elements(key).len())?;
        }
        Ok(())
    }
}
