//! # Single-pass XML indexing
//!
//! Reads a byte stream once and records, for every absolute tag path, the byte
//! range and starting line of each element. No tree is built and nothing is
//! validated beyond matching closing tags against the open ones.
//!
//! - [`tag`]: tag-name extraction and the open-element stack
//! - [`special`]: comment / CDATA / doctype / processing-instruction skipping
//! - `machine`: the byte-level state machine tying them together
//!
//! A digest of every raw byte is computed along the way and stored as the
//! index checksum.

use std::io::{ErrorKind, Read};

use log::{debug, info};
use md5::{Digest, Md5};

use super::index::XpathIndex;
use super::types::error::Result;
use super::types::options::IndexOptions;

mod machine;
mod special;
mod tag;

use machine::ScanState;

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Builds [`XpathIndex`]es from byte streams.
#[derive(Debug, Clone, Default)]
pub struct Indexer {
    options: IndexOptions,
}

impl Indexer {
    pub fn new(options: IndexOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &IndexOptions {
        &self.options
    }

    /// Indexes everything `reader` yields.
    ///
    /// # Errors
    /// - `Io` if reading fails
    /// - `TagMismatch`, `UnexpectedClosingTag` or `EmptyTagName` if the tag
    ///   structure is inconsistent; no partial index is returned in that case
    pub fn build<R: Read>(&self, mut reader: R) -> Result<XpathIndex> {
        debug!(
            "Indexing {} line numbers, namespace prefixes {}",
            if self.options.record_line_numbers { "with" } else { "without" },
            if self.options.strip_namespace_prefix { "stripped" } else { "kept" },
        );

        let mut index = XpathIndex::new(self.options.inclusion_set.clone());
        index.set_record_line_numbers(self.options.record_line_numbers);

        let mut state = ScanState::new(self.options.strip_namespace_prefix);
        let mut hasher = Md5::new();
        let mut buffer = vec![0u8; READ_BUFFER_SIZE];

        loop {
            let read = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            let chunk = &buffer[..read];
            hasher.update(chunk);
            state.feed(chunk, &mut index)?;
        }
        state.finish();

        index.set_checksum(hex::encode(hasher.finalize()));
        info!(
            "Indexed {} bytes ({} lines): {} xpaths, {} elements, checksum {}",
            state.position(),
            state.line(),
            index.len(),
            index.total_elements(),
            index.checksum()
        );
        Ok(index)
    }
}

/// Shortcut for `Indexer::new(options.clone()).build(reader)`.
pub fn build_index<R: Read>(reader: R, options: &IndexOptions) -> Result<XpathIndex> {
    Indexer::new(options.clone()).build(reader)
}
