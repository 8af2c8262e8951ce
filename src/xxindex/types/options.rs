//! Configuration for index builds, extraction and the access facade.

use std::collections::HashSet;

/// Default number of leading bytes inspected for an XML declaration.
pub const DEFAULT_DECLARATION_PREFIX_LEN: usize = 1000;

/// Options controlling a single index build.
#[derive(Debug, Clone)]
pub struct IndexOptions {
    /// Xpaths to keep. `None` keeps every xpath seen.
    pub inclusion_set: Option<HashSet<String>>,
    /// Store the starting line of each element. Disabling saves memory.
    pub record_line_numbers: bool,
    /// Drop everything up to the last `:` of a tag name (`ns:tag` -> `tag`).
    pub strip_namespace_prefix: bool,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            inclusion_set: None,
            record_line_numbers: true,
            strip_namespace_prefix: true,
        }
    }
}

impl IndexOptions {
    pub fn with_inclusion_set<I, P>(mut self, xpaths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        self.inclusion_set = Some(xpaths.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_line_numbers(mut self, record: bool) -> Self {
        self.record_line_numbers = record;
        self
    }

    pub fn with_namespace_prefix_stripping(mut self, strip: bool) -> Self {
        self.strip_namespace_prefix = strip;
        self
    }
}

/// Options controlling how extracted bytes are turned into text.
#[derive(Debug, Clone)]
pub struct ExtractorOptions {
    /// Explicit charset label. `None` defers to detection, then UTF-8.
    pub character_encoding: Option<String>,
    /// Ask the charset detector first, before the configured encoding.
    pub prefer_detected_encoding: bool,
    /// Run the detector on every decode and warn when it disagrees with the
    /// configured encoding. Has no effect with `prefer_detected_encoding`.
    pub check_detected_encoding: bool,
    /// How many leading bytes of the source are searched for an XML declaration.
    pub declaration_prefix_len: usize,
}

impl Default for ExtractorOptions {
    fn default() -> Self {
        Self {
            character_encoding: None,
            prefer_detected_encoding: false,
            check_detected_encoding: false,
            declaration_prefix_len: DEFAULT_DECLARATION_PREFIX_LEN,
        }
    }
}

impl ExtractorOptions {
    pub fn with_encoding(mut self, label: impl Into<String>) -> Self {
        self.character_encoding = Some(label.into());
        self
    }

    pub fn with_prefer_detected(mut self, prefer: bool) -> Self {
        self.prefer_detected_encoding = prefer;
        self
    }

    pub fn with_check_detected(mut self, check: bool) -> Self {
        self.check_detected_encoding = check;
        self
    }

    pub fn with_declaration_prefix_len(mut self, len: usize) -> Self {
        self.declaration_prefix_len = len;
        self
    }
}

/// Combined options for [`XpathAccess`](crate::XpathAccess).
#[derive(Debug, Clone, Default)]
pub struct AccessOptions {
    pub index: IndexOptions,
    pub extractor: ExtractorOptions,
}

impl AccessOptions {
    pub fn new(index: IndexOptions, extractor: ExtractorOptions) -> Self {
        Self { index, extractor }
    }
}
