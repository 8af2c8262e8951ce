use std::path::Path;

use log::{debug, info};

use super::codec::charset::{resolve_encoding, CharsetDetector, XmlDeclarationDetector};
use super::extractor::Extractor;
use super::index::XpathIndex;
use super::iter::{ElementIterator, SnippetIterator};
use super::scan::Indexer;
use super::source::{source_for_path, ByteSource};
use super::types::error::Result;
use super::types::models::{ByteBounds, IndexElement, XmlElement};
use super::types::options::AccessOptions;

/// An indexed XML document ready for random access.
///
/// Bundles the [`XpathIndex`] built from a source with an [`Extractor`] over
/// the same source.
#[derive(Debug)]
pub struct XpathAccess<S: ByteSource = Box<dyn ByteSource>> {
    index: XpathIndex,
    extractor: Extractor<S>,
}

impl XpathAccess<Box<dyn ByteSource>> {
    /// Opens and indexes the XML file at `path`.
    ///
    /// Files whose name ends in `.gz` are read through a gzip decoder; their
    /// offsets refer to the decompressed bytes.
    ///
    /// # Errors
    /// Returns an error if:
    /// - The file cannot be opened or read
    /// - A `.gz` file is not gzip compressed
    /// - The tag structure is inconsistent (see [`Indexer::build`])
    /// - The configured or declared encoding is unknown
    pub fn open(path: impl AsRef<Path>, options: AccessOptions) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening XML file: {}", path.display());
        Self::from_source(source_for_path(path)?, options)
    }
}

impl<S: ByteSource> XpathAccess<S> {
    /// Indexes `source`, detecting its encoding from the XML declaration.
    pub fn from_source(source: S, options: AccessOptions) -> Result<Self> {
        Self::with_detector(source, options, Box::new(XmlDeclarationDetector))
    }

    /// Indexes `source` using `detector` for charset detection.
    ///
    /// Priority for the text encoding (highest → lowest):
    /// 1. The detector's result, when `prefer_detected_encoding` is set
    /// 2. `character_encoding` from the options
    /// 3. The detector's result over the first `declaration_prefix_len` bytes
    /// 4. UTF-8
    pub fn with_detector(source: S, options: AccessOptions, detector: Box<dyn CharsetDetector>) -> Result<Self> {
        let index = Indexer::new(options.index).build(source.open()?)?;

        let settings = options.extractor;
        let mut extractor = Extractor::with_options(source, &settings)?.with_detector(detector);

        let configured = extractor.configured_encoding();
        if configured.is_none() || settings.prefer_detected_encoding {
            if let Some(label) = extractor.detect_source_encoding(settings.declaration_prefix_len)? {
                let detected = resolve_encoding(&label)?;
                match configured {
                    Some(configured) if configured != detected => info!(
                        "Text encoding overridden: configured='{}', detected='{}'",
                        configured.name(),
                        detected.name()
                    ),
                    _ => debug!("Using detected encoding {}", detected.name()),
                }
                extractor.set_encoding(&label)?;
            }
        }
        debug!("Extraction encoding: {}", extractor.encoding().name());

        Ok(Self { index, extractor })
    }

    /// Bundles an index built elsewhere with an extractor over the same bytes.
    pub fn from_parts(index: XpathIndex, extractor: Extractor<S>) -> Self {
        Self { index, extractor }
    }

    pub fn into_parts(self) -> (XpathIndex, Extractor<S>) {
        (self.index, self.extractor)
    }

    pub fn index(&self) -> &XpathIndex {
        &self.index
    }

    pub fn extractor(&self) -> &Extractor<S> {
        &self.extractor
    }

    pub fn source(&self) -> &S {
        self.extractor.source()
    }

    /// Occurrences of `xpath`; `None` if it was never recorded.
    pub fn element_count(&self, xpath: &str) -> Option<usize> {
        self.index.element_count(xpath)
    }

    /// Lazily decodes every element recorded for `xpath` inside `bounds`.
    ///
    /// An xpath missing from the index gives an empty iterator.
    pub fn snippet_iter(&self, xpath: &str, bounds: Option<ByteBounds>) -> SnippetIterator<'_, S> {
        SnippetIterator::new(&self.extractor, self.lookup(xpath), bounds)
    }

    pub fn element_iter(&self, xpath: &str, bounds: Option<ByteBounds>) -> ElementIterator<'_, S> {
        ElementIterator::new(&self.extractor, self.lookup(xpath), bounds)
    }

    /// Decodes every element recorded for `xpath` inside `bounds`.
    pub fn xml_snippets(&self, xpath: &str, bounds: Option<ByteBounds>) -> Result<Vec<String>> {
        self.snippet_iter(xpath, bounds).collect()
    }

    pub fn xml_elements(&self, xpath: &str, bounds: Option<ByteBounds>) -> Result<Vec<XmlElement>> {
        self.element_iter(xpath, bounds).collect()
    }

    /// Reads the start tag of `element`. See [`Extractor::read_start_tag`].
    pub fn start_tag(&self, element: &IndexElement) -> Result<Option<String>> {
        self.extractor.read_start_tag(element)
    }

    fn lookup(&self, xpath: &str) -> &[IndexElement] {
        if !self.index.contains_xpath(xpath) {
            info!("The index does not contain any entry for the requested xpath: {}", xpath);
        }
        self.index.elements(xpath)
    }
}
