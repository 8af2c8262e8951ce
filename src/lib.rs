//! # xxindex
//!
//! Random access to elements of large XML files.
//!
//! One streaming pass records, for every absolute tag path ("xpath"), the byte
//! range and starting line of each element. Elements are later read back by
//! seeking straight to their range and decoding only that slice. Plain and
//! gzip-compressed files are supported.
pub mod xxindex;

// Re-export the main types for convenience
pub use xxindex::{
    build_index,
    codec::charset::{BomDetector, CharsetDetector, XmlDeclarationDetector},
    iter::{ElementIterator, SnippetIterator},
    source::{source_for_path, ByteSource, FileSource, GzFileSource, MemorySource},
    strip_filler,
    types::{
        models::{ByteBounds, IndexElement, XmlElement},
        options::{AccessOptions, ExtractorOptions, IndexOptions},
    },
    Extractor, Indexer, Result, XpathAccess, XpathIndex, XxIndexError,
};
