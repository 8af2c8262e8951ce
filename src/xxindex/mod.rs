//! Core xpath indexing and extraction module.

pub mod access;
pub mod codec;
pub mod extractor;
pub mod index;
pub mod iter;
pub mod scan;
pub mod source;
pub mod types;

pub use access::XpathAccess;
pub use extractor::{strip_filler, Extractor};
pub use index::{normalize_xpath, XpathIndex};
pub use scan::{build_index, Indexer};
pub use types::error::{Result, XxIndexError};
