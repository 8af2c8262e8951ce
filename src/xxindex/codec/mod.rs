//! Codec layer: charset handling and decompression.
//!
//! # Submodules
//!
//! - [`charset`][]: charset detection and label resolution
//! - [`compression`][]: gzip support for compressed sources

pub mod charset;
pub mod compression;
