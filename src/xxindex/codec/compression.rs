//! Gzip handling for compressed XML sources.
//!
//! Compressed files are indexed and extracted on their *decompressed* byte
//! offsets. A gzip stream cannot seek, so positioning always decompresses
//! from the start of the file.

use std::io::{ErrorKind, Read};

use flate2::read::MultiGzDecoder;
use log::trace;

use crate::xxindex::types::error::{Result, XxIndexError};

/// First two bytes of every gzip member.
pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Returns `true` if `header` starts with the gzip magic number.
pub fn is_gzip(header: &[u8]) -> bool {
    header.starts_with(&GZIP_MAGIC)
}

/// Reads the first bytes of `reader` and checks them against the gzip magic number.
///
/// # Errors
/// `SourceFormatMismatch` naming `what` if the stream is shorter than the
/// magic number or does not start with it.
pub fn check_gzip_magic<R: Read>(mut reader: R, what: &str) -> Result<()> {
    let mut header = [0u8; 2];
    let mut filled = 0;
    while filled < header.len() {
        match reader.read(&mut header[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    if !is_gzip(&header[..filled]) {
        return Err(XxIndexError::SourceFormatMismatch(format!(
            "{} is not gzip compressed (header {})",
            what,
            hex::encode(&header[..filled])
        )));
    }
    trace!("Gzip magic found in {}", what);
    Ok(())
}

/// Wraps `inner` in a decoder that also handles concatenated gzip members.
pub fn gzip_reader<R: Read>(inner: R) -> MultiGzDecoder<R> {
    trace!("Opening gzip decoder");
    MultiGzDecoder::new(inner)
}
