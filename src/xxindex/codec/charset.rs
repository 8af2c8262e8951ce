//! Charset detection and label resolution.
//!
//! Detection is a capability handed to the [`Extractor`](crate::Extractor), not a
//! process-wide singleton. Two detectors ship with the crate:
//!
//! - [`XmlDeclarationDetector`]: reads `encoding="..."` from an `<?xml ... ?>` declaration
//! - [`BomDetector`]: recognizes UTF-8 and UTF-16 byte-order marks

use std::fmt;
use std::sync::OnceLock;

use encoding_rs::Encoding;
use log::debug;
use regex::bytes::Regex;

use crate::xxindex::types::error::{Result, XxIndexError};

/// Encoding used when none is configured or detected.
pub static DEFAULT_ENCODING: &Encoding = encoding_rs::UTF_8;

static XML_DECLARATION: OnceLock<Regex> = OnceLock::new();
static ENCODING_ATTRIBUTE: OnceLock<Regex> = OnceLock::new();

fn declaration_regex() -> &'static Regex {
    XML_DECLARATION.get_or_init(|| Regex::new(r"(?s-u)<\?xml.+?\?>").expect("Invalid XML declaration regex"))
}

fn encoding_regex() -> &'static Regex {
    ENCODING_ATTRIBUTE.get_or_init(|| {
        Regex::new(r#"(?-u)encoding\s*=\s*(?:"([A-Za-z][A-Za-z0-9._-]*)"|'([A-Za-z][A-Za-z0-9._-]*)')"#)
            .expect("Invalid encoding attribute regex")
    })
}

/// Something that can name the charset of a byte slice.
pub trait CharsetDetector: fmt::Debug + Send + Sync {
    /// Returns a charset label for `bytes`, or `None` if nothing can be told.
    fn detect(&self, bytes: &[u8]) -> Option<String>;
}

/// Reads the charset declared in an XML declaration.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlDeclarationDetector;

impl CharsetDetector for XmlDeclarationDetector {
    fn detect(&self, bytes: &[u8]) -> Option<String> {
        declared_encoding(bytes)
    }
}

/// Names the Unicode encoding announced by a leading byte-order mark.
#[derive(Debug, Clone, Copy, Default)]
pub struct BomDetector;

impl CharsetDetector for BomDetector {
    fn detect(&self, bytes: &[u8]) -> Option<String> {
        Encoding::for_bom(bytes).map(|(encoding, _)| encoding.name().to_owned())
    }
}

/// Extracts the `encoding` pseudo-attribute of the first XML declaration in `prefix`.
///
/// Returns `None` when there is no declaration or it carries no encoding.
pub fn declared_encoding(prefix: &[u8]) -> Option<String> {
    let Some(declaration) = declaration_regex().find(prefix) else {
        debug!("No XML declaration found in the first {} bytes", prefix.len());
        return None;
    };
    let captures = encoding_regex().captures(declaration.as_bytes())?;
    let label = captures.get(1).or_else(|| captures.get(2))?;
    let label = String::from_utf8_lossy(label.as_bytes()).into_owned();
    debug!("Detected charset {} from XML declaration", label);
    Some(label)
}

/// Resolves a charset label to an encoding.
///
/// GBK and GB2312 are widened to GB18030; everything else goes through the
/// WHATWG label table (so `ASCII` and `ISO-8859-1` resolve to windows-1252).
pub fn resolve_encoding(label: &str) -> Result<&'static Encoding> {
    let trimmed = label.trim();
    let normalized = if trimmed.eq_ignore_ascii_case("GBK") || trimmed.eq_ignore_ascii_case("GB2312") {
        "GB18030"
    } else {
        trimmed
    };
    Encoding::for_label(normalized.as_bytes()).ok_or_else(|| XxIndexError::UnknownEncoding(label.to_owned()))
}
