//! Random-access extraction of indexed elements.
//!
//! Priority for the encoding used by [`Extractor::decode`] (highest → lowest):
//! 1. The detector's verdict on the bytes being decoded, when `prefer_detected_encoding` is set
//! 2. The encoding set through options or [`Extractor::set_encoding`]
//! 3. UTF-8
//!
//! With `check_detected_encoding` the detector is still consulted on every
//! decode, and a disagreement with the configured encoding is logged.

use std::fmt;
use std::io::{self, ErrorKind, Read, Seek, SeekFrom};
use std::sync::Mutex;

use encoding_rs::Encoding;
use log::{debug, trace, warn};
use memchr::{memchr, memchr2};

use super::codec::charset::{resolve_encoding, CharsetDetector, DEFAULT_ENCODING};
use super::source::{open_at, ByteSource, ReadSeek};
use super::types::error::{Result, XxIndexError};
use super::types::models::IndexElement;
use super::types::options::ExtractorOptions;

const START_TAG_CHUNK_SIZE: usize = 2048;
/// Upper bound on the buffer reserved before a range read; it grows as bytes arrive.
const RANGE_RESERVE_LIMIT: usize = 64 * 1024;

/// Removes filler (zero) bytes.
///
/// The indexer skips them while counting offsets, so a range read from a
/// UTF-16 document still contains them until this runs.
pub fn strip_filler(mut bytes: Vec<u8>) -> Vec<u8> {
    if memchr(0, &bytes).is_some() {
        bytes.retain(|&byte| byte != 0);
    }
    bytes
}

/// Reads and decodes byte ranges of one source.
///
/// Every range read opens its own reader, so an `Extractor` can be shared
/// between threads. Start-tag reads reuse one cached seekable handle behind a
/// mutex.
pub struct Extractor<S: ByteSource> {
    source: S,
    encoding: Option<&'static Encoding>,
    detector: Option<Box<dyn CharsetDetector>>,
    prefer_detected: bool,
    check_detected: bool,
    start_tag_handle: Mutex<Option<Box<dyn ReadSeek>>>,
}

impl<S: ByteSource> fmt::Debug for Extractor<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extractor")
            .field("source", &self.source)
            .field("encoding", &self.encoding.map(Encoding::name))
            .field("detector", &self.detector)
            .field("prefer_detected", &self.prefer_detected)
            .field("check_detected", &self.check_detected)
            .finish()
    }
}

impl<S: ByteSource> Extractor<S> {
    /// Creates an extractor decoding as UTF-8, without a detector.
    pub fn new(source: S) -> Self {
        Self {
            source,
            encoding: None,
            detector: None,
            prefer_detected: false,
            check_detected: false,
            start_tag_handle: Mutex::new(None),
        }
    }

    /// Creates an extractor configured from `options`.
    ///
    /// # Errors
    /// `UnknownEncoding` if the configured charset label cannot be resolved.
    pub fn with_options(source: S, options: &ExtractorOptions) -> Result<Self> {
        let mut extractor = Self::new(source);
        if let Some(label) = &options.character_encoding {
            extractor.set_encoding(label)?;
        }
        extractor.prefer_detected = options.prefer_detected_encoding;
        extractor.check_detected = options.check_detected_encoding;
        Ok(extractor)
    }

    /// Installs the charset detector consulted by [`detect_source_encoding`](Self::detect_source_encoding)
    /// and, with `prefer_detected_encoding`, by every decode.
    pub fn with_detector(mut self, detector: Box<dyn CharsetDetector>) -> Self {
        self.detector = Some(detector);
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// The encoding used when no detector overrides it.
    pub fn encoding(&self) -> &'static Encoding {
        self.encoding.unwrap_or(DEFAULT_ENCODING)
    }

    /// The explicitly set encoding, if any.
    pub fn configured_encoding(&self) -> Option<&'static Encoding> {
        self.encoding
    }

    /// Sets the encoding from a charset label.
    ///
    /// # Errors
    /// `UnknownEncoding` if `label` cannot be resolved; the previous encoding is kept.
    pub fn set_encoding(&mut self, label: &str) -> Result<()> {
        let encoding = resolve_encoding(label)?;
        debug!("Extractor encoding set to {} (from '{}')", encoding.name(), label);
        self.encoding = Some(encoding);
        Ok(())
    }

    pub fn prefers_detected(&self) -> bool {
        self.prefer_detected
    }

    pub fn set_prefer_detected(&mut self, prefer: bool) {
        self.prefer_detected = prefer;
    }

    pub fn checks_detected(&self) -> bool {
        self.check_detected
    }

    pub fn set_check_detected(&mut self, check: bool) {
        self.check_detected = check;
    }

    /// Runs the detector over the first `prefix_len` bytes of the source.
    ///
    /// Returns `None` without reading when no detector is installed.
    pub fn detect_source_encoding(&self, prefix_len: usize) -> Result<Option<String>> {
        let Some(detector) = &self.detector else {
            return Ok(None);
        };
        let mut prefix = Vec::with_capacity(prefix_len);
        self.source.open()?.take(prefix_len as u64).read_to_end(&mut prefix)?;
        Ok(detector.detect(&prefix))
    }

    /// Reads the raw bytes `[start, stop)`.
    ///
    /// # Errors
    /// - `InvalidRange` if `stop < start`
    /// - `RangeTooLarge` if the range does not fit in memory on this platform
    /// - `Io` / `PositionUnreachable` if the source ends early
    pub fn read_range(&self, start: u64, stop: u64) -> Result<Vec<u8>> {
        if stop < start {
            return Err(XxIndexError::InvalidRange { start, stop });
        }
        let len = usize::try_from(stop - start)
            .ok()
            .filter(|&len| len <= isize::MAX as usize)
            .ok_or(XxIndexError::RangeTooLarge { start, stop })?;

        trace!("Reading bytes [{}, {}) from {}", start, stop, self.source.name());
        let reader = open_at(&self.source, start)?;
        let mut bytes = Vec::with_capacity(len.min(RANGE_RESERVE_LIMIT));
        reader.take(len as u64).read_to_end(&mut bytes)?;
        if bytes.len() < len {
            return Err(io::Error::new(
                ErrorKind::UnexpectedEof,
                format!(
                    "source ended after {} of {} bytes of range [{}, {})",
                    bytes.len(),
                    len,
                    start,
                    stop
                ),
            )
            .into());
        }
        Ok(bytes)
    }

    /// Decodes `bytes` as text. Malformed sequences become U+FFFD.
    ///
    /// # Errors
    /// `UnknownEncoding` if a preferred detector names an unresolvable charset.
    pub fn decode(&self, bytes: &[u8]) -> Result<String> {
        let encoding = self.encoding_for(bytes)?;
        let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
        if had_errors {
            warn!(
                "Malformed {} input in {} bytes, replaced with U+FFFD",
                encoding.name(),
                bytes.len()
            );
        }
        Ok(text.into_owned())
    }

    fn encoding_for(&self, bytes: &[u8]) -> Result<&'static Encoding> {
        if self.prefer_detected {
            if let Some(label) = self.detector.as_ref().and_then(|d| d.detect(bytes)) {
                trace!("Detector chose {} for {} bytes", label, bytes.len());
                return resolve_encoding(&label);
            }
        } else if self.check_detected {
            if let Some(detected) = self.detected_mismatch(bytes) {
                warn!(
                    "Specified encoding is not the same as the detected one. Specified: {} detected: {}",
                    self.encoding().name(),
                    detected.name()
                );
            }
        }
        Ok(self.encoding())
    }

    /// The encoding the detector names for `bytes`, if it resolves and differs
    /// from [`encoding`](Self::encoding).
    pub fn detected_mismatch(&self, bytes: &[u8]) -> Option<&'static Encoding> {
        let label = self.detector.as_ref()?.detect(bytes)?;
        let detected = resolve_encoding(&label).ok()?;
        (detected != self.encoding()).then_some(detected)
    }

    /// Reads `[start, stop)`, strips filler bytes and decodes.
    pub fn read_string(&self, start: u64, stop: u64) -> Result<String> {
        let bytes = strip_filler(self.read_range(start, stop)?);
        self.decode(&bytes)
    }

    /// Reads and decodes the full text of an indexed element.
    pub fn read_element(&self, element: &IndexElement) -> Result<String> {
        self.read_string(element.start, element.stop)
    }

    /// Reads only the start tag of an element, up to its first unquoted `>`.
    ///
    /// Returns `Ok(None)` (and logs a warning) when the source ends before a
    /// `>` is found.
    pub fn read_start_tag(&self, element: &IndexElement) -> Result<Option<String>> {
        let mut tag = Vec::new();
        let found = {
            let mut cached = self
                .start_tag_handle
                .lock()
                .map_err(|_| XxIndexError::LockPoisoned)?;
            if cached.is_none() {
                *cached = self.source.open_seekable()?;
            }
            match cached.as_mut() {
                Some(handle) => {
                    let scanned = handle
                        .seek(SeekFrom::Start(element.start))
                        .map_err(XxIndexError::from)
                        .and_then(|_| scan_start_tag(handle, &mut tag));
                    if scanned.is_err() {
                        // Drop the handle so the next call starts from a fresh one.
                        *cached = None;
                    }
                    scanned?
                }
                None => {
                    let mut reader = open_at(&self.source, element.start)?;
                    scan_start_tag(&mut reader, &mut tag)?
                }
            }
        };

        if !found {
            warn!(
                "No start tag found for element {} in {}",
                element,
                self.source.name()
            );
            return Ok(None);
        }
        self.decode(&strip_filler(tag)).map(Some)
    }
}

/// Copies bytes into `out` up to and including the first `>` outside double quotes.
///
/// Returns `false` if the reader ran dry first.
fn scan_start_tag<R: Read + ?Sized>(reader: &mut R, out: &mut Vec<u8>) -> Result<bool> {
    let mut chunk = [0u8; START_TAG_CHUNK_SIZE];
    let mut in_quote = false;
    loop {
        let read = match reader.read(&mut chunk) {
            Ok(0) => return Ok(false),
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        let mut from = 0;
        while let Some(pos) = memchr2(b'"', b'>', &chunk[from..read]) {
            let at = from + pos;
            if chunk[at] == b'"' {
                in_quote = !in_quote;
            } else if !in_quote {
                out.extend_from_slice(&chunk[..=at]);
                return Ok(true);
            }
            from = at + 1;
        }
        out.extend_from_slice(&chunk[..read]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xxindex::codec::charset::{BomDetector, XmlDeclarationDetector};
    use crate::xxindex::source::MemorySource;

    fn extractor(xml: &[u8]) -> Extractor<MemorySource> {
        Extractor::new(MemorySource::new(xml.to_vec()))
    }

    #[derive(Debug)]
    struct Fixed(&'static str);

    impl CharsetDetector for Fixed {
        fn detect(&self, _bytes: &[u8]) -> Option<String> {
            Some(self.0.to_string())
        }
    }

    #[test]
    fn reads_exact_ranges() {
        let ex = extractor(b"<a><b>1</b><c/></a>");
        assert_eq!(ex.read_range(3, 11).unwrap(), b"<b>1</b>");
        assert_eq!(ex.read_string(11, 15).unwrap(), "<c/>");
        assert_eq!(ex.read_range(5, 5).unwrap(), b"");
    }

    #[test]
    fn reversed_range_is_rejected() {
        let err = extractor(b"<a/>").read_range(3, 1).unwrap_err();
        assert!(matches!(err, XxIndexError::InvalidRange { start: 3, stop: 1 }));
    }

    #[test]
    fn oversized_range_is_rejected_before_reading() {
        let err = extractor(b"<a/>").read_range(0, u64::MAX).unwrap_err();
        assert!(matches!(err, XxIndexError::RangeTooLarge { start: 0, .. }));
    }

    #[test]
    fn reading_past_the_end_is_an_io_error() {
        let err = extractor(b"<a/>").read_range(2, 10).unwrap_err();
        assert!(matches!(err, XxIndexError::Io(ref e) if e.kind() == ErrorKind::UnexpectedEof));
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn huge_range_past_the_end_fails_without_allocating_it() {
        let err = extractor(b"<a/>").read_range(0, 1u64 << 44).unwrap_err();
        assert!(matches!(err, XxIndexError::Io(ref e) if e.kind() == ErrorKind::UnexpectedEof));
    }

    #[test]
    fn filler_is_stripped() {
        assert_eq!(strip_filler(b"<\0a\0/\0>\0".to_vec()), b"<a/>");
        assert_eq!(strip_filler(b"<a/>".to_vec()), b"<a/>");
    }

    #[test]
    fn decodes_with_configured_encoding() {
        let mut ex = extractor(b"<a>caf\xE9</a>");
        assert_eq!(ex.encoding(), encoding_rs::UTF_8);
        ex.set_encoding("ISO-8859-1").unwrap();
        assert_eq!(ex.read_string(0, 11).unwrap(), "<a>café</a>");
    }

    #[test]
    fn unknown_label_keeps_previous_encoding() {
        let mut ex = extractor(b"");
        ex.set_encoding("windows-1252").unwrap();
        assert!(matches!(ex.set_encoding("nope"), Err(XxIndexError::UnknownEncoding(_))));
        assert_eq!(ex.encoding(), encoding_rs::WINDOWS_1252);

        let options = ExtractorOptions::default().with_encoding("nope");
        assert!(Extractor::with_options(MemorySource::new(Vec::new()), &options).is_err());
    }

    #[test]
    fn preferred_detector_wins_per_decode() {
        let options = ExtractorOptions::default()
            .with_encoding("UTF-8")
            .with_prefer_detected(true);
        let ex = Extractor::with_options(MemorySource::new(Vec::new()), &options)
            .unwrap()
            .with_detector(Box::new(Fixed("windows-1252")));
        assert_eq!(ex.decode(b"caf\xE9").unwrap(), "café");

        let bad = Extractor::new(MemorySource::new(Vec::new())).with_detector(Box::new(Fixed("nope")));
        assert_eq!(bad.decode(b"ok").unwrap(), "ok");
    }

    #[test]
    fn checking_reports_mismatch_but_keeps_configured_encoding() {
        let options = ExtractorOptions::default()
            .with_encoding("UTF-8")
            .with_check_detected(true);
        let ex = Extractor::with_options(MemorySource::new(Vec::new()), &options)
            .unwrap()
            .with_detector(Box::new(Fixed("windows-1252")));
        assert!(ex.checks_detected());
        assert_eq!(ex.detected_mismatch(b"caf\xE9"), Some(encoding_rs::WINDOWS_1252));
        assert_eq!(ex.decode(b"caf\xE9").unwrap(), "caf\u{FFFD}");

        let agreeing = Extractor::with_options(MemorySource::new(Vec::new()), &options)
            .unwrap()
            .with_detector(Box::new(Fixed("utf8")));
        assert_eq!(agreeing.detected_mismatch(b"ok"), None);
    }

    #[test]
    fn detects_from_source_prefix() {
        let xml = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><a/>";
        let ex = extractor(xml).with_detector(Box::new(XmlDeclarationDetector));
        assert_eq!(ex.detect_source_encoding(1000).unwrap().as_deref(), Some("ISO-8859-1"));
        assert_eq!(ex.detect_source_encoding(10).unwrap(), None);
        assert_eq!(extractor(xml).detect_source_encoding(1000).unwrap(), None);

        let bom = extractor(b"\xFF\xFE<\0a\0/\0>\0").with_detector(Box::new(BomDetector));
        assert_eq!(bom.detect_source_encoding(1000).unwrap().as_deref(), Some("UTF-16LE"));
    }

    #[test]
    fn start_tag_stops_at_first_unquoted_gt() {
        let xml = b"<r><a x=\"1>2\" y='3'>body</a></r>";
        let ex = extractor(xml);
        let element = IndexElement::new(3, 29, Some(1));
        assert_eq!(ex.read_start_tag(&element).unwrap().as_deref(), Some("<a x=\"1>2\" y='3'>"));
        // The cached handle is reused for later calls.
        let root = IndexElement::new(0, xml.len() as u64, Some(1));
        assert_eq!(ex.read_start_tag(&root).unwrap().as_deref(), Some("<r>"));
    }

    #[test]
    fn start_tag_spanning_chunks() {
        let mut xml = b"<a v=\"".to_vec();
        xml.extend(std::iter::repeat(b'>').take(START_TAG_CHUNK_SIZE * 2));
        xml.extend_from_slice(b"\">x</a>");
        let tag = extractor(&xml)
            .read_start_tag(&IndexElement::new(0, xml.len() as u64, None))
            .unwrap()
            .expect("start tag");
        assert_eq!(tag.len(), START_TAG_CHUNK_SIZE * 2 + 8);
        assert!(tag.ends_with("\">"));
    }

    #[test]
    fn missing_start_tag_end_is_none() {
        let ex = extractor(b"<a x=\"unterminated>");
        assert_eq!(ex.read_start_tag(&IndexElement::new(0, 19, None)).unwrap(), None);
    }
}
